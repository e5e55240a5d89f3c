/*
 * @Description  : Graph 句柄、Var 与参数初始化（Init）单元测试
 */

use crate::nn::{
    Graph, GraphError, Init, VarConvOps, VarLossOps, VarMatrixOps, VarPoolingOps, VarShapeOps,
};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

// ==================== Init ====================

#[test]
fn test_init_constant_variants() {
    assert_eq!(Init::Zeros.generate(&[2, 3]), Tensor::zeros(&[2, 3]));
    assert_eq!(Init::Ones.generate(&[2, 3]), Tensor::ones(&[2, 3]));
    assert_eq!(Init::Constant(0.5).generate(&[1, 4]), Tensor::full(0.5, &[1, 4]));
}

#[test]
fn test_init_kaiming_scale_uses_fan_in() {
    // 卷积核 [64, 8, 3, 3]：fan_in = 8·9 = 72，std = sqrt(2/72)
    let kernel = Init::Kaiming.generate(&[64, 8, 3, 3]);
    let mean = kernel.mean();
    let var = kernel.map(|v| (v - mean) * (v - mean)).mean();
    assert_abs_diff_eq!(mean, 0.0, epsilon = 0.02);
    assert_abs_diff_eq!(var.sqrt(), (2.0f32 / 72.0).sqrt(), epsilon = 0.02);

    // 全连接 [1568, 10]：fan_in = 1568
    let weights = Init::Kaiming.generate(&[1568, 10]);
    let std = weights.map(|v| v * v).mean().sqrt();
    assert_abs_diff_eq!(std, (2.0f32 / 1568.0).sqrt(), epsilon = 0.005);
}

#[test]
fn test_init_xavier_scale() {
    let weights = Init::Xavier.generate(&[300, 100]);
    let std = weights.map(|v| v * v).mean().sqrt();
    assert_abs_diff_eq!(std, (2.0f32 / 400.0).sqrt(), epsilon = 0.005);
}

#[test]
fn test_seeded_graphs_initialise_identically() -> Result<(), GraphError> {
    let make = |seed| -> Result<Tensor, GraphError> {
        let graph = Graph::new_with_seed(seed);
        let kernel = graph.parameter(&[4, 1, 3, 3], Init::Kaiming, "K")?;
        graph.parameter(&[16, 2], Init::Xavier, "W")?;
        Ok(kernel.value()?.unwrap_or_else(|| Tensor::zeros(&[1])))
    };
    assert_eq!(make(42)?, make(42)?);
    assert_ne!(make(42)?, make(43)?);
    Ok(())
}

// ==================== Graph / Var ====================

#[test]
fn test_graph_input_and_parameter() -> Result<(), GraphError> {
    let graph = Graph::with_name_and_seed("handle", 1);
    assert_eq!(graph.inner().name(), "handle");

    let x = graph.input_named(&Tensor::ones(&[2, 3]), "x")?;
    let w = graph.parameter(&[3, 2], Init::Constant(0.5), "w")?;
    assert_eq!(x.name()?, "x");
    assert_eq!(w.value_expected_shape()?, vec![3, 2]);
    assert!(x.same_graph(&w));

    let y = x.matmul(&w)?;
    y.forward()?;
    assert_eq!(y.value()?, Some(Tensor::full(1.5, &[2, 2])));

    // 句柄克隆共享同一个图
    let other = y.get_graph();
    assert_eq!(other.inner().nodes_count(), 3);
    Ok(())
}

#[test]
fn test_var_ops_from_different_graphs_rejected() -> Result<(), GraphError> {
    let g1 = Graph::new();
    let g2 = Graph::new();
    let x = g1.input(&Tensor::ones(&[1, 3]))?;
    let w = g2.parameter(&[3, 2], Init::Zeros, "w")?;
    assert!(!x.same_graph(&w));
    assert!(matches!(x.matmul(&w), Err(GraphError::InvalidOperation(_))));
    assert!(matches!(x.try_add(&w), Err(GraphError::InvalidOperation(_))));
    Ok(())
}

#[test]
fn test_input_shape_filled_per_batch() -> Result<(), GraphError> {
    let graph = Graph::new();
    let images = graph.input_shape(&[1, 1, 4, 4], Some("images"))?;
    let pooled = images.fuzzy_pool2d(2)?.flatten()?;

    // 尚未赋值
    assert!(pooled.forward().is_err());

    images.set_value(&Tensor::normal(0.0, 1.0, &[3, 1, 4, 4]))?;
    pooled.forward()?;
    assert_eq!(pooled.value()?.map(|t| t.shape().to_vec()), Some(vec![3, 4]));

    images.set_value(&Tensor::normal(0.0, 1.0, &[1, 1, 4, 4]))?;
    assert_eq!(pooled.value()?, None);
    pooled.forward()?;
    assert_eq!(pooled.value()?.map(|t| t.shape().to_vec()), Some(vec![1, 4]));
    Ok(())
}

#[test]
fn test_var_chain_backward_and_zero_grad() -> Result<(), GraphError> {
    // conv → 模糊池化 → flatten → linear → CE，另加 RegP
    let graph = Graph::new_with_seed(3);
    let x = graph.input(&Tensor::normal(0.0, 1.0, &[2, 1, 4, 4]))?;
    let labels = graph.input(&Tensor::new(&[0.0, 1.0], &[2]))?;
    let kernel = graph.parameter(&[2, 1, 3, 3], Init::Kaiming, "K")?;
    let bias = graph.parameter(&[1, 2], Init::Zeros, "b")?;
    let w = graph.parameter(&[8, 2], Init::Kaiming, "W")?;

    let features = x.conv2d(&kernel, (1, 1), (1, 1))?.channel_bias_add(&bias)?;
    let logits = features.fuzzy_pool2d(2)?.flatten()?.matmul(&w)?;
    let penalty = features.membership_penalty(2, 0.01)?;
    let loss = &logits.cross_entropy(&labels)? + &penalty;

    let loss_value = loss.backward()?;
    assert!(loss_value.is_finite() && loss_value > 0.0);
    for param in [&kernel, &bias, &w] {
        let grad = param.grad()?;
        assert!(grad.as_ref().is_some_and(|g| !g.has_non_finite()));
        assert_eq!(
            grad.map(|g| g.shape().to_vec()),
            Some(param.value_expected_shape()?)
        );
    }

    graph.zero_grad();
    assert_eq!(kernel.grad()?, None);
    Ok(())
}

#[test]
fn test_graph_modes() -> Result<(), GraphError> {
    let graph = Graph::new();
    let p = graph.parameter(&[1, 1], Init::Ones, "p")?;
    let loss = &p + &p;

    assert!(!graph.is_eval());
    let refused = graph.no_grad_scope(|g| {
        assert!(g.is_eval());
        loss.backward()
    });
    assert!(matches!(refused, Err(GraphError::InvalidOperation(_))));
    assert!(!graph.is_eval());

    graph.eval();
    assert!(loss.backward().is_err());
    loss.forward()?;
    assert_abs_diff_eq!(loss.item()?, 2.0);

    graph.train();
    assert_abs_diff_eq!(graph.backward(&loss)?, 2.0);
    assert_eq!(p.grad()?, Some(Tensor::new(&[2.0], &[1, 1])));
    Ok(())
}

#[test]
fn test_item_requires_scalar() -> Result<(), GraphError> {
    let graph = Graph::new();
    let x = graph.input(&Tensor::ones(&[1, 3]))?;
    assert!(matches!(x.item(), Err(GraphError::InvalidOperation(_))));

    let y = graph.input_shape(&[1, 1], None)?;
    assert!(matches!(y.item(), Err(GraphError::ComputationError(_))));
    Ok(())
}
