/*
 * @Description  : PoolingClassifier 单元测试
 */

use crate::config::{ClassifierConfig, PoolingConfig};
use crate::nn::layer::Pooling;
use crate::nn::{Graph, GraphError, Module, PoolingClassifier, VarLossOps};
use crate::tensor::Tensor;

fn config_with(pooling: PoolingConfig) -> ClassifierConfig {
    ClassifierConfig {
        pooling,
        ..ClassifierConfig::default()
    }
}

#[test]
fn test_classifier_parameters_for_mnist() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(42);
    let model = PoolingClassifier::new(&graph, &ClassifierConfig::default())?;

    let names: Vec<String> = model.named_parameters()?.into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["conv_K", "conv_b", "fc_W", "fc_b"]);
    // conv 8×1×3×3 + 8，fc (8·14·14)×10 + 10
    assert_eq!(model.num_scalar_params()?, 72 + 8 + 1568 * 10 + 10);
    assert_eq!(model.pool().kind_name(), "fuzzy");
    assert_eq!(model.config(), &ClassifierConfig::default());
    Ok(())
}

#[test]
fn test_classifier_forward_shapes_for_every_pooling() -> Result<(), GraphError> {
    for pooling in [
        PoolingConfig::Max { pool_size: 2 },
        PoolingConfig::Avg { pool_size: 2 },
        PoolingConfig::Fuzzy { pool_size: 2, reg_lambda: None },
        PoolingConfig::Fuzzy { pool_size: 4, reg_lambda: Some(0.01) },
    ] {
        let graph = Graph::new_with_seed(7);
        let model = PoolingClassifier::new(&graph, &config_with(pooling))?;
        let images = graph.input_shape(&[1, 1, 28, 28], Some("images"))?;
        let out = model.forward(&images)?;
        assert_eq!(out.logits.value_expected_shape()?, vec![1, 10]);
        assert_eq!(
            out.aux_loss.is_some(),
            matches!(pooling, PoolingConfig::Fuzzy { reg_lambda: Some(_), .. })
        );

        images.set_value(&Tensor::normal(0.0, 1.0, &[3, 1, 28, 28]))?;
        out.logits.forward()?;
        let logits = out.logits.value()?;
        assert_eq!(logits.as_ref().map(|t| t.shape().to_vec()), Some(vec![3, 10]));
        assert!(logits.is_some_and(|t| !t.has_non_finite()));
    }
    Ok(())
}

#[test]
fn test_classifier_backward_reaches_all_parameters() -> Result<(), GraphError> {
    let graph = Graph::new_with_seed(9);
    let config = ClassifierConfig {
        image_size: (8, 8),
        conv_channels: 2,
        num_classes: 3,
        ..ClassifierConfig::default()
    };
    let model = PoolingClassifier::new(&graph, &config)?;
    let images = graph.input(&Tensor::normal(0.0, 1.0, &[4, 1, 8, 8]))?;
    let labels = graph.input(&Tensor::new(&[0.0, 1.0, 2.0, 1.0], &[4]))?;

    let out = model.forward(&images)?;
    let mut loss = out.logits.cross_entropy(&labels)?;
    if let Some(aux) = &out.aux_loss {
        loss = loss.try_add(aux)?;
    }
    loss.backward()?;

    for (name, param) in model.named_parameters()? {
        let grad = param.grad()?;
        assert!(grad.is_some_and(|g| !g.has_non_finite()), "参数 {name} 没有有效梯度");
    }
    Ok(())
}

#[test]
fn test_classifier_rejects_invalid_config() {
    let graph = Graph::new();

    let too_few_classes = ClassifierConfig {
        num_classes: 1,
        ..ClassifierConfig::default()
    };
    assert!(matches!(
        PoolingClassifier::new(&graph, &too_few_classes),
        Err(GraphError::InvalidConfiguration(_))
    ));

    // 28 不能被 3 整除
    let indivisible = config_with(PoolingConfig::Fuzzy { pool_size: 3, reg_lambda: None });
    assert!(matches!(
        PoolingClassifier::new(&graph, &indivisible),
        Err(GraphError::InvalidConfiguration(_))
    ));

    let negative_lambda = config_with(PoolingConfig::Fuzzy {
        pool_size: 2,
        reg_lambda: Some(-0.5),
    });
    assert!(matches!(
        PoolingClassifier::new(&graph, &negative_lambda),
        Err(GraphError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_classifier_summary_lists_layers() -> Result<(), GraphError> {
    let graph = Graph::with_name_and_seed("mnist_fuzzy_pool", 1);
    let model = PoolingClassifier::new(&graph, &ClassifierConfig::default())?;
    let images = graph.input_shape(&[1, 1, 28, 28], Some("images"))?;
    model.forward(&images)?;

    let summary = model.summary();
    for needle in ["conv_K", "fc_W", "FuzzyPool2d", "MembershipPenalty", "[1, 8, 14, 14]"] {
        assert!(summary.contains(needle), "摘要缺少 {needle}:\n{summary}");
    }
    Ok(())
}
