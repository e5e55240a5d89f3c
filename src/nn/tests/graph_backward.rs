/*
 * @Description  : GraphInner 反向传播单元测试
 *
 * 测试策略：
 * 1. 共享父节点的梯度累加（菱形结构）
 * 2. 参数梯度跨多次 backward 累加，clear_grad 清零
 * 3. 评估模式拒绝反向传播，no_grad_scope 恢复原模式
 * 4. 反向传播后释放中间结果
 */

use crate::nn::{GraphError, GraphInner, NodeId};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;

/// p = 2，q = 3；a = p + q；loss = a + p
fn diamond_graph() -> Result<(GraphInner, NodeId, NodeId, NodeId, NodeId), GraphError> {
    let mut graph = GraphInner::new();
    let p = graph.new_parameter_node(&[1, 1], Some("p"))?;
    let q = graph.new_parameter_node(&[1, 1], Some("q"))?;
    graph.set_node_value(p, Some(&Tensor::new(&[2.0], &[1, 1])))?;
    graph.set_node_value(q, Some(&Tensor::new(&[3.0], &[1, 1])))?;
    let a = graph.new_add_node(p, q, Some("a"))?;
    let loss = graph.new_add_node(a, p, Some("loss"))?;
    Ok((graph, p, q, a, loss))
}

fn grad_number(graph: &GraphInner, id: NodeId) -> Result<Option<f32>, GraphError> {
    Ok(graph.get_node_grad(id)?.and_then(Tensor::get_data_number))
}

// ==================== 梯度累加 ====================

#[test]
fn test_backward_accumulates_grad_from_all_children() -> Result<(), GraphError> {
    let (mut graph, p, q, _, loss) = diamond_graph()?;

    let loss_value = graph.backward(loss)?;
    assert_abs_diff_eq!(loss_value, 7.0);
    // p 经两条路径到达损失
    assert_eq!(grad_number(&graph, p)?, Some(2.0));
    assert_eq!(grad_number(&graph, q)?, Some(1.0));
    Ok(())
}

#[test]
fn test_backward_same_parent_twice() -> Result<(), GraphError> {
    // loss = p + p
    let mut graph = GraphInner::new();
    let p = graph.new_parameter_node(&[1, 1], Some("p"))?;
    graph.set_node_value(p, Some(&Tensor::new(&[1.5], &[1, 1])))?;
    let loss = graph.new_add_node(p, p, None)?;

    assert_abs_diff_eq!(graph.backward(loss)?, 3.0);
    assert_eq!(grad_number(&graph, p)?, Some(2.0));
    Ok(())
}

#[test]
fn test_param_grads_accumulate_until_cleared() -> Result<(), GraphError> {
    let (mut graph, p, q, _, loss) = diamond_graph()?;

    graph.backward(loss)?;
    graph.backward(loss)?;
    assert_eq!(grad_number(&graph, p)?, Some(4.0));
    assert_eq!(grad_number(&graph, q)?, Some(2.0));
    assert_eq!(graph.backward_count(), 2);

    graph.clear_grad();
    assert_eq!(grad_number(&graph, p)?, None);

    graph.backward(loss)?;
    assert_eq!(grad_number(&graph, p)?, Some(2.0));

    graph.clear_node_grad(q)?;
    assert_eq!(grad_number(&graph, q)?, None);
    assert_eq!(grad_number(&graph, p)?, Some(2.0));
    Ok(())
}

#[test]
fn test_backward_releases_intermediate_results() -> Result<(), GraphError> {
    let (mut graph, p, _, a, loss) = diamond_graph()?;

    graph.backward(loss)?;
    assert!(!graph.has_node_value(a)?);
    assert!(!graph.has_node_value(loss)?);
    assert_eq!(grad_number(&graph, a)?, None);
    // 参数值保留
    assert!(graph.has_node_value(p)?);

    // 再次 forward 可以重新计算
    graph.forward(loss)?;
    assert_eq!(
        graph.get_node_value(loss)?.and_then(Tensor::get_data_number),
        Some(7.0)
    );
    Ok(())
}

#[test]
fn test_backward_does_not_reach_unrelated_params() -> Result<(), GraphError> {
    let (mut graph, _, _, _, loss) = diamond_graph()?;
    let unrelated = graph.new_parameter_node(&[1, 1], Some("unrelated"))?;

    graph.backward(loss)?;
    assert_eq!(grad_number(&graph, unrelated)?, None);
    Ok(())
}

// ==================== 错误情况 ====================

#[test]
fn test_backward_requires_scalar_loss() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let w = graph.new_parameter_node(&[1, 3], Some("w"))?;
    let b = graph.new_parameter_node(&[1, 3], Some("b"))?;
    let y = graph.new_add_node(w, b, None)?;

    assert!(matches!(
        graph.backward(y),
        Err(GraphError::InvalidOperation(_))
    ));
    Ok(())
}

#[test]
fn test_backward_refused_in_eval_mode() -> Result<(), GraphError> {
    let (mut graph, p, _, _, loss) = diamond_graph()?;

    graph.set_eval_mode();
    assert!(matches!(
        graph.backward(loss),
        Err(GraphError::InvalidOperation(_))
    ));
    assert_eq!(grad_number(&graph, p)?, None);

    // 评估模式下前向传播照常
    graph.forward(loss)?;
    assert!(graph.has_node_value(loss)?);

    graph.set_train_mode();
    graph.backward(loss)?;
    assert_eq!(grad_number(&graph, p)?, Some(2.0));
    Ok(())
}

#[test]
fn test_no_grad_scope_restores_mode() -> Result<(), GraphError> {
    let (mut graph, _, _, _, loss) = diamond_graph()?;

    let result = graph.no_grad_scope(|g| {
        assert!(!g.is_train_mode());
        g.forward(loss)?;
        g.backward(loss)
    });
    assert!(matches!(result, Err(GraphError::InvalidOperation(_))));
    assert!(graph.is_train_mode());

    // 本来处于评估模式时，退出后仍是评估模式
    graph.set_eval_mode();
    graph.no_grad_scope(|g| assert!(!g.is_train_mode()));
    assert!(!graph.is_train_mode());
    Ok(())
}
