/*
 * @Description  : GraphInner 前向传播与节点管理单元测试
 */

use crate::nn::{GraphError, GraphInner, NodeId};
use crate::tensor::Tensor;

#[test]
fn test_new_graph_is_empty_and_named() {
    let graph = GraphInner::new();
    assert_eq!(graph.nodes_count(), 0);
    assert!(graph.is_train_mode());

    let graph = GraphInner::with_name("mnist_fuzzy_pool");
    assert_eq!(graph.name(), "mnist_fuzzy_pool");
}

#[test]
fn test_node_ids_and_names() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let x = graph.new_input_node(&[1, 1, 4, 4], Some("x"))?;
    let pool_1 = graph.new_fuzzy_pool2d_node(x, 2, None)?;
    let pool_2 = graph.new_fuzzy_pool2d_node(x, 2, None)?;

    // 第一个节点 ID 为 1
    assert_eq!(x, NodeId(1));
    assert_eq!(graph.get_node_name(pool_1)?, "fuzzy_pool2d_1");
    assert_eq!(graph.get_node_name(pool_2)?, "fuzzy_pool2d_2");
    assert_eq!(graph.get_node_type_name(pool_1)?, "FuzzyPool2d");
    assert_eq!(graph.get_node_parents(pool_1)?, vec![x]);
    assert_eq!(graph.get_node_children(x)?, vec![pool_1, pool_2]);
    assert_eq!(graph.nodes(), vec![x, pool_1, pool_2]);

    assert_eq!(
        graph.new_input_node(&[1, 2], Some("x")),
        Err(GraphError::DuplicateNodeName("x".to_string()))
    );
    let duplicate = graph.new_input_node(&[1, 2], Some("x"));
    assert_eq!(
        duplicate.map_err(|e| e.to_string()),
        Err("节点名称重复: x".to_string())
    );
    assert_eq!(
        graph.get_node_name(NodeId(99)),
        Err(GraphError::NodeNotFound(NodeId(99)))
    );
    Ok(())
}

#[test]
fn test_forward_requires_leaf_values() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let x = graph.new_input_node(&[1, 1, 2, 2], Some("x"))?;
    let pool = graph.new_max_pool2d_node(x, 2, None)?;

    // 叶子节点不能被前向计算
    assert!(matches!(graph.forward(x), Err(GraphError::InvalidOperation(_))));
    // 输入尚未赋值
    assert!(graph.forward(pool).is_err());
    assert!(!graph.has_node_value(pool)?);
    Ok(())
}

#[test]
fn test_forward_caches_until_leaf_changes() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let x = graph.new_input_node(&[1, 1, 2, 2], Some("x"))?;
    let pool = graph.new_avg_pool2d_node(x, 2, None)?;

    graph.set_node_value(x, Some(&Tensor::new(&[1.0, 2.0, 3.0, 4.0], &[1, 1, 2, 2])))?;
    graph.forward(pool)?;
    assert_eq!(
        graph.get_node_value(pool)?.and_then(Tensor::get_data_number),
        Some(2.5)
    );

    // 重复 forward 复用缓存值
    graph.forward(pool)?;
    assert!(graph.has_node_value(pool)?);

    // 修改叶子后中间值作废，再次 forward 得到新值
    graph.set_node_value(x, Some(&Tensor::full(8.0, &[1, 1, 2, 2])))?;
    assert!(!graph.has_node_value(pool)?);
    graph.forward(pool)?;
    assert_eq!(
        graph.get_node_value(pool)?.and_then(Tensor::get_data_number),
        Some(8.0)
    );
    Ok(())
}

#[test]
fn test_forward_evaluates_shared_parent_once() -> Result<(), GraphError> {
    // x → conv → {fuzzy, penalty} → add：菱形结构
    let mut graph = GraphInner::new();
    let x = graph.new_input_node(&[1, 1, 4, 4], Some("x"))?;
    let kernel = graph.new_parameter_node(&[2, 1, 3, 3], Some("kernel"))?;
    let conv = graph.new_conv2d_node(x, kernel, (1, 1), (1, 1), None)?;
    let pool = graph.new_fuzzy_pool2d_node(conv, 2, None)?;
    let flat = graph.new_flatten_node(pool, None)?;
    let penalty = graph.new_membership_penalty_node(conv, 2, 0.1, None)?;

    graph.set_node_value(x, Some(&Tensor::normal(0.0, 1.0, &[2, 1, 4, 4])))?;
    graph.set_node_value(kernel, Some(&Tensor::normal(0.0, 0.5, &[2, 1, 3, 3])))?;
    graph.forward(flat)?;
    graph.forward(penalty)?;

    assert_eq!(
        graph.get_node_value(flat)?.map(|t| t.shape().to_vec()),
        Some(vec![2, 8])
    );
    let penalty_value = graph.get_node_value(penalty)?.and_then(Tensor::get_data_number);
    assert!(penalty_value.is_some_and(|p| p > 0.0));
    Ok(())
}

#[test]
fn test_set_node_value_none_clears_leaf() -> Result<(), GraphError> {
    let mut graph = GraphInner::new();
    let x = graph.new_input_node(&[1, 2], Some("x"))?;
    graph.set_node_value(x, Some(&Tensor::zeros(&[1, 2])))?;
    assert!(graph.has_node_value(x)?);
    graph.set_node_value(x, None)?;
    assert!(!graph.has_node_value(x)?);
    Ok(())
}
