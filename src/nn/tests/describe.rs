/*
 * @Description  : 图描述符与模型摘要单元测试
 */

use crate::nn::{
    Graph, GraphDescriptor, GraphError, Init, NodeTypeDescriptor, VarMatrixOps, VarPoolingOps,
    VarShapeOps,
};

fn small_graph() -> Result<Graph, GraphError> {
    let graph = Graph::with_name_and_seed("describe", 0);
    let x = graph.input_shape(&[1, 1, 4, 4], Some("images"))?;
    let w = graph.parameter(&[4, 3], Init::Kaiming, "fc_W")?;
    let pooled = x.fuzzy_pool2d(2)?;
    pooled.flatten()?.matmul(&w)?;
    x.membership_penalty(2, 0.25)?;
    Ok(graph)
}

#[test]
fn test_describe_nodes_and_params() -> Result<(), GraphError> {
    let desc = small_graph()?.describe();
    assert_eq!(desc.name, "describe");
    assert_eq!(desc.nodes.len(), 6);
    assert_eq!(desc.total_params(), 12);

    let names: Vec<&str> = desc.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["images", "fc_W", "fuzzy_pool2d_1", "flatten_1", "mat_mul_1", "membership_penalty_1"]
    );

    let pool = &desc.nodes[2];
    assert_eq!(pool.node_type, NodeTypeDescriptor::FuzzyPool2d { pool_size: 2 });
    assert_eq!(pool.output_shape, vec![1, 1, 2, 2]);
    assert_eq!(pool.parents, vec![desc.nodes[0].id]);
    assert_eq!(pool.param_count, None);

    assert_eq!(
        desc.nodes[5].node_type,
        NodeTypeDescriptor::MembershipPenalty { pool_size: 2, reg_lambda: 0.25 }
    );
    assert_eq!(desc.nodes[1].param_count, Some(12));
    Ok(())
}

#[test]
fn test_descriptor_json_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let desc = small_graph()?.describe();
    let json = desc.to_json()?;
    assert!(json.contains("\"type\": \"FuzzyPool2d\""));
    assert_eq!(GraphDescriptor::from_json(&json)?, desc);
    Ok(())
}

#[test]
fn test_summary_formats() -> Result<(), GraphError> {
    let graph = small_graph()?;

    let text = graph.summary_string();
    assert!(text.starts_with('┌'));
    assert!(text.contains("FuzzyPool2d"));
    assert!(text.contains("MembershipPenalty"));

    let markdown = graph.summary_markdown();
    assert!(markdown.starts_with("# 模型摘要: describe"));
    assert!(markdown.contains("| fuzzy_pool2d_1 | FuzzyPool2d | [1, 1, 2, 2] | - | images |"));
    Ok(())
}

#[test]
fn test_save_summary_by_extension() -> Result<(), GraphError> {
    let graph = small_graph()?;
    let dir = std::env::temp_dir().join(format!("fuzzy_pool_summary_{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("创建临时目录失败");

    let md_path = dir.join("summary.md");
    let txt_path = dir.join("summary.txt");
    graph.save_summary(&md_path)?;
    graph.save_summary(&txt_path)?;

    let md = std::fs::read_to_string(&md_path).expect("读取摘要失败");
    let txt = std::fs::read_to_string(&txt_path).expect("读取摘要失败");
    assert_eq!(md, graph.summary_markdown());
    assert_eq!(txt, graph.summary_string());

    let _ = std::fs::remove_dir_all(&dir);
    Ok(())
}
