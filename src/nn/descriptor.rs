/*
 * @Description  : 图描述符（Graph Descriptor）
 *                 计算图拓扑的可序列化表示，用于模型摘要与调试输出
 */

use serde::{Deserialize, Serialize};

/// 图的可序列化描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDescriptor {
    /// 格式版本
    pub version: String,
    pub name: String,
    pub nodes: Vec<NodeDescriptor>,
}

/// 节点描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub id: u64,
    pub name: String,
    pub node_type: NodeTypeDescriptor,
    /// 构建时推断的输出形状
    pub output_shape: Vec<usize>,
    /// 父节点 ID 列表（定义拓扑）
    pub parents: Vec<u64>,
    /// 参数数量（仅 Parameter 类型有值）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_count: Option<usize>,
}

/// 节点类型描述（包含类型特定的超参数）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeTypeDescriptor {
    Input,
    Parameter,
    Add,
    MatMul,
    Flatten,
    Conv2d {
        stride: (usize, usize),
        padding: (usize, usize),
    },
    ChannelBiasAdd,
    MaxPool2d {
        pool_size: usize,
    },
    AvgPool2d {
        pool_size: usize,
    },
    FuzzyPool2d {
        pool_size: usize,
    },
    MembershipPenalty {
        pool_size: usize,
        reg_lambda: f32,
    },
    SoftmaxCrossEntropy,
}

impl GraphDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            name: name.to_string(),
            nodes: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: NodeDescriptor) {
        self.nodes.push(node);
    }

    /// 总参数量
    pub fn total_params(&self) -> usize {
        self.nodes.iter().filter_map(|n| n.param_count).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl NodeDescriptor {
    pub fn new(
        id: u64,
        name: &str,
        node_type: NodeTypeDescriptor,
        output_shape: Vec<usize>,
        parents: Vec<u64>,
    ) -> Self {
        let param_count = if matches!(node_type, NodeTypeDescriptor::Parameter) {
            Some(output_shape.iter().product())
        } else {
            None
        };
        Self {
            id,
            name: name.to_string(),
            node_type,
            output_shape,
            parents,
            param_count,
        }
    }
}

impl NodeTypeDescriptor {
    /// 在摘要表格中显示的类型名
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Input => "Input",
            Self::Parameter => "Parameter",
            Self::Add => "Add",
            Self::MatMul => "MatMul",
            Self::Flatten => "Flatten",
            Self::Conv2d { .. } => "Conv2d",
            Self::ChannelBiasAdd => "ChannelBiasAdd",
            Self::MaxPool2d { .. } => "MaxPool2d",
            Self::AvgPool2d { .. } => "AvgPool2d",
            Self::FuzzyPool2d { .. } => "FuzzyPool2d",
            Self::MembershipPenalty { .. } => "MembershipPenalty",
            Self::SoftmaxCrossEntropy => "SoftmaxCE",
        }
    }
}
