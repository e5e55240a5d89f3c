/*
 * @Description  : 节点句柄：包装原始节点（raw_node），附加 id 与名称
 */

use super::raw_node::{
    Add, AvgPool2d, ChannelBiasAdd, Conv2d, Flatten, FuzzyPool2d, Input, MatMul, MaxPool2d,
    MembershipPenalty, NodeType, Parameter, SoftmaxCrossEntropy, TraitNode,
};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 节点 ID（图内唯一，从 1 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(in crate::nn) struct NodeHandle {
    id: NodeId,
    name: String,
    raw_node: NodeType,
}

impl NodeHandle {
    fn new<T: Into<NodeType>>(raw_node: T) -> Self {
        Self {
            id: NodeId(0),
            name: String::new(),
            raw_node: raw_node.into(),
        }
    }

    /// 节点加入图时由图分配 id 与名称
    pub(in crate::nn) fn bind_id_and_name(&mut self, id: NodeId, name: &str) {
        self.id = id;
        self.name = name.to_string();
    }

    // ========== 构造 ==========

    pub(in crate::nn) fn new_input(shape: &[usize]) -> Result<Self, GraphError> {
        Ok(Self::new(Input::new(shape)?))
    }

    pub(in crate::nn) fn new_parameter(shape: &[usize]) -> Result<Self, GraphError> {
        Ok(Self::new(Parameter::new(shape)?))
    }

    pub(in crate::nn) fn new_add(parents: &[&Self]) -> Result<Self, GraphError> {
        Ok(Self::new(Add::new(parents)?))
    }

    pub(in crate::nn) fn new_mat_mul(parents: &[&Self]) -> Result<Self, GraphError> {
        Ok(Self::new(MatMul::new(parents)?))
    }

    pub(in crate::nn) fn new_conv2d(
        parents: &[&Self],
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Self, GraphError> {
        Ok(Self::new(Conv2d::new(parents, stride, padding)?))
    }

    pub(in crate::nn) fn new_channel_bias_add(parents: &[&Self]) -> Result<Self, GraphError> {
        Ok(Self::new(ChannelBiasAdd::new(parents)?))
    }

    pub(in crate::nn) fn new_flatten(parents: &[&Self]) -> Result<Self, GraphError> {
        Ok(Self::new(Flatten::new(parents)?))
    }

    pub(in crate::nn) fn new_max_pool2d(
        parents: &[&Self],
        pool_size: usize,
    ) -> Result<Self, GraphError> {
        Ok(Self::new(MaxPool2d::new(parents, pool_size)?))
    }

    pub(in crate::nn) fn new_avg_pool2d(
        parents: &[&Self],
        pool_size: usize,
    ) -> Result<Self, GraphError> {
        Ok(Self::new(AvgPool2d::new(parents, pool_size)?))
    }

    pub(in crate::nn) fn new_fuzzy_pool2d(
        parents: &[&Self],
        pool_size: usize,
    ) -> Result<Self, GraphError> {
        Ok(Self::new(FuzzyPool2d::new(parents, pool_size)?))
    }

    pub(in crate::nn) fn new_membership_penalty(
        parents: &[&Self],
        pool_size: usize,
        reg_lambda: f32,
    ) -> Result<Self, GraphError> {
        Ok(Self::new(MembershipPenalty::new(
            parents, pool_size, reg_lambda,
        )?))
    }

    pub(in crate::nn) fn new_softmax_cross_entropy(parents: &[&Self]) -> Result<Self, GraphError> {
        Ok(Self::new(SoftmaxCrossEntropy::new(parents)?))
    }

    // ========== 访问器 ==========

    pub(in crate::nn) const fn id(&self) -> NodeId {
        self.id
    }

    pub(in crate::nn) fn name(&self) -> &str {
        &self.name
    }

    pub(in crate::nn) const fn node_type(&self) -> &NodeType {
        &self.raw_node
    }

    pub(in crate::nn) fn type_name(&self) -> &'static str {
        self.raw_node.type_name()
    }

    /// 叶子节点（Input/Parameter）的值只能通过 `set_value` 设置
    pub(in crate::nn) const fn is_leaf(&self) -> bool {
        matches!(self.raw_node, NodeType::Input(_) | NodeType::Parameter(_))
    }

    pub(in crate::nn) fn value_expected_shape(&self) -> &[usize] {
        self.raw_node.value_expected_shape()
    }

    pub(in crate::nn) fn value(&self) -> Option<&Tensor> {
        self.raw_node.value()
    }

    pub(in crate::nn) fn has_value(&self) -> bool {
        self.raw_node.value().is_some()
    }

    pub(in crate::nn) fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        self.raw_node.set_value(value)
    }

    pub(in crate::nn) fn clear_value(&mut self) {
        self.raw_node.clear_value();
    }

    pub(in crate::nn) fn grad(&self) -> Option<&Tensor> {
        self.raw_node.grad()
    }

    pub(in crate::nn) fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.raw_node.set_grad(grad);
    }

    pub(in crate::nn) fn clear_grad(&mut self) {
        self.raw_node.set_grad(None);
    }

    // ========== 计算 ==========

    pub(in crate::nn) fn calc_value_by_parents(
        &mut self,
        parents: &[&Self],
    ) -> Result<(), GraphError> {
        for parent in parents {
            if !parent.has_value() {
                return Err(GraphError::ComputationError(format!(
                    "{}的父{}没有值",
                    self, parent
                )));
            }
        }
        self.raw_node.calc_value_by_parents(parents)
    }

    pub(in crate::nn) fn calc_grad_to_parent(
        &self,
        target_parent: &Self,
        upstream_grad: &Tensor,
        assistant_parent: Option<&Self>,
    ) -> Result<Tensor, GraphError> {
        self.raw_node
            .calc_grad_to_parent(target_parent, upstream_grad, assistant_parent)
    }
}

impl std::fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "节点[id={}, name={}, type={}]",
            self.id,
            self.name,
            self.type_name()
        )
    }
}
