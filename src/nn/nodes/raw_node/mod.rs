/*
 * @Description  : 原始节点（raw node）：各类节点的具体计算逻辑
 *
 * 所有节点通过 `enum_dispatch` 统一分发到 `TraitNode`。
 * 反向传播采用 VJP（向量-雅可比积）模式：`calc_grad_to_parent` 直接返回
 * 对某个父节点的梯度（形状与该父节点的值相同），而不构造完整的雅可比矩阵。
 */

mod input;
mod loss;
mod ops;
mod parameter;

pub(in crate::nn) use input::Input;
pub(in crate::nn) use loss::SoftmaxCrossEntropy;
pub(in crate::nn) use ops::*;
pub(in crate::nn) use parameter::Parameter;

use super::NodeHandle;
use crate::nn::GraphError;
use crate::tensor::Tensor;
use enum_dispatch::enum_dispatch;

#[enum_dispatch]
pub(in crate::nn) enum NodeType {
    Input(Input),
    Parameter(Parameter),
    Add(Add),
    MatMul(MatMul),
    Conv2d(Conv2d),
    ChannelBiasAdd(ChannelBiasAdd),
    Flatten(Flatten),
    MaxPool2d(MaxPool2d),
    AvgPool2d(AvgPool2d),
    FuzzyPool2d(FuzzyPool2d),
    MembershipPenalty(MembershipPenalty),
    SoftmaxCrossEntropy(SoftmaxCrossEntropy),
}

impl NodeType {
    pub(in crate::nn) const fn type_name(&self) -> &'static str {
        match self {
            Self::Input(_) => "Input",
            Self::Parameter(_) => "Parameter",
            Self::Add(_) => "Add",
            Self::MatMul(_) => "MatMul",
            Self::Conv2d(_) => "Conv2d",
            Self::ChannelBiasAdd(_) => "ChannelBiasAdd",
            Self::Flatten(_) => "Flatten",
            Self::MaxPool2d(_) => "MaxPool2d",
            Self::AvgPool2d(_) => "AvgPool2d",
            Self::FuzzyPool2d(_) => "FuzzyPool2d",
            Self::MembershipPenalty(_) => "MembershipPenalty",
            Self::SoftmaxCrossEntropy(_) => "SoftmaxCE",
        }
    }
}

#[enum_dispatch(NodeType)]
pub(in crate::nn) trait TraitNode {
    /// 构建时推断出的输出形状（第 0 维为 batch 的节点，实际 batch 可以不同）
    fn value_expected_shape(&self) -> &[usize];

    /// 根据父节点的值计算本节点的值（调用方已保证所有父节点都有值）
    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError>;

    fn value(&self) -> Option<&Tensor>;

    fn set_value(&mut self, _value: Option<&Tensor>) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(
            "该类型节点的值由父节点计算得到，不应手动设置".to_string(),
        ))
    }

    /// 清除值及前向缓存
    fn clear_value(&mut self);

    /// 计算本节点对 `target_parent` 的梯度（VJP）
    ///
    /// - `upstream_grad`: 损失对本节点输出的梯度，形状与本节点的值相同
    /// - `assistant_parent`: 双父节点运算中的另一个父节点
    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError>;

    fn grad(&self) -> Option<&Tensor>;

    fn set_grad(&mut self, grad: Option<&Tensor>);
}

/// 取出父节点的值（调用方已保证父节点有值，这里只做兜底）
pub(in crate::nn) fn parent_value<'a>(
    node_type: &str,
    parent: &'a NodeHandle,
) -> Result<&'a Tensor, GraphError> {
    parent.value().ok_or_else(|| {
        GraphError::ComputationError(format!(
            "{node_type}的父{parent}没有值。不该触及本错误，否则说明crate代码有问题"
        ))
    })
}
