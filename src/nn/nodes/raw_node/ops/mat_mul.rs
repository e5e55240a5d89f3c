use super::super::{TraitNode, parent_value};
use crate::nn::GraphError;
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;

/// 矩阵乘法节点：[batch, K] · [K, N] → [batch, N]
pub(in crate::nn) struct MatMul {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    parents_ids: Vec<NodeId>, // [left_id, right_id]
}

impl MatMul {
    pub(in crate::nn) fn new(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        // 1. 验证父节点数量
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "MatMul 节点需要恰好 2 个父节点".to_string(),
            ));
        }

        // 2. 验证两个父节点都是 2D，且内维一致
        let (left, right) = (
            parents[0].value_expected_shape(),
            parents[1].value_expected_shape(),
        );
        if left.len() != 2 || right.len() != 2 {
            return Err(GraphError::DimensionMismatch {
                expected: 2,
                got: left.len().max(right.len()),
                message: format!("MatMul 只支持 2D 矩阵，得到 {left:?} 与 {right:?}"),
            });
        }
        if left[1] != right[0] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![left[1], right[1]],
                got: right.to_vec(),
                message: format!("MatMul 左矩阵列数 {} 与右矩阵行数 {} 不一致", left[1], right[0]),
            });
        }

        Ok(Self {
            value: None,
            grad: None,
            shape: vec![left[0], right[1]],
            parents_ids: vec![parents[0].id(), parents[1].id()],
        })
    }
}

impl TraitNode for MatMul {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let left = parent_value("MatMul", parents[0])?;
        let right = parent_value("MatMul", parents[1])?;
        self.value = Some(left.mat_mul(right));
        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) {
        self.value = None;
    }

    /// 对 Y = L·R：dL = dY·Rᵀ，dR = Lᵀ·dY
    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        let assistant = assistant_parent.ok_or_else(|| {
            GraphError::ComputationError("MatMul 计算梯度需要另一个父节点".to_string())
        })?;
        let other = parent_value("MatMul", assistant)?;

        if target_parent.id() == self.parents_ids[0] {
            Ok(upstream_grad.mat_mul(&other.transpose()))
        } else {
            Ok(other.transpose().mat_mul(upstream_grad))
        }
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }
}
