/*
 * @Description  : 加法节点（支持 NumPy 风格广播）
 *
 * 反向传播时把上游梯度沿被广播的维度求和，还原为父节点的形状。
 * 典型用途：Linear 层的 [batch, out] + [1, out]，以及 损失 + 正则项。
 */

use super::super::{TraitNode, parent_value};
use crate::nn::GraphError;
use crate::nn::nodes::NodeHandle;
use crate::tensor::Tensor;

pub(in crate::nn) struct Add {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
}

/// 按 NumPy 规则计算两个形状广播后的形状
fn broadcast_shape(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let len = a.len().max(b.len());
    let dim_at = |s: &[usize], i: usize| {
        if i < len - s.len() { 1 } else { s[i - (len - s.len())] }
    };
    (0..len)
        .map(|i| match (dim_at(a, i), dim_at(b, i)) {
            (x, y) if x == y => Some(x),
            (1, y) => Some(y),
            (x, 1) => Some(x),
            _ => None,
        })
        .collect()
}

impl Add {
    pub(in crate::nn) fn new(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        // 1. 验证父节点数量
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "Add 节点需要恰好 2 个父节点".to_string(),
            ));
        }

        // 2. 验证形状可广播
        let (left, right) = (
            parents[0].value_expected_shape(),
            parents[1].value_expected_shape(),
        );
        let shape = broadcast_shape(left, right).ok_or_else(|| GraphError::ShapeMismatch {
            expected: left.to_vec(),
            got: right.to_vec(),
            message: "Add 节点的两个父节点形状无法广播".to_string(),
        })?;

        Ok(Self {
            value: None,
            grad: None,
            shape,
        })
    }
}

impl TraitNode for Add {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let left = parent_value("Add", parents[0])?;
        let right = parent_value("Add", parents[1])?;
        if !left.can_broadcast_with(right) {
            return Err(GraphError::ShapeMismatch {
                expected: left.shape().to_vec(),
                got: right.shape().to_vec(),
                message: "Add 节点的两个父节点的值无法广播".to_string(),
            });
        }
        self.value = Some(left + right);
        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) {
        self.value = None;
    }

    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        let target_value = parent_value("Add", target_parent)?;
        Ok(upstream_grad.sum_to_shape(target_value.shape()))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }
}
