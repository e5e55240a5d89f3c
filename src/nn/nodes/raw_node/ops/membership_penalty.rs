/*
 * @Description  : RegP 正则节点：reg_lambda · Σ隶属度² / (batch·C)，输出 [1, 1]
 *
 * 与 FuzzyPool2d 共享同一个父节点（池化前的特征图），
 * 其输出作为辅助损失加到主损失上。
 *
 * 父节点：
 * - parents[0]: 输入数据 [batch, C, H, W]
 */

use super::super::{TraitNode, parent_value};
use crate::nn::GraphError;
use crate::nn::fuzzy;
use crate::nn::nodes::NodeHandle;
use crate::nn::window::PoolGeometry;
use crate::tensor::Tensor;

pub(in crate::nn) struct MembershipPenalty {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    pool_size: usize,
    reg_lambda: f32,
}

impl MembershipPenalty {
    pub(in crate::nn) const fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub(in crate::nn) const fn reg_lambda(&self) -> f32 {
        self.reg_lambda
    }

    pub(in crate::nn) fn new(
        parents: &[&NodeHandle],
        pool_size: usize,
        reg_lambda: f32,
    ) -> Result<Self, GraphError> {
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "MembershipPenalty 节点需要 1 个父节点".to_string(),
            ));
        }
        if !reg_lambda.is_finite() || reg_lambda < 0.0 {
            return Err(GraphError::InvalidConfiguration(format!(
                "reg_lambda 必须是非负有限数，得到 {reg_lambda}"
            )));
        }
        PoolGeometry::new(
            "MembershipPenalty",
            parents[0].value_expected_shape(),
            pool_size,
        )?;

        Ok(Self {
            value: None,
            grad: None,
            shape: vec![1, 1],
            pool_size,
            reg_lambda,
        })
    }
}

impl TraitNode for MembershipPenalty {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let input = parent_value("MembershipPenalty", parents[0])?;
        let penalty = fuzzy::membership_penalty(input, self.pool_size, self.reg_lambda)?;
        self.value = Some(Tensor::from(penalty));
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
        let input = parent_value("MembershipPenalty", target_parent)?;
        let upstream = upstream_grad.get_data_number().ok_or_else(|| {
            GraphError::ComputationError("MembershipPenalty 的上游梯度必须是标量".to_string())
        })?;
        fuzzy::membership_penalty_backward(input, self.pool_size, self.reg_lambda, upstream)
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }
}
