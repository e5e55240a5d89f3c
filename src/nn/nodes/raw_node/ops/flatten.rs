use super::super::{TraitNode, parent_value};
use crate::nn::GraphError;
use crate::nn::nodes::NodeHandle;
use crate::tensor::Tensor;

/// 展平节点：保留第 0 维（batch），其余维度展平。[batch, C, H, W] → [batch, C*H*W]
pub(in crate::nn) struct Flatten {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
}

impl Flatten {
    pub(in crate::nn) fn new(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "Flatten 节点需要恰好 1 个父节点".to_string(),
            ));
        }
        let input_shape = parents[0].value_expected_shape();
        if input_shape.len() < 2 {
            return Err(GraphError::DimensionMismatch {
                expected: 2,
                got: input_shape.len(),
                message: "Flatten 的输入至少需要 2 维 [batch, ...]".to_string(),
            });
        }

        Ok(Self {
            value: None,
            grad: None,
            shape: vec![input_shape[0], input_shape[1..].iter().product()],
        })
    }
}

impl TraitNode for Flatten {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let input = parent_value("Flatten", parents[0])?;
        let batch = input.shape()[0];
        self.value = Some(input.reshape(&[batch, input.size() / batch]));
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
        let target_value = parent_value("Flatten", target_parent)?;
        Ok(upstream_grad.reshape(target_value.shape()))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }
}
