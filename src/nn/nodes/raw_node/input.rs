use super::{NodeHandle, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 输入节点：承载样本数据或标签，不参与梯度计算
///
/// 第 0 维视为 batch 维：设置的值只需在其余各维与构建形状一致，
/// 因此同一个图可以处理最后一个较小的 batch。
pub(in crate::nn) struct Input {
    value: Option<Tensor>,
    shape: Vec<usize>,
}

impl Input {
    pub(in crate::nn) fn new(shape: &[usize]) -> Result<Self, GraphError> {
        // 支持 1-4 维：[batch]（类别标签）、[batch, features]、[batch, C, H, W]
        if shape.is_empty() || shape.len() > 4 {
            return Err(GraphError::DimensionMismatch {
                expected: 4,
                got: shape.len(),
                message: format!(
                    "输入张量必须是 1-4 维，但收到的维度是 {} 维",
                    shape.len()
                ),
            });
        }
        if shape.iter().any(|&d| d == 0) {
            return Err(GraphError::InvalidConfiguration(format!(
                "输入形状 {shape:?} 中不能有为 0 的维度"
            )));
        }

        Ok(Self {
            value: None,
            shape: shape.to_vec(),
        })
    }
}

impl TraitNode for Input {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, _parents: &[&NodeHandle]) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(
            "Input 节点被执行了前向传播。不该触及本错误，否则说明crate代码有问题".to_string(),
        ))
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        if let Some(value) = value {
            let got = value.shape();
            if got.len() != self.shape.len() || got[1..] != self.shape[1..] || got[0] == 0 {
                return Err(GraphError::ShapeMismatch {
                    expected: self.shape.clone(),
                    got: got.to_vec(),
                    message: "输入值除 batch 维外必须与构建形状一致，且 batch 不能为 0".to_string(),
                });
            }
        }
        self.value = value.cloned();
        Ok(())
    }

    fn clear_value(&mut self) {
        self.value = None;
    }

    fn calc_grad_to_parent(
        &self,
        _target_parent: &NodeHandle,
        _upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(
            "Input 节点没有父节点，不能计算对父节点的梯度".to_string(),
        ))
    }

    fn grad(&self) -> Option<&Tensor> {
        None
    }

    fn set_grad(&mut self, _grad: Option<&Tensor>) {}
}
