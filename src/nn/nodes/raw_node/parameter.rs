use super::{NodeHandle, TraitNode};
use crate::nn::GraphError;
use crate::tensor::Tensor;

/// 参数节点：可训练的叶子节点，值由初始化策略或优化器写入
pub(in crate::nn) struct Parameter {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
}

impl Parameter {
    pub(in crate::nn) fn new(shape: &[usize]) -> Result<Self, GraphError> {
        // 支持 2D FC 权重/偏置 [in, out]、[1, out] 与 4D 卷积核 [C_out, C_in, kH, kW]
        if shape.len() < 2 || shape.len() > 4 {
            return Err(GraphError::DimensionMismatch {
                expected: 2,
                got: shape.len(),
                message: format!(
                    "参数张量必须是 2-4 维（支持 FC 权重和 CNN 卷积核），但收到的维度是 {} 维",
                    shape.len()
                ),
            });
        }
        if shape.iter().any(|&d| d == 0) {
            return Err(GraphError::InvalidConfiguration(format!(
                "参数形状 {shape:?} 中不能有为 0 的维度"
            )));
        }

        Ok(Self {
            value: Some(Tensor::zeros(shape)),
            grad: None,
            shape: shape.to_vec(),
        })
    }
}

impl TraitNode for Parameter {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, _parents: &[&NodeHandle]) -> Result<(), GraphError> {
        Err(GraphError::InvalidOperation(
            "Parameter 节点被执行了前向传播。不该触及本错误，否则说明crate代码有问题".to_string(),
        ))
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn set_value(&mut self, value: Option<&Tensor>) -> Result<(), GraphError> {
        match value {
            Some(v) if v.shape() != self.shape.as_slice() => Err(GraphError::ShapeMismatch {
                expected: self.shape.clone(),
                got: v.shape().to_vec(),
                message: "参数值的形状必须与构建形状完全一致".to_string(),
            }),
            Some(v) => {
                self.value = Some(v.clone());
                Ok(())
            }
            None => Err(GraphError::InvalidOperation(
                "参数节点的值不能被清除".to_string(),
            )),
        }
    }

    // 参数值在整个训练过程中保留
    fn clear_value(&mut self) {}

    fn calc_grad_to_parent(
        &self,
        _target_parent: &NodeHandle,
        _upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        Err(GraphError::InvalidOperation(
            "Parameter 节点没有父节点，不能计算对父节点的梯度".to_string(),
        ))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }
}
