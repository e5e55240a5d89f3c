/*
 * @Description  : 2D 模糊池化节点（非重叠窗口，步长 = pool_size）
 *
 * 数值计算见 `nn::fuzzy`。节点不缓存窗口统计量，反向传播时由父节点的值重新计算。
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

pub(in crate::nn) struct FuzzyPool2d {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    pool_size: usize,
}

impl FuzzyPool2d {
    pub(in crate::nn) const fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub(in crate::nn) fn new(parents: &[&NodeHandle], pool_size: usize) -> Result<Self, GraphError> {
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "FuzzyPool2d 节点需要 1 个父节点".to_string(),
            ));
        }
        let geometry =
            PoolGeometry::new("FuzzyPool2d", parents[0].value_expected_shape(), pool_size)?;

        Ok(Self {
            value: None,
            grad: None,
            shape: geometry.output_shape(),
            pool_size,
        })
    }
}

impl TraitNode for FuzzyPool2d {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let input = parent_value("FuzzyPool2d", parents[0])?;
        let (output, _) = fuzzy::fuzzy_pool2d(input, self.pool_size, None)?;
        self.value = Some(output);
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
        let input = parent_value("FuzzyPool2d", target_parent)?;
        fuzzy::fuzzy_pool2d_backward(input, self.pool_size, upstream_grad)
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }
}
