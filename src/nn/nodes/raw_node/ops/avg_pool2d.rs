/*
 * @Description  : 2D 平均池化节点（非重叠窗口，步长 = pool_size）
 *
 * 反向传播把上游梯度均分到窗口内每个位置。
 *
 * 父节点：
 * - parents[0]: 输入数据 [batch, C, H, W]
 */

use super::super::{TraitNode, parent_value};
use crate::nn::GraphError;
use crate::nn::nodes::NodeHandle;
use crate::nn::window::PoolGeometry;
use crate::tensor::Tensor;
use rayon::prelude::*;

pub(in crate::nn) struct AvgPool2d {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    pool_size: usize,
}

impl AvgPool2d {
    pub(in crate::nn) const fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub(in crate::nn) fn new(parents: &[&NodeHandle], pool_size: usize) -> Result<Self, GraphError> {
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "AvgPool2d 节点需要 1 个父节点".to_string(),
            ));
        }
        let geometry = PoolGeometry::new("AvgPool2d", parents[0].value_expected_shape(), pool_size)?;

        Ok(Self {
            value: None,
            grad: None,
            shape: geometry.output_shape(),
            pool_size,
        })
    }
}

impl TraitNode for AvgPool2d {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let input = parent_value("AvgPool2d", parents[0])?;
        let geometry = PoolGeometry::new("AvgPool2d", input.shape(), self.pool_size)?;
        let data = input.data_as_slice();
        let sample_len = geometry.sample_len();
        let n = geometry.window_len() as f32;

        let all_output: Vec<f32> = (0..geometry.batch)
            .into_par_iter()
            .flat_map_iter(|b| {
                let sample = &data[b * sample_len..(b + 1) * sample_len];
                geometry
                    .windows()
                    .map(|(_, offsets)| offsets.iter().map(|&i| sample[i]).sum::<f32>() / n)
                    .collect::<Vec<_>>()
            })
            .collect();

        self.value = Some(Tensor::from_vec(all_output, &geometry.output_shape()));
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
        let input_shape = parent_value("AvgPool2d", target_parent)?.shape();
        let geometry = PoolGeometry::new("AvgPool2d", input_shape, self.pool_size)?;
        let (sample_len, pooled_len) = (geometry.sample_len(), geometry.pooled_sample_len());
        let n = geometry.window_len() as f32;
        let upstream = upstream_grad.data_as_slice();

        let all_grad: Vec<f32> = (0..geometry.batch)
            .into_par_iter()
            .flat_map_iter(|b| {
                let mut sample_grad = vec![0.0f32; sample_len];
                for (out_idx, offsets) in geometry.windows() {
                    let g = upstream[b * pooled_len + out_idx] / n;
                    for i in offsets {
                        sample_grad[i] += g;
                    }
                }
                sample_grad
            })
            .collect();

        Ok(Tensor::from_vec(all_grad, input_shape))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }
}
