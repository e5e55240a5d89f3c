/*
 * @Description  : 2D 最大池化节点（非重叠窗口，步长 = pool_size）
 *
 * 记录最大值位置用于反向传播（稀疏梯度）。使用 Rayon 在 batch 维度并行。
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

pub(in crate::nn) struct MaxPool2d {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    pool_size: usize,
    // 每个输出位置对应的最大值在样本内的偏移（按 batch 拼接）
    max_indices: Option<Vec<usize>>,
}

impl MaxPool2d {
    pub(in crate::nn) const fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub(in crate::nn) fn new(parents: &[&NodeHandle], pool_size: usize) -> Result<Self, GraphError> {
        if parents.len() != 1 {
            return Err(GraphError::InvalidOperation(
                "MaxPool2d 节点需要 1 个父节点".to_string(),
            ));
        }
        let geometry = PoolGeometry::new("MaxPool2d", parents[0].value_expected_shape(), pool_size)?;

        Ok(Self {
            value: None,
            grad: None,
            shape: geometry.output_shape(),
            pool_size,
            max_indices: None,
        })
    }
}

impl TraitNode for MaxPool2d {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let input = parent_value("MaxPool2d", parents[0])?;
        let geometry = PoolGeometry::new("MaxPool2d", input.shape(), self.pool_size)?;
        let data = input.data_as_slice();
        let sample_len = geometry.sample_len();

        let batch_results: Vec<(Vec<f32>, Vec<usize>)> = (0..geometry.batch)
            .into_par_iter()
            .map(|b| {
                let sample = &data[b * sample_len..(b + 1) * sample_len];
                let mut output = vec![0.0f32; geometry.pooled_sample_len()];
                let mut indices = vec![0usize; geometry.pooled_sample_len()];
                for (out_idx, offsets) in geometry.windows() {
                    let (best, max_val) = offsets.iter().fold(
                        (offsets[0], f32::NEG_INFINITY),
                        |(best, max_val), &i| {
                            if sample[i] > max_val { (i, sample[i]) } else { (best, max_val) }
                        },
                    );
                    output[out_idx] = max_val;
                    indices[out_idx] = best;
                }
                (output, indices)
            })
            .collect();

        let mut all_output = Vec::with_capacity(geometry.batch * geometry.pooled_sample_len());
        let mut all_indices = Vec::with_capacity(geometry.batch * geometry.pooled_sample_len());
        for (output, indices) in batch_results {
            all_output.extend(output);
            all_indices.extend(indices);
        }

        self.value = Some(Tensor::from_vec(all_output, &geometry.output_shape()));
        self.max_indices = Some(all_indices);
        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) {
        self.value = None;
        self.max_indices = None;
    }

    /// 最大值位置：梯度 = 上游梯度；其他位置：0
    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        let max_indices = self
            .max_indices
            .as_ref()
            .ok_or_else(|| GraphError::ComputationError("缺少最大值索引缓存".to_string()))?;
        let input_shape = parent_value("MaxPool2d", target_parent)?.shape();
        let geometry = PoolGeometry::new("MaxPool2d", input_shape, self.pool_size)?;
        let (sample_len, pooled_len) = (geometry.sample_len(), geometry.pooled_sample_len());

        let mut grad = vec![0.0f32; geometry.batch * sample_len];
        for (k, &g) in upstream_grad.data_as_slice().iter().enumerate() {
            let b = k / pooled_len;
            grad[b * sample_len + max_indices[k]] += g;
        }
        Ok(Tensor::from_vec(grad, input_shape))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }
}
