/*
 * @Description  : ChannelBiasAdd 节点：卷积层的通道级偏置广播
 *
 * output[b, c, h, w] = input[b, c, h, w] + bias[0, c]
 *
 * 父节点：
 * - parents[0]: input，形状 [batch, C, H, W]
 * - parents[1]: bias，形状 [1, C]
 */

use super::super::{TraitNode, parent_value};
use crate::nn::GraphError;
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;

pub(in crate::nn) struct ChannelBiasAdd {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    parents_ids: Vec<NodeId>, // [input_id, bias_id]
}

impl ChannelBiasAdd {
    pub(in crate::nn) fn new(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        // 1. 验证父节点数量
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "ChannelBiasAdd 节点需要恰好 2 个父节点（input 和 bias）".to_string(),
            ));
        }

        let input_shape = parents[0].value_expected_shape();
        let bias_shape = parents[1].value_expected_shape();

        // 2. 验证 input 形状
        if input_shape.len() != 4 {
            return Err(GraphError::DimensionMismatch {
                expected: 4,
                got: input_shape.len(),
                message: format!(
                    "ChannelBiasAdd 的 input 必须是 4D [batch, C, H, W]，实际为 {input_shape:?}"
                ),
            });
        }

        // 3. 验证 bias 形状为 [1, C]
        if bias_shape != [1, input_shape[1]] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![1, input_shape[1]],
                got: bias_shape.to_vec(),
                message: "ChannelBiasAdd 的 bias 必须是 [1, C]，C 与 input 通道数一致".to_string(),
            });
        }

        Ok(Self {
            value: None,
            grad: None,
            shape: input_shape.to_vec(),
            parents_ids: vec![parents[0].id(), parents[1].id()],
        })
    }
}

impl TraitNode for ChannelBiasAdd {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let input = parent_value("ChannelBiasAdd", parents[0])?;
        let bias = parent_value("ChannelBiasAdd", parents[1])?;

        let shape = input.shape();
        let plane = shape[2] * shape[3];
        let channels = shape[1];
        let bias_data = bias.data_as_slice();

        let data: Vec<f32> = input
            .data_as_slice()
            .iter()
            .enumerate()
            .map(|(i, &x)| x + bias_data[(i / plane) % channels])
            .collect();
        self.value = Some(Tensor::from_vec(data, shape));
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
        if target_parent.id() == self.parents_ids[0] {
            // 对 input：梯度直接传递
            return Ok(upstream_grad.clone());
        }

        // 对 bias：在 (batch, H, W) 上求和
        let shape = upstream_grad.shape();
        let (channels, plane) = (shape[1], shape[2] * shape[3]);
        let mut grad = vec![0.0f32; channels];
        for (i, &g) in upstream_grad.data_as_slice().iter().enumerate() {
            grad[(i / plane) % channels] += g;
        }
        Ok(Tensor::from_vec(grad, &[1, channels]))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }
}
