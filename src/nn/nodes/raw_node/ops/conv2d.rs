/*
 * @Description  : 2D 卷积节点（PyTorch 风格）
 *
 * - Batch-First 格式：输入 [batch, C_in, H, W]，卷积核 [C_out, C_in, kH, kW]
 * - 输出 [batch, C_out, H', W']
 * - 使用 Rayon 在 batch 维度并行
 *
 * 父节点：
 * - parents[0]: 输入数据
 * - parents[1]: 卷积核参数
 */

use super::super::{TraitNode, parent_value};
use crate::nn::GraphError;
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;
use rayon::prelude::*;

pub(in crate::nn) struct Conv2d {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    parents_ids: Vec<NodeId>, // [input_id, kernel_id]
    kernel_size: (usize, usize),
    stride: (usize, usize),
    padding: (usize, usize),
    // 前向缓存（用于反向传播）
    padded_input: Option<Tensor>,
}

impl Conv2d {
    pub(in crate::nn) const fn stride(&self) -> (usize, usize) {
        self.stride
    }

    pub(in crate::nn) const fn padding(&self) -> (usize, usize) {
        self.padding
    }

    pub(in crate::nn) fn new(
        parents: &[&NodeHandle],
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Self, GraphError> {
        // 1. 验证父节点数量
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "Conv2d 节点需要 2 个父节点：[输入, 卷积核]".to_string(),
            ));
        }
        if stride.0 == 0 || stride.1 == 0 {
            return Err(GraphError::InvalidConfiguration(
                "Conv2d 的步长必须 >= 1".to_string(),
            ));
        }

        let input_shape = parents[0].value_expected_shape();
        let kernel_shape = parents[1].value_expected_shape();

        // 2. 验证卷积核形状：必须是 4D [C_out, C_in, kH, kW]
        if kernel_shape.len() != 4 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: kernel_shape.to_vec(),
                message: format!("卷积核必须是 4D [C_out, C_in, kH, kW]，得到 {kernel_shape:?}"),
            });
        }
        let (out_channels, in_channels, kernel_h, kernel_w) = (
            kernel_shape[0],
            kernel_shape[1],
            kernel_shape[2],
            kernel_shape[3],
        );

        // 3. 验证输入形状：必须是 4D [batch, C_in, H, W]
        if input_shape.len() != 4 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: input_shape.to_vec(),
                message: format!(
                    "Conv2d 输入必须是 4D [batch, C_in, H, W]，得到 {input_shape:?}。单样本请使用 [1, C_in, H, W]"
                ),
            });
        }

        // 4. 验证通道数匹配
        if input_shape[1] != in_channels {
            return Err(GraphError::ShapeMismatch {
                expected: vec![in_channels],
                got: vec![input_shape[1]],
                message: format!(
                    "输入通道数 {} 与卷积核输入通道数 {in_channels} 不匹配",
                    input_shape[1]
                ),
            });
        }

        // 5. 计算输出尺寸
        let (padded_h, padded_w) = (
            input_shape[2] + 2 * padding.0,
            input_shape[3] + 2 * padding.1,
        );
        if kernel_h > padded_h || kernel_w > padded_w {
            return Err(GraphError::InvalidOperation(format!(
                "卷积核 {kernel_h}x{kernel_w} 超出填充后的输入尺寸 {padded_h}x{padded_w}"
            )));
        }
        let output_h = (padded_h - kernel_h) / stride.0 + 1;
        let output_w = (padded_w - kernel_w) / stride.1 + 1;

        Ok(Self {
            value: None,
            grad: None,
            shape: vec![input_shape[0], out_channels, output_h, output_w],
            parents_ids: vec![parents[0].id(), parents[1].id()],
            kernel_size: (kernel_h, kernel_w),
            stride,
            padding,
            padded_input: None,
        })
    }

    /// 对输入进行零填充（Rayon 并行）
    fn pad_input(&self, input: &Tensor) -> Tensor {
        let (pad_h, pad_w) = self.padding;
        if pad_h == 0 && pad_w == 0 {
            return input.clone();
        }

        let shape = input.shape();
        let (batch_size, c, h, w) = (shape[0], shape[1], shape[2], shape[3]);
        let (new_h, new_w) = (h + 2 * pad_h, w + 2 * pad_w);
        let single_sample_size = c * new_h * new_w;

        let batch_results: Vec<Vec<f32>> = (0..batch_size)
            .into_par_iter()
            .map(|b| {
                let mut sample_data = vec![0.0f32; single_sample_size];
                for ci in 0..c {
                    for hi in 0..h {
                        for wi in 0..w {
                            let idx = ci * new_h * new_w + (hi + pad_h) * new_w + (wi + pad_w);
                            sample_data[idx] = input[[b, ci, hi, wi]];
                        }
                    }
                }
                sample_data
            })
            .collect();

        let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
        Tensor::from_vec(all_data, &[batch_size, c, new_h, new_w])
    }

    /// 在已填充的输入上执行卷积（Rayon 并行）
    fn convolve(&self, padded: &Tensor, kernel: &Tensor) -> Tensor {
        let shape = padded.shape();
        let (batch_size, in_c, in_h, in_w) = (shape[0], shape[1], shape[2], shape[3]);
        let out_c = kernel.shape()[0];
        let (k_h, k_w) = self.kernel_size;
        let (stride_h, stride_w) = self.stride;
        let out_h = (in_h - k_h) / stride_h + 1;
        let out_w = (in_w - k_w) / stride_w + 1;
        let single_sample_size = out_c * out_h * out_w;

        let batch_results: Vec<Vec<f32>> = (0..batch_size)
            .into_par_iter()
            .map(|b| {
                let mut sample_data = vec![0.0f32; single_sample_size];
                for oc in 0..out_c {
                    for oh in 0..out_h {
                        for ow in 0..out_w {
                            let (h_start, w_start) = (oh * stride_h, ow * stride_w);
                            let mut sum = 0.0f32;
                            for ic in 0..in_c {
                                for kh in 0..k_h {
                                    for kw in 0..k_w {
                                        sum += padded[[b, ic, h_start + kh, w_start + kw]]
                                            * kernel[[oc, ic, kh, kw]];
                                    }
                                }
                            }
                            sample_data[oc * out_h * out_w + oh * out_w + ow] = sum;
                        }
                    }
                }
                sample_data
            })
            .collect();

        let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
        Tensor::from_vec(all_data, &[batch_size, out_c, out_h, out_w])
    }
}

impl TraitNode for Conv2d {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let input = parent_value("Conv2d", parents[0])?;
        let kernel = parent_value("Conv2d", parents[1])?;
        if input.dimension() != 4 {
            return Err(GraphError::DimensionMismatch {
                expected: 4,
                got: input.dimension(),
                message: "Conv2d 输入必须是 4D [batch, C_in, H, W]".to_string(),
            });
        }

        let padded = self.pad_input(input);
        self.value = Some(self.convolve(&padded, kernel));
        self.padded_input = Some(padded);
        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) {
        self.value = None;
        self.padded_input = None;
    }

    /// 对 Y = conv(X, K)：
    /// - dL/dX：上游梯度与卷积核的转置卷积（去掉填充部分）
    /// - dL/dK：填充后的输入与上游梯度的相关运算，跨 batch 累加
    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        let padded_input = self
            .padded_input
            .as_ref()
            .ok_or_else(|| GraphError::ComputationError("缺少填充后的输入缓存".to_string()))?;
        let is_input = target_parent.id() == self.parents_ids[0];
        let kernel = if is_input {
            let assistant = assistant_parent.ok_or_else(|| {
                GraphError::ComputationError("计算输入梯度需要卷积核".to_string())
            })?;
            parent_value("Conv2d", assistant)?
        } else {
            parent_value("Conv2d", target_parent)?
        };

        let grad_shape = upstream_grad.shape();
        let (batch_size, out_c, out_h, out_w) =
            (grad_shape[0], grad_shape[1], grad_shape[2], grad_shape[3]);
        let (k_h, k_w) = self.kernel_size;
        let (stride_h, stride_w) = self.stride;
        let (pad_h, pad_w) = self.padding;
        let in_c = padded_input.shape()[1];

        if is_input {
            let input_shape = parent_value("Conv2d", target_parent)?.shape().to_vec();
            let (in_h, in_w) = (input_shape[2], input_shape[3]);
            let single_sample_size = in_c * in_h * in_w;

            let batch_results: Vec<Vec<f32>> = (0..batch_size)
                .into_par_iter()
                .map(|b| {
                    let mut sample_grad = vec![0.0f32; single_sample_size];
                    for oc in 0..out_c {
                        for oh in 0..out_h {
                            for ow in 0..out_w {
                                let grad_val = upstream_grad[[b, oc, oh, ow]];
                                for ic in 0..in_c {
                                    for kh in 0..k_h {
                                        for kw in 0..k_w {
                                            // 填充坐标 -> 原始坐标，落在填充区的跳过
                                            let ph = oh * stride_h + kh;
                                            let pw = ow * stride_w + kw;
                                            if ph < pad_h || pw < pad_w {
                                                continue;
                                            }
                                            let (ih, iw) = (ph - pad_h, pw - pad_w);
                                            if ih >= in_h || iw >= in_w {
                                                continue;
                                            }
                                            sample_grad[ic * in_h * in_w + ih * in_w + iw] +=
                                                grad_val * kernel[[oc, ic, kh, kw]];
                                        }
                                    }
                                }
                            }
                        }
                    }
                    sample_grad
                })
                .collect();

            let all_data: Vec<f32> = batch_results.into_iter().flatten().collect();
            Ok(Tensor::from_vec(all_data, &input_shape))
        } else {
            let kernel_len = out_c * in_c * k_h * k_w;

            // 各样本分别计算后累加
            let kernel_grad = (0..batch_size)
                .into_par_iter()
                .map(|b| {
                    let mut sample_grad = vec![0.0f32; kernel_len];
                    for oc in 0..out_c {
                        for oh in 0..out_h {
                            for ow in 0..out_w {
                                let grad_val = upstream_grad[[b, oc, oh, ow]];
                                let (h_start, w_start) = (oh * stride_h, ow * stride_w);
                                for ic in 0..in_c {
                                    for kh in 0..k_h {
                                        for kw in 0..k_w {
                                            let idx = ((oc * in_c + ic) * k_h + kh) * k_w + kw;
                                            sample_grad[idx] += grad_val
                                                * padded_input
                                                    [[b, ic, h_start + kh, w_start + kw]];
                                        }
                                    }
                                }
                            }
                        }
                    }
                    sample_grad
                })
                .reduce(
                    || vec![0.0f32; kernel_len],
                    |mut acc, g| {
                        acc.iter_mut().zip(g).for_each(|(a, v)| *a += v);
                        acc
                    },
                );

            Ok(Tensor::from_vec(kernel_grad, kernel.shape()))
        }
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }
}
