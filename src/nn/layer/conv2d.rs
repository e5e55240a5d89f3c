/*
 * @Description  : Conv2d (2D 卷积) 层
 *
 * 输入/输出形状：
 * - 输入：[batch_size, in_channels, H, W]
 * - 输出：[batch_size, out_channels, H', W']
 *
 * 输出尺寸计算：
 * H' = (H + 2*padding_h - kernel_h) / stride_h + 1
 * W' = (W + 2*padding_w - kernel_w) / stride_w + 1
 *
 * 计算：output = conv2d(x, K) + b
 */

use crate::nn::{Graph, GraphError, Init, Module, Var, VarConvOps};

/// Conv2d (2D 卷积) 层
///
/// # 使用示例
/// ```ignore
/// let conv = Conv2d::new(&graph, 1, 8, (3, 3), (1, 1), (1, 1), true, "conv1")?;
/// let features = conv.forward(&x)?;
/// ```
pub struct Conv2d {
    /// 卷积核参数 [out_channels, in_channels, kernel_h, kernel_w]
    kernel: Var,
    /// 偏置参数 [1, out_channels]（可选）
    bias: Option<Var>,
    in_channels: usize,
    out_channels: usize,
    kernel_size: (usize, usize),
    stride: (usize, usize),
    padding: (usize, usize),
}

impl Conv2d {
    /// 创建新的 Conv2d 层
    ///
    /// # 参数
    /// - `graph`: 计算图句柄
    /// - `in_channels`: 输入通道数
    /// - `out_channels`: 输出通道数
    /// - `kernel_size`: 卷积核大小 (kH, kW)
    /// - `stride`: 步长 (sH, sW)
    /// - `padding`: 填充 (pH, pW)
    /// - `use_bias`: 是否使用偏置
    /// - `name`: 层名称前缀
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &Graph,
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
        use_bias: bool,
        name: &str,
    ) -> Result<Self, GraphError> {
        if in_channels == 0 || out_channels == 0 {
            return Err(GraphError::InvalidConfiguration(format!(
                "Conv2d 层 {name} 的通道数必须大于 0，得到 {in_channels}→{out_channels}"
            )));
        }
        let (k_h, k_w) = kernel_size;

        let kernel = graph.parameter(
            &[out_channels, in_channels, k_h, k_w],
            Init::Kaiming,
            &format!("{name}_K"),
        )?;
        let bias = if use_bias {
            Some(graph.parameter(&[1, out_channels], Init::Zeros, &format!("{name}_b"))?)
        } else {
            None
        };

        Ok(Self {
            kernel,
            bias,
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
        })
    }

    /// 前向传播：`conv2d(x, K) + b`
    pub fn forward(&self, x: &Var) -> Result<Var, GraphError> {
        let conv = x.conv2d(&self.kernel, self.stride, self.padding)?;
        match &self.bias {
            Some(bias) => conv.channel_bias_add(bias),
            None => Ok(conv),
        }
    }

    pub const fn in_channels(&self) -> usize {
        self.in_channels
    }

    pub const fn out_channels(&self) -> usize {
        self.out_channels
    }

    pub const fn kernel_size(&self) -> (usize, usize) {
        self.kernel_size
    }

    pub const fn stride(&self) -> (usize, usize) {
        self.stride
    }

    pub const fn padding(&self) -> (usize, usize) {
        self.padding
    }

    pub const fn kernel(&self) -> &Var {
        &self.kernel
    }

    pub const fn bias(&self) -> Option<&Var> {
        self.bias.as_ref()
    }
}

impl Module for Conv2d {
    fn parameters(&self) -> Vec<Var> {
        let mut params = vec![self.kernel.clone()];
        if let Some(bias) = &self.bias {
            params.push(bias.clone());
        }
        params
    }
}
