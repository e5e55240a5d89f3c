/*
 * @Description  : 非重叠池化窗口的几何信息（窗口大小 = 步长 = pool_size）
 *                 MaxPool2d / AvgPool2d / FuzzyPool2d 共用
 */

use super::GraphError;

/// 一次池化运算的几何信息，输入为 [batch, C, H, W]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolGeometry {
    pub batch: usize,
    pub channels: usize,
    pub height: usize,
    pub width: usize,
    pub pool_size: usize,
}

impl PoolGeometry {
    /// 校验输入形状与 pool_size，返回几何信息
    ///
    /// 空间尺寸必须能被 `pool_size` 整除，否则返回 `InvalidConfiguration`（不做静默截断）
    pub fn new(operator: &str, shape: &[usize], pool_size: usize) -> Result<Self, GraphError> {
        if shape.len() != 4 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 0, 0, 0],
                got: shape.to_vec(),
                message: format!(
                    "{operator} 输入必须是 4D [batch, C, H, W]，得到 {shape:?}。单样本请使用 [1, C, H, W]"
                ),
            });
        }
        if pool_size == 0 {
            return Err(GraphError::InvalidConfiguration(format!(
                "{operator} 的 pool_size 必须 >= 1"
            )));
        }
        let (height, width) = (shape[2], shape[3]);
        if height % pool_size != 0 || width % pool_size != 0 {
            return Err(GraphError::InvalidConfiguration(format!(
                "{operator} 的输入空间尺寸 {height}x{width} 不能被 pool_size={pool_size} 整除"
            )));
        }

        Ok(Self {
            batch: shape[0],
            channels: shape[1],
            height,
            width,
            pool_size,
        })
    }

    pub const fn out_h(&self) -> usize {
        self.height / self.pool_size
    }

    pub const fn out_w(&self) -> usize {
        self.width / self.pool_size
    }

    /// 每个窗口的元素个数 n = pool_size²
    pub const fn window_len(&self) -> usize {
        self.pool_size * self.pool_size
    }

    pub fn output_shape(&self) -> Vec<usize> {
        vec![self.batch, self.channels, self.out_h(), self.out_w()]
    }

    /// 单个样本的输入元素个数 C*H*W
    pub const fn sample_len(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// 单个样本的输出元素个数 C*H'*W'
    pub const fn pooled_sample_len(&self) -> usize {
        self.channels * self.out_h() * self.out_w()
    }

    /// 窗口 (c, oh, ow) 内各元素在单个样本中的偏移（行优先）
    pub fn window_offsets(&self, c: usize, oh: usize, ow: usize) -> Vec<usize> {
        let p = self.pool_size;
        let base = c * self.height * self.width;
        (0..p)
            .flat_map(|r| {
                let row = base + (oh * p + r) * self.width + ow * p;
                row..row + p
            })
            .collect()
    }

    /// 按 (c, oh, ow) 的输出顺序遍历单个样本的所有窗口
    pub fn windows(&self) -> impl Iterator<Item = (usize, Vec<usize>)> + '_ {
        let (out_h, out_w) = (self.out_h(), self.out_w());
        (0..self.channels).flat_map(move |c| {
            (0..out_h).flat_map(move |oh| {
                (0..out_w).map(move |ow| {
                    (
                        c * out_h * out_w + oh * out_w + ow,
                        self.window_offsets(c, oh, ow),
                    )
                })
            })
        })
    }
}
