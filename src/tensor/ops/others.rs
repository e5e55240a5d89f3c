use crate::tensor::Tensor;

impl From<f32> for Tensor {
    /// 将`f32`转换为形状为`[1, 1]`的标量张量（与损失节点的输出形状一致）
    fn from(scalar: f32) -> Self {
        Self::new(&[scalar], &[1, 1])
    }
}

impl Tensor {
    /// 所有元素求和，返回纯数
    pub fn sum(&self) -> f32 {
        self.data.sum()
    }

    /// 所有元素的均值
    pub fn mean(&self) -> f32 {
        if self.size() == 0 {
            return 0.0;
        }
        self.sum() / self.size() as f32
    }

    pub fn sqrt(&self) -> Self {
        self.map(f32::sqrt)
    }

    /// 逐元素映射
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Self {
        Self::from_array(self.data.mapv(f))
    }

    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    pub fn min_value(&self) -> f32 {
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }
}
