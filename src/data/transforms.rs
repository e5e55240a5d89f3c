//! 数据变换函数

use crate::tensor::Tensor;

/// 将 0-255 像素值归一化到 0-1
pub fn normalize_pixels(tensor: &Tensor) -> Tensor {
    tensor / 255.0
}

/// 按给定均值/标准差标准化：`(x - mean) / std`
///
/// # Panics
/// `std` 不是正数时
pub fn standardize(tensor: &Tensor, mean: f32, std: f32) -> Tensor {
    assert!(std > 0.0, "standardize: std 必须为正数，得到 {std}");
    (tensor - mean) / std
}
