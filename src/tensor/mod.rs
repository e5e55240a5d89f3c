/*
 * @Description  : 张量（Tensor）：对 `ndarray::Array<f32, IxDyn>` 的薄封装
 *                 计算图中所有节点的值和梯度都用它承载。
 */

use ndarray::{Array, IxDyn};
use rand::Rng;
use rand::rngs::StdRng;

use crate::errors::TensorError;

/// 为 Tensor 批量实现逐元素二元运算（张量 ⊕ 张量 支持 NumPy 广播；张量 ⊕ f32；f32 ⊕ 张量）
macro_rules! impl_elementwise_op {
    ($trait:ident, $method:ident, $op:tt, $operator:expr) => {
        impl std::ops::$trait<f32> for Tensor {
            type Output = Self;

            fn $method(self, scalar: f32) -> Self {
                Self::from_array(&self.data $op scalar)
            }
        }

        impl std::ops::$trait<f32> for &Tensor {
            type Output = Tensor;

            fn $method(self, scalar: f32) -> Tensor {
                Tensor::from_array(&self.data $op scalar)
            }
        }

        impl std::ops::$trait<Tensor> for f32 {
            type Output = Tensor;

            fn $method(self, tensor: Tensor) -> Tensor {
                Tensor::from_array(self $op &tensor.data)
            }
        }

        impl std::ops::$trait<&Tensor> for f32 {
            type Output = Tensor;

            fn $method(self, tensor: &Tensor) -> Tensor {
                Tensor::from_array(self $op &tensor.data)
            }
        }

        impl std::ops::$trait for Tensor {
            type Output = Self;

            fn $method(self, other: Self) -> Self {
                std::ops::$trait::$method(&self, &other)
            }
        }

        impl std::ops::$trait<&Self> for Tensor {
            type Output = Self;

            fn $method(self, other: &Self) -> Self {
                std::ops::$trait::$method(&self, other)
            }
        }

        impl std::ops::$trait<Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, other: Tensor) -> Tensor {
                std::ops::$trait::$method(self, &other)
            }
        }

        impl std::ops::$trait<&Tensor> for &Tensor {
            type Output = Tensor;

            fn $method(self, other: &Tensor) -> Tensor {
                assert!(
                    self.can_broadcast_with(other),
                    "{}",
                    crate::errors::TensorError::OperatorError {
                        operator: $operator,
                        tensor1_shape: self.shape().to_vec(),
                        tensor2_shape: other.shape().to_vec(),
                    }
                );
                Tensor::from_array(&self.data $op &other.data)
            }
        }
    };
}

mod index;
mod ops {
    pub mod add;
    pub mod assign;
    pub mod div;
    pub mod mat_mul;
    pub mod mul;
    pub mod others;
    pub mod sub;
}
mod property;
mod shape;

#[cfg(test)]
mod tests;

/// 定义张量的结构体。其可以是标量、向量、矩阵或更高维度的数组。
/// 注：只要通过 Tensor 初始化的都是张量（即使标量也是张量）；
/// 而通常意义上的数字（f32、usize 等）只是纯数（number）。
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Array<f32, IxDyn>,
}

impl Tensor {
    /// 创建一个张量。`data` 的长度必须与 `shape` 中所有元素的乘积相等。
    ///
    /// # Panics
    /// 长度与形状不一致时
    pub fn new(data: &[f32], shape: &[usize]) -> Self {
        let expected: usize = shape.iter().product();
        assert!(
            data.len() == expected,
            "{}",
            TensorError::DataShapeMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
            }
        );
        let data = Array::from_shape_vec(IxDyn(shape), data.to_vec())
            .unwrap_or_else(|_| unreachable!("长度已校验"));
        Self { data }
    }

    /// 由已有的 ndarray 数组创建（内部使用，避免多一次拷贝）
    pub(crate) fn from_array(data: Array<f32, IxDyn>) -> Self {
        Self { data }
    }

    /// 由 Vec 创建（转移所有权，避免拷贝）
    pub fn from_vec(data: Vec<f32>, shape: &[usize]) -> Self {
        let expected: usize = shape.iter().product();
        assert!(
            data.len() == expected,
            "{}",
            TensorError::DataShapeMismatch {
                data_len: data.len(),
                shape: shape.to_vec(),
            }
        );
        let data = Array::from_shape_vec(IxDyn(shape), data)
            .unwrap_or_else(|_| unreachable!("长度已校验"));
        Self { data }
    }

    pub fn zeros(shape: &[usize]) -> Self {
        Self {
            data: Array::zeros(IxDyn(shape)),
        }
    }

    pub fn ones(shape: &[usize]) -> Self {
        Self {
            data: Array::ones(IxDyn(shape)),
        }
    }

    /// 所有元素都为 `value` 的张量
    pub fn full(value: f32, shape: &[usize]) -> Self {
        Self {
            data: Array::from_elem(IxDyn(shape), value),
        }
    }

    /// 正态分布随机张量（非确定性，使用 thread_rng）
    pub fn normal(mean: f32, std_dev: f32, shape: &[usize]) -> Self {
        let mut rng = rand::thread_rng();
        Self::normal_from(mean, std_dev, shape, &mut rng)
    }

    /// 正态分布随机张量（使用给定的 RNG，保证可复现）
    pub fn normal_with_rng(mean: f32, std_dev: f32, shape: &[usize], rng: &mut StdRng) -> Self {
        Self::normal_from(mean, std_dev, shape, rng)
    }

    /// Box-Muller 变换
    fn normal_from<R: Rng + ?Sized>(mean: f32, std_dev: f32, shape: &[usize], rng: &mut R) -> Self {
        let data_len = shape.iter().product::<usize>();
        let mut data = Vec::with_capacity(data_len);

        while data.len() < data_len {
            let u1: f32 = rng.r#gen();
            let u2: f32 = rng.r#gen();
            let r = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f32::consts::PI * u2;
            let z0 = mean + std_dev * r * theta.cos();
            let z1 = mean + std_dev * r * theta.sin();

            if z0.is_finite() {
                data.push(z0);
            }
            if data.len() < data_len && z1.is_finite() {
                data.push(z1);
            }
        }

        Self::from_vec(data, shape)
    }
}
