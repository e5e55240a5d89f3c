/*
 * @Description  : 形状相关操作：reshape/flatten、按行取样、2D 转置、广播逆操作等
 */

use super::Tensor;
use crate::errors::TensorError;
use ndarray::{Axis, Ix2};

impl Tensor {
    pub fn reshape(&self, shape: &[usize]) -> Self {
        let new_total_elements: usize = shape.iter().product();
        assert!(
            self.size() == new_total_elements,
            "{}",
            TensorError::IncompatibleShape
        );
        Self::from_vec(self.to_vec(), shape)
    }

    /// 展平为一维张量
    pub fn flatten(&self) -> Self {
        self.reshape(&[self.size()])
    }

    /// 沿第 0 维按索引取出若干行，拼成新的张量（用于构造 batch）
    ///
    /// # Panics
    /// 索引越界时
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let shape = self.shape();
        assert!(!shape.is_empty(), "{}", TensorError::IncompatibleShape);
        let row_size: usize = shape[1..].iter().product();
        let flat = self.data_as_slice();

        let mut data = Vec::with_capacity(indices.len() * row_size);
        for &idx in indices {
            let start = idx * row_size;
            data.extend_from_slice(&flat[start..start + row_size]);
        }

        let mut new_shape = vec![indices.len()];
        new_shape.extend_from_slice(&shape[1..]);
        Self::from_vec(data, &new_shape)
    }

    /// 2D 转置
    pub fn transpose(&self) -> Self {
        let matrix = self.as_matrix();
        let transposed = matrix.t().as_standard_layout().to_owned();
        Self::from_array(transposed.into_dyn())
    }

    /// 将（由广播产生的）张量沿被广播的维度求和，还原为 `shape`
    ///
    /// 如 [B, N] → [1, N]，[B, N] → [N]
    pub fn sum_to_shape(&self, shape: &[usize]) -> Self {
        if self.shape() == shape {
            return self.clone();
        }

        let mut data = self.data.clone();
        let extra = data.ndim() - shape.len();
        // 先去掉多出的前导维度
        for _ in 0..extra {
            data = data.sum_axis(Axis(0));
        }
        // 再对目标为 1 的维度求和（保持维度）
        for (axis, &dim) in shape.iter().enumerate() {
            if dim == 1 && data.shape()[axis] != 1 {
                data = data.sum_axis(Axis(axis)).insert_axis(Axis(axis));
            }
        }
        assert!(
            data.shape() == shape,
            "{}",
            TensorError::IncompatibleShape
        );
        Self::from_array(data.as_standard_layout().to_owned())
    }

    /// 二维张量每一行最大值所在的列索引
    pub fn argmax_rows(&self) -> Vec<usize> {
        let matrix = self.as_matrix();
        matrix
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0usize, f32::NEG_INFINITY), |(best_i, best_v), (i, &v)| {
                        if v > best_v { (i, v) } else { (best_i, best_v) }
                    })
                    .0
            })
            .collect()
    }

    /// 以二维视图访问（内部使用）
    pub(crate) fn as_matrix(&self) -> ndarray::ArrayView2<'_, f32> {
        assert!(
            self.dimension() == 2,
            "{}",
            TensorError::DimensionNotSupported {
                expected: 2,
                got: self.dimension(),
            }
        );
        self.data
            .view()
            .into_dimensionality::<Ix2>()
            .unwrap_or_else(|_| unreachable!("维度已校验"))
    }
}
