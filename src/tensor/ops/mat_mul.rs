use crate::errors::{Operator, TensorError};
use crate::tensor::Tensor;

impl Tensor {
    /// 矩阵乘法。只接受2阶张量，且前一个张量的列数必须等于后一个张量的行数，否则 panic。
    pub fn mat_mul(&self, other: &Self) -> Self {
        let (a, b) = (self.as_matrix(), other.as_matrix());
        assert!(
            a.ncols() == b.nrows(),
            "{}",
            TensorError::OperatorError {
                operator: Operator::MatMul,
                tensor1_shape: self.shape().to_vec(),
                tensor2_shape: other.shape().to_vec(),
            }
        );
        Self::from_array(a.dot(&b).into_dyn())
    }
}
