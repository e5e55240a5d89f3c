/*
 * @Description  : 张量的逐元素乘法（支持广播）。矩阵乘法见 `mat_mul.rs`
 */

use crate::errors::Operator;
use crate::tensor::Tensor;

impl_elementwise_op!(Mul, mul, *, Operator::Mul);
