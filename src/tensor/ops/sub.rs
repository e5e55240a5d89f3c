/*
 * @Description  : 张量的逐元素减法（支持广播）
 */

use crate::errors::Operator;
use crate::tensor::Tensor;

impl_elementwise_op!(Sub, sub, -, Operator::Sub);

impl std::ops::Neg for &Tensor {
    type Output = Tensor;

    fn neg(self) -> Tensor {
        Tensor::from_array(-&self.data)
    }
}

impl std::ops::Neg for Tensor {
    type Output = Self;

    fn neg(self) -> Self {
        -&self
    }
}
