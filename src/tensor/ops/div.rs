/*
 * @Description  : 张量的逐元素除法（支持广播）。除数为零时遵循 IEEE 754（得到 inf/NaN），由调用方负责加 eps
 */

use crate::errors::Operator;
use crate::tensor::Tensor;

impl_elementwise_op!(Div, div, /, Operator::Div);
