/*
 * @Description  : 张量的加法，实现了两个张量“逐元素”（或张量与纯数）相加的运算，并返回一个新的张量。
 *                 两个操作数均为张量时支持 NumPy 风格的广播（broadcasting）：
 *                 - 从右向左对齐维度
 *                 - 每个维度必须相等，或其中一个为 1
 *                 - 维度数不同时，较短的形状前面补 1
 */

use crate::errors::Operator;
use crate::tensor::Tensor;

impl_elementwise_op!(Add, add, +, Operator::Add);
