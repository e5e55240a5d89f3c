//! # Fuzzy Pool
//!
//! 在 MNIST 小型 CNN 上比较最大池化、平均池化与模糊池化（Fuzzy Pooling）的实验框架。
//!
//! 模糊池化对每个不重叠窗口按其自身的均值/标准差计算高斯隶属度，
//! 以"行最大值的最小值"作为主导阈值，输出主导元素的隶属度加权和；
//! 可选的隶属度正则项（RegP）鼓励隶属度稀疏。
//!
//! 框架由以下部分组成：
//! - [`tensor`]：基于 `ndarray` 的张量
//! - [`nn`]：动态计算图、节点、层、优化器与模糊池化算子
//! - [`data`]：MNIST 下载、解析与批量加载
//! - [`train`]：训练/评估循环
//! - [`config`]、[`context`]、[`logging`]：实验配置、执行上下文与日志

pub mod config;
pub mod context;
pub mod data;
pub mod errors;
pub mod logging;
pub mod nn;
pub mod tensor;
pub mod train;
