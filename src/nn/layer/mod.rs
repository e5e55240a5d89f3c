/*
 * @Description  : Layer 模块 - 组合 Node 构建常见网络结构
 */

mod conv2d;
mod linear;
mod pool2d;

pub use conv2d::Conv2d;
pub use linear::Linear;
pub use pool2d::{AvgPool2d, FuzzyPool2d, MaxPool2d, Pool2d, PoolOutput, Pooling};
