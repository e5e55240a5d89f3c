/*
 * @Description  : Var 扩展 trait 模块
 *
 * 按功能领域组织 Var 的扩展方法，用户按需 import。
 *
 * # 模块结构
 * - `conv`: 卷积（conv2d, channel_bias_add）
 * - `loss`: 损失函数（cross_entropy）
 * - `matrix`: 矩阵运算（matmul）
 * - `pooling`: 池化与隶属度正则（max_pool2d, avg_pool2d, fuzzy_pool2d, membership_penalty）
 * - `shape`: 形状变换（flatten）
 *
 * # 使用示例
 * ```ignore
 * use fuzzy_pool::nn::{VarLossOps, VarMatrixOps, VarPoolingOps, VarShapeOps};
 *
 * let pooled = features.fuzzy_pool2d(2)?;
 * let logits = pooled.flatten()?.matmul(&w)?;
 * let loss = logits.cross_entropy(&labels)?;
 * ```
 */

mod conv;
mod loss;
mod matrix;
mod pooling;
mod shape;

pub use conv::VarConvOps;
pub use loss::VarLossOps;
pub use matrix::VarMatrixOps;
pub use pooling::VarPoolingOps;
pub use shape::VarShapeOps;
