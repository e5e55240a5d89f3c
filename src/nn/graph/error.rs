/*
 * @Description  : Graph 模块的错误类型
 */

use crate::nn::NodeId;
use thiserror::Error;

/// Graph 操作错误类型
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("节点 {0:?} 不存在")]
    NodeNotFound(NodeId),

    #[error("非法操作: {0}")]
    InvalidOperation(String),

    #[error("形状不匹配（期望 {expected:?}，得到 {got:?}）: {message}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
        message: String,
    },

    #[error("维度不匹配（期望 {expected}，得到 {got}）: {message}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
        message: String,
    },

    #[error("计算错误: {0}")]
    ComputationError(String),

    #[error("节点名称重复: {0}")]
    DuplicateNodeName(String),

    /// 超参数或结构配置非法（如空间尺寸不能被池化窗口整除、类别数过少等）
    #[error("配置非法: {0}")]
    InvalidConfiguration(String),
}
