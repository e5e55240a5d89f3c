//! 数据加载错误类型定义

use std::path::PathBuf;
use thiserror::Error;

/// 数据加载相关错误
#[derive(Debug, Error)]
pub enum DataError {
    #[error("文件未找到: {0}")]
    FileNotFound(PathBuf),

    #[error("IO 错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 格式错误（如 magic number 不匹配）
    #[error("格式错误: {0}")]
    FormatError(String),

    #[error("索引越界: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("形状不匹配: 期望 {expected:?}, 实际 {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("无效参数: {0}")]
    InvalidArgument(String),

    #[error("下载错误: {0}")]
    DownloadError(String),

    #[error("校验和不匹配: 期望 {expected}, 实际 {got}")]
    ChecksumMismatch { expected: String, got: String },

    #[error("解压错误: {0}")]
    DecompressionError(String),

    /// 所有镜像都下载失败
    #[error("{file} 的所有镜像均下载失败: {}", attempts.join("; "))]
    AllMirrorsFailed { file: String, attempts: Vec<String> },
}
