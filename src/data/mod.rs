//! 数据加载模块
//!
//! 提供数据集加载、变换和批处理功能。
//!
//! # 主要组件
//!
//! - [`DataLoader`]: `PyTorch` 风格的数据批量加载器
//! - [`TensorDataset`]: 持有特征和标签的数据集
//! - [`MnistDataset`]: MNIST 手写数字数据集
//! - [`transforms`]: 像素归一化与标准化
//! - [`download`]: 带 MD5 校验和镜像回退的下载
//! - [`DataError`]: 数据加载错误类型
//!
//! # 使用示例
//!
//! ```ignore
//! use fuzzy_pool::data::{DataLoader, MnistDataset};
//!
//! let train = MnistDataset::train()?.into_dataset();
//! let loader = DataLoader::new(train, 64)?.shuffle(true).seed(42);
//!
//! for (images, labels) in loader.iter() {
//!     // images: [B, 1, 28, 28], labels: [B]
//! }
//! ```

mod dataloader;
pub mod datasets;
pub mod download;
pub mod error;
pub mod transforms;

#[cfg(test)]
mod tests;

pub use dataloader::{DataLoader, DataLoaderIterator, TensorDataset};
pub use datasets::{MnistDataset, default_data_dir};
pub use error::DataError;
