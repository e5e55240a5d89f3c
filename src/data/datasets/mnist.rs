//! MNIST 手写数字数据集
//!
//! 支持：
//! - IDX 二进制格式解析（支持 .gz 压缩）
//! - 像素归一化（÷255 后按训练集均值/标准差标准化）
//! - 按镜像列表顺序自动下载并校验 MD5

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::data::dataloader::TensorDataset;
use crate::data::download::download_from_mirrors;
use crate::data::error::DataError;
use crate::data::transforms::{normalize_pixels, standardize};
use crate::tensor::Tensor;

/// MNIST 镜像（按顺序尝试）
pub const MNIST_MIRRORS: [&str; 3] = [
    "https://ossci-datasets.s3.amazonaws.com/mnist/",
    "https://storage.googleapis.com/cvdf-datasets/mnist/",
    "http://yann.lecun.com/exdb/mnist/",
];

/// MNIST 文件名（不含 .gz）与 .gz 文件的 MD5
const MNIST_FILES: [(&str, &str); 4] = [
    ("train-images-idx3-ubyte", "f68b3c2dcbeaaa9fbdd348bbdeb94873"),
    ("train-labels-idx1-ubyte", "d53e105ee54ea40749a09fcbcd1e9432"),
    ("t10k-images-idx3-ubyte", "9fb629c4189551a2d022fa330f9573f3"),
    ("t10k-labels-idx1-ubyte", "ec29112dd5afa0611ce80d1b7f02629c"),
];

/// 训练集像素（÷255 后）的均值
pub const MNIST_MEAN: f32 = 0.1307;
/// 训练集像素（÷255 后）的标准差
pub const MNIST_STD: f32 = 0.3081;

pub const MNIST_CLASSES: usize = 10;

const IMAGE_MAGIC: u32 = 2051;
const LABEL_MAGIC: u32 = 2049;

/// MNIST 手写数字数据集
///
/// 训练集 60,000 个样本，测试集 10,000 个样本。
/// 图像形状 [N, 1, H, W]（标准 MNIST 为 28×28），标签形状 [N]（0..=9 的类别索引）。
#[derive(Debug, Clone)]
pub struct MnistDataset {
    images: Tensor,
    labels: Tensor,
    len: usize,
}

impl MnistDataset {
    /// 完整加载 API
    ///
    /// # 参数
    /// - `root`: 数据目录，None 则使用 `default_data_dir()/mnist`
    /// - `train`: true=训练集, false=测试集
    /// - `download`: true=自动下载缺失文件
    pub fn load(root: Option<&Path>, train: bool, download: bool) -> Result<Self, DataError> {
        let data_dir = root.map_or_else(|| default_data_dir().join("mnist"), Path::to_path_buf);

        let (images_file, labels_file) = if train {
            (MNIST_FILES[0], MNIST_FILES[1])
        } else {
            (MNIST_FILES[2], MNIST_FILES[3])
        };

        let images_path = ensure_file(&data_dir, images_file, download)?;
        let labels_path = ensure_file(&data_dir, labels_file, download)?;
        let dataset = Self::from_idx_files(&images_path, &labels_path)?;
        info!(
            split = if train { "train" } else { "test" },
            samples = dataset.len,
            dir = %data_dir.display(),
            "MNIST 加载完成"
        );
        Ok(dataset)
    }

    /// 从已存在的 IDX 文件（可为 .gz）加载
    pub fn from_idx_files(images_path: &Path, labels_path: &Path) -> Result<Self, DataError> {
        let (images_raw, rows, cols) = parse_idx_images(images_path)?;
        let labels = parse_idx_labels(labels_path)?;

        let len = labels.shape()[0];
        if images_raw.shape()[0] != len {
            return Err(DataError::ShapeMismatch {
                expected: vec![len],
                got: vec![images_raw.shape()[0]],
            });
        }

        let images = standardize(&normalize_pixels(&images_raw), MNIST_MEAN, MNIST_STD)
            .reshape(&[len, 1, rows, cols]);

        Ok(Self {
            images,
            labels,
            len,
        })
    }

    /// 加载训练集（默认路径，自动下载）
    pub fn train() -> Result<Self, DataError> {
        Self::load(None, true, true)
    }

    /// 加载测试集（默认路径，自动下载）
    pub fn test() -> Result<Self, DataError> {
        Self::load(None, false, true)
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 第 `index` 个样本：(image [1, H, W], label)
    pub fn get(&self, index: usize) -> Result<(Tensor, usize), DataError> {
        if index >= self.len {
            return Err(DataError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let image = self.images.select_rows(&[index]);
        let shape = image.shape()[1..].to_vec();
        Ok((image.reshape(&shape), self.labels[[index]] as usize))
    }

    /// 输入的形状（不含 batch 维度）
    pub fn input_shape(&self) -> Vec<usize> {
        self.images.shape()[1..].to_vec()
    }

    pub const fn num_classes(&self) -> usize {
        MNIST_CLASSES
    }

    pub const fn images(&self) -> &Tensor {
        &self.images
    }

    pub const fn labels(&self) -> &Tensor {
        &self.labels
    }

    /// 只保留前 `n` 个样本（用于快速实验）
    #[must_use]
    pub fn take(self, n: usize) -> Self {
        if n >= self.len {
            return self;
        }
        let indices: Vec<usize> = (0..n).collect();
        Self {
            images: self.images.select_rows(&indices),
            labels: self.labels.select_rows(&indices),
            len: n,
        }
    }

    /// 转为通用的 `TensorDataset`（供 `DataLoader` 使用）
    pub fn into_dataset(self) -> TensorDataset {
        TensorDataset::from_parts(self.images, self.labels, self.len)
    }
}

/// 默认数据目录：`<系统缓存目录>/fuzzy_pool/datasets`
pub fn default_data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fuzzy_pool")
        .join("datasets")
}

/// 确保文件存在，必要时下载（优先使用已解压的文件）
fn ensure_file(
    data_dir: &Path,
    (base_name, md5): (&str, &str),
    download: bool,
) -> Result<PathBuf, DataError> {
    let uncompressed_path = data_dir.join(base_name);
    if uncompressed_path.exists() {
        return Ok(uncompressed_path);
    }

    let gz_name = format!("{base_name}.gz");
    let gz_path = data_dir.join(&gz_name);
    if gz_path.exists() {
        debug!(path = %gz_path.display(), "使用已缓存文件");
        return Ok(gz_path);
    }

    if download {
        std::fs::create_dir_all(data_dir)?;
        download_from_mirrors(&MNIST_MIRRORS, &gz_name, &gz_path, Some(md5))?;
        Ok(gz_path)
    } else {
        Err(DataError::FileNotFound(uncompressed_path))
    }
}

/// 打开 IDX 文件；扩展名为 .gz 时透明解压
fn open_idx(path: &Path) -> Result<Box<dyn Read>, DataError> {
    let file = File::open(path).map_err(|_| DataError::FileNotFound(path.to_path_buf()))?;
    let is_gz = path.extension().is_some_and(|ext| ext == "gz");
    Ok(if is_gz {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    })
}

fn read_exact_or(
    reader: &mut dyn Read,
    buf: &mut [u8],
    what: &str,
    path: &Path,
) -> Result<(), DataError> {
    reader.read_exact(buf).map_err(|e| {
        if path.extension().is_some_and(|ext| ext == "gz")
            && e.kind() == std::io::ErrorKind::InvalidInput
        {
            DataError::DecompressionError(format!("{}: {e}", path.display()))
        } else {
            DataError::FormatError(format!("读取{what}失败: {e}"))
        }
    })
}

fn be_u32(bytes: &[u8]) -> usize {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
}

/// 解析 IDX 图像文件，返回 ([N, rows*cols] 原始像素, rows, cols)
///
/// IDX 格式：
/// - [0-3] magic number (0x00000803 = 2051)
/// - [4-7] number of images
/// - [8-11] number of rows
/// - [12-15] number of columns
/// - [16+] pixel data (unsigned byte)
fn parse_idx_images(path: &Path) -> Result<(Tensor, usize, usize), DataError> {
    let mut reader = open_idx(path)?;
    let mut header = [0u8; 16];
    read_exact_or(reader.as_mut(), &mut header, "头部", path)?;

    let magic = be_u32(&header[0..4]) as u32;
    if magic != IMAGE_MAGIC {
        return Err(DataError::FormatError(format!(
            "无效的 magic number: {magic} (期望 {IMAGE_MAGIC})"
        )));
    }

    let num_images = be_u32(&header[4..8]);
    let rows = be_u32(&header[8..12]);
    let cols = be_u32(&header[12..16]);
    if rows == 0 || cols == 0 {
        return Err(DataError::FormatError(format!(
            "无效的图像尺寸: {rows}x{cols}"
        )));
    }

    let mut pixels = vec![0u8; num_images * rows * cols];
    read_exact_or(reader.as_mut(), &mut pixels, "像素数据", path)?;

    let data: Vec<f32> = pixels.into_iter().map(f32::from).collect();
    Ok((Tensor::from_vec(data, &[num_images, rows * cols]), rows, cols))
}

/// 解析 IDX 标签文件，返回 [N] 的类别索引
///
/// IDX 格式：
/// - [0-3] magic number (0x00000801 = 2049)
/// - [4-7] number of labels
/// - [8+] label data (unsigned byte, 0-9)
fn parse_idx_labels(path: &Path) -> Result<Tensor, DataError> {
    let mut reader = open_idx(path)?;
    let mut header = [0u8; 8];
    read_exact_or(reader.as_mut(), &mut header, "头部", path)?;

    let magic = be_u32(&header[0..4]) as u32;
    if magic != LABEL_MAGIC {
        return Err(DataError::FormatError(format!(
            "无效的 magic number: {magic} (期望 {LABEL_MAGIC})"
        )));
    }

    let num_labels = be_u32(&header[4..8]);
    let mut labels = vec![0u8; num_labels];
    read_exact_or(reader.as_mut(), &mut labels, "标签数据", path)?;

    if let Some(&bad) = labels.iter().find(|&&l| usize::from(l) >= MNIST_CLASSES) {
        return Err(DataError::FormatError(format!(
            "标签 {bad} 超出范围 0..{MNIST_CLASSES}"
        )));
    }

    let data: Vec<f32> = labels.into_iter().map(f32::from).collect();
    Ok(Tensor::from_vec(data, &[num_labels]))
}
