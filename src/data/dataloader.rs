/*
 * @Description  : DataLoader - PyTorch 风格的数据批量加载器
 *
 * 提供统一的数据迭代 API，支持：
 * - 自动分批 (batch_size)
 * - 随机打乱 (shuffle)
 * - 丢弃不完整批次 (drop_last)
 */

use crate::data::error::DataError;
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::seq::SliceRandom;

/// TensorDataset - 持有特征和标签的数据集
///
/// # 示例
/// ```ignore
/// let dataset = TensorDataset::new(features, labels)?;
/// println!("样本数: {}", dataset.len());
/// ```
#[derive(Debug, Clone)]
pub struct TensorDataset {
    features: Tensor,
    labels: Tensor,
    len: usize,
}

impl TensorDataset {
    /// 创建新的 TensorDataset
    ///
    /// `features` 与 `labels` 的第一维都是样本数，必须一致。
    pub fn new(features: Tensor, labels: Tensor) -> Result<Self, DataError> {
        let (Some(&len), Some(&label_len)) = (features.shape().first(), labels.shape().first())
        else {
            return Err(DataError::InvalidArgument(
                "TensorDataset 的特征和标签至少需要 1 维".to_string(),
            ));
        };
        if len != label_len {
            return Err(DataError::ShapeMismatch {
                expected: vec![len],
                got: vec![label_len],
            });
        }
        Ok(Self::from_parts(features, labels, len))
    }

    /// 已校验过样本数的内部构造
    pub(crate) const fn from_parts(features: Tensor, labels: Tensor, len: usize) -> Self {
        Self {
            features,
            labels,
            len,
        }
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn features(&self) -> &Tensor {
        &self.features
    }

    pub const fn labels(&self) -> &Tensor {
        &self.labels
    }
}

/// DataLoader - PyTorch 风格的数据批量加载器
///
/// # 示例
/// ```ignore
/// let loader = DataLoader::new(dataset, 64)?
///     .shuffle(true)
///     .seed(42);
///
/// for (images, labels) in loader.iter() {
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DataLoader {
    dataset: TensorDataset,
    batch_size: usize,
    shuffle: bool,
    drop_last: bool,
    seed: Option<u64>,
}

impl DataLoader {
    pub fn new(dataset: TensorDataset, batch_size: usize) -> Result<Self, DataError> {
        if batch_size == 0 {
            return Err(DataError::InvalidArgument(
                "DataLoader 的 batch_size 必须大于 0".to_string(),
            ));
        }
        Ok(Self {
            dataset,
            batch_size,
            shuffle: false,
            drop_last: false,
            seed: None,
        })
    }

    /// 设置是否打乱数据
    #[must_use]
    pub const fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// 设置是否丢弃最后一个不完整的批次
    #[must_use]
    pub const fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// 设置随机种子（用于 shuffle）
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub const fn num_batches(&self) -> usize {
        let n = self.dataset.len();
        if self.drop_last {
            n / self.batch_size
        } else {
            n.div_ceil(self.batch_size)
        }
    }

    /// 数据集大小
    pub const fn len(&self) -> usize {
        self.dataset.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub const fn dataset(&self) -> &TensorDataset {
        &self.dataset
    }

    /// 创建迭代器（打乱时使用构造时设置的种子；未设置则使用 thread_rng）
    pub fn iter(&self) -> DataLoaderIterator<'_> {
        let mut indices: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            match self.seed {
                Some(seed) => indices.shuffle(&mut rand::rngs::StdRng::seed_from_u64(seed)),
                None => indices.shuffle(&mut rand::thread_rng()),
            }
        }
        self.iter_with_indices(indices)
    }

    /// 以指定种子创建迭代器（每个 epoch 使用不同种子）
    pub fn iter_with_seed(&self, seed: u64) -> DataLoaderIterator<'_> {
        let mut indices: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            indices.shuffle(&mut rand::rngs::StdRng::seed_from_u64(seed));
        }
        self.iter_with_indices(indices)
    }

    const fn iter_with_indices(&self, indices: Vec<usize>) -> DataLoaderIterator<'_> {
        DataLoaderIterator {
            loader: self,
            indices,
            current_batch: 0,
        }
    }
}

/// DataLoader 迭代器，每项为 (features_batch, labels_batch)
pub struct DataLoaderIterator<'a> {
    loader: &'a DataLoader,
    indices: Vec<usize>,
    current_batch: usize,
}

impl Iterator for DataLoaderIterator<'_> {
    type Item = (Tensor, Tensor);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.indices.len();
        let batch_size = self.loader.batch_size;
        let start = self.current_batch * batch_size;
        if start >= n {
            return None;
        }

        let end = (start + batch_size).min(n);
        if self.loader.drop_last && end - start < batch_size {
            return None;
        }
        self.current_batch += 1;

        let batch_indices = &self.indices[start..end];
        let dataset = &self.loader.dataset;
        Some((
            dataset.features.select_rows(batch_indices),
            dataset.labels.select_rows(batch_indices),
        ))
    }
}
