/*
 * @Description  : 实验配置（serde + JSON）
 *
 * 默认值对应 MNIST 上的参考实验：batch 64，Adam lr 1e-3，5 个 epoch，
 * 卷积 1→8 通道，池化窗口 2，reg_lambda 0.01，种子 42。
 */

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::default_data_dir;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("配置 JSON 解析失败: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("无效的配置: {0}")]
    Invalid(String),
}

/// 池化策略配置，JSON 形如 `{"kind": "fuzzy", "pool_size": 2, "reg_lambda": 0.01}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolingConfig {
    Max {
        pool_size: usize,
    },
    Avg {
        pool_size: usize,
    },
    Fuzzy {
        pool_size: usize,
        /// `None` 时不计算隶属度正则项
        #[serde(default)]
        reg_lambda: Option<f32>,
    },
}

impl PoolingConfig {
    pub const fn pool_size(&self) -> usize {
        match *self {
            Self::Max { pool_size } | Self::Avg { pool_size } | Self::Fuzzy { pool_size, .. } => {
                pool_size
            }
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Max { .. } => "max",
            Self::Avg { .. } => "avg",
            Self::Fuzzy { .. } => "fuzzy",
        }
    }
}

impl Default for PoolingConfig {
    fn default() -> Self {
        Self::Fuzzy {
            pool_size: 2,
            reg_lambda: Some(0.01),
        }
    }
}

/// 分类网络结构：conv3×3(pad 1) → pool → flatten → linear
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub in_channels: usize,
    /// 输入图像 (H, W)
    pub image_size: (usize, usize),
    pub conv_channels: usize,
    pub num_classes: usize,
    pub pooling: PoolingConfig,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            in_channels: 1,
            image_size: (28, 28),
            conv_channels: 8,
            num_classes: 10,
            pooling: PoolingConfig::default(),
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pool_size = self.pooling.pool_size();
        let (h, w) = self.image_size;
        if self.in_channels == 0 || self.conv_channels == 0 {
            return Err(ConfigError::Invalid("通道数必须大于 0".to_string()));
        }
        if self.num_classes < 2 {
            return Err(ConfigError::Invalid(format!(
                "类别数至少为 2，得到 {}",
                self.num_classes
            )));
        }
        if pool_size == 0 {
            return Err(ConfigError::Invalid("pool_size 必须大于 0".to_string()));
        }
        if h == 0 || w == 0 || h % pool_size != 0 || w % pool_size != 0 {
            return Err(ConfigError::Invalid(format!(
                "图像尺寸 {h}×{w} 不能被 pool_size {pool_size} 整除"
            )));
        }
        if let PoolingConfig::Fuzzy {
            reg_lambda: Some(lambda),
            ..
        } = self.pooling
        {
            if !lambda.is_finite() || lambda < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "reg_lambda 必须是非负有限数，得到 {lambda}"
                )));
            }
        }
        Ok(())
    }
}

/// 优化器配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerConfig {
    Sgd {
        lr: f32,
    },
    Adam {
        lr: f32,
        #[serde(default = "default_beta1")]
        beta1: f32,
        #[serde(default = "default_beta2")]
        beta2: f32,
        #[serde(default = "default_epsilon")]
        epsilon: f32,
    },
}

const fn default_beta1() -> f32 {
    0.9
}

const fn default_beta2() -> f32 {
    0.999
}

const fn default_epsilon() -> f32 {
    1e-8
}

impl OptimizerConfig {
    pub const fn learning_rate(&self) -> f32 {
        match *self {
            Self::Sgd { lr } | Self::Adam { lr, .. } => lr,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam {
            lr: 1e-3,
            beta1: default_beta1(),
            beta2: default_beta2(),
            epsilon: default_epsilon(),
        }
    }
}

/// 一次完整实验（训练 + 评估）的配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// 数据集缓存目录
    pub data_dir: PathBuf,
    pub batch_size: usize,
    pub epochs: usize,
    pub seed: u64,
    /// rayon 线程数，`None` 时由 rayon 决定
    pub threads: Option<usize>,
    pub shuffle: bool,
    /// 每隔多少个 batch 输出一次 debug 日志
    pub log_every: usize,
    pub model: ClassifierConfig,
    pub optimizer: OptimizerConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            batch_size: 64,
            epochs: 5,
            seed: 42,
            threads: None,
            shuffle: true,
            log_every: 100,
            model: ClassifierConfig::default(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// 从 JSON 字符串解析并校验（缺省字段取默认值）
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件解析并校验
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 返回一个只替换池化策略的副本
    #[must_use]
    pub fn with_pooling(&self, pooling: PoolingConfig) -> Self {
        let mut config = self.clone();
        config.model.pooling = pooling;
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size 必须大于 0".to_string()));
        }
        if self.epochs == 0 {
            return Err(ConfigError::Invalid("epochs 必须大于 0".to_string()));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads 必须大于 0".to_string()));
        }
        let lr = self.optimizer.learning_rate();
        if !lr.is_finite() || lr <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "学习率必须是正的有限数，得到 {lr}"
            )));
        }
        self.model.validate()
    }
}
