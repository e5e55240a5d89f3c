/*
 * @Description  : 训练与评估
 */

mod metrics;
mod trainer;

#[cfg(test)]
mod tests;

use thiserror::Error;

use crate::config::ConfigError;
use crate::context::ContextError;
use crate::data::DataError;
use crate::nn::GraphError;

pub use metrics::{EpochReport, EpochStats, RunningMetrics, count_correct};
pub use trainer::{Trainer, run_experiment};

#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("数据加载器没有任何 batch")]
    EmptyLoader,
}
