/*
 * @Description  : 执行上下文：设备、随机种子和 rayon 线程池
 *
 * 卷积与池化算子内部按 batch 维并行（`into_par_iter`），它们运行在
 * 调用 `install` 时所处的线程池中。计算图基于 `Rc`，不能跨线程传递，
 * 因此整个训练/评估流程应在 `install` 的闭包内部构建并运行。
 */

use std::fmt;
use std::sync::Arc;

use rayon::ThreadPool;
use thiserror::Error;

use crate::config::ExperimentConfig;
use crate::nn::Graph;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("线程数必须大于 0")]
    ZeroThreads,
    #[error("创建 rayon 线程池失败: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// 计算设备（目前只有 CPU）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu { threads: usize },
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu { threads } => write!(f, "cpu({threads} 线程)"),
        }
    }
}

/// 显式传递给模型构建和训练器的执行状态（无全局变量）
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    device: Device,
    seed: u64,
    pool: Arc<ThreadPool>,
}

impl ExecutionContext {
    /// `threads` 为 `None` 时使用 rayon 的默认线程数
    pub fn new(threads: Option<usize>, seed: u64) -> Result<Self, ContextError> {
        if threads == Some(0) {
            return Err(ContextError::ZeroThreads);
        }
        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("fuzzy-pool-worker-{i}"));
        if let Some(n) = threads {
            builder = builder.num_threads(n);
        }
        let pool = builder.build()?;
        Ok(Self {
            device: Device::Cpu {
                threads: pool.current_num_threads(),
            },
            seed,
            pool: Arc::new(pool),
        })
    }

    pub fn from_config(config: &ExperimentConfig) -> Result<Self, ContextError> {
        Self::new(config.threads, config.seed)
    }

    pub const fn device(&self) -> Device {
        self.device
    }

    pub const fn seed(&self) -> u64 {
        self.seed
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// 在本上下文的线程池中执行 `op`
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// 以上下文种子创建计算图（参数初始化可复现）
    pub fn graph(&self, name: &str) -> Graph {
        Graph::with_name_and_seed(name, self.seed)
    }

    /// 第 `epoch` 轮数据打乱所用的种子
    pub const fn loader_seed(&self, epoch: usize) -> u64 {
        // SplitMix64 的增量常数，使相邻 epoch 的种子充分分散
        self.seed
            .wrapping_add((epoch as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}
