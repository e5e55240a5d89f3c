//! # MNIST 池化策略对比示例
//!
//! 在同一个小型 CNN（conv3×3 → pool 2×2 → linear）上依次训练：
//! - 最大池化
//! - 平均池化
//! - 模糊池化（+ 隶属度正则项 RegP）
//!
//! 最后打印每种策略的训练/测试准确率对比表。
//!
//! ## 运行
//! ```bash
//! cargo run --release --example mnist_fuzzy_pool
//! cargo run --release --example mnist_fuzzy_pool -- demos/mnist_fuzzy_pool/config.json
//! ```
//!
//! 配置文件中的 `model.pooling` 决定模糊池化的 `pool_size` 与 `reg_lambda`，
//! 最大/平均池化使用相同的 `pool_size`。`RUST_LOG=fuzzy_pool=debug` 可查看逐 batch 日志。

use fuzzy_pool::config::{ExperimentConfig, PoolingConfig};
use fuzzy_pool::context::ExecutionContext;
use fuzzy_pool::data::{DataLoader, MnistDataset};
use fuzzy_pool::logging::init_tracing;
use fuzzy_pool::train::{EpochReport, TrainError, run_experiment};
use std::time::Instant;
use tracing::info;

struct RunSummary {
    kind: &'static str,
    last: EpochReport,
    best_test: f32,
    seconds: f32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("fuzzy_pool=info")?;
    println!("=== MNIST 池化策略对比 ===\n");

    // 1. 配置
    let config = match std::env::args().nth(1) {
        Some(path) => ExperimentConfig::from_file(&path)?,
        None => ExperimentConfig::default(),
    };
    let pool_size = config.model.pooling.pool_size();
    let fuzzy = match config.model.pooling {
        fuzzy @ PoolingConfig::Fuzzy { .. } => fuzzy,
        _ => PoolingConfig::Fuzzy {
            pool_size,
            reg_lambda: None,
        },
    };
    println!("[1/3] 配置：");
    println!("  - Batch: {}", config.batch_size);
    println!("  - Epochs: {}", config.epochs);
    println!("  - 学习率: {}", config.optimizer.learning_rate());
    println!("  - Seed: {}", config.seed);

    // 2. 数据
    println!("\n[2/3] 加载 MNIST 数据集...");
    let load_start = Instant::now();
    let mnist_dir = config.data_dir.join("mnist");
    let train_data = MnistDataset::load(Some(&mnist_dir), true, true)?;
    let test_data = MnistDataset::load(Some(&mnist_dir), false, true)?;
    println!(
        "  ✓ 训练集: {} 样本，测试集: {} 样本 ({:.1}s)",
        train_data.len(),
        test_data.len(),
        load_start.elapsed().as_secs_f32()
    );
    let train_loader = DataLoader::new(train_data.into_dataset(), config.batch_size)?
        .shuffle(config.shuffle);
    let test_loader = DataLoader::new(test_data.into_dataset(), config.batch_size)?;

    // 3. 依次训练三种池化
    println!("\n[3/3] 开始训练...");
    let ctx = ExecutionContext::from_config(&config)?;
    info!(threads = ctx.threads(), "执行上下文就绪");

    let strategies = [
        PoolingConfig::Max { pool_size },
        PoolingConfig::Avg { pool_size },
        fuzzy,
    ];
    let mut summaries = Vec::with_capacity(strategies.len());
    for pooling in strategies {
        let run_config = config.with_pooling(pooling);
        println!("\n--- {} pooling ---", pooling.kind_name());
        let start = Instant::now();
        let reports = run_experiment(&ctx, &run_config, &train_loader, &test_loader)?;
        for report in &reports {
            println!("  {}", report.test);
        }
        let best_test = reports
            .iter()
            .map(|r| r.test.accuracy)
            .fold(0.0f32, f32::max);
        let last = reports.last().cloned().ok_or(TrainError::EmptyLoader)?;
        summaries.push(RunSummary {
            kind: pooling.kind_name(),
            last,
            best_test,
            seconds: start.elapsed().as_secs_f32(),
        });
    }

    // 4. 结果
    println!("\n{}", "=".repeat(60));
    println!(
        "{:<8} | {:>10} | {:>10} | {:>10} | {:>8}",
        "pooling", "train acc", "test acc", "best test", "time"
    );
    println!("{}", "-".repeat(60));
    for s in &summaries {
        println!(
            "{:<8} | {:>9.2}% | {:>9.2}% | {:>9.2}% | {:>7.1}s",
            s.kind,
            s.last.train.accuracy * 100.0,
            s.last.test.accuracy * 100.0,
            s.best_test * 100.0,
            s.seconds
        );
    }
    println!("{}", "=".repeat(60));
    Ok(())
}
