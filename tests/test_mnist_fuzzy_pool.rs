/*
 * @Description  : MNIST 端到端集成测试：conv3×3 → 模糊池化(+RegP) → linear → CE
 *
 * 需要联网下载 MNIST，且 debug 构建下过慢，因此只在 release 下运行：
 * cargo test --release --test test_mnist_fuzzy_pool -- --nocapture
 */

use fuzzy_pool::config::{ExperimentConfig, PoolingConfig};
use fuzzy_pool::context::ExecutionContext;
use fuzzy_pool::data::{DataLoader, MnistDataset};
use fuzzy_pool::train::{TrainError, run_experiment};
use std::time::Instant;

#[test]
#[cfg_attr(debug_assertions, ignore)]
fn test_mnist_fuzzy_pool_reaches_97_percent() -> Result<(), TrainError> {
    let start_time = Instant::now();
    let _ = fuzzy_pool::logging::init_tracing("fuzzy_pool=info");

    println!("\n{}", "=".repeat(60));
    println!("=== MNIST 模糊池化 CNN 集成测试 ===");
    println!("{}\n", "=".repeat(60));

    let config = ExperimentConfig::default();
    assert_eq!(
        config.model.pooling,
        PoolingConfig::Fuzzy {
            pool_size: 2,
            reg_lambda: Some(0.01)
        }
    );

    // 1. 数据
    println!("[1/3] 加载 MNIST 数据集...");
    let load_start = Instant::now();
    let train_data = MnistDataset::train()?;
    let test_data = MnistDataset::test()?;
    println!(
        "  ✓ 训练集 {} 样本，测试集 {} 样本 ({:.1}s)",
        train_data.len(),
        test_data.len(),
        load_start.elapsed().as_secs_f32()
    );

    let train_loader = DataLoader::new(train_data.into_dataset(), config.batch_size)?
        .shuffle(config.shuffle);
    let test_loader = DataLoader::new(test_data.into_dataset(), config.batch_size)?;

    // 2. 训练
    println!(
        "\n[2/3] 训练 {} 个 epoch（batch {}，seed {}）...",
        config.epochs, config.batch_size, config.seed
    );
    let ctx = ExecutionContext::from_config(&config)?;
    let reports = run_experiment(&ctx, &config, &train_loader, &test_loader)?;
    for report in &reports {
        println!("  train: {}", report.train);
        println!("  test:  {}", report.test);
    }

    // 3. 校验
    println!("\n[3/3] 校验结果...");
    assert_eq!(reports.len(), config.epochs);
    let last = reports.last().ok_or(TrainError::EmptyLoader)?;
    assert!(
        last.train.accuracy >= 0.97,
        "训练集准确率 {:.2}% 低于 97%",
        last.train.accuracy * 100.0
    );
    assert!(
        last.test.accuracy >= 0.97,
        "测试集准确率 {:.2}% 低于 97%",
        last.test.accuracy * 100.0
    );
    assert!(last.train.mean_aux_loss.is_some_and(f32::is_finite));
    assert!(reports.iter().all(|r| r.train.mean_loss.is_finite()));

    println!(
        "  ✓ 训练 {:.2}%，测试 {:.2}%，总耗时 {:.1}s",
        last.train.accuracy * 100.0,
        last.test.accuracy * 100.0,
        start_time.elapsed().as_secs_f32()
    );
    Ok(())
}
