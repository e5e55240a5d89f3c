/*
 * @Description  : 训练/评估过程中的累计指标
 */

use std::fmt;
use std::time::Duration;

use crate::tensor::Tensor;

/// 预测正确的样本数：`logits` [B, C] 的行 argmax 与 `labels` [B] 比较
pub fn count_correct(logits: &Tensor, labels: &Tensor) -> usize {
    logits
        .argmax_rows()
        .into_iter()
        .zip(labels.data_as_slice())
        .filter(|&(pred, &label)| pred == label as usize)
        .count()
}

/// 逐 batch 累计的损失与准确率
#[derive(Debug, Clone, Default)]
pub struct RunningMetrics {
    loss_sum: f64,
    aux_loss_sum: Option<f64>,
    correct: usize,
    samples: usize,
    batches: usize,
}

impl RunningMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个 batch；`loss` 是该 batch 的平均交叉熵
    pub fn update(&mut self, loss: f32, aux_loss: Option<f32>, logits: &Tensor, labels: &Tensor) {
        let batch = labels.shape()[0];
        self.loss_sum += f64::from(loss) * batch as f64;
        if let Some(aux) = aux_loss {
            *self.aux_loss_sum.get_or_insert(0.0) += f64::from(aux) * batch as f64;
        }
        self.correct += count_correct(logits, labels);
        self.samples += batch;
        self.batches += 1;
    }

    /// 按样本数加权的平均损失
    pub fn mean_loss(&self) -> f32 {
        if self.samples == 0 {
            return 0.0;
        }
        (self.loss_sum / self.samples as f64) as f32
    }

    pub fn mean_aux_loss(&self) -> Option<f32> {
        if self.samples == 0 {
            return None;
        }
        self.aux_loss_sum
            .map(|sum| (sum / self.samples as f64) as f32)
    }

    pub fn accuracy(&self) -> f32 {
        if self.samples == 0 {
            return 0.0;
        }
        self.correct as f32 / self.samples as f32
    }

    pub const fn samples(&self) -> usize {
        self.samples
    }

    pub const fn batches(&self) -> usize {
        self.batches
    }

    pub fn finish(&self, epoch: usize, duration: Duration) -> EpochStats {
        EpochStats {
            epoch,
            mean_loss: self.mean_loss(),
            mean_aux_loss: self.mean_aux_loss(),
            accuracy: self.accuracy(),
            samples: self.samples,
            duration,
        }
    }
}

/// 一轮训练或评估的汇总
#[derive(Debug, Clone, PartialEq)]
pub struct EpochStats {
    pub epoch: usize,
    /// 平均交叉熵
    pub mean_loss: f32,
    /// 平均隶属度正则项（仅模糊池化 + RegP）
    pub mean_aux_loss: Option<f32>,
    pub accuracy: f32,
    pub samples: usize,
    pub duration: Duration,
}

impl fmt::Display for EpochStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "epoch {} | loss {:.4} | acc {:.2}% | {} 样本 | {:.1}s",
            self.epoch + 1,
            self.mean_loss,
            self.accuracy * 100.0,
            self.samples,
            self.duration.as_secs_f32()
        )?;
        if let Some(aux) = self.mean_aux_loss {
            write!(f, " | regp {aux:.5}")?;
        }
        Ok(())
    }
}

/// 一个 epoch 的训练与测试结果
#[derive(Debug, Clone, PartialEq)]
pub struct EpochReport {
    pub train: EpochStats,
    pub test: EpochStats,
}
