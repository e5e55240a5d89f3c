use approx::assert_abs_diff_eq;
use std::time::Duration;

use crate::tensor::Tensor;
use crate::train::{RunningMetrics, count_correct};

#[test]
fn test_count_correct() {
    #[rustfmt::skip]
    let logits = Tensor::new(&[
        0.1, 2.0, -1.0,
        3.0, 0.0,  0.5,
        0.0, 0.1,  0.2,
    ], &[3, 3]);
    let labels = Tensor::new(&[1.0, 0.0, 0.0], &[3]);
    assert_eq!(count_correct(&logits, &labels), 2);
}

#[test]
fn test_running_metrics_weights_by_batch_size() {
    let mut metrics = RunningMetrics::new();
    let logits = Tensor::new(&[1.0, 0.0, 1.0, 0.0, 0.0, 1.0], &[3, 2]);
    metrics.update(1.0, Some(0.5), &logits, &Tensor::new(&[0.0, 0.0, 0.0], &[3]));
    let logits = Tensor::new(&[0.0, 1.0], &[1, 2]);
    metrics.update(3.0, Some(0.1), &logits, &Tensor::new(&[1.0], &[1]));

    assert_eq!(metrics.samples(), 4);
    assert_eq!(metrics.batches(), 2);
    // (1.0*3 + 3.0*1) / 4
    assert_abs_diff_eq!(metrics.mean_loss(), 1.5, epsilon = 1e-6);
    assert_abs_diff_eq!(metrics.mean_aux_loss().unwrap_or(-1.0), 0.4, epsilon = 1e-6);
    assert_abs_diff_eq!(metrics.accuracy(), 0.75, epsilon = 1e-6);

    let stats = metrics.finish(0, Duration::from_secs(1));
    assert_eq!(stats.samples, 4);
    assert!(stats.to_string().contains("acc 75.00%"));
}

#[test]
fn test_empty_metrics() {
    let metrics = RunningMetrics::new();
    assert_eq!(metrics.mean_loss(), 0.0);
    assert_eq!(metrics.accuracy(), 0.0);
    assert_eq!(metrics.mean_aux_loss(), None);
}
