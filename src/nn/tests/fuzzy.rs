/*
 * @Description  : 模糊池化数值实现（nn::fuzzy）单元测试
 *
 * 测试策略：
 * 1. 单窗口：隶属度、主导阈值、池化值与手算结果对比
 * 2. 性质：常量窗口、输出界、RegP 非负且随 λ 单调
 * 3. 整张特征图：batch/通道独立、形状校验
 * 4. 反向传播：与有限差分得到的梯度对比
 */

use crate::nn::GraphError;
use crate::nn::fuzzy::{
    FUZZY_EPS, WindowStats, fuzzy_pool2d, fuzzy_pool2d_backward, membership,
    membership_penalty, membership_penalty_backward, pool_window,
};
use crate::tensor::Tensor;
use approx::assert_abs_diff_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ==================== 单窗口 ====================

#[test]
fn test_membership_is_one_at_mean() {
    assert_abs_diff_eq!(membership(2.5, 2.5, 1.0), 1.0);
    assert_abs_diff_eq!(membership(3.5, 2.5, 1.0), (-0.5f32).exp(), epsilon = 1e-7);
    // 关于均值对称
    assert_abs_diff_eq!(
        membership(1.5, 2.5, 1.0),
        membership(3.5, 2.5, 1.0),
        epsilon = 1e-7
    );
}

#[test]
fn test_window_stats_known_window() {
    let stats = WindowStats::new(&[1.0, 2.0, 3.0, 10.0], 2);

    assert_abs_diff_eq!(stats.mean, 4.0, epsilon = 1e-6);
    // 无偏标准差：sqrt(50/3)
    assert_abs_diff_eq!(stats.std, 4.082_483, epsilon = 1e-5);

    #[rustfmt::skip]
    let expected = [0.763_379_5, 0.886_920_4, 0.970_445_5, 0.339_595_5];
    for (m, e) in stats.memberships.iter().zip(expected) {
        assert_abs_diff_eq!(*m, e, epsilon = 1e-5);
    }

    // 行最大值 [0.8869, 0.9704]，取最小
    assert_abs_diff_eq!(stats.threshold, 0.886_920_4, epsilon = 1e-5);
    assert!(!stats.is_dominant(0));
    assert!(stats.is_dominant(1));
    assert!(stats.is_dominant(2));
    assert!(!stats.is_dominant(3));

    assert_abs_diff_eq!(stats.membership_sq_sum(), 2.426_465_8, epsilon = 1e-5);
}

#[test]
fn test_pool_window_known_values() {
    assert_abs_diff_eq!(pool_window(&[1.0, 2.0, 3.0, 10.0], 2), 1.582_648, epsilon = 1e-5);
    assert_abs_diff_eq!(pool_window(&[0.5, -1.0, 2.0, 0.25], 2), 0.253_916_2, epsilon = 1e-5);
}

#[test]
fn test_pool_window_dominance_includes_ties() {
    // 前三个元素隶属度相同；主导阈值等于它们，三者都算主导
    let stats = WindowStats::new(&[1.0, 1.0, 1.0, 100.0], 2);
    assert!(stats.is_dominant(0));
    assert!(stats.is_dominant(1));
    assert!(stats.is_dominant(2));
    assert!(!stats.is_dominant(3));

    // 离群值 100 不进入分子，但其隶属度进入分母
    assert_abs_diff_eq!(pool_window(&[1.0, 1.0, 1.0, 100.0], 2), 0.890_768_2, epsilon = 1e-5);
}

#[test]
fn test_pool_window_constant_window() {
    // 方差为 0：隶属度全为 1，输出约等于该常量
    let stats = WindowStats::new(&[3.0; 4], 2);
    assert_eq!(stats.std, 0.0);
    assert!(stats.memberships.iter().all(|&m| m == 1.0));
    assert!(stats.memberships.iter().all(|m| m.is_finite()));
    assert_abs_diff_eq!(pool_window(&[3.0; 4], 2), 3.0, epsilon = 1e-5);
    assert_abs_diff_eq!(pool_window(&[-7.25; 9], 3), -7.25, epsilon = 1e-5);
}

#[test]
fn test_pool_window_single_element() {
    // pool_size = 1：输出 = x / (1 + ε)
    assert_abs_diff_eq!(pool_window(&[5.0], 1), 5.0 / (1.0 + FUZZY_EPS), epsilon = 1e-6);
    assert_abs_diff_eq!(pool_window(&[-0.3], 1), -0.3, epsilon = 1e-6);
}

#[test]
fn test_pool_window_stays_within_bounds() {
    let mut rng = StdRng::seed_from_u64(7);
    for pool_size in [2, 3] {
        for _ in 0..200 {
            let window: Vec<f32> = (0..pool_size * pool_size)
                .map(|_| rng.gen_range(-5.0..5.0))
                .collect();
            let y = pool_window(&window, pool_size);
            let lo = window.iter().copied().fold(0.0f32, f32::min);
            let hi = window.iter().copied().fold(0.0f32, f32::max);
            assert!(y.is_finite());
            assert!(
                y >= lo - 1e-5 && y <= hi + 1e-5,
                "窗口 {window:?} 的输出 {y} 越界 [{lo}, {hi}]"
            );
        }
    }
}

#[test]
fn test_pool_window_is_not_max_nor_mean() {
    let window = [1.0, 2.0, 3.0, 10.0];
    let y = pool_window(&window, 2);
    assert!(y < 10.0);
    assert!((y - 4.0).abs() > 1.0);
}

// ==================== 整张特征图 ====================

#[test]
fn test_fuzzy_pool2d_output_shape() -> Result<(), GraphError> {
    let input = Tensor::normal(0.0, 1.0, &[2, 3, 6, 9]);
    let (output, penalty) = fuzzy_pool2d(&input, 3, None)?;
    assert_eq!(output.shape(), &[2, 3, 2, 3]);
    assert!(penalty.is_none());
    Ok(())
}

#[test]
fn test_fuzzy_pool2d_window_layout() -> Result<(), GraphError> {
    // [1, 1, 2, 4]：左窗口 [1, 2, 3, 10]，右窗口 [0.5, -1, 2, 0.25]
    #[rustfmt::skip]
    let input = Tensor::new(&[
        1.0, 2.0, 0.5, -1.0,
        3.0, 10.0, 2.0, 0.25,
    ], &[1, 1, 2, 4]);

    let (output, _) = fuzzy_pool2d(&input, 2, None)?;
    assert_eq!(output.shape(), &[1, 1, 1, 2]);
    assert_abs_diff_eq!(output[[0, 0, 0, 0]], 1.582_648, epsilon = 1e-5);
    assert_abs_diff_eq!(output[[0, 0, 0, 1]], 0.253_916_2, epsilon = 1e-5);
    Ok(())
}

#[test]
fn test_fuzzy_pool2d_batches_and_channels_are_independent() -> Result<(), GraphError> {
    let mut rng = StdRng::seed_from_u64(11);
    let data: Vec<f32> = (0..2 * 2 * 4 * 4).map(|_| rng.gen_range(-2.0..2.0)).collect();
    let input = Tensor::new(&data, &[2, 2, 4, 4]);
    let (output, _) = fuzzy_pool2d(&input, 2, None)?;

    for b in 0..2 {
        for c in 0..2 {
            for oh in 0..2 {
                for ow in 0..2 {
                    let window: Vec<f32> = (0..2)
                        .flat_map(|r| (0..2).map(move |s| (r, s)))
                        .map(|(r, s)| input[[b, c, oh * 2 + r, ow * 2 + s]])
                        .collect();
                    assert_abs_diff_eq!(
                        output[[b, c, oh, ow]],
                        pool_window(&window, 2),
                        epsilon = 1e-6
                    );
                }
            }
        }
    }
    Ok(())
}

#[test]
fn test_fuzzy_pool2d_rejects_bad_shapes() {
    let input = Tensor::zeros(&[1, 1, 5, 4]);
    assert!(matches!(
        fuzzy_pool2d(&input, 2, None),
        Err(GraphError::InvalidConfiguration(_))
    ));

    let input = Tensor::zeros(&[1, 4, 4]);
    assert!(matches!(
        fuzzy_pool2d(&input, 2, None),
        Err(GraphError::ShapeMismatch { .. })
    ));

    let input = Tensor::zeros(&[1, 1, 4, 4]);
    assert!(matches!(
        fuzzy_pool2d(&input, 0, None),
        Err(GraphError::InvalidConfiguration(_))
    ));
}

// ==================== RegP ====================

#[test]
fn test_membership_penalty_known_value() -> Result<(), GraphError> {
    #[rustfmt::skip]
    let input = Tensor::new(&[
        1.0, 2.0, 0.5, -1.0,
        3.0, 10.0, 2.0, 0.25,
    ], &[1, 1, 2, 4]);

    // 0.5 · (2.426466 + 2.430009) / (1·1)
    let penalty = membership_penalty(&input, 2, 0.5)?;
    assert_abs_diff_eq!(penalty, 2.428_237_4, epsilon = 1e-5);

    // 与前向顺带计算的结果一致
    let (_, from_forward) = fuzzy_pool2d(&input, 2, Some(0.5))?;
    assert_abs_diff_eq!(from_forward.unwrap_or(f32::NAN), penalty, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_membership_penalty_normalised_by_batch_and_channels() -> Result<(), GraphError> {
    // 4 个相同窗口分布在 batch=2、C=2 上：Σm² 是单窗口的 4 倍，除以 B·C 后相同
    let window = [1.0, 2.0, 3.0, 10.0];
    let data: Vec<f32> = window.iter().copied().cycle().take(16).collect();
    let input = Tensor::new(&data, &[2, 2, 2, 2]);

    assert_abs_diff_eq!(membership_penalty(&input, 2, 1.0)?, 2.426_465_8, epsilon = 1e-4);
    Ok(())
}

#[test]
fn test_membership_penalty_constant_window() -> Result<(), GraphError> {
    // 常量窗口隶属度全为 1，Σm² = n
    let input = Tensor::full(3.0, &[1, 1, 2, 2]);
    assert_abs_diff_eq!(membership_penalty(&input, 2, 0.25)?, 1.0, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_membership_penalty_non_negative_and_monotone_in_lambda() -> Result<(), GraphError> {
    let input = Tensor::normal(0.0, 3.0, &[3, 2, 4, 4]);
    let mut previous = membership_penalty(&input, 2, 0.0)?;
    assert_eq!(previous, 0.0);
    for lambda in [0.001, 0.01, 0.1, 1.0, 10.0] {
        let penalty = membership_penalty(&input, 2, lambda)?;
        assert!(penalty >= 0.0);
        assert!(penalty >= previous);
        previous = penalty;
    }
    Ok(())
}

// ==================== 反向传播 ====================

#[test]
fn test_fuzzy_pool2d_backward_matches_finite_difference() -> Result<(), GraphError> {
    #[rustfmt::skip]
    let input = Tensor::new(&[
        1.0, 2.0, 0.5, -1.0,
        3.0, 10.0, 2.0, 0.25,
    ], &[1, 1, 2, 4]);
    let upstream = Tensor::ones(&[1, 1, 1, 2]);

    let grad = fuzzy_pool2d_backward(&input, 2, &upstream)?;
    assert_eq!(grad.shape(), input.shape());

    #[rustfmt::skip]
    let expected = Tensor::new(&[
        -0.048_877, 0.328_096, 0.335_910, -0.001_691,
         0.358_091, -0.009_894, -0.000_664, 0.342_394,
    ], &[1, 1, 2, 4]);
    for (g, e) in grad.data_as_slice().iter().zip(expected.data_as_slice()) {
        assert_abs_diff_eq!(*g, *e, epsilon = 1e-4);
    }
    Ok(())
}

#[test]
fn test_fuzzy_pool2d_backward_scales_with_upstream() -> Result<(), GraphError> {
    let input = Tensor::new(&[1.0, 2.0, 3.0, 10.0], &[1, 1, 2, 2]);
    let unit = fuzzy_pool2d_backward(&input, 2, &Tensor::ones(&[1, 1, 1, 1]))?;
    let scaled = fuzzy_pool2d_backward(&input, 2, &Tensor::full(-3.0, &[1, 1, 1, 1]))?;
    for (u, s) in unit.data_as_slice().iter().zip(scaled.data_as_slice()) {
        assert_abs_diff_eq!(*s, -3.0 * u, epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn test_fuzzy_pool2d_backward_dominant_elements_receive_more() -> Result<(), GraphError> {
    let input = Tensor::new(&[1.0, 2.0, 3.0, 10.0], &[1, 1, 2, 2]);
    let grad = fuzzy_pool2d_backward(&input, 2, &Tensor::ones(&[1, 1, 1, 1]))?;
    let g = grad.data_as_slice();
    // 主导元素为下标 1、2；非主导元素经分母与均值/标准差仍有梯度
    for dominant in [1, 2] {
        for other in [0, 3] {
            assert!(g[other] != 0.0);
            assert!(g[dominant].abs() > g[other].abs());
        }
    }
    assert_abs_diff_eq!(g[0], -0.048_877, epsilon = 1e-5);
    Ok(())
}

#[test]
fn test_fuzzy_pool2d_backward_constant_window_is_finite() -> Result<(), GraphError> {
    let input = Tensor::full(3.0, &[1, 1, 2, 2]);
    let grad = fuzzy_pool2d_backward(&input, 2, &Tensor::ones(&[1, 1, 1, 1]))?;
    assert!(!grad.has_non_finite());
    // 方差为 0 时只剩直接项 m/W = 1/4
    for g in grad.data_as_slice() {
        assert_abs_diff_eq!(*g, 0.25, epsilon = 1e-6);
    }
    Ok(())
}

#[test]
fn test_fuzzy_pool2d_backward_rejects_wrong_upstream_shape() {
    let input = Tensor::zeros(&[1, 1, 4, 4]);
    let result = fuzzy_pool2d_backward(&input, 2, &Tensor::ones(&[1, 1, 4, 4]));
    assert!(matches!(result, Err(GraphError::ShapeMismatch { .. })));
}

#[test]
fn test_membership_penalty_backward_matches_finite_difference() -> Result<(), GraphError> {
    #[rustfmt::skip]
    let input = Tensor::new(&[
        1.0, 2.0, 0.5, -1.0,
        3.0, 10.0, 2.0, 0.25,
    ], &[1, 1, 2, 4]);

    let grad = membership_penalty_backward(&input, 2, 1.0, 1.0)?;
    #[rustfmt::skip]
    let expected = [
        0.005_560, 0.016_925, -0.121_360, -0.012_906,
        -0.026_491, 0.004_006, 0.008_118, 0.126_148,
    ];
    for (g, e) in grad.data_as_slice().iter().zip(expected) {
        assert_abs_diff_eq!(*g, e, epsilon = 1e-4);
    }

    // λ 与上游梯度线性缩放
    let scaled = membership_penalty_backward(&input, 2, 0.1, 2.0)?;
    for (s, g) in scaled.data_as_slice().iter().zip(grad.data_as_slice()) {
        assert_abs_diff_eq!(*s, 0.2 * g, epsilon = 1e-6);
    }
    Ok(())
}
