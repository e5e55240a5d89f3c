/*
 * @Description  : 模糊池化（fuzzy pooling）的纯数值实现
 *
 * 对每个 pool_size×pool_size 窗口（逐 batch、逐通道）：
 * 1. 以窗口自身的均值 μ 与无偏标准差 s 构造高斯隶属度 m = exp(-(x-μ)²/(2σ²))，σ = s + ε
 * 2. 主导阈值 τ：每行沿列取最大值（S-norm），再取各行最大值中的最小值（T-norm）
 * 3. m >= τ 的元素为主导元素（含相等）
 * 4. 权重 w = m / (Σm + ε)，输出 y = Σ 主导·x·w；非主导元素不贡献分子但参与分母
 *
 * RegP 正则：reg_lambda · Σm² / (batch·C)，m 取遍所有窗口。
 *
 * 反向传播：主导掩码视为常量，梯度经过 μ、σ、m、权重归一化与加权求和，
 * 逐窗口解析求导（窗口方差恰为 0 时省略 σ 项，不会产生 NaN）。
 * 该模块不持有任何状态，前向与反向都从输入值重新计算窗口统计量。
 */

use super::GraphError;
use super::window::PoolGeometry;
use crate::tensor::Tensor;
use rayon::prelude::*;

/// 标准差与权重分母上的加性 ε
pub const FUZZY_EPS: f32 = 1e-8;

/// 高斯隶属度函数 `exp(-(x-mean)²/(2·std²))`，结果在 (0, 1]
///
/// `std` 应已包含 `FUZZY_EPS`
pub fn membership(x: f32, mean: f32, std: f32) -> f32 {
    membership_of_deviation(x - mean, std)
}

fn membership_of_deviation(deviation: f32, std: f32) -> f32 {
    (-(deviation * deviation) / (2.0 * std * std)).exp()
}

/// 单个窗口的统计量（行优先排列，长度 n = pool_size²）
#[derive(Debug, Clone, PartialEq)]
pub struct WindowStats {
    pub mean: f32,
    /// 无偏样本标准差（不含 ε；n == 1 时为 0）
    pub std: f32,
    /// 各元素相对均值的偏差 u = x - μ
    pub deviations: Vec<f32>,
    pub memberships: Vec<f32>,
    /// 主导阈值 τ
    pub threshold: f32,
    /// Σm + ε
    pub weight_sum: f32,
}

impl WindowStats {
    pub fn new(window: &[f32], pool_size: usize) -> Self {
        let n = window.len();
        debug_assert_eq!(n, pool_size * pool_size);

        // 以首元素为基准求均值，常量窗口的偏差严格为 0
        let pivot = window[0];
        let shift = window.iter().map(|&x| x - pivot).sum::<f32>() / n as f32;
        let deviations: Vec<f32> = window.iter().map(|&x| (x - pivot) - shift).collect();

        let std = if n > 1 {
            (deviations.iter().map(|u| u * u).sum::<f32>() / (n - 1) as f32).sqrt()
        } else {
            0.0
        };
        let sigma = std + FUZZY_EPS;
        let memberships: Vec<f32> = deviations
            .iter()
            .map(|&u| membership_of_deviation(u, sigma))
            .collect();

        let threshold = memberships
            .chunks(pool_size)
            .map(|row| row.iter().copied().fold(f32::NEG_INFINITY, f32::max))
            .fold(f32::INFINITY, f32::min);
        let weight_sum = memberships.iter().sum::<f32>() + FUZZY_EPS;

        Self {
            mean: pivot + shift,
            std,
            deviations,
            memberships,
            threshold,
            weight_sum,
        }
    }

    /// σ = s + ε
    pub fn sigma(&self) -> f32 {
        self.std + FUZZY_EPS
    }

    pub fn is_dominant(&self, j: usize) -> bool {
        self.memberships[j] >= self.threshold
    }

    /// 窗口的池化输出 y = Σ 主导·x·m / (Σm + ε)
    pub fn pooled_value(&self, window: &[f32]) -> f32 {
        let numerator: f32 = window
            .iter()
            .zip(&self.memberships)
            .enumerate()
            .filter(|(j, _)| self.is_dominant(*j))
            .map(|(_, (&x, &m))| x * m)
            .sum();
        numerator / self.weight_sum
    }

    /// Σm²
    pub fn membership_sq_sum(&self) -> f32 {
        self.memberships.iter().map(|m| m * m).sum()
    }

    /// 把 ∂L/∂m（逐元素）经 μ 与 σ 回传到窗口输入，累加进 `grad`
    ///
    /// m_j 依赖 u_j = x_j - μ 与 σ：
    /// - ∂m_j/∂u_j = -m_j·u_j/σ²，∂u_j/∂x_k = δ_jk - 1/n
    /// - ∂m_j/∂σ = m_j·u_j²/σ³，∂s/∂x_k = u_k/((n-1)·s)（s = 0 时省略）
    pub fn accumulate_membership_grad(&self, grad_membership: &[f32], grad: &mut [f32]) {
        let n = self.deviations.len();
        let sigma = self.sigma();
        let sigma_sq = sigma * sigma;

        let grad_u: Vec<f32> = grad_membership
            .iter()
            .zip(&self.memberships)
            .zip(&self.deviations)
            .map(|((&g, &m), &u)| -g * m * u / sigma_sq)
            .collect();
        let grad_u_mean = grad_u.iter().sum::<f32>() / n as f32;

        let grad_sigma: f32 = grad_membership
            .iter()
            .zip(&self.memberships)
            .zip(&self.deviations)
            .map(|((&g, &m), &u)| g * m * u * u / (sigma_sq * sigma))
            .sum();
        let std_scale = if n > 1 && self.std > 0.0 {
            grad_sigma / ((n - 1) as f32 * self.std)
        } else {
            0.0
        };

        for (k, g) in grad.iter_mut().enumerate() {
            *g += grad_u[k] - grad_u_mean + std_scale * self.deviations[k];
        }
    }
}

/// 单个窗口的模糊池化，返回池化值
pub fn pool_window(window: &[f32], pool_size: usize) -> f32 {
    WindowStats::new(window, pool_size).pooled_value(window)
}

/// 单个窗口的池化梯度：`upstream` 为 ∂L/∂y，结果累加进 `grad`
fn pool_window_backward(window: &[f32], pool_size: usize, upstream: f32, grad: &mut [f32]) {
    let stats = WindowStats::new(window, pool_size);
    let y = stats.pooled_value(window);
    let w = stats.weight_sum;

    // 直接项：∂y/∂x_k（m 视为常量）= d_k·m_k/W
    // 经 m 的项：∂y/∂m_j = (d_j·x_j - y)/W
    let mut grad_membership = Vec::with_capacity(window.len());
    for (j, (&x, &m)) in window.iter().zip(&stats.memberships).enumerate() {
        let dominant = if stats.is_dominant(j) { 1.0 } else { 0.0 };
        grad[j] += upstream * dominant * m / w;
        grad_membership.push(upstream * (dominant * x - y) / w);
    }
    stats.accumulate_membership_grad(&grad_membership, grad);
}

/// 从整个样本中按偏移取出一个窗口
fn gather(sample: &[f32], offsets: &[usize]) -> Vec<f32> {
    offsets.iter().map(|&i| sample[i]).collect()
}

/// 模糊池化前向：输入 [B, C, H, W]，输出 ([B, C, H/p, W/p], RegP)
///
/// `reg_lambda` 为 `None` 时不计算 RegP
pub fn fuzzy_pool2d(
    input: &Tensor,
    pool_size: usize,
    reg_lambda: Option<f32>,
) -> Result<(Tensor, Option<f32>), GraphError> {
    let geometry = PoolGeometry::new("FuzzyPool2d", input.shape(), pool_size)?;
    let data = input.data_as_slice();
    let sample_len = geometry.sample_len();

    let batch_results: Vec<(Vec<f32>, f32)> = (0..geometry.batch)
        .into_par_iter()
        .map(|b| {
            let sample = &data[b * sample_len..(b + 1) * sample_len];
            let mut output = vec![0.0f32; geometry.pooled_sample_len()];
            let mut sq_sum = 0.0f32;
            for (out_idx, offsets) in geometry.windows() {
                let window = gather(sample, &offsets);
                let stats = WindowStats::new(&window, pool_size);
                output[out_idx] = stats.pooled_value(&window);
                sq_sum += stats.membership_sq_sum();
            }
            (output, sq_sum)
        })
        .collect();

    let mut all_output = Vec::with_capacity(geometry.batch * geometry.pooled_sample_len());
    let mut total_sq_sum = 0.0f32;
    for (output, sq_sum) in batch_results {
        all_output.extend(output);
        total_sq_sum += sq_sum;
    }

    let penalty = reg_lambda
        .map(|lambda| lambda * total_sq_sum / (geometry.batch * geometry.channels) as f32);
    Ok((
        Tensor::from_vec(all_output, &geometry.output_shape()),
        penalty,
    ))
}

/// RegP 前向：reg_lambda · Σm² / (B·C)，m 取遍所有窗口
pub fn membership_penalty(
    input: &Tensor,
    pool_size: usize,
    reg_lambda: f32,
) -> Result<f32, GraphError> {
    let geometry = PoolGeometry::new("MembershipPenalty", input.shape(), pool_size)?;
    let data = input.data_as_slice();
    let sample_len = geometry.sample_len();

    let total_sq_sum: f32 = (0..geometry.batch)
        .into_par_iter()
        .map(|b| {
            let sample = &data[b * sample_len..(b + 1) * sample_len];
            geometry
                .windows()
                .map(|(_, offsets)| {
                    WindowStats::new(&gather(sample, &offsets), pool_size).membership_sq_sum()
                })
                .sum::<f32>()
        })
        .sum();

    Ok(reg_lambda * total_sq_sum / (geometry.batch * geometry.channels) as f32)
}

/// 模糊池化反向：`upstream_grad` 形状为 [B, C, H/p, W/p]，返回对输入的梯度
pub fn fuzzy_pool2d_backward(
    input: &Tensor,
    pool_size: usize,
    upstream_grad: &Tensor,
) -> Result<Tensor, GraphError> {
    let geometry = PoolGeometry::new("FuzzyPool2d", input.shape(), pool_size)?;
    if upstream_grad.shape() != geometry.output_shape().as_slice() {
        return Err(GraphError::ShapeMismatch {
            expected: geometry.output_shape(),
            got: upstream_grad.shape().to_vec(),
            message: "FuzzyPool2d 上游梯度形状与输出形状不一致".to_string(),
        });
    }
    let data = input.data_as_slice();
    let upstream = upstream_grad.data_as_slice();
    let (sample_len, pooled_len) = (geometry.sample_len(), geometry.pooled_sample_len());

    let batch_results: Vec<Vec<f32>> = (0..geometry.batch)
        .into_par_iter()
        .map(|b| {
            let sample = &data[b * sample_len..(b + 1) * sample_len];
            let sample_upstream = &upstream[b * pooled_len..(b + 1) * pooled_len];
            let mut sample_grad = vec![0.0f32; sample_len];
            for (out_idx, offsets) in geometry.windows() {
                let window = gather(sample, &offsets);
                let mut window_grad = vec![0.0f32; offsets.len()];
                pool_window_backward(
                    &window,
                    pool_size,
                    sample_upstream[out_idx],
                    &mut window_grad,
                );
                for (&i, g) in offsets.iter().zip(window_grad) {
                    sample_grad[i] += g;
                }
            }
            sample_grad
        })
        .collect();

    let all_grad: Vec<f32> = batch_results.into_iter().flatten().collect();
    Ok(Tensor::from_vec(all_grad, input.shape()))
}

/// RegP 反向：∂(λ·Σm²/(B·C))/∂x，乘以上游标量梯度 `upstream`
pub fn membership_penalty_backward(
    input: &Tensor,
    pool_size: usize,
    reg_lambda: f32,
    upstream: f32,
) -> Result<Tensor, GraphError> {
    let geometry = PoolGeometry::new("MembershipPenalty", input.shape(), pool_size)?;
    let data = input.data_as_slice();
    let sample_len = geometry.sample_len();
    let scale = upstream * reg_lambda / (geometry.batch * geometry.channels) as f32;

    let batch_results: Vec<Vec<f32>> = (0..geometry.batch)
        .into_par_iter()
        .map(|b| {
            let sample = &data[b * sample_len..(b + 1) * sample_len];
            let mut sample_grad = vec![0.0f32; sample_len];
            for (_, offsets) in geometry.windows() {
                let window = gather(sample, &offsets);
                let stats = WindowStats::new(&window, pool_size);
                let grad_membership: Vec<f32> =
                    stats.memberships.iter().map(|&m| scale * 2.0 * m).collect();
                let mut window_grad = vec![0.0f32; offsets.len()];
                stats.accumulate_membership_grad(&grad_membership, &mut window_grad);
                for (&i, g) in offsets.iter().zip(window_grad) {
                    sample_grad[i] += g;
                }
            }
            sample_grad
        })
        .collect();

    let all_grad: Vec<f32> = batch_results.into_iter().flatten().collect();
    Ok(Tensor::from_vec(all_grad, input.shape()))
}
