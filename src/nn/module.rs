/*
 * @Description  : Module trait 定义
 */

use super::{GraphError, Var};

/// 模块 trait
///
/// # 设计原则
/// - `forward()` **不是** trait 方法（签名各异）
/// - `new()` **不是** trait 方法（参数各异）
/// - `parameters()` 返回 `Vec<Var>`（签名一致，放入 trait）
/// - 由于 Var 携带图引用，`forward()` 不需要 `&Graph` 参数
///
/// # 使用示例
///
/// ```ignore
/// use fuzzy_pool::nn::{Module, Var, Graph};
/// use fuzzy_pool::nn::layer::{Conv2d, Linear};
///
/// struct Net {
///     conv: Conv2d,
///     fc: Linear,
/// }
///
/// impl Module for Net {
///     fn parameters(&self) -> Vec<Var> {
///         [self.conv.parameters(), self.fc.parameters()].concat()
///     }
/// }
/// ```
pub trait Module {
    /// 获取所有可训练参数（优化器据此更新）
    fn parameters(&self) -> Vec<Var>;

    /// 参数及其节点名称
    fn named_parameters(&self) -> Result<Vec<(String, Var)>, GraphError> {
        self.parameters()
            .into_iter()
            .map(|p| Ok((p.name()?, p)))
            .collect()
    }

    /// 参数张量个数
    fn num_params(&self) -> usize {
        self.parameters().len()
    }

    /// 标量参数总数
    fn num_scalar_params(&self) -> Result<usize, GraphError> {
        self.parameters().iter().try_fold(0, |acc, p| {
            Ok(acc + p.value_expected_shape()?.iter().product::<usize>())
        })
    }
}
