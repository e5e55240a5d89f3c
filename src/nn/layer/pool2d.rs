/*
 * @Description  : 2D 池化层：最大 / 平均 / 模糊池化
 *
 * 三种池化共用 `Pooling` trait，由 `Pool2d` 枚举静态分发。
 * 所有池化都是不重叠窗口（步长 = 窗口边长），无可学习参数。
 */

use crate::config::PoolingConfig;
use crate::nn::{GraphError, Var, VarPoolingOps};
use enum_dispatch::enum_dispatch;

/// 池化层的输出
///
/// `aux_loss` 仅在模糊池化启用隶属度正则（RegP）时存在，需加到主损失上。
#[derive(Debug, Clone)]
pub struct PoolOutput {
    /// 池化结果 [batch, channels, H/p, W/p]
    pub output: Var,
    /// 正则项 [1, 1]
    pub aux_loss: Option<Var>,
}

#[enum_dispatch]
pub trait Pooling {
    fn forward(&self, x: &Var) -> Result<PoolOutput, GraphError>;

    fn pool_size(&self) -> usize;

    /// 策略名称（用于日志）
    fn kind_name(&self) -> &'static str;
}

/// 池化策略（构造时确定）
#[enum_dispatch(Pooling)]
#[derive(Debug, Clone)]
pub enum Pool2d {
    Max(MaxPool2d),
    Avg(AvgPool2d),
    Fuzzy(FuzzyPool2d),
}

impl Pool2d {
    /// 由实验配置构造池化层
    pub fn from_config(config: &PoolingConfig) -> Result<Self, GraphError> {
        Ok(match *config {
            PoolingConfig::Max { pool_size } => MaxPool2d::new(pool_size)?.into(),
            PoolingConfig::Avg { pool_size } => AvgPool2d::new(pool_size)?.into(),
            PoolingConfig::Fuzzy {
                pool_size,
                reg_lambda,
            } => FuzzyPool2d::new(pool_size, reg_lambda)?.into(),
        })
    }
}

fn check_pool_size(layer: &str, pool_size: usize) -> Result<(), GraphError> {
    if pool_size == 0 {
        return Err(GraphError::InvalidConfiguration(format!(
            "{layer} 的 pool_size 必须大于 0"
        )));
    }
    Ok(())
}

// ==================== MaxPool2d ====================

#[derive(Debug, Clone)]
pub struct MaxPool2d {
    pool_size: usize,
}

impl MaxPool2d {
    pub fn new(pool_size: usize) -> Result<Self, GraphError> {
        check_pool_size("MaxPool2d", pool_size)?;
        Ok(Self { pool_size })
    }
}

impl Pooling for MaxPool2d {
    fn forward(&self, x: &Var) -> Result<PoolOutput, GraphError> {
        Ok(PoolOutput {
            output: x.max_pool2d(self.pool_size)?,
            aux_loss: None,
        })
    }

    fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn kind_name(&self) -> &'static str {
        "max"
    }
}

// ==================== AvgPool2d ====================

#[derive(Debug, Clone)]
pub struct AvgPool2d {
    pool_size: usize,
}

impl AvgPool2d {
    pub fn new(pool_size: usize) -> Result<Self, GraphError> {
        check_pool_size("AvgPool2d", pool_size)?;
        Ok(Self { pool_size })
    }
}

impl Pooling for AvgPool2d {
    fn forward(&self, x: &Var) -> Result<PoolOutput, GraphError> {
        Ok(PoolOutput {
            output: x.avg_pool2d(self.pool_size)?,
            aux_loss: None,
        })
    }

    fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn kind_name(&self) -> &'static str {
        "avg"
    }
}

// ==================== FuzzyPool2d ====================

/// 模糊池化层
///
/// 每个窗口按自身均值/标准差计算高斯隶属度，以行最大值的最小值为主导阈值，
/// 输出主导元素的隶属度加权和。`reg_lambda` 为 `Some` 时额外输出隶属度正则项。
#[derive(Debug, Clone)]
pub struct FuzzyPool2d {
    pool_size: usize,
    reg_lambda: Option<f32>,
}

impl FuzzyPool2d {
    pub fn new(pool_size: usize, reg_lambda: Option<f32>) -> Result<Self, GraphError> {
        check_pool_size("FuzzyPool2d", pool_size)?;
        if let Some(lambda) = reg_lambda.filter(|l| !l.is_finite() || *l < 0.0) {
            return Err(GraphError::InvalidConfiguration(format!(
                "FuzzyPool2d 的 reg_lambda 必须是非负有限数，得到 {lambda}"
            )));
        }
        Ok(Self {
            pool_size,
            reg_lambda,
        })
    }

    pub const fn reg_lambda(&self) -> Option<f32> {
        self.reg_lambda
    }
}

impl Pooling for FuzzyPool2d {
    fn forward(&self, x: &Var) -> Result<PoolOutput, GraphError> {
        let output = x.fuzzy_pool2d(self.pool_size)?;
        let aux_loss = self
            .reg_lambda
            .map(|lambda| x.membership_penalty(self.pool_size, lambda))
            .transpose()?;
        Ok(PoolOutput { output, aux_loss })
    }

    fn pool_size(&self) -> usize {
        self.pool_size
    }

    fn kind_name(&self) -> &'static str {
        "fuzzy"
    }
}
