/*
 * @Description  : 池化对比用的小型 CNN 分类器
 *
 * 结构：Conv2d(in → conv_channels, 3×3, stride 1, padding 1) → Pool2d → flatten → Linear
 */

use crate::config::ClassifierConfig;
use crate::nn::layer::{Conv2d, Linear, Pool2d, Pooling};
use crate::nn::{Graph, GraphError, Module, Var, VarShapeOps};

/// 分类器前向输出
#[derive(Debug, Clone)]
pub struct ClassifierOutput {
    /// 未归一化的类别得分 [batch, num_classes]
    pub logits: Var,
    /// 池化层产生的辅助损失（仅模糊池化 + RegP）
    pub aux_loss: Option<Var>,
}

pub struct PoolingClassifier {
    graph: Graph,
    conv: Conv2d,
    pool: Pool2d,
    fc: Linear,
    config: ClassifierConfig,
}

impl PoolingClassifier {
    /// 在 `graph` 中创建全部参数
    pub fn new(graph: &Graph, config: &ClassifierConfig) -> Result<Self, GraphError> {
        if config.num_classes < 2 {
            return Err(GraphError::InvalidConfiguration(format!(
                "类别数至少为 2，得到 {}",
                config.num_classes
            )));
        }
        let pool = Pool2d::from_config(&config.pooling)?;
        let pool_size = pool.pool_size();
        let (h, w) = config.image_size;
        if h == 0 || w == 0 || h % pool_size != 0 || w % pool_size != 0 {
            return Err(GraphError::InvalidConfiguration(format!(
                "图像尺寸 {h}×{w} 不能被 pool_size {pool_size} 整除"
            )));
        }

        let conv = Conv2d::new(
            graph,
            config.in_channels,
            config.conv_channels,
            (3, 3),
            (1, 1),
            (1, 1),
            true,
            "conv",
        )?;
        let flat_features = config.conv_channels * (h / pool_size) * (w / pool_size);
        let fc = Linear::new(graph, flat_features, config.num_classes, true, "fc")?;

        Ok(Self {
            graph: graph.clone(),
            conv,
            pool,
            fc,
            config: config.clone(),
        })
    }

    /// `x`: [batch, in_channels, H, W]
    pub fn forward(&self, x: &Var) -> Result<ClassifierOutput, GraphError> {
        let features = self.conv.forward(x)?;
        let pooled = self.pool.forward(&features)?;
        let logits = self.fc.forward(&pooled.output.flatten()?)?;
        Ok(ClassifierOutput {
            logits,
            aux_loss: pooled.aux_loss,
        })
    }

    pub const fn pool(&self) -> &Pool2d {
        &self.pool
    }

    pub const fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// 节点列表、输出形状与参数量的表格
    pub fn summary(&self) -> String {
        self.graph.summary_string()
    }
}

impl Module for PoolingClassifier {
    fn parameters(&self) -> Vec<Var> {
        [self.conv.parameters(), self.fc.parameters()].concat()
    }
}
