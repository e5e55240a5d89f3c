/*
 * @Description  : 训练/评估循环
 *
 * 每个 batch：写入输入 → 前向 → 交叉熵（+ 池化辅助损失）→ 反向 → 优化器更新。
 * 评估在 `no_grad_scope` 中进行，从不调用优化器。
 */

use std::time::Instant;

use tracing::{debug, info, info_span};

use super::TrainError;
use super::metrics::{EpochReport, EpochStats, RunningMetrics};
use crate::config::{ExperimentConfig, OptimizerConfig};
use crate::context::ExecutionContext;
use crate::data::DataLoader;
use crate::nn::layer::Pooling;
use crate::nn::{
    Adam, Graph, GraphError, Module, Optimizer, PoolingClassifier, SGD, Var, VarLossOps,
};
use crate::tensor::Tensor;

pub struct Trainer {
    ctx: ExecutionContext,
    graph: Graph,
    model: PoolingClassifier,
    optimizer: Box<dyn Optimizer>,
    images: Var,
    labels: Var,
    logits: Var,
    ce_loss: Var,
    aux_loss: Option<Var>,
    /// 交叉熵 + 辅助损失
    loss: Var,
    log_every: usize,
}

impl Trainer {
    /// 按配置在新的计算图中构建模型、损失和优化器
    pub fn new(ctx: &ExecutionContext, config: &ExperimentConfig) -> Result<Self, TrainError> {
        config.validate()?;
        let model_config = &config.model;
        let graph = ctx.graph(&format!("mnist_{}_pool", model_config.pooling.kind_name()));

        let (h, w) = model_config.image_size;
        let images = graph.input_shape(&[1, model_config.in_channels, h, w], Some("images"))?;
        let labels = graph.input_shape(&[1], Some("labels"))?;

        let model = PoolingClassifier::new(&graph, model_config)?;
        let output = model.forward(&images)?;
        let ce_loss = output.logits.cross_entropy(&labels)?;
        let loss = match &output.aux_loss {
            Some(aux) => ce_loss.try_add(aux)?,
            None => ce_loss.clone(),
        };

        let optimizer = build_optimizer(&graph, &model.parameters(), &config.optimizer)?;
        info!(
            pooling = model.pool().kind_name(),
            pool_size = model.pool().pool_size(),
            params = model.num_scalar_params()?,
            device = %ctx.device(),
            "模型构建完成"
        );

        Ok(Self {
            ctx: ctx.clone(),
            graph,
            model,
            optimizer,
            images,
            labels,
            logits: output.logits,
            ce_loss,
            aux_loss: output.aux_loss,
            loss,
            log_every: config.log_every,
        })
    }

    pub const fn model(&self) -> &PoolingClassifier {
        &self.model
    }

    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    fn feed(&self, images: &Tensor, labels: &Tensor) -> Result<(), GraphError> {
        self.images.set_value(images)?;
        self.labels.set_value(labels)
    }

    fn value_of(var: &Var) -> Result<Tensor, GraphError> {
        var.value()?.ok_or_else(|| {
            GraphError::ComputationError(format!("节点 {} 在前向传播后没有值", var.node_id()))
        })
    }

    /// 读取一次前向传播后的 (logits, 交叉熵, 辅助损失)
    fn read_outputs(&self) -> Result<(Tensor, f32, Option<f32>), GraphError> {
        let logits = Self::value_of(&self.logits)?;
        let ce = self.ce_loss.item()?;
        let aux = self.aux_loss.as_ref().map(Var::item).transpose()?;
        Ok((logits, ce, aux))
    }

    /// 训练一个 epoch
    pub fn train_epoch(
        &mut self,
        loader: &DataLoader,
        epoch: usize,
    ) -> Result<EpochStats, TrainError> {
        if loader.num_batches() == 0 {
            return Err(TrainError::EmptyLoader);
        }
        let _span = info_span!("train", epoch = epoch + 1).entered();
        let start = Instant::now();
        let mut metrics = RunningMetrics::new();
        self.graph.train();

        for (batch_idx, (images, labels)) in
            loader.iter_with_seed(self.ctx.loader_seed(epoch)).enumerate()
        {
            self.feed(&images, &labels)?;
            self.loss.forward()?;
            let (logits, ce, aux) = self.read_outputs()?;
            self.optimizer.minimize(&self.loss)?;
            metrics.update(ce, aux, &logits, &labels);

            if self.log_every > 0 && (batch_idx + 1) % self.log_every == 0 {
                debug!(
                    batch = batch_idx + 1,
                    of = loader.num_batches(),
                    loss = metrics.mean_loss(),
                    acc = metrics.accuracy(),
                    "训练中"
                );
            }
        }

        let stats = metrics.finish(epoch, start.elapsed());
        info!(%stats, "训练 epoch 完成");
        Ok(stats)
    }

    /// 在 no_grad 模式下评估（不更新参数）
    pub fn evaluate(&self, loader: &DataLoader, epoch: usize) -> Result<EpochStats, TrainError> {
        if loader.num_batches() == 0 {
            return Err(TrainError::EmptyLoader);
        }
        let _span = info_span!("eval", epoch = epoch + 1).entered();
        let start = Instant::now();

        let metrics = self.graph.no_grad_scope(|_| -> Result<_, TrainError> {
            let mut metrics = RunningMetrics::new();
            for (images, labels) in loader.iter() {
                self.feed(&images, &labels)?;
                self.loss.forward()?;
                let (logits, ce, aux) = self.read_outputs()?;
                metrics.update(ce, aux, &logits, &labels);
            }
            Ok(metrics)
        })?;

        let stats = metrics.finish(epoch, start.elapsed());
        info!(%stats, "评估完成");
        Ok(stats)
    }

    /// 训练 `epochs` 轮，每轮结束后在测试集上评估
    pub fn fit(
        &mut self,
        train: &DataLoader,
        test: &DataLoader,
        epochs: usize,
    ) -> Result<Vec<EpochReport>, TrainError> {
        let mut reports = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            let train_stats = self.train_epoch(train, epoch)?;
            let test_stats = self.evaluate(test, epoch)?;
            reports.push(EpochReport {
                train: train_stats,
                test: test_stats,
            });
        }
        Ok(reports)
    }
}

fn build_optimizer(
    graph: &Graph,
    params: &[Var],
    config: &OptimizerConfig,
) -> Result<Box<dyn Optimizer>, GraphError> {
    Ok(match *config {
        OptimizerConfig::Sgd { lr } => Box::new(SGD::new(graph, params, lr)?),
        OptimizerConfig::Adam {
            lr,
            beta1,
            beta2,
            epsilon,
        } => Box::new(Adam::new_with_config(
            graph, params, lr, beta1, beta2, epsilon,
        )?),
    })
}

/// 在上下文的线程池中完成一次完整实验（构建 → 训练 → 评估）
///
/// 计算图在线程池内部创建，不会跨线程传递。
pub fn run_experiment(
    ctx: &ExecutionContext,
    config: &ExperimentConfig,
    train: &DataLoader,
    test: &DataLoader,
) -> Result<Vec<EpochReport>, TrainError> {
    ctx.install(|| {
        let mut trainer = Trainer::new(ctx, config)?;
        debug!(summary = %trainer.model().summary(), "网络结构");
        trainer.fit(train, test, config.epochs)
    })
}
