use super::super::{TraitNode, parent_value};
use crate::nn::GraphError;
use crate::nn::nodes::{NodeHandle, NodeId};
use crate::tensor::Tensor;

/// Softmax + CrossEntropy 融合损失节点
///
/// 将 Softmax 激活和交叉熵损失合并为单一节点：
/// 1. 数值稳定：使用 log-sum-exp 技巧避免溢出
/// 2. 梯度简洁：∂L/∂x = (softmax(x) - onehot(y)) / batch
///
/// ## 输入
/// - 父节点 0: logits [batch, num_classes]（未经 softmax 的原始分数）
/// - 父节点 1: labels [batch]（类别索引，以 f32 存储）
///
/// ## 输出
/// - 标量损失 [1, 1]，为 batch 内的平均值
///
/// ## 数值稳定计算
/// ```text
/// L_b = max(x_b) + log(Σ exp(x_bj - max(x_b))) - x_b[y_b]
/// ```
pub(in crate::nn) struct SoftmaxCrossEntropy {
    value: Option<Tensor>,
    grad: Option<Tensor>,
    shape: Vec<usize>,
    /// 缓存 softmax 结果，用于反向传播
    softmax_cache: Option<Tensor>,
    /// 缓存类别索引，用于反向传播
    labels_cache: Option<Vec<usize>>,
    /// 父节点 ID，用于区分 logits 和 labels
    parents_ids: Vec<NodeId>,
}

impl SoftmaxCrossEntropy {
    pub(in crate::nn) fn new(parents: &[&NodeHandle]) -> Result<Self, GraphError> {
        // 1. 验证父节点数量
        if parents.len() != 2 {
            return Err(GraphError::InvalidOperation(
                "SoftmaxCrossEntropy 节点需要 2 个父节点（logits 和 labels）".to_string(),
            ));
        }

        // 2. 验证形状：logits [batch, C]，labels [batch]
        let logits_shape = parents[0].value_expected_shape();
        let labels_shape = parents[1].value_expected_shape();
        if logits_shape.len() != 2 || logits_shape[1] < 2 {
            return Err(GraphError::ShapeMismatch {
                expected: vec![0, 2],
                got: logits_shape.to_vec(),
                message: "logits 必须是 [batch, num_classes] 且 num_classes >= 2".to_string(),
            });
        }
        if labels_shape != [logits_shape[0]] {
            return Err(GraphError::ShapeMismatch {
                expected: vec![logits_shape[0]],
                got: labels_shape.to_vec(),
                message: "labels 必须是形状为 [batch] 的类别索引".to_string(),
            });
        }

        Ok(Self {
            value: None,
            grad: None,
            shape: vec![1, 1],
            softmax_cache: None,
            labels_cache: None,
            parents_ids: vec![parents[0].id(), parents[1].id()],
        })
    }

    /// 把以 f32 存储的类别索引转换为 usize，并校验范围
    fn class_indices(labels: &Tensor, num_classes: usize) -> Result<Vec<usize>, GraphError> {
        labels
            .data_as_slice()
            .iter()
            .map(|&label| {
                let idx = label as usize;
                if label < 0.0 || label.fract() != 0.0 || idx >= num_classes {
                    Err(GraphError::ComputationError(format!(
                        "类别标签 {label} 不是 [0, {num_classes}) 内的整数"
                    )))
                } else {
                    Ok(idx)
                }
            })
            .collect()
    }
}

impl TraitNode for SoftmaxCrossEntropy {
    fn value_expected_shape(&self) -> &[usize] {
        &self.shape
    }

    fn calc_value_by_parents(&mut self, parents: &[&NodeHandle]) -> Result<(), GraphError> {
        let logits = parent_value("SoftmaxCrossEntropy", parents[0])?;
        let labels = parent_value("SoftmaxCrossEntropy", parents[1])?;

        let (batch_size, num_classes) = (logits.shape()[0], logits.shape()[1]);
        if labels.size() != batch_size {
            return Err(GraphError::ShapeMismatch {
                expected: vec![batch_size],
                got: labels.shape().to_vec(),
                message: "labels 的 batch 大小与 logits 不一致".to_string(),
            });
        }
        let indices = Self::class_indices(labels, num_classes)?;

        let mut softmax = Vec::with_capacity(batch_size * num_classes);
        let mut total_loss = 0.0f32;
        for (row, &target) in logits.data_as_slice().chunks(num_classes).zip(&indices) {
            let max_val = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let exps: Vec<f32> = row.iter().map(|&x| (x - max_val).exp()).collect();
            let sum_exp: f32 = exps.iter().sum();
            total_loss += max_val + sum_exp.ln() - row[target];
            softmax.extend(exps.iter().map(|e| e / sum_exp));
        }

        self.softmax_cache = Some(Tensor::from_vec(softmax, logits.shape()));
        self.labels_cache = Some(indices);
        self.value = Some(Tensor::from(total_loss / batch_size as f32));
        Ok(())
    }

    fn value(&self) -> Option<&Tensor> {
        self.value.as_ref()
    }

    fn clear_value(&mut self) {
        self.value = None;
        self.softmax_cache = None;
        self.labels_cache = None;
    }

    fn calc_grad_to_parent(
        &self,
        target_parent: &NodeHandle,
        upstream_grad: &Tensor,
        _assistant_parent: Option<&NodeHandle>,
    ) -> Result<Tensor, GraphError> {
        if target_parent.id() != self.parents_ids[0] {
            return Err(GraphError::InvalidOperation(
                "SoftmaxCrossEntropy 只对 logits 计算梯度".to_string(),
            ));
        }
        let (softmax, labels) = self
            .softmax_cache
            .as_ref()
            .zip(self.labels_cache.as_ref())
            .ok_or_else(|| GraphError::ComputationError("缺少 softmax 缓存".to_string()))?;
        let upstream = upstream_grad.get_data_number().ok_or_else(|| {
            GraphError::ComputationError("SoftmaxCrossEntropy 的上游梯度必须是标量".to_string())
        })?;

        let num_classes = softmax.shape()[1];
        let scale = upstream / labels.len() as f32;
        let mut grad = softmax.to_vec();
        for (b, &target) in labels.iter().enumerate() {
            grad[b * num_classes + target] -= 1.0;
        }
        grad.iter_mut().for_each(|g| *g *= scale);
        Ok(Tensor::from_vec(grad, softmax.shape()))
    }

    fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    fn set_grad(&mut self, grad: Option<&Tensor>) {
        self.grad = grad.cloned();
    }
}
