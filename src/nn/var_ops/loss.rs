/*
 * @Description  : Var 损失函数扩展 trait
 */

use crate::nn::{GraphError, Var};

/// 损失函数扩展 trait
///
/// # 使用示例
/// ```ignore
/// use fuzzy_pool::nn::VarLossOps;
///
/// let loss = logits.cross_entropy(&labels)?;
/// ```
pub trait VarLossOps {
    /// Softmax 交叉熵损失（batch 平均）
    ///
    /// # 参数
    /// - `labels`: 类别索引，形状 [batch]（以 f32 存放的整数）
    ///
    /// # 返回
    /// 形状 [1, 1] 的标量损失节点
    fn cross_entropy(&self, labels: &Var) -> Result<Var, GraphError>;
}

impl VarLossOps for Var {
    fn cross_entropy(&self, labels: &Var) -> Result<Var, GraphError> {
        self.ensure_same_graph(labels, "交叉熵")?;
        let id = self.graph().borrow_mut().new_softmax_cross_entropy_node(
            self.node_id(),
            labels.node_id(),
            None,
        )?;
        Ok(self.sibling(id))
    }
}
