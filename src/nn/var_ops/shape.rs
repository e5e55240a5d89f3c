/*
 * @Description  : Var 形状变换扩展 trait
 */

use crate::nn::{GraphError, Var};

/// 形状变换扩展 trait
pub trait VarShapeOps {
    /// 保留 batch 维，其余维度展平：[B, d1, d2, ...] → [B, d1*d2*...]
    fn flatten(&self) -> Result<Var, GraphError>;
}

impl VarShapeOps for Var {
    fn flatten(&self) -> Result<Var, GraphError> {
        let id = self
            .graph()
            .borrow_mut()
            .new_flatten_node(self.node_id(), None)?;
        Ok(self.sibling(id))
    }
}
