/*
 * @Description  : Var 池化扩展 trait
 *
 * 三种池化都使用不重叠的 `pool_size × pool_size` 窗口（步长等于窗口边长），
 * 输入空间尺寸必须能被 `pool_size` 整除。
 */

use crate::nn::{GraphError, Var};

/// 池化扩展 trait
///
/// # 使用示例
/// ```ignore
/// use fuzzy_pool::nn::VarPoolingOps;
///
/// let pooled = features.fuzzy_pool2d(2)?;
/// let penalty = features.membership_penalty(2, 0.01)?;
/// ```
pub trait VarPoolingOps {
    fn max_pool2d(&self, pool_size: usize) -> Result<Var, GraphError>;

    fn avg_pool2d(&self, pool_size: usize) -> Result<Var, GraphError>;

    /// 模糊池化：窗口内按高斯隶属度加权，只保留主导元素
    fn fuzzy_pool2d(&self, pool_size: usize) -> Result<Var, GraphError>;

    /// 隶属度正则项 `λ · Σ m² / (B · C)`，输出形状 [1, 1]
    fn membership_penalty(&self, pool_size: usize, reg_lambda: f32) -> Result<Var, GraphError>;
}

impl VarPoolingOps for Var {
    fn max_pool2d(&self, pool_size: usize) -> Result<Var, GraphError> {
        let id = self
            .graph()
            .borrow_mut()
            .new_max_pool2d_node(self.node_id(), pool_size, None)?;
        Ok(self.sibling(id))
    }

    fn avg_pool2d(&self, pool_size: usize) -> Result<Var, GraphError> {
        let id = self
            .graph()
            .borrow_mut()
            .new_avg_pool2d_node(self.node_id(), pool_size, None)?;
        Ok(self.sibling(id))
    }

    fn fuzzy_pool2d(&self, pool_size: usize) -> Result<Var, GraphError> {
        let id = self
            .graph()
            .borrow_mut()
            .new_fuzzy_pool2d_node(self.node_id(), pool_size, None)?;
        Ok(self.sibling(id))
    }

    fn membership_penalty(&self, pool_size: usize, reg_lambda: f32) -> Result<Var, GraphError> {
        let id = self.graph().borrow_mut().new_membership_penalty_node(
            self.node_id(),
            pool_size,
            reg_lambda,
            None,
        )?;
        Ok(self.sibling(id))
    }
}
