/*
 * @Description  : Var 卷积扩展 trait
 */

use crate::nn::{GraphError, Var};

/// 卷积扩展 trait
pub trait VarConvOps {
    /// 2D 卷积（无偏置）
    ///
    /// # 形状要求
    /// - self: [B, C_in, H, W]
    /// - kernel: [C_out, C_in, kH, kW]
    fn conv2d(
        &self,
        kernel: &Var,
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Var, GraphError>;

    /// 按通道加偏置：[B, C, H, W] + [1, C]
    fn channel_bias_add(&self, bias: &Var) -> Result<Var, GraphError>;
}

impl VarConvOps for Var {
    fn conv2d(
        &self,
        kernel: &Var,
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Var, GraphError> {
        self.ensure_same_graph(kernel, "卷积")?;
        let id = self.graph().borrow_mut().new_conv2d_node(
            self.node_id(),
            kernel.node_id(),
            stride,
            padding,
            None,
        )?;
        Ok(self.sibling(id))
    }

    fn channel_bias_add(&self, bias: &Var) -> Result<Var, GraphError> {
        self.ensure_same_graph(bias, "通道偏置相加")?;
        let id = self.graph().borrow_mut().new_channel_bias_add_node(
            self.node_id(),
            bias.node_id(),
            None,
        )?;
        Ok(self.sibling(id))
    }
}
