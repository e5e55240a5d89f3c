/*
 * @Description  : Optimizer API - PyTorch 风格
 *
 * 核心特性：
 * - Optimizer 持有 Rc<RefCell<GraphInner>> 引用
 * - params 存储 Vec<Var>
 * - minimize(&mut self, loss: &Var) 一步完成训练
 */

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::nn::graph::GraphInner;
use crate::nn::{Graph, GraphError, NodeId, Var};
use crate::tensor::Tensor;

/// Optimizer trait（PyTorch 风格）
///
/// # 使用示例
/// ```ignore
/// let mut optimizer = Adam::new(&graph, &model.parameters(), 1e-3)?;
///
/// optimizer.zero_grad()?;
/// loss.backward()?;
/// optimizer.step()?;
///
/// // 或者一步完成
/// let loss_val = optimizer.minimize(&loss)?;
/// ```
pub trait Optimizer {
    /// 清零所有绑定参数的梯度
    fn zero_grad(&mut self) -> Result<(), GraphError>;

    /// 更新参数（只更新 Optimizer 绑定的参数）
    fn step(&mut self) -> Result<(), GraphError>;

    /// `zero_grad` → backward → step
    ///
    /// 参数梯度在 backward 中累加，所以必须先清零。
    /// 返回 loss 的标量值。
    fn minimize(&mut self, loss: &Var) -> Result<f32, GraphError> {
        self.zero_grad()?;
        let loss_val = loss.backward()?;
        self.step()?;
        Ok(loss_val)
    }

    fn learning_rate(&self) -> f32;

    fn set_learning_rate(&mut self, lr: f32);

    /// 重置累积状态（如 Adam 的动量）
    fn reset(&mut self);
}

fn check_learning_rate(optimizer: &str, lr: f32) -> Result<(), GraphError> {
    if !lr.is_finite() || lr <= 0.0 {
        return Err(GraphError::InvalidConfiguration(format!(
            "{optimizer} 的学习率必须是正的有限数，得到 {lr}"
        )));
    }
    Ok(())
}

fn clear_grads(graph: &RefCell<GraphInner>, params: &[Var]) -> Result<(), GraphError> {
    let mut g = graph.borrow_mut();
    for param in params {
        g.clear_node_grad(param.node_id())?;
    }
    Ok(())
}

/// 取出参数的当前值与梯度（无梯度时返回 None）
fn value_and_grad(
    g: &GraphInner,
    node_id: NodeId,
) -> Result<Option<(Tensor, Tensor)>, GraphError> {
    let Some(grad) = g.get_node_grad(node_id)?.cloned() else {
        return Ok(None);
    };
    let current = g
        .get_node_value(node_id)?
        .cloned()
        .ok_or_else(|| GraphError::ComputationError(format!("参数节点 {node_id} 没有值")))?;
    Ok(Some((current, grad)))
}

/// SGD 优化器
///
/// 随机梯度下降：θ = θ - α * ∇θ
pub struct SGD {
    graph: Rc<RefCell<GraphInner>>,
    params: Vec<Var>,
    lr: f32,
}

impl SGD {
    pub fn new(graph: &Graph, params: &[Var], lr: f32) -> Result<Self, GraphError> {
        check_learning_rate("SGD", lr)?;
        Ok(Self {
            graph: graph.inner_rc(),
            params: params.to_vec(),
            lr,
        })
    }

    pub fn params(&self) -> &[Var] {
        &self.params
    }
}

impl Optimizer for SGD {
    fn zero_grad(&mut self) -> Result<(), GraphError> {
        clear_grads(&self.graph, &self.params)
    }

    fn step(&mut self) -> Result<(), GraphError> {
        let mut g = self.graph.borrow_mut();
        for param in &self.params {
            let node_id = param.node_id();
            if let Some((current, grad)) = value_and_grad(&g, node_id)? {
                let new_value = current - self.lr * &grad;
                g.set_node_value(node_id, Some(&new_value))?;
            }
        }
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn reset(&mut self) {
        // SGD 无状态
    }
}

/// Adam 优化器
///
/// - m = β1 * m + (1 - β1) * g
/// - v = β2 * v + (1 - β2) * g²
/// - θ = θ - α * `m_hat` / (√`v_hat` + ε)
pub struct Adam {
    graph: Rc<RefCell<GraphInner>>,
    params: Vec<Var>,
    lr: f32,
    /// 一阶矩衰减
    beta1: f32,
    /// 二阶矩衰减
    beta2: f32,
    epsilon: f32,
    /// 一阶矩估计（按 `NodeId` 索引）
    m: HashMap<NodeId, Tensor>,
    /// 二阶矩估计（按 `NodeId` 索引）
    v: HashMap<NodeId, Tensor>,
    /// 时间步
    t: usize,
}

impl Adam {
    pub fn new(graph: &Graph, params: &[Var], lr: f32) -> Result<Self, GraphError> {
        Self::new_with_config(graph, params, lr, 0.9, 0.999, 1e-8)
    }

    /// 创建带完整配置的 Adam 优化器
    pub fn new_with_config(
        graph: &Graph,
        params: &[Var],
        lr: f32,
        beta1: f32,
        beta2: f32,
        epsilon: f32,
    ) -> Result<Self, GraphError> {
        check_learning_rate("Adam", lr)?;
        if !(0.0..1.0).contains(&beta1) || !(0.0..1.0).contains(&beta2) {
            return Err(GraphError::InvalidConfiguration(format!(
                "Adam 的 beta 必须位于 [0, 1)，得到 beta1={beta1}, beta2={beta2}"
            )));
        }
        Ok(Self {
            graph: graph.inner_rc(),
            params: params.to_vec(),
            lr,
            beta1,
            beta2,
            epsilon,
            m: HashMap::new(),
            v: HashMap::new(),
            t: 0,
        })
    }

    pub fn params(&self) -> &[Var] {
        &self.params
    }

    /// 指定参数的一阶矩
    pub fn get_momentum(&self, param: &Var) -> Option<&Tensor> {
        self.m.get(&param.node_id())
    }

    /// 指定参数的二阶矩
    pub fn get_velocity(&self, param: &Var) -> Option<&Tensor> {
        self.v.get(&param.node_id())
    }

    pub const fn timestep(&self) -> usize {
        self.t
    }
}

impl Optimizer for Adam {
    fn zero_grad(&mut self) -> Result<(), GraphError> {
        clear_grads(&self.graph, &self.params)
    }

    fn step(&mut self) -> Result<(), GraphError> {
        self.t += 1;
        let bias_correction1 = 1.0 - self.beta1.powi(self.t as i32);
        let bias_correction2 = 1.0 - self.beta2.powi(self.t as i32);
        let mut g = self.graph.borrow_mut();

        for param in &self.params {
            let node_id = param.node_id();
            let Some((current, grad)) = value_and_grad(&g, node_id)? else {
                continue;
            };

            let m = self
                .m
                .entry(node_id)
                .or_insert_with(|| Tensor::zeros(grad.shape()));
            *m *= self.beta1;
            *m += &(&grad * (1.0 - self.beta1));

            let v = self
                .v
                .entry(node_id)
                .or_insert_with(|| Tensor::zeros(grad.shape()));
            *v *= self.beta2;
            *v += &(&(&grad * &grad) * (1.0 - self.beta2));

            let m_hat = &*m / bias_correction1;
            let v_hat = &*v / bias_correction2;
            let update = &m_hat / &(v_hat.sqrt() + self.epsilon);
            let new_value = current - self.lr * &update;

            g.set_node_value(node_id, Some(&new_value))?;
        }
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn reset(&mut self) {
        self.m.clear();
        self.v.clear();
        self.t = 0;
    }
}
