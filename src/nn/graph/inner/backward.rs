/*
 * @Description  : GraphInner VJP 反向传播
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::NodeType;
use crate::tensor::Tensor;
use std::collections::HashSet;

impl GraphInner {
    // ========== VJP 反向传播核心 ==========

    /// 反向传播，返回损失的标量值
    ///
    /// - 评估模式（no_grad）下拒绝执行
    /// - 损失必须是标量；若损失尚无值，先执行前向传播
    /// - 参数节点的梯度累加（需由优化器 `zero_grad` 清零）
    /// - 结束后释放中间节点的值和梯度
    pub fn backward(&mut self, loss_id: NodeId) -> Result<f32, GraphError> {
        if !self.is_train_mode() {
            return Err(GraphError::InvalidOperation(
                "评估（no_grad）模式下不能执行反向传播".to_string(),
            ));
        }

        self.forward(loss_id)?;
        let loss_node = self.get_node(loss_id)?;
        let loss_value = loss_node.value().ok_or_else(|| {
            GraphError::ComputationError(format!("损失{loss_node}没有值，请先执行 forward"))
        })?;
        let loss_scalar = loss_value.get_data_number().ok_or_else(|| {
            GraphError::InvalidOperation(format!(
                "反向传播要求损失为标量 [1, 1]，但得到 {:?}",
                loss_value.shape()
            ))
        })?;
        let loss_grad = Tensor::ones(loss_value.shape());

        self.reset_intermediate_grad();
        self.get_node_mut(loss_id)?.set_grad(Some(&loss_grad));

        for node_id in self.topological_sort_backward(loss_id)? {
            self.propagate_grad_to_parents(node_id)?;
        }

        self.backward_count += 1;
        self.release_intermediate_results();
        Ok(loss_scalar)
    }

    /// 将梯度从当前节点传播到其父节点（输入节点不接收梯度）
    fn propagate_grad_to_parents(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        let parent_ids = self.get_node_parents(node_id)?;
        if parent_ids.is_empty() {
            return Ok(());
        }

        let parent_grads: Vec<(NodeId, Tensor)> = {
            let node = self.get_node(node_id)?;
            let Some(upstream_grad) = node.grad() else {
                return Ok(());
            };

            let mut grads = Vec::with_capacity(parent_ids.len());
            for parent_id in &parent_ids {
                let parent = self.get_node(*parent_id)?;
                if let NodeType::Input(_) = parent.node_type() {
                    continue;
                }

                let assistant = parent_ids
                    .iter()
                    .find(|&&id| id != *parent_id)
                    .map(|&id| self.get_node(id))
                    .transpose()?;
                let parent_grad = node.calc_grad_to_parent(parent, upstream_grad, assistant)?;
                grads.push((*parent_id, parent_grad));
            }
            grads
        };

        for (parent_id, parent_grad) in parent_grads {
            let parent_node = self.get_node_mut(parent_id)?;
            let new_grad = match parent_node.grad() {
                Some(existing) => existing + &parent_grad,
                None => parent_grad,
            };
            parent_node.set_grad(Some(&new_grad));
        }

        Ok(())
    }

    /// 反向拓扑排序：后序 DFS 后反转，保证每个节点在其所有子节点之后处理
    /// （一个节点被多个子节点共享时，梯度已全部累加完毕才向上传播）
    fn topological_sort_backward(&self, loss_id: NodeId) -> Result<Vec<NodeId>, GraphError> {
        fn dfs(
            graph: &GraphInner,
            node_id: NodeId,
            visited: &mut HashSet<NodeId>,
            order: &mut Vec<NodeId>,
        ) -> Result<(), GraphError> {
            if !visited.insert(node_id) {
                return Ok(());
            }
            for parent_id in graph.get_node_parents(node_id)? {
                dfs(graph, parent_id, visited, order)?;
            }
            order.push(node_id);
            Ok(())
        }

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        dfs(self, loss_id, &mut visited, &mut order)?;
        order.reverse();
        Ok(order)
    }

    /// 清除所有节点的梯度
    pub fn clear_grad(&mut self) {
        for node in self.nodes.values_mut() {
            node.clear_grad();
        }
    }

    /// 清除单个节点的梯度
    pub fn clear_node_grad(&mut self, node_id: NodeId) -> Result<(), GraphError> {
        self.get_node_mut(node_id)?.clear_grad();
        Ok(())
    }
}
