/*
 * @Description  : GraphInner 节点构建方法（new_*_node）
 */

use super::super::error::GraphError;
use super::GraphInner;
use crate::nn::NodeId;
use crate::nn::nodes::NodeHandle;

impl GraphInner {
    /// 添加节点到列表
    fn add_node_to_list(
        &mut self,
        mut node_handle: NodeHandle,
        name: Option<&str>,
        node_type: &str,
        parents: &[NodeId],
    ) -> Result<NodeId, GraphError> {
        let node_name = self.generate_valid_new_node_name(name.unwrap_or(""), node_type)?;
        let node_id = self.generate_valid_node_id();

        for &parent_id in parents {
            self.forward_edges.entry(parent_id).or_default().push(node_id);
        }
        self.backward_edges
            .entry(node_id)
            .or_default()
            .extend(parents);

        node_handle.bind_id_and_name(node_id, &node_name);
        self.nodes.insert(node_id, node_handle);
        Ok(node_id)
    }

    /// 创建输入节点（数据或标签，第 0 维为 batch）
    pub fn new_input_node(
        &mut self,
        shape: &[usize],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = NodeHandle::new_input(shape)?;
        self.add_node_to_list(node, name, "input", &[])
    }

    /// 创建参数节点（初始值全零，通常随后由 `Init` 策略写入）
    pub fn new_parameter_node(
        &mut self,
        shape: &[usize],
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let node = NodeHandle::new_parameter(shape)?;
        self.add_node_to_list(node, name, "parameter", &[])
    }

    pub fn new_add_node(
        &mut self,
        left_node_id: NodeId,
        right_node_id: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let parents = [left_node_id, right_node_id];
        let handle = NodeHandle::new_add(&self.get_nodes(&parents)?)?;
        self.add_node_to_list(handle, name, "add", &parents)
    }

    pub fn new_mat_mul_node(
        &mut self,
        left_node_id: NodeId,
        right_node_id: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let parents = [left_node_id, right_node_id];
        let handle = NodeHandle::new_mat_mul(&self.get_nodes(&parents)?)?;
        self.add_node_to_list(handle, name, "mat_mul", &parents)
    }

    pub fn new_conv2d_node(
        &mut self,
        input_id: NodeId,
        kernel_id: NodeId,
        stride: (usize, usize),
        padding: (usize, usize),
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let parents = [input_id, kernel_id];
        let handle = NodeHandle::new_conv2d(&self.get_nodes(&parents)?, stride, padding)?;
        self.add_node_to_list(handle, name, "conv2d", &parents)
    }

    pub fn new_channel_bias_add_node(
        &mut self,
        input_id: NodeId,
        bias_id: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let parents = [input_id, bias_id];
        let handle = NodeHandle::new_channel_bias_add(&self.get_nodes(&parents)?)?;
        self.add_node_to_list(handle, name, "channel_bias_add", &parents)
    }

    pub fn new_flatten_node(
        &mut self,
        parent_id: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle = NodeHandle::new_flatten(&self.get_nodes(&[parent_id])?)?;
        self.add_node_to_list(handle, name, "flatten", &[parent_id])
    }

    pub fn new_max_pool2d_node(
        &mut self,
        input_id: NodeId,
        pool_size: usize,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle = NodeHandle::new_max_pool2d(&self.get_nodes(&[input_id])?, pool_size)?;
        self.add_node_to_list(handle, name, "max_pool2d", &[input_id])
    }

    pub fn new_avg_pool2d_node(
        &mut self,
        input_id: NodeId,
        pool_size: usize,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle = NodeHandle::new_avg_pool2d(&self.get_nodes(&[input_id])?, pool_size)?;
        self.add_node_to_list(handle, name, "avg_pool2d", &[input_id])
    }

    pub fn new_fuzzy_pool2d_node(
        &mut self,
        input_id: NodeId,
        pool_size: usize,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle = NodeHandle::new_fuzzy_pool2d(&self.get_nodes(&[input_id])?, pool_size)?;
        self.add_node_to_list(handle, name, "fuzzy_pool2d", &[input_id])
    }

    pub fn new_membership_penalty_node(
        &mut self,
        input_id: NodeId,
        pool_size: usize,
        reg_lambda: f32,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let handle = NodeHandle::new_membership_penalty(
            &self.get_nodes(&[input_id])?,
            pool_size,
            reg_lambda,
        )?;
        self.add_node_to_list(handle, name, "membership_penalty", &[input_id])
    }

    pub fn new_softmax_cross_entropy_node(
        &mut self,
        logits_id: NodeId,
        labels_id: NodeId,
        name: Option<&str>,
    ) -> Result<NodeId, GraphError> {
        let parents = [logits_id, labels_id];
        let handle = NodeHandle::new_softmax_cross_entropy(&self.get_nodes(&parents)?)?;
        self.add_node_to_list(handle, name, "softmax_ce", &parents)
    }
}
