/*
 * @Description  : 计算图节点：NodeHandle（图中的节点句柄）与各类原始节点（raw_node）
 */

mod node_handle;
pub(in crate::nn) mod raw_node;

pub use node_handle::NodeId;
pub(in crate::nn) use node_handle::NodeHandle;
pub(in crate::nn) use raw_node::NodeType;
