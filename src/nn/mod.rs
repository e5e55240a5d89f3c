/*
 * @Description  : 负责神经网络（neural network）的构建：计算图、节点、层、优化器与模糊池化
 */

pub mod classifier;
mod descriptor;
pub mod fuzzy;
mod graph;
pub mod layer;
mod module;
mod nodes;
pub mod optimizer;
mod var;
mod var_ops;
pub mod window;

pub use classifier::{ClassifierOutput, PoolingClassifier};
pub use descriptor::{GraphDescriptor, NodeDescriptor, NodeTypeDescriptor};
pub use graph::{Graph, GraphError, GraphInner};
pub use module::Module;
pub use nodes::NodeId;
pub use optimizer::{Adam, Optimizer, SGD};
pub use var::{Init, Var};
pub use var_ops::{VarConvOps, VarLossOps, VarMatrixOps, VarPoolingOps, VarShapeOps};

#[cfg(test)]
mod tests;
