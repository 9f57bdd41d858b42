// ==========================================
// Kamayan 配置层 - 配置树
// ==========================================
// 职责: 节点竞技场、配置节点 trait、强句柄与子节点插槽
// 红线: 树不拥有节点的生命周期，调用方通过 NodeRef 持有
// ==========================================

pub mod arena;
pub mod handle;
pub mod node;
pub mod slot;

pub use arena::NodeId;
pub use handle::{AnyNodeRef, ConfigTree, NodeRef};
pub use node::{short_type_name, AsAny, ConfigNode, RootNode};
pub use slot::Slot;
