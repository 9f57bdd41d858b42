// ==========================================
// Kamayan 配置层 - 参数层
// ==========================================
// 职责: 参数值、输入块、后端存储、单元注册表与参数路由
// 红线: 不含配置树逻辑
// ==========================================

pub mod block;
pub mod registry;
pub mod router;
pub mod store;
pub mod value;

pub use block::InputBlock;
pub use registry::{SetupHook, Unit, UnitCollection, UnitRegistry};
pub use router::{BlockView, FallbackBlock, ParamWriter, ParameterRouter, UNKNOWN_PROVENANCE};
pub use store::{Parameter, ParameterStore};
pub use value::ParamValue;
