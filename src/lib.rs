// ==========================================
// Kamayan 配置层 - 核心库
// ==========================================
// 职责: 配置树 + 参数路由，为模拟后端生成启动输入文件
// 系统定位: 只做配置与编排，物理计算交给后端
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 错误类型
pub mod error;

// 参数层 - 参数值、输入块、单元注册表、路由
pub mod params;

// 配置树 - 节点竞技场、句柄、插槽
pub mod tree;

// 代码单元配置节点
pub mod code_units;

// 后端接口 - 内置单元与执行器
pub mod backend;

// 运行配置
pub mod config;

// 模拟管理器
pub mod manager;

// 问题描述文件
pub mod problem;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

pub use error::{ConfigError, ConfigResult};

pub use params::{
    InputBlock, ParamValue, ParamWriter, ParameterRouter, ParameterStore, Unit, UnitCollection,
    UnitRegistry,
};

pub use tree::{AnyNodeRef, ConfigNode, ConfigTree, NodeId, NodeRef, RootNode, Slot};

pub use backend::{DriverStatus, NullBackend, SimulationBackend};

pub use config::RunConfig;

pub use manager::{Manager, ManagerState};

pub use problem::ProblemSpec;

// ==========================================
// 常量定义
// ==========================================

// 库版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
