// ==========================================
// Kamayan 配置层 - 错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 所有错误同步返回给调用方，对本次运行是致命的，内部不做重试
// ==========================================

use std::path::PathBuf;

use thiserror::Error;

use crate::backend::DriverStatus;

/// 配置树 / 参数路由 / 管理器的统一错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    // ===== 规格错误 =====
    #[error("{type_name} 未实现 export_settings")]
    NotImplemented { type_name: String },

    #[error("插槽未配置: {owner}.{slot}")]
    NotConfigured { owner: String, slot: String },

    #[error("参数块未找到: unit={unit} block={block}")]
    NotFound { unit: String, block: String },

    #[error("配置约束冲突: {0}")]
    Overconstrained(String),

    #[error("模拟未成功完成: status={status}")]
    SimulationIncomplete { status: DriverStatus },

    // ===== 参数读取错误 =====
    #[error("参数类型不匹配: <{block}>/{key} 期望 {expected}, 实际 {found}")]
    TypeMismatch {
        block: String,
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("参数未声明: <{block}>/{key}")]
    UnknownKey { block: String, key: String },

    // ===== 配置树错误 =====
    #[error("节点句柄已失效: {node}")]
    StaleNode { node: String },

    #[error("配置树正在被借用: {0}")]
    TreeBusy(String),

    #[error("无效配置: {0}")]
    InvalidConfiguration(String),

    // ===== I/O 与序列化 =====
    #[error("文件读写失败 ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConfigError {
    /// 构造带路径的 I/O 错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
