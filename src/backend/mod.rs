// ==========================================
// Kamayan 配置层 - 模拟后端接口
// ==========================================
// 职责: 定义外部数值引擎的执行入口
// 红线: 本层不实现任何物理，只把输入文件交给后端
// ==========================================

pub mod builtin;
pub mod command;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::ConfigResult;

pub use builtin::{default_units, process_units};
pub use command::CommandBackend;

// ==========================================
// 驱动状态 (Driver Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Complete, // 正常结束
    Timeout,  // 达到墙钟上限
    Failed,   // 执行失败
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverStatus::Complete => write!(f, "complete"),
            DriverStatus::Timeout => write!(f, "timeout"),
            DriverStatus::Failed => write!(f, "failed"),
        }
    }
}

// ==========================================
// SimulationBackend Trait
// ==========================================
// 用途: 执行模拟并报告完成状态
// 实现者: CommandBackend（外部可执行文件）、NullBackend
pub trait SimulationBackend {
    /// 以输入文件启动模拟
    ///
    /// # 参数
    /// - input: 已写出的输入文件
    /// - overrides: `block/key=value` 形式的覆盖参数，原样转发
    fn execute(&mut self, input: &Path, overrides: &[String]) -> ConfigResult<DriverStatus>;

    /// 模拟完成后的清理
    fn finalize(&mut self) -> ConfigResult<()>;
}

/// 不执行任何东西，直接报告完成
#[derive(Debug, Default)]
pub struct NullBackend;

impl SimulationBackend for NullBackend {
    fn execute(&mut self, input: &Path, overrides: &[String]) -> ConfigResult<DriverStatus> {
        tracing::debug!(input = %input.display(), overrides = overrides.len(), "空后端跳过执行");
        Ok(DriverStatus::Complete)
    }

    fn finalize(&mut self) -> ConfigResult<()> {
        Ok(())
    }
}
