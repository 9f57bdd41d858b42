// ==========================================
// Kamayan 配置层 - 外部引擎进程后端
// ==========================================
// 以 `<program> -i <input> <overrides...>` 启动引擎可执行文件
// 退出码 0 视为完成，其余视为失败
// ==========================================

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use super::{DriverStatus, SimulationBackend};
use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// 追加放在输入文件之前的固定参数
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// 组装命令行参数（不含程序本身）
    pub fn arguments(&self, input: &Path, overrides: &[String]) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.push("-i".to_string());
        args.push(input.display().to_string());
        args.extend(overrides.iter().cloned());
        args
    }
}

impl SimulationBackend for CommandBackend {
    fn execute(&mut self, input: &Path, overrides: &[String]) -> ConfigResult<DriverStatus> {
        let args = self.arguments(input, overrides);
        info!(program = %self.program.display(), args = ?args, "启动模拟引擎");

        let status = Command::new(&self.program)
            .args(&args)
            .status()
            .map_err(|e| ConfigError::io(&self.program, e))?;

        if status.success() {
            Ok(DriverStatus::Complete)
        } else {
            warn!(code = ?status.code(), "模拟引擎非正常退出");
            Ok(DriverStatus::Failed)
        }
    }

    fn finalize(&mut self) -> ConfigResult<()> {
        Ok(())
    }
}
