// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供可记录调用的后端、单元集合与管理器构建
// ==========================================

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use kamayan_config::backend::{process_units, DriverStatus, SimulationBackend};
use kamayan_config::config::RunConfig;
use kamayan_config::manager::Manager;
use kamayan_config::params::{Unit, UnitCollection};
use kamayan_config::ConfigResult;

/// 后端调用记录
#[derive(Debug, Default)]
pub struct BackendLog {
    pub executed: Vec<(PathBuf, Vec<String>)>,
    pub finalized: usize,
}

/// 返回固定状态并记录调用的后端
pub struct RecordingBackend {
    status: DriverStatus,
    log: Rc<RefCell<BackendLog>>,
}

impl RecordingBackend {
    pub fn new(status: DriverStatus) -> (Self, Rc<RefCell<BackendLog>>) {
        let log = Rc::new(RefCell::new(BackendLog::default()));
        (
            Self {
                status,
                log: Rc::clone(&log),
            },
            log,
        )
    }
}

impl SimulationBackend for RecordingBackend {
    fn execute(&mut self, input: &Path, overrides: &[String]) -> ConfigResult<DriverStatus> {
        self.log
            .borrow_mut()
            .executed
            .push((input.to_path_buf(), overrides.to_vec()));
        Ok(self.status)
    }

    fn finalize(&mut self) -> ConfigResult<()> {
        self.log.borrow_mut().finalized += 1;
        Ok(())
    }
}

/// sedov 主单元 + 内置单元
pub fn sedov_units() -> UnitCollection {
    let hook: Box<dyn Fn(&mut Unit)> = Box::new(|unit: &mut Unit| {
        unit.add_data("sedov")
            .declare("density", 1.0, "Ambient density.")
            .declare("pressure", 1.0e-5, "Ambient pressure.");
    });
    process_units("sedov", Some(hook))
}

/// 输入文件写在 dir 下的单进程运行配置
pub fn run_config(dir: &Path) -> RunConfig {
    RunConfig::new("sedov").with_input_file(dir.join("sedov.in"))
}

/// 使用 sedov 单元与给定后端创建管理器
pub fn create_manager(dir: &Path, backend: Box<dyn SimulationBackend>) -> Manager {
    kamayan_config::logging::init_test();
    Manager::new(run_config(dir), sedov_units(), backend).expect("Failed to create manager")
}
