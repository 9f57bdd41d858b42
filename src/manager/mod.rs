// ==========================================
// Kamayan 配置层 - 模拟管理器
// ==========================================
// 流程: Setup → Configure → Flush → Serialize → Execute
// 红线: 导出顺序即插槽赋值顺序；读取其他节点结果的节点必须后赋值
// 红线: 只有 0 号进程写输入文件；执行在所有进程上调用
// ==========================================

pub mod input_file;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info};

use crate::backend::{DriverStatus, SimulationBackend};
use crate::code_units::{Driver, Grid, Outputs, Physics};
use crate::config::RunConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::params::{InputBlock, ParameterRouter, UnitRegistry};
use crate::tree::{AnyNodeRef, ConfigNode, ConfigTree, NodeRef, RootNode, Slot};

pub use input_file::{render_input, InputSnapshot, SnapshotBlock, JOB_BLOCK};

/// 管理器直接写入参数时记录的来源
pub const MANAGER_PROVENANCE: &str = "Manager";

// ==========================================
// 管理器状态 (Manager State)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManagerState {
    Setup,      // 单元注册完成
    Configured, // 已赋值配置节点
    Flushed,    // 已导出参数
    Serialized, // 已写出输入文件
    Completed,  // 模拟正常完成
    Failed,     // 本次运行失败
}

impl fmt::Display for ManagerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerState::Setup => write!(f, "SETUP"),
            ManagerState::Configured => write!(f, "CONFIGURED"),
            ManagerState::Flushed => write!(f, "FLUSHED"),
            ManagerState::Serialized => write!(f, "SERIALIZED"),
            ManagerState::Completed => write!(f, "COMPLETED"),
            ManagerState::Failed => write!(f, "FAILED"),
        }
    }
}

// ==========================================
// Manager - 模拟管理器
// ==========================================
pub struct Manager {
    config: RunConfig,
    router: ParameterRouter,
    backend: Box<dyn SimulationBackend>,
    state: ManagerState,
    driver: Slot<Driver>,
    grid: Slot<Grid>,
    physics: Slot<Physics>,
    outputs: Slot<Outputs>,
    extensions: Vec<AnyNodeRef>,
    root: NodeRef<RootNode>,
    tree: ConfigTree,
}

impl Manager {
    /// 创建管理器
    ///
    /// 依次执行各单元的注册回调，建立路由器和配置树，
    /// 并在根下挂上默认的 Physics 与 Outputs 节点。
    ///
    /// # 参数
    /// - config: 运行配置
    /// - units: 后端单元注册表
    /// - backend: 模拟执行后端
    pub fn new(
        config: RunConfig,
        mut units: impl UnitRegistry + 'static,
        backend: Box<dyn SimulationBackend>,
    ) -> ConfigResult<Self> {
        units.run_setup();
        let router = ParameterRouter::new(Box::new(units));

        let tree = ConfigTree::new();
        let root = tree.root();
        // 根锚定到自身: 经管理器插槽挂入的节点及其子插槽都直接挂在根下
        tree.set_anchor(root.id(), Some(root.id()))?;

        let mut manager = Self {
            config,
            router,
            backend,
            state: ManagerState::Setup,
            driver: Slot::new("Manager", "driver"),
            grid: Slot::new("Manager", "grid"),
            physics: Slot::new("Manager", "physics"),
            outputs: Slot::new("Manager", "outputs"),
            extensions: Vec::new(),
            root,
            tree,
        };

        let physics = manager.tree.insert(Physics::default())?;
        manager
            .tree
            .assign_slot(&manager.root, &mut manager.physics, physics)?;
        let outputs = manager.tree.insert(Outputs::new())?;
        manager
            .tree
            .assign_slot(&manager.root, &mut manager.outputs, outputs)?;

        info!(
            name = %manager.config.name,
            rank = manager.config.rank,
            nprocs = manager.config.nprocs,
            units = ?manager.router.registry().unit_names(),
            "管理器初始化完成"
        );
        Ok(manager)
    }

    // ===== 访问器 =====

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn root(&self) -> &NodeRef<RootNode> {
        &self.root
    }

    pub fn router(&self) -> &ParameterRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut ParameterRouter {
        &mut self.router
    }

    /// 在本管理器的配置树中创建节点（尚未挂树）
    pub fn create<T: ConfigNode>(&self, value: T) -> ConfigResult<NodeRef<T>> {
        self.tree.insert(value)
    }

    pub fn driver(&self) -> ConfigResult<NodeRef<Driver>> {
        self.driver.get().cloned()
    }

    pub fn grid(&self) -> ConfigResult<NodeRef<Grid>> {
        self.grid.get().cloned()
    }

    pub fn physics(&self) -> ConfigResult<NodeRef<Physics>> {
        self.physics.get().cloned()
    }

    pub fn outputs(&self) -> ConfigResult<NodeRef<Outputs>> {
        self.outputs.get().cloned()
    }

    // ===== Configure =====

    pub fn set_driver(&mut self, driver: &NodeRef<Driver>) -> ConfigResult<()> {
        self.tree
            .assign_slot(&self.root, &mut self.driver, driver.clone())?;
        self.mark_configured();
        Ok(())
    }

    pub fn set_grid(&mut self, grid: &NodeRef<Grid>) -> ConfigResult<()> {
        self.tree.assign_slot(&self.root, &mut self.grid, grid.clone())?;
        self.mark_configured();
        Ok(())
    }

    pub fn set_physics(&mut self, physics: &NodeRef<Physics>) -> ConfigResult<()> {
        self.tree
            .assign_slot(&self.root, &mut self.physics, physics.clone())?;
        self.mark_configured();
        Ok(())
    }

    pub fn set_outputs(&mut self, outputs: &NodeRef<Outputs>) -> ConfigResult<()> {
        self.tree
            .assign_slot(&self.root, &mut self.outputs, outputs.clone())?;
        self.mark_configured();
        Ok(())
    }

    /// 挂入用户扩展节点（管理器持有一份强引用）
    pub fn attach_node<T: ConfigNode>(&mut self, node: &NodeRef<T>) -> ConfigResult<()> {
        self.tree.adopt(self.root.id(), node.id())?;
        if !self.extensions.iter().any(|n| n.id() == node.id()) {
            self.extensions.push(node.erase());
        }
        self.mark_configured();
        Ok(())
    }

    /// 直接写入参数块，来源记为 "Manager"
    pub fn set_params(&mut self, block: &str, params: InputBlock) -> ConfigResult<()> {
        self.router.set_from(MANAGER_PROVENANCE, block, params)?;
        self.mark_configured();
        Ok(())
    }

    fn mark_configured(&mut self) {
        if self.state == ManagerState::Setup {
            self.state = ManagerState::Configured;
        }
    }

    // ===== Flush =====

    /// 按插入顺序遍历根的全部后代并导出参数
    ///
    /// 遇到第一个错误即停止；已写入的参数不回滚。
    pub fn flush(&mut self) -> ConfigResult<()> {
        let nodes = self.tree.descendants(self.root.id())?;
        info!(nodes = nodes.len(), "开始导出配置树");

        for id in nodes {
            let Some(type_name) = self.tree.type_name(id) else {
                continue;
            };
            let mut writer = self.router.writer(type_name);
            if let Err(e) = self.tree.export(id, &mut writer) {
                error!(node = %id, type_name = type_name, error = %e, "节点导出失败");
                self.state = ManagerState::Failed;
                return Err(e);
            }
            debug!(node = %id, type_name = type_name, "节点导出完成");
        }

        self.state = ManagerState::Flushed;
        Ok(())
    }

    // ===== Serialize =====

    /// 当前合并结果的输入文件文本
    pub fn render_input(&self) -> String {
        render_input(&self.config.name, &self.router)
    }

    /// 当前合并结果的 JSON 快照
    pub fn snapshot(&self) -> InputSnapshot {
        InputSnapshot::capture(&self.config.name, &self.router)
    }

    /// 写出输入文件
    ///
    /// # 参数
    /// - path: 目标路径；None 时使用运行配置中的 input_file
    ///
    /// # 返回
    /// - Some(path): 本进程写出的文件
    /// - None: 非 0 号进程，不写文件
    pub fn write_input(&mut self, path: Option<&Path>) -> ConfigResult<Option<PathBuf>> {
        if !self.config.is_writer() {
            debug!(rank = self.config.rank, "非 0 号进程，跳过写输入文件");
            return Ok(None);
        }

        let target = path.unwrap_or(&self.config.input_file).to_path_buf();
        let text = self.render_input();
        fs::write(&target, &text).map_err(|e| ConfigError::io(&target, e))?;

        info!(path = %target.display(), bytes = text.len(), "输入文件已写出");
        self.state = ManagerState::Serialized;
        Ok(Some(target))
    }

    /// 导出并写文件，不执行模拟
    pub fn dry_run(&mut self) -> ConfigResult<Option<PathBuf>> {
        self.flush()?;
        self.write_input(None)
    }

    // ===== Execute =====

    /// 导出、写文件并交给后端执行
    ///
    /// # 参数
    /// - overrides: 原样转发给后端的覆盖参数
    ///
    /// # 返回
    /// - Ok(Complete): 模拟正常完成且已清理
    /// - Err(SimulationIncomplete): 后端报告未完成
    pub fn execute(&mut self, overrides: &[String]) -> ConfigResult<DriverStatus> {
        self.flush()?;
        self.write_input(None)?;

        let input = self.config.input_file.clone();
        info!(input = %input.display(), overrides = overrides.len(), "开始执行模拟");
        let status = match self.backend.execute(&input, overrides) {
            Ok(status) => status,
            Err(e) => {
                self.state = ManagerState::Failed;
                return Err(e);
            }
        };

        if status != DriverStatus::Complete {
            error!(status = %status, "模拟未成功完成");
            self.state = ManagerState::Failed;
            return Err(ConfigError::SimulationIncomplete { status });
        }

        self.backend.finalize()?;
        self.state = ManagerState::Completed;
        info!("模拟完成");
        Ok(status)
    }

    /// 配置树的缩进文本
    pub fn describe(&self) -> ConfigResult<String> {
        self.tree.describe(self.root.id())
    }

    /// 运行概要：名称、输入文件、已配置的主要选项，最后附上配置树
    ///
    /// 未赋值的插槽不列出
    pub fn info(&self) -> ConfigResult<String> {
        let mut lines = vec![
            format!("Simulation: {}", self.config.name),
            format!("Input file: {}", self.config.input_file.display()),
        ];

        if let Ok(grid) = self.grid.get() {
            let (strategy, numlevel) = grid.with(|g| (g.strategy, g.numlevel))?;
            lines.push(format!("Grid: {} (numlevel = {})", strategy, numlevel));
        }
        if let Ok(driver) = self.driver.get() {
            let integrator = driver.with(|d| d.integrator)?;
            lines.push(format!("Driver: {}", integrator));
        }
        if let Ok(physics) = self.physics.get() {
            if let Ok(hydro) = physics.with(|p| p.hydro.get().cloned())? {
                let (recon, riemann) = hydro.with(|h| (h.reconstruction, h.riemann))?;
                lines.push(format!("Hydro: {} / {}", recon, riemann));
            }
            if let Ok(eos) = physics.with(|p| p.eos.get().cloned())? {
                let model = eos.with(|e| e.model)?;
                lines.push(format!("EOS: {}", model));
            }
        }

        lines.push(String::new());
        lines.push(self.describe()?);
        Ok(lines.join("\n"))
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.tree.finalize();
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("router", &self.router)
            .field("tree", &self.tree)
            .finish()
    }
}
