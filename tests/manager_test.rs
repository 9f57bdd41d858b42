// ==========================================
// 模拟管理器集成测试
// ==========================================
// 测试目标: 导出顺序、输入文件写出、执行状态与清理
// ==========================================

mod test_helpers;

use std::fs;

use kamayan_config::backend::{DriverStatus, NullBackend};
use kamayan_config::code_units::{
    AdaptiveAxis, AdaptiveGridSpec, BoundaryConditions, Driver, Eos, Grid, Hydro, Integrator,
    Reconstruction, RefinementVariable, Riemann, UniformAxis, UniformGridSpec,
};
use kamayan_config::manager::{ManagerState, MANAGER_PROVENANCE};
use kamayan_config::params::{ParamValue, ParamWriter};
use kamayan_config::{ConfigError, ConfigNode, ConfigResult, InputBlock, Manager};
use tempfile::TempDir;
use test_helpers::{create_manager, run_config, sedov_units, RecordingBackend};

/// 写一个其他节点会读取的参数块
struct Producer;

impl ConfigNode for Producer {
    fn export_settings(&self, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        writer.set("user/shared", InputBlock::new().with("x", 5))
    }
}

/// 读取 Producer 的结果并派生新参数
struct Consumer;

impl ConfigNode for Consumer {
    fn export_settings(&self, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        let x = writer.read("user/shared")?.get_int("x")?;
        writer.set("user/derived", InputBlock::new().with("y", x * 2))
    }
}

fn uniform_grid(manager: &mut Manager) {
    let spec = UniformGridSpec {
        x1: UniformAxis::zones((0.0, 1.0), 64),
        x2: Some(UniformAxis::zones((0.0, 1.0), 32)),
        x3: None,
    };
    let grid = Grid::uniform(manager.tree(), &spec, manager.config().nprocs).unwrap();
    manager.set_grid(&grid).unwrap();
}

#[test]
fn test_producer_before_consumer_flushes() {
    let dir = TempDir::new().unwrap();
    let mut manager = create_manager(dir.path(), Box::new(NullBackend));
    let producer = manager.create(Producer).unwrap();
    let consumer = manager.create(Consumer).unwrap();
    manager.attach_node(&producer).unwrap();
    manager.attach_node(&consumer).unwrap();

    manager.flush().unwrap();
    let derived = manager.router().fallback("user/derived").unwrap();
    assert_eq!(derived.get("y"), Some(&ParamValue::Int(10)));
    assert_eq!(derived.provenance, "Consumer");
    assert_eq!(manager.state(), ManagerState::Flushed);
}

#[test]
fn test_consumer_before_producer_is_not_found() {
    let dir = TempDir::new().unwrap();
    let mut manager = create_manager(dir.path(), Box::new(NullBackend));
    let consumer = manager.create(Consumer).unwrap();
    let producer = manager.create(Producer).unwrap();
    manager.attach_node(&consumer).unwrap();
    manager.attach_node(&producer).unwrap();

    let err = manager.flush().unwrap_err();
    match err {
        ConfigError::NotFound { block, .. } => assert_eq!(block, "user/shared"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(manager.state(), ManagerState::Failed);
}

#[test]
fn test_flush_twice_renders_identical_input() {
    let dir = TempDir::new().unwrap();
    let mut manager = create_manager(dir.path(), Box::new(NullBackend));
    uniform_grid(&mut manager);
    let driver = manager.create(Driver::new(Integrator::Rk2, 0.05)).unwrap();
    manager.set_driver(&driver).unwrap();

    manager.flush().unwrap();
    let first = manager.render_input();
    manager.flush().unwrap();
    let second = manager.render_input();
    assert_eq!(first, second);
}

#[test]
fn test_write_input_on_rank_zero() {
    let dir = TempDir::new().unwrap();
    let mut manager = create_manager(dir.path(), Box::new(NullBackend));
    uniform_grid(&mut manager);

    let path = manager.dry_run().unwrap().unwrap();
    assert_eq!(path, dir.path().join("sedov.in"));
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("<parthenon/job>\nproblem_id = sedov\n\n"));
    assert!(text.contains("<parthenon/mesh>"));
    assert!(text.contains("nx1 = 64"));
    assert!(text.contains("<sedov>\ndensity = 1.0\npressure = 1e-5"));
    assert!(text.ends_with('\n'));
    assert_eq!(manager.state(), ManagerState::Serialized);
}

#[test]
fn test_other_ranks_write_nothing() {
    let dir = TempDir::new().unwrap();
    let config = run_config(dir.path()).with_rank(1).with_nprocs(4);
    let mut manager = Manager::new(config, sedov_units(), Box::new(NullBackend)).unwrap();

    assert!(manager.dry_run().unwrap().is_none());
    assert!(!dir.path().join("sedov.in").exists());
}

#[test]
fn test_execute_incomplete_run_fails_without_finalize() {
    let dir = TempDir::new().unwrap();
    let (backend, log) = RecordingBackend::new(DriverStatus::Timeout);
    let mut manager = create_manager(dir.path(), Box::new(backend));

    let err = manager.execute(&[]).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::SimulationIncomplete {
            status: DriverStatus::Timeout
        }
    ));
    assert_eq!(manager.state(), ManagerState::Failed);
    assert_eq!(log.borrow().executed.len(), 1);
    assert_eq!(log.borrow().finalized, 0);
}

#[test]
fn test_execute_complete_run_finalizes() {
    let dir = TempDir::new().unwrap();
    let (backend, log) = RecordingBackend::new(DriverStatus::Complete);
    let mut manager = create_manager(dir.path(), Box::new(backend));
    uniform_grid(&mut manager);

    let overrides = vec!["parthenon/time/nlim=10".to_string()];
    let status = manager.execute(&overrides).unwrap();
    assert_eq!(status, DriverStatus::Complete);
    assert_eq!(manager.state(), ManagerState::Completed);

    let log = log.borrow();
    assert_eq!(log.finalized, 1);
    assert_eq!(log.executed[0].0, dir.path().join("sedov.in"));
    assert_eq!(log.executed[0].1, overrides);
    assert!(dir.path().join("sedov.in").exists());
}

#[test]
fn test_adaptive_refinement_reads_grid_levels() {
    let dir = TempDir::new().unwrap();
    let mut manager = create_manager(dir.path(), Box::new(NullBackend));
    let spec = AdaptiveGridSpec {
        x1: AdaptiveAxis::blocks((0.0, 1.0), 16, 4),
        x2: Some(AdaptiveAxis::blocks((0.0, 1.0), 16, 4)),
        x3: None,
        num_levels: 3,
    };
    let grid = Grid::adaptive(manager.tree(), &spec).unwrap();
    manager.set_grid(&grid).unwrap();
    let fields = grid.refinement_fields().unwrap();
    // 加密字段在网格入树前就已赋值，仍随网格挂到根下
    assert_eq!(fields.parent().unwrap(), Some(manager.root().id()));
    fields
        .with_mut(|f| {
            f.add(RefinementVariable::new("dens"));
            f.add(RefinementVariable::new("pres").with_max_level(0));
        })
        .unwrap();

    manager.flush().unwrap();

    let mesh = manager.router().get_data("grid", "parthenon/mesh").unwrap();
    assert_eq!(mesh.get_int("numlevel").unwrap(), 3);
    assert_eq!(mesh.get_str("refinement").unwrap(), "adaptive");
    assert_eq!(mesh.get_int("nx1").unwrap(), 64);

    let refinement = manager.router().fallback("kamayan/refinement0").unwrap();
    assert_eq!(refinement.provenance, "RefinementFields");
    assert_eq!(refinement.get("max_level"), Some(&ParamValue::Int(3)));
    assert_eq!(refinement.get("field"), Some(&ParamValue::from("dens")));

    // max_level = 0 视为未指定
    let second = manager.router().fallback("kamayan/refinement1").unwrap();
    assert_eq!(second.get("max_level"), Some(&ParamValue::Int(3)));
}

#[test]
fn test_hydro_raises_ghost_zones() {
    let dir = TempDir::new().unwrap();
    let mut manager = create_manager(dir.path(), Box::new(NullBackend));
    manager
        .set_params("parthenon/mesh", InputBlock::new().with("nghost", 1))
        .unwrap();

    let physics = manager.physics().unwrap();
    let hydro = manager
        .create(Hydro::new(Reconstruction::Ppm, Riemann::Hllc))
        .unwrap();
    physics.set_hydro(&hydro).unwrap();
    let eos = manager.create(Eos::gamma_law(1.4)).unwrap();
    physics.set_eos(&eos).unwrap();

    manager.flush().unwrap();

    let router = manager.router();
    assert_eq!(
        router.get_data("grid", "parthenon/mesh").unwrap().get_int("nghost").unwrap(),
        3
    );
    assert_eq!(router.get_data("hydro", "hydro").unwrap().get_str("reconstruction").unwrap(), "ppm");
    assert_eq!(router.get_data("eos", "eos/gamma").unwrap().get_real("gamma").unwrap(), 1.4);
}

#[test]
fn test_slot_children_hang_off_root() {
    let dir = TempDir::new().unwrap();
    let mut manager = create_manager(dir.path(), Box::new(NullBackend));
    uniform_grid(&mut manager);
    let grid = manager.grid().unwrap();
    let bc = manager.create(BoundaryConditions::periodic_box()).unwrap();
    grid.set_boundary_conditions(&bc).unwrap();

    assert_eq!(grid.parent().unwrap(), Some(manager.root().id()));
    assert_eq!(bc.parent().unwrap(), Some(manager.root().id()));

    manager.flush().unwrap();
    let mesh = manager.router().get_data("grid", "parthenon/mesh").unwrap();
    assert_eq!(mesh.get_str("ix1_bc").unwrap(), "periodic");
}

#[test]
fn test_manager_params_recorded_with_manager_provenance() {
    let dir = TempDir::new().unwrap();
    let mut manager = create_manager(dir.path(), Box::new(NullBackend));
    manager
        .set_params(
            "sedov",
            InputBlock::new().with("density", 2.0).with("radius", 0.1),
        )
        .unwrap();
    assert_eq!(manager.state(), ManagerState::Configured);

    let router = manager.router();
    assert_eq!(router.get_data("sedov", "sedov").unwrap().get_real("density").unwrap(), 2.0);
    let staged = router.fallback("sedov").unwrap();
    assert_eq!(staged.provenance, MANAGER_PROVENANCE);
    assert_eq!(staged.get("radius"), Some(&ParamValue::Real(0.1)));

    let text = manager.render_input();
    assert!(text.contains("# Set by: Manager\n<sedov>\nradius = 0.1"));
}

#[test]
fn test_unset_driver_is_not_configured() {
    let dir = TempDir::new().unwrap();
    let manager = create_manager(dir.path(), Box::new(NullBackend));
    assert!(matches!(
        manager.driver(),
        Err(ConfigError::NotConfigured { .. })
    ));
    assert!(manager.physics().is_ok());
    assert!(manager.outputs().is_ok());
}

#[test]
fn test_default_units_declare_engine_defaults() {
    let dir = TempDir::new().unwrap();
    let manager = create_manager(dir.path(), Box::new(NullBackend));
    let router = manager.router();
    assert_eq!(
        router.get_data("driver", "parthenon/time").unwrap().get_str("integrator").unwrap(),
        "rk2"
    );
    assert_eq!(
        router.get_data("grid", "parthenon/meshblock").unwrap().get_int("nx1").unwrap(),
        16
    );
    assert_eq!(
        router.get_data("physics", "physics").unwrap().get_str("fluid").unwrap(),
        "1t"
    );
}

#[test]
fn test_describe_lists_configured_nodes() {
    let dir = TempDir::new().unwrap();
    let mut manager = create_manager(dir.path(), Box::new(NullBackend));
    uniform_grid(&mut manager);
    let text = manager.describe().unwrap();
    assert_eq!(text, "RootNode\n  Physics\n  Outputs\n  Grid");
}

#[test]
fn test_info_summarises_configured_slots() {
    let dir = TempDir::new().unwrap();
    let mut manager = create_manager(dir.path(), Box::new(NullBackend));

    // 只有名称、输入文件与配置树
    let bare = manager.info().unwrap();
    assert!(bare.starts_with(&format!(
        "Simulation: sedov\nInput file: {}\n",
        dir.path().join("sedov.in").display()
    )));
    assert!(!bare.contains("Driver:"));
    assert!(bare.ends_with("RootNode\n  Physics\n  Outputs"));

    uniform_grid(&mut manager);
    let driver = manager.create(Driver::new(Integrator::Rk2, 0.05)).unwrap();
    manager.set_driver(&driver).unwrap();
    let physics = manager.physics().unwrap();
    let hydro = manager
        .create(Hydro::new(Reconstruction::Ppm, Riemann::Hllc))
        .unwrap();
    physics.set_hydro(&hydro).unwrap();
    let eos = manager.create(Eos::gamma_law(1.4)).unwrap();
    physics.set_eos(&eos).unwrap();

    let text = manager.info().unwrap();
    assert!(text.contains("Grid: none (numlevel = 1)\n"));
    assert!(text.contains("Driver: rk2\n"));
    assert!(text.contains("Hydro: ppm / hllc\n"));
    assert!(text.contains("EOS: single\n"));
    assert!(text.contains("\n\nRootNode\n"));
    // 只读操作，不触发导出
    assert_ne!(manager.state(), ManagerState::Flushed);
}
