// ==========================================
// 问题描述文件测试
// ==========================================
// 测试目标: JSON 描述加载、挂入管理器并生成输入文件
// ==========================================

mod test_helpers;

use std::fs;

use kamayan_config::backend::NullBackend;
use kamayan_config::params::ParamValue;
use kamayan_config::{ConfigError, Manager, ProblemSpec};
use tempfile::TempDir;
use test_helpers::run_config;

const SEDOV: &str = r#"{
    "name": "sedov",
    "declare": {
        "sedov": { "density": 1.0, "pressure": 1e-5 }
    },
    "driver": { "integrator": "rk2", "tlim": 0.05 },
    "grid": {
        "type": "adaptive",
        "x1": { "bounds": [0.0, 1.0], "nxb": 16, "nblocks": 4 },
        "x2": { "bounds": [0.0, 1.0], "nxb": 16, "nblocks": 4 },
        "num_levels": 3
    },
    "boundary_conditions": { "ix1": "periodic", "ox1": "periodic" },
    "refinement": [ { "field": "pres" } ],
    "physics": {
        "hydro": { "reconstruction": "plm", "riemann": "hllc" },
        "eos": { "gamma_law": { "gamma": 1.4 } }
    },
    "outputs": [
        { "name": "snapshots", "file_type": "hdf5", "dt": 0.01, "variables": ["dens", "pres"] }
    ],
    "params": {
        "sedov": { "density": 2.0, "radius": 0.1 }
    }
}"#;

#[test]
fn test_problem_configures_manager() {
    let dir = TempDir::new().unwrap();
    let spec = ProblemSpec::from_json(SEDOV).unwrap();
    assert_eq!(spec.name, "sedov");

    let mut manager =
        Manager::new(run_config(dir.path()), spec.units(), Box::new(NullBackend)).unwrap();
    spec.configure(&mut manager).unwrap();
    let path = manager.dry_run().unwrap().unwrap();

    let router = manager.router();
    let time = router.get_data("driver", "parthenon/time").unwrap();
    assert_eq!(time.get_real("tlim").unwrap(), 0.05);

    let mesh = router.get_data("grid", "parthenon/mesh").unwrap();
    assert_eq!(mesh.get_int("numlevel").unwrap(), 3);
    assert_eq!(mesh.get_str("ix1_bc").unwrap(), "periodic");
    assert_eq!(mesh.get_str("ix2_bc").unwrap(), "outflow");
    assert_eq!(mesh.get_int("nghost").unwrap(), 3);

    let sedov = router.get_data("sedov", "sedov").unwrap();
    assert_eq!(sedov.get_real("density").unwrap(), 2.0);

    let refinement = router.fallback("kamayan/refinement0").unwrap();
    assert_eq!(refinement.get("max_level"), Some(&ParamValue::Int(3)));

    let output = router.fallback("parthenon/output0").unwrap();
    assert_eq!(output.get("dn"), Some(&ParamValue::Int(-1)));
    assert_eq!(output.get("variables"), Some(&ParamValue::from("dens, pres")));

    let text = fs::read_to_string(path).unwrap();
    assert!(text.contains("<sedov>\ndensity = 2.0\npressure = 1e-5"));
    assert!(text.contains("# Set by: Outputs\n<parthenon/output0>\nfile_type = hdf5"));
}

#[test]
fn test_snapshot_lists_backend_and_fallback_blocks() {
    let dir = TempDir::new().unwrap();
    let spec = ProblemSpec::from_json(SEDOV).unwrap();
    let mut manager =
        Manager::new(run_config(dir.path()), spec.units(), Box::new(NullBackend)).unwrap();
    spec.configure(&mut manager).unwrap();
    manager.flush().unwrap();

    let snapshot = manager.snapshot();
    assert_eq!(snapshot.name, "sedov");
    let time = snapshot.block("parthenon/time").unwrap();
    assert!(time.provenance.is_none());
    let output = snapshot.block("parthenon/output0").unwrap();
    assert_eq!(output.provenance.as_deref(), Some("Outputs"));

    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"block\":\"parthenon/output0\""));
}

#[test]
fn test_refinement_without_grid_is_invalid() {
    let dir = TempDir::new().unwrap();
    let spec = ProblemSpec::from_json(
        r#"{ "name": "bare", "refinement": [ { "field": "dens" } ] }"#,
    )
    .unwrap();
    let mut manager =
        Manager::new(run_config(dir.path()), spec.units(), Box::new(NullBackend)).unwrap();
    assert!(matches!(
        spec.configure(&mut manager),
        Err(ConfigError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_output_with_dt_and_dn_is_overconstrained() {
    let dir = TempDir::new().unwrap();
    let spec = ProblemSpec::from_json(
        r#"{ "name": "bad", "outputs": [ { "name": "o", "file_type": "hst", "dt": 0.1, "dn": 5 } ] }"#,
    )
    .unwrap();
    let mut manager =
        Manager::new(run_config(dir.path()), spec.units(), Box::new(NullBackend)).unwrap();
    assert!(matches!(
        spec.configure(&mut manager),
        Err(ConfigError::Overconstrained(_))
    ));
}

#[test]
fn test_problem_file_roundtrip_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sedov.json");
    fs::write(&path, SEDOV).unwrap();
    let spec = ProblemSpec::from_file(&path).unwrap();
    assert_eq!(spec.refinement.len(), 1);
    assert!(matches!(
        ProblemSpec::from_file(&dir.path().join("missing.json")),
        Err(ConfigError::Io { .. })
    ));
}
