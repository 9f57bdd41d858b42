// ==========================================
// Kamayan 配置层 - 引擎内置单元
// ==========================================
// 引擎自带单元声明的参数块及其默认值
// 注册顺序: 用户主单元、driver、eos、grid、physics、hydro
// ==========================================

use tracing::info;

use crate::code_units::BIG;
use crate::params::{Unit, UnitCollection};

/// 引擎内置单元（按注册顺序）
pub fn default_units() -> Vec<Unit> {
    vec![
        Unit::new("driver").with_setup(setup_driver),
        Unit::new("eos").with_setup(setup_eos),
        Unit::new("grid").with_setup(setup_grid),
        Unit::new("physics").with_setup(setup_physics),
        Unit::new("hydro").with_setup(setup_hydro),
    ]
}

/// 构建单元集合: 用户主单元在前，随后是内置单元
///
/// # 参数
/// - name: 用户主单元名
/// - setup: 用户主单元的参数注册回调
pub fn process_units(name: &str, setup: Option<Box<dyn Fn(&mut Unit)>>) -> UnitCollection {
    let mut primary = Unit::new(name);
    if let Some(hook) = setup {
        primary = primary.with_setup(hook);
    }

    let mut units = UnitCollection::new();
    units.add(primary);
    for unit in default_units() {
        units.add(unit);
    }
    info!(primary = name, units = units.len(), "单元集合已构建");
    units
}

fn setup_driver(unit: &mut Unit) {
    unit.add_data("parthenon/time")
        .declare("integrator", "rk2", "Time integration method.")
        .declare("dt_ceil", BIG, "Maximum allowed timestep.")
        .declare("dt_factor", 2.0, "Maximum factor the timestep may grow by per cycle.")
        .declare("dt_floor", 0.0, "Timestep floor.")
        .declare("dt_force", -BIG, "Force a fixed timestep if positive.")
        .declare("dt_init", BIG, "Initial timestep.")
        .declare("dt_init_force", true, "Use dt_init as the first timestep.")
        .declare("dt_min", 0.0, "Minimum allowed timestep.")
        .declare("dt_min_cycle_limit", 10, "Cycles allowed below dt_min.")
        .declare("dt_max", BIG, "Timestep ceiling for the driver.")
        .declare("dt_max_cycle_limit", 1, "Cycles allowed above dt_max.")
        .declare("dt_user", BIG, "User supplied timestep limit.")
        .declare("ncrecv_bdry_buf_timeout_sec", -1.0, "Boundary buffer receive timeout.")
        .declare("ncycle_out", 1, "Cycles between stdout summaries.")
        .declare("ncycle_out_mesh", 0, "Cycles between mesh summaries.")
        .declare("nlim", -1, "Cycle limit.")
        .declare("perf_cycle_offset", 0, "Cycles skipped before timing.")
        .declare("tlim", BIG, "Simulation end time.");
}

fn setup_eos(unit: &mut Unit) {
    unit.add_data("eos").declare("type", "single", "Equation of state model.");
    unit.add_data("eos/single")
        .declare("Abar", 1.0, "Mean atomic mass.");
    unit.add_data("eos/gamma")
        .declare("gamma", 1.4, "Adiabatic index.");
}

fn setup_grid(unit: &mut Unit) {
    let mesh = unit.add_data("parthenon/mesh");
    mesh.declare("refinement", "adaptive", "Mesh refinement strategy.")
        .declare("numlevel", 1, "Number of refinement levels.")
        .declare("nghost", 3, "Number of ghost zones.");
    for dir in 1..=3 {
        mesh.declare(format!("nx{}", dir), 32, "Zone count at the root level.")
            .declare(format!("x{}min", dir), 0.0, "Lower domain bound.")
            .declare(format!("x{}max", dir), 1.0, "Upper domain bound.")
            .declare(format!("ix{}_bc", dir), "outflow", "Inner boundary condition.")
            .declare(format!("ox{}_bc", dir), "outflow", "Outer boundary condition.");
    }

    let block = unit.add_data("parthenon/meshblock");
    for dir in 1..=3 {
        block.declare(format!("nx{}", dir), 16, "Zone count of a meshblock.");
    }
}

fn setup_physics(unit: &mut Unit) {
    unit.add_data("physics")
        .declare("fluid", "1t", "Fluid temperature model.")
        .declare("MHD", "off", "Magnetohydrodynamics scheme.");
}

fn setup_hydro(unit: &mut Unit) {
    unit.add_data("hydro")
        .declare("reconstruction", "fog", "Reconstruction method.")
        .declare("slope_limiter", "minmod", "Slope limiter.")
        .declare("riemann", "hll", "Riemann solver.")
        .declare("ReconstructionVars", "primitive", "Reconstructed variables.")
        .declare("EMF_averaging", "arithmetic", "EMF averaging for constrained transport.")
        .declare("cfl", 0.8, "CFL number.");
}
