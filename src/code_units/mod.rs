// ==========================================
// Kamayan 配置层 - 代码单元配置节点
// ==========================================
// 职责: 网格、时间推进、物理模块、状态方程、输出等具体配置节点
// 红线: 节点只通过 ParamWriter 写参数，不直接接触后端
// ==========================================

pub mod driver;
pub mod eos;
pub mod grid;
pub mod hydro;
pub mod outputs;
pub mod physics;
pub mod refinement;
pub mod types;

pub use driver::{Driver, BIG};
pub use eos::{Eos, GammaLaw};
pub use grid::{
    AdaptiveAxis, AdaptiveGridSpec, BoundaryConditions, Bounds, Grid, UniformAxis,
    UniformGridSpec,
};
pub use hydro::Hydro;
pub use outputs::{OutputType, Outputs};
pub use physics::Physics;
pub use refinement::{RefinementFields, RefinementVariable};
pub use types::{
    BoundaryCondition, EmfAveraging, EosMode, EosModel, Fluid, Integrator, Mhd,
    Reconstruction, ReconstructionVars, RefinementMethod, RefinementStrategy, Riemann,
    SlopeLimiter,
};
