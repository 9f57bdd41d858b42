// ==========================================
// Kamayan 配置层 - 代码单元枚举类型
// ==========================================
// 序列化格式与输入文件中的取值一致 (snake_case)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::params::ParamValue;

/// 枚举按其输入文件文本写入参数
macro_rules! impl_param_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(v: $ty) -> Self {
                    ParamValue::Str(v.to_string())
                }
            }
        )*
    };
}

// ==========================================
// 网格加密策略 (Refinement Strategy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementStrategy {
    #[default]
    None, // 均匀网格
    Static,   // 静态加密
    Adaptive, // 自适应加密
}

impl fmt::Display for RefinementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefinementStrategy::None => write!(f, "none"),
            RefinementStrategy::Static => write!(f, "static"),
            RefinementStrategy::Adaptive => write!(f, "adaptive"),
        }
    }
}

// ==========================================
// 边界条件 (Boundary Condition)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryCondition {
    #[default]
    Outflow,
    Periodic,
    User,
    Reflect,
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryCondition::Outflow => write!(f, "outflow"),
            BoundaryCondition::Periodic => write!(f, "periodic"),
            BoundaryCondition::User => write!(f, "user"),
            BoundaryCondition::Reflect => write!(f, "reflect"),
        }
    }
}

// ==========================================
// 时间积分器 (Integrator)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    Rk1,
    #[default]
    Rk2,
    Rk3,
}

impl fmt::Display for Integrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integrator::Rk1 => write!(f, "rk1"),
            Integrator::Rk2 => write!(f, "rk2"),
            Integrator::Rk3 => write!(f, "rk3"),
        }
    }
}

// ==========================================
// 重构方法 (Reconstruction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reconstruction {
    #[default]
    Fog, // 一阶
    Plm,   // 分段线性
    Ppm,   // 分段抛物
    Wenoz, // WENO-Z
}

impl Reconstruction {
    /// 该重构方法需要的最少鬼区层数
    pub fn nghost(&self) -> i64 {
        match self {
            Reconstruction::Fog => 1,
            Reconstruction::Plm => 2,
            Reconstruction::Ppm => 3,
            Reconstruction::Wenoz => 3,
        }
    }
}

impl fmt::Display for Reconstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reconstruction::Fog => write!(f, "fog"),
            Reconstruction::Plm => write!(f, "plm"),
            Reconstruction::Ppm => write!(f, "ppm"),
            Reconstruction::Wenoz => write!(f, "wenoz"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlopeLimiter {
    #[default]
    Minmod,
    VanLeer,
    Mc,
}

impl fmt::Display for SlopeLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlopeLimiter::Minmod => write!(f, "minmod"),
            SlopeLimiter::VanLeer => write!(f, "van_leer"),
            SlopeLimiter::Mc => write!(f, "mc"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Riemann {
    #[default]
    Hll,
    Hllc,
}

impl fmt::Display for Riemann {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Riemann::Hll => write!(f, "hll"),
            Riemann::Hllc => write!(f, "hllc"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionVars {
    #[default]
    Primitive,
}

impl fmt::Display for ReconstructionVars {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconstructionVars::Primitive => write!(f, "primitive"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmfAveraging {
    #[default]
    Arithmetic,
}

impl fmt::Display for EmfAveraging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmfAveraging::Arithmetic => write!(f, "arithmetic"),
        }
    }
}

// ==========================================
// 流体模型 / 磁流体开关
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Fluid {
    #[default]
    #[serde(rename = "1t")]
    OneT, // 单温
    #[serde(rename = "3t")]
    ThreeT, // 三温
}

impl fmt::Display for Fluid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fluid::OneT => write!(f, "1t"),
            Fluid::ThreeT => write!(f, "3t"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mhd {
    #[default]
    Off,
    Ct, // 约束输运
}

impl fmt::Display for Mhd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mhd::Off => write!(f, "off"),
            Mhd::Ct => write!(f, "ct"),
        }
    }
}

// ==========================================
// 状态方程 (Equation of State)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EosModel {
    #[default]
    Single,
    Tabulated,
    Multitype,
}

impl fmt::Display for EosModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EosModel::Single => write!(f, "single"),
            EosModel::Tabulated => write!(f, "tabulated"),
            EosModel::Multitype => write!(f, "multitype"),
        }
    }
}

/// 初始化时由哪两个量求其余热力学量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EosMode {
    #[default]
    DensPres,
    DensEner,
    DensTemp,
}

impl fmt::Display for EosMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EosMode::DensPres => write!(f, "dens_pres"),
            EosMode::DensEner => write!(f, "dens_ener"),
            EosMode::DensTemp => write!(f, "dens_temp"),
        }
    }
}

// ==========================================
// 加密判据 (Refinement Method)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RefinementMethod {
    #[default]
    #[serde(rename = "loehner")]
    Loehner,
    #[serde(rename = "derivative_order_1")]
    DerivativeOrder1,
    #[serde(rename = "derivative_order_2")]
    DerivativeOrder2,
}

impl fmt::Display for RefinementMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefinementMethod::Loehner => write!(f, "loehner"),
            RefinementMethod::DerivativeOrder1 => write!(f, "derivative_order_1"),
            RefinementMethod::DerivativeOrder2 => write!(f, "derivative_order_2"),
        }
    }
}

impl_param_value!(
    RefinementStrategy,
    BoundaryCondition,
    Integrator,
    Reconstruction,
    SlopeLimiter,
    Riemann,
    ReconstructionVars,
    EmfAveraging,
    Fluid,
    Mhd,
    EosModel,
    EosMode,
    RefinementMethod,
);
