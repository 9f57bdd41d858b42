// ==========================================
// Kamayan 配置层 - 时间推进参数
// ==========================================
// 输出块: <parthenon/time>
// ==========================================

use serde::{Deserialize, Serialize};

use super::types::Integrator;
use crate::error::ConfigResult;
use crate::params::{InputBlock, ParamWriter};
use crate::tree::ConfigNode;

/// 代表"无限"的大数
pub const BIG: f64 = 1.0e300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Driver {
    pub integrator: Integrator,
    pub nlim: i64,
    pub tlim: f64,
    pub ncycle_out_mesh: i64,
    pub dt_force: f64,
    pub dt_factor: f64,
    pub dt_ceil: f64,
    pub dt_min: f64,
    pub dt_min_cycle_limit: i64,
    pub dt_init: f64,
    pub dt_init_force: bool,
}

impl Default for Driver {
    fn default() -> Self {
        Self {
            integrator: Integrator::Rk2,
            nlim: -1,
            tlim: 0.0,
            ncycle_out_mesh: -10000,
            dt_force: -BIG,
            dt_factor: 2.0,
            dt_ceil: BIG,
            dt_min: 0.0,
            dt_min_cycle_limit: 10,
            dt_init: BIG,
            dt_init_force: false,
        }
    }
}

impl Driver {
    /// 指定积分器与终止时间，其余取默认
    pub fn new(integrator: Integrator, tlim: f64) -> Self {
        Self {
            integrator,
            tlim,
            ..Self::default()
        }
    }
}

impl ConfigNode for Driver {
    fn export_settings(&self, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        writer.set(
            "parthenon/time",
            InputBlock::new()
                .with("integrator", self.integrator)
                .with("nlim", self.nlim)
                .with("tlim", self.tlim)
                .with("ncycle_out_mesh", self.ncycle_out_mesh)
                .with("dt_force", self.dt_force)
                .with("dt_factor", self.dt_factor)
                .with("dt_ceil", self.dt_ceil)
                .with("dt_min", self.dt_min)
                .with("dt_min_cycle_limit", self.dt_min_cycle_limit)
                .with("dt_init", self.dt_init)
                .with("dt_init_force", self.dt_init_force),
        )
    }
}
