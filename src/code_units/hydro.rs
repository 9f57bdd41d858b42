// ==========================================
// Kamayan 配置层 - 流体求解参数
// ==========================================
// 输出块: <hydro>；同时回读并抬高 grid 单元的 <parthenon/mesh>/nghost
// ==========================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{EmfAveraging, Reconstruction, ReconstructionVars, Riemann, SlopeLimiter};
use crate::error::ConfigResult;
use crate::params::{InputBlock, ParamWriter};
use crate::tree::ConfigNode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hydro {
    pub reconstruction: Reconstruction,
    pub recon_vars: ReconstructionVars,
    pub slope_limiter: SlopeLimiter,
    pub riemann: Riemann,
    pub emf_averaging: EmfAveraging,
    pub cfl: f64,
}

impl Default for Hydro {
    fn default() -> Self {
        Self {
            reconstruction: Reconstruction::Fog,
            recon_vars: ReconstructionVars::Primitive,
            slope_limiter: SlopeLimiter::Minmod,
            riemann: Riemann::Hll,
            emf_averaging: EmfAveraging::Arithmetic,
            cfl: 0.8,
        }
    }
}

impl Hydro {
    pub fn new(reconstruction: Reconstruction, riemann: Riemann) -> Self {
        Self {
            reconstruction,
            riemann,
            ..Self::default()
        }
    }
}

impl ConfigNode for Hydro {
    fn export_settings(&self, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        // 鬼区层数只升不降
        let mesh = writer.get_data_mut("grid", "parthenon/mesh")?;
        let nghost = mesh.get_int("nghost")?.max(self.reconstruction.nghost());
        mesh.update("nghost", nghost)?;
        debug!(nghost = nghost, reconstruction = %self.reconstruction, "鬼区层数已调整");

        writer.set(
            "hydro",
            InputBlock::new()
                .with("reconstruction", self.reconstruction)
                .with("slope_limiter", self.slope_limiter)
                .with("riemann", self.riemann)
                .with("ReconstructionVars", self.recon_vars)
                .with("EMF_averaging", self.emf_averaging)
                .with("cfl", self.cfl),
        )
    }
}
