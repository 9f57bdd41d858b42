// ==========================================
// Kamayan 配置层 - 物理模块总开关
// ==========================================
// 输出块: <physics>；子插槽 hydro、eos 由各自节点导出
// ==========================================

use super::eos::Eos;
use super::hydro::Hydro;
use super::types::{Fluid, Mhd};
use crate::error::ConfigResult;
use crate::params::{InputBlock, ParamWriter};
use crate::tree::{ConfigNode, NodeRef, Slot};

#[derive(Debug)]
pub struct Physics {
    pub fluid: Fluid,
    pub mhd: Mhd,
    pub(crate) hydro: Slot<Hydro>,
    pub(crate) eos: Slot<Eos>,
}

impl Default for Physics {
    fn default() -> Self {
        Self::new(Fluid::OneT, Mhd::Off)
    }
}

impl Physics {
    pub fn new(fluid: Fluid, mhd: Mhd) -> Self {
        Self {
            fluid,
            mhd,
            hydro: Slot::new("Physics", "hydro"),
            eos: Slot::new("Physics", "eos"),
        }
    }
}

impl ConfigNode for Physics {
    fn export_settings(&self, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        writer.set(
            "physics",
            InputBlock::new().with("fluid", self.fluid).with("MHD", self.mhd),
        )
    }
}

impl NodeRef<Physics> {
    pub fn set_hydro(&self, hydro: &NodeRef<Hydro>) -> ConfigResult<()> {
        self.assign_slot(hydro, |p| &mut p.hydro)
    }

    pub fn hydro(&self) -> ConfigResult<NodeRef<Hydro>> {
        self.with(|p| p.hydro.get().cloned())?
    }

    pub fn set_eos(&self, eos: &NodeRef<Eos>) -> ConfigResult<()> {
        self.assign_slot(eos, |p| &mut p.eos)
    }

    pub fn eos(&self) -> ConfigResult<NodeRef<Eos>> {
        self.with(|p| p.eos.get().cloned())?
    }
}
