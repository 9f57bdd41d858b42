// ==========================================
// Kamayan 配置层 - 状态方程参数
// ==========================================
// 输出块: <eos>；理想气体另写 <eos/single>、<eos/gamma>
// ==========================================

use serde::{Deserialize, Serialize};

use super::types::{EosMode, EosModel};
use crate::error::ConfigResult;
use crate::params::{InputBlock, ParamWriter};
use crate::tree::ConfigNode;

/// 单组分 gamma 律气体
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GammaLaw {
    pub gamma: f64,
    #[serde(rename = "Abar")]
    pub abar: f64,
    #[serde(rename = "Zbar")]
    pub zbar: f64,
}

impl Default for GammaLaw {
    fn default() -> Self {
        Self {
            gamma: 5.0 / 3.0,
            abar: 1.0,
            zbar: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Eos {
    pub model: EosModel,
    pub mode_init: EosMode,
    pub gamma_law: Option<GammaLaw>,
}

impl Eos {
    /// 单组分 gamma 律气体，Abar = Zbar = 1
    pub fn gamma_law(gamma: f64) -> Self {
        Self {
            model: EosModel::Single,
            mode_init: EosMode::DensPres,
            gamma_law: Some(GammaLaw {
                gamma,
                ..GammaLaw::default()
            }),
        }
    }
}

impl ConfigNode for Eos {
    fn export_settings(&self, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        writer.set(
            "eos",
            InputBlock::new()
                .with("type", self.model)
                .with("mode_init", self.mode_init),
        )?;

        if let Some(law) = &self.gamma_law {
            writer.set(
                "eos/single",
                InputBlock::new().with("Abar", law.abar).with("Zbar", law.zbar),
            )?;
            writer.set("eos/gamma", InputBlock::new().with("gamma", law.gamma))?;
        }
        Ok(())
    }
}
