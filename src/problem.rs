// ==========================================
// Kamayan 配置层 - 问题描述文件
// ==========================================
// JSON 描述一次模拟: 主单元声明的参数块、网格、时间推进、
// 物理模块、输出、加密字段与额外参数
// ==========================================

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::process_units;
use crate::code_units::{
    AdaptiveGridSpec, BoundaryConditions, Driver, Eos, Fluid, Grid, Hydro, Mhd, OutputType,
    RefinementVariable, UniformGridSpec,
};
use crate::error::{ConfigError, ConfigResult};
use crate::manager::Manager;
use crate::params::{InputBlock, ParamValue, Unit, UnitCollection};

/// 网格描述，按 `type` 字段区分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridSpec {
    Uniform(UniformGridSpec),
    Adaptive(AdaptiveGridSpec),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSpec {
    pub fluid: Fluid,
    pub mhd: Mhd,
    pub hydro: Option<Hydro>,
    pub eos: Option<Eos>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSpec {
    pub name: String,
    /// 主单元声明的参数块: block → key → 默认值
    #[serde(default)]
    pub declare: IndexMap<String, IndexMap<String, ParamValue>>,
    #[serde(default)]
    pub driver: Option<Driver>,
    #[serde(default)]
    pub grid: Option<GridSpec>,
    #[serde(default)]
    pub boundary_conditions: Option<BoundaryConditions>,
    #[serde(default)]
    pub refinement: Vec<RefinementVariable>,
    #[serde(default)]
    pub physics: Option<PhysicsSpec>,
    #[serde(default)]
    pub outputs: Vec<OutputType>,
    /// 由管理器直接写入的参数块
    #[serde(default)]
    pub params: IndexMap<String, InputBlock>,
}

impl ProblemSpec {
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let spec = Self::from_json(&text)?;
        info!(path = %path.display(), name = %spec.name, "问题描述已加载");
        Ok(spec)
    }

    /// 主单元（声明 `declare` 中的参数块）加引擎内置单元
    pub fn units(&self) -> UnitCollection {
        let declared = self.declare.clone();
        let hook: Box<dyn Fn(&mut Unit)> = Box::new(move |unit: &mut Unit| {
            for (block, params) in &declared {
                let store = unit.add_data(block);
                for (key, value) in params {
                    store.declare(key.as_str(), value.clone(), "");
                }
            }
        });
        process_units(&self.name, Some(hook))
    }

    /// 把描述中的配置依次挂到管理器上
    ///
    /// 顺序: driver、grid（边界条件、加密字段）、physics（hydro、eos）、outputs、params
    pub fn configure(&self, manager: &mut Manager) -> ConfigResult<()> {
        if let Some(driver) = &self.driver {
            let node = manager.create(driver.clone())?;
            manager.set_driver(&node)?;
        }

        if let Some(spec) = &self.grid {
            let grid = match spec {
                GridSpec::Uniform(s) => Grid::uniform(manager.tree(), s, manager.config().nprocs)?,
                GridSpec::Adaptive(s) => Grid::adaptive(manager.tree(), s)?,
            };
            manager.set_grid(&grid)?;

            if let Some(bc) = &self.boundary_conditions {
                let node = manager.create(*bc)?;
                grid.set_boundary_conditions(&node)?;
            }
            if !self.refinement.is_empty() {
                let fields = grid.refinement_fields()?;
                fields.with_mut(|f| {
                    for var in &self.refinement {
                        f.add(var.clone());
                    }
                })?;
            }
        } else if !self.refinement.is_empty() {
            return Err(ConfigError::InvalidConfiguration(
                "加密字段需要自适应网格".to_string(),
            ));
        }

        if let Some(spec) = &self.physics {
            let physics = manager.physics()?;
            physics.with_mut(|p| {
                p.fluid = spec.fluid;
                p.mhd = spec.mhd;
            })?;
            if let Some(hydro) = &spec.hydro {
                let node = manager.create(hydro.clone())?;
                physics.set_hydro(&node)?;
            }
            if let Some(eos) = &spec.eos {
                let node = manager.create(eos.clone())?;
                physics.set_eos(&node)?;
            }
        }

        if !self.outputs.is_empty() {
            let outputs = manager.outputs()?;
            outputs.with_mut(|o| -> ConfigResult<()> {
                for output in &self.outputs {
                    o.add_output(output.clone())?;
                }
                Ok(())
            })??;
        }

        for (block, params) in &self.params {
            manager.set_params(block, params.clone())?;
        }
        Ok(())
    }
}
