// ==========================================
// Kamayan 配置层 - 网格与边界条件
// ==========================================
// 输出块: <parthenon/mesh>、<parthenon/meshblock>
// 每个方向只能给出区数或网格尺寸之一
// ==========================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::refinement::RefinementFields;
use super::types::{BoundaryCondition, RefinementStrategy};
use crate::error::{ConfigError, ConfigResult};
use crate::params::{InputBlock, ParamWriter};
use crate::tree::{ConfigNode, ConfigTree, NodeRef, Slot};

/// 某方向的区间 (min, max)
pub type Bounds = (f64, f64);

const DEFAULT_BOUNDS: Bounds = (0.0, 1.0);

// ==========================================
// 网格描述
// ==========================================

/// 均匀网格某方向: 区数 `zones` 与网格尺寸 `dx` 二选一
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformAxis {
    pub bounds: Bounds,
    #[serde(default)]
    pub zones: Option<i64>,
    #[serde(default)]
    pub dx: Option<f64>,
}

impl UniformAxis {
    pub fn zones(bounds: Bounds, zones: i64) -> Self {
        Self {
            bounds,
            zones: Some(zones),
            dx: None,
        }
    }

    pub fn spacing(bounds: Bounds, dx: f64) -> Self {
        Self {
            bounds,
            zones: None,
            dx: Some(dx),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniformGridSpec {
    pub x1: UniformAxis,
    #[serde(default)]
    pub x2: Option<UniformAxis>,
    #[serde(default)]
    pub x3: Option<UniformAxis>,
}

/// 自适应网格某方向: 根层块数 `nblocks` 与最细层网格尺寸 `dx` 二选一
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveAxis {
    pub bounds: Bounds,
    /// 单个网格块在该方向的区数
    #[serde(default)]
    pub nxb: Option<i64>,
    #[serde(default)]
    pub nblocks: Option<i64>,
    #[serde(default)]
    pub dx: Option<f64>,
}

impl AdaptiveAxis {
    pub fn blocks(bounds: Bounds, nxb: i64, nblocks: i64) -> Self {
        Self {
            bounds,
            nxb: Some(nxb),
            nblocks: Some(nblocks),
            dx: None,
        }
    }

    pub fn spacing(bounds: Bounds, nxb: i64, dx: f64) -> Self {
        Self {
            bounds,
            nxb: Some(nxb),
            nblocks: None,
            dx: Some(dx),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveGridSpec {
    pub x1: AdaptiveAxis,
    #[serde(default)]
    pub x2: Option<AdaptiveAxis>,
    #[serde(default)]
    pub x3: Option<AdaptiveAxis>,
    #[serde(default = "default_num_levels")]
    pub num_levels: i64,
}

fn default_num_levels() -> i64 {
    1
}

/// 区数与网格尺寸二选一（取 0 视为未给出）
fn resolve_zones(axis: usize, zones: Option<i64>, dx: Option<f64>, length: f64) -> ConfigResult<i64> {
    let zones = zones.filter(|n| *n != 0);
    let dx = dx.filter(|d| *d != 0.0);
    match (zones, dx) {
        (Some(n), None) => Ok(n),
        (None, Some(dx)) => Ok((length / dx) as i64),
        (Some(_), Some(_)) => Err(ConfigError::Overconstrained(format!(
            "x{} 方向同时给出了区数和网格尺寸",
            axis
        ))),
        (None, None) => Err(ConfigError::Overconstrained(format!(
            "x{} 方向需要区数或网格尺寸之一",
            axis
        ))),
    }
}

fn check_dimensions<T>(x2: &Option<T>, x3: &Option<T>) -> ConfigResult<usize> {
    match (x2, x3) {
        (None, Some(_)) => Err(ConfigError::InvalidConfiguration(
            "给出了 x3 方向但没有 x2 方向".to_string(),
        )),
        (None, None) => Ok(1),
        (Some(_), None) => Ok(2),
        (Some(_), Some(_)) => Ok(3),
    }
}

/// 按进程数切分各方向的块数
///
/// 1 维: 每进程一块；2 维: np1 = 2·np2；3 维: np1 = 2·np2 = 2·np3
fn decompose(ndim: usize, nprocs: usize) -> [i64; 3] {
    let np = nprocs.max(1) as f64;
    match ndim {
        2 => {
            let n2 = ((np / 2.0).sqrt() as i64).max(1);
            [2 * n2, n2, 1]
        }
        3 => {
            let n2 = ((np / 2.0).cbrt() as i64).max(1);
            [2 * n2, n2, n2]
        }
        _ => [np as i64, 1, 1],
    }
}

// ==========================================
// Grid - 网格配置节点
// ==========================================
#[derive(Debug)]
pub struct Grid {
    pub strategy: RefinementStrategy,
    pub numlevel: i64,
    pub nx: [i64; 3],
    pub nxb: [i64; 3],
    pub bounds: [Option<Bounds>; 3],
    boundary_conditions: Slot<BoundaryConditions>,
    refinement_fields: Slot<RefinementFields>,
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            strategy: RefinementStrategy::None,
            numlevel: 1,
            nx: [32, 1, 1],
            nxb: [32, 1, 1],
            bounds: [Some(DEFAULT_BOUNDS), None, None],
            boundary_conditions: Slot::new("Grid", "boundary_conditions"),
            refinement_fields: Slot::new("Grid", "refinement_fields"),
        }
    }
}

impl Grid {
    /// 计算均匀网格的设置（不入树）
    ///
    /// # 参数
    /// - spec: 各方向的区间与分辨率
    /// - nprocs: 进程数，决定网格块切分
    pub fn uniform_settings(spec: &UniformGridSpec, nprocs: usize) -> ConfigResult<Grid> {
        let ndim = check_dimensions(&spec.x2, &spec.x3)?;
        let axes = [Some(spec.x1), spec.x2, spec.x3];

        let mut nx = [1i64; 3];
        for (i, axis) in axes.iter().enumerate() {
            if let Some(axis) = axis {
                let length = axis.bounds.1 - axis.bounds.0;
                nx[i] = resolve_zones(i + 1, axis.zones, axis.dx, length)?;
            }
        }

        let blocks = decompose(ndim, nprocs);
        let nxb = [nx[0] / blocks[0], nx[1] / blocks[1], nx[2] / blocks[2]];
        debug!(ndim = ndim, nprocs = nprocs, ?nx, ?nxb, "均匀网格切分完成");

        Ok(Grid {
            strategy: RefinementStrategy::None,
            numlevel: 1,
            nx,
            nxb,
            bounds: axes.map(|a| a.map(|a| a.bounds)),
            ..Grid::default()
        })
    }

    /// 计算自适应网格的设置（不入树，不含加密字段子节点）
    pub fn adaptive_settings(spec: &AdaptiveGridSpec) -> ConfigResult<Grid> {
        check_dimensions(&spec.x2, &spec.x3)?;
        let nxb1 = spec.x1.nxb.ok_or_else(|| {
            ConfigError::InvalidConfiguration("自适应网格需要 x1 方向的块区数 nxb".to_string())
        })?;
        let axes = [Some(spec.x1), spec.x2, spec.x3];
        // 最细层网格尺寸换算到根层
        let ratio = 2f64.powi((spec.num_levels - 1).max(0) as i32);

        let mut nx = [1i64; 3];
        let mut nxb = [nxb1, 1, 1];
        for (i, axis) in axes.iter().enumerate() {
            if let Some(axis) = axis {
                let block = axis.nxb.unwrap_or(1);
                nxb[i] = block;
                let zones = axis.nblocks.map(|n| n * block);
                let dx = axis.dx.map(|dx| dx * ratio);
                let length = axis.bounds.1 - axis.bounds.0;
                nx[i] = resolve_zones(i + 1, zones, dx, length)?;
            }
        }

        Ok(Grid {
            strategy: RefinementStrategy::Adaptive,
            numlevel: spec.num_levels,
            nx,
            nxb,
            bounds: axes.map(|a| a.map(|a| a.bounds)),
            ..Grid::default()
        })
    }

    /// 创建均匀网格节点
    pub fn uniform(
        tree: &ConfigTree,
        spec: &UniformGridSpec,
        nprocs: usize,
    ) -> ConfigResult<NodeRef<Grid>> {
        tree.insert(Self::uniform_settings(spec, nprocs)?)
    }

    /// 创建自适应网格节点，并挂上一个空的加密字段集合
    pub fn adaptive(tree: &ConfigTree, spec: &AdaptiveGridSpec) -> ConfigResult<NodeRef<Grid>> {
        let grid = tree.insert(Self::adaptive_settings(spec)?)?;
        let fields = tree.insert(RefinementFields::new())?;
        grid.set_refinement_fields(&fields)?;
        Ok(grid)
    }

    pub fn ndim(&self) -> usize {
        1 + self.bounds[1..].iter().filter(|b| b.is_some()).count()
    }
}

impl ConfigNode for Grid {
    fn export_settings(&self, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        let mut mesh = InputBlock::new()
            .with("refinement", self.strategy)
            .with("numlevel", self.numlevel);
        for i in 0..3 {
            let (min, max) = self.bounds[i].unwrap_or(DEFAULT_BOUNDS);
            mesh.insert(format!("nx{}", i + 1), self.nx[i]);
            mesh.insert(format!("x{}min", i + 1), min);
            mesh.insert(format!("x{}max", i + 1), max);
        }
        writer.set("parthenon/mesh", mesh)?;

        writer.set(
            "parthenon/meshblock",
            InputBlock::new()
                .with("nx1", self.nxb[0])
                .with("nx2", self.nxb[1])
                .with("nx3", self.nxb[2]),
        )
    }
}

impl NodeRef<Grid> {
    pub fn set_boundary_conditions(&self, bc: &NodeRef<BoundaryConditions>) -> ConfigResult<()> {
        self.assign_slot(bc, |g| &mut g.boundary_conditions)
    }

    pub fn boundary_conditions(&self) -> ConfigResult<NodeRef<BoundaryConditions>> {
        self.with(|g| g.boundary_conditions.get().cloned())?
    }

    pub fn set_refinement_fields(&self, fields: &NodeRef<RefinementFields>) -> ConfigResult<()> {
        self.assign_slot(fields, |g| &mut g.refinement_fields)
    }

    pub fn refinement_fields(&self) -> ConfigResult<NodeRef<RefinementFields>> {
        self.with(|g| g.refinement_fields.get().cloned())?
    }
}

// ==========================================
// BoundaryConditions - 边界条件
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConditions {
    pub ix1: BoundaryCondition,
    pub ix2: BoundaryCondition,
    pub ix3: BoundaryCondition,
    pub ox1: BoundaryCondition,
    pub ox2: BoundaryCondition,
    pub ox3: BoundaryCondition,
}

impl BoundaryConditions {
    /// 六个面取同一种边界
    pub fn uniform(bc: BoundaryCondition) -> Self {
        Self {
            ix1: bc,
            ix2: bc,
            ix3: bc,
            ox1: bc,
            ox2: bc,
            ox3: bc,
        }
    }

    pub fn outflow_box() -> Self {
        Self::uniform(BoundaryCondition::Outflow)
    }

    pub fn periodic_box() -> Self {
        Self::uniform(BoundaryCondition::Periodic)
    }
}

impl ConfigNode for BoundaryConditions {
    fn export_settings(&self, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        writer.set(
            "parthenon/mesh",
            InputBlock::new()
                .with("ix1_bc", self.ix1)
                .with("ix2_bc", self.ix2)
                .with("ix3_bc", self.ix3)
                .with("ox1_bc", self.ox1)
                .with("ox2_bc", self.ox2)
                .with("ox3_bc", self.ox3),
        )
    }
}
