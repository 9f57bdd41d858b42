// ==========================================
// Kamayan 配置层 - 加密判据字段
// ==========================================
// 输出块: <kamayan/refinement{n}>，n 按加入顺序从 0 编号
// 未指定 max_level 时回读 grid 单元 <parthenon/mesh>/numlevel，
// 因此必须在网格之后导出
// ==========================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::RefinementMethod;
use crate::error::ConfigResult;
use crate::params::{InputBlock, ParamWriter};
use crate::tree::ConfigNode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementVariable {
    pub field: String,
    #[serde(default)]
    pub max_level: Option<i64>,
    #[serde(default)]
    pub method: RefinementMethod,
    #[serde(default = "default_filter")]
    pub filter: f64,
    #[serde(default = "default_derefine_tol")]
    pub derefine_tol: f64,
    #[serde(default = "default_refine_tol")]
    pub refine_tol: f64,
}

fn default_filter() -> f64 {
    1.0e-2
}

fn default_derefine_tol() -> f64 {
    2.0e-1
}

fn default_refine_tol() -> f64 {
    8.0e-1
}

impl RefinementVariable {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            max_level: None,
            method: RefinementMethod::default(),
            filter: default_filter(),
            derefine_tol: default_derefine_tol(),
            refine_tol: default_refine_tol(),
        }
    }

    pub fn with_max_level(mut self, max_level: i64) -> Self {
        self.max_level = Some(max_level);
        self
    }

    pub fn with_method(mut self, method: RefinementMethod) -> Self {
        self.method = method;
        self
    }

    fn export(&self, n: usize, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        // 0 视为未指定，沿用网格层数
        let max_level = match self.max_level.filter(|l| *l != 0) {
            Some(level) => level,
            None => writer.get_data("grid", "parthenon/mesh")?.get_int("numlevel")?,
        };
        writer.set(
            &format!("kamayan/refinement{}", n),
            InputBlock::new()
                .with("field", self.field.as_str())
                .with("method", self.method)
                .with("derefine_tol", self.derefine_tol)
                .with("refine_tol", self.refine_tol)
                .with("filter", self.filter)
                .with("max_level", max_level),
        )
    }
}

/// 加密字段集合（同名字段后加入者覆盖）
#[derive(Debug, Clone, Default)]
pub struct RefinementFields {
    fields: IndexMap<String, RefinementVariable>,
}

impl RefinementFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, var: RefinementVariable) {
        self.fields.insert(var.field.clone(), var);
    }

    pub fn remove(&mut self, field: &str) -> Option<RefinementVariable> {
        self.fields.shift_remove(field)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl ConfigNode for RefinementFields {
    fn export_settings(&self, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        for (n, var) in self.fields.values().enumerate() {
            var.export(n, writer)?;
        }
        Ok(())
    }
}
