// ==========================================
// Kamayan 配置层 - 输出设置
// ==========================================
// 输出块: <parthenon/output{n}>，n 按加入顺序从 0 编号
// 每个输出只能给出 dt 或 dn 之一，未给出的写 -1
// ==========================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::params::{InputBlock, ParamWriter};
use crate::tree::ConfigNode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputType {
    pub name: String,
    pub file_type: String,
    #[serde(default)]
    pub dt: Option<f64>,
    #[serde(default)]
    pub dn: Option<i64>,
    /// 输出的变量名；为空时由后端决定
    #[serde(default)]
    pub variables: Vec<String>,
}

impl OutputType {
    fn export(&self, n: usize, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        let mut block = InputBlock::new()
            .with("file_type", self.file_type.as_str())
            .with("dt", self.dt.unwrap_or(-1.0))
            .with("dn", self.dn.unwrap_or(-1));
        if !self.variables.is_empty() {
            block.insert("variables", self.variables.join(", "));
        }
        writer.set(&format!("parthenon/output{}", n), block)
    }
}

/// 输出集合（同名输出后加入者覆盖）
#[derive(Debug, Clone, Default)]
pub struct Outputs {
    outputs: IndexMap<String, OutputType>,
}

impl Outputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个输出
    ///
    /// # 参数
    /// - name: 输出名
    /// - file_type: 文件类型 (hdf5, rst, hst ...)
    /// - dt / dn: 按时间或按步数输出，二者最多给一个
    pub fn add(
        &mut self,
        name: impl Into<String>,
        file_type: impl Into<String>,
        dt: Option<f64>,
        dn: Option<i64>,
    ) -> ConfigResult<()> {
        self.add_output(OutputType {
            name: name.into(),
            file_type: file_type.into(),
            dt,
            dn,
            variables: Vec::new(),
        })
    }

    pub fn add_output(&mut self, output: OutputType) -> ConfigResult<()> {
        if output.dt.is_some() && output.dn.is_some() {
            return Err(ConfigError::Overconstrained(format!(
                "输出 {} 只能给出 dt 或 dn 之一",
                output.name
            )));
        }
        self.outputs.insert(output.name.clone(), output);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.outputs.clear();
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl ConfigNode for Outputs {
    fn export_settings(&self, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        for (n, output) in self.outputs.values().enumerate() {
            output.export(n, writer)?;
        }
        Ok(())
    }
}
