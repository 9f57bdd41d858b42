// ==========================================
// Kamayan 配置层 - 后端参数存储
// ==========================================
// 对应后端单元声明的一个参数块 (UnitData)
// 键唯一；输出按键排序，写入顺序无关
// ==========================================

use std::collections::BTreeMap;

use serde::Serialize;

use super::value::ParamValue;
use crate::error::{ConfigError, ConfigResult};

/// 已声明参数
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub value: ParamValue,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub docstring: String,
}

/// 后端拥有的参数块
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParameterStore {
    block: String,
    params: BTreeMap<String, Parameter>,
}

impl ParameterStore {
    pub fn new(block: impl Into<String>) -> Self {
        Self {
            block: block.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn block(&self) -> &str {
        &self.block
    }

    /// 声明参数（带默认值）；已声明时保留现值
    pub fn declare(
        &mut self,
        key: impl Into<String>,
        default: impl Into<ParamValue>,
        docstring: impl Into<String>,
    ) -> &mut Self {
        self.params.entry(key.into()).or_insert_with(|| Parameter {
            value: default.into(),
            docstring: docstring.into(),
        });
        self
    }

    /// 合并另一份声明：未声明的键连同默认值与说明一起加入
    pub fn absorb(&mut self, other: &ParameterStore) {
        for (key, parm) in &other.params {
            self.params
                .entry(key.clone())
                .or_insert_with(|| parm.clone());
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// 原样覆盖已声明参数的值（不检查类型）
    pub fn update(&mut self, key: &str, value: impl Into<ParamValue>) -> ConfigResult<()> {
        match self.params.get_mut(key) {
            Some(parm) => {
                parm.value = value.into();
                Ok(())
            }
            None => Err(ConfigError::UnknownKey {
                block: self.block.clone(),
                key: key.to_string(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key).map(|p| &p.value)
    }

    pub fn get_int(&self, key: &str) -> ConfigResult<i64> {
        let value = self.require(key)?;
        value.as_int().ok_or_else(|| self.mismatch(key, "int", value))
    }

    pub fn get_real(&self, key: &str) -> ConfigResult<f64> {
        let value = self.require(key)?;
        value.as_real().ok_or_else(|| self.mismatch(key, "real", value))
    }

    pub fn get_str(&self, key: &str) -> ConfigResult<&str> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| self.mismatch(key, "string", value))
    }

    pub fn get_bool(&self, key: &str) -> ConfigResult<bool> {
        let value = self.require(key)?;
        value.as_bool().ok_or_else(|| self.mismatch(key, "bool", value))
    }

    pub fn docstring(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|p| p.docstring.as_str())
    }

    /// 按键排序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, p)| (k.as_str(), &p.value))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    fn require(&self, key: &str) -> ConfigResult<&ParamValue> {
        self.get(key).ok_or_else(|| ConfigError::UnknownKey {
            block: self.block.clone(),
            key: key.to_string(),
        })
    }

    fn mismatch(&self, key: &str, expected: &'static str, found: &ParamValue) -> ConfigError {
        ConfigError::TypeMismatch {
            block: self.block.clone(),
            key: key.to_string(),
            expected,
            found: found.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_keeps_existing_value() {
        let mut store = ParameterStore::new("parthenon/mesh");
        store.declare("numlevel", 1, "Number of refinement levels.");
        store.update("numlevel", 3).unwrap();
        store.declare("numlevel", 1, "again");

        assert_eq!(store.get_int("numlevel").unwrap(), 3);
        assert_eq!(store.docstring("numlevel"), Some("Number of refinement levels."));
    }

    #[test]
    fn test_update_accepts_other_kind_verbatim() {
        let mut store = ParameterStore::new("hydro");
        store.declare("cfl", 0.8, "");
        store.update("cfl", "half").unwrap();

        assert_eq!(store.get("cfl"), Some(&ParamValue::from("half")));
        assert!(matches!(
            store.get_real("cfl"),
            Err(ConfigError::TypeMismatch { expected: "real", found: "string", .. })
        ));
    }

    #[test]
    fn test_update_undeclared_key_fails() {
        let mut store = ParameterStore::new("hydro");
        assert!(matches!(
            store.update("missing", 1),
            Err(ConfigError::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_iter_is_sorted_by_key() {
        let mut store = ParameterStore::new("b");
        store.declare("z", 1, "").declare("a", 2, "").declare("m", 3, "");
        let keys: Vec<&str> = store.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "m", "z"]);
    }
}
