// ==========================================
// Kamayan 配置层 - 输入块
// ==========================================
// 一次路由写入的单位: 有序的 key → value 集合
// ==========================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::ParamValue;

/// 写入某个参数块的一组键值（保持插入顺序）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputBlock {
    params: IndexMap<String, ParamValue>,
}

impl InputBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式追加一个参数；重复键后写覆盖，位置保持首次写入处
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(key.into(), value.into());
    }

    /// 合并另一个块（对方的值覆盖本方）
    pub fn merge(mut self, other: InputBlock) -> Self {
        self.params.extend(other.params);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for InputBlock {
    type Item = (String, ParamValue);
    type IntoIter = indexmap::map::IntoIter<String, ParamValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.into_iter()
    }
}

impl<K, V> FromIterator<(K, V)> for InputBlock
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut block = InputBlock::new();
        for (k, v) in iter {
            block.insert(k, v);
        }
        block
    }
}
