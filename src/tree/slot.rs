// ==========================================
// Kamayan 配置层 - 子节点插槽
// ==========================================
// 插槽保存一个子节点的强句柄；赋值与挂树由
// NodeRef::assign_slot / ConfigTree::assign_slot 一次完成
// ==========================================

use std::fmt;

use super::handle::NodeRef;
use super::node::ConfigNode;
use crate::error::{ConfigError, ConfigResult};

pub struct Slot<T: ConfigNode> {
    owner: &'static str,
    name: &'static str,
    value: Option<NodeRef<T>>,
}

impl<T: ConfigNode> Slot<T> {
    /// 创建空插槽
    ///
    /// # 参数
    /// - owner: 持有插槽的类型名（用于错误信息）
    /// - name: 插槽名
    pub fn new(owner: &'static str, name: &'static str) -> Self {
        Self {
            owner,
            name,
            value: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// 读取插槽；从未赋值时返回 NotConfigured
    pub fn get(&self) -> ConfigResult<&NodeRef<T>> {
        self.value.as_ref().ok_or_else(|| ConfigError::NotConfigured {
            owner: self.owner.to_string(),
            slot: self.name.to_string(),
        })
    }

    pub fn try_get(&self) -> Option<&NodeRef<T>> {
        self.value.as_ref()
    }

    /// 仅替换保存的句柄，不做挂树
    pub(crate) fn replace(&mut self, value: NodeRef<T>) -> Option<NodeRef<T>> {
        self.value.replace(value)
    }
}

impl<T: ConfigNode> Default for Slot<T> {
    fn default() -> Self {
        Self::new("?", "?")
    }
}

impl<T: ConfigNode> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("value", &self.value)
            .finish()
    }
}
