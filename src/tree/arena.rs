// ==========================================
// Kamayan 配置层 - 节点竞技场
// ==========================================
// 节点按槽位存放，NodeId = 槽位下标 + 代数
// 槽位释放时代数加一，旧 NodeId 随即失效；空闲槽位进入复用池
// ==========================================

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use super::node::ConfigNode;
use crate::error::{ConfigError, ConfigResult};

/// 带代数校验的节点标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// 单个节点的树内状态
pub(crate) struct NodeData {
    pub type_name: &'static str,
    pub parent: Option<NodeId>,
    /// 插入顺序；可能含已失效的 id，遍历时跳过
    pub children: Vec<NodeId>,
    /// 插槽赋值时代替自身作为挂载点的节点
    pub anchor: Option<NodeId>,
    pub payload: Box<dyn ConfigNode>,
}

struct Entry {
    generation: u32,
    data: Option<NodeData>,
}

#[derive(Default)]
pub(crate) struct Arena {
    entries: Vec<Entry>,
    free: Vec<u32>,
    live: usize,
}

impl Arena {
    pub fn insert(&mut self, payload: Box<dyn ConfigNode>) -> NodeId {
        let data = NodeData {
            type_name: payload.type_name(),
            parent: None,
            children: Vec::new(),
            anchor: None,
            payload,
        };
        self.live += 1;

        match self.free.pop() {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                entry.data = Some(data);
                NodeId {
                    index,
                    generation: entry.generation,
                }
            }
            None => {
                let index = self.entries.len() as u32;
                self.entries.push(Entry {
                    generation: 0,
                    data: Some(data),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.entries
            .get(id.index as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.data.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.entries
            .get_mut(id.index as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.data.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    /// 释放槽位；返回的数据由调用方在借用结束后丢弃
    pub fn remove(&mut self, id: NodeId) -> Option<NodeData> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation {
            return None;
        }
        let data = entry.data.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(data)
    }

    /// 清空全部槽位（代数照常递增）
    pub fn drain(&mut self) -> Vec<NodeData> {
        let mut drained = Vec::with_capacity(self.live);
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if let Some(data) = entry.data.take() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free.push(index as u32);
                drained.push(data);
            }
        }
        self.live = 0;
        drained
    }

    /// 把 child 挂到 parent 下
    ///
    /// child 已有其他父节点时只改写父指针，旧父节点的子列表不动。
    pub fn attach(&mut self, child: NodeId, parent: NodeId) -> ConfigResult<()> {
        if !self.contains(child) {
            return Err(stale(child));
        }
        if !self.contains(parent) {
            return Err(stale(parent));
        }
        if child == parent || self.descendants(child).contains(&parent) {
            return Err(ConfigError::InvalidConfiguration(format!(
                "挂载 {} 到 {} 会形成环",
                self.type_name(child),
                self.type_name(parent)
            )));
        }

        if let Some(node) = self.get_mut(parent) {
            if !node.children.contains(&child) {
                node.children.push(child);
            }
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// 父指针仍指向 id 的存活子节点（插入顺序）
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        node.children
            .iter()
            .copied()
            .filter(|c| self.get(*c).map(|n| n.parent == Some(id)).unwrap_or(false))
            .collect()
    }

    /// 全部可达后代（不含自身）
    ///
    /// 顺序: 直接子节点按插入顺序，随后依次追加每个子节点的后代。
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut visited = HashSet::from([id]);
        self.collect(id, &mut out, &mut visited);
        out
    }

    fn collect(&self, id: NodeId, out: &mut Vec<NodeId>, visited: &mut HashSet<NodeId>) {
        let Some(node) = self.get(id) else {
            return;
        };
        let fresh: Vec<NodeId> = node
            .children
            .iter()
            .copied()
            .filter(|c| self.contains(*c) && visited.insert(*c))
            .collect();
        out.extend(fresh.iter().copied());
        for child in fresh {
            self.collect(child, out, visited);
        }
    }

    /// 缩进文本形式的子树，每层两个空格
    pub fn describe(&self, id: NodeId) -> String {
        let mut lines = Vec::new();
        let mut visited = HashSet::new();
        self.describe_into(id, 0, &mut lines, &mut visited);
        lines.join("\n")
    }

    fn describe_into(
        &self,
        id: NodeId,
        depth: usize,
        lines: &mut Vec<String>,
        visited: &mut HashSet<NodeId>,
    ) {
        let Some(node) = self.get(id) else {
            return;
        };
        if !visited.insert(id) {
            return;
        }
        lines.push(format!("{}{}", "  ".repeat(depth), node.type_name));
        for child in &node.children {
            // 只沿当前父指针展开，避免重挂后的节点出现两次
            let owned = self.get(*child).map(|c| c.parent == Some(id)).unwrap_or(false);
            if owned {
                self.describe_into(*child, depth + 1, lines, visited);
            }
        }
    }

    pub fn type_name(&self, id: NodeId) -> &'static str {
        self.get(id).map(|n| n.type_name).unwrap_or("<stale>")
    }
}

pub(crate) fn stale(id: NodeId) -> ConfigError {
    ConfigError::StaleNode {
        node: id.to_string(),
    }
}
