// ==========================================
// Kamayan 配置层 - 配置树与节点句柄
// ==========================================
// ConfigTree 独占竞技场；NodeRef 通过弱指针访问树并持有强计数
// 最后一个 NodeRef 丢弃时节点被释放，树内指向它的 id 自动失效
// 红线: 负载的丢弃总在竞技场借用之外进行
// ==========================================

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use super::arena::{stale, Arena, NodeData, NodeId};
use super::node::{downcast_mut, downcast_ref, short_type_name, ConfigNode, RootNode};
use super::slot::Slot;
use crate::error::{ConfigError, ConfigResult};
use crate::params::ParamWriter;

#[derive(Debug, Clone, Copy, Default)]
struct StrongCount {
    generation: u32,
    count: u32,
}

pub(crate) struct TreeInner {
    arena: RefCell<Arena>,
    /// 按槽位下标记录的外部强引用数；不会在用户代码执行期间保持借用
    strong: RefCell<Vec<StrongCount>>,
    /// 竞技场忙时延后的释放
    pending: RefCell<Vec<NodeId>>,
}

impl TreeInner {
    fn arena(&self) -> ConfigResult<std::cell::Ref<'_, Arena>> {
        self.arena
            .try_borrow()
            .map_err(|_| ConfigError::TreeBusy("配置树正在被修改".to_string()))
    }

    fn arena_mut(&self) -> ConfigResult<std::cell::RefMut<'_, Arena>> {
        self.arena
            .try_borrow_mut()
            .map_err(|_| ConfigError::TreeBusy("配置树正在被访问".to_string()))
    }

    fn insert(&self, payload: Box<dyn ConfigNode>) -> ConfigResult<NodeId> {
        let id = self.arena_mut()?.insert(payload);
        let mut strong = self.strong.borrow_mut();
        let index = id.index() as usize;
        if strong.len() <= index {
            strong.resize(index + 1, StrongCount::default());
        }
        strong[index] = StrongCount {
            generation: id.generation(),
            count: 1,
        };
        Ok(id)
    }

    fn retain(&self, id: NodeId) {
        let mut strong = self.strong.borrow_mut();
        if let Some(entry) = strong.get_mut(id.index() as usize) {
            if entry.generation == id.generation() {
                entry.count += 1;
            }
        }
    }

    /// 计数减一；归零时返回 true
    fn release(&self, id: NodeId) -> bool {
        let mut strong = self.strong.borrow_mut();
        match strong.get_mut(id.index() as usize) {
            Some(entry) if entry.generation == id.generation() && entry.count > 0 => {
                entry.count -= 1;
                entry.count == 0
            }
            _ => false,
        }
    }

    fn is_held(&self, id: NodeId) -> bool {
        self.strong
            .borrow()
            .get(id.index() as usize)
            .map(|e| e.generation == id.generation() && e.count > 0)
            .unwrap_or(false)
    }

    fn free(&self, id: NodeId) {
        let removed: Option<NodeData> = match self.arena.try_borrow_mut() {
            Ok(mut arena) => arena.remove(id),
            Err(_) => {
                trace!(node = %id, "竞技场忙，延后释放");
                self.pending.borrow_mut().push(id);
                return;
            }
        };
        self.forget(id);
        if let Some(data) = removed {
            trace!(node = %id, type_name = data.type_name, "节点已释放");
            drop(data);
        }
    }

    fn forget(&self, id: NodeId) {
        if let Some(entry) = self.strong.borrow_mut().get_mut(id.index() as usize) {
            *entry = StrongCount {
                generation: id.generation().wrapping_add(1),
                count: 0,
            };
        }
    }

    fn drain_pending(&self) {
        loop {
            let next = self.pending.borrow_mut().pop();
            let Some(id) = next else {
                break;
            };
            if self.arena.try_borrow_mut().is_err() {
                self.pending.borrow_mut().push(id);
                break;
            }
            self.free(id);
        }
    }

    fn link_slot(&self, owner: NodeId, value: NodeId) -> ConfigResult<()> {
        let mut arena = self.arena_mut()?;
        let anchor = arena.get(owner).ok_or_else(|| stale(owner))?.anchor;
        arena.attach(value, anchor.unwrap_or(owner))?;
        if let Some(node) = arena.get_mut(value) {
            node.anchor = anchor;
        }
        if let Some(target) = anchor {
            relink_under(&mut arena, value, target)?;
        }
        Ok(())
    }
}

/// 把 id 下已挂的子树逐个移到 target 下并带上锚点（先序，保持原有顺序）
fn relink_under(arena: &mut Arena, id: NodeId, target: NodeId) -> ConfigResult<()> {
    for child in arena.children(id) {
        arena.attach(child, target)?;
        if let Some(node) = arena.get_mut(child) {
            node.anchor = Some(target);
        }
        relink_under(arena, child, target)?;
    }
    Ok(())
}

// ==========================================
// ConfigTree - 配置树
// ==========================================
pub struct ConfigTree {
    inner: Rc<TreeInner>,
    root: NodeId,
}

impl ConfigTree {
    /// 创建只含根节点的配置树
    pub fn new() -> Self {
        let mut arena = Arena::default();
        let root = arena.insert(Box::new(RootNode));
        let inner = TreeInner {
            arena: RefCell::new(arena),
            strong: RefCell::new(vec![StrongCount {
                generation: root.generation(),
                count: 1,
            }]),
            pending: RefCell::new(Vec::new()),
        };
        Self {
            inner: Rc::new(inner),
            root,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// 根节点句柄（树本身另持一份计数，根不会被释放）
    pub fn root(&self) -> NodeRef<RootNode> {
        self.inner.retain(self.root);
        NodeRef::from_raw(Rc::downgrade(&self.inner), self.root)
    }

    /// 插入一个不挂父节点的配置节点
    pub fn insert<T: ConfigNode>(&self, value: T) -> ConfigResult<NodeRef<T>> {
        self.inner.drain_pending();
        let id = self.inner.insert(Box::new(value))?;
        Ok(NodeRef::from_raw(Rc::downgrade(&self.inner), id))
    }

    /// 插入并直接挂到 parent 下
    pub fn insert_under<T: ConfigNode>(&self, parent: NodeId, value: T) -> ConfigResult<NodeRef<T>> {
        let node = self.insert(value)?;
        self.attach(node.id(), parent)?;
        Ok(node)
    }

    pub fn attach(&self, child: NodeId, parent: NodeId) -> ConfigResult<()> {
        self.inner.drain_pending();
        self.inner.arena_mut()?.attach(child, parent)
    }

    /// 按插槽规则把 value 挂到 owner 的有效锚点下
    ///
    /// value 与其已有的子树都带上 owner 的锚点；锚点存在时子树也一并移到锚点下。
    pub fn adopt(&self, owner: NodeId, value: NodeId) -> ConfigResult<()> {
        self.inner.drain_pending();
        self.inner.link_slot(owner, value)
    }

    pub fn descendants(&self, id: NodeId) -> ConfigResult<Vec<NodeId>> {
        self.inner.drain_pending();
        Ok(self.inner.arena()?.descendants(id))
    }

    pub fn parent(&self, id: NodeId) -> ConfigResult<Option<NodeId>> {
        self.inner.drain_pending();
        let arena = self.inner.arena()?;
        let node = arena.get(id).ok_or_else(|| stale(id))?;
        Ok(node.parent.filter(|p| arena.contains(*p)))
    }

    pub fn describe(&self, id: NodeId) -> ConfigResult<String> {
        self.inner.drain_pending();
        Ok(self.inner.arena()?.describe(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.drain_pending();
        self.inner
            .arena()
            .map(|arena| arena.contains(id))
            .unwrap_or(false)
    }

    pub fn type_name(&self, id: NodeId) -> Option<&'static str> {
        let arena = self.inner.arena().ok()?;
        arena.get(id).map(|n| n.type_name)
    }

    /// 存活节点数（含根）
    pub fn len(&self) -> usize {
        self.inner.drain_pending();
        self.inner.arena().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 设置插槽赋值时的挂载点覆盖
    pub fn set_anchor(&self, id: NodeId, anchor: Option<NodeId>) -> ConfigResult<()> {
        self.inner.drain_pending();
        let mut arena = self.inner.arena_mut()?;
        let node = arena.get_mut(id).ok_or_else(|| stale(id))?;
        node.anchor = anchor;
        Ok(())
    }

    /// 写入不在任何负载内的插槽（例如管理器的插槽），并挂到 owner 的有效锚点下
    pub fn assign_slot<O: ConfigNode, T: ConfigNode>(
        &self,
        owner: &NodeRef<O>,
        slot: &mut Slot<T>,
        value: NodeRef<T>,
    ) -> ConfigResult<()> {
        if !value.is_live() {
            return Err(value.stale());
        }
        let value_id = value.id();
        let previous = slot.replace(value);
        drop(previous);
        self.inner.drain_pending();
        self.inner.link_slot(owner.id(), value_id)
    }

    /// 调用节点的 export_settings；已释放的节点跳过
    pub fn export(&self, id: NodeId, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        self.inner.drain_pending();
        let result = {
            let arena = self.inner.arena()?;
            match arena.get(id) {
                Some(node) => node.payload.export_settings(writer),
                None => {
                    debug!(node = %id, "节点已失效，跳过导出");
                    Ok(())
                }
            }
        };
        self.inner.drain_pending();
        result
    }

    /// 清空全部节点；之后所有句柄都失效
    pub fn finalize(&self) {
        self.inner.drain_pending();
        let drained = match self.inner.arena.try_borrow_mut() {
            Ok(mut arena) => arena.drain(),
            Err(_) => {
                warn!("配置树仍被借用，跳过清理");
                return;
            }
        };
        {
            let mut strong = self.inner.strong.borrow_mut();
            for entry in strong.iter_mut() {
                entry.generation = entry.generation.wrapping_add(1);
                entry.count = 0;
            }
        }
        self.inner.pending.borrow_mut().clear();
        debug!(nodes = drained.len(), "配置树已清理");
        drop(drained);
    }
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConfigTree {
    fn drop(&mut self) {
        self.finalize();
    }
}

impl fmt::Debug for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigTree")
            .field("root", &self.root)
            .field("nodes", &self.len())
            .finish()
    }
}

// ==========================================
// NodeRef - 节点强句柄
// ==========================================
pub struct NodeRef<T: ?Sized> {
    tree: Weak<TreeInner>,
    id: NodeId,
    _marker: PhantomData<fn() -> Box<T>>,
}

/// 擦除具体类型的句柄
pub type AnyNodeRef = NodeRef<dyn ConfigNode>;

impl<T: ?Sized> NodeRef<T> {
    fn from_raw(tree: Weak<TreeInner>, id: NodeId) -> Self {
        Self {
            tree,
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// 节点仍在树中
    pub fn is_live(&self) -> bool {
        self.tree
            .upgrade()
            .map(|inner| inner.is_held(self.id))
            .unwrap_or(false)
    }

    /// 挂到 parent 下
    pub fn attach_to(&self, parent: NodeId) -> ConfigResult<()> {
        let inner = self.upgrade()?;
        inner.drain_pending();
        let result = inner.arena_mut()?.attach(self.id, parent);
        result
    }

    pub fn parent(&self) -> ConfigResult<Option<NodeId>> {
        let inner = self.upgrade()?;
        inner.drain_pending();
        let arena = inner.arena()?;
        let node = arena.get(self.id).ok_or_else(|| self.stale())?;
        Ok(node.parent.filter(|p| arena.contains(*p)))
    }

    pub fn descendants(&self) -> ConfigResult<Vec<NodeId>> {
        let inner = self.upgrade()?;
        inner.drain_pending();
        let arena = inner.arena()?;
        if !arena.contains(self.id) {
            return Err(self.stale());
        }
        Ok(arena.descendants(self.id))
    }

    pub fn set_anchor(&self, anchor: Option<NodeId>) -> ConfigResult<()> {
        let inner = self.upgrade()?;
        let mut arena = inner.arena_mut()?;
        let node = arena.get_mut(self.id).ok_or_else(|| self.stale())?;
        node.anchor = anchor;
        Ok(())
    }

    /// 擦除类型，得到同一节点的另一份强引用
    pub fn erase(&self) -> AnyNodeRef {
        if let Some(inner) = self.tree.upgrade() {
            inner.retain(self.id);
        }
        NodeRef::from_raw(self.tree.clone(), self.id)
    }

    fn upgrade(&self) -> ConfigResult<Rc<TreeInner>> {
        self.tree.upgrade().ok_or_else(|| self.stale())
    }

    fn stale(&self) -> ConfigError {
        ConfigError::StaleNode {
            node: format!("{} {}", short_type_name(std::any::type_name::<T>()), self.id),
        }
    }
}

impl<T: ConfigNode> NodeRef<T> {
    /// 只读访问负载
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> ConfigResult<R> {
        let inner = self.upgrade()?;
        inner.drain_pending();
        let result = {
            let arena = inner.arena()?;
            let node = arena.get(self.id).ok_or_else(|| self.stale())?;
            let payload = downcast_ref::<T>(node.payload.as_ref()).ok_or_else(|| self.stale())?;
            f(payload)
        };
        inner.drain_pending();
        Ok(result)
    }

    /// 可写访问负载；闭包内不能再访问配置树
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> ConfigResult<R> {
        let inner = self.upgrade()?;
        inner.drain_pending();
        let result = {
            let mut arena = inner.arena_mut()?;
            let node = arena.get_mut(self.id).ok_or_else(|| self.stale())?;
            let payload =
                downcast_mut::<T>(node.payload.as_mut()).ok_or_else(|| self.stale())?;
            f(payload)
        };
        inner.drain_pending();
        Ok(result)
    }

    /// 写入负载中的插槽，并把新值挂到本节点的有效锚点下
    ///
    /// 有效锚点 = 本节点的锚点覆盖，未设置时为本节点自身；
    /// 锚点覆盖随之传递给新值。旧值只是从插槽中移出，仍留在树中直到最后的句柄丢弃。
    pub fn assign_slot<U: ConfigNode>(
        &self,
        value: &NodeRef<U>,
        field: impl FnOnce(&mut T) -> &mut Slot<U>,
    ) -> ConfigResult<()> {
        if !value.is_live() {
            return Err(value.stale());
        }
        let stored = value.clone();
        let previous = self.with_mut(|owner| field(owner).replace(stored))?;
        drop(previous);
        let inner = self.upgrade()?;
        inner.drain_pending();
        inner.link_slot(self.id, value.id)
    }
}

impl<T: ?Sized> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        if let Some(inner) = self.tree.upgrade() {
            inner.retain(self.id);
        }
        NodeRef::from_raw(self.tree.clone(), self.id)
    }
}

impl<T: ?Sized> Drop for NodeRef<T> {
    fn drop(&mut self) {
        let Some(inner) = self.tree.upgrade() else {
            return;
        };
        if inner.release(self.id) {
            inner.free(self.id);
        }
    }
}

impl<T: ?Sized> PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.tree.ptr_eq(&other.tree)
    }
}

impl<T: ?Sized> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("type", &short_type_name(std::any::type_name::<T>()))
            .field("id", &self.id)
            .finish()
    }
}
