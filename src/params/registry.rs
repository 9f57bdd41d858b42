// ==========================================
// Kamayan 配置层 - 后端单元注册表
// ==========================================
// 职责: 描述外部模拟后端已知的单元及其声明的参数块
// 红线: 路由器只通过 UnitRegistry trait 访问注册表
// 红线: 同名参数块在所有单元间只有一个存储，各单元的声明合并进去
// ==========================================

use indexmap::IndexMap;
use tracing::debug;

use super::store::ParameterStore;

/// 单元的参数注册回调
pub type SetupHook = Box<dyn Fn(&mut Unit)>;

// ==========================================
// Unit - 后端单元
// ==========================================
pub struct Unit {
    name: String,
    data: IndexMap<String, ParameterStore>,
    setup: Option<SetupHook>,
}

impl Unit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: IndexMap::new(),
            setup: None,
        }
    }

    /// 附带参数注册回调
    pub fn with_setup(mut self, hook: impl Fn(&mut Unit) + 'static) -> Self {
        self.setup = Some(Box::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 获取或创建本单元声明的参数块
    pub fn add_data(&mut self, block: &str) -> &mut ParameterStore {
        self.data
            .entry(block.to_string())
            .or_insert_with(|| ParameterStore::new(block))
    }

    /// 本单元声明的参数块（声明时的默认值，不随路由写入变化）
    pub fn data(&self, block: &str) -> Option<&ParameterStore> {
        self.data.get(block)
    }

    pub fn has_data(&self, block: &str) -> bool {
        self.data.contains_key(block)
    }

    /// 按声明顺序遍历参数块
    pub fn all_data(&self) -> impl Iterator<Item = &ParameterStore> {
        self.data.values()
    }

    pub fn has_setup(&self) -> bool {
        self.setup.is_some()
    }

    /// 执行注册回调（回调先取出，避免与 &mut self 冲突）
    pub fn run_setup(&mut self) {
        if let Some(hook) = self.setup.take() {
            hook(self);
            self.setup = Some(hook);
        }
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("name", &self.name)
            .field("blocks", &self.data.keys().collect::<Vec<_>>())
            .field("has_setup", &self.setup.is_some())
            .finish()
    }
}

// ==========================================
// UnitRegistry Trait
// ==========================================
// 用途: 路由器所需的后端注册表能力
// 实现者: UnitCollection（进程内替身）或外部引擎绑定
pub trait UnitRegistry {
    /// 按注册顺序列出单元名
    fn unit_names(&self) -> Vec<&str>;

    /// 是否有任一单元声明了该参数块
    fn declares(&self, block: &str) -> bool {
        self.find_block(block).is_some()
    }

    /// 该参数块的共享存储
    fn find_block(&self, block: &str) -> Option<&ParameterStore>;

    fn find_block_mut(&mut self, block: &str) -> Option<&mut ParameterStore>;

    /// 指定单元声明过的参数块（返回共享存储）
    fn store(&self, unit: &str, block: &str) -> Option<&ParameterStore>;

    fn store_mut(&mut self, unit: &str, block: &str) -> Option<&mut ParameterStore>;

    /// 全部参数块，每个块名一个（首次声明顺序）
    fn stores(&self) -> Vec<&ParameterStore>;

    /// 依次执行各单元的注册回调并合并声明
    fn run_setup(&mut self);
}

// ==========================================
// UnitCollection - 注册顺序的单元集合
// ==========================================
#[derive(Debug, Default)]
pub struct UnitCollection {
    units: Vec<Unit>,
    /// 块名 → 共享存储
    blocks: IndexMap<String, ParameterStore>,
}

impl UnitCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册单元；同名单元原位替换
    pub fn add(&mut self, unit: Unit) {
        match self.units.iter_mut().find(|u| u.name == unit.name) {
            Some(existing) => *existing = unit,
            None => self.units.push(unit),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Unit> {
        self.units.iter_mut().find(|u| u.name == name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter()
    }

    /// 按注册顺序把各单元的声明合并成每块一个存储
    ///
    /// 同一个键被多个单元声明时保留先注册者的默认值。
    /// 重建会丢弃此前的路由写入，只应在注册完成后调用一次。
    fn merge_declarations(&mut self) {
        self.blocks.clear();
        for unit in &self.units {
            for store in unit.all_data() {
                self.blocks
                    .entry(store.block().to_string())
                    .or_insert_with(|| ParameterStore::new(store.block()))
                    .absorb(store);
            }
        }
    }

    fn declared_by(&self, unit: &str, block: &str) -> bool {
        self.get(unit).map(|u| u.has_data(block)).unwrap_or(false)
    }
}

impl UnitRegistry for UnitCollection {
    fn unit_names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name()).collect()
    }

    fn find_block(&self, block: &str) -> Option<&ParameterStore> {
        self.blocks.get(block)
    }

    fn find_block_mut(&mut self, block: &str) -> Option<&mut ParameterStore> {
        self.blocks.get_mut(block)
    }

    fn store(&self, unit: &str, block: &str) -> Option<&ParameterStore> {
        if !self.declared_by(unit, block) {
            return None;
        }
        self.blocks.get(block)
    }

    fn store_mut(&mut self, unit: &str, block: &str) -> Option<&mut ParameterStore> {
        if !self.declared_by(unit, block) {
            return None;
        }
        self.blocks.get_mut(block)
    }

    fn stores(&self) -> Vec<&ParameterStore> {
        self.blocks.values().collect()
    }

    fn run_setup(&mut self) {
        for unit in self.units.iter_mut() {
            if !unit.has_setup() {
                continue;
            }
            unit.run_setup();
            debug!(unit = unit.name(), blocks = unit.data.len(), "单元参数注册完成");
        }
        self.merge_declarations();
        debug!(blocks = self.blocks.len(), "参数块声明已合并");
    }
}
