// ==========================================
// Kamayan 配置层 - 参数路由器
// ==========================================
// 职责: 把配置节点写出的参数块合并进后端存储，
//       后端未声明的部分暂存到本地回退区并记录来源
// 红线: 路由按键在写入时决定；回退区的值不会自动迁移
// 红线: 部分写入不回滚
// ==========================================

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::block::InputBlock;
use super::registry::UnitRegistry;
use super::store::ParameterStore;
use super::value::ParamValue;
use crate::error::{ConfigError, ConfigResult};

/// 未指明写入者时记录的来源
pub const UNKNOWN_PROVENANCE: &str = "unknown";

// ==========================================
// FallbackBlock - 本地暂存的参数块
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackBlock {
    pub block: String,
    /// 第一个写入者的类型名
    pub provenance: String,
    pub params: IndexMap<String, ParamValue>,
}

impl FallbackBlock {
    fn new(block: &str, provenance: &str) -> Self {
        Self {
            block: block.to_string(),
            provenance: provenance.to_string(),
            params: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }
}

// ==========================================
// ParameterRouter
// ==========================================
pub struct ParameterRouter {
    registry: Box<dyn UnitRegistry>,
    fallback: IndexMap<String, FallbackBlock>,
}

impl ParameterRouter {
    /// 创建路由器
    ///
    /// # 参数
    /// - registry: 已完成单元注册的后端注册表
    pub fn new(registry: Box<dyn UnitRegistry>) -> Self {
        Self {
            registry,
            fallback: IndexMap::new(),
        }
    }

    /// 写入参数块，来源记为 "unknown"
    pub fn set(&mut self, block: &str, params: InputBlock) -> ConfigResult<()> {
        self.set_from(UNKNOWN_PROVENANCE, block, params)
    }

    /// 写入参数块
    ///
    /// # 路由规则
    /// 1. 每个块名在后端只有一个存储（各单元声明已合并）
    /// 2. 已声明的键原地覆盖（后写者胜，不做类型转换）
    /// 3. 未声明的键进入同名回退块
    /// 4. 后端完全未知的块整体进入回退区
    ///
    /// 回退块在第一次写入时创建，来源取第一个写入者；来源不影响合并。
    pub fn set_from(
        &mut self,
        provenance: &str,
        block: &str,
        params: InputBlock,
    ) -> ConfigResult<()> {
        let total = params.len();
        let staged: Vec<(String, ParamValue)> = match self.registry.find_block_mut(block) {
            Some(store) => {
                let mut staged = Vec::new();
                for (key, value) in params {
                    if store.contains(&key) {
                        store.update(&key, value)?;
                    } else {
                        staged.push((key, value));
                    }
                }
                staged
            }
            None => params.into_iter().collect(),
        };

        let staged_count = staged.len();
        if !staged.is_empty() {
            let entry = self
                .fallback
                .entry(block.to_string())
                .or_insert_with(|| FallbackBlock::new(block, provenance));
            for (key, value) in staged {
                entry.params.insert(key, value);
            }
        }

        debug!(
            block = block,
            provenance = provenance,
            routed = total - staged_count,
            staged = staged_count,
            "参数块写入完成"
        );
        Ok(())
    }

    /// 获取指定单元的后端参数块
    pub fn get_data(&self, unit: &str, block: &str) -> ConfigResult<&ParameterStore> {
        self.registry
            .store(unit, block)
            .ok_or_else(|| not_found(unit, block))
    }

    /// 获取指定单元的后端参数块（可写）
    pub fn get_data_mut(&mut self, unit: &str, block: &str) -> ConfigResult<&mut ParameterStore> {
        self.registry
            .store_mut(unit, block)
            .ok_or_else(|| not_found(unit, block))
    }

    /// 读取一个参数块当前已合并的值
    ///
    /// 先看后端存储，再看回退区；两处都没有时返回 NotFound。
    pub fn read(&self, block: &str) -> ConfigResult<BlockView<'_>> {
        let backend = self.registry.find_block(block);
        let fallback = self.fallback.get(block);
        if backend.is_none() && fallback.is_none() {
            return Err(not_found("*", block));
        }
        Ok(BlockView {
            block: block.to_string(),
            backend,
            fallback,
        })
    }

    /// 后端声明的全部参数块（注册顺序）
    pub fn backend_blocks(&self) -> Vec<&ParameterStore> {
        self.registry.stores()
    }

    /// 回退块（首次写入顺序）
    pub fn fallback_blocks(&self) -> impl Iterator<Item = &FallbackBlock> {
        self.fallback.values()
    }

    pub fn fallback(&self, block: &str) -> Option<&FallbackBlock> {
        self.fallback.get(block)
    }

    pub fn registry(&self) -> &dyn UnitRegistry {
        self.registry.as_ref()
    }

    /// 绑定来源，得到交给 export_settings 的写入器
    pub fn writer<'a>(&'a mut self, provenance: &'a str) -> ParamWriter<'a> {
        ParamWriter {
            router: self,
            provenance,
        }
    }
}

impl std::fmt::Debug for ParameterRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterRouter")
            .field("units", &self.registry.unit_names())
            .field("fallback", &self.fallback.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn not_found(unit: &str, block: &str) -> ConfigError {
    ConfigError::NotFound {
        unit: unit.to_string(),
        block: block.to_string(),
    }
}

// ==========================================
// BlockView - 参数块只读视图
// ==========================================
#[derive(Debug)]
pub struct BlockView<'a> {
    block: String,
    backend: Option<&'a ParameterStore>,
    fallback: Option<&'a FallbackBlock>,
}

impl<'a> BlockView<'a> {
    pub fn block(&self) -> &str {
        &self.block
    }

    pub fn get(&self, key: &str) -> Option<&'a ParamValue> {
        self.backend
            .and_then(|s| s.get(key))
            .or_else(|| self.fallback.and_then(|f| f.get(key)))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get_int(&self, key: &str) -> ConfigResult<i64> {
        let value = self.require(key)?;
        value.as_int().ok_or_else(|| self.mismatch(key, "int", value))
    }

    pub fn get_real(&self, key: &str) -> ConfigResult<f64> {
        let value = self.require(key)?;
        value.as_real().ok_or_else(|| self.mismatch(key, "real", value))
    }

    pub fn get_str(&self, key: &str) -> ConfigResult<&'a str> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| self.mismatch(key, "string", value))
    }

    fn require(&self, key: &str) -> ConfigResult<&'a ParamValue> {
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

// ==========================================
// ParamWriter - 绑定来源的路由器
// ==========================================
// 每个节点的 export_settings 都通过它写参数，来源即节点类型名
pub struct ParamWriter<'a> {
    router: &'a mut ParameterRouter,
    provenance: &'a str,
}

impl<'a> ParamWriter<'a> {
    pub fn provenance(&self) -> &str {
        self.provenance
    }

    pub fn set(&mut self, block: &str, params: InputBlock) -> ConfigResult<()> {
        self.router.set_from(self.provenance, block, params)
    }

    pub fn get_data(&self, unit: &str, block: &str) -> ConfigResult<&ParameterStore> {
        self.router.get_data(unit, block)
    }

    pub fn get_data_mut(&mut self, unit: &str, block: &str) -> ConfigResult<&mut ParameterStore> {
        self.router.get_data_mut(unit, block)
    }

    pub fn read(&self, block: &str) -> ConfigResult<BlockView<'_>> {
        self.router.read(block)
    }
}
