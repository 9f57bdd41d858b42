// ==========================================
// Kamayan 配置层 - 配置节点 Trait
// ==========================================
// 每个配置对象（网格、时间推进、物理模块、输出、用户扩展）
// 都实现 ConfigNode，并通过 export_settings 把自己的设置写进路由器
// ==========================================

use std::any::Any;

use crate::error::{ConfigError, ConfigResult};
use crate::params::ParamWriter;

/// 向下转型辅助（ConfigNode 的超 trait）
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ==========================================
// ConfigNode Trait
// ==========================================
pub trait ConfigNode: AsAny {
    /// 具体类型的短名（去掉模块路径），同时用作参数来源
    fn type_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// 把本节点的设置写入路由器
    ///
    /// 未覆盖时返回 NotImplemented，并带上具体类型名。
    fn export_settings(&self, writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        let _ = writer;
        Err(ConfigError::NotImplemented {
            type_name: self.type_name().to_string(),
        })
    }
}

/// 配置树根节点，本身不写任何参数
#[derive(Debug, Default)]
pub struct RootNode;

impl ConfigNode for RootNode {
    fn export_settings(&self, _writer: &mut ParamWriter<'_>) -> ConfigResult<()> {
        Ok(())
    }
}

/// 去掉模块路径和泛型参数: `kamayan_config::code_units::Grid` → `Grid`
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

pub(crate) fn downcast_ref<T: ConfigNode>(node: &dyn ConfigNode) -> Option<&T> {
    AsAny::as_any(node).downcast_ref::<T>()
}

pub(crate) fn downcast_mut<T: ConfigNode>(node: &mut dyn ConfigNode) -> Option<&mut T> {
    AsAny::as_any_mut(node).downcast_mut::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;
    impl ConfigNode for Bare {}

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Grid"), "Grid");
        assert_eq!(short_type_name("Grid"), "Grid");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
    }

    #[test]
    fn test_type_name_uses_concrete_type() {
        let node: Box<dyn ConfigNode> = Box::new(Bare);
        assert_eq!(node.type_name(), "Bare");
        assert!(downcast_ref::<Bare>(node.as_ref()).is_some());
        assert!(downcast_ref::<RootNode>(node.as_ref()).is_none());
    }
}
