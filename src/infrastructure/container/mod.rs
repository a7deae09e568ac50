//! 依赖注入容器
//!
//! 按 (服务标识, 变体键) 维护瞬态工厂与单例实例两张注册表，
//! 并通过 [`Injector`] 递归解析实现类型的构造依赖。

mod factory;
pub mod identity;
pub mod injector;
pub mod provider;
pub mod registry;

pub use identity::ServiceIdentity;
pub use injector::Injector;
pub use provider::{Implements, Initializer, Injectable};
pub use registry::{ContainerStats, ServiceContainer, ServiceDescriptor};

use std::fmt;

/// 调用方省略变体键时使用的键
pub const DEFAULT_KEY: &str = "default";

/// 服务生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServiceLifetime {
    /// 每次解析都创建新实例
    Transient,
    /// 注册时创建一次，容器生命周期内共享
    Singleton,
}

impl fmt::Display for ServiceLifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceLifetime::Transient => f.write_str("transient"),
            ServiceLifetime::Singleton => f.write_str("singleton"),
        }
    }
}
