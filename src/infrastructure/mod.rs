//! 基础设施层
//!
//! 提供依赖注入容器：服务注册、键控变体与递归解析。

// 容器实现
pub mod container;

// 重新导出API
pub use container::{
    ContainerStats, Implements, Initializer, Injectable, Injector, ServiceContainer,
    ServiceDescriptor, ServiceIdentity, ServiceLifetime, DEFAULT_KEY,
};
