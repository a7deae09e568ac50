use crate::infrastructure::container::ServiceLifetime;
use thiserror::Error;

/// 容器错误
///
/// 注册与解析过程中的所有失败都以该类型同步返回给调用方，容器内部不会重试或吞掉错误。
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 同一服务标识被同时注册为瞬态和单例
    #[error("Service '{service}' is already registered as a {existing} service and cannot be registered as {requested}")]
    ConflictingLifetime {
        service: &'static str,
        existing: ServiceLifetime,
        requested: ServiceLifetime,
    },

    /// 在请求的键及其默认键下都没有找到注册
    #[error("No registration for '{service}' was found (key '{key}')")]
    UnregisteredService { service: &'static str, key: String },

    /// 实现类型没有公开的初始化器
    #[error("No public initializer found for '{implementation}'")]
    NoPublicInitializer { implementation: &'static str },

    /// 实现类型存在多个公开初始化器，无法确定使用哪一个
    #[error("Ambiguous initializers for '{implementation}': {}", .candidates.join(", "))]
    AmbiguousInitializer {
        implementation: &'static str,
        candidates: Vec<&'static str>,
    },

    /// 循环依赖
    #[error("Circular dependency detected: {}", .chain.join(" -> "))]
    CyclicDependency { chain: Vec<&'static str> },

    /// 解析链超过配置的最大深度
    #[error("Resolution depth limit {limit} exceeded while resolving '{service}'")]
    DepthLimitExceeded { service: &'static str, limit: usize },

    /// 类型擦除后的实例无法还原为请求的类型
    #[error("Type cast failed: expected '{expected}' in {context}")]
    TypeCastFailed {
        expected: &'static str,
        context: &'static str,
    },

    /// 用户提供的工厂报告失败
    #[error("Failed to create service '{service}': {reason}")]
    CreationFailed { service: &'static str, reason: String },
}

impl ContainerError {
    /// 由工厂闭包构造创建失败错误的便捷方法
    pub fn creation_failed<S: ?Sized>(reason: impl Into<String>) -> Self {
        ContainerError::CreationFailed {
            service: std::any::type_name::<S>(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}
