//! 键控服务容器
//!
//! 两张注册表（瞬态工厂、单例实例）放在同一把读写锁后面。
//! 执行用户工厂或初始化器时从不持锁，递归解析因此不会死锁。

use super::factory::{ErasedInstance, FnServiceFactory, InjectableFactory, ServiceFactory};
use super::identity::ServiceIdentity;
use super::injector::Injector;
use super::provider::{Implements, Injectable};
use super::{ServiceLifetime, DEFAULT_KEY};
use crate::config::ContainerConfig;
use crate::errors::ContainerError;
use crate::logging::OperationTimer;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// 瞬态注册：每次解析都调用工厂
struct TransientRegistration {
    factory: Arc<dyn ServiceFactory>,
}

/// 单例注册：注册时已构造好的实例
struct SingletonRegistration {
    instance: ErasedInstance,
    implementation: &'static str,
}

/// 注册表
///
/// 同一服务标识只能出现在其中一张表里（不论键），在注册时检查。
#[derive(Default)]
struct Registry {
    transients: HashMap<ServiceIdentity, HashMap<String, TransientRegistration>>,
    singletons: HashMap<ServiceIdentity, HashMap<String, SingletonRegistration>>,
}

impl Registry {
    fn lifetime_of(&self, identity: &ServiceIdentity) -> Option<ServiceLifetime> {
        if self.singletons.contains_key(identity) {
            Some(ServiceLifetime::Singleton)
        } else if self.transients.contains_key(identity) {
            Some(ServiceLifetime::Transient)
        } else {
            None
        }
    }

    fn ensure_lifetime(
        &self,
        identity: &ServiceIdentity,
        requested: ServiceLifetime,
    ) -> Result<(), ContainerError> {
        match self.lifetime_of(identity) {
            Some(existing) if existing != requested => Err(ContainerError::ConflictingLifetime {
                service: identity.name(),
                existing,
                requested,
            }),
            _ => Ok(()),
        }
    }
}

/// 先按请求的键查找，再回退到默认键。返回值中的布尔值表示是否发生了回退。
fn select<'r, R>(variants: &'r HashMap<String, R>, key: &str) -> Option<(&'r R, bool)> {
    variants
        .get(key)
        .map(|registration| (registration, false))
        .or_else(|| {
            variants
                .get(DEFAULT_KEY)
                .map(|registration| (registration, key != DEFAULT_KEY))
        })
}

/// 查找结果，持锁期间克隆出来，释放锁之后再使用
pub(crate) enum Resolved {
    Singleton(ErasedInstance),
    Transient(Arc<dyn ServiceFactory>),
}

/// 已注册服务的描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub service: &'static str,
    pub key: String,
    pub lifetime: ServiceLifetime,
    pub implementation: &'static str,
}

/// 服务容器
#[derive(Clone)]
pub struct ServiceContainer {
    registry: Arc<RwLock<Registry>>,
    stats: Arc<InnerStats>,
    config: Arc<ContainerConfig>,
}

/// 内部容器统计信息（原子计数器）
#[derive(Default)]
struct InnerStats {
    lookups: AtomicUsize,
    singleton_hits: AtomicUsize,
    transient_creations: AtomicUsize,
    key_fallbacks: AtomicUsize,
    failed_resolutions: AtomicUsize,
}

impl ServiceContainer {
    /// 创建使用默认配置的空容器
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry::default())),
            stats: Arc::new(InnerStats::default()),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub(crate) fn max_resolution_depth(&self) -> usize {
        self.config.max_resolution_depth
    }

    /// 注册瞬态服务（默认键）
    pub fn register_transient<S, I>(&self) -> Result<(), ContainerError>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        self.register_transient_keyed::<S, I>(DEFAULT_KEY)
    }

    /// 注册瞬态服务。同一 (服务, 键) 重复注册时后者覆盖前者。
    pub fn register_transient_keyed<S, I>(&self, key: impl Into<String>) -> Result<(), ContainerError>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        self.insert_transient(
            ServiceIdentity::of::<S>(),
            key.into(),
            Arc::new(InjectableFactory::<S, I>::new()),
        )
    }

    /// 以工厂闭包注册瞬态服务
    pub fn register_transient_factory<S, F>(
        &self,
        key: impl Into<String>,
        factory: F,
    ) -> Result<(), ContainerError>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Injector<'_>) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static,
    {
        self.insert_transient(
            ServiceIdentity::of::<S>(),
            key.into(),
            Arc::new(FnServiceFactory::<F, S>::new(factory)),
        )
    }

    /// 注册单例服务（默认键）
    pub fn register_singleton<S, I>(&self) -> Result<(), ContainerError>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        self.register_singleton_keyed::<S, I>(DEFAULT_KEY)
    }

    /// 注册单例服务
    ///
    /// 实例在本次调用中立即构造，其依赖按同一个键解析。构造失败时不会留下任何注册。
    pub fn register_singleton_keyed<S, I>(&self, key: impl Into<String>) -> Result<(), ContainerError>
    where
        S: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<S>,
    {
        self.insert_singleton(
            ServiceIdentity::of::<S>(),
            key.into(),
            &InjectableFactory::<S, I>::new(),
        )
    }

    /// 以工厂闭包注册单例服务，闭包只在注册时调用一次
    pub fn register_singleton_factory<S, F>(
        &self,
        key: impl Into<String>,
        factory: F,
    ) -> Result<(), ContainerError>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&Injector<'_>) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static,
    {
        self.insert_singleton(
            ServiceIdentity::of::<S>(),
            key.into(),
            &FnServiceFactory::<F, S>::new(factory),
        )
    }

    /// 注册一个已经构造好的单例实例
    pub fn register_singleton_instance<S>(
        &self,
        key: impl Into<String>,
        instance: Arc<S>,
    ) -> Result<(), ContainerError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let identity = ServiceIdentity::of::<S>();
        self.registry
            .read()
            .ensure_lifetime(&identity, ServiceLifetime::Singleton)?;
        self.store_singleton(identity, key.into(), Arc::new(instance), std::any::type_name::<S>())
    }

    fn insert_transient(
        &self,
        identity: ServiceIdentity,
        key: String,
        factory: Arc<dyn ServiceFactory>,
    ) -> Result<(), ContainerError> {
        let implementation = factory.implementation_name();
        let replaced = {
            let mut registry = self.registry.write();
            registry.ensure_lifetime(&identity, ServiceLifetime::Transient)?;
            registry
                .transients
                .entry(identity)
                .or_default()
                .insert(key.clone(), TransientRegistration { factory })
                .is_some()
        };

        tracing::debug!(
            service = identity.name(),
            key = %key,
            implementation,
            replaced,
            "Registered transient service"
        );
        Ok(())
    }

    fn insert_singleton(
        &self,
        identity: ServiceIdentity,
        key: String,
        factory: &dyn ServiceFactory,
    ) -> Result<(), ContainerError> {
        // 先检查一次，避免无谓地构造实例；写入时还会在写锁下再检查
        self.registry
            .read()
            .ensure_lifetime(&identity, ServiceLifetime::Singleton)?;

        let timer = OperationTimer::new("singleton_construction")
            .with_metadata("service", identity.name())
            .with_metadata("key", &key);
        let instance = {
            let injector = Injector::new(self, &key);
            factory.create(&injector)?
        };
        timer.finish();

        self.store_singleton(identity, key, instance, factory.implementation_name())
    }

    fn store_singleton(
        &self,
        identity: ServiceIdentity,
        key: String,
        instance: ErasedInstance,
        implementation: &'static str,
    ) -> Result<(), ContainerError> {
        let previous = {
            let mut registry = self.registry.write();
            registry.ensure_lifetime(&identity, ServiceLifetime::Singleton)?;
            registry.singletons.entry(identity).or_default().insert(
                key.clone(),
                SingletonRegistration {
                    instance,
                    implementation,
                },
            )
        };

        tracing::debug!(
            service = identity.name(),
            key = %key,
            implementation,
            replaced = previous.is_some(),
            "Registered singleton service"
        );
        // 被替换的实例在锁外释放
        drop(previous);
        Ok(())
    }

    /// 解析服务（默认键）
    pub fn resolve<S>(&self) -> Result<Arc<S>, ContainerError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.resolve_keyed::<S>(DEFAULT_KEY)
    }

    /// 按变体键解析服务，整棵依赖子树都使用同一个键
    pub fn resolve_keyed<S>(&self, key: &str) -> Result<Arc<S>, ContainerError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let injector = Injector::new(self, key);
        let result = injector.resolve::<S>();
        if let Err(err) = &result {
            self.stats.failed_resolutions.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(service = std::any::type_name::<S>(), key, error = %err, "Resolution failed");
        }
        result
    }

    pub(crate) fn lookup(&self, identity: ServiceIdentity, key: &str) -> Result<Resolved, ContainerError> {
        self.stats.lookups.fetch_add(1, Ordering::Relaxed);
        let registry = self.registry.read();

        if let Some((registration, fell_back)) =
            registry.singletons.get(&identity).and_then(|variants| select(variants, key))
        {
            self.stats.singleton_hits.fetch_add(1, Ordering::Relaxed);
            self.note_fallback(identity, key, fell_back);
            return Ok(Resolved::Singleton(registration.instance.clone()));
        }

        if let Some((registration, fell_back)) =
            registry.transients.get(&identity).and_then(|variants| select(variants, key))
        {
            self.stats.transient_creations.fetch_add(1, Ordering::Relaxed);
            self.note_fallback(identity, key, fell_back);
            return Ok(Resolved::Transient(registration.factory.clone()));
        }

        Err(ContainerError::UnregisteredService {
            service: identity.name(),
            key: key.to_string(),
        })
    }

    fn note_fallback(&self, identity: ServiceIdentity, key: &str, fell_back: bool) {
        if fell_back {
            self.stats.key_fallbacks.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(service = identity.name(), key, "Falling back to default key");
        }
    }

    /// 检查服务是否已注册（任意键）
    pub fn is_registered<S: ?Sized + 'static>(&self) -> bool {
        self.lifetime_of::<S>().is_some()
    }

    /// 服务当前注册的生命周期
    pub fn lifetime_of<S: ?Sized + 'static>(&self) -> Option<ServiceLifetime> {
        self.registry.read().lifetime_of(&ServiceIdentity::of::<S>())
    }

    /// 列出所有注册，按服务名和键排序
    pub fn registered_services(&self) -> Vec<ServiceDescriptor> {
        let registry = self.registry.read();
        let transients = registry.transients.iter().flat_map(|(identity, variants)| {
            variants.iter().map(move |(key, registration)| ServiceDescriptor {
                service: identity.name(),
                key: key.clone(),
                lifetime: ServiceLifetime::Transient,
                implementation: registration.factory.implementation_name(),
            })
        });
        let singletons = registry.singletons.iter().flat_map(|(identity, variants)| {
            variants.iter().map(move |(key, registration)| ServiceDescriptor {
                service: identity.name(),
                key: key.clone(),
                lifetime: ServiceLifetime::Singleton,
                implementation: registration.implementation,
            })
        });

        let mut descriptors: Vec<ServiceDescriptor> = transients.chain(singletons).collect();
        descriptors.sort_by(|a, b| a.service.cmp(b.service).then_with(|| a.key.cmp(&b.key)));
        descriptors
    }

    /// 获取容器统计信息
    pub fn get_stats(&self) -> ContainerStats {
        ContainerStats {
            lookups: self.stats.lookups.load(Ordering::Relaxed),
            singleton_hits: self.stats.singleton_hits.load(Ordering::Relaxed),
            transient_creations: self.stats.transient_creations.load(Ordering::Relaxed),
            key_fallbacks: self.stats.key_fallbacks.load(Ordering::Relaxed),
            failed_resolutions: self.stats.failed_resolutions.load(Ordering::Relaxed),
        }
    }

    /// 重置统计信息
    pub fn reset_stats(&self) {
        self.stats.lookups.store(0, Ordering::Relaxed);
        self.stats.singleton_hits.store(0, Ordering::Relaxed);
        self.stats.transient_creations.store(0, Ordering::Relaxed);
        self.stats.key_fallbacks.store(0, Ordering::Relaxed);
        self.stats.failed_resolutions.store(0, Ordering::Relaxed);
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// 容器统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerStats {
    /// 注册表查找次数（包含递归解析中的查找）
    pub lookups: usize,
    pub singleton_hits: usize,
    pub transient_creations: usize,
    /// 回退到默认键的次数
    pub key_fallbacks: usize,
    /// 失败的顶层解析次数
    pub failed_resolutions: usize,
}

impl ContainerStats {
    /// 单例命中率
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.singleton_hits as f64 / self.lookups as f64
        }
    }
}
