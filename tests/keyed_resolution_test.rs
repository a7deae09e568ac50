//! 变体键解析与循环依赖的集成测试

use keyed_di::{
    implements, injectable, ContainerConfig, ContainerError, ServiceContainer, DEFAULT_KEY,
};
use std::sync::Arc;

trait Storage: Send + Sync {
    fn backend(&self) -> &'static str;
}

trait Repository: Send + Sync {
    fn storage(&self) -> &Arc<dyn Storage>;
}

struct DiskStorage;
struct MemoryStorage;

impl Storage for DiskStorage {
    fn backend(&self) -> &'static str {
        "disk"
    }
}

impl Storage for MemoryStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }
}

struct UserRepository {
    storage: Arc<dyn Storage>,
}

impl Repository for UserRepository {
    fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}

injectable!(DiskStorage, |_| Ok(DiskStorage));
injectable!(MemoryStorage, |_| Ok(MemoryStorage));
injectable!(UserRepository, |injector| Ok(UserRepository {
    storage: injector.resolve::<dyn Storage>()?,
}));
implements!(DiskStorage => dyn Storage);
implements!(MemoryStorage => dyn Storage);
implements!(UserRepository => dyn Repository);

#[test]
fn test_key_propagates_through_subtree() {
    let container = ServiceContainer::new();
    container.register_transient::<dyn Storage, DiskStorage>().unwrap();
    container
        .register_transient_keyed::<dyn Storage, MemoryStorage>("test")
        .unwrap();
    // Repository 只有默认注册，但其依赖按调用方的键解析
    container.register_transient::<dyn Repository, UserRepository>().unwrap();

    let production = container.resolve::<dyn Repository>().unwrap();
    let test = container.resolve_keyed::<dyn Repository>("test").unwrap();

    assert_eq!(production.storage().backend(), "disk");
    assert_eq!(test.storage().backend(), "memory");
}

#[test]
fn test_singleton_dependencies_use_registration_key() {
    let container = ServiceContainer::new();
    container.register_transient::<dyn Storage, DiskStorage>().unwrap();
    container
        .register_transient_keyed::<dyn Storage, MemoryStorage>("test")
        .unwrap();
    container
        .register_singleton_keyed::<dyn Repository, UserRepository>("test")
        .unwrap();

    let repository = container.resolve_keyed::<dyn Repository>("test").unwrap();
    assert_eq!(repository.storage().backend(), "memory");
}

#[test]
fn test_default_singleton_serves_every_key() {
    let container = ServiceContainer::new();
    container.register_singleton::<dyn Storage, DiskStorage>().unwrap();

    let default = container.resolve::<dyn Storage>().unwrap();
    for key in ["test", "staging", ""] {
        let other = container.resolve_keyed::<dyn Storage>(key).unwrap();
        assert!(Arc::ptr_eq(&default, &other));
    }
    assert_eq!(container.get_stats().key_fallbacks, 3);
}

#[test]
fn test_no_fallback_without_default() {
    let container = ServiceContainer::new();
    container
        .register_singleton_keyed::<dyn Storage, MemoryStorage>("test")
        .unwrap();

    assert!(container.resolve_keyed::<dyn Storage>("test").is_ok());
    match container.resolve::<dyn Storage>() {
        Err(ContainerError::UnregisteredService { key, .. }) => assert_eq!(key, DEFAULT_KEY),
        other => panic!("unexpected result: {:?}", other.err()),
    }
    assert!(container.resolve_keyed::<dyn Storage>("staging").is_err());
}

// 互相依赖的两个服务
trait Ping: Send + Sync {}
trait Pong: Send + Sync {}

struct PingImpl {
    _pong: Arc<dyn Pong>,
}
struct PongImpl {
    _ping: Arc<dyn Ping>,
}

impl Ping for PingImpl {}
impl Pong for PongImpl {}

injectable!(PingImpl, |injector| Ok(PingImpl {
    _pong: injector.resolve::<dyn Pong>()?,
}));
injectable!(PongImpl, |injector| Ok(PongImpl {
    _ping: injector.resolve::<dyn Ping>()?,
}));
implements!(PingImpl => dyn Ping);
implements!(PongImpl => dyn Pong);

#[test]
fn test_cycle_is_reported() {
    let container = ServiceContainer::new();
    container.register_transient::<dyn Ping, PingImpl>().unwrap();
    container.register_transient::<dyn Pong, PongImpl>().unwrap();

    match container.resolve::<dyn Ping>() {
        Err(ContainerError::CyclicDependency { chain }) => {
            assert_eq!(chain.len(), 3);
            assert!(chain[0].contains("Ping"));
            assert!(chain[1].contains("Pong"));
            assert!(chain[2].contains("Ping"));
        }
        other => panic!("unexpected result: {:?}", other.err()),
    }

    // 失败后容器仍然可用
    container.register_transient::<dyn Storage, DiskStorage>().unwrap();
    assert!(container.resolve::<dyn Storage>().is_ok());
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let container = ServiceContainer::new();
    container
        .register_transient_factory::<dyn Storage, _>(DEFAULT_KEY, |injector| {
            injector.resolve::<dyn Storage>()
        })
        .unwrap();

    assert!(matches!(
        container.resolve::<dyn Storage>(),
        Err(ContainerError::CyclicDependency { chain }) if chain.len() == 2
    ));
}

#[test]
fn test_depth_limit() {
    let config = ContainerConfig {
        max_resolution_depth: 1,
        ..ContainerConfig::default()
    };
    let container = ServiceContainer::with_config(config);
    container.register_transient::<dyn Storage, DiskStorage>().unwrap();
    container.register_transient::<dyn Repository, UserRepository>().unwrap();

    assert!(container.resolve::<dyn Storage>().is_ok());
    assert!(matches!(
        container.resolve::<dyn Repository>(),
        Err(ContainerError::DepthLimitExceeded { limit: 1, .. })
    ));
}

#[test]
fn test_injector_exposes_key() {
    let container = ServiceContainer::new();
    container
        .register_transient_factory::<String, _>(DEFAULT_KEY, |injector| {
            Ok(Arc::new(format!("built for {}", injector.key())))
        })
        .unwrap();

    assert_eq!(
        container.resolve_keyed::<String>("staging").unwrap().as_str(),
        "built for staging"
    );
}
