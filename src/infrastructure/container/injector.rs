//! 解析上下文
//!
//! 一次顶层解析（或一次单例的提前构造）对应一个 `Injector`。它携带调用方的变体键，
//! 使整棵依赖子树都按同一个键解析，并记录当前调用链上正在构造的服务标识，
//! 用于检测循环依赖。

use super::factory::downcast;
use super::identity::ServiceIdentity;
use super::registry::{Resolved, ServiceContainer};
use crate::errors::ContainerError;
use std::cell::RefCell;
use std::sync::Arc;

pub struct Injector<'a> {
    container: &'a ServiceContainer,
    key: &'a str,
    chain: RefCell<Vec<ServiceIdentity>>,
}

impl<'a> Injector<'a> {
    pub(crate) fn new(container: &'a ServiceContainer, key: &'a str) -> Self {
        Self {
            container,
            key,
            chain: RefCell::new(Vec::new()),
        }
    }

    /// 本次解析使用的变体键
    pub fn key(&self) -> &str {
        self.key
    }

    /// 按本次解析的键解析一个依赖
    pub fn resolve<S>(&self) -> Result<Arc<S>, ContainerError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let identity = ServiceIdentity::of::<S>();
        match self.container.lookup(identity, self.key)? {
            Resolved::Singleton(instance) => downcast::<S>(&instance, "singleton lookup"),
            Resolved::Transient(factory) => {
                let _frame = self.enter(identity)?;
                let instance = factory.create(self)?;
                downcast::<S>(&instance, "transient creation")
            }
        }
    }

    fn enter(&self, identity: ServiceIdentity) -> Result<ChainFrame<'_>, ContainerError> {
        let mut chain = self.chain.borrow_mut();

        if chain.contains(&identity) {
            let mut cycle: Vec<&'static str> = chain.iter().map(ServiceIdentity::name).collect();
            cycle.push(identity.name());
            return Err(ContainerError::CyclicDependency { chain: cycle });
        }

        let limit = self.container.max_resolution_depth();
        if chain.len() >= limit {
            return Err(ContainerError::DepthLimitExceeded {
                service: identity.name(),
                limit,
            });
        }

        chain.push(identity);
        Ok(ChainFrame { chain: &self.chain })
    }
}

/// 离开作用域时弹出调用链上的一帧，失败路径同样生效
struct ChainFrame<'c> {
    chain: &'c RefCell<Vec<ServiceIdentity>>,
}

impl Drop for ChainFrame<'_> {
    fn drop(&mut self) {
        self.chain.borrow_mut().pop();
    }
}
