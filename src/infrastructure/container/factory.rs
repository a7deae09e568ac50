use super::injector::Injector;
use super::provider::{instantiate, Implements, Injectable};
use crate::errors::ContainerError;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// 类型擦除的服务实例，内部保存的是 `Arc<S>`
pub(crate) type ErasedInstance = Arc<dyn Any + Send + Sync>;

/// 服务工厂trait
pub(crate) trait ServiceFactory: Send + Sync {
    /// 创建服务实例
    fn create(&self, injector: &Injector<'_>) -> Result<ErasedInstance, ContainerError>;

    /// 实现类型名称（用于诊断）
    fn implementation_name(&self) -> &'static str;
}

/// 通过 `Injectable` 初始化器构造实现类型的工厂
pub(crate) struct InjectableFactory<S: ?Sized, I> {
    _phantom: PhantomData<fn() -> (Arc<S>, I)>,
}

impl<S: ?Sized, I> InjectableFactory<S, I> {
    pub(crate) fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<S, I> ServiceFactory for InjectableFactory<S, I>
where
    S: ?Sized + Send + Sync + 'static,
    I: Injectable + Implements<S>,
{
    fn create(&self, injector: &Injector<'_>) -> Result<ErasedInstance, ContainerError> {
        let implementation = instantiate::<I>(injector)?;
        let service: Arc<S> = <I as Implements<S>>::into_service(Arc::new(implementation));
        Ok(Arc::new(service))
    }

    fn implementation_name(&self) -> &'static str {
        std::any::type_name::<I>()
    }
}

/// 函数式服务工厂
pub(crate) struct FnServiceFactory<F, S: ?Sized> {
    factory_fn: F,
    _phantom: PhantomData<fn() -> Arc<S>>,
}

impl<F, S: ?Sized> FnServiceFactory<F, S> {
    pub(crate) fn new(factory_fn: F) -> Self {
        Self {
            factory_fn,
            _phantom: PhantomData,
        }
    }
}

impl<F, S> ServiceFactory for FnServiceFactory<F, S>
where
    F: Fn(&Injector<'_>) -> Result<Arc<S>, ContainerError> + Send + Sync + 'static,
    S: ?Sized + Send + Sync + 'static,
{
    fn create(&self, injector: &Injector<'_>) -> Result<ErasedInstance, ContainerError> {
        let service = (self.factory_fn)(injector)?;
        Ok(Arc::new(service))
    }

    fn implementation_name(&self) -> &'static str {
        std::any::type_name::<F>()
    }
}

/// 将擦除的实例还原为 `Arc<S>`
pub(crate) fn downcast<S>(
    instance: &ErasedInstance,
    context: &'static str,
) -> Result<Arc<S>, ContainerError>
where
    S: ?Sized + Send + Sync + 'static,
{
    instance
        .downcast_ref::<Arc<S>>()
        .cloned()
        .ok_or(ContainerError::TypeCastFailed {
            expected: std::any::type_name::<S>(),
            context,
        })
}
