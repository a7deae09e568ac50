//! 实现类型的构造协议
//!
//! 没有运行时反射，实现类型通过 [`Injectable`] 显式声明自己的公开初始化器，
//! 初始化器从 [`Injector`] 中按需取出依赖并构造实例。

use super::injector::Injector;
use crate::errors::ContainerError;
use std::sync::Arc;

/// 初始化器函数签名
pub type InitializerFn<T> = fn(&Injector<'_>) -> Result<T, ContainerError>;

/// 一个公开初始化器（主构造函数）
pub struct Initializer<T> {
    name: &'static str,
    build: InitializerFn<T>,
}

impl<T> Initializer<T> {
    pub fn new(name: &'static str, build: InitializerFn<T>) -> Self {
        Self { name, build }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn invoke(&self, injector: &Injector<'_>) -> Result<T, ContainerError> {
        (self.build)(injector)
    }
}

/// 可由容器构造的实现类型
pub trait Injectable: Sized + Send + Sync + 'static {
    /// 该类型公开的初始化器。必须恰好一个。
    fn initializers() -> Vec<Initializer<Self>>;
}

/// 实现类型到服务类型的转换
///
/// `Arc<I>` 到 `Arc<dyn Trait>` 的非定长转换无法写成泛型约束，
/// 因此由实现方（通常借助 [`implements!`](crate::implements)）显式提供。
pub trait Implements<S: ?Sized>: Sized {
    fn into_service(self: Arc<Self>) -> Arc<S>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn into_service(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// 选择主初始化器并执行
pub(crate) fn instantiate<I: Injectable>(injector: &Injector<'_>) -> Result<I, ContainerError> {
    let mut initializers = I::initializers();
    match initializers.len() {
        0 => Err(ContainerError::NoPublicInitializer {
            implementation: std::any::type_name::<I>(),
        }),
        1 => {
            let initializer = initializers.remove(0);
            tracing::trace!(
                implementation = std::any::type_name::<I>(),
                initializer = initializer.name(),
                key = injector.key(),
                "Invoking initializer"
            );
            initializer.invoke(injector)
        }
        _ => Err(ContainerError::AmbiguousInitializer {
            implementation: std::any::type_name::<I>(),
            candidates: initializers.iter().map(Initializer::name).collect(),
        }),
    }
}

/// 声明实现类型满足哪些服务类型
///
/// ```ignore
/// implements!(ConsoleLogger => dyn Logger);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($service:ty),+ $(,)?) => {
        $(
            impl $crate::infrastructure::container::Implements<$service> for $implementation {
                fn into_service(
                    self: ::std::sync::Arc<Self>,
                ) -> ::std::sync::Arc<$service> {
                    self
                }
            }
        )+
    };
}

/// 为只有一个初始化器的类型实现 `Injectable`
#[macro_export]
macro_rules! injectable {
    ($implementation:ty, $build:expr) => {
        impl $crate::infrastructure::container::Injectable for $implementation {
            fn initializers(
            ) -> ::std::vec::Vec<$crate::infrastructure::container::Initializer<Self>> {
                ::std::vec![$crate::infrastructure::container::Initializer::new(
                    ::std::stringify!($implementation),
                    $build,
                )]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::container::ServiceContainer;

    struct NoInit;

    impl Injectable for NoInit {
        fn initializers() -> Vec<Initializer<Self>> {
            Vec::new()
        }
    }

    struct TwoInits;

    impl Injectable for TwoInits {
        fn initializers() -> Vec<Initializer<Self>> {
            vec![
                Initializer::new("new", |_| Ok(TwoInits)),
                Initializer::new("with_defaults", |_| Ok(TwoInits)),
            ]
        }
    }

    #[derive(Debug)]
    struct Answer(u32);

    crate::injectable!(Answer, |_| Ok(Answer(42)));

    #[test]
    fn test_no_initializer() {
        let container = ServiceContainer::new();
        let injector = Injector::new(&container, "default");
        let result = instantiate::<NoInit>(&injector);
        assert!(matches!(result, Err(ContainerError::NoPublicInitializer { .. })));
    }

    #[test]
    fn test_ambiguous_initializers_are_listed() {
        let container = ServiceContainer::new();
        let injector = Injector::new(&container, "default");
        match instantiate::<TwoInits>(&injector) {
            Err(ContainerError::AmbiguousInitializer { candidates, .. }) => {
                assert_eq!(candidates, vec!["new", "with_defaults"]);
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_single_initializer_runs() {
        let container = ServiceContainer::new();
        let injector = Injector::new(&container, "default");
        let answer = instantiate::<Answer>(&injector).unwrap();
        assert_eq!(answer.0, 42);
    }
}
