use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 服务标识
///
/// 请求依赖时使用的声明类型（通常是 `dyn Trait`）。只按 `TypeId` 比较，
/// 类型名仅用于错误信息与日志。
#[derive(Clone, Copy)]
pub struct ServiceIdentity {
    type_id: TypeId,
    type_name: &'static str,
}

impl ServiceIdentity {
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<S>(),
            type_name: std::any::type_name::<S>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for ServiceIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ServiceIdentity {}

impl Hash for ServiceIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceIdentity").field(&self.type_name).finish()
    }
}

impl fmt::Display for ServiceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
