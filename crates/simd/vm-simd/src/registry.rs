//! Late-bound intrinsic registry
//!
//! 按 (类名, 方法名, 参数类型) 注册可调用对象，调用方在运行时查找并以装箱参数
//! 调用，返回装箱结果。语义与直接调用完全一致：注册的闭包内部就是直接调用。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::avx::Avx;
use crate::error::SimdError;
use crate::lane::{Lane, LaneKind};
use crate::vector::{VECTOR256_BYTES, Vector256};

/// 参数/返回值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeTag {
    Vector256(LaneKind),
    Bool,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Vector256(kind) => write!(f, "Vector256<{}>", kind),
            TypeTag::Bool => f.write_str("bool"),
        }
    }
}

/// 装箱值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    Vector256 {
        kind: LaneKind,
        bytes: [u8; VECTOR256_BYTES],
    },
    Bool(bool),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Vector256 { kind, .. } => TypeTag::Vector256(*kind),
            Value::Bool(_) => TypeTag::Bool,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            Value::Vector256 { .. } => None,
        }
    }

    /// lane 类型一致时拆箱为向量
    pub fn to_vector<T: Lane>(&self) -> Option<Vector256<T>> {
        match self {
            Value::Vector256 { kind, bytes } if *kind == T::KIND => Some(Vector256::from_bytes(*bytes)),
            _ => None,
        }
    }
}

impl<T: Lane> From<Vector256<T>> for Value {
    fn from(vector: Vector256<T>) -> Self {
        Value::Vector256 {
            kind: T::KIND,
            bytes: *vector.as_bytes(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// 方法签名（查找键）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub class: String,
    pub name: String,
    pub params: Vec<TypeTag>,
}

impl MethodKey {
    pub fn new(class: impl Into<String>, name: impl Into<String>, params: &[TypeTag]) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            params: params.to_vec(),
        }
    }
}

/// `Avx::test_z(Vector256<u16>, Vector256<u16>)`
impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.class, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        f.write_str(")")
    }
}

type Invoker = Arc<dyn Fn(&[Value]) -> Result<Value, SimdError> + Send + Sync>;

/// 已解析的方法
#[derive(Clone)]
pub struct MethodHandle {
    key: MethodKey,
    return_type: TypeTag,
    invoker: Invoker,
}

impl MethodHandle {
    pub fn key(&self) -> &MethodKey {
        &self.key
    }

    pub fn return_type(&self) -> TypeTag {
        self.return_type
    }

    /// 以装箱参数调用；参数个数或类型与签名不符时返回 `SimdError::ArgumentMismatch`
    pub fn invoke(&self, args: &[Value]) -> Result<Value, SimdError> {
        if args.len() != self.key.params.len() {
            return Err(self.mismatch(format!(
                "expected {} arguments, got {}",
                self.key.params.len(),
                args.len()
            )));
        }

        for (index, (arg, expected)) in args.iter().zip(&self.key.params).enumerate() {
            if arg.type_tag() != *expected {
                return Err(self.mismatch(format!(
                    "argument {} is {}, expected {}",
                    index,
                    arg.type_tag(),
                    expected
                )));
            }
        }

        (self.invoker)(args)
    }

    fn mismatch(&self, message: String) -> SimdError {
        SimdError::ArgumentMismatch {
            method: self.key.to_string(),
            message,
        }
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHandle")
            .field("key", &self.key)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// 方法注册表
#[derive(Debug, Clone, Default)]
pub struct IntrinsicRegistry {
    methods: HashMap<MethodKey, MethodHandle>,
}

impl IntrinsicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 `Avx::test_z` 的全部 lane 类型重载
    pub fn with_avx(avx: Avx) -> Self {
        let mut registry = Self::new();
        registry.register_avx(avx);
        registry
    }

    pub fn register_avx(&mut self, avx: Avx) {
        self.register_test_z::<u8>(avx);
        self.register_test_z::<i8>(avx);
        self.register_test_z::<u16>(avx);
        self.register_test_z::<i16>(avx);
        self.register_test_z::<u32>(avx);
        self.register_test_z::<i32>(avx);
        self.register_test_z::<u64>(avx);
        self.register_test_z::<i64>(avx);
    }

    fn register_test_z<T: Lane>(&mut self, avx: Avx) {
        let vector = TypeTag::Vector256(T::KIND);
        let key = MethodKey::new(Avx::NAME, Avx::TEST_Z, &[vector, vector]);
        self.register(key, TypeTag::Bool, move |args: &[Value]| {
            let left = unbox::<T>(args, 0)?;
            let right = unbox::<T>(args, 1)?;
            avx.test_z(left, right).map(Value::Bool)
        });
    }

    /// 注册（或替换）一个方法，返回被替换的旧句柄
    pub fn register<F>(&mut self, key: MethodKey, return_type: TypeTag, invoker: F) -> Option<MethodHandle>
    where
        F: Fn(&[Value]) -> Result<Value, SimdError> + Send + Sync + 'static,
    {
        log::trace!("Registering {} -> {}", key, return_type);
        let handle = MethodHandle {
            key: key.clone(),
            return_type,
            invoker: Arc::new(invoker),
        };
        self.methods.insert(key, handle)
    }

    /// 按名称和参数类型查找
    pub fn get_method(&self, class: &str, name: &str, params: &[TypeTag]) -> Option<&MethodHandle> {
        self.methods.get(&MethodKey::new(class, name, params))
    }

    pub fn contains(&self, key: &MethodKey) -> bool {
        self.methods.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

fn unbox<T: Lane>(args: &[Value], index: usize) -> Result<Vector256<T>, SimdError> {
    args.get(index)
        .and_then(Value::to_vector::<T>)
        .ok_or_else(|| SimdError::ArgumentMismatch {
            method: format!("{}::{}", Avx::NAME, Avx::TEST_Z),
            message: format!("argument {} is not a Vector256<{}>", index, T::KIND),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vm_accel::SimdCapabilities;

    fn u16_pair() -> [TypeTag; 2] {
        [TypeTag::Vector256(LaneKind::U16); 2]
    }

    #[test]
    fn test_avx_registers_every_lane_kind() {
        let registry = IntrinsicRegistry::with_avx(Avx::detect());
        assert_eq!(registry.len(), LaneKind::ALL.len());

        for kind in LaneKind::ALL {
            let params = [TypeTag::Vector256(kind); 2];
            let method = registry.get_method("Avx", "test_z", &params).unwrap();
            assert_eq!(method.return_type(), TypeTag::Bool);
        }
    }

    #[test]
    fn test_lookup_misses() {
        let registry = IntrinsicRegistry::with_avx(Avx::detect());
        assert!(registry.get_method("Avx", "test_c", &u16_pair()).is_none());
        assert!(registry.get_method("Sse41", "test_z", &u16_pair()).is_none());
        assert!(registry
            .get_method("Avx", "test_z", &[TypeTag::Vector256(LaneKind::U16)])
            .is_none());
        assert!(IntrinsicRegistry::new().is_empty());
    }

    #[test]
    fn test_invoke_checks_signature() {
        let registry = IntrinsicRegistry::with_avx(Avx::detect());
        let method = registry.get_method("Avx", "test_z", &u16_pair()).unwrap();

        let err = method.invoke(&[Value::Bool(true)]).unwrap_err();
        assert!(matches!(err, SimdError::ArgumentMismatch { .. }));

        let wrong_kind = Value::from(Vector256::<u32>::zero());
        let err = method.invoke(&[wrong_kind, wrong_kind]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Argument mismatch for Avx::test_z(Vector256<u16>, Vector256<u16>): \
             argument 0 is Vector256<u32>, expected Vector256<u16>"
        );
    }

    #[test]
    fn test_invoke_unsupported_propagates() {
        let registry = IntrinsicRegistry::with_avx(Avx::new(SimdCapabilities::none()));
        let method = registry.get_method("Avx", "test_z", &u16_pair()).unwrap();
        let zero = Value::from(Vector256::<u16>::zero());
        assert!(method.invoke(&[zero, zero]).unwrap_err().is_not_supported());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = IntrinsicRegistry::with_avx(Avx::detect());
        let key = MethodKey::new("Avx", "test_z", &u16_pair());
        let previous = registry.register(key.clone(), TypeTag::Bool, |_| Ok(Value::Bool(false)));
        assert!(previous.is_some());
        assert!(registry.contains(&key));

        let method = registry.get_method("Avx", "test_z", &u16_pair()).unwrap();
        let zero = Value::from(Vector256::<u16>::zero());
        assert_eq!(method.invoke(&[zero, zero]), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_value_boxing() {
        let vector = Vector256::<i16>::splat(-2);
        let boxed = Value::from(vector);
        assert_eq!(boxed.type_tag(), TypeTag::Vector256(LaneKind::I16));
        assert_eq!(boxed.to_vector::<i16>(), Some(vector));
        assert_eq!(boxed.to_vector::<u16>(), None);
        assert_eq!(boxed.as_bool(), None);
        assert_eq!(Value::from(true).as_bool(), Some(true));
    }
}
