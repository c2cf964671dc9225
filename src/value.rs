use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use thiserror::Error;

use crate::types::{HostValue, ValueType};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn ty(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }
}

/// Failure raised while calling into a host function.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Trap {
    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },
    #[error("argument {index} should be {expected}, got {actual}")]
    ArgumentType {
        index: usize,
        expected: ValueType,
        actual: ValueType,
    },
    #[error("host function returned {actual:?}, expected {expected:?}")]
    ResultType {
        expected: Option<ValueType>,
        actual: Option<ValueType>,
    },
    #[error("{0}")]
    Host(String),
}

type DynHostFn = dyn Fn(&[Value]) -> Result<Option<Value>, Trap> + Send + Sync;

/// A host function in uniform shape: any number of values in, at most one out.
#[derive(Clone)]
pub struct HostFunc(Arc<DynHostFn>);

impl HostFunc {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Option<Value>, Trap> + Send + Sync + 'static,
    {
        HostFunc(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Result<Option<Value>, Trap> {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &HostFunc) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for HostFunc {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "HostFunc({:p})", Arc::as_ptr(&self.0))
    }
}

pub(crate) fn check_args(params: &[ValueType], args: &[Value]) -> Result<(), Trap> {
    if params.len() != args.len() {
        return Err(Trap::ArgumentCount {
            expected: params.len(),
            actual: args.len(),
        });
    }
    for (index, (expected, arg)) in params.iter().zip(args).enumerate() {
        if arg.ty() != *expected {
            return Err(Trap::ArgumentType {
                index,
                expected: *expected,
                actual: arg.ty(),
            });
        }
    }
    Ok(())
}

pub(crate) fn check_result(
    expected: Option<ValueType>,
    actual: Option<Value>,
) -> Result<Option<Value>, Trap> {
    let actual_ty = actual.map(|value| value.ty());
    if actual_ty != expected {
        return Err(Trap::ResultType {
            expected,
            actual: actual_ty,
        });
    }
    Ok(actual)
}

/// Walks the arguments of a call, converting each into its Rust type.
pub(crate) struct ArgCursor<'a> {
    args: &'a [Value],
    index: usize,
}

impl<'a> ArgCursor<'a> {
    pub(crate) fn new(args: &'a [Value]) -> Self {
        ArgCursor { args, index: 0 }
    }

    pub(crate) fn next<T: HostValue>(&mut self, arity: usize) -> Result<T, Trap> {
        let Some(&value) = self.args.get(self.index) else {
            return Err(Trap::ArgumentCount {
                expected: arity,
                actual: self.args.len(),
            });
        };
        let converted = T::from_value(value).ok_or(Trap::ArgumentType {
            index: self.index,
            expected: T::VALUE_TYPE,
            actual: value.ty(),
        })?;
        self.index += 1;
        Ok(converted)
    }

    pub(crate) fn finish(self, arity: usize) -> Result<(), Trap> {
        if self.args.len() != arity {
            return Err(Trap::ArgumentCount {
                expected: arity,
                actual: self.args.len(),
            });
        }
        Ok(())
    }
}
