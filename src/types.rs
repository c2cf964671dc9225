
use std::fmt::{Display, Formatter};

use crate::value::Value;

/// The primitive value kinds a WebAssembly function can take or return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
}

impl ValueType {
    pub const ALL: [ValueType; 4] = [
        ValueType::I32,
        ValueType::I64,
        ValueType::F32,
        ValueType::F64,
    ];

    /// Name used by the text format.
    pub const fn name(self) -> &'static str {
        match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
        }
    }

    /// Type byte used by the binary format.
    pub const fn byte(self) -> u8 {
        match self {
            ValueType::I32 => 0x7F,
            ValueType::I64 => 0x7E,
            ValueType::F32 => 0x7D,
            ValueType::F64 => 0x7C,
        }
    }

    /// The one host type that translates to this value type.
    pub const fn host_type(self) -> HostType {
        match self {
            ValueType::I32 => HostType::I32,
            ValueType::I64 => HostType::I64,
            ValueType::F32 => HostType::F32,
            ValueType::F64 => HostType::F64,
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Types a host callable can declare for its parameters and return value.
///
/// Only the four numeric primitives have a WebAssembly counterpart; every
/// other variant exists so that a descriptor can name what it really takes
/// and be rejected with that name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    I32,
    I64,
    F32,
    F64,
    I8,
    I16,
    U8,
    U16,
    U32,
    U64,
    Bool,
    Char,
    Str,
    Unit,
    Struct(String),
    Option(Box<HostType>),
    Array(Box<HostType>),
}

impl HostType {
    /// Host type to value type translation. This is the only place that
    /// decides compatibility, for parameters and return types alike.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            HostType::I32 => Some(ValueType::I32),
            HostType::I64 => Some(ValueType::I64),
            HostType::F32 => Some(ValueType::F32),
            HostType::F64 => Some(ValueType::F64),
            HostType::I8
            | HostType::I16
            | HostType::U8
            | HostType::U16
            | HostType::U32
            | HostType::U64
            | HostType::Bool
            | HostType::Char
            | HostType::Str
            | HostType::Unit
            | HostType::Struct(_)
            | HostType::Option(_)
            | HostType::Array(_) => None,
        }
    }
}

impl Display for HostType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HostType::I32 => write!(f, "i32"),
            HostType::I64 => write!(f, "i64"),
            HostType::F32 => write!(f, "f32"),
            HostType::F64 => write!(f, "f64"),
            HostType::I8 => write!(f, "i8"),
            HostType::I16 => write!(f, "i16"),
            HostType::U8 => write!(f, "u8"),
            HostType::U16 => write!(f, "u16"),
            HostType::U32 => write!(f, "u32"),
            HostType::U64 => write!(f, "u64"),
            HostType::Bool => write!(f, "bool"),
            HostType::Char => write!(f, "char"),
            HostType::Str => write!(f, "str"),
            HostType::Unit => write!(f, "()"),
            HostType::Struct(name) => write!(f, "{name}"),
            HostType::Option(inner) => write!(f, "Option<{inner}>"),
            HostType::Array(inner) => write!(f, "[{inner}]"),
        }
    }
}

/// Rust types that cross the host boundary unchanged.
pub trait HostValue: Copy + Send + Sync + 'static {
    const VALUE_TYPE: ValueType;

    fn from_value(value: Value) -> Option<Self>;

    fn into_value(self) -> Value;
}

macro_rules! host_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl HostValue for $ty {
                const VALUE_TYPE: ValueType = ValueType::$variant;

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

host_value! {
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

/// Parameter and result types of a function, in WebAssembly terms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FunctionSignature {
    params: Vec<ValueType>,
    result: Option<ValueType>,
}

impl FunctionSignature {
    pub fn new(params: Vec<ValueType>, result: Option<ValueType>) -> Self {
        FunctionSignature { params, result }
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn result(&self) -> Option<ValueType> {
        self.result
    }

    /// Results as a slice, empty for functions that return nothing.
    pub fn results(&self) -> &[ValueType] {
        self.result.as_slice()
    }
}

impl Display for FunctionSignature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        write!(f, ")")?;
        if let Some(result) = self.result {
            write!(f, " -> {result}")?;
        }
        Ok(())
    }
}
