//! Binds host functions to WebAssembly module imports and describes the
//! instruction set those modules are made of.
//!
//! [`Binder`] turns a Rust closure or a described host method into a
//! [`FunctionImport`] whose [`FunctionSignature`] matches what the callable
//! really takes. [`Opcode`] and [`Instruction`] catalog the MVP instructions
//! for the encoder that lays out the final module.

pub mod binder;
pub mod error;
pub mod import;
pub mod opcode;
pub mod types;
pub mod value;
pub mod wasm;
pub mod wat;

pub use binder::{Binder, BinderConfig, HostMethod, IntoHostFunc, Resolver};
pub use error::{BindError, Ineligibility, Missing, ResolutionError, TypePosition};
pub use import::{
    ExternalKind, FunctionImport, GlobalImport, Import, Limits, MemoryImport, RuntimeImport,
    TableImport,
};
pub use opcode::{BlockType, Instruction, MemArg, Opcode};
pub use types::{FunctionSignature, HostType, HostValue, ValueType};
pub use value::{HostFunc, Trap, Value};
pub use wasm::ModuleImports;
