use std::fmt::{Display, Formatter};

use crate::types::{FunctionSignature, ValueType};
use crate::value::{check_args, check_result, HostFunc, Trap, Value};

/// What an import supplies to the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExternalKind {
    Function = 0,
    Table = 1,
    Memory = 2,
    Global = 3,
}

impl ExternalKind {
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

impl Display for ExternalKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalKind::Function => write!(f, "function"),
            ExternalKind::Table => write!(f, "table"),
            ExternalKind::Memory => write!(f, "memory"),
            ExternalKind::Global => write!(f, "global"),
        }
    }
}

/// An entity the host provides to a module, named by module and export.
pub trait RuntimeImport {
    fn module_name(&self) -> &str;

    fn export_name(&self) -> &str;

    fn kind(&self) -> ExternalKind;
}

/// Size bounds of a table (in elements) or a memory (in 64 KiB pages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Limits {
    pub minimum: u32,
    pub maximum: Option<u32>,
}

/// A host function bound to a module import.
///
/// Only [`Binder`](crate::binder::Binder) builds these, so the signature
/// always describes what the bound callable actually takes and returns.
#[derive(Debug, Clone)]
pub struct FunctionImport {
    module_name: String,
    export_name: String,
    signature: FunctionSignature,
    callable: HostFunc,
}

impl FunctionImport {
    pub(crate) fn new(
        module_name: &str,
        export_name: &str,
        signature: FunctionSignature,
        callable: HostFunc,
    ) -> Self {
        FunctionImport {
            module_name: module_name.to_string(),
            export_name: export_name.to_string(),
            signature,
            callable,
        }
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    pub fn callable(&self) -> &HostFunc {
        &self.callable
    }

    /// Calls the bound function, checking arguments and result against the
    /// signature.
    pub fn call(&self, args: &[Value]) -> Result<Option<Value>, Trap> {
        check_args(self.signature.params(), args)?;
        let result = self.callable.call(args)?;
        check_result(self.signature.result(), result)
    }
}

impl RuntimeImport for FunctionImport {
    fn module_name(&self) -> &str {
        &self.module_name
    }

    fn export_name(&self) -> &str {
        &self.export_name
    }

    fn kind(&self) -> ExternalKind {
        ExternalKind::Function
    }
}

/// A `funcref` table supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableImport {
    module_name: String,
    export_name: String,
    pub limits: Limits,
}

impl TableImport {
    pub fn new(module_name: &str, export_name: &str, limits: Limits) -> Self {
        TableImport {
            module_name: module_name.to_string(),
            export_name: export_name.to_string(),
            limits,
        }
    }
}

impl RuntimeImport for TableImport {
    fn module_name(&self) -> &str {
        &self.module_name
    }

    fn export_name(&self) -> &str {
        &self.export_name
    }

    fn kind(&self) -> ExternalKind {
        ExternalKind::Table
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImport {
    module_name: String,
    export_name: String,
    pub limits: Limits,
}

impl MemoryImport {
    pub fn new(module_name: &str, export_name: &str, limits: Limits) -> Self {
        MemoryImport {
            module_name: module_name.to_string(),
            export_name: export_name.to_string(),
            limits,
        }
    }
}

impl RuntimeImport for MemoryImport {
    fn module_name(&self) -> &str {
        &self.module_name
    }

    fn export_name(&self) -> &str {
        &self.export_name
    }

    fn kind(&self) -> ExternalKind {
        ExternalKind::Memory
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalImport {
    module_name: String,
    export_name: String,
    pub ty: ValueType,
    pub mutable: bool,
}

impl GlobalImport {
    pub fn new(module_name: &str, export_name: &str, ty: ValueType, mutable: bool) -> Self {
        GlobalImport {
            module_name: module_name.to_string(),
            export_name: export_name.to_string(),
            ty,
            mutable,
        }
    }
}

impl RuntimeImport for GlobalImport {
    fn module_name(&self) -> &str {
        &self.module_name
    }

    fn export_name(&self) -> &str {
        &self.export_name
    }

    fn kind(&self) -> ExternalKind {
        ExternalKind::Global
    }
}

/// Any of the four import kinds, for keeping them in one list.
#[derive(Debug, Clone)]
pub enum Import {
    Function(FunctionImport),
    Table(TableImport),
    Memory(MemoryImport),
    Global(GlobalImport),
}

impl Import {
    fn inner(&self) -> &dyn RuntimeImport {
        match self {
            Import::Function(import) => import,
            Import::Table(import) => import,
            Import::Memory(import) => import,
            Import::Global(import) => import,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionImport> {
        match self {
            Import::Function(import) => Some(import),
            _ => None,
        }
    }
}

impl RuntimeImport for Import {
    fn module_name(&self) -> &str {
        self.inner().module_name()
    }

    fn export_name(&self) -> &str {
        self.inner().export_name()
    }

    fn kind(&self) -> ExternalKind {
        self.inner().kind()
    }
}

impl From<FunctionImport> for Import {
    fn from(import: FunctionImport) -> Self {
        Import::Function(import)
    }
}

impl From<TableImport> for Import {
    fn from(import: TableImport) -> Self {
        Import::Table(import)
    }
}

impl From<MemoryImport> for Import {
    fn from(import: MemoryImport) -> Self {
        Import::Memory(import)
    }
}

impl From<GlobalImport> for Import {
    fn from(import: GlobalImport) -> Self {
        Import::Global(import)
    }
}
