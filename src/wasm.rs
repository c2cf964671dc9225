#[cfg(test)]
mod test;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use wasm_encoder::{EntityType, ImportSection, MemoryType, TypeSection, ValType};

use crate::error::AssembleError;
use crate::import::{ExternalKind, FunctionImport, Import, RuntimeImport};
use crate::opcode::{BlockType, Instruction, MemArg};
use crate::types::{FunctionSignature, ValueType};

impl From<ValueType> for ValType {
    fn from(ty: ValueType) -> Self {
        match ty {
            ValueType::I32 => ValType::I32,
            ValueType::I64 => ValType::I64,
            ValueType::F32 => ValType::F32,
            ValueType::F64 => ValType::F64,
        }
    }
}

impl From<BlockType> for wasm_encoder::BlockType {
    fn from(ty: BlockType) -> Self {
        match ty {
            BlockType::Empty => wasm_encoder::BlockType::Empty,
            BlockType::Value(ty) => wasm_encoder::BlockType::Result(ty.into()),
        }
    }
}

impl From<MemArg> for wasm_encoder::MemArg {
    fn from(memarg: MemArg) -> Self {
        wasm_encoder::MemArg {
            offset: memarg.offset.into(),
            align: memarg.align,
            memory_index: 0,
        }
    }
}

/// Adds `signature` to the type section and returns its index.
pub fn add_signature(types: &mut TypeSection, signature: &FunctionSignature) -> u32 {
    let index = types.len();
    types.function(
        signature.params().iter().map(|&ty| ValType::from(ty)),
        signature.results().iter().map(|&ty| ValType::from(ty)),
    );
    index
}

impl<'a> From<&'a Instruction> for wasm_encoder::Instruction<'a> {
    fn from(instruction: &'a Instruction) -> Self {
        use wasm_encoder::Instruction as W;
        match instruction {
            Instruction::Unreachable => W::Unreachable,
            Instruction::Nop => W::Nop,
            Instruction::Block { ty } => W::Block((*ty).into()),
            Instruction::Loop { ty } => W::Loop((*ty).into()),
            Instruction::If { ty } => W::If((*ty).into()),
            Instruction::Else => W::Else,
            Instruction::End => W::End,
            Instruction::Br { depth } => W::Br(*depth),
            Instruction::BrIf { depth } => W::BrIf(*depth),
            Instruction::BrTable { targets, default } => {
                W::BrTable(Cow::Borrowed(targets.as_slice()), *default)
            }
            Instruction::Return => W::Return,
            Instruction::Call { function } => W::Call(*function),
            Instruction::CallIndirect { ty, table } => W::CallIndirect {
                type_index: *ty,
                table_index: *table,
            },

            Instruction::Drop => W::Drop,
            Instruction::Select => W::Select,

            Instruction::LocalGet { local } => W::LocalGet(*local),
            Instruction::LocalSet { local } => W::LocalSet(*local),
            Instruction::LocalTee { local } => W::LocalTee(*local),
            Instruction::GlobalGet { global } => W::GlobalGet(*global),
            Instruction::GlobalSet { global } => W::GlobalSet(*global),

            Instruction::I32Load { memarg } => W::I32Load((*memarg).into()),
            Instruction::I64Load { memarg } => W::I64Load((*memarg).into()),
            Instruction::F32Load { memarg } => W::F32Load((*memarg).into()),
            Instruction::F64Load { memarg } => W::F64Load((*memarg).into()),
            Instruction::I32Load8S { memarg } => W::I32Load8S((*memarg).into()),
            Instruction::I32Load8U { memarg } => W::I32Load8U((*memarg).into()),
            Instruction::I32Load16S { memarg } => W::I32Load16S((*memarg).into()),
            Instruction::I32Load16U { memarg } => W::I32Load16U((*memarg).into()),
            Instruction::I64Load8S { memarg } => W::I64Load8S((*memarg).into()),
            Instruction::I64Load8U { memarg } => W::I64Load8U((*memarg).into()),
            Instruction::I64Load16S { memarg } => W::I64Load16S((*memarg).into()),
            Instruction::I64Load16U { memarg } => W::I64Load16U((*memarg).into()),
            Instruction::I64Load32S { memarg } => W::I64Load32S((*memarg).into()),
            Instruction::I64Load32U { memarg } => W::I64Load32U((*memarg).into()),
            Instruction::I32Store { memarg } => W::I32Store((*memarg).into()),
            Instruction::I64Store { memarg } => W::I64Store((*memarg).into()),
            Instruction::F32Store { memarg } => W::F32Store((*memarg).into()),
            Instruction::F64Store { memarg } => W::F64Store((*memarg).into()),
            Instruction::I32Store8 { memarg } => W::I32Store8((*memarg).into()),
            Instruction::I32Store16 { memarg } => W::I32Store16((*memarg).into()),
            Instruction::I64Store8 { memarg } => W::I64Store8((*memarg).into()),
            Instruction::I64Store16 { memarg } => W::I64Store16((*memarg).into()),
            Instruction::I64Store32 { memarg } => W::I64Store32((*memarg).into()),
            Instruction::MemorySize { memory } => W::MemorySize(*memory),
            Instruction::MemoryGrow { memory } => W::MemoryGrow(*memory),

            Instruction::I32Const { value } => W::I32Const(*value),
            Instruction::I64Const { value } => W::I64Const(*value),
            Instruction::F32Const { value } => W::F32Const(*value),
            Instruction::F64Const { value } => W::F64Const(*value),

            Instruction::I32Eqz => W::I32Eqz,
            Instruction::I32Eq => W::I32Eq,
            Instruction::I32Ne => W::I32Ne,
            Instruction::I32LtS => W::I32LtS,
            Instruction::I32LtU => W::I32LtU,
            Instruction::I32GtS => W::I32GtS,
            Instruction::I32GtU => W::I32GtU,
            Instruction::I32LeS => W::I32LeS,
            Instruction::I32LeU => W::I32LeU,
            Instruction::I32GeS => W::I32GeS,
            Instruction::I32GeU => W::I32GeU,

            Instruction::I64Eqz => W::I64Eqz,
            Instruction::I64Eq => W::I64Eq,
            Instruction::I64Ne => W::I64Ne,
            Instruction::I64LtS => W::I64LtS,
            Instruction::I64LtU => W::I64LtU,
            Instruction::I64GtS => W::I64GtS,
            Instruction::I64GtU => W::I64GtU,
            Instruction::I64LeS => W::I64LeS,
            Instruction::I64LeU => W::I64LeU,
            Instruction::I64GeS => W::I64GeS,
            Instruction::I64GeU => W::I64GeU,

            Instruction::F32Eq => W::F32Eq,
            Instruction::F32Ne => W::F32Ne,
            Instruction::F32Lt => W::F32Lt,
            Instruction::F32Gt => W::F32Gt,
            Instruction::F32Le => W::F32Le,
            Instruction::F32Ge => W::F32Ge,

            Instruction::F64Eq => W::F64Eq,
            Instruction::F64Ne => W::F64Ne,
            Instruction::F64Lt => W::F64Lt,
            Instruction::F64Gt => W::F64Gt,
            Instruction::F64Le => W::F64Le,
            Instruction::F64Ge => W::F64Ge,

            Instruction::I32Clz => W::I32Clz,
            Instruction::I32Ctz => W::I32Ctz,
            Instruction::I32Popcnt => W::I32Popcnt,
            Instruction::I32Add => W::I32Add,
            Instruction::I32Sub => W::I32Sub,
            Instruction::I32Mul => W::I32Mul,
            Instruction::I32DivS => W::I32DivS,
            Instruction::I32DivU => W::I32DivU,
            Instruction::I32RemS => W::I32RemS,
            Instruction::I32RemU => W::I32RemU,
            Instruction::I32And => W::I32And,
            Instruction::I32Or => W::I32Or,
            Instruction::I32Xor => W::I32Xor,
            Instruction::I32Shl => W::I32Shl,
            Instruction::I32ShrS => W::I32ShrS,
            Instruction::I32ShrU => W::I32ShrU,
            Instruction::I32Rotl => W::I32Rotl,
            Instruction::I32Rotr => W::I32Rotr,

            Instruction::I64Clz => W::I64Clz,
            Instruction::I64Ctz => W::I64Ctz,
            Instruction::I64Popcnt => W::I64Popcnt,
            Instruction::I64Add => W::I64Add,
            Instruction::I64Sub => W::I64Sub,
            Instruction::I64Mul => W::I64Mul,
            Instruction::I64DivS => W::I64DivS,
            Instruction::I64DivU => W::I64DivU,
            Instruction::I64RemS => W::I64RemS,
            Instruction::I64RemU => W::I64RemU,
            Instruction::I64And => W::I64And,
            Instruction::I64Or => W::I64Or,
            Instruction::I64Xor => W::I64Xor,
            Instruction::I64Shl => W::I64Shl,
            Instruction::I64ShrS => W::I64ShrS,
            Instruction::I64ShrU => W::I64ShrU,
            Instruction::I64Rotl => W::I64Rotl,
            Instruction::I64Rotr => W::I64Rotr,

            Instruction::F32Abs => W::F32Abs,
            Instruction::F32Neg => W::F32Neg,
            Instruction::F32Ceil => W::F32Ceil,
            Instruction::F32Floor => W::F32Floor,
            Instruction::F32Trunc => W::F32Trunc,
            Instruction::F32Nearest => W::F32Nearest,
            Instruction::F32Sqrt => W::F32Sqrt,
            Instruction::F32Add => W::F32Add,
            Instruction::F32Sub => W::F32Sub,
            Instruction::F32Mul => W::F32Mul,
            Instruction::F32Div => W::F32Div,
            Instruction::F32Min => W::F32Min,
            Instruction::F32Max => W::F32Max,
            Instruction::F32Copysign => W::F32Copysign,

            Instruction::F64Abs => W::F64Abs,
            Instruction::F64Neg => W::F64Neg,
            Instruction::F64Ceil => W::F64Ceil,
            Instruction::F64Floor => W::F64Floor,
            Instruction::F64Trunc => W::F64Trunc,
            Instruction::F64Nearest => W::F64Nearest,
            Instruction::F64Sqrt => W::F64Sqrt,
            Instruction::F64Add => W::F64Add,
            Instruction::F64Sub => W::F64Sub,
            Instruction::F64Mul => W::F64Mul,
            Instruction::F64Div => W::F64Div,
            Instruction::F64Min => W::F64Min,
            Instruction::F64Max => W::F64Max,
            Instruction::F64Copysign => W::F64Copysign,

            Instruction::I32WrapI64 => W::I32WrapI64,
            Instruction::I32TruncF32S => W::I32TruncF32S,
            Instruction::I32TruncF32U => W::I32TruncF32U,
            Instruction::I32TruncF64S => W::I32TruncF64S,
            Instruction::I32TruncF64U => W::I32TruncF64U,
            Instruction::I64ExtendI32S => W::I64ExtendI32S,
            Instruction::I64ExtendI32U => W::I64ExtendI32U,
            Instruction::I64TruncF32S => W::I64TruncF32S,
            Instruction::I64TruncF32U => W::I64TruncF32U,
            Instruction::I64TruncF64S => W::I64TruncF64S,
            Instruction::I64TruncF64U => W::I64TruncF64U,
            Instruction::F32ConvertI32S => W::F32ConvertI32S,
            Instruction::F32ConvertI32U => W::F32ConvertI32U,
            Instruction::F32ConvertI64S => W::F32ConvertI64S,
            Instruction::F32ConvertI64U => W::F32ConvertI64U,
            Instruction::F32DemoteF64 => W::F32DemoteF64,
            Instruction::F64ConvertI32S => W::F64ConvertI32S,
            Instruction::F64ConvertI32U => W::F64ConvertI32U,
            Instruction::F64ConvertI64S => W::F64ConvertI64S,
            Instruction::F64ConvertI64U => W::F64ConvertI64U,
            Instruction::F64PromoteF32 => W::F64PromoteF32,

            Instruction::I32ReinterpretF32 => W::I32ReinterpretF32,
            Instruction::I64ReinterpretF64 => W::I64ReinterpretF64,
            Instruction::F32ReinterpretI32 => W::F32ReinterpretI32,
            Instruction::F64ReinterpretI64 => W::F64ReinterpretI64,
        }
    }
}

/// The import table of a module under construction.
///
/// Keeps imports in declaration order, hands out function indices, and
/// shares one type entry between functions with equal signatures.
#[derive(Debug, Default)]
pub struct ModuleImports {
    entries: Vec<Entry>,
    names: HashSet<(String, String)>,
    signatures: Vec<FunctionSignature>,
    type_indices: HashMap<FunctionSignature, u32>,
    function_count: u32,
}

#[derive(Debug)]
struct Entry {
    import: Import,
    type_index: Option<u32>,
}

impl ModuleImports {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends an import. Function imports get back their function index,
    /// other kinds their index within their own kind.
    pub fn push(&mut self, import: impl Into<Import>) -> Result<u32, AssembleError> {
        let import = import.into();
        let key = (
            import.module_name().to_string(),
            import.export_name().to_string(),
        );
        if self.names.contains(&key) {
            return Err(AssembleError::DuplicateImport {
                module: key.0,
                name: key.1,
            });
        }

        let kind = import.kind();
        let (index, type_index) = match &import {
            Import::Function(function) => {
                let type_index = self.intern(function.signature())?;
                let index = self.function_count;
                self.function_count = index
                    .checked_add(1)
                    .ok_or(AssembleError::IndexOverflow(kind))?;
                (index, Some(type_index))
            }
            _ => (self.count_of(kind)?, None),
        };
        self.names.insert(key);
        self.entries.push(Entry { import, type_index });
        Ok(index)
    }

    fn count_of(&self, kind: ExternalKind) -> Result<u32, AssembleError> {
        let count = self
            .entries
            .iter()
            .filter(|entry| entry.import.kind() == kind)
            .count();
        u32::try_from(count).map_err(|_| AssembleError::IndexOverflow(kind))
    }

    fn intern(&mut self, signature: &FunctionSignature) -> Result<u32, AssembleError> {
        if let Some(&index) = self.type_indices.get(signature) {
            return Ok(index);
        }
        let index = u32::try_from(self.signatures.len())
            .map_err(|_| AssembleError::IndexOverflow(ExternalKind::Function))?;
        self.signatures.push(signature.clone());
        self.type_indices.insert(signature.clone(), index);
        Ok(index)
    }

    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.entries.iter().map(|entry| &entry.import)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionImport> {
        self.imports().filter_map(Import::as_function)
    }

    pub fn function_count(&self) -> u32 {
        self.function_count
    }

    /// Distinct signatures, in type index order.
    pub fn signatures(&self) -> &[FunctionSignature] {
        &self.signatures
    }

    pub fn type_index(&self, signature: &FunctionSignature) -> Option<u32> {
        self.type_indices.get(signature).copied()
    }

    /// Builds the type and import sections. Module-defined function types
    /// can be appended to the returned type section after the imported ones.
    pub fn encode(&self) -> Result<(TypeSection, ImportSection), AssembleError> {
        let mut types = TypeSection::new();
        for signature in &self.signatures {
            add_signature(&mut types, signature);
        }

        let mut section = ImportSection::new();
        for Entry { import, type_index } in &self.entries {
            let entity = match (import, type_index) {
                (Import::Function(_), Some(type_index)) => EntityType::Function(*type_index),
                (Import::Memory(memory), _) => EntityType::Memory(MemoryType {
                    minimum: memory.limits.minimum.into(),
                    maximum: memory.limits.maximum.map(u64::from),
                    memory64: false,
                    shared: false,
                    page_size_log2: None,
                }),
                _ => {
                    return Err(AssembleError::UnsupportedKind {
                        module: import.module_name().to_string(),
                        name: import.export_name().to_string(),
                        kind: import.kind(),
                    })
                }
            };
            section.import(import.module_name(), import.export_name(), entity);
        }
        Ok((types, section))
    }
}
