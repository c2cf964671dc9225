
use crate::import::{
    FunctionImport, GlobalImport, Import, Limits, MemoryImport, RuntimeImport, TableImport,
};
use crate::opcode::{BlockType, Instruction, MemArg};
use crate::types::{FunctionSignature, ValueType};

pub trait WatEmitter {
    fn to_wat(&self) -> String;
}

impl WatEmitter for ValueType {
    fn to_wat(&self) -> String {
        self.name().to_string()
    }
}

impl<T> WatEmitter for Vec<T>
where
    T: WatEmitter,
{
    fn to_wat(&self) -> String {
        self.iter()
            .map(|element| element.to_wat())
            .collect::<Vec<String>>()
            .join(" ")
    }
}

impl<T> WatEmitter for Option<T>
where
    T: WatEmitter,
{
    fn to_wat(&self) -> String {
        match self {
            None => "".to_string(),
            Some(inner) => inner.to_wat(),
        }
    }
}

impl WatEmitter for FunctionSignature {
    fn to_wat(&self) -> String {
        let mut parts = vec!["func".to_string()];
        if !self.params().is_empty() {
            parts.push(format!("(param {})", self.params().to_vec().to_wat()));
        }
        if let Some(result) = self.result() {
            parts.push(format!("(result {})", result.to_wat()));
        }
        format!("({})", parts.join(" "))
    }
}

impl WatEmitter for Limits {
    fn to_wat(&self) -> String {
        match self.maximum {
            Some(maximum) => format!("{} {}", self.minimum, maximum),
            None => self.minimum.to_string(),
        }
    }
}

fn import_wat(import: &dyn RuntimeImport, desc: String) -> String {
    format!(
        "(import {} {} {})",
        quote(import.module_name()),
        quote(import.export_name()),
        desc
    )
}

impl WatEmitter for FunctionImport {
    fn to_wat(&self) -> String {
        import_wat(self, self.signature().to_wat())
    }
}

impl WatEmitter for TableImport {
    fn to_wat(&self) -> String {
        import_wat(self, format!("(table {} funcref)", self.limits.to_wat()))
    }
}

impl WatEmitter for MemoryImport {
    fn to_wat(&self) -> String {
        import_wat(self, format!("(memory {})", self.limits.to_wat()))
    }
}

impl WatEmitter for GlobalImport {
    fn to_wat(&self) -> String {
        let ty = if self.mutable {
            format!("(mut {})", self.ty.to_wat())
        } else {
            self.ty.to_wat()
        };
        import_wat(self, format!("(global {ty})"))
    }
}

impl WatEmitter for Import {
    fn to_wat(&self) -> String {
        match self {
            Import::Function(import) => import.to_wat(),
            Import::Table(import) => import.to_wat(),
            Import::Memory(import) => import.to_wat(),
            Import::Global(import) => import.to_wat(),
        }
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.escape_default())
}

fn memarg_wat(memarg: &MemArg) -> String {
    let mut parts = Vec::new();
    if memarg.offset != 0 {
        parts.push(format!("offset={}", memarg.offset));
    }
    if memarg.align != 0 {
        parts.push(format!("align={}", 1u64 << memarg.align.min(63)));
    }
    parts.join(" ")
}

fn f32_wat(value: f32) -> String {
    if value.is_nan() {
        nan_wat(
            value.is_sign_negative(),
            u64::from(value.to_bits() & 0x007F_FFFF),
            0x0040_0000,
        )
    } else {
        format!("{value:?}")
    }
}

fn f64_wat(value: f64) -> String {
    if value.is_nan() {
        nan_wat(
            value.is_sign_negative(),
            value.to_bits() & 0x000F_FFFF_FFFF_FFFF,
            0x0008_0000_0000_0000,
        )
    } else {
        format!("{value:?}")
    }
}

// Canonical NaNs print as `nan`, any other payload as `nan:0x...`.
fn nan_wat(negative: bool, payload: u64, canonical: u64) -> String {
    let sign = if negative { "-" } else { "" };
    if payload == canonical {
        format!("{sign}nan")
    } else {
        format!("{sign}nan:0x{payload:x}")
    }
}

impl WatEmitter for Instruction {
    fn to_wat(&self) -> String {
        let mnemonic = self.mnemonic();
        let immediates = match self {
            Instruction::Block { ty } | Instruction::Loop { ty } | Instruction::If { ty } => {
                match ty {
                    BlockType::Empty => String::new(),
                    BlockType::Value(ty) => format!("(result {})", ty.to_wat()),
                }
            }
            Instruction::Br { depth } | Instruction::BrIf { depth } => depth.to_string(),
            Instruction::BrTable { targets, default } => targets
                .iter()
                .chain(std::iter::once(default))
                .map(|target| target.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            Instruction::Call { function } => function.to_string(),
            Instruction::CallIndirect { ty, table } => format!("{table} (type {ty})"),
            Instruction::LocalGet { local }
            | Instruction::LocalSet { local }
            | Instruction::LocalTee { local } => local.to_string(),
            Instruction::GlobalGet { global } | Instruction::GlobalSet { global } => {
                global.to_string()
            }
            Instruction::I32Load { memarg }
            | Instruction::I64Load { memarg }
            | Instruction::F32Load { memarg }
            | Instruction::F64Load { memarg }
            | Instruction::I32Load8S { memarg }
            | Instruction::I32Load8U { memarg }
            | Instruction::I32Load16S { memarg }
            | Instruction::I32Load16U { memarg }
            | Instruction::I64Load8S { memarg }
            | Instruction::I64Load8U { memarg }
            | Instruction::I64Load16S { memarg }
            | Instruction::I64Load16U { memarg }
            | Instruction::I64Load32S { memarg }
            | Instruction::I64Load32U { memarg }
            | Instruction::I32Store { memarg }
            | Instruction::I64Store { memarg }
            | Instruction::F32Store { memarg }
            | Instruction::F64Store { memarg }
            | Instruction::I32Store8 { memarg }
            | Instruction::I32Store16 { memarg }
            | Instruction::I64Store8 { memarg }
            | Instruction::I64Store16 { memarg }
            | Instruction::I64Store32 { memarg } => memarg_wat(memarg),
            Instruction::I32Const { value } => value.to_string(),
            Instruction::I64Const { value } => value.to_string(),
            Instruction::F32Const { value } => f32_wat(*value),
            Instruction::F64Const { value } => f64_wat(*value),
            _ => String::new(),
        };
        if immediates.is_empty() {
            mnemonic.to_string()
        } else {
            format!("{mnemonic} {immediates}")
        }
    }
}
