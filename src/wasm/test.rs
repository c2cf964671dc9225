use std::sync::{Arc, Mutex};

use anyhow::Result;
use wasm_encoder::{CodeSection, ExportKind, ExportSection, Function, FunctionSection};
use wasmi::core::{ValType as WasmiValType, F32, F64};
use wasmi::{
    Caller, Engine, Error as WasmiError, Func, FuncType, Instance, Linker, Module, Store, Val,
};

use super::{add_signature, ModuleImports};
use crate::binder::Binder;
use crate::error::AssembleError;
use crate::import::{
    ExternalKind, FunctionImport, GlobalImport, Limits, MemoryImport, RuntimeImport,
};
use crate::opcode::{Instruction, Opcode};
use crate::types::{FunctionSignature, ValueType};
use crate::value::Value;

fn wasmi_type(ty: ValueType) -> WasmiValType {
    match ty {
        ValueType::I32 => WasmiValType::I32,
        ValueType::I64 => WasmiValType::I64,
        ValueType::F32 => WasmiValType::F32,
        ValueType::F64 => WasmiValType::F64,
    }
}

fn from_wasmi(val: &Val) -> Option<Value> {
    match val {
        Val::I32(v) => Some(Value::I32(*v)),
        Val::I64(v) => Some(Value::I64(*v)),
        Val::F32(v) => Some(Value::F32(v.to_float())),
        Val::F64(v) => Some(Value::F64(v.to_float())),
        _ => None,
    }
}

fn to_wasmi(value: Value) -> Val {
    match value {
        Value::I32(v) => Val::I32(v),
        Value::I64(v) => Val::I64(v),
        Value::F32(v) => Val::F32(F32::from_float(v)),
        Value::F64(v) => Val::F64(F64::from_float(v)),
    }
}

/// Defines `import` in the linker, driven only by its signature.
fn link(linker: &mut Linker<()>, store: &mut Store<()>, import: &FunctionImport) -> Result<()> {
    let signature = import.signature();
    let ty = FuncType::new(
        signature.params().iter().map(|&ty| wasmi_type(ty)),
        signature.results().iter().map(|&ty| wasmi_type(ty)),
    );
    let bound = import.clone();
    let func = Func::new(
        &mut *store,
        ty,
        move |_caller: Caller<'_, ()>, params: &[Val], results: &mut [Val]| {
            let args = params
                .iter()
                .map(from_wasmi)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| WasmiError::new("unsupported argument"))?;
            let result = bound
                .call(&args)
                .map_err(|trap| WasmiError::new(trap.to_string()))?;
            if let (Some(value), Some(slot)) = (result, results.first_mut()) {
                *slot = to_wasmi(value);
            }
            Ok(())
        },
    );
    linker.define(import.module_name(), import.export_name(), func)?;
    Ok(())
}

/// Binds `env.add`, `env.log` and `env.scale`. `log` pushes into `sink`.
fn host_imports(sink: Arc<Mutex<Vec<i64>>>) -> Result<ModuleImports> {
    let binder = Binder::default();
    let mut imports = ModuleImports::new();
    imports.push(binder.wrap("env", "add", |a: i32, b: i32| a.wrapping_add(b))?)?;
    imports.push(binder.wrap("env", "log", move |value: i64| {
        sink.lock().unwrap().push(value);
    })?)?;
    imports.push(binder.wrap("env", "scale", |x: f64, k: f32| x * f64::from(k))?)?;
    Ok(imports)
}

fn encode_body(body: &[Instruction], locals: Vec<(u32, wasm_encoder::ValType)>) -> Function {
    let mut function = Function::new(locals);
    for instruction in body {
        function.instruction(&instruction.into());
    }
    function
}

/// Builds a module over [`host_imports`] with two exports: `run`, which logs
/// `add(a, b)` widened to i64 and returns it, and `scale`, which forwards to
/// the imported `scale`.
fn build_module(imports: &ModuleImports) -> Result<Vec<u8>> {
    let (mut types, import_section) = imports.encode()?;
    let run_type = add_signature(
        &mut types,
        &FunctionSignature::new(vec![ValueType::I32, ValueType::I32], Some(ValueType::I32)),
    );
    let scale_signature =
        FunctionSignature::new(vec![ValueType::F64, ValueType::F32], Some(ValueType::F64));
    let scale_type = imports
        .type_index(&scale_signature)
        .unwrap_or_else(|| add_signature(&mut types, &scale_signature));

    let mut functions = FunctionSection::new();
    functions.function(run_type);
    functions.function(scale_type);
    let run_index = imports.function_count();

    let run = encode_body(
        &[
            Instruction::LocalGet { local: 0 },
            Instruction::LocalGet { local: 1 },
            Instruction::Call { function: 0 },
            Instruction::LocalTee { local: 2 },
            Instruction::I64ExtendI32S,
            Instruction::Call { function: 1 },
            Instruction::LocalGet { local: 2 },
            Opcode::End.canonical(),
        ],
        vec![(1, wasm_encoder::ValType::I32)],
    );
    let scale = encode_body(
        &[
            Instruction::LocalGet { local: 0 },
            Instruction::LocalGet { local: 1 },
            Instruction::Call { function: 2 },
            Instruction::End,
        ],
        vec![],
    );
    let mut codes = CodeSection::new();
    codes.function(&run);
    codes.function(&scale);

    let mut exports = ExportSection::new();
    exports.export("run", ExportKind::Func, run_index);
    exports.export("scale", ExportKind::Func, run_index + 1);

    let mut wasm_module = wasm_encoder::Module::new();
    wasm_module.section(&types);
    wasm_module.section(&import_section);
    wasm_module.section(&functions);
    wasm_module.section(&exports);
    wasm_module.section(&codes);
    Ok(wasm_module.finish())
}

fn instantiate(imports: &ModuleImports) -> Result<(Store<()>, Instance)> {
    let wasm = build_module(imports)?;
    let engine = Engine::default();
    let module = Module::new(&engine, &wasm)?;
    let mut store = Store::new(&engine, ());
    let mut linker = <Linker<()>>::new(&engine);
    for import in imports.functions() {
        link(&mut linker, &mut store, import)?;
    }
    let instance = linker.instantiate(&mut store, &module)?.start(&mut store)?;
    Ok((store, instance))
}

fn run_in_wasmi(a: i32, b: i32) -> Result<(i32, Vec<i64>)> {
    let logged = Arc::new(Mutex::new(Vec::new()));
    let imports = host_imports(logged.clone())?;
    let (mut store, instance) = instantiate(&imports)?;

    let run = instance.get_typed_func::<(i32, i32), i32>(&store, "run")?;
    let result = run.call(&mut store, (a, b))?;
    let logged = logged.lock().unwrap().clone();
    Ok((result, logged))
}

#[test]
fn bound_functions_run_in_wasmi() -> Result<()> {
    let (result, logged) = run_in_wasmi(40, 2)?;
    assert_eq!(result, 42);
    assert_eq!(logged, vec![42]);

    let (result, logged) = run_in_wasmi(-5, 3)?;
    assert_eq!(result, -2);
    assert_eq!(logged, vec![-2]);
    Ok(())
}

#[test]
fn float_functions_run_in_wasmi() -> Result<()> {
    let imports = host_imports(Arc::default())?;
    let (mut store, instance) = instantiate(&imports)?;

    let scale = instance.get_typed_func::<(f64, f32), f64>(&store, "scale")?;
    assert_eq!(scale.call(&mut store, (1.5, 4.0))?, 6.0);
    assert_eq!(scale.call(&mut store, (-0.5, 0.25))?, -0.125);
    Ok(())
}

#[test]
fn module_text_shows_the_imports() -> Result<()> {
    let imports = host_imports(Arc::default())?;

    let wat = wasmprinter::print_bytes(build_module(&imports)?)?;
    assert!(wat.contains("(import \"env\" \"add\" (func"), "{wat}");
    assert!(wat.contains("(import \"env\" \"log\" (func"), "{wat}");
    assert!(wat.contains("(param i32 i32) (result i32)"), "{wat}");
    assert!(wat.contains("(param i64)"), "{wat}");
    assert!(wat.contains("(import \"env\" \"scale\" (func"), "{wat}");
    assert!(wat.contains("(param f64 f32) (result f64)"), "{wat}");
    assert!(wat.contains("i64.extend_i32_s"), "{wat}");
    Ok(())
}

#[test]
fn equal_signatures_share_a_type() -> Result<()> {
    let binder = Binder::default();
    let mut imports = ModuleImports::new();
    assert_eq!(imports.push(binder.wrap("env", "add", |a: i32, b: i32| a + b)?)?, 0);
    assert_eq!(imports.push(binder.wrap("env", "sub", |a: i32, b: i32| a - b)?)?, 1);
    assert_eq!(imports.push(binder.wrap("env", "neg", |a: i64| -a)?)?, 2);

    assert_eq!(imports.signatures().len(), 2);
    assert_eq!(imports.function_count(), 3);
    let add = FunctionSignature::new(vec![ValueType::I32, ValueType::I32], Some(ValueType::I32));
    assert_eq!(imports.type_index(&add), Some(0));
    let names: Vec<_> = imports.functions().map(|f| f.export_name().to_string()).collect();
    assert_eq!(names, vec!["add", "sub", "neg"]);
    Ok(())
}

#[test]
fn duplicate_imports_are_rejected() -> Result<()> {
    let binder = Binder::default();
    let mut imports = ModuleImports::new();
    imports.push(binder.wrap("env", "add", |a: i32, b: i32| a + b)?)?;
    let error = imports
        .push(binder.wrap("env", "add", |a: i64, b: i64| a + b)?)
        .unwrap_err();
    assert_eq!(
        error,
        AssembleError::DuplicateImport {
            module: "env".to_string(),
            name: "add".to_string(),
        }
    );
    assert_eq!(imports.function_count(), 1);
    Ok(())
}

#[test]
fn memory_imports_are_indexed_per_kind() -> Result<()> {
    let binder = Binder::default();
    let mut imports = ModuleImports::new();
    let memory = MemoryImport::new("js", "mem", Limits { minimum: 1, maximum: None });
    assert_eq!(imports.push(memory)?, 0);
    assert_eq!(imports.push(binder.wrap("js", "print", |_: i32, _: i32| {})?)?, 0);

    let kinds: Vec<_> = imports.imports().map(|import| import.kind()).collect();
    assert_eq!(kinds, vec![ExternalKind::Memory, ExternalKind::Function]);

    let (types, section) = imports.encode()?;
    assert_eq!(types.len(), 1);
    assert_eq!(section.len(), 2);
    Ok(())
}

#[test]
fn globals_cannot_be_encoded() -> Result<()> {
    let mut imports = ModuleImports::new();
    imports.push(GlobalImport::new("env", "counter", ValueType::I32, true))?;
    assert!(matches!(
        imports.encode(),
        Err(AssembleError::UnsupportedKind {
            kind: ExternalKind::Global,
            ..
        })
    ));
    Ok(())
}

#[test]
fn every_canonical_instruction_converts() {
    for &op in Opcode::ALL {
        let instruction = op.canonical();
        let _encoded: wasm_encoder::Instruction<'_> = (&instruction).into();
    }
}

#[test]
fn call_indirect_keeps_type_and_table() {
    let instruction = Instruction::CallIndirect { ty: 3, table: 1 };
    let encoded: wasm_encoder::Instruction<'_> = (&instruction).into();
    assert!(matches!(
        encoded,
        wasm_encoder::Instruction::CallIndirect {
            type_index: 3,
            table_index: 1,
        }
    ));
}
