
use std::fmt::{Debug, Formatter};

use tracing::{debug, trace};

use crate::error::{BindError, Ineligibility, Missing, ResolutionError, TypePosition};
use crate::import::FunctionImport;
use crate::types::{FunctionSignature, HostType, HostValue, ValueType};
use crate::value::{ArgCursor, HostFunc, Trap, Value};

/// Highest parameter count accepted unless configured otherwise.
pub const MAX_PARAMS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Receiver {
    #[default]
    Static,
    Instance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Definition {
    #[default]
    Complete,
    UnderConstruction,
}

/// Reflective description of a host callable: what it declares to take and
/// return, how it can be reached, and the code to run.
#[derive(Clone, Default)]
pub struct HostMethod {
    pub name: String,
    pub visibility: Visibility,
    pub receiver: Receiver,
    pub definition: Definition,
    pub params: Vec<HostType>,
    pub result: Option<HostType>,
    pub body: Option<HostFunc>,
}

impl HostMethod {
    pub fn new(name: &str) -> Self {
        HostMethod {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn param(mut self, ty: HostType) -> Self {
        self.params.push(ty);
        self
    }

    pub fn returns(mut self, ty: HostType) -> Self {
        self.result = Some(ty);
        self
    }

    pub fn body<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Option<Value>, Trap> + Send + Sync + 'static,
    {
        self.body = Some(HostFunc::new(f));
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn instance(mut self) -> Self {
        self.receiver = Receiver::Instance;
        self
    }

    pub fn under_construction(mut self) -> Self {
        self.definition = Definition::UnderConstruction;
        self
    }
}

impl Debug for HostMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostMethod")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("receiver", &self.receiver)
            .field("definition", &self.definition)
            .field("params", &self.params)
            .field("result", &self.result)
            .field("body", &self.body.is_some())
            .finish()
    }
}

/// Turns a host-specific handle into a method description.
pub trait Resolver {
    type Handle: ?Sized;

    fn resolve(&self, handle: &Self::Handle) -> Result<HostMethod, ResolutionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinderConfig {
    pub max_params: usize,
}

impl Default for BinderConfig {
    fn default() -> Self {
        BinderConfig {
            max_params: MAX_PARAMS,
        }
    }
}

/// Builds function imports out of host callables.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    config: BinderConfig,
}

impl Binder {
    pub fn new(config: BinderConfig) -> Self {
        Binder { config }
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    /// Binds a described host method, checking it in this order: names and
    /// body present, callable eligible, return type, parameter types, arity.
    pub fn bind(
        &self,
        module_name: &str,
        export_name: &str,
        method: &HostMethod,
    ) -> Result<FunctionImport, BindError> {
        check_names(module_name, export_name)?;
        let Some(body) = &method.body else {
            return Err(BindError::MissingArgument(Missing::Body));
        };
        check_eligible(method)?;

        let result = match &method.result {
            None | Some(HostType::Unit) => None,
            Some(ty) => Some(translate(ty, TypePosition::Return)?),
        };
        let params = method
            .params
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                let value_type = translate(ty, TypePosition::Param(index))?;
                trace!(index, host = %ty, wasm = %value_type, "parameter translated");
                Ok(value_type)
            })
            .collect::<Result<Vec<_>, BindError>>()?;
        self.check_arity(&method.name, params.len())?;

        let signature = FunctionSignature::new(params, result);
        debug!(module = module_name, export = export_name, %signature, "host method bound");
        Ok(FunctionImport::new(
            module_name,
            export_name,
            signature,
            body.clone(),
        ))
    }

    /// Resolves `handle` first, then binds the method it names.
    pub fn bind_resolved<R: Resolver>(
        &self,
        module_name: &str,
        export_name: &str,
        resolver: &R,
        handle: &R::Handle,
    ) -> Result<FunctionImport, BindError> {
        check_names(module_name, export_name)?;
        let method = resolver.resolve(handle).map_err(|e| {
            debug!(error = %e, "host method resolution failed");
            BindError::MissingArgument(Missing::from(e))
        })?;
        self.bind(module_name, export_name, &method)
    }

    /// Binds a Rust function or closure. Its parameter and return types are
    /// translated at compile time through [`HostValue`].
    pub fn wrap<Params, Results, F>(
        &self,
        module_name: &str,
        export_name: &str,
        f: F,
    ) -> Result<FunctionImport, BindError>
    where
        F: IntoHostFunc<Params, Results>,
    {
        check_names(module_name, export_name)?;
        let (signature, func) = f.into_host_func();
        self.check_arity(export_name, signature.params().len())?;
        debug!(module = module_name, export = export_name, %signature, "host function wrapped");
        Ok(FunctionImport::new(module_name, export_name, signature, func))
    }

    fn check_arity(&self, name: &str, count: usize) -> Result<(), BindError> {
        if count > self.config.max_params {
            return Err(BindError::ArityExceeded {
                name: name.to_string(),
                count,
                max: self.config.max_params,
            });
        }
        Ok(())
    }
}

fn check_names(module_name: &str, export_name: &str) -> Result<(), BindError> {
    if module_name.is_empty() {
        return Err(BindError::MissingArgument(Missing::ModuleName));
    }
    if export_name.is_empty() {
        return Err(BindError::MissingArgument(Missing::ExportName));
    }
    Ok(())
}

fn check_eligible(method: &HostMethod) -> Result<(), BindError> {
    let reason = if method.visibility != Visibility::Public {
        Ineligibility::NotPublic
    } else if method.receiver != Receiver::Static {
        Ineligibility::InstanceBound
    } else if method.definition != Definition::Complete {
        Ineligibility::Incomplete
    } else {
        return Ok(());
    };
    Err(BindError::IneligibleCallable {
        name: method.name.clone(),
        reason,
    })
}

fn translate(ty: &HostType, position: TypePosition) -> Result<ValueType, BindError> {
    ty.value_type().ok_or_else(|| BindError::UnsupportedType {
        ty: ty.clone(),
        position,
    })
}

/// What a wrapped Rust function may return: nothing, one [`HostValue`], or
/// either of those inside a `Result` carrying a [`Trap`].
pub trait HostResult {
    const RESULT: Option<ValueType>;

    fn into_result(self) -> Result<Option<Value>, Trap>;
}

impl HostResult for () {
    const RESULT: Option<ValueType> = None;

    fn into_result(self) -> Result<Option<Value>, Trap> {
        Ok(None)
    }
}

impl HostResult for Result<(), Trap> {
    const RESULT: Option<ValueType> = None;

    fn into_result(self) -> Result<Option<Value>, Trap> {
        self.map(|()| None)
    }
}

macro_rules! host_result {
    ($($ty:ty),*) => {
        $(
            impl HostResult for $ty {
                const RESULT: Option<ValueType> = Some(<$ty as HostValue>::VALUE_TYPE);

                fn into_result(self) -> Result<Option<Value>, Trap> {
                    Ok(Some(self.into_value()))
                }
            }

            impl HostResult for Result<$ty, Trap> {
                const RESULT: Option<ValueType> = Some(<$ty as HostValue>::VALUE_TYPE);

                fn into_result(self) -> Result<Option<Value>, Trap> {
                    self.map(|value| Some(value.into_value()))
                }
            }
        )*
    };
}

host_result!(i32, i64, f32, f64);

/// Rust functions that can be bound without a descriptor.
///
/// Implemented for every `Fn` of up to sixteen [`HostValue`] parameters that
/// returns a [`HostResult`].
pub trait IntoHostFunc<Params, Results>: Send + Sync + 'static {
    fn into_host_func(self) -> (FunctionSignature, HostFunc);
}

macro_rules! into_host_func {
    ($($param:ident $arg:ident),*) => {
        impl<F, R, $($param,)*> IntoHostFunc<($($param,)*), R> for F
        where
            F: Fn($($param),*) -> R + Send + Sync + 'static,
            R: HostResult,
            $($param: HostValue,)*
        {
            #[allow(unused_mut)]
            fn into_host_func(self) -> (FunctionSignature, HostFunc) {
                let params: Vec<ValueType> = vec![$(<$param as HostValue>::VALUE_TYPE),*];
                let arity = params.len();
                let func = HostFunc::new(move |args: &[Value]| {
                    let mut cursor = ArgCursor::new(args);
                    $( let $arg = cursor.next::<$param>(arity)?; )*
                    cursor.finish(arity)?;
                    (self)($($arg),*).into_result()
                });
                (FunctionSignature::new(params, R::RESULT), func)
            }
        }
    };
}

into_host_func!();
into_host_func!(A1 a1);
into_host_func!(A1 a1, A2 a2);
into_host_func!(A1 a1, A2 a2, A3 a3);
into_host_func!(A1 a1, A2 a2, A3 a3, A4 a4);
into_host_func!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
into_host_func!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
into_host_func!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);
into_host_func!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8);
into_host_func!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8, A9 a9);
into_host_func!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8, A9 a9, A10 a10);
into_host_func!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8, A9 a9, A10 a10, A11 a11);
into_host_func!(
    A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8, A9 a9, A10 a10, A11 a11, A12 a12
);
into_host_func!(
    A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8, A9 a9, A10 a10, A11 a11, A12 a12,
    A13 a13
);
into_host_func!(
    A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8, A9 a9, A10 a10, A11 a11, A12 a12,
    A13 a13, A14 a14
);
into_host_func!(
    A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8, A9 a9, A10 a10, A11 a11, A12 a12,
    A13 a13, A14 a14, A15 a15
);
into_host_func!(
    A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7, A8 a8, A9 a9, A10 a10, A11 a11, A12 a12,
    A13 a13, A14 a14, A15 a15, A16 a16
);
