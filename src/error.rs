use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::import::ExternalKind;
use crate::types::HostType;

/// Why a host callable could not become a function import.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    #[error("Missing {0}")]
    MissingArgument(Missing),
    #[error("'{name}' cannot be imported: {reason}")]
    IneligibleCallable { name: String, reason: Ineligibility },
    #[error("Unsupported {position} type '{ty}'")]
    UnsupportedType { ty: HostType, position: TypePosition },
    #[error("'{name}' takes {count} parameters but at most {max} are supported")]
    ArityExceeded {
        name: String,
        count: usize,
        max: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    #[error("module name")]
    ModuleName,
    #[error("export name")]
    ExportName,
    #[error("callable body")]
    Body,
    #[error("callable: {0}")]
    Unresolved(#[from] ResolutionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    NotPublic,
    InstanceBound,
    Incomplete,
}

impl Display for Ineligibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Ineligibility::NotPublic => write!(f, "it is not public"),
            Ineligibility::InstanceBound => write!(f, "it needs an instance to be called on"),
            Ineligibility::Incomplete => write!(f, "its definition is not complete"),
        }
    }
}

/// Where an untranslatable type was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePosition {
    Return,
    Param(usize),
}

impl Display for TypePosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TypePosition::Return => write!(f, "return"),
            TypePosition::Param(index) => write!(f, "parameter {index}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unable to resolve '{handle}': {reason}")]
pub struct ResolutionError {
    pub handle: String,
    pub reason: String,
}

/// Failures while laying imports out for a module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error("Import '{module}' '{name}' is declared twice")]
    DuplicateImport { module: String, name: String },
    #[error("Import '{module}' '{name}': {kind} imports cannot be encoded")]
    UnsupportedKind {
        module: String,
        name: String,
        kind: ExternalKind,
    },
    #[error("Too many {0} imports")]
    IndexOverflow(ExternalKind),
}
