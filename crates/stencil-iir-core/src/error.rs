//! Errors raised by the IR layer.

use crate::ast::StmtId;
use crate::ids::{AccessId, TreeId};
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, IirError>;

/// Errors of the statement/access IR.
///
/// Shape and cursor errors are precondition violations of the caller;
/// lookup errors can be avoided by checking existence first.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IirError {
    #[error("statement {0:?} is not a block statement")]
    InvalidRoot(StmtId),

    #[error("cursor does not designate a first-level statement")]
    NotTopLevel,

    #[error("cursor does not designate a statement")]
    NotAStatement,

    #[error("source and destination cursors belong to the same tree")]
    SameTree,

    #[error("cursor belongs to tree {found}, expected tree {expected}")]
    ForeignCursor { expected: TreeId, found: TreeId },

    #[error("access ID {0} is not a field of this do-method")]
    UnknownField(AccessId),

    #[error("access ID {0} is not a registered version")]
    NotAVersion(AccessId),

    #[error("access ID {0} is not registered")]
    UnknownAccessId(AccessId),

    #[error("access ID {0} is already part of another version list")]
    VersionConflict(AccessId),

    #[error("no accesses recorded for statement {0:?}")]
    MissingStatementAccesses(StmtId),

    #[error("subtree has {expected} statement(s) but {found} accesses pair(s) were supplied")]
    SubtreeSizeMismatch { expected: usize, found: usize },

    #[error("the root of a do-method body must be a block statement")]
    RootNotBlock,

    #[error("construction halted by {errors} upstream error diagnostic(s)")]
    UpstreamDiagnostics { errors: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<serde_yaml::Error> for IirError {
    fn from(err: serde_yaml::Error) -> Self {
        IirError::Config(err.to_string())
    }
}
