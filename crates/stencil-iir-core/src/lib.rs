//! Statement/access IR of a stencil compiler.
//!
//! A [`DoMethod`] holds the statements computed over one vertical
//! [`Interval`], the read and write [`Accesses`] of every statement, and the
//! per-field usage derived from them. Optimization passes restructure
//! do-methods through the mutation primitives on [`DoMethod`] and then call
//! [`DoMethod::update_level`] to refresh the derived field information.

pub mod access_computation;
pub mod accesses;
pub mod ast;
pub mod config;
pub mod context;
pub mod dependency_graph;
pub mod diagnostics;
pub mod do_method;
pub mod error;
pub mod extent;
pub mod field;
pub mod ids;
pub mod interval;
pub mod metadata;
pub mod sap;

pub use access_computation::AccessComputation;
pub use accesses::{AccessMap, Accesses};
pub use ast::{Ast, Expr, FullAstCursor, Stmt, StmtCursor, StmtId, StmtKind, VarDecl};
pub use config::IirOptions;
pub use context::IirContext;
pub use dependency_graph::AccessDependencyGraph;
pub use diagnostics::{CollectingDiagnosticHandler, Diagnostic, DiagnosticHandler, DiagnosticLevel};
pub use do_method::{DerivedInfo, DetachedStatement, DoMethod, RetractionReport};
pub use error::{IirError, Result};
pub use extent::{Dim, Extent, Extents};
pub use field::{merge_fields, Field, FieldIntent, FieldMap};
pub use ids::{AccessId, DoMethodId, IdGenerator, TreeId};
pub use interval::Interval;
pub use metadata::{AccessMetadata, AccessNameResolver, FieldAccessType, VariableVersions};
pub use sap::{DetachedAccesses, SapMap, StatementAccessesPair};
