//! Seam to the pass that derives per-statement accesses from expressions.

use crate::ast::{Ast, StmtId};
use crate::diagnostics::DiagnosticHandler;
use crate::metadata::AccessMetadata;
use crate::sap::SapMap;

/// Fills the accesses of statements that already have an (empty) entry in
/// the side table.
///
/// For each statement in `stmts` the implementation is expected to fill the
/// pair of that statement and of every statement nested below it. Problems
/// such as unresolved symbols are reported through `diagnostics`; the caller
/// stops building the do-method if any error was reported.
pub trait AccessComputation {
    fn compute_accesses(
        &self,
        metadata: &AccessMetadata,
        ast: &Ast,
        stmts: &[StmtId],
        saps: &mut SapMap,
        diagnostics: &dyn DiagnosticHandler,
    );
}

impl<F> AccessComputation for F
where
    F: Fn(&AccessMetadata, &Ast, &[StmtId], &mut SapMap, &dyn DiagnosticHandler),
{
    fn compute_accesses(
        &self,
        metadata: &AccessMetadata,
        ast: &Ast,
        stmts: &[StmtId],
        saps: &mut SapMap,
        diagnostics: &dyn DiagnosticHandler,
    ) {
        self(metadata, ast, stmts, saps, diagnostics)
    }
}
