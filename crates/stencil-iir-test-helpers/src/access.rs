//! Reference access computation
//!
//! Derives the accesses of each statement from its expressions:
//!
//! - the target of an assignment is written (and also read for compound
//!   assignments such as `+=`)
//! - a variable declaration writes the declared variable
//! - every other field, variable or literal occurrence is read
//!
//! Compound statements (blocks, ifs, stencil-function calls) carry the union
//! of the accesses of their nested statements. Statements inside the body
//! of a stencil-function call get the call offset folded into their caller
//! accesses and keep the unshifted accesses as callee accesses.

use stencil_iir_core::{
    AccessComputation, AccessId, AccessMetadata, Accesses, Ast, DiagnosticHandler, Expr,
    Extents, SapMap, StmtId, StmtKind,
};
use stencil_iir_core::diagnostics::Diagnostic;
use tracing::trace;

#[derive(Debug, Clone, Copy, Default)]
pub struct ExprAccessComputation;

impl AccessComputation for ExprAccessComputation {
    fn compute_accesses(
        &self,
        _metadata: &AccessMetadata,
        ast: &Ast,
        stmts: &[StmtId],
        saps: &mut SapMap,
        diagnostics: &dyn DiagnosticHandler,
    ) {
        for stmt in stmts {
            visit(ast, *stmt, None, saps, diagnostics);
        }
    }
}

/// Fills the pair of `stmt` and its subtree; returns the accesses of the
/// subtree in the frame of the enclosing function (unshifted).
fn visit(
    ast: &Ast,
    stmt: StmtId,
    shift: Option<[i32; 3]>,
    saps: &mut SapMap,
    diagnostics: &dyn DiagnosticHandler,
) -> Accesses {
    let mut local = Accesses::new();
    let kind = ast.kind(stmt);

    if let StmtKind::VarDecl(decl) = kind {
        match decl.access_id {
            Some(id) => local.record_write(id, Extents::zero()),
            None => report_unmapped(diagnostics, &decl.name, stmt),
        }
    }
    for expr in kind.exprs() {
        record_expr(expr, &mut local, stmt, diagnostics);
    }

    match kind {
        StmtKind::StencilFunCall { offset, body, .. } => {
            let inner = compose(shift, *offset);
            let mut body_accesses = visit(ast, *body, Some(inner), saps, diagnostics);
            body_accesses = shifted(&body_accesses, *offset);
            local.merge(&body_accesses);
        }
        _ => {
            for child in ast.children(stmt) {
                let nested = visit(ast, child, shift, saps, diagnostics);
                local.merge(&nested);
            }
        }
    }

    if let Some(sap) = saps.get_mut(&stmt) {
        match shift {
            Some(offset) => {
                sap.set_caller_accesses(shifted(&local, offset));
                sap.set_callee_accesses(local.clone());
            }
            None => sap.set_caller_accesses(local.clone()),
        }
    }
    trace!(stmt = ?stmt, "computed accesses");
    local
}

fn record_expr(expr: &Expr, acc: &mut Accesses, stmt: StmtId, diagnostics: &dyn DiagnosticHandler) {
    match expr {
        Expr::Assign { op, target, value } => {
            if let Some((id, extents)) = target_access(target, stmt, diagnostics) {
                acc.record_write(id, extents);
                if op != "=" {
                    acc.record_read(id, extents);
                }
            }
            record_expr(value, acc, stmt, diagnostics);
        }
        Expr::Field { .. } | Expr::Var { .. } | Expr::Literal { .. } => {
            if let Some((id, extents)) = target_access(expr, stmt, diagnostics) {
                acc.record_read(id, extents);
            }
        }
        Expr::Unary { operand, .. } => record_expr(operand, acc, stmt, diagnostics),
        Expr::Binary { lhs, rhs, .. } => {
            record_expr(lhs, acc, stmt, diagnostics);
            record_expr(rhs, acc, stmt, diagnostics);
        }
        Expr::FunCall { args, .. } => {
            for arg in args {
                record_expr(arg, acc, stmt, diagnostics);
            }
        }
        Expr::Nop => {}
    }
}

/// Access ID and extents of a leaf expression.
fn target_access(
    expr: &Expr,
    stmt: StmtId,
    diagnostics: &dyn DiagnosticHandler,
) -> Option<(AccessId, Extents)> {
    let (name, offset, access_id) = match expr {
        Expr::Field {
            name,
            offset,
            access_id,
        } => (name, *offset, *access_id),
        Expr::Var { name, access_id } => (name, [0, 0, 0], *access_id),
        Expr::Literal { value, access_id } => (value, [0, 0, 0], *access_id),
        _ => return None,
    };
    match access_id {
        Some(id) => Some((id, Extents::from_offset(offset))),
        None => {
            report_unmapped(diagnostics, name, stmt);
            None
        }
    }
}

fn report_unmapped(diagnostics: &dyn DiagnosticHandler, name: &str, stmt: StmtId) {
    diagnostics.report(Diagnostic::error(format!("`{name}` has no access ID")).at(stmt));
}

fn compose(shift: Option<[i32; 3]>, offset: [i32; 3]) -> [i32; 3] {
    let base = shift.unwrap_or([0, 0, 0]);
    [base[0] + offset[0], base[1] + offset[1], base[2] + offset[2]]
}

fn shifted(accesses: &Accesses, offset: [i32; 3]) -> Accesses {
    let mut out = Accesses::new();
    for (id, extents) in accesses.read_accesses() {
        let mut extents = *extents;
        extents.shift(offset);
        out.record_read(*id, extents);
    }
    for (id, extents) in accesses.write_accesses() {
        let mut extents = *extents;
        extents.shift(offset);
        out.record_write(*id, extents);
    }
    out
}
