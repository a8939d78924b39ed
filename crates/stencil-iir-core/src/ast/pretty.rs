//! Source-like rendering of statements, used by the structured dump and by
//! tests.

use super::{Ast, Expr, StmtId, StmtKind};
use std::fmt::Write;

const INDENT: &str = "  ";

pub fn expr_to_string(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, false);
    out
}

/// Renders the statement `id` and its subtree. Nested statements are
/// indented by two spaces per block level.
pub fn stmt_to_string(ast: &Ast, id: StmtId) -> String {
    let mut out = String::new();
    write_stmt(&mut out, ast, id, 0);
    out
}

fn write_expr(out: &mut String, expr: &Expr, nested: bool) {
    match expr {
        Expr::Nop => {}
        Expr::Literal { value, .. } => out.push_str(value),
        Expr::Var { name, .. } => out.push_str(name),
        Expr::Field { name, offset, .. } => {
            out.push_str(name);
            if *offset != [0, 0, 0] {
                let _ = write!(out, "[{}, {}, {}]", offset[0], offset[1], offset[2]);
            }
        }
        Expr::Unary { op, operand } => {
            out.push_str(op);
            write_expr(out, operand, true);
        }
        Expr::Binary { op, lhs, rhs } => {
            if nested {
                out.push('(');
            }
            write_expr(out, lhs, true);
            let _ = write!(out, " {op} ");
            write_expr(out, rhs, true);
            if nested {
                out.push(')');
            }
        }
        Expr::Assign { op, target, value } => {
            write_expr(out, target, false);
            let _ = write!(out, " {op} ");
            write_expr(out, value, false);
        }
        Expr::FunCall { callee, args } => {
            out.push_str(callee);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg, false);
            }
            out.push(')');
        }
    }
}

fn write_stmt(out: &mut String, ast: &Ast, id: StmtId, depth: usize) {
    let pad = INDENT.repeat(depth);
    match ast.kind(id) {
        StmtKind::Expr(expr) => {
            out.push_str(&pad);
            write_expr(out, expr, false);
            out.push_str(";\n");
        }
        StmtKind::Block(stmts) => {
            out.push_str(&pad);
            out.push_str("{\n");
            for stmt in stmts {
                write_stmt(out, ast, *stmt, depth + 1);
            }
            out.push_str(&pad);
            out.push_str("}\n");
        }
        StmtKind::If {
            cond,
            then_stmt,
            else_stmt,
        } => {
            out.push_str(&pad);
            out.push_str("if (");
            out.push_str(&condition_text(ast, *cond));
            out.push_str(")\n");
            write_stmt(out, ast, *then_stmt, depth + 1);
            if let Some(else_stmt) = else_stmt {
                out.push_str(&pad);
                out.push_str("else\n");
                write_stmt(out, ast, *else_stmt, depth + 1);
            }
        }
        StmtKind::VarDecl(decl) => {
            out.push_str(&pad);
            let _ = write!(out, "var {}", decl.name);
            if let Some(init) = &decl.init {
                out.push_str(" = ");
                write_expr(out, init, false);
            }
            out.push_str(";\n");
        }
        StmtKind::StencilFunCall {
            callee,
            offset,
            args,
            body,
        } => {
            out.push_str(&pad);
            out.push_str(callee);
            if *offset != [0, 0, 0] {
                let _ = write!(out, "[{}, {}, {}]", offset[0], offset[1], offset[2]);
            }
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg, false);
            }
            out.push_str(")\n");
            write_stmt(out, ast, *body, depth);
        }
        StmtKind::StencilCall { callee } => {
            out.push_str(&pad);
            let _ = writeln!(out, "stencil-call: {callee};");
        }
    }
}

fn condition_text(ast: &Ast, cond: StmtId) -> String {
    match ast.kind(cond) {
        StmtKind::Expr(expr) => expr_to_string(expr),
        _ => stmt_to_string(ast, cond).trim().to_string(),
    }
}
