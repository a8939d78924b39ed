//! Statement trees of a do-method body.
//!
//! Two representations exist:
//!
//! - [`Stmt`] is an owned, recursive tree. The front end produces it, and it
//!   is what a pruned statement looks like once it leaves a tree.
//! - [`Ast`] interns statements into an arena with stable [`StmtId`] indices.
//!   Side tables key on these indices instead of node addresses.
//!
//! Traversal happens through two cursor types: [`StmtCursor`] visits the
//! direct children of a block, [`FullAstCursor`] walks a whole subtree in
//! pre-order. Both designate nodes by ID, so a cursor keeps pointing at the
//! same statement when siblings are inserted around it.

mod arena;
mod cursor;
mod ops;
mod pretty;

pub use arena::{Ast, StmtId, StmtNode};
pub use cursor::{FullAstCursor, StmtCursor};
pub use pretty::{expr_to_string, stmt_to_string};

use crate::ids::AccessId;

/// Expressions appearing inside statements.
///
/// `access_id` slots are `None` until the statement is mapped into a
/// do-method, which resolves names and allocates literal IDs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Expression without effect.
    Nop,
    Literal {
        value: String,
        access_id: Option<AccessId>,
    },
    Var {
        name: String,
        access_id: Option<AccessId>,
    },
    Field {
        name: String,
        offset: [i32; 3],
        access_id: Option<AccessId>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
    },
    Binary {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `target op value`, where `op` is `=` or a compound assignment.
    Assign {
        op: String,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    FunCall {
        callee: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn literal(value: impl Into<String>) -> Self {
        Expr::Literal {
            value: value.into(),
            access_id: None,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var {
            name: name.into(),
            access_id: None,
        }
    }

    pub fn field(name: impl Into<String>, offset: [i32; 3]) -> Self {
        Expr::Field {
            name: name.into(),
            offset,
            access_id: None,
        }
    }

    pub fn binary(op: impl Into<String>, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op: op.into(),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            op: "=".to_string(),
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    /// Calls `f` on this expression and every sub-expression, pre-order.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Nop | Expr::Literal { .. } | Expr::Var { .. } | Expr::Field { .. } => {}
            Expr::Unary { operand, .. } => operand.walk(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.walk(f);
                rhs.walk(f);
            }
            Expr::Assign { target, value, .. } => {
                target.walk(f);
                value.walk(f);
            }
            Expr::FunCall { args, .. } => {
                for arg in args {
                    arg.walk(f);
                }
            }
        }
    }

    /// Mutable pre-order walk.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        f(self);
        match self {
            Expr::Nop | Expr::Literal { .. } | Expr::Var { .. } | Expr::Field { .. } => {}
            Expr::Unary { operand, .. } => operand.walk_mut(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.walk_mut(f);
                rhs.walk_mut(f);
            }
            Expr::Assign { target, value, .. } => {
                target.walk_mut(f);
                value.walk_mut(f);
            }
            Expr::FunCall { args, .. } => {
                for arg in args {
                    arg.walk_mut(f);
                }
            }
        }
    }
}

/// Local variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    pub name: String,
    pub init: Option<Expr>,
    pub access_id: Option<AccessId>,
}

/// Owned statement tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        cond: Box<Stmt>,
        then_stmt: Box<Stmt>,
        else_stmt: Option<Box<Stmt>>,
    },
    VarDecl(VarDecl),
    /// Call of a stencil function whose body has been inlined. `offset` is
    /// the call-site offset folded into the caller accesses of the body.
    StencilFunCall {
        callee: String,
        offset: [i32; 3],
        args: Vec<Expr>,
        body: Box<Stmt>,
    },
    StencilCall {
        callee: String,
    },
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Stmt::Block(stmts)
    }

    pub fn var_decl(name: impl Into<String>, init: Option<Expr>) -> Self {
        Stmt::VarDecl(VarDecl {
            name: name.into(),
            init,
            access_id: None,
        })
    }

    pub fn if_stmt(cond: Expr, then_stmt: Stmt, else_stmt: Option<Stmt>) -> Self {
        Stmt::If {
            cond: Box::new(Stmt::Expr(cond)),
            then_stmt: Box::new(then_stmt),
            else_stmt: else_stmt.map(Box::new),
        }
    }

    /// Number of statement nodes in this tree, the root included.
    pub fn size(&self) -> usize {
        1 + match self {
            Stmt::Expr(_) | Stmt::VarDecl(_) | Stmt::StencilCall { .. } => 0,
            Stmt::Block(stmts) => stmts.iter().map(Stmt::size).sum(),
            Stmt::If {
                cond,
                then_stmt,
                else_stmt,
            } => cond.size() + then_stmt.size() + else_stmt.as_ref().map_or(0, |s| s.size()),
            Stmt::StencilFunCall { body, .. } => body.size(),
        }
    }
}

/// Arena form of a statement; children are referenced by ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StmtKind {
    Expr(Expr),
    Block(Vec<StmtId>),
    If {
        cond: StmtId,
        then_stmt: StmtId,
        else_stmt: Option<StmtId>,
    },
    VarDecl(VarDecl),
    StencilFunCall {
        callee: String,
        offset: [i32; 3],
        args: Vec<Expr>,
        body: StmtId,
    },
    StencilCall {
        callee: String,
    },
}

impl StmtKind {
    /// Direct children in visiting order.
    pub fn children(&self) -> Vec<StmtId> {
        match self {
            StmtKind::Expr(_) | StmtKind::VarDecl(_) | StmtKind::StencilCall { .. } => Vec::new(),
            StmtKind::Block(stmts) => stmts.clone(),
            StmtKind::If {
                cond,
                then_stmt,
                else_stmt,
            } => {
                let mut children = vec![*cond, *then_stmt];
                children.extend(else_stmt);
                children
            }
            StmtKind::StencilFunCall { body, .. } => vec![*body],
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, StmtKind::Block(_))
    }

    /// Expressions owned directly by this node, not by its children.
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            StmtKind::Expr(expr) => vec![expr],
            StmtKind::VarDecl(decl) => decl.init.iter().collect(),
            StmtKind::StencilFunCall { args, .. } => args.iter().collect(),
            StmtKind::Block(_) | StmtKind::If { .. } | StmtKind::StencilCall { .. } => Vec::new(),
        }
    }

    pub fn exprs_mut(&mut self) -> Vec<&mut Expr> {
        match self {
            StmtKind::Expr(expr) => vec![expr],
            StmtKind::VarDecl(decl) => decl.init.iter_mut().collect(),
            StmtKind::StencilFunCall { args, .. } => args.iter_mut().collect(),
            StmtKind::Block(_) | StmtKind::If { .. } | StmtKind::StencilCall { .. } => Vec::new(),
        }
    }
}
