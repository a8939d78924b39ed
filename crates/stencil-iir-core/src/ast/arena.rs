//! Arena storage for statement trees.
//!
//! Every statement of a tree lives in one `id_arena::Arena`, which gives:
//!
//! - stable `StmtId` handles that survive insertion and removal of siblings
//! - cheap identity-keyed side tables (`StmtId` is `Copy + Hash`)
//! - no aliasing between the tree and the tables that annotate it
//!
//! Nodes are never freed individually. A pruned subtree stays in the arena,
//! detached from its parent, and becomes unreachable from the root until
//! the owning do-method is compacted.

use super::{Stmt, StmtKind, VarDecl};
use crate::error::{IirError, Result};
use crate::ids::{IdGenerator, TreeId};
use id_arena::{Arena, Id};
use rustc_hash::FxHashMap;

/// Handle of a statement inside an [`Ast`].
pub type StmtId = Id<StmtNode>;

/// A statement plus its link to the enclosing statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StmtNode {
    pub kind: StmtKind,
    parent: Option<StmtId>,
}

impl StmtNode {
    pub fn parent(&self) -> Option<StmtId> {
        self.parent
    }
}

/// A statement tree whose root is a block statement.
pub struct Ast {
    tree: TreeId,
    nodes: Arena<StmtNode>,
    root: StmtId,
}

impl Ast {
    /// Creates a tree consisting of an empty root block.
    pub fn new(ids: &IdGenerator) -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(StmtNode {
            kind: StmtKind::Block(Vec::new()),
            parent: None,
        });
        Ast {
            tree: ids.next_tree_id(),
            nodes,
            root,
        }
    }

    /// Interns an owned tree. Its root must be a block statement.
    pub fn from_stmt(stmt: Stmt, ids: &IdGenerator) -> Result<Self> {
        if !matches!(stmt, Stmt::Block(_)) {
            return Err(IirError::RootNotBlock);
        }
        let mut nodes = Arena::new();
        let root = alloc_subtree(&mut nodes, stmt, None);
        Ok(Ast {
            tree: ids.next_tree_id(),
            nodes,
            root,
        })
    }

    pub fn tree_id(&self) -> TreeId {
        self.tree
    }

    pub fn root(&self) -> StmtId {
        self.root
    }

    pub fn node(&self, id: StmtId) -> &StmtNode {
        &self.nodes[id]
    }

    pub fn kind(&self, id: StmtId) -> &StmtKind {
        &self.nodes[id].kind
    }

    pub(crate) fn kind_mut(&mut self, id: StmtId) -> &mut StmtKind {
        &mut self.nodes[id].kind
    }

    pub fn parent(&self, id: StmtId) -> Option<StmtId> {
        self.nodes[id].parent
    }

    pub fn children(&self, id: StmtId) -> Vec<StmtId> {
        self.nodes[id].kind.children()
    }

    /// Children of a block statement, `None` for other statements.
    pub fn block_children(&self, id: StmtId) -> Option<&[StmtId]> {
        match &self.nodes[id].kind {
            StmtKind::Block(stmts) => Some(stmts),
            _ => None,
        }
    }

    pub(crate) fn block_children_mut(&mut self, id: StmtId) -> Result<&mut Vec<StmtId>> {
        match &mut self.nodes[id].kind {
            StmtKind::Block(stmts) => Ok(stmts),
            _ => Err(IirError::InvalidRoot(id)),
        }
    }

    /// First-level statements of the root block.
    pub fn stmts(&self) -> &[StmtId] {
        self.block_children(self.root).unwrap_or(&[])
    }

    /// Whether `id` is reachable from the root.
    pub fn is_attached(&self, id: StmtId) -> bool {
        let mut node = id;
        loop {
            if node == self.root {
                return true;
            }
            match self.nodes[node].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    /// `id` and all its descendants in pre-order.
    pub fn subtree_preorder(&self, id: StmtId) -> Vec<StmtId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children = self.children(node);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Every statement reachable from the root, the root excluded.
    pub fn reachable_stmts(&self) -> Vec<StmtId> {
        let mut all = self.subtree_preorder(self.root);
        all.remove(0);
        all
    }

    /// Number of nodes allocated in the arena, detached ones included.
    pub fn allocated_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes still allocated but no longer reachable from the root.
    pub fn detached_nodes(&self) -> usize {
        self.nodes.len() - self.subtree_preorder(self.root).len()
    }

    /// Rebuilds the owned form of the subtree rooted at `id`.
    pub fn to_stmt(&self, id: StmtId) -> Stmt {
        match &self.nodes[id].kind {
            StmtKind::Expr(expr) => Stmt::Expr(expr.clone()),
            StmtKind::Block(stmts) => Stmt::Block(stmts.iter().map(|s| self.to_stmt(*s)).collect()),
            StmtKind::If {
                cond,
                then_stmt,
                else_stmt,
            } => Stmt::If {
                cond: Box::new(self.to_stmt(*cond)),
                then_stmt: Box::new(self.to_stmt(*then_stmt)),
                else_stmt: else_stmt.map(|s| Box::new(self.to_stmt(s))),
            },
            StmtKind::VarDecl(decl) => Stmt::VarDecl(decl.clone()),
            StmtKind::StencilFunCall {
                callee,
                offset,
                args,
                body,
            } => Stmt::StencilFunCall {
                callee: callee.clone(),
                offset: *offset,
                args: args.clone(),
                body: Box::new(self.to_stmt(*body)),
            },
            StmtKind::StencilCall { callee } => Stmt::StencilCall {
                callee: callee.clone(),
            },
        }
    }

    /// Deep copy into a fresh tree. Returns the copy and the mapping from
    /// reachable statements of `self` to their counterparts in the copy.
    pub fn clone_with_mapping(&self, ids: &IdGenerator) -> (Ast, FxHashMap<StmtId, StmtId>) {
        let mut nodes = Arena::new();
        let root = alloc_subtree(&mut nodes, self.to_stmt(self.root), None);
        let copy = Ast {
            tree: ids.next_tree_id(),
            nodes,
            root,
        };
        let mapping = self
            .subtree_preorder(self.root)
            .into_iter()
            .zip(copy.subtree_preorder(copy.root))
            .collect();
        (copy, mapping)
    }

    /// Allocates `stmt` and its descendants, linked below `parent`.
    ///
    /// Nodes are allocated in pre-order, so the returned root followed by
    /// `subtree_preorder` order matches `stmt`'s own pre-order.
    pub(crate) fn alloc(&mut self, stmt: Stmt, parent: Option<StmtId>) -> StmtId {
        alloc_subtree(&mut self.nodes, stmt, parent)
    }

    pub(crate) fn set_parent(&mut self, id: StmtId, parent: Option<StmtId>) {
        self.nodes[id].parent = parent;
    }
}

fn alloc_subtree(nodes: &mut Arena<StmtNode>, stmt: Stmt, parent: Option<StmtId>) -> StmtId {
    // Allocate the node first with a placeholder so children can link to it.
    let id = nodes.alloc(StmtNode {
        kind: StmtKind::Block(Vec::new()),
        parent,
    });
    let kind = match stmt {
        Stmt::Expr(expr) => StmtKind::Expr(expr),
        Stmt::Block(stmts) => StmtKind::Block(
            stmts
                .into_iter()
                .map(|s| alloc_subtree(nodes, s, Some(id)))
                .collect(),
        ),
        Stmt::If {
            cond,
            then_stmt,
            else_stmt,
        } => {
            let cond = alloc_subtree(nodes, *cond, Some(id));
            let then_stmt = alloc_subtree(nodes, *then_stmt, Some(id));
            let else_stmt = else_stmt.map(|s| alloc_subtree(nodes, *s, Some(id)));
            StmtKind::If {
                cond,
                then_stmt,
                else_stmt,
            }
        }
        Stmt::VarDecl(VarDecl {
            name,
            init,
            access_id,
        }) => StmtKind::VarDecl(VarDecl {
            name,
            init,
            access_id,
        }),
        Stmt::StencilFunCall {
            callee,
            offset,
            args,
            body,
        } => StmtKind::StencilFunCall {
            callee,
            offset,
            args,
            body: alloc_subtree(nodes, *body, Some(id)),
        },
        Stmt::StencilCall { callee } => StmtKind::StencilCall { callee },
    };
    nodes[id].kind = kind;
    id
}

impl std::fmt::Debug for Ast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ast")
            .field("tree", &self.tree)
            .field("root", &self.root)
            .field("stmts", &self.stmts().len())
            .field("allocated", &self.nodes.len())
            .finish()
    }
}
