//! First-level and full-depth cursors over an [`Ast`].
//!
//! Cursors are plain positions (tree, traversal root, current node) and do
//! not borrow the tree; they are advanced through methods on [`Ast`]. `None`
//! as current node means "end".

use super::{Ast, StmtId};
use crate::error::{IirError, Result};
use crate::ids::TreeId;

/// Position among the direct children of a block statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtCursor {
    tree: TreeId,
    root: StmtId,
    current: Option<StmtId>,
}

impl StmtCursor {
    pub(crate) fn new(tree: TreeId, root: StmtId, current: Option<StmtId>) -> Self {
        StmtCursor {
            tree,
            root,
            current,
        }
    }

    pub fn tree(&self) -> TreeId {
        self.tree
    }

    /// The block whose children this cursor visits.
    pub fn root(&self) -> StmtId {
        self.root
    }

    pub fn current(&self) -> Option<StmtId> {
        self.current
    }

    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Full-depth cursor designating the same node. From there, pre-order
    /// traversal walks this statement's subtree and then its later siblings.
    pub fn toggle(&self) -> FullAstCursor {
        FullAstCursor {
            tree: self.tree,
            root: self.root,
            current: self.current,
        }
    }

    pub(crate) fn set_current(&mut self, current: Option<StmtId>) {
        self.current = current;
    }
}

/// Position in a pre-order traversal of the subtree below `root`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FullAstCursor {
    tree: TreeId,
    root: StmtId,
    current: Option<StmtId>,
}

impl FullAstCursor {
    pub fn tree(&self) -> TreeId {
        self.tree
    }

    pub fn root(&self) -> StmtId {
        self.root
    }

    pub fn current(&self) -> Option<StmtId> {
        self.current
    }

    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    pub fn is_visiting_root(&self) -> bool {
        self.current == Some(self.root)
    }
}

impl Ast {
    /// Cursor on the first child of block `root` (or end if it is empty).
    pub fn stmts_begin(&self, root: StmtId) -> StmtCursor {
        StmtCursor {
            tree: self.tree_id(),
            root,
            current: self.children(root).first().copied(),
        }
    }

    /// End cursor over the children of `root`.
    pub fn stmts_end(&self, root: StmtId) -> StmtCursor {
        StmtCursor {
            tree: self.tree_id(),
            root,
            current: None,
        }
    }

    /// Cursor designating `stmt` among its parent's children.
    pub fn cursor_at(&self, stmt: StmtId) -> Result<StmtCursor> {
        let root = self.parent(stmt).ok_or(IirError::NotTopLevel)?;
        Ok(StmtCursor {
            tree: self.tree_id(),
            root,
            current: Some(stmt),
        })
    }

    /// Moves a first-level cursor to the next sibling. End stays end.
    pub fn advance(&self, cursor: &mut StmtCursor) {
        if let Some(current) = cursor.current {
            cursor.current = self.next_sibling(cursor.root, current);
        }
    }

    /// Copy of `cursor` advanced by one statement.
    pub fn next_cursor(&self, cursor: &StmtCursor) -> StmtCursor {
        let mut next = *cursor;
        self.advance(&mut next);
        next
    }

    /// Pre-order cursor positioned on `root` itself.
    pub fn full_begin(&self, root: StmtId) -> FullAstCursor {
        FullAstCursor {
            tree: self.tree_id(),
            root,
            current: Some(root),
        }
    }

    pub fn full_end(&self, root: StmtId) -> FullAstCursor {
        FullAstCursor {
            tree: self.tree_id(),
            root,
            current: None,
        }
    }

    /// Moves a full-depth cursor to the next node in pre-order.
    pub fn advance_full(&self, cursor: &mut FullAstCursor) {
        if let Some(current) = cursor.current {
            cursor.current = self.preorder_next(cursor.root, current);
        }
    }

    /// First-level cursor designating the same node as `cursor`.
    ///
    /// Fails with [`IirError::NotTopLevel`] when the full-depth cursor is on
    /// the traversal root or inside a nested subtree.
    pub fn to_first_level(&self, cursor: &FullAstCursor) -> Result<StmtCursor> {
        match cursor.current {
            None => Ok(self.stmts_end(cursor.root)),
            Some(current) if self.parent(current) == Some(cursor.root) => Ok(StmtCursor {
                tree: cursor.tree,
                root: cursor.root,
                current: Some(current),
            }),
            Some(_) => Err(IirError::NotTopLevel),
        }
    }

    /// Statements visited from `cursor` (inclusive) to the first-level
    /// successor of `cursor` (exclusive), i.e. the designated statement and
    /// all its descendants in pre-order.
    pub fn full_range(&self, cursor: &StmtCursor) -> Vec<StmtId> {
        let mut it = cursor.toggle();
        let end = self.next_cursor(cursor).toggle();
        let mut out = Vec::new();
        while it != end {
            let Some(current) = it.current else {
                break;
            };
            out.push(current);
            self.advance_full(&mut it);
        }
        out
    }

    fn next_sibling(&self, parent: StmtId, stmt: StmtId) -> Option<StmtId> {
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|s| *s == stmt)?;
        siblings.get(pos + 1).copied()
    }

    fn preorder_next(&self, root: StmtId, from: StmtId) -> Option<StmtId> {
        if let Some(first) = self.children(from).first() {
            return Some(*first);
        }
        let mut node = from;
        while node != root {
            let parent = self.parent(node)?;
            if let Some(next) = self.next_sibling(parent, node) {
                return Some(next);
            }
            node = parent;
        }
        None
    }
}
