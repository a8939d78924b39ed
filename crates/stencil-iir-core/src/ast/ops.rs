//! Structural mutation of statement trees.
//!
//! All primitives operate on the children of a block statement designated
//! by a first-level cursor. Because cursors hold statement IDs, a cursor
//! passed to an insertion keeps designating the same statement (or end)
//! afterwards without any fix-up.

use super::{Ast, Stmt, StmtCursor, StmtId};
use crate::error::{IirError, Result};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertionKind {
    BeforeCursor,
    AfterCursor,
}

impl Ast {
    /// Inserts `stmt` right after the statement designated by `cursor`, or
    /// at the end of the block if `cursor` is at end. Returns a cursor on the
    /// inserted statement.
    pub fn insert_after(&mut self, stmt: Stmt, cursor: &StmtCursor) -> Result<StmtCursor> {
        self.insert_impl(stmt, cursor, InsertionKind::AfterCursor)
    }

    /// Inserts `stmt` right before the statement designated by `cursor`, or
    /// at the end of the block if `cursor` is at end.
    pub fn insert_before(&mut self, stmt: Stmt, cursor: &StmtCursor) -> Result<StmtCursor> {
        self.insert_impl(stmt, cursor, InsertionKind::BeforeCursor)
    }

    /// Removes the designated statement and returns it in owned form.
    /// `cursor` moves to the following statement (or end).
    pub fn prune(&mut self, cursor: &mut StmtCursor) -> Result<Stmt> {
        let detached = self.detach(cursor)?;
        Ok(self.to_stmt(detached))
    }

    /// Moves the statement designated by `from` in `from_ast` before the
    /// statement designated by `to` in `to_ast`.
    ///
    /// `from` ends up on the statement that followed the moved one; `to`
    /// keeps designating the same statement. Both cursors are validated
    /// before anything is modified.
    pub fn move_before(
        from_ast: &mut Ast,
        from: &mut StmtCursor,
        to_ast: &mut Ast,
        to: &StmtCursor,
    ) -> Result<StmtCursor> {
        if from.tree() == to.tree() {
            return Err(IirError::SameTree);
        }
        from_ast.check_cursor(from)?;
        to_ast.check_cursor(to)?;
        let stmt = from_ast.prune(from)?;
        to_ast.insert_before(stmt, to)
    }

    /// Unlinks the designated statement from its block. The subtree stays in
    /// the arena, detached, so callers can still read it.
    pub(crate) fn detach(&mut self, cursor: &mut StmtCursor) -> Result<StmtId> {
        self.check_cursor(cursor)?;
        let target = cursor.current().ok_or(IirError::NotAStatement)?;
        let root = cursor.root();
        let children = self.block_children_mut(root)?;
        let position = children
            .iter()
            .position(|s| *s == target)
            .ok_or(IirError::NotTopLevel)?;
        children.remove(position);
        let next = children.get(position).copied();
        self.set_parent(target, None);
        cursor.set_current(next);
        trace!(stmt = ?target, "pruned statement");
        Ok(target)
    }

    /// Checks that `cursor` belongs to this tree, iterates a block and, if
    /// not at end, designates a direct child of that block.
    pub(crate) fn check_cursor(&self, cursor: &StmtCursor) -> Result<()> {
        if cursor.tree() != self.tree_id() {
            return Err(IirError::ForeignCursor {
                expected: self.tree_id(),
                found: cursor.tree(),
            });
        }
        if !self.kind(cursor.root()).is_block() {
            return Err(IirError::InvalidRoot(cursor.root()));
        }
        match cursor.current() {
            Some(current) if self.parent(current) != Some(cursor.root()) => {
                Err(IirError::NotTopLevel)
            }
            _ => Ok(()),
        }
    }

    fn insert_impl(
        &mut self,
        stmt: Stmt,
        cursor: &StmtCursor,
        kind: InsertionKind,
    ) -> Result<StmtCursor> {
        self.check_cursor(cursor)?;
        let root = cursor.root();
        let position = {
            let children = self.block_children_mut(root)?;
            match cursor.current() {
                None => children.len(),
                Some(current) => {
                    let index = children
                        .iter()
                        .position(|s| *s == current)
                        .ok_or(IirError::NotTopLevel)?;
                    match kind {
                        InsertionKind::BeforeCursor => index,
                        InsertionKind::AfterCursor => index + 1,
                    }
                }
            }
        };
        let size = stmt.size();
        let inserted = self.alloc(stmt, Some(root));
        self.block_children_mut(root)?.insert(position, inserted);
        trace!(stmt = ?inserted, position, size, "inserted statement");
        Ok(StmtCursor::new(self.tree_id(), root, Some(inserted)))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, Expr, Stmt, StmtKind};
    use crate::error::IirError;
    use crate::ids::IdGenerator;

    fn named(name: &str) -> Stmt {
        Stmt::expr(Expr::var(name))
    }

    fn names(ast: &Ast) -> Vec<String> {
        ast.stmts()
            .iter()
            .map(|id| match ast.kind(*id) {
                StmtKind::Expr(Expr::Var { name, .. }) => name.clone(),
                _ => "<other>".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_insert_after_into_empty_block() {
        let ids = IdGenerator::new();
        let mut ast = Ast::new(&ids);
        let end = ast.stmts_end(ast.root());
        let inserted = ast.insert_after(named("a"), &end).unwrap();
        assert_eq!(inserted.current(), Some(ast.stmts()[0]));
        assert_eq!(names(&ast), vec!["a"]);
    }

    #[test]
    fn test_insert_after_keeps_cursor_on_same_statement() {
        let ids = IdGenerator::new();
        let mut ast =
            Ast::from_stmt(Stmt::block(vec![named("a"), named("c")]), &ids).unwrap();
        let cursor = ast.stmts_begin(ast.root());
        let before = cursor.current();
        let inserted = ast.insert_after(named("b"), &cursor).unwrap();
        assert_eq!(cursor.current(), before);
        assert_eq!(ast.next_cursor(&cursor), inserted);
        assert_eq!(names(&ast), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_insert_before() {
        let ids = IdGenerator::new();
        let mut ast =
            Ast::from_stmt(Stmt::block(vec![named("a"), named("c")]), &ids).unwrap();
        let mut cursor = ast.stmts_begin(ast.root());
        ast.advance(&mut cursor);
        ast.insert_before(named("b"), &cursor).unwrap();
        assert_eq!(names(&ast), vec!["a", "b", "c"]);

        let end = ast.stmts_end(ast.root());
        ast.insert_before(named("d"), &end).unwrap();
        assert_eq!(names(&ast), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_prune_moves_cursor_to_next() {
        let ids = IdGenerator::new();
        let mut ast =
            Ast::from_stmt(Stmt::block(vec![named("a"), named("b")]), &ids).unwrap();
        let mut cursor = ast.stmts_begin(ast.root());
        let pruned = ast.prune(&mut cursor).unwrap();
        assert_eq!(pruned, named("a"));
        assert_eq!(cursor.current(), Some(ast.stmts()[0]));
        ast.prune(&mut cursor).unwrap();
        assert!(cursor.is_end());
        assert_eq!(ast.prune(&mut cursor), Err(IirError::NotAStatement));
    }

    #[test]
    fn test_pruned_subtree_is_detached() {
        let ids = IdGenerator::new();
        let mut ast = Ast::from_stmt(
            Stmt::block(vec![Stmt::block(vec![named("x")])]),
            &ids,
        )
        .unwrap();
        let nested = ast.stmts()[0];
        let inner = ast.children(nested)[0];
        let mut cursor = ast.stmts_begin(ast.root());
        ast.prune(&mut cursor).unwrap();
        assert!(!ast.is_attached(nested));
        assert!(!ast.is_attached(inner));
        assert!(ast.reachable_stmts().is_empty());
        assert_eq!(ast.detached_nodes(), 2);
    }

    #[test]
    fn test_insert_into_non_block_root_fails() {
        let ids = IdGenerator::new();
        let mut ast = Ast::from_stmt(
            Stmt::block(vec![Stmt::if_stmt(Expr::var("c"), named("t"), None)]),
            &ids,
        )
        .unwrap();
        let if_stmt = ast.stmts()[0];
        let cursor = ast.stmts_begin(if_stmt);
        assert_eq!(
            ast.insert_after(named("x"), &cursor),
            Err(IirError::InvalidRoot(if_stmt))
        );
    }

    #[test]
    fn test_insert_into_nested_block() {
        let ids = IdGenerator::new();
        let mut ast =
            Ast::from_stmt(Stmt::block(vec![Stmt::block(vec![named("x")])]), &ids).unwrap();
        let nested = ast.stmts()[0];
        let cursor = ast.stmts_begin(nested);
        let inserted = ast.insert_after(named("y"), &cursor).unwrap();
        assert_eq!(ast.parent(inserted.current().unwrap()), Some(nested));
        assert_eq!(ast.children(nested).len(), 2);
    }

    #[test]
    fn test_foreign_cursor_rejected() {
        let ids = IdGenerator::new();
        let mut a = Ast::new(&ids);
        let b = Ast::new(&ids);
        let cursor = b.stmts_end(b.root());
        assert!(matches!(
            a.insert_after(named("x"), &cursor),
            Err(IirError::ForeignCursor { .. })
        ));
    }

    #[test]
    fn test_move_before_between_trees() {
        let ids = IdGenerator::new();
        let mut origin =
            Ast::from_stmt(Stmt::block(vec![named("a"), named("b")]), &ids).unwrap();
        let mut dest = Ast::from_stmt(Stmt::block(vec![named("z")]), &ids).unwrap();

        let mut from = origin.stmts_begin(origin.root());
        let to = dest.stmts_begin(dest.root());
        let moved = Ast::move_before(&mut origin, &mut from, &mut dest, &to).unwrap();

        assert_eq!(names(&origin), vec!["b"]);
        assert_eq!(names(&dest), vec!["a", "z"]);
        assert_eq!(from.current(), Some(origin.stmts()[0]));
        assert_eq!(to.current(), Some(dest.stmts()[1]));
        assert_eq!(moved.current(), Some(dest.stmts()[0]));
    }

    #[test]
    fn test_move_within_same_tree_rejected() {
        let ids = IdGenerator::new();
        let mut origin =
            Ast::from_stmt(Stmt::block(vec![named("a"), named("b")]), &ids).unwrap();
        let mut other = Ast::new(&ids);
        let mut from = origin.stmts_begin(origin.root());
        let to = origin.stmts_end(origin.root());
        assert_eq!(
            Ast::move_before(&mut origin, &mut from, &mut other, &to),
            Err(IirError::SameTree)
        );
        assert_eq!(names(&origin), vec!["a", "b"]);
    }
}
