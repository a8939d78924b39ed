//! Do-methods: the statements of one vertical interval, their accesses and
//! the field usage derived from them.
//!
//! A [`DoMethod`] owns its statement tree and the side table mapping every
//! reachable statement to its [`StatementAccessesPair`]. All mutations go
//! through methods of this type so that the two structures never disagree:
//! a subtree of `k` statements entering or leaving the tree adds or removes
//! exactly `k` entries.

use crate::access_computation::AccessComputation;
use crate::accesses::Accesses;
use crate::ast::{Ast, Expr, Stmt, StmtCursor, StmtId, StmtKind};
use crate::config::IirOptions;
use crate::context::IirContext;
use crate::dependency_graph::AccessDependencyGraph;
use crate::diagnostics::{Diagnostic, DiagnosticHandler};
use crate::error::{IirError, Result};
use crate::extent::{Dim, Extents};
use crate::field::{record_read_access, record_write_access, Field, FieldMap};
use crate::ids::{AccessId, DoMethodId, IdGenerator};
use crate::interval::Interval;
use crate::metadata::{AccessMetadata, AccessNameResolver, FieldAccessType};
use crate::sap::{DetachedAccesses, SapMap, StatementAccessesPair};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

/// A statement subtree outside of any tree, together with the accesses of
/// each of its statements in pre-order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedStatement {
    pub stmt: Stmt,
    pub accesses: Vec<DetachedAccesses>,
}

impl DetachedStatement {
    pub fn new(stmt: Stmt, accesses: Vec<DetachedAccesses>) -> Self {
        DetachedStatement { stmt, accesses }
    }

    /// Subtree whose statements all have empty accesses.
    pub fn unannotated(stmt: Stmt) -> Self {
        let accesses = vec![DetachedAccesses::default(); stmt.size()];
        DetachedStatement { stmt, accesses }
    }

    /// Number of statements in the subtree.
    pub fn size(&self) -> usize {
        self.stmt.size()
    }
}

/// Metadata entries released by [`DoMethod::retract_metadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetractionReport {
    pub removed_literals: Vec<AccessId>,
    pub removed_local_variables: Vec<AccessId>,
    /// Temporaries referenced by the do-method. They are flagged in the
    /// registry, not removed, since other do-methods may still use them.
    pub flagged_temporaries: Vec<AccessId>,
}

/// Information recomputed by [`DoMethod::update_level`].
#[derive(Debug, Clone, Default)]
pub struct DerivedInfo {
    fields: FieldMap,
    dependency_graph: Option<AccessDependencyGraph>,
}

impl DerivedInfo {
    pub fn clear(&mut self) {
        self.fields.clear();
        self.dependency_graph = None;
    }
}

#[derive(Debug)]
pub struct DoMethod {
    id: DoMethodId,
    interval: Interval,
    ast: Ast,
    saps: SapMap,
    derived: DerivedInfo,
}

impl DoMethod {
    /// Empty do-method over `interval`.
    pub fn new(interval: Interval, ids: &IdGenerator) -> Self {
        DoMethod {
            id: ids.next_do_method_id(),
            interval,
            ast: Ast::new(ids),
            saps: SapMap::default(),
            derived: DerivedInfo::default(),
        }
    }

    pub fn id(&self) -> DoMethodId {
        self.id
    }

    pub fn set_id(&mut self, id: DoMethodId) {
        self.id = id;
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn set_interval(&mut self, interval: Interval) {
        self.interval = interval;
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Side table of every reachable statement.
    pub fn saps(&self) -> &SapMap {
        &self.saps
    }

    pub fn sap(&self, stmt: StmtId) -> Option<&StatementAccessesPair> {
        self.saps.get(&stmt)
    }

    /// Mutable access to the pair of `stmt`. The statement binding itself
    /// cannot be changed through it.
    pub fn sap_mut(&mut self, stmt: StmtId) -> Option<&mut StatementAccessesPair> {
        self.saps.get_mut(&stmt)
    }

    /// Pairs of the first-level statements, in statement order.
    pub fn first_level_saps(&self) -> Vec<&StatementAccessesPair> {
        self.ast
            .stmts()
            .iter()
            .filter_map(|stmt| self.saps.get(stmt))
            .collect()
    }

    /// Number of first-level statements.
    pub fn num_statements(&self) -> usize {
        self.ast.stmts().len()
    }

    pub fn stmts_begin(&self) -> StmtCursor {
        self.ast.stmts_begin(self.ast.root())
    }

    pub fn stmts_end(&self) -> StmtCursor {
        self.ast.stmts_end(self.ast.root())
    }

    pub fn derived_info(&self) -> &DerivedInfo {
        &self.derived
    }

    pub fn fields(&self) -> &FieldMap {
        &self.derived.fields
    }

    pub fn has_field(&self, id: AccessId) -> bool {
        self.derived.fields.contains_key(&id)
    }

    pub fn field(&self, id: AccessId) -> Result<&Field> {
        self.derived.fields.get(&id).ok_or(IirError::UnknownField(id))
    }

    pub fn dependency_graph(&self) -> Option<&AccessDependencyGraph> {
        self.derived.dependency_graph.as_ref()
    }

    pub fn set_dependency_graph(&mut self, graph: AccessDependencyGraph) {
        self.derived.dependency_graph = Some(graph);
    }

    pub fn clear_derived_info(&mut self) {
        self.derived.clear();
    }

    /// Fills an empty or partially built do-method from a raw statement
    /// tree whose root is a block.
    ///
    /// Statements are appended, mapped (field names through `field_names`
    /// or the registry, fresh IDs for literal occurrences and declared
    /// variables), their accesses computed by `computation`, and derived
    /// info refreshed. Errors reported during mapping or access computation
    /// halt construction with [`IirError::UpstreamDiagnostics`]; the
    /// do-method should then be discarded.
    pub fn fill_with_ast(
        &mut self,
        root: Stmt,
        field_names: &FxHashMap<String, AccessId>,
        ctx: &mut IirContext,
        computation: &dyn AccessComputation,
    ) -> Result<()> {
        let Stmt::Block(stmts) = root else {
            return Err(IirError::RootNotBlock);
        };

        debug!("Inserting {} statement(s) into do-method {}", stmts.len(), self.id);
        let end = self.stmts_end();
        let mut inserted = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            let cursor = self.insert_statement_after(DetachedStatement::unannotated(stmt), &end)?;
            inserted.extend(cursor.current());
        }

        let diagnostics = ctx.diagnostics().clone();
        let errors_before = diagnostics.error_count();
        let mut mapper = StatementMapper {
            metadata: &mut ctx.metadata,
            field_names,
            diagnostics: &*diagnostics,
            scopes: vec![FxHashMap::default()],
        };
        for stmt in &inserted {
            mapper.map_stmt(&mut self.ast, *stmt);
        }
        check_upstream(&*diagnostics, errors_before)?;

        debug!("Filling accesses of do-method {}", self.id);
        computation.compute_accesses(
            &ctx.metadata,
            &self.ast,
            &inserted,
            &mut self.saps,
            &*diagnostics,
        );
        check_upstream(&*diagnostics, errors_before)?;

        self.update_level(ctx)
    }

    /// Inserts `detached` after the statement designated by `cursor` (or at
    /// the end) and adds one side-table entry per inserted statement.
    pub fn insert_statement_after(
        &mut self,
        detached: DetachedStatement,
        cursor: &StmtCursor,
    ) -> Result<StmtCursor> {
        check_subtree_size(&detached)?;
        let inserted = self.ast.insert_after(detached.stmt, cursor)?;
        self.bind_accesses(&inserted, detached.accesses);
        Ok(inserted)
    }

    /// Inserts `detached` before the statement designated by `cursor` (or at
    /// the end).
    pub fn insert_statement_before(
        &mut self,
        detached: DetachedStatement,
        cursor: &StmtCursor,
    ) -> Result<StmtCursor> {
        check_subtree_size(&detached)?;
        let inserted = self.ast.insert_before(detached.stmt, cursor)?;
        self.bind_accesses(&inserted, detached.accesses);
        Ok(inserted)
    }

    /// Removes the designated first-level statement together with the
    /// side-table entries of its whole subtree. `cursor` moves to the next
    /// statement.
    pub fn prune_statement(&mut self, cursor: &mut StmtCursor) -> Result<DetachedStatement> {
        self.ast.check_cursor(cursor)?;
        let target = cursor.current().ok_or(IirError::NotAStatement)?;
        let subtree = self.ast.subtree_preorder(target);
        if let Some(missing) = subtree.iter().find(|s| !self.saps.contains_key(s)) {
            return Err(IirError::MissingStatementAccesses(*missing));
        }

        self.ast.detach(cursor)?;
        let accesses: Vec<_> = subtree
            .iter()
            .filter_map(|stmt| self.saps.remove(stmt))
            .map(StatementAccessesPair::detach)
            .collect();
        trace!(stmt = ?target, entries = accesses.len(), "pruned statement subtree");
        Ok(DetachedStatement::new(self.ast.to_stmt(target), accesses))
    }

    /// Moves one first-level statement of `origin` before the statement
    /// designated by `to` in `dest`, carrying its side-table entries.
    ///
    /// `from` ends up on the statement that followed the moved one; `to`
    /// keeps designating the same statement. Derived info of neither
    /// do-method is refreshed.
    pub fn move_statement_before(
        origin: &mut DoMethod,
        from: &mut StmtCursor,
        dest: &mut DoMethod,
        to: &StmtCursor,
    ) -> Result<StmtCursor> {
        if from.tree() == to.tree() {
            return Err(IirError::SameTree);
        }
        dest.ast.check_cursor(to)?;
        let detached = origin.prune_statement(from)?;
        dest.insert_statement_before(detached, to)
    }

    /// Moves `count` consecutive first-level statements starting at `from`
    /// before `to`, keeping their relative order, then refreshes derived
    /// info of both do-methods.
    pub fn move_statements_before(
        origin: &mut DoMethod,
        from: &mut StmtCursor,
        dest: &mut DoMethod,
        to: &StmtCursor,
        count: usize,
        ctx: &IirContext,
    ) -> Result<()> {
        if from.tree() == to.tree() {
            return Err(IirError::SameTree);
        }
        origin.ast.check_cursor(from)?;
        dest.ast.check_cursor(to)?;
        let mut ahead = *from;
        for _ in 0..count {
            if ahead.is_end() {
                return Err(IirError::NotAStatement);
            }
            origin.ast.advance(&mut ahead);
        }

        for _ in 0..count {
            Self::move_statement_before(origin, from, dest, to)?;
        }
        debug!(
            "Moved {} statement(s) from do-method {} to do-method {}",
            count, origin.id, dest.id
        );
        origin.update_level(ctx)?;
        dest.update_level(ctx)
    }

    /// Deep copy of the first-level statement designated by `cursor`, with
    /// copies of the accesses of its whole subtree. The copy keeps the
    /// literal and local-variable IDs of the original.
    pub fn copy_statement(&self, cursor: &StmtCursor) -> Result<DetachedStatement> {
        self.ast.check_cursor(cursor)?;
        let stmt = cursor.current().ok_or(IirError::NotAStatement)?;
        let accesses = self
            .ast
            .subtree_preorder(stmt)
            .into_iter()
            .map(|s| {
                self.saps
                    .get(&s)
                    .map(|sap| sap.clone().detach())
                    .ok_or(IirError::MissingStatementAccesses(s))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DetachedStatement::new(self.ast.to_stmt(stmt), accesses))
    }

    /// Appends a copy of the statement of `source` designated by `cursor`.
    ///
    /// Literals and variables declared by the copy get fresh IDs, so the
    /// copy can be retracted without touching `source`.
    pub fn append_statement(
        &mut self,
        source: &DoMethod,
        cursor: &StmtCursor,
        ctx: &mut IirContext,
    ) -> Result<StmtCursor> {
        let mut copy = source.copy_statement(cursor)?;
        LocalIdRenamer::default().rename(&mut copy, &mut ctx.metadata);
        let end = self.stmts_end();
        let inserted = self.insert_statement_after(copy, &end)?;
        self.update_level(ctx)?;
        Ok(inserted)
    }

    /// Appends copies of `count` consecutive statements of `source`
    /// starting at `first`. Variables declared by one copy and used by a
    /// later one resolve to the same fresh ID.
    pub fn append_statements(
        &mut self,
        source: &DoMethod,
        first: &StmtCursor,
        count: usize,
        ctx: &mut IirContext,
    ) -> Result<()> {
        let mut copies = Vec::with_capacity(count);
        let mut cursor = *first;
        for _ in 0..count {
            copies.push(source.copy_statement(&cursor)?);
            source.ast.advance(&mut cursor);
        }
        let mut renamer = LocalIdRenamer::default();
        for copy in &mut copies {
            renamer.rename(copy, &mut ctx.metadata);
        }
        let end = self.stmts_end();
        for copy in copies {
            self.insert_statement_after(copy, &end)?;
        }
        self.update_level(ctx)
    }

    /// Recomputes the field map from every statement of the tree, nested
    /// ones included, in pre-order.
    ///
    /// Each statement contributes its writes, then its reads, so a field
    /// both written and read by the same statement ends up `Output` and
    /// then `InputOutput`. Compound statements may repeat the accesses of
    /// their children; extents merge idempotently and the final intent only
    /// depends on whether a field is read and whether it is written, so the
    /// repetition is harmless.
    pub fn update_level(&mut self, ctx: &IirContext) -> Result<()> {
        let include_temporaries = ctx.options.accumulate_temporaries;
        let mut fields = FieldMap::default();

        for stmt in self.ast.reachable_stmts() {
            let sap = self
                .saps
                .get(&stmt)
                .ok_or(IirError::MissingStatementAccesses(stmt))?;
            let accesses = sap.caller_accesses();
            for (id, extents) in accesses.write_accesses() {
                if ctx.metadata.is_accumulated_field(*id, include_temporaries) {
                    record_write_access(&mut fields, *id, extents, &self.interval);
                }
            }
            for (id, extents) in accesses.read_accesses() {
                if ctx.metadata.is_accumulated_field(*id, include_temporaries) {
                    record_read_access(&mut fields, *id, extents, &self.interval);
                }
            }
        }

        self.derived.fields = fields;
        if self.derived.fields.is_empty() {
            if ctx.options.warn_on_field_free_do_method {
                warn!(do_method = %self.id, "no fields referenced in do-method");
            }
        } else {
            debug!(
                "Do-method {} references {} field(s)",
                self.id,
                self.derived.fields.len()
            );
        }
        Ok(())
    }

    /// Envelope of every access to `id` across the do-method, nested
    /// statements included. `None` if `id` is never accessed.
    pub fn compute_maximum_extents(&self, id: AccessId) -> Option<Extents> {
        self.first_level_saps()
            .into_iter()
            .filter_map(|sap| sap.compute_maximum_extents(id, &self.ast, &self.saps))
            .reduce(|acc, extents| acc.merged(&extents))
    }

    /// Vertical range touched by accesses to `id`.
    ///
    /// The do-method interval is extended by the envelope of the reads of
    /// `id`, or of its writes if it is never read. With
    /// `merge_with_do_interval` the envelope is first widened to include the
    /// center, so the result also covers the unshifted do-method interval.
    ///
    /// Writes of a field that is also read do not contribute: a write at
    /// `k+3` next to a read at `k` leaves the interval unshifted even though
    /// [`compute_maximum_extents`](Self::compute_maximum_extents) reports
    /// `k[0, 3]`.
    pub fn compute_enclosing_access_interval(
        &self,
        id: AccessId,
        merge_with_do_interval: bool,
    ) -> Option<Interval> {
        let reads = self.accumulate(id, Accesses::read_access);
        let writes = self.accumulate(id, Accesses::write_access);
        let mut extents = reads.or(writes)?;
        if merge_with_do_interval {
            extents.add_center(Dim::K);
        }
        Some(self.interval.extend_interval(&extents))
    }

    /// True if the do-method contains no expression statement other than
    /// no-ops, looking through blocks, if branches and call bodies.
    pub fn is_empty_or_null_stmt(&self) -> bool {
        self.ast.stmts().iter().all(|stmt| self.is_null_stmt(*stmt))
    }

    /// Structured dump: ID, interval, fields by name and first-level
    /// statements.
    pub fn to_json(&self, names: &dyn AccessNameResolver, options: &IirOptions) -> Value {
        let mut fields = Map::new();
        for (id, field) in &self.derived.fields {
            let name = names
                .access_name(*id)
                .map(str::to_string)
                .unwrap_or_else(|| id.to_string());
            fields.insert(name, field.to_json());
        }
        let stmts: Vec<Value> = self
            .first_level_saps()
            .into_iter()
            .map(|sap| sap.to_json(&self.ast, names, options.dump_statement_accesses))
            .collect();

        let mut node = Map::new();
        node.insert("ID".to_string(), Value::from(self.id.0));
        node.insert("interval".to_string(), Value::String(self.interval.to_string()));
        node.insert("Fields".to_string(), Value::Object(fields));
        node.insert("Stmts".to_string(), Value::Array(stmts));
        Value::Object(node)
    }

    /// Independent copy with a fresh statement tree and a re-keyed side
    /// table. The copy keeps the ID of `self` and shares its literal and
    /// local-variable IDs, so at most one of the two may be retracted.
    pub fn deep_clone(&self, ids: &IdGenerator) -> DoMethod {
        let (ast, mapping) = self.ast.clone_with_mapping(ids);
        let saps = self.rekeyed_saps(&mapping);
        DoMethod {
            id: self.id,
            interval: self.interval,
            ast,
            saps,
            derived: self.derived.clone(),
        }
    }

    /// Rebuilds the statement tree without the nodes left behind by pruned
    /// and moved statements. The tree gets a new identity, so cursors taken
    /// before the call are rejected with [`IirError::ForeignCursor`].
    ///
    /// Returns the number of released nodes.
    pub fn compact(&mut self, ids: &IdGenerator) -> usize {
        let released = self.ast.detached_nodes();
        if released == 0 {
            return 0;
        }
        let (ast, mapping) = self.ast.clone_with_mapping(ids);
        self.saps = self.rekeyed_saps(&mapping);
        self.ast = ast;
        debug!("Compacted do-method {}, released {} node(s)", self.id, released);
        released
    }

    /// Destroys the do-method and releases the metadata that only its
    /// statements introduced: literal occurrences and declared local
    /// variables are removed, referenced temporaries are flagged.
    pub fn retract_metadata(self, metadata: &mut AccessMetadata) -> RetractionReport {
        let mut report = RetractionReport::default();
        for stmt in self.ast.reachable_stmts() {
            let kind = self.ast.kind(stmt);
            for expr in kind.exprs() {
                expr.walk(&mut |e| {
                    if let Expr::Literal {
                        access_id: Some(id),
                        ..
                    } = e
                    {
                        if metadata.remove_literal(*id) {
                            report.removed_literals.push(*id);
                        }
                    }
                });
            }
            if let StmtKind::VarDecl(decl) = kind {
                if let Some(id) = decl.access_id {
                    if metadata.is_access_type(FieldAccessType::LocalVariable, id)
                        && metadata.remove_access_id(id)
                    {
                        report.removed_local_variables.push(id);
                    }
                }
            }
        }

        let mut temporaries: Vec<AccessId> = self
            .saps
            .values()
            .flat_map(|sap| {
                let accesses = sap.caller_accesses();
                accesses
                    .read_accesses()
                    .keys()
                    .chain(accesses.write_accesses().keys())
                    .copied()
                    .collect::<Vec<_>>()
            })
            .filter(|id| {
                metadata
                    .classify(*id)
                    .is_ok_and(FieldAccessType::is_temporary)
            })
            .collect();
        temporaries.sort();
        temporaries.dedup();
        for id in &temporaries {
            warn!(
                do_method = %self.id,
                access_id = %id,
                "temporary may be orphaned by destroyed do-method"
            );
            metadata.flag_temporary(*id);
        }
        report.flagged_temporaries = temporaries;
        report
    }

    /// Adds one side-table entry per statement of a freshly inserted
    /// subtree, walking it from the first-level cursor in full depth.
    fn bind_accesses(&mut self, inserted: &StmtCursor, accesses: Vec<DetachedAccesses>) {
        let stmts = self.ast.full_range(inserted);
        for (stmt, accesses) in stmts.into_iter().zip(accesses) {
            self.saps
                .insert(stmt, StatementAccessesPair::bind(stmt, accesses));
        }
    }

    fn rekeyed_saps(&self, mapping: &FxHashMap<StmtId, StmtId>) -> SapMap {
        self.saps
            .iter()
            .filter_map(|(stmt, sap)| {
                let copied = *mapping.get(stmt)?;
                let mut sap = sap.clone();
                sap.set_statement(copied);
                Some((copied, sap))
            })
            .collect()
    }

    fn accumulate(
        &self,
        id: AccessId,
        pick: fn(&Accesses, AccessId) -> Option<&Extents>,
    ) -> Option<Extents> {
        self.ast
            .reachable_stmts()
            .into_iter()
            .filter_map(|stmt| self.saps.get(&stmt))
            .filter_map(|sap| pick(sap.caller_accesses(), id).copied())
            .reduce(|acc, extents| acc.merged(&extents))
    }

    /// Only expression statements with an effect count. Conditions of ifs
    /// are not looked at; declarations and calls are null unless their
    /// bodies are not.
    fn is_null_stmt(&self, stmt: StmtId) -> bool {
        match self.ast.kind(stmt) {
            StmtKind::Expr(expr) => *expr == Expr::Nop,
            StmtKind::If {
                then_stmt,
                else_stmt,
                ..
            } => {
                self.is_null_stmt(*then_stmt)
                    && else_stmt.map_or(true, |s| self.is_null_stmt(s))
            }
            kind => kind.children().into_iter().all(|s| self.is_null_stmt(s)),
        }
    }
}

fn check_subtree_size(detached: &DetachedStatement) -> Result<()> {
    let expected = detached.size();
    if detached.accesses.len() != expected {
        return Err(IirError::SubtreeSizeMismatch {
            expected,
            found: detached.accesses.len(),
        });
    }
    Ok(())
}

fn check_upstream(diagnostics: &dyn DiagnosticHandler, errors_before: usize) -> Result<()> {
    let errors = diagnostics.error_count().saturating_sub(errors_before);
    if errors > 0 {
        return Err(IirError::UpstreamDiagnostics { errors });
    }
    Ok(())
}

/// Hands out fresh literal and local-variable IDs to copied statements and
/// re-keys their accesses accordingly.
#[derive(Default)]
struct LocalIdRenamer {
    mapping: FxHashMap<AccessId, AccessId>,
}

impl LocalIdRenamer {
    fn rename(&mut self, detached: &mut DetachedStatement, metadata: &mut AccessMetadata) {
        self.rename_stmt(&mut detached.stmt, metadata);
        for accesses in &mut detached.accesses {
            accesses.caller.rename(&self.mapping);
            if let Some(callee) = &mut accesses.callee {
                callee.rename(&self.mapping);
            }
        }
    }

    fn rename_stmt(&mut self, stmt: &mut Stmt, metadata: &mut AccessMetadata) {
        match stmt {
            Stmt::Expr(expr) => self.rename_expr(expr, metadata),
            Stmt::Block(stmts) => {
                for stmt in stmts {
                    self.rename_stmt(stmt, metadata);
                }
            }
            Stmt::If {
                cond,
                then_stmt,
                else_stmt,
            } => {
                self.rename_stmt(cond, metadata);
                self.rename_stmt(then_stmt, metadata);
                if let Some(else_stmt) = else_stmt {
                    self.rename_stmt(else_stmt, metadata);
                }
            }
            Stmt::VarDecl(decl) => {
                if let Some(init) = &mut decl.init {
                    self.rename_expr(init, metadata);
                }
                if let Some(old) = decl.access_id {
                    if metadata.is_access_type(FieldAccessType::LocalVariable, old) {
                        let fresh = metadata
                            .new_access_id(FieldAccessType::LocalVariable, decl.name.clone());
                        self.mapping.insert(old, fresh);
                        decl.access_id = Some(fresh);
                    }
                }
            }
            Stmt::StencilFunCall { args, body, .. } => {
                for arg in args {
                    self.rename_expr(arg, metadata);
                }
                self.rename_stmt(body, metadata);
            }
            Stmt::StencilCall { .. } => {}
        }
    }

    fn rename_expr(&mut self, expr: &mut Expr, metadata: &mut AccessMetadata) {
        let mapping = &mut self.mapping;
        expr.walk_mut(&mut |e| match e {
            Expr::Literal {
                value,
                access_id: Some(id),
            } => {
                let fresh = metadata.new_access_id(FieldAccessType::Literal, value.clone());
                mapping.insert(*id, fresh);
                *id = fresh;
            }
            Expr::Var {
                access_id: Some(id),
                ..
            } => {
                if let Some(fresh) = mapping.get(id) {
                    *id = *fresh;
                }
            }
            _ => {}
        });
    }
}

/// Resolves names of freshly inserted statements to access IDs.
struct StatementMapper<'a> {
    metadata: &'a mut AccessMetadata,
    field_names: &'a FxHashMap<String, AccessId>,
    diagnostics: &'a dyn DiagnosticHandler,
    scopes: Vec<FxHashMap<String, AccessId>>,
}

impl StatementMapper<'_> {
    fn map_stmt(&mut self, ast: &mut Ast, stmt: StmtId) {
        let opens_scope = ast.kind(stmt).is_block();
        if opens_scope {
            self.scopes.push(FxHashMap::default());
        }

        // Initialisers are resolved before the declared name is visible.
        for expr in ast.kind_mut(stmt).exprs_mut() {
            self.map_expr(expr, stmt);
        }
        if let StmtKind::VarDecl(decl) = ast.kind_mut(stmt) {
            let id = self
                .metadata
                .new_access_id(FieldAccessType::LocalVariable, decl.name.clone());
            decl.access_id = Some(id);
            if let Some(scope) = self.scopes.last_mut() {
                scope.insert(decl.name.clone(), id);
            }
        }

        for child in ast.children(stmt) {
            self.map_stmt(ast, child);
        }
        if opens_scope {
            self.scopes.pop();
        }
    }

    fn map_expr(&mut self, expr: &mut Expr, stmt: StmtId) {
        expr.walk_mut(&mut |e| match e {
            Expr::Field {
                name, access_id, ..
            } => match self.resolve_field(name) {
                Some(id) => *access_id = Some(id),
                None => self
                    .diagnostics
                    .report(Diagnostic::error(format!("unknown field `{name}`")).at(stmt)),
            },
            Expr::Literal { value, access_id } => {
                *access_id = Some(
                    self.metadata
                        .new_access_id(FieldAccessType::Literal, value.clone()),
                );
            }
            Expr::Var { name, access_id } => match self.resolve_variable(name) {
                Some(id) => *access_id = Some(id),
                None => self
                    .diagnostics
                    .report(Diagnostic::error(format!("unresolved variable `{name}`")).at(stmt)),
            },
            _ => {}
        });
    }

    fn resolve_field(&self, name: &str) -> Option<AccessId> {
        if let Some(id) = self.field_names.get(name) {
            return Some(*id);
        }
        [
            FieldAccessType::Field,
            FieldAccessType::APIField,
            FieldAccessType::StencilTemporary,
            FieldAccessType::InterStencilTemporary,
        ]
        .into_iter()
        .find_map(|kind| self.metadata.lookup(kind, name))
    }

    fn resolve_variable(&self, name: &str) -> Option<AccessId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
            .or_else(|| self.metadata.lookup(FieldAccessType::GlobalVariable, name))
    }
}
