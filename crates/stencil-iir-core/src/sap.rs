//! Statement/accesses pairs and the side table that binds them to a tree.

use crate::accesses::{AccessMap, Accesses};
use crate::ast::{stmt_to_string, Ast, StmtId, StmtKind};
use crate::extent::Extents;
use crate::ids::AccessId;
use crate::metadata::AccessNameResolver;
use rustc_hash::FxHashMap;
use serde_json::{json, Map, Value};

/// Side table of a do-method: one pair per statement reachable from the
/// root, keyed by statement ID.
pub type SapMap = FxHashMap<StmtId, StatementAccessesPair>;

/// Accesses of a statement that is not part of any tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetachedAccesses {
    pub caller: Accesses,
    pub callee: Option<Accesses>,
}

impl DetachedAccesses {
    pub fn new(caller: Accesses) -> Self {
        DetachedAccesses {
            caller,
            callee: None,
        }
    }
}

/// A statement together with the accesses computed for it.
///
/// Statements inside an inlined stencil-function body carry two views: the
/// caller accesses (call-site offset folded in) and the callee accesses
/// (offset-free). All other statements only have caller accesses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementAccessesPair {
    statement: StmtId,
    caller_accesses: Accesses,
    callee_accesses: Option<Accesses>,
}

impl StatementAccessesPair {
    /// Pair with empty accesses, as created when a statement enters a tree.
    pub fn new(statement: StmtId) -> Self {
        StatementAccessesPair {
            statement,
            caller_accesses: Accesses::new(),
            callee_accesses: None,
        }
    }

    pub fn with_accesses(statement: StmtId, accesses: Accesses) -> Self {
        StatementAccessesPair {
            statement,
            caller_accesses: accesses,
            callee_accesses: None,
        }
    }

    /// Binds detached accesses to a statement of a tree.
    pub fn bind(statement: StmtId, accesses: DetachedAccesses) -> Self {
        StatementAccessesPair {
            statement,
            caller_accesses: accesses.caller,
            callee_accesses: accesses.callee,
        }
    }

    /// Releases the accesses from the statement binding.
    pub fn detach(self) -> DetachedAccesses {
        DetachedAccesses {
            caller: self.caller_accesses,
            callee: self.callee_accesses,
        }
    }

    pub fn statement(&self) -> StmtId {
        self.statement
    }

    pub(crate) fn set_statement(&mut self, statement: StmtId) {
        self.statement = statement;
    }

    /// Alias for [`caller_accesses`](Self::caller_accesses).
    pub fn accesses(&self) -> &Accesses {
        &self.caller_accesses
    }

    pub fn caller_accesses(&self) -> &Accesses {
        &self.caller_accesses
    }

    pub fn caller_accesses_mut(&mut self) -> &mut Accesses {
        &mut self.caller_accesses
    }

    pub fn set_caller_accesses(&mut self, accesses: Accesses) {
        self.caller_accesses = accesses;
    }

    pub fn callee_accesses(&self) -> Option<&Accesses> {
        self.callee_accesses.as_ref()
    }

    pub fn set_callee_accesses(&mut self, accesses: Accesses) {
        self.callee_accesses = Some(accesses);
    }

    pub fn has_callee_accesses(&self) -> bool {
        self.callee_accesses.is_some()
    }

    /// Statements one level below this one: block children, the condition,
    /// then and else branches of an if, or the body of a stencil-function
    /// call.
    pub fn block_statements(&self, ast: &Ast) -> Vec<StmtId> {
        ast.children(self.statement)
    }

    pub fn has_block_statements(&self, ast: &Ast) -> bool {
        match ast.kind(self.statement) {
            StmtKind::Block(stmts) => !stmts.is_empty(),
            StmtKind::If { .. } | StmtKind::StencilFunCall { .. } => true,
            StmtKind::Expr(_) | StmtKind::VarDecl(_) | StmtKind::StencilCall { .. } => false,
        }
    }

    /// Pairs of [`block_statements`](Self::block_statements), looked up in
    /// the side table. Statements without an entry are skipped.
    pub fn block_statement_accesses_pairs<'a>(
        &self,
        ast: &Ast,
        saps: &'a SapMap,
    ) -> Vec<&'a StatementAccessesPair> {
        self.block_statements(ast)
            .into_iter()
            .filter_map(|stmt| saps.get(&stmt))
            .collect()
    }

    /// Envelope of every read and write extent of `id` in this statement and
    /// in its nested statements. `None` if `id` is never accessed.
    pub fn compute_maximum_extents(
        &self,
        id: AccessId,
        ast: &Ast,
        saps: &SapMap,
    ) -> Option<Extents> {
        let mut extents = self.caller_accesses.access_extents(id);
        for child in self.block_statement_accesses_pairs(ast, saps) {
            if let Some(nested) = child.compute_maximum_extents(id, ast, saps) {
                extents = Some(match extents {
                    Some(current) => current.merged(&nested),
                    None => nested,
                });
            }
        }
        extents
    }

    /// Structured dump: rendered statement and its accesses by name.
    pub fn to_json(&self, ast: &Ast, names: &dyn AccessNameResolver, with_accesses: bool) -> Value {
        let mut node = Map::new();
        node.insert(
            "stmt".to_string(),
            Value::String(stmt_to_string(ast, self.statement).trim_end().to_string()),
        );
        if with_accesses {
            node.insert(
                "accesses".to_string(),
                accesses_to_json(&self.caller_accesses, names),
            );
            if let Some(callee) = &self.callee_accesses {
                node.insert("callee_accesses".to_string(), accesses_to_json(callee, names));
            }
        }
        Value::Object(node)
    }
}

fn accesses_to_json(accesses: &Accesses, names: &dyn AccessNameResolver) -> Value {
    json!({
        "reads": access_map_to_json(accesses.read_accesses(), names),
        "writes": access_map_to_json(accesses.write_accesses(), names),
    })
}

fn access_map_to_json(map: &AccessMap, names: &dyn AccessNameResolver) -> Value {
    let mut out = Map::new();
    for (id, extents) in map {
        let key = names
            .access_name(*id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string());
        out.insert(key, Value::String(extents.to_string()));
    }
    Value::Object(out)
}
