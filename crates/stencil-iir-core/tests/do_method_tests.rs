//! Integration tests for do-method construction, mutation and field
//! accumulation.
//!
//! Do-methods are built from statement trees with the expression-driven
//! access computation of the test-helpers crate.

use stencil_iir_core::{
    AccessId, AccessNameResolver, DetachedStatement, DoMethod, Expr, Extents, FieldAccessType,
    FieldIntent, IirContext, IirError, Interval, Stmt, StmtKind,
};
use stencil_iir_test_helpers::{
    build_do_method, copy_field, init_tracing, read_field, register_fields, write_field,
    write_read_write_scenario,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn literal_ids(dm: &DoMethod) -> Vec<AccessId> {
    let mut ids = Vec::new();
    for stmt in dm.ast().reachable_stmts() {
        for expr in dm.ast().kind(stmt).exprs() {
            expr.walk(&mut |e| {
                if let Expr::Literal {
                    access_id: Some(id),
                    ..
                } = e
                {
                    ids.push(*id);
                }
            });
        }
    }
    ids
}

fn assert_side_table_complete(dm: &DoMethod) {
    let reachable = dm.ast().reachable_stmts();
    assert_eq!(reachable.len(), dm.saps().len());
    for stmt in reachable {
        let sap = dm.sap(stmt).expect("every reachable statement has a pair");
        assert_eq!(sap.statement(), stmt);
    }
}

// ── Field accumulation ───────────────────────────────────────────────────────

#[test]
fn test_write_read_write_scenario() {
    init_tracing();
    let (_ctx, u, v, dm) = write_read_write_scenario().unwrap();

    let field_u = dm.field(u).unwrap();
    assert_eq!(field_u.intent(), FieldIntent::InputOutput);
    assert_eq!(field_u.read_extents(), Some(&Extents::from_offset([0, 0, 1])));
    assert_eq!(field_u.write_extents(), Some(&Extents::zero()));
    assert_eq!(field_u.extents(), Some(Extents::new((0, 0), (0, 0), (0, 1))));

    let field_v = dm.field(v).unwrap();
    assert_eq!(field_v.intent(), FieldIntent::Output);
    assert_eq!(field_v.write_extents(), Some(&Extents::zero()));

    assert_eq!(
        dm.compute_enclosing_access_interval(u, false),
        Some(Interval::with_offsets(0, 10, 1, 1))
    );
    assert_eq!(
        dm.compute_enclosing_access_interval(u, true),
        Some(Interval::with_offsets(0, 10, 0, 1))
    );
}

#[test]
fn test_enclosing_interval_with_symbolic_levels() {
    use stencil_iir_core::interval::{END, START};

    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["u"]);
    let dm = build_do_method(
        &mut ctx,
        &fields,
        Interval::with_offsets(START, END, 2, 0),
        vec![read_field("u", [0, 0, 1])],
    )
    .unwrap();
    let u = fields["u"];

    let plain = dm.compute_enclosing_access_interval(u, false).unwrap();
    assert_eq!(plain, Interval::with_offsets(START, END, 3, 1));
    insta::assert_snapshot!(plain.to_string(), @"{ start+3 : end+1 }");

    let merged = dm.compute_enclosing_access_interval(u, true).unwrap();
    insta::assert_snapshot!(merged.to_string(), @"{ start+2 : end+1 }");
}

#[test]
fn test_update_level_is_idempotent() {
    let (ctx, _u, _v, mut dm) = write_read_write_scenario().unwrap();
    let first = dm.fields().clone();
    dm.update_level(&ctx).unwrap();
    assert_eq!(dm.fields(), &first);
    dm.update_level(&ctx).unwrap();
    assert_eq!(dm.fields(), &first);
}

#[test]
fn test_clear_derived_info_then_update() {
    let (ctx, u, _v, mut dm) = write_read_write_scenario().unwrap();
    dm.clear_derived_info();
    assert!(dm.fields().is_empty());
    assert_eq!(dm.field(u), Err(IirError::UnknownField(u)));
    dm.update_level(&ctx).unwrap();
    assert!(dm.has_field(u));
}

#[test]
fn test_field_free_do_method_has_empty_field_map() {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &[]);
    let dm = build_do_method(
        &mut ctx,
        &fields,
        Interval::new(0, 10),
        vec![Stmt::var_decl("x", Some(Expr::literal("1")))],
    )
    .unwrap();
    assert!(dm.fields().is_empty());
    assert!(dm.is_empty_or_null_stmt());
}

#[test]
fn test_nested_statements_contribute_to_maximum_extents() {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["u", "v"]);
    let stmts = vec![Stmt::if_stmt(
        Expr::binary(">", Expr::field("u", [0, 0, 0]), Expr::literal("0")),
        Stmt::block(vec![copy_field("v", "u", [-1, 0, 0])]),
        Some(Stmt::block(vec![copy_field("v", "u", [0, 2, 0])])),
    )];
    let dm = build_do_method(&mut ctx, &fields, Interval::new(0, 10), stmts).unwrap();
    assert_side_table_complete(&dm);

    let u = fields["u"];
    assert_eq!(
        dm.compute_maximum_extents(u),
        Some(Extents::new((-1, 0), (0, 2), (0, 0)))
    );
    assert_eq!(dm.field(u).unwrap().intent(), FieldIntent::Input);
    assert_eq!(dm.field(fields["v"]).unwrap().intent(), FieldIntent::Output);
}

// ── Statement mapping ────────────────────────────────────────────────────────

#[test]
fn test_each_literal_occurrence_gets_fresh_id() {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["u", "v"]);
    let dm = build_do_method(
        &mut ctx,
        &fields,
        Interval::new(0, 10),
        vec![
            write_field("u", Expr::literal("1")),
            write_field("v", Expr::literal("1")),
        ],
    )
    .unwrap();

    let ids = literal_ids(&dm);
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    for id in ids {
        assert!(id.is_literal());
        assert!(ctx.metadata.is_access_type(FieldAccessType::Literal, id));
        assert_eq!(ctx.metadata.name_of(id), Some("1"));
    }
}

#[test]
fn test_variables_resolve_through_scopes_and_globals() {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["u", "v"]);
    let g = ctx
        .metadata
        .new_access_id(FieldAccessType::GlobalVariable, "g");
    let dm = build_do_method(
        &mut ctx,
        &fields,
        Interval::new(0, 10),
        vec![
            Stmt::var_decl("x", Some(Expr::field("u", [0, 0, 0]))),
            write_field("v", Expr::binary("*", Expr::var("x"), Expr::var("g"))),
        ],
    )
    .unwrap();

    let decl = dm.ast().stmts()[0];
    let StmtKind::VarDecl(decl) = dm.ast().kind(decl) else {
        panic!("expected a variable declaration");
    };
    let x = decl.access_id.unwrap();
    assert!(ctx.metadata.is_access_type(FieldAccessType::LocalVariable, x));

    let assign = dm.sap(dm.ast().stmts()[1]).unwrap();
    assert!(assign.accesses().has_read_access(x));
    assert!(assign.accesses().has_read_access(g));
    assert!(assign.accesses().has_write_access(fields["v"]));
}

#[test]
fn test_variable_out_of_scope_halts_construction() {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["v"]);
    let result = build_do_method(
        &mut ctx,
        &fields,
        Interval::new(0, 10),
        vec![
            Stmt::block(vec![Stmt::var_decl("y", Some(Expr::literal("1")))]),
            write_field("v", Expr::var("y")),
        ],
    );
    assert_eq!(result.unwrap_err(), IirError::UpstreamDiagnostics { errors: 1 });
    assert!(ctx.diagnostics().get_diagnostics()[0]
        .message
        .contains("unresolved variable `y`"));
}

#[test]
fn test_unknown_field_halts_construction() {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["u"]);
    let result = build_do_method(
        &mut ctx,
        &fields,
        Interval::new(0, 10),
        vec![copy_field("u", "nope", [0, 0, 0])],
    );
    assert_eq!(result.unwrap_err(), IirError::UpstreamDiagnostics { errors: 1 });
}

#[test]
fn test_fill_requires_block_root() {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["u"]);
    let mut dm = DoMethod::new(Interval::new(0, 10), ctx.id_generator());
    let result = dm.fill_with_ast(
        write_field("u", Expr::literal("1")),
        &fields,
        &mut ctx,
        &stencil_iir_test_helpers::ExprAccessComputation,
    );
    assert_eq!(result, Err(IirError::RootNotBlock));
}

#[test]
fn test_stencil_function_body_has_caller_and_callee_accesses() {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["u", "v"]);
    let call = Stmt::StencilFunCall {
        callee: "shift_copy".to_string(),
        offset: [1, 0, 0],
        args: Vec::new(),
        body: Box::new(Stmt::block(vec![copy_field("u", "v", [0, 0, 0])])),
    };
    let dm = build_do_method(&mut ctx, &fields, Interval::new(0, 10), vec![call]).unwrap();
    assert_side_table_complete(&dm);

    let call_stmt = dm.ast().stmts()[0];
    let body = dm.ast().children(call_stmt)[0];
    let inner = dm.ast().children(body)[0];
    let inner_sap = dm.sap(inner).unwrap();
    let v = fields["v"];

    assert_eq!(
        inner_sap.caller_accesses().read_access(v),
        Some(&Extents::from_offset([1, 0, 0]))
    );
    assert_eq!(
        inner_sap.callee_accesses().and_then(|a| a.read_access(v)),
        Some(&Extents::zero())
    );
    assert!(!dm.sap(call_stmt).unwrap().has_callee_accesses());
    assert_eq!(
        dm.field(v).unwrap().read_extents(),
        Some(&Extents::from_offset([1, 0, 0]))
    );

    let dump = dm.to_json(&ctx.metadata, &ctx.options);
    assert!(dump["Stmts"][0]["accesses"]["reads"]["v"].is_string());
}

// ── Mutation with side-table bookkeeping ─────────────────────────────────────

#[test]
fn test_inserting_nested_block_creates_entry_per_statement() {
    let ctx = IirContext::new();
    let mut dm = DoMethod::new(Interval::new(0, 10), ctx.id_generator());
    let nested = Stmt::block(vec![
        Stmt::expr(Expr::var("a")),
        Stmt::expr(Expr::var("b")),
    ]);
    let end = dm.stmts_end();
    dm.insert_statement_after(DetachedStatement::unannotated(nested), &end)
        .unwrap();
    assert_eq!(dm.saps().len(), 3);
    assert_side_table_complete(&dm);
}

#[test]
fn test_move_statements_preserves_counts_and_payload() {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["a", "b", "c", "z"]);
    let mut origin = build_do_method(
        &mut ctx,
        &fields,
        Interval::new(0, 10),
        vec![
            write_field("a", Expr::literal("1")),
            Stmt::block(vec![write_field("b", Expr::literal("2"))]),
            write_field("c", Expr::literal("3")),
        ],
    )
    .unwrap();
    let mut dest = build_do_method(
        &mut ctx,
        &fields,
        Interval::new(0, 10),
        vec![write_field("z", Expr::literal("4"))],
    )
    .unwrap();
    let total = origin.saps().len() + dest.saps().len();

    let mut from = origin.stmts_begin();
    let to = dest.stmts_begin();
    DoMethod::move_statements_before(&mut origin, &mut from, &mut dest, &to, 2, &ctx).unwrap();

    assert_eq!(origin.num_statements(), 1);
    assert_eq!(dest.num_statements(), 3);
    assert_eq!(origin.saps().len() + dest.saps().len(), total);
    assert_eq!(dest.saps().len(), 4);
    assert_side_table_complete(&origin);
    assert_side_table_complete(&dest);

    // Moved run keeps its order and lands before `to`.
    let written: Vec<_> = dest
        .first_level_saps()
        .iter()
        .map(|sap| sap.accesses().access_extents(fields["a"]).is_some())
        .collect();
    assert_eq!(written, vec![true, false, false]);
    assert_eq!(to.current(), Some(dest.ast().stmts()[2]));

    // Derived info was refreshed on both sides.
    assert!(dest.has_field(fields["a"]));
    assert!(dest.has_field(fields["b"]));
    assert!(!origin.has_field(fields["a"]));
    assert!(origin.has_field(fields["c"]));
}

#[test]
fn test_append_statements_copies_subtrees() {
    let (mut ctx, u, v, source) = write_read_write_scenario().unwrap();
    let mut target = DoMethod::new(Interval::new(0, 10), ctx.id_generator());

    target
        .append_statements(&source, &source.stmts_begin(), 2, &mut ctx)
        .unwrap();
    assert_eq!(target.num_statements(), 2);
    assert_side_table_complete(&target);
    assert_eq!(target.field(u).unwrap().intent(), FieldIntent::InputOutput);
    assert!(!target.has_field(v));

    let mut last = source.stmts_begin();
    source.ast().advance(&mut last);
    source.ast().advance(&mut last);
    target.append_statement(&source, &last, &mut ctx).unwrap();
    assert_eq!(target.field(v).unwrap().intent(), FieldIntent::Output);
    assert_eq!(source.num_statements(), 3);
    assert_eq!(source.saps().len(), 3);
}

#[test]
fn test_appended_copies_get_their_own_literals_and_locals() {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["u", "v"]);
    let source = build_do_method(
        &mut ctx,
        &fields,
        Interval::new(0, 10),
        vec![
            Stmt::var_decl("x", Some(Expr::field("u", [0, 0, 1]))),
            write_field("v", Expr::binary("+", Expr::var("x"), Expr::literal("1"))),
        ],
    )
    .unwrap();
    let source_ids = literal_ids(&source);
    let StmtKind::VarDecl(source_decl) = source.ast().kind(source.ast().stmts()[0]) else {
        panic!("expected a variable declaration");
    };
    let source_x = source_decl.access_id.unwrap();

    let mut target = DoMethod::new(Interval::new(0, 10), ctx.id_generator());
    target
        .append_statements(&source, &source.stmts_begin(), 2, &mut ctx)
        .unwrap();

    let StmtKind::VarDecl(decl) = target.ast().kind(target.ast().stmts()[0]) else {
        panic!("expected a variable declaration");
    };
    let target_x = decl.access_id.unwrap();
    assert_ne!(target_x, source_x);
    assert!(ctx
        .metadata
        .is_access_type(FieldAccessType::LocalVariable, target_x));

    let decl_accesses = target.sap(target.ast().stmts()[0]).unwrap().accesses();
    assert!(decl_accesses.has_write_access(target_x));
    assert!(!decl_accesses.has_write_access(source_x));
    let use_accesses = target.sap(target.ast().stmts()[1]).unwrap().accesses();
    assert!(use_accesses.has_read_access(target_x));
    assert!(!use_accesses.has_read_access(source_x));

    let target_ids = literal_ids(&target);
    assert_eq!(target_ids.len(), source_ids.len());
    assert!(target_ids.iter().all(|id| !source_ids.contains(id)));
    assert!(use_accesses.has_read_access(target_ids[0]));

    let report = target.retract_metadata(&mut ctx.metadata);
    assert_eq!(report.removed_literals, target_ids);
    assert_eq!(report.removed_local_variables, vec![target_x]);
    assert!(ctx.metadata.is_registered(source_x));
    assert!(source_ids.iter().all(|id| ctx.metadata.is_registered(*id)));
    assert_eq!(source.num_statements(), 2);
}

// ── Dump and retraction ──────────────────────────────────────────────────────

#[test]
fn test_json_dump() {
    let (ctx, u, _v, dm) = write_read_write_scenario().unwrap();
    let dump = dm.to_json(&ctx.metadata, &ctx.options);

    assert_eq!(dump["ID"], dm.id().0);
    assert_eq!(dump["interval"], "{ start : 10 }");
    assert_eq!(ctx.metadata.access_name(u), Some("u"));
    assert_eq!(dump["Fields"]["u"]["intent"], "inputoutput");
    assert_eq!(dump["Fields"]["v"]["intent"], "output");
    assert_eq!(dump["Stmts"].as_array().map(Vec::len), Some(3));
    assert_eq!(dump["Stmts"][0]["stmt"], "u = 1;");
    assert_eq!(dump["Stmts"][1]["stmt"], "var tmp_u = u[0, 0, 1];");

    let mut options = ctx.options.clone();
    options.dump_statement_accesses = false;
    let bare = dm.to_json(&ctx.metadata, &options);
    assert!(bare["Stmts"][0].get("accesses").is_none());
}

#[test]
fn test_retract_metadata() {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["u"]);
    let tmp = ctx
        .metadata
        .new_access_id(FieldAccessType::StencilTemporary, "tmp");
    let dm = build_do_method(
        &mut ctx,
        &fields,
        Interval::new(0, 10),
        vec![
            write_field("tmp", Expr::literal("1")),
            Stmt::var_decl("x", Some(Expr::field("tmp", [0, 0, 0]))),
            write_field("u", Expr::var("x")),
        ],
    )
    .unwrap();
    let literals = literal_ids(&dm);
    assert_eq!(literals.len(), 1);
    let registered = ctx.metadata.len();

    let report = dm.retract_metadata(&mut ctx.metadata);
    assert_eq!(report.removed_literals, literals);
    assert_eq!(report.removed_local_variables.len(), 1);
    assert_eq!(report.flagged_temporaries, vec![tmp]);
    assert_eq!(ctx.metadata.len(), registered - 2);
    assert!(ctx.metadata.is_registered(tmp));
    assert!(ctx.metadata.flagged_temporaries().contains(&tmp));
    assert!(ctx.metadata.is_registered(fields["u"]));
}
