//! Builders for statements and do-methods used across tests and benches.

use crate::access::ExprAccessComputation;
use rustc_hash::FxHashMap;
use stencil_iir_core::{
    AccessId, DoMethod, Expr, FieldAccessType, IirContext, Interval, Result, Stmt,
};

/// Register user fields and return the name to access ID map expected by
/// [`DoMethod::fill_with_ast`].
///
/// # Arguments
/// * `ctx` - The compilation context owning the registry
/// * `names` - Field names to register
pub fn register_fields(ctx: &mut IirContext, names: &[&str]) -> FxHashMap<String, AccessId> {
    names
        .iter()
        .map(|name| {
            let id = ctx.metadata.new_access_id(FieldAccessType::Field, *name);
            (name.to_string(), id)
        })
        .collect()
}

/// `dst = value;`
pub fn write_field(dst: &str, value: Expr) -> Stmt {
    Stmt::expr(Expr::assign(Expr::field(dst, [0, 0, 0]), value))
}

/// `dst = src[offset];`
pub fn copy_field(dst: &str, src: &str, offset: [i32; 3]) -> Stmt {
    write_field(dst, Expr::field(src, offset))
}

/// `tmp = src[offset];` where `tmp` is a local variable
pub fn read_field(src: &str, offset: [i32; 3]) -> Stmt {
    Stmt::var_decl(format!("tmp_{src}"), Some(Expr::field(src, offset)))
}

/// Build and fill a do-method from first-level statements
///
/// Accesses are computed with [`ExprAccessComputation`].
///
/// # Arguments
/// * `ctx` - The compilation context
/// * `fields` - Field name map as returned by [`register_fields`]
/// * `interval` - Vertical interval of the do-method
/// * `stmts` - First-level statements
///
/// # Returns
/// The filled do-method or the error that halted construction
pub fn build_do_method(
    ctx: &mut IirContext,
    fields: &FxHashMap<String, AccessId>,
    interval: Interval,
    stmts: Vec<Stmt>,
) -> Result<DoMethod> {
    let mut do_method = DoMethod::new(interval, ctx.id_generator());
    do_method.fill_with_ast(Stmt::block(stmts), fields, ctx, &ExprAccessComputation)?;
    Ok(do_method)
}

/// The scenario of a do-method over `[0, 10]` that writes `u`, reads
/// `u[k+1]` and writes `v`
///
/// # Returns
/// The context, the IDs of `u` and `v`, and the filled do-method
pub fn write_read_write_scenario() -> Result<(IirContext, AccessId, AccessId, DoMethod)> {
    let mut ctx = IirContext::new();
    let fields = register_fields(&mut ctx, &["u", "v"]);
    let stmts = vec![
        write_field("u", Expr::literal("1")),
        read_field("u", [0, 0, 1]),
        write_field("v", Expr::literal("2")),
    ];
    let do_method = build_do_method(&mut ctx, &fields, Interval::new(0, 10), stmts)?;
    Ok((ctx, fields["u"], fields["v"], do_method))
}
