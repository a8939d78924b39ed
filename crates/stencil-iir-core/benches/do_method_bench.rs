use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stencil_iir_core::{DetachedStatement, DoMethod, Expr, IirContext, Interval, Stmt};
use stencil_iir_test_helpers::{build_do_method, copy_field, read_field, register_fields, write_field};

fn stencil_body(size: usize) -> Vec<Stmt> {
    (0..size)
        .map(|i| match i % 4 {
            0 => copy_field("out", "in", [-1, 0, 0]),
            1 => read_field("in", [0, 1, 0]),
            2 => write_field(
                "tmp",
                Expr::binary("+", Expr::field("in", [0, 0, 1]), Expr::literal("1")),
            ),
            _ => Stmt::if_stmt(
                Expr::field("tmp", [0, 0, 0]),
                Stmt::block(vec![copy_field("out", "tmp", [1, 0, 0])]),
                None,
            ),
        })
        .collect()
}

fn bench_fill_with_ast(c: &mut Criterion) {
    let body = stencil_body(32);

    c.bench_function("fill_with_ast", |b| {
        b.iter(|| {
            let mut ctx = IirContext::new();
            let fields = register_fields(&mut ctx, &["in", "out", "tmp"]);
            if let Ok(do_method) =
                build_do_method(&mut ctx, &fields, Interval::new(0, 10), black_box(body.clone()))
            {
                black_box(&do_method);
            }
        })
    });
}

fn bench_update_level(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_level_scaling");

    for size in [16, 64, 256] {
        let mut ctx = IirContext::new();
        let fields = register_fields(&mut ctx, &["in", "out", "tmp"]);
        let Ok(mut do_method) =
            build_do_method(&mut ctx, &fields, Interval::new(0, 10), stencil_body(size))
        else {
            continue;
        };

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let _ = do_method.update_level(&ctx);
                black_box(do_method.fields());
            })
        });
    }

    group.finish();
}

fn bench_insert_and_prune(c: &mut Criterion) {
    let ctx = IirContext::new();
    let nested = Stmt::block((0..16).map(|i| Stmt::expr(Expr::var(format!("s{i}")))).collect());

    c.bench_function("insert_prune_subtree", |b| {
        let mut do_method = DoMethod::new(Interval::new(0, 10), ctx.id_generator());
        b.iter(|| {
            let begin = do_method.stmts_begin();
            let detached = DetachedStatement::unannotated(nested.clone());
            if let Ok(mut inserted) = do_method.insert_statement_before(detached, &begin) {
                if let Ok(pruned) = do_method.prune_statement(&mut inserted) {
                    black_box(pruned);
                }
            }
        })
    });
}

criterion_group!(
    benches,
    bench_fill_with_ast,
    bench_update_level,
    bench_insert_and_prune
);
criterion_main!(benches);
