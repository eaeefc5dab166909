//! End-to-end dispatch through built router trees.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cmdtree::{
    middleware, run_with, BoxedRunner, Cancellation, Capture, Context, Error, Extensions, Reader,
    Router, Runner, RunnerFn, SharedMiddleware,
};

fn announce(name: &'static str) -> SharedMiddleware {
    Arc::new(middleware::from_fn(move |ctx, next| {
        ctx.println(name);
        next.run(ctx)
    }))
}

struct Dispatch {
    result: Result<(), Error>,
    out: String,
    err: String,
}

fn dispatch<R: Runner + ?Sized>(runner: &R, args: &[&str]) -> Dispatch {
    let out = Capture::new();
    let err = Capture::new();
    let ctx = Context::builder()
        .args(args.iter().copied())
        .out(out.clone())
        .err(err.clone())
        .build();
    Dispatch {
        result: runner.run(ctx),
        out: out.contents(),
        err: err.contents(),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Verbose(bool);

/// Strips a leading `-v` and records it, like a tiny flag parser.
fn verbose_flag() -> SharedMiddleware {
    Arc::new(middleware::from_fn(|ctx, next| {
        let verbose = ctx.arg(0) == Some("-v");
        let rest: Vec<String> = ctx
            .args()
            .iter()
            .skip(usize::from(verbose))
            .cloned()
            .collect();
        next.run(ctx.with_args(rest).with_extension(Verbose(verbose)))
    }))
}

#[test]
fn test_flags_after_matched_command() {
    let router = Router::builder()
        .scope(|s| {
            s.middleware(verbose_flag()).route_fn("dance", |ctx| {
                let verbose = ctx.extensions().get_required::<Verbose>()?;
                ctx.println(format!("verbose={} rest={:?}", verbose.0, ctx.args()));
                Ok(())
            })
        })
        .build()
        .unwrap();

    assert_eq!(
        dispatch(&router, &["dance", "-v"]).out,
        "verbose=true rest=[]\n"
    );
    assert_eq!(
        dispatch(&router, &["dance", "slowly"]).out,
        "verbose=false rest=[\"slowly\"]\n"
    );
}

#[test]
fn test_deep_tree_path_and_captures() {
    let router = Router::builder()
        .branch("db", |db| {
            db.branch("user", |user| {
                user.route_fn(r"(\w+)@(\w+)", |ctx| {
                    ctx.println(format!(
                        "path={} user={} host={}",
                        cmdtree::path_to_string(ctx.path()),
                        ctx.capture(1).unwrap_or_default(),
                        ctx.capture(2).unwrap_or_default(),
                    ));
                    Ok(())
                })
            })
        })
        .build()
        .unwrap();

    let run = dispatch(&router, &["db", "user", "ada@engine"]);
    assert!(run.result.is_ok());
    assert_eq!(run.out, "path=db user ada@engine user=ada host=engine\n");
}

#[test]
fn test_not_found_deep_in_tree() {
    let router = Router::builder()
        .branch("db", |db| {
            db.branch("user", |user| user.route_fn("add", |_ctx| Ok(())))
        })
        .build()
        .unwrap();

    let err = dispatch(&router, &["db", "user", "drop"])
        .result
        .unwrap_err();
    assert_eq!(err.to_string(), "no route for \"drop\" under \"db user\"");

    let err = dispatch(&router, &["db", "user"]).result.unwrap_err();
    assert_eq!(err.to_string(), "no root route under \"db user\"");
}

#[test]
fn test_prebuilt_router_as_runner() {
    let post = Router::builder()
        .route_fn("stdin", |ctx| {
            let body = ctx.input().read_to_string()?;
            ctx.println(body.trim());
            Ok(())
        })
        .build()
        .unwrap();

    let router = Router::builder().route("post", post).build().unwrap();

    let out = Capture::new();
    let ctx = Context::builder()
        .args(["post", "stdin"])
        .input(Reader::from_bytes("payload\n"))
        .out(out.clone())
        .build();
    assert!(router.run(ctx).is_ok());
    assert_eq!(out.contents(), "payload\n");
    // Registered with `route`, so not introspectable as a branch.
    assert!(router.branch("post").is_none());
}

#[test]
fn test_boxed_runner_route() {
    let runner: BoxedRunner = Arc::new(RunnerFn::new(|ctx| {
        ctx.eprintln("to stderr");
        Ok(())
    }));
    let router = Router::builder().route("warn", runner).build().unwrap();

    let run = dispatch(&router, &["warn"]);
    assert_eq!(run.out, "");
    assert_eq!(run.err, "to stderr\n");
}

#[test]
fn test_outer_middleware_wraps_nested_router() {
    let router = Router::builder()
        .middleware(announce("outer"))
        .branch("post", |b| {
            b.middleware(announce("inner"))
                .route_fn("random", |ctx| {
                    ctx.println("random");
                    Ok(())
                })
                .scope(|s| {
                    s.middleware(announce("scoped")).route_fn("stdin", |ctx| {
                        ctx.println("stdin");
                        Ok(())
                    })
                })
        })
        .build()
        .unwrap();

    assert_eq!(
        dispatch(&router, &["post", "random"]).out,
        "outer\ninner\nrandom\n"
    );
    assert_eq!(
        dispatch(&router, &["post", "stdin"]).out,
        "outer\ninner\nscoped\nstdin\n"
    );
}

#[test]
fn test_middleware_runs_before_nested_not_found() {
    let router = Router::builder()
        .middleware(announce("outer"))
        .branch("post", |b| b.route_fn("random", |_ctx| Ok(())))
        .build()
        .unwrap();

    let run = dispatch(&router, &["post", "nope"]);
    assert!(run.result.unwrap_err().is_not_found());
    assert_eq!(run.out, "outer\n");
}

#[test]
fn test_extensions_from_context_builder() {
    #[derive(Debug)]
    struct Greeting(&'static str);

    let router = Router::builder()
        .route_fn("", |ctx| {
            let greeting = ctx.extensions().get_required::<Greeting>()?;
            ctx.println(greeting.0);
            Ok(())
        })
        .build()
        .unwrap();

    let out = Capture::new();
    let ctx = Context::builder()
        .extension(Greeting("howdy"))
        .out(out.clone())
        .build();
    assert!(router.run(ctx).is_ok());
    assert_eq!(out.contents(), "howdy\n");

    let err = dispatch(&router, &[]).result.unwrap_err();
    assert!(err.to_string().contains("Extension missing"));
}

#[test]
fn test_extensions_are_type_keyed() {
    let mut extensions = Extensions::new();
    extensions.insert(7u32);
    extensions.insert(String::from("seven"));
    extensions.insert(8u32);

    assert_eq!(extensions.len(), 2);
    assert_eq!(extensions.get::<u32>(), Some(&8));
    assert_eq!(
        extensions.get::<String>().map(String::as_str),
        Some("seven")
    );
}

#[test]
fn test_cancelled_handler() {
    let router = Router::builder()
        .route_fn("wait", |ctx| {
            ctx.check_cancelled()?;
            ctx.println("finished");
            Ok(())
        })
        .build()
        .unwrap();

    let cancellation = Cancellation::new();
    cancellation.cancel();

    let out = Capture::new();
    let ctx = Context::builder()
        .args(["wait"])
        .cancellation(cancellation)
        .out(out.clone())
        .build();

    let err = router.run(ctx).unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(out.contents(), "");
}

#[test]
fn test_run_with_prints_error_line() {
    let router = Router::builder()
        .route_fn("fail", |_ctx| anyhow::bail!("it broke"))
        .build()
        .unwrap();

    let err = Capture::new();
    let ctx = Context::builder().args(["fail"]).err(err.clone()).build();

    assert!(run_with(&router, ctx).is_err());
    assert_eq!(err.contents(), "Error: it broke\n");
}

#[test]
fn test_concurrent_dispatch_shares_tree() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let router = Router::builder()
        .middleware(announce("m"))
        .route_fn(r"n(\d+)", move |ctx| {
            counter.fetch_add(1, Ordering::SeqCst);
            ctx.println(ctx.capture(1).unwrap_or_default());
            Ok(())
        })
        .build()
        .unwrap();

    std::thread::scope(|s| {
        for i in 0..8 {
            let router = &router;
            s.spawn(move || {
                let token = format!("n{i}");
                let run = dispatch(router, &[token.as_str()]);
                assert!(run.result.is_ok());
                assert_eq!(run.out, format!("m\n{i}\n"));
            });
        }
    });

    assert_eq!(hits.load(Ordering::SeqCst), 8);
}
