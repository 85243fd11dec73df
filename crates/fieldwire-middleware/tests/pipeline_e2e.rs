//! End-to-end pipeline integration tests.
//!
//! These tests record every hook invocation and verify the order in which
//! layers run. Each layer runs its gate, `before`, `around`, and `after`
//! inside the `around` of the layer outside it:
//!
//! 1. `is_apply` is checked when the chain reaches the layer
//! 2. `before` runs next; a reply or error skips the layer's `around` and
//!    everything inside it
//! 3. `around` wraps the rest of the chain
//! 4. `after` runs on the layer's outcome, also after a short-circuit

use fieldwire_core::{BindContext, BindError, Reply};
use fieldwire_middleware::{BoxFuture, Endpoint, FnMiddleware, Middleware, Next, Outcome, Pipeline};
use fieldwire_test::TestRequest;
use parking_lot::Mutex;
use std::sync::Arc;

type Log = Arc<Mutex<Vec<String>>>;

/// A layer that records every hook.
struct Recorder {
    name: &'static str,
    log: Log,
    apply: bool,
    short_circuit: Option<fn() -> Outcome>,
}

impl Recorder {
    fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            log: Arc::clone(log),
            apply: true,
            short_circuit: None,
        }
    }

    fn skipped(mut self) -> Self {
        self.apply = false;
        self
    }

    fn short_circuit(mut self, outcome: fn() -> Outcome) -> Self {
        self.short_circuit = Some(outcome);
        self
    }

    fn push(&self, event: &str) {
        self.log.lock().push(format!("{}({})", event, self.name));
    }
}

impl Middleware for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_apply(&self, _ctx: &dyn BindContext) -> bool {
        self.apply
    }

    fn before(&self, _ctx: &mut dyn BindContext) -> Result<Option<Reply>, BindError> {
        self.push("before");
        match self.short_circuit {
            Some(outcome) => outcome().map(Some),
            None => Ok(None),
        }
    }

    fn around<'a>(&'a self, ctx: &'a mut dyn BindContext, next: Next<'a>) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            self.push("enter");
            let outcome = next.run(ctx).await;
            self.push("exit");
            outcome
        })
    }

    fn after(&self, _ctx: &mut dyn BindContext, outcome: Outcome) -> Outcome {
        self.push("after");
        outcome
    }
}

/// An endpoint that records its call.
struct Action {
    log: Log,
}

impl Endpoint for Action {
    fn call<'a>(&'a self, _ctx: &'a mut dyn BindContext) -> BoxFuture<'a, Outcome> {
        Box::pin(async move {
            self.log.lock().push("action".to_string());
            Ok(Reply::json("done"))
        })
    }
}

fn events(log: &Log) -> Vec<String> {
    log.lock().clone()
}

#[tokio::test]
async fn test_two_layers_full_order() {
    let log = Log::default();
    let pipeline = Pipeline::builder()
        .layer(Recorder::new("A", &log))
        .layer(Recorder::new("B", &log))
        .build();
    let mut ctx = TestRequest::get("/").build().unwrap();

    let outcome = pipeline.run(&mut ctx, &Action { log: Arc::clone(&log) }).await;

    assert!(outcome.is_ok());
    assert_eq!(
        events(&log),
        [
            "before(A)",
            "enter(A)",
            "before(B)",
            "enter(B)",
            "action",
            "exit(B)",
            "after(B)",
            "exit(A)",
            "after(A)",
        ]
    );
}

#[tokio::test]
async fn test_short_circuit_skips_inner_layers_but_runs_after() {
    let log = Log::default();
    let pipeline = Pipeline::builder()
        .layer(Recorder::new("A", &log))
        .layer(Recorder::new("B", &log).short_circuit(|| Ok(Reply::json("cached"))))
        .layer(Recorder::new("C", &log))
        .build();
    let mut ctx = TestRequest::get("/").build().unwrap();

    let outcome = pipeline.run(&mut ctx, &Action { log: Arc::clone(&log) }).await;

    assert!(matches!(outcome, Ok(Reply::Payload(_))));
    assert_eq!(
        events(&log),
        ["before(A)", "enter(A)", "before(B)", "after(B)", "exit(A)", "after(A)"]
    );
}

#[tokio::test]
async fn test_short_circuit_error_flows_through_after() {
    let log = Log::default();
    let pipeline = Pipeline::builder()
        .layer(Recorder::new("A", &log).short_circuit(|| Err(BindError::validation("token", "denied"))))
        .build();
    let mut ctx = TestRequest::get("/").build().unwrap();

    let outcome = pipeline.run(&mut ctx, &Action { log: Arc::clone(&log) }).await;

    assert_eq!(outcome.unwrap_err().message(), "denied");
    assert_eq!(events(&log), ["before(A)", "after(A)"]);
}

#[tokio::test]
async fn test_skip_gate_omits_every_hook() {
    let log = Log::default();
    let pipeline = Pipeline::builder()
        .layer(Recorder::new("A", &log).skipped())
        .layer(Recorder::new("B", &log))
        .build();
    let mut ctx = TestRequest::get("/").build().unwrap();

    pipeline
        .run(&mut ctx, &Action { log: Arc::clone(&log) })
        .await
        .unwrap();

    assert_eq!(
        events(&log),
        ["before(B)", "enter(B)", "action", "exit(B)", "after(B)"]
    );
}

#[tokio::test]
async fn test_after_can_replace_outcome() {
    struct Rescue;

    impl Middleware for Rescue {
        fn name(&self) -> &'static str {
            "rescue"
        }

        fn after(&self, _ctx: &mut dyn BindContext, outcome: Outcome) -> Outcome {
            outcome.or_else(|error| Ok(Reply::json(format!("rescued: {}", error.message()))))
        }
    }

    let log = Log::default();
    let pipeline = Pipeline::builder()
        .layer(Rescue)
        .layer(Recorder::new("A", &log).short_circuit(|| Err(BindError::init("boom"))))
        .build();
    let mut ctx = TestRequest::get("/").build().unwrap();

    let outcome = pipeline.run(&mut ctx, &Action { log: Arc::clone(&log) }).await;
    assert!(matches!(outcome, Ok(Reply::Payload(_))));
}

#[tokio::test]
async fn test_inner_gate_sees_outer_before_state() {
    let log = Log::default();
    let inner_log = Arc::clone(&log);
    let pipeline = Pipeline::builder()
        .layer(FnMiddleware::new("flagger").on_before(|ctx| {
            ctx.set("flag", Arc::new(true));
            Ok(None)
        }))
        .layer(
            FnMiddleware::new("flagged")
                .apply_when(|ctx| ctx.get("flag").is_some())
                .on_before(move |_| {
                    inner_log.lock().push("before(flagged)".to_string());
                    Ok(None)
                }),
        )
        .build();
    let mut ctx = TestRequest::get("/").build().unwrap();

    pipeline
        .run(&mut ctx, &Action { log: Arc::clone(&log) })
        .await
        .unwrap();

    assert_eq!(events(&log), ["before(flagged)", "action"]);
}

#[tokio::test]
async fn test_inner_before_runs_inside_outer_around() {
    let log = Log::default();
    let inner_log = Arc::clone(&log);
    let pipeline = Pipeline::builder()
        .layer(Recorder::new("A", &log))
        .layer(FnMiddleware::new("B").on_before(move |_| {
            inner_log.lock().push("before(B)".to_string());
            Ok(Some(Reply::json("stop")))
        }))
        .build();
    let mut ctx = TestRequest::get("/").build().unwrap();

    let outcome = pipeline.run(&mut ctx, &Action { log: Arc::clone(&log) }).await;

    assert!(matches!(outcome, Ok(Reply::Payload(_))));
    assert_eq!(
        events(&log),
        ["before(A)", "enter(A)", "before(B)", "exit(A)", "after(A)"]
    );
}
