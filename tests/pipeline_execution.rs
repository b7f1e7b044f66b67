//! End-to-end execution engine behavior: phase order, hooks, forks,
//! finish-all propagation, failure unwind, and pause/proceed.

mod common;

use common::{init_tracing, Events};
use http_pipeline::error::message_error;
use http_pipeline::{Flow, Outcome, Phase, Pipeline};
use std::sync::Arc;

fn single_phase() -> (Phase, Pipeline<String>) {
    init_tracing();
    let call = Phase::new("Call");
    let pipeline = Pipeline::new([call.clone()]);
    (call, pipeline)
}

#[test]
fn test_two_phase_subject_flow() {
    init_tracing();
    let a = Phase::new("A");
    let b = Phase::new("B");
    let pipeline: Pipeline<String> = Pipeline::new([a.clone(), b.clone()]);

    pipeline
        .intercept(&a, |_, subject| {
            *subject = "x".to_string();
            Flow::Continue
        })
        .unwrap();
    pipeline
        .intercept(&b, |_, subject| {
            subject.push('y');
            Flow::Continue
        })
        .unwrap();

    let out = pipeline.execute(String::new()).expect_completed();
    assert_eq!(out, "xy");
}

#[test]
fn test_fail_without_hooks_surfaces_error() {
    let (call, pipeline) = single_phase();
    pipeline
        .intercept(&call, |_, _| Flow::fail(message_error("boom")))
        .unwrap();

    match pipeline.execute("subject".to_string()) {
        Outcome::Failed(error) => {
            assert_eq!(error.to_string(), "boom");
            assert!(error.suppressed().is_empty());
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn test_success_hooks_run_in_reverse_order() {
    let (call, pipeline) = single_phase();
    let events = Events::new();

    for name in ["first", "second"] {
        let events = events.clone();
        pipeline
            .intercept(&call, move |ctx, _| {
                events.push(format!("run {name}"));
                let events = events.clone();
                ctx.on_success(move |_| {
                    events.push(format!("success {name}"));
                    Ok(())
                });
                Flow::Continue
            })
            .unwrap();
    }

    pipeline.execute(String::new()).expect_completed();
    assert_eq!(
        events.snapshot(),
        vec!["run first", "run second", "success second", "success first"]
    );
}

#[test]
fn test_failure_hooks_run_and_handle_error() {
    let (call, pipeline) = single_phase();
    let events = Events::new();

    {
        let events = events.clone();
        pipeline
            .intercept(&call, move |ctx, _| {
                let events = events.clone();
                ctx.on_fail(move |_, error| {
                    events.push(format!("outer saw {error}"));
                    Ok(())
                });
                Flow::Continue
            })
            .unwrap();
    }
    {
        let events = events.clone();
        pipeline
            .intercept(&call, move |ctx, _| {
                let events = events.clone();
                ctx.on_fail(move |_, error| {
                    events.push(format!("inner saw {error}"));
                    Ok(())
                });
                Flow::fail(message_error("boom"))
            })
            .unwrap();
    }

    // Both failure hooks observed the error, so the run completes.
    let outcome = pipeline.execute(String::new());
    assert!(matches!(outcome, Outcome::Completed(_)));
    assert_eq!(events.snapshot(), vec!["inner saw boom", "outer saw boom"]);
}

#[test]
fn test_failing_failure_hook_chains_suppressed() {
    let (call, pipeline) = single_phase();
    pipeline
        .intercept(&call, |ctx, _: &mut String| {
            ctx.on_fail(|_, _| Err(message_error("cleanup failed")));
            Flow::fail(message_error("boom"))
        })
        .unwrap();

    match pipeline.execute(String::new()) {
        Outcome::Failed(error) => {
            assert_eq!(error.to_string(), "boom");
            assert_eq!(error.suppressed().len(), 1);
            assert_eq!(error.suppressed()[0].to_string(), "cleanup failed");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn test_failing_success_hook_switches_to_failure_path() {
    let (call, pipeline) = single_phase();
    let events = Events::new();

    {
        let events = events.clone();
        pipeline
            .intercept(&call, move |ctx, _| {
                let fail_events = events.clone();
                ctx.on_fail(move |_, error| {
                    fail_events.push(format!("fail hook saw {error}"));
                    Ok(())
                });
                let success_events = events.clone();
                ctx.on_success(move |_| {
                    success_events.push("success hook".to_string());
                    Err(message_error("hook broke"))
                });
                Flow::Continue
            })
            .unwrap();
    }

    let outcome = pipeline.execute(String::new());
    assert!(matches!(outcome, Outcome::Completed(_)));
    assert_eq!(
        events.snapshot(),
        vec!["success hook", "fail hook saw hook broke"]
    );
}

#[test]
fn test_fork_completes_before_outer_resumes() {
    init_tracing();
    let call = Phase::new("Call");
    let outer: Pipeline<String> = Pipeline::new([call.clone()]);
    let nested: Arc<Pipeline<String>> = Arc::new(Pipeline::new([call.clone()]));
    let events = Events::new();

    {
        let events = events.clone();
        nested
            .intercept(&call, move |_, subject| {
                assert_eq!(subject.as_str(), "another");
                events.push("nested");
                Flow::Continue
            })
            .unwrap();
    }
    {
        let events = events.clone();
        outer
            .intercept(&call, move |_, _| {
                events.push("outer before");
                Flow::Continue
            })
            .unwrap();
    }
    {
        let nested = Arc::clone(&nested);
        outer
            .intercept(&call, move |_, _| Flow::fork("another".to_string(), &nested))
            .unwrap();
    }
    {
        let events = events.clone();
        outer
            .intercept(&call, move |_, _| {
                events.push("outer after");
                Flow::Continue
            })
            .unwrap();
    }

    outer.execute("some".to_string()).expect_completed();
    assert_eq!(events.snapshot(), vec!["outer before", "nested", "outer after"]);
}

#[test]
fn test_fork_failure_skips_parent_remainder_but_runs_hooks() {
    init_tracing();
    let call = Phase::new("Call");
    let outer: Pipeline<String> = Pipeline::new([call.clone()]);
    let nested: Arc<Pipeline<String>> = Arc::new(Pipeline::new([call.clone()]));
    let events = Events::new();

    {
        let events = events.clone();
        nested
            .intercept(&call, move |_, _| {
                events.push("nested");
                Flow::fail(message_error("inner boom"))
            })
            .unwrap();
    }
    {
        let events = events.clone();
        outer
            .intercept(&call, move |ctx, _| {
                events.push("outer first");
                let events = events.clone();
                ctx.on_fail(move |_, error| {
                    events.push(format!("outer fail hook saw {error}"));
                    Ok(())
                });
                Flow::Continue
            })
            .unwrap();
    }
    {
        let nested = Arc::clone(&nested);
        outer
            .intercept(&call, move |_, _| Flow::fork("another".to_string(), &nested))
            .unwrap();
    }
    {
        let events = events.clone();
        outer
            .intercept(&call, move |_, _| {
                events.push("unreachable");
                Flow::Continue
            })
            .unwrap();
    }

    let outcome = outer.execute("some".to_string());
    assert!(matches!(outcome, Outcome::Completed(_)));
    assert_eq!(
        events.snapshot(),
        vec!["outer first", "nested", "outer fail hook saw inner boom"]
    );
}

#[test]
fn test_finish_all_unwinds_fork_and_parent_innermost_first() {
    init_tracing();
    let call = Phase::new("Call");
    let outer: Pipeline<String> = Pipeline::new([call.clone()]);
    let nested: Arc<Pipeline<String>> = Arc::new(Pipeline::new([call.clone()]));
    let events = Events::new();

    {
        let events = events.clone();
        nested
            .intercept(&call, move |ctx, _| {
                events.push("nested run");
                let events = events.clone();
                ctx.on_success(move |_| {
                    events.push("nested success hook");
                    Ok(())
                });
                Flow::FinishAll
            })
            .unwrap();
    }
    {
        let events = events.clone();
        nested
            .intercept(&call, move |_, _| {
                events.push("nested unreachable");
                Flow::Continue
            })
            .unwrap();
    }
    {
        let events = events.clone();
        outer
            .intercept(&call, move |ctx, _| {
                events.push("outer run");
                let events = events.clone();
                ctx.on_success(move |_| {
                    events.push("outer success hook");
                    Ok(())
                });
                Flow::Continue
            })
            .unwrap();
    }
    {
        let nested = Arc::clone(&nested);
        outer
            .intercept(&call, move |_, _| Flow::fork("another".to_string(), &nested))
            .unwrap();
    }
    {
        let events = events.clone();
        outer
            .intercept(&call, move |_, _| {
                events.push("outer unreachable");
                Flow::Continue
            })
            .unwrap();
    }

    let outcome = outer.execute("some".to_string());
    assert!(matches!(outcome, Outcome::Completed(_)));
    assert_eq!(
        events.snapshot(),
        vec![
            "outer run",
            "nested run",
            "nested success hook",
            "outer success hook"
        ]
    );
}

#[test]
fn test_pause_and_proceed() {
    let (call, pipeline) = single_phase();
    let events = Events::new();

    {
        let events = events.clone();
        pipeline
            .intercept(&call, move |_, _| {
                events.push("before pause");
                Flow::Pause
            })
            .unwrap();
    }
    {
        let events = events.clone();
        pipeline
            .intercept(&call, move |_, _| {
                events.push("after resume");
                Flow::Continue
            })
            .unwrap();
    }

    let paused = match pipeline.execute("some".to_string()) {
        Outcome::Paused(handle) => handle,
        other => panic!("expected pause, got {other:?}"),
    };
    assert_eq!(events.snapshot(), vec!["before pause"]);

    let outcome = paused.proceed();
    assert!(matches!(outcome, Outcome::Completed(_)));
    assert_eq!(events.snapshot(), vec!["before pause", "after resume"]);
}

#[tokio::test]
async fn test_proceed_from_another_task() {
    let (call, pipeline) = single_phase();

    pipeline.intercept(&call, |_, _| Flow::Pause).unwrap();
    pipeline
        .intercept(&call, |_, subject: &mut String| {
            subject.push_str("resumed");
            Flow::Continue
        })
        .unwrap();

    let paused = match pipeline.execute(String::new()) {
        Outcome::Paused(handle) => handle,
        other => panic!("expected pause, got {other:?}"),
    };

    // The external event happens on another task; resumption re-enters the
    // same frame and cursor.
    let outcome = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        paused.proceed()
    })
    .await
    .unwrap();

    assert_eq!(outcome.expect_completed(), "resumed");
}

#[test]
fn test_cancel_runs_unwind_hooks() {
    let (call, pipeline) = single_phase();
    let events = Events::new();

    {
        let events = events.clone();
        pipeline
            .intercept(&call, move |ctx, _| {
                let events = events.clone();
                ctx.on_success(move |_| {
                    events.push("released");
                    Ok(())
                });
                Flow::Pause
            })
            .unwrap();
    }
    {
        let events = events.clone();
        pipeline
            .intercept(&call, move |_, _| {
                events.push("unreachable");
                Flow::Continue
            })
            .unwrap();
    }

    let paused = match pipeline.execute("some".to_string()) {
        Outcome::Paused(handle) => handle,
        other => panic!("expected pause, got {other:?}"),
    };

    let outcome = paused.cancel();
    assert!(matches!(outcome, Outcome::Completed(_)));
    assert_eq!(events.snapshot(), vec!["released"]);
}

#[test]
fn test_merged_pipeline_keeps_base_order() {
    init_tracing();
    let first = Phase::new("First");
    let second = Phase::new("Second");
    let extra = Phase::new("Extra");

    let base: Pipeline<Vec<&'static str>> = Pipeline::new([first.clone(), second.clone()]);
    base.intercept(&second, |_, subject| {
        subject.push("base second");
        Flow::Continue
    })
    .unwrap();

    let other: Pipeline<Vec<&'static str>> = Pipeline::new([first.clone()]);
    other.insert_phase_after(&first, extra.clone()).unwrap();
    other
        .intercept(&first, |_, subject| {
            subject.push("other first");
            Flow::Continue
        })
        .unwrap();
    other
        .intercept(&extra, |_, subject| {
            subject.push("other extra");
            Flow::Continue
        })
        .unwrap();

    base.merge(&other).unwrap();
    assert_eq!(
        base.phases(),
        vec![first, extra, second]
    );

    let out = base.execute(Vec::new()).expect_completed();
    assert_eq!(out, vec!["other first", "other extra", "base second"]);
}
