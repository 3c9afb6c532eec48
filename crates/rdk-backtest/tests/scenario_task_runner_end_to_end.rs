//! Task runner scenarios with a scripted decision engine.
//!
//! GREEN when:
//! - BUY 100 @100 then HOLD @110 ends at cash 990_000, 100 shares,
//!   roi_bot 0.1%, roi_benchmark 10%, diff -9.9%
//! - a bare SELL with no shares is rejected and changes nothing
//! - a missing first file is skipped and the second file still drives the task
//! - a dead engine ends streaming early but the task still finalizes
//! - a task with no valid ticks produces no summary
//! - launch failure abandons the task without a summary

mod common;

use common::{assert_close, memory_results, output_lines, write_feed};
use rdk_backtest::{Task, TaskOutcome, TaskRunner};
use rdk_engine::testkit::{EngineProbe, ScriptedEngine, Step};
use rdk_engine::{EngineError, TickMessage};

const CASH: f64 = 1_000_000.0;

#[test]
fn buy_then_hold_matches_expected_rois() {
    let dir = tempfile::tempdir().unwrap();
    let f = write_feed(dir.path(), "y1.csv", &["2020-01-02,100,101,99,110,5000"]);

    let probe = EngineProbe::new();
    let factory = |_: &str| -> Result<ScriptedEngine, EngineError> {
        Ok(ScriptedEngine::replies(&["BUY 100", "HOLD"], &probe))
    };
    let results = memory_results();

    let outcome = TaskRunner::new(CASH).run(&Task::new("solo", [f]), &factory, &results);

    let TaskOutcome::Completed { summary, stats } = outcome else {
        panic!("expected completed outcome, got {outcome:?}");
    };
    assert_eq!(stats.ticks, 2);
    assert_eq!(stats.executed, 1);
    assert_close(summary.final_wealth, 990_000.0 + 100.0 * 110.0);
    assert_close(summary.roi_bot, 0.1);
    assert_close(summary.roi_benchmark, 10.0);
    assert_close(summary.diff, -9.9);

    // The engine saw the ledger state before each order was applied.
    assert_eq!(
        probe.sent(),
        vec![
            TickMessage::new(1_000_000.0, 100.0, 0),
            TickMessage::new(990_000.0, 110.0, 100),
        ]
    );

    let lines = output_lines(results);
    assert_eq!(lines[0], "task_id,roi_bot,roi_benchmark,diff");
    assert_eq!(lines[1], "solo,0.100000,10.000000,-9.900000");
    assert_eq!(lines.len(), 2);
}

#[test]
fn bare_sell_without_shares_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let f = write_feed(dir.path(), "y1.csv", &["d,50,0,0,50,0"]);

    let probe = EngineProbe::new();
    let factory = |_: &str| -> Result<ScriptedEngine, EngineError> {
        Ok(ScriptedEngine::replies(&["SELL", "SELL"], &probe))
    };
    let results = memory_results();

    let outcome = TaskRunner::new(CASH).run(&Task::new("t", [f]), &factory, &results);
    let TaskOutcome::Completed { summary, stats } = outcome else {
        panic!("expected completed outcome");
    };
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.executed, 0);
    assert_close(summary.final_wealth, CASH);
    // Both ticks carried untouched state.
    assert!(probe
        .sent()
        .iter()
        .all(|m| m.cash == CASH && m.shares == 0));
}

#[test]
fn missing_first_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does_not_exist.csv");
    let second = write_feed(dir.path(), "y2.csv", &["d,20,0,0,25,0"]);

    let probe = EngineProbe::new();
    let factory = |_: &str| -> Result<ScriptedEngine, EngineError> {
        Ok(ScriptedEngine::replies(&[], &probe))
    };
    let results = memory_results();

    let outcome = TaskRunner::new(CASH).run(&Task::new("t", [missing, second]), &factory, &results);
    let TaskOutcome::Completed { summary, stats } = outcome else {
        panic!("expected completed outcome");
    };
    assert_eq!(stats.files_skipped, 1);
    assert_eq!(stats.files_read, 1);
    assert_eq!(stats.ticks, 2);
    assert_close(summary.roi_benchmark, 25.0);
    assert_close(summary.roi_bot, 0.0);
}

#[test]
fn files_are_streamed_in_order_open_before_close() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_feed(dir.path(), "a.csv", &["d,1,0,0,2,0", "d,bad,0,0,3,0"]);
    let b = write_feed(dir.path(), "b.csv", &["d,4,0,0", "d,5,0,0,6,0"]);

    let probe = EngineProbe::new();
    let factory = |_: &str| -> Result<ScriptedEngine, EngineError> {
        Ok(ScriptedEngine::replies(&[], &probe))
    };
    let results = memory_results();

    let outcome = TaskRunner::new(CASH).run(&Task::new("t", [a, b]), &factory, &results);
    assert!(outcome.summary().is_some());

    let prices: Vec<f64> = probe.sent().iter().map(|m| m.price).collect();
    assert_eq!(prices, vec![1.0, 2.0, 3.0, 5.0, 6.0]);

    let s = outcome.summary().unwrap();
    assert_close(s.roi_benchmark, 500.0);
}

#[test]
fn dead_engine_ends_stream_but_task_finalizes() {
    let dir = tempfile::tempdir().unwrap();
    let f = write_feed(
        dir.path(),
        "y.csv",
        &["d,10,0,0,12,0", "d,14,0,0,16,0", "d,18,0,0,20,0"],
    );

    let probe = EngineProbe::new();
    let factory = |_: &str| -> Result<ScriptedEngine, EngineError> {
        Ok(ScriptedEngine::new(
            [Step::reply("BUY 10"), Step::reply("HOLD"), Step::Die],
            &probe,
        ))
    };
    let results = memory_results();

    let outcome = TaskRunner::new(1_000.0).run(&Task::new("t", [f]), &factory, &results);
    let TaskOutcome::Completed { summary, stats } = outcome else {
        panic!("expected completed outcome");
    };
    assert!(stats.ended_early);
    assert_eq!(stats.ticks, 2);
    // Last completed tick was the close at 12.
    assert_close(summary.final_wealth, 900.0 + 10.0 * 12.0);
    assert_close(summary.roi_benchmark, 20.0);
    assert_eq!(probe.torn_down(), 1);
    assert_eq!(output_lines(results).len(), 2);
}

#[test]
fn no_valid_ticks_means_no_summary() {
    let dir = tempfile::tempdir().unwrap();
    let f = write_feed(dir.path(), "y.csv", &["d,0,0,0,0,0", "short,row"]);

    let probe = EngineProbe::new();
    let factory = |_: &str| -> Result<ScriptedEngine, EngineError> {
        Ok(ScriptedEngine::replies(&[], &probe))
    };
    let results = memory_results();

    let outcome = TaskRunner::new(CASH).run(&Task::new("t", [f]), &factory, &results);
    assert!(matches!(outcome, TaskOutcome::Empty { .. }));
    assert!(probe.sent().is_empty());
    assert_eq!(probe.torn_down(), 1);
    assert_eq!(output_lines(results), vec!["task_id,roi_bot,roi_benchmark,diff"]);
}

#[test]
fn launch_failure_abandons_task() {
    let dir = tempfile::tempdir().unwrap();
    let f = write_feed(dir.path(), "y.csv", &["d,1,0,0,1,0"]);

    let factory = |_: &str| -> Result<ScriptedEngine, EngineError> {
        Err(EngineError::Spawn {
            program: "engine".to_string(),
            reason: "No such file or directory".to_string(),
        })
    };
    let results = memory_results();

    let outcome = TaskRunner::new(CASH).run(&Task::new("t", [f]), &factory, &results);
    match outcome {
        TaskOutcome::Abandoned { reason } => assert!(reason.contains("engine")),
        other => panic!("expected abandoned, got {other:?}"),
    }
    assert_eq!(results.rows_written(), 0);
}
