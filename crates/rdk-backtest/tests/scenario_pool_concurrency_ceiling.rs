//! Worker pool scenarios.
//!
//! GREEN when:
//! - live runners never exceed N, for several N and task counts
//! - no task of batch k+1 starts before every task of batch k has finished
//! - a panicking runner is counted as abandoned and the pool keeps going
//! - every launched engine is torn down exactly once across a mixed pool

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use common::{memory_results, output_lines, write_feed};
use rdk_backtest::{
    run_tasks, ActiveGauge, BacktestConfig, Scheduler, Task, TaskOutcome, TaskStats,
};
use rdk_engine::testkit::{EngineProbe, ScriptedEngine, Step};
use rdk_engine::EngineError;

fn tasks(n: usize) -> Vec<Task> {
    (0..n)
        .map(|i| Task::new(format!("t{i}"), ["unused.csv"]))
        .collect()
}

fn empty_outcome() -> TaskOutcome {
    TaskOutcome::Empty {
        stats: TaskStats::default(),
    }
}

#[test]
fn live_runners_never_exceed_ceiling() {
    for n in 1..=4 {
        for count in [0, 1, n, n + 1, 3 * n + 2] {
            let observed = ActiveGauge::new();
            let report = Scheduler::new(n)
                .unwrap()
                .run(&tasks(count), |_| {
                    let _live = observed.enter();
                    thread::sleep(Duration::from_millis(5));
                    empty_outcome()
                })
                .unwrap();

            assert!(
                observed.peak() <= n,
                "n={n} count={count} peak={}",
                observed.peak()
            );
            assert!(report.peak_concurrency <= n);
            assert_eq!(report.total(), count);
            assert_eq!(report.batches, count.div_ceil(n));
        }
    }
}

#[test]
fn next_batch_waits_for_slowest_runner() {
    // Event log of (task index, started?) in wall-clock order.
    let events = Mutex::new(Vec::new());
    let all = tasks(6);

    Scheduler::new(3)
        .unwrap()
        .run(&all, |task| {
            let idx: usize = task.id[1..].parse().unwrap();
            events.lock().unwrap().push((idx, true));
            // First task of each batch is the slow one.
            let ms = if idx % 3 == 0 { 60 } else { 1 };
            thread::sleep(Duration::from_millis(ms));
            events.lock().unwrap().push((idx, false));
            empty_outcome()
        })
        .unwrap();

    let events = events.into_inner().unwrap();
    let last_end_batch0 = events
        .iter()
        .rposition(|&(i, started)| i < 3 && !started)
        .unwrap();
    let first_start_batch1 = events
        .iter()
        .position(|&(i, started)| i >= 3 && started)
        .unwrap();
    assert!(last_end_batch0 < first_start_batch1, "{events:?}");
}

#[test]
fn panicking_runner_is_contained() {
    let ran = AtomicUsize::new(0);
    let report = Scheduler::new(2)
        .unwrap()
        .run(&tasks(5), |task| {
            ran.fetch_add(1, Ordering::SeqCst);
            if task.id == "t1" {
                panic!("runner blew up");
            }
            empty_outcome()
        })
        .unwrap();

    assert_eq!(ran.load(Ordering::SeqCst), 5);
    assert_eq!(report.abandoned, 1);
    assert_eq!(report.empty, 4);
}

#[test]
fn mixed_pool_releases_every_engine_once() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_feed(dir.path(), "good.csv", &["d,10,0,0,11,0", "d,12,0,0,13,0"]);
    let blank = write_feed(dir.path(), "blank.csv", &[]);

    let all = vec![
        Task::new("ok-a", [good.clone()]),
        Task::new("dies", [good.clone()]),
        Task::new("no-launch", [good.clone()]),
        Task::new("empty", [blank]),
        Task::new("ok-b", [good.clone()]),
        Task::new("silent", [good]),
    ];

    let probe = EngineProbe::new();
    let factory = |id: &str| -> Result<ScriptedEngine, EngineError> {
        match id {
            "no-launch" => Err(EngineError::Spawn {
                program: "missing-engine".to_string(),
                reason: "not found".to_string(),
            }),
            "dies" => Ok(ScriptedEngine::new(
                [Step::reply("BUY 1"), Step::Die],
                &probe,
            )),
            "silent" => Ok(ScriptedEngine::new([Step::Silence], &probe)),
            _ => Ok(ScriptedEngine::replies(&["BUY 5", "HOLD", "SELL 5"], &probe)),
        }
    };
    let results = memory_results();
    let cfg = BacktestConfig {
        concurrency: 4,
        ..BacktestConfig::default()
    };

    let report = run_tasks(&cfg, &all, &factory, &results).unwrap();

    assert_eq!(report.completed, 4);
    assert_eq!(report.empty, 1);
    assert_eq!(report.abandoned, 1);
    assert_eq!(report.batches, 2);
    assert_eq!(probe.launched(), 5);
    assert_eq!(probe.torn_down(), probe.launched());

    let lines = output_lines(results);
    assert_eq!(lines.len(), 1 + 4);
    let mut ids: Vec<&str> = lines[1..]
        .iter()
        .map(|l| l.split(',').next().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["dies", "ok-a", "ok-b", "silent"]);
}

#[test]
fn zero_concurrency_is_a_pool_error() {
    let results = memory_results();
    let cfg = BacktestConfig {
        concurrency: 0,
        ..BacktestConfig::default()
    };
    let factory = |_: &str| -> Result<ScriptedEngine, EngineError> {
        Ok(ScriptedEngine::replies(&[], &EngineProbe::new()))
    };
    assert!(run_tasks(&cfg, &tasks(1), &factory, &results).is_err());
}
