// tests/debouncer.rs

use std::path::PathBuf;
use std::time::Duration;

use bunny::engine::BuildOutcome;
use bunny::watch::{Debouncer, WatchCommand, WatchEvent, WatchState};
use proptest::prelude::*;

const DELAY: Duration = Duration::from_millis(300);

fn source() -> PathBuf {
    PathBuf::from("/project/index.html")
}

fn debouncer() -> Debouncer {
    Debouncer::new(source(), DELAY)
}

/// Drive a fresh debouncer into a running build.
fn running() -> Debouncer {
    let mut core = debouncer();
    core.step(WatchEvent::RebuildRequested);
    assert_eq!(core.step(WatchEvent::DebounceElapsed), vec![WatchCommand::StartBuild]);
    core
}

#[test]
fn request_while_idle_schedules_a_debounced_build() {
    let mut core = debouncer();

    let commands = core.step(WatchEvent::RebuildRequested);

    assert_eq!(
        commands,
        vec![WatchCommand::TearDownWatchers, WatchCommand::ArmDebounce(DELAY)]
    );
    assert_eq!(core.state(), WatchState::Building);
    assert_eq!(core.builds_started(), 0);
    assert!(!core.is_build_running());
}

#[test]
fn burst_before_debounce_produces_one_build() {
    let mut core = debouncer();
    core.step(WatchEvent::RebuildRequested);

    for _ in 0..10 {
        assert!(core.step(WatchEvent::RebuildRequested).is_empty());
    }
    assert_eq!(core.step(WatchEvent::DebounceElapsed), vec![WatchCommand::StartBuild]);

    assert_eq!(core.builds_started(), 1);
    assert_eq!(core.state(), WatchState::Building);
}

#[test]
fn requests_during_build_defer_and_rearm_the_pending_timer() {
    let mut core = running();

    for _ in 0..5 {
        assert_eq!(
            core.step(WatchEvent::RebuildRequested),
            vec![WatchCommand::ArmPending(DELAY)]
        );
        assert_eq!(core.state(), WatchState::PendingRebuild);
    }
    assert_eq!(core.builds_started(), 1);
}

#[test]
fn build_end_with_pending_request_runs_exactly_one_more_build() {
    let mut core = running();
    core.step(WatchEvent::RebuildRequested);
    core.step(WatchEvent::RebuildRequested);

    // No rewatch: the follow-up build will rewatch when it ends.
    assert!(core.step(WatchEvent::BuildFinished(BuildOutcome::Done(vec![]))).is_empty());
    assert_eq!(core.state(), WatchState::Idle);

    assert_eq!(
        core.step(WatchEvent::PendingElapsed),
        vec![WatchCommand::TearDownWatchers, WatchCommand::ArmDebounce(DELAY)]
    );
    assert_eq!(core.step(WatchEvent::DebounceElapsed), vec![WatchCommand::StartBuild]);
    assert_eq!(core.builds_started(), 2);
}

#[test]
fn pending_timer_firing_mid_build_defers_again() {
    let mut core = running();
    core.step(WatchEvent::RebuildRequested);

    assert_eq!(
        core.step(WatchEvent::PendingElapsed),
        vec![WatchCommand::ArmPending(DELAY)]
    );
    assert_eq!(core.builds_started(), 1);
}

#[test]
fn done_rewatches_source_and_dependencies_without_duplicates() {
    let mut core = running();
    let deps = vec![
        PathBuf::from("/project/a.html"),
        PathBuf::from("/project/b.html"),
        PathBuf::from("/project/a.html"),
        source(),
    ];

    let commands = core.step(WatchEvent::BuildFinished(BuildOutcome::Done(deps)));

    assert_eq!(
        commands,
        vec![WatchCommand::Rewatch(vec![
            source(),
            PathBuf::from("/project/a.html"),
            PathBuf::from("/project/b.html"),
        ])]
    );
    assert_eq!(core.state(), WatchState::Idle);
}

#[test]
fn fail_rewatches_only_the_source() {
    let mut core = running();

    let commands = core.step(WatchEvent::BuildFinished(BuildOutcome::Fail("boom".into())));

    assert_eq!(commands, vec![WatchCommand::Rewatch(vec![source()])]);
}

#[test]
fn stale_timers_and_terminal_events_are_ignored() {
    let mut core = debouncer();
    assert!(core.step(WatchEvent::DebounceElapsed).is_empty());
    assert!(core.step(WatchEvent::BuildFinished(BuildOutcome::Done(vec![]))).is_empty());
    assert_eq!(core.state(), WatchState::Idle);

    let mut core = running();
    assert!(core.step(WatchEvent::DebounceElapsed).is_empty());
    assert_eq!(core.builds_started(), 1);
}

#[derive(Debug, Clone)]
enum Input {
    Request,
    Debounce,
    Pending,
    Finish(bool),
}

fn input_strategy() -> impl Strategy<Value = Input> {
    prop_oneof![
        4 => Just(Input::Request),
        2 => Just(Input::Debounce),
        1 => Just(Input::Pending),
        2 => any::<bool>().prop_map(Input::Finish),
    ]
}

/// Feed only events the shell could actually deliver: timers fire only when
/// armed, a build finishes only when one is running.
struct Harness {
    core: Debouncer,
    debounce_armed: bool,
    pending_armed: bool,
    running: bool,
    requests_after_start: u64,
}

impl Harness {
    fn new() -> Self {
        Self {
            core: debouncer(),
            debounce_armed: false,
            pending_armed: false,
            running: false,
            requests_after_start: 0,
        }
    }

    fn deliver(&mut self, event: WatchEvent) -> Result<(), TestCaseError> {
        for command in self.core.step(event) {
            match command {
                WatchCommand::ArmDebounce(_) => self.debounce_armed = true,
                WatchCommand::ArmPending(_) => self.pending_armed = true,
                WatchCommand::StartBuild => {
                    prop_assert!(!self.running, "second build started while one is running");
                    self.running = true;
                }
                WatchCommand::TearDownWatchers | WatchCommand::Rewatch(_) => {}
            }
        }
        Ok(())
    }

    fn apply(&mut self, input: &Input) -> Result<(), TestCaseError> {
        match input {
            Input::Request => {
                if self.running {
                    self.requests_after_start += 1;
                }
                self.deliver(WatchEvent::RebuildRequested)
            }
            Input::Debounce if self.debounce_armed => {
                self.debounce_armed = false;
                self.deliver(WatchEvent::DebounceElapsed)
            }
            Input::Pending if self.pending_armed => {
                self.pending_armed = false;
                self.deliver(WatchEvent::PendingElapsed)
            }
            Input::Finish(ok) if self.running => {
                self.running = false;
                let outcome = if *ok {
                    BuildOutcome::Done(vec![])
                } else {
                    BuildOutcome::Fail("x".into())
                };
                self.deliver(WatchEvent::BuildFinished(outcome))
            }
            _ => Ok(()),
        }
    }

    /// Let every armed timer fire and every build finish.
    fn quiesce(&mut self) -> Result<(), TestCaseError> {
        for _ in 0..32 {
            if self.running {
                self.apply(&Input::Finish(true))?;
            } else if self.debounce_armed {
                self.apply(&Input::Debounce)?;
            } else if self.pending_armed {
                self.apply(&Input::Pending)?;
            } else {
                return Ok(());
            }
        }
        Err(TestCaseError::fail("watch loop did not settle"))
    }
}

proptest! {
    #[test]
    fn at_most_one_build_in_flight_and_no_lost_requests(
        inputs in proptest::collection::vec(input_strategy(), 1..60)
    ) {
        let mut harness = Harness::new();
        for input in &inputs {
            harness.apply(input)?;
        }
        let requested_during_build = harness.requests_after_start > 0;
        let started_before_quiesce = harness.core.builds_started();

        harness.quiesce()?;

        prop_assert_eq!(harness.core.state(), WatchState::Idle);
        if inputs.iter().any(|i| matches!(i, Input::Request)) {
            prop_assert!(harness.core.builds_started() >= 1);
        }
        if requested_during_build {
            prop_assert!(harness.core.builds_started() >= 2);
        }
        prop_assert!(harness.core.builds_started() >= started_before_quiesce);
    }
}
