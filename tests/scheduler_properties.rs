// tests/scheduler_properties.rs

//! Property tests driving the pure core state machine directly: no tokio,
//! no channels, just events in and commands out.

use std::collections::HashSet;

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

use sitepipe::engine::{
    CoreCommand, CoreStep, PipelineCore, PipelineEvent, RuntimeOptions, StepOutcome, TriggerReason,
};
use sitepipe::pipeline::{Plan, Scheduler, StepId};

fn dispatched_ids(step: &CoreStep) -> Vec<StepId> {
    step.commands
        .iter()
        .filter_map(|c| match c {
            CoreCommand::DispatchSteps(steps) => Some(steps.iter().map(|s| s.id)),
            CoreCommand::RequestExit => None,
        })
        .flatten()
        .collect()
}

fn core_for(plan: Plan, exit_when_idle: bool) -> PipelineCore {
    let scheduler = Scheduler::from_plan(&plan).unwrap();
    PipelineCore::new(scheduler, RuntimeOptions { exit_when_idle })
}

proptest! {
    /// Whatever order the asset steps finish in, and whatever their
    /// outcomes, a one-shot build run terminates, and generation is never
    /// dispatched before both assets succeeded.
    #[test]
    fn build_runs_terminate_and_generation_waits_for_assets(
        picks in proptest::collection::vec(any::<prop::sample::Index>(), 0..16),
        successes in proptest::collection::vec(any::<bool>(), 0..16),
    ) {
        let mut core = core_for(Plan::build(), true);

        let mut in_flight: Vec<StepId> = Vec::new();
        let mut succeeded: HashSet<StepId> = HashSet::new();
        let mut finished = false;

        let mut note_dispatches = |result: &CoreStep,
                                   in_flight: &mut Vec<StepId>,
                                   succeeded: &HashSet<StepId>|
         -> std::result::Result<(), TestCaseError> {
            for id in dispatched_ids(result) {
                prop_assert!(!in_flight.contains(&id), "step dispatched twice: {id}");
                if id == StepId::GenerateSite {
                    prop_assert!(
                        succeeded.contains(&StepId::Styles)
                            && succeeded.contains(&StepId::Images),
                        "generation dispatched before both assets succeeded"
                    );
                }
                in_flight.push(id);
            }
            Ok(())
        };

        for step in [StepId::Styles, StepId::Images] {
            let result = core.step(PipelineEvent::StepTriggered {
                step,
                reason: TriggerReason::Startup,
            });
            note_dispatches(&result, &mut in_flight, &succeeded)?;
        }

        let mut picks = picks.into_iter();
        let mut successes = successes.into_iter();
        let mut budget = 32;

        while !in_flight.is_empty() {
            budget -= 1;
            prop_assert!(budget > 0, "run did not terminate");

            let at = picks.next().map(|i| i.index(in_flight.len())).unwrap_or(0);
            let step = in_flight.swap_remove(at);
            let ok = successes.next().unwrap_or(true);
            if ok {
                succeeded.insert(step);
            }

            let outcome = if ok {
                StepOutcome::Success
            } else {
                StepOutcome::Failed(1)
            };
            let result = core.step(PipelineEvent::StepCompleted { step, outcome });
            note_dispatches(&result, &mut in_flight, &succeeded)?;

            if !result.keep_running {
                finished = true;
            }
        }

        prop_assert!(finished, "core never requested exit");
        prop_assert!(core.is_idle());
        prop_assert!(core.queue_is_empty());
    }

    /// Triggers landing mid-run are queued, queued runs are started once
    /// the active one finishes, and the whole thing always drains.
    ///
    /// Mid-run triggers only ever come from the file watcher, which feeds
    /// the asset plan of a serve session, so that is the plan under test.
    #[test]
    fn mixed_triggers_and_completions_never_wedge(
        actions in proptest::collection::vec(0..4u8, 0..48),
    ) {
        // Session semantics: the loop stays alive between runs.
        let mut core = core_for(Plan::assets(), false);

        let mut in_flight: Vec<StepId> = Vec::new();

        let mut absorb = |result: &CoreStep, in_flight: &mut Vec<StepId>|
         -> std::result::Result<(), TestCaseError> {
            for id in dispatched_ids(result) {
                prop_assert!(!in_flight.contains(&id), "step dispatched twice: {id}");
                in_flight.push(id);
            }
            Ok(())
        };

        for action in actions {
            match action {
                0 | 1 => {
                    let step = if action == 0 { StepId::Styles } else { StepId::Images };
                    let result = core.step(PipelineEvent::StepTriggered {
                        step,
                        reason: TriggerReason::FileChange,
                    });
                    absorb(&result, &mut in_flight)?;
                }
                _ => {
                    if in_flight.is_empty() {
                        continue;
                    }
                    let step = in_flight.remove(0);
                    let outcome = if action == 2 {
                        StepOutcome::Success
                    } else {
                        StepOutcome::Failed(1)
                    };
                    let result = core.step(PipelineEvent::StepCompleted { step, outcome });
                    absorb(&result, &mut in_flight)?;
                }
            }
        }

        // Drain: complete everything still in flight; queued triggers may
        // refill it, bounded by how many the action sequence could record.
        let mut budget = 256;
        while !in_flight.is_empty() {
            budget -= 1;
            prop_assert!(budget > 0, "drain did not terminate");

            let step = in_flight.remove(0);
            let result = core.step(PipelineEvent::StepCompleted {
                step,
                outcome: StepOutcome::Success,
            });
            absorb(&result, &mut in_flight)?;
        }

        prop_assert!(core.is_idle());
        prop_assert!(core.queue_is_empty());
    }
}
