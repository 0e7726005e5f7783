use std::fmt;
use std::time::Duration;

use engine::{TimerFired, TimerId};
use serde::Deserialize;
use tracing::{info, warn};

use super::collaborator::WorldPort;
use crate::app::config::TransitionPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Location {
    Classroom,
    Cafeteria,
}

impl Location {
    pub(crate) fn as_token(self) -> &'static str {
        match self {
            Self::Classroom => "classroom",
            Self::Cafeteria => "cafeteria",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransitionState {
    Idle,
    CountdownRunning { steps_remaining: u32 },
    Transitioning,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CountdownEvent {
    Step { remaining: u32 },
    /// The countdown hit zero; the plan must be applied now and
    /// `complete_transition` called.
    Arrive(TransitionPlan),
}

/// One-way, one-shot location change driven by a repeating timer. Once a
/// countdown starts it cannot be cancelled or restarted.
#[derive(Debug)]
pub(crate) struct LocationController {
    current: Location,
    state: TransitionState,
    timer: Option<TimerId>,
    pending_plan: Option<TransitionPlan>,
}

impl LocationController {
    pub(crate) fn new(initial: Location) -> Self {
        Self {
            current: initial,
            state: TransitionState::Idle,
            timer: None,
            pending_plan: None,
        }
    }

    pub(crate) fn current(&self) -> Location {
        self.current
    }

    pub(crate) fn state(&self) -> TransitionState {
        self.state
    }

    /// Starts the countdown and returns its first displayed value, or `None`
    /// when a transition already ran or `from` is not the active location.
    pub(crate) fn trigger_transition(
        &mut self,
        from: Location,
        plan: TransitionPlan,
        steps: u32,
        interval: Duration,
        port: &mut impl WorldPort,
    ) -> Option<u32> {
        if self.state != TransitionState::Idle {
            warn!(state = ?self.state, "transition_already_started");
            return None;
        }
        if from != self.current || plan.to == self.current {
            warn!(
                current = %self.current,
                from = %from,
                to = %plan.to,
                "transition_rejected"
            );
            return None;
        }

        let steps = steps.max(1);
        info!(
            from = %from,
            to = %plan.to,
            steps,
            interval_ms = interval.as_millis() as u64,
            "transition_started"
        );
        self.timer = Some(port.schedule_repeating(interval, steps));
        self.pending_plan = Some(plan);
        self.state = TransitionState::CountdownRunning {
            steps_remaining: steps,
        };
        Some(steps)
    }

    pub(crate) fn on_timer_fired(&mut self, fired: TimerFired) -> Option<CountdownEvent> {
        if self.timer != Some(fired.id) {
            return None;
        }
        let TransitionState::CountdownRunning { .. } = self.state else {
            return None;
        };

        if fired.remaining > 0 {
            self.state = TransitionState::CountdownRunning {
                steps_remaining: fired.remaining,
            };
            info!(remaining = fired.remaining, "countdown_step");
            return Some(CountdownEvent::Step {
                remaining: fired.remaining,
            });
        }

        self.timer = None;
        self.state = TransitionState::Transitioning;
        self.pending_plan.take().map(CountdownEvent::Arrive)
    }

    pub(crate) fn complete_transition(&mut self, arrived: Location) {
        if self.state != TransitionState::Transitioning {
            return;
        }
        info!(from = %self.current, to = %arrived, "location_changed");
        self.current = arrived;
        self.state = TransitionState::Done;
    }
}
