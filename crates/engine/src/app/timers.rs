use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// One firing of a repeating timer. `remaining` counts the firings still to
/// come after this one, so the last firing reports zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub id: TimerId,
    pub remaining: u32,
}

#[derive(Debug, Clone)]
struct RepeatingTimer {
    id: TimerId,
    interval: Duration,
    elapsed: Duration,
    remaining: u32,
}

#[derive(Debug, Default)]
pub(crate) struct TimerSet {
    next_id: u64,
    timers: Vec<RepeatingTimer>,
    fired: Vec<TimerFired>,
}

impl TimerSet {
    pub(crate) fn schedule_repeating(&mut self, interval: Duration, times: u32) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        if times == 0 {
            return id;
        }
        self.timers.push(RepeatingTimer {
            id,
            interval: interval.max(Duration::from_millis(1)),
            elapsed: Duration::ZERO,
            remaining: times,
        });
        id
    }

    pub(crate) fn advance(&mut self, dt: Duration) {
        for timer in &mut self.timers {
            timer.elapsed = timer.elapsed.saturating_add(dt);
            while timer.remaining > 0 && timer.elapsed >= timer.interval {
                timer.elapsed -= timer.interval;
                timer.remaining -= 1;
                self.fired.push(TimerFired {
                    id: timer.id,
                    remaining: timer.remaining,
                });
            }
        }
        self.timers.retain(|timer| timer.remaining > 0);
    }

    pub(crate) fn take_fired(&mut self) -> Vec<TimerFired> {
        std::mem::take(&mut self.fired)
    }

    #[cfg(test)]
    pub(crate) fn active_count(&self) -> usize {
        self.timers.len()
    }

    pub(crate) fn clear(&mut self) {
        self.timers.clear();
        self.fired.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeating_timer_fires_requested_times_then_retires() {
        let mut timers = TimerSet::default();
        let id = timers.schedule_repeating(Duration::from_secs(1), 5);

        let mut fired = Vec::new();
        for _ in 0..(7 * 60) {
            timers.advance(Duration::from_secs_f64(1.0 / 60.0));
            fired.extend(timers.take_fired());
        }

        let remaining: Vec<u32> = fired.iter().map(|event| event.remaining).collect();
        assert_eq!(remaining, vec![4, 3, 2, 1, 0]);
        assert!(fired.iter().all(|event| event.id == id));
        assert_eq!(timers.active_count(), 0);
    }

    #[test]
    fn large_step_fires_multiple_times_in_one_advance() {
        let mut timers = TimerSet::default();
        timers.schedule_repeating(Duration::from_millis(100), 3);
        timers.advance(Duration::from_millis(250));
        assert_eq!(timers.take_fired().len(), 2);
        timers.advance(Duration::from_millis(250));
        assert_eq!(timers.take_fired().len(), 1);
    }

    #[test]
    fn zero_times_schedules_nothing() {
        let mut timers = TimerSet::default();
        let first = timers.schedule_repeating(Duration::from_secs(1), 0);
        let second = timers.schedule_repeating(Duration::from_secs(1), 1);
        assert_ne!(first, second);
        assert_eq!(timers.active_count(), 1);
    }
}
