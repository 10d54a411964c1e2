use crate::model::Rules;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerState {
    Running,
    Done,
}

/// Fixed-interval timer advanced by simulated milliseconds.
#[derive(Clone, Debug)]
pub(crate) struct Timer {
    interval_ms: u64,
    elapsed_ms: u64,
    repeat: bool,
    state: TimerState,
}

impl Timer {
    pub(crate) fn repeating(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            elapsed_ms: 0,
            repeat: true,
            state: TimerState::Running,
        }
    }

    pub(crate) fn once(delay_ms: u64) -> Self {
        Self {
            repeat: false,
            ..Self::repeating(delay_ms)
        }
    }

    /// Returns how many times the timer fired during `dt_ms`.
    pub(crate) fn advance(&mut self, dt_ms: u64) -> u32 {
        if self.state != TimerState::Running {
            return 0;
        }
        self.elapsed_ms += dt_ms;
        let mut fired = 0;
        while self.elapsed_ms >= self.interval_ms {
            self.elapsed_ms -= self.interval_ms;
            fired += 1;
            if !self.repeat {
                self.state = TimerState::Done;
                break;
            }
        }
        fired
    }

    /// Disposes the timer; it never fires again.
    pub(crate) fn destroy(&mut self) {
        self.state = TimerState::Done;
    }

    #[cfg(test)]
    fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    #[cfg(test)]
    fn is_done(&self) -> bool {
        self.state == TimerState::Done
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Tick {
    Decay,
    Waste,
    Dispatch,
}

/// The three periodic drivers of a game scene.
#[derive(Clone, Debug)]
pub(crate) struct TickScheduler {
    decay: Timer,
    waste: Timer,
    dispatch: Timer,
}

impl TickScheduler {
    pub(crate) fn new(rules: &Rules) -> Self {
        Self {
            decay: Timer::repeating(rules.decay_interval_ms),
            waste: Timer::repeating(rules.waste_interval_ms),
            dispatch: Timer::repeating(rules.dispatch_interval_ms),
        }
    }

    /// Fired ticks in a stable order: decay, then waste, then dispatch.
    pub(crate) fn advance(&mut self, dt_ms: u64) -> Vec<Tick> {
        let mut out = Vec::new();
        for _ in 0..self.decay.advance(dt_ms) {
            out.push(Tick::Decay);
        }
        for _ in 0..self.waste.advance(dt_ms) {
            out.push(Tick::Waste);
        }
        for _ in 0..self.dispatch.advance(dt_ms) {
            out.push(Tick::Dispatch);
        }
        out
    }

    pub(crate) fn halt_decay(&mut self) {
        self.decay.destroy();
    }

    pub(crate) fn halt_waste(&mut self) {
        self.waste.destroy();
    }

    #[cfg(test)]
    pub(crate) fn decay_running(&self) -> bool {
        self.decay.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeating_timer_carries_remainder() {
        let mut t = Timer::repeating(200);
        assert_eq!(t.advance(150), 0);
        assert_eq!(t.advance(150), 1);
        assert_eq!(t.advance(100), 1);
        assert_eq!(t.advance(650), 3);
    }

    #[test]
    fn one_shot_fires_once() {
        let mut t = Timer::once(3000);
        assert_eq!(t.advance(2999), 0);
        assert_eq!(t.advance(10_000), 1);
        assert!(t.is_done());
        assert_eq!(t.advance(10_000), 0);
    }

    #[test]
    fn destroyed_timer_is_silent() {
        let mut t = Timer::repeating(100);
        assert_eq!(t.advance(100), 1);
        t.destroy();
        assert!(!t.is_running());
        assert_eq!(t.advance(500), 0);
    }

    #[test]
    fn scheduler_orders_ticks_and_halts_decay() {
        let mut s = TickScheduler::new(&Rules::default());
        assert_eq!(s.advance(500), vec![Tick::Dispatch]);
        assert_eq!(s.advance(500), vec![Tick::Decay, Tick::Dispatch]);

        s.halt_decay();
        assert!(!s.decay_running());
        let ticks = s.advance(29_000);
        assert!(!ticks.contains(&Tick::Decay));
        assert_eq!(ticks.iter().filter(|t| **t == Tick::Waste).count(), 1);
        assert_eq!(ticks.iter().filter(|t| **t == Tick::Dispatch).count(), 58);
    }
}
