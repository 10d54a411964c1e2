use crate::model::{DecayRates, StatKind, Stats, STAT_MAX, STAT_MIN};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Vitality {
    Alive,
    Terminal,
}

/// Sole owner of the pet's stats. Every mutation goes through a clamp.
#[derive(Clone, Debug)]
pub(crate) struct StatEngine {
    stats: Stats,
    decay: DecayRates,
}

impl StatEngine {
    pub(crate) fn new(decay: DecayRates) -> Self {
        Self {
            stats: Stats::default(),
            decay,
        }
    }

    pub(crate) fn stats(&self) -> Stats {
        self.stats
    }

    pub(crate) fn increment(&mut self, stat: StatKind, amount: f32) {
        let v = self.slot(stat);
        *v = (*v + amount).clamp(STAT_MIN, STAT_MAX);
    }

    pub(crate) fn decrement(&mut self, stat: StatKind, amount: f32) {
        let v = self.slot(stat);
        *v = (*v - amount).clamp(STAT_MIN, STAT_MAX);
    }

    /// One scheduler tick of decay. Health drains faster while waste lies around.
    pub(crate) fn decay_tick(&mut self, poop_count: u32) -> Vitality {
        self.decrement(StatKind::Health, self.decay.health * poop_modifier(poop_count));
        self.decrement(StatKind::Fun, self.decay.fun);

        let spent = [StatKind::Health, StatKind::Fun]
            .into_iter()
            .any(|k| self.stats.get(k) < 1.0);
        if spent {
            Vitality::Terminal
        } else {
            Vitality::Alive
        }
    }

    fn slot(&mut self, stat: StatKind) -> &mut f32 {
        match stat {
            StatKind::Health => &mut self.stats.health,
            StatKind::Fun => &mut self.stats.fun,
        }
    }
}

pub(crate) fn poop_modifier(poop_count: u32) -> f32 {
    poop_count.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn engine() -> StatEngine {
        StatEngine::new(DecayRates::default())
    }

    #[test]
    fn increments_and_decrements_stay_in_range() {
        let mut e = engine();
        let ops: [(bool, StatKind, f32); 8] = [
            (true, StatKind::Health, 35.0),
            (false, StatKind::Fun, 140.0),
            (false, StatKind::Health, 20.0),
            (true, StatKind::Fun, 7.5),
            (false, StatKind::Health, 300.0),
            (true, StatKind::Health, 250.0),
            (false, StatKind::Fun, 0.25),
            (true, StatKind::Fun, -30.0),
        ];
        for (inc, stat, amount) in ops {
            if inc {
                e.increment(stat, amount);
            } else {
                e.decrement(stat, amount);
            }
            let s = e.stats();
            assert!((STAT_MIN..=STAT_MAX).contains(&s.health), "{s:?}");
            assert!((STAT_MIN..=STAT_MAX).contains(&s.fun), "{s:?}");
        }
    }

    #[test]
    fn decay_without_waste_is_linear() {
        let mut e = engine();
        e.decrement(StatKind::Fun, 10.0);
        for _ in 0..50 {
            assert_eq!(e.decay_tick(0), Vitality::Alive);
        }
        let s = e.stats();
        assert!((s.health - 95.0).abs() < EPS, "{s:?}");
        assert!((s.fun - 85.0).abs() < EPS, "{s:?}");
    }

    #[test]
    fn waste_multiplies_health_decay_only() {
        assert_eq!(poop_modifier(0), 1.0);
        assert_eq!(poop_modifier(1), 1.0);
        assert_eq!(poop_modifier(4), 4.0);

        let mut e = engine();
        for _ in 0..10 {
            e.decay_tick(3);
        }
        let s = e.stats();
        assert!((s.health - 97.0).abs() < EPS, "{s:?}");
        assert!((s.fun - 99.0).abs() < EPS, "{s:?}");
    }

    #[test]
    fn thousand_ticks_bottom_out_at_zero() {
        let mut e = engine();
        let mut first_terminal = None;
        for n in 0..1000 {
            if e.decay_tick(0) == Vitality::Terminal && first_terminal.is_none() {
                first_terminal = Some(n);
            }
        }
        let s = e.stats();
        assert!(s.health.abs() < EPS && s.fun.abs() < EPS, "{s:?}");
        // ~991 ticks take a full bar below 1.0
        let n = first_terminal.expect("terminal state never reached");
        assert!((985..=995).contains(&n), "terminal after {n} ticks");
    }

    #[test]
    fn terminal_when_either_stat_drops_below_one() {
        let mut e = engine();
        e.decrement(StatKind::Fun, 99.05);
        assert_eq!(e.decay_tick(0), Vitality::Terminal);
        assert!(e.stats().health > 99.0);
    }
}
