use crate::model::{ItemKind, Rules, StatKind};
use crate::stats::StatEngine;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Window over the most recently eaten item kinds.
#[derive(Clone, Debug)]
pub(crate) struct LastEaten {
    kinds: VecDeque<ItemKind>,
    capacity: usize,
}

impl LastEaten {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            kinds: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub(crate) fn push(&mut self, kind: ItemKind) {
        while self.kinds.len() >= self.capacity {
            self.kinds.pop_front();
        }
        self.kinds.push_back(kind);
    }

    pub(crate) fn clear(&mut self) {
        self.kinds.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.kinds.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// (good, bad)
    pub(crate) fn counts(&self) -> (usize, usize) {
        let good = self.kinds.iter().filter(|k| **k == ItemKind::Good).count();
        (good, self.kinds.len() - good)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct FeedOutcome {
    /// A bad streak was judged; the pet should play its sickness reaction.
    pub(crate) sick: bool,
    pub(crate) bonus: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct FeedingEconomy {
    last_eaten: LastEaten,
    feed_gain: f32,
    streak_bonus: f32,
    sick_penalty: f32,
    threshold: usize,
}

impl FeedingEconomy {
    pub(crate) fn new(rules: &Rules) -> Self {
        Self {
            last_eaten: LastEaten::new(rules.last_eaten_capacity),
            feed_gain: rules.feed_gain,
            streak_bonus: rules.streak_bonus,
            sick_penalty: rules.sick_penalty,
            threshold: rules.streak_threshold,
        }
    }

    pub(crate) fn last_eaten(&self) -> &LastEaten {
        &self.last_eaten
    }

    /// Applies one eaten item to the stats and judges the streak window.
    pub(crate) fn resolve(&mut self, kind: ItemKind, stats: &mut StatEngine) -> FeedOutcome {
        self.last_eaten.push(kind);
        match kind {
            ItemKind::Good => stats.increment(StatKind::Health, self.feed_gain),
            ItemKind::Bad => stats.increment(StatKind::Fun, self.feed_gain),
        }

        let mut out = FeedOutcome::default();
        if self.last_eaten.len() < self.threshold {
            return out;
        }

        // Both judgments read the window as it was before either reset it.
        // A window of five can never hold three of each.
        let (good, bad) = self.last_eaten.counts();
        debug!(good, bad, "judging streak window");
        if bad >= self.threshold {
            stats.decrement(StatKind::Health, self.sick_penalty);
            self.last_eaten.clear();
            out.sick = true;
            info!(bad, "bad streak, pet is sick");
        }
        if good >= self.threshold {
            stats.increment(StatKind::Health, self.streak_bonus);
            self.last_eaten.clear();
            out.bonus = true;
            info!(good, "good streak bonus");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (FeedingEconomy, StatEngine) {
        let rules = Rules::default();
        (FeedingEconomy::new(&rules), StatEngine::new(rules.decay))
    }

    #[test]
    fn window_evicts_oldest_when_full() {
        let mut w = LastEaten::new(5);
        for _ in 0..5 {
            w.push(ItemKind::Good);
        }
        w.push(ItemKind::Bad);
        assert_eq!(w.len(), 5);
        assert_eq!(w.counts(), (4, 1));
        w.clear();
        assert!(w.is_empty());
    }

    #[test]
    fn good_item_clamps_health() {
        let (mut f, mut s) = setup();
        s.decrement(StatKind::Health, 5.0);
        let out = f.resolve(ItemKind::Good, &mut s);
        assert_eq!(out, FeedOutcome::default());
        assert_eq!(s.stats().health, 100.0);
    }

    #[test]
    fn bad_item_raises_fun() {
        let (mut f, mut s) = setup();
        s.decrement(StatKind::Fun, 40.0);
        f.resolve(ItemKind::Bad, &mut s);
        assert_eq!(s.stats().fun, 70.0);
        assert_eq!(s.stats().health, 100.0);
    }

    #[test]
    fn three_bad_in_a_row_makes_pet_sick_once() {
        let (mut f, mut s) = setup();
        s.decrement(StatKind::Fun, 50.0);

        let mut sick = 0;
        for _ in 0..3 {
            if f.resolve(ItemKind::Bad, &mut s).sick {
                sick += 1;
            }
        }
        assert_eq!(sick, 1);
        assert_eq!(s.stats().fun, 80.0);
        assert_eq!(s.stats().health, 85.0);
        assert!(f.last_eaten().is_empty());
    }

    #[test]
    fn three_good_in_a_row_earn_bonus() {
        let (mut f, mut s) = setup();
        s.decrement(StatKind::Health, 60.0);

        let a = f.resolve(ItemKind::Good, &mut s);
        let b = f.resolve(ItemKind::Good, &mut s);
        assert!(!a.bonus && !b.bonus);
        assert_eq!(s.stats().health, 60.0);

        let c = f.resolve(ItemKind::Good, &mut s);
        assert!(c.bonus && !c.sick);
        assert_eq!(s.stats().health, 85.0);
        assert!(f.last_eaten().is_empty());
    }

    #[test]
    fn mixed_window_judges_once_a_side_reaches_three() {
        let (mut f, mut s) = setup();
        s.decrement(StatKind::Health, 50.0);
        for kind in [ItemKind::Good, ItemKind::Bad, ItemKind::Good, ItemKind::Bad] {
            let out = f.resolve(kind, &mut s);
            assert_eq!(out, FeedOutcome::default());
        }
        assert_eq!(f.last_eaten().len(), 4);

        let out = f.resolve(ItemKind::Bad, &mut s);
        assert!(out.sick && !out.bonus);
        // 50 + 10 + 10 - 15
        assert_eq!(s.stats().health, 55.0);
        assert!(f.last_eaten().is_empty());
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let (mut f, mut s) = setup();
        let pattern = [ItemKind::Good, ItemKind::Bad, ItemKind::Bad, ItemKind::Good];
        for i in 0..40 {
            f.resolve(pattern[i % pattern.len()], &mut s);
            assert!(f.last_eaten().len() <= 5);
        }
    }
}
