use crate::model::{Item, ItemKind, ITEM_POOL, STARTER_ITEMS};
use crate::timer::Timer;
use rand::seq::SliceRandom;
use rand::Rng;

pub(crate) const SLOT_COUNT: usize = 4;

/// Shuffled walk through the item pool shown by an empty slot.
#[derive(Clone, Debug)]
struct Cycler {
    deck: Vec<Item>,
    cursor: usize,
    timer: Timer,
}

impl Cycler {
    fn new<R: Rng + ?Sized>(interval_ms: u64, rng: &mut R) -> Self {
        Self {
            deck: shuffled_pool(rng),
            cursor: 0,
            timer: Timer::repeating(interval_ms),
        }
    }

    fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Item {
        if self.cursor >= self.deck.len() {
            self.deck = shuffled_pool(rng);
            self.cursor = 0;
        }
        let item = self.deck[self.cursor];
        self.cursor += 1;
        item
    }
}

/// Uniform random permutation of the pool (Fisher–Yates).
pub(crate) fn shuffled_pool<R: Rng + ?Sized>(rng: &mut R) -> Vec<Item> {
    let mut deck = ITEM_POOL.to_vec();
    deck.shuffle(rng);
    deck
}

#[derive(Clone, Debug)]
enum SlotState {
    Idle,
    Cycling(Cycler),
}

#[derive(Clone, Debug)]
struct Slot {
    /// None right after placement, until the first cycle step.
    item: Option<Item>,
    state: SlotState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SlotPhase {
    Idle,
    Selected,
    Empty,
    Cycling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SlotView {
    pub(crate) glyph: Option<&'static str>,
    pub(crate) kind: Option<ItemKind>,
    pub(crate) phase: SlotPhase,
    pub(crate) dimmed: bool,
}

impl Default for SlotView {
    fn default() -> Self {
        Self {
            glyph: None,
            kind: None,
            phase: SlotPhase::Empty,
            dimmed: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Placement {
    pub(crate) slot: usize,
    pub(crate) item: Item,
}

/// The four-slot item picker at the bottom of the game screen.
#[derive(Clone, Debug)]
pub(crate) struct ItemSelector {
    slots: [Slot; SLOT_COUNT],
    selected: Option<usize>,
    placed: Option<usize>,
    blocked: bool,
    cycle_interval_ms: u64,
    views: [SlotView; SLOT_COUNT],
    render_passes: u64,
}

impl ItemSelector {
    pub(crate) fn new(cycle_interval_ms: u64) -> Self {
        let slots = STARTER_ITEMS.map(|item| Slot {
            item: Some(item),
            state: SlotState::Idle,
        });
        let mut sel = Self {
            slots,
            selected: None,
            placed: None,
            blocked: false,
            cycle_interval_ms,
            views: [SlotView::default(); SLOT_COUNT],
            render_passes: 0,
        };
        sel.render();
        sel
    }

    pub(crate) fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[cfg(test)]
    pub(crate) fn placed(&self) -> Option<usize> {
        self.placed
    }

    pub(crate) fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub(crate) fn views(&self) -> &[SlotView; SLOT_COUNT] {
        &self.views
    }

    pub(crate) fn render_passes(&self) -> u64 {
        self.render_passes
    }

    /// Click on slot `i`. Returns false when the click was ignored.
    pub(crate) fn click(&mut self, i: usize) -> bool {
        if self.blocked || i >= SLOT_COUNT {
            return false;
        }
        let slot = &mut self.slots[i];
        match slot.state {
            SlotState::Idle => {
                self.selected = Some(i);
            }
            SlotState::Cycling(_) => {
                // nothing shown yet, nothing to keep
                if slot.item.is_none() {
                    return false;
                }
                slot.state = SlotState::Idle;
                self.selected = None;
            }
        }
        self.render();
        true
    }

    /// Consumes the selection. The slot empties and starts cycling, and
    /// the UI stays blocked until `finish_placement`.
    pub(crate) fn place<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Placement> {
        if self.blocked {
            return None;
        }
        let i = self.selected?;
        let item = self.slots[i].item?;

        self.blocked = true;
        self.placed = Some(i);
        self.selected = None;
        self.slots[i] = Slot {
            item: None,
            state: SlotState::Cycling(Cycler::new(self.cycle_interval_ms, rng)),
        };
        self.render();
        Some(Placement { slot: i, item })
    }

    pub(crate) fn finish_placement(&mut self) -> Option<usize> {
        let placed = self.placed.take();
        self.blocked = false;
        self.render();
        placed
    }

    pub(crate) fn block(&mut self) {
        self.blocked = true;
        self.render();
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected = None;
        self.render();
    }

    /// Advances every cycling slot by `dt_ms`.
    pub(crate) fn update<R: Rng + ?Sized>(&mut self, dt_ms: u64, rng: &mut R) {
        let mut changed = false;
        for slot in &mut self.slots {
            if let SlotState::Cycling(cycler) = &mut slot.state {
                for _ in 0..cycler.timer.advance(dt_ms) {
                    slot.item = Some(cycler.next(rng));
                    changed = true;
                }
            }
        }
        if changed {
            self.render();
        }
    }

    /// Full pass over all four slots.
    fn render(&mut self) {
        for (i, slot) in self.slots.iter().enumerate() {
            let phase = if self.selected == Some(i) {
                SlotPhase::Selected
            } else {
                match (&slot.state, slot.item) {
                    (SlotState::Idle, _) => SlotPhase::Idle,
                    (SlotState::Cycling(_), None) => SlotPhase::Empty,
                    (SlotState::Cycling(_), Some(_)) => SlotPhase::Cycling,
                }
            };
            self.views[i] = SlotView {
                glyph: slot.item.map(|it| it.glyph),
                kind: slot.item.map(|it| it.kind),
                phase,
                dimmed: self.blocked || self.selected == Some(i),
            };
        }
        self.render_passes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn selected_count(sel: &ItemSelector) -> usize {
        sel.views()
            .iter()
            .filter(|v| v.phase == SlotPhase::Selected)
            .count()
    }

    #[test]
    fn starts_with_four_idle_slots() {
        let sel = ItemSelector::new(200);
        assert!(sel.views().iter().all(|v| v.phase == SlotPhase::Idle));
        assert_eq!(sel.views()[0].kind, Some(ItemKind::Good));
        assert_eq!(sel.views()[3].kind, Some(ItemKind::Bad));
        assert!(sel.views().iter().all(|v| !v.dimmed));
    }

    #[test]
    fn selection_moves_between_slots() {
        let mut sel = ItemSelector::new(200);
        assert!(sel.click(0));
        assert_eq!(sel.selected(), Some(0));
        assert!(sel.click(2));
        assert_eq!(sel.selected(), Some(2));
        assert_eq!(selected_count(&sel), 1);
        assert!(sel.views()[2].dimmed);
        assert!(!sel.views()[0].dimmed);
        assert!(!sel.click(9));
    }

    #[test]
    fn place_without_selection_is_a_no_op() {
        let mut sel = ItemSelector::new(200);
        let before = sel.render_passes();
        assert_eq!(sel.place(&mut rng()), None);
        assert!(!sel.is_blocked());
        assert_eq!(sel.render_passes(), before);
    }

    #[test]
    fn placement_blocks_and_empties_slot() {
        let mut r = rng();
        let mut sel = ItemSelector::new(200);
        sel.click(1);
        let p = sel.place(&mut r).expect("placement");
        assert_eq!(p.slot, 1);
        assert_eq!(p.item, STARTER_ITEMS[1]);
        assert!(sel.is_blocked());
        assert_eq!(sel.placed(), Some(1));
        assert_eq!(sel.selected(), None);
        assert_eq!(sel.views()[1].phase, SlotPhase::Empty);
        assert!(sel.views().iter().all(|v| v.dimmed));

        // clicks are ignored while blocked
        assert!(!sel.click(0));
        assert_eq!(sel.place(&mut r), None);

        assert_eq!(sel.finish_placement(), Some(1));
        assert!(!sel.is_blocked());
        assert!(sel.click(0));
    }

    #[test]
    fn empty_slot_cycles_until_clicked() {
        let mut r = rng();
        let mut sel = ItemSelector::new(200);
        sel.click(3);
        sel.place(&mut r);
        sel.finish_placement();

        // nothing to take before the first step
        assert!(!sel.click(3));
        sel.update(199, &mut r);
        assert_eq!(sel.views()[3].phase, SlotPhase::Empty);

        sel.update(1, &mut r);
        let first = sel.views()[3].glyph.expect("candidate shown");
        sel.update(200, &mut r);
        let second = sel.views()[3].glyph.expect("candidate shown");
        assert_ne!(first, second);
        assert_eq!(sel.views()[3].phase, SlotPhase::Cycling);

        sel.click(0);
        assert!(sel.click(3));
        assert_eq!(sel.views()[3].phase, SlotPhase::Idle);
        assert_eq!(sel.selected(), None);
        let kept = sel.views()[3];
        sel.update(5_000, &mut r);
        assert_eq!(sel.views()[3], kept);

        // the kept item can now be selected and placed
        assert!(sel.click(3));
        let p = sel.place(&mut r).expect("placement");
        assert_eq!(Some(p.item.glyph), kept.glyph);
    }

    #[test]
    fn cycling_walks_a_full_permutation() {
        let mut r = rng();
        let mut sel = ItemSelector::new(200);
        sel.click(0);
        sel.place(&mut r);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..ITEM_POOL.len() {
            sel.update(200, &mut r);
            seen.insert(sel.views()[0].glyph.expect("candidate"));
        }
        assert_eq!(seen.len(), ITEM_POOL.len());
    }

    #[test]
    fn block_and_clear_selection_rerender() {
        let mut sel = ItemSelector::new(200);
        sel.click(2);
        let before = sel.render_passes();
        sel.block();
        sel.clear_selection();
        assert_eq!(sel.render_passes(), before + 2);
        assert_eq!(selected_count(&sel), 0);
        assert!(sel.views().iter().all(|v| v.dimmed));
        assert!(!sel.click(1));
    }
}
