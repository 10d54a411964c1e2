use crate::actor::{clamp_to_field, fall, ActorRole, PetActor};
use crate::anim::{AnimationKind, AnimationRequest, Cue, Sequencer};
use crate::feeding::FeedingEconomy;
use crate::model::{
    rest_y, Face, Item, Rect, Rules, Stats, Vec2, FIELD_H, FIELD_W, GROUND_Y, ITEM_SIZE,
    PET_SIZE, PLACE_LIMIT_Y, SLOT_SIZE,
};
use crate::selector::{ItemSelector, SlotView, SLOT_COUNT};
use crate::stats::{StatEngine, Vitality};
use crate::timer::{Tick, TickScheduler, Timer};
use crate::waste::{WasteBin, WasteField, WasteId};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SceneCommand {
    None,
    Home,
}

/// Centre of slot `i` in the bar along the bottom edge.
pub(crate) fn slot_center(i: usize) -> Vec2 {
    let offset = (2.0 * i as f32 - 3.0) * SLOT_SIZE;
    Vec2::new(FIELD_W / 2.0 + offset, FIELD_H - SLOT_SIZE)
}

/// A placed item waiting to be eaten.
#[derive(Clone, Debug)]
pub(crate) struct PendingItem {
    pub(crate) item: Item,
    pub(crate) pos: Vec2,
    pub(crate) alpha: f32,
    vy: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Held {
    Pet,
    Waste(WasteId),
}

#[derive(Clone, Debug)]
pub(crate) enum Phase {
    Playing,
    GameOver { return_home: Timer },
}

#[derive(Clone, Debug)]
pub(crate) struct SessionSummary {
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) ended_at: Option<DateTime<Utc>>,
    pub(crate) decay_ticks: u64,
    pub(crate) feedings: u32,
    pub(crate) streak_bonuses: u32,
    pub(crate) sick_events: u32,
    pub(crate) waste_disposed: u32,
}

impl SessionSummary {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            ended_at: None,
            decay_ticks: 0,
            feedings: 0,
            streak_bonuses: 0,
            sick_events: 0,
            waste_disposed: 0,
        }
    }

    pub(crate) fn lasted(&self) -> ChronoDuration {
        self.ended_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

pub(crate) struct GameScene {
    rules: Rules,
    rng: StdRng,
    stats: StatEngine,
    feeding: FeedingEconomy,
    selector: ItemSelector,
    sequencer: Sequencer,
    scheduler: TickScheduler,
    waste: WasteField,
    bin: WasteBin,
    pet: PetActor,
    pending: Option<PendingItem>,
    held: Option<Held>,
    phase: Phase,
    game_overs: u32,
    summary: SessionSummary,
}

impl GameScene {
    pub(crate) fn new(rules: Rules, seed: u64) -> Self {
        let stats = StatEngine::new(rules.decay);
        let pet = PetActor::new(&stats.stats());
        let mut scene = Self {
            rng: StdRng::seed_from_u64(seed),
            feeding: FeedingEconomy::new(&rules),
            selector: ItemSelector::new(rules.cycle_interval_ms),
            sequencer: Sequencer::default(),
            scheduler: TickScheduler::new(&rules),
            waste: WasteField::new(rules.ground_check_ms, rules.gravity),
            bin: WasteBin::new(),
            stats,
            pet,
            pending: None,
            held: None,
            phase: Phase::Playing,
            game_overs: 0,
            summary: SessionSummary::new(),
            rules,
        };
        if scene.rules.waste_on_start {
            scene.request(AnimationRequest::produce());
        }
        info!(seed, "game started");
        scene
    }

    pub(crate) fn stats(&self) -> Stats {
        self.stats.stats()
    }

    pub(crate) fn pet(&self) -> &PetActor {
        &self.pet
    }

    pub(crate) fn waste(&self) -> &WasteField {
        &self.waste
    }

    pub(crate) fn bin(&self) -> &WasteBin {
        &self.bin
    }

    pub(crate) fn pending(&self) -> Option<&PendingItem> {
        self.pending.as_ref()
    }

    pub(crate) fn slot_views(&self) -> &[SlotView; SLOT_COUNT] {
        self.selector.views()
    }

    pub(crate) fn current_animation(&self) -> Option<AnimationKind> {
        self.sequencer.current()
    }

    pub(crate) fn queued_animations(&self) -> usize {
        self.sequencer.queue_len()
    }

    pub(crate) fn ui_blocked(&self) -> bool {
        self.selector.is_blocked()
    }

    pub(crate) fn streak_len(&self) -> usize {
        self.feeding.last_eaten().len()
    }

    pub(crate) fn is_game_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver { .. })
    }

    pub(crate) fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    fn pet_free(&self) -> bool {
        self.pet.is_grounded()
    }

    fn request(&mut self, request: AnimationRequest) {
        let free = self.pet_free();
        self.sequencer.handle(request, free);
    }

    /// One simulation step of `dt_ms` milliseconds.
    pub(crate) fn update(&mut self, dt_ms: u64) -> SceneCommand {
        for tick in self.scheduler.advance(dt_ms) {
            match tick {
                Tick::Decay => self.decay_tick(),
                Tick::Waste => self.request(AnimationRequest::produce()),
                Tick::Dispatch => {
                    let free = self.pet_free();
                    if let Some(kind) = self.sequencer.dispatch(free) {
                        debug!(?kind, "dequeued animation");
                    }
                }
            }
        }

        self.selector.update(dt_ms, &mut self.rng);

        if let Some(item) = &mut self.pending {
            fall(
                &mut item.pos,
                &mut item.vy,
                self.rules.gravity,
                dt_ms,
                rest_y(ITEM_SIZE),
            );
        }

        if self.pet.update(dt_ms, self.rules.gravity) && !self.is_game_over() {
            self.pet.face = Face::from_stats(&self.stats.stats());
        }

        let target = self.pending.as_ref().map(|p| p.pos);
        for cue in self.sequencer.advance(dt_ms, &mut self.pet, target) {
            self.apply_cue(cue);
        }
        if !self.sequencer.is_playing() {
            self.pet.settle();
        }

        let disposed = self.waste.update(dt_ms, &mut self.bin);
        self.summary.waste_disposed += disposed.len() as u32;
        if let Some(Held::Waste(id)) = self.held {
            if disposed.contains(&id) {
                self.held = None;
            }
        }
        self.bin.update(dt_ms);

        if let Phase::GameOver { return_home } = &mut self.phase {
            if return_home.advance(dt_ms) > 0 {
                info!("returning to title");
                return SceneCommand::Home;
            }
        }
        SceneCommand::None
    }

    fn decay_tick(&mut self) {
        if self.is_game_over() {
            return;
        }
        self.summary.decay_ticks += 1;
        if self.stats.decay_tick(self.waste.poop_count()) == Vitality::Terminal {
            self.game_over();
            return;
        }
        if self.sequencer.is_idle() && self.pet.is_resting() {
            self.pet.face = Face::from_stats(&self.stats.stats());
        }
    }

    fn apply_cue(&mut self, cue: Cue) {
        match cue {
            Cue::ItemFade(alpha) => {
                if let Some(item) = &mut self.pending {
                    item.alpha = alpha;
                }
            }
            Cue::FeedingDone => self.finish_feeding(),
            Cue::WasteDropped => {
                self.waste.spawn(self.pet.pos);
            }
            Cue::RestoreFace => {
                self.pet.face = Face::from_stats(&self.stats.stats());
            }
        }
    }

    fn finish_feeding(&mut self) {
        if let Some(eaten) = self.pending.take() {
            let out = self.feeding.resolve(eaten.item.kind, &mut self.stats);
            self.summary.feedings += 1;
            if out.bonus {
                self.summary.streak_bonuses += 1;
            }
            if out.sick {
                self.summary.sick_events += 1;
                self.request(AnimationRequest::sick());
            }
            debug!(glyph = eaten.item.glyph, kind = ?eaten.item.kind, "item eaten");
        }
        self.pet.face = Face::from_stats(&self.stats.stats());
        if let Some(slot) = self.selector.finish_placement() {
            debug!(slot, renders = self.selector.render_passes(), "slots unblocked");
        }
    }

    /// Terminal stat reached: freeze the pet and head back to the title.
    fn game_over(&mut self) {
        self.selector.block();
        self.selector.clear_selection();
        let dropped = self.sequencer.halt();
        self.scheduler.halt_decay();
        self.scheduler.halt_waste();
        if let Some(held) = self.held.take() {
            match held {
                Held::Pet => self.pet.release(),
                Held::Waste(id) => self.waste.release(id),
            }
        }
        self.pet.face = Face::Dead;
        self.phase = Phase::GameOver {
            return_home: Timer::once(self.rules.game_over_delay_ms),
        };
        self.game_overs += 1;
        self.summary.ended_at = Some(Utc::now());

        let s = self.stats.stats();
        info!(
            health = s.health,
            fun = s.fun,
            dropped_animations = dropped,
            ticks = self.summary.decay_ticks,
            game_overs = self.game_overs,
            "game over"
        );
    }

    pub(crate) fn hit_test(&self, p: Vec2) -> Option<ActorRole> {
        let slot = (0..SLOT_COUNT)
            .find(|i| Rect::centered(slot_center(*i), SLOT_SIZE).contains(p));
        if let Some(i) = slot {
            return Some(ActorRole::Slot(i));
        }
        if self.pet.bounds().contains(p) {
            return Some(ActorRole::Pet);
        }
        self.waste.hit(p).map(ActorRole::Waste)
    }

    pub(crate) fn pointer_down(&mut self, p: Vec2) {
        if self.is_game_over() {
            return;
        }
        match self.hit_test(p) {
            Some(ActorRole::Slot(i)) => {
                self.click_slot(i);
            }
            _ if self.selector.selected().is_some() => {
                self.place_at(p);
            }
            Some(ActorRole::Pet) => {
                // no dragging while an animation owns the pet
                if self.sequencer.is_idle() && self.pet.is_resting() {
                    self.pet.grab();
                    self.held = Some(Held::Pet);
                }
            }
            Some(ActorRole::Waste(id)) => {
                if self.waste.grab(id) {
                    self.held = Some(Held::Waste(id));
                }
            }
            None => {}
        }
    }

    pub(crate) fn pointer_drag(&mut self, p: Vec2) {
        match self.held {
            Some(Held::Pet) => self.pet.drag_to(p, &self.stats.stats()),
            Some(Held::Waste(id)) => self.waste.drag_to(id, p),
            None => {}
        }
    }

    pub(crate) fn pointer_up(&mut self) {
        match self.held.take() {
            Some(Held::Pet) => self.pet.release(),
            Some(Held::Waste(id)) => self.waste.release(id),
            None => {}
        }
    }

    pub(crate) fn click_slot(&mut self, i: usize) -> bool {
        if self.is_game_over() {
            return false;
        }
        self.selector.click(i)
    }

    /// Drops the selected item at `p` and sends the pet to eat it.
    pub(crate) fn place_at(&mut self, p: Vec2) -> bool {
        if self.is_game_over() || p.y > PLACE_LIMIT_Y {
            return false;
        }
        let Some(placement) = self.selector.place(&mut self.rng) else {
            return false;
        };
        debug!(slot = placement.slot, glyph = placement.item.glyph, "item placed");
        let mut pos = clamp_to_field(p, ITEM_SIZE);
        // keep the food where the pet can reach it
        pos.x = pos.x.clamp(PET_SIZE / 2.0, FIELD_W - PET_SIZE / 2.0);
        self.pending = Some(PendingItem {
            item: placement.item,
            pos,
            alpha: 1.0,
            vy: 0.0,
        });
        self.request(AnimationRequest::feed());
        true
    }

    /// Keyboard placement: a little way in front of the pet, toward the
    /// wider side of the field.
    pub(crate) fn place_in_front(&mut self) -> bool {
        let dx = if self.pet.pos.x < FIELD_W / 2.0 { 70.0 } else { -70.0 };
        self.place_at(Vec2::new(self.pet.pos.x + dx, GROUND_Y))
    }

    #[cfg(test)]
    fn set_stat(&mut self, stat: crate::model::StatKind, value: f32) {
        let current = self.stats.stats().get(stat);
        self.stats.decrement(stat, current - value);
    }
}
