use crate::actor::{clamp_to_field, fall};
use crate::model::{bin_pos, rest_y, Facing, Rect, Vec2, BIN_SIZE, FIELD_W, WASTE_SIZE};
use crate::timer::Timer;
use tracing::{debug, info, warn};

pub(crate) type WasteId = u64;

const MIN_X: f32 = WASTE_SIZE;
const MAX_X: f32 = FIELD_W - WASTE_SIZE;

/// (pause before the step, distance) for one patrol cycle.
const PATROL_STEPS: [(u64, f32); 3] = [(1000, 10.0), (750, 20.0), (1000, 30.0)];
const PATROL_MOVE_MS: u64 = 200;

const GROW_MS: u64 = 1000;
const GROW_SCALE: f32 = 1.1;

pub(crate) fn ease_out_expo(t: f32) -> f32 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f32.powf(-10.0 * t)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Stride {
    Waiting { elapsed_ms: u64 },
    Moving { from: f32, to: f32, elapsed_ms: u64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Patrol {
    step: usize,
    stride: Stride,
}

impl Patrol {
    fn new() -> Self {
        Self {
            step: 0,
            stride: Stride::Waiting { elapsed_ms: 0 },
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum WastePhase {
    Settling { vy: f32, ground_check: Timer },
    Patrolling(Patrol),
    Held,
}

#[derive(Clone, Debug)]
pub(crate) struct WasteEntity {
    pub(crate) id: WasteId,
    pub(crate) pos: Vec2,
    pub(crate) facing: Facing,
    pub(crate) grounded: bool,
    pub(crate) phase: WastePhase,
}

impl WasteEntity {
    pub(crate) fn bounds(&self) -> Rect {
        Rect::centered(self.pos, WASTE_SIZE)
    }

    #[cfg(test)]
    pub(crate) fn is_patrolling(&self) -> bool {
        matches!(self.phase, WastePhase::Patrolling(_))
    }

    fn settle(&mut self, ground_check_ms: u64) {
        self.grounded = false;
        self.phase = WastePhase::Settling {
            vy: 0.0,
            ground_check: Timer::repeating(ground_check_ms),
        };
    }

    fn update(&mut self, dt_ms: u64, gravity: f32) {
        match &mut self.phase {
            WastePhase::Held => {}
            WastePhase::Settling { vy, ground_check } => {
                if !self.grounded {
                    self.grounded = fall(&mut self.pos, vy, gravity, dt_ms, rest_y(WASTE_SIZE));
                }
                if ground_check.advance(dt_ms) > 0 && self.grounded {
                    ground_check.destroy();
                    self.phase = WastePhase::Patrolling(Patrol::new());
                }
            }
            WastePhase::Patrolling(patrol) => {
                advance_patrol(patrol, &mut self.pos, &mut self.facing, dt_ms);
            }
        }
    }
}

fn advance_patrol(patrol: &mut Patrol, pos: &mut Vec2, facing: &mut Facing, dt_ms: u64) {
    let mut budget = dt_ms;
    loop {
        let (pause, dist) = PATROL_STEPS[patrol.step];
        match &mut patrol.stride {
            Stride::Waiting { elapsed_ms } => {
                let need = pause - *elapsed_ms;
                if budget < need {
                    *elapsed_ms += budget;
                    return;
                }
                budget -= need;
                // Reverse on the tick the stride would leave the field.
                let mut to = pos.x + facing.sign() * dist;
                if to > MAX_X {
                    to = MAX_X;
                    *facing = Facing::West;
                } else if to < MIN_X {
                    to = MIN_X;
                    *facing = Facing::East;
                }
                patrol.stride = Stride::Moving {
                    from: pos.x,
                    to,
                    elapsed_ms: 0,
                };
            }
            Stride::Moving {
                from,
                to,
                elapsed_ms,
            } => {
                let need = PATROL_MOVE_MS - *elapsed_ms;
                if budget < need {
                    *elapsed_ms += budget;
                    let t = *elapsed_ms as f32 / PATROL_MOVE_MS as f32;
                    pos.x = *from + (*to - *from) * ease_out_expo(t);
                    return;
                }
                budget -= need;
                pos.x = *to;
                patrol.step = (patrol.step + 1) % PATROL_STEPS.len();
                if patrol.step == 0 {
                    if pos.x >= MAX_X {
                        *facing = Facing::West;
                    } else if pos.x <= MIN_X {
                        *facing = Facing::East;
                    }
                }
                patrol.stride = Stride::Waiting { elapsed_ms: 0 };
            }
        }
    }
}

/// The bin that swallows waste and briefly swells.
#[derive(Clone, Debug)]
pub(crate) struct WasteBin {
    pub(crate) pos: Vec2,
    grow: Option<Timer>,
    swallowed: u32,
}

impl WasteBin {
    pub(crate) fn new() -> Self {
        Self {
            pos: bin_pos(),
            grow: None,
            swallowed: 0,
        }
    }

    pub(crate) fn bounds(&self) -> Rect {
        Rect::centered(self.pos, BIN_SIZE)
    }

    pub(crate) fn grow(&mut self) {
        self.swallowed += 1;
        self.grow = Some(Timer::once(GROW_MS));
    }

    pub(crate) fn update(&mut self, dt_ms: u64) {
        if let Some(t) = &mut self.grow {
            if t.advance(dt_ms) > 0 {
                self.grow = None;
            }
        }
    }

    pub(crate) fn scale(&self) -> f32 {
        if self.grow.is_some() {
            GROW_SCALE
        } else {
            1.0
        }
    }

    pub(crate) fn swallowed(&self) -> u32 {
        self.swallowed
    }
}

/// Every live waste entity plus the count that scales health decay.
#[derive(Clone, Debug)]
pub(crate) struct WasteField {
    entities: Vec<WasteEntity>,
    next_id: WasteId,
    poop_count: u32,
    ground_check_ms: u64,
    gravity: f32,
}

impl WasteField {
    pub(crate) fn new(ground_check_ms: u64, gravity: f32) -> Self {
        Self {
            entities: Vec::new(),
            next_id: 1,
            poop_count: 0,
            ground_check_ms,
            gravity,
        }
    }

    pub(crate) fn poop_count(&self) -> u32 {
        self.poop_count
    }

    pub(crate) fn entities(&self) -> &[WasteEntity] {
        &self.entities
    }

    #[cfg(test)]
    pub(crate) fn get(&self, id: WasteId) -> Option<&WasteEntity> {
        self.entities.iter().find(|w| w.id == id)
    }

    /// New waste just below the pet, facing east.
    pub(crate) fn spawn(&mut self, at: Vec2) -> WasteId {
        let id = self.next_id;
        self.next_id += 1;
        self.poop_count += 1;

        let mut pos = clamp_to_field(Vec2::new(at.x, at.y + 20.0), WASTE_SIZE);
        pos.x = pos.x.clamp(MIN_X, MAX_X);
        let mut w = WasteEntity {
            id,
            pos,
            facing: Facing::East,
            grounded: false,
            phase: WastePhase::Held,
        };
        w.settle(self.ground_check_ms);
        info!(id, count = self.poop_count, "waste spawned");
        self.entities.push(w);
        id
    }

    pub(crate) fn destroy(&mut self, id: WasteId) -> bool {
        let Some(idx) = self.entities.iter().position(|w| w.id == id) else {
            return false;
        };
        self.entities.remove(idx);
        if self.poop_count == 0 {
            warn!(id, "waste count underflow");
        }
        self.poop_count = self.poop_count.saturating_sub(1);
        true
    }

    pub(crate) fn hit(&self, p: Vec2) -> Option<WasteId> {
        self.entities
            .iter()
            .rev()
            .find(|w| w.bounds().contains(p))
            .map(|w| w.id)
    }

    pub(crate) fn grab(&mut self, id: WasteId) -> bool {
        match self.entities.iter_mut().find(|w| w.id == id) {
            Some(w) => {
                w.phase = WastePhase::Held;
                w.grounded = false;
                true
            }
            None => false,
        }
    }

    pub(crate) fn drag_to(&mut self, id: WasteId, p: Vec2) {
        if let Some(w) = self.entities.iter_mut().find(|w| w.id == id) {
            if matches!(w.phase, WastePhase::Held) {
                w.pos = clamp_to_field(p, WASTE_SIZE);
                w.pos.x = w.pos.x.clamp(MIN_X, MAX_X);
            }
        }
    }

    pub(crate) fn release(&mut self, id: WasteId) {
        let ground_check_ms = self.ground_check_ms;
        if let Some(w) = self.entities.iter_mut().find(|w| w.id == id) {
            if matches!(w.phase, WastePhase::Held) {
                w.settle(ground_check_ms);
            }
        }
    }

    /// Moves every entity, then lets the bin swallow whatever touches it.
    /// Returns the ids disposed this frame.
    pub(crate) fn update(&mut self, dt_ms: u64, bin: &mut WasteBin) -> Vec<WasteId> {
        for w in &mut self.entities {
            w.update(dt_ms, self.gravity);
        }

        let bin_box = bin.bounds();
        let touching: Vec<WasteId> = self
            .entities
            .iter()
            .filter(|w| !matches!(w.phase, WastePhase::Held))
            .filter(|w| w.bounds().overlaps(&bin_box))
            .map(|w| w.id)
            .collect();

        for id in &touching {
            bin.grow();
            self.destroy(*id);
            debug!(id, remaining = self.poop_count, "waste disposed");
        }
        touching
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const G: f32 = 300.0;

    fn field() -> WasteField {
        WasteField::new(1500, G)
    }

    fn far_bin() -> WasteBin {
        // out of reach of anything in these tests
        let mut bin = WasteBin::new();
        bin.pos = Vec2::new(-500.0, -500.0);
        bin
    }

    fn step(f: &mut WasteField, bin: &mut WasteBin, ms: u64) -> Vec<WasteId> {
        let mut out = Vec::new();
        for _ in 0..(ms / 20) {
            out.extend(f.update(20, bin));
        }
        out
    }

    #[test]
    fn spawned_waste_settles_then_patrols() {
        let mut f = field();
        let mut bin = far_bin();
        let id = f.spawn(Vec2::new(200.0, 390.0));
        assert_eq!(f.poop_count(), 1);
        assert!(!f.get(id).unwrap().grounded);

        step(&mut f, &mut bin, 1000);
        let w = f.get(id).unwrap();
        assert!(w.grounded);
        assert!(!w.is_patrolling());

        step(&mut f, &mut bin, 600);
        let w = f.get(id).unwrap();
        assert!(w.is_patrolling());
        assert_eq!(w.pos.y, rest_y(WASTE_SIZE));
    }

    #[test]
    fn patrol_cycle_covers_sixty_units() {
        let mut f = field();
        let mut bin = far_bin();
        let id = f.spawn(Vec2::new(150.0, 390.0));
        step(&mut f, &mut bin, 1500);
        let x0 = f.get(id).unwrap().pos.x;
        assert!(f.get(id).unwrap().is_patrolling());

        // 1000 + 200 + 750 + 200 + 1000 + 200
        step(&mut f, &mut bin, 3360);
        let w = f.get(id).unwrap();
        assert!((w.pos.x - (x0 + 60.0)).abs() < 1e-3, "x = {}", w.pos.x);
        assert_eq!(w.facing, Facing::East);
    }

    #[test]
    fn patrol_stays_inside_and_turns_around() {
        let mut f = field();
        let mut bin = far_bin();
        let id = f.spawn(Vec2::new(300.0, 390.0));
        let mut turned = false;
        for _ in 0..3000 {
            f.update(20, &mut bin);
            let w = f.get(id).unwrap();
            assert!(w.pos.x >= MIN_X && w.pos.x <= MAX_X, "x = {}", w.pos.x);
            if w.facing == Facing::West {
                turned = true;
            }
        }
        assert!(turned);
    }

    #[test]
    fn waste_dropped_at_the_edge_patrols_inside() {
        let mut f = field();
        let mut bin = far_bin();
        let left = f.spawn(Vec2::new(2.0, 390.0));
        let right = f.spawn(Vec2::new(FIELD_W, 390.0));
        assert_eq!(f.get(left).unwrap().pos.x, MIN_X);
        assert_eq!(f.get(right).unwrap().pos.x, MAX_X);

        for _ in 0..1000 {
            f.update(20, &mut bin);
            for w in f.entities() {
                assert!(w.pos.x >= MIN_X && w.pos.x <= MAX_X, "x = {}", w.pos.x);
            }
        }
        assert!(f.entities().iter().all(|w| w.is_patrolling()));
    }

    #[test]
    fn bin_stands_where_it_is_drawn() {
        assert_eq!(WasteBin::new().pos, bin_pos());
        assert!(WasteBin::new().bounds().contains(bin_pos()));
    }

    #[test]
    fn bin_swallows_patrolling_waste() {
        let mut f = field();
        let mut bin = WasteBin::new();
        let id = f.spawn(Vec2::new(bin.pos.x + 40.0, 390.0));
        f.spawn(Vec2::new(300.0, 390.0));
        assert_eq!(f.poop_count(), 2);

        // Let it land clear of the bin, then walk it in.
        let disposed = step(&mut f, &mut bin, 1000);
        assert!(disposed.is_empty() || disposed == vec![id]);
        if disposed.is_empty() {
            f.grab(id);
            f.drag_to(id, Vec2::new(bin.pos.x + 20.0, bin.pos.y));
            f.release(id);
            assert_eq!(f.update(20, &mut bin), vec![id]);
        }
        assert!(f.get(id).is_none());
        assert_eq!(f.poop_count(), 1);
        assert_eq!(bin.scale(), GROW_SCALE);
        assert_eq!(bin.swallowed(), 1);

        bin.update(1000);
        assert_eq!(bin.scale(), 1.0);
    }

    #[test]
    fn held_waste_is_ignored_by_the_bin_until_released() {
        let mut f = field();
        let mut bin = WasteBin::new();
        let id = f.spawn(Vec2::new(300.0, 390.0));
        assert!(f.grab(id));
        f.drag_to(id, bin.pos);
        assert!(f.update(20, &mut bin).is_empty());
        f.release(id);
        assert_eq!(f.update(20, &mut bin), vec![id]);
        assert_eq!(f.poop_count(), 0);
    }

    #[test]
    fn destroy_never_underflows() {
        let mut f = field();
        assert!(!f.destroy(42));
        let id = f.spawn(Vec2::new(200.0, 300.0));
        assert!(f.destroy(id));
        assert!(!f.destroy(id));
        assert_eq!(f.poop_count(), 0);
    }

    #[test]
    fn easing_hits_its_endpoints() {
        assert_eq!(ease_out_expo(0.0), 0.0);
        assert_eq!(ease_out_expo(1.0), 1.0);
        assert!(ease_out_expo(0.5) > 0.9);
    }
}
