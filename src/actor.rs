use crate::model::{rest_y, Face, Rect, Stats, Vec2, FIELD_H, FIELD_W, PET_SIZE};
use crate::waste::WasteId;

/// What a pointer landed on. Hit tests resolve to a role, never to a glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ActorRole {
    Pet,
    Waste(WasteId),
    Slot(usize),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum PetMotion {
    Resting,
    Held,
    Falling { vy: f32 },
}

#[derive(Clone, Debug)]
pub(crate) struct PetActor {
    pub(crate) pos: Vec2,
    pub(crate) face: Face,
    pub(crate) motion: PetMotion,
}

impl PetActor {
    pub(crate) fn new(stats: &Stats) -> Self {
        Self {
            pos: Vec2::new(FIELD_W / 2.0, rest_y(PET_SIZE)),
            face: Face::from_stats(stats),
            motion: PetMotion::Resting,
        }
    }

    pub(crate) fn bounds(&self) -> Rect {
        Rect::centered(self.pos, PET_SIZE)
    }

    pub(crate) fn is_resting(&self) -> bool {
        self.motion == PetMotion::Resting
    }

    /// Resting and standing on its floor line, not left hanging by an animation.
    pub(crate) fn is_grounded(&self) -> bool {
        self.is_resting() && self.pos.y >= rest_y(PET_SIZE)
    }

    pub(crate) fn grab(&mut self) {
        self.motion = PetMotion::Held;
    }

    /// Follows the pointer; startled while lifted above mid-screen.
    pub(crate) fn drag_to(&mut self, p: Vec2, stats: &Stats) {
        if self.motion != PetMotion::Held {
            return;
        }
        self.pos = clamp_to_field(p, PET_SIZE);
        self.face = if self.pos.y < FIELD_H / 2.0 {
            Face::Startled
        } else {
            Face::from_stats(stats)
        };
    }

    pub(crate) fn release(&mut self) {
        if self.motion == PetMotion::Held {
            self.motion = PetMotion::Falling { vy: 0.0 };
        }
    }

    /// Drops the pet back to the floor after an animation or a drag.
    pub(crate) fn settle(&mut self) {
        if self.motion == PetMotion::Resting && self.pos.y < rest_y(PET_SIZE) {
            self.motion = PetMotion::Falling { vy: 0.0 };
        }
    }

    /// Returns true on the frame the pet lands.
    pub(crate) fn update(&mut self, dt_ms: u64, gravity: f32) -> bool {
        let PetMotion::Falling { mut vy } = self.motion else {
            return false;
        };
        let landed = fall(&mut self.pos, &mut vy, gravity, dt_ms, rest_y(PET_SIZE));
        self.motion = if landed {
            PetMotion::Resting
        } else {
            PetMotion::Falling { vy }
        };
        landed
    }
}

/// One gravity step toward `rest`. Returns true once resting there.
pub(crate) fn fall(pos: &mut Vec2, vy: &mut f32, gravity: f32, dt_ms: u64, rest: f32) -> bool {
    let dt = dt_ms as f32 / 1000.0;
    *vy += gravity * dt;
    pos.y += *vy * dt;
    if pos.y >= rest {
        pos.y = rest;
        *vy = 0.0;
        true
    } else {
        false
    }
}

/// Keeps an actor of `size` inside the world bounds.
pub(crate) fn clamp_to_field(p: Vec2, size: f32) -> Vec2 {
    let h = size / 2.0;
    Vec2::new(p.x.clamp(h, FIELD_W - h), p.y.clamp(h, rest_y(size)))
}
