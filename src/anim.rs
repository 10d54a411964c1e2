//! Composite pet animations and the sequencer that plays them one at a time.

use crate::actor::{clamp_to_field, PetActor};
use crate::model::{Face, Vec2, PET_SIZE};
use std::collections::VecDeque;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Motion {
    Still,
    /// Walk level to the target's x.
    ToTargetX,
    /// Move to a point `dy` above or below the target.
    ToTarget { dy: f32 },
    /// Relative to where the step starts.
    Shift { dx: f32, dy: f32 },
}

/// Side effect raised by a step, handled by the owning scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Cue {
    ItemFade(f32),
    FeedingDone,
    WasteDropped,
    RestoreFace,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Step {
    pub(crate) at_ms: u64,
    pub(crate) duration_ms: u64,
    pub(crate) face: Option<Face>,
    pub(crate) motion: Motion,
    pub(crate) on_start: Option<Cue>,
    pub(crate) on_complete: Option<Cue>,
}

impl Step {
    fn new(duration_ms: u64) -> Self {
        Self {
            at_ms: 0,
            duration_ms,
            face: None,
            motion: Motion::Still,
            on_start: None,
            on_complete: None,
        }
    }

    fn face(mut self, face: Face) -> Self {
        self.face = Some(face);
        self
    }

    fn motion(mut self, motion: Motion) -> Self {
        self.motion = motion;
        self
    }

    fn on_start(mut self, cue: Cue) -> Self {
        self.on_start = Some(cue);
        self
    }

    fn on_complete(mut self, cue: Cue) -> Self {
        self.on_complete = Some(cue);
        self
    }
}

/// Ordered, non-overlapping steps.
#[derive(Default)]
struct Timeline {
    steps: Vec<Step>,
    end_ms: u64,
}

impl Timeline {
    /// Appends after the current end.
    fn then(self, step: Step) -> Self {
        let at = self.end_ms;
        self.at(at, step)
    }

    /// Places a step at an absolute offset from the timeline start.
    fn at(mut self, at_ms: u64, mut step: Step) -> Self {
        debug_assert!(at_ms >= self.end_ms, "timeline steps must not overlap");
        step.at_ms = at_ms;
        self.end_ms = at_ms + step.duration_ms;
        self.steps.push(step);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum AnimationKind {
    Feed,
    Produce,
    Sick,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AnimationRequest {
    kind: AnimationKind,
    steps: Vec<Step>,
}

impl AnimationRequest {
    fn from_timeline(kind: AnimationKind, timeline: Timeline) -> Self {
        Self {
            kind,
            steps: timeline.steps,
        }
    }

    /// Walk to the placed item, then three bite/chew pairs while it fades.
    pub(crate) fn feed() -> Self {
        let mut tl = Timeline::default().then(
            Step::new(1500)
                .face(Face::Hugging)
                .motion(Motion::ToTargetX),
        );
        let fades = [0.7, 0.4, 0.2];
        for (i, alpha) in fades.iter().enumerate() {
            let mut chew = Step::new(150)
                .face(Face::Savoring)
                .motion(Motion::ToTarget { dy: -20.0 })
                .on_start(Cue::ItemFade(*alpha));
            if i + 1 == fades.len() {
                chew = chew.on_complete(Cue::FeedingDone);
            }
            tl = tl
                .then(
                    Step::new(300)
                        .face(Face::Gaping)
                        .motion(Motion::ToTarget { dy: -50.0 }),
                )
                .then(chew);
        }
        Self::from_timeline(AnimationKind::Feed, tl)
    }

    /// Wiggle, squat, drop the waste, recover.
    pub(crate) fn produce() -> Self {
        let mut tl = Timeline::default();
        for _ in 0..10 {
            tl = tl
                .then(
                    Step::new(100)
                        .face(Face::Straining)
                        .motion(Motion::Shift { dx: 3.0, dy: 0.0 }),
                )
                .then(
                    Step::new(100)
                        .face(Face::Straining)
                        .motion(Motion::Shift { dx: -3.0, dy: 0.0 }),
                );
        }
        let tl = tl
            .at(
                2000,
                Step::new(100)
                    .face(Face::Savoring)
                    .motion(Motion::Shift { dx: 0.0, dy: -30.0 })
                    .on_complete(Cue::WasteDropped),
            )
            .at(2500, Step::new(0).on_complete(Cue::RestoreFace));
        Self::from_timeline(AnimationKind::Produce, tl)
    }

    pub(crate) fn sick() -> Self {
        let tl = Timeline::default()
            .at(0, Step::new(0).face(Face::Nauseous))
            .at(1000, Step::new(0).face(Face::Vomiting))
            .at(1700, Step::new(0).face(Face::Dejected))
            .at(2700, Step::new(0).on_complete(Cue::RestoreFace));
        Self::from_timeline(AnimationKind::Sick, tl)
    }

    pub(crate) fn kind(&self) -> AnimationKind {
        self.kind
    }

    pub(crate) fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub(crate) fn duration_ms(&self) -> u64 {
        self.steps
            .last()
            .map(|s| s.at_ms + s.duration_ms)
            .unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug)]
struct ActiveStep {
    index: usize,
    from: Vec2,
    to: Vec2,
}

#[derive(Clone, Debug)]
struct Playback {
    request: AnimationRequest,
    elapsed_ms: u64,
    next: usize,
    active: Option<ActiveStep>,
}

impl Playback {
    fn new(request: AnimationRequest) -> Self {
        Self {
            request,
            elapsed_ms: 0,
            next: 0,
            active: None,
        }
    }

    /// Returns true once the last step has completed.
    fn advance(
        &mut self,
        dt_ms: u64,
        pet: &mut PetActor,
        target: Option<Vec2>,
        cues: &mut Vec<Cue>,
    ) -> bool {
        self.elapsed_ms += dt_ms;
        loop {
            if let Some(active) = self.active {
                let step = self.request.steps()[active.index];
                let end = step.at_ms + step.duration_ms;
                let moves = step.motion != Motion::Still;
                if self.elapsed_ms >= end {
                    if moves {
                        pet.pos = active.to;
                    }
                    cues.extend(step.on_complete);
                    self.active = None;
                    continue;
                }
                if moves {
                    let t = (self.elapsed_ms - step.at_ms) as f32 / step.duration_ms as f32;
                    pet.pos = active.from.lerp(active.to, t);
                }
                return false;
            }

            let Some(step) = self.request.steps().get(self.next).copied() else {
                return true;
            };
            if self.elapsed_ms < step.at_ms {
                return false;
            }
            let from = pet.pos;
            let to = resolve_motion(step.motion, from, target);
            if let Some(face) = step.face {
                pet.face = face;
            }
            cues.extend(step.on_start);
            self.active = Some(ActiveStep {
                index: self.next,
                from,
                to,
            });
            self.next += 1;
        }
    }
}

fn resolve_motion(motion: Motion, from: Vec2, target: Option<Vec2>) -> Vec2 {
    match (motion, target) {
        (Motion::Still, _) => from,
        // the pet never follows a target past the field edge
        (Motion::ToTargetX, Some(t)) => clamp_to_field(Vec2::new(t.x, from.y), PET_SIZE),
        (Motion::ToTarget { dy }, Some(t)) => clamp_to_field(Vec2::new(t.x, t.y + dy), PET_SIZE),
        (Motion::ToTargetX | Motion::ToTarget { .. }, None) => from,
        (Motion::Shift { dx, dy }, _) => Vec2::new(from.x + dx, from.y + dy),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Dispatch {
    Started,
    Queued,
}

/// At most one composite animation drives the pet; the rest wait in
/// submission order.
#[derive(Clone, Debug, Default)]
pub(crate) struct Sequencer {
    playing: Option<Playback>,
    queue: VecDeque<AnimationRequest>,
}

impl Sequencer {
    /// Plays now if the pet is free and nothing is waiting, else queues.
    pub(crate) fn handle(&mut self, request: AnimationRequest, actor_free: bool) -> Dispatch {
        if self.playing.is_none() && self.queue.is_empty() && actor_free {
            self.play(request);
            Dispatch::Started
        } else {
            debug!(kind = ?request.kind(), queued = self.queue.len() + 1, "animation deferred");
            self.queue.push_back(request);
            Dispatch::Queued
        }
    }

    /// Scheduler tick: start the head of the queue if the pet is idle.
    pub(crate) fn dispatch(&mut self, actor_free: bool) -> Option<AnimationKind> {
        if self.playing.is_some() || !actor_free {
            return None;
        }
        let request = self.dequeue_head()?;
        let kind = request.kind();
        self.play(request);
        Some(kind)
    }

    pub(crate) fn dequeue_head(&mut self) -> Option<AnimationRequest> {
        self.queue.pop_front()
    }

    /// Cues are returned after the sequencer has gone idle for a finished
    /// animation, so completion effects may submit follow-up requests.
    pub(crate) fn advance(
        &mut self,
        dt_ms: u64,
        pet: &mut PetActor,
        target: Option<Vec2>,
    ) -> Vec<Cue> {
        let mut cues = Vec::new();
        if let Some(playback) = &mut self.playing {
            if playback.advance(dt_ms, pet, target, &mut cues) {
                debug!(kind = ?playback.request.kind, "animation finished");
                self.playing = None;
            }
        }
        cues
    }

    /// Kills the running animation and drops everything queued.
    pub(crate) fn halt(&mut self) -> usize {
        let dropped = self.queue.len() + usize::from(self.playing.is_some());
        self.playing = None;
        self.queue.clear();
        dropped
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.playing.is_some()
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.playing.is_none() && self.queue.is_empty()
    }

    pub(crate) fn current(&self) -> Option<AnimationKind> {
        self.playing.as_ref().map(|p| p.request.kind)
    }

    pub(crate) fn queue_len(&self) -> usize {
        self.queue.len()
    }

    fn play(&mut self, request: AnimationRequest) {
        debug!(kind = ?request.kind(), ms = request.duration_ms(), "animation started");
        self.playing = Some(Playback::new(request));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Stats;

    fn pet() -> PetActor {
        PetActor::new(&Stats::default())
    }

    /// Advances in small frames until the sequencer is done with `kind`.
    fn run_out(seq: &mut Sequencer, pet: &mut PetActor, target: Option<Vec2>) -> Vec<Cue> {
        let mut cues = Vec::new();
        for _ in 0..1000 {
            cues.extend(seq.advance(20, pet, target));
            if !seq.is_playing() {
                break;
            }
        }
        cues
    }

    #[test]
    fn step_counts_match_the_choreography() {
        let feed = AnimationRequest::feed();
        assert_eq!(feed.steps().len(), 7);
        assert_eq!(feed.steps().iter().skip(1).count(), 6);
        assert_eq!(feed.duration_ms(), 1500 + 3 * 450);

        let produce = AnimationRequest::produce();
        assert_eq!(produce.steps().len(), 22);
        assert_eq!(produce.duration_ms(), 2500);

        let sick = AnimationRequest::sick();
        assert_eq!(sick.steps().len(), 4);
        assert_eq!(sick.duration_ms(), 2700);
    }

    #[test]
    fn second_request_waits_for_first_to_complete() {
        let mut seq = Sequencer::default();
        let mut p = pet();
        assert_eq!(seq.handle(AnimationRequest::sick(), true), Dispatch::Started);
        assert_eq!(seq.handle(AnimationRequest::produce(), true), Dispatch::Queued);
        assert_eq!(seq.current(), Some(AnimationKind::Sick));

        // the pet is busy: ticks do nothing
        assert_eq!(seq.dispatch(true), None);

        let cues = run_out(&mut seq, &mut p, None);
        assert_eq!(cues.last(), Some(&Cue::RestoreFace));
        assert!(!seq.is_playing());
        assert_eq!(seq.queue_len(), 1);

        assert_eq!(seq.dispatch(true), Some(AnimationKind::Produce));
        assert_eq!(seq.queue_len(), 0);
        assert_eq!(seq.current(), Some(AnimationKind::Produce));
    }

    #[test]
    fn busy_actor_defers_even_an_empty_queue() {
        let mut seq = Sequencer::default();
        assert_eq!(seq.handle(AnimationRequest::produce(), false), Dispatch::Queued);
        assert_eq!(seq.dispatch(false), None);
        assert_eq!(seq.dispatch(true), Some(AnimationKind::Produce));
    }

    #[test]
    fn queue_preserves_submission_order() {
        let mut seq = Sequencer::default();
        seq.handle(AnimationRequest::feed(), false);
        seq.handle(AnimationRequest::sick(), true);
        seq.handle(AnimationRequest::produce(), true);
        let order: Vec<_> = std::iter::from_fn(|| seq.dequeue_head())
            .map(|r| r.kind())
            .collect();
        assert_eq!(
            order,
            vec![AnimationKind::Feed, AnimationKind::Sick, AnimationKind::Produce]
        );
    }

    #[test]
    fn feeding_walks_to_item_and_fades_it() {
        let mut seq = Sequencer::default();
        let mut p = pet();
        let item = Vec2::new(60.0, 434.0);
        seq.handle(AnimationRequest::feed(), true);

        seq.advance(20, &mut p, Some(item));
        assert_eq!(p.face, Face::Hugging);
        seq.advance(1480, &mut p, Some(item));
        assert!((p.pos.x - 60.0).abs() < 1e-3);

        let cues = run_out(&mut seq, &mut p, Some(item));
        assert_eq!(
            cues,
            vec![
                Cue::ItemFade(0.7),
                Cue::ItemFade(0.4),
                Cue::ItemFade(0.2),
                Cue::FeedingDone
            ]
        );
        assert_eq!(p.pos, Vec2::new(60.0, 414.0));
        assert_eq!(p.face, Face::Savoring);
    }

    #[test]
    fn feeding_walk_stops_at_the_field_edge() {
        let mut seq = Sequencer::default();
        let mut p = pet();
        let item = Vec2::new(2.0, 434.0);
        seq.handle(AnimationRequest::feed(), true);

        let mut min_x = p.pos.x;
        for _ in 0..200 {
            seq.advance(20, &mut p, Some(item));
            min_x = min_x.min(p.pos.x);
        }
        assert!(!seq.is_playing());
        assert!(min_x >= PET_SIZE / 2.0 - 1e-3, "x = {min_x}");
        assert_eq!(p.pos.x, PET_SIZE / 2.0);
    }

    #[test]
    fn production_wiggles_in_place_then_rises() {
        let mut seq = Sequencer::default();
        let mut p = pet();
        let start = p.pos;
        seq.handle(AnimationRequest::produce(), true);

        seq.advance(50, &mut p, None);
        assert_eq!(p.face, Face::Straining);
        assert!(p.pos.x > start.x);

        let cues = run_out(&mut seq, &mut p, None);
        assert_eq!(cues, vec![Cue::WasteDropped, Cue::RestoreFace]);
        assert!((p.pos.x - start.x).abs() < 1e-3);
        assert!((p.pos.y - (start.y - 30.0)).abs() < 1e-3);
    }

    #[test]
    fn sickness_runs_through_its_faces() {
        let mut seq = Sequencer::default();
        let mut p = pet();
        seq.handle(AnimationRequest::sick(), true);
        seq.advance(10, &mut p, None);
        assert_eq!(p.face, Face::Nauseous);
        seq.advance(1000, &mut p, None);
        assert_eq!(p.face, Face::Vomiting);
        seq.advance(700, &mut p, None);
        assert_eq!(p.face, Face::Dejected);
        let cues = seq.advance(1000, &mut p, None);
        assert_eq!(cues, vec![Cue::RestoreFace]);
        assert!(!seq.is_playing());
    }

    #[test]
    fn halt_drops_everything() {
        let mut seq = Sequencer::default();
        seq.handle(AnimationRequest::produce(), true);
        seq.handle(AnimationRequest::sick(), true);
        assert_eq!(seq.halt(), 2);
        assert!(seq.is_idle());
        assert_eq!(seq.dispatch(true), None);
    }
}
