use core::time::Duration;

use bevy::prelude::*;
use strum::{Display, EnumIter};
use thiserror::Error;

/// Minimum downward displacement (logical pixels) that commits a swipe.
pub const SWIPE_COMMIT_DISTANCE: f32 = 50.0;
/// Displacement at which partial-swipe feedback saturates.
pub const SWIPE_FULL_DISTANCE: f32 = 100.0;

const GENERATE_DELAY: Duration = Duration::from_millis(500);
const TRAVEL_DELAY: Duration = Duration::from_millis(2000);
const REVEAL_DELAY: Duration = Duration::from_millis(3000);
const REVERT_DURATION: Duration = Duration::from_millis(300);

/// The one interaction stage active at any time.
///
/// Transitions are one-directional except for `reset()`, which returns to
/// `Initial` from anywhere.
#[derive(States, EnumIter, Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardState {
    #[default]
    Initial,
    Generated,
    Swiping,
    Revealed,
    Completed,
}

/// Which physical pointer owns the active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Touch,
    Mouse,
}

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    Generate,
    GestureStart,
    GestureMove,
    GestureEnd,
    Confirm,
}

/// Named request for a short synthesized sound effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Generate,
    Swipe,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstKind {
    Celebration,
    Fireworks,
}

/// Side effect emitted by the sequencer, drained once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Cue(Cue),
    Burst(BurstKind),
}

/// None of these surface to the user; callers log them at debug level
/// and move on.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerError {
    #[error("{action} ignored in {state:?}")]
    InvalidTransition { state: CardState, action: Action },
    #[error("stale deferred transition to {target:?} discarded")]
    StaleCallback { target: CardState },
}

#[derive(Debug, Clone, Copy)]
struct GestureSample {
    source: PointerKind,
    start_y: f32,
    current_y: f32,
}

impl GestureSample {
    /// Downward displacement in screen coordinates (y grows downward).
    fn delta(&self) -> f32 {
        self.current_y - self.start_y
    }
}

/// A cancellable deferred transition. `reset()` drops these outright
/// instead of letting them fire into a stale state.
#[derive(Debug, Clone, Copy)]
struct PendingTransition {
    target: CardState,
    total: Duration,
    remaining: Duration,
}

impl PendingTransition {
    const fn new(target: CardState, delay: Duration) -> Self {
        Self {
            target,
            total: delay,
            remaining: delay,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Revert {
    from_offset: f32,
    elapsed: Duration,
}

/// The interaction sequencer: owns the state machine, the active gesture
/// sample and every pending timer. Presentation and input systems talk to
/// it; it never touches entities itself.
#[derive(Resource, Debug, Default)]
pub struct Sequencer {
    state: CardState,
    capture_enabled: bool,
    gesture: Option<GestureSample>,
    pending: Option<PendingTransition>,
    revert: Option<Revert>,
    effects: Vec<Effect>,
    reset_signaled: bool,
}

impl Sequencer {
    pub const fn state(&self) -> CardState {
        self.state
    }

    pub const fn capture_enabled(&self) -> bool {
        self.capture_enabled
    }

    /// Current downward visual offset of the rakhi in logical pixels.
    pub fn swipe_offset(&self) -> f32 {
        if let Some(gesture) = self.gesture {
            return gesture.delta().max(0.0) * 0.5;
        }
        if let Some(revert) = self.revert {
            let t = (revert.elapsed.as_secs_f32() / REVERT_DURATION.as_secs_f32()).min(1.0);
            return revert.from_offset * (1.0 - ease_out_cubic(t));
        }
        0.0
    }

    /// Partial-swipe progress in `0.0..=1.0`.
    pub fn swipe_progress(&self) -> f32 {
        self.gesture
            .map_or(0.0, |gesture| {
                gesture.delta().max(0.0) / SWIPE_FULL_DISTANCE
            })
            .min(1.0)
    }

    /// Fraction elapsed of the active deferred transition, if any.
    pub fn pending_progress(&self) -> Option<f32> {
        self.pending
            .map(|pending| 1.0 - pending.remaining.as_secs_f32() / pending.total.as_secs_f32())
    }

    /// Requests a rakhi. Valid only in `Initial` with no exit animation
    /// already underway; plays the generate cue right away and enters
    /// `Generated` once the 500ms exit animation finishes.
    pub fn generate(&mut self) -> Result<(), SequencerError> {
        if self.state != CardState::Initial || self.pending.is_some() {
            return Err(self.invalid(Action::Generate));
        }
        self.effects.push(Effect::Cue(Cue::Generate));
        self.pending = Some(PendingTransition::new(CardState::Generated, GENERATE_DELAY));
        Ok(())
    }

    /// Starts sampling a gesture. First active pointer wins; the other
    /// modality is locked out until this gesture ends.
    pub fn begin_gesture(&mut self, source: PointerKind, y: f32) -> Result<(), SequencerError> {
        if !self.capture_enabled || self.gesture.is_some() {
            return Err(self.invalid(Action::GestureStart));
        }
        self.revert = None;
        self.gesture = Some(GestureSample {
            source,
            start_y: y,
            current_y: y,
        });
        Ok(())
    }

    pub fn move_gesture(&mut self, source: PointerKind, y: f32) -> Result<(), SequencerError> {
        if !self.capture_enabled || self.gesture.map_or(true, |g| g.source != source) {
            return Err(self.invalid(Action::GestureMove));
        }
        if let Some(gesture) = &mut self.gesture {
            gesture.current_y = y;
        }
        Ok(())
    }

    pub fn end_gesture(&mut self, source: PointerKind) -> Result<(), SequencerError> {
        let Some(gesture) = self.gesture else {
            return Err(self.invalid(Action::GestureEnd));
        };
        if gesture.source != source {
            return Err(self.invalid(Action::GestureEnd));
        }
        self.gesture = None;
        self.report_gesture(gesture.delta())
    }

    /// Commits the swipe if the final downward displacement clears the
    /// threshold, otherwise starts the 300ms reversion ease and stays in
    /// `Generated`.
    pub fn report_gesture(&mut self, delta: f32) -> Result<(), SequencerError> {
        if self.state != CardState::Generated || !self.capture_enabled {
            return Err(self.invalid(Action::GestureEnd));
        }
        if delta >= SWIPE_COMMIT_DISTANCE {
            self.enter(CardState::Swiping);
        } else {
            let offset = delta.max(0.0) * 0.5;
            self.revert = (offset > 0.0).then_some(Revert {
                from_offset: offset,
                elapsed: Duration::ZERO,
            });
        }
        Ok(())
    }

    /// Keyboard fast-path: commits the swipe without displacement
    /// accumulation.
    pub fn confirm(&mut self) -> Result<(), SequencerError> {
        if self.state != CardState::Generated || !self.capture_enabled {
            return Err(self.invalid(Action::Confirm));
        }
        self.gesture = None;
        self.enter(CardState::Swiping);
        Ok(())
    }

    /// Returns to `Initial` from any state. Cancels every pending
    /// transition, drops the gesture sample and any queued effects, and
    /// raises the flush signal so effects already fanned out to the
    /// audio/particle queues get discarded too. Idempotent.
    pub fn reset(&mut self) {
        self.state = CardState::Initial;
        self.capture_enabled = false;
        self.gesture = None;
        self.pending = None;
        self.revert = None;
        self.effects.clear();
        self.reset_signaled = true;
    }

    /// True once per `reset()`; drained by the frame that broadcasts the
    /// flush to the downstream queues.
    fn take_reset_signal(&mut self) -> bool {
        core::mem::take(&mut self.reset_signaled)
    }

    /// Advances reversion easing and deferred transitions by `delta`.
    pub fn tick(&mut self, delta: Duration) -> Result<(), SequencerError> {
        if let Some(revert) = &mut self.revert {
            revert.elapsed += delta;
            if revert.elapsed >= REVERT_DURATION {
                self.revert = None;
            }
        }

        let Some(pending) = &mut self.pending else {
            return Ok(());
        };
        if pending.remaining > delta {
            pending.remaining -= delta;
            return Ok(());
        }
        let target = pending.target;
        self.pending = None;
        // Pending handles are cancelled on reset, so a mismatched source
        // state here means a handle outlived the state that scheduled it.
        if self.state != expected_source(target) {
            return Err(SequencerError::StaleCallback { target });
        }
        self.enter(target);
        Ok(())
    }

    /// Hands queued side effects to the frame that will perform them.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        core::mem::take(&mut self.effects)
    }

    fn enter(&mut self, target: CardState) {
        self.state = target;
        match target {
            CardState::Initial => {}
            CardState::Generated => {
                self.capture_enabled = true;
                self.effects.push(Effect::Burst(BurstKind::Celebration));
            }
            CardState::Swiping => {
                self.capture_enabled = false;
                self.revert = None;
                self.effects.push(Effect::Cue(Cue::Swipe));
                self.pending = Some(PendingTransition::new(CardState::Revealed, TRAVEL_DELAY));
            }
            CardState::Revealed => {
                self.effects.push(Effect::Cue(Cue::Success));
                self.effects.push(Effect::Burst(BurstKind::Fireworks));
                self.pending = Some(PendingTransition::new(CardState::Completed, REVEAL_DELAY));
            }
            CardState::Completed => {
                self.effects.push(Effect::Burst(BurstKind::Fireworks));
            }
        }
    }

    const fn invalid(&self, action: Action) -> SequencerError {
        SequencerError::InvalidTransition {
            state: self.state,
            action,
        }
    }
}

const fn expected_source(target: CardState) -> CardState {
    match target {
        CardState::Initial | CardState::Generated => CardState::Initial,
        CardState::Swiping => CardState::Generated,
        CardState::Revealed => CardState::Swiping,
        CardState::Completed => CardState::Revealed,
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t;
    inv.mul_add(-inv * inv, 1.0)
}

#[derive(Event, Debug, Clone, Copy)]
pub struct CueRequest(pub Cue);

#[derive(Event, Debug, Clone, Copy)]
pub struct BurstRequest(pub BurstKind);

/// Broadcast on every `reset()`, whether or not the mirrored Bevy state
/// changes; downstream queues flush their not-yet-performed effects.
#[derive(Event, Debug, Clone, Copy)]
pub struct ResetSignal;

/// Input systems run before this set, effect consumers after it, so a
/// reset and its flush land in the same frame.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SequencerSet;

pub struct SequencerPlugin;

impl Plugin for SequencerPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<CardState>()
            .init_resource::<Sequencer>()
            .add_event::<CueRequest>()
            .add_event::<BurstRequest>()
            .add_event::<ResetSignal>()
            .add_systems(
                Update,
                (advance_sequencer, publish_state)
                    .chain()
                    .in_set(SequencerSet),
            );
    }
}

/// Drives the sequencer from wall-clock time and fans its queued effects
/// out to the audio and particle systems.
fn advance_sequencer(
    time: Res<Time>,
    mut sequencer: ResMut<Sequencer>,
    mut cues: EventWriter<CueRequest>,
    mut bursts: EventWriter<BurstRequest>,
    mut resets: EventWriter<ResetSignal>,
) {
    if sequencer.take_reset_signal() {
        resets.send(ResetSignal);
    }
    if let Err(error) = sequencer.tick(time.delta()) {
        debug!("{error}");
    }
    for effect in sequencer.drain_effects() {
        match effect {
            Effect::Cue(cue) => {
                cues.send(CueRequest(cue));
            }
            Effect::Burst(kind) => {
                bursts.send(BurstRequest(kind));
            }
        }
    }
}

/// Mirrors the model's state into Bevy `States` so screens can schedule
/// off `OnEnter`/`OnExit`.
fn publish_state(
    sequencer: Res<Sequencer>,
    current: Res<State<CardState>>,
    mut next: ResMut<NextState<CardState>>,
) {
    if *current.get() != sequencer.state() {
        next.set(sequencer.state());
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    /// Drives a fresh sequencer into `state` along the happy path, then
    /// drains effects so each test observes only its own.
    fn sequencer_in(state: CardState) -> Sequencer {
        let mut sequencer = Sequencer::default();
        'drive: {
            if state == CardState::Initial {
                break 'drive;
            }
            sequencer.generate().expect("generate from Initial");
            sequencer.tick(ms(500)).expect("enter Generated");
            if state == CardState::Generated {
                break 'drive;
            }
            sequencer.report_gesture(60.0).expect("commit swipe");
            if state == CardState::Swiping {
                break 'drive;
            }
            sequencer.tick(ms(2000)).expect("enter Revealed");
            if state == CardState::Revealed {
                break 'drive;
            }
            sequencer.tick(ms(3000)).expect("enter Completed");
        }
        assert_eq!(sequencer.state(), state, "setup should land in {state:?}");
        sequencer.drain_effects();
        sequencer
    }

    fn swipe_cues(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|effect| **effect == Effect::Cue(Cue::Swipe))
            .count()
    }

    #[test]
    fn generate_is_noop_outside_initial() {
        for state in CardState::iter().filter(|state| *state != CardState::Initial) {
            let mut sequencer = sequencer_in(state);
            let result = sequencer.generate();
            assert!(
                matches!(
                    result,
                    Err(SequencerError::InvalidTransition {
                        action: Action::Generate,
                        ..
                    })
                ),
                "generate in {state:?} should be rejected"
            );
            assert_eq!(sequencer.state(), state, "state must not change");
            assert!(
                sequencer.drain_effects().is_empty(),
                "rejected generate must not queue effects"
            );
        }
    }

    #[test]
    fn generate_enters_generated_after_exit_animation() {
        let mut sequencer = Sequencer::default();
        sequencer.generate().expect("generate from Initial");
        assert_eq!(
            sequencer.drain_effects(),
            vec![Effect::Cue(Cue::Generate)],
            "generate cue plays immediately"
        );
        assert_eq!(sequencer.state(), CardState::Initial);

        sequencer.tick(ms(499)).expect("tick");
        assert_eq!(sequencer.state(), CardState::Initial, "still animating out");

        sequencer.tick(ms(1)).expect("tick");
        assert_eq!(sequencer.state(), CardState::Generated);
        assert!(sequencer.capture_enabled());
        assert_eq!(
            sequencer.drain_effects(),
            vec![Effect::Burst(BurstKind::Celebration)]
        );
    }

    #[test]
    fn generate_while_exit_animation_runs_is_rejected() {
        let mut sequencer = Sequencer::default();
        sequencer.generate().expect("first generate");
        assert!(sequencer.generate().is_err(), "second generate must no-op");
    }

    #[test]
    fn short_swipe_reverts_offset_to_zero() {
        let mut sequencer = sequencer_in(CardState::Generated);
        sequencer
            .begin_gesture(PointerKind::Touch, 100.0)
            .expect("begin");
        sequencer
            .move_gesture(PointerKind::Touch, 140.0)
            .expect("move");
        assert!((sequencer.swipe_offset() - 20.0).abs() < f32::EPSILON);
        assert!((sequencer.swipe_progress() - 0.4).abs() < 1e-6);

        sequencer.end_gesture(PointerKind::Touch).expect("end");
        assert_eq!(sequencer.state(), CardState::Generated);
        assert!(sequencer.capture_enabled());
        assert!(sequencer.swipe_offset() > 0.0, "reversion starts from 20px");

        sequencer.tick(ms(300)).expect("tick");
        assert!(
            sequencer.swipe_offset().abs() < f32::EPSILON,
            "offset is back to zero after the reversion ease"
        );
    }

    #[test]
    fn qualifying_swipe_commits_exactly_once() {
        let mut sequencer = sequencer_in(CardState::Generated);
        sequencer
            .begin_gesture(PointerKind::Mouse, 200.0)
            .expect("begin");
        sequencer
            .move_gesture(PointerKind::Mouse, 260.0)
            .expect("move");
        sequencer.end_gesture(PointerKind::Mouse).expect("end");

        assert_eq!(sequencer.state(), CardState::Swiping);
        assert!(!sequencer.capture_enabled());
        let effects = sequencer.drain_effects();
        assert_eq!(swipe_cues(&effects), 1, "exactly one swipe cue");

        // Gesture input after commit is ignored.
        assert!(sequencer.begin_gesture(PointerKind::Mouse, 0.0).is_err());
    }

    #[test]
    fn upward_displacement_never_commits() {
        let mut sequencer = sequencer_in(CardState::Generated);
        sequencer.report_gesture(-80.0).expect("report");
        assert_eq!(sequencer.state(), CardState::Generated);
        assert!(
            sequencer.swipe_offset().abs() < f32::EPSILON,
            "upward drags produce no offset and no reversion"
        );
    }

    #[test]
    fn keyboard_confirm_skips_displacement() {
        let mut sequencer = sequencer_in(CardState::Generated);
        sequencer.confirm().expect("confirm");
        assert_eq!(sequencer.state(), CardState::Swiping);
        assert_eq!(swipe_cues(&sequencer.drain_effects()), 1);

        let mut idle = Sequencer::default();
        assert!(idle.confirm().is_err(), "confirm outside Generated no-ops");
    }

    #[test]
    fn full_scenario_reaches_completed() {
        let mut sequencer = sequencer_in(CardState::Generated);
        sequencer.report_gesture(60.0).expect("commit");
        assert_eq!(sequencer.state(), CardState::Swiping);
        assert_eq!(sequencer.drain_effects(), vec![Effect::Cue(Cue::Swipe)]);

        sequencer.tick(ms(2000)).expect("travel to hand");
        assert_eq!(sequencer.state(), CardState::Revealed);
        assert_eq!(
            sequencer.drain_effects(),
            vec![
                Effect::Cue(Cue::Success),
                Effect::Burst(BurstKind::Fireworks)
            ]
        );

        sequencer.tick(ms(3000)).expect("linger on hand");
        assert_eq!(sequencer.state(), CardState::Completed);
        assert_eq!(
            sequencer.drain_effects(),
            vec![Effect::Burst(BurstKind::Fireworks)]
        );
    }

    #[test]
    fn reset_returns_to_initial_from_every_state() {
        for state in CardState::iter() {
            let mut sequencer = sequencer_in(state);
            sequencer.reset();
            assert_eq!(sequencer.state(), CardState::Initial);
            assert!(!sequencer.capture_enabled());
            assert!(sequencer.swipe_offset().abs() < f32::EPSILON);
            assert!(sequencer.drain_effects().is_empty());

            // Cancelled handles must not fire later.
            sequencer.tick(ms(10_000)).expect("tick after reset");
            assert_eq!(sequencer.state(), CardState::Initial);
        }
    }

    #[test]
    fn reset_is_idempotent() {
        let mut once = sequencer_in(CardState::Revealed);
        once.reset();
        let mut twice = sequencer_in(CardState::Revealed);
        twice.reset();
        twice.reset();

        assert_eq!(once.state(), twice.state());
        assert_eq!(once.capture_enabled(), twice.capture_enabled());
        assert_eq!(once.pending_progress(), twice.pending_progress());
    }

    #[test]
    fn first_active_pointer_locks_out_the_other() {
        let mut sequencer = sequencer_in(CardState::Generated);
        sequencer
            .begin_gesture(PointerKind::Touch, 50.0)
            .expect("touch begins");

        assert!(
            sequencer.begin_gesture(PointerKind::Mouse, 50.0).is_err(),
            "mouse cannot steal an active touch gesture"
        );
        assert!(sequencer.move_gesture(PointerKind::Mouse, 300.0).is_err());
        assert!(sequencer.end_gesture(PointerKind::Mouse).is_err());
        assert_eq!(sequencer.state(), CardState::Generated);

        sequencer
            .move_gesture(PointerKind::Touch, 110.0)
            .expect("owning touch still moves");
        sequencer.end_gesture(PointerKind::Touch).expect("touch ends");
        assert_eq!(sequencer.state(), CardState::Swiping);
    }

    #[test]
    fn reset_during_exit_animation_raises_the_flush_signal() {
        let mut sequencer = Sequencer::default();
        sequencer.generate().expect("generate");
        // The cue has already been fanned out to the tone queue.
        sequencer.drain_effects();

        // Reset lands while the 500ms exit animation still runs, so the
        // mirrored Bevy state never left Initial; the flush signal is the
        // only way downstream queues learn about the reset.
        sequencer.reset();
        assert!(sequencer.take_reset_signal(), "reset raises the signal");
        assert!(
            !sequencer.take_reset_signal(),
            "the signal is drained exactly once"
        );

        sequencer.tick(ms(500)).expect("tick past the old deadline");
        assert_eq!(sequencer.state(), CardState::Initial);
    }

    #[test]
    fn stale_handle_is_discarded_not_applied() {
        let mut sequencer = Sequencer::default();
        // Forge a handle that outlived its scheduling state.
        sequencer.pending = Some(PendingTransition::new(CardState::Completed, ms(1)));

        let result = sequencer.tick(ms(1));
        assert_eq!(
            result,
            Err(SequencerError::StaleCallback {
                target: CardState::Completed
            })
        );
        assert_eq!(sequencer.state(), CardState::Initial, "state untouched");
        assert!(sequencer.drain_effects().is_empty());
    }
}
