use bevy::prelude::*;
use card_helpers::input::just_pressed_screen_position;

use crate::sequencer::{CardState, PointerKind, Sequencer, SequencerError, SequencerSet};

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                handle_generate_input.run_if(in_state(CardState::Initial)),
                handle_swipe_gesture.run_if(in_state(CardState::Generated)),
                handle_keyboard_confirm.run_if(in_state(CardState::Generated)),
                handle_completed_tap.run_if(in_state(CardState::Completed)),
                handle_reset_key,
            )
                .before(SequencerSet),
        );
    }
}

/// Rejected operations are part of normal input flow; surface them only
/// to the debug log.
fn log_ignored(result: Result<(), SequencerError>) {
    if let Err(error) = result {
        debug!("{error}");
    }
}

fn handle_generate_input(
    mut sequencer: ResMut<Sequencer>,
    buttons: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    keys: Res<ButtonInput<KeyCode>>,
    windows: Query<&Window>,
) {
    let tapped = just_pressed_screen_position(&buttons, &touch_input, &windows).is_some();
    let keyed = keys.just_pressed(KeyCode::Space) || keys.just_pressed(KeyCode::Enter);
    if tapped || keyed {
        log_ignored(sequencer.generate());
    }
}

/// Feeds both pointer modalities into the sequencer. Arbitration lives in
/// the model: the first active pointer owns the gesture and input from
/// the other modality bounces off until it ends.
fn handle_swipe_gesture(
    mut sequencer: ResMut<Sequencer>,
    buttons: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    windows: Query<&Window>,
) {
    if !sequencer.capture_enabled() {
        return;
    }

    if let Some(touch) = touch_input.iter_just_pressed().next() {
        log_ignored(sequencer.begin_gesture(PointerKind::Touch, touch.position().y));
    }
    for touch in touch_input.iter() {
        // Moves from a non-owning pointer bounce off every frame; not
        // worth logging.
        sequencer
            .move_gesture(PointerKind::Touch, touch.position().y)
            .ok();
    }
    if touch_input.any_just_released() || touch_input.any_just_canceled() {
        log_ignored(sequencer.end_gesture(PointerKind::Touch));
    }

    if buttons.just_pressed(MouseButton::Left) {
        if let Some(position) = windows.single().cursor_position() {
            log_ignored(sequencer.begin_gesture(PointerKind::Mouse, position.y));
        }
    }
    if buttons.pressed(MouseButton::Left) {
        if let Some(position) = windows.single().cursor_position() {
            sequencer.move_gesture(PointerKind::Mouse, position.y).ok();
        }
    }
    if buttons.just_released(MouseButton::Left) {
        log_ignored(sequencer.end_gesture(PointerKind::Mouse));
    }
}

/// ArrowDown or Space commits the swipe without any displacement.
fn handle_keyboard_confirm(mut sequencer: ResMut<Sequencer>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::ArrowDown) || keys.just_pressed(KeyCode::Space) {
        log_ignored(sequencer.confirm());
    }
}

/// On the completion screen any tap plays again.
fn handle_completed_tap(
    mut sequencer: ResMut<Sequencer>,
    buttons: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    windows: Query<&Window>,
) {
    if just_pressed_screen_position(&buttons, &touch_input, &windows).is_some() {
        sequencer.reset();
    }
}

/// `R` resets from anywhere.
fn handle_reset_key(mut sequencer: ResMut<Sequencer>, keys: Res<ButtonInput<KeyCode>>) {
    if keys.just_pressed(KeyCode::KeyR) {
        sequencer.reset();
    }
}
