use bevy::prelude::*;

mod audio;
mod effects;
mod input;
mod screen;
pub mod sequencer;

pub fn run() {
    card_helpers::get_default_app(env!("CARGO_PKG_NAME"))
        .add_plugins(sequencer::SequencerPlugin)
        .add_plugins(input::InputPlugin)
        .add_plugins(effects::EffectsPlugin)
        .add_plugins(audio::CueAudioPlugin)
        .add_plugins(screen::ScreenPlugin)
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn(Camera2d);
}
