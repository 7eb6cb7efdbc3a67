use core::time::Duration;

use bevy::audio::{Pitch, Volume};
use bevy::prelude::*;

use crate::sequencer::{Cue, CueRequest, ResetSignal, SequencerSet};

const CUE_VOLUME: f32 = 0.3;

/// One synthesized note: how long to wait, what to play, for how long.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub delay: f32,
    pub frequency: f32,
    pub duration: f32,
}

/// Expands a named cue into its fixed tone sequence.
pub fn cue_tones(cue: Cue) -> Vec<Tone> {
    match cue {
        // falling zip
        Cue::Generate => vec![
            Tone {
                delay: 0.0,
                frequency: 800.0,
                duration: 0.1,
            },
            Tone {
                delay: 0.1,
                frequency: 600.0,
                duration: 0.1,
            },
            Tone {
                delay: 0.2,
                frequency: 400.0,
                duration: 0.2,
            },
        ],
        // low swoosh
        Cue::Swipe => vec![Tone {
            delay: 0.0,
            frequency: 300.0,
            duration: 0.3,
        }],
        // C-E-G-C arpeggio
        Cue::Success => [523.0, 659.0, 784.0, 1047.0]
            .iter()
            .enumerate()
            .map(|(index, &frequency)| Tone {
                delay: index as f32 * 0.15,
                frequency,
                duration: 0.2,
            })
            .collect(),
    }
}

/// Tones waiting out their stagger delay.
#[derive(Resource, Default)]
struct ToneQueue(Vec<Tone>);

pub struct CueAudioPlugin;

impl Plugin for CueAudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ToneQueue>().add_systems(
            Update,
            (queue_cues, clear_tone_queue_on_reset, play_due_tones)
                .chain()
                .after(SequencerSet),
        );
    }
}

fn queue_cues(mut queue: ResMut<ToneQueue>, mut requests: EventReader<CueRequest>) {
    for request in requests.read() {
        queue.0.extend(cue_tones(request.0));
    }
}

/// Spawns a self-despawning pitch player for every tone whose delay has
/// run out.
fn play_due_tones(
    mut commands: Commands,
    time: Res<Time>,
    mut queue: ResMut<ToneQueue>,
    mut pitches: ResMut<Assets<Pitch>>,
) {
    if queue.0.is_empty() {
        return;
    }
    let delta = time.delta_secs();
    let mut waiting = Vec::with_capacity(queue.0.len());
    for mut tone in queue.0.drain(..) {
        tone.delay -= delta;
        if tone.delay > 0.0 {
            waiting.push(tone);
        } else {
            commands.spawn((
                AudioPlayer(pitches.add(Pitch::new(
                    tone.frequency,
                    Duration::from_secs_f32(tone.duration),
                ))),
                PlaybackSettings::DESPAWN.with_volume(Volume::new(CUE_VOLUME)),
            ));
        }
    }
    queue.0 = waiting;
}

/// A reset must silence tones still waiting out their stagger delay;
/// runs between queueing and playback so the flush and the reset land in
/// the same frame.
fn clear_tone_queue_on_reset(mut queue: ResMut<ToneQueue>, mut resets: EventReader<ResetSignal>) {
    if resets.read().next().is_some() {
        queue.0.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_cue_is_three_falling_tones() {
        let tones = cue_tones(Cue::Generate);
        assert_eq!(tones.len(), 3, "generate cue has three notes");
        for pair in tones.windows(2) {
            assert!(
                pair[1].frequency < pair[0].frequency,
                "notes fall in pitch"
            );
            assert!(pair[1].delay > pair[0].delay, "notes are staggered");
        }
    }

    #[test]
    fn swipe_cue_is_one_swoosh() {
        let tones = cue_tones(Cue::Swipe);
        assert_eq!(
            tones,
            vec![Tone {
                delay: 0.0,
                frequency: 300.0,
                duration: 0.3,
            }]
        );
    }

    #[test]
    fn success_cue_is_an_ascending_arpeggio() {
        let tones = cue_tones(Cue::Success);
        assert_eq!(tones.len(), 4, "success cue has four notes");
        for (index, pair) in tones.windows(2).enumerate() {
            assert!(pair[1].frequency > pair[0].frequency, "notes rise");
            assert!(
                (pair[1].delay - pair[0].delay - 0.15).abs() < 1e-6,
                "note {index} is 150ms after its predecessor"
            );
        }
    }
}
