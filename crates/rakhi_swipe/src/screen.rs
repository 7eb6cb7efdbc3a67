use core::f32::consts::TAU;

use bevy::prelude::*;
use card_helpers::screens::{despawn_screen, spawn_centered_text};

use crate::sequencer::{CardState, Sequencer};

/// Where the rakhi floats while waiting for the swipe.
const RAKHI_HOME: Vec2 = Vec2::new(0.0, 140.0);
/// Where the open hand waits near the bottom of the card.
const HAND_POSITION: Vec2 = Vec2::new(0.0, -200.0);

const DEEP_RED: Color = Color::srgb(0.72, 0.11, 0.11);
const GOLD: Color = Color::srgb(1.0, 0.84, 0.0);
const TEAL: Color = Color::srgb(0.31, 0.8, 0.77);
const CREAM: Color = Color::srgb(1.0, 0.97, 0.86);
const SKIN: Color = Color::srgb(0.87, 0.67, 0.48);

#[derive(Component)]
struct GeneratePrompt;

/// Everything visible during `Generated` and `Swiping`.
#[derive(Component)]
struct RakhiScreen;

/// The decorative item itself; its transform follows the gesture.
#[derive(Component)]
struct Rakhi;

#[derive(Component)]
struct SwipeInstruction;

#[derive(Component)]
struct RevealedScreen;

#[derive(Component)]
struct CompletedScreen;

pub struct ScreenPlugin;

impl Plugin for ScreenPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            OnEnter(CardState::Initial),
            (
                spawn_generate_prompt,
                despawn_screen::<RakhiScreen>,
                despawn_screen::<SwipeInstruction>,
                despawn_screen::<RevealedScreen>,
                despawn_screen::<CompletedScreen>,
            ),
        )
        .add_systems(OnExit(CardState::Initial), despawn_screen::<GeneratePrompt>)
        .add_systems(OnEnter(CardState::Generated), spawn_rakhi_screen)
        .add_systems(
            Update,
            follow_swipe.run_if(in_state(CardState::Generated)),
        )
        .add_systems(
            OnEnter(CardState::Swiping),
            despawn_screen::<SwipeInstruction>,
        )
        .add_systems(Update, travel_to_hand.run_if(in_state(CardState::Swiping)))
        .add_systems(OnExit(CardState::Swiping), despawn_screen::<RakhiScreen>)
        .add_systems(OnEnter(CardState::Revealed), spawn_revealed_screen)
        .add_systems(OnExit(CardState::Revealed), despawn_screen::<RevealedScreen>)
        .add_systems(OnEnter(CardState::Completed), spawn_completed_screen)
        .add_systems(
            OnExit(CardState::Completed),
            despawn_screen::<CompletedScreen>,
        );
    }
}

fn spawn_generate_prompt(mut commands: Commands) {
    spawn_centered_text(
        &mut commands,
        GeneratePrompt,
        "Happy Raksha Bandhan",
        34.0,
        180.0,
    );
    spawn_centered_text(
        &mut commands,
        GeneratePrompt,
        "Tap to weave a rakhi",
        22.0,
        -40.0,
    );
}

fn spawn_rakhi_screen(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    commands
        .spawn((
            RakhiScreen,
            Rakhi,
            Transform::from_xyz(RAKHI_HOME.x, RAKHI_HOME.y, 1.0),
            Visibility::default(),
        ))
        .with_children(|parent| {
            rakhi_discs(parent, &mut meshes, &mut materials);
        });

    spawn_centered_text(
        &mut commands,
        SwipeInstruction,
        "Swipe down to tie it",
        22.0,
        -40.0,
    );

    spawn_hand(&mut commands, &mut meshes, &mut materials, RakhiScreen);
}

/// Concentric discs with a ring of petals, in lieu of sprite assets.
fn rakhi_discs(
    parent: &mut ChildBuilder,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
) {
    let discs = [
        (60.0, DEEP_RED),
        (45.0, GOLD),
        (25.0, TEAL),
        (10.0, CREAM),
    ];
    for (index, (radius, color)) in discs.into_iter().enumerate() {
        parent.spawn((
            Mesh2d(meshes.add(Circle::new(radius))),
            MeshMaterial2d(materials.add(ColorMaterial::from(color))),
            Transform::from_xyz(0.0, 0.0, 0.1 + index as f32 * 0.1),
        ));
    }
    for petal in 0..8 {
        let angle = petal as f32 / 8.0 * TAU;
        let position = Vec2::from_angle(angle) * 62.0;
        parent.spawn((
            Mesh2d(meshes.add(Circle::new(7.0))),
            MeshMaterial2d(materials.add(ColorMaterial::from(GOLD))),
            Transform::from_xyz(position.x, position.y, 0.05),
        ));
    }
}

fn spawn_hand<T: Component>(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<ColorMaterial>,
    marker: T,
) {
    commands
        .spawn((
            marker,
            Transform::from_xyz(HAND_POSITION.x, HAND_POSITION.y, 0.5),
            Visibility::default(),
        ))
        .with_children(|parent| {
            // palm
            parent.spawn((
                Mesh2d(meshes.add(Ellipse::new(48.0, 58.0))),
                MeshMaterial2d(materials.add(ColorMaterial::from(SKIN))),
                Transform::default(),
            ));
            // fingertips across the top
            for finger in 0..4 {
                let x = (finger as f32).mul_add(26.0, -39.0);
                parent.spawn((
                    Mesh2d(meshes.add(Circle::new(11.0))),
                    MeshMaterial2d(materials.add(ColorMaterial::from(SKIN))),
                    Transform::from_xyz(x, 62.0, 0.1),
                ));
            }
        });
}

/// Partial-swipe feedback: the rakhi slides down with the finger and
/// shrinks toward the hand, snapping back through the model's reversion
/// ease when the swipe falls short.
fn follow_swipe(sequencer: Res<Sequencer>, mut rakhi: Query<&mut Transform, With<Rakhi>>) {
    let Ok(mut transform) = rakhi.get_single_mut() else {
        return;
    };
    transform.translation.x = RAKHI_HOME.x;
    transform.translation.y = RAKHI_HOME.y - sequencer.swipe_offset();
    transform.scale = Vec3::splat(0.2f32.mul_add(-sequencer.swipe_progress(), 1.0));
}

/// Carries the rakhi to the hand over the 2s travel window.
fn travel_to_hand(sequencer: Res<Sequencer>, mut rakhi: Query<&mut Transform, With<Rakhi>>) {
    let Ok(mut transform) = rakhi.get_single_mut() else {
        return;
    };
    let progress = smoothstep(sequencer.pending_progress().unwrap_or(1.0));
    let position = RAKHI_HOME.lerp(HAND_POSITION, progress);
    transform.translation.x = position.x;
    transform.translation.y = position.y;
    transform.scale = Vec3::splat(0.3f32.mul_add(-progress, 0.8));
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * 2.0f32.mul_add(-t, 3.0)
}

fn spawn_revealed_screen(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    spawn_hand(&mut commands, &mut meshes, &mut materials, RevealedScreen);

    // The rakhi resting on the palm.
    commands
        .spawn((
            RevealedScreen,
            Transform::from_xyz(HAND_POSITION.x, HAND_POSITION.y + 10.0, 1.0)
                .with_scale(Vec3::splat(0.5)),
            Visibility::default(),
        ))
        .with_children(|parent| {
            rakhi_discs(parent, &mut meshes, &mut materials);
        });

    spawn_centered_text(&mut commands, RevealedScreen, "The rakhi is tied!", 28.0, 180.0);
}

fn spawn_completed_screen(mut commands: Commands) {
    spawn_centered_text(
        &mut commands,
        CompletedScreen,
        "Happy Raksha Bandhan!",
        32.0,
        120.0,
    );
    spawn_centered_text(
        &mut commands,
        CompletedScreen,
        "May the bond only grow stronger",
        20.0,
        40.0,
    );
    spawn_centered_text(
        &mut commands,
        CompletedScreen,
        "Tap or press R to play again",
        18.0,
        -160.0,
    );
}
