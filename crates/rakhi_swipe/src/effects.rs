use core::f32::consts::TAU;

use bevy::prelude::*;
use card_helpers::{WINDOW_HEIGHT, WINDOW_WIDTH};

use crate::sequencer::{BurstKind, BurstRequest, ResetSignal, SequencerSet};

const CELEBRATION_COUNT: usize = 20;
const CELEBRATION_STAGGER: f32 = 0.1;
const CELEBRATION_LIFETIME: f32 = 3.0;

const FIREWORK_BURSTS: usize = 5;
const FIREWORK_PARTICLES: usize = 12;
const FIREWORK_STAGGER: f32 = 0.2;

const SPARKLE_CHANCE: f32 = 0.02;
const SPARKLE_LIFETIME: f32 = 0.8;

/// Hard cap on live particles; spawn requests beyond it are dropped.
const MAX_LIVE_PARTICLES: usize = 256;

// Gold, coral, teal, sky.
const PALETTE: [Color; 4] = [
    Color::srgb(1.0, 0.84, 0.0),
    Color::srgb(1.0, 0.42, 0.42),
    Color::srgb(0.31, 0.8, 0.77),
    Color::srgb(0.27, 0.72, 0.82),
];

const FIREWORK_PALETTE: [Color; 5] = [
    Color::srgb(1.0, 0.84, 0.0),
    Color::srgb(1.0, 0.42, 0.42),
    Color::srgb(0.31, 0.8, 0.77),
    Color::srgb(0.27, 0.72, 0.82),
    Color::srgb(0.98, 0.79, 0.14),
];

const GOLD: Color = Color::srgb(1.0, 0.84, 0.0);

/// Everything needed to spawn one ephemeral particle, including how long
/// to hold it back so bursts can stagger their members.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSpec {
    pub delay: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    pub color: Color,
    pub size: f32,
    pub lifetime: f32,
    pub spin: f32,
    pub end_scale: f32,
}

/// Expands a burst request into its batch of particle descriptors.
pub fn burst_specs(kind: BurstKind) -> Vec<ParticleSpec> {
    match kind {
        BurstKind::Celebration => celebration_specs(),
        BurstKind::Fireworks => firework_specs(),
    }
}

/// Confetti rising from the bottom edge, one piece every 100ms.
fn celebration_specs() -> Vec<ParticleSpec> {
    (0..CELEBRATION_COUNT)
        .map(|index| ParticleSpec {
            delay: index as f32 * CELEBRATION_STAGGER,
            position: Vec2::new(
                fastrand::f32().mul_add(WINDOW_WIDTH, -WINDOW_WIDTH / 2.0),
                -WINDOW_HEIGHT / 2.0,
            ),
            velocity: Vec2::new(0.0, WINDOW_HEIGHT / CELEBRATION_LIFETIME),
            color: fastrand::choice(PALETTE).unwrap_or(GOLD),
            size: 6.0,
            lifetime: CELEBRATION_LIFETIME,
            // one full turn over a particle's life
            spin: TAU / CELEBRATION_LIFETIME,
            end_scale: 1.0,
        })
        .collect()
}

/// Five radial bursts in the upper half of the screen, 200ms apart.
fn firework_specs() -> Vec<ParticleSpec> {
    let mut specs = Vec::with_capacity(FIREWORK_BURSTS * FIREWORK_PARTICLES);
    for burst in 0..FIREWORK_BURSTS {
        let center = Vec2::new(
            fastrand::f32().mul_add(WINDOW_WIDTH, -WINDOW_WIDTH / 2.0),
            fastrand::f32() * WINDOW_HEIGHT * 0.5,
        );
        for index in 0..FIREWORK_PARTICLES {
            let angle = (index as f32 / FIREWORK_PARTICLES as f32) * TAU;
            let distance = fastrand::f32().mul_add(50.0, 100.0);
            let lifetime = fastrand::f32().mul_add(0.5, 1.0);
            specs.push(ParticleSpec {
                delay: burst as f32 * FIREWORK_STAGGER,
                position: center,
                velocity: Vec2::from_angle(angle) * (distance / lifetime),
                color: fastrand::choice(FIREWORK_PALETTE).unwrap_or(GOLD),
                size: 4.0,
                lifetime,
                spin: 0.0,
                end_scale: 0.0,
            });
        }
    }
    specs
}

fn sparkle_spec(position: Vec2) -> ParticleSpec {
    ParticleSpec {
        delay: 0.0,
        position,
        velocity: Vec2::ZERO,
        color: GOLD,
        size: 3.0,
        lifetime: SPARKLE_LIFETIME,
        spin: 0.0,
        end_scale: 2.0,
    }
}

/// Cursor coordinates (origin top-left, y down) to world coordinates.
fn screen_to_world(position: Vec2) -> Vec2 {
    Vec2::new(
        position.x - WINDOW_WIDTH / 2.0,
        WINDOW_HEIGHT / 2.0 - position.y,
    )
}

const fn spawn_budget(live: usize) -> usize {
    MAX_LIVE_PARTICLES.saturating_sub(live)
}

#[derive(Component)]
struct Particle {
    lifetime: Timer,
    velocity: Vec2,
    spin: f32,
    end_scale: f32,
}

/// Descriptors waiting out their stagger delay before becoming entities.
#[derive(Resource, Default)]
struct BurstQueue(Vec<ParticleSpec>);

pub struct EffectsPlugin;

impl Plugin for EffectsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<BurstQueue>().add_systems(
            Update,
            (
                queue_bursts,
                clear_burst_queue_on_reset,
                spawn_due_particles,
                sparkle_trail,
                update_particles,
            )
                .chain()
                .after(SequencerSet),
        );
    }
}

fn queue_bursts(mut queue: ResMut<BurstQueue>, mut requests: EventReader<BurstRequest>) {
    for request in requests.read() {
        queue.0.extend(burst_specs(request.0));
    }
}

/// Counts down stagger delays and turns due descriptors into sprite
/// entities, dropping whatever the pool has no room for.
fn spawn_due_particles(
    mut commands: Commands,
    time: Res<Time>,
    mut queue: ResMut<BurstQueue>,
    live: Query<(), With<Particle>>,
) {
    if queue.0.is_empty() {
        return;
    }
    let delta = time.delta_secs();
    let mut budget = spawn_budget(live.iter().count());
    let mut waiting = Vec::with_capacity(queue.0.len());
    for mut spec in queue.0.drain(..) {
        spec.delay -= delta;
        if spec.delay > 0.0 {
            waiting.push(spec);
        } else if budget > 0 {
            budget -= 1;
            spawn_particle(&mut commands, &spec);
        }
    }
    queue.0 = waiting;
}

/// Low-probability golden sparkles trailing idle pointer movement.
fn sparkle_trail(
    mut commands: Commands,
    mut moves: EventReader<CursorMoved>,
    live: Query<(), With<Particle>>,
) {
    let mut budget = spawn_budget(live.iter().count());
    for event in moves.read() {
        if fastrand::f32() >= SPARKLE_CHANCE || budget == 0 {
            continue;
        }
        budget -= 1;
        spawn_particle(&mut commands, &sparkle_spec(screen_to_world(event.position)));
    }
}

fn spawn_particle(commands: &mut Commands, spec: &ParticleSpec) {
    commands.spawn((
        Particle {
            lifetime: Timer::from_seconds(spec.lifetime, TimerMode::Once),
            velocity: spec.velocity,
            spin: spec.spin,
            end_scale: spec.end_scale,
        },
        Sprite {
            color: spec.color,
            custom_size: Some(Vec2::splat(spec.size)),
            ..default()
        },
        Transform::from_xyz(spec.position.x, spec.position.y, 10.0),
    ));
}

/// Integrates velocity and spin, fades alpha and scale by remaining
/// lifetime, despawns expired particles.
fn update_particles(
    mut commands: Commands,
    time: Res<Time>,
    mut particles: Query<(Entity, &mut Transform, &mut Sprite, &mut Particle)>,
) {
    for (entity, mut transform, mut sprite, mut particle) in &mut particles {
        particle.lifetime.tick(time.delta());

        let step = particle.velocity * time.delta_secs();
        transform.translation += Vec3::new(step.x, step.y, 0.0);
        transform.rotate_z(particle.spin * time.delta_secs());

        let fraction = particle.lifetime.fraction();
        sprite.color = sprite.color.with_alpha(1.0 - fraction);
        transform.scale = Vec3::splat((particle.end_scale - 1.0).mul_add(fraction, 1.0));

        if particle.lifetime.finished() {
            commands.entity(entity).despawn();
        }
    }
}

/// Descriptors still waiting out their stagger delay are dropped on
/// reset; already-spawned particles finish their short lives.
fn clear_burst_queue_on_reset(mut queue: ResMut<BurstQueue>, mut resets: EventReader<ResetSignal>) {
    if resets.read().next().is_some() {
        queue.0.clear();
    }
}
