use bevy::prelude::*;

/// Despawns every entity carrying the marker component `T`.
///
/// Meant for `OnExit` hooks so each screen cleans up after itself.
pub fn despawn_screen<T: Component>(mut commands: Commands, query: Query<Entity, With<T>>) {
    for entity in &query {
        commands.entity(entity).despawn_recursive();
    }
}

/// Spawns a centered `Text2d` block at the given height, marked with `T`.
pub fn spawn_centered_text<T: Component>(
    commands: &mut Commands,
    marker: T,
    text: &str,
    font_size: f32,
    y: f32,
) {
    commands.spawn((
        marker,
        Text2d::new(text),
        TextFont {
            font_size,
            ..default()
        },
        TextColor(Color::WHITE),
        TextLayout::new_with_justify(JustifyText::Center),
        Transform::from_xyz(0.0, y, 5.0),
    ));
}
