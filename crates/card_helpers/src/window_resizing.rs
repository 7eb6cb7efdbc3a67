#[cfg(target_arch = "wasm32")]
pub fn handle_browser_resize(
    mut primary_query: bevy::ecs::system::Query<
        &mut bevy::window::Window,
        bevy::ecs::query::With<bevy::window::PrimaryWindow>,
    >,
) {
    let Some(wasm_window) = web_sys::window() else {
        return;
    };
    let Some(target_width) = wasm_window.inner_width().ok().and_then(|w| w.as_f64()) else {
        return;
    };
    let Some(target_height) = wasm_window.inner_height().ok().and_then(|h| h.as_f64()) else {
        return;
    };

    // wgpu rejects surfaces above the maximum texture extent on some
    // mobile browsers, so clamp to a safe size.
    const MAX_EXTENT: f32 = 2048.0;
    let width = (target_width as f32).min(MAX_EXTENT);
    let height = (target_height as f32).min(MAX_EXTENT);

    for mut window in &mut primary_query {
        if (window.resolution.width() - width).abs() > f32::EPSILON
            || (window.resolution.height() - height).abs() > f32::EPSILON
        {
            window.resolution.set(width, height);
        }
    }
}
