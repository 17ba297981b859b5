use gpui::*;

const APP_ID: &str = "filterx";
const WINDOW_TITLE: &str = "FilterX";

/// Default chat window size, centered on the primary display
const DEFAULT_SIZE: Size<Pixels> = size(px(900.0), px(720.0));
/// Below this the input row and attachment chip start to overlap
const MIN_SIZE: Size<Pixels> = size(px(480.0), px(420.0));

/// Options for the single chat window.
///
/// - macOS: transparent titlebar over native decorations
/// - Windows: transparent titlebar, client-side decorations
/// - Linux: opaque titlebar, client-side decorations, `app_id` set for the compositor
pub fn main_window_options(cx: &App) -> WindowOptions {
    WindowOptions {
        titlebar: Some(TitlebarOptions {
            title: Some(WINDOW_TITLE.into()),
            appears_transparent: transparent_titlebar(),
            traffic_light_position: None,
        }),
        window_decorations: window_decorations(),
        window_bounds: Some(WindowBounds::Windowed(Bounds::centered(
            None,
            DEFAULT_SIZE,
            cx,
        ))),
        window_min_size: Some(MIN_SIZE),
        app_id: Some(APP_ID.to_string()),
        ..Default::default()
    }
}

fn transparent_titlebar() -> bool {
    cfg!(any(target_os = "windows", target_os = "macos"))
}

fn window_decorations() -> Option<WindowDecorations> {
    if cfg!(any(target_os = "linux", target_os = "windows")) {
        Some(WindowDecorations::Client)
    } else {
        None
    }
}
