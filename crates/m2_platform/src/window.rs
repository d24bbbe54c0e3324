use std::sync::Arc;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

/// Fixed-size window: a logical resolution blown up by an integer scale.
pub struct PlatformConfig {
    pub title: String,
    pub logical_width: u32,
    pub logical_height: u32,
    pub scale: u32,
}

impl PlatformConfig {
    pub fn width(&self) -> u32 {
        self.logical_width.saturating_mul(self.scale)
    }

    pub fn height(&self) -> u32 {
        self.logical_height.saturating_mul(self.scale)
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Metroid 2: Return of Samus".to_string(),
            logical_width: 160,
            logical_height: 144,
            scale: 5,
        }
    }
}

pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, String> {
    // Physical size: the game lays out in window pixels, independent of DPI.
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::PhysicalSize::new(
            config.width(),
            config.height(),
        ))
        .with_resizable(false);

    let window = event_loop
        .create_window(attrs)
        .map_err(|e| format!("Failed to create window: {e}"))?;
    log::info!(
        "Window created: {}x{} ({}x{} at {}x)",
        config.width(),
        config.height(),
        config.logical_width,
        config.logical_height,
        config.scale
    );
    Ok(Arc::new(window))
}
