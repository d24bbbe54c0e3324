//! Debug overlay rendered via egui on top of the game scene.
//!
//! Integration pattern: egui requires a three-phase render split because
//! `egui_wgpu::Renderer::render()` needs a `RenderPass<'static>`, while
//! `begin_render_pass` borrows the encoder. The phases are:
//!
//!   1. `prepare()` -- run egui UI logic, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references
//!
//! Two windows live here. The stats window is toggled by F3. The error window
//! appears whenever an error is queued, regardless of F3, and stays up until
//! the user presses OK; the simulation waits on that acknowledgement.

use std::collections::VecDeque;

use m2_core::time::FrameStats;
use winit::window::Window;

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub sim_ticks: u64,
    pub player_state: String,
    pub animation_frame: usize,
    pub scroll_offset: (i32, i32),
    pub player_velocity: (i32, i32),
    /// Frame lookups that hit an empty cell since startup
    pub missing_frames: u64,
    pub tile_count: usize,
    pub draw_calls: u32,
    pub show_bounds: bool,
}

#[derive(Debug, Clone, Default)]
pub struct OverlayActions {
    /// User acknowledged the front error in the queue
    pub error_acknowledged: bool,
    /// User toggled the bounds overlay checkbox
    pub toggle_bounds: bool,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
    pending_errors: VecDeque<String>,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
            pending_errors: VecDeque::new(),
        }
    }

    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    /// Queue an error for the user. Errors are shown one at a time.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.pending_errors.push_back(message.into());
    }

    pub fn has_pending_error(&self) -> bool {
        !self.pending_errors.is_empty()
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        frame_stats: &FrameStats,
        stats: Option<OverlayStats>,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let current_error = self.pending_errors.front().cloned();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            if let Some(message) = &current_error {
                egui::Window::new("Error")
                    .collapsible(false)
                    .resizable(false)
                    .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                    .show(ctx, |ui| {
                        ui.label(message.as_str());
                        if ui.button("OK").clicked() {
                            actions.error_acknowledged = true;
                        }
                    });
            }

            if self.visible {
                egui::Window::new("Debug")
                    .default_pos([10.0, 10.0])
                    .show(ctx, |ui| {
                        ui.label(format!("FPS: {:.1}", frame_stats.smoothed_fps));
                        ui.label(format!(
                            "Frame time: {:.2} ms",
                            frame_stats.smoothed_frame_time_ms
                        ));
                        ui.label(format!("Frames drawn: {}", frame_stats.frame_count));
                        if let Some(ref stats) = stats {
                            ui.label(format!("Sim ticks: {}", stats.sim_ticks));
                            ui.separator();
                            ui.label(format!("State: {}", stats.player_state));
                            ui.label(format!("Animation frame: {}", stats.animation_frame));
                            ui.label(format!(
                                "Velocity: ({}, {})",
                                stats.player_velocity.0, stats.player_velocity.1
                            ));
                            ui.label(format!(
                                "Scroll offset: ({}, {})",
                                stats.scroll_offset.0, stats.scroll_offset.1
                            ));
                            ui.label(format!("Missing frames: {}", stats.missing_frames));
                            ui.separator();
                            ui.label(format!("Tiles: {}", stats.tile_count));
                            ui.label(format!("Draw calls: {}", stats.draw_calls));
                            let mut show_bounds = stats.show_bounds;
                            if ui.checkbox(&mut show_bounds, "Show bounds (F4)").changed() {
                                actions.toggle_bounds = true;
                            }
                        }
                    });
            }
        });

        if actions.error_acknowledged {
            self.pending_errors.pop_front();
        }

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}
