//! Metroid 2 -- application entry point.
//!
//! Two threads. The simulation thread (see `game_loop`) owns the world and
//! paces itself at the configured frame rate. The winit thread owns the
//! window, GPU and overlay:
//!
//!   1. key events are filtered for OS repeat and forwarded as `SimCommand`s
//!   2. each `SimEvent::Frame` replaces the latest snapshot and requests a redraw
//!   3. `RedrawRequested` rebuilds the sprite mesh from that snapshot, draws it,
//!      then composites the egui overlay on top
//!
//! A `SimEvent::Fault` opens the error window; pressing OK sends
//! `SimCommand::AcknowledgeFault` so the simulation resumes.

mod assets;
mod config;
mod entity;
mod game_loop;
mod geometry;
mod mesh;
mod samus;
mod tile_map;
mod world;

use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::{FrameRef, ImageStore};
use config::{load_config_or_default, GameConfig};
use game_loop::{spawn_simulation, EventSink, LoopConfig, SimCommand, SimEvent};
use m2_core::animation::{validate_catalog, FrameTable, StateCatalog};
use m2_core::input::{InputState, Key};
use m2_core::time::FrameStats;
use m2_devtools::{DebugOverlay, OverlayStats};
use m2_render::{Camera2D, GpuContext, SpritePipeline, SpriteVertex, Texture};
use mesh::{build_mesh, DrawCall, TextureKey};
use samus::{Samus, SamusState};
use tile_map::{load_tile_map_from_path, TileBindings, TileKind, TileMap, BLOCK_SIZE};
use world::{World, WorldSnapshot};

const CONFIG_PATH: &str = "assets/config/game.json";
const WHITE_PIXEL: [u8; 4] = [255, 255, 255, 255];

struct GpuSpriteTexture {
    _texture: Texture,
    bind_group: wgpu::BindGroup,
}

impl EventSink for EventLoopProxy<SimEvent> {
    fn publish(&self, event: SimEvent) -> bool {
        self.send_event(event).is_ok()
    }
}

/// Everything the winit thread owns. Built in `resumed` once a window exists.
///
///  - **Platform** (window, GPU, camera, overlay, input edges)
///  - **Link to the simulation** (command sender, thread handle, latest snapshot)
///  - **GPU mesh state**: rebuilt from the snapshot; buffers grow by powers
///    of two and never shrink
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    camera: Camera2D,
    sprite_pipeline: SpritePipeline,
    debug_overlay: DebugOverlay,
    input: InputState,
    frame_stats: FrameStats,
    last_redraw: Instant,

    textures: HashMap<TextureKey, GpuSpriteTexture>,
    tile_images: HashMap<TileKind, FrameRef>,
    tile_count: usize,

    commands: Sender<SimCommand>,
    simulation: Option<JoinHandle<World>>,
    latest: Option<Box<WorldSnapshot>>,
    show_bounds: bool,
    mesh_dirty: bool,

    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    draw_calls: Vec<DrawCall>,
}

impl EngineState {
    fn new(
        window: Arc<Window>,
        config: &GameConfig,
        proxy: EventLoopProxy<SimEvent>,
    ) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        // Content is decoded on this thread; the simulation only sees ids.
        let mut images = ImageStore::new(config.screen_scale);
        let tile_images: HashMap<TileKind, FrameRef> = TileKind::ALL
            .iter()
            .filter_map(|&kind| images.load(kind.image_path()).map(|frame| (kind, frame)))
            .collect();
        let world = build_world(config, &mut images);
        let tile_count = world.tile_map().tile_count();
        log::info!(
            "Images loaded: {} ({} failed)",
            images.len(),
            images.failed_count()
        );

        let textures = upload_textures(&gpu, &sprite_pipeline, &images);

        let camera = Camera2D::new(gpu.size.0, gpu.size.1);
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let loop_config = LoopConfig::new(
            config.frame_rate,
            Duration::from_millis(config.stall_threshold_ms),
        );
        let (commands, simulation) = spawn_simulation(world, loop_config, proxy)?;

        Ok(Self {
            window,
            gpu,
            camera,
            sprite_pipeline,
            debug_overlay,
            input: InputState::new(),
            frame_stats: FrameStats::new(),
            last_redraw: Instant::now(),
            textures,
            tile_images,
            tile_count,
            commands,
            simulation: Some(simulation),
            latest: None,
            show_bounds: true,
            mesh_dirty: false,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            draw_calls: Vec::new(),
        })
    }

    fn send(&self, command: SimCommand) {
        if self.commands.send(command).is_err() {
            log::warn!("Simulation is not running; dropped {:?}", command);
        }
    }

    /// Forward genuine press/release edges of movement keys. Returns false
    /// for OS key repeat.
    fn forward_key(&mut self, key: Key, pressed: bool) -> bool {
        let changed = if pressed {
            self.input.key_down(key)
        } else {
            self.input.key_up(key)
        };
        if changed && key.is_movement() {
            self.send(SimCommand::Key { key, pressed });
        }
        changed
    }

    fn release_all_keys(&mut self) {
        for command in release_movement_keys(&mut self.input) {
            self.send(command);
        }
    }

    fn toggle_bounds(&mut self) {
        self.show_bounds = !self.show_bounds;
        self.mesh_dirty = true;
        log::info!(
            "Bounds overlay: {}",
            if self.show_bounds { "ON" } else { "OFF" }
        );
    }

    /// Stop the simulation thread and wait for it.
    fn shutdown(&mut self) {
        let Some(handle) = self.simulation.take() else {
            return;
        };
        let _ = self.commands.send(SimCommand::Shutdown);
        match handle.join() {
            Ok(world) => log::info!("Simulation joined after {} ticks", world.ticks()),
            Err(_) => log::error!("Simulation thread panicked"),
        }
    }

    fn rebuild_mesh(&mut self) {
        let Some(snapshot) = self.latest.as_deref() else {
            return;
        };
        let mesh = build_mesh(snapshot, &self.tile_images, self.show_bounds);
        self.ensure_mesh_capacity(mesh.vertices.len(), mesh.indices.len());
        if !mesh.vertices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&mesh.vertices));
        }
        if !mesh.indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&mesh.indices));
        }
        self.draw_calls = mesh.draw_calls;
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn overlay_stats(&self) -> Option<OverlayStats> {
        let snapshot = self.latest.as_deref()?;
        let player = &snapshot.player;
        Some(OverlayStats {
            sim_ticks: snapshot.tick,
            player_state: player.state.label().to_string(),
            animation_frame: player.animation_frame,
            scroll_offset: (snapshot.scroll_offset.x, snapshot.scroll_offset.y),
            player_velocity: (player.velocity.x, player.velocity.y),
            missing_frames: player.missing_frames,
            tile_count: self.tile_count,
            draw_calls: self.draw_calls.len() as u32,
            show_bounds: self.show_bounds,
        })
    }

    fn render(&mut self) {
        if self.gpu.size.0 == 0 || self.gpu.size.1 == 0 {
            return;
        }
        let now = Instant::now();
        self.frame_stats.record(now - self.last_redraw);
        self.last_redraw = now;

        if self.mesh_dirty {
            self.rebuild_mesh();
            self.mesh_dirty = false;
        }

        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let stats = self.overlay_stats();
        let (egui_primitives, egui_textures_delta, overlay_actions) =
            self.debug_overlay
                .prepare(&self.window, &self.frame_stats, stats);
        if overlay_actions.error_acknowledged {
            self.send(SimCommand::AcknowledgeFault);
        }
        if overlay_actions.toggle_bounds {
            self.toggle_bounds();
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut last_bound: Option<TextureKey> = None;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            for draw in &self.draw_calls {
                let Some(texture) = self.textures.get(&draw.texture) else {
                    continue;
                };
                if last_bound != Some(draw.texture) {
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    last_bound = Some(draw.texture);
                }
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }

        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();

            self.debug_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.debug_overlay.cleanup(&egui_textures_delta);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        self.input.end_frame();
    }
}

struct App {
    config: GameConfig,
    proxy: EventLoopProxy<SimEvent>,
    state: Option<EngineState>,
}

impl App {
    fn new(config: GameConfig, proxy: EventLoopProxy<SimEvent>) -> Self {
        Self {
            config,
            proxy,
            state: None,
        }
    }
}

impl ApplicationHandler<SimEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let built = m2_platform::window::create_window(event_loop, &self.config.platform())
            .and_then(|window| EngineState::new(window, &self.config, self.proxy.clone()));
        match built {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                log::error!("Startup failed: {err}");
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: SimEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        match event {
            SimEvent::Frame(snapshot) => {
                state.latest = Some(snapshot);
                state.mesh_dirty = true;
            }
            SimEvent::Fault(fault) => {
                state.debug_overlay.push_error(fault.to_string());
            }
        }
        state.window.request_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                state.shutdown();
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::Focused(false) => {
                state.release_all_keys();
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                let PhysicalKey::Code(key_code) = event.physical_key else {
                    return;
                };
                let Some(key) = map_key(key_code) else {
                    return;
                };
                let pressed = event.state == ElementState::Pressed;
                if state.forward_key(key, pressed) && pressed {
                    match key {
                        Key::Escape => {
                            log::info!("Escape pressed, exiting.");
                            state.shutdown();
                            event_loop.exit();
                            return;
                        }
                        Key::F3 => state.debug_overlay.toggle(),
                        Key::F4 => state.toggle_bounds(),
                        Key::Left | Key::Right => {}
                    }
                }
                state.window.request_redraw();
            }

            WindowEvent::RedrawRequested => state.render(),

            _ => {
                // Keep egui responsive while the simulation is blocked on a fault.
                if egui_consumed || state.debug_overlay.has_pending_error() {
                    state.window.request_redraw();
                }
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = self.state.as_mut() {
            state.shutdown();
        }
    }
}

/// Map, player and animation timer, with every image routed through `images`.
fn build_world(config: &GameConfig, images: &mut ImageStore) -> World {
    let scale = config.screen_scale.min(config::MAX_SCREEN_SCALE) as i32;
    let block_size = BLOCK_SIZE * scale;
    let map_path = Path::new(&config.map_path);
    let tile_map = load_tile_map_from_path(map_path, block_size, &TileBindings::default())
        .unwrap_or_else(|err| {
            log::error!("{err}. Starting with an empty map.");
            TileMap::empty(block_size)
        });

    if let Err(err) = validate_catalog::<SamusState>() {
        log::error!("{err}");
    }
    let frames = FrameTable::from_catalog::<SamusState, _>(|path| images.load(path));
    log::info!(
        "Samus frames: {} loaded across {} states",
        frames.loaded_count(),
        SamusState::ALL.len()
    );
    let player = Samus::new(samus::START, scale, config.player_speed, frames);
    let world = World::new(tile_map, player, config.animation_period_ms);
    log::info!(
        "Samus placed at {} facing {}",
        world.player().entity().sprite.position,
        world.player().state().label()
    );
    world
}

fn upload_textures(
    gpu: &GpuContext,
    pipeline: &SpritePipeline,
    images: &ImageStore,
) -> HashMap<TextureKey, GpuSpriteTexture> {
    let mut textures = HashMap::new();
    for (id, loaded) in images.iter() {
        let texture = Texture::from_image(&gpu.device, &gpu.queue, &loaded.image, &loaded.path);
        let bind_group = pipeline.create_texture_bind_group(&gpu.device, &texture);
        textures.insert(
            TextureKey::Image(id),
            GpuSpriteTexture {
                _texture: texture,
                bind_group,
            },
        );
    }
    let white = Texture::from_rgba8(&gpu.device, &gpu.queue, &WHITE_PIXEL, 1, 1, "white");
    let bind_group = pipeline.create_texture_bind_group(&gpu.device, &white);
    textures.insert(
        TextureKey::White,
        GpuSpriteTexture {
            _texture: white,
            bind_group,
        },
    );
    textures
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Release commands for every held movement key, `Left` before `Right`, so
/// the player always ends up in the same standing state after focus loss.
fn release_movement_keys(input: &mut InputState) -> Vec<SimCommand> {
    input
        .release_all()
        .into_iter()
        .filter(|key| key.is_movement())
        .map(|key| SimCommand::Key {
            key,
            pressed: false,
        })
        .collect()
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::F4 => Some(Key::F4),
        _ => None,
    }
}

fn run() -> Result<(), String> {
    let config = load_config_or_default(Path::new(CONFIG_PATH));
    let event_loop = EventLoop::<SimEvent>::with_user_event()
        .build()
        .map_err(|e| format!("Failed to create event loop: {e}"))?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config, event_loop.create_proxy());
    event_loop
        .run_app(&mut app)
        .map_err(|e| format!("Event loop error: {e}"))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Metroid 2 starting...");

    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}
