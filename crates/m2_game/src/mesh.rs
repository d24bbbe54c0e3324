//! CPU-side sprite mesh built from a world snapshot.
//!
//! Quads are emitted back to front: tiles, then the player, then the bounds
//! overlay. Consecutive quads sharing a texture collapse into one draw call.

use std::collections::HashMap;

use m2_render::vertex::QUAD_INDICES;
use m2_render::SpriteVertex;

use crate::assets::{FrameRef, ImageId};
use crate::geometry::Rect;
use crate::tile_map::TileKind;
use crate::world::WorldSnapshot;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
/// Tiles whose art failed to load.
const MISSING_TILE_COLOR: [f32; 4] = [0.45, 0.45, 0.5, 1.0];
const PLAYER_BOUNDS_COLOR: [f32; 4] = [0.1, 0.2, 1.0, 1.0];
const SOLID_TILE_BOUNDS_COLOR: [f32; 4] = [0.15, 0.9, 0.15, 0.6];
const OUTLINE_THICKNESS: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKey {
    Image(ImageId),
    /// 1x1 white texture, tinted by vertex color
    White,
}

/// A contiguous run of indices that share the same texture binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub texture: TextureKey,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Default)]
pub struct SceneMesh {
    pub vertices: Vec<SpriteVertex>,
    pub indices: Vec<u32>,
    pub draw_calls: Vec<DrawCall>,
}

struct QuadSpec {
    texture: TextureKey,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    color: [f32; 4],
}

impl SceneMesh {
    fn add_quad(&mut self, spec: QuadSpec) {
        let base_index = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&SpriteVertex::quad(
            spec.x,
            spec.y,
            spec.width,
            spec.height,
            spec.color,
        ));
        let draw_start = self.indices.len() as u32;
        self.indices
            .extend(QUAD_INDICES.iter().map(|i| base_index + i));
        push_draw_call(&mut self.draw_calls, spec.texture, draw_start, 6);
    }

    fn add_outline(&mut self, rect: Rect, color: [f32; 4]) {
        let x = rect.x as f32;
        let y = rect.y as f32;
        let w = rect.width as f32;
        let h = rect.height as f32;
        let t = OUTLINE_THICKNESS;
        for (qx, qy, qw, qh) in [
            (x, y, w, t),
            (x, y + h - t, w, t),
            (x, y, t, h),
            (x + w - t, y, t, h),
        ] {
            self.add_quad(QuadSpec {
                texture: TextureKey::White,
                x: qx,
                y: qy,
                width: qw,
                height: qh,
                color,
            });
        }
    }
}

pub fn build_mesh(
    snapshot: &WorldSnapshot,
    tile_images: &HashMap<TileKind, FrameRef>,
    show_bounds: bool,
) -> SceneMesh {
    let quad_estimate = snapshot.tiles.len() * if show_bounds { 5 } else { 1 } + 8;
    let mut mesh = SceneMesh {
        vertices: Vec::with_capacity(quad_estimate * 4),
        indices: Vec::with_capacity(quad_estimate * 6),
        draw_calls: Vec::with_capacity(8),
    };

    for tile in &snapshot.tiles {
        let (texture, color) = match tile_images.get(&tile.kind) {
            Some(frame) => (TextureKey::Image(frame.id), WHITE),
            None => (TextureKey::White, MISSING_TILE_COLOR),
        };
        mesh.add_quad(QuadSpec {
            texture,
            x: tile.position.x as f32,
            y: tile.position.y as f32,
            width: tile.size as f32,
            height: tile.size as f32,
            color,
        });
    }

    let player = &snapshot.player;
    if let Some(frame) = player.image {
        mesh.add_quad(QuadSpec {
            texture: TextureKey::Image(frame.id),
            x: player.draw_position.x as f32,
            y: player.draw_position.y as f32,
            width: frame.width as f32,
            height: frame.height as f32,
            color: WHITE,
        });
    }

    if show_bounds {
        for tile in snapshot.tiles.iter().filter(|t| t.solid) {
            let rect = Rect::new(tile.position.x, tile.position.y, tile.size, tile.size);
            mesh.add_outline(rect, SOLID_TILE_BOUNDS_COLOR);
        }
        mesh.add_outline(player.bounds, PLAYER_BOUNDS_COLOR);
    }

    mesh
}

/// Append a draw call, merging with the previous one when the texture
/// matches and the indices are contiguous.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    texture: TextureKey,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if last.texture == texture && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture,
        index_start,
        index_count,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samus::SamusState;
    use crate::tile_map::TileDraw;
    use crate::world::PlayerSnapshot;
    use glam::IVec2;

    fn tile(x: i32, y: i32) -> TileDraw {
        TileDraw {
            kind: TileKind::Rocks,
            solid: true,
            position: IVec2::new(x, y),
            size: 80,
        }
    }

    fn quad_count(mesh: &SceneMesh) -> usize {
        mesh.vertices.len() / 4
    }

    fn snapshot(image: Option<FrameRef>) -> WorldSnapshot {
        WorldSnapshot {
            tick: 3,
            scroll_offset: IVec2::ZERO,
            tiles: vec![tile(0, 640), tile(80, 640), tile(160, 640)],
            player: PlayerSnapshot {
                state: SamusState::StandFront,
                animation_frame: 0,
                image,
                draw_position: IVec2::new(375, 450),
                bounds: Rect::new(400, 460, 65, 180),
                velocity: IVec2::ZERO,
                missing_frames: 0,
            },
        }
    }

    fn rocks() -> HashMap<TileKind, FrameRef> {
        HashMap::from([(
            TileKind::Rocks,
            FrameRef {
                id: ImageId(0),
                width: 80,
                height: 80,
            },
        )])
    }

    fn player_frame() -> FrameRef {
        FrameRef {
            id: ImageId(1),
            width: 60,
            height: 160,
        }
    }

    #[test]
    fn tiles_sharing_art_batch_into_one_draw() {
        let mesh = build_mesh(&snapshot(Some(player_frame())), &rocks(), false);
        assert_eq!(quad_count(&mesh), 4);
        assert_eq!(
            mesh.draw_calls,
            vec![
                DrawCall {
                    texture: TextureKey::Image(ImageId(0)),
                    index_start: 0,
                    index_count: 18,
                },
                DrawCall {
                    texture: TextureKey::Image(ImageId(1)),
                    index_start: 18,
                    index_count: 6,
                },
            ]
        );
        assert_eq!(mesh.indices[18..24], [12, 13, 14, 12, 14, 15]);
    }

    #[test]
    fn player_quad_uses_draw_position_and_frame_size() {
        let mesh = build_mesh(&snapshot(Some(player_frame())), &rocks(), false);
        let player = &mesh.vertices[12..16];
        assert_eq!(player[0].position, [375.0, 450.0]);
        assert_eq!(player[2].position, [435.0, 610.0]);
    }

    #[test]
    fn player_without_image_is_skipped() {
        let mesh = build_mesh(&snapshot(None), &rocks(), false);
        assert_eq!(quad_count(&mesh), 3);
    }

    #[test]
    fn tiles_without_art_fall_back_to_tinted_white() {
        let mesh = build_mesh(&snapshot(None), &HashMap::new(), false);
        assert_eq!(mesh.draw_calls.len(), 1);
        assert_eq!(mesh.draw_calls[0].texture, TextureKey::White);
        assert_eq!(mesh.vertices[0].color, MISSING_TILE_COLOR);
    }

    #[test]
    fn bounds_overlay_outlines_solids_and_player() {
        let without = build_mesh(&snapshot(Some(player_frame())), &rocks(), false);
        let with = build_mesh(&snapshot(Some(player_frame())), &rocks(), true);
        // Four edges per outline: three tiles plus the player.
        assert_eq!(quad_count(&with), quad_count(&without) + 16);
        let last = with.draw_calls.last().expect("overlay draw");
        assert_eq!(last.texture, TextureKey::White);
        assert_eq!(last.index_count, 16 * 6);
        let top_edge = &with.vertices[with.vertices.len() - 16..][..4];
        assert_eq!(top_edge[0].position, [400.0, 460.0]);
        assert_eq!(top_edge[0].color, PLAYER_BOUNDS_COLOR);
    }

    #[test]
    fn bounds_overlay_skips_tiles_flagged_non_solid() {
        let mut snap = snapshot(Some(player_frame()));
        snap.tiles[1].solid = false;
        let without = build_mesh(&snap, &rocks(), false);
        let with = build_mesh(&snap, &rocks(), true);
        assert_eq!(quad_count(&with), quad_count(&without) + 12);
    }
}
