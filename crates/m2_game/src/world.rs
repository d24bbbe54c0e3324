//! Everything the simulation thread owns, and the read-only copy it hands
//! to the renderer each frame.

use std::time::Duration;

use glam::IVec2;
use m2_core::animation::AnimationTimer;
use m2_core::input::Key;

use crate::assets::FrameRef;
use crate::geometry::Rect;
use crate::samus::{Samus, SamusState};
use crate::tile_map::{TileDraw, TileMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub state: SamusState,
    pub animation_frame: usize,
    pub image: Option<FrameRef>,
    pub draw_position: IVec2,
    pub bounds: Rect,
    pub velocity: IVec2,
    pub missing_frames: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub scroll_offset: IVec2,
    pub tiles: Vec<TileDraw>,
    pub player: PlayerSnapshot,
}

pub struct World {
    tile_map: TileMap,
    player: Samus,
    animation_timer: AnimationTimer,
    ticks: u64,
}

impl World {
    pub fn new(tile_map: TileMap, player: Samus, animation_period_ms: u64) -> Self {
        Self {
            tile_map,
            player,
            animation_timer: AnimationTimer::from_millis(animation_period_ms),
            ticks: 0,
        }
    }

    pub fn tile_map(&self) -> &TileMap {
        &self.tile_map
    }

    pub fn player(&self) -> &Samus {
        &self.player
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn handle_key(&mut self, key: Key, pressed: bool) {
        self.player.handle_key(key, pressed);
    }

    /// One simulation tick covering `dt` of wall time. Timer periods that
    /// piled up during a long gap are coalesced into a single animation step.
    pub fn step(&mut self, dt: Duration) {
        self.player.apply_movement(&mut self.tile_map);
        let dt_us = u64::try_from(dt.as_micros()).unwrap_or(u64::MAX);
        if self.animation_timer.tick(dt_us) > 0 {
            self.player.on_animation_tick();
        }
        self.ticks += 1;
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let entity = self.player.entity();
        WorldSnapshot {
            tick: self.ticks,
            scroll_offset: self.tile_map.offset(),
            tiles: self.tile_map.visible_tiles().collect(),
            player: PlayerSnapshot {
                state: self.player.state(),
                animation_frame: self.player.animation_frame(),
                image: entity.sprite.image(),
                draw_position: entity.draw_position(),
                bounds: entity.bounds(),
                velocity: entity.velocity,
                missing_frames: entity.missing_frames(),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::assets::ImageId;
    use crate::samus::{SPEED, START};
    use crate::tile_map::TileBindings;
    use m2_core::animation::FrameTable;

    pub(crate) fn test_world() -> World {
        let map = TileMap::parse("....\n0000", 80, &TileBindings::default()).expect("valid map");
        let mut next = 0;
        let frames = FrameTable::from_catalog::<SamusState, _>(|_| {
            next += 1;
            Some(FrameRef {
                id: ImageId(next),
                width: 80,
                height: 160,
            })
        });
        World::new(map, Samus::new(START, 5, SPEED, frames), 75)
    }

    #[test]
    fn step_scrolls_every_tick() {
        let mut world = test_world();
        world.handle_key(Key::Right, true);
        for _ in 0..5 {
            world.step(Duration::from_millis(16));
        }
        assert_eq!(world.tile_map().offset(), IVec2::new(-50, 0));
        assert_eq!(world.ticks(), 5);
    }

    #[test]
    fn animation_advances_once_per_period() {
        let mut world = test_world();
        world.handle_key(Key::Left, true);
        // 4 x 16 ms = 64 ms, under one 75 ms period.
        for _ in 0..4 {
            world.step(Duration::from_millis(16));
        }
        assert_eq!(world.player().animation_frame(), 0);
        world.step(Duration::from_millis(16));
        assert_eq!(world.player().animation_frame(), 1);
    }

    #[test]
    fn long_gap_coalesces_into_one_animation_step() {
        let mut world = test_world();
        world.handle_key(Key::Left, true);
        world.step(Duration::from_millis(400));
        assert_eq!(world.player().animation_frame(), 1);
    }

    #[test]
    fn snapshot_reflects_scroll_and_player() {
        let mut world = test_world();
        world.handle_key(Key::Left, true);
        world.step(Duration::from_millis(16));
        let snap = world.snapshot();
        assert_eq!(snap.tick, 1);
        assert_eq!(snap.scroll_offset, IVec2::new(10, 0));
        assert_eq!(snap.tiles.len(), 4);
        assert_eq!(snap.tiles[0].position, IVec2::new(10, 80));
        assert_eq!(snap.player.state, SamusState::WalkLeft);
        assert_eq!(snap.player.velocity, IVec2::new(-10, 0));
        assert_eq!(snap.player.draw_position, IVec2::new(375, 450));
    }
}
