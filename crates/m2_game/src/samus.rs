//! The player character.
//!
//! Samus never moves on screen. Walking scrolls the tile map the opposite
//! way, and the animation timer flips through the walk frames.

use glam::IVec2;
use m2_core::animation::{FrameCycle, FrameTable, StateCatalog};
use m2_core::input::Key;

use crate::assets::FrameRef;
use crate::entity::{BoundsSpec, Entity, EntityId};
use crate::tile_map::TileMap;

pub const ENTITY_ID: EntityId = 0;
/// Logical pixels per tick, multiplied by the screen scale.
pub const SPEED: i32 = 2;
/// Start position in logical pixels.
pub const START: IVec2 = IVec2::new(75, 92);

// Screen pixels, authored against the 5x window.
const STAND_BOUNDS: BoundsSpec = BoundsSpec {
    size: IVec2::new(65, 180),
    offset: IVec2::new(25, 0),
};
const STAND_FRONT_IMAGE_OFFSET: IVec2 = IVec2::new(0, -10);
const WALK_RIGHT_IMAGE_OFFSET: IVec2 = IVec2::new(-27, 0);

const WALK_FRAMES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamusState {
    StandFront,
    StandLeft,
    StandRight,
    StandPointUpLeft,
    StandPointUpRight,
    WalkLeft,
    WalkRight,
    WalkLeftShoot,
    WalkRightShoot,
    CrouchLeft,
    CrouchRight,
    JumpShootLeft,
    JumpShootRight,
    JumpShootUpLeft,
    JumpShootUpRight,
    JumpShootDownLeft,
    JumpShootDownRight,
    JumpFlipLeft,
    JumpFlipRight,
}

impl SamusState {
    pub fn label(self) -> &'static str {
        match self {
            SamusState::StandFront => "stand front",
            SamusState::StandLeft => "stand left",
            SamusState::StandRight => "stand right",
            SamusState::StandPointUpLeft => "stand point up left",
            SamusState::StandPointUpRight => "stand point up right",
            SamusState::WalkLeft => "walk left",
            SamusState::WalkRight => "walk right",
            SamusState::WalkLeftShoot => "walk left shoot",
            SamusState::WalkRightShoot => "walk right shoot",
            SamusState::CrouchLeft => "crouch left",
            SamusState::CrouchRight => "crouch right",
            SamusState::JumpShootLeft => "jump shoot left",
            SamusState::JumpShootRight => "jump shoot right",
            SamusState::JumpShootUpLeft => "jump shoot up left",
            SamusState::JumpShootUpRight => "jump shoot up right",
            SamusState::JumpShootDownLeft => "jump shoot down left",
            SamusState::JumpShootDownRight => "jump shoot down right",
            SamusState::JumpFlipLeft => "jump flip left",
            SamusState::JumpFlipRight => "jump flip right",
        }
    }
}

impl StateCatalog for SamusState {
    const ALL: &'static [Self] = &[
        SamusState::StandFront,
        SamusState::StandLeft,
        SamusState::StandRight,
        SamusState::StandPointUpLeft,
        SamusState::StandPointUpRight,
        SamusState::WalkLeft,
        SamusState::WalkRight,
        SamusState::WalkLeftShoot,
        SamusState::WalkRightShoot,
        SamusState::CrouchLeft,
        SamusState::CrouchRight,
        SamusState::JumpShootLeft,
        SamusState::JumpShootRight,
        SamusState::JumpShootUpLeft,
        SamusState::JumpShootUpRight,
        SamusState::JumpShootDownLeft,
        SamusState::JumpShootDownRight,
        SamusState::JumpFlipLeft,
        SamusState::JumpFlipRight,
    ];

    fn ordinal(self) -> usize {
        self as usize
    }

    fn frame_paths(self) -> &'static [&'static str] {
        match self {
            SamusState::StandFront => &["assets/textures/samus_stand.png"],
            SamusState::StandLeft => &["assets/textures/samus_stand_left.png"],
            SamusState::StandRight => &["assets/textures/samus_stand_right.png"],
            SamusState::WalkLeft => &[
                "assets/textures/samus_walk_left_1.png",
                "assets/textures/samus_walk_left_2.png",
                "assets/textures/samus_walk_left_3.png",
            ],
            SamusState::WalkRight => &[
                "assets/textures/samus_walk_right_1.png",
                "assets/textures/samus_walk_right_2.png",
                "assets/textures/samus_walk_right_3.png",
            ],
            _ => &[""],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Samus {
    entity: Entity,
    state: SamusState,
    cycle: FrameCycle,
    scaled_speed: i32,
}

impl Samus {
    /// `start` is in logical pixels; `scale` is the window scale factor.
    pub fn new(start: IVec2, scale: i32, speed: i32, frames: FrameTable<FrameRef>) -> Self {
        let entity = Entity::new(ENTITY_ID, start * scale, STAND_BOUNDS, frames);
        let mut samus = Self {
            entity,
            state: SamusState::StandFront,
            cycle: FrameCycle::new(WALK_FRAMES),
            scaled_speed: speed * scale,
        };
        // Show the standing frame before the first timer tick.
        samus.on_animation_tick();
        samus
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn state(&self) -> SamusState {
        self.state
    }

    /// Walk frame shown on the next animation tick.
    pub fn animation_frame(&self) -> usize {
        self.cycle.current()
    }

    /// Only arrow keys matter. When both arrows are involved the most
    /// recent event decides state and velocity.
    pub fn handle_key(&mut self, key: Key, pressed: bool) {
        match (key, pressed) {
            (Key::Left, true) => {
                self.state = SamusState::WalkLeft;
                self.entity.velocity.x = -self.scaled_speed;
            }
            (Key::Right, true) => {
                self.state = SamusState::WalkRight;
                self.entity.velocity.x = self.scaled_speed;
            }
            (Key::Left, false) => {
                self.cycle.reset();
                self.state = SamusState::StandLeft;
                self.entity.velocity.x = 0;
            }
            (Key::Right, false) => {
                self.cycle.reset();
                self.state = SamusState::StandRight;
                self.entity.velocity.x = 0;
            }
            _ => {}
        }
    }

    pub fn on_animation_tick(&mut self) {
        let ordinal = self.state.ordinal();
        match self.state {
            SamusState::StandFront => {
                self.entity.image_offset = STAND_FRONT_IMAGE_OFFSET;
                self.entity.set_static_frame(ordinal);
            }
            SamusState::StandLeft | SamusState::StandRight => {
                self.entity.image_offset = IVec2::ZERO;
                self.entity.set_static_frame(ordinal);
            }
            SamusState::WalkLeft | SamusState::WalkRight => {
                self.entity.image_offset = if self.state == SamusState::WalkRight {
                    WALK_RIGHT_IMAGE_OFFSET
                } else {
                    IVec2::ZERO
                };
                self.entity.set_frame(ordinal, self.cycle.current());
                self.cycle.advance();
            }
            _ => {}
        }
    }

    /// Scroll the map against the player's velocity.
    pub fn apply_movement(&self, tile_map: &mut TileMap) {
        let velocity = self.entity.velocity;
        tile_map.scroll_by(IVec2::new(-velocity.x, velocity.y));
    }
}
