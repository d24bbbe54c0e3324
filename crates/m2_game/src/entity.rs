//! Drawable entities.
//!
//! A [`Sprite`] is a position plus the image currently shown. An [`Entity`]
//! wraps a sprite with an id, a velocity, a collision box and the frame table
//! it animates from. Behaviour (input, animation state) lives in the owner,
//! see `samus.rs`.

use glam::IVec2;
use m2_core::animation::FrameTable;

use crate::assets::FrameRef;
use crate::geometry::Rect;

pub type EntityId = u32;

#[derive(Debug, Clone, Default)]
pub struct Sprite {
    pub position: IVec2,
    image: Option<FrameRef>,
}

impl Sprite {
    pub fn new(position: IVec2) -> Self {
        Self {
            position,
            image: None,
        }
    }

    pub fn image(&self) -> Option<FrameRef> {
        self.image
    }

    pub fn set_image(&mut self, image: FrameRef) {
        self.image = Some(image);
    }
}

/// Collision box relative to the sprite position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundsSpec {
    pub size: IVec2,
    pub offset: IVec2,
}

#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    pub sprite: Sprite,
    pub velocity: IVec2,
    /// Added to the sprite position when drawing the current frame
    pub image_offset: IVec2,
    bounds: BoundsSpec,
    frames: FrameTable<FrameRef>,
    missing_frames: u64,
}

impl Entity {
    pub fn new(
        id: EntityId,
        position: IVec2,
        bounds: BoundsSpec,
        frames: FrameTable<FrameRef>,
    ) -> Self {
        Self {
            id,
            sprite: Sprite::new(position),
            velocity: IVec2::ZERO,
            image_offset: IVec2::ZERO,
            bounds,
            frames,
            missing_frames: 0,
        }
    }

    /// Show frame `frame` of state row `state`. An empty or out-of-range cell
    /// keeps the current image and is counted. Returns whether the image changed.
    pub fn set_frame(&mut self, state: usize, frame: usize) -> bool {
        match self.frames.get(state, frame) {
            Some(image) => {
                self.sprite.set_image(*image);
                true
            }
            None => {
                self.missing_frames += 1;
                log::warn!(
                    "Entity {}: no image for state {} frame {}, keeping previous frame",
                    self.id,
                    state,
                    frame
                );
                false
            }
        }
    }

    /// Single-image states always show frame 0.
    pub fn set_static_frame(&mut self, state: usize) -> bool {
        self.set_frame(state, 0)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.sprite.position + self.bounds.offset, self.bounds.size)
    }

    pub fn draw_position(&self) -> IVec2 {
        self.sprite.position + self.image_offset
    }

    pub fn missing_frames(&self) -> u64 {
        self.missing_frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageId;

    fn frame(id: u32) -> FrameRef {
        FrameRef {
            id: ImageId(id),
            width: 8,
            height: 16,
        }
    }

    fn table() -> FrameTable<FrameRef> {
        let paths = vec![vec![Some("a0"), Some("a1")], vec![Some("b0"), None]];
        let mut next = 0;
        FrameTable::load(&paths, 2, |_| {
            next += 1;
            Some(frame(next))
        })
    }

    fn entity() -> Entity {
        Entity::new(
            7,
            IVec2::new(100, 50),
            BoundsSpec {
                size: IVec2::new(65, 180),
                offset: IVec2::new(25, 0),
            },
            table(),
        )
    }

    #[test]
    fn set_frame_swaps_image() {
        let mut e = entity();
        assert!(e.sprite.image().is_none());
        assert!(e.set_frame(0, 1));
        assert_eq!(e.sprite.image().map(|f| f.id), Some(ImageId(2)));
    }

    #[test]
    fn missing_cell_keeps_previous_image() {
        let mut e = entity();
        e.set_static_frame(1);
        let before = e.sprite.image();
        assert!(!e.set_frame(1, 1));
        assert!(!e.set_frame(9, 0));
        assert_eq!(e.sprite.image(), before);
        assert_eq!(e.missing_frames(), 2);
    }

    #[test]
    fn bounds_follow_position() {
        let mut e = entity();
        assert_eq!(e.bounds(), Rect::new(125, 50, 65, 180));
        e.sprite.position = IVec2::new(0, 0);
        assert_eq!(e.bounds(), Rect::new(25, 0, 65, 180));
    }

    #[test]
    fn draw_position_applies_image_offset() {
        let mut e = entity();
        e.image_offset = IVec2::new(-27, 0);
        assert_eq!(e.draw_position(), IVec2::new(73, 50));
    }
}
