//! Keyboard state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` returns true while the key is
//!   physically down.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only until the
//!   next `end_frame()`, which the app calls once per presented frame.
//!
//! `key_down` / `key_up` report whether the call was a real transition. OS key
//! repeat arrives as extra presses of an already-held key; those report
//! `false` so callers can forward only genuine press/release edges.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Left,
    Right,
    Escape,
    F3,
    F4,
}

impl Key {
    /// Keys that drive the player rather than the app shell.
    pub fn is_movement(self) -> bool {
        matches!(self, Key::Left | Key::Right)
    }
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Returns true when the key was not already held.
    pub fn key_down(&mut self, key: Key) -> bool {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
            true
        } else {
            false
        }
    }

    /// Returns true when the key was held before this call.
    pub fn key_up(&mut self, key: Key) -> bool {
        if self.held.remove(&key) {
            self.just_released.insert(key);
            true
        } else {
            false
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    /// Release everything, e.g. when the window loses focus. Returns the keys
    /// that were held, in declaration order (`Left` before `Right`), so the
    /// caller can forward matching release events deterministically.
    pub fn release_all(&mut self) -> Vec<Key> {
        let mut released: Vec<Key> = self.held.drain().collect();
        released.sort_unstable();
        self.just_released.extend(released.iter().copied());
        released
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
