//! Input polling capability consumed by the camera.
//!
//! The windowing layer owns the real devices; it feeds an [`InputState`]
//! and the core only ever asks "is this key down" or "how far did the
//! pointer move since the last poll".

use std::collections::HashSet;

use crate::Vec2;

/// Logical keys the core reacts to. Physical bindings live in the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Back,
    StrafeLeft,
    StrafeRight,
    Up,
    Down,
    LookModifier,
    Quit,
}

pub trait InputSource {
    /// Returns true while the key is held.
    fn key_down(&self, key: Key) -> bool;
    /// Returns true while the look button (left mouse by default) is held.
    fn look_held(&self) -> bool;
    /// Pointer movement since the last poll, in pixels.
    fn mouse_delta(&self) -> Vec2;
}

/// Polled keyboard/mouse state.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    keys_down: HashSet<Key>,
    look_held: bool,
    cursor: Option<Vec2>,
    mouse_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key(&mut self, key: Key, down: bool) {
        if down {
            self.keys_down.insert(key);
        } else {
            self.keys_down.remove(&key);
        }
    }

    pub fn set_look_held(&mut self, held: bool) {
        self.look_held = held;
    }

    /// Absolute cursor position in window coordinates. The first sample only
    /// establishes the origin.
    pub fn cursor_moved(&mut self, position: Vec2) {
        if let Some(last) = self.cursor {
            self.mouse_delta += position - last;
        }
        self.cursor = Some(position);
    }

    /// Relative motion reported directly by the device.
    pub fn add_mouse_delta(&mut self, delta: Vec2) {
        self.mouse_delta += delta;
    }

    /// Call once the frame has consumed the input; resets the pointer delta.
    pub fn end_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
    }

    /// Drops all held keys and buttons (e.g. when the window loses focus).
    pub fn clear(&mut self) {
        self.keys_down.clear();
        self.look_held = false;
        self.cursor = None;
        self.mouse_delta = Vec2::ZERO;
    }
}

impl InputSource for InputState {
    fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    fn look_held(&self) -> bool {
        self.look_held
    }

    fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }
}
