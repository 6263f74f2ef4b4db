//! Tracked controller input

use crate::{InputDeviceId, Pose};

/// Controller hand
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

/// Buttons in xr-standard gamepad order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GamepadButton {
    Trigger = 0,
    Squeeze = 1,
    Touchpad = 2,
    Thumbstick = 3,
    /// A on the right controller, X on the left
    Button1 = 4,
    /// B on the right controller, Y on the left
    Button2 = 5,
}

impl GamepadButton {
    pub const ALL: [GamepadButton; 6] = [
        Self::Trigger,
        Self::Squeeze,
        Self::Touchpad,
        Self::Thumbstick,
        Self::Button1,
        Self::Button2,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Pressed state of every button at one instant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GamepadState {
    pub pressed: [bool; 6],
}

impl GamepadState {
    pub fn is_pressed(&self, button: GamepadButton) -> bool {
        self.pressed[button.index()]
    }

    pub fn set(&mut self, button: GamepadButton, pressed: bool) {
        self.pressed[button.index()] = pressed;
    }
}

/// One connected controller
#[derive(Clone, Debug, PartialEq)]
pub struct InputSource {
    pub hand: Hand,
    pub device: InputDeviceId,
    /// Pointing ray origin and direction in world space
    pub ray_space: Pose,
    pub gamepad: GamepadState,
}

/// Per-hand controller slots; a slot is empty while the controller is disconnected
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandControllers {
    pub left: Option<InputSource>,
    pub right: Option<InputSource>,
}

impl HandControllers {
    pub fn get(&self, hand: Hand) -> Option<&InputSource> {
        match hand {
            Hand::Left => self.left.as_ref(),
            Hand::Right => self.right.as_ref(),
        }
    }

    pub fn get_mut(&mut self, hand: Hand) -> Option<&mut InputSource> {
        match hand {
            Hand::Left => self.left.as_mut(),
            Hand::Right => self.right.as_mut(),
        }
    }

    pub fn connected(&self) -> impl Iterator<Item = &InputSource> {
        self.left.iter().chain(self.right.iter())
    }
}
