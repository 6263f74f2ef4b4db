//! Controller input mapping
//!
//! The frame loop hands the connected controllers and the session's
//! [`ActionContext`] to a [`ControllerInput`] once per frame. The default
//! mapping, [`EndSessionGesture`], ends the session with a two-step
//! confirm on the right controller.

use serde_json::{json, Value};

use portal_xr::{GamepadButton, GamepadState, Hand, HandControllers, InputSource, Pose};

/// Per-session input state folded from controller events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionContext {
    /// Action produced this frame
    pub action: Option<String>,
    /// Ray pose of the controller that produced the action
    pub controller_ray: Option<Pose>,
    /// Persists across frames until confirmed or cancelled
    pub waiting_for_confirmation: bool,
}

impl ActionContext {
    /// Clear per-frame fields, keeping the confirmation state
    pub fn begin_frame(&mut self) {
        self.action = None;
        self.controller_ray = None;
    }

    /// The frame's action as a scene event, if any
    pub fn to_event(&self) -> Option<Value> {
        let action = self.action.as_ref()?;
        let mut event = json!({
            "action": action,
            "waiting_for_confirmation": self.waiting_for_confirmation,
        });
        if let Some(ray) = self.controller_ray {
            event["controller_vector"] = json!({
                "position": ray.position.to_array(),
                "quaternion": ray.orientation.to_array(),
            });
        }
        Some(event)
    }
}

/// Result of one input poll
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputOutcome {
    pub action: Option<String>,
    pub awaiting_confirmation: bool,
    /// The user confirmed ending the session
    pub end_session_requested: bool,
}

/// Maps controller state to actions
pub trait ControllerInput {
    /// Called once per frame. Missing hands are skipped.
    fn poll(&mut self, controllers: &HandControllers, context: &mut ActionContext) -> InputOutcome;

    /// Drop edge-detection history, e.g. when a session ends
    fn reset(&mut self) {}
}

/// Press edges per hand
#[derive(Debug, Clone, Default)]
pub struct GamepadTracker {
    left: Option<GamepadState>,
    right: Option<GamepadState>,
}

impl GamepadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buttons that went down since the previous update of this hand
    pub fn clicks(&mut self, hand: Hand, state: Option<&GamepadState>) -> [bool; 6] {
        let previous = match hand {
            Hand::Left => &mut self.left,
            Hand::Right => &mut self.right,
        };
        let mut clicks = [false; 6];
        if let Some(state) = state {
            let before = previous.unwrap_or_default();
            for button in GamepadButton::ALL {
                clicks[button.index()] = state.is_pressed(button) && !before.is_pressed(button);
            }
        }
        *previous = state.copied();
        clicks
    }

    pub fn reset(&mut self) {
        self.left = None;
        self.right = None;
    }
}

/// Default mapping: triggers report their ray, right B asks to end the
/// session, right A confirms, anything else cancels
#[derive(Debug, Clone, Default)]
pub struct EndSessionGesture {
    tracker: GamepadTracker,
}

impl EndSessionGesture {
    pub fn new() -> Self {
        Self::default()
    }

    fn cancel(context: &mut ActionContext) {
        if context.waiting_for_confirmation {
            log::info!("Cancel action");
            context.waiting_for_confirmation = false;
        }
    }

    fn trigger(source: &InputSource, context: &mut ActionContext) {
        log::info!("Trigger on {:?} controller was activated", source.hand);
        Self::cancel(context);
        context.action = Some(format!(
            "Trigger on {} controller was activated: {}",
            hand_name(source.hand),
            GamepadButton::Trigger.index()
        ));
        context.controller_ray = Some(source.ray_space);
    }

    fn right(clicks: [bool; 6], source: &InputSource, context: &mut ActionContext) -> bool {
        let clicked = |b: GamepadButton| clicks[b.index()];

        if clicked(GamepadButton::Trigger) {
            Self::trigger(source, context);
        } else if clicked(GamepadButton::Button1) {
            if context.waiting_for_confirmation {
                log::info!("Confirm action: end session");
                context.waiting_for_confirmation = false;
                context.action = Some("End session confirmed".to_string());
                return true;
            }
        } else if clicked(GamepadButton::Button2) {
            if context.waiting_for_confirmation {
                log::info!("Cancel action");
                context.waiting_for_confirmation = false;
                context.action = Some("End session cancelled".to_string());
            } else {
                log::info!("Waiting for confirmation...");
                context.waiting_for_confirmation = true;
                context.action = Some("End session initiated".to_string());
            }
        } else if clicks.iter().any(|c| *c) {
            Self::cancel(context);
        }
        false
    }

    fn left(clicks: [bool; 6], source: &InputSource, context: &mut ActionContext) {
        if clicks[GamepadButton::Trigger.index()] {
            Self::trigger(source, context);
        } else if clicks.iter().any(|c| *c) {
            Self::cancel(context);
        }
    }
}

impl ControllerInput for EndSessionGesture {
    fn poll(&mut self, controllers: &HandControllers, context: &mut ActionContext) -> InputOutcome {
        let mut end_session_requested = false;

        let right_clicks = self
            .tracker
            .clicks(Hand::Right, controllers.right.as_ref().map(|s| &s.gamepad));
        if let Some(source) = &controllers.right {
            end_session_requested = Self::right(right_clicks, source, context);
        }

        let left_clicks = self
            .tracker
            .clicks(Hand::Left, controllers.left.as_ref().map(|s| &s.gamepad));
        if let Some(source) = &controllers.left {
            Self::left(left_clicks, source, context);
        }

        InputOutcome {
            action: context.action.clone(),
            awaiting_confirmation: context.waiting_for_confirmation,
            end_session_requested,
        }
    }

    fn reset(&mut self) {
        self.tracker.reset();
    }
}

fn hand_name(hand: Hand) -> &'static str {
    match hand {
        Hand::Left => "left",
        Hand::Right => "right",
    }
}
