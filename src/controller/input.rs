/// Platform-agnostic input handling system
use std::collections::HashSet;

use glam::Vec2;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events, keyed by physical code ("KeyW", "ArrowUp")
    KeyDown(String),
    KeyUp(String),

    // Pointer events
    PointerMove { dx: f32, dy: f32 },
    Click { x: f32, y: f32 },

    // Touch events
    TouchStart { id: i32, x: f32, y: f32 },
    TouchMove { id: i32, x: f32, y: f32 },
    TouchEnd { id: i32 },

    // Window events
    FocusLost,
    VisibilityChanged { visible: bool },
    PointerLockChanged { locked: bool },
    Resize { width: u32, height: u32 },
}

/// Which input hardware drives the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceProfile {
    Pointer,
    Touch,
}

/// What an event means beyond the state it updated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEffect {
    None,
    Look(Vec2),
    Tap(Vec2),
}

/// Touch travel below this many pixels counts as a tap.
const TAP_SLOP: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchTrack {
    pub id: i32,
    pub origin: Vec2,
    pub current: Vec2,
}

impl TouchTrack {
    fn new(id: i32, at: Vec2) -> Self {
        Self {
            id,
            origin: at,
            current: at,
        }
    }

    pub fn gesture(&self) -> Vec2 {
        self.current - self.origin
    }

    /// Screen-space angle of the gesture, `None` until the finger moves.
    pub fn angle(&self) -> Option<f32> {
        let g = self.gesture();
        if g.length_squared() > 0.0 {
            Some(g.y.atan2(g.x))
        } else {
            None
        }
    }
}

/// Everything the frame loop reads about held input.
#[derive(Default)]
pub struct InputState {
    pub pressed_keys: HashSet<String>,
    /// The first finger down steers locomotion.
    pub move_touch: Option<TouchTrack>,
    /// Further fingers look around; last seen positions by id.
    look_touches: Vec<(i32, Vec2)>,
    pub pointer_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) -> InputEffect {
        match event {
            InputEvent::KeyDown(code) => {
                self.pressed_keys.insert(code.clone());
            }
            InputEvent::KeyUp(code) => {
                self.pressed_keys.remove(code.as_str());
            }
            InputEvent::PointerMove { dx, dy } => {
                return InputEffect::Look(Vec2::new(*dx, *dy));
            }
            InputEvent::TouchStart { id, x, y } => {
                let at = Vec2::new(*x, *y);
                if self.move_touch.is_none() {
                    self.move_touch = Some(TouchTrack::new(*id, at));
                } else {
                    self.look_touches.push((*id, at));
                }
            }
            InputEvent::TouchMove { id, x, y } => {
                let at = Vec2::new(*x, *y);
                if let Some(track) = self.move_touch.as_mut().filter(|t| t.id == *id) {
                    track.current = at;
                } else if let Some((_, last)) = self.look_touches.iter_mut().find(|(tid, _)| tid == id) {
                    let delta = at - *last;
                    *last = at;
                    return InputEffect::Look(delta);
                }
            }
            InputEvent::TouchEnd { id } => {
                if let Some(track) = self.move_touch.filter(|t| t.id == *id) {
                    self.move_touch = None;
                    if track.gesture().length() < TAP_SLOP {
                        return InputEffect::Tap(track.current);
                    }
                } else {
                    self.look_touches.retain(|(tid, _)| tid != id);
                }
            }
            InputEvent::FocusLost | InputEvent::VisibilityChanged { .. } => {
                self.clear_keys();
                self.clear_touches();
            }
            InputEvent::PointerLockChanged { locked } => {
                self.pointer_locked = *locked;
            }
            InputEvent::Click { .. } | InputEvent::Resize { .. } => {}
        }
        InputEffect::None
    }

    pub fn is_key_pressed(&self, code: &str) -> bool {
        self.pressed_keys.contains(code)
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }

    pub fn clear_touches(&mut self) {
        self.move_touch = None;
        self.look_touches.clear();
    }
}

/// Key mapping configuration. Each action accepts any of its codes.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: Vec<String>,
    pub backward: Vec<String>,
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub escape: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let codes = |list: &[&str]| list.iter().map(|c| c.to_string()).collect::<Vec<_>>();
        Self {
            forward: codes(&["KeyW", "ArrowUp"]),
            backward: codes(&["KeyS", "ArrowDown"]),
            left: codes(&["KeyA", "ArrowLeft"]),
            right: codes(&["KeyD", "ArrowRight"]),
            escape: "Escape".to_string(),
        }
    }
}

/// High-level input processor
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    fn any_pressed(input: &InputState, codes: &[String]) -> bool {
        codes.iter().any(|code| input.is_key_pressed(code))
    }

    pub fn is_moving_forward(&self, input: &InputState) -> bool {
        Self::any_pressed(input, &self.bindings.forward)
    }

    pub fn is_moving_backward(&self, input: &InputState) -> bool {
        Self::any_pressed(input, &self.bindings.backward)
    }

    pub fn is_moving_left(&self, input: &InputState) -> bool {
        Self::any_pressed(input, &self.bindings.left)
    }

    pub fn is_moving_right(&self, input: &InputState) -> bool {
        Self::any_pressed(input, &self.bindings.right)
    }

    pub fn is_escape(&self, code: &str) -> bool {
        code == self.bindings.escape
    }

    /// Codes whose browser default (scrolling) should be suppressed.
    pub fn is_movement_code(&self, code: &str) -> bool {
        [&self.bindings.forward, &self.bindings.backward, &self.bindings.left, &self.bindings.right]
            .into_iter()
            .flatten()
            .any(|bound| bound == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_held_until_released() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown("KeyW".into()));
        input.process_event(&InputEvent::KeyDown("KeyD".into()));
        assert!(input.is_key_pressed("KeyW"));
        input.process_event(&InputEvent::KeyUp("KeyW".into()));
        assert!(!input.is_key_pressed("KeyW"));
        assert!(input.is_key_pressed("KeyD"));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown("KeyW".into()));
        input.process_event(&InputEvent::TouchStart { id: 1, x: 10.0, y: 10.0 });
        input.process_event(&InputEvent::FocusLost);
        assert!(input.pressed_keys.is_empty());
        assert!(input.move_touch.is_none());
    }

    #[test]
    fn first_touch_steers_and_later_touches_look() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::TouchStart { id: 7, x: 100.0, y: 300.0 });
        input.process_event(&InputEvent::TouchStart { id: 8, x: 600.0, y: 300.0 });

        let effect = input.process_event(&InputEvent::TouchMove { id: 7, x: 100.0, y: 250.0 });
        assert_eq!(effect, InputEffect::None);
        let track = input.move_touch.expect("move touch active");
        assert_eq!(track.gesture(), Vec2::new(0.0, -50.0));
        assert!((track.angle().unwrap_or(0.0) + std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let effect = input.process_event(&InputEvent::TouchMove { id: 8, x: 620.0, y: 295.0 });
        assert_eq!(effect, InputEffect::Look(Vec2::new(20.0, -5.0)));
    }

    #[test]
    fn stationary_touch_has_no_angle_and_ends_as_a_tap() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::TouchStart { id: 1, x: 40.0, y: 50.0 });
        assert_eq!(input.move_touch.and_then(|t| t.angle()), None);
        let effect = input.process_event(&InputEvent::TouchEnd { id: 1 });
        assert_eq!(effect, InputEffect::Tap(Vec2::new(40.0, 50.0)));
        assert!(input.move_touch.is_none());
    }

    #[test]
    fn long_drag_is_not_a_tap() {
        let mut input = InputState::new();
        input.process_event(&InputEvent::TouchStart { id: 1, x: 0.0, y: 0.0 });
        input.process_event(&InputEvent::TouchMove { id: 1, x: 80.0, y: 0.0 });
        assert_eq!(input.process_event(&InputEvent::TouchEnd { id: 1 }), InputEffect::None);
    }

    #[test]
    fn bindings_accept_arrow_keys() {
        let processor = InputProcessor::default();
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown("ArrowLeft".into()));
        assert!(processor.is_moving_left(&input));
        assert!(!processor.is_moving_right(&input));
        assert!(processor.is_movement_code("KeyS"));
        assert!(!processor.is_movement_code("KeyQ"));
        assert!(processor.is_escape("Escape"));
    }
}
