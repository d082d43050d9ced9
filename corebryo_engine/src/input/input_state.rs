/// Input state - raw key/mouse state resolved into actions and axes per frame
///
/// The active `InputMode` is never stored here: callers pass it to every
/// resolution step, so the same state can be read under different modes.

use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Default look sensitivity in degrees per pixel of mouse motion
pub const MOUSE_SENSITIVITY: f32 = 0.1;

/// Who currently owns the mouse and keyboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InputMode {
    /// Mouse look always on, cursor captured
    #[default]
    Game,
    /// Mouse look only while the right or middle button is held
    Editor,
    /// Overlay has focus, no look input
    Ui,
}

/// Physical inputs the engine binds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKey {
    W,
    A,
    S,
    D,
    ShiftLeft,
    ShiftRight,
    MouseLeft,
    MouseRight,
    MouseMiddle,
}

impl InputKey {
    /// Translate a winit physical key, `None` for keys the engine ignores
    pub fn from_physical_key(key: PhysicalKey) -> Option<Self> {
        let PhysicalKey::Code(code) = key else {
            return None;
        };

        match code {
            KeyCode::KeyW => Some(InputKey::W),
            KeyCode::KeyA => Some(InputKey::A),
            KeyCode::KeyS => Some(InputKey::S),
            KeyCode::KeyD => Some(InputKey::D),
            KeyCode::ShiftLeft => Some(InputKey::ShiftLeft),
            KeyCode::ShiftRight => Some(InputKey::ShiftRight),
            _ => None,
        }
    }

    pub fn from_mouse_button(button: winit::event::MouseButton) -> Option<Self> {
        match button {
            winit::event::MouseButton::Left => Some(InputKey::MouseLeft),
            winit::event::MouseButton::Right => Some(InputKey::MouseRight),
            winit::event::MouseButton::Middle => Some(InputKey::MouseMiddle),
            _ => None,
        }
    }
}

/// Logical actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveLeft,
    MoveBackward,
    MoveRight,
    FastMove,
    MousePrimary,
    MouseSecondary,
    MouseMiddle,
}

impl InputAction {
    pub const ALL: [InputAction; 8] = [
        InputAction::MoveForward,
        InputAction::MoveLeft,
        InputAction::MoveBackward,
        InputAction::MoveRight,
        InputAction::FastMove,
        InputAction::MousePrimary,
        InputAction::MouseSecondary,
        InputAction::MouseMiddle,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Logical axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAxis {
    LookX,
    LookY,
    ScrollX,
    ScrollY,
}

impl InputAxis {
    pub const ALL: [InputAxis; 4] = [InputAxis::LookX, InputAxis::LookY, InputAxis::ScrollX, InputAxis::ScrollY];

    fn index(self) -> usize {
        self as usize
    }
}

/// Up to two keys triggering one action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionBinding {
    pub primary: Option<InputKey>,
    pub secondary: Option<InputKey>,
}

impl ActionBinding {
    pub fn key(primary: InputKey) -> Self {
        Self { primary: Some(primary), secondary: None }
    }

    pub fn keys(primary: InputKey, secondary: InputKey) -> Self {
        Self { primary: Some(primary), secondary: Some(secondary) }
    }
}

/// Where an axis reads its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSource {
    /// +1 while `positive` is held, -1 while `negative` is held
    Keys { negative: Option<InputKey>, positive: Option<InputKey> },
    MouseDelta,
    ScrollDelta,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBinding {
    pub source: AxisSource,
    pub scale: f32,
}

/// Configurable bindings
#[derive(Debug, Clone)]
pub struct InputMapping {
    actions: FxHashMap<InputAction, ActionBinding>,
    axes: FxHashMap<InputAxis, AxisBinding>,
}

impl InputMapping {
    /// Mapping with no bindings at all
    pub fn empty() -> Self {
        Self {
            actions: FxHashMap::default(),
            axes: FxHashMap::default(),
        }
    }

    pub fn bind_action(&mut self, action: InputAction, binding: ActionBinding) {
        self.actions.insert(action, binding);
    }

    pub fn bind_axis(&mut self, axis: InputAxis, binding: AxisBinding) {
        self.axes.insert(axis, binding);
    }

    pub fn action(&self, action: InputAction) -> Option<&ActionBinding> {
        self.actions.get(&action)
    }

    pub fn axis(&self, axis: InputAxis) -> Option<&AxisBinding> {
        self.axes.get(&axis)
    }
}

impl Default for InputMapping {
    /// WASD movement, shift to sprint, mouse buttons, mouse look and scroll
    fn default() -> Self {
        let mut mapping = Self::empty();
        mapping.bind_action(InputAction::MoveForward, ActionBinding::key(InputKey::W));
        mapping.bind_action(InputAction::MoveLeft, ActionBinding::key(InputKey::A));
        mapping.bind_action(InputAction::MoveBackward, ActionBinding::key(InputKey::S));
        mapping.bind_action(InputAction::MoveRight, ActionBinding::key(InputKey::D));
        mapping.bind_action(InputAction::FastMove, ActionBinding::keys(InputKey::ShiftLeft, InputKey::ShiftRight));
        mapping.bind_action(InputAction::MousePrimary, ActionBinding::key(InputKey::MouseLeft));
        mapping.bind_action(InputAction::MouseSecondary, ActionBinding::key(InputKey::MouseRight));
        mapping.bind_action(InputAction::MouseMiddle, ActionBinding::key(InputKey::MouseMiddle));

        let look = AxisBinding { source: AxisSource::MouseDelta, scale: MOUSE_SENSITIVITY };
        mapping.bind_axis(InputAxis::LookX, look);
        mapping.bind_axis(InputAxis::LookY, look);

        let scroll = AxisBinding { source: AxisSource::ScrollDelta, scale: 1.0 };
        mapping.bind_axis(InputAxis::ScrollX, scroll);
        mapping.bind_axis(InputAxis::ScrollY, scroll);
        mapping
    }
}

/// Snapshot of resolved input for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    actions: [bool; 8],
    pressed: [bool; 8],
    released: [bool; 8],
    axes: [f32; 4],
    /// Look delta in degrees (yaw, pitch)
    pub look: Vec2,
}

impl InputFrame {
    pub fn action(&self, action: InputAction) -> bool {
        self.actions[action.index()]
    }

    /// Became active this frame
    pub fn pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    /// Became inactive this frame
    pub fn released(&self, action: InputAction) -> bool {
        self.released[action.index()]
    }

    pub fn axis(&self, axis: InputAxis) -> f32 {
        self.axes[axis.index()]
    }

    pub fn set_action(&mut self, action: InputAction, active: bool) {
        self.actions[action.index()] = active;
    }
}

/// Raw input accumulated from platform events
#[derive(Debug, Clone, Default)]
pub struct InputState {
    mapping: InputMapping,
    keys: FxHashSet<InputKey>,
    previous_actions: [bool; 8],
    mouse_delta: Vec2,
    scroll_delta: Vec2,
    window_focused: bool,
    wants_mouse_capture: bool,
}

impl InputState {
    pub fn new(mapping: InputMapping) -> Self {
        Self { mapping, ..Default::default() }
    }

    pub fn mapping(&self) -> &InputMapping {
        &self.mapping
    }

    pub fn set_mapping(&mut self, mapping: InputMapping) {
        self.mapping = mapping;
    }

    // ===== PLATFORM EVENTS =====

    pub fn set_key(&mut self, key: InputKey, pressed: bool) {
        if pressed {
            self.keys.insert(key);
        } else {
            self.keys.remove(&key);
        }
    }

    pub fn is_key_down(&self, key: InputKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn add_mouse_delta(&mut self, dx: f32, dy: f32) {
        self.mouse_delta += Vec2::new(dx, dy);
    }

    pub fn add_scroll_delta(&mut self, dx: f32, dy: f32) {
        self.scroll_delta += Vec2::new(dx, dy);
    }

    /// Losing focus also drops any pending capture request
    pub fn set_window_focused(&mut self, focused: bool) {
        self.window_focused = focused;
        if !focused {
            self.wants_mouse_capture = false;
        }
    }

    /// Entering a mode requests capture only for `Game`
    pub fn enter_mode(&mut self, mode: InputMode) {
        self.wants_mouse_capture = mode == InputMode::Game;
    }

    pub fn should_capture_mouse(&self, mode: InputMode) -> bool {
        mode == InputMode::Game && self.window_focused && self.wants_mouse_capture
    }

    // ===== RESOLUTION =====

    /// Clear per-frame deltas; call before pumping the frame's events
    pub fn begin_frame(&mut self) {
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = Vec2::ZERO;
    }

    /// Value of `axis` under `mode`
    pub fn resolve_axis(&self, mode: InputMode, axis: InputAxis) -> f32 {
        let Some(binding) = self.mapping.axis(axis) else {
            return 0.0;
        };

        let value = match binding.source {
            AxisSource::MouseDelta => {
                let look_allowed = match mode {
                    InputMode::Game => true,
                    InputMode::Editor => {
                        self.is_key_down(InputKey::MouseRight) || self.is_key_down(InputKey::MouseMiddle)
                    }
                    InputMode::Ui => false,
                };
                if !look_allowed {
                    return 0.0;
                }
                match axis {
                    InputAxis::LookX | InputAxis::ScrollX => self.mouse_delta.x,
                    InputAxis::LookY | InputAxis::ScrollY => self.mouse_delta.y,
                }
            }
            AxisSource::ScrollDelta => match axis {
                InputAxis::LookX | InputAxis::ScrollX => self.scroll_delta.x,
                InputAxis::LookY | InputAxis::ScrollY => self.scroll_delta.y,
            },
            AxisSource::Keys { negative, positive } => {
                let held = |key: Option<InputKey>| key.is_some_and(|k| self.is_key_down(k));
                let mut value = 0.0;
                if held(positive) {
                    value += 1.0;
                }
                if held(negative) {
                    value -= 1.0;
                }
                value
            }
        };

        value * binding.scale
    }

    /// Whether either key bound to `action` is held
    pub fn resolve_action(&self, action: InputAction) -> bool {
        self.mapping.action(action).is_some_and(|binding| {
            [binding.primary, binding.secondary]
                .into_iter()
                .flatten()
                .any(|key| self.is_key_down(key))
        })
    }

    /// Resolve every binding under `mode` and snapshot the result
    pub fn end_frame(&mut self, mode: InputMode) -> InputFrame {
        let mut frame = InputFrame::default();

        for axis in InputAxis::ALL {
            frame.axes[axis.index()] = self.resolve_axis(mode, axis);
        }
        frame.look = Vec2::new(frame.axis(InputAxis::LookX), frame.axis(InputAxis::LookY));

        for action in InputAction::ALL {
            let i = action.index();
            let active = self.resolve_action(action);
            frame.actions[i] = active;
            frame.pressed[i] = active && !self.previous_actions[i];
            frame.released[i] = !active && self.previous_actions[i];
            self.previous_actions[i] = active;
        }

        frame
    }
}
