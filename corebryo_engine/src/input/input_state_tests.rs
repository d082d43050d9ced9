//! Unit tests for input resolution

use super::*;
use winit::keyboard::{KeyCode, PhysicalKey};

fn state_with_mouse_delta(dx: f32, dy: f32) -> InputState {
    let mut state = InputState::default();
    state.begin_frame();
    state.add_mouse_delta(dx, dy);
    state
}

// ============================================================================
// MODE-DEPENDENT LOOK
// ============================================================================

#[test]
fn test_game_mode_uses_mouse_delta() {
    let state = state_with_mouse_delta(20.0, -10.0);

    assert_eq!(state.resolve_axis(InputMode::Game, InputAxis::LookX), 2.0);
    assert_eq!(state.resolve_axis(InputMode::Game, InputAxis::LookY), -1.0);
}

#[test]
fn test_ui_mode_blocks_look() {
    let state = state_with_mouse_delta(20.0, -10.0);

    assert_eq!(state.resolve_axis(InputMode::Ui, InputAxis::LookX), 0.0);
    assert_eq!(state.resolve_axis(InputMode::Ui, InputAxis::LookY), 0.0);
}

#[test]
fn test_editor_mode_needs_right_or_middle_button() {
    let mut state = state_with_mouse_delta(20.0, 0.0);
    assert_eq!(state.resolve_axis(InputMode::Editor, InputAxis::LookX), 0.0);

    state.set_key(InputKey::MouseRight, true);
    assert_eq!(state.resolve_axis(InputMode::Editor, InputAxis::LookX), 2.0);

    state.set_key(InputKey::MouseRight, false);
    state.set_key(InputKey::MouseMiddle, true);
    assert_eq!(state.resolve_axis(InputMode::Editor, InputAxis::LookX), 2.0);
}

#[test]
fn test_same_state_resolves_differently_per_mode() {
    let state = state_with_mouse_delta(5.0, 5.0);

    let game = state.resolve_axis(InputMode::Game, InputAxis::LookX);
    let ui = state.resolve_axis(InputMode::Ui, InputAxis::LookX);
    assert_ne!(game, ui);
}

#[test]
fn test_scroll_is_not_mode_gated() {
    let mut state = InputState::default();
    state.add_scroll_delta(0.0, 3.0);

    assert_eq!(state.resolve_axis(InputMode::Ui, InputAxis::ScrollY), 3.0);
}

#[test]
fn test_key_axis_binding() {
    let mut mapping = InputMapping::empty();
    mapping.bind_axis(InputAxis::LookX, AxisBinding {
        source: AxisSource::Keys { negative: Some(InputKey::A), positive: Some(InputKey::D) },
        scale: 2.0,
    });
    let mut state = InputState::new(mapping);

    state.set_key(InputKey::D, true);
    assert_eq!(state.resolve_axis(InputMode::Ui, InputAxis::LookX), 2.0);

    state.set_key(InputKey::A, true);
    assert_eq!(state.resolve_axis(InputMode::Ui, InputAxis::LookX), 0.0);
}

// ============================================================================
// ACTIONS AND FRAMES
// ============================================================================

#[test]
fn test_fast_move_has_two_keys() {
    let mut state = InputState::default();
    assert!(!state.resolve_action(InputAction::FastMove));

    state.set_key(InputKey::ShiftRight, true);
    assert!(state.resolve_action(InputAction::FastMove));
}

#[test]
fn test_end_frame_tracks_edges() {
    let mut state = InputState::default();

    state.set_key(InputKey::W, true);
    let first = state.end_frame(InputMode::Game);
    assert!(first.action(InputAction::MoveForward));
    assert!(first.pressed(InputAction::MoveForward));

    let second = state.end_frame(InputMode::Game);
    assert!(second.action(InputAction::MoveForward));
    assert!(!second.pressed(InputAction::MoveForward));

    state.set_key(InputKey::W, false);
    let third = state.end_frame(InputMode::Game);
    assert!(!third.action(InputAction::MoveForward));
    assert!(third.released(InputAction::MoveForward));
}

#[test]
fn test_end_frame_look_and_begin_frame_reset() {
    let mut state = state_with_mouse_delta(10.0, 30.0);

    let frame = state.end_frame(InputMode::Game);
    assert_eq!(frame.look, glam::Vec2::new(1.0, 3.0));

    state.begin_frame();
    let frame = state.end_frame(InputMode::Game);
    assert_eq!(frame.look, glam::Vec2::ZERO);
}

// ============================================================================
// CAPTURE AND PLATFORM TRANSLATION
// ============================================================================

#[test]
fn test_mouse_capture_only_in_focused_game_mode() {
    let mut state = InputState::default();
    state.set_window_focused(true);
    state.enter_mode(InputMode::Game);
    assert!(state.should_capture_mouse(InputMode::Game));
    assert!(!state.should_capture_mouse(InputMode::Editor));

    state.set_window_focused(false);
    assert!(!state.should_capture_mouse(InputMode::Game));
}

#[test]
fn test_winit_translation() {
    assert_eq!(InputKey::from_physical_key(PhysicalKey::Code(KeyCode::KeyW)), Some(InputKey::W));
    assert_eq!(InputKey::from_physical_key(PhysicalKey::Code(KeyCode::KeyQ)), None);
    assert_eq!(
        InputKey::from_mouse_button(winit::event::MouseButton::Middle),
        Some(InputKey::MouseMiddle)
    );
}
