/// Unit tests for the mock backend itself

use super::*;
use crate::renderer::{AcquireResult, CommandList, Extent2D, FrameDevice, PresentResult};

#[test]
fn test_draws_in_stage_follows_innermost_label() {
    let mut commands = MockCommandList::new();
    commands.begin().unwrap();
    commands.begin_label("Outer").unwrap();
    commands.draw(3, 0).unwrap();
    commands.begin_label("Inner").unwrap();
    commands.draw_indexed(6, 0, 0).unwrap();
    commands.end_label().unwrap();
    commands.draw(9, 0).unwrap();
    commands.end_label().unwrap();
    commands.draw(12, 0).unwrap();

    assert_eq!(commands.draws_in_stage("Outer"), vec!["draw 3 0", "draw 9 0"]);
    assert_eq!(commands.draws_in_stage("Inner"), vec!["draw_indexed 6 0 0"]);
    assert!(commands.draws_in_stage("Missing").is_empty());
}

#[test]
fn test_begin_clears_previous_recording() {
    let mut commands = MockCommandList::new();
    commands.begin().unwrap();
    commands.draw(3, 0).unwrap();
    commands.begin().unwrap();

    assert_eq!(commands.commands, vec!["begin".to_string()]);
}

#[test]
fn test_acquire_cycles_images_and_follows_script() {
    let mut device = MockFrameDevice::new(640, 480);
    device.acquire_script.push_back(AcquireResult::Stale);

    assert_eq!(device.acquire_next_image().unwrap(), AcquireResult::Stale);
    assert_eq!(device.acquire_next_image().unwrap(), AcquireResult::Image(0));
    assert_eq!(device.acquire_next_image().unwrap(), AcquireResult::Image(1));
    assert_eq!(device.acquire_next_image().unwrap(), AcquireResult::Image(2));
    assert_eq!(device.acquire_next_image().unwrap(), AcquireResult::Image(0));
}

#[test]
fn test_unsignaled_fence_wait_fails() {
    let mut device = MockFrameDevice::new(640, 480);
    device.reset_frame_fence().unwrap();
    assert!(device.wait_for_frame_fence().is_err());

    device.submit(0).unwrap();
    assert!(device.wait_for_frame_fence().is_ok());
}

#[test]
fn test_abandoned_frame_signals_fence() {
    let mut device = MockFrameDevice::new(640, 480);
    device.reset_frame_fence().unwrap();
    device.abandon_frame().unwrap();

    assert!(device.wait_for_frame_fence().is_ok());
    assert_eq!(device.abandoned, 1);
    assert!(device.submitted.is_empty());
}

#[test]
fn test_recording_fails_on_matching_prefix_only() {
    let mut commands = MockCommandList::new();
    commands.fail_on = Some("draw_indexed".to_string());
    commands.begin().unwrap();
    commands.draw(3, 0).unwrap();

    assert!(commands.draw_indexed(6, 0, 0).is_err());
    assert_eq!(commands.commands, vec!["begin".to_string(), "draw 3 0".to_string()]);
}

#[test]
fn test_commands_failure_flag() {
    let mut device = MockFrameDevice::new(640, 480);
    device.fail_commands = true;
    assert!(device.commands(0).is_err());

    device.fail_commands = false;
    device.fail_recording_on = Some("end".to_string());
    let list = device.commands(0).unwrap();
    assert_eq!(list.fail_on.as_deref(), Some("end"));
}

#[test]
fn test_present_defaults_to_presented() {
    let mut device = MockFrameDevice::new(640, 480);
    device.present_script.push_back(PresentResult::Stale);

    assert_eq!(device.present(0), PresentResult::Stale);
    assert_eq!(device.present(1), PresentResult::Presented);
    assert_eq!(device.presented, vec![0, 1]);
}

#[test]
fn test_ledger_balanced_after_recreate_and_drop() {
    let mut device = MockFrameDevice::new(640, 480);
    let ledger = device.ledger.clone();

    device.recreate_surface_resources(Extent2D::new(320, 240)).unwrap();
    assert_eq!(device.extent(), Extent2D::new(320, 240));
    assert_eq!(ledger.lock().unwrap().live().len(), 7);

    drop(device);
    assert!(ledger.lock().unwrap().live().is_empty());
}
