//! Unit tests for physical device and queue family selection

use super::*;

fn integrated(graphics_family: Option<u32>) -> DeviceCandidate {
    DeviceCandidate { discrete: false, graphics_family }
}

fn discrete(graphics_family: Option<u32>) -> DeviceCandidate {
    DeviceCandidate { discrete: true, graphics_family }
}

#[test]
fn test_discrete_gpu_preferred() {
    let candidates = [integrated(Some(0)), discrete(Some(0))];
    assert_eq!(pick_physical_device(&candidates), Some(1));
}

#[test]
fn test_first_discrete_gpu_wins() {
    let candidates = [discrete(Some(0)), discrete(Some(1))];
    assert_eq!(pick_physical_device(&candidates), Some(0));
}

#[test]
fn test_discrete_without_graphics_is_skipped() {
    let candidates = [discrete(None), integrated(Some(2))];
    assert_eq!(pick_physical_device(&candidates), Some(1));
}

#[test]
fn test_no_graphics_family_anywhere() {
    assert_eq!(pick_physical_device(&[discrete(None), integrated(None)]), None);
    assert_eq!(pick_physical_device(&[]), None);
}

#[test]
fn test_present_prefers_graphics_family() {
    assert_eq!(pick_present_family(2, 4, |_| true), Some(2));
}

#[test]
fn test_present_falls_back_to_first_capable_family() {
    assert_eq!(pick_present_family(0, 4, |index| index >= 2), Some(2));
}

#[test]
fn test_present_unsupported() {
    assert_eq!(pick_present_family(0, 3, |_| false), None);
}
