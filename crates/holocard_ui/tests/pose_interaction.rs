//! Pose controller behaviour as seen by the viewer.

use holocard_shared::Vec3;
use holocard_ui::{
    HapticLog, InteractionState, PointerEvent, PoseController, PoseEvent, ViewportRect,
    FLIP_PULSE_MS,
};

const FRAME: f32 = 1.0 / 60.0;

fn settle(pose: &mut PoseController) {
    for _ in 0..900 {
        pose.update(FRAME);
    }
}

fn mounted(animations: bool) -> PoseController {
    let mut pose = PoseController::new(true, animations, true);
    pose.set_viewport(ViewportRect::sized(250.0, 350.0), 2.5, 3.5);
    pose
}

#[test]
fn test_hover_then_leave_returns_to_exact_rest() {
    let mut pose = mounted(true);
    let base = pose.base_scale();

    pose.handle(PointerEvent::Enter);
    pose.handle(PointerEvent::Move { x: 30.0, y: 310.0 });
    for _ in 0..20 {
        pose.update(FRAME);
    }
    assert!(pose.pose().rotation != Vec3::ZERO);

    pose.handle(PointerEvent::Leave);
    settle(&mut pose);

    let rest = pose.pose();
    assert_eq!(rest.rotation, Vec3::ZERO);
    assert_eq!(rest.position, Vec3::ZERO);
    assert_eq!(rest.scale, base);
    assert!(!rest.is_hovered);
    assert!(pose.is_settled());
}

#[test]
fn test_double_click_flips_once_and_pulses() {
    let haptics = HapticLog::new();
    let mut pose = PoseController::new(true, true, true)
        .with_haptics_device(Box::new(haptics.clone()));
    pose.set_viewport(ViewportRect::sized(250.0, 350.0), 2.5, 3.5);

    let mut flips = 0;
    let events = [
        PointerEvent::Enter,
        PointerEvent::Down { x: 120.0, y: 170.0, time: 1.0 },
        PointerEvent::Up { x: 120.0, y: 170.0 },
        PointerEvent::Down { x: 121.0, y: 170.0, time: 1.2 },
        PointerEvent::Up { x: 121.0, y: 170.0 },
    ];
    for event in events {
        if let Some(PoseEvent::Flipped { flipped }) = pose.handle(event) {
            assert!(flipped);
            flips += 1;
        }
    }

    assert_eq!(flips, 1);
    assert!(pose.pose().is_flipped);
    assert_eq!(haptics.pulses(), vec![FLIP_PULSE_MS]);
}

#[test]
fn test_haptics_disabled_skips_pulse() {
    let haptics = HapticLog::new();
    let mut pose = PoseController::new(true, true, false)
        .with_haptics_device(Box::new(haptics.clone()));

    pose.handle(PointerEvent::Down { x: 0.0, y: 0.0, time: 0.0 });
    pose.handle(PointerEvent::Up { x: 0.0, y: 0.0 });
    let event = pose.handle(PointerEvent::Down { x: 0.0, y: 0.0, time: 0.1 });

    assert_eq!(event, Some(PoseEvent::Flipped { flipped: true }));
    assert!(haptics.pulses().is_empty());
}

#[test]
fn test_flipped_rest_pose_faces_back() {
    let mut pose = mounted(false);
    pose.handle(PointerEvent::Down { x: 125.0, y: 175.0, time: 0.0 });
    pose.handle(PointerEvent::Down { x: 125.0, y: 175.0, time: 0.1 });
    pose.handle(PointerEvent::Leave);
    settle(&mut pose);

    let rest = pose.pose();
    assert_eq!(rest.rotation, Vec3::new(0.0, std::f32::consts::PI, 0.0));
    assert_eq!(pose.state(), InteractionState::Rest);
}

#[test]
fn test_drag_adds_rotation() {
    let mut pose = mounted(false);
    pose.handle(PointerEvent::Enter);
    pose.handle(PointerEvent::Move { x: 125.0, y: 175.0 });
    pose.handle(PointerEvent::Down { x: 125.0, y: 175.0, time: 0.0 });
    pose.handle(PointerEvent::Move { x: 150.0, y: 175.0 });
    settle(&mut pose);

    // 25 px of a 250 px card: 0.1 drag (x pi) plus 0.1 parallax (x 0.5).
    let expected = 0.1 * std::f32::consts::PI + 0.05;
    assert!((pose.pose().rotation.y - expected).abs() < 1e-5);
    assert_eq!(pose.state(), InteractionState::Dragging);
}

#[test]
fn test_disabling_animations_still_reaches_target() {
    let mut pose = mounted(true);
    pose.set_animations_enabled(false);
    pose.handle(PointerEvent::Enter);
    settle(&mut pose);
    assert!((pose.pose().scale - pose.base_scale() * 1.05).abs() < 1e-6);
}

#[test]
fn test_press_without_enter_stays_at_rest() {
    let mut pose = mounted(true);
    let base = pose.base_scale();

    pose.handle(PointerEvent::Down { x: 120.0, y: 170.0, time: 0.0 });
    assert_eq!(pose.state(), InteractionState::Rest);
    let event = pose.handle(PointerEvent::Up { x: 120.0, y: 170.0 });
    assert_eq!(event, Some(PoseEvent::Clicked));
    settle(&mut pose);

    let rest = pose.pose();
    assert_eq!(pose.state(), InteractionState::Rest);
    assert!(!rest.is_hovered);
    assert_eq!(rest.scale, base);
    assert_eq!(rest.position, Vec3::ZERO);
}

#[test]
fn test_double_click_reports_a_single_click() {
    let mut pose = mounted(true);

    let events = [
        PointerEvent::Enter,
        PointerEvent::Down { x: 120.0, y: 170.0, time: 1.0 },
        PointerEvent::Up { x: 120.0, y: 170.0 },
        PointerEvent::Down { x: 120.0, y: 170.0, time: 1.2 },
        PointerEvent::Up { x: 120.0, y: 170.0 },
    ];
    let emitted: Vec<PoseEvent> = events.into_iter().filter_map(|e| pose.handle(e)).collect();

    assert_eq!(
        emitted,
        vec![PoseEvent::Clicked, PoseEvent::Flipped { flipped: true }]
    );
}
