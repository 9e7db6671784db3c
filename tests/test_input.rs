use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use rabbit_shooter::input::*;

fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
    KeyEvent {
        code,
        modifiers: KeyModifiers::NONE,
        kind,
        state: KeyEventState::NONE,
    }
}

fn set(held: &[Control]) -> ControlSet {
    let mut s = ControlSet::default();
    for c in held {
        s.set(*c, true);
    }
    s
}

// ── ControlSet ────────────────────────────────────────────────────────────────

#[test]
fn transition_reports_only_changes() {
    let mut current = set(&[Control::MoveLeft, Control::Jump]);
    let events = current.transition(set(&[Control::Jump, Control::Shoot]));
    assert_eq!(
        events,
        vec![
            ControlEvent::Released(Control::MoveLeft),
            ControlEvent::Pressed(Control::Shoot),
        ]
    );
    assert_eq!(current, set(&[Control::Jump, Control::Shoot]));
    assert!(current.transition(set(&[Control::Jump, Control::Shoot])).is_empty());
}

#[test]
fn union_holds_what_either_side_holds() {
    let u = set(&[Control::MoveLeft]).union(&set(&[Control::Shoot]));
    assert!(u.is_held(Control::MoveLeft));
    assert!(u.is_held(Control::Shoot));
    assert!(!u.is_held(Control::Jump));
    assert!(!ControlSet::default().union(&ControlSet::default()).any());
}

#[test]
fn apply_follows_edges() {
    let mut s = ControlSet::default();
    s.apply(ControlEvent::Pressed(Control::Jump));
    assert!(s.is_held(Control::Jump));
    s.apply(ControlEvent::Released(Control::Jump));
    assert!(!s.any());
}

// ── Commands ──────────────────────────────────────────────────────────────────

#[test]
fn command_keys() {
    let none = KeyModifiers::NONE;
    assert_eq!(command_for(KeyCode::Up, none), Some(Command::Up));
    assert_eq!(command_for(KeyCode::Enter, none), Some(Command::Confirm));
    assert_eq!(command_for(KeyCode::Char('p'), none), Some(Command::Pause));
    assert_eq!(command_for(KeyCode::Char('q'), none), Some(Command::EndSession));
    assert_eq!(command_for(KeyCode::Esc, none), Some(Command::Exit));
    assert_eq!(
        command_for(KeyCode::Char('c'), KeyModifiers::CONTROL),
        Some(Command::Exit)
    );
    assert_eq!(command_for(KeyCode::Char('c'), none), None);
    assert_eq!(command_for(KeyCode::Char('s'), none), None);
}

// ── KeyboardTracker ───────────────────────────────────────────────────────────

#[test]
fn press_and_release_produce_single_edges() {
    let mut keys = KeyboardTracker::new(3);

    keys.begin_frame();
    assert_eq!(keys.key_event(&key(KeyCode::Char('s'), KeyEventKind::Press)), None);
    assert_eq!(keys.end_frame(), vec![ControlEvent::Pressed(Control::Shoot)]);

    keys.begin_frame();
    keys.key_event(&key(KeyCode::Char('s'), KeyEventKind::Repeat));
    assert!(keys.end_frame().is_empty());

    keys.begin_frame();
    keys.key_event(&key(KeyCode::Char('s'), KeyEventKind::Release));
    assert_eq!(keys.end_frame(), vec![ControlEvent::Released(Control::Shoot)]);
}

#[test]
fn press_without_release_expires_after_hold_window() {
    let mut keys = KeyboardTracker::new(3);
    keys.begin_frame();
    keys.key_event(&key(KeyCode::Right, KeyEventKind::Press));
    assert_eq!(keys.end_frame(), vec![ControlEvent::Pressed(Control::MoveRight)]);

    for _ in 0..3 {
        keys.begin_frame();
        assert!(keys.end_frame().is_empty());
    }
    keys.begin_frame();
    assert_eq!(keys.end_frame(), vec![ControlEvent::Released(Control::MoveRight)]);
}

#[test]
fn repeats_keep_a_key_held() {
    let mut keys = KeyboardTracker::new(2);
    keys.begin_frame();
    keys.key_event(&key(KeyCode::Char('a'), KeyEventKind::Press));
    keys.end_frame();
    for _ in 0..10 {
        keys.begin_frame();
        keys.key_event(&key(KeyCode::Char('a'), KeyEventKind::Repeat));
        assert!(keys.end_frame().is_empty());
    }
}

#[test]
fn menu_keys_yield_commands_not_controls() {
    let mut keys = KeyboardTracker::new(3);
    keys.begin_frame();
    assert_eq!(
        keys.key_event(&key(KeyCode::Enter, KeyEventKind::Press)),
        Some(Command::Confirm)
    );
    assert_eq!(keys.key_event(&key(KeyCode::Enter, KeyEventKind::Repeat)), None);
    assert!(keys.end_frame().is_empty());
}

#[test]
fn reset_releases_everything() {
    let mut keys = KeyboardTracker::new(3);
    keys.begin_frame();
    keys.key_event(&key(KeyCode::Char(' '), KeyEventKind::Press));
    keys.key_event(&key(KeyCode::Left, KeyEventKind::Press));
    keys.end_frame();
    assert_eq!(
        keys.reset(),
        vec![
            ControlEvent::Released(Control::MoveLeft),
            ControlEvent::Released(Control::Jump),
        ]
    );
}

#[test]
fn hold_window_scales_with_framerate() {
    // 60 fps -> 9 frames of grace
    let mut keys = KeyboardTracker::for_framerate(60);
    keys.begin_frame();
    keys.key_event(&key(KeyCode::Char('d'), KeyEventKind::Press));
    keys.end_frame();
    for _ in 0..9 {
        keys.begin_frame();
        assert!(keys.end_frame().is_empty());
    }
    keys.begin_frame();
    assert_eq!(keys.end_frame().len(), 1);
}

// ── Release-event terminals ───────────────────────────────────────────────────

#[test]
fn key_stays_held_until_its_release_arrives() {
    let mut keys = KeyboardTracker::for_framerate(60).with_release_events(true);
    let mut edges = Vec::new();

    keys.begin_frame();
    keys.key_event(&key(KeyCode::Right, KeyEventKind::Press));
    edges.extend(keys.end_frame());

    // The first auto-repeat arrives long after the hold window
    for _ in 0..29 {
        keys.begin_frame();
        edges.extend(keys.end_frame());
    }
    keys.begin_frame();
    keys.key_event(&key(KeyCode::Right, KeyEventKind::Repeat));
    edges.extend(keys.end_frame());
    assert_eq!(edges, vec![ControlEvent::Pressed(Control::MoveRight)]);

    keys.begin_frame();
    keys.key_event(&key(KeyCode::Right, KeyEventKind::Release));
    assert_eq!(keys.end_frame(), vec![ControlEvent::Released(Control::MoveRight)]);
}

#[test]
fn release_mode_still_resets() {
    let mut keys = KeyboardTracker::new(3).with_release_events(true);
    keys.begin_frame();
    keys.key_event(&key(KeyCode::Char('s'), KeyEventKind::Press));
    keys.end_frame();
    for _ in 0..10 {
        keys.begin_frame();
        assert!(keys.end_frame().is_empty());
    }
    assert_eq!(keys.reset(), vec![ControlEvent::Released(Control::Shoot)]);
}
