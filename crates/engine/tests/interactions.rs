//! Clicking, typing, waiting and asserting against a scripted screen

mod support;

use std::time::Duration;

use once_cell::sync::Lazy;

use sightline::widgets::{APPLICATION, BUTTON, CHECK_BOX, LABEL, PROGRESS_BAR, SCROLL_BAR, TEXT_BOX, WINDOW};
use sightline::{ClassRef, ClickOptions, Entity, EntityArgs, EntityClass, EntityDef, Error, Status};
use sightline_common::{InputEvent, Key, Location, MouseButton, Region};
use support::*;

static EDITOR: Lazy<ClassRef> = Lazy::new(|| {
    EntityClass::builder("Editor")
        .extends(&APPLICATION)
        .member("BOLD", EntityDef::sub("bold", &BUTTON))
        .member(
            "WRAP",
            EntityDef::sub("wrap", &CHECK_BOX).with_args(EntityArgs::default().post_state("checked")),
        )
        .member("NAME", EntityDef::sub("name", &TEXT_BOX))
        .member("STATUS", EntityDef::sub("status", &LABEL))
        .member("PROGRESS", EntityDef::sub("progress", &PROGRESS_BAR))
        .member("SCROLL", EntityDef::sub("scroll", &SCROLL_BAR))
        .member("SPINNER", EntityDef::sub("spinner", &WINDOW))
        .build()
});

const EDITOR_AT: Region = region(0, 0, 1000, 800);
const BOLD_AT: Region = region(10, 10, 30, 30);
const WRAP_AT: Region = region(50, 10, 30, 30);
const NAME_AT: Region = region(100, 60, 300, 24);
const STATUS_AT: Region = region(0, 770, 400, 20);
const PROGRESS_AT: Region = region(500, 770, 200, 20);
const SPINNER_AT: Region = region(480, 380, 40, 40);
const SCROLL_AT: Region = region(970, 100, 20, 600);
const UP_AT: Region = region(970, 100, 20, 20);
const DRAG_BAR_AT: Region = region(970, 300, 20, 40);

/// Editor on screen with a baseline for each listed member
fn editor(fx: &Fixture, members: &[(&str, Region)]) -> Entity {
    fx.baseline("Editor/Editor.png");
    fx.screen.place("Editor.png", EDITOR_AT);
    for (name, at) in members {
        let image = format!("Editor,{name}.png");
        fx.baseline(&format!("Editor/{image}"));
        fx.screen.place(&image, *at);
    }
    fx.session.application(&EDITOR)
}

fn command(fx: &Fixture) -> String {
    fx.session.config().input.command_key.clone()
}

#[test]
fn test_click_presses_at_click_location() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("bold", BOLD_AT)]);
    let bold = app.member("BOLD").unwrap();

    let outcome = bold.click_with(ClickOptions::default().button(MouseButton::Right)).unwrap();
    assert_eq!(outcome.into_entity(), Some(app));
    assert_eq!(
        fx.screen.events(),
        vec![
            InputEvent::Move(BOLD_AT.click_location()),
            InputEvent::Down(MouseButton::Right),
            InputEvent::Up(MouseButton::Right),
        ]
    );
    // clicking does not drop the binding unless asked to
    assert_eq!(bold.status(), Status::Valid);
}

#[test]
fn test_post_click_state_is_verified() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("wrap", WRAP_AT)]);
    fx.baseline("Editor/Editor,wrap[checked].png");
    fx.screen.place("Editor,wrap[checked].png", WRAP_AT);
    let wrap = app.member("WRAP").unwrap();

    wrap.click().unwrap();
    let last = fx.screen.lookups().pop().unwrap();
    assert_eq!(last.image, "Editor,wrap[checked].png");

    fx.screen.remove("Editor,wrap[checked].png");
    match wrap.click().unwrap_err() {
        Error::StateFailed { state, .. } => assert_eq!(state, "checked"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_click_option_overrides_post_state() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("wrap", WRAP_AT)]);
    fx.baseline("Editor/Editor,wrap[unchecked].png");
    let wrap = app.member("WRAP").unwrap();

    let err = wrap
        .click_with(ClickOptions::default().post_state("unchecked"))
        .unwrap_err();
    assert!(matches!(err, Error::StateFailed { ref state, .. } if state == "unchecked"));
}

#[test]
fn test_invalidate_on_click_drops_bindings_up_to_window() {
    let fx = Fixture::new();
    fx.notebook_on_screen();
    fx.baseline("Notebook/Notebook.SaveDialog,cancel.png");
    fx.screen.place("Notebook.SaveDialog,cancel.png", region(300, 350, 60, 20));
    let app = fx.session.application(&NOTEBOOK);
    app.validate().unwrap();
    let dialog = app.member("SAVE_DIALOG").unwrap();
    let cancel = dialog.member("CANCEL").unwrap();

    assert_eq!(cancel.click().unwrap().into_entity(), Some(dialog.clone()));
    assert_eq!(cancel.status(), Status::Invalid);
    assert_eq!(dialog.status(), Status::Invalid);
    assert!(dialog.instances().is_empty());
    assert_eq!(app.status(), Status::Valid);
}

#[test]
fn test_only_clickable_entities_click() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("name", NAME_AT)]);
    let name = app.member("NAME").unwrap();
    assert!(!name.is_clickable());
    assert!(matches!(name.click(), Err(Error::NotClickable { .. })));
    assert!(matches!(
        name.drag_to(Location::new(0, 0)),
        Err(Error::NotClickable { .. })
    ));
    assert!(fx.screen.events().is_empty());
}

#[test]
fn test_type_text_replaces_field_contents() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("name", NAME_AT)]);
    fx.screen.set_field_text("untitled");
    let name = app.member("NAME").unwrap();

    let parent = name.type_text("report.txt", true).unwrap();
    assert_eq!(parent, Some(app));
    assert_eq!(fx.screen.field_text(), "report.txt");

    let cmd = command(&fx);
    let events = fx.screen.events();
    assert!(events.contains(&InputEvent::Hotkey(vec![cmd.clone(), "a".to_string()])));
    assert!(events.contains(&InputEvent::Press(Key::Backspace)));
    assert!(events.contains(&InputEvent::Paste("report.txt".to_string())));
    assert_eq!(
        events.last(),
        Some(&InputEvent::Hotkey(vec![cmd, "c".to_string()]))
    );
}

#[test]
fn test_assert_text_reports_mismatch() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("name", NAME_AT)]);
    let name = app.member("NAME").unwrap();
    name.type_text("draft", false).unwrap();

    match name.assert_text("final").unwrap_err() {
        Error::TextMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, "final");
            assert_eq!(actual, "draft");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_capabilities_are_enforced() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("bold", BOLD_AT)]);
    let bold = app.member("BOLD").unwrap();

    for err in [
        bold.type_text("x", false).unwrap_err(),
        bold.text().unwrap_err(),
        bold.wait_until_complete(Duration::from_millis(10)).unwrap_err(),
        bold.goto_top().map(|_| ()).unwrap_err(),
    ] {
        assert!(matches!(err, Error::MissingCapability { .. }), "{err}");
    }
    assert!(fx.screen.lookups().is_empty());
}

#[test]
fn test_label_text_is_read_from_screen() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("status", STATUS_AT)]);
    fx.screen.show_text(region(5, 772, 100, 16), "Saved");
    let status = app.member("STATUS").unwrap();
    assert_eq!(status.text().unwrap(), "Saved");
}

#[test]
fn test_wait_until_vanish_returns_result() {
    let fx = Fixture::new();
    let app = editor(&fx, &[]);
    fx.baseline("Editor/Editor,spinner.png");
    fx.screen.place_for("Editor,spinner.png", SPINNER_AT, 3);
    let spinner = app.member("SPINNER").unwrap();

    let outcome = spinner.wait_until_vanish(Duration::from_secs(2)).unwrap();
    assert_eq!(outcome.into_entity(), Some(app));
    assert_eq!(spinner.status(), Status::Invalid);
}

#[test]
fn test_wait_until_vanish_times_out() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("spinner", SPINNER_AT)]);
    let spinner = app.member("SPINNER").unwrap();

    let err = spinner.wait_until_vanish(Duration::from_millis(50)).unwrap_err();
    assert!(matches!(err, Error::TookTooLongToVanish { .. }));
}

#[test]
fn test_wait_until_appears() {
    let fx = Fixture::new();
    let app = editor(&fx, &[]);
    fx.baseline("Editor/Editor,spinner.png");
    let spinner = app.member("SPINNER").unwrap();

    let err = spinner.wait_until_appears(Duration::from_millis(100)).unwrap_err();
    assert!(matches!(err, Error::TookTooLongToAppear { .. }));

    fx.screen.place("Editor,spinner.png", SPINNER_AT);
    assert_eq!(spinner.wait_until_appears(Duration::from_millis(100)).unwrap(), SPINNER_AT);
}

#[test]
fn test_progress_waits_for_idle_then_checks_complete() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("progress", PROGRESS_AT)]);
    fx.baseline("Editor/Editor,progress[complete].png");
    fx.screen.place("Editor,progress[complete].png", PROGRESS_AT);
    fx.screen.schedule_changes(3);
    let progress = app.member("PROGRESS").unwrap();

    let outcome = progress.wait_until_complete(Duration::from_secs(2)).unwrap();
    assert_eq!(outcome.into_entity(), Some(app));

    let snapshots = fx
        .screen
        .lookups()
        .iter()
        .filter(|l| l.image.starts_with("capture-"))
        .count();
    assert!(snapshots > 3);
}

#[test]
fn test_progress_that_never_settles_fails() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("progress", PROGRESS_AT)]);
    fx.screen.schedule_changes(usize::MAX);
    let progress = app.member("PROGRESS").unwrap();

    match progress.wait_until_complete(Duration::from_millis(100)).unwrap_err() {
        Error::StateFailed { state, .. } => assert_eq!(state, "complete"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_assert_that_captures_missing_image_then_compares() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("bold", BOLD_AT)]);
    let bold = app.member("BOLD").unwrap();
    let expected = fx.dir.path().join("assert").join("test").join("bold-pressed.png");

    match bold.assert_that("bold-pressed").unwrap_err() {
        Error::BaselineCaptured { path } => assert_eq!(path, expected),
        other => panic!("unexpected {other:?}"),
    }
    assert!(expected.is_file());

    assert!(matches!(
        bold.assert_that("bold-pressed"),
        Err(Error::AssertionFailed(_))
    ));

    fx.screen.place("bold-pressed.png", BOLD_AT);
    assert_eq!(bold.assert_that("bold-pressed").unwrap(), BOLD_AT);
}

#[test]
fn test_drag_to_moves_and_invalidates() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("bold", BOLD_AT)]);
    let bold = app.member("BOLD").unwrap();
    let target = Location::new(600, 400);

    bold.drag_to(target).unwrap();
    assert_eq!(
        fx.screen.events(),
        vec![
            InputEvent::Move(BOLD_AT.click_location()),
            InputEvent::Down(MouseButton::Left),
            InputEvent::Move(target),
            InputEvent::Up(MouseButton::Left),
        ]
    );
    assert_eq!(bold.status(), Status::Invalid);
    // buttons cascade into the application
    assert_eq!(app.status(), Status::Invalid);
}

#[test]
fn test_goto_top_drags_bar_onto_up_button() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("scroll", SCROLL_AT)]);
    for (image, at) in [("Editor,scroll,up.png", UP_AT), ("Editor,scroll,dragBar.png", DRAG_BAR_AT)] {
        fx.baseline(&format!("Editor/{image}"));
        fx.screen.place(image, at);
    }
    let scroll = app.member("SCROLL").unwrap();

    scroll.goto_top().unwrap();
    assert_eq!(
        fx.screen.events(),
        vec![
            InputEvent::Move(DRAG_BAR_AT.center()),
            InputEvent::Down(MouseButton::Left),
            InputEvent::Move(UP_AT.center()),
            InputEvent::Up(MouseButton::Left),
        ]
    );
    assert_eq!(scroll.member("DRAG_BAR").unwrap().status(), Status::Invalid);
}

#[test]
fn test_hover_and_focus_only_move_pointer() {
    let fx = Fixture::new();
    let app = editor(&fx, &[("bold", BOLD_AT)]);
    let bold = app.member("BOLD").unwrap();

    bold.hover().unwrap().focus().unwrap();
    assert_eq!(
        fx.screen.events(),
        vec![
            InputEvent::Move(BOLD_AT.click_location()),
            InputEvent::Move(BOLD_AT.center()),
        ]
    );
    assert!(bold.is_valid());
}
