//! Shared fixtures for the engine integration tests

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tempfile::TempDir;

use sightline::widgets::{APPLICATION, BUTTON, TEXT_BOX, WINDOW};
use sightline::{ClassRef, Config, EntityArgs, EntityClass, EntityDef, Session};
use sightline_common::{MemoryScreen, Region};

pub static SAVE_DIALOG: Lazy<ClassRef> = Lazy::new(|| {
    EntityClass::builder("SaveDialog")
        .extends(&WINDOW)
        .member("SAVE", EntityDef::sub("save", &BUTTON))
        .member("FILE_NAME", EntityDef::sub("fileName", &TEXT_BOX))
        .member(
            "CANCEL",
            EntityDef::sub("cancel", &BUTTON).with_args(EntityArgs::default().invalidate_on_click(true)),
        )
        .build()
});

pub static NOTEBOOK: Lazy<ClassRef> = Lazy::new(|| {
    EntityClass::builder("Notebook")
        .extends(&APPLICATION)
        .member("SAVE_DIALOG", EntityDef::class(&SAVE_DIALOG))
        .build()
});

pub const NOTEBOOK_AT: Region = region(0, 0, 1280, 800);
pub const DIALOG_AT: Region = region(100, 100, 400, 300);
pub const SAVE_AT: Region = region(400, 350, 60, 20);

pub const fn region(x: i32, y: i32, w: i32, h: i32) -> Region {
    Region {
        x,
        y,
        w,
        h,
        click_offset: sightline_common::Location { x: 0, y: 0 },
    }
}

/// A throwaway baseline library, a scripted screen and a session over both
pub struct Fixture {
    pub dir: TempDir,
    pub screen: Arc<MemoryScreen>,
    pub session: Session,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        // RUST_LOG=sightline=trace shows each attempt
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let dir = TempDir::new().unwrap();
        let mut config = Config::default().without_input_delays();
        config.baselines.search_paths = vec![dir.path().join("baseline")];
        config.baselines.assert_dir = dir.path().join("assert");
        config.baselines.platform = "test".to_string();
        config.timing.wait_timeout_ms = 10;
        config.timing.entity_timeout_ms = 300;
        config.timing.state_timeout_ms = 100;
        config.timing.retry_backoff_ms = 10;
        config.timing.poll_interval_ms = 10;
        config.timing.idle_timeout_ms = 50;
        adjust(&mut config);

        let screen = Arc::new(MemoryScreen::new(1920, 1080));
        let session = Session::new(config, screen.clone());
        Self {
            dir,
            screen,
            session,
        }
    }

    /// Create an (empty) baseline image under the library root
    pub fn baseline(&self, relative: &str) -> PathBuf {
        let path = self.dir.path().join("baseline").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"png").unwrap();
        path
    }

    pub fn descriptor(&self, relative: &str, yaml: &str) {
        let path = self.dir.path().join("baseline").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, yaml).unwrap();
    }

    /// Baselines and placements for the notebook, its save dialog and the save button
    pub fn notebook_on_screen(&self) {
        self.baseline("Notebook/Notebook.png");
        self.baseline("Notebook/Notebook.SaveDialog.png");
        self.baseline("Notebook/Notebook.SaveDialog,save.png");
        self.screen.place("Notebook.png", NOTEBOOK_AT);
        self.screen.place("Notebook.SaveDialog.png", DIALOG_AT);
        self.screen.place("Notebook.SaveDialog,save.png", SAVE_AT);
    }
}
