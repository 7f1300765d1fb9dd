//! Interactions
//!
//! Every interaction validates the entity first, talks to the backend,
//! and drops the binding when the widget may have moved. Capability
//! specific operations check the class capability before touching the
//! screen.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace};

use sightline_common::{Key, Location, MouseButton, Pattern, Region, Scope};

use crate::click::pause;
use crate::entity::class::Capability;
use crate::entity::store::Clickable;
use crate::entity::{Entity, Outcome};
use crate::error::{Error, Result};
use crate::finder::Finder;

/// Per-call click settings
#[derive(Debug, Clone, Default)]
pub struct ClickOptions {
    pub button: MouseButton,
    /// State to verify after the click, overriding the entity's own
    pub post_state: Option<String>,
    /// Parent for the resulting entity
    pub result_parent: Option<Entity>,
}

impl ClickOptions {
    pub fn button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn post_state(mut self, state: &str) -> Self {
        self.post_state = Some(state.to_string());
        self
    }

    pub fn result_parent(mut self, parent: &Entity) -> Self {
        self.result_parent = Some(parent.clone());
        self
    }
}

impl Entity {
    fn clickable(&self) -> Result<Clickable> {
        self.session
            .with_node(self.id, |n| n.clickable.clone())
            .ok_or_else(|| Error::NotClickable {
                entity: self.to_string(),
            })
    }

    pub(crate) fn require(&self, capability: Capability, name: &'static str) -> Result<()> {
        if self.class().capability() == capability {
            Ok(())
        } else {
            Err(Error::MissingCapability {
                entity: self.to_string(),
                capability: name,
            })
        }
    }

    pub fn click(&self) -> Result<Outcome> {
        self.click_with(ClickOptions::default())
    }

    /// Click with the entity's strategy, verify the post-click state and
    /// return the configured outcome
    pub fn click_with(&self, options: ClickOptions) -> Result<Outcome> {
        let clickable = self.clickable()?;
        let region = self.validate()?;
        let config = self.session.config();

        clickable.strategy.click(
            self.session.screen(),
            &region,
            options.button,
            &config.input,
            &self.to_string(),
        )?;
        info!("Clicked {}", self);

        let state = options.post_state.or(clickable.post_state);
        if let Some(state) = state {
            self.assert_state(&state)?;
        }

        if clickable.invalidate_on_click {
            self.invalidate_by(self);
        }

        self.result_with_parent(options.result_parent.as_ref())
    }

    /// Check that the entity currently shows its `state` baselines
    pub fn assert_state(&self, state: &str) -> Result<()> {
        let region = self.validate()?;
        let timeout = self.session.config().timing.state_timeout();
        trace!("Verifying {} is in state [{}]", self, state);

        match Finder::with_state(self, state).find(Scope::Region(region), timeout) {
            Ok(_) => {
                info!("Verified {} state [{}]", self, state);
                Ok(())
            }
            Err(Error::FindExhausted { .. }) => Err(Error::StateFailed {
                entity: self.to_string(),
                state: state.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Move the pointer over the entity's click location
    pub fn hover(&self) -> Result<&Self> {
        let region = self.validate()?;
        self.session.screen().mouse_move(region.click_location())?;
        Ok(self)
    }

    /// Move the pointer to the centre of the entity
    pub fn focus(&self) -> Result<&Self> {
        let region = self.validate()?;
        self.session.screen().mouse_move(region.center())?;
        Ok(self)
    }

    /// Press on the entity, drag to `destination` and release
    pub fn drag_to(&self, destination: Location) -> Result<()> {
        self.clickable()?;
        let region = self.validate()?;
        let screen = self.session.screen();
        let input = &self.session.config().input;

        screen.mouse_move(region.click_location())?;
        pause(input.settle_ms);
        screen.mouse_down(MouseButton::Left)?;
        pause(input.drag_hold_ms);
        screen.mouse_move(destination)?;
        pause(input.drop_settle_ms);
        screen.mouse_up(MouseButton::Left)?;
        info!("Dragged {} to {}", self, destination);

        self.invalidate();
        Ok(())
    }

    /// Drag the entity onto `target`
    pub fn move_to(&self, target: &Region) -> Result<()> {
        let region = self.validate()?;
        let screen = self.session.screen();

        screen.mouse_move(region.center())?;
        screen.mouse_down(MouseButton::Left)?;
        screen.mouse_move(target.center())?;
        screen.mouse_up(MouseButton::Left)?;
        debug!("Moved {} onto {}", self, target);

        self.invalidate();
        Ok(())
    }

    /// Replace the field's contents with `text`, optionally reading it back
    /// through the clipboard. Returns the parent.
    pub fn type_text(&self, text: &str, verify: bool) -> Result<Option<Entity>> {
        self.require(Capability::TextInput, "text input")?;
        let region = self.validate()?;
        let screen = self.session.screen();
        let input = &self.session.config().input;
        let command = input.command_key.as_str();

        screen.mouse_move(region.click_location())?;
        pause(input.settle_ms);
        screen.mouse_down(MouseButton::Left)?;
        pause(input.settle_ms);
        screen.mouse_up(MouseButton::Left)?;
        pause(input.keystroke_settle_ms);

        screen.hotkey(&[command, "a"])?;
        pause(input.keystroke_settle_ms);
        screen.press(Key::Backspace)?;
        pause(input.keystroke_settle_ms);
        screen.paste(text)?;
        pause(input.keystroke_settle_ms);

        if verify {
            self.assert_text(text)?;
        }
        info!("Typed [{}] into {}", text, self);
        Ok(self.parent())
    }

    /// Compare the field's contents, read through the clipboard, with `expected`
    pub fn assert_text(&self, expected: &str) -> Result<()> {
        self.require(Capability::TextInput, "text input")?;
        let screen = self.session.screen();
        let input = &self.session.config().input;
        let command = input.command_key.as_str();

        screen.hotkey(&[command, "a"])?;
        pause(input.keystroke_settle_ms);
        screen.hotkey(&[command, "c"])?;
        pause(input.keystroke_settle_ms);

        let actual: String = screen
            .clipboard()?
            .chars()
            .filter(|c| *c != '\r' && *c != '\n')
            .collect();
        if actual != expected {
            error!(
                "Clipboard contents [{}] do not match expected [{}]",
                actual, expected
            );
            return Err(Error::TextMismatch {
                entity: self.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        trace!("Verified clipboard contents [{}]", actual);
        Ok(())
    }

    /// Text shown inside the entity, recognised by the backend
    pub fn text(&self) -> Result<String> {
        self.require(Capability::TextOutput, "text output")?;
        let region = self.validate()?;
        Ok(self.session.screen().read_text(&region)?)
    }

    /// Wait for a progress indicator to stop changing, then check that it
    /// shows its `complete` state
    pub fn wait_until_complete(&self, timeout: Duration) -> Result<Outcome> {
        self.require(Capability::Progress, "progress")?;
        let region = self.validate()?;
        let screen = self.session.screen();
        let timing = &self.session.config().timing;
        let scope = Scope::Region(region);

        let start = Instant::now();
        let mut last_change = Instant::now();
        let mut snapshot = Pattern::new(screen.capture(&region)?).exact();

        while last_change.elapsed() < timing.idle_timeout() {
            if start.elapsed() > timeout {
                return Err(Error::StateFailed {
                    entity: self.to_string(),
                    state: "complete".to_string(),
                });
            }
            pause(timing.poll_interval_ms);
            if screen.exists(&scope, &snapshot, timing.poll_interval())?.is_none() {
                trace!("{} changed", self);
                last_change = Instant::now();
                snapshot = Pattern::new(screen.capture(&region)?).exact();
            }
        }
        debug!(
            "{} stopped changing after {}ms",
            self,
            start.elapsed().as_millis()
        );

        self.assert_state("complete")?;
        info!("{} completed", self);
        self.result()
    }

    /// Drag the scroll bar's handle onto its up button
    pub fn goto_top(&self) -> Result<&Self> {
        self.scroll_onto("UP")
    }

    /// Drag the scroll bar's handle onto its down button
    pub fn goto_bottom(&self) -> Result<&Self> {
        self.scroll_onto("DOWN")
    }

    fn scroll_onto(&self, button: &str) -> Result<&Self> {
        self.require(Capability::Scroll, "scrolling")?;
        let target = self.member(button)?.validate()?;
        self.member("DRAG_BAR")?.move_to(&target)?;
        Ok(self)
    }

    /// Keep re-validating until the entity can no longer be found
    pub fn wait_until_vanish(&self, timeout: Duration) -> Result<Outcome> {
        let poll = self.session.config().timing.poll_interval();
        self.validate()?;
        trace!("Waiting for {} to vanish", self);

        let start = Instant::now();
        loop {
            if start.elapsed() > timeout {
                return Err(Error::TookTooLongToVanish {
                    entity: self.to_string(),
                    timeout,
                });
            }
            match self.validate_within(poll) {
                Ok(_) => self.invalidate(),
                Err(e) if e.is_find_exhausted() => break,
                Err(e) => return Err(e),
            }
        }
        info!("{} vanished", self);
        self.result()
    }

    /// Keep trying to validate until the entity shows up
    pub fn wait_until_appears(&self, timeout: Duration) -> Result<Region> {
        let poll = self.session.config().timing.poll_interval();
        let start = Instant::now();
        loop {
            match self.validate_within(poll) {
                Ok(region) => {
                    info!("{} appeared", self);
                    return Ok(region);
                }
                Err(e) if e.is_find_exhausted() => {}
                Err(e) => return Err(e),
            }
            if start.elapsed() > timeout {
                return Err(Error::TookTooLongToAppear {
                    entity: self.to_string(),
                    timeout,
                });
            }
        }
    }

    /// Compare the entity's region with the named assertion image.
    ///
    /// A missing image is captured from the current region and reported as
    /// [`Error::BaselineCaptured`] so it can be reviewed and committed.
    pub fn assert_that(&self, name: &str) -> Result<Region> {
        let region = self.validate()?;
        let config = self.session.config();
        let baselines = &config.baselines;
        let path: PathBuf = baselines
            .assert_dir
            .join(&baselines.platform)
            .join(format!("{name}{}", baselines.image_suffix));
        info!("Asserting [{}] on {}", name, self);

        let screen = self.session.screen();
        if !path.is_file() {
            let captured = screen.capture(&region)?;
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            if captured.is_file() {
                fs::copy(&captured, &path)?;
            } else {
                fs::write(&path, Vec::<u8>::new())?;
            }
            error!(
                "Baseline not provided, verify {} manually",
                path.display()
            );
            return Err(Error::BaselineCaptured { path });
        }

        let pattern = Pattern::new(&path);
        match screen.exists(&Scope::Region(region), &pattern, config.timing.wait_timeout())? {
            Some(found) => {
                info!("{} matched {}", found, pattern);
                Ok(found)
            }
            None => {
                error!("{} does not match {}", region, pattern);
                Err(Error::AssertionFailed(format!(
                    "{self} does not match {}",
                    path.display()
                )))
            }
        }
    }
}
