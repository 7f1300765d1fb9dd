//! Click strategies
//!
//! How a press is delivered depends on the widget toolkit: some context
//! menus only open on a fast click, some buttons only register once the
//! pressed state has been painted. Entities carry one of these strategies
//! and may have it swapped by an `entity` transform.

use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

use sightline_common::{MouseButton, Pattern, Region, Scope, Screen};

use crate::config::InputConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickStrategy {
    /// move, settle, press, hold, release
    #[default]
    Standard,
    /// move, press, release with no pauses
    Quick,
    /// press and wait for the target's pixels to change before releasing
    AfterVisualChange,
}

impl ClickStrategy {
    /// Deliver a click on `target`; `entity` only labels logs and errors
    pub fn click(
        &self,
        screen: &dyn Screen,
        target: &Region,
        button: MouseButton,
        input: &InputConfig,
        entity: &str,
    ) -> Result<()> {
        let at = target.click_location();
        debug!("{:?} click on {} at {}", self, entity, at);

        match self {
            ClickStrategy::Standard => {
                screen.mouse_move(at)?;
                pause(input.settle_ms);
                screen.mouse_down(button)?;
                pause(input.hold_ms);
                screen.mouse_up(button)?;
            }
            ClickStrategy::Quick => {
                screen.mouse_move(at)?;
                screen.mouse_down(button)?;
                screen.mouse_up(button)?;
            }
            ClickStrategy::AfterVisualChange => {
                screen.mouse_move(at)?;
                pause(input.visual_change_settle_ms);
                let before = Pattern::new(screen.capture(target)?).exact();
                screen.mouse_down(button)?;
                pause(input.visual_change_settle_ms);

                let budget = Duration::from_millis(input.visual_change_budget_ms);
                if screen.wait_vanish(&Scope::Region(*target), &before, budget)? {
                    pause(200.min(input.visual_change_settle_ms));
                } else if input.strict_visual_change {
                    screen.mouse_up(button)?;
                    return Err(Error::VisualChangeMissing {
                        entity: entity.to_string(),
                    });
                } else {
                    warn!("{} did not change appearance after press", entity);
                }

                screen.mouse_up(button)?;
                pause(input.visual_change_settle_ms);
            }
        }
        Ok(())
    }
}

pub(crate) fn pause(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}
