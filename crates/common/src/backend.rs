//! Screen backend contract
//!
//! The engine never matches pixels or injects input itself. Everything it
//! needs from the desktop goes through this trait, with explicit timeouts.
//! Implementations must tolerate serialized calls only; the engine never
//! calls a backend from two threads at once.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BackendError, BackendResult};
use crate::types::{Key, Location, MouseButton, Pattern, Region, Scope};

pub trait Screen: Send + Sync {
    /// Bounds of the whole screen
    fn bounds(&self) -> Region;

    /// Locate `pattern` inside `scope`, failing with [`BackendError::NotFound`]
    fn find(&self, scope: &Scope, pattern: &Pattern, timeout: Duration) -> BackendResult<Region>;

    /// Like [`Screen::find`] but reports absence as `None`
    fn exists(
        &self,
        scope: &Scope,
        pattern: &Pattern,
        timeout: Duration,
    ) -> BackendResult<Option<Region>> {
        match self.find(scope, pattern, timeout) {
            Ok(region) => Ok(Some(region)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Block until `pattern` shows up inside `scope`
    fn wait(&self, scope: &Scope, pattern: &Pattern, timeout: Duration) -> BackendResult<Region> {
        self.find(scope, pattern, timeout)
    }

    /// Block until `pattern` is gone; `false` when it is still visible at the deadline
    fn wait_vanish(&self, scope: &Scope, pattern: &Pattern, timeout: Duration) -> BackendResult<bool>;

    /// Find `pattern` and click its click location
    fn click(&self, scope: &Scope, pattern: &Pattern, timeout: Duration) -> BackendResult<Region> {
        let region = self.find(scope, pattern, timeout)?;
        self.mouse_move(region.click_location())?;
        self.mouse_down(MouseButton::Left)?;
        self.mouse_up(MouseButton::Left)?;
        Ok(region)
    }

    /// Grab the pixels of `region` into an image file usable as a pattern
    fn capture(&self, region: &Region) -> BackendResult<PathBuf>;

    /// Recognise the text shown inside `region`
    fn read_text(&self, _region: &Region) -> BackendResult<String> {
        Err(BackendError::Unsupported("text recognition"))
    }

    fn mouse_move(&self, to: Location) -> BackendResult<()>;

    fn mouse_down(&self, button: MouseButton) -> BackendResult<()>;

    fn mouse_up(&self, button: MouseButton) -> BackendResult<()>;

    fn type_text(&self, text: &str) -> BackendResult<()>;

    /// Insert text through the clipboard
    fn paste(&self, text: &str) -> BackendResult<()>;

    /// Press a key chord such as `["ctrl", "a"]`
    fn hotkey(&self, keys: &[&str]) -> BackendResult<()>;

    fn press(&self, key: Key) -> BackendResult<()>;

    fn clipboard(&self) -> BackendResult<String>;
}
