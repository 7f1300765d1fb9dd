//! Scripted in-memory backend
//!
//! Images are "placed" on a virtual screen by file name. Lookups succeed
//! when a placement lies inside the searched scope; every lookup and input
//! event is recorded so callers can assert on what the engine did. A single
//! focused text field and a clipboard are modelled for typing flows.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::trace;

use crate::backend::Screen;
use crate::error::{BackendError, BackendResult};
use crate::types::{Key, Location, MouseButton, Pattern, Region, Scope};

/// Recorded input event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Move(Location),
    Down(MouseButton),
    Up(MouseButton),
    Type(String),
    Paste(String),
    Hotkey(Vec<String>),
    Press(Key),
}

/// Recorded pattern lookup
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub image: String,
    pub scope: Scope,
    pub similarity: Option<f64>,
    pub timeout: Duration,
    pub found: bool,
}

#[derive(Debug, Clone)]
struct Placement {
    region: Region,
    /// Remaining successful lookups; `None` means forever
    sightings: Option<usize>,
}

#[derive(Debug, Default)]
struct MemoryState {
    placements: HashMap<String, Vec<Placement>>,
    texts: Vec<(Region, String)>,
    lookups: Vec<Lookup>,
    events: Vec<InputEvent>,
    captures: Vec<String>,
    captures_vanish_on_press: bool,
    pending_changes: usize,
    field: String,
    selected: bool,
    clipboard: String,
}

/// In-memory [`Screen`] implementation
pub struct MemoryScreen {
    bounds: Region,
    state: Mutex<MemoryState>,
}

impl MemoryScreen {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            bounds: Region::new(0, 0, width, height),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Show `image` at `region` until removed
    pub fn place(&self, image: &str, region: Region) {
        self.insert(image, region, None);
    }

    /// Show `image` at `region` for the next `sightings` successful lookups
    pub fn place_for(&self, image: &str, region: Region, sightings: usize) {
        self.insert(image, region, Some(sightings));
    }

    pub fn remove(&self, image: &str) {
        self.state.lock().placements.remove(image);
    }

    /// Make `read_text` report `text` for any region covering `region`
    pub fn show_text(&self, region: Region, text: &str) {
        self.state.lock().texts.push((region, text.to_string()));
    }

    /// Captured images disappear as soon as a mouse button goes down
    pub fn captures_vanish_on_press(&self, enabled: bool) {
        self.state.lock().captures_vanish_on_press = enabled;
    }

    /// The next `count` checks for a captured image report it as changed
    pub fn schedule_changes(&self, count: usize) {
        self.state.lock().pending_changes = count;
    }

    pub fn lookups(&self) -> Vec<Lookup> {
        self.state.lock().lookups.clone()
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.state.lock().events.clone()
    }

    pub fn clear_history(&self) {
        let mut state = self.state.lock();
        state.lookups.clear();
        state.events.clear();
    }

    /// Current contents of the modelled text field
    pub fn field_text(&self) -> String {
        self.state.lock().field.clone()
    }

    pub fn set_field_text(&self, text: &str) {
        self.state.lock().field = text.to_string();
    }

    fn insert(&self, image: &str, region: Region, sightings: Option<usize>) {
        self.state
            .lock()
            .placements
            .entry(image.to_string())
            .or_default()
            .push(Placement { region, sightings });
    }

    fn record(&self, event: InputEvent) {
        trace!("memory screen input {:?}", event);
        self.state.lock().events.push(event);
    }

    fn lookup(&self, scope: &Scope, pattern: &Pattern, timeout: Duration, consume: bool) -> Option<Region> {
        let name = pattern.file_name();
        let area = scope.resolve(&self.bounds);
        let mut state = self.state.lock();

        let changed = state.captures.contains(&name) && state.pending_changes > 0;
        if changed {
            state.pending_changes -= 1;
        }

        let mut found = None;
        if !changed {
            if let Some(list) = state.placements.get_mut(&name) {
                if let Some(idx) = list.iter().position(|p| area.contains(&p.region)) {
                    let placement = &mut list[idx];
                    found = Some(placement.region);
                    if consume {
                        if let Some(left) = placement.sightings.as_mut() {
                            *left = left.saturating_sub(1);
                            if *left == 0 {
                                list.remove(idx);
                            }
                        }
                    }
                }
            }
        }

        state.lookups.push(Lookup {
            image: name,
            scope: *scope,
            similarity: pattern.similarity,
            timeout,
            found: found.is_some(),
        });

        found.map(|r| r.with_click_offset(pattern.target_offset.x, pattern.target_offset.y))
    }
}

impl Screen for MemoryScreen {
    fn bounds(&self) -> Region {
        self.bounds
    }

    fn find(&self, scope: &Scope, pattern: &Pattern, timeout: Duration) -> BackendResult<Region> {
        self.lookup(scope, pattern, timeout, true)
            .ok_or_else(|| BackendError::NotFound {
                pattern: pattern.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    fn wait_vanish(&self, scope: &Scope, pattern: &Pattern, timeout: Duration) -> BackendResult<bool> {
        Ok(self.lookup(scope, pattern, timeout, false).is_none())
    }

    fn capture(&self, region: &Region) -> BackendResult<PathBuf> {
        let mut state = self.state.lock();
        let name = format!("capture-{}.png", state.captures.len());
        state.captures.push(name.clone());
        state.placements.insert(
            name.clone(),
            vec![Placement {
                region: *region,
                sightings: None,
            }],
        );
        Ok(PathBuf::from(name))
    }

    fn read_text(&self, region: &Region) -> BackendResult<String> {
        let state = self.state.lock();
        state
            .texts
            .iter()
            .find(|(r, _)| region.contains(r))
            .map(|(_, text)| text.clone())
            .ok_or(BackendError::Failed(format!("no text inside {region}")))
    }

    fn mouse_move(&self, to: Location) -> BackendResult<()> {
        self.record(InputEvent::Move(to));
        Ok(())
    }

    fn mouse_down(&self, button: MouseButton) -> BackendResult<()> {
        self.record(InputEvent::Down(button));
        let mut state = self.state.lock();
        if state.captures_vanish_on_press {
            let captures = state.captures.clone();
            for name in captures {
                state.placements.remove(&name);
            }
        }
        Ok(())
    }

    fn mouse_up(&self, button: MouseButton) -> BackendResult<()> {
        self.record(InputEvent::Up(button));
        Ok(())
    }

    fn type_text(&self, text: &str) -> BackendResult<()> {
        self.record(InputEvent::Type(text.to_string()));
        self.insert_text(text);
        Ok(())
    }

    fn paste(&self, text: &str) -> BackendResult<()> {
        self.record(InputEvent::Paste(text.to_string()));
        self.insert_text(text);
        Ok(())
    }

    fn hotkey(&self, keys: &[&str]) -> BackendResult<()> {
        self.record(InputEvent::Hotkey(keys.iter().map(|k| k.to_string()).collect()));
        let mut state = self.state.lock();
        match keys.last().copied() {
            Some("a") => state.selected = true,
            Some("c") => state.clipboard = state.field.clone(),
            _ => {}
        }
        Ok(())
    }

    fn press(&self, key: Key) -> BackendResult<()> {
        self.record(InputEvent::Press(key));
        let mut state = self.state.lock();
        if matches!(key, Key::Backspace | Key::Delete) {
            if state.selected {
                state.field.clear();
                state.selected = false;
            } else {
                state.field.pop();
            }
        }
        Ok(())
    }

    fn clipboard(&self) -> BackendResult<String> {
        Ok(self.state.lock().clipboard.clone())
    }
}

impl MemoryScreen {
    fn insert_text(&self, text: &str) {
        let mut state = self.state.lock();
        if state.selected {
            state.field.clear();
            state.selected = false;
        }
        state.field.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_millis(10);

    #[test]
    fn test_lookup_respects_scope() {
        let screen = MemoryScreen::new(800, 600);
        screen.place("ok.png", Region::new(100, 100, 20, 10));

        let pattern = Pattern::new("baselines/ok.png");
        assert!(screen.find(&Scope::Screen, &pattern, WAIT).is_ok());
        let outside = Scope::Region(Region::new(300, 300, 50, 50));
        assert!(screen.find(&outside, &pattern, WAIT).unwrap_err().is_not_found());
    }

    #[test]
    fn test_limited_sightings_expire() {
        let screen = MemoryScreen::new(800, 600);
        screen.place_for("spinner.png", Region::new(0, 0, 10, 10), 2);
        let pattern = Pattern::new("spinner.png");

        assert!(screen.find(&Scope::Screen, &pattern, WAIT).is_ok());
        assert!(screen.wait_vanish(&Scope::Screen, &pattern, WAIT).map(|v| !v).unwrap());
        assert!(screen.find(&Scope::Screen, &pattern, WAIT).is_ok());
        assert!(screen.find(&Scope::Screen, &pattern, WAIT).is_err());
        assert_eq!(screen.lookups().len(), 4);
    }

    #[test]
    fn test_text_field_model() {
        let screen = MemoryScreen::new(800, 600);
        screen.set_field_text("old");
        screen.hotkey(&["ctrl", "a"]).unwrap();
        screen.press(Key::Backspace).unwrap();
        screen.paste("new value").unwrap();
        screen.hotkey(&["ctrl", "a"]).unwrap();
        screen.hotkey(&["ctrl", "c"]).unwrap();

        assert_eq!(screen.field_text(), "new value");
        assert_eq!(screen.clipboard().unwrap(), "new value");
    }

    #[test]
    fn test_capture_vanishes_on_press() {
        let screen = MemoryScreen::new(800, 600);
        screen.captures_vanish_on_press(true);
        let shot = screen.capture(&Region::new(5, 5, 10, 10)).unwrap();
        let pattern = Pattern::new(shot).exact();

        assert!(!screen.wait_vanish(&Scope::Screen, &pattern, WAIT).unwrap());
        screen.mouse_down(MouseButton::Left).unwrap();
        assert!(screen.wait_vanish(&Scope::Screen, &pattern, WAIT).unwrap());
    }
}
