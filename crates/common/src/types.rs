//! Core geometry types for Sightline

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::GeometryError;

/// A point on the screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
}

impl Location {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned screen rectangle.
///
/// The click offset travels with the rectangle: it shifts the location
/// returned by [`Region::click_location`] away from the centre without
/// changing the geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    #[serde(default)]
    pub click_offset: Location,
}

impl Region {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            click_offset: Location::default(),
        }
    }

    /// Smallest region enclosing every region in `regions`
    pub fn bounding<'a, I>(regions: I) -> Result<Region, GeometryError>
    where
        I: IntoIterator<Item = &'a Region>,
    {
        let mut iter = regions.into_iter();
        let first = *iter.next().ok_or(GeometryError::Empty)?;
        Ok(iter.fold(first, |acc, r| acc.add(r)))
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn top_left(&self) -> Location {
        Location::new(self.x, self.y)
    }

    pub fn center(&self) -> Location {
        Location::new(self.x + self.w / 2, self.y + self.h / 2)
    }

    /// Where a click on this region lands
    pub fn click_location(&self) -> Location {
        self.center()
            .offset(self.click_offset.x, self.click_offset.y)
    }

    pub fn with_click_offset(mut self, dx: i32, dy: i32) -> Self {
        self.click_offset = Location::new(dx, dy);
        self
    }

    /// Bounding-box union
    pub fn add(&self, other: &Region) -> Region {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Region {
            click_offset: self.click_offset,
            ..Region::new(x, y, right - x, bottom - y)
        }
    }

    /// Grow the region until it covers `point`
    pub fn add_location(&self, point: Location) -> Region {
        self.add(&Region::new(point.x, point.y, 0, 0))
    }

    /// Intersection; fails when the two regions do not overlap
    pub fn limit(&self, other: &Region) -> Result<Region, GeometryError> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < x || bottom < y {
            return Err(GeometryError::Disjoint {
                a: self.to_string(),
                b: other.to_string(),
            });
        }
        Ok(Region {
            click_offset: self.click_offset,
            ..Region::new(x, y, right - x, bottom - y)
        })
    }

    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn contains_location(&self, point: Location) -> bool {
        point.x >= self.x && point.y >= self.y && point.x <= self.right() && point.y <= self.bottom()
    }

    /// Pad the region on every side
    pub fn nearby(&self, pad: i32) -> Region {
        Region::new(self.x - pad, self.y - pad, self.w + 2 * pad, self.h + 2 * pad)
    }

    /// Band of `height` pixels directly above; defaults to the region's own height
    pub fn above(&self, height: Option<i32>) -> Region {
        let h = height.unwrap_or(self.h);
        Region::new(self.x, self.y - h, self.w, h)
    }

    pub fn below(&self, height: Option<i32>) -> Region {
        Region::new(self.x, self.bottom(), self.w, height.unwrap_or(self.h))
    }

    pub fn left(&self, width: Option<i32>) -> Region {
        let w = width.unwrap_or(self.w);
        Region::new(self.x - w, self.y, w, self.h)
    }

    pub fn right_of(&self, width: Option<i32>) -> Region {
        Region::new(self.right(), self.y, width.unwrap_or(self.w), self.h)
    }

    /// Move the top-left corner by (dx1, dy1) and the bottom-right corner by (dx2, dy2)
    pub fn morph(&self, dx1: i32, dy1: i32, dx2: i32, dy2: i32) -> Region {
        Region {
            click_offset: self.click_offset,
            ..Region::new(
                self.x + dx1,
                self.y + dy1,
                self.w - dx1 + dx2,
                self.h - dy1 + dy2,
            )
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Region({}, {}, {}, {})", self.x, self.y, self.w, self.h)
    }
}

/// Where a search runs: the whole screen or a bounded region.
///
/// Spatial adjustments never apply to `Screen`; there is nothing to scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Screen,
    Region(Region),
}

impl Scope {
    /// The concrete rectangle this scope covers
    pub fn resolve(&self, screen: &Region) -> Region {
        match self {
            Scope::Screen => *screen,
            Scope::Region(r) => *r,
        }
    }

    pub fn region(&self) -> Option<Region> {
        match self {
            Scope::Screen => None,
            Scope::Region(r) => Some(*r),
        }
    }

    /// Apply a spatial adjustment; the whole screen passes through untouched
    pub fn map<F>(self, f: F) -> Result<Scope, GeometryError>
    where
        F: FnOnce(Region) -> Result<Region, GeometryError>,
    {
        match self {
            Scope::Screen => Ok(Scope::Screen),
            Scope::Region(r) => f(r).map(Scope::Region),
        }
    }
}

impl From<Region> for Scope {
    fn from(region: Region) -> Self {
        Scope::Region(region)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Screen => write!(f, "Screen"),
            Scope::Region(r) => r.fmt(f),
        }
    }
}

/// Search template handed to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub image: PathBuf,
    /// Minimum similarity; `None` leaves the backend default in place
    pub similarity: Option<f64>,
    pub target_offset: Location,
    pub resize: Option<f64>,
}

impl Pattern {
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            similarity: None,
            target_offset: Location::default(),
            resize: None,
        }
    }

    pub fn similar(mut self, threshold: f64) -> Self {
        self.similarity = Some(threshold);
        self
    }

    pub fn exact(self) -> Self {
        self.similar(1.0)
    }

    pub fn target_offset(mut self, dx: i32, dy: i32) -> Self {
        self.target_offset = Location::new(dx, dy);
        self
    }

    pub fn resize(mut self, factor: f64) -> Self {
        self.resize = Some(factor);
        self
    }

    pub fn path(&self) -> &Path {
        &self.image
    }

    /// File name of the template, used by backends as a lookup key
    pub fn file_name(&self) -> String {
        self.image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern(\"{}\")", self.image.display())?;
        if let Some(s) = self.similarity {
            write!(f, ".similar({s:.2})")?;
        }
        if self.target_offset != Location::default() {
            write!(f, ".targetOffset({}, {})", self.target_offset.x, self.target_offset.y)?;
        }
        if let Some(r) = self.resize {
            write!(f, ".resize({r})")?;
        }
        Ok(())
    }
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Non-printable keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_add_is_bounding_union() {
        let r = Region::new(0, 0, 100, 100).add(&Region::new(50, 50, 100, 100));
        assert_eq!(r, Region::new(0, 0, 150, 150));
    }

    #[test]
    fn test_region_limit_intersects() {
        let r = Region::new(50, 50, 400, 400)
            .limit(&Region::new(150, 100, 150, 25))
            .unwrap();
        assert_eq!(r, Region::new(150, 100, 150, 25));
    }

    #[test]
    fn test_region_limit_disjoint_fails() {
        let err = Region::new(0, 0, 10, 10)
            .limit(&Region::new(100, 100, 10, 10))
            .unwrap_err();
        assert!(matches!(err, GeometryError::Disjoint { .. }));
    }

    #[test]
    fn test_bounding_of_three() {
        let regions = [
            Region::new(50, 50, 50, 50),
            Region::new(200, 50, 50, 50),
            Region::new(200, 200, 50, 50),
        ];
        assert_eq!(Region::bounding(&regions).unwrap(), Region::new(50, 50, 200, 200));
        assert_eq!(Region::bounding(&[]), Err(GeometryError::Empty));
    }

    #[test]
    fn test_add_location() {
        let r = Region::new(100, 100, 1, 1).add_location(Location::new(50, 50));
        assert_eq!(r, Region::new(50, 50, 51, 51));
    }

    #[test]
    fn test_click_offset_moves_click_location() {
        let r = Region::new(100, 100, 100, 100).with_click_offset(10, 10);
        assert_eq!(r.click_location(), Location::new(160, 160));
    }

    #[test]
    fn test_screen_scope_ignores_spatial_changes() {
        let scope = Scope::Screen.map(|r| Ok(r.nearby(10))).unwrap();
        assert_eq!(scope, Scope::Screen);
    }

    #[test]
    fn test_pattern_display() {
        let p = Pattern::new("a/b.png").exact().target_offset(3, -2);
        assert_eq!(p.to_string(), "Pattern(\"a/b.png\").similar(1.00).targetOffset(3, -2)");
        assert_eq!(p.file_name(), "b.png");
    }
}
