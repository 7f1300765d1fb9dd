//! Drawing on canvas widgets
//!
//! A [`Canvas`] drives an entity with the canvas capability. Points are
//! page coordinates relative to the canvas's top left corner. The page may
//! be taller than the visible area: before drawing, the canvas scrolls with
//! its scroll bar buttons and extends the page with its `EXTEND_PAGE`
//! button until every point of the stroke is on screen.
//!
//! How `goto` turns points into strokes is the [`DrawingStrategy`].

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use sightline_common::{Location, MouseButton, Region};

use crate::entity::{Capability, Entity};
use crate::error::{Error, Result};

/// Pixels the page moves per scroll button click
pub const SCROLL_STEP: i32 = 10;

/// Pixels added to the page per `EXTEND_PAGE` click
pub const PAGE_EXTENSION: i32 = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawingStrategy {
    /// every `goto` while on draws a line from the previous point
    #[default]
    Segment,
    /// points are queued while on and drawn as one stroke by `off`
    Continuous,
    /// points only scroll the page into place; nothing is drawn
    Practice,
}

pub struct Canvas {
    entity: Entity,
    offset_y: i32,
    page_height: i32,
    strategy: DrawingStrategy,
    enabled: bool,
    last: Option<Location>,
    queue: Vec<Location>,
    extent: Option<Region>,
}

impl Canvas {
    /// Validate `entity` and start with the page scrolled to the top
    pub fn new(entity: &Entity) -> Result<Self> {
        entity.require(Capability::Canvas, "drawing")?;
        let region = entity.validate()?;
        let strategy = entity.session().config().input.default_drawing_strategy;
        debug!("Drawing on {} ({}px page) with {:?}", entity, region.h, strategy);

        Ok(Self {
            entity: entity.clone(),
            offset_y: 0,
            page_height: region.h,
            strategy,
            enabled: false,
            last: None,
            queue: Vec::new(),
            extent: None,
        })
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Page row shown at the top of the visible area
    pub fn offset_y(&self) -> i32 {
        self.offset_y
    }

    pub fn page_height(&self) -> i32 {
        self.page_height
    }

    pub fn strategy(&self) -> DrawingStrategy {
        self.strategy
    }

    /// Switch strategies, forgetting whatever the previous one had collected
    pub fn set_strategy(&mut self, strategy: DrawingStrategy) {
        self.strategy = strategy;
        self.enabled = false;
        self.last = None;
        self.queue.clear();
        self.extent = None;
    }

    pub fn on(&mut self) {
        self.enabled = true;
        self.queue.clear();
        self.extent = None;
    }

    /// Stop drawing; continuous strokes are drawn now
    pub fn off(&mut self) -> Result<()> {
        self.enabled = false;
        let extent = self.extent.take();
        let queue = std::mem::take(&mut self.queue);

        match self.strategy {
            DrawingStrategy::Segment => Ok(()),
            DrawingStrategy::Continuous => {
                let Some(extent) = extent else {
                    return Ok(());
                };
                self.center_region(extent)?;
                self.stroke(&queue)
            }
            DrawingStrategy::Practice => match extent {
                Some(extent) => self.center_region(extent),
                None => Ok(()),
            },
        }
    }

    /// Move the pen to `(x, y)`, drawing according to the strategy
    pub fn goto(&mut self, x: i32, y: i32) -> Result<()> {
        let point = Location::new(x, y);
        match self.strategy {
            DrawingStrategy::Segment => {
                if let (true, Some(last)) = (self.enabled, self.last) {
                    self.center(last)?;
                    self.center(point)?;
                    self.stroke(&[last, point])?;
                }
                self.last = Some(point);
            }
            DrawingStrategy::Continuous => {
                if self.enabled {
                    self.queue.push(point);
                    self.grow_extent(point);
                }
            }
            DrawingStrategy::Practice => self.grow_extent(point),
        }
        Ok(())
    }

    /// Draw from `from` to `to`; the line must fit the canvas width and
    /// span no more than one visible height
    pub fn line(&mut self, from: Location, to: Location) -> Result<()> {
        let region = self.entity.validate()?;
        for point in [from, to] {
            if point.x < 0 || point.x > region.w {
                return Err(self.off_canvas(point));
            }
        }
        if (from.y - to.y).abs() > region.h {
            return Err(self.off_canvas(to));
        }

        self.center(from)?;
        self.center(to)?;
        self.goto(from.x, from.y)?;
        self.goto(to.x, to.y)
    }

    /// Move the pointer to a page point inside the visible area
    pub fn mouse_move(&self, point: Location) -> Result<()> {
        let region = self.entity.validate()?;
        let row = point.y - self.offset_y;
        if point.x < 0 || point.x > region.w || row < 0 || row > region.h {
            return Err(self.off_canvas(point));
        }
        self.entity
            .session()
            .screen()
            .mouse_move(Location::new(region.x + point.x, region.y + row))?;
        Ok(())
    }

    /// Scroll, extending the page when needed, until `point` is visible
    pub fn center(&mut self, point: Location) -> Result<()> {
        let visible = self.entity.validate()?.h;

        if point.y < self.offset_y {
            for _ in 0..steps(self.offset_y - point.y, SCROLL_STEP) {
                self.offset_y -= SCROLL_STEP;
                self.scroll_button("UP")?;
            }
        }

        if point.y > self.offset_y + visible {
            if point.y > self.page_height {
                let scroll_bar = self.entity.member("SCROLL_BAR")?;
                scroll_bar.goto_bottom()?;
                for _ in 0..steps(point.y - self.page_height, PAGE_EXTENSION) {
                    self.entity.member("EXTEND_PAGE")?.click()?;
                    self.page_height += PAGE_EXTENSION;
                }
                debug!("Extended {} to {}px", self.entity, self.page_height);
                scroll_bar.goto_top()?;
                self.offset_y = 0;
            }

            for _ in 0..steps(point.y - (self.offset_y + visible), SCROLL_STEP) {
                self.offset_y += SCROLL_STEP;
                self.scroll_button("DOWN")?;
            }
        }
        trace!("{} scrolled to {}", self.entity, self.offset_y);
        Ok(())
    }

    /// Bring both corners of `region` into view
    pub fn center_region(&mut self, region: Region) -> Result<()> {
        self.center(Location::new(region.x, region.y))?;
        self.center(Location::new(region.right(), region.bottom()))
    }

    fn scroll_button(&self, button: &str) -> Result<()> {
        self.entity.member("SCROLL_BAR")?.member(button)?.click()?;
        Ok(())
    }

    fn grow_extent(&mut self, point: Location) {
        self.extent = Some(match self.extent {
            Some(extent) => extent.add_location(point),
            None => Region::new(point.x, point.y, 0, 0),
        });
    }

    /// Press, visit every point, release; the button is released even when
    /// a point is off the canvas
    fn stroke(&self, points: &[Location]) -> Result<()> {
        let Some((first, rest)) = points.split_first() else {
            return Ok(());
        };
        let screen = self.entity.session().screen();
        self.mouse_move(*first)?;
        screen.mouse_down(MouseButton::Left)?;
        let moved = rest.iter().try_for_each(|point| self.mouse_move(*point));
        screen.mouse_up(MouseButton::Left)?;
        moved?;
        trace!("Drew {} point stroke on {}", points.len(), self.entity);
        Ok(())
    }

    fn off_canvas(&self, point: Location) -> Error {
        Error::OffCanvas {
            entity: self.entity.to_string(),
            x: point.x,
            y: point.y,
        }
    }
}

impl Entity {
    /// Start drawing on this entity
    pub fn canvas(&self) -> Result<Canvas> {
        Canvas::new(self)
    }
}

/// Clicks needed to cover `distance` pixels at `step` pixels per click
fn steps(distance: i32, step: i32) -> i32 {
    (distance + step - 1) / step
}
