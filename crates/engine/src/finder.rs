//! Region finder
//!
//! Resolves an entity to a screen region in two phases:
//!
//! 1. discovery: search the baseline library for the entity's stems and
//!    layouts (see [`crate::baseline`]), cached on the entity for stateless
//!    searches;
//! 2. matching: repeated attempts, each walking the series in order until
//!    one series matches every file of its sequence, bounded by a timeout.
//!
//! Per-file transforms shape the search around each backend lookup (see
//! [`crate::transform`]).

use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use sightline_common::{Pattern, Region, Scope};

use crate::baseline::{BaselineSet, StemCandidate};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::transform::{OperatorEnv, Transform, TransformContext};

pub struct Finder<'a> {
    entity: &'a Entity,
    state: Option<String>,
}

impl<'a> Finder<'a> {
    pub fn new(entity: &'a Entity) -> Self {
        Self {
            entity,
            state: None,
        }
    }

    /// Finder for the entity's baselines in a visual state such as `disabled`
    pub fn with_state(entity: &'a Entity, state: &str) -> Self {
        Self {
            entity,
            state: Some(state.to_string()),
        }
    }

    /// Locate the entity's baseline set
    pub fn baselines(&self) -> Result<BaselineSet> {
        let session = self.entity.session();
        if self.state.is_none() {
            if let Some(cached) = self.entity.baselines() {
                return Ok(cached);
            }
        }

        let names = self.entity.names();
        let candidates = StemCandidate::ordered(&names);
        let set = session
            .locator()
            .discover(&candidates, self.state.as_deref())
            .ok_or_else(|| Error::ImageMissing {
                entity: self.entity.to_string(),
                stem: candidates
                    .last()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| names.class_name.clone()),
                state: self.state.clone(),
            })?;

        if self.state.is_none() {
            session.with_node_mut(self.entity.id(), |n| n.baselines = Some(set.clone()));
        }
        Ok(set)
    }

    /// Search `scope` until a series matches or `timeout` runs out.
    ///
    /// At least one attempt is always made. A missing baseline fails
    /// straight away; failed attempts back off briefly and retry. Backend
    /// waits never run past the deadline.
    pub fn find(&self, scope: Scope, timeout: Duration) -> Result<Region> {
        let set = self.baselines()?;
        let backoff = self.entity.session().config().timing.retry_backoff();
        let start = Instant::now();
        let deadline = start + timeout;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match self.perform_find(&set, scope, attempts, deadline) {
                Ok(region) => {
                    debug!(
                        "{} found at {} after {} attempt(s) in {}ms",
                        self.entity,
                        region,
                        attempts,
                        start.elapsed().as_millis()
                    );
                    return Ok(region);
                }
                Err(Error::ImageSearchExhausted { .. }) => {
                    let remaining = timeout.saturating_sub(start.elapsed());
                    if remaining.is_zero() {
                        break;
                    }
                    thread::sleep(backoff.min(remaining));
                    if start.elapsed() >= timeout {
                        break;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::FindExhausted {
            entity: self.entity.to_string(),
            timeout,
            elapsed: start.elapsed(),
            attempts,
        })
    }

    /// One attempt over every series; the first complete series wins.
    ///
    /// The attempt gives up on the remaining series once a miss lands past
    /// `deadline`.
    fn perform_find(&self, set: &BaselineSet, scope: Scope, attempt: u32, deadline: Instant) -> Result<Region> {
        let session = self.entity.session();
        let screen = session.screen();
        let locator = session.locator();
        let bounds = screen.bounds();
        let wait = session.config().timing.wait_timeout();
        let lineage = self.entity.lineage();

        'series: for &series in &set.series_range {
            let files = set.image_names(locator, series);
            let mut matched: Vec<Region> = Vec::with_capacity(files.len());
            let mut next = scope;
            let mut last = None;

            for file in &files {
                let transform = Transform::for_image(file, locator);
                let env = OperatorEnv {
                    lineage: &lineage,
                    previous: &matched,
                    screen: bounds,
                };

                next = transform.apply_scope(next, TransformContext::Previous, None, &env)?;
                let pattern = transform.apply_pattern(Pattern::new(file), TransformContext::Current, &env)?;
                let budget = wait.min(deadline.saturating_duration_since(Instant::now()));
                let found = match screen.wait(&next, &pattern, budget) {
                    Ok(region) => region,
                    Err(e) if e.is_not_found() => {
                        trace!(
                            "{} attempt {}: {} not in {}, abandoning series {}",
                            self.entity,
                            attempt,
                            pattern,
                            next,
                            series
                        );
                        if Instant::now() >= deadline {
                            break 'series;
                        }
                        continue 'series;
                    }
                    Err(e) => return Err(e.into()),
                };
                let found = transform
                    .apply_scope(Scope::Region(found), TransformContext::Match, None, &env)?
                    .resolve(&bounds);

                matched.push(found);
                let env = OperatorEnv {
                    lineage: &lineage,
                    previous: &matched,
                    screen: bounds,
                };
                next = transform.apply_scope(next, TransformContext::Next, Some(Scope::Region(found)), &env)?;
                last = Some(transform);
            }

            let Some(transform) = last else {
                continue;
            };
            let env = OperatorEnv {
                lineage: &lineage,
                previous: &matched,
                screen: bounds,
            };
            let combined = Region::bounding(&matched)?;
            let region = transform
                .apply_scope(Scope::Region(combined), TransformContext::Final, None, &env)?
                .resolve(&bounds);
            transform.apply_entity(self.entity, &env)?;

            if self.state.is_none() {
                session.with_node_mut(self.entity.id(), |n| n.last_series = Some(series));
            }
            trace!(
                "{} matched series {} of {} ({} file(s))",
                self.entity,
                series,
                set.collection,
                matched.len()
            );
            return Ok(region);
        }

        Err(Error::ImageSearchExhausted {
            entity: self.entity.to_string(),
            attempt,
        })
    }
}
