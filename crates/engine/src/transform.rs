//! Transform pipeline
//!
//! A [`Transform`] maps each [`TransformContext`] to an ordered operator
//! list. The finder applies the contexts around every backend lookup:
//!
//! ```text
//! scope ──PREVIOUS──▶ search scope ──wait(pattern ◀─CURRENT─ image)──▶ match ──MATCH──▶ accumulate
//!                                                                       │
//!                              next scope ◀──NEXT (seeded from match)───┘
//! accumulated ──bounding box──▶ FINAL ──▶ entity region;  ENTITY ──▶ entity side effects
//! ```
//!
//! A transform is built per baseline image. A sidecar YAML descriptor next
//! to the image overrides the contexts it names:
//!
//! ```yaml
//! current:
//!   - op: similarity
//!     value: 0.95
//! next:
//!   - op: below
//!     value: 40
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, trace, warn};

use sightline_common::{Pattern, Region, Scope};

use crate::baseline::BaselineLocator;
use crate::click::ClickStrategy;
use crate::entity::Entity;
use crate::error::{Error, Result};

/// Padding used by `nearby` when no value is configured
pub const DEFAULT_NEARBY: i32 = 50;

/// Phase of a resolution at which operators run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformContext {
    /// Scope before searching for a file
    Previous,
    /// The pattern itself
    Current,
    /// Scope for the next file of a sequence, seeded from the last match
    Next,
    /// A single match
    Match,
    /// The combined region of a series
    Final,
    /// The owning entity
    Entity,
}

/// Closed operator set; each variant acts on exactly one operand kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operator {
    Above {
        #[serde(default)]
        value: Option<i32>,
    },
    Below {
        #[serde(default)]
        value: Option<i32>,
    },
    Left {
        #[serde(default)]
        value: Option<i32>,
    },
    Right {
        #[serde(default)]
        value: Option<i32>,
    },
    Nearby {
        #[serde(default)]
        value: Option<i32>,
    },
    /// Intersect with an ancestor's region
    LimitByParent {
        #[serde(default)]
        depth: Option<usize>,
    },
    /// Replace with an ancestor's region
    Parent {
        #[serde(default)]
        depth: Option<usize>,
    },
    /// Bounding box of the series matched so far plus the operand
    PreviouslyMatched {
        #[serde(default)]
        include_parent: bool,
    },
    Morph {
        dx1: i32,
        dy1: i32,
        dx2: i32,
        dy2: i32,
    },
    ClickOffset {
        dx: i32,
        dy: i32,
    },
    Screen,
    Similarity {
        value: f64,
    },
    Exact,
    TargetOffset {
        dx: i32,
        dy: i32,
    },
    Resize {
        factor: f64,
    },
    ClickStrategy {
        strategy: ClickStrategy,
    },
}

/// Value flowing through an operator chain
#[derive(Debug, Clone)]
pub enum Operand {
    Scope(Scope),
    Pattern(Pattern),
    Entity(Entity),
}

impl Operand {
    fn kind(&self) -> &'static str {
        match self {
            Operand::Scope(_) => "region",
            Operand::Pattern(_) => "pattern",
            Operand::Entity(_) => "entity",
        }
    }
}

/// What operators may look at besides their operand
#[derive(Debug, Clone, Copy)]
pub struct OperatorEnv<'a> {
    /// Regions of the entity being resolved and its ancestors, nearest first
    pub lineage: &'a [Option<Region>],
    /// Regions matched earlier in the current series
    pub previous: &'a [Region],
    pub screen: Region,
}

impl<'a> OperatorEnv<'a> {
    /// Region of the ancestor `depth` levels up, stopping at the root
    fn ancestor(&self, depth: usize) -> Result<Region> {
        let last = self
            .lineage
            .len()
            .checked_sub(1)
            .ok_or(Error::UnresolvedParentRegion { depth })?;
        let idx = depth.min(last);
        self.lineage[idx].ok_or(Error::UnresolvedParentRegion { depth: idx })
    }
}

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Above { .. } => "above",
            Operator::Below { .. } => "below",
            Operator::Left { .. } => "left",
            Operator::Right { .. } => "right",
            Operator::Nearby { .. } => "nearby",
            Operator::LimitByParent { .. } => "limit_by_parent",
            Operator::Parent { .. } => "parent",
            Operator::PreviouslyMatched { .. } => "previously_matched",
            Operator::Morph { .. } => "morph",
            Operator::ClickOffset { .. } => "click_offset",
            Operator::Screen => "screen",
            Operator::Similarity { .. } => "similarity",
            Operator::Exact => "exact",
            Operator::TargetOffset { .. } => "target_offset",
            Operator::Resize { .. } => "resize",
            Operator::ClickStrategy { .. } => "click_strategy",
        }
    }

    pub fn apply(&self, operand: Operand, env: &OperatorEnv<'_>) -> Result<Operand> {
        match operand {
            Operand::Scope(scope) => self.apply_scope(scope, env).map(Operand::Scope),
            Operand::Pattern(pattern) => self.apply_pattern(pattern).map(Operand::Pattern),
            Operand::Entity(entity) => {
                self.apply_entity(&entity)?;
                Ok(Operand::Entity(entity))
            }
        }
    }

    fn mismatch(&self, operand: &'static str) -> Error {
        Error::OperandMismatch {
            operator: self.name().to_string(),
            operand,
        }
    }

    fn apply_scope(&self, scope: Scope, env: &OperatorEnv<'_>) -> Result<Scope> {
        let region = match scope {
            Scope::Region(r) => r,
            Scope::Screen => {
                return match self {
                    Operator::Screen => Ok(Scope::Screen),
                    Operator::PreviouslyMatched { include_parent } => {
                        previously_matched(env.screen, *include_parent, env).map(Scope::Region)
                    }
                    op if op.is_spatial() => Ok(Scope::Screen),
                    _ => Err(self.mismatch("region")),
                };
            }
        };

        let out = match self {
            Operator::Above { value } => region.above(*value),
            Operator::Below { value } => region.below(*value),
            Operator::Left { value } => region.left(*value),
            Operator::Right { value } => region.right_of(*value),
            Operator::Nearby { value } => region.nearby(value.unwrap_or(DEFAULT_NEARBY)),
            Operator::LimitByParent { depth } => region.limit(&env.ancestor(depth.unwrap_or(1))?)?,
            Operator::Parent { depth } => env.ancestor(depth.unwrap_or(1))?,
            Operator::PreviouslyMatched { include_parent } => {
                previously_matched(region, *include_parent, env)?
            }
            Operator::Morph { dx1, dy1, dx2, dy2 } => region.morph(*dx1, *dy1, *dx2, *dy2),
            Operator::ClickOffset { dx, dy } => region.with_click_offset(*dx, *dy),
            Operator::Screen => return Ok(Scope::Screen),
            _ => return Err(self.mismatch("region")),
        };
        Ok(Scope::Region(out))
    }

    fn apply_pattern(&self, pattern: Pattern) -> Result<Pattern> {
        match self {
            Operator::Similarity { value } => Ok(pattern.similar(*value)),
            Operator::Exact => Ok(pattern.exact()),
            Operator::TargetOffset { dx, dy } => Ok(pattern.target_offset(*dx, *dy)),
            Operator::Resize { factor } => Ok(pattern.resize(*factor)),
            _ => Err(self.mismatch("pattern")),
        }
    }

    fn apply_entity(&self, entity: &Entity) -> Result<()> {
        match self {
            Operator::ClickStrategy { strategy } => {
                entity.set_click_strategy(*strategy);
                Ok(())
            }
            _ => Err(self.mismatch("entity")),
        }
    }

    fn is_spatial(&self) -> bool {
        matches!(
            self,
            Operator::Above { .. }
                | Operator::Below { .. }
                | Operator::Left { .. }
                | Operator::Right { .. }
                | Operator::Nearby { .. }
                | Operator::LimitByParent { .. }
                | Operator::Parent { .. }
                | Operator::Morph { .. }
                | Operator::ClickOffset { .. }
        )
    }
}

fn previously_matched(operand: Region, include_parent: bool, env: &OperatorEnv<'_>) -> Result<Region> {
    let mut regions: Vec<Region> = env.previous.to_vec();
    if include_parent {
        if let Some(parent) = env.lineage.get(1).copied().flatten() {
            regions.push(parent);
        }
    }
    if regions.is_empty() {
        return Err(Error::NoPreviousMatches);
    }
    regions.push(operand);
    Ok(Region::bounding(&regions)?)
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Context-keyed operator lists for one baseline image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Transform {
    pub previous: Vec<Operator>,
    pub current: Vec<Operator>,
    pub next: Vec<Operator>,
    #[serde(rename = "match")]
    pub matched: Vec<Operator>,
    #[serde(rename = "final")]
    pub finish: Vec<Operator>,
    pub entity: Vec<Operator>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            previous: vec![Operator::Nearby { value: Some(10) }],
            ..Self::empty()
        }
    }
}

impl Transform {
    /// A transform with no operators in any context
    pub fn empty() -> Self {
        Self {
            previous: Vec::new(),
            current: Vec::new(),
            next: Vec::new(),
            matched: Vec::new(),
            finish: Vec::new(),
            entity: Vec::new(),
        }
    }

    pub fn with(mut self, context: TransformContext, operators: Vec<Operator>) -> Self {
        *self.operators_mut(context) = operators;
        self
    }

    pub fn operators(&self, context: TransformContext) -> &[Operator] {
        match context {
            TransformContext::Previous => &self.previous,
            TransformContext::Current => &self.current,
            TransformContext::Next => &self.next,
            TransformContext::Match => &self.matched,
            TransformContext::Final => &self.finish,
            TransformContext::Entity => &self.entity,
        }
    }

    fn operators_mut(&mut self, context: TransformContext) -> &mut Vec<Operator> {
        match context {
            TransformContext::Previous => &mut self.previous,
            TransformContext::Current => &mut self.current,
            TransformContext::Next => &mut self.next,
            TransformContext::Match => &mut self.matched,
            TransformContext::Final => &mut self.finish,
            TransformContext::Entity => &mut self.entity,
        }
    }

    /// Parse a descriptor file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Transform for `image`: its sidecar descriptor when present and well
    /// formed, the default transform otherwise
    pub fn for_image(image: &Path, locator: &BaselineLocator) -> Self {
        let descriptor = locator.descriptor_for(image);
        if !descriptor.is_file() {
            return Self::default();
        }
        match Self::load(&descriptor) {
            Ok(transform) => {
                debug!("Loaded transform descriptor {}", descriptor.display());
                transform
            }
            Err(e) => {
                warn!(
                    "Ignoring malformed transform descriptor {}: {}",
                    descriptor.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Run the operators registered for `context`.
    ///
    /// With no operators the operand comes back untouched and `replacement`
    /// is ignored; otherwise `replacement` (when given) seeds the chain.
    pub fn apply(
        &self,
        operand: Operand,
        context: TransformContext,
        replacement: Option<Operand>,
        env: &OperatorEnv<'_>,
    ) -> Result<Operand> {
        let operators = self.operators(context);
        if operators.is_empty() {
            return Ok(operand);
        }

        let mut value = replacement.unwrap_or(operand);
        for op in operators {
            trace!("Applying {} in {:?}", op, context);
            value = op.apply(value, env)?;
        }
        Ok(value)
    }

    pub fn apply_scope(
        &self,
        scope: Scope,
        context: TransformContext,
        replacement: Option<Scope>,
        env: &OperatorEnv<'_>,
    ) -> Result<Scope> {
        match self.apply(Operand::Scope(scope), context, replacement.map(Operand::Scope), env)? {
            Operand::Scope(scope) => Ok(scope),
            other => Err(Error::OperandMismatch {
                operator: format!("{context:?}"),
                operand: other.kind(),
            }),
        }
    }

    pub fn apply_pattern(
        &self,
        pattern: Pattern,
        context: TransformContext,
        env: &OperatorEnv<'_>,
    ) -> Result<Pattern> {
        match self.apply(Operand::Pattern(pattern), context, None, env)? {
            Operand::Pattern(pattern) => Ok(pattern),
            other => Err(Error::OperandMismatch {
                operator: format!("{context:?}"),
                operand: other.kind(),
            }),
        }
    }

    pub fn apply_entity(&self, entity: &Entity, env: &OperatorEnv<'_>) -> Result<()> {
        self.apply(Operand::Entity(entity.clone()), TransformContext::Entity, None, env)
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SCREEN: Region = Region {
        x: 0,
        y: 0,
        w: 1920,
        h: 1080,
        click_offset: sightline_common::Location { x: 0, y: 0 },
    };

    fn env<'a>(lineage: &'a [Option<Region>], previous: &'a [Region]) -> OperatorEnv<'a> {
        OperatorEnv {
            lineage,
            previous,
            screen: SCREEN,
        }
    }

    fn scope(x: i32, y: i32, w: i32, h: i32) -> Scope {
        Scope::Region(Region::new(x, y, w, h))
    }

    #[test]
    fn test_override_only_used_when_context_has_operators() {
        let t = Transform::empty().with(TransformContext::Next, vec![Operator::Above { value: Some(50) }]);
        let e = env(&[], &[]);
        let original = scope(0, 0, 10, 10);
        let seed = Some(scope(500, 500, 100, 100));

        let next = t.apply_scope(original, TransformContext::Next, seed, &e).unwrap();
        assert_eq!(next, scope(500, 450, 100, 50));

        for ctx in [TransformContext::Previous, TransformContext::Match, TransformContext::Final] {
            assert_eq!(t.apply_scope(original, ctx, seed, &e).unwrap(), original);
        }
    }

    #[test]
    fn test_default_pads_previous_by_ten() {
        let t = Transform::default();
        let out = t
            .apply_scope(scope(100, 100, 10, 10), TransformContext::Previous, None, &env(&[], &[]))
            .unwrap();
        assert_eq!(out, scope(90, 90, 30, 30));
    }

    #[test]
    fn test_operators_chain_in_order() {
        let t = Transform::empty().with(
            TransformContext::Match,
            vec![
                Operator::Morph { dx1: 5, dy1: 5, dx2: 0, dy2: 0 },
                Operator::ClickOffset { dx: 10, dy: 10 },
            ],
        );
        let out = t
            .apply_scope(scope(100, 100, 100, 100), TransformContext::Match, None, &env(&[], &[]))
            .unwrap();
        let region = out.region().unwrap();
        assert_eq!((region.x, region.y, region.w, region.h), (105, 105, 95, 95));
        assert_eq!(region.click_location(), region.center().offset(10, 10));
    }

    #[test]
    fn test_spatial_operators_leave_screen_alone() {
        let t = Transform::empty().with(
            TransformContext::Previous,
            vec![Operator::Nearby { value: None }, Operator::Above { value: Some(5) }],
        );
        let out = t
            .apply_scope(Scope::Screen, TransformContext::Previous, None, &env(&[], &[]))
            .unwrap();
        assert_eq!(out, Scope::Screen);
    }

    #[test]
    fn test_similarity_on_region_is_rejected() {
        let t = Transform::empty().with(TransformContext::Previous, vec![Operator::Similarity { value: 0.9 }]);
        let err = t
            .apply_scope(scope(0, 0, 1, 1), TransformContext::Previous, None, &env(&[], &[]))
            .unwrap_err();
        assert!(matches!(err, Error::OperandMismatch { .. }));
    }

    #[test]
    fn test_pattern_operators() {
        let t = Transform::empty().with(
            TransformContext::Current,
            vec![
                Operator::Similarity { value: 0.8 },
                Operator::TargetOffset { dx: 4, dy: 0 },
                Operator::Resize { factor: 2.0 },
            ],
        );
        let p = t
            .apply_pattern(Pattern::new("x.png"), TransformContext::Current, &env(&[], &[]))
            .unwrap();
        assert_eq!(p, Pattern::new("x.png").similar(0.8).target_offset(4, 0).resize(2.0));
    }

    #[test]
    fn test_parent_walk_stops_at_root() {
        let lineage = [None, Some(Region::new(10, 10, 300, 300)), Some(Region::new(0, 0, 800, 600))];
        let e = env(&lineage, &[]);
        let up = |depth| {
            Operator::Parent { depth: Some(depth) }
                .apply_scope(Region::new(1, 1, 1, 1).into(), &e)
                .unwrap()
        };
        assert_eq!(up(1), scope(10, 10, 300, 300));
        assert_eq!(up(2), scope(0, 0, 800, 600));
        assert_eq!(up(7), scope(0, 0, 800, 600));

        let limited = Operator::LimitByParent { depth: None }
            .apply_scope(scope(0, 0, 100, 100), &e)
            .unwrap();
        assert_eq!(limited, scope(10, 10, 90, 90));

        let unresolved = Operator::Parent { depth: Some(0) }.apply_scope(scope(0, 0, 1, 1), &e);
        assert!(matches!(unresolved, Err(Error::UnresolvedParentRegion { depth: 0 })));
    }

    #[test]
    fn test_previously_matched_unions_series_so_far() {
        let previous = [Region::new(50, 50, 50, 50), Region::new(200, 50, 50, 50)];
        let out = Operator::PreviouslyMatched { include_parent: false }
            .apply_scope(scope(200, 200, 50, 50), &env(&[], &previous))
            .unwrap();
        assert_eq!(out, scope(50, 50, 200, 200));

        let none = Operator::PreviouslyMatched { include_parent: true }.apply_scope(scope(0, 0, 1, 1), &env(&[], &[]));
        assert!(matches!(none, Err(Error::NoPreviousMatches)));
    }

    #[test]
    fn test_descriptor_overrides_named_contexts_only() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("Window.Save.png");
        std::fs::write(
            dir.path().join("Window.Save.yaml"),
            "current:\n  - op: similarity\n    value: 0.95\nnext:\n  - op: below\n    value: 40\n",
        )
        .unwrap();
        let locator = BaselineLocator::new(vec![dir.path().to_path_buf()], ".png");

        let t = Transform::for_image(&image, &locator);
        assert_eq!(t.current, vec![Operator::Similarity { value: 0.95 }]);
        assert_eq!(t.next, vec![Operator::Below { value: Some(40) }]);
        assert_eq!(t.previous, Transform::default().previous);
    }

    #[test]
    fn test_malformed_descriptor_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("Window.Save.png");
        std::fs::write(dir.path().join("Window.Save.yaml"), "current:\n  - op: teleport\n").unwrap();
        let locator = BaselineLocator::new(vec![dir.path().to_path_buf()], ".png");

        assert_eq!(Transform::for_image(&image, &locator), Transform::default());
        assert_eq!(
            Transform::for_image(&dir.path().join("Other.png"), &locator),
            Transform::default()
        );
    }
}
