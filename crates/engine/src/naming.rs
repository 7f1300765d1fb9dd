//! Canonical entity names
//!
//! A canonical name is the path from the application root to an entity:
//! window-like entities are joined with `.` under their class name, named
//! sub-entities are joined with `,` under their lookup name with the first
//! letter lower-cased. `Notebook.FileMenu.SaveDialog,button` is the save
//! dialog's button inside the notebook application.
//!
//! These strings double as baseline file stems, so the rendering rules are
//! load-bearing.

use std::fmt;

/// One node on the path from the root to an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    /// Created through an explicit lookup name
    pub sub_entity: bool,
    /// Counts against the ancestor budget
    pub family: bool,
}

impl Segment {
    pub fn window(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_entity: false,
            family: false,
        }
    }

    pub fn sub(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sub_entity: true,
            family: false,
        }
    }

    pub fn family(mut self, family: bool) -> Self {
        self.family = family;
        self
    }
}

/// Which parts of the path to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameOptions {
    /// Include the outermost (application) segment
    pub root_entity: bool,
    /// How many family ancestors may appear between leaf and root
    pub ancestors: usize,
    /// Include the leaf segment itself
    pub top_level: bool,
}

impl Default for NameOptions {
    fn default() -> Self {
        Self {
            root_entity: true,
            ancestors: 99,
            top_level: true,
        }
    }
}

impl NameOptions {
    pub fn ancestors(mut self, ancestors: usize) -> Self {
        self.ancestors = ancestors;
        self
    }

    pub fn root_entity(mut self, root_entity: bool) -> Self {
        self.root_entity = root_entity;
        self
    }

    pub fn top_level(mut self, top_level: bool) -> Self {
        self.top_level = top_level;
        self
    }
}

/// Path from the root to an entity, stored root first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameChain {
    segments: Vec<Segment>,
}

impl NameChain {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse a rendered full name such as `Notebook.SaveDialog,save`.
    ///
    /// The root segment is treated as a family member (applications are);
    /// other segments are not unless listed in `family`.
    pub fn parse(path: &str, family: &[&str]) -> Option<Self> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut sub = false;

        for ch in path.chars() {
            if ch == '.' || ch == ',' {
                if current.is_empty() {
                    return None;
                }
                segments.push(Self::parsed_segment(&current, sub, segments.is_empty(), family));
                current.clear();
                sub = ch == ',';
            } else {
                current.push(ch);
            }
        }
        if current.is_empty() {
            return None;
        }
        segments.push(Self::parsed_segment(&current, sub, segments.is_empty(), family));
        Some(Self::new(segments))
    }

    fn parsed_segment(name: &str, sub: bool, root: bool, family: &[&str]) -> Segment {
        let segment = if sub { Segment::sub(name) } else { Segment::window(name) };
        segment.family(root || family.contains(&name))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn leaf(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Render the chain under `options`
    pub fn canonical(&self, options: NameOptions) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.segments.len());
        let mut ancestors = options.ancestors;
        let mut top_level = options.top_level;
        let mut recursing = false;

        // leaf first, walking towards the root
        let depth = self.segments.len();
        for (i, segment) in self.segments.iter().rev().enumerate() {
            let has_parent = i + 1 < depth;

            let shown = if top_level {
                true
            } else if !has_parent {
                options.root_entity
            } else if ancestors == 0 {
                false
            } else {
                recursing
            };

            if shown {
                let prefix = match (has_parent, segment.sub_entity) {
                    (false, _) => "",
                    (true, true) => ",",
                    (true, false) => ".",
                };
                let name = if segment.sub_entity {
                    lower_first(&segment.name)
                } else {
                    segment.name.clone()
                };
                parts.push(format!("{prefix}{name}"));
            }

            if has_parent && segment.family && ancestors > 0 {
                ancestors -= 1;
            }
            top_level = false;
            recursing = true;
        }

        parts.reverse();
        parts.concat()
    }

    /// Every name the baseline lookup derives from this chain
    pub fn names(&self, class_name: &str) -> EntityNames {
        let local = self.canonical(NameOptions::default().root_entity(false).ancestors(0));
        EntityNames {
            directory: self.canonical(NameOptions::default().ancestors(0).top_level(false)),
            full: self.canonical(NameOptions::default()),
            generic: self.canonical(NameOptions::default().ancestors(1)),
            class_entity: format!("{class_name}{local}"),
            class_name: class_name.to_string(),
        }
    }
}

impl fmt::Display for NameChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical(NameOptions::default()))
    }
}

/// Names used to look up an entity's baselines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityNames {
    /// Application directory (the root segment)
    pub directory: String,
    pub full: String,
    /// Full name limited to one family ancestor
    pub generic: String,
    /// Class name followed by the entity's own segment
    pub class_entity: String,
    pub class_name: String,
}

pub(crate) fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
