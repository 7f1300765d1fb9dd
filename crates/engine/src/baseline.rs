//! Baseline image library
//!
//! File names follow `<stem>[<series>]-<sequence>[<state>]<suffix>` where
//! every bracket/dash part is optional:
//!
//! ```text
//! Window.Button.png              SINGLE
//! Window.Button-0.png, -1.png    SEQUENCE         (all must match, one region)
//! Window.Button[0].png, [1].png  SERIES           (alternatives)
//! Window.Button[1]-0.png         SERIES_SEQUENCE
//! Window.Button[disabled].png    SINGLE, state "disabled"
//! ```
//!
//! Lookup runs through an ordered list of search roots, most specific first.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::BaselineConfig;
use crate::naming::EntityNames;

static FILE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<stem>.+?)(?:\[(?P<series>\d+)\])?(?:-(?P<sequence>\d+))?(?:\[(?P<state>[^\]\[]*[^\]\[\d][^\]\[]*)\])?$")
        .expect("baseline file name pattern is valid")
});

/// How the images of one baseline set relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Collection {
    Single,
    Sequence,
    Series,
    SeriesSequence,
}

impl Collection {
    /// Lookup order within one stem
    pub const ORDER: [Collection; 4] = [
        Collection::Single,
        Collection::Sequence,
        Collection::Series,
        Collection::SeriesSequence,
    ];

    fn is_series(&self) -> bool {
        matches!(self, Collection::Series | Collection::SeriesSequence)
    }

    fn is_sequence(&self) -> bool {
        matches!(self, Collection::Sequence | Collection::SeriesSequence)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Collection::Single => "SINGLE",
            Collection::Sequence => "SEQUENCE",
            Collection::Series => "SERIES",
            Collection::SeriesSequence => "SERIES_SEQUENCE",
        };
        f.write_str(s)
    }
}

/// Which naming fallback produced the stem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NameType {
    Full,
    Generic,
    ClassEntity,
    Class,
}

/// One stem to look up, optionally inside the application directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StemCandidate {
    pub directory: Option<String>,
    pub stem: String,
    pub name_type: NameType,
}

impl StemCandidate {
    /// Discovery order: everything inside the application directory first,
    /// then the class-level stems shared across applications
    pub fn ordered(names: &EntityNames) -> Vec<StemCandidate> {
        let dir = Some(names.directory.clone());
        let scoped = |stem: &str, name_type| StemCandidate {
            directory: dir.clone(),
            stem: stem.to_string(),
            name_type,
        };
        let shared = |stem: &str, name_type| StemCandidate {
            directory: None,
            stem: stem.to_string(),
            name_type,
        };
        vec![
            scoped(&names.full, NameType::Full),
            scoped(&names.generic, NameType::Generic),
            scoped(&names.class_entity, NameType::ClassEntity),
            scoped(&names.class_name, NameType::Class),
            shared(&names.class_entity, NameType::ClassEntity),
            shared(&names.class_name, NameType::Class),
        ]
    }

    fn relative(&self, file_name: String) -> PathBuf {
        match &self.directory {
            Some(dir) => Path::new(dir).join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

impl fmt::Display for StemCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.directory {
            Some(dir) => write!(f, "{}/{}", dir, self.stem),
            None => f.write_str(&self.stem),
        }
    }
}

/// Parsed baseline file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaselineName {
    pub stem: String,
    pub series: Option<usize>,
    pub sequence: Option<usize>,
    pub state: Option<String>,
}

impl BaselineName {
    pub fn new(stem: &str) -> Self {
        Self {
            stem: stem.to_string(),
            series: None,
            sequence: None,
            state: None,
        }
    }

    pub fn series(mut self, series: Option<usize>) -> Self {
        self.series = series;
        self
    }

    pub fn sequence(mut self, sequence: Option<usize>) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn state(mut self, state: Option<&str>) -> Self {
        self.state = state.map(str::to_string);
        self
    }

    pub fn file_name(&self, suffix: &str) -> String {
        let mut name = self.stem.clone();
        if let Some(series) = self.series {
            name.push_str(&format!("[{series}]"));
        }
        if let Some(sequence) = self.sequence {
            name.push_str(&format!("-{sequence}"));
        }
        if let Some(state) = &self.state {
            name.push_str(&format!("[{state}]"));
        }
        name.push_str(suffix);
        name
    }

    /// Split a file name back into its parts; `None` if the suffix differs
    pub fn parse(file_name: &str, suffix: &str) -> Option<Self> {
        let base = file_name.strip_suffix(suffix)?;
        let caps = FILE_NAME.captures(base)?;
        Some(Self {
            stem: caps.name("stem")?.as_str().to_string(),
            series: caps.name("series").and_then(|m| m.as_str().parse().ok()),
            sequence: caps.name("sequence").and_then(|m| m.as_str().parse().ok()),
            state: caps.name("state").map(|m| m.as_str().to_string()),
        })
    }

    pub fn collection(&self) -> Collection {
        match (self.series.is_some(), self.sequence.is_some()) {
            (false, false) => Collection::Single,
            (false, true) => Collection::Sequence,
            (true, false) => Collection::Series,
            (true, true) => Collection::SeriesSequence,
        }
    }
}

/// Resolves relative baseline paths across the search roots
#[derive(Debug, Clone)]
pub struct BaselineLocator {
    roots: Vec<PathBuf>,
    suffix: String,
    descriptor_suffix: String,
}

impl BaselineLocator {
    pub fn new(roots: Vec<PathBuf>, suffix: &str) -> Self {
        Self {
            roots,
            suffix: suffix.to_string(),
            descriptor_suffix: ".yaml".to_string(),
        }
    }

    pub fn from_config(config: &BaselineConfig) -> Self {
        Self {
            roots: config.search_paths.clone(),
            suffix: config.image_suffix.clone(),
            descriptor_suffix: config.descriptor_suffix.clone(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// First root holding `relative`
    pub fn locate(&self, relative: &Path) -> Option<PathBuf> {
        self.roots
            .iter()
            .map(|root| root.join(relative))
            .find(|path| path.is_file())
    }

    /// Sidecar descriptor path for an image
    pub fn descriptor_for(&self, image: &Path) -> PathBuf {
        let name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.strip_suffix(self.suffix.as_str()).unwrap_or(&name);
        image.with_file_name(format!("{stem}{}", self.descriptor_suffix))
    }

    fn locate_name(&self, candidate: &StemCandidate, name: &BaselineName) -> Option<PathBuf> {
        self.locate(&candidate.relative(name.file_name(&self.suffix)))
    }

    /// Check every candidate and layout in order; `None` if nothing exists
    pub fn discover(&self, candidates: &[StemCandidate], state: Option<&str>) -> Option<BaselineSet> {
        for candidate in candidates {
            for collection in Collection::ORDER {
                let exists = |series: Option<usize>| {
                    let name = BaselineName::new(&candidate.stem)
                        .series(series)
                        .sequence(collection.is_sequence().then_some(0))
                        .state(state);
                    self.locate_name(candidate, &name)
                };

                let series_range: Vec<usize> = if collection.is_series() {
                    (0..).take_while(|i| exists(Some(*i)).is_some()).collect()
                } else if exists(None).is_some() {
                    vec![0]
                } else {
                    Vec::new()
                };

                if !series_range.is_empty() {
                    debug!(
                        "Baselines for {} resolved as {} ({:?}, series {:?})",
                        candidate, collection, candidate.name_type, series_range
                    );
                    return Some(BaselineSet {
                        collection,
                        name_type: candidate.name_type,
                        series_range,
                        state: state.map(str::to_string),
                        candidate: candidate.clone(),
                    });
                }
            }
        }
        None
    }
}

/// A discovered group of baseline images for one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineSet {
    pub collection: Collection,
    pub name_type: NameType,
    pub series_range: Vec<usize>,
    pub state: Option<String>,
    pub candidate: StemCandidate,
}

impl BaselineSet {
    /// Resolved image paths for one series index, in sequence order
    pub fn image_names(&self, locator: &BaselineLocator, series: usize) -> Vec<PathBuf> {
        let series = self.collection.is_series().then_some(series);
        let name = |sequence: Option<usize>| {
            BaselineName::new(&self.candidate.stem)
                .series(series)
                .sequence(sequence)
                .state(self.state.as_deref())
        };

        if self.collection.is_sequence() {
            (0..)
                .map_while(|i| locator.locate_name(&self.candidate, &name(Some(i))))
                .collect()
        } else {
            locator
                .locate_name(&self.candidate, &name(None))
                .into_iter()
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use test_case::test_case;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"png").unwrap();
    }

    fn candidate(stem: &str) -> Vec<StemCandidate> {
        vec![StemCandidate {
            directory: None,
            stem: stem.to_string(),
            name_type: NameType::Class,
        }]
    }

    #[test_case("Window.Button.png", "Window.Button", None, None, None; "single")]
    #[test_case("Window.Button-1.png", "Window.Button", None, Some(1), None; "sequence")]
    #[test_case("Window.Button[2].png", "Window.Button", Some(2), None, None; "series")]
    #[test_case("Window.Button[2]-0.png", "Window.Button", Some(2), Some(0), None; "series sequence")]
    #[test_case("Window.Button[disabled].png", "Window.Button", None, None, Some("disabled"); "state")]
    #[test_case("Notebook,save[1]-3[hover].png", "Notebook,save", Some(1), Some(3), Some("hover"); "everything")]
    fn test_parse_file_names(
        file: &str,
        stem: &str,
        series: Option<usize>,
        sequence: Option<usize>,
        state: Option<&str>,
    ) {
        let parsed = BaselineName::parse(file, ".png").unwrap();
        assert_eq!(parsed.stem, stem);
        assert_eq!(parsed.series, series);
        assert_eq!(parsed.sequence, sequence);
        assert_eq!(parsed.state.as_deref(), state);
        assert_eq!(parsed.file_name(".png"), file);
    }

    #[test]
    fn test_series_discovery() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Stem[0].png");
        touch(dir.path(), "Stem[1].png");
        let locator = BaselineLocator::new(vec![dir.path().to_path_buf()], ".png");

        let set = locator.discover(&candidate("Stem"), None).unwrap();
        assert_eq!(set.collection, Collection::Series);
        assert_eq!(set.series_range, vec![0, 1]);
        assert_eq!(set.image_names(&locator, 1), vec![dir.path().join("Stem[1].png")]);
    }

    #[test]
    fn test_single_beats_sequence_for_same_stem() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "Stem.png");
        touch(dir.path(), "Stem-0.png");
        let locator = BaselineLocator::new(vec![dir.path().to_path_buf()], ".png");

        let set = locator.discover(&candidate("Stem"), None).unwrap();
        assert_eq!(set.collection, Collection::Single);
    }

    #[test]
    fn test_sequence_lists_every_frame() {
        let dir = TempDir::new().unwrap();
        for i in 0..3 {
            touch(dir.path(), &format!("Frame-{i}[open].png"));
        }
        let locator = BaselineLocator::new(vec![dir.path().to_path_buf()], ".png");

        assert!(locator.discover(&candidate("Frame"), None).is_none());
        let set = locator.discover(&candidate("Frame"), Some("open")).unwrap();
        assert_eq!(set.collection, Collection::Sequence);
        assert_eq!(set.image_names(&locator, 0).len(), 3);
    }

    #[test]
    fn test_earlier_root_wins() {
        let specific = TempDir::new().unwrap();
        let generic = TempDir::new().unwrap();
        touch(specific.path(), "Stem.png");
        touch(generic.path(), "Stem.png");
        let locator = BaselineLocator::new(
            vec![specific.path().to_path_buf(), generic.path().to_path_buf()],
            ".png",
        );
        let set = locator.discover(&candidate("Stem"), None).unwrap();
        assert_eq!(set.image_names(&locator, 0), vec![specific.path().join("Stem.png")]);
    }

    #[test]
    fn test_descriptor_path() {
        let locator = BaselineLocator::new(Vec::new(), ".png");
        assert_eq!(
            locator.descriptor_for(Path::new("/lib/Notebook/Window.Save[0].png")),
            PathBuf::from("/lib/Notebook/Window.Save[0].yaml")
        );
    }
}
