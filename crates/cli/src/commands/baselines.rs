//! Baseline Commands

use anyhow::{anyhow, Context, Result};
use clap::Subcommand;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use sightline::{BaselineLocator, BaselineName, Collection, Config, NameChain, NameType, StemCandidate};

use crate::output::{print_list, print_warning, render, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum BaselineCommands {
    /// List the baseline sets of a library
    List {
        /// Library root; repeat for several. Defaults to the configured search paths
        #[arg(long)]
        root: Vec<PathBuf>,
    },

    /// Show which baselines an entity resolves to
    Locate {
        /// Canonical entity path (e.g., Notebook.SaveDialog,save)
        path: String,

        /// Class name of the entity (e.g., Button)
        #[arg(short, long)]
        class: String,

        /// Visual state suffix (e.g., disabled)
        #[arg(short, long)]
        state: Option<String>,

        /// Path segments that count as family ancestors
        #[arg(long)]
        family: Vec<String>,

        /// Library root; repeat for several. Defaults to the configured search paths
        #[arg(long)]
        root: Vec<PathBuf>,
    },
}

/// One group of baseline files sharing a stem and state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryEntry {
    pub root: PathBuf,
    pub directory: String,
    pub stem: String,
    pub state: Option<String>,
    pub layout: Collection,
    pub series: Vec<usize>,
    pub sequence: Vec<usize>,
    pub files: usize,
}

impl TableDisplay for LibraryEntry {
    fn headers() -> Vec<&'static str> {
        vec!["Directory", "Stem", "State", "Layout", "Series", "Sequence", "Files"]
    }

    fn row(&self) -> Vec<String> {
        let indices = |v: &[usize]| {
            v.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        vec![
            if self.directory.is_empty() {
                ".".to_string()
            } else {
                self.directory.clone()
            },
            self.stem.clone(),
            self.state.clone().unwrap_or_else(|| "-".to_string()),
            self.layout.to_string(),
            indices(&self.series),
            indices(&self.sequence),
            self.files.to_string(),
        ]
    }
}

#[derive(Default)]
struct Group {
    series: BTreeSet<usize>,
    sequence: BTreeSet<usize>,
    files: usize,
}

/// Walk `root` and group baseline images by directory, stem and state.
///
/// Files that do not end in `suffix` (descriptors, notes) are skipped.
pub fn scan(root: &Path, suffix: &str) -> Result<Vec<LibraryEntry>> {
    let mut groups: BTreeMap<(String, String, Option<String>), Group> = BTreeMap::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy();
        let Some(name) = BaselineName::parse(&file_name, suffix) else {
            debug!("Skipping {}", entry.path().display());
            continue;
        };

        let directory = entry
            .path()
            .parent()
            .and_then(|p| p.strip_prefix(root).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        let group = groups.entry((directory, name.stem, name.state)).or_default();
        group.series.extend(name.series);
        group.sequence.extend(name.sequence);
        group.files += 1;
    }

    Ok(groups
        .into_iter()
        .map(|((directory, stem, state), group)| LibraryEntry {
            root: root.to_path_buf(),
            directory,
            stem,
            state,
            layout: match (group.series.is_empty(), group.sequence.is_empty()) {
                (true, true) => Collection::Single,
                (true, false) => Collection::Sequence,
                (false, true) => Collection::Series,
                (false, false) => Collection::SeriesSequence,
            },
            series: group.series.into_iter().collect(),
            sequence: group.sequence.into_iter().collect(),
            files: group.files,
        })
        .collect())
}

/// One checked stem, in discovery order
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRow {
    pub order: usize,
    pub stem: String,
    pub name_type: NameType,
    pub present: bool,
}

impl TableDisplay for CandidateRow {
    fn headers() -> Vec<&'static str> {
        vec!["#", "Stem", "Name Type", "Present"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.order.to_string(),
            self.stem.clone(),
            format!("{:?}", self.name_type),
            if self.present { "yes" } else { "no" }.to_string(),
        ]
    }
}

/// Resolved image files of the winning set
#[derive(Debug, Clone, Serialize)]
pub struct ImageRow {
    pub series: usize,
    pub path: PathBuf,
}

impl TableDisplay for ImageRow {
    fn headers() -> Vec<&'static str> {
        vec!["Series", "Image"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.series.to_string(), self.path.display().to_string()]
    }
}

#[derive(Debug, Serialize)]
pub struct LocateReport {
    pub candidates: Vec<CandidateRow>,
    pub layout: Option<Collection>,
    pub images: Vec<ImageRow>,
}

/// Run baseline discovery for a canonical path as the engine would
pub fn locate(
    locator: &BaselineLocator,
    path: &str,
    class: &str,
    state: Option<&str>,
    family: &[String],
) -> Result<LocateReport> {
    let family: Vec<&str> = family.iter().map(String::as_str).collect();
    let chain = NameChain::parse(path, &family)
        .ok_or_else(|| anyhow!("'{}' is not a canonical entity path", path))?;
    let candidates = StemCandidate::ordered(&chain.names(class));

    let rows = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| CandidateRow {
            order: i + 1,
            stem: candidate.to_string(),
            name_type: candidate.name_type,
            present: locator.discover(std::slice::from_ref(candidate), state).is_some(),
        })
        .collect();

    let Some(set) = locator.discover(&candidates, state) else {
        return Ok(LocateReport {
            candidates: rows,
            layout: None,
            images: Vec::new(),
        });
    };

    let mut images = Vec::new();
    for &series in &set.series_range {
        for path in set.image_names(locator, series) {
            images.push(ImageRow { series, path });
        }
    }

    Ok(LocateReport {
        candidates: rows,
        layout: Some(set.collection),
        images,
    })
}

fn roots_or_configured(roots: Vec<PathBuf>, config: &Config) -> Vec<PathBuf> {
    if roots.is_empty() {
        config.baselines.search_paths.clone()
    } else {
        roots
    }
}

pub fn execute(cmd: BaselineCommands, config: &Config, format: OutputFormat) -> Result<()> {
    match cmd {
        BaselineCommands::List { root } => {
            let mut entries = Vec::new();
            for root in roots_or_configured(root, config) {
                if !root.is_dir() {
                    warn!("Baseline root {} does not exist", root.display());
                    continue;
                }
                entries.extend(scan(&root, &config.baselines.image_suffix)?);
            }
            print_list(&entries, format)?;
        }

        BaselineCommands::Locate {
            path,
            class,
            state,
            family,
            root,
        } => {
            let mut baselines = config.baselines.clone();
            baselines.search_paths = roots_or_configured(root, config);
            let locator = BaselineLocator::from_config(&baselines);

            let report = locate(&locator, &path, &class, state.as_deref(), &family)?;
            if let Some(rendered) = render(&report, format)? {
                println!("{rendered}");
                return Ok(());
            }

            print_list(&report.candidates, format)?;
            match report.layout {
                Some(layout) => {
                    println!("Resolved as {layout}");
                    print_list(&report.images, format)?;
                }
                None => print_warning(&format!("No baselines found for {path}:{class}")),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn library(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"png").unwrap();
        }
        dir
    }

    #[test]
    fn test_scan_groups_files_into_sets() {
        let dir = library(&[
            "Notebook/Notebook.png",
            "Notebook/Notebook.SaveDialog[0]-0.png",
            "Notebook/Notebook.SaveDialog[0]-1.png",
            "Notebook/Notebook.SaveDialog[1]-0.png",
            "Notebook/Notebook.SaveDialog,save[disabled].png",
            "Notebook/Notebook.SaveDialog,save.yaml",
            "Button.png",
        ]);

        let entries = scan(dir.path(), ".png").unwrap();
        assert_eq!(entries.len(), 4);

        assert_eq!(entries[0].directory, "");
        assert_eq!(entries[0].stem, "Button");
        assert_eq!(entries[0].layout, Collection::Single);

        let dialog = entries
            .iter()
            .find(|e| e.stem == "Notebook.SaveDialog")
            .unwrap();
        assert_eq!(dialog.directory, "Notebook");
        assert_eq!(dialog.layout, Collection::SeriesSequence);
        assert_eq!(dialog.series, vec![0, 1]);
        assert_eq!(dialog.sequence, vec![0, 1]);
        assert_eq!(dialog.files, 3);

        let disabled = entries
            .iter()
            .find(|e| e.state.as_deref() == Some("disabled"))
            .unwrap();
        assert_eq!(disabled.stem, "Notebook.SaveDialog,save");
    }

    #[test]
    fn test_locate_reports_lookup_order() {
        let dir = library(&["Notebook/Notebook.SaveDialog,save.png", "Button.png"]);
        let locator = BaselineLocator::new(vec![dir.path().to_path_buf()], ".png");

        let report = locate(&locator, "Notebook.SaveDialog,save", "Button", None, &[]).unwrap();
        assert_eq!(report.candidates.len(), 6);
        assert_eq!(report.candidates[0].stem, "Notebook/Notebook.SaveDialog,save");
        assert!(report.candidates[0].present);
        assert_eq!(report.candidates[5].stem, "Button");
        assert!(report.candidates[5].present);
        assert_eq!(report.layout, Some(Collection::Single));
        assert_eq!(report.images.len(), 1);
        assert!(report.images[0].path.ends_with("Notebook.SaveDialog,save.png"));
    }

    #[test]
    fn test_locate_rejects_malformed_path() {
        let dir = library(&[]);
        let locator = BaselineLocator::new(vec![dir.path().to_path_buf()], ".png");
        assert!(locate(&locator, "Notebook..save", "Button", None, &[]).is_err());
    }
}
