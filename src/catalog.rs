//! Bezel artwork lookup.
//!
//! [`CandidateNames`] owns the naming policy and knows nothing about the file
//! system; [`Catalog`] filters those names down to artwork that exists in the
//! bezel directory.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::config::Configuration;
use crate::error::BezelError;
use crate::geometry::Rect;
use crate::surface::ContentIdentity;

/// Lowercase `name` and collapse every run of non-alphanumerics into `_`.
///
/// `"Pitfall!"` becomes `"pitfall"`, `"Pitfall II - Lost Caverns"` becomes
/// `"pitfall_ii_lost_caverns"`.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

// Drop one trailing "(...)" or "[...]" tag, No-Intro style.
fn strip_trailing_tag(title: &str) -> Option<&str> {
    let title = title.trim_end();
    let open = match title.chars().last()? {
        ')' => '(',
        ']' => '[',
        _ => return None,
    };
    let pos = title.rfind(open)?;
    Some(title[..pos].trim_end())
}

/// Ordered naming rules for one piece of content.
///
/// The sequence is: the per-title override, names derived from the title
/// (full, then with trailing tags removed one at a time), then the fallback
/// artwork name. Exhausting it means "no bezel". Iterating again starts over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateNames {
    override_name: Option<String>,
    title: String,
    default_name: String,
}

impl CandidateNames {
    pub fn new(content: &ContentIdentity, default_name: &str) -> Self {
        Self {
            override_name: content
                .bezel_override
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            title: content.name.trim().to_string(),
            default_name: default_name.trim().to_string(),
        }
    }

    pub fn iter(&self) -> Names<'_> {
        Names {
            rules: self,
            stage: Stage::Override,
            title: &self.title,
            seen: Vec::new(),
        }
    }

    /// Name at position `index` of the sequence.
    pub fn name_at(&self, index: usize) -> Option<String> {
        self.iter().nth(index)
    }
}

impl<'a> IntoIterator for &'a CandidateNames {
    type Item = String;
    type IntoIter = Names<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Override,
    Title,
    Default,
    Done,
}

/// Lazy iterator over [`CandidateNames`]; duplicates are skipped.
#[derive(Debug, Clone)]
pub struct Names<'a> {
    rules: &'a CandidateNames,
    stage: Stage,
    title: &'a str,
    seen: Vec<String>,
}

impl Names<'_> {
    fn step(&mut self) -> Option<Option<String>> {
        match self.stage {
            Stage::Override => {
                self.stage = Stage::Title;
                Some(self.rules.override_name.clone())
            }
            Stage::Title => {
                let name = normalize_name(self.title);
                match strip_trailing_tag(self.title) {
                    Some(rest) => self.title = rest,
                    None => self.stage = Stage::Default,
                }
                Some(Some(name))
            }
            Stage::Default => {
                self.stage = Stage::Done;
                Some(Some(self.rules.default_name.clone()))
            }
            Stage::Done => None,
        }
    }
}

impl Iterator for Names<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let Some(name) = self.step()? else { continue };
            if name.is_empty() || self.seen.contains(&name) {
                continue;
            }
            self.seen.push(name.clone());
            return Some(name);
        }
    }
}

/// Artwork found on disk for a candidate name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub path: PathBuf,
}

impl Candidate {
    /// `<name>.yaml` next to the artwork.
    pub fn sidecar_path(&self) -> PathBuf {
        self.path.with_extension("yaml")
    }
}

/// Window metadata stored next to an artwork file.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WindowSidecar {
    pub window: Rect,
}

/// Read the sidecar for `candidate`, if there is one.
pub fn read_sidecar(candidate: &Candidate) -> Result<Option<Rect>, BezelError> {
    let path = candidate.sidecar_path();
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&path)?;
    let sidecar: WindowSidecar =
        serde_yaml::from_str(&text).map_err(|source| BezelError::Sidecar {
            path: path.clone(),
            source,
        })?;
    debug!(path = %path.display(), window = %sidecar.window, "window from sidecar");
    Ok(Some(sidecar.window))
}

/// The bezel artwork directory.
#[derive(Debug, Clone)]
pub struct Catalog {
    dir: PathBuf,
    extensions: Vec<String>,
}

impl Catalog {
    pub fn new(dir: impl Into<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            extensions,
        }
    }

    pub fn from_config(cfg: &Configuration) -> Self {
        Self::new(cfg.bezel_dir.clone(), cfg.extensions.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First existing `<dir>/<name>.<ext>` in extension order.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        if name.contains(['/', '\\']) || name.starts_with('.') {
            debug!(name, "ignoring bezel name that is not a plain file name");
            return None;
        }
        self.extensions
            .iter()
            .map(|ext| self.dir.join(format!("{name}.{ext}")))
            .find(|path| path.is_file())
    }

    /// Next candidate at or after `*index` that exists on disk.
    ///
    /// `index` is advanced past the returned candidate so a caller can resume
    /// after one that fails to load. `None` means the sequence is exhausted.
    pub fn get_name(&self, names: &CandidateNames, index: &mut usize) -> Option<Candidate> {
        let mut iter = names.iter().skip(*index);
        loop {
            let name = iter.next()?;
            *index += 1;
            match self.find(&name) {
                Some(path) => return Some(Candidate { name, path }),
                None => debug!(name = %name, dir = %self.dir.display(), "no bezel artwork"),
            }
        }
    }

    /// Names of all artwork in the directory, sorted.
    pub fn list(&self) -> Result<Vec<String>, BezelError> {
        let mut names = BTreeSet::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| BezelError::Io(e.into()))?;
            let path = entry.path();
            if !entry.file_type().is_file() || !self.is_artwork(path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.insert(stem.to_string());
            }
        }
        Ok(names.into_iter().collect())
    }

    fn is_artwork(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
    }
}
