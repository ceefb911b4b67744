//! Project review policy discovered in the checked-out working tree.
//!
//! Policy is optional. A missing directory, an empty one, or files that cannot
//! be read all degrade to a smaller (possibly empty) [`ReviewContext`].

use ignore::WalkBuilder;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory whose whole tree is treated as review policy.
pub const POLICY_DIR: &str = ".claude";

/// Files read first, in this order, before the rest of [`POLICY_DIR`].
pub const PRIORITY_FILES: [&str; 3] = ["CLAUDE.md", ".claude/CLAUDE.md", ".claude/settings.json"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextFile {
    /// Path relative to the project root, always `/`-separated.
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewContext {
    files: Vec<ContextFile>,
}

impl ReviewContext {
    pub fn new(files: Vec<ContextFile>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[ContextFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn total_chars(&self) -> usize {
        self.files.iter().map(|f| f.content.chars().count()).sum()
    }
}

/// What the loader found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextOutcome {
    Found {
        context: ReviewContext,
        /// Candidates that existed but could not be read as UTF-8 text.
        skipped: Vec<String>,
    },
    NotFound {
        skipped: Vec<String>,
    },
}

impl ContextOutcome {
    pub fn into_context(self) -> ReviewContext {
        match self {
            ContextOutcome::Found { context, .. } => context,
            ContextOutcome::NotFound { .. } => ReviewContext::default(),
        }
    }
}

pub struct ContextLoader {
    root: PathBuf,
}

impl ContextLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn load(&self) -> ContextOutcome {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        let mut skipped = Vec::new();

        let candidates = PRIORITY_FILES
            .iter()
            .map(|p| p.to_string())
            .chain(self.policy_tree());

        for relative in candidates {
            if !seen.insert(relative.clone()) {
                continue;
            }
            let full_path = self.root.join(&relative);
            if !full_path.is_file() {
                continue;
            }
            match fs::read_to_string(&full_path) {
                Ok(content) => {
                    debug!("Loaded policy file {} ({} bytes)", relative, content.len());
                    files.push(ContextFile {
                        path: relative,
                        content,
                    });
                }
                Err(err) => {
                    warn!("Skipping unreadable policy file {}: {}", relative, err);
                    skipped.push(relative);
                }
            }
        }

        if files.is_empty() {
            ContextOutcome::NotFound { skipped }
        } else {
            ContextOutcome::Found {
                context: ReviewContext::new(files),
                skipped,
            }
        }
    }

    /// Regular files under the policy directory, sorted by path.
    fn policy_tree(&self) -> Vec<String> {
        let dir = self.root.join(POLICY_DIR);
        if !dir.is_dir() {
            return Vec::new();
        }

        let walker = WalkBuilder::new(&dir)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        let mut paths = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Error walking {}: {}", dir.display(), err);
                    continue;
                }
            };
            if !entry.file_type().map_or(false, |t| t.is_file()) {
                continue;
            }
            if let Some(relative) = relative_path(&self.root, entry.path()) {
                paths.push(relative);
            }
        }
        paths
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
