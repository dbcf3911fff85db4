//! Bulk removal of generated files.
//!
//! Generation runs leave `input` and `output` folders scattered over a result
//! tree. This module empties all of them at once, deleting files on a worker
//! pool while keeping the folders themselves.

use itertools::Itertools;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Options of a cleanup run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupOptions {
    /// Folder names whose content is removed, compared case-insensitively
    pub targets: Vec<String>,
    pub workers: usize,
    /// Count what would be removed without touching anything
    pub dry_run: bool,
    pub include_symlinks: bool,
    /// Remove folders below a target that became empty
    pub prune_empty_dirs: bool,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism().map_or(4, |n| n.get());
        CleanupOptions {
            targets: vec!["input".to_string(), "output".to_string()],
            workers: (cpus * 5).clamp(4, 32),
            dry_run: false,
            include_symlinks: false,
            prune_empty_dirs: false,
        }
    }
}

impl CleanupOptions {
    pub fn new() -> Self {
        CleanupOptions::default()
    }

    /// Set the target folder names.
    pub fn with_targets<S: Into<String>>(mut self, targets: impl IntoIterator<Item = S>) -> Self {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    /// Set the number of worker threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_include_symlinks(mut self, include: bool) -> Self {
        self.include_symlinks = include;
        self
    }

    pub fn with_prune_empty_dirs(mut self, prune: bool) -> Self {
        self.prune_empty_dirs = prune;
        self
    }
}

/// Counters of a cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub matched_dirs: usize,
    pub files: usize,
    /// Files removed, or that would be removed in a dry run
    pub deleted: usize,
    pub bytes_freed: u64,
    pub failed: usize,
    pub pruned_dirs: usize,
}

#[derive(Debug)]
enum FileOutcome {
    Deleted(u64),
    Skipped,
    Failed,
}

/// Empty every target folder below `root`.
///
/// Fails with `NotFound` when `root` is not a directory.
pub fn clean_subfolders(root: &Path, options: &CleanupOptions) -> Result<CleanupReport> {
    let target_dirs = find_target_dirs(root, &options.targets)?;
    let mut report = CleanupReport {
        matched_dirs: target_dirs.len(),
        ..CleanupReport::default()
    };
    info!("Found {} target directories below {:?}", target_dirs.len(), root);

    let mut files = Vec::new();
    for dir in &target_dirs {
        files.extend(files_under(dir, options.include_symlinks));
    }
    // Nested targets would list a file twice.
    let files: Vec<PathBuf> = files.into_iter().sorted().dedup().collect();
    report.files = files.len();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .build()?;
    let outcomes: Vec<FileOutcome> = pool.install(|| {
        files
            .par_iter()
            .map(|path| remove_file(path, options))
            .collect()
    });

    for outcome in outcomes {
        match outcome {
            FileOutcome::Deleted(bytes) => {
                report.deleted += 1;
                report.bytes_freed += bytes;
            }
            FileOutcome::Skipped => {}
            FileOutcome::Failed => report.failed += 1,
        }
    }

    if options.prune_empty_dirs && !options.dry_run {
        for dir in &target_dirs {
            report.pruned_dirs += prune_empty_dirs(dir);
        }
    }

    info!(
        "{} {}/{} files ({}), {} failures",
        if options.dry_run { "Would delete" } else { "Deleted" },
        report.deleted,
        report.files,
        crate::utils::human_bytes(report.bytes_freed),
        report.failed
    );
    Ok(report)
}

/// Directories below `root`, `root` included, named like one of `targets`.
///
/// Symlinked directories are never entered.
pub fn find_target_dirs(root: &Path, targets: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{:?} is not a directory", root),
        )));
    }

    let targets: Vec<String> = targets.iter().map(|t| t.to_lowercase()).collect();
    let is_target = |path: &Path| {
        path.file_name()
            .map(|name| targets.contains(&name.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    };

    let mut dirs: Vec<PathBuf> = entries_below(root)
        .into_iter()
        .filter(|entry| entry.file_type.is_dir() && is_target(&entry.path))
        .map(|entry| entry.path)
        .collect();
    if is_target(root) {
        dirs.insert(0, root.to_path_buf());
    }
    Ok(dirs)
}

/// Regular files below `dir`; symlinks to files only if `include_symlinks`.
fn files_under(dir: &Path, include_symlinks: bool) -> Vec<PathBuf> {
    entries_below(dir)
        .into_iter()
        .filter(|entry| {
            if entry.file_type.is_symlink() {
                include_symlinks && !entry.path.is_dir()
            } else {
                entry.file_type.is_file()
            }
        })
        .map(|entry| entry.path)
        .collect()
}

struct Entry {
    path: PathBuf,
    /// Type of the entry itself, links not followed
    file_type: fs::FileType,
}

/// Every entry below `dir`, depth first. Symlinked directories are listed
/// but not entered.
fn entries_below(dir: &Path) -> Vec<Entry> {
    let mut entries = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        let listing = match fs::read_dir(&current) {
            Ok(listing) => listing,
            Err(e) => {
                debug!("Skipping unreadable directory {:?}: {}", current, e);
                continue;
            }
        };
        for entry in listing {
            let (path, file_type) = match entry.and_then(|e| Ok((e.path(), e.file_type()?))) {
                Ok(found) => found,
                Err(e) => {
                    debug!("Skipping unreadable entry in {:?}: {}", current, e);
                    continue;
                }
            };
            if file_type.is_dir() {
                stack.push(path.clone());
            }
            entries.push(Entry { path, file_type });
        }
    }
    entries
}

fn remove_file(path: &Path, options: &CleanupOptions) -> FileOutcome {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(_) => return FileOutcome::Skipped,
    };
    let size = if meta.file_type().is_symlink() { 0 } else { meta.len() };

    if options.dry_run {
        return FileOutcome::Deleted(size);
    }

    // Read-only files cannot be removed on every platform.
    let mut permissions = meta.permissions();
    if permissions.readonly() && !meta.file_type().is_symlink() {
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        fs::set_permissions(path, permissions).ok();
    }

    match fs::remove_file(path) {
        Ok(()) => FileOutcome::Deleted(size),
        Err(e) => {
            warn!("Failed to delete {:?}: {}", path, e);
            FileOutcome::Failed
        }
    }
}

/// Remove empty folders below `dir`, deepest first; `dir` itself is kept.
fn prune_empty_dirs(dir: &Path) -> usize {
    let mut dirs: Vec<PathBuf> = entries_below(dir)
        .into_iter()
        .filter(|entry| entry.file_type.is_dir())
        .map(|entry| entry.path)
        .collect();
    dirs.sort_by_key(|path| std::cmp::Reverse(path.components().count()));

    // remove_dir refuses non-empty folders.
    dirs.iter().filter(|path| fs::remove_dir(path).is_ok()).count()
}
