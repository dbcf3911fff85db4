//! Parsing whole dataset folders.

use glob::{glob, Pattern};
use itertools::Itertools;
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::parser::ParserOptions;
use crate::tables::InstanceTables;

/// Folder description file shipped next to the instances.
pub const OVERVIEW_FILE: &str = "Overview.txt";

/// A file that could not be parsed.
#[derive(Debug)]
pub struct BatchFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of a batch beyond the parsed instances.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub parsed: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    /// Whether every file was parsed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.parsed += other.parsed;
        self.failures.extend(other.failures);
    }
}

/// Instance files of `folder`, sorted by path.
pub fn instance_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*.txt", Pattern::escape(&folder.to_string_lossy()));
    let mut files = Vec::new();
    for entry in glob(&pattern)? {
        let path = entry.map_err(|e| Error::Io(e.into_error()))?;
        let is_overview = path
            .file_name()
            .map(|name| name == OVERVIEW_FILE)
            .unwrap_or(false);
        if path.is_file() && !is_overview {
            files.push(path);
        }
    }
    Ok(files.into_iter().sorted().collect())
}

/// Parse every instance file of `folder`.
///
/// A file that fails to parse is recorded in the report and skipped.
pub fn load_folder(folder: &Path, options: &ParserOptions) -> Result<(Vec<Instance>, BatchReport)> {
    let mut instances = Vec::new();
    let mut report = BatchReport::default();

    for path in instance_files(folder)? {
        match Instance::from_file_with(&path, options) {
            Ok(instance) => {
                report.parsed += 1;
                instances.push(instance);
            }
            Err(error) => {
                warn!("Skipping {:?}: {}", path, error);
                report.failures.push(BatchFailure { path, error });
            }
        }
    }

    info!(
        "Parsed {} instances from {:?}, {} failed",
        report.parsed,
        folder,
        report.failures.len()
    );
    Ok((instances, report))
}

/// Parse several folders into one set of tables.
pub fn load_folders<P: AsRef<Path>>(
    folders: &[P],
    options: &ParserOptions,
) -> Result<(InstanceTables, BatchReport)> {
    let mut tables = InstanceTables::new();
    let mut report = BatchReport::default();

    for folder in folders {
        let (instances, folder_report) = load_folder(folder.as_ref(), options)?;
        tables.extend(instances);
        report.merge(folder_report);
    }

    if !report.is_clean() {
        warn!(
            "{} files failed: {}",
            report.failures.len(),
            report.failures.iter().map(|f| f.path.display()).join(", ")
        );
    }
    Ok((tables, report))
}
