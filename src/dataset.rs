//! Source dataset registry.
//!
//! Benchmark files are grouped in one folder per publication. Two of those
//! datasets give geometry in millimetre-like units; their lengths are divided by
//! ten on import so that all datasets share one unit.

use std::path::Path;

/// Folders whose geometric values are scaled down by [`LEGACY_UNIT_DIVIDER`].
pub const LEGACY_UNIT_FOLDERS: [&str; 2] = ["Ceschia_et_al_2013", "Moura_Oliveira_2009"];

pub const LEGACY_UNIT_DIVIDER: f64 = 10.0;

/// Divider applied to lengths, widths and heights read from `folder_name`.
pub fn unit_divider(folder_name: &str) -> f64 {
    if LEGACY_UNIT_FOLDERS.contains(&folder_name) {
        LEGACY_UNIT_DIVIDER
    } else {
        1.0
    }
}

/// Name of the folder directly containing `path`, empty if there is none.
pub fn folder_name_of(path: &Path) -> String {
    path.parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
