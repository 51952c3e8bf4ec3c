//! Recursive project listing
//!
//! Walks the project (or a subdirectory of it) and returns every file and
//! directory with its path relative to the project root. The plugin directory
//! is never entered or reported.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::PluginConfig;
use crate::server::file_api::{self, FileApiError};

/// One listing row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub path: String,
    pub is_dir: bool,
}

/// Join relative segments with `/` regardless of platform
fn to_relative_string(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// List every entry under `subdir` (or the whole project when `None`/empty)
///
/// Paths are always relative to the project root, even for a subdirectory.
/// Symlinked directories are reported but never descended into, so every real
/// entry shows up exactly once under its physical path and link cycles cannot
/// occur.
pub fn list_project(
    config: &PluginConfig,
    subdir: Option<&str>,
) -> Result<Vec<DirectoryEntry>, FileApiError> {
    let root = &config.project_root;
    let base = match subdir.filter(|s| !s.is_empty()) {
        Some(s) => file_api::resolve_safe_dir(config, s)?,
        None => root.clone(),
    };

    let mut items = Vec::new();

    // Stack-based traversal to avoid deep recursion
    let mut stack: Vec<PathBuf> = vec![base.clone()];

    while let Some(current_dir) = stack.pop() {
        let entries = match fs::read_dir(&current_dir) {
            Ok(e) => e,
            Err(e) => {
                debug!("Failed to read directory {:?}: {}", current_dir, e);
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(_) => continue,
            };

            if entry.file_name() == config.exclusion_name.as_str() {
                continue;
            }

            let path = entry.path();
            let relative = match path.strip_prefix(root) {
                Ok(r) => to_relative_string(r),
                Err(_) => continue,
            };

            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(_) => continue,
            };

            if file_type.is_symlink() {
                // Reported by target type (dangling links count as files), never walked
                let is_dir = fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false);
                if is_dir {
                    debug!("Not descending into symlinked directory {:?}", path);
                }
                items.push(DirectoryEntry {
                    path: relative,
                    is_dir,
                });
                continue;
            }

            let is_dir = file_type.is_dir();
            items.push(DirectoryEntry {
                path: relative,
                is_dir,
            });
            if is_dir {
                stack.push(path);
            }
        }
    }

    // Sort for consistent ordering
    items.sort_by(|a, b| a.path.to_lowercase().cmp(&b.path.to_lowercase()));

    debug!("Listed {} entries under {:?}", items.len(), base);

    Ok(items)
}
