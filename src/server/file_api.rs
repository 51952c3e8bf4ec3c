//! File API for read-only project access
//!
//! Resolves caller-supplied relative paths against the project root and reads
//! file contents. Every path goes through [`resolve_safe_path`] first.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::string::FromUtf8Error;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PluginConfig;

/// Result of a successful read: the path as the caller gave it, plus full text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub filepath: String,
    pub content: String,
}

/// File API error types
#[derive(Error, Debug)]
pub enum FileApiError {
    #[error("Path escapes project root")]
    PathEscape,
    #[error("Access to the plugin directory is forbidden")]
    Excluded,
    #[error("Path not found")]
    NotFound,
    #[error("Not a file")]
    NotAFile,
    #[error("Not a directory")]
    NotADirectory,
    #[error("File is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
    #[error("Failed to read file: {0}")]
    ReadFailure(io::Error),
}

impl From<io::Error> for FileApiError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::NotFound {
            FileApiError::NotFound
        } else {
            FileApiError::ReadFailure(e)
        }
    }
}

/// Lexically normalize a relative path (handle `.` and `..`)
///
/// Absolute inputs and `..` above the root are escapes.
fn normalize_relative(relative_path: &str) -> Result<Vec<String>, FileApiError> {
    let mut segments: Vec<String> = Vec::new();
    for component in Path::new(relative_path).components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                if segments.pop().is_none() {
                    return Err(FileApiError::PathEscape);
                }
            }
            Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
            Component::RootDir | Component::Prefix(_) => return Err(FileApiError::PathEscape),
        }
    }
    Ok(segments)
}

/// True if any segment of `path` below `root` equals the exclusion name
pub fn is_excluded(root: &Path, path: &Path, exclusion_name: &str) -> bool {
    path.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .any(|c| matches!(c, Component::Normal(n) if n == exclusion_name))
        })
        .unwrap_or(false)
}

/// Validate and resolve a path within the project root
///
/// Returns the canonical absolute path. Containment is checked per path
/// segment, so `/root-evil` is never accepted as being under `/root`.
pub fn resolve_safe_path(
    config: &PluginConfig,
    relative_path: &str,
) -> Result<PathBuf, FileApiError> {
    let root = &config.project_root;

    let segments = normalize_relative(relative_path).inspect_err(|_| {
        warn!("Path escape attempt: {:?}", relative_path);
    })?;
    if segments.iter().any(|s| *s == config.exclusion_name) {
        warn!("Excluded path requested: {:?}", relative_path);
        return Err(FileApiError::Excluded);
    }

    let full_path = segments.iter().fold(root.clone(), |acc, s| acc.join(s));

    // Symlinks can still lead out of the root or into the plugin directory
    let canonical = full_path.canonicalize()?;
    if !canonical.starts_with(root) {
        warn!("Path escape attempt: {:?} not under {:?}", canonical, root);
        return Err(FileApiError::PathEscape);
    }
    if is_excluded(root, &canonical, &config.exclusion_name) {
        warn!("Excluded path requested via link: {:?}", canonical);
        return Err(FileApiError::Excluded);
    }

    Ok(canonical)
}

/// Resolve a directory within the project root (used for listing)
pub fn resolve_safe_dir(
    config: &PluginConfig,
    relative_path: &str,
) -> Result<PathBuf, FileApiError> {
    let path = resolve_safe_path(config, relative_path)?;
    if !path.is_dir() {
        return Err(FileApiError::NotADirectory);
    }
    Ok(path)
}

/// Read file content as UTF-8 string
pub fn read_file(config: &PluginConfig, relative_path: &str) -> Result<FileContent, FileApiError> {
    let file_path = resolve_safe_path(config, relative_path)?;
    if !file_path.is_file() {
        return Err(FileApiError::NotAFile);
    }

    debug!("Reading file: {:?}", file_path);

    let bytes = fs::read(&file_path).map_err(FileApiError::ReadFailure)?;
    let content = String::from_utf8(bytes)?;

    Ok(FileContent {
        filepath: relative_path.to_string(),
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PluginConfig) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("project");
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("gpt_plugin")).unwrap();
        fs::write(root.join("src/a.py"), "x=1").unwrap();
        fs::write(root.join("gpt_plugin/secret.py"), "token").unwrap();
        let config = PluginConfig::new(&root, "gpt_plugin", root.join("gpt_plugin")).unwrap();
        (temp, config)
    }

    #[test]
    fn test_path_escape_prevention() {
        let (temp, config) = setup();
        fs::write(temp.path().join("outside.txt"), "nope").unwrap();

        assert!(resolve_safe_path(&config, "src/a.py").is_ok());
        assert!(resolve_safe_path(&config, "./src/a.py").is_ok());
        assert!(resolve_safe_path(&config, "src/../src/a.py").is_ok());

        assert!(matches!(
            resolve_safe_path(&config, "../outside.txt"),
            Err(FileApiError::PathEscape)
        ));
        assert!(matches!(
            resolve_safe_path(&config, "src/../../outside.txt"),
            Err(FileApiError::PathEscape)
        ));
        assert!(matches!(
            resolve_safe_path(&config, "../../etc/passwd"),
            Err(FileApiError::PathEscape)
        ));
        assert!(matches!(
            resolve_safe_path(&config, "/etc/passwd"),
            Err(FileApiError::PathEscape)
        ));
    }

    #[test]
    fn test_sibling_with_shared_prefix_is_rejected() {
        let (temp, config) = setup();
        let evil = temp.path().join("project-evil");
        fs::create_dir_all(&evil).unwrap();
        fs::write(evil.join("x.txt"), "evil").unwrap();

        assert!(matches!(
            resolve_safe_path(&config, "../project-evil/x.txt"),
            Err(FileApiError::PathEscape)
        ));
    }

    #[test]
    fn test_excluded_dir_is_forbidden() {
        let (_temp, config) = setup();

        assert!(matches!(
            read_file(&config, "gpt_plugin/secret.py"),
            Err(FileApiError::Excluded)
        ));
        assert!(matches!(
            read_file(&config, "src/../gpt_plugin/secret.py"),
            Err(FileApiError::Excluded)
        ));
        // Forbidden even when the file does not exist
        assert!(matches!(
            read_file(&config, "gpt_plugin/missing.py"),
            Err(FileApiError::Excluded)
        ));
    }

    #[test]
    fn test_name_containing_exclusion_is_allowed() {
        let (_temp, config) = setup();
        let backup = config.project_root.join("my_gpt_plugin_backup");
        fs::create_dir_all(&backup).unwrap();
        fs::write(backup.join("notes.txt"), "ok").unwrap();

        let file = read_file(&config, "my_gpt_plugin_backup/notes.txt").unwrap();
        assert_eq!(file.content, "ok");
    }

    #[test]
    fn test_read_file_round_trip() {
        let (_temp, config) = setup();
        let content = "fn main() {\n    println!(\"привет\");\n}\n";
        fs::write(config.project_root.join("src/main.rs"), content).unwrap();

        let file = read_file(&config, "src/main.rs").unwrap();
        assert_eq!(file.filepath, "src/main.rs");
        assert_eq!(file.content, content);
    }

    #[test]
    fn test_read_file_not_found_and_directory() {
        let (_temp, config) = setup();

        assert!(matches!(
            read_file(&config, "src/missing.py"),
            Err(FileApiError::NotFound)
        ));
        assert!(matches!(
            read_file(&config, "src"),
            Err(FileApiError::NotAFile)
        ));
    }

    #[test]
    fn test_read_file_invalid_utf8() {
        let (_temp, config) = setup();
        fs::write(config.project_root.join("src/blob.bin"), [0xff, 0xfe, 0x00]).unwrap();

        assert!(matches!(
            read_file(&config, "src/blob.bin"),
            Err(FileApiError::InvalidUtf8(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_root_is_rejected() {
        let (temp, config) = setup();
        fs::write(temp.path().join("outside.txt"), "nope").unwrap();
        std::os::unix::fs::symlink(
            temp.path().join("outside.txt"),
            config.project_root.join("src/link.txt"),
        )
        .unwrap();
        std::os::unix::fs::symlink(
            config.project_root.join("gpt_plugin"),
            config.project_root.join("plugin_link"),
        )
        .unwrap();

        assert!(matches!(
            read_file(&config, "src/link.txt"),
            Err(FileApiError::PathEscape)
        ));
        assert!(matches!(
            read_file(&config, "plugin_link/secret.py"),
            Err(FileApiError::Excluded)
        ));
    }

    #[test]
    fn test_resolve_safe_dir() {
        let (_temp, config) = setup();

        assert!(resolve_safe_dir(&config, "src").is_ok());
        assert!(matches!(
            resolve_safe_dir(&config, "src/a.py"),
            Err(FileApiError::NotADirectory)
        ));
        assert!(matches!(
            resolve_safe_dir(&config, "missing"),
            Err(FileApiError::NotFound)
        ));
    }
}
