use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;
use walkdir::WalkDir;

/// File extensions recognised as roster containers.
pub const ROSTER_EXTENSIONS: [&str; 2] = ["ros", "rosz"];

/// Enumerate roster files beneath `root`, sorted by path.
///
/// A file path is returned as-is when it already has a roster extension.
pub fn discover_rosters(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if root.is_file() {
        return Ok(if is_roster_file(root) {
            vec![root.to_path_buf()]
        } else {
            Vec::new()
        });
    }
    if !root.is_dir() {
        return Err(anyhow::anyhow!("{} does not exist", root.display()));
    }

    let mut rosters = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };
        if entry.file_type().is_file() && is_roster_file(entry.path()) {
            rosters.push(entry.into_path());
        }
    }

    rosters.sort();
    if rosters.is_empty() {
        warn!("No roster files found under {}", root.display());
    }
    Ok(rosters)
}

/// Expand a list of inputs (files or directories) into roster paths.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        let found = discover_rosters(input)
            .with_context(|| format!("failed to scan {}", input.display()))?;
        paths.extend(found);
    }
    Ok(paths)
}

fn is_roster_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ROSTER_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_roster_files_recursively() -> Result<()> {
        let temp = tempdir()?;
        let root = temp.path();
        fs::create_dir_all(root.join("armies/old"))?;
        fs::write(root.join("armies/b.rosz"), b"PK")?;
        fs::write(root.join("armies/old/a.ros"), "<roster/>")?;
        fs::write(root.join("notes.txt"), "not a roster")?;

        let found = discover_rosters(root)?;
        let names: Vec<_> = found
            .iter()
            .filter_map(|path| path.file_name())
            .filter_map(|name| name.to_str())
            .collect();
        assert_eq!(names, vec!["b.rosz", "a.ros"]);

        let single = expand_inputs(&[root.join("armies/old/a.ros")])?;
        assert_eq!(single.len(), 1);
        Ok(())
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(discover_rosters("/definitely/not/here").is_err());
    }
}
