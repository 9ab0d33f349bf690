//! Input file discovery.
//!
//! Returns CSV paths in sorted order. The sort pins file order, which pins
//! the global record sequence, which makes every first-wins descriptive
//! merge — and therefore the whole run — deterministic.

use std::io;
use std::path::{Path, PathBuf};

/// Collect `*.csv` files under `root` (case-insensitive extension),
/// optionally recursing into subdirectories. Paths come back sorted.
pub fn discover_csv_files(root: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(root, recursive, &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if recursive {
                walk(&path, recursive, out)?;
            }
        } else if path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
        {
            out.push(path);
        }
    }
    Ok(())
}
