//! Executable resolution for the daemon binaries and the proof tool
//!
//! Daemons are usually run straight out of the C++ build tree, so the local
//! `build/src/` directory wins over anything on the search path.

use std::env;
use std::path::{Path, PathBuf};

/// Locate `name`, checking an explicit override directory first, then the
/// conventional `build/src/` output directory under the working directory and
/// its parent, then the search path.
pub fn locate_executable(name: &str, bin_dir: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = bin_dir {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    if let Ok(cwd) = env::current_dir() {
        let parent = cwd.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.clone());
        for base in [&cwd, &parent] {
            let candidate = base.join("build").join("src").join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }

    find_in_path(name)
}

/// Search the `PATH` environment variable for `name`.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
