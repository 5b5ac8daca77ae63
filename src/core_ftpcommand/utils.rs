//! Virtual-path resolution.
//!
//! Clients see a tree rooted at `/`; every operand resolves lexically
//! (no filesystem access, no symlink expansion) before the real path is
//! derived and stat'ed. A path whose `..` components climb past the root
//! has escaped and is rejected; CDUP instead clamps at `/`.

use std::path::{Path, PathBuf};

/// Resolves `arg` against the current virtual directory `cur`.
///
/// An operand starting with `/` or `\` is absolute; anything else is
/// relative to `cur`. `.` and empty components are dropped, `..` pops.
/// Returns the normalized forward-slash virtual path, or `None` when the
/// operand escapes the root.
pub fn resolve_virtual(cur: &str, arg: &str) -> Option<String> {
    let candidate = if arg.starts_with('/') || arg.starts_with('\\') {
        arg.to_string()
    } else {
        format!("{}/{}", cur, arg)
    };
    let mut components: Vec<&str> = Vec::new();
    for component in candidate.split(['/', '\\']) {
        match component {
            "" | "." => {}
            ".." => {
                components.pop()?;
            }
            name => components.push(name),
        }
    }
    Some(format!("/{}", components.join("/")))
}

/// One directory up from `cur`, clamped at `/`.
pub fn parent_virtual(cur: &str) -> String {
    let mut components: Vec<&str> = cur.split('/').filter(|c| !c.is_empty()).collect();
    components.pop();
    format!("/{}", components.join("/"))
}

/// Maps a normalized virtual path onto the real root.
pub fn virtual_to_real(root: &Path, virtual_path: &str) -> PathBuf {
    root.join(virtual_path.trim_start_matches(['/', '\\']))
}
