//! Lexical mount destination containment.
//!
//! Decides whether a requested mount destination lies at or below one of the
//! image's allowed destinations. The comparison is purely lexical: symlinks
//! are not resolved and the filesystem is never consulted. The policy only
//! constrains the destination string the operator declares, not the path the
//! kernel eventually resolves it to. Changing this to resolve symlinks would
//! change which launches are permitted.

use std::path::{Component, Path, PathBuf};

use crate::error::MountCheckError;

/// Check whether `destination` is equal to or a descendant of any entry in
/// `allowed`.
///
/// Returns `Ok(true)` on the first allowed entry that contains the
/// destination, `Ok(false)` when none does. `/a` contains `/a` and `/a/b`
/// but not `/ab`.
///
/// # Errors
///
/// Returns [`MountCheckError::NonAbsoluteDestination`] when `destination` is
/// relative and [`MountCheckError::NonAbsoluteAllowed`] when any allow-list
/// entry is relative. Both are checked before any comparison.
pub fn path_allowed(allowed: &[PathBuf], destination: &Path) -> Result<bool, MountCheckError> {
    if !destination.is_absolute() {
        return Err(MountCheckError::NonAbsoluteDestination(
            destination.to_path_buf(),
        ));
    }
    if let Some(entry) = allowed.iter().find(|entry| !entry.is_absolute()) {
        return Err(MountCheckError::NonAbsoluteAllowed(entry.clone()));
    }

    let destination = clean_path(destination);
    for entry in allowed {
        if let Some(rel) = relative_path(entry, &destination) {
            if !escapes_base(&rel) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Lexically clean a path without touching the filesystem.
///
/// Repeated separators and `.` segments are dropped, `..` removes the
/// preceding normal segment, and `..` directly under the root stays at the
/// root. Leading `..` segments of a relative path are kept. An empty result
/// becomes `.`.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last().copied() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => out.push(component),
            },
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component);
            }
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Lexical path from `base` to `target`, so that `base.join(result)` cleans
/// to `target`.
///
/// Both inputs are cleaned first. Returns `None` when one path is absolute and
/// the other relative, or when `base` climbs above `target` with `..`
/// segments that cannot be undone lexically.
pub fn relative_path(base: &Path, target: &Path) -> Option<PathBuf> {
    let base = clean_path(base);
    let target = clean_path(target);
    if base.is_absolute() != target.is_absolute() {
        return None;
    }

    let base_parts: Vec<Component<'_>> = significant(&base);
    let target_parts: Vec<Component<'_>> = significant(&target);
    let common = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(b, t)| b == t)
        .count();

    let base_rest = &base_parts[common..];
    if base_rest.iter().any(|c| matches!(c, Component::ParentDir)) {
        return None;
    }

    let mut rel = PathBuf::new();
    for _ in base_rest {
        rel.push("..");
    }
    for part in &target_parts[common..] {
        rel.push(part);
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}

fn significant(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// `..` or `../...`: the target is outside (or a sibling of) the base.
fn escapes_base(rel: &Path) -> bool {
    matches!(rel.components().next(), Some(Component::ParentDir))
}
