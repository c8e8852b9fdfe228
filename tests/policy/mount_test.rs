//! Mount containment tests.
//!
//! Containment is lexical. A destination that is a symlink to somewhere else
//! is judged by its declared path only.

use std::path::{Path, PathBuf};

use launch_policy::mount::{clean_path, relative_path};
use launch_policy::{path_allowed, MountCheckError};

fn allowed(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

fn check(items: &[&str], destination: &str) -> Result<bool, MountCheckError> {
    path_allowed(&allowed(items), Path::new(destination))
}

#[test]
fn child_of_allowed_is_accepted() {
    assert_eq!(check(&["/a"], "/a/b"), Ok(true));
    assert_eq!(check(&["/a"], "/a/b/c/d"), Ok(true));
}

#[test]
fn exact_match_is_accepted() {
    assert_eq!(check(&["/a"], "/a"), Ok(true));
}

#[test]
fn sibling_sharing_a_prefix_is_rejected() {
    assert_eq!(check(&["/a"], "/ab"), Ok(false));
    assert_eq!(check(&["/mnt/data"], "/mnt/database"), Ok(false));
}

#[test]
fn parent_of_allowed_is_rejected() {
    assert_eq!(check(&["/a/b"], "/a"), Ok(false));
}

#[test]
fn relative_destination_is_always_rejected() {
    for destination in ["a", "a/b", "./a", "../a", ""] {
        assert_eq!(
            check(&["/", "/a"], destination),
            Err(MountCheckError::NonAbsoluteDestination(PathBuf::from(
                destination
            ))),
            "{destination:?}"
        );
    }
}

#[test]
fn dot_dot_escape_is_resolved_lexically() {
    assert_eq!(check(&["/mnt/data"], "/mnt/data/../secret"), Ok(false));
    assert_eq!(check(&["/mnt/data"], "/mnt/data/x/../y"), Ok(true));
}

#[test]
fn root_allows_everything() {
    assert_eq!(check(&["/"], "/etc/shadow"), Ok(true));
}

#[test]
fn first_matching_candidate_wins() {
    assert_eq!(check(&["/srv", "/mnt", "/opt"], "/mnt/x"), Ok(true));
    assert_eq!(check(&["/srv", "/mnt", "/opt"], "/var"), Ok(false));
}

#[test]
fn symlinks_are_not_resolved() {
    let tmp = match tempfile::tempdir() {
        Ok(tmp) => tmp,
        Err(err) => panic!("should create temp dir: {err}"),
    };
    let allowed_dir = tmp.path().join("allowed");
    let outside_dir = tmp.path().join("outside");
    for dir in [&allowed_dir, &outside_dir] {
        if let Err(err) = std::fs::create_dir(dir) {
            panic!("should create {}: {err}", dir.display());
        }
    }
    let link = allowed_dir.join("link");
    #[cfg(unix)]
    if let Err(err) = std::os::unix::fs::symlink(&outside_dir, &link) {
        panic!("should create symlink: {err}");
    }

    // Declared path is under the allowed directory, so it is accepted even
    // though it points outside.
    assert_eq!(path_allowed(&[allowed_dir.clone()], &link), Ok(true));
    // The resolved target itself is not allowed.
    assert_eq!(path_allowed(&[allowed_dir], &outside_dir), Ok(false));
}

#[test]
fn clean_path_is_lexical() {
    assert_eq!(
        clean_path(Path::new("/does/not/exist/../really")),
        PathBuf::from("/does/not/really")
    );
}

#[test]
fn relative_path_of_sibling_starts_with_parent() {
    assert_eq!(
        relative_path(Path::new("/a"), Path::new("/ab")),
        Some(PathBuf::from("../ab"))
    );
    assert_eq!(
        relative_path(Path::new("/a/b"), Path::new("/a/b/c")),
        Some(PathBuf::from("c"))
    );
}
