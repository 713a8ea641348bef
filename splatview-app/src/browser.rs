//! Scene browser: finds previously generated scenes on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// One scene file found by [`list_scenes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneEntry {
    pub path: PathBuf,
    /// Path relative to the listed directory, e.g. `project/scene.ply`.
    pub name: String,
    pub modified: Option<SystemTime>,
}

/// List `*.ply` files directly inside `dir` or one directory below it,
/// newest first.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn list_scenes(dir: &Path) -> io::Result<Vec<SceneEntry>> {
    let mut scenes = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            match fs::read_dir(&path) {
                Ok(children) => {
                    for child in children.flatten() {
                        push_if_scene(dir, child.path(), &mut scenes);
                    }
                }
                Err(err) => warn!("Skipping {}: {err}", path.display()),
            }
        } else {
            push_if_scene(dir, path, &mut scenes);
        }
    }

    // Newest first; files without a timestamp go last.
    scenes.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    debug!("Found {} scenes", scenes.len());
    Ok(scenes)
}

pub(crate) fn is_ply(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("ply"))
}

fn push_if_scene(root: &Path, path: PathBuf, scenes: &mut Vec<SceneEntry>) {
    if !is_ply(&path) {
        return;
    }
    let name = path
        .strip_prefix(root)
        .unwrap_or(&path)
        .to_string_lossy()
        .into_owned();
    let modified = fs::metadata(&path).and_then(|meta| meta.modified()).ok();
    scenes.push(SceneEntry {
        path,
        name,
        modified,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "splatview-browser-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(path: &Path, age_secs: u64) {
        fs::write(path, "ply\n").unwrap();
        let time = SystemTime::now() - Duration::from_secs(age_secs);
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_lists_direct_and_nested_scenes_newest_first() {
        let dir = temp_dir("nested");
        fs::create_dir_all(dir.join("project")).unwrap();
        fs::create_dir_all(dir.join("project/deeper")).unwrap();
        touch(&dir.join("old.ply"), 3600);
        touch(&dir.join("project/new.PLY"), 10);
        touch(&dir.join("project/deeper/hidden.ply"), 0);
        touch(&dir.join("notes.txt"), 0);

        let scenes = list_scenes(&dir).unwrap();
        let names: Vec<&str> = scenes.iter().map(|s| s.name.as_str()).collect();
        let expected_nested = Path::new("project").join("new.PLY");
        assert_eq!(names, vec![expected_nested.to_str().unwrap(), "old.ply"]);
        assert!(scenes.iter().all(|s| s.modified.is_some()));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_directory() {
        let dir = temp_dir("empty");
        assert!(list_scenes(&dir).unwrap().is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = temp_dir("missing").join("does-not-exist");
        assert!(list_scenes(&dir).is_err());
    }
}
