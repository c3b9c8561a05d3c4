use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base` and remove `.` and `..` components lexically.
///
/// Symlinks are not followed, so the result is stable for files that do not exist yet and
/// comparable with paths built by joining directory entries onto a normalised root.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Produce the archive entry name for a path relative to the staging root.
///
/// Entry names always use forward slashes, regardless of the native separator.
pub fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_relative_paths_onto_base() {
        assert_eq!(
            absolutize(Path::new("/work/paper"), Path::new("./chapters/../chapters/intro.tex")),
            PathBuf::from("/work/paper/chapters/intro.tex")
        );
    }

    #[test]
    fn leaves_absolute_paths_anchored() {
        assert_eq!(
            absolutize(Path::new("/work/paper"), Path::new("/tmp/./x.tex")),
            PathBuf::from("/tmp/x.tex")
        );
    }

    #[test]
    fn parent_components_escape_the_base() {
        assert_eq!(
            absolutize(Path::new("/work/paper"), Path::new("../shared/macros.tex")),
            PathBuf::from("/work/shared/macros.tex")
        );
    }

    #[test]
    fn archive_names_use_forward_slashes() {
        let relative: PathBuf = ["chapters", "part one", "intro.tex"].iter().collect();
        assert_eq!(archive_name(&relative), "chapters/part one/intro.tex");
        assert_eq!(archive_name(Path::new("./main.tex")), "main.tex");
    }
}
