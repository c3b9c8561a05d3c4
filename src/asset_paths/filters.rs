use std::path::Path;

/// Determine whether a dependency-trace reference belongs to the project.
///
/// Absolute references point at files the engine resolved outside the working directory,
/// such as packages from the TeX distribution, and are never bundled.
pub fn is_project_local(reference: &str) -> bool {
    !reference.is_empty() && !Path::new(reference).is_absolute()
}
