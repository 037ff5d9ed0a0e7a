//! Path joining and platform-suffix helpers
//!
//! Host paths are entered by the user and may use either POSIX or Windows
//! separators; the separator style is detected from the base path rather than
//! from the platform this process runs on, because the backend daemon may be
//! managing a remote Docker host. Joining never normalizes `.`/`..` segments.

/// Root of the ComfyUI installation inside every managed container.
///
/// All mount container paths are rooted under this directory.
pub const CONTAINER_COMFYUI_ROOT: &str = "/app/ComfyUI";

/// Join `sub` onto `base`, preserving the separator style of `base`.
///
/// A backslash anywhere in `base` selects Windows-style separators, otherwise
/// POSIX. Duplicate slash runs are collapsed. Idempotent on already-joined
/// paths.
///
/// ## Example
/// ```rust
/// use comfydock_core::paths::join_paths;
///
/// assert_eq!(join_paths("/a/b", "c"), "/a/b/c");
/// assert_eq!(join_paths(r"C:\a\b", "c"), r"C:\a\b\c");
/// ```
pub fn join_paths(base: &str, sub: &str) -> String {
    let windows = base.contains('\\');

    let joined = format!("{}/{}", base.replace('\\', "/"), sub.replace('\\', "/"));

    let mut collapsed = String::with_capacity(joined.len());
    let mut prev_slash = false;
    for ch in joined.chars() {
        if ch == '/' {
            if !prev_slash {
                collapsed.push('/');
            }
            prev_slash = true;
        } else {
            collapsed.push(ch);
            prev_slash = false;
        }
    }

    if windows {
        collapsed.replace('/', "\\")
    } else {
        collapsed
    }
}

/// Derive the working base path after a ComfyUI installation.
///
/// The installer clones into a `ComfyUI` directory under the chosen path, so
/// the form's base path has to move down one level once the install finishes.
pub fn derive_installed_path(base: &str) -> String {
    join_paths(base, "ComfyUI")
}

/// Last segment of a container path, used to re-derive host paths when the
/// base path changes. Container paths always use `/` separators.
pub fn container_dir_name(container_path: &str) -> &str {
    container_path.rsplit('/').next().unwrap_or(container_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_posix() {
        assert_eq!(join_paths("/a/b", "c"), "/a/b/c");
    }

    #[test]
    fn test_join_windows() {
        assert_eq!(join_paths(r"C:\a\b", "c"), r"C:\a\b\c");
    }

    #[test]
    fn test_join_collapses_duplicate_slashes() {
        assert_eq!(join_paths("/a//b/", "c"), "/a/b/c");
    }

    #[test]
    fn test_join_trailing_separator() {
        assert_eq!(join_paths("/a/b/", "c"), "/a/b/c");
        assert_eq!(join_paths(r"C:\a\b\", "c"), r"C:\a\b\c");
    }

    #[test]
    fn test_join_idempotent_on_joined_paths() {
        let once = join_paths("/opt/comfy", "models");
        assert_eq!(join_paths(&once, ""), format!("{}/", once));
        assert_eq!(join_paths("/opt/comfy/models", "x"), "/opt/comfy/models/x");
    }

    #[test]
    fn test_join_does_not_normalize_dot_segments() {
        assert_eq!(join_paths("/a/../b", "c"), "/a/../b/c");
    }

    #[test]
    fn test_derive_installed_path() {
        assert_eq!(derive_installed_path("/home/user/comfy"), "/home/user/comfy/ComfyUI");
        assert_eq!(derive_installed_path(r"D:\comfy"), r"D:\comfy\ComfyUI");
    }

    #[test]
    fn test_container_dir_name() {
        assert_eq!(container_dir_name("/app/ComfyUI/models"), "models");
        assert_eq!(container_dir_name("models"), "models");
    }
}
