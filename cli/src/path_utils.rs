use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// Expands a leading `~` component to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let mut components = path.components();
    let Some(Component::Normal(first)) = components.next() else {
        return path.to_path_buf();
    };
    if first != "~" {
        return path.to_path_buf();
    }
    let Some(home) = dirs::home_dir() else {
        return path.to_path_buf();
    };

    let rest = components.as_path();
    if rest.as_os_str().is_empty() {
        home
    } else {
        home.join(rest)
    }
}

/// Shortens paths under the home directory to `~/...` for display.
pub fn display_with_tilde(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(&home).ok().map(Path::to_path_buf)) {
        Some(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
    }
}
