use std::path::Path;
use std::path::PathBuf;

use crate::path_utils::expand_tilde;

const PYGMENTS_DOWNLOAD_URL: &str = "https://pygments.org/download/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PygmentizeBinError {
    InvalidCommandLine { command: String },
    NotFoundInPath { command: String },
    InvalidPath { path: PathBuf, reason: String },
}

impl PygmentizeBinError {
    /// One-line description, suitable for log output.
    pub fn summary(&self) -> String {
        match self {
            PygmentizeBinError::InvalidCommandLine { command } => {
                format!("cannot parse highlighter command line `{command}`")
            }
            PygmentizeBinError::NotFoundInPath { command } => {
                format!("`{command}` was not found on PATH")
            }
            PygmentizeBinError::InvalidPath { path, reason } => {
                format!("highlighter {} is unusable ({reason})", path.display())
            }
        }
    }

    /// Terminal rendering for commands that cannot continue without the highlighter.
    pub fn render_ansi(&self) -> String {
        let mut text = self.summary();
        if matches!(self, PygmentizeBinError::NotFoundInPath { .. }) {
            text.push_str(&format!(
                ".\nInstall Pygments or pass --pygmentize: \u{1b}[4m{PYGMENTS_DOWNLOAD_URL}\u{1b}[24m"
            ));
        }
        format!("\u{1b}[31m{text}\u{1b}[0m\n")
    }
}

/// Program and leading arguments to spawn for each highlight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPygmentize {
    pub program: String,
    pub args: Vec<String>,
}

/// Splits `command_line` with shell-word rules without looking the program up.
pub fn split_command_line(command_line: &str) -> Result<ResolvedPygmentize, PygmentizeBinError> {
    let words = shlex::split(command_line).unwrap_or_default();
    let Some((program, args)) = words.split_first() else {
        return Err(PygmentizeBinError::InvalidCommandLine {
            command: command_line.to_string(),
        });
    };
    Ok(ResolvedPygmentize {
        program: program.clone(),
        args: args.to_vec(),
    })
}

/// Splits `command_line` and locates its program.
///
/// Path-like programs must be executable files; bare names are looked up on `PATH`.
pub fn resolve_pygmentize(command_line: &str) -> Result<ResolvedPygmentize, PygmentizeBinError> {
    let mut command = split_command_line(command_line)?;
    command.program = locate_program(&command.program)?;
    Ok(command)
}

fn locate_program(program: &str) -> Result<String, PygmentizeBinError> {
    if !is_path_like(program) {
        return which::which(program)
            .map(|found| found.display().to_string())
            .map_err(|_| PygmentizeBinError::NotFoundInPath {
                command: program.to_string(),
            });
    }

    let path = expand_tilde(Path::new(program));
    match unusable_reason(&path) {
        Some(reason) => Err(PygmentizeBinError::InvalidPath { path, reason }),
        None => Ok(path.display().to_string()),
    }
}

/// Why `path` cannot be spawned, or `None` if it looks runnable.
fn unusable_reason(path: &Path) -> Option<String> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) => {
            return Some(match err.kind() {
                std::io::ErrorKind::NotFound => "does not exist".to_string(),
                std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
                _ => err.to_string(),
            });
        }
    };
    if !meta.is_file() {
        return Some("not a file".to_string());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        if meta.permissions().mode() & 0o111 == 0 {
            return Some("not executable".to_string());
        }
    }

    None
}

/// Anything with a directory part or a leading `~` is treated as a path, not a `PATH` name.
fn is_path_like(program: &str) -> bool {
    program == "~" || program.starts_with("~/") || Path::new(program).components().count() > 1
}
