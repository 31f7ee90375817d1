//! Client for the external highlighter.
//!
//! The pipeline only depends on the [`Highlighter`] trait; [`Pygmentize`] drives the real
//! `pygmentize` executable as a child process, feeding the code on stdin and reading HTML
//! from stdout.

use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use syntaxhighlight_protocol::HighlightOptions;
use syntaxhighlight_protocol::LexerId;
use syntaxhighlight_protocol::OutputFormat;
use tokio::io::AsyncWriteExt as _;
use tokio::process::Command;

use crate::error::HighlighterError;
use crate::lexers::parse_pygmentize_listing;

/// Upper bound on a single highlighter run. A timeout counts as a highlighter failure.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything the external highlighter needs for one invocation.
#[derive(Debug, Clone, Copy)]
pub struct HighlightRequest<'a> {
    pub code: &'a str,
    pub lexer: &'a LexerId,
    pub format: OutputFormat,
    pub options: &'a HighlightOptions,
}

/// The external highlighting engine, treated as an opaque collaborator.
pub trait Highlighter: Send + Sync {
    fn highlight(
        &self,
        request: HighlightRequest<'_>,
    ) -> impl Future<Output = Result<String, HighlighterError>> + Send;
}

/// Runs `pygmentize` once per request.
#[derive(Debug, Clone)]
pub struct Pygmentize {
    program: String,
    base_args: Vec<String>,
    timeout: Duration,
}

impl Pygmentize {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Arguments placed before the highlighter's own, e.g. `-m pygments` for `python3`.
    pub fn with_base_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Asks the executable for every lexer it ships.
    pub async fn list_lexers(&self) -> Result<Vec<String>, HighlighterError> {
        let mut cmd = self.command();
        cmd.arg("-L").arg("lexers");
        let listing = self.run(cmd, None).await?;
        Ok(parse_pygmentize_listing(&listing))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.kill_on_drop(true);
        cmd.args(&self.base_args);
        cmd
    }

    async fn run(&self, mut cmd: Command, input: Option<&[u8]>) -> Result<String, HighlighterError> {
        cmd.stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| HighlighterError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        let stdin = child.stdin.take();
        let feed = async move {
            if let (Some(mut pipe), Some(input)) = (stdin, input) {
                pipe.write_all(input).await?;
            }
            Ok::<(), std::io::Error>(())
        };

        // Dropping the child on timeout kills it.
        let (fed, output) = tokio::time::timeout(self.timeout, async {
            tokio::join!(feed, child.wait_with_output())
        })
        .await
        .map_err(|_| HighlighterError::Timeout(self.timeout))?;

        let output = output?;
        if !output.status.success() {
            return Err(HighlighterError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        fed?;

        Ok(String::from_utf8(output.stdout)?)
    }
}

impl Highlighter for Pygmentize {
    async fn highlight(&self, request: HighlightRequest<'_>) -> Result<String, HighlighterError> {
        let mut cmd = self.command();
        cmd.arg("-l")
            .arg(request.lexer.as_str())
            .arg("-f")
            .arg(request.format.to_string());
        for (name, value) in request.options.to_pygments_options() {
            cmd.arg("-P").arg(format!("{name}={value}"));
        }

        tracing::debug!(
            "running {} for lexer {} ({} bytes)",
            self.program,
            request.lexer,
            request.code.len()
        );
        self.run(cmd, Some(request.code.as_bytes())).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shell(script: &str) -> Pygmentize {
        Pygmentize::new("sh").with_base_args(["-c", script, "pygmentize"])
    }

    fn request<'a>(
        code: &'a str,
        lexer: &'a LexerId,
        options: &'a HighlightOptions,
    ) -> HighlightRequest<'a> {
        HighlightRequest {
            code,
            lexer,
            format: OutputFormat::Html,
            options,
        }
    }

    #[tokio::test]
    async fn passes_lexer_format_and_options_then_reads_stdout() {
        let highlighter = shell("printf '%s\\n' \"$@\"; cat");
        let lexer = LexerId::new("rust");
        let options = HighlightOptions {
            highlighted_lines: vec![1, 2],
            ..HighlightOptions::default()
        };

        let output = highlighter
            .highlight(request("fn main() {}", &lexer, &options))
            .await
            .expect("highlight");

        assert_eq!(
            output,
            "-l\nrust\n-f\nhtml\n-P\ncssclass=mw-highlight\n-P\nencoding=utf-8\n-P\nhl_lines=1 2\nfn main() {}"
        );
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_failure() {
        let highlighter = shell("echo 'no lexer' >&2; exit 3");
        let lexer = LexerId::new("rust");
        let options = HighlightOptions::default();

        let err = highlighter
            .highlight(request("x", &lexer, &options))
            .await
            .expect_err("should fail");

        match err {
            HighlighterError::Failed { status, stderr } => {
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr, "no lexer");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_highlighter_times_out() {
        let highlighter = shell("exec sleep 5").with_timeout(Duration::from_millis(100));
        let lexer = LexerId::new("rust");
        let options = HighlightOptions::default();

        let err = highlighter
            .highlight(request("x", &lexer, &options))
            .await
            .expect_err("should time out");

        assert!(
            matches!(err, HighlighterError::Timeout(timeout) if timeout == Duration::from_millis(100)),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let highlighter = Pygmentize::new("/nonexistent/dir/pygmentize");
        let lexer = LexerId::new("rust");
        let options = HighlightOptions::default();

        let err = highlighter
            .highlight(request("x", &lexer, &options))
            .await
            .expect_err("should fail to spawn");

        assert!(matches!(err, HighlighterError::Spawn { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn list_lexers_parses_listing() {
        let highlighter = shell(
            "printf 'Lexers:\\n~~~~~~~\\n* rust, rs:\\n    Rust (filenames *.rs)\\n* go:\\n    Go\\n'",
        );

        let lexers = highlighter.list_lexers().await.expect("list lexers");

        assert_eq!(lexers, vec!["go", "rs", "rust"]);
    }
}
