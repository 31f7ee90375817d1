mod config;
mod path_utils;
mod startup;

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::ArgAction;
use clap::Parser;
use clap::Subcommand;
use syntaxhighlight_core::CacheStore;
use syntaxhighlight_core::DEFAULT_TIMEOUT;
use syntaxhighlight_core::DirectoryCache;
use syntaxhighlight_core::LexerTable;
use syntaxhighlight_core::NoCache;
use syntaxhighlight_core::Pygmentize;
use syntaxhighlight_core::Settings;
use syntaxhighlight_core::SyntaxHighlight;
use syntaxhighlight_core::TagRegistry;
use syntaxhighlight_core::register_tags;
use syntaxhighlight_core::write_atomic;
use syntaxhighlight_protocol::RenderArgs;
use syntaxhighlight_protocol::RenderedFragment;
use tokio::io::AsyncReadExt as _;
use tracing_subscriber::EnvFilter;

use crate::config::ConfigStore;
use crate::config::HighlightConfig;
use crate::config::default_data_dir;
use crate::path_utils::display_with_tilde;
use crate::startup::ResolvedPygmentize;

type Pipeline = SyntaxHighlight<Pygmentize, Box<dyn CacheStore>>;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Highlight source code as HTML through Pygments, with caching and plain-text fallback"
)]
struct Cli {
    /// Config file to read instead of `~/.syntaxhighlight/config.toml`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Command line that runs Pygments (e.g. `pygmentize` or `python3 -m pygments`).
    #[arg(long, env = "PYGMENTIZE", global = true)]
    pygmentize: Option<String>,

    /// Seconds to wait for one highlighter run before falling back to plain text.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Directory holding cached highlighter output.
    #[arg(long, global = true, conflicts_with = "no_cache")]
    cache_dir: Option<PathBuf>,

    /// Do not read or write the highlight cache.
    #[arg(long, global = true)]
    no_cache: bool,

    /// Armor tabs as `&#9;` for pages that go through an HTML tidier.
    #[arg(long, global = true)]
    tidy: bool,

    /// Increase log verbosity (repeatable). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Render the body of a highlight tag.
    Tag {
        /// Source file; reads stdin when omitted.
        file: Option<PathBuf>,

        /// Tag name the body was found in.
        #[arg(long, default_value = "syntaxhighlight")]
        tag: String,

        /// Declared language of the code.
        #[arg(long)]
        lang: Option<String>,

        /// Number the lines.
        #[arg(long)]
        line: bool,

        /// Lines to emphasize, e.g. `3,5-10`.
        #[arg(long)]
        highlight: Option<String>,

        /// Number of the first line.
        #[arg(long)]
        start: Option<String>,

        /// `span` renders inline instead of as a block.
        #[arg(long)]
        enclose: Option<String>,
    },
    /// Render a whole page of the given content model.
    Content {
        #[arg(long)]
        model: String,

        file: Option<PathBuf>,
    },
    /// Render API pretty-printer output of the given MIME type.
    Api {
        #[arg(long)]
        mime: String,

        file: Option<PathBuf>,
    },
    /// List the canonical lexer names.
    Lexers,
    /// Print the canonical lexer for a language, or fail if there is none.
    Resolve { lang: String },
    /// Regenerate the lexer list from the installed Pygments.
    UpdateLexers {
        /// Where to write the list; defaults to the configured `lexer_list`.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let store = match &cli.config {
        Some(path) => ConfigStore::new(path.clone()),
        None => ConfigStore::new_default()?,
    };
    let config = store.load()?;
    let lexers = load_lexer_table(config.lexer_list.as_deref())?;

    match &cli.command {
        CliCommand::Lexers => {
            for lexer in lexers.lexers() {
                println!("{lexer}");
            }
        }
        CliCommand::Resolve { lang } => {
            let Some(lexer) = lexers.resolve(lang) else {
                eprintln!("no lexer for `{lang}`");
                std::process::exit(1);
            };
            println!("{lexer}");
        }
        CliCommand::UpdateLexers { output } => {
            let command_line = pygmentize_command_line(&cli, &config);
            let pygmentize = match startup::resolve_pygmentize(command_line) {
                Ok(resolved) => pygmentize_from(&cli, &config, resolved),
                Err(err) => {
                    eprint!("{}", err.render_ansi());
                    std::process::exit(1);
                }
            };
            let names = pygmentize
                .list_lexers()
                .await
                .context("list lexers from pygmentize")?;
            if names.is_empty() {
                anyhow::bail!("`{}` reported no lexers", pygmentize.program());
            }

            let output = match output.clone().or_else(|| config.lexer_list.clone()) {
                Some(path) => path,
                None => default_lexer_list_path()?,
            };
            let table = LexerTable::with_lexers(names);
            write_atomic(&output, table.to_lexer_list().as_bytes())
                .with_context(|| format!("write {}", output.display()))?;
            if config.lexer_list.as_deref() != Some(output.as_path()) {
                store.set_lexer_list(&output)?;
                eprintln!(
                    "pointed lexer_list in {} at the new list",
                    display_with_tilde(store.path())
                );
            }
            eprintln!(
                "wrote {} lexers to {}",
                table.len(),
                display_with_tilde(&output)
            );
        }
        CliCommand::Tag {
            file,
            tag,
            lang,
            line,
            highlight,
            start,
            enclose,
        } => {
            let text = read_input(file.as_deref()).await?;
            let args = RenderArgs {
                lang: lang.clone(),
                line: *line,
                highlight: highlight.clone(),
                start: start.clone(),
                enclose: enclose.clone(),
            };

            let pipeline = Arc::new(build_pipeline(&cli, &config, lexers)?);
            let mut registry = TagRegistry::new();
            register_tags(&mut registry, pipeline);

            let Some(fragment) = registry.render(tag, &text, &args).await else {
                anyhow::bail!(
                    "`{tag}` is not a highlight tag (known: {})",
                    registry.tags().join(", ")
                );
            };
            emit(&fragment);
        }
        CliCommand::Content { model, file } => {
            let text = read_input(file.as_deref()).await?;
            let pipeline = build_pipeline(&cli, &config, lexers)?;
            let Some(fragment) = pipeline.render_content(model, &text).await else {
                anyhow::bail!("content model `{model}` is not highlighted or the input is empty");
            };
            emit(&fragment);
        }
        CliCommand::Api { mime, file } => {
            let text = read_input(file.as_deref()).await?;
            let pipeline = build_pipeline(&cli, &config, lexers)?;
            let Some(fragment) = pipeline.render_api_output(mime, &text).await else {
                anyhow::bail!("MIME type `{mime}` is not highlighted");
            };
            emit(&fragment);
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("syntaxhighlight={level},syntaxhighlight_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn emit(fragment: &RenderedFragment) {
    tracing::debug!("style modules: {}", fragment.style_modules.join(", "));
    println!("{}", fragment.html);
}

async fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("read {}", path.display())),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("read stdin")?;
            Ok(text)
        }
    }
}

fn load_lexer_table(lexer_list: Option<&Path>) -> anyhow::Result<LexerTable> {
    let Some(path) = lexer_list else {
        return Ok(LexerTable::builtin());
    };
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(LexerTable::from_lexer_list(&contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                "lexer list {} not found; using the bundled list",
                path.display()
            );
            Ok(LexerTable::builtin())
        }
        Err(err) => Err(anyhow::Error::new(err).context(format!("read {}", path.display()))),
    }
}

fn default_lexer_list_path() -> anyhow::Result<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        anyhow::bail!("cannot determine home directory for the lexer list");
    };
    Ok(default_data_dir(&home).join("lexers.txt"))
}

fn pygmentize_command_line<'a>(cli: &'a Cli, config: &'a HighlightConfig) -> &'a str {
    cli.pygmentize
        .as_deref()
        .or(config.pygmentize.as_deref())
        .unwrap_or("pygmentize")
}

fn pygmentize_from(
    cli: &Cli,
    config: &HighlightConfig,
    command: ResolvedPygmentize,
) -> Pygmentize {
    let timeout = cli
        .timeout_secs
        .or(config.timeout_secs)
        .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

    Pygmentize::new(command.program)
        .with_base_args(command.args)
        .with_timeout(timeout)
}

/// Highlighter for the rendering subcommands.
///
/// A command line that cannot be resolved is only logged: it is kept as written, every
/// request then fails to spawn, and the pipeline renders plain text.
fn rendering_pygmentize(cli: &Cli, config: &HighlightConfig) -> Pygmentize {
    let command_line = pygmentize_command_line(cli, config);
    let command = match startup::resolve_pygmentize(command_line) {
        Ok(resolved) => resolved,
        Err(err) => {
            tracing::warn!("{}; code will be shown without highlighting", err.summary());
            startup::split_command_line(command_line).unwrap_or_else(|_| ResolvedPygmentize {
                program: command_line.to_string(),
                args: Vec::new(),
            })
        }
    };
    pygmentize_from(cli, config, command)
}

fn build_pipeline(
    cli: &Cli,
    config: &HighlightConfig,
    lexers: LexerTable,
) -> anyhow::Result<Pipeline> {
    let pygmentize = rendering_pygmentize(cli, config);
    let cache = build_cache(cli.no_cache, cli.cache_dir.as_deref(), config)?;
    let settings = merge_settings(cli.tidy, config);
    Ok(SyntaxHighlight::new(lexers, pygmentize, cache).with_settings(settings))
}

fn build_cache(
    no_cache: bool,
    cache_dir: Option<&Path>,
    config: &HighlightConfig,
) -> anyhow::Result<Box<dyn CacheStore>> {
    if no_cache {
        return Ok(Box::new(NoCache));
    }
    let dir = match cache_dir.map(Path::to_path_buf).or_else(|| config.cache_dir.clone()) {
        Some(dir) => dir,
        None => {
            let Some(home) = dirs::home_dir() else {
                anyhow::bail!("cannot determine home directory for the cache; pass --cache-dir");
            };
            default_data_dir(&home).join("cache")
        }
    };
    tracing::debug!("using highlight cache at {}", display_with_tilde(&dir));
    Ok(Box::new(DirectoryCache::new(dir)))
}

fn merge_settings(tidy_flag: bool, config: &HighlightConfig) -> Settings {
    let mut settings = Settings {
        use_tidy: tidy_flag || config.use_tidy.unwrap_or(false),
        ..Settings::default()
    };
    settings.content_models.extend(
        config
            .content_models
            .iter()
            .map(|(model, lexer)| (model.clone(), lexer.clone())),
    );
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    #[test]
    fn cli_parses_tag_invocation() {
        let cli = Cli::try_parse_from([
            "syntaxhighlight",
            "--no-cache",
            "tag",
            "--lang",
            "php",
            "--line",
            "--highlight",
            "1,3-4",
            "--enclose",
            "span",
            "snippet.php",
        ])
        .expect("parse");

        assert!(cli.no_cache);
        match cli.command {
            CliCommand::Tag {
                file,
                tag,
                lang,
                line,
                highlight,
                start,
                enclose,
            } => {
                assert_eq!(file, Some(PathBuf::from("snippet.php")));
                assert_eq!(tag, "syntaxhighlight");
                assert_eq!(lang.as_deref(), Some("php"));
                assert!(line);
                assert_eq!(highlight.as_deref(), Some("1,3-4"));
                assert_eq!(start, None);
                assert_eq!(enclose.as_deref(), Some("span"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cache_dir_conflicts_with_no_cache() {
        let parsed = Cli::try_parse_from([
            "syntaxhighlight",
            "--no-cache",
            "--cache-dir",
            "/tmp/x",
            "lexers",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn config_models_extend_builtin_ones() {
        let config = HighlightConfig {
            use_tidy: Some(true),
            content_models: BTreeMap::from([
                ("sanitized-css".to_string(), "css".to_string()),
                ("javascript".to_string(), "js".to_string()),
            ]),
            ..HighlightConfig::default()
        };

        let settings = merge_settings(false, &config);

        assert!(settings.use_tidy);
        assert_eq!(
            settings.content_models.get("sanitized-css").map(String::as_str),
            Some("css")
        );
        assert_eq!(
            settings.content_models.get("javascript").map(String::as_str),
            Some("js")
        );
        assert_eq!(
            settings.content_models.get("css").map(String::as_str),
            Some("css")
        );
    }

    #[test]
    fn missing_lexer_list_falls_back_to_builtin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let table =
            load_lexer_table(Some(&dir.path().join("missing.txt"))).expect("load table");
        assert_eq!(table.len(), LexerTable::builtin().len());
    }

    #[test]
    fn lexer_list_file_replaces_builtin_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lexers.txt");
        std::fs::write(&path, "rust\ngo\n").expect("write list");

        let table = load_lexer_table(Some(&path)).expect("load table");

        assert_eq!(table.lexers().collect::<Vec<_>>(), vec!["go", "rust"]);
        assert_eq!(table.resolve("python"), None);
    }

    #[tokio::test]
    async fn unresolvable_highlighter_still_renders_plain_text() {
        let missing = [
            "/nonexistent/dir/pygmentize",
            "definitely-not-installed-pygmentize",
            "python3 -m 'pygments",
        ];
        for command_line in missing {
            let cli = Cli::try_parse_from([
                "syntaxhighlight",
                "--no-cache",
                "--pygmentize",
                command_line,
                "tag",
            ])
            .expect("parse");
            let pipeline =
                build_pipeline(&cli, &HighlightConfig::default(), LexerTable::builtin())
                    .expect("pipeline");

            for args in [
                RenderArgs::default(),
                RenderArgs::from_attributes([("lang", "python")]),
            ] {
                let fragment = pipeline.render_tag("a < b\n", &args).await;
                assert_eq!(
                    fragment.html,
                    "<div class=\"mw-highlight\"><pre>a &lt; b</pre></div>",
                    "{command_line} with {args:?}"
                );
            }
        }
    }

    #[test]
    fn explicit_cache_dir_wins_over_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = HighlightConfig {
            cache_dir: Some(PathBuf::from("/nonexistent/config-cache")),
            ..HighlightConfig::default()
        };

        let cache = build_cache(false, Some(dir.path()), &config).expect("cache");
        cache.set("highlight:k", "v");

        assert!(dir.path().join("highlight-k").is_file());
        assert_eq!(cache.get("highlight:k"), Some("v".to_string()));
    }
}
