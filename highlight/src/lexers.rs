//! Lexer resolution: maps the language an author claims to a lexer the external
//! highlighter ships.
//!
//! The table is an explicit value built once at startup and shared by reference.
//! Unknown languages are an expected outcome and resolve to `None`, which callers
//! render as plain preformatted text.

use std::collections::BTreeSet;
use std::collections::HashMap;

use syntaxhighlight_protocol::LexerId;

/// Lexer names bundled with the crate, as listed by `pygmentize -L lexers`.
const BUILTIN_LEXERS: &[&str] = &[
    "abap", "abnf", "ada", "ada2005", "ada95", "agda", "ahk", "alloy", "antlr", "apacheconf",
    "apl", "applescript", "arduino", "as", "as3", "aspx-cs", "aspx-vb", "asy", "autohotkey",
    "autoit", "awk", "basemake", "bash", "bat", "bbcode", "befunge", "bib", "bibtex", "blitzbasic",
    "bnf", "boo", "brainfuck", "bro", "bugs", "c", "c#", "c++", "ca65", "cbmbas", "ceylon",
    "cfengine3", "cfm", "chai", "chaiscript", "cheetah", "cirru", "clay", "clojure", "cmake",
    "cobol", "coffee", "coffeescript", "common-lisp", "console", "coq", "cpp", "cpp-objdump",
    "crmsh", "csharp", "css", "cucumber", "cuda", "cython", "d", "dart", "delphi", "diff",
    "django", "docker", "dockerfile", "dosbatch", "dot", "dtd", "duel", "dylan", "ebnf", "ec",
    "eiffel", "elisp", "elixir", "elm", "emacs", "erb", "erl", "erlang", "factor", "fan", "fancy",
    "felix", "fish", "fortran", "foxpro", "fsharp", "gas", "genshi", "gherkin", "glsl",
    "gnuplot", "go", "golo", "gooddata-cl", "gosu", "groovy", "haml", "handlebars", "haskell",
    "haxe", "hs", "html", "html+php", "http", "hx", "hy", "hybris", "idl", "idris", "igor",
    "ini", "io", "ioke", "irc", "isabelle", "j", "jade", "jags", "jasmin", "java", "javascript",
    "jinja", "js", "json", "jsonld", "jsp", "julia", "kotlin", "lasso", "latex", "lean",
    "less", "lhs", "lighttpd", "limbo", "liquid", "lisp", "llvm", "logos", "logtalk", "lsl",
    "lua", "make", "makefile", "mako", "maql", "mask", "mason", "mathematica", "matlab",
    "minid", "modelica", "modula2", "monkey", "moocode", "moon", "moonscript", "mql", "mscgen",
    "mupad", "mxml", "myghty", "mysql", "nasm", "nemerle", "nesc", "newlisp", "newspeak",
    "nginx", "nimrod", "nit", "nix", "nsis", "numpy", "objc", "objdump", "objective-c",
    "objective-j", "ocaml", "octave", "ooc", "opa", "openedge", "pan", "pawn", "perl", "perl6",
    "php", "pig", "pike", "plpgsql", "postgresql", "postscript", "pot", "pov", "powershell",
    "prolog", "properties", "protobuf", "psql", "puppet", "py", "py3", "pycon", "pypylog",
    "pytb", "python", "python3", "qml", "racket", "ragel", "raw", "rb", "rconsole", "rebol",
    "red", "redcode", "registry", "resource", "rexx", "rhtml", "robotframework", "rst", "rsl",
    "ruby", "rust", "s", "sass", "scala", "scaml", "scheme", "scilab", "scss", "sh", "shell",
    "slim", "smali", "smalltalk", "smarty", "sml", "snobol", "sourceslist", "sp", "sparql",
    "splus", "sql", "sqlite3", "squidconf", "ssp", "stan", "swift", "swig", "systemverilog",
    "tads3", "tcl", "tcsh", "tea", "tex", "text", "todotxt", "trac-wiki", "ts", "tsql",
    "twig", "typescript", "urbiscript", "vala", "vb.net", "vbnet", "vctreestatus", "velocity",
    "verilog", "vgl", "vhdl", "vim", "xml", "xquery", "xslt", "xtend", "xul+mozpreproc", "yaml",
    "zephir", "zsh",
];

/// Legacy (GeSHi) language names whose Pygments lexer has a different name.
const LEGACY_ALIASES: &[(&str, &str)] = &[
    ("6502acme", "ca65"),
    ("6502kickass", "ca65"),
    ("6502tasm", "ca65"),
    ("68000devpac", "gas"),
    ("asm", "nasm"),
    ("c_loadrunner", "c"),
    ("c_mac", "c"),
    ("cpp-qt", "cpp"),
    ("cpp-winapi", "cpp"),
    ("email", "text"),
    ("gettext", "pot"),
    ("html4strict", "html"),
    ("html5", "html"),
    ("java5", "java"),
    ("klonec", "c"),
    ("klonecpp", "cpp"),
    ("mmix", "gas"),
    ("oobas", "vbnet"),
    ("oracle11", "sql"),
    ("oracle8", "sql"),
    ("php-brief", "php"),
    ("povray", "pov"),
    ("rails", "rb"),
    ("reg", "registry"),
    ("rsplus", "splus"),
    ("sas", "text"),
    ("vb", "vb.net"),
    ("visualfoxpro", "foxpro"),
    ("winbatch", "bat"),
    ("xpp", "java"),
];

/// MIME types the API pretty-printer is allowed to highlight.
const MIME_LEXERS: &[(&str, &str)] = &[
    ("text/javascript", "javascript"),
    ("application/json", "javascript"),
    ("text/xml", "xml"),
];

/// Immutable lexer configuration: the canonical lexer set plus the legacy alias table.
#[derive(Debug, Clone)]
pub struct LexerTable {
    lexers: BTreeSet<String>,
    aliases: HashMap<String, String>,
}

impl LexerTable {
    /// The bundled lexer list and alias table.
    pub fn builtin() -> Self {
        Self::with_lexers(BUILTIN_LEXERS.iter().copied())
    }

    /// A custom canonical lexer set that keeps the built-in legacy aliases.
    pub fn with_lexers<I, S>(lexers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let aliases = LEGACY_ALIASES
            .iter()
            .map(|(legacy, canonical)| ((*legacy).to_string(), (*canonical).to_string()))
            .collect();
        Self {
            lexers: lexers
                .into_iter()
                .map(|name| name.into().to_ascii_lowercase())
                .collect(),
            aliases,
        }
    }

    /// Parses a lexer list file: one lexer per line, blank lines and `#` comments ignored.
    pub fn from_lexer_list(contents: &str) -> Self {
        Self::with_lexers(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// Serializes the canonical set in the format read by [`LexerTable::from_lexer_list`].
    pub fn to_lexer_list(&self) -> String {
        let mut out = String::new();
        for lexer in &self.lexers {
            out.push_str(lexer);
            out.push('\n');
        }
        out
    }

    pub fn lexers(&self) -> impl Iterator<Item = &str> {
        self.lexers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lexers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexers.is_empty()
    }

    /// Resolves a language tag to a canonical lexer, or `None` when nothing matches.
    ///
    /// Matching is case-insensitive. A legacy alias only resolves when its target is
    /// itself in the canonical set. Resolving a canonical id returns it unchanged.
    pub fn resolve(&self, tag: &str) -> Option<LexerId> {
        let lexer = tag.to_lowercase();
        if self.lexers.contains(&lexer) {
            return Some(LexerId::new(lexer));
        }

        let canonical = self.aliases.get(&lexer)?;
        if self.lexers.contains(canonical) {
            return Some(LexerId::new(canonical.clone()));
        }

        None
    }
}

impl Default for LexerTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Lexer used for a MIME type in the API pretty-printer, if that type is highlighted.
pub fn lexer_for_mime(mime: &str) -> Option<LexerId> {
    MIME_LEXERS
        .iter()
        .find(|(candidate, _)| *candidate == mime)
        .map(|(_, lexer)| LexerId::new(*lexer))
}

/// Extracts lexer names from `pygmentize -L lexers` output.
///
/// Each lexer appears as `* name1, name2:` followed by an indented description line.
/// The result is sorted and deduplicated.
pub fn parse_pygmentize_listing(listing: &str) -> Vec<String> {
    let mut names = BTreeSet::new();
    for line in listing.lines() {
        let Some(entry) = line.strip_prefix("* ") else {
            continue;
        };
        let entry = entry.trim_end().trim_end_matches(':');
        for name in entry.split(',') {
            let name = name.trim();
            if !name.is_empty() {
                names.insert(name.to_ascii_lowercase());
            }
        }
    }
    names.into_iter().collect()
}
