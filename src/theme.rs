//! Defines the [`Theme`] type: the named set of page templates every output
//! job renders through. A theme is either the default theme embedded in the
//! binary or a directory on disk laid out like this:
//!
//! ```text
//! theme/
//!   index.tmpl         page templates, one per file, named by file name
//!   index.rss
//!   ...
//!   partials/          appended to every page template before parsing, so
//!     layout.tmpl      `{{ define }}` blocks are shared between pages
//! ```
//!
//! Every template also gets the function library defined at the bottom of
//! this module. Dates arrive in page data as RFC 3339 strings and the date
//! functions format them.

use crate::tag::tag_directory;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use gtmpl::Template;
use gtmpl_value::{Func, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// The directory (relative to the theme root) whose files are shared by all
/// page templates.
const PARTIALS_DIRECTORY: &str = "partials";

/// Template sources, keyed by template name.
#[derive(Clone, Debug, Default)]
pub struct Theme {
    pages: BTreeMap<String, String>,
    partials: String,
}

impl Theme {
    /// The theme compiled into the binary.
    pub fn embedded() -> Theme {
        Theme::from_sources(
            vec![
                ("index.tmpl", include_str!("../theme/index.tmpl")),
                ("index.rss", include_str!("../theme/index.rss")),
                ("entry.tmpl", include_str!("../theme/entry.tmpl")),
                ("tags.tmpl", include_str!("../theme/tags.tmpl")),
                ("tag_page.tmpl", include_str!("../theme/tag_page.tmpl")),
                ("archive.tmpl", include_str!("../theme/archive.tmpl")),
                ("archive_page.tmpl", include_str!("../theme/archive_page.tmpl")),
            ],
            include_str!("../theme/partials/layout.tmpl"),
        )
    }

    /// Builds a theme from in-memory sources.
    pub fn from_sources<N, S>(pages: Vec<(N, S)>, partials: &str) -> Theme
    where
        N: Into<String>,
        S: Into<String>,
    {
        Theme {
            pages: pages
                .into_iter()
                .map(|(name, source)| (name.into(), source.into()))
                .collect(),
            partials: partials.to_owned(),
        }
    }

    /// Loads a theme from `dir`. Top-level files become page templates and
    /// files anywhere beneath `partials/` are concatenated (in file-name
    /// order) into the shared partials.
    pub fn from_directory(dir: &Path) -> Result<Theme> {
        let mut theme = Theme::default();
        let walker = WalkDir::new(dir)
            .min_depth(1)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for result in walker {
            let entry = result?;
            if !entry.file_type().is_file() {
                continue;
            }

            // `strip_prefix` can't fail; every entry is beneath `dir`.
            let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            let source = fs::read_to_string(entry.path()).map_err(|err| Error::Read {
                path: entry.path().to_owned(),
                err,
            })?;

            if relative.starts_with(PARTIALS_DIRECTORY) {
                theme.partials.push_str(&source);
                theme.partials.push('\n');
            } else if entry.depth() == 1 {
                theme
                    .pages
                    .insert(entry.file_name().to_string_lossy().into_owned(), source);
            }
        }
        log::debug!(
            "loaded theme from {} ({} templates)",
            dir.display(),
            theme.pages.len()
        );
        Ok(theme)
    }

    /// The names of all page templates, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Parses the page template `name` (followed by the partials) into a
    /// ready-to-execute [`Template`] with the function library installed.
    pub fn template(&self, name: &str) -> Result<Template> {
        let page = self
            .pages
            .get(name)
            .ok_or_else(|| Error::TemplateNotFound(name.to_owned()))?;

        // The page comes first so that its text is the body of the template
        // and the partials contribute only `{{ define }}` blocks.
        let mut contents = String::with_capacity(page.len() + self.partials.len() + 1);
        contents.push_str(page);
        contents.push('\n');
        contents.push_str(&self.partials);

        let mut template = Template::default();
        template.add_funcs(FUNCTIONS);
        template.parse(&contents).map_err(|err| Error::Parse {
            name: name.to_owned(),
            err: err.to_string(),
        })?;
        Ok(template)
    }
}

/// The result of a fallible theme operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading or parsing a theme.
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a job asks for a template the theme doesn't have.
    #[error("template `{0}` not found in theme")]
    TemplateNotFound(String),

    /// Returned when a template's source doesn't parse.
    #[error("parsing template `{name}`: {err}")]
    Parse { name: String, err: String },

    /// Returned when a theme file can't be read.
    #[error("reading theme file `{}`: {err}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Returned for I/O errors while walking the theme directory.
    #[error("walking theme directory: {0}")]
    WalkDir(#[from] walkdir::Error),
}

/// The function library available to every template.
const FUNCTIONS: &[(&str, Func)] = &[
    ("ISO8601", iso8601 as Func),
    ("ESCAPE", escape as Func),
    ("ESCAPE_LINK", escape_link as Func),
    ("LOWER", lower as Func),
    ("RFC822", rfc822 as Func),
    ("TAG_LINK", tag_link as Func),
    ("RECENT_POST_DATE", recent_post_date as Func),
    ("BLOG_POST_DATE", blog_post_date as Func),
    ("COMMENT_POST_DATE", comment_post_date as Func),
];

fn string_arg<'a>(function: &str, args: &'a [Value]) -> std::result::Result<&'a str, String> {
    match args {
        [Value::String(s)] => Ok(s),
        _ => Err(format!("{} expects a single string argument", function)),
    }
}

fn date_arg(function: &str, args: &[Value]) -> std::result::Result<DateTime<FixedOffset>, String> {
    let s = string_arg(function, args)?;
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("{}: bad date `{}`: {}", function, s, e))
}

fn iso8601(args: &[Value]) -> std::result::Result<Value, String> {
    let date = date_arg("ISO8601", args)?;
    Ok(Value::String(date.to_rfc3339_opts(SecondsFormat::Secs, true)))
}

fn escape(args: &[Value]) -> std::result::Result<Value, String> {
    let s = string_arg("ESCAPE", args)?;
    let mut out = String::with_capacity(s.len());
    pulldown_cmark::escape::escape_html(&mut out, s).map_err(|e| e.to_string())?;
    Ok(Value::String(out))
}

fn escape_link(args: &[Value]) -> std::result::Result<Value, String> {
    let s = string_arg("ESCAPE_LINK", args)?;
    Ok(Value::String(urlencoding::encode(s).into_owned()))
}

/// The URL path segment of a tag's page directory, see
/// [`crate::tag::tag_directory`].
fn tag_link(args: &[Value]) -> std::result::Result<Value, String> {
    let tag = string_arg("TAG_LINK", args)?;
    Ok(Value::String(urlencoding::encode(&tag_directory(tag)).into_owned()))
}

fn lower(args: &[Value]) -> std::result::Result<Value, String> {
    Ok(Value::String(string_arg("LOWER", args)?.to_lowercase()))
}

/// RSS dates.
fn rfc822(args: &[Value]) -> std::result::Result<Value, String> {
    Ok(Value::String(date_arg("RFC822", args)?.to_rfc2822()))
}

fn recent_post_date(args: &[Value]) -> std::result::Result<Value, String> {
    let date = date_arg("RECENT_POST_DATE", args)?;
    Ok(Value::String(date.format("%-d %B %Y").to_string()))
}

fn blog_post_date(args: &[Value]) -> std::result::Result<Value, String> {
    let date = date_arg("BLOG_POST_DATE", args)?;
    Ok(Value::String(date.format("%-d %B %Y %H:%M").to_string()))
}

fn comment_post_date(args: &[Value]) -> std::result::Result<Value, String> {
    let date = date_arg("COMMENT_POST_DATE", args)?;
    Ok(Value::String(date.format("at %H:%M on %-d %B %Y").to_string()))
}
