//! Defines the [`Parser`], which reads post source files from disk into
//! [`Entry`] values. Each source file looks like this:
//!
//! ```md
//! ---
//! title: Hello, world!
//! date: 2021-04-16 19:30
//! tags: [greet, meta]
//! link: 2021/Hello-World.html
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! `tags` may also be a single comma-separated string, and `link` is
//! optional; without it the link is derived from the file name.

use crate::entry::Entry;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use pulldown_cmark::{html, Options, Parser as MarkdownParser};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use url::Url;
use walkdir::WalkDir;

/// Extensions of the files treated as post sources.
const SOURCE_EXTENSIONS: &[&str] = &["md", "txt"];

/// Parses [`Entry`] objects from source files.
pub struct Parser<'a> {
    /// The site prefix. Links in frontmatter are resolved against it, and
    /// derived links are placed directly beneath it.
    prefix: &'a Url,
}

impl<'a> Parser<'a> {
    pub fn new(prefix: &'a Url) -> Parser<'a> {
        Parser { prefix }
    }

    /// Walks `source_directory` for post files and parses each one. The
    /// entries come back in file-name order; ordering by date is the
    /// [`crate::entry::EntryCollection`]'s job.
    pub fn parse_entries(&self, source_directory: &Path) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        let walker =
            WalkDir::new(source_directory).sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for result in walker {
            let dir_entry = result?;
            let is_source = dir_entry.file_type().is_file()
                && dir_entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map_or(false, |ext| SOURCE_EXTENSIONS.contains(&ext));
            if !is_source {
                continue;
            }

            // `strip_prefix` can't fail; the walk starts at `source_directory`.
            let relative_path = dir_entry
                .path()
                .strip_prefix(source_directory)
                .unwrap_or_else(|_| dir_entry.path());
            entries.push(self.parse_entry(dir_entry.path(), relative_path)?);
        }
        log::debug!(
            "parsed {} entries from {}",
            entries.len(),
            source_directory.display()
        );
        Ok(entries)
    }

    fn parse_entry(&self, path: &Path, relative_path: &Path) -> Result<Entry> {
        fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|input| self.parse_source(relative_path, &input))
            .map_err(|e| Error::Annotated(format!("parsing post `{}`", relative_path.display()), Box::new(e)))
    }

    /// Parses a single [`Entry`] from the contents of the file at
    /// `relative_path`.
    pub fn parse_source(&self, relative_path: &Path, input: &str) -> Result<Entry> {
        fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
            const FENCE: &str = "---";
            if !input.starts_with(FENCE) {
                return Err(Error::FrontmatterMissingStartFence);
            }
            match input[FENCE.len()..].find(FENCE) {
                None => Err(Error::FrontmatterMissingEndFence),
                Some(offset) => Ok((
                    FENCE.len(),                        // yaml_start
                    FENCE.len() + offset,               // yaml_stop
                    FENCE.len() + offset + FENCE.len(), // body_start
                )),
            }
        }

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;

        let link = match &frontmatter.link {
            Some(link) => self.prefix.join(link)?,
            None => {
                let stem = relative_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                self.prefix.join(&format!("{}.html", slug::slugify(stem)))?
            }
        };

        let mut options = Options::empty();
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        let mut body = String::new();
        html::push_html(&mut body, MarkdownParser::new_ext(&input[body_start..], options));

        Ok(Entry {
            date: parse_date(&frontmatter.date)?,
            title: frontmatter.title,
            link,
            tags: frontmatter.tags.into_vec(),
            body,
            source: relative_path.to_owned(),
        })
    }
}

/// Parses a frontmatter date. Accepts RFC 3339, `YYYY-MM-DD HH:MM` and
/// `YYYY-MM-DD`; the last two are taken as UTC.
pub fn parse_date(s: &str) -> Result<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Ok(date);
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").ok().or_else(|| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    });
    match naive {
        Some(naive) => Ok(Utc.from_utc_datetime(&naive).into()),
        None => Err(Error::Date(s.to_owned())),
    }
}

#[derive(Deserialize)]
struct Frontmatter {
    title: String,

    date: String,

    #[serde(default)]
    tags: Tags,

    #[serde(default)]
    link: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Tags {
    List(Vec<String>),
    Line(String),
}

impl Default for Tags {
    fn default() -> Self {
        Tags::List(Vec::new())
    }
}

impl Tags {
    fn into_vec(self) -> Vec<String> {
        match self {
            Tags::List(tags) => tags,
            Tags::Line(line) => line
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// Represents the result of an [`Entry`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing an [`Entry`].
#[derive(Debug, Error)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    #[error("Post must begin with `---`")]
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence.
    #[error("Missing closing `---`")]
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),

    /// Returned when a post's link can't be resolved.
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),

    /// Returned when a post's date isn't in a recognised format.
    #[error("unrecognised date `{0}`")]
    Date(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// An error with an annotation.
    #[error("{0}: {1}")]
    Annotated(String, Box<Error>),
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    fn prefix() -> Url {
        Url::parse("https://blog.example.org/").unwrap()
    }

    #[test]
    fn test_parse_source() -> Result<()> {
        let prefix = prefix();
        let entry = Parser::new(&prefix).parse_source(
            Path::new("Hello World.md"),
            "---\ntitle: Hello\ndate: 2020-01-05 10:30\ntags: [go, Blog]\n---\n# Hi\n",
        )?;
        assert_eq!(entry.title, "Hello");
        assert_eq!(entry.date, parse_date("2020-01-05T10:30:00Z")?);
        assert_eq!(entry.link.as_str(), "https://blog.example.org/hello-world.html");
        assert_eq!(entry.tags, vec!["go", "Blog"]);
        assert_eq!(entry.body.trim_end(), "<h1>Hi</h1>");
        assert_eq!(entry.source, PathBuf::from("Hello World.md"));
        Ok(())
    }

    #[test]
    fn test_explicit_link_and_tag_line() -> Result<()> {
        let prefix = prefix();
        let entry = Parser::new(&prefix).parse_source(
            Path::new("x.txt"),
            "---\ntitle: X\ndate: 2020-01-05\ntags: go, blog ,\nlink: 2020/Mixed-Case.html\n---\nbody",
        )?;
        assert_eq!(entry.link.as_str(), "https://blog.example.org/2020/Mixed-Case.html");
        assert_eq!(entry.tags, vec!["go", "blog"]);
        Ok(())
    }

    #[test]
    fn test_missing_fences() {
        let prefix = prefix();
        let parser = Parser::new(&prefix);
        assert!(matches!(
            parser.parse_source(Path::new("a.md"), "title: x"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            parser.parse_source(Path::new("a.md"), "---\ntitle: x\n"),
            Err(Error::FrontmatterMissingEndFence)
        ));
    }

    #[test]
    fn test_parse_date() {
        assert!(parse_date("2020-01-05T10:30:00+02:00").is_ok());
        assert_eq!(
            parse_date("2020-01-05").unwrap(),
            parse_date("2020-01-05T00:00:00Z").unwrap()
        );
        assert!(matches!(parse_date("5th of January"), Err(Error::Date(_))));
    }

    #[test]
    fn test_parse_entries_annotates_errors() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("good.md"), "---\ntitle: Good\ndate: 2020-01-01\n---\n")?;
        fs::write(dir.path().join("notes.json"), "{}")?;
        let prefix = prefix();
        let parser = Parser::new(&prefix);
        assert_eq!(parser.parse_entries(dir.path())?.len(), 1);

        fs::write(dir.path().join("bad.md"), "no frontmatter")?;
        let err = parser.parse_entries(dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "parsing post `bad.md`: Post must begin with `---`");
        Ok(())
    }
}
