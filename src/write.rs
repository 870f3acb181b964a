//! Defines the [`Renderer`], which binds page data to a named template and
//! writes the result beneath the output root, and the per-entry output job
//! ([`write_entries`]).

use crate::config::SiteConfig;
use crate::entry::{Entry, EntryCollection};
use crate::theme::{self, Theme};
use crate::value;
use gtmpl::{Context, Template};
use gtmpl_value::Value;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Templates pages into files beneath an output root. Each job owns its own
/// renderer; parsed templates are cached per renderer so a job parses each
/// template it uses once.
pub struct Renderer<'a> {
    theme: &'a Theme,
    output_root: &'a Path,

    /// The site prefix, injected into every page's data as `prefix`.
    prefix: &'a str,

    templates: HashMap<String, Template>,
}

impl<'a> Renderer<'a> {
    pub fn new(theme: &'a Theme, config: &'a SiteConfig) -> Renderer<'a> {
        Renderer {
            theme,
            output_root: &config.output_root,
            prefix: &config.prefix,
            templates: HashMap::new(),
        }
    }

    /// The directory all paths handed to [`Renderer::render`] are relative
    /// to.
    pub fn output_root(&self) -> &Path {
        self.output_root
    }

    /// Renders `data` with the template `name` to `path` (relative to the
    /// output root) and returns the absolute path written. The parent
    /// directory is created if missing and any previous file at `path` is
    /// replaced. Errors are returned as-is; nothing is retried. `path` may
    /// only contain plain file names, so nothing is written outside the
    /// output root.
    pub fn render(&mut self, name: &str, mut data: Value, path: &Path) -> Result<PathBuf> {
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(Error::OutsideRoot(path.to_owned()));
        }

        if let Value::Object(obj) = &mut data {
            obj.insert("prefix".to_owned(), Value::String(self.prefix.to_owned()));
        }

        if !self.templates.contains_key(name) {
            let template = self.theme.template(name)?;
            self.templates.insert(name.to_owned(), template);
        }
        let template = &self.templates[name];

        let file_path = self.output_root.join(path);
        if let Some(dir) = file_path.parent() {
            mkdir_if_missing(dir)?;
        }

        let context = Context::from(data).map_err(|err| Error::Template {
            template: name.to_owned(),
            path: file_path.clone(),
            err: err.to_string(),
        })?;
        let file = File::create(&file_path).map_err(|err| Error::Write {
            path: file_path.clone(),
            err,
        })?;
        let mut w = BufWriter::new(file);
        template
            .execute(&mut w, &context)
            .map_err(|err| Error::Template {
                template: name.to_owned(),
                path: file_path.clone(),
                err: err.to_string(),
            })?;
        w.flush().map_err(|err| Error::Write {
            path: file_path.clone(),
            err,
        })?;

        log::debug!("wrote {}", file_path.display());
        Ok(file_path)
    }
}

/// Creates `dir` and any missing ancestors. Succeeds if it already exists.
fn mkdir_if_missing(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|err| Error::CreateDir {
        path: dir.to_owned(),
        err,
    })
}

/// Writes one page per entry using the `entry.tmpl` template. Each page is
/// written at the entry's lower-cased link path and aliased at the
/// original-case path. Only the newest entry is offered the comment form,
/// and only when comments are enabled.
pub fn write_entries(config: &SiteConfig, theme: &Theme, collection: &EntryCollection) -> Result<()> {
    let mut renderer = Renderer::new(theme, config);
    let recent = collection.recent();
    let newest = collection.newest();

    for entry in collection.entries() {
        let output_path = entry.output_path();
        if output_path.file_name().is_none() {
            return Err(Error::InvalidPath(entry.link.to_string()));
        }

        let data = value::object(vec![
            ("title", Value::String(entry.title.clone())),
            ("entry", Value::from(entry)),
            ("add_comment", Value::Bool(accepts_comments(config, newest, entry))),
            ("comment_api", Value::String(config.comment_api.clone())),
            ("recent", value::entries(&recent)),
        ]);
        let written = renderer.render(ENTRY_TEMPLATE, data, &output_path)?;

        let link_path = entry.link_path();
        if link_path != output_path {
            alias(
                &renderer.output_root().join(&link_path),
                &relative_target(&link_path, &output_path),
                &written,
            )
            .map_err(|err| Error::Alias {
                path: link_path.clone(),
                err,
            })?;
        }
    }
    Ok(())
}

const ENTRY_TEMPLATE: &str = "entry.tmpl";

/// Whether `entry` should render the comment-submission form. With no newest
/// entry (an empty collection) nothing is eligible.
fn accepts_comments(config: &SiteConfig, newest: Option<&Entry>, entry: &Entry) -> bool {
    config.allow_comments && newest.map_or(false, |newest| std::ptr::eq(newest, entry))
}

/// The path to `target` as seen from the directory containing `link`; both
/// are relative to the output root.
fn relative_target(link: &Path, target: &Path) -> PathBuf {
    let depth = link.parent().map_or(0, |p| p.components().count());
    let mut relative = PathBuf::new();
    for _ in 0..depth {
        relative.push("..");
    }
    relative.push(target);
    relative
}

/// Makes `link` resolve to the file at `written`. If `link` already names
/// that same file (a case-insensitive filesystem) there is nothing to do. A
/// stale link from a previous run is replaced.
#[cfg(unix)]
fn alias(link: &Path, target: &Path, written: &Path) -> io::Result<()> {
    use std::os::unix::fs::{symlink, MetadataExt};

    match fs::symlink_metadata(link) {
        Ok(meta) if meta.file_type().is_symlink() => fs::remove_file(link)?,
        Ok(meta) => {
            let written_meta = fs::metadata(written)?;
            if meta.dev() == written_meta.dev() && meta.ino() == written_meta.ino() {
                return Ok(());
            }
            fs::remove_file(link)?;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }
    if let Some(dir) = link.parent() {
        fs::create_dir_all(dir)?;
    }
    symlink(target, link)
}

#[cfg(not(unix))]
fn alias(link: &Path, _target: &Path, written: &Path) -> io::Result<()> {
    match fs::metadata(link) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            if let Some(dir) = link.parent() {
                fs::create_dir_all(dir)?;
            }
            fs::copy(written, link).map(|_| ())
        }
        Err(err) => Err(err),
    }
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug, Error)]
pub enum Error {
    /// A template was missing or failed to parse.
    #[error(transparent)]
    Theme(#[from] theme::Error),

    /// An output directory couldn't be created.
    #[error("creating directory `{}`: {err}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// An output file couldn't be created or written.
    #[error("writing `{}`: {err}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// Executing a template failed.
    #[error("rendering `{template}` into `{}`: {err}", path.display())]
    Template {
        template: String,
        path: PathBuf,
        err: String,
    },

    /// The original-case alias of an entry page couldn't be created.
    #[error("aliasing `{}`: {err}", path.display())]
    Alias {
        path: PathBuf,
        #[source]
        err: io::Error,
    },

    /// An entry's link has no file component to write to.
    #[error("entry link `{0}` doesn't name a file")]
    InvalidPath(String),

    /// A page path tried to leave the output root.
    #[error("refusing to write `{}` outside the output root", .0.display())]
    OutsideRoot(PathBuf),
}
