//! Defines the [`TagIndex`], which groups entries by tag, the tag-cloud
//! summary derived from it, and the job that writes `tags/<tag>/index.html`
//! for each tag plus the `tags/index.html` cloud.

use crate::config::SiteConfig;
use crate::entry::{Entry, EntryCollection};
use crate::theme::Theme;
use crate::value;
use crate::write::{Renderer, Result};
use gtmpl_value::Value;
use std::collections::BTreeMap;
use std::path::{Component, Path};

/// The largest display weight a tag can have in the cloud.
pub const MAX_WEIGHT: usize = 60;

/// Maps each tag (as authored, case-sensitive) to the entries carrying it.
/// Every bucket is non-empty and sorted ascending by date, ties in
/// collection order.
#[derive(Debug, Default)]
pub struct TagIndex<'a> {
    buckets: BTreeMap<&'a str, Vec<&'a Entry>>,
}

impl<'a> TagIndex<'a> {
    /// Indexes `entries`. An entry with no tags lands in no bucket; a tag
    /// repeated on one entry counts once.
    pub fn build(entries: &'a [Entry]) -> TagIndex<'a> {
        let mut buckets: BTreeMap<&'a str, Vec<&'a Entry>> = BTreeMap::new();
        for entry in entries {
            for tag in entry.tags.iter() {
                let bucket = buckets.entry(tag.as_str()).or_default();
                match bucket.last() {
                    Some(last) if std::ptr::eq(*last, entry) => {}
                    _ => bucket.push(entry),
                }
            }
        }

        // Buckets were filled in collection order, so a stable sort keeps
        // that order among entries with equal dates.
        for bucket in buckets.values_mut() {
            bucket.sort_by(|a, b| a.date.cmp(&b.date));
        }
        TagIndex { buckets }
    }

    /// The entries carrying `tag`, oldest first.
    pub fn get(&self, tag: &str) -> Option<&[&'a Entry]> {
        self.buckets.get(tag).map(Vec::as_slice)
    }

    /// Iterates over `(tag, entries)` in tag-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &[&'a Entry])> + '_ {
        self.buckets.iter().map(|(tag, entries)| (*tag, entries.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The tag cloud: one [`TagCloudEntry`] per tag, sorted by tag name.
    pub fn cloud(&self) -> Vec<TagCloudEntry> {
        self.iter()
            .map(|(tag, entries)| TagCloudEntry {
                tag: tag.to_owned(),
                count: entries.len(),
                weight: weight(entries.len()),
            })
            .collect()
    }
}

/// One tag's line in the tag cloud.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagCloudEntry {
    pub tag: String,

    /// The number of entries carrying the tag.
    pub count: usize,

    /// The display weight (text size) of the tag.
    pub weight: usize,
}

impl From<&TagCloudEntry> for Value {
    fn from(t: &TagCloudEntry) -> Value {
        value::object(vec![
            ("tag", (&t.tag).into()),
            ("count", value::count(t.count)),
            ("size", value::count(t.weight)),
        ])
    }
}

/// Maps a usage count to a display weight: `min(60, count * 5 + 5)`.
pub fn weight(count: usize) -> usize {
    count.saturating_mul(5).saturating_add(5).min(MAX_WEIGHT)
}

const TAG_PAGE_TEMPLATE: &str = "tag_page.tmpl";
const TAG_CLOUD_TEMPLATE: &str = "tags.tmpl";

/// The directory (relative to the output root) holding the tag pages.
pub const TAGS_DIRECTORY: &str = "tags";

/// The name of `tag`'s directory beneath [`TAGS_DIRECTORY`]. A tag that is a
/// plain file name is used as-is. Anything else (separators, `.`, `..`, the
/// empty string, `%`) is percent-encoded with `.` encoded too, so every tag
/// gets its own directory directly under `tags/` and no two tags share one.
pub fn tag_directory(tag: &str) -> String {
    let mut components = Path::new(tag).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == tag && !tag.contains('%') => tag.to_owned(),
        _ if tag.is_empty() => "%00".to_owned(),
        _ => urlencoding::encode(tag).replace('.', "%2E"),
    }
}

/// Writes one page per tag and the tag cloud.
pub fn write_tags(config: &SiteConfig, theme: &Theme, collection: &EntryCollection) -> Result<()> {
    let mut renderer = Renderer::new(theme, config);
    let index = TagIndex::build(collection.entries());
    let recent = value::entries(&collection.recent());

    for (tag, entries) in index.iter() {
        renderer.render(
            TAG_PAGE_TEMPLATE,
            value::object(vec![
                ("title", Value::String(format!("Entries tagged {}", tag))),
                ("tag", Value::from(tag)),
                ("entries", value::entries(entries)),
                ("recent", recent.clone()),
            ]),
            &Path::new(TAGS_DIRECTORY).join(tag_directory(tag)).join("index.html"),
        )?;
    }

    let cloud = index.cloud();
    renderer.render(
        TAG_CLOUD_TEMPLATE,
        value::object(vec![
            ("title", Value::from("Tags")),
            ("tags", Value::Array(cloud.iter().map(Value::from).collect())),
            ("recent", recent),
        ]),
        &Path::new(TAGS_DIRECTORY).join("index.html"),
    )?;

    log::debug!("wrote {} tag pages", index.len());
    Ok(())
}
