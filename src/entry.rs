//! Defines the [`Entry`] and [`EntryCollection`] types. An [`Entry`] is one
//! published post; an [`EntryCollection`] is the time-ordered set of all
//! entries for a run together with the bounded "recent" view used by the
//! front page, the feed, and every page's sidebar.

use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;
use url::Url;

/// The number of entries in the recent view when the configuration doesn't
/// say otherwise.
pub const DEFAULT_RECENT_COUNT: usize = 10;

/// Represents a single published post. Entries are produced by the ingestion
/// step ([`crate::parser`]) and never mutated afterwards; the indices and
/// jobs only group and reorder references to them.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// The title of the post.
    pub title: String,

    /// The publish timestamp. Used for ordering and for display.
    pub date: DateTime<FixedOffset>,

    /// The canonical URL for the post. The output path is derived from the
    /// path component of this URL.
    pub link: Url,

    /// The tags as authored. No normalization is applied, so `Rust` and
    /// `rust` are distinct tags.
    pub tags: Vec<String>,

    /// The rendered HTML body. Passed through to templates untouched.
    pub body: String,

    /// The source file the entry was parsed from, relative to the posts
    /// directory.
    pub source: PathBuf,
}

impl Entry {
    /// The four-digit year of the publish date, e.g. `2020`.
    pub fn year(&self) -> String {
        self.date.format("%Y").to_string()
    }

    /// The zero-padded month number of the publish date, e.g. `01`.
    pub fn month_number(&self) -> String {
        self.date.format("%m").to_string()
    }

    /// The English month name of the publish date, e.g. `January`.
    pub fn month_name(&self) -> String {
        self.date.format("%B").to_string()
    }

    /// The path component of [`Entry::link`] with its leading separator
    /// stripped, in its original case. This is where the alias is created.
    pub fn link_path(&self) -> PathBuf {
        PathBuf::from(self.link.path().trim_start_matches('/'))
    }

    /// The lower-cased [`Entry::link_path`]. This is where the entry page is
    /// actually written.
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(self.link.path().trim_start_matches('/').to_lowercase())
    }
}

/// All entries for a run, ordered oldest first, plus the recent view.
#[derive(Debug)]
pub struct EntryCollection {
    entries: Vec<Entry>,

    /// Indices into `entries`, newest first.
    recent: Vec<usize>,
}

impl EntryCollection {
    /// Builds a collection from entries in any order. Entries are sorted
    /// ascending by date; ties keep the order in which they were supplied.
    /// The recent view holds the newest `recent_count` entries (or all of
    /// them, if there are fewer), newest first.
    pub fn new(mut entries: Vec<Entry>, recent_count: usize) -> EntryCollection {
        entries.sort_by(|a, b| a.date.cmp(&b.date));
        let recent = (0..entries.len()).rev().take(recent_count).collect();
        EntryCollection { entries, recent }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The recent view, newest first.
    pub fn recent(&self) -> Vec<&Entry> {
        self.recent.iter().map(|&i| &self.entries[i]).collect()
    }

    /// The head of the recent view. `None` only for an empty collection.
    pub fn newest(&self) -> Option<&Entry> {
        self.recent.first().map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
