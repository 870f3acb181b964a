//! Exports the [`build_site`] function which renders the complete output
//! tree from an [`EntryCollection`]. The work is split into five independent
//! [`Job`]s, one per subtree of the output, which run concurrently on scoped
//! threads. Jobs share only read-only inputs and write disjoint paths.
//!
//! Every job reports back over a channel, and a failure in one job doesn't
//! stop the others: the coordinator waits for all five and then reports
//! every failure together.

use crate::archive::write_archive;
use crate::config::SiteConfig;
use crate::entry::EntryCollection;
use crate::feed::{write_feed, write_index};
use crate::tag::write_tags;
use crate::theme::Theme;
use crate::write::{self, write_entries};
use crossbeam_channel::unbounded;
use std::fmt;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// One independent piece of the output tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Job {
    /// `tags/<tag>/index.html` and `tags/index.html`.
    Tags,

    /// `archive/<year>/<month>/index.html` and `archive/index.html`.
    Archive,

    /// `index.html`.
    Index,

    /// `index.rss`.
    Feed,

    /// One page per entry.
    Entries,
}

impl Job {
    pub const ALL: [Job; 5] = [Job::Tags, Job::Archive, Job::Index, Job::Feed, Job::Entries];

    fn run(self, config: &SiteConfig, theme: &Theme, collection: &EntryCollection) -> write::Result<()> {
        match self {
            Job::Tags => write_tags(config, theme, collection),
            Job::Archive => write_archive(config, theme, collection),
            Job::Index => write_index(config, theme, collection),
            Job::Feed => write_feed(config, theme, collection),
            Job::Entries => write_entries(config, theme, collection),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Job::Tags => "tag-pages",
            Job::Archive => "archive-pages",
            Job::Index => "index.html",
            Job::Feed => "index.rss",
            Job::Entries => "blog-posts",
        })
    }
}

/// What a successful build did.
#[derive(Clone, Copy, Debug)]
pub struct Summary {
    /// The number of entries rendered.
    pub entries: usize,

    /// How long rendering took.
    pub elapsed: Duration,
}

/// Renders every job into `config.output_root` and waits for all of them.
/// Returns [`Error::Jobs`] listing each failed job (in [`Job`] order) if any
/// failed; files written by the jobs that succeeded are left in place.
pub fn build_site(config: &SiteConfig, theme: &Theme, collection: &EntryCollection) -> Result<Summary> {
    let start = Instant::now();
    let (tx, rx) = unbounded::<(Job, write::Result<()>)>();

    let mut failures = thread::scope(|s| {
        for job in Job::ALL.iter().copied() {
            let tx = tx.clone();
            s.spawn(move || {
                // The receiver lives until every job has reported.
                let _ = tx.send((job, job.run(config, theme, collection)));
            });
        }
        drop(tx);

        let mut failures = Vec::new();
        for (job, result) in rx.iter() {
            match result {
                Ok(()) => log::info!("rendered {}", job),
                Err(error) => {
                    log::error!("rendering {} failed: {}", job, error);
                    failures.push(JobFailure { job, error });
                }
            }
        }
        failures
    });

    if failures.is_empty() {
        Ok(Summary {
            entries: collection.len(),
            elapsed: start.elapsed(),
        })
    } else {
        failures.sort_by_key(|failure| failure.job);
        Err(Error::Jobs(failures))
    }
}

/// A job and the error that stopped it.
#[derive(Debug)]
pub struct JobFailure {
    pub job: Job,
    pub error: write::Error,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error rendering {}: {}", self.job, self.error)
    }
}

/// The result of a build.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more jobs failed. Never empty.
    #[error("{}", list(.0))]
    Jobs(Vec<JobFailure>),
}

impl Error {
    /// The jobs that failed.
    pub fn failed_jobs(&self) -> Vec<Job> {
        match self {
            Error::Jobs(failures) => failures.iter().map(|f| f.job).collect(),
        }
    }
}

fn list(failures: &[JobFailure]) -> String {
    failures
        .iter()
        .map(JobFailure::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
