//! The library code for the `ephemeris` blog compiler. A run has two steps:
//!
//! 1. Reading post sources into an ordered [`entry::EntryCollection`]
//!    ([`crate::parser`])
//! 2. Rendering the collection into the output tree ([`crate::build`])
//!
//! The second step is split into five independent jobs that run
//! concurrently and write disjoint parts of the tree:
//!
//! 1. Tag pages and the tag cloud ([`crate::tag`])
//! 2. Month pages and the archive summary ([`crate::archive`])
//! 3. The front page ([`crate::feed`])
//! 4. The RSS feed ([`crate::feed`])
//! 5. One page per entry ([`crate::write`])
//!
//! Every job renders through a [`write::Renderer`], which applies a named
//! template from the [`theme::Theme`] to plain page data and writes the
//! result to disk.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod archive;
pub mod build;
pub mod config;
pub mod entry;
pub mod feed;
pub mod parser;
pub mod tag;
pub mod theme;
pub mod value;
pub mod write;
