//! Defines the [`ArchiveIndex`], which groups entries by calendar month, the
//! per-year summary built from it, and the job that writes
//! `archive/<year>/<month>/index.html` for every month with entries plus the
//! `archive/index.html` summary.

use crate::config::SiteConfig;
use crate::entry::{Entry, EntryCollection};
use crate::theme::Theme;
use crate::value;
use crate::write::{Renderer, Result};
use gtmpl_value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// The directory (relative to the output root) holding the archive pages.
pub const ARCHIVE_DIRECTORY: &str = "archive";

const ARCHIVE_PAGE_TEMPLATE: &str = "archive_page.tmpl";
const ARCHIVE_INDEX_TEMPLATE: &str = "archive.tmpl";

/// Identifies one calendar month. Both parts are fixed-width strings (`2020`,
/// `01`), so the derived ordering is chronological.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveKey {
    pub year: String,
    pub month: String,
}

impl ArchiveKey {
    /// The key for the month `entry` was published in. Only the year and
    /// month of the timestamp matter.
    pub fn of(entry: &Entry) -> ArchiveKey {
        ArchiveKey {
            year: entry.year(),
            month: entry.month_number(),
        }
    }

    /// The page's path relative to the archive directory, e.g. `2020/01`.
    pub fn path(&self) -> PathBuf {
        Path::new(&self.year).join(&self.month)
    }
}

impl fmt::Display for ArchiveKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.month)
    }
}

/// Maps each month with entries to those entries, oldest first (ties in
/// collection order).
#[derive(Debug, Default)]
pub struct ArchiveIndex<'a> {
    periods: BTreeMap<ArchiveKey, Vec<&'a Entry>>,
}

impl<'a> ArchiveIndex<'a> {
    pub fn build(entries: &'a [Entry]) -> ArchiveIndex<'a> {
        let mut periods: BTreeMap<ArchiveKey, Vec<&'a Entry>> = BTreeMap::new();
        for entry in entries {
            periods.entry(ArchiveKey::of(entry)).or_default().push(entry);
        }
        for bucket in periods.values_mut() {
            bucket.sort_by(|a, b| a.date.cmp(&b.date));
        }
        ArchiveIndex { periods }
    }

    pub fn get(&self, key: &ArchiveKey) -> Option<&[&'a Entry]> {
        self.periods.get(key).map(Vec::as_slice)
    }

    /// Iterates over the months in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&ArchiveKey, &[&'a Entry])> + '_ {
        self.periods.iter().map(|(key, entries)| (key, entries.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Summarizes the index per year: years ascending, and within each year
    /// the months ascending by number.
    pub fn years(&self) -> Vec<ArchiveYear> {
        let mut years: Vec<ArchiveYear> = Vec::new();
        for (key, entries) in self.iter() {
            // Every bucket is non-empty, and all members share the month, so
            // any member can supply the month's name.
            let month = MonthCount {
                year: key.year.clone(),
                month: key.month.clone(),
                month_name: entries[0].month_name(),
                count: entries.len(),
            };
            match years.last_mut() {
                Some(year) if year.year == key.year => year.months.push(month),
                _ => years.push(ArchiveYear {
                    year: key.year.clone(),
                    months: vec![month],
                }),
            }
        }
        years
    }
}

/// The months of one year that have entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveYear {
    pub year: String,
    pub months: Vec<MonthCount>,
}

/// The number of entries published in one month.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthCount {
    pub year: String,
    pub month: String,
    pub month_name: String,
    pub count: usize,
}

impl From<&MonthCount> for Value {
    fn from(m: &MonthCount) -> Value {
        value::object(vec![
            ("year", (&m.year).into()),
            ("month", (&m.month).into()),
            ("month_name", (&m.month_name).into()),
            ("count", value::count(m.count)),
        ])
    }
}

impl From<&ArchiveYear> for Value {
    fn from(y: &ArchiveYear) -> Value {
        value::object(vec![
            ("year", (&y.year).into()),
            ("months", Value::Array(y.months.iter().map(Value::from).collect())),
        ])
    }
}

/// Writes one page per month and the archive summary.
pub fn write_archive(config: &SiteConfig, theme: &Theme, collection: &EntryCollection) -> Result<()> {
    let mut renderer = Renderer::new(theme, config);
    let index = ArchiveIndex::build(collection.entries());
    let recent = value::entries(&collection.recent());
    let root = Path::new(ARCHIVE_DIRECTORY);

    for (key, entries) in index.iter() {
        renderer.render(
            ARCHIVE_PAGE_TEMPLATE,
            value::object(vec![
                ("title", Value::String(format!("{} {}", entries[0].month_name(), key.year))),
                ("year", Value::String(key.year.clone())),
                ("month", Value::String(entries[0].month_name())),
                ("month_number", Value::String(key.month.clone())),
                ("entries", value::entries(entries)),
                ("recent", recent.clone()),
            ]),
            &root.join(key.path()).join("index.html"),
        )?;
    }

    renderer.render(
        ARCHIVE_INDEX_TEMPLATE,
        value::object(vec![
            ("title", Value::from("Archive")),
            (
                "years",
                Value::Array(index.years().iter().map(Value::from).collect()),
            ),
            ("recent", recent),
        ]),
        &root.join("index.html"),
    )?;

    log::debug!("wrote {} archive pages", index.len());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entry::test::entry;
    use pretty_assertions::assert_eq;

    fn key(year: &str, month: &str) -> ArchiveKey {
        ArchiveKey {
            year: year.to_owned(),
            month: month.to_owned(),
        }
    }

    fn titles(entries: &[&Entry]) -> Vec<String> {
        entries.iter().map(|e| e.title.clone()).collect()
    }

    #[test]
    fn test_key_ignores_day_and_time() {
        let a = entry("a", "2020-01-01T00:00:00Z", &[]);
        let b = entry("b", "2020-01-31T23:59:59Z", &[]);
        assert_eq!(ArchiveKey::of(&a), ArchiveKey::of(&b));
        assert_eq!(ArchiveKey::of(&a).to_string(), "2020/01");
        assert_eq!(ArchiveKey::of(&a).path(), Path::new("2020").join("01"));
    }

    #[test]
    fn test_build_and_summarize() {
        let entries = vec![
            entry("feb", "2020-02-01", &["blog"]),
            entry("jan20", "2020-01-20", &["go", "blog"]),
            entry("jan05", "2020-01-05", &["go"]),
        ];
        let index = ArchiveIndex::build(&entries);

        assert_eq!(index.len(), 2);
        assert_eq!(titles(index.get(&key("2020", "01")).unwrap()), vec!["jan05", "jan20"]);
        assert_eq!(titles(index.get(&key("2020", "02")).unwrap()), vec!["feb"]);

        assert_eq!(
            index.years(),
            vec![ArchiveYear {
                year: "2020".to_owned(),
                months: vec![
                    MonthCount {
                        year: "2020".to_owned(),
                        month: "01".to_owned(),
                        month_name: "January".to_owned(),
                        count: 2,
                    },
                    MonthCount {
                        year: "2020".to_owned(),
                        month: "02".to_owned(),
                        month_name: "February".to_owned(),
                        count: 1,
                    },
                ],
            }]
        );
    }

    #[test]
    fn test_months_sort_by_number_not_name() {
        // Alphabetically "December" < "February" < "October".
        let entries = vec![
            entry("oct", "2019-10-01", &[]),
            entry("dec", "2019-12-01", &[]),
            entry("feb", "2019-02-01", &[]),
            entry("next", "2021-03-01", &[]),
        ];
        let years = ArchiveIndex::build(&entries).years();
        let labels: Vec<(String, Vec<String>)> = years
            .iter()
            .map(|y| (y.year.clone(), y.months.iter().map(|m| m.month_name.clone()).collect()))
            .collect();
        assert_eq!(
            labels,
            vec![
                (
                    "2019".to_owned(),
                    vec!["February".to_owned(), "October".to_owned(), "December".to_owned()]
                ),
                ("2021".to_owned(), vec!["March".to_owned()]),
            ]
        );
    }

    #[test]
    fn test_buckets_are_chronological() {
        let entries = vec![
            entry("c", "2020-05-30T12:00:00Z", &[]),
            entry("a", "2020-05-01T08:00:00Z", &[]),
            entry("b", "2020-05-01T09:00:00Z", &[]),
        ];
        let index = ArchiveIndex::build(&entries);
        for (_, bucket) in index.iter() {
            assert!(bucket.windows(2).all(|w| w[0].date <= w[1].date));
        }
        assert_eq!(titles(index.get(&key("2020", "05")).unwrap()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_write_archive() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::write::test::config(dir.path());
        let theme = Theme::from_sources(
            vec![
                (
                    "archive_page.tmpl",
                    "{{ .month }} {{ .year }}:{{ range .entries }}{{ .title }},{{ end }}",
                ),
                (
                    "archive.tmpl",
                    "{{ range .years }}{{ .year }}[{{ range .months }}{{ .month }}={{ .count }};{{ end }}]{{ end }}",
                ),
            ],
            "",
        );
        let collection = EntryCollection::new(
            vec![
                entry("b", "2020-02-01", &[]),
                entry("a", "2020-01-05", &[]),
            ],
            10,
        );
        write_archive(&config, &theme, &collection)?;

        let read = |p: &str| {
            std::fs::read_to_string(dir.path().join(p))
                .unwrap()
                .trim_end()
                .to_owned()
        };
        assert_eq!(read("archive/2020/01/index.html"), "January 2020:a,");
        assert_eq!(read("archive/2020/02/index.html"), "February 2020:b,");
        assert_eq!(read("archive/index.html"), "2020[01=1;02=1;]");
        Ok(())
    }
}
