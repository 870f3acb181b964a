//! The front page (`index.html`) and the RSS feed (`index.rss`). Both show
//! the recent view and nothing else, so neither sorts or limits anything
//! itself.

use crate::config::SiteConfig;
use crate::entry::EntryCollection;
use crate::theme::Theme;
use crate::value;
use crate::write::{Renderer, Result};
use gtmpl_value::Value;
use std::path::Path;

const INDEX_TEMPLATE: &str = "index.tmpl";
const FEED_TEMPLATE: &str = "index.rss";

/// The title of the front page and the feed channel.
const SITE_TITLE: &str = "Blog";

/// Writes `index.html`.
pub fn write_index(config: &SiteConfig, theme: &Theme, collection: &EntryCollection) -> Result<()> {
    Renderer::new(theme, config).render(INDEX_TEMPLATE, recent_page(collection), Path::new("index.html"))?;
    Ok(())
}

/// Writes `index.rss`.
pub fn write_feed(config: &SiteConfig, theme: &Theme, collection: &EntryCollection) -> Result<()> {
    Renderer::new(theme, config).render(FEED_TEMPLATE, recent_page(collection), Path::new("index.rss"))?;
    Ok(())
}

/// The page data shared by the front page and the feed. `updated` is the
/// newest entry's date rather than the time of the build, so rebuilding an
/// unchanged site produces an identical feed.
fn recent_page(collection: &EntryCollection) -> Value {
    let recent = value::entries(&collection.recent());
    value::object(vec![
        ("title", Value::from(SITE_TITLE)),
        ("entries", recent.clone()),
        ("recent", recent),
        (
            "updated",
            match collection.newest() {
                Some(newest) => Value::String(newest.date.to_rfc3339()),
                None => Value::Nil,
            },
        ),
    ])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entry::test::entry;

    fn theme() -> Theme {
        Theme::from_sources(
            vec![
                ("index.tmpl", "{{ range .entries }}{{ .title }},{{ end }}|{{ range .recent }}{{ .title }},{{ end }}"),
                ("index.rss", "{{ if .updated }}{{ ISO8601 .updated }}{{ end }}:{{ range .entries }}{{ .title }},{{ end }}"),
            ],
            "",
        )
    }

    fn read(dir: &Path, file: &str) -> String {
        std::fs::read_to_string(dir.join(file)).unwrap().trim_end().to_owned()
    }

    #[test]
    fn test_index_and_feed_share_the_recent_view() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let mut config = crate::write::test::config(dir.path());
        config.recent_count = 2;
        let collection = EntryCollection::new(
            vec![
                entry("a", "2020-01-01", &[]),
                entry("c", "2020-03-01", &[]),
                entry("b", "2020-02-01", &[]),
            ],
            config.recent_count,
        );

        write_index(&config, &theme(), &collection)?;
        write_feed(&config, &theme(), &collection)?;

        assert_eq!(read(dir.path(), "index.html"), "c,b,|c,b,");
        assert_eq!(read(dir.path(), "index.rss"), "2020-03-01T00:00:00Z:c,b,");
        Ok(())
    }

    #[test]
    fn test_empty_site() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::write::test::config(dir.path());
        let collection = EntryCollection::new(Vec::new(), 10);
        write_feed(&config, &theme(), &collection)?;
        assert_eq!(read(dir.path(), "index.rss"), ":");
        Ok(())
    }

    #[test]
    fn test_embedded_feed_is_rss() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::write::test::config(dir.path());
        let mut query = entry("Q & A", "2020-01-15", &[]);
        query.link = url::Url::parse("https://example.org/a.html?x=1&y=2").unwrap();
        let collection = EntryCollection::new(vec![query], 10);

        write_feed(&config, &Theme::embedded(), &collection)?;

        let feed = read(dir.path(), "index.rss");
        assert!(feed.starts_with("<?xml"));
        assert!(feed.contains("<title>Q &amp; A</title>"), "{}", feed);
        assert!(feed.contains("<link>https://example.org/a.html?x=1&amp;y=2</link>"), "{}", feed);
        assert!(feed.contains("<guid>https://example.org/a.html?x=1&amp;y=2</guid>"), "{}", feed);
        assert!(feed.contains("<pubDate>Wed, 15 Jan 2020 00:00:00 +0000</pubDate>"), "{}", feed);
        assert!(feed.contains("<lastBuildDate>Wed, 15 Jan 2020 00:00:00 +0000</lastBuildDate>"), "{}", feed);
        assert!(!feed.contains("&y="));
        Ok(())
    }
}
