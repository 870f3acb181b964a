use anyhow::{Context, Result};
use clap::{App, Arg};
use ephemeris::build::{build_site, Job};
use ephemeris::config::{Config, PROJECT_FILE};
use ephemeris::entry::EntryCollection;
use ephemeris::parser::Parser;
use ephemeris::theme::Theme;
use std::path::Path;
use std::time::Instant;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("ephemeris")
        .about("Compiles a directory of posts into a static blog")
        .arg(
            Arg::with_name("config")
                .long("config")
                .takes_value(true)
                .value_name("PATH")
                .help(&*format!(
                    "The project file, or a directory to search upwards from for `{}`",
                    PROJECT_FILE
                )),
        )
        .arg(
            Arg::with_name("no-comments")
                .long("no-comments")
                .help("Don't offer the comment form on the most recent entry"),
        )
        .get_matches();

    let config_path = Path::new(matches.value_of("config").unwrap_or("."));
    let allow_comments = !matches.is_present("no-comments");

    if let Err(err) = run(config_path, allow_comments) {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(config_path: &Path, allow_comments: bool) -> Result<()> {
    let start = Instant::now();
    let config = Config::load(config_path, allow_comments)?;

    let entries = Parser::new(&config.prefix)
        .parse_entries(&config.posts_directory)
        .with_context(|| format!("Reading posts from `{}`", config.posts_directory.display()))?;
    let collection = EntryCollection::new(entries, config.site.recent_count);
    println!("Read {} blog posts.", collection.len());

    let theme = match &config.theme_directory {
        Some(dir) => Theme::from_directory(dir)
            .with_context(|| format!("Loading theme from `{}`", dir.display()))?,
        None => Theme::embedded(),
    };
    log::debug!("theme templates: {}", theme.names().collect::<Vec<_>>().join(", "));

    let summary = build_site(&config.site, &theme, &collection).map_err(|err| {
        let failed: Vec<String> = err.failed_jobs().iter().map(Job::to_string).collect();
        log::error!("{} of {} jobs failed: {}", failed.len(), Job::ALL.len(), failed.join(", "));
        err
    })?;
    log::info!("rendered {} entries in {:?}", summary.entries, summary.elapsed);
    println!("Compilation took {:?}", start.elapsed());
    Ok(())
}
