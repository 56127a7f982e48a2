//! Command handlers. Each one opens the catalog, does its work and prints.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{bail, Result, WrapErr};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use keydex_core::{
    index_directory, CancelToken, CatalogStore, Config, IndexReport, SqliteStore, StoreError,
};

fn open_store(config: &Config) -> Result<SqliteStore> {
    let path = &config.storage.database_path;
    SqliteStore::open(path).wrap_err_with(|| format!("opening catalog {}", path.display()))
}

/// Absolute form of `dir`, as stored in the catalog.
fn location_of(dir: &Path) -> Result<String> {
    if dir.as_os_str().is_empty() {
        bail!("directory path must not be empty");
    }
    let resolved = std::fs::canonicalize(dir)
        .wrap_err_with(|| format!("resolving {}", dir.display()))?;
    Ok(resolved.to_string_lossy().into_owned())
}

/// Like [`location_of`], but keeps the path as given when it no longer exists.
fn known_location_of(dir: &Path) -> Result<String> {
    match location_of(dir) {
        Ok(location) => Ok(location),
        Err(_) if !dir.as_os_str().is_empty() => Ok(dir.to_string_lossy().into_owned()),
        Err(e) => Err(e),
    }
}

pub async fn index(config: &Config, dir: &Path) -> Result<()> {
    let location = location_of(dir)?;
    let store = Arc::new(open_store(config)?);

    match store.get_directory(&location)? {
        Some(entry) if !entry.is_whitelisted => {
            bail!("{location} is blacklisted; run `keydex whitelist` first")
        }
        Some(_) => {}
        None => {
            store.add_directory(&location)?;
        }
    }

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing in-flight files");
            on_interrupt.cancel();
        }
    });

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Indexing {location}"));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = index_directory(Path::new(&location), config, store, cancel).await;
    spinner.finish_and_clear();

    let report = result.wrap_err_with(|| format!("indexing {location}"))?;
    print_report(&location, &report);
    Ok(())
}

fn print_report(location: &str, report: &IndexReport) {
    if report.cancelled {
        println!("Indexing of {location} cancelled after {:.1?}", report.elapsed);
    } else {
        println!("Indexed {location} in {:.1?}", report.elapsed);
    }
    println!("  Files found:        {}", report.files_seen);
    println!("  Files recorded:     {}", report.files_recorded);
    println!("  Metadata only:      {}", report.metadata_only);
    println!(
        "  Keywords:           {} across {} files",
        report.keyword_records, report.keywords_generated
    );

    let failures = [
        ("hash", report.hash_failures),
        ("read", report.extraction_failures),
        ("keywords", report.keyword_failures),
        ("record", report.store_failures),
        ("walk", report.walk_errors),
        ("task", report.task_failures),
    ];
    let failed: Vec<String> = failures
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(stage, n)| format!("{stage} {n}"))
        .collect();
    if !failed.is_empty() {
        println!("  Failures:           {} (use -v for details)", failed.join(", "));
    }
}

pub fn remove(config: &Config, dir: &Path) -> Result<()> {
    let location = known_location_of(dir)?;
    let store = open_store(config)?;

    match store.remove_directory(&location) {
        Ok(removed) => {
            println!("Removed {location} ({removed} files)");
            Ok(())
        }
        Err(StoreError::NotFound(_)) => bail!("{location} is not a registered directory"),
        Err(e) => Err(e.into()),
    }
}

pub fn search(config: &Config, query: &str) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        bail!("search query must not be empty");
    }
    let store = open_store(config)?;

    let files = store.search_files_by_name(query)?;
    let matches = store.search_keywords(query)?;

    if files.is_empty() && matches.is_empty() {
        println!("No results for {query:?}");
        return Ok(());
    }

    if !files.is_empty() {
        println!("Files:");
        for file in &files {
            println!("  {}", file.path);
        }
    }

    if !matches.is_empty() {
        let mut by_file: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for hit in &matches {
            by_file
                .entry(hit.file.path.as_str())
                .or_default()
                .push(hit.keyword.as_str());
        }

        println!("Keywords:");
        for (path, keywords) in by_file {
            println!("  {path}: {}", keywords.join(", "));
        }
    }

    Ok(())
}

pub fn dirs(config: &Config, blacklisted: bool) -> Result<()> {
    let store = open_store(config)?;
    let entries = store.list_directories(!blacklisted)?;

    if entries.is_empty() {
        let kind = if blacklisted { "blacklisted" } else { "indexed" };
        println!("No {kind} directories");
        return Ok(());
    }

    for entry in entries {
        if blacklisted {
            println!("{}", entry.location);
        } else {
            let count = store.count_files_under(&entry.location)?;
            println!("{} ({count} files)", entry.location);
        }
    }
    Ok(())
}

pub fn set_whitelisted(config: &Config, dir: &Path, whitelisted: bool) -> Result<()> {
    let location = known_location_of(dir)?;
    let store = open_store(config)?;

    let entry = store.set_whitelisted(&location, whitelisted)?;
    let state = if entry.is_whitelisted { "whitelisted" } else { "blacklisted" };
    println!("{} is now {state}", entry.location);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_location_rejects_empty() {
        assert!(location_of(&PathBuf::new()).is_err());
        assert!(known_location_of(&PathBuf::new()).is_err());
    }

    #[test]
    fn test_location_is_absolute() {
        let dir = TempDir::new().unwrap();
        let location = location_of(dir.path()).unwrap();
        assert!(Path::new(&location).is_absolute());
    }

    #[test]
    fn test_known_location_keeps_missing_path() {
        let location = known_location_of(Path::new("/definitely/not/here")).unwrap();
        assert_eq!(location, "/definitely/not/here");
    }
}
