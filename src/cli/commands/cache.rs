//! Cache command - inspect and clear cache stores

use crate::cache::{format_bytes, CacheName, CacheStorage, CachedResponse, StoreSummary};
use crate::cli::args::{CacheAction, CacheArgs, OutputFormat};
use crate::config::{Config, StatePaths};
use crate::error::B64Result;
use crate::ui::{self, UiContext};
use crate::worker::CacheManifest;
use console::style;
use serde::Serialize;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config, paths: &StatePaths) -> B64Result<()> {
    let storage = CacheStorage::open_dir(&paths.caches_dir()).await?;
    let current = CacheManifest::from_config(config)
        .map(|m| m.cache_name_string())
        .ok();

    match args.action {
        CacheAction::List { format } => list_stores(&storage, current.as_deref(), format).await,
        CacheAction::Show { name, format } => show_store(&storage, &name, format).await,
        CacheAction::Clear { yes } => {
            let ctx = UiContext::detect().with_auto_yes(yes);
            clear_stores(&ctx, &storage).await
        }
    }
}

async fn list_stores(
    storage: &CacheStorage,
    current: Option<&str>,
    format: OutputFormat,
) -> B64Result<()> {
    let stores = storage.summaries().await;

    if stores.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No cache stores");
            }
        }
        return Ok(());
    }

    match format {
        OutputFormat::Table => print_store_table(&stores, current),
        OutputFormat::Json => print_store_json(&stores)?,
        OutputFormat::Plain => {
            for store in &stores {
                println!("{}", store.name);
            }
        }
    }
    Ok(())
}

fn print_store_table(stores: &[StoreSummary], current: Option<&str>) {
    println!(
        "{:<32} {:<12} {:<8} {:<10} {:<20}",
        "STORE", "VERSION", "ENTRIES", "SIZE", "CREATED"
    );
    println!("{}", "-".repeat(85));

    let mut total = 0;
    for store in stores {
        total += store.size_bytes;
        let name = if Some(store.name.as_str()) == current {
            style(format!("{} *", store.name)).green().to_string()
        } else {
            store.name.clone()
        };
        println!(
            "{:<32} {:<12} {:<8} {:<10} {:<20}",
            name,
            store_version(&store.name).unwrap_or_else(|| "-".to_string()),
            store.entries,
            format_bytes(store.size_bytes),
            store.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!();
    println!(
        "Total: {} store(s), {}  (* = configured version)",
        stores.len(),
        format_bytes(total)
    );
}

/// Deployment version encoded in a store name, if it follows the convention
fn store_version(name: &str) -> Option<String> {
    CacheName::parse(name).map(|n| n.version().to_string())
}

fn print_store_json(stores: &[StoreSummary]) -> B64Result<()> {
    #[derive(Serialize)]
    struct StoreJson<'a> {
        name: &'a str,
        version: Option<String>,
        entries: usize,
        size_bytes: u64,
        created_at: String,
    }

    let json: Vec<StoreJson> = stores
        .iter()
        .map(|s| StoreJson {
            name: &s.name,
            version: store_version(&s.name),
            entries: s.entries,
            size_bytes: s.size_bytes,
            created_at: s.created_at.to_rfc3339(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn show_store(storage: &CacheStorage, name: &str, format: OutputFormat) -> B64Result<()> {
    let entries = storage.entries(name).await?;

    match format {
        OutputFormat::Table => print_entry_table(name, &entries),
        OutputFormat::Json => print_entry_json(&entries)?,
        OutputFormat::Plain => {
            for (key, _) in &entries {
                println!("{}", key);
            }
        }
    }
    Ok(())
}

fn print_entry_table(name: &str, entries: &[(String, CachedResponse)]) {
    let ctx = UiContext::detect();
    ui::intro(&ctx, name);

    if entries.is_empty() {
        ui::step_info(&ctx, "Store is empty");
        return;
    }

    println!(
        "{:<56} {:<6} {:<24} {:<10}",
        "REQUEST", "STATUS", "TYPE", "SIZE"
    );
    println!("{}", "-".repeat(98));
    for (key, entry) in entries {
        let response = &entry.response;
        println!(
            "{:<56} {:<6} {:<24} {:<10}",
            key,
            response.status,
            response.content_type().unwrap_or("-"),
            format_bytes(entry.size())
        );
    }
    println!();
    println!("{} entr(ies)", entries.len());
}

fn print_entry_json(entries: &[(String, CachedResponse)]) -> B64Result<()> {
    #[derive(Serialize)]
    struct EntryJson<'a> {
        request: &'a str,
        status: u16,
        content_type: Option<&'a str>,
        size_bytes: u64,
        sha256: &'a str,
        cached_at: String,
    }

    let json: Vec<EntryJson> = entries
        .iter()
        .map(|(key, entry)| EntryJson {
            request: key,
            status: entry.response.status,
            content_type: entry.response.content_type(),
            size_bytes: entry.size(),
            sha256: &entry.sha256,
            cached_at: entry.cached_at.to_rfc3339(),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

async fn clear_stores(ctx: &UiContext, storage: &CacheStorage) -> B64Result<()> {
    let names = storage.keys().await;

    if names.is_empty() {
        // Drops files of stores that failed to load
        storage.persist().await?;
        ui::step_info(ctx, "No cache stores to clear");
        return Ok(());
    }

    println!("This will remove {} cache store(s):", names.len());
    for name in &names {
        println!("  {} {}", style("•").red(), name);
    }
    println!();

    if !ui::confirm(ctx, "Clear all cache stores?", false).await? {
        ui::step_info(ctx, "Cancelled");
        return Ok(());
    }

    let removed = storage.clear().await;
    storage.persist().await?;
    ui::step_ok(ctx, &format!("Removed {} cache store(s)", removed));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{Method, RequestKey, Response};
    use tempfile::TempDir;
    use url::Url;

    async fn seeded(dir: &std::path::Path) -> CacheStorage {
        let storage = CacheStorage::open_dir(dir).await.unwrap();
        storage.open("base64-app-v1.0.0").await;
        let url = Url::parse("http://localhost:3000/").unwrap();
        storage
            .put(
                "base64-app-v1.0.0",
                &RequestKey::new(Method::Get, &url),
                Response::new(url.as_str(), 200, "shell"),
            )
            .await
            .unwrap();
        storage.persist().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn clear_with_yes_removes_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("caches");
        let storage = seeded(&dir).await;

        let ctx = UiContext::non_interactive().with_auto_yes(true);
        clear_stores(&ctx, &storage).await.unwrap();
        assert!(storage.keys().await.is_empty());
        assert!(!dir.join("base64-app-v1.0.0.json").exists());
    }

    #[tokio::test]
    async fn clear_without_confirmation_keeps_stores() {
        let temp = TempDir::new().unwrap();
        let storage = seeded(&temp.path().join("caches")).await;

        // Non-interactive default is "no"
        clear_stores(&UiContext::non_interactive(), &storage)
            .await
            .unwrap();
        assert_eq!(storage.keys().await.len(), 1);
    }

    #[tokio::test]
    async fn clear_recovers_from_corrupt_store() {
        let temp = TempDir::new().unwrap();
        let paths = StatePaths::new(temp.path().to_path_buf());
        let dir = paths.caches_dir();
        seeded(&dir).await;

        // Flip the cached body so it no longer matches its digest
        let file = dir.join("base64-app-v1.0.0.json");
        let content = std::fs::read_to_string(&file).unwrap();
        std::fs::write(&file, content.replace("c2hlbGw=", "c2hlbGx5")).unwrap();

        let args = CacheArgs {
            action: CacheAction::Clear { yes: true },
        };
        execute(args, &Config::default(), &paths).await.unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn version_from_store_name() {
        assert_eq!(store_version("base64-app-v1.2.0").as_deref(), Some("1.2.0"));
        assert_eq!(store_version("scratch"), None);
    }

    #[tokio::test]
    async fn show_missing_store_fails() {
        let storage = CacheStorage::new();
        assert!(show_store(&storage, "nope", OutputFormat::Plain).await.is_err());
    }
}
