//! Catalog browsing commands

use anyhow::Result;
use clap::Subcommand;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use library_core::library::{LibraryStatus, OwnershipLedger, PackDescriptor};

use crate::runtime::Runtime;

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List every pack in the catalog
    List {
        /// Only packs in this category
        #[clap(long)]
        category: Option<String>,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Search packs by id, name, description, or category
    Search {
        query: String,

        /// Output results as JSON
        #[clap(long)]
        json: bool,
    },

    /// Show details of one pack
    Show {
        /// Pack id
        pack: String,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },
}

impl CatalogCommand {
    pub async fn execute(self, runtime: &Runtime) -> Result<()> {
        match self {
            CatalogCommand::List { category, json } => {
                let index = runtime.fetch_index().await?;
                let packs: Vec<&PackDescriptor> = match &category {
                    Some(c) => index.filter_by_category(c),
                    None => index.list_all().iter().collect(),
                };
                print_packs(runtime, packs, json).await?;

                if !json && category.is_none() && !index.categories().is_empty() {
                    println!("\nCategories: {}", index.categories().join(", "));
                }
                Ok(())
            }
            CatalogCommand::Search { query, json } => {
                let index = runtime.fetch_index().await?;
                print_packs(runtime, index.search(&query), json).await
            }
            CatalogCommand::Show { pack, json } => execute_show(runtime, &pack, json).await,
        }
    }
}

/// Table row for pack listings
#[derive(Tabled)]
struct PackRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Description")]
    description: String,
}

/// Ledger for status columns; listing still works without a tenant
async fn ledger_if_configured(runtime: &Runtime) -> Option<OwnershipLedger> {
    use library_core::library::LedgerStore;

    let ledger = runtime.ledger().ok()?;
    match ledger.load().await {
        Ok(ledger) => Some(ledger),
        Err(e) => {
            tracing::warn!("Could not read ownership ledger: {}", e);
            None
        }
    }
}

async fn print_packs(runtime: &Runtime, mut packs: Vec<&PackDescriptor>, json: bool) -> Result<()> {
    packs.sort_by(|a, b| a.name.cmp(&b.name));
    let ledger = ledger_if_configured(runtime).await;
    let status_of = |pack: &PackDescriptor| ledger.as_ref().map(|l| LibraryStatus::for_pack(pack, l));

    if json {
        let results: Vec<serde_json::Value> = packs
            .iter()
            .map(|pack| {
                serde_json::json!({
                    "pack": pack,
                    "status": status_of(pack),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if packs.is_empty() {
        println!("No packs found.");
        return Ok(());
    }

    let rows: Vec<PackRow> = packs
        .iter()
        .map(|pack| PackRow {
            id: pack.id.clone(),
            name: pack.name.clone(),
            version: pack.version.clone(),
            category: pack.category_display().to_string(),
            status: status_of(pack)
                .map(|s| s.label().to_string())
                .unwrap_or_else(|| "-".to_string()),
            description: truncate(pack.short_description(), 50),
        })
        .collect();

    println!("Found {} pack(s):\n", rows.len());
    print_table(&rows);
    Ok(())
}

async fn execute_show(runtime: &Runtime, pack_id: &str, json: bool) -> Result<()> {
    let pack = runtime.find_pack(pack_id).await?;
    let status = ledger_if_configured(runtime)
        .await
        .map(|l| (LibraryStatus::for_pack(&pack, &l), l));

    if json {
        let output = serde_json::json!({
            "pack": pack,
            "status": status.as_ref().map(|(s, _)| s),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Pack:     {} ({})", pack.name, pack.id);
    println!("Version:  {}", pack.version);
    println!("Category: {}", pack.category_display());
    if let Some(count) = pack.entry_count {
        println!("Entries:  {count}");
    }

    if let Some((status, ledger)) = &status {
        match status {
            LibraryStatus::NotInstalled => println!("Status:   not installed"),
            LibraryStatus::UpToDate => println!("Status:   installed"),
            LibraryStatus::UpdateAvailable { installed } => {
                println!("Status:   update available (installed {installed})")
            }
        }
        if let Some(record) = ledger.get(&pack.id) {
            println!(
                "Installed {} with {} entries",
                record.installed_at.format("%Y-%m-%d %H:%M"),
                record.owned_entry_ids.len()
            );
        }
    }

    if !pack.description.is_empty() {
        println!();
        println!("Description:");
        for line in pack.description.lines() {
            println!("  {line}");
        }
    }

    println!();
    println!("Install:");
    println!("  overlay-library analyze {}", pack.id);
    println!("  overlay-library install {}", pack.id);
    Ok(())
}

pub(crate) fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let cut: String = value.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        value.to_string()
    }
}

pub(crate) fn print_table<T: Tabled>(rows: &[T]) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();
    println!("{table}");
}
