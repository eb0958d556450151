//! Pack lifecycle commands: analyze, install, uninstall, installed, outdated

use anyhow::{Context, Result};
use clap::Args;
use tabled::Tabled;

use library_core::library::{
    outdated, CandidateEntry, InstallSession, LibraryStatus, SelectionState,
};
use library_core::LibraryError;

use crate::catalog_cli::{print_table, truncate};
use crate::runtime::Runtime;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Pack id
    pub pack: String,

    /// Limit --include-duplicates and --exclude-new to rows matching this text
    #[clap(long)]
    pub filter: Option<String>,

    /// Accept duplicates, replacing the existing entries they match
    #[clap(long)]
    pub include_duplicates: bool,

    /// Deselect new entries
    #[clap(long)]
    pub exclude_new: bool,

    /// Flip the selection of a row, by the number shown in `analyze`
    #[clap(long)]
    pub toggle: Vec<usize>,

    /// Skip the confirmation prompt
    #[clap(long, short)]
    pub yes: bool,
}

/// Apply install flags on top of the default selection
///
/// Bulk flags only touch rows matching the filter. Toggles are applied
/// last and may target any row.
pub fn apply_selection(selection: &mut SelectionState, args: &InstallArgs) -> Result<()> {
    let rows = selection.filter(args.filter.as_deref().unwrap_or(""));

    for i in rows {
        let duplicate = selection.candidates()[i].is_duplicate();
        if duplicate && args.include_duplicates {
            selection.set(i, true);
        }
        if !duplicate && args.exclude_new {
            selection.set(i, false);
        }
    }

    for &n in &args.toggle {
        let index = n.checked_sub(1).context("Row numbers start at 1")?;
        selection
            .toggle(index)
            .with_context(|| format!("No row {n}; the pack has {} rows", selection.len()))?;
    }

    Ok(())
}

/// Table row for candidate listings
#[derive(Tabled)]
struct CandidateRow {
    #[tabled(rename = "#")]
    number: usize,
    #[tabled(rename = "Install")]
    selected: &'static str,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Trigger")]
    trigger: String,
    #[tabled(rename = "Category")]
    category: String,
}

fn candidate_rows<'a>(
    candidates: &'a [CandidateEntry],
    indices: impl IntoIterator<Item = usize> + 'a,
) -> Vec<CandidateRow> {
    indices
        .into_iter()
        .map(|i| {
            let c = &candidates[i];
            CandidateRow {
                number: i + 1,
                selected: if c.selected { "yes" } else { "no" },
                status: if c.is_duplicate() { "duplicate" } else { "new" },
                title: truncate(&c.entry.title, 40),
                trigger: c.entry.trigger.clone().unwrap_or_default(),
                category: c.entry.category.clone().unwrap_or_default(),
            }
        })
        .collect()
}

async fn open_session(runtime: &Runtime, pack_id: &str) -> Result<InstallSession> {
    let pack = runtime.find_pack(pack_id).await?;
    let catalog = runtime.catalog()?;
    let store = runtime.content_store()?;

    InstallSession::open(&catalog, &store, pack)
        .await
        .with_context(|| format!("Failed to analyze pack '{pack_id}'"))
}

pub async fn analyze_command(
    runtime: &Runtime,
    pack_id: &str,
    filter: Option<&str>,
    json: bool,
) -> Result<()> {
    let session = open_session(runtime, pack_id).await?;
    let selection = session.selection();
    let indices = selection.filter(filter.unwrap_or(""));

    if json {
        let candidates: Vec<&CandidateEntry> =
            indices.iter().map(|&i| &selection.candidates()[i]).collect();
        let output = serde_json::json!({
            "pack": session.descriptor(),
            "summary": session.summary(),
            "candidates": candidates,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let summary = session.summary();
    println!(
        "{} v{}: {} new, {} duplicate",
        session.descriptor().name,
        session.descriptor().version,
        summary.new_count,
        summary.duplicate_count
    );
    if indices.is_empty() {
        println!("No rows match.");
        return Ok(());
    }
    println!();
    print_table(&candidate_rows(selection.candidates(), indices));
    Ok(())
}

pub async fn install_command(runtime: &Runtime, args: InstallArgs) -> Result<()> {
    let mut session = open_session(runtime, &args.pack).await?;
    apply_selection(session.selection_mut(), &args)?;

    let selection = session.selection();
    let selected: Vec<usize> = (0..selection.len())
        .filter(|&i| selection.candidates()[i].selected)
        .collect();

    if selected.is_empty() {
        println!("Nothing selected; no changes made.");
        return Ok(());
    }

    let replacing = selected
        .iter()
        .filter(|&&i| selection.candidates()[i].is_duplicate())
        .count();
    println!(
        "Installing {} of {} entries from {} v{} ({} replacing existing entries):\n",
        selected.len(),
        selection.len(),
        session.descriptor().name,
        session.descriptor().version,
        replacing
    );
    print_table(&candidate_rows(selection.candidates(), selected));

    if !args.yes && !confirm("\nProceed? [y/N]: ")? {
        println!("Install cancelled");
        return Ok(());
    }

    let installer = runtime.installer()?;
    let result = session.install(&installer).await?;

    println!();
    println!("Installed {} entries", result.success_count);
    if result.deleted_duplicates > 0 {
        println!("Replaced {} existing entries", result.deleted_duplicates);
    }
    if result.error_count > 0 {
        println!("{} entries failed; see log output", result.error_count);
    }
    if result.failed_deletes > 0 {
        println!(
            "{} existing entries could not be removed and remain alongside their replacements",
            result.failed_deletes
        );
    }
    if result.success_count == 0 {
        anyhow::bail!("No entries of '{}' were installed", args.pack);
    }
    if let Some(reason) = &result.ledger_error {
        println!(
            "These entries were created but are not tracked: {}",
            result.owned_entry_ids.join(", ")
        );
        anyhow::bail!(
            "Installed '{}' ({}) but could not record it: {}",
            args.pack,
            result.summary(),
            reason
        );
    }
    Ok(())
}

pub async fn uninstall_command(runtime: &Runtime, pack_id: &str, yes: bool) -> Result<()> {
    use library_core::library::LedgerStore;

    let ledger = runtime.ledger()?;
    let Some(record) = ledger.get(pack_id).await? else {
        return Err(LibraryError::NotInstalled {
            pack_id: pack_id.to_string(),
        }
        .into());
    };
    println!(
        "'{}' v{} owns {} entries in tenant {}",
        pack_id,
        record.version,
        record.owned_entry_ids.len(),
        runtime.tenant()?
    );

    if !yes && !confirm("Remove them? [y/N]: ")? {
        println!("Uninstall cancelled");
        return Ok(());
    }

    let result = runtime.installer()?.uninstall(pack_id).await?;
    println!("Removed {} entries", result.success_count);
    if result.error_count > 0 {
        println!(
            "{} entries could not be removed and are no longer tracked",
            result.error_count
        );
    }
    Ok(())
}

/// Table row for installed packs
#[derive(Tabled)]
struct InstalledRow {
    #[tabled(rename = "Pack")]
    pack: String,
    #[tabled(rename = "Installed")]
    version: String,
    #[tabled(rename = "Entries")]
    entries: usize,
    #[tabled(rename = "Date")]
    installed_at: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub async fn installed_command(runtime: &Runtime, json: bool) -> Result<()> {
    let ledger = runtime.installer()?.installed().await?;

    if ledger.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("No packs installed for tenant {}", runtime.tenant()?);
        }
        return Ok(());
    }

    // Status is best-effort; the ledger alone is enough to list packs
    let index = match runtime.fetch_index().await {
        Ok(index) => Some(index),
        Err(e) => {
            tracing::warn!("Catalog unavailable, status omitted: {:#}", e);
            None
        }
    };
    let status_of = |pack_id: &str| {
        let index = index.as_ref()?;
        Some(match index.get(pack_id) {
            Some(pack) => LibraryStatus::for_pack(pack, &ledger).label(),
            None => "withdrawn",
        })
    };

    if json {
        let output: Vec<serde_json::Value> = ledger
            .packs
            .iter()
            .map(|(id, record)| {
                serde_json::json!({
                    "packId": id,
                    "record": record,
                    "status": status_of(id),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let rows: Vec<InstalledRow> = ledger
        .packs
        .iter()
        .map(|(id, record)| InstalledRow {
            pack: id.clone(),
            version: record.version.clone(),
            entries: record.owned_entry_ids.len(),
            installed_at: record.installed_at.format("%Y-%m-%d %H:%M").to_string(),
            status: status_of(id).unwrap_or("-").to_string(),
        })
        .collect();
    print_table(&rows);
    Ok(())
}

/// Table row for outdated packs
#[derive(Tabled)]
struct OutdatedRow {
    #[tabled(rename = "Pack")]
    pack: String,
    #[tabled(rename = "Installed")]
    installed: String,
    #[tabled(rename = "Available")]
    available: String,
}

pub async fn outdated_command(runtime: &Runtime, json: bool) -> Result<()> {
    let ledger = runtime.installer()?.installed().await?;
    let index = runtime.fetch_index().await?;
    let packs = outdated(&index, &ledger);

    if json {
        println!("{}", serde_json::to_string_pretty(&packs)?);
        return Ok(());
    }

    if packs.is_empty() {
        println!("All installed packs are up to date.");
        return Ok(());
    }

    let rows: Vec<OutdatedRow> = packs
        .into_iter()
        .map(|p| OutdatedRow {
            pack: p.pack_id,
            installed: p.installed_version,
            available: p
                .available_version
                .unwrap_or_else(|| "withdrawn".to_string()),
        })
        .collect();
    print_table(&rows);
    println!("\nRun `overlay-library install <pack>` to update.");
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
