//! Library authoring commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tabled::Tabled;

use library_core::library::{build_bundle, AuthoringSelection, TenantCorpus};

use crate::catalog_cli::{print_table, truncate};
use crate::runtime::Runtime;

#[derive(Subcommand, Debug)]
pub enum AuthorCommand {
    /// Save selected records of this tenant as a library
    Bundle(BundleArgs),

    /// List libraries authored by this tenant
    List {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Install a library into another tenant
    Push {
        /// Library id
        library: String,

        /// Target tenant id
        #[clap(value_name = "TENANT")]
        target: String,
    },

    /// Delete a library
    Delete {
        /// Library id
        library: String,
    },
}

#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Library name
    #[clap(long)]
    pub name: String,

    #[clap(long, default_value = "")]
    pub description: String,

    /// Glossary entry ids (comma-separated)
    #[clap(long, value_delimiter = ',')]
    pub wiki: Vec<String>,

    /// Play ids (comma-separated)
    #[clap(long, value_delimiter = ',')]
    pub play: Vec<String>,

    /// Banner ids (comma-separated)
    #[clap(long, value_delimiter = ',')]
    pub banner: Vec<String>,

    /// Update this existing library instead of creating a new one
    #[clap(long)]
    pub library: Option<String>,
}

impl BundleArgs {
    fn selection(&self) -> AuthoringSelection {
        AuthoringSelection {
            wiki_entries: self.wiki.iter().cloned().collect(),
            plays: self.play.iter().cloned().collect(),
            banners: self.banner.iter().cloned().collect(),
        }
    }
}

impl AuthorCommand {
    pub async fn execute(self, runtime: &Runtime) -> Result<()> {
        match self {
            AuthorCommand::Bundle(args) => execute_bundle(runtime, args).await,
            AuthorCommand::List { json } => execute_list(runtime, json).await,
            AuthorCommand::Push { library, target } => {
                let counts = runtime
                    .publisher()?
                    .install_to_org(&library, &target)
                    .await
                    .with_context(|| format!("Failed to install library {library} into {target}"))?;
                println!(
                    "Installed into {}: {} wiki entries, {} plays, {} banners",
                    target, counts.wiki_entries, counts.plays, counts.banners
                );
                Ok(())
            }
            AuthorCommand::Delete { library } => {
                runtime.publisher()?.delete_library(&library).await?;
                println!("Deleted library {library}");
                Ok(())
            }
        }
    }
}

async fn execute_bundle(runtime: &Runtime, args: BundleArgs) -> Result<()> {
    let selection = args.selection();
    if selection.is_empty() {
        anyhow::bail!("Nothing selected. Pass ids with --wiki, --play, or --banner");
    }

    let store = runtime.content_store()?;
    let corpus = TenantCorpus::load(&*store)
        .await
        .context("Failed to load tenant content")?;
    let bundle = build_bundle(&selection, &corpus);

    let counts = bundle.counts();
    let requested = selection.wiki_entries.len() + selection.plays.len() + selection.banners.len();
    if counts.total() < requested {
        println!(
            "{} of {} selected ids were not found and are skipped",
            requested - counts.total(),
            requested
        );
    }

    let id = runtime
        .publisher()?
        .save_library(&args.name, &args.description, bundle, args.library.as_deref())
        .await?;

    println!(
        "Saved library {} ({}): {} wiki entries, {} plays, {} banners",
        args.name.trim(),
        id,
        counts.wiki_entries,
        counts.plays,
        counts.banners
    );
    Ok(())
}

/// Table row for authored libraries
#[derive(Tabled)]
struct LibraryRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Wiki")]
    wiki: usize,
    #[tabled(rename = "Plays")]
    plays: usize,
    #[tabled(rename = "Banners")]
    banners: usize,
    #[tabled(rename = "Updated")]
    updated: String,
}

async fn execute_list(runtime: &Runtime, json: bool) -> Result<()> {
    let libraries = runtime.publisher()?.list_my_libraries().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&libraries)?);
        return Ok(());
    }

    if libraries.is_empty() {
        println!("No libraries authored by tenant {}", runtime.tenant()?);
        return Ok(());
    }

    let rows: Vec<LibraryRow> = libraries
        .iter()
        .map(|library| {
            let counts = library.content.counts();
            LibraryRow {
                id: library.id.clone(),
                name: truncate(&library.name, 40),
                wiki: counts.wiki_entries,
                plays: counts.plays,
                banners: counts.banners,
                updated: library
                    .updated_at
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            }
        })
        .collect();
    print_table(&rows);
    Ok(())
}
