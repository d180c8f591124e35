use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use membank::lifecycle::LifecycleManager;
use membank::repository::MemoryRepository;

use crate::error::CliResult;
use crate::output::{OutputFormat, truncate_string};

#[derive(Parser)]
pub struct PruneCommand {
    #[clap(long, help = "Report expired memories without deleting them")]
    pub dry_run: bool,
}

impl PruneCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let report = LifecycleManager::new(repo).cleanup(self.dry_run).await?;

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Table => {
                if report.candidates.is_empty() {
                    println!("No expired memories.");
                    return Ok(());
                }

                if report.dry_run {
                    println!("Would delete {} expired memories:", report.candidates.len());
                    let mut table = Table::new();
                    table
                        .load_preset(UTF8_FULL_CONDENSED)
                        .set_content_arrangement(ContentArrangement::Dynamic)
                        .set_header(["ID", "Title"]);
                    for candidate in &report.candidates {
                        table.add_row([
                            truncate_string(&candidate.id, 8),
                            truncate_string(&candidate.title, 60),
                        ]);
                    }
                    println!("{table}");
                    return Ok(());
                }

                println!("Deleted {} expired memories.", report.deleted);
                for failure in &report.failed {
                    println!(
                        "  failed {}: {}",
                        truncate_string(&failure.id, 8),
                        failure.reason
                    );
                }
            }
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct RebuildCommand {}

impl RebuildCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let report = repo.rebuild_index().await?;

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Table => {
                println!("Index rebuilt: {} records.", report.indexed);
                for skipped in &report.skipped {
                    println!("  skipped {}: {}", skipped.path, skipped.reason);
                }
            }
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct StatsCommand {}

impl StatsCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let stats = repo.stats().await?;

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            OutputFormat::Table => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Property", "Value"]);

                table.add_row(["Total memories", &stats.total.to_string()]);
                table.add_row(["Global", &stats.global.to_string()]);
                table.add_row(["Project-scoped", &stats.project_scoped.to_string()]);
                table.add_row(["Expired", &stats.expired.to_string()]);
                table.add_row(["Stale", &stats.stale.to_string()]);
                table.add_row(["With relations", &stats.with_relations.to_string()]);

                println!("{table}");

                if !stats.by_category.is_empty() {
                    let mut categories = Table::new();
                    categories
                        .load_preset(UTF8_FULL_CONDENSED)
                        .set_content_arrangement(ContentArrangement::Dynamic)
                        .set_header(["Category", "Count"]);
                    for entry in &stats.by_category {
                        categories.add_row([entry.category.clone(), entry.count.to_string()]);
                    }
                    println!("\n{categories}");
                }
            }
        }

        Ok(())
    }
}
