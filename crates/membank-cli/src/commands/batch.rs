use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use membank::batch::{BatchOperator, BatchReport, BulkDeleteOptions, TagOptions};
use membank::repository::MemoryRepository;

use crate::error::CliResult;
use crate::output::{OutputFormat, truncate_string};

#[derive(Parser)]
pub struct TagCommand {
    #[clap(subcommand)]
    pub command: TagSubcommand,
}

#[derive(Subcommand)]
pub enum TagSubcommand {
    #[clap(about = "Add a tag to every selected memory")]
    Add(TagArgs),

    #[clap(name = "rm", about = "Remove a tag from every memory bearing it")]
    Rm(TagArgs),
}

#[derive(Parser)]
pub struct TagArgs {
    #[clap(help = "Tag value")]
    pub tag: String,

    #[clap(long, short = 'q', help = "Select memories matching this query")]
    pub query: Option<String>,

    #[clap(long, help = "Select memories in this category")]
    pub category: Option<String>,

    #[clap(long, help = "Preview the selection without writing")]
    pub dry_run: bool,
}

impl TagArgs {
    fn options(&self) -> TagOptions {
        TagOptions {
            query: self.query.clone(),
            category: self.category.clone(),
            dry_run: self.dry_run,
        }
    }
}

impl TagCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let operator = BatchOperator::new(repo);
        let (report, action) = match &self.command {
            TagSubcommand::Add(args) => (operator.add_tag(&args.tag, &args.options()).await?, "tag"),
            TagSubcommand::Rm(args) => {
                (operator.remove_tag(&args.tag, &args.options()).await?, "untag")
            }
        };
        print_batch_report(&report, action, format)
    }
}

#[derive(Parser)]
pub struct BulkDeleteCommand {
    #[clap(long, help = "Select memories in this category")]
    pub category: Option<String>,

    #[clap(long, help = "Select expired memories")]
    pub expired: bool,

    #[clap(long, help = "Select stale memories")]
    pub stale: bool,

    #[clap(long, short = 'q', help = "Select memories matching this query")]
    pub query: Option<String>,

    #[clap(long, help = "Actually delete; without this flag the selection is only previewed")]
    pub force: bool,
}

impl BulkDeleteCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let options = BulkDeleteOptions {
            category: self.category.clone(),
            expired: self.expired,
            stale: self.stale,
            query: self.query.clone(),
            dry_run: !self.force,
        };
        let report = BatchOperator::new(repo).bulk_delete(&options).await?;

        print_batch_report(&report, "delete", format)?;
        if report.dry_run && !report.candidates.is_empty() {
            if let OutputFormat::Table = format {
                println!("\nRe-run with --force to delete.");
            }
        }

        Ok(())
    }
}

fn print_batch_report(report: &BatchReport, action: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Table => {
            if report.candidates.is_empty() {
                println!("Nothing to {action}.");
                return Ok(());
            }

            if report.dry_run {
                println!("Would {action} {} memories:", report.candidates.len());
                print_candidates(report);
                return Ok(());
            }

            println!(
                "{} memories changed, {} skipped, {} failed.",
                report.mutated,
                report.skipped,
                report.failed.len()
            );
            for failure in &report.failed {
                println!("  failed {}: {}", truncate_string(&failure.id, 8), failure.reason);
            }
        }
    }

    Ok(())
}

fn print_candidates(report: &BatchReport) {
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
}
