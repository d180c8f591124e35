use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use membank::repository::MemoryRepository;
use membank::search::{ScopeOptions, SearchEngine, SearchOptions};

use crate::error::CliResult;
use crate::output::{OutputFormat, truncate_string};

#[derive(Parser)]
pub struct SearchCommand {
    #[clap(help = "Query text")]
    pub query: String,

    #[clap(long, short = 'l', help = "Maximum results (default from config)")]
    pub limit: Option<usize>,

    #[clap(long, help = "Restrict to one category")]
    pub category: Option<String>,

    #[clap(long, short = 'a', help = "Search across every project")]
    pub all_projects: bool,

    #[clap(long, help = "Hide global memories")]
    pub no_global: bool,
}

impl SearchCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let project = repo.current_project().await;
        let limit = self.limit.unwrap_or(repo.config().search.default_limit);
        let options = SearchOptions {
            limit: Some(limit),
            category: self.category.clone(),
            scope: ScopeOptions {
                current_project_id: project.map(|p| p.id),
                include_global: !self.no_global,
                all_projects: self.all_projects,
                include_expired: false,
            },
        };

        let results = SearchEngine::new(repo).search(&self.query, &options).await?;

        match format {
            OutputFormat::Json => {
                let output: Vec<_> = results
                    .iter()
                    .map(|result| {
                        serde_json::json!({
                            "id": result.memory.id,
                            "score": result.score,
                            "title": result.memory.title,
                            "category": result.memory.category,
                            "tags": result.memory.tags,
                            "priority": result.memory.priority.as_str(),
                            "project": result.memory.project_name,
                            "content": result.memory.content,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                if results.is_empty() {
                    println!("No matching memories.");
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Score", "ID", "Title", "Category", "Tags"]);

                for result in &results {
                    table.add_row([
                        format!("{:.1}", result.score),
                        truncate_string(&result.memory.id, 8),
                        truncate_string(&result.memory.title, 40),
                        result.memory.category.clone(),
                        truncate_string(&result.memory.tags.join(", "), 24),
                    ]);
                }

                println!("{table}");
                println!("\nTotal: {} matches", results.len());
            }
        }

        Ok(())
    }
}
