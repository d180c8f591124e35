use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use membank::graph::{MergeOptions, RelationGraph};
use membank::repository::MemoryRepository;

use crate::error::CliResult;
use crate::output::{OutputFormat, format_timestamp, truncate_string};

#[derive(Parser)]
pub struct LinkCommand {
    #[clap(help = "First memory id or prefix")]
    pub first: String,

    #[clap(help = "Second memory id or prefix")]
    pub second: String,
}

impl LinkCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        RelationGraph::new(repo).link(&self.first, &self.second).await?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "linked": [self.first, self.second],
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Linked {} <-> {}.", self.first, self.second);
            }
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct UnlinkCommand {
    #[clap(help = "First memory id or prefix")]
    pub first: String,

    #[clap(help = "Second memory id or prefix")]
    pub second: String,
}

impl UnlinkCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        RelationGraph::new(repo).unlink(&self.first, &self.second).await?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "unlinked": [self.first, self.second],
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Unlinked {} and {}.", self.first, self.second);
            }
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct RelatedCommand {
    #[clap(help = "Memory id or prefix")]
    pub id: String,
}

impl RelatedCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let related = RelationGraph::new(repo).related(&self.id).await?;

        match format {
            OutputFormat::Json => {
                let output: Vec<_> = related
                    .iter()
                    .map(|memory| {
                        serde_json::json!({
                            "id": memory.id,
                            "title": memory.title,
                            "category": memory.category,
                            "tags": memory.tags,
                            "updated": memory.updated.to_rfc3339(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                if related.is_empty() {
                    println!("No related memories.");
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["ID", "Title", "Category", "Updated"]);

                for memory in &related {
                    table.add_row([
                        truncate_string(&memory.id, 8),
                        truncate_string(&memory.title, 40),
                        memory.category.clone(),
                        format_timestamp(&memory.updated),
                    ]);
                }

                println!("{table}");
            }
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct MergeCommand {
    #[clap(num_args = 2.., required = true, help = "Ids to merge; the first is the base")]
    pub ids: Vec<String>,

    #[clap(long, help = "Title for the merged memory")]
    pub title: Option<String>,
}

impl MergeCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let options = MergeOptions {
            new_title: self.title.clone(),
        };
        let merged = RelationGraph::new(repo).merge(&self.ids, options).await?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "id": merged.id,
                    "title": merged.title,
                    "absorbed": self.ids.len() - 1,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Merged {} memories into {}.", self.ids.len(), merged.id);
                println!("Title: {}", merged.title);
            }
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct GraphCommand {
    #[clap(help = "Root memory id or prefix; omit for the whole graph")]
    pub root: Option<String>,

    #[clap(long, default_value = "2", help = "Traversal depth from the root")]
    pub depth: usize,
}

impl GraphCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let view = RelationGraph::new(repo)
            .graph(self.root.as_deref(), self.depth)
            .await?;

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
            OutputFormat::Table => {
                if view.nodes.is_empty() {
                    println!("No relations recorded.");
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["ID", "Title", "Category"]);

                for node in &view.nodes {
                    table.add_row([
                        truncate_string(&node.id, 8),
                        truncate_string(&node.title, 40),
                        node.category.clone(),
                    ]);
                }

                println!("{table}");
                if !view.edges.is_empty() {
                    println!("\nEdges:");
                    for edge in &view.edges {
                        println!(
                            "  {} <-> {}",
                            truncate_string(&edge.from, 8),
                            truncate_string(&edge.to, 8)
                        );
                    }
                }
            }
        }

        Ok(())
    }
}
