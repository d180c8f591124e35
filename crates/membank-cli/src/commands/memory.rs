use clap::Parser;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use membank::memory::Priority;
use membank::repository::{CreateOptions, ListOptions, MemoryRepository, UpdatePatch};
use membank::search::ScopeOptions;

use crate::error::CliResult;
use crate::output::{OutputFormat, format_timestamp, truncate_string};

#[derive(Parser)]
pub struct AddCommand {
    #[clap(help = "Memory content; the first line becomes the title")]
    pub content: String,

    #[clap(long, help = "Storage category (project, decision, preference, learning, task, or custom)")]
    pub category: String,

    #[clap(long, short = 't', value_delimiter = ',', help = "Comma-separated tags")]
    pub tags: Vec<String>,

    #[clap(long, short = 'g', help = "Store globally, skipping project detection")]
    pub global: bool,

    #[clap(long, short = 'p', default_value = "normal", help = "Priority (high, normal, low)")]
    pub priority: String,

    #[clap(long, help = "Time to live, e.g. 7d, 2w, 3m, 1y")]
    pub ttl: Option<String>,

    #[clap(long, value_delimiter = ',', help = "Ids of related memories")]
    pub related: Vec<String>,
}

impl AddCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let priority: Priority = self.priority.parse()?;

        let options = CreateOptions {
            global: self.global,
            priority,
            ttl: self.ttl.clone(),
            related_to: self.related.clone(),
        };
        let memory = repo
            .create(&self.category, &self.content, self.tags.clone(), options)
            .await?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "id": memory.id,
                    "title": memory.title,
                    "category": memory.category,
                    "project": memory.project_name,
                    "expiresAt": memory.expires_at.map(|ts| ts.to_rfc3339()),
                    "created": true,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Memory created successfully.");
                println!("ID: {}", memory.id);
                println!("Title: {}", memory.title);
                if let Some(ref name) = memory.project_name {
                    println!("Project: {name}");
                }
                if let Some(ref expires_at) = memory.expires_at {
                    println!("Expires: {}", format_timestamp(expires_at));
                }
            }
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct GetCommand {
    #[clap(help = "Memory id or id prefix")]
    pub id: String,
}

impl GetCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let memory = repo
            .get(&self.id)
            .await?
            .ok_or_else(|| format!("Memory not found: {}", self.id))?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "id": memory.id,
                    "category": memory.category,
                    "title": memory.title,
                    "content": memory.content,
                    "tags": memory.tags,
                    "priority": memory.priority.as_str(),
                    "projectId": memory.project_id,
                    "projectName": memory.project_name,
                    "created": memory.created.to_rfc3339(),
                    "updated": memory.updated.to_rfc3339(),
                    "expiresAt": memory.expires_at.map(|ts| ts.to_rfc3339()),
                    "relatedTo": memory.related_to,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["Property", "Value"]);

                table.add_row(["ID", &memory.id]);
                table.add_row(["Title", &memory.title]);
                table.add_row(["Category", &memory.category]);
                table.add_row(["Tags", &memory.tags.join(", ")]);
                table.add_row(["Priority", memory.priority.as_str()]);
                table.add_row(["Project", memory.project_name.as_deref().unwrap_or("-")]);
                table.add_row(["Created", &format_timestamp(&memory.created)]);
                table.add_row(["Updated", &format_timestamp(&memory.updated)]);
                table.add_row([
                    "Expires",
                    &memory
                        .expires_at
                        .map(|ts| format_timestamp(&ts))
                        .unwrap_or_else(|| "-".to_string()),
                ]);
                table.add_row([
                    "Related",
                    &if memory.related_to.is_empty() {
                        "-".to_string()
                    } else {
                        memory.related_to.join(", ")
                    },
                ]);

                println!("{table}");
                println!();
                println!("{}", memory.content);
            }
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct ListCommand {
    #[clap(long, help = "Filter by category")]
    pub category: Option<String>,

    #[clap(long, short = 'a', help = "List memories from every project")]
    pub all_projects: bool,

    #[clap(long, help = "Hide global memories")]
    pub no_global: bool,

    #[clap(long, help = "Include expired memories")]
    pub include_expired: bool,
}

impl ListCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let project = repo.current_project().await;
        let scope = ScopeOptions {
            current_project_id: project.map(|p| p.id),
            include_global: !self.no_global,
            all_projects: self.all_projects,
            include_expired: self.include_expired,
        };
        let entries = repo
            .list(&ListOptions {
                category: self.category.clone(),
                scope,
            })
            .await?;

        match format {
            OutputFormat::Json => {
                let output: Vec<_> = entries
                    .iter()
                    .map(|entry| {
                        serde_json::json!({
                            "id": entry.id,
                            "title": entry.title,
                            "category": entry.category,
                            "tags": entry.tags,
                            "priority": entry.priority.as_str(),
                            "project": entry.project_name,
                            "updated": entry.updated.to_rfc3339(),
                            "expiresAt": entry.expires_at.map(|ts| ts.to_rfc3339()),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                if entries.is_empty() {
                    println!("No memories found.");
                    return Ok(());
                }

                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL_CONDENSED)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(["ID", "Title", "Category", "Tags", "Priority", "Updated"]);

                for entry in &entries {
                    table.add_row([
                        truncate_string(&entry.id, 8),
                        truncate_string(&entry.title, 40),
                        entry.category.clone(),
                        truncate_string(&entry.tags.join(", "), 24),
                        entry.priority.as_str().to_string(),
                        format_timestamp(&entry.updated),
                    ]);
                }

                println!("{table}");
                println!("\nTotal: {} memories", entries.len());
            }
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct UpdateCommand {
    #[clap(help = "Memory id or id prefix")]
    pub id: String,

    #[clap(long, help = "Replacement content; the title is re-derived")]
    pub content: Option<String>,

    #[clap(long, short = 't', value_delimiter = ',', help = "Replacement tag set")]
    pub tags: Option<Vec<String>>,

    #[clap(long, value_delimiter = ',', help = "Replacement related-id set")]
    pub related: Option<Vec<String>>,
}

impl UpdateCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let patch = UpdatePatch {
            content: self.content.clone(),
            tags: self.tags.clone().map(drop_empty),
            related_to: self.related.clone().map(drop_empty),
        };
        let memory = repo.update(&self.id, patch).await?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "id": memory.id,
                    "title": memory.title,
                    "updated": true,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                println!("Memory {} updated.", memory.id);
                println!("Title: {}", memory.title);
            }
        }

        Ok(())
    }
}

#[derive(Parser)]
pub struct DeleteCommand {
    #[clap(help = "Memory id or id prefix")]
    pub id: String,
}

impl DeleteCommand {
    pub async fn execute(&self, repo: &MemoryRepository, format: OutputFormat) -> CliResult<()> {
        let deleted = repo.delete(&self.id).await?;

        match format {
            OutputFormat::Json => {
                let output = serde_json::json!({
                    "id": self.id,
                    "deleted": deleted,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Table => {
                if deleted {
                    println!("Memory {} deleted successfully.", self.id);
                } else {
                    println!("Memory {} not found.", self.id);
                }
            }
        }

        Ok(())
    }
}

/// `--tags ""` clears a set; drop the empty fragments the delimiter leaves.
fn drop_empty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .filter(|value| !value.trim().is_empty())
        .collect()
}
