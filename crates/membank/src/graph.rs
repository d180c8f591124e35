//! Bidirectional relationship graph
//!
//! Relations are symmetric: linking writes both sides, unlinking removes
//! both. The ids inside `related_to` are weak references, so deleting a
//! memory leaves the other side's entry dangling until a traversal skips
//! it or the pair is re-linked.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{MembankError, Result};
use crate::memory::{INDEX_VERSION, IndexEntry, Memory, MemoryIndex, dedup_preserving_order};
use crate::repository::{MemoryRepository, UpdatePatch};

/// Options for [`RelationGraph::merge`].
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Replacement title for the merged memory. The base keeps its own
    /// title when absent.
    pub new_title: Option<String>,
}

/// Node/edge view of the relation graph, for visualization.
#[derive(Debug, Clone, Serialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub title: String,
    pub category: String,
}

/// An undirected relation, reported once per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// Relationship operations over a repository.
pub struct RelationGraph<'a> {
    repo: &'a MemoryRepository,
}

impl<'a> RelationGraph<'a> {
    pub fn new(repo: &'a MemoryRepository) -> Self {
        Self { repo }
    }

    /// Relate two memories to each other. Linking an already-linked pair
    /// writes nothing; a one-sided relation is repaired to both sides.
    pub async fn link(&self, first: &str, second: &str) -> Result<()> {
        let a = self.require(first).await?;
        let b = self.require(second).await?;
        if a.id == b.id {
            return Err(MembankError::InvalidArgument(
                "a memory cannot be linked to itself".to_string(),
            ));
        }

        self.add_relation(&a, &b.id).await?;
        self.add_relation(&b, &a.id).await?;
        Ok(())
    }

    /// Remove the relation between two memories from both sides. Removing
    /// a relation that does not exist is a no-op.
    pub async fn unlink(&self, first: &str, second: &str) -> Result<()> {
        let a = self.require(first).await?;
        let b = self.require(second).await?;

        self.remove_relation(&a, &b.id).await?;
        self.remove_relation(&b, &a.id).await?;
        Ok(())
    }

    /// Full memories behind a memory's relations. Ids that no longer
    /// resolve are skipped; dangling relations are tolerated, not repaired.
    pub async fn related(&self, id: &str) -> Result<Vec<Memory>> {
        let memory = self.require(id).await?;
        let mut related = Vec::new();
        for related_id in &memory.related_to {
            match self.repo.get(related_id).await {
                Ok(Some(memory)) => related.push(memory),
                Ok(None) => debug!(id = %related_id, "skipping dangling relation"),
                Err(e) => debug!(id = %related_id, "skipping unreadable relation: {e}"),
            }
        }
        Ok(related)
    }

    /// Merge two or more memories into the first.
    ///
    /// The base keeps its identity. The other memories' content is appended
    /// under headings carrying their original titles, tags and relations
    /// are unioned (minus the merged-away ids), and the merged-away
    /// memories are deleted. Fewer than two resolvable inputs fail before
    /// anything is written.
    pub async fn merge(&self, ids: &[String], options: MergeOptions) -> Result<Memory> {
        let mut memories: Vec<Memory> = Vec::new();
        for id in ids {
            match self.repo.get(id).await? {
                Some(memory) => {
                    if memories.iter().all(|m| m.id != memory.id) {
                        memories.push(memory);
                    }
                }
                None => debug!(id = %id, "merge input does not resolve"),
            }
        }
        if memories.len() < 2 {
            return Err(MembankError::Merge(format!(
                "need at least 2 resolvable memories, got {}",
                memories.len()
            )));
        }

        let merged_ids: Vec<String> = memories.iter().map(|m| m.id.clone()).collect();
        let base = &memories[0];

        let mut content = String::new();
        if let Some(ref title) = options.new_title {
            content.push_str("# ");
            content.push_str(title);
            content.push_str("\n\n");
        }
        content.push_str(&base.content);
        for other in &memories[1..] {
            content.push_str("\n\n## ");
            content.push_str(&other.title);
            content.push_str("\n\n");
            content.push_str(&other.content);
        }

        let tags = dedup_preserving_order(
            memories.iter().flat_map(|m| m.tags.iter().cloned()).collect(),
        );
        let related_to: Vec<String> = dedup_preserving_order(
            memories
                .iter()
                .flat_map(|m| m.related_to.iter().cloned())
                .collect(),
        )
        .into_iter()
        .filter(|id| !merged_ids.contains(id))
        .collect();

        let merged = self
            .repo
            .update(
                &base.id,
                UpdatePatch {
                    content: Some(content),
                    tags: Some(tags),
                    related_to: Some(related_to),
                },
            )
            .await?;

        for other in &memories[1..] {
            self.repo.delete(&other.id).await?;
        }

        info!(base = %merged.id, absorbed = memories.len() - 1, "merged memories");
        Ok(merged)
    }

    /// Build a node/edge view of the relation graph.
    ///
    /// With a root, nodes are gathered breadth first up to `max_depth`
    /// hops away. Without one, every entry holding at least one relation
    /// becomes a node. Edges appear once per pair, and only between nodes
    /// present in the view.
    pub async fn graph(&self, root: Option<&str>, max_depth: usize) -> Result<GraphView> {
        let index = MemoryIndex {
            version: INDEX_VERSION,
            memories: self.repo.entries().await?,
        };
        let by_id: HashMap<&str, &IndexEntry> = index
            .memories
            .iter()
            .map(|entry| (entry.id.as_str(), entry))
            .collect();

        let order: Vec<String> = match root {
            Some(root) => {
                let pos = index
                    .resolve(root)
                    .ok_or_else(|| MembankError::NotFound(format!("memory {root}")))?;
                bfs_ids(&index.memories[pos].id, &by_id, max_depth)
            }
            None => index
                .memories
                .iter()
                .filter(|entry| !entry.related_to.is_empty())
                .map(|entry| entry.id.clone())
                .collect(),
        };

        let node_set: HashSet<&str> = order.iter().map(String::as_str).collect();
        let mut nodes = Vec::with_capacity(order.len());
        let mut seen_pairs = HashSet::new();
        let mut edges = Vec::new();
        for id in &order {
            let Some(entry) = by_id.get(id.as_str()) else {
                continue;
            };
            nodes.push(GraphNode {
                id: entry.id.clone(),
                title: entry.title.clone(),
                category: entry.category.clone(),
            });
            for neighbor in &entry.related_to {
                if !node_set.contains(neighbor.as_str()) {
                    continue;
                }
                let pair = if entry.id.as_str() <= neighbor.as_str() {
                    (entry.id.clone(), neighbor.clone())
                } else {
                    (neighbor.clone(), entry.id.clone())
                };
                if seen_pairs.insert(pair) {
                    edges.push(GraphEdge {
                        from: entry.id.clone(),
                        to: neighbor.clone(),
                    });
                }
            }
        }

        Ok(GraphView { nodes, edges })
    }

    async fn require(&self, id: &str) -> Result<Memory> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| MembankError::NotFound(format!("memory {id}")))
    }

    async fn add_relation(&self, memory: &Memory, other_id: &str) -> Result<()> {
        if memory.related_to.iter().any(|id| id == other_id) {
            return Ok(());
        }
        let mut related = memory.related_to.clone();
        related.push(other_id.to_string());
        self.repo
            .update(
                &memory.id,
                UpdatePatch {
                    related_to: Some(related),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    async fn remove_relation(&self, memory: &Memory, other_id: &str) -> Result<()> {
        if !memory.related_to.iter().any(|id| id == other_id) {
            return Ok(());
        }
        let related: Vec<String> = memory
            .related_to
            .iter()
            .filter(|id| id.as_str() != other_id)
            .cloned()
            .collect();
        self.repo
            .update(
                &memory.id,
                UpdatePatch {
                    related_to: Some(related),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }
}

/// Ids reachable from `root` within `max_depth` hops, in visit order.
/// Dangling neighbor ids are not followed.
fn bfs_ids(root: &str, by_id: &HashMap<&str, &IndexEntry>, max_depth: usize) -> Vec<String> {
    let mut visited: HashSet<String> = HashSet::new();
    let mut order: Vec<String> = Vec::new();
    let mut frontier: VecDeque<(String, usize)> = VecDeque::new();

    visited.insert(root.to_string());
    order.push(root.to_string());
    frontier.push_back((root.to_string(), 0));

    while let Some((id, depth)) = frontier.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let Some(entry) = by_id.get(id.as_str()) else {
            continue;
        };
        for neighbor in &entry.related_to {
            if !by_id.contains_key(neighbor.as_str()) {
                continue;
            }
            if visited.insert(neighbor.clone()) {
                order.push(neighbor.clone());
                frontier.push_back((neighbor.clone(), depth + 1));
            }
        }
    }

    order
}
