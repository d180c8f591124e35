//! On-disk record format
//!
//! A record is a text file with a `---` delimited key/value header block,
//! one blank line, then the body verbatim:
//!
//! ```text
//! ---
//! id: 6f8b9c1a-...
//! category: decision
//! tags: db, infra
//! created: 2026-02-11T09:30:00.000Z
//! updated: 2026-02-11T09:30:00.000Z
//! priority: normal
//! ---
//!
//! # Use Postgres
//! Need ACID guarantees.
//! ```
//!
//! `projectId`, `projectName`, `expiresAt`, and `relatedTo` appear only when
//! set. Timestamps are RFC 3339 at millisecond precision with a `Z` suffix;
//! list values are comma-joined. External tools read these files, so the
//! format is stable byte for byte.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{MembankError, Result};
use crate::memory::types::{Memory, Priority, derive_title, slugify};

/// Serialize a memory into its on-disk record text.
pub fn serialize_record(memory: &Memory) -> String {
    let mut out = String::new();
    out.push_str("---\n");
    push_field(&mut out, "id", &memory.id);
    push_field(&mut out, "category", &memory.category);
    push_field(&mut out, "tags", &memory.tags.join(", "));
    push_field(&mut out, "created", &format_timestamp(&memory.created));
    push_field(&mut out, "updated", &format_timestamp(&memory.updated));
    if let Some(ref project_id) = memory.project_id {
        push_field(&mut out, "projectId", project_id);
    }
    if let Some(ref project_name) = memory.project_name {
        push_field(&mut out, "projectName", project_name);
    }
    push_field(&mut out, "priority", memory.priority.as_str());
    if let Some(ref expires_at) = memory.expires_at {
        push_field(&mut out, "expiresAt", &format_timestamp(expires_at));
    }
    if !memory.related_to.is_empty() {
        push_field(&mut out, "relatedTo", &memory.related_to.join(", "));
    }
    out.push_str("---\n\n");
    out.push_str(&memory.content);
    out
}

/// Parse an on-disk record back into a memory.
///
/// Unknown header keys are ignored. The title is re-derived from the body,
/// never read from the header.
pub fn parse_record(text: &str) -> Result<Memory> {
    let rest = text
        .strip_prefix("---\n")
        .ok_or_else(|| MembankError::Record("missing header block".to_string()))?;
    let (header, body) = rest
        .split_once("\n---\n")
        .ok_or_else(|| MembankError::Record("unterminated header block".to_string()))?;
    // serialize_record emits exactly one blank separator line before the body
    let content = body.strip_prefix('\n').unwrap_or(body);

    let mut id = None;
    let mut category = None;
    let mut tags = Vec::new();
    let mut created = None;
    let mut updated = None;
    let mut project_id = None;
    let mut project_name = None;
    let mut priority = Priority::Normal;
    let mut expires_at = None;
    let mut related_to = Vec::new();

    for line in header.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            return Err(MembankError::Record(format!("malformed header line: {line}")));
        };
        let value = value.trim();
        match key {
            "id" => id = Some(value.to_string()),
            "category" => category = Some(value.to_string()),
            "tags" => tags = parse_list(value),
            "created" => created = Some(parse_timestamp(value)?),
            "updated" => updated = Some(parse_timestamp(value)?),
            "projectId" => project_id = Some(value.to_string()),
            "projectName" => project_name = Some(value.to_string()),
            "priority" => priority = value.parse()?,
            "expiresAt" => expires_at = Some(parse_timestamp(value)?),
            "relatedTo" => related_to = parse_list(value),
            _ => {}
        }
    }

    Ok(Memory {
        id: id.ok_or_else(|| MembankError::Record("missing required key: id".to_string()))?,
        category: category
            .ok_or_else(|| MembankError::Record("missing required key: category".to_string()))?,
        title: derive_title(content),
        content: content.to_string(),
        tags,
        created: created
            .ok_or_else(|| MembankError::Record("missing required key: created".to_string()))?,
        updated: updated
            .ok_or_else(|| MembankError::Record("missing required key: updated".to_string()))?,
        project_id,
        project_name,
        priority,
        expires_at,
        related_to,
    })
}

/// Logical storage path for a record: `memories/<category>/<date>-<slug>.md`.
/// The category is slugified so custom categories stay path-safe.
pub fn record_path(category: &str, created: &DateTime<Utc>, slug: &str) -> String {
    format!(
        "memories/{}/{}-{}.md",
        slugify(category),
        created.format("%Y-%m-%d"),
        slug
    )
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| MembankError::Record(format!("bad timestamp {value}: {e}")))
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
