//! Whole-outline snapshot persistence.
//!
//! # Responsibility
//! - Persist the outline as one full-replace snapshot transaction.
//! - Reload a snapshot into the seed-bundle shape owned by the store.
//!
//! # Invariants
//! - A snapshot write is all-or-nothing; readers of the file never observe
//!   a partially replaced state.
//! - Read paths reject undecodable persisted state instead of masking it.

use crate::db::{DbError, DbResult};
use crate::model::node::{Node, NodeType};
use crate::model::prop::{PropValue, Property};
use crate::model::slice::{Slice, SliceScope, SliceSort};
use crate::store::{Outline, SeedBundle};
use chrono::{DateTime, Utc};
use log::info;
use rusqlite::{params, Connection, Row};
use std::time::Instant;
use uuid::Uuid;

/// Writes the whole outline into the snapshot connection.
///
/// Full-replace semantics in one transaction; the previous snapshot stays
/// intact when any insert fails.
pub fn save_snapshot(conn: &mut Connection, outline: &Outline) -> DbResult<()> {
    let started_at = Instant::now();
    let bundle = outline.to_bundle();

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM props;", [])?;
    tx.execute("DELETE FROM slices;", [])?;
    tx.execute("DELETE FROM nodes;", [])?;

    for node in &bundle.nodes {
        tx.execute(
            "INSERT INTO nodes (
                id, parent_id, type, title, content, level, sort, tags,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                node.id.to_string(),
                node.parent_id.map(|id| id.to_string()),
                node.kind.as_str(),
                node.title.as_deref(),
                node.content.as_deref(),
                node.level,
                node.sort,
                encode_json(&node.tags, "nodes.tags")?,
                node.created_at.to_rfc3339(),
                node.updated_at.to_rfc3339(),
            ],
        )?;
    }

    for property in &bundle.properties {
        tx.execute(
            "INSERT INTO props (id, node_id, key, label, value)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                property.id.to_string(),
                property.node_id.to_string(),
                property.key.as_str(),
                property.label.as_str(),
                encode_json(&property.value, "props.value")?,
            ],
        )?;
    }

    for slice in &bundle.slice_definitions {
        tx.execute(
            "INSERT INTO slices (
                id, name, scope, dsl, columns, sort, group_by, display_node
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                slice.id.to_string(),
                slice.name.as_str(),
                encode_json(&slice.scope, "slices.scope")?,
                slice.dsl.as_str(),
                encode_json(&slice.columns, "slices.columns")?,
                slice
                    .sort
                    .as_ref()
                    .map(|sort| encode_json(sort, "slices.sort"))
                    .transpose()?,
                slice.group_by.as_deref(),
                slice.display_node.map(|id| id.to_string()),
            ],
        )?;
    }

    tx.commit()?;
    info!(
        "event=snapshot_save module=db status=ok nodes={} props={} slices={} duration_ms={}",
        bundle.nodes.len(),
        bundle.properties.len(),
        bundle.slice_definitions.len(),
        started_at.elapsed().as_millis()
    );
    Ok(())
}

/// Reads the persisted snapshot back into a seed bundle.
pub fn load_snapshot(conn: &Connection) -> DbResult<SeedBundle> {
    let started_at = Instant::now();

    let mut nodes = Vec::new();
    let mut stmt = conn.prepare(
        "SELECT id, parent_id, type, title, content, level, sort, tags,
                created_at, updated_at
         FROM nodes
         ORDER BY sort ASC, id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        nodes.push(parse_node_row(row)?);
    }

    let mut properties = Vec::new();
    let mut stmt = conn.prepare(
        "SELECT id, node_id, key, label, value
         FROM props
         ORDER BY node_id ASC, key ASC;",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        properties.push(parse_prop_row(row)?);
    }

    let mut slice_definitions = Vec::new();
    let mut stmt = conn.prepare(
        "SELECT id, name, scope, dsl, columns, sort, group_by, display_node
         FROM slices
         ORDER BY name ASC, id ASC;",
    )?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        slice_definitions.push(parse_slice_row(row)?);
    }

    info!(
        "event=snapshot_load module=db status=ok nodes={} props={} slices={} duration_ms={}",
        nodes.len(),
        properties.len(),
        slice_definitions.len(),
        started_at.elapsed().as_millis()
    );
    Ok(SeedBundle {
        nodes,
        properties,
        slice_definitions,
    })
}

fn parse_node_row(row: &Row<'_>) -> DbResult<Node> {
    let id = parse_uuid(&row.get::<_, String>("id")?, "nodes.id")?;
    let parent_id = row
        .get::<_, Option<String>>("parent_id")?
        .map(|value| parse_uuid(&value, "nodes.parent_id"))
        .transpose()?;

    let kind_text: String = row.get("type")?;
    let kind = NodeType::parse(&kind_text)
        .ok_or_else(|| DbError::Corrupt(format!("invalid node type `{kind_text}` in nodes.type")))?;

    let tags_text: String = row.get("tags")?;
    let tags: Vec<String> = decode_json(&tags_text, "nodes.tags")?;

    Ok(Node {
        id,
        parent_id,
        kind,
        title: row.get("title")?,
        content: row.get("content")?,
        level: row.get("level")?,
        sort: row.get("sort")?,
        tags,
        created_at: parse_timestamp(&row.get::<_, String>("created_at")?, "nodes.created_at")?,
        updated_at: parse_timestamp(&row.get::<_, String>("updated_at")?, "nodes.updated_at")?,
    })
}

fn parse_prop_row(row: &Row<'_>) -> DbResult<Property> {
    let value_text: String = row.get("value")?;
    let value: PropValue = decode_json(&value_text, "props.value")?;
    Ok(Property {
        id: parse_uuid(&row.get::<_, String>("id")?, "props.id")?,
        node_id: parse_uuid(&row.get::<_, String>("node_id")?, "props.node_id")?,
        key: row.get("key")?,
        label: row.get("label")?,
        value,
    })
}

fn parse_slice_row(row: &Row<'_>) -> DbResult<Slice> {
    let scope_text: String = row.get("scope")?;
    let scope: SliceScope = decode_json(&scope_text, "slices.scope")?;

    let columns_text: String = row.get("columns")?;
    let columns: Vec<String> = decode_json(&columns_text, "slices.columns")?;

    let sort: Option<SliceSort> = row
        .get::<_, Option<String>>("sort")?
        .map(|value| decode_json(&value, "slices.sort"))
        .transpose()?;

    let display_node = row
        .get::<_, Option<String>>("display_node")?
        .map(|value| parse_uuid(&value, "slices.display_node"))
        .transpose()?;

    Ok(Slice {
        id: parse_uuid(&row.get::<_, String>("id")?, "slices.id")?,
        name: row.get("name")?,
        scope,
        dsl: row.get("dsl")?,
        columns,
        sort,
        group_by: row.get("group_by")?,
        display_node,
    })
}

fn encode_json<T: serde::Serialize>(value: &T, column: &'static str) -> DbResult<String> {
    serde_json::to_string(value)
        .map_err(|err| DbError::Corrupt(format!("cannot encode {column}: {err}")))
}

fn decode_json<T: serde::de::DeserializeOwned>(value: &str, column: &'static str) -> DbResult<T> {
    serde_json::from_str(value)
        .map_err(|err| DbError::Corrupt(format!("cannot decode {column}: {err}")))
}

fn parse_uuid(value: &str, column: &'static str) -> DbResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| DbError::Corrupt(format!("invalid uuid `{value}` in {column}")))
}

fn parse_timestamp(value: &str, column: &'static str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|stamp| stamp.with_timezone(&Utc))
        .map_err(|_| DbError::Corrupt(format!("invalid timestamp `{value}` in {column}")))
}
