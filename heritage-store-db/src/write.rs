// SPDX-FileCopyrightText: 2026 Heritage Catalog contributors
// SPDX-License-Identifier: MIT

//! Write operations for the catalog database.
//!
//! The catalog is read-mostly: these are used by bulk loading, tests and
//! local management.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::connection::CatalogDb;
use crate::error::{Error, Result};
use crate::types::LookupKind;

/// Parameters for inserting an artifact with its relationships.
///
/// Lookups are named, not referenced by id: missing ones are created.
#[derive(Debug, Clone, Default)]
pub struct NewArtifact {
    pub name: String,
    pub description: Option<String>,
    pub format: Option<String>,
    pub location: Option<String>,
    pub creators: Vec<String>,
    pub materials: Vec<String>,
    pub tags: Vec<String>,
    /// Image URLs owned by the artifact
    pub images: Vec<String>,
    pub conservation_reports: Vec<NewConservationReport>,
}

/// Parameters for a conservation report.
#[derive(Debug, Clone)]
pub struct NewConservationReport {
    pub details: String,
    pub conditions: String,
    pub preservation_needs: String,
    pub date: NaiveDate,
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::EmptyField { field });
    }
    Ok(value)
}

fn upsert_lookup(conn: &Connection, kind: LookupKind, name: &str) -> Result<i64> {
    let name = required("name", name)?;
    let table = kind.table();
    conn.prepare_cached(&format!(
        "INSERT INTO {table} (name) VALUES (?1) ON CONFLICT(name) DO NOTHING"
    ))?
    .execute(params![name])?;
    let id = conn
        .prepare_cached(&format!("SELECT id FROM {table} WHERE name = ?1"))?
        .query_row(params![name], |row| row.get(0))?;
    Ok(id)
}

fn upsert_material(conn: &Connection, name: &str, description: Option<&str>) -> Result<i64> {
    let name = required("name", name)?;
    let id = conn
        .prepare_cached(
            r#"
            INSERT INTO materials (name, description) VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET description = coalesce(excluded.description, materials.description)
            RETURNING id
            "#,
        )?
        .query_row(params![name, description], |row| row.get(0))?;
    Ok(id)
}

fn link_lookup(
    conn: &Connection,
    kind: LookupKind,
    artifact_id: i64,
    entity_id: i64,
) -> Result<()> {
    if let Some((assoc, column)) = kind.association() {
        conn.prepare_cached(&format!(
            "INSERT OR IGNORE INTO {assoc} (artifact_id, {column}) VALUES (?1, ?2)"
        ))?
        .execute(params![artifact_id, entity_id])?;
    } else if let Some(column) = kind.artifact_column() {
        conn.prepare_cached(&format!("UPDATE artifacts SET {column} = ?2 WHERE id = ?1"))?
            .execute(params![artifact_id, entity_id])?;
    }
    Ok(())
}

fn insert_image(conn: &Connection, artifact_id: Option<i64>, url: &str) -> Result<i64> {
    let url = required("url", url)?;
    conn.prepare_cached("INSERT INTO images (url, artifact_id) VALUES (?1, ?2)")?
        .execute(params![url, artifact_id])?;
    Ok(conn.last_insert_rowid())
}

fn insert_report(
    conn: &Connection,
    artifact_id: i64,
    report: &NewConservationReport,
) -> Result<i64> {
    conn.prepare_cached(
        r#"
        INSERT INTO conservation_reports (artifact_id, details, conditions, preservation_needs, date)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )?
    .execute(params![
        artifact_id,
        required("details", &report.details)?,
        required("conditions", &report.conditions)?,
        required("preservation_needs", &report.preservation_needs)?,
        report.date,
    ])?;
    Ok(conn.last_insert_rowid())
}

fn insert_artifact_graph(conn: &Connection, artifact: &NewArtifact) -> Result<i64> {
    let name = required("name", &artifact.name)?;
    conn.prepare_cached("INSERT INTO artifacts (name, description) VALUES (?1, ?2)")?
        .execute(params![name, artifact.description])?;
    let id = conn.last_insert_rowid();

    let single = [
        (LookupKind::Format, &artifact.format),
        (LookupKind::Location, &artifact.location),
    ];
    for (kind, value) in single {
        if let Some(value) = value {
            let entity_id = upsert_lookup(conn, kind, value)?;
            link_lookup(conn, kind, id, entity_id)?;
        }
    }

    for creator in &artifact.creators {
        let entity_id = upsert_lookup(conn, LookupKind::Creator, creator)?;
        link_lookup(conn, LookupKind::Creator, id, entity_id)?;
    }
    for material in &artifact.materials {
        let entity_id = upsert_material(conn, material, None)?;
        link_lookup(conn, LookupKind::Material, id, entity_id)?;
    }
    for tag in &artifact.tags {
        let entity_id = upsert_lookup(conn, LookupKind::Tag, tag)?;
        link_lookup(conn, LookupKind::Tag, id, entity_id)?;
    }
    for url in &artifact.images {
        insert_image(conn, Some(id), url)?;
    }
    for report in &artifact.conservation_reports {
        insert_report(conn, id, report)?;
    }

    Ok(id)
}

impl CatalogDb {
    /// Get or create a lookup row by name.
    ///
    /// Returns the row id. Materials created this way have no description.
    pub fn insert_lookup(&self, kind: LookupKind, name: &str) -> Result<i64> {
        match kind {
            LookupKind::Material => upsert_material(&self.conn, name, None),
            _ => upsert_lookup(&self.conn, kind, name),
        }
    }

    /// Get or create a material, setting its description when one is given.
    pub fn insert_material(&self, name: &str, description: Option<&str>) -> Result<i64> {
        upsert_material(&self.conn, name, description)
    }

    /// Insert an artifact and all of its relationships.
    ///
    /// Returns the database ID of the new artifact.
    pub fn insert_artifact(&mut self, artifact: &NewArtifact) -> Result<i64> {
        let tx = self.conn.transaction()?;
        let id = insert_artifact_graph(&tx, artifact)?;
        tx.commit()?;
        Ok(id)
    }

    /// Insert many artifacts in a single transaction.
    ///
    /// Either every artifact is stored or none is.
    pub fn import_artifacts(&mut self, artifacts: &[NewArtifact]) -> Result<Vec<i64>> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            ids.push(insert_artifact_graph(&tx, artifact)?);
        }
        tx.commit()?;
        debug!("Imported {} artifacts", ids.len());
        Ok(ids)
    }

    /// Associate an artifact with a lookup row.
    ///
    /// For formats and locations this replaces the current reference; for
    /// the many-to-many kinds linking an existing pair is a no-op.
    pub fn link(&self, kind: LookupKind, artifact_id: i64, entity_id: i64) -> Result<()> {
        link_lookup(&self.conn, kind, artifact_id, entity_id)
    }

    /// Remove a many-to-many association. Returns whether it existed.
    pub fn unlink(&self, kind: LookupKind, artifact_id: i64, entity_id: i64) -> Result<bool> {
        let rows = match (kind.association(), kind.artifact_column()) {
            (Some((assoc, column)), _) => self.conn.execute(
                &format!("DELETE FROM {assoc} WHERE artifact_id = ?1 AND {column} = ?2"),
                params![artifact_id, entity_id],
            )?,
            (None, Some(column)) => self.conn.execute(
                &format!("UPDATE artifacts SET {column} = NULL WHERE id = ?1 AND {column} = ?2"),
                params![artifact_id, entity_id],
            )?,
            (None, None) => 0,
        };
        Ok(rows > 0)
    }

    /// Store an image, optionally owned by an artifact.
    pub fn add_image(&self, artifact_id: Option<i64>, url: &str) -> Result<i64> {
        insert_image(&self.conn, artifact_id, url)
    }

    /// Attach a conservation report to an existing artifact.
    pub fn add_conservation_report(
        &self,
        artifact_id: i64,
        report: &NewConservationReport,
    ) -> Result<i64> {
        if !self.artifact_exists(artifact_id)? {
            return Err(Error::ArtifactNotFound(artifact_id));
        }
        insert_report(&self.conn, artifact_id, report)
    }

    /// Delete an artifact.
    ///
    /// Its images, conservation reports and association rows go with it;
    /// the lookup rows it referenced stay.
    pub fn delete_artifact(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM artifacts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Delete a lookup row.
    ///
    /// Artifacts referencing a deleted format or location keep existing with
    /// the reference cleared.
    pub fn delete_lookup(&self, kind: LookupKind, id: i64) -> Result<bool> {
        let rows = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", kind.table()),
            params![id],
        )?;
        Ok(rows > 0)
    }

    /// Update an artifact's description.
    pub fn set_description(&self, id: i64, description: Option<&str>) -> Result<bool> {
        let rows = self
            .conn
            .prepare_cached("UPDATE artifacts SET description = ?2 WHERE id = ?1")?
            .execute(params![id, description])?;
        Ok(rows > 0)
    }

    /// Look up the id of an artifact by exact name, the first one if several share it.
    pub fn artifact_id_by_name(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .prepare_cached("SELECT id FROM artifacts WHERE name = ?1 ORDER BY id LIMIT 1")?
            .query_row(params![name], |row| row.get(0))
            .optional()?)
    }
}
