// SPDX-FileCopyrightText: 2026 Heritage Catalog contributors
// SPDX-License-Identifier: MIT

//! Read query operations for the catalog database.

use std::collections::HashMap;

use rusqlite::{OptionalExtension, params, params_from_iter};

use crate::connection::CatalogDb;
use crate::error::Result;
use crate::types::{
    Artifact, ArtifactGraph, ConservationReport, Image, Lookup, LookupKind, Material,
};

/// `?, ?, ?` for an `IN (...)` list of `n` values.
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl CatalogDb {
    /// Fetch one artifact with all relationships resolved.
    ///
    /// Returns `None` if no artifact has this id.
    pub fn get_artifact(&self, id: i64) -> Result<Option<ArtifactGraph>> {
        Ok(self.load_graphs(&[id])?.pop())
    }

    /// Check whether an artifact row exists.
    pub fn artifact_exists(&self, id: i64) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT 1 FROM artifacts WHERE id = ?1 LIMIT 1")?;
        Ok(stmt.query_row(params![id], |_| Ok(())).optional()?.is_some())
    }

    /// Count the number of artifacts.
    pub fn count_artifacts(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM artifacts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Resolve artifacts and their relationships, in the order of `ids`.
    ///
    /// Runs one query for the artifact rows (with format and location) and
    /// one per to-many relationship, whatever the number of ids. Ids with no
    /// matching row are skipped.
    pub fn load_graphs(&self, ids: &[i64]) -> Result<Vec<ArtifactGraph>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let marks = placeholders(ids.len());

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT a.id, a.name, a.description, a.format_id, a.location_id, f.name, l.name
            FROM artifacts a
            LEFT JOIN formats f ON f.id = a.format_id
            LEFT JOIN locations l ON l.id = a.location_id
            WHERE a.id IN ({marks})
            "#
        ))?;

        let mut graphs: HashMap<i64, ArtifactGraph> = HashMap::with_capacity(ids.len());
        let mut rows = stmt.query(params_from_iter(ids))?;
        while let Some(row) = rows.next()? {
            let artifact = Artifact {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                format_id: row.get(3)?,
                location_id: row.get(4)?,
            };
            let format = lookup_from(artifact.format_id, row.get(5)?);
            let location = lookup_from(artifact.location_id, row.get(6)?);

            let mut graph = ArtifactGraph::bare(artifact);
            graph.format = format;
            graph.location = location;
            graphs.insert(graph.id(), graph);
        }

        if graphs.is_empty() {
            return Ok(Vec::new());
        }

        for (artifact_id, creator) in self.related_lookups(LookupKind::Creator, &marks, ids)? {
            if let Some(graph) = graphs.get_mut(&artifact_id) {
                graph.creators.push(creator);
            }
        }
        for (artifact_id, tag) in self.related_lookups(LookupKind::Tag, &marks, ids)? {
            if let Some(graph) = graphs.get_mut(&artifact_id) {
                graph.tags.push(tag);
            }
        }
        for (artifact_id, material) in self.related_materials(&marks, ids)? {
            if let Some(graph) = graphs.get_mut(&artifact_id) {
                graph.materials.push(material);
            }
        }
        for image in self.related_images(&marks, ids)? {
            if let Some(graph) = image.artifact_id.and_then(|id| graphs.get_mut(&id)) {
                graph.images.push(image);
            }
        }

        Ok(ids.iter().filter_map(|id| graphs.remove(id)).collect())
    }

    /// (artifact id, related row) pairs for a creator or tag association.
    fn related_lookups(
        &self,
        kind: LookupKind,
        marks: &str,
        ids: &[i64],
    ) -> Result<Vec<(i64, Lookup)>> {
        let Some((assoc, column)) = kind.association() else {
            return Ok(Vec::new());
        };
        let table = kind.table();
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT j.artifact_id, e.id, e.name
            FROM {assoc} j
            JOIN {table} e ON e.id = j.{column}
            WHERE j.artifact_id IN ({marks})
            ORDER BY j.artifact_id, e.id
            "#
        ))?;

        let mut related = Vec::new();
        let mut rows = stmt.query(params_from_iter(ids))?;
        while let Some(row) = rows.next()? {
            related.push((
                row.get(0)?,
                Lookup {
                    id: row.get(1)?,
                    name: row.get(2)?,
                },
            ));
        }
        Ok(related)
    }

    fn related_materials(&self, marks: &str, ids: &[i64]) -> Result<Vec<(i64, Material)>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT j.artifact_id, m.id, m.name, m.description
            FROM artifact_materials j
            JOIN materials m ON m.id = j.material_id
            WHERE j.artifact_id IN ({marks})
            ORDER BY j.artifact_id, m.id
            "#
        ))?;

        let mut related = Vec::new();
        let mut rows = stmt.query(params_from_iter(ids))?;
        while let Some(row) = rows.next()? {
            related.push((
                row.get(0)?,
                Material {
                    id: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                },
            ));
        }
        Ok(related)
    }

    fn related_images(&self, marks: &str, ids: &[i64]) -> Result<Vec<Image>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT id, url, artifact_id
            FROM images
            WHERE artifact_id IN ({marks})
            ORDER BY artifact_id, id
            "#
        ))?;

        let mut images = Vec::new();
        let mut rows = stmt.query(params_from_iter(ids))?;
        while let Some(row) = rows.next()? {
            images.push(Image {
                id: row.get(0)?,
                url: row.get(1)?,
                artifact_id: row.get(2)?,
            });
        }
        Ok(images)
    }

    /// Conservation reports for one artifact, oldest first.
    pub fn conservation_reports(&self, artifact_id: i64) -> Result<Vec<ConservationReport>> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT id, artifact_id, details, conditions, preservation_needs, date
            FROM conservation_reports
            WHERE artifact_id = ?1
            ORDER BY date, id
            "#,
        )?;

        let mut reports = Vec::new();
        let mut rows = stmt.query(params![artifact_id])?;
        while let Some(row) = rows.next()? {
            reports.push(ConservationReport {
                id: row.get(0)?,
                artifact_id: row.get(1)?,
                details: row.get(2)?,
                conditions: row.get(3)?,
                preservation_needs: row.get(4)?,
                date: row.get(5)?,
            });
        }
        Ok(reports)
    }

    /// All rows of a lookup table, ordered by id.
    pub fn list_lookups(&self, kind: LookupKind) -> Result<Vec<Lookup>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!("SELECT id, name FROM {} ORDER BY id", kind.table()))?;

        let mut lookups = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            lookups.push(Lookup {
                id: row.get(0)?,
                name: row.get(1)?,
            });
        }
        Ok(lookups)
    }

    /// Find a lookup row by exact name.
    pub fn find_lookup(&self, kind: LookupKind, name: &str) -> Result<Option<Lookup>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT id, name FROM {} WHERE name = ?1",
            kind.table()
        ))?;
        Ok(stmt
            .query_row(params![name], |row| {
                Ok(Lookup {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()?)
    }
}

fn lookup_from(id: Option<i64>, name: Option<String>) -> Option<Lookup> {
    match (id, name) {
        (Some(id), Some(name)) => Some(Lookup { id, name }),
        _ => None,
    }
}
