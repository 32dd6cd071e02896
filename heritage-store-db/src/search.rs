// SPDX-FileCopyrightText: 2026 Heritage Catalog contributors
// SPDX-License-Identifier: MIT

//! Filtered artifact search.
//!
//! An [`ArtifactFilter`] holds up to one predicate per known field. Present
//! predicates are AND-ed; the catch-all `q` term is a single OR predicate over
//! the artifact's own text and the names of every related lookup.
//!
//! Relationship-scoped filters (`creator`, `format`, ...) inner-join their
//! relationship, so an artifact without any related row never matches them.
//! Joining a to-many relationship fans out one row per related entity, so
//! those queries select `DISTINCT` artifact ids before the window is applied.
//! `q` tests each relationship with an `EXISTS` sub-select instead, which
//! keeps artifacts that lack one relationship but match through another.

use rusqlite::params_from_iter;
use rusqlite::types::Value;
use tracing::debug;

use crate::connection::CatalogDb;
use crate::error::Result;
use crate::types::{ArtifactGraph, LookupKind};

/// Exact-id predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdFilter {
    /// Match the artifact with this id
    Exact(i64),
    /// The caller supplied an id that is not an integer; nothing matches
    Unparseable,
}

impl IdFilter {
    /// Parse a raw id value. Blank input means "no id filter".
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        Some(raw.parse().map_or(IdFilter::Unparseable, IdFilter::Exact))
    }
}

/// Normalized search predicates.
///
/// Text terms are trimmed and lower-cased on the way in; blank terms are
/// dropped, so a filter built from blank input matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactFilter {
    id: Option<IdFilter>,
    name: Option<String>,
    q: Option<String>,
    creator: Option<String>,
    format: Option<String>,
    location: Option<String>,
    material: Option<String>,
    tag: Option<String>,
}

fn normalize_term(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_lowercase())
}

impl ArtifactFilter {
    /// Set the id filter from raw input; see [`IdFilter::parse`].
    pub fn with_raw_id(mut self, raw: &str) -> Self {
        self.id = IdFilter::parse(raw);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = normalize_term(name);
        self
    }

    pub fn with_q(mut self, q: &str) -> Self {
        self.q = normalize_term(q);
        self
    }

    pub fn with_creator(self, creator: &str) -> Self {
        self.with_lookup(LookupKind::Creator, creator)
    }

    pub fn with_format(self, format: &str) -> Self {
        self.with_lookup(LookupKind::Format, format)
    }

    pub fn with_location(self, location: &str) -> Self {
        self.with_lookup(LookupKind::Location, location)
    }

    pub fn with_material(self, material: &str) -> Self {
        self.with_lookup(LookupKind::Material, material)
    }

    pub fn with_tag(self, tag: &str) -> Self {
        self.with_lookup(LookupKind::Tag, tag)
    }

    /// Set the relationship-scoped filter for `kind`.
    pub fn with_lookup(mut self, kind: LookupKind, value: &str) -> Self {
        *self.lookup_slot(kind) = normalize_term(value);
        self
    }

    fn lookup_slot(&mut self, kind: LookupKind) -> &mut Option<String> {
        match kind {
            LookupKind::Creator => &mut self.creator,
            LookupKind::Format => &mut self.format,
            LookupKind::Location => &mut self.location,
            LookupKind::Material => &mut self.material,
            LookupKind::Tag => &mut self.tag,
        }
    }

    pub fn lookup(&self, kind: LookupKind) -> Option<&str> {
        match kind {
            LookupKind::Creator => self.creator.as_deref(),
            LookupKind::Format => self.format.as_deref(),
            LookupKind::Location => self.location.as_deref(),
            LookupKind::Material => self.material.as_deref(),
            LookupKind::Tag => self.tag.as_deref(),
        }
    }

    pub fn id(&self) -> Option<IdFilter> {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }

    /// True when no predicate is present.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.name.is_none()
            && self.q.is_none()
            && LookupKind::ALL.iter().all(|kind| self.lookup(*kind).is_none())
    }

    /// True when evaluating the filter traverses a to-many relationship.
    pub fn touches_to_many(&self) -> bool {
        self.q.is_some()
            || LookupKind::ALL
                .iter()
                .any(|kind| kind.is_to_many() && self.lookup(*kind).is_some())
    }

    /// Compose the `FROM ... WHERE ...` tail shared by the count and id queries.
    ///
    /// Returns `None` when the filter can never match (unparseable id).
    pub(crate) fn compose(&self) -> Option<ComposedQuery> {
        let mut query = ComposedQuery {
            joins: Vec::new(),
            conditions: Vec::new(),
            params: Vec::new(),
            distinct: self.touches_to_many(),
        };

        match self.id {
            Some(IdFilter::Unparseable) => return None,
            Some(IdFilter::Exact(id)) => {
                query.conditions.push("a.id = ?".to_string());
                query.params.push(Value::Integer(id));
            }
            None => {}
        }

        if let Some(name) = &self.name {
            query.conditions.push(contains("a.name"));
            query.params.push(Value::Text(name.clone()));
        }

        for kind in LookupKind::ALL {
            let Some(term) = self.lookup(kind) else {
                continue;
            };
            let alias = kind.table();
            match (kind.association(), kind.artifact_column()) {
                (Some((assoc, column)), _) => {
                    query.joins.push(format!(
                        "JOIN {assoc} j_{alias} ON j_{alias}.artifact_id = a.id \
                         JOIN {alias} e_{alias} ON e_{alias}.id = j_{alias}.{column}"
                    ));
                }
                (None, Some(column)) => {
                    query
                        .joins
                        .push(format!("JOIN {alias} e_{alias} ON e_{alias}.id = a.{column}"));
                }
                (None, None) => continue,
            }
            query.conditions.push(contains(&format!("e_{alias}.name")));
            query.params.push(Value::Text(term.to_string()));
        }

        if let Some(q) = &self.q {
            let mut any_of = vec![contains("a.name"), contains("a.description")];
            for kind in LookupKind::ALL {
                any_of.push(exists_related(kind));
            }
            for _ in &any_of {
                query.params.push(Value::Text(q.clone()));
            }
            query.conditions.push(format!("({})", any_of.join(" OR ")));
        }

        Some(query)
    }
}

/// Case-insensitive substring test against an already-folded needle.
fn contains(column: &str) -> String {
    format!("instr(casefold({column}), ?) > 0")
}

fn exists_related(kind: LookupKind) -> String {
    let table = kind.table();
    let matches = contains("x.name");
    match (kind.association(), kind.artifact_column()) {
        (Some((assoc, column)), _) => format!(
            "EXISTS (SELECT 1 FROM {assoc} j JOIN {table} x ON x.id = j.{column} \
             WHERE j.artifact_id = a.id AND {matches})"
        ),
        (_, Some(column)) => {
            format!("EXISTS (SELECT 1 FROM {table} x WHERE x.id = a.{column} AND {matches})")
        }
        (None, None) => "0".to_string(),
    }
}

/// SQL fragments and bound values for one filter.
#[derive(Debug)]
pub(crate) struct ComposedQuery {
    joins: Vec<String>,
    conditions: Vec<String>,
    params: Vec<Value>,
    distinct: bool,
}

impl ComposedQuery {
    fn from_clause(&self) -> String {
        let mut sql = String::from("FROM artifacts a");
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        sql
    }

    pub(crate) fn count_sql(&self) -> String {
        let counted = if self.distinct { "DISTINCT a.id" } else { "*" };
        format!("SELECT COUNT({counted}) {}", self.from_clause())
    }

    pub(crate) fn ids_sql(&self) -> String {
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        format!(
            "SELECT {distinct}a.id {} ORDER BY a.id ASC LIMIT ? OFFSET ?",
            self.from_clause()
        )
    }
}

/// One window of search results.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchPage {
    /// Matching artifacts inside the window, ordered by id
    pub items: Vec<ArtifactGraph>,
    /// Number of matching artifacts before windowing
    pub total: u64,
}

impl CatalogDb {
    /// Run a filtered search and resolve the requested window.
    ///
    /// Results are always ordered by artifact id. `offset` past the end
    /// yields no items but still reports the full `total`.
    pub fn search_artifacts(
        &self,
        filter: &ArtifactFilter,
        offset: u64,
        limit: u32,
    ) -> Result<SearchPage> {
        let Some(query) = filter.compose() else {
            debug!("Search filter can never match, skipping query");
            return Ok(SearchPage::default());
        };

        let count_sql = query.count_sql();
        debug!(sql = %count_sql, "Counting search matches");
        let total: i64 = self.conn.query_row(
            &count_sql,
            params_from_iter(query.params.iter()),
            |row| row.get(0),
        )?;

        let mut ids = Vec::new();
        if total > 0 {
            let mut params = query.params.clone();
            params.push(Value::Integer(i64::from(limit)));
            params.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

            let ids_sql = query.ids_sql();
            let mut stmt = self.conn.prepare(&ids_sql)?;
            let mut rows = stmt.query(params_from_iter(params.iter()))?;
            while let Some(row) = rows.next()? {
                ids.push(row.get::<_, i64>(0)?);
            }
        }

        Ok(SearchPage {
            items: self.load_graphs(&ids)?,
            total: total as u64,
        })
    }
}
