// SPDX-FileCopyrightText: 2026 Heritage Catalog contributors
// SPDX-License-Identifier: MIT

//! Database row types for catalog entities.

use chrono::NaiveDate;

/// The five named lookup tables an artifact can be classified by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Format,
    Location,
    Creator,
    Material,
    Tag,
}

impl LookupKind {
    pub const ALL: [LookupKind; 5] = [
        LookupKind::Format,
        LookupKind::Location,
        LookupKind::Creator,
        LookupKind::Material,
        LookupKind::Tag,
    ];

    /// Table holding the lookup rows.
    pub fn table(self) -> &'static str {
        match self {
            LookupKind::Format => "formats",
            LookupKind::Location => "locations",
            LookupKind::Creator => "creators",
            LookupKind::Material => "materials",
            LookupKind::Tag => "tags",
        }
    }

    /// Association table and its entity column, for the many-to-many kinds.
    pub fn association(self) -> Option<(&'static str, &'static str)> {
        match self {
            LookupKind::Creator => Some(("artifact_creators", "creator_id")),
            LookupKind::Material => Some(("artifact_materials", "material_id")),
            LookupKind::Tag => Some(("artifact_tags", "tag_id")),
            LookupKind::Format | LookupKind::Location => None,
        }
    }

    /// Foreign key column on `artifacts`, for the many-to-one kinds.
    pub fn artifact_column(self) -> Option<&'static str> {
        match self {
            LookupKind::Format => Some("format_id"),
            LookupKind::Location => Some("location_id"),
            _ => None,
        }
    }

    /// Whether following this relationship can yield several rows per artifact.
    pub fn is_to_many(self) -> bool {
        self.association().is_some()
    }
}

/// An artifact row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Database row ID
    pub id: i64,
    /// Display name (never empty)
    pub name: String,
    /// Free-text description
    pub description: Option<String>,
    /// Referenced format row
    pub format_id: Option<i64>,
    /// Referenced location row
    pub location_id: Option<i64>,
}

/// A named lookup row (format, location, creator or tag).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub id: i64,
    pub name: String,
}

/// A material row. Materials carry an optional description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// An image row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: i64,
    pub url: String,
    /// Owning artifact; images are deleted with it
    pub artifact_id: Option<i64>,
}

/// A conservation report about one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConservationReport {
    pub id: i64,
    pub artifact_id: i64,
    /// Restoration history
    pub details: String,
    /// Current condition of the artifact
    pub conditions: String,
    pub preservation_needs: String,
    pub date: NaiveDate,
}

/// An artifact together with every display-relevant relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactGraph {
    pub artifact: Artifact,
    pub format: Option<Lookup>,
    pub location: Option<Lookup>,
    pub creators: Vec<Lookup>,
    pub materials: Vec<Material>,
    pub tags: Vec<Lookup>,
    pub images: Vec<Image>,
}

impl ArtifactGraph {
    pub(crate) fn bare(artifact: Artifact) -> Self {
        Self {
            artifact,
            format: None,
            location: None,
            creators: Vec::new(),
            materials: Vec::new(),
            tags: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn id(&self) -> i64 {
        self.artifact.id
    }
}

/// A row reported by `PRAGMA foreign_key_check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyViolation {
    /// Table containing the dangling reference
    pub table: String,
    /// Row holding it
    pub rowid: Option<i64>,
    /// Table the reference should resolve into
    pub parent: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_kind_shapes() {
        for kind in LookupKind::ALL {
            // Exactly one of the two relationship shapes applies.
            assert_ne!(kind.association().is_some(), kind.artifact_column().is_some());
        }
        assert!(LookupKind::Tag.is_to_many());
        assert!(!LookupKind::Format.is_to_many());
        assert_eq!(LookupKind::Material.table(), "materials");
    }
}
