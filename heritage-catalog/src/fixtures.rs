//! Bulk loading of catalog fixtures.
//!
//! A fixture is a JSON document naming lookups by value; the store resolves
//! them with get-or-create semantics.

use std::fs::read_to_string;
use std::path::Path;

use chrono::NaiveDate;
use heritage_store_db::{CatalogDb, NewArtifact, NewConservationReport};
use serde::Deserialize;
use tracing::info;

use crate::error::{FixtureError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFixture {
    /// Materials carrying a description; materials named only by artifacts
    /// are created without one
    #[serde(default)]
    pub materials: Vec<FixtureMaterial>,
    #[serde(default)]
    pub artifacts: Vec<FixtureArtifact>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureMaterial {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureArtifact {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub creators: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub conservation_reports: Vec<FixtureReport>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureReport {
    pub details: String,
    pub conditions: String,
    pub preservation_needs: String,
    pub date: NaiveDate,
}

impl From<&FixtureArtifact> for NewArtifact {
    fn from(artifact: &FixtureArtifact) -> Self {
        NewArtifact {
            name: artifact.name.clone(),
            description: artifact.description.clone(),
            format: artifact.format.clone(),
            location: artifact.location.clone(),
            creators: artifact.creators.clone(),
            materials: artifact.materials.clone(),
            tags: artifact.tags.clone(),
            images: artifact.images.clone(),
            conservation_reports: artifact
                .conservation_reports
                .iter()
                .map(|r| NewConservationReport {
                    details: r.details.clone(),
                    conditions: r.conditions.clone(),
                    preservation_needs: r.preservation_needs.clone(),
                    date: r.date,
                })
                .collect(),
        }
    }
}

impl CatalogFixture {
    pub fn load_file(path: &Path) -> std::result::Result<Self, FixtureError> {
        let contents = read_to_string(path).map_err(|e| FixtureError::ReadFile {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| FixtureError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Store the fixture. Artifacts are imported in a single transaction.
    ///
    /// Returns the number of artifacts imported.
    pub fn import_into(&self, db: &mut CatalogDb) -> Result<usize> {
        for material in &self.materials {
            db.insert_material(&material.name, material.description.as_deref())?;
        }
        let artifacts: Vec<NewArtifact> = self.artifacts.iter().map(NewArtifact::from).collect();
        let ids = db.import_artifacts(&artifacts)?;
        info!(
            "Imported {} artifacts and {} described materials",
            ids.len(),
            self.materials.len()
        );
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use heritage_store_db::LookupKind;
    use heritage_utils_test::{ScratchDir, sample_fixture};

    fn sample() -> CatalogFixture {
        serde_json::from_value(sample_fixture()).unwrap()
    }

    #[test]
    fn test_import_sample() {
        let mut db = CatalogDb::open_memory().unwrap();
        assert_eq!(sample().import_into(&mut db).unwrap(), 4);
        assert_eq!(db.count_artifacts().unwrap(), 4);

        let venus = db.get_artifact(1).unwrap().unwrap();
        assert_eq!(venus.artifact.name, "Venus Rising");
        assert_eq!(db.conservation_reports(1).unwrap().len(), 1);

        // "Gold" is shared between a tag and a material without clashing.
        assert!(db.find_lookup(LookupKind::Tag, "Gold").unwrap().is_some());
        assert!(db.find_lookup(LookupKind::Material, "Gold").unwrap().is_some());
    }

    #[test]
    fn test_material_description_kept() {
        let mut db = CatalogDb::open_memory().unwrap();
        sample().import_into(&mut db).unwrap();
        let marble = db.find_lookup(LookupKind::Material, "Marble").unwrap().unwrap();
        let descending = db.get_artifact(2).unwrap().unwrap();
        let material = descending.materials.iter().find(|m| m.id == marble.id).unwrap();
        assert_eq!(material.description.as_deref(), Some("Carrara white marble"));
    }

    #[test]
    fn test_invalid_artifact_rolls_back() {
        let fixture: CatalogFixture = serde_json::from_value(serde_json::json!({
            "artifacts": [{ "name": "Kept?" }, { "name": "  " }]
        }))
        .unwrap();
        let mut db = CatalogDb::open_memory().unwrap();
        let err = fixture.import_into(&mut db).unwrap_err();
        assert!(matches!(err, CatalogError::Store(_)));
        assert_eq!(db.count_artifacts().unwrap(), 0);
    }

    #[test]
    fn test_load_file() {
        let dir = ScratchDir::new().unwrap();
        let path = dir
            .write_file("seed.json", &sample_fixture().to_string())
            .unwrap();
        assert_eq!(CatalogFixture::load_file(&path).unwrap().artifacts.len(), 4);

        let bad = dir.write_file("bad.json", "{\"artifacts\": 3}").unwrap();
        assert!(matches!(
            CatalogFixture::load_file(&bad),
            Err(FixtureError::Parse { .. })
        ));
        assert!(matches!(
            CatalogFixture::load_file(&dir.path().join("missing.json")),
            Err(FixtureError::ReadFile { .. })
        ));
    }
}
