//! Flat response records.

use chrono::NaiveDate;
use heritage_store_db::{ArtifactGraph, ConservationReport};
use serde::{Deserialize, Serialize};

/// An artifact with its relationships reduced to display names.
///
/// To-many relationships are always lists, empty when nothing is related.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub format: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub creators: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Image URLs
    #[serde(default)]
    pub images: Vec<String>,
}

impl ArtifactRecord {
    pub fn from_graph(graph: Option<&ArtifactGraph>) -> Option<Self> {
        graph.map(Self::from)
    }
}

impl From<&ArtifactGraph> for ArtifactRecord {
    fn from(graph: &ArtifactGraph) -> Self {
        ArtifactRecord {
            id: graph.artifact.id,
            name: graph.artifact.name.clone(),
            description: graph.artifact.description.clone(),
            format: graph.format.as_ref().map(|f| f.name.clone()),
            location: graph.location.as_ref().map(|l| l.name.clone()),
            creators: graph.creators.iter().map(|c| c.name.clone()).collect(),
            materials: graph.materials.iter().map(|m| m.name.clone()).collect(),
            tags: graph.tags.iter().map(|t| t.name.clone()).collect(),
            images: graph.images.iter().map(|i| i.url.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConservationReportRecord {
    pub id: i64,
    pub artifact_id: i64,
    pub details: String,
    pub conditions: String,
    pub preservation_needs: String,
    /// Serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
}

impl From<&ConservationReport> for ConservationReportRecord {
    fn from(report: &ConservationReport) -> Self {
        ConservationReportRecord {
            id: report.id,
            artifact_id: report.artifact_id,
            details: report.details.clone(),
            conditions: report.conditions.clone(),
            preservation_needs: report.preservation_needs.clone(),
            date: report.date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heritage_store_db::{Artifact, Image, Lookup, Material};
    use serde_json::json;

    fn bare(id: i64, name: &str) -> ArtifactGraph {
        ArtifactGraph {
            artifact: Artifact {
                id,
                name: name.to_string(),
                description: None,
                format_id: None,
                location_id: None,
            },
            format: None,
            location: None,
            creators: Vec::new(),
            materials: Vec::new(),
            tags: Vec::new(),
            images: Vec::new(),
        }
    }

    #[test]
    fn test_absent_graph() {
        assert_eq!(ArtifactRecord::from_graph(None), None);
    }

    #[test]
    fn test_bare_artifact_serializes_empty_lists() {
        let record = ArtifactRecord::from_graph(Some(&bare(3, "Mars Ascending"))).unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "id": 3,
                "name": "Mars Ascending",
                "description": null,
                "format": null,
                "location": null,
                "creators": [],
                "materials": [],
                "tags": [],
                "images": [],
            })
        );
    }

    #[test]
    fn test_full_graph() {
        let mut graph = bare(1, "Venus Rising");
        graph.artifact.description = Some("Tempera on canvas".to_string());
        graph.format = Some(Lookup { id: 1, name: "Painting".to_string() });
        graph.location = Some(Lookup { id: 2, name: "Uffizi".to_string() });
        graph.creators = vec![Lookup { id: 1, name: "Sandro Botticelli".to_string() }];
        graph.materials = vec![Material {
            id: 4,
            name: "Tempera".to_string(),
            description: Some("Egg-based paint".to_string()),
        }];
        graph.tags = vec![
            Lookup { id: 1, name: "Gold".to_string() },
            Lookup { id: 2, name: "Renaissance".to_string() },
        ];
        graph.images = vec![Image {
            id: 9,
            url: "https://img.example/venus-1.jpg".to_string(),
            artifact_id: Some(1),
        }];

        let record = ArtifactRecord::from(&graph);
        assert_eq!(record.format.as_deref(), Some("Painting"));
        assert_eq!(record.location.as_deref(), Some("Uffizi"));
        assert_eq!(record.creators, vec!["Sandro Botticelli"]);
        assert_eq!(record.materials, vec!["Tempera"]);
        assert_eq!(record.tags, vec!["Gold", "Renaissance"]);
        assert_eq!(record.images, vec!["https://img.example/venus-1.jpg"]);
    }

    #[test]
    fn test_report_date_format() {
        let report = ConservationReport {
            id: 1,
            artifact_id: 1,
            details: "Surface cleaning".to_string(),
            conditions: "Stable".to_string(),
            preservation_needs: "Low light".to_string(),
            date: NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
        };
        let value = serde_json::to_value(ConservationReportRecord::from(&report)).unwrap();
        assert_eq!(value["date"], "2019-06-01");
    }
}
