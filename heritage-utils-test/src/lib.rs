// SPDX-FileCopyrightText: 2026 Heritage Catalog contributors
// SPDX-License-Identifier: MIT

//! Test utilities for the heritage catalog.
//!
//! This crate provides proptest strategies for search input and a scratch
//! directory for on-disk catalogs and config files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use proptest::prelude::*;
use tempfile::TempDir;

/// A scratch directory holding a catalog database and auxiliary files.
pub struct ScratchDir {
    _inner: TempDir,
    path: PathBuf,
}

impl ScratchDir {
    /// Create a new temporary directory with a canonicalized path.
    pub fn new() -> io::Result<Self> {
        let inner = TempDir::new()?;
        let path = inner.path().canonicalize()?;
        Ok(Self {
            _inner: inner,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path for a catalog database inside the directory (not created).
    pub fn db_path(&self) -> PathBuf {
        self.path.join("catalog.sqlite")
    }

    /// Write `contents` to `name` inside the directory and return its path.
    pub fn write_file(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.path.join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}

/// Filter names understood by the search endpoint.
pub const FILTER_KEYS: [&str; 8] = [
    "id", "name", "q", "creator", "format", "location", "material", "tag",
];

/// A filter value as a client might send it: words, padding, blanks.
pub fn arb_filter_value() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z]{1,12}",
        "[ \t]{0,3}[a-zA-Z ]{1,12}[ \t]{0,3}",
        Just(String::new()),
        Just("   ".to_string()),
        "[0-9]{1,4}",
    ]
}

prop_compose! {
    /// Distinct known filter keys with values, in arbitrary order.
    pub fn arb_filter_pairs()(
        pairs in proptest::sample::subsequence(FILTER_KEYS.to_vec(), 0..=FILTER_KEYS.len())
            .prop_flat_map(|keys| {
                let n = keys.len();
                (Just(keys), proptest::collection::vec(arb_filter_value(), n))
            })
            .prop_map(|(keys, values)| {
                keys.into_iter()
                    .map(str::to_string)
                    .zip(values)
                    .collect::<Vec<_>>()
            })
            .prop_shuffle()
    ) -> Vec<(String, String)> {
        pairs
    }
}

/// A raw `page`/`per_page` query parameter: absent, junk, or any integer.
pub fn arb_page_param() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("abc".to_string())),
        Just(Some(String::new())),
        (-5i64..300).prop_map(|n| Some(n.to_string())),
        any::<i64>().prop_map(|n| Some(n.to_string())),
    ]
}

/// A small fixture catalog in the bulk-load JSON format.
///
/// Ids are assigned in artifact order: 1 "Venus Rising", 2 "Venus
/// Descending", 3 "Mars Ascending", 4 "Golden Chalice".
pub fn sample_fixture() -> serde_json::Value {
    serde_json::json!({
        "materials": [
            { "name": "Marble", "description": "Carrara white marble" }
        ],
        "artifacts": [
            {
                "name": "Venus Rising",
                "description": "Tempera on canvas",
                "format": "Painting",
                "location": "Uffizi",
                "creators": ["Sandro Botticelli"],
                "materials": ["Tempera", "Canvas"],
                "tags": ["Gold", "Renaissance"],
                "images": ["https://img.example/venus-1.jpg"],
                "conservation_reports": [
                    {
                        "details": "Surface cleaning",
                        "conditions": "Stable",
                        "preservation_needs": "Low light",
                        "date": "2019-06-01"
                    }
                ]
            },
            {
                "name": "Venus Descending",
                "format": "Sculpture",
                "creators": ["Antonio Canova"],
                "materials": ["Marble"],
                "tags": ["Neoclassical"]
            },
            {
                "name": "Mars Ascending",
                "description": "Bronze statuette",
                "location": "Louvre",
                "materials": ["Bronze"]
            },
            {
                "name": "Golden Chalice",
                "format": "Goldsmithery",
                "creators": ["Benvenuto Cellini", "Workshop of Cellini"],
                "materials": ["Gold", "Enamel"],
                "tags": ["Gold", "Gilded", "Renaissance"],
                "images": [
                    "https://img.example/chalice-1.jpg",
                    "https://img.example/chalice-2.jpg"
                ]
            }
        ]
    })
}
