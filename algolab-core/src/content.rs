//! Algorithm content store: JSON documents on disk.
//!
//! The store serves the static learning content. Core engines only depend
//! on the [`ContentStore`] trait; the section/category/comparison helpers
//! are default methods built on `get`/`list`, so any backing
//! implementation inherits them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

use crate::error::{CoreError, Result};

/// Summary row returned by [`ContentStore::list`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(
        default,
        rename = "estimatedTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_time: Option<String>,
}

/// A complete algorithm document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmDoc {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(
        default,
        rename = "estimatedTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_time: Option<String>,
    #[serde(default)]
    pub sections: BTreeMap<String, Value>,
}

impl AlgorithmDoc {
    pub fn summary(&self) -> AlgorithmSummary {
        AlgorithmSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty.clone(),
            estimated_time: self.estimated_time.clone(),
        }
    }
}

/// One side of an algorithm comparison: the introduction facts a learner
/// weighs when choosing between two algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSide {
    pub id: String,
    pub name: String,
    pub category: String,
    pub strengths: Value,
    pub limitations: Value,
    #[serde(rename = "learningType")]
    pub learning_type: Value,
}

/// Side-by-side pairing of two documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub first: ComparisonSide,
    pub second: ComparisonSide,
}

/// Category aggregation entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub name: String,
    pub algorithms: Vec<AlgorithmSummary>,
    pub count: usize,
}

/// Read interface over the static learning content.
pub trait ContentStore: Send + Sync {
    /// Fetch a complete document by id.
    fn get(&self, id: &str) -> Result<AlgorithmDoc>;

    /// Summaries of every document, sorted by `(category, difficulty)`.
    fn list(&self) -> Result<Vec<AlgorithmSummary>>;

    /// Fetch a single named section of a document.
    fn section(&self, id: &str, name: &str) -> Result<Value> {
        let doc = self.get(id)?;
        doc.sections
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::SectionNotFound {
                algorithm: id.to_string(),
                section: name.to_string(),
            })
    }

    /// Group all documents by category, sorted by category name.
    fn categories(&self) -> Result<Vec<CategoryGroup>> {
        let mut groups: BTreeMap<String, Vec<AlgorithmSummary>> = BTreeMap::new();
        for summary in self.list()? {
            let category = if summary.category.is_empty() {
                "Uncategorized".to_string()
            } else {
                summary.category.clone()
            };
            groups.entry(category).or_default().push(summary);
        }
        Ok(groups
            .into_iter()
            .map(|(name, algorithms)| CategoryGroup {
                name,
                count: algorithms.len(),
                algorithms,
            })
            .collect())
    }

    /// Side-by-side introduction facts for two documents.
    fn compare(&self, first_id: &str, second_id: &str) -> Result<Comparison> {
        Ok(Comparison {
            first: comparison_side(&self.get(first_id)?),
            second: comparison_side(&self.get(second_id)?),
        })
    }
}

fn comparison_side(doc: &AlgorithmDoc) -> ComparisonSide {
    let intro = doc.sections.get("introduction").cloned().unwrap_or(Value::Null);
    let field = |key: &str| intro.get(key).cloned().unwrap_or(Value::Null);
    ComparisonSide {
        id: doc.id.clone(),
        name: doc.name.clone(),
        category: doc.category.clone(),
        strengths: field("strengths"),
        limitations: field("limitations"),
        learning_type: field("learningType"),
    }
}

/// Content store over a directory of `<id>.json` documents.
pub struct FileContentStore {
    dir: PathBuf,
}

impl FileContentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ContentStore for FileContentStore {
    fn get(&self, id: &str) -> Result<AlgorithmDoc> {
        // Ids are file stems; anything path-like cannot match a document.
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(CoreError::NotFound(id.to_string()));
        }
        let path = self.dir.join(format!("{id}.json"));
        if !path.exists() {
            return Err(CoreError::NotFound(id.to_string()));
        }
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }

    fn list(&self) -> Result<Vec<AlgorithmSummary>> {
        let mut summaries = Vec::new();
        if !self.dir.exists() {
            return Ok(summaries);
        }
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(CoreError::from)
                .and_then(|text| Ok(serde_json::from_str::<AlgorithmDoc>(&text)?));
            match parsed {
                Ok(doc) => summaries.push(doc.summary()),
                Err(error) => {
                    // A broken document must not take the whole listing down.
                    warn!(path = %path.display(), %error, "skipping unreadable algorithm document");
                }
            }
        }
        summaries.sort_by(|a, b| {
            (a.category.as_str(), a.difficulty.as_str())
                .cmp(&(b.category.as_str(), b.difficulty.as_str()))
        });
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_doc(dir: &TempDir, id: &str, category: &str, difficulty: &str) {
        let doc = json!({
            "id": id,
            "name": format!("{id} (pretty)"),
            "category": category,
            "difficulty": difficulty,
            "estimatedTime": "30 min",
            "sections": {
                "introduction": {
                    "strengths": ["fast"],
                    "limitations": ["linear only"],
                    "learningType": "supervised"
                },
                "mathematical_model": { "formula": "y = wx + b" }
            }
        });
        std::fs::write(
            dir.path().join(format!("{id}.json")),
            serde_json::to_string_pretty(&doc).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_get_document() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, "linear_regression", "Supervised", "Beginner");

        let store = FileContentStore::new(dir.path());
        let doc = store.get("linear_regression").unwrap();
        assert_eq!(doc.name, "linear_regression (pretty)");
        assert_eq!(doc.category, "Supervised");
        assert!(doc.sections.contains_key("introduction"));
    }

    #[test]
    fn test_get_missing_fails_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FileContentStore::new(dir.path());
        assert!(matches!(
            store.get("missing"),
            Err(CoreError::NotFound(id)) if id == "missing"
        ));
    }

    #[test]
    fn test_get_rejects_path_like_ids() {
        let dir = TempDir::new().unwrap();
        let store = FileContentStore::new(dir.path());
        assert!(matches!(
            store.get("../../etc/passwd"),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_sorted_and_skips_broken() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, "kmeans", "Unsupervised", "Intermediate");
        write_doc(&dir, "linear_regression", "Supervised", "Beginner");
        write_doc(&dir, "decision_tree", "Supervised", "Intermediate");
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = FileContentStore::new(dir.path());
        let listed = store.list().unwrap();
        let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["linear_regression", "decision_tree", "kmeans"]);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let store = FileContentStore::new("/nonexistent/content");
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_section_lookup() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, "kmeans", "Unsupervised", "Intermediate");

        let store = FileContentStore::new(dir.path());
        let section = store.section("kmeans", "mathematical_model").unwrap();
        assert_eq!(section["formula"], "y = wx + b");

        assert!(matches!(
            store.section("kmeans", "proof"),
            Err(CoreError::SectionNotFound { .. })
        ));
    }

    #[test]
    fn test_categories_grouping() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, "kmeans", "Unsupervised", "Intermediate");
        write_doc(&dir, "linear_regression", "Supervised", "Beginner");
        write_doc(&dir, "decision_tree", "Supervised", "Intermediate");

        let store = FileContentStore::new(dir.path());
        let groups = store.categories().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Supervised");
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[1].name, "Unsupervised");
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn test_compare() {
        let dir = TempDir::new().unwrap();
        write_doc(&dir, "kmeans", "Unsupervised", "Intermediate");
        write_doc(&dir, "linear_regression", "Supervised", "Beginner");

        let store = FileContentStore::new(dir.path());
        let comparison = store.compare("linear_regression", "kmeans").unwrap();
        assert_eq!(comparison.first.id, "linear_regression");
        assert_eq!(comparison.second.id, "kmeans");
        assert_eq!(comparison.first.strengths, json!(["fast"]));
        assert_eq!(comparison.second.learning_type, json!("supervised"));
    }
}
