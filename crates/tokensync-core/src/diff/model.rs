//! Comparison output types.
//!
//! Changes borrow the entries they describe from the two input snapshots;
//! nothing here owns registry data.

use crate::model::{Entry, TokenValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a change affects consumers. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Patch,
    Addition,
    Breaking,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Patch => "patch",
            Severity::Addition => "addition",
            Severity::Breaking => "breaking",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeCategory {
    Renamed,
    TypeChanged,
    AliasChanged,
    ValueChanged,
    DescriptionChanged,
    Deleted,
    Added,
    CollectionRenamed,
    ModeRenamed,
    CollectionAdded,
    CollectionDeleted,
    ModeAdded,
    ModeDeleted,
}

impl ChangeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeCategory::Renamed => "renamed",
            ChangeCategory::TypeChanged => "type-changed",
            ChangeCategory::AliasChanged => "alias-changed",
            ChangeCategory::ValueChanged => "value-changed",
            ChangeCategory::DescriptionChanged => "description-changed",
            ChangeCategory::Deleted => "deleted",
            ChangeCategory::Added => "added",
            ChangeCategory::CollectionRenamed => "collection-renamed",
            ChangeCategory::ModeRenamed => "mode-renamed",
            ChangeCategory::CollectionAdded => "collection-added",
            ChangeCategory::CollectionDeleted => "collection-deleted",
            ChangeCategory::ModeAdded => "mode-added",
            ChangeCategory::ModeDeleted => "mode-deleted",
        }
    }

    /// Severity is a function of the category alone.
    pub fn severity(&self) -> Severity {
        match self {
            ChangeCategory::Renamed
            | ChangeCategory::TypeChanged
            | ChangeCategory::Deleted
            | ChangeCategory::CollectionRenamed
            | ChangeCategory::ModeRenamed
            | ChangeCategory::CollectionDeleted
            | ChangeCategory::ModeDeleted => Severity::Breaking,
            ChangeCategory::Added | ChangeCategory::CollectionAdded | ChangeCategory::ModeAdded => {
                Severity::Addition
            }
            ChangeCategory::AliasChanged
            | ChangeCategory::ValueChanged
            | ChangeCategory::DescriptionChanged => Severity::Patch,
        }
    }

    /// True for collection/mode level changes
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ChangeCategory::CollectionRenamed
                | ChangeCategory::ModeRenamed
                | ChangeCategory::CollectionAdded
                | ChangeCategory::CollectionDeleted
                | ChangeCategory::ModeAdded
                | ChangeCategory::ModeDeleted
        )
    }
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What sits on one side of a change: a borrowed entry, or a structural name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChangeSubject<'a> {
    Entry(&'a Entry),
    Name(String),
}

/// One detected difference between the two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change<'a> {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub category: ChangeCategory,
    pub path: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<ChangeSubject<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<ChangeSubject<'a>>,
}

impl<'a> Change<'a> {
    /// Severity follows from `category`.
    pub fn new(
        category: ChangeCategory,
        path: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity: category.severity(),
            category,
            path: path.into(),
            description: description.into(),
            before: None,
            after: None,
        }
    }

    pub fn with_before_entry(mut self, entry: &'a Entry) -> Self {
        self.before = Some(ChangeSubject::Entry(entry));
        self
    }

    pub fn with_after_entry(mut self, entry: &'a Entry) -> Self {
        self.after = Some(ChangeSubject::Entry(entry));
        self
    }

    pub fn with_names(mut self, before: Option<String>, after: Option<String>) -> Self {
        self.before = before.map(ChangeSubject::Name);
        self.after = after.map(ChangeSubject::Name);
        self
    }

    pub fn before_entry(&self) -> Option<&'a Entry> {
        match self.before {
            Some(ChangeSubject::Entry(entry)) => Some(entry),
            _ => None,
        }
    }

    pub fn after_entry(&self) -> Option<&'a Entry> {
        match self.after {
            Some(ChangeSubject::Entry(entry)) => Some(entry),
            _ => None,
        }
    }

    pub fn old_value(&self) -> Option<&'a TokenValue> {
        self.before_entry().map(|e| &e.value)
    }

    pub fn new_value(&self) -> Option<&'a TokenValue> {
        self.after_entry().map(|e| &e.value)
    }
}

/// How a matched pair was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMethod {
    /// Stable identifiers agree
    StableId,
    /// Same path in corresponding collection/mode (heuristic)
    Path,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPair<'a> {
    pub old: &'a Entry,
    pub new: &'a Entry,
    pub method: MatchMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRename {
    pub old: String,
    pub new: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeRename {
    /// Collection name in the new snapshot
    pub collection: String,
    pub old: String,
    pub new: String,
}

/// A collection or mode present on only one side.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StructuralItem {
    Collection { name: String },
    Mode { collection: String, mode: String },
}

/// Output of entity matching, consumed by the classifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult<'a> {
    pub matched_pairs: Vec<MatchedPair<'a>>,
    /// Candidates for deletion
    pub unmatched_old: Vec<&'a Entry>,
    /// Candidates for addition
    pub unmatched_new: Vec<&'a Entry>,
    pub collection_renames: Vec<CollectionRename>,
    pub mode_renames: Vec<ModeRename>,
    pub new_structural: Vec<StructuralItem>,
    pub deleted_structural: Vec<StructuralItem>,
    /// Non-fatal notes about the inputs
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Breaking > Severity::Addition);
        assert!(Severity::Addition > Severity::Patch);
    }

    #[test]
    fn test_category_tags() {
        assert_eq!(
            serde_json::to_value(ChangeCategory::TypeChanged).unwrap(),
            json!("type-changed")
        );
        assert_eq!(ChangeCategory::ModeDeleted.severity(), Severity::Breaking);
        assert_eq!(ChangeCategory::CollectionAdded.severity(), Severity::Addition);
        assert!(ChangeCategory::ModeRenamed.is_structural());
        assert!(!ChangeCategory::Renamed.is_structural());
    }

    #[test]
    fn test_change_serializes_wire_shape() {
        let old = Entry::new("colors.primary", "#fff");
        let new = Entry::new("colors.primary", "#eee");
        let change = Change::new(ChangeCategory::ValueChanged, "colors.primary", "Value changed")
            .with_before_entry(&old)
            .with_after_entry(&new);

        let v = serde_json::to_value(&change).unwrap();
        assert_eq!(v["type"], json!("patch"));
        assert_eq!(v["category"], json!("value-changed"));
        assert_eq!(v["before"]["value"], json!("#fff"));
        assert_eq!(v["after"]["value"], json!("#eee"));
    }

    #[test]
    fn test_structural_change_carries_names() {
        let change = Change::new(ChangeCategory::CollectionRenamed, "tokens", "renamed")
            .with_names(Some("base".to_string()), Some("tokens".to_string()));
        let v = serde_json::to_value(&change).unwrap();
        assert_eq!(v["before"], json!("base"));
        assert_eq!(v["after"], json!("tokens"));
        assert!(change.old_value().is_none());
    }
}
