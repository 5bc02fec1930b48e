//! Turns a [`MatchResult`] into classified [`Change`]s.

use crate::diff::model::{
    Change, ChangeCategory, MatchResult, MatchedPair, StructuralItem,
};
use crate::model::Entry;
use std::collections::BTreeSet;

/// The per-mode copies of one token share a key.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct RenameKey<'r> {
    stable_id: Option<&'r str>,
    collection: &'r str,
    old_path: &'r str,
    new_path: &'r str,
}

impl<'r> RenameKey<'r> {
    fn of(pair: &MatchedPair<'r>) -> Self {
        Self {
            stable_id: pair.old.stable_id.as_deref(),
            collection: pair.old.collection_name.as_str(),
            old_path: pair.old.path.as_str(),
            new_path: pair.new.path.as_str(),
        }
    }
}

/// Classify every pair and leftover of a match.
///
/// Output is sorted most severe first, then by category and path, so equal
/// inputs always produce identical sequences.
pub fn classify<'a>(result: &MatchResult<'a>) -> Vec<Change<'a>> {
    let mut changes = Vec::new();
    // A rename is a property of the token, not of each mode it has a value in.
    let mut seen_renames: BTreeSet<RenameKey<'_>> = BTreeSet::new();

    for pair in &result.matched_pairs {
        let Some(change) = classify_pair(pair) else {
            continue;
        };
        if change.category == ChangeCategory::Renamed && !seen_renames.insert(RenameKey::of(pair)) {
            continue;
        }
        changes.push(change);
    }

    for entry in &result.unmatched_old {
        changes.push(
            Change::new(
                ChangeCategory::Deleted,
                entry.path.as_str(),
                format!("Token '{}' deleted", entry.display_address()),
            )
            .with_before_entry(entry),
        );
    }
    for entry in &result.unmatched_new {
        changes.push(
            Change::new(
                ChangeCategory::Added,
                entry.path.as_str(),
                format!("Token '{}' added", entry.display_address()),
            )
            .with_after_entry(entry),
        );
    }

    for rename in &result.collection_renames {
        changes.push(
            Change::new(
                ChangeCategory::CollectionRenamed,
                rename.new.as_str(),
                format!("Collection renamed from '{}' to '{}'", rename.old, rename.new),
            )
            .with_names(Some(rename.old.clone()), Some(rename.new.clone())),
        );
    }
    for rename in &result.mode_renames {
        changes.push(
            Change::new(
                ChangeCategory::ModeRenamed,
                format!("{}/{}", rename.collection, rename.new),
                format!(
                    "Mode renamed from '{}' to '{}' in collection '{}'",
                    rename.old, rename.new, rename.collection
                ),
            )
            .with_names(Some(rename.old.clone()), Some(rename.new.clone())),
        );
    }

    for item in &result.new_structural {
        changes.push(structural_change(item, true));
    }
    for item in &result.deleted_structural {
        changes.push(structural_change(item, false));
    }

    changes.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(a.category.cmp(&b.category))
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.description.cmp(&b.description))
    });
    changes
}

/// First matching rule wins; `None` when the pair is unchanged.
fn classify_pair<'a>(pair: &MatchedPair<'a>) -> Option<Change<'a>> {
    let (old, new) = (pair.old, pair.new);

    let (category, description) = if old.path != new.path {
        (
            ChangeCategory::Renamed,
            format!("Renamed from '{}' to '{}'", old.path, new.path),
        )
    } else if old.value_type != new.value_type {
        (
            ChangeCategory::TypeChanged,
            format!(
                "Type of '{}' changed from {} to {}",
                new.display_address(),
                type_label(old),
                type_label(new)
            ),
        )
    } else if old.value != new.value {
        let category = if old.value.is_alias() || new.value.is_alias() {
            ChangeCategory::AliasChanged
        } else {
            ChangeCategory::ValueChanged
        };
        (
            category,
            format!(
                "Value of '{}' changed from {} to {}",
                new.display_address(),
                old.value,
                new.value
            ),
        )
    } else if old.description != new.description {
        (
            ChangeCategory::DescriptionChanged,
            format!("Description of '{}' changed", new.display_address()),
        )
    } else {
        return None;
    };

    Some(
        Change::new(category, new.path.as_str(), description)
            .with_before_entry(old)
            .with_after_entry(new),
    )
}

fn type_label(entry: &Entry) -> String {
    entry
        .value_type
        .as_ref()
        .map_or_else(|| "untyped".to_string(), |t| t.to_string())
}

fn structural_change<'a>(item: &StructuralItem, added: bool) -> Change<'a> {
    let verb = if added { "added" } else { "deleted" };
    match item {
        StructuralItem::Collection { name } => {
            let category = if added {
                ChangeCategory::CollectionAdded
            } else {
                ChangeCategory::CollectionDeleted
            };
            let change =
                Change::new(category, name.as_str(), format!("Collection '{name}' {verb}"));
            if added {
                change.with_names(None, Some(name.clone()))
            } else {
                change.with_names(Some(name.clone()), None)
            }
        }
        StructuralItem::Mode { collection, mode } => {
            let category = if added {
                ChangeCategory::ModeAdded
            } else {
                ChangeCategory::ModeDeleted
            };
            let change = Change::new(
                category,
                format!("{collection}/{mode}"),
                format!("Mode '{mode}' {verb} in collection '{collection}'"),
            );
            if added {
                change.with_names(None, Some(mode.clone()))
            } else {
                change.with_names(Some(mode.clone()), None)
            }
        }
    }
}
