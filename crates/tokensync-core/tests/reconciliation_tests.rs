#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end reconciliation scenarios: match, classify, bump

use serde_json::{json, Value};
use tokensync_core::diff::{classify, compare, ChangeCategory, EntityMatcher, Severity};
use tokensync_core::model::Snapshot;
use tokensync_core::version::{calculate, BumpType};
use tokensync_core::{Change, EngineConfig};

fn parse(raw: Value) -> Snapshot {
    Snapshot::from_value(&raw).unwrap().snapshot
}

fn categories(changes: &[Change<'_>]) -> Vec<ChangeCategory> {
    changes.iter().map(|c| c.category).collect()
}

#[test]
fn test_value_change_end_to_end() {
    let old = parse(json!({
        "entries": { "k1": { "stableId": "V1", "path": "colors.primary", "value": "#fff" } }
    }));
    let new = parse(json!({
        "entries": { "k1": { "stableId": "V1", "path": "colors.primary", "value": "#eee" } }
    }));

    let comparison = compare(&old, &new, "1.5.3", &EngineConfig::default()).unwrap();
    let changes = comparison.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].category, ChangeCategory::ValueChanged);
    assert_eq!(changes[0].severity, Severity::Patch);
    assert_eq!(changes[0].old_value().unwrap().as_json(), &json!("#fff"));
    assert_eq!(changes[0].new_value().unwrap().as_json(), &json!("#eee"));
    assert_eq!(comparison.bump.suggested, "1.5.4");
}

#[test]
fn test_stable_id_rename_is_not_delete_plus_add() {
    let old = parse(json!({
        "entries": { "k1": { "stableId": "V1", "path": "a.b", "value": "1" } }
    }));
    let new = parse(json!({
        "entries": { "k9": { "stableId": "V1", "path": "a.c", "value": "2" } }
    }));

    let matched = EntityMatcher::new().match_snapshots(&old, &new);
    let changes = classify(&matched);
    assert_eq!(categories(&changes), vec![ChangeCategory::Renamed]);
}

#[test]
fn test_collection_rename_by_shared_stable_ids() {
    let old = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "base", "mode": "default", "path": "colors.primary", "value": "#fff" },
            "k2": { "stableId": "V2", "collection": "base", "mode": "default", "path": "space.sm", "value": 4 }
        }
    }));
    let new = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "tokens", "mode": "default", "path": "colors.primary", "value": "#fff" },
            "k2": { "stableId": "V2", "collection": "tokens", "mode": "default", "path": "space.sm", "value": 4 }
        }
    }));

    let matched = EntityMatcher::new().match_snapshots(&old, &new);
    assert_eq!(matched.collection_renames.len(), 1);
    assert_eq!(matched.collection_renames[0].old, "base");
    assert_eq!(matched.collection_renames[0].new, "tokens");

    let changes = classify(&matched);
    assert_eq!(categories(&changes), vec![ChangeCategory::CollectionRenamed]);
}

#[test]
fn test_collection_rename_keeps_token_changes() {
    let old = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "base", "mode": "default", "path": "colors.primary", "value": "#fff" },
            "k2": { "stableId": "V2", "collection": "base", "mode": "default", "path": "space.sm", "value": 4 }
        }
    }));
    let new = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "tokens", "mode": "default", "path": "colors.primary", "value": "#eee" },
            "k2": { "stableId": "V2", "collection": "tokens", "mode": "default", "path": "space.sm", "value": 4 },
            "k3": { "stableId": "V3", "collection": "tokens", "mode": "default", "path": "space.md", "value": 8 }
        }
    }));

    let matched = EntityMatcher::new().match_snapshots(&old, &new);
    assert_eq!(matched.collection_renames.len(), 1);
    assert_eq!(matched.matched_pairs.len(), 2);
    assert!(matched.deleted_structural.is_empty());
    assert!(matched.new_structural.is_empty());

    let changes = classify(&matched);
    assert_eq!(
        categories(&changes),
        vec![
            ChangeCategory::CollectionRenamed,
            ChangeCategory::Added,
            ChangeCategory::ValueChanged
        ]
    );
    assert_eq!(changes[1].path, "space.md");
    assert_eq!(changes[2].path, "colors.primary");
}

#[test]
fn test_token_moved_between_collections_is_not_delete_plus_add() {
    let old = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "base", "mode": "default", "path": "a", "value": "1" },
            "k2": { "stableId": "V2", "collection": "base", "mode": "default", "path": "b", "value": "2" },
            "k3": { "stableId": "V3", "collection": "extra", "mode": "default", "path": "c", "value": "3" }
        }
    }));
    let new = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "base", "mode": "default", "path": "a", "value": "1" },
            "k2": { "stableId": "V2", "collection": "extra", "mode": "default", "path": "b", "value": "5" },
            "k3": { "stableId": "V3", "collection": "extra", "mode": "default", "path": "c", "value": "3" }
        }
    }));

    let matched = EntityMatcher::new().match_snapshots(&old, &new);
    assert_eq!(matched.matched_pairs.len(), 3);
    assert!(matched.unmatched_old.is_empty());
    assert!(matched.unmatched_new.is_empty());
    assert_eq!(categories(&classify(&matched)), vec![ChangeCategory::ValueChanged]);
}

#[test]
fn test_collection_rename_inferred_from_paths_without_ids() {
    let old = parse(json!({
        "entries": {
            "k1": { "collection": "base", "mode": "default", "path": "colors.primary", "value": "#fff" },
            "k2": { "collection": "base", "mode": "default", "path": "space.sm", "value": 4 }
        }
    }));
    let new = parse(json!({
        "entries": {
            "k1": { "collection": "tokens", "mode": "default", "path": "colors.primary", "value": "#fff" },
            "k2": { "collection": "tokens", "mode": "default", "path": "space.sm", "value": 4 }
        }
    }));

    let comparison = compare(&old, &new, "1.0.0", &EngineConfig::default()).unwrap();
    let changes = comparison.changes();
    assert_eq!(categories(changes), vec![ChangeCategory::CollectionRenamed]);
    assert_eq!(changes[0].path, "tokens");

    let strict = EngineConfig::default().with_heuristic_matching(false);
    let comparison = compare(&old, &new, "1.0.0", &strict).unwrap();
    assert_eq!(
        categories(comparison.changes()),
        vec![ChangeCategory::CollectionDeleted, ChangeCategory::CollectionAdded]
    );
}

#[test]
fn test_mode_rename_inferred_by_position_without_ids() {
    let old = parse(json!({
        "entries": {
            "k1": { "collection": "theme", "mode": "light", "path": "bg", "value": "#fff" },
            "k2": { "collection": "theme", "mode": "dark", "path": "bg", "value": "#000" }
        }
    }));
    let new = parse(json!({
        "entries": {
            "k1": { "collection": "theme", "mode": "day", "path": "bg", "value": "#fff" },
            "k2": { "collection": "theme", "mode": "dark", "path": "bg", "value": "#000" }
        }
    }));

    let matched = EntityMatcher::new().match_snapshots(&old, &new);
    assert_eq!(matched.mode_renames.len(), 1);
    assert_eq!(matched.mode_renames[0].old, "light");
    assert_eq!(matched.mode_renames[0].new, "day");
    assert_eq!(categories(&classify(&matched)), vec![ChangeCategory::ModeRenamed]);
}

#[test]
fn test_mode_rename_suppresses_entry_noise() {
    let old = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "theme", "mode": "light", "path": "bg", "value": "#fff" },
            "k2": { "stableId": "V1", "collection": "theme", "mode": "dark", "path": "bg", "value": "#000" }
        }
    }));
    let new = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "theme", "mode": "day", "path": "bg", "value": "#fff" },
            "k2": { "stableId": "V1", "collection": "theme", "mode": "dark", "path": "bg", "value": "#000" }
        }
    }));

    let comparison = compare(&old, &new, "2.1.0", &EngineConfig::default()).unwrap();
    assert_eq!(categories(comparison.changes()), vec![ChangeCategory::ModeRenamed]);
    assert_eq!(comparison.bump.suggested, "3.0.0");
}

#[test]
fn test_deleted_mode_reported_once() {
    let old = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "theme", "mode": "light", "path": "bg", "value": "#fff" },
            "k2": { "stableId": "V1", "collection": "theme", "mode": "dark", "path": "bg", "value": "#000" },
            "k3": { "stableId": "V2", "collection": "theme", "mode": "dark", "path": "fg", "value": "#fff" }
        }
    }));
    let new = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "theme", "mode": "light", "path": "bg", "value": "#fff" }
        }
    }));

    let comparison = compare(&old, &new, "1.0.0", &EngineConfig::default()).unwrap();
    assert_eq!(categories(comparison.changes()), vec![ChangeCategory::ModeDeleted]);
}

#[test]
fn test_last_mode_deleted_reports_collection_only() {
    let old = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "base", "mode": "default", "path": "a", "value": "1" },
            "k2": { "stableId": "V2", "collection": "legacy", "mode": "default", "path": "b", "value": "2" }
        }
    }));
    let new = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "collection": "base", "mode": "default", "path": "a", "value": "1" }
        }
    }));

    let comparison = compare(&old, &new, "1.0.0", &EngineConfig::default()).unwrap();
    assert_eq!(
        categories(comparison.changes()),
        vec![ChangeCategory::CollectionDeleted]
    );
}

#[test]
fn test_alias_retarget_is_patch() {
    let old = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "path": "fg", "value": "{colors.black}" },
            "k2": { "stableId": "V2", "path": "colors.black", "value": "#000" },
            "k3": { "stableId": "V3", "path": "colors.ink", "value": "#111" }
        }
    }));
    let new = parse(json!({
        "entries": {
            "k1": { "stableId": "V1", "path": "fg", "value": "{colors.ink}" },
            "k2": { "stableId": "V2", "path": "colors.black", "value": "#000" },
            "k3": { "stableId": "V3", "path": "colors.ink", "value": "#111" }
        }
    }));

    let comparison = compare(&old, &new, "1.0.0", &EngineConfig::default()).unwrap();
    assert_eq!(categories(comparison.changes()), vec![ChangeCategory::AliasChanged]);
    assert_eq!(comparison.bump.change_type, BumpType::Patch);
}

#[test]
fn test_path_heuristic_without_stable_ids() {
    let old = parse(json!({
        "entries": {
            "k1": { "collection": "base", "mode": "m", "path": "radius", "value": 4, "type": "FLOAT" },
            "k2": { "collection": "base", "mode": "m", "path": "gone", "value": 1, "type": "FLOAT" }
        }
    }));
    let new = parse(json!({
        "entries": {
            "k1": { "collection": "base", "mode": "m", "path": "radius", "value": "4px", "type": "STRING" },
            "k3": { "collection": "base", "mode": "m", "path": "fresh", "value": 2, "type": "FLOAT" }
        }
    }));

    let comparison = compare(&old, &new, "1.0.0", &EngineConfig::default()).unwrap();
    assert_eq!(
        categories(comparison.changes()),
        vec![
            ChangeCategory::TypeChanged,
            ChangeCategory::Deleted,
            ChangeCategory::Added
        ]
    );
}

#[test]
fn test_classification_independent_of_entry_keys() {
    let old = parse(json!({
        "entries": {
            "a": { "stableId": "V1", "path": "x", "value": "1" },
            "b": { "stableId": "V2", "path": "y", "value": "2" }
        }
    }));
    let new_one = parse(json!({
        "entries": {
            "a": { "stableId": "V1", "path": "x", "value": "9" },
            "c": { "stableId": "V3", "path": "z", "value": "3" }
        }
    }));
    let new_two = parse(json!({
        "entries": {
            "zz": { "stableId": "V3", "path": "z", "value": "3" },
            "aa": { "stableId": "V1", "path": "x", "value": "9" }
        }
    }));

    let config = EngineConfig::default();
    let one = compare(&old, &new_one, "1.0.0", &config).unwrap();
    let two = compare(&old, &new_two, "1.0.0", &config).unwrap();
    assert_eq!(
        serde_json::to_value(one.changes()).unwrap(),
        serde_json::to_value(two.changes()).unwrap()
    );
}

#[test]
fn test_version_dominance_and_arithmetic() {
    let breaking = || Change::new(ChangeCategory::Deleted, "a", "deleted");
    let addition = || Change::new(ChangeCategory::Added, "b", "added");
    let patch = || Change::new(ChangeCategory::ValueChanged, "c", "changed");

    let bump = calculate("1.5.3", vec![breaking(), addition()]).unwrap();
    assert_eq!(bump.change_type, BumpType::Major);
    assert_eq!(bump.suggested, "2.0.0");

    let bump = calculate("1.5.3", vec![addition()]).unwrap();
    assert_eq!(bump.change_type, BumpType::Minor);
    assert_eq!(bump.suggested, "1.6.0");

    let bump = calculate("1.5.3", vec![patch()]).unwrap();
    assert_eq!(bump.change_type, BumpType::Patch);
    assert_eq!(bump.suggested, "1.5.4");

    let bump = calculate("1.5.3", Vec::new()).unwrap();
    assert_eq!(bump.change_type, BumpType::None);
    assert_eq!(bump.suggested, bump.current);
}

#[test]
fn test_comparison_serializes_wire_shape() {
    let old = parse(json!({ "entries": { "k1": { "stableId": "V1", "path": "a", "value": "1" } } }));
    let new = parse(json!({ "entries": {} }));

    let comparison = compare(&old, &new, "1.0.0", &EngineConfig::default()).unwrap();
    let value = serde_json::to_value(&comparison).unwrap();
    assert_eq!(value["bump"]["changeType"], json!("major"));
    assert_eq!(value["identity"]["newEntryCount"], json!(0));
}
