//! Entity matching between two snapshots.
//!
//! Matching runs in four steps:
//!
//! 1. Entries whose stable id and mode stable id agree on both sides are
//!    paired outright (anchors).
//! 2. Collections and modes are paired structurally: by stable id, then by
//!    name, then by votes (shared entry stable ids for collections, anchors
//!    for modes), then (heuristically) by identical member sets for
//!    collections and by position for modes.
//! 3. Remaining entries are paired inside corresponding collection/mode
//!    slots, first by stable id and then, heuristically, by path. Entries
//!    whose stable id moved to a slot without a counterpart are paired
//!    afterwards when the id is unambiguous.
//! 4. Leftovers that live in a collection or mode which itself appeared or
//!    disappeared are dropped; the structural change already covers them.

use crate::diff::model::{
    CollectionRename, MatchMethod, MatchResult, MatchedPair, ModeRename, StructuralItem,
};
use crate::model::{Entry, Snapshot};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Position of an entry inside its snapshot's collection/mode layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct Slot {
    collection: usize,
    mode: usize,
}

/// Grouping key: stable id when present, otherwise the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum GroupKey<'a> {
    Id(&'a str),
    Name(&'a str),
}

impl<'a> GroupKey<'a> {
    fn of(stable_id: Option<&'a str>, name: &'a str) -> Self {
        match stable_id {
            Some(id) => GroupKey::Id(id),
            None => GroupKey::Name(name),
        }
    }
}

/// Member identity used for collection set comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Identity<'a> {
    Id(&'a str),
    Path(&'a str),
}

#[derive(Debug)]
struct Group<'a> {
    stable_id: Option<&'a str>,
    name: &'a str,
}

#[derive(Debug)]
struct CollectionInfo<'a> {
    group: Group<'a>,
    modes: Vec<Group<'a>>,
    mode_index: HashMap<GroupKey<'a>, usize>,
    members: BTreeSet<Identity<'a>>,
}

/// Collections and modes of one snapshot in discovery order.
#[derive(Debug)]
struct Inventory<'a> {
    collections: Vec<CollectionInfo<'a>>,
    entries: Vec<(&'a Entry, Slot)>,
}

impl<'a> Inventory<'a> {
    fn build(snapshot: &'a Snapshot) -> Self {
        let mut collections: Vec<CollectionInfo<'a>> = Vec::new();
        let mut index: HashMap<GroupKey<'a>, usize> = HashMap::new();
        let mut entries = Vec::with_capacity(snapshot.len());

        for entry in snapshot.entries.values() {
            let collection_id = entry.collection_stable_id.as_deref();
            let key = GroupKey::of(collection_id, &entry.collection_name);
            let ci = *index.entry(key).or_insert_with(|| {
                collections.push(CollectionInfo {
                    group: Group {
                        stable_id: collection_id,
                        name: &entry.collection_name,
                    },
                    modes: Vec::new(),
                    mode_index: HashMap::new(),
                    members: BTreeSet::new(),
                });
                collections.len() - 1
            });

            let info = &mut collections[ci];
            info.members.insert(match entry.stable_id.as_deref() {
                Some(id) => Identity::Id(id),
                None => Identity::Path(&entry.path),
            });

            let mode_id = entry.mode_stable_id.as_deref();
            let modes = &mut info.modes;
            let mi = *info
                .mode_index
                .entry(GroupKey::of(mode_id, &entry.mode_name))
                .or_insert_with(|| {
                    modes.push(Group {
                        stable_id: mode_id,
                        name: &entry.mode_name,
                    });
                    modes.len() - 1
                });

            entries.push((
                entry,
                Slot {
                    collection: ci,
                    mode: mi,
                },
            ));
        }

        Self {
            collections,
            entries,
        }
    }
}

/// One-to-one pairing between two index spaces.
#[derive(Debug, Clone, Default)]
struct Pairing {
    old_to_new: Vec<Option<usize>>,
    new_to_old: Vec<Option<usize>>,
}

impl Pairing {
    fn new(old_len: usize, new_len: usize) -> Self {
        Self {
            old_to_new: vec![None; old_len],
            new_to_old: vec![None; new_len],
        }
    }

    fn link(&mut self, old: usize, new: usize) {
        self.old_to_new[old] = Some(new);
        self.new_to_old[new] = Some(old);
    }

    fn is_free(&self, old: usize, new: usize) -> bool {
        self.old_to_new[old].is_none() && self.new_to_old[new].is_none()
    }

    fn unpaired_old(&self) -> Vec<usize> {
        unpaired(&self.old_to_new)
    }

    fn unpaired_new(&self) -> Vec<usize> {
        unpaired(&self.new_to_old)
    }
}

fn unpaired(links: &[Option<usize>]) -> Vec<usize> {
    links
        .iter()
        .enumerate()
        .filter(|(_, link)| link.is_none())
        .map(|(i, _)| i)
        .collect()
}

/// Pair by shared stable id, then by equal name where at least one side
/// carries no id.
fn pair_groups(old: &[&Group<'_>], new: &[&Group<'_>]) -> Pairing {
    let mut pairing = Pairing::new(old.len(), new.len());

    for (oi, o) in old.iter().enumerate() {
        let Some(id) = o.stable_id else { continue };
        let found = (0..new.len())
            .find(|&ni| pairing.is_free(oi, ni) && new[ni].stable_id == Some(id));
        if let Some(ni) = found {
            pairing.link(oi, ni);
        }
    }

    for (oi, o) in old.iter().enumerate() {
        if pairing.old_to_new[oi].is_some() {
            continue;
        }
        let found = (0..new.len()).find(|&ni| {
            let n = new[ni];
            pairing.is_free(oi, ni)
                && n.name == o.name
                && !(o.stable_id.is_some() && n.stable_id.is_some())
        });
        if let Some(ni) = found {
            pairing.link(oi, ni);
        }
    }

    pairing
}

/// Pair unpaired items that are each other's strongest vote. Ties pair
/// nothing.
fn pair_by_votes(pairing: &mut Pairing, votes: impl IntoIterator<Item = (usize, usize)>) {
    let mut tally: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    for (o, n) in votes {
        if pairing.is_free(o, n) {
            *tally.entry((o, n)).or_default() += 1;
        }
    }

    let forward = strongest(tally.iter().map(|(&(o, n), &count)| (o, n, count)));
    let backward = strongest(tally.iter().map(|(&(o, n), &count)| (n, o, count)));
    for (o, n) in forward {
        if backward.get(&n) == Some(&o) && pairing.is_free(o, n) {
            pairing.link(o, n);
        }
    }
}

/// For each source, the target holding strictly the most votes.
fn strongest(tallies: impl Iterator<Item = (usize, usize, usize)>) -> BTreeMap<usize, usize> {
    // source -> (target, votes, tied)
    let mut best: BTreeMap<usize, (usize, usize, bool)> = BTreeMap::new();
    for (from, to, count) in tallies {
        match best.get_mut(&from) {
            None => {
                best.insert(from, (to, count, false));
            }
            Some(top) if count > top.1 => *top = (to, count, false),
            Some(top) if count == top.1 => top.2 = true,
            Some(_) => {}
        }
    }
    best.into_iter()
        .filter(|(_, (_, _, tied))| !tied)
        .map(|(from, (to, _, _))| (from, to))
        .collect()
}

/// One vote per stable id shared by an old and a new collection.
fn identity_votes(old: &Inventory<'_>, new: &Inventory<'_>) -> Vec<(usize, usize)> {
    fn collections_by_id<'s>(inventory: &Inventory<'s>) -> BTreeMap<&'s str, BTreeSet<usize>> {
        let mut by_id: BTreeMap<&'s str, BTreeSet<usize>> = BTreeMap::new();
        for &(entry, slot) in &inventory.entries {
            if let Some(id) = entry.stable_id.as_deref() {
                by_id.entry(id).or_default().insert(slot.collection);
            }
        }
        by_id
    }

    let old_by_id = collections_by_id(old);
    let new_by_id = collections_by_id(new);
    let mut votes = Vec::new();
    for (id, old_collections) in &old_by_id {
        let Some(new_collections) = new_by_id.get(*id) else {
            continue;
        };
        for &o in old_collections {
            votes.extend(new_collections.iter().map(|&n| (o, n)));
        }
    }
    votes
}

/// Collection and mode correspondence between the two snapshots.
#[derive(Debug)]
pub(crate) struct StructureMap {
    collections: Pairing,
    /// Mode pairing per old collection index, present when that collection is paired
    modes: Vec<Option<Pairing>>,
}

impl StructureMap {
    /// Where an old slot lives in the new snapshot, if it survived.
    fn translate(&self, slot: Slot) -> Option<Slot> {
        let collection = self.collections.old_to_new[slot.collection]?;
        let modes = self.modes[slot.collection].as_ref()?;
        let mode = modes.old_to_new[slot.mode]?;
        Some(Slot { collection, mode })
    }

    /// True when the old slot's collection or mode was deleted as a whole.
    fn old_slot_vanished(&self, slot: Slot) -> bool {
        self.translate(slot).is_none()
    }

    /// True when the new slot's collection or mode is new as a whole.
    fn new_slot_appeared(&self, slot: Slot) -> bool {
        let Some(old_collection) = self.collections.new_to_old[slot.collection] else {
            return true;
        };
        match self.modes[old_collection].as_ref() {
            Some(modes) => modes.new_to_old[slot.mode].is_none(),
            None => true,
        }
    }
}

/// Entries not yet paired, with their slots.
#[derive(Debug)]
pub(crate) struct EntryPools<'a> {
    old: Vec<(&'a Entry, Slot)>,
    new: Vec<(&'a Entry, Slot)>,
    old_taken: Vec<bool>,
    new_taken: Vec<bool>,
    /// (old index, new index) of every pair taken so far
    links: Vec<(usize, usize)>,
}

impl<'a> EntryPools<'a> {
    fn new(old: Vec<(&'a Entry, Slot)>, new: Vec<(&'a Entry, Slot)>) -> Self {
        Self {
            old_taken: vec![false; old.len()],
            new_taken: vec![false; new.len()],
            links: Vec::new(),
            old,
            new,
        }
    }

    fn take(&mut self, oi: usize, ni: usize, method: MatchMethod) -> MatchedPair<'a> {
        self.old_taken[oi] = true;
        self.new_taken[ni] = true;
        self.links.push((oi, ni));
        MatchedPair {
            old: self.old[oi].0,
            new: self.new[ni].0,
            method,
        }
    }

    fn free_old(&self) -> impl Iterator<Item = (usize, &'a Entry, Slot)> + '_ {
        self.old
            .iter()
            .enumerate()
            .filter(move |(i, _)| !self.old_taken[*i])
            .map(|(i, &(entry, slot))| (i, entry, slot))
    }

    fn free_new_indices(&self) -> Vec<usize> {
        unpaired_flags(&self.new_taken)
    }
}

fn unpaired_flags(taken: &[bool]) -> Vec<usize> {
    taken
        .iter()
        .enumerate()
        .filter(|(_, t)| !**t)
        .map(|(i, _)| i)
        .collect()
}

/// A way of pairing entries inside corresponding slots.
pub(crate) trait MatchStrategy {
    fn name(&self) -> &'static str;

    fn pair<'a>(
        &self,
        pools: &mut EntryPools<'a>,
        structure: &StructureMap,
    ) -> Vec<MatchedPair<'a>>;
}

/// Identity by stable id.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct StableIdStrategy;

impl StableIdStrategy {
    /// Pair entries whose stable id and mode stable id both agree, wherever
    /// they sit.
    fn pair_anchored<'a>(
        &self,
        pools: &mut EntryPools<'a>,
        warnings: &mut Vec<String>,
    ) -> Vec<MatchedPair<'a>> {
        let mut index: HashMap<(&'a str, &'a str), usize> = HashMap::new();
        for (oi, entry, _) in pools.free_old() {
            let ids = (entry.stable_id.as_deref(), entry.mode_stable_id.as_deref());
            if let (Some(id), Some(mode)) = ids {
                if index.insert((id, mode), oi).is_some() {
                    warnings.push(format!(
                        "stable id '{id}' appears more than once in mode '{mode}' \
                         of the old snapshot"
                    ));
                }
            }
        }

        let mut pairs = Vec::new();
        for ni in pools.free_new_indices() {
            let entry = pools.new[ni].0;
            let (Some(id), Some(mode)) =
                (entry.stable_id.as_deref(), entry.mode_stable_id.as_deref())
            else {
                continue;
            };
            if let Some(&oi) = index.get(&(id, mode)) {
                if !pools.old_taken[oi] {
                    pairs.push(pools.take(oi, ni, MatchMethod::StableId));
                }
            }
        }
        pairs
    }

    /// Pair entries that kept their stable id but sit in slots with no
    /// counterpart, such as a token moved to another collection. An id held
    /// by a single free entry on each side pairs outright; otherwise entries
    /// pair only when their mode names agree.
    fn pair_relocated<'a>(&self, pools: &mut EntryPools<'a>) -> Vec<MatchedPair<'a>> {
        let mut old_by_id: BTreeMap<&'a str, Vec<usize>> = BTreeMap::new();
        for (oi, entry, _) in pools.free_old() {
            if let Some(id) = entry.stable_id.as_deref() {
                old_by_id.entry(id).or_default().push(oi);
            }
        }
        let mut new_by_id: BTreeMap<&'a str, Vec<usize>> = BTreeMap::new();
        for ni in pools.free_new_indices() {
            let entry = pools.new[ni].0;
            if let Some(id) = entry.stable_id.as_deref() {
                new_by_id.entry(id).or_default().push(ni);
            }
        }

        let mut pairs = Vec::new();
        for (id, new_indices) in &new_by_id {
            let Some(old_indices) = old_by_id.get(id) else {
                continue;
            };
            if let ([oi], [ni]) = (old_indices.as_slice(), new_indices.as_slice()) {
                pairs.push(pools.take(*oi, *ni, MatchMethod::StableId));
                continue;
            }
            for &ni in new_indices {
                let entry = pools.new[ni].0;
                let mode = entry.mode_name.as_str();
                let found = old_indices
                    .iter()
                    .copied()
                    .find(|&oi| !pools.old_taken[oi] && pools.old[oi].0.mode_name == mode);
                if let Some(oi) = found {
                    pairs.push(pools.take(oi, ni, MatchMethod::StableId));
                }
            }
        }
        pairs
    }
}

impl MatchStrategy for StableIdStrategy {
    fn name(&self) -> &'static str {
        "stable_id"
    }

    fn pair<'a>(
        &self,
        pools: &mut EntryPools<'a>,
        structure: &StructureMap,
    ) -> Vec<MatchedPair<'a>> {
        let mut by_id: HashMap<&'a str, Vec<(usize, Slot)>> = HashMap::new();
        for (oi, entry, slot) in pools.free_old() {
            let (Some(id), Some(target)) = (entry.stable_id.as_deref(), structure.translate(slot))
            else {
                continue;
            };
            by_id.entry(id).or_default().push((oi, target));
        }

        let mut pairs = Vec::new();
        for ni in pools.free_new_indices() {
            let (entry, slot) = pools.new[ni];
            let Some(candidates) = entry.stable_id.as_deref().and_then(|id| by_id.get(id)) else {
                continue;
            };
            let found = candidates
                .iter()
                .find(|(oi, target)| !pools.old_taken[*oi] && *target == slot)
                .map(|(oi, _)| *oi);
            if let Some(oi) = found {
                pairs.push(pools.take(oi, ni, MatchMethod::StableId));
            }
        }
        pairs.extend(self.pair_relocated(pools));
        pairs
    }
}

/// Identity by path within corresponding slots, for entries lacking ids.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct PathHeuristicStrategy;

impl MatchStrategy for PathHeuristicStrategy {
    fn name(&self) -> &'static str {
        "path_heuristic"
    }

    fn pair<'a>(
        &self,
        pools: &mut EntryPools<'a>,
        structure: &StructureMap,
    ) -> Vec<MatchedPair<'a>> {
        let mut by_path: HashMap<(Slot, &'a str), Vec<usize>> = HashMap::new();
        for (oi, entry, slot) in pools.free_old() {
            if let Some(target) = structure.translate(slot) {
                by_path.entry((target, entry.path.as_str())).or_default().push(oi);
            }
        }

        let mut pairs = Vec::new();
        for ni in pools.free_new_indices() {
            let (entry, slot) = pools.new[ni];
            let Some(candidates) = by_path.get(&(slot, entry.path.as_str())) else {
                continue;
            };
            let found = candidates.iter().copied().find(|&oi| {
                let old = pools.old[oi].0;
                !pools.old_taken[oi] && !(old.stable_id.is_some() && entry.stable_id.is_some())
            });
            if let Some(oi) = found {
                pairs.push(pools.take(oi, ni, MatchMethod::Path));
            }
        }
        pairs
    }
}

/// Pairs entries of an old and a new snapshot.
#[derive(Debug, Clone, Copy)]
pub struct EntityMatcher {
    heuristics: bool,
}

impl Default for EntityMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityMatcher {
    pub fn new() -> Self {
        Self { heuristics: true }
    }

    /// Disable set/position structural pairing and path matching.
    pub fn with_heuristics(mut self, enabled: bool) -> Self {
        self.heuristics = enabled;
        self
    }

    pub fn heuristics(&self) -> bool {
        self.heuristics
    }

    pub fn match_snapshots<'a>(&self, old: &'a Snapshot, new: &'a Snapshot) -> MatchResult<'a> {
        let old_inv = Inventory::build(old);
        let new_inv = Inventory::build(new);
        let mut result = MatchResult::default();

        let mut pools = EntryPools::new(old_inv.entries.clone(), new_inv.entries.clone());
        let anchored = StableIdStrategy.pair_anchored(&mut pools, &mut result.warnings);
        let anchors: Vec<(Slot, Slot)> = pools
            .links
            .iter()
            .map(|&(oi, ni)| (pools.old[oi].1, pools.new[ni].1))
            .collect();
        result.matched_pairs.extend(anchored);

        let structure = self.pair_structure(&old_inv, &new_inv, &anchors);
        record_structure(&old_inv, &new_inv, &structure, &mut result);

        let mut strategies: Vec<&dyn MatchStrategy> = vec![&StableIdStrategy];
        if self.heuristics {
            strategies.push(&PathHeuristicStrategy);
        }
        for strategy in strategies {
            let pairs = strategy.pair(&mut pools, &structure);
            debug!(strategy = strategy.name(), pairs = pairs.len(), "match strategy applied");
            result.matched_pairs.extend(pairs);
        }

        for (oi, &(entry, slot)) in pools.old.iter().enumerate() {
            if !pools.old_taken[oi] && !structure.old_slot_vanished(slot) {
                result.unmatched_old.push(entry);
            }
        }
        for (ni, &(entry, slot)) in pools.new.iter().enumerate() {
            if !pools.new_taken[ni] && !structure.new_slot_appeared(slot) {
                result.unmatched_new.push(entry);
            }
        }

        result
    }

    fn pair_structure(
        &self,
        old: &Inventory<'_>,
        new: &Inventory<'_>,
        anchors: &[(Slot, Slot)],
    ) -> StructureMap {
        let old_groups: Vec<&Group<'_>> = old.collections.iter().map(|c| &c.group).collect();
        let new_groups: Vec<&Group<'_>> = new.collections.iter().map(|c| &c.group).collect();
        let mut collections = pair_groups(&old_groups, &new_groups);

        pair_by_votes(&mut collections, identity_votes(old, new));
        if self.heuristics {
            pair_by_members(&mut collections, old, new);
        }

        let mut modes = Vec::with_capacity(old.collections.len());
        for (oc, old_collection) in old.collections.iter().enumerate() {
            let Some(nc) = collections.old_to_new[oc] else {
                modes.push(None);
                continue;
            };
            let new_collection = &new.collections[nc];
            let old_modes: Vec<&Group<'_>> = old_collection.modes.iter().collect();
            let new_modes: Vec<&Group<'_>> = new_collection.modes.iter().collect();
            let mut pairing = pair_groups(&old_modes, &new_modes);

            pair_by_votes(
                &mut pairing,
                anchors
                    .iter()
                    .filter(|(o, n)| o.collection == oc && n.collection == nc)
                    .map(|(o, n)| (o.mode, n.mode)),
            );
            if self.heuristics {
                pair_by_position(&mut pairing, &old_modes, &new_modes);
            }
            modes.push(Some(pairing));
        }

        StructureMap { collections, modes }
    }
}

/// Pair collections whose member identities are exactly equal, when the
/// match is unique on both sides.
fn pair_by_members(pairing: &mut Pairing, old: &Inventory<'_>, new: &Inventory<'_>) {
    let old_free = pairing.unpaired_old();
    let new_free = pairing.unpaired_new();

    for &oc in &old_free {
        let members = &old.collections[oc].members;
        if members.is_empty() {
            continue;
        }
        let both_identified = |nc: usize| {
            old.collections[oc].group.stable_id.is_some()
                && new.collections[nc].group.stable_id.is_some()
        };
        let candidates: Vec<usize> = new_free
            .iter()
            .copied()
            .filter(|&nc| pairing.new_to_old[nc].is_none())
            .filter(|&nc| !both_identified(nc) && new.collections[nc].members == *members)
            .collect();
        let rivals = old_free
            .iter()
            .filter(|&&other| other != oc && old.collections[other].members == *members)
            .count();
        if let ([nc], 0) = (candidates.as_slice(), rivals) {
            pairing.link(oc, *nc);
        }
    }
}

/// Pair leftover modes by discovery order when both sides have the same
/// number left and they are not all identified by stable ids.
fn pair_by_position(pairing: &mut Pairing, old: &[&Group<'_>], new: &[&Group<'_>]) {
    let old_free = pairing.unpaired_old();
    let new_free = pairing.unpaired_new();
    if old_free.is_empty() || old_free.len() != new_free.len() {
        return;
    }
    let all_identified = old_free.iter().all(|&i| old[i].stable_id.is_some())
        && new_free.iter().all(|&i| new[i].stable_id.is_some());
    if all_identified {
        return;
    }
    for (o, n) in old_free.into_iter().zip(new_free) {
        pairing.link(o, n);
    }
}

fn record_structure(
    old: &Inventory<'_>,
    new: &Inventory<'_>,
    structure: &StructureMap,
    result: &mut MatchResult<'_>,
) {
    for (oc, old_collection) in old.collections.iter().enumerate() {
        let Some(nc) = structure.collections.old_to_new[oc] else {
            result.deleted_structural.push(StructuralItem::Collection {
                name: old_collection.group.name.to_string(),
            });
            continue;
        };
        let new_collection = &new.collections[nc];
        if old_collection.group.name != new_collection.group.name {
            result.collection_renames.push(CollectionRename {
                old: old_collection.group.name.to_string(),
                new: new_collection.group.name.to_string(),
            });
        }

        let Some(modes) = structure.modes[oc].as_ref() else {
            continue;
        };
        for (om, old_mode) in old_collection.modes.iter().enumerate() {
            match modes.old_to_new[om] {
                Some(nm) => {
                    let new_mode = &new_collection.modes[nm];
                    if old_mode.name != new_mode.name {
                        result.mode_renames.push(ModeRename {
                            collection: new_collection.group.name.to_string(),
                            old: old_mode.name.to_string(),
                            new: new_mode.name.to_string(),
                        });
                    }
                }
                None => result.deleted_structural.push(StructuralItem::Mode {
                    collection: old_collection.group.name.to_string(),
                    mode: old_mode.name.to_string(),
                }),
            }
        }
        for nm in modes.unpaired_new() {
            result.new_structural.push(StructuralItem::Mode {
                collection: new_collection.group.name.to_string(),
                mode: new_collection.modes[nm].name.to_string(),
            });
        }
    }

    for nc in structure.collections.unpaired_new() {
        result.new_structural.push(StructuralItem::Collection {
            name: new.collections[nc].group.name.to_string(),
        });
    }
}

/// Match with default settings.
pub fn match_snapshots<'a>(old: &'a Snapshot, new: &'a Snapshot) -> MatchResult<'a> {
    EntityMatcher::new().match_snapshots(old, new)
}
