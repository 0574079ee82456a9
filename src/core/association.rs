//! Child → parent association lookup built once per migration run.

use crate::domain::model::{AssociationEdge, EntityType, Relation};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Picks the parent of a child that has several candidate parents.
pub trait TieBreak: Send + Sync {
    fn choose<'a>(&self, child_id: &str, candidates: &'a [String]) -> Option<&'a str>;
}

/// First edge in input order wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSeen;

impl TieBreak for FirstSeen {
    fn choose<'a>(&self, _child_id: &str, candidates: &'a [String]) -> Option<&'a str> {
        candidates.first().map(String::as_str)
    }
}

/// Most recent edge in input order wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastSeen;

impl TieBreak for LastSeen {
    fn choose<'a>(&self, _child_id: &str, candidates: &'a [String]) -> Option<&'a str> {
        candidates.last().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakPolicy {
    #[default]
    FirstSeen,
    LastSeen,
}

impl TieBreakPolicy {
    pub fn strategy(&self) -> Box<dyn TieBreak> {
        match self {
            TieBreakPolicy::FirstSeen => Box::new(FirstSeen),
            TieBreakPolicy::LastSeen => Box::new(LastSeen),
        }
    }
}

impl std::str::FromStr for TieBreakPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_seen" => Ok(TieBreakPolicy::FirstSeen),
            "last_seen" => Ok(TieBreakPolicy::LastSeen),
            other => Err(format!(
                "unknown tie-break policy '{}', expected first_seen or last_seen",
                other
            )),
        }
    }
}

/// Ids of every record seen in the fetched pages, per entity type.
#[derive(Debug, Default, Clone)]
pub struct KnownIds {
    ids: HashMap<EntityType, HashSet<String>>,
}

impl KnownIds {
    pub fn insert(&mut self, entity: EntityType, id: &str) {
        self.ids.entry(entity).or_default().insert(id.to_string());
    }

    pub fn contains(&self, entity: EntityType, id: &str) -> bool {
        self.ids.get(&entity).is_some_and(|ids| ids.contains(id))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub edges: usize,
    pub duplicate_edges: usize,
    pub dangling_edges: usize,
    pub ambiguous_children: usize,
}

#[derive(Debug, Default)]
pub struct AssociationIndex {
    candidates: HashMap<(Relation, String), Vec<String>>,
    resolved: HashMap<(Relation, String), String>,
    stats: IndexStats,
}

impl AssociationIndex {
    /// Build the index from every edge of the run.
    ///
    /// Edges whose child or parent id was never fetched are dropped, so a
    /// dangling reference resolves to no association. Repeated
    /// (child, parent) pairs keep their first position.
    pub fn build(edges: &[AssociationEdge], known: &KnownIds, tie_break: &dyn TieBreak) -> Self {
        let mut stats = IndexStats {
            edges: edges.len(),
            ..IndexStats::default()
        };
        let mut candidates: HashMap<(Relation, String), Vec<String>> = HashMap::new();

        for edge in edges {
            let relation = edge.relation;
            if !known.contains(relation.child_type(), edge.child_id())
                || !known.contains(relation.parent_type(), edge.parent_id())
            {
                stats.dangling_edges += 1;
                continue;
            }

            let parents = candidates
                .entry((relation, edge.child_id().to_string()))
                .or_default();
            if parents.iter().any(|p| p == edge.parent_id()) {
                stats.duplicate_edges += 1;
                continue;
            }
            parents.push(edge.parent_id().to_string());
        }

        let mut resolved = HashMap::with_capacity(candidates.len());
        for ((relation, child_id), parents) in &candidates {
            if parents.len() > 1 {
                stats.ambiguous_children += 1;
                tracing::debug!(
                    "🔗 {:?} child {} has {} candidate parents: {:?}",
                    relation,
                    child_id,
                    parents.len(),
                    parents
                );
            }
            if let Some(parent) = tie_break.choose(child_id, parents) {
                resolved.insert((*relation, child_id.clone()), parent.to_string());
            }
        }

        if stats.dangling_edges > 0 {
            tracing::warn!(
                "⚠️ Dropped {} association edge(s) pointing at records that were never fetched",
                stats.dangling_edges
            );
        }

        Self {
            candidates,
            resolved,
            stats,
        }
    }

    pub fn resolve(&self, child_id: &str, relation: Relation) -> Option<&str> {
        self.resolved
            .get(&(relation, child_id.to_string()))
            .map(String::as_str)
    }

    pub fn candidates(&self, child_id: &str, relation: Relation) -> &[String] {
        self.candidates
            .get(&(relation, child_id.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }
}
