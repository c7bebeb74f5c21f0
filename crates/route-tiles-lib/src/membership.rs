//! Way to route relation membership index

use crate::RouteRelationMeta;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Route relations of a single way (usually only one)
type Memberships = SmallVec<[Arc<RouteRelationMeta>; 1]>;

/// Maps way ids to the route relations they belong to
///
/// Built while relations are preprocessed, read-only while ways are processed.
#[derive(Clone, Debug, Default)]
pub struct MembershipIndex {
    by_way: HashMap<i64, Memberships>,
}

impl MembershipIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `relation` as a parent of every way in `way_ids`
    ///
    /// A relation listing the same way twice is recorded once.
    pub fn insert(&mut self, relation: &Arc<RouteRelationMeta>, way_ids: &[i64]) {
        for &way_id in way_ids {
            let entry = self.by_way.entry(way_id).or_default();
            if !entry.iter().any(|r| r.id == relation.id) {
                entry.push(Arc::clone(relation));
            }
        }
    }

    /// Route relations the way belongs to, in registration order
    #[inline]
    pub fn relations_for(&self, way_id: i64) -> &[Arc<RouteRelationMeta>] {
        self.by_way
            .get(&way_id)
            .map(SmallVec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of ways with at least one route membership
    #[inline]
    pub fn way_count(&self) -> usize {
        self.by_way.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_way.is_empty()
    }
}
