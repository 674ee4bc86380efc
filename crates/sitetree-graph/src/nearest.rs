//! Proximity search used by drag auto-connect.

use crate::node_style::StyledNode;
use serde::Serialize;
use sitetree_core::{PageId, Vec2};

/// A page that can receive a dropped node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapCandidate {
    pub id: PageId,
    pub depth: u32,
    pub position: Vec2,
}

impl From<&StyledNode> for SnapCandidate {
    fn from(node: &StyledNode) -> Self {
        Self {
            id: node.id,
            depth: node.depth,
            position: node.position,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NearestCandidate {
    pub page_id: PageId,
    pub distance: f32,
    /// The candidate sits on a different depth level than the dragged page.
    pub cross_depth: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestNodeFinder {
    /// Candidates farther than this are never returned.
    pub max_distance: f32,
    /// Prefer any in-range candidate on another depth level over a closer
    /// sibling-level one.
    pub depth_priority: bool,
}

impl NearestNodeFinder {
    pub fn new(max_distance: f32, depth_priority: bool) -> Self {
        Self {
            max_distance,
            depth_priority,
        }
    }

    /// Find the drop target for `dragged` (at `dragged_depth`) whose pointer
    /// is at `pointer`. Ties keep the candidate seen first.
    pub fn find(
        &self,
        dragged: PageId,
        dragged_depth: u32,
        pointer: Vec2,
        candidates: impl IntoIterator<Item = SnapCandidate>,
    ) -> Option<NearestCandidate> {
        let mut cross_depth: Option<NearestCandidate> = None;
        let mut same_depth: Option<NearestCandidate> = None;

        for candidate in candidates {
            if candidate.id == dragged {
                continue;
            }
            let distance = pointer.distance(candidate.position);
            if !distance.is_finite() || distance > self.max_distance {
                continue;
            }

            let is_cross = candidate.depth != dragged_depth;
            let slot = if is_cross {
                &mut cross_depth
            } else {
                &mut same_depth
            };
            if slot.is_none_or(|best| distance < best.distance) {
                *slot = Some(NearestCandidate {
                    page_id: candidate.id,
                    distance,
                    cross_depth: is_cross,
                });
            }
        }

        match (cross_depth, same_depth) {
            (Some(cross), _) if self.depth_priority => Some(cross),
            (Some(cross), Some(same)) => {
                if same.distance < cross.distance {
                    Some(same)
                } else {
                    Some(cross)
                }
            }
            (cross, same) => cross.or(same),
        }
    }

    pub fn find_among(
        &self,
        dragged: PageId,
        dragged_depth: u32,
        pointer: Vec2,
        nodes: &[StyledNode],
    ) -> Option<NearestCandidate> {
        self.find(
            dragged,
            dragged_depth,
            pointer,
            nodes.iter().map(SnapCandidate::from),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn candidate(id: i64, depth: u32, x: f32, y: f32) -> SnapCandidate {
        SnapCandidate {
            id: PageId(id),
            depth,
            position: Vec2::new(x, y),
        }
    }

    #[test]
    fn test_nothing_in_range_returns_none() {
        let finder = NearestNodeFinder::new(50.0, true);
        let result = finder.find(
            PageId(1),
            1,
            Vec2::ZERO,
            [candidate(2, 2, 100.0, 0.0), candidate(3, 1, 0.0, 60.0)],
        );
        assert_eq!(result, None);
    }

    #[test]
    fn test_depth_priority_prefers_other_level() {
        let finder = NearestNodeFinder::new(100.0, true);
        let result = finder
            .find(
                PageId(1),
                1,
                Vec2::ZERO,
                [candidate(2, 1, 10.0, 0.0), candidate(3, 2, 80.0, 0.0)],
            )
            .unwrap();
        assert_eq!(result.page_id, PageId(3));
        assert!(result.cross_depth);
    }

    #[test]
    fn test_without_priority_nearest_wins() {
        let finder = NearestNodeFinder::new(100.0, false);
        let result = finder
            .find(
                PageId(1),
                1,
                Vec2::ZERO,
                [candidate(2, 1, 10.0, 0.0), candidate(3, 2, 80.0, 0.0)],
            )
            .unwrap();
        assert_eq!(result.page_id, PageId(2));
        assert!(!result.cross_depth);
    }

    #[test]
    fn test_only_same_level_candidate_is_returned() {
        let finder = NearestNodeFinder::new(100.0, true);
        let result = finder
            .find(PageId(1), 1, Vec2::ZERO, [candidate(2, 1, 30.0, 40.0)])
            .unwrap();
        assert_eq!(result.page_id, PageId(2));
        assert_eq!(result.distance, 50.0);
    }

    #[test]
    fn test_dragged_node_is_skipped_and_ties_keep_first() {
        let finder = NearestNodeFinder::new(100.0, false);
        let result = finder
            .find(
                PageId(1),
                0,
                Vec2::ZERO,
                [
                    candidate(1, 1, 0.0, 0.0),
                    candidate(4, 1, 10.0, 0.0),
                    candidate(5, 1, 0.0, 10.0),
                ],
            )
            .unwrap();
        assert_eq!(result.page_id, PageId(4));
    }

    #[test]
    fn test_snap_distance_is_inclusive() {
        let finder = NearestNodeFinder::new(10.0, false);
        let result = finder.find(PageId(1), 0, Vec2::ZERO, [candidate(2, 1, 10.0, 0.0)]);
        assert_eq!(result.map(|c| c.page_id), Some(PageId(2)));
    }

    fn candidates_strategy() -> impl Strategy<Value = Vec<SnapCandidate>> {
        proptest::collection::vec(
            (0u32..4, -400.0f32..400.0, -400.0f32..400.0),
            0..30,
        )
        .prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (depth, x, y))| candidate(i as i64 + 2, depth, x, y))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_never_farther_than_snap_distance(
            candidates in candidates_strategy(),
            max_distance in 0.0f32..300.0,
            depth_priority in any::<bool>(),
            dragged_depth in 0u32..4,
        ) {
            let finder = NearestNodeFinder::new(max_distance, depth_priority);
            if let Some(found) = finder.find(PageId(1), dragged_depth, Vec2::ZERO, candidates) {
                prop_assert!(found.distance <= max_distance);
            }
        }

        #[test]
        fn prop_depth_priority_returns_cross_depth_when_in_range(
            candidates in candidates_strategy(),
            max_distance in 0.0f32..300.0,
            dragged_depth in 0u32..4,
        ) {
            let finder = NearestNodeFinder::new(max_distance, true);
            let cross_in_range = candidates.iter().any(|c| {
                c.depth != dragged_depth && Vec2::ZERO.distance(c.position) <= max_distance
            });
            let found = finder.find(PageId(1), dragged_depth, Vec2::ZERO, candidates);
            if cross_in_range {
                prop_assert!(found.is_some_and(|c| c.cross_depth));
            }
        }
    }
}
