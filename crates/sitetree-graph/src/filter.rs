use sitetree_core::{FilterState, Page};

/// A page that survived filtering. `filtered_out` marks pages outside the
/// active group; they stay in the working set and are rendered dimmed.
#[derive(Debug, Clone, Copy)]
pub struct FilteredPage<'a> {
    pub page: &'a Page,
    pub filtered_out: bool,
}

pub struct GraphFilter;

impl GraphFilter {
    /// Reduce `pages` to the working set for `filter`, preserving input order.
    ///
    /// Visibility and group annotation run before the view-mode drop so group
    /// dimming composes with the mode filter.
    pub fn apply<'a>(pages: &'a [Page], filter: &FilterState) -> Vec<FilteredPage<'a>> {
        pages
            .iter()
            .filter(|page| filter.show_hidden || page.is_visible)
            .map(|page| FilteredPage {
                page,
                filtered_out: filter
                    .active_group
                    .is_some_and(|group| page.group_id != Some(group)),
            })
            .filter(|entry| filter.view_mode.admits(entry.page))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sitetree_core::{GroupId, PageId, ViewMode};

    fn page(id: i64, visible: bool, subdomain: bool, group: Option<i64>, score: Option<f32>) -> Page {
        Page {
            is_visible: visible,
            is_subdomain: subdomain,
            group_id: group.map(GroupId),
            seo_score: score,
            ..Page::new(PageId(id), format!("/{id}"), 1)
        }
    }

    fn sample() -> Vec<Page> {
        vec![
            page(1, true, false, Some(1), Some(95.0)),
            page(2, false, true, Some(1), Some(40.0)),
            page(3, true, true, Some(2), Some(60.0)),
            page(4, true, false, None, None),
        ]
    }

    fn ids(entries: &[FilteredPage<'_>]) -> Vec<i64> {
        entries.iter().map(|entry| entry.page.id.0).collect()
    }

    #[test]
    fn test_hidden_pages_dropped_unless_requested() {
        let pages = sample();
        let filter = FilterState::default();
        assert_eq!(ids(&GraphFilter::apply(&pages, &filter)), vec![1, 3, 4]);

        let filter = FilterState {
            show_hidden: true,
            ..Default::default()
        };
        assert_eq!(ids(&GraphFilter::apply(&pages, &filter)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_group_filter_annotates_without_dropping() {
        let pages = sample();
        let filter = FilterState {
            active_group: Some(GroupId(1)),
            ..Default::default()
        };
        let result = GraphFilter::apply(&pages, &filter);

        assert_eq!(ids(&result), vec![1, 3, 4]);
        let dimmed: Vec<bool> = result.iter().map(|entry| entry.filtered_out).collect();
        assert_eq!(dimmed, vec![false, true, true]);
    }

    #[test]
    fn test_view_modes_drop_pages() {
        let pages = sample();
        let mode = |view_mode| FilterState {
            view_mode,
            show_hidden: true,
            active_group: None,
        };

        assert_eq!(
            ids(&GraphFilter::apply(&pages, &mode(ViewMode::SubdomainsOnly))),
            vec![2, 3]
        );
        assert_eq!(
            ids(&GraphFilter::apply(&pages, &mode(ViewMode::HighScore))),
            vec![1]
        );
        assert_eq!(
            ids(&GraphFilter::apply(&pages, &mode(ViewMode::LowScore))),
            vec![2, 3]
        );
    }

    #[test]
    fn test_group_annotation_composes_with_view_mode() {
        let pages = sample();
        let filter = FilterState {
            view_mode: ViewMode::SubdomainsOnly,
            show_hidden: true,
            active_group: Some(GroupId(2)),
        };
        let result = GraphFilter::apply(&pages, &filter);

        assert_eq!(ids(&result), vec![2, 3]);
        assert!(result[0].filtered_out);
        assert!(!result[1].filtered_out);
    }

    fn page_strategy() -> impl Strategy<Value = Page> {
        (
            1i64..10_000,
            any::<bool>(),
            any::<bool>(),
            proptest::option::of(1i64..4),
            proptest::option::of(0.0f32..100.0),
        )
            .prop_map(|(id, visible, subdomain, group, score)| {
                page(id, visible, subdomain, group, score)
            })
    }

    proptest! {
        /// Group annotation never changes how many pages are in the working set.
        #[test]
        fn prop_group_filter_preserves_count(
            pages in proptest::collection::vec(page_strategy(), 0..40),
            group in 1i64..4,
            show_hidden in any::<bool>(),
        ) {
            let without_group = FilterState { show_hidden, ..Default::default() };
            let with_group = FilterState {
                active_group: Some(GroupId(group)),
                ..without_group.clone()
            };

            let plain = GraphFilter::apply(&pages, &without_group);
            let grouped = GraphFilter::apply(&pages, &with_group);

            prop_assert_eq!(plain.len(), grouped.len());
            for entry in &grouped {
                prop_assert_eq!(entry.filtered_out, entry.page.group_id != Some(GroupId(group)));
            }
        }
    }
}
