//! Cached-range reconciliation.
//!
//! Given the range a cache file already covers and the range a caller wants,
//! decide which parts still have to be fetched. The five plan shapes are
//! mutually exclusive and cover every relationship between the two ranges.

use crate::models::DateRange;

/// What to fetch to satisfy a requested range given a cached one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPlan {
    /// Cache fully covers the request; serve from the file.
    NoFetch,
    /// Cache covers the head of the request; fetch the trailing gap.
    FetchAfter(DateRange),
    /// Cache covers the tail of the request; fetch the leading gap.
    FetchBefore(DateRange),
    /// Request extends past the cache on both sides.
    FetchBoth { before: DateRange, after: DateRange },
    /// Ranges are disjoint; the cache contributes nothing.
    FetchAll(DateRange),
}

/// Compute the fetch plan for `requested` against `cached`.
///
/// Ranges are inclusive. Adjacent-but-disjoint ranges fall under `FetchAll`
/// since the cached candles cannot cover any requested bucket.
pub fn reconcile(cached: DateRange, requested: DateRange) -> FetchPlan {
    if requested.start < cached.start && requested.end > cached.end {
        return FetchPlan::FetchBoth {
            before: DateRange {
                start: requested.start,
                end: cached.start,
            },
            after: DateRange {
                start: cached.end,
                end: requested.end,
            },
        };
    }
    if requested.end < cached.start || requested.start > cached.end {
        return FetchPlan::FetchAll(requested);
    }
    if requested.start >= cached.start && requested.end <= cached.end {
        return FetchPlan::NoFetch;
    }
    if requested.start < cached.start {
        return FetchPlan::FetchBefore(DateRange {
            start: requested.start,
            end: cached.start,
        });
    }
    FetchPlan::FetchAfter(DateRange {
        start: cached.end,
        end: requested.end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: i64, end: i64) -> DateRange {
        DateRange::new(start, end).unwrap()
    }

    #[test]
    fn contained_request_needs_no_fetch() {
        assert_eq!(reconcile(range(0, 100), range(10, 90)), FetchPlan::NoFetch);
        // Exact match is still containment.
        assert_eq!(reconcile(range(0, 100), range(0, 100)), FetchPlan::NoFetch);
    }

    #[test]
    fn tail_overhang_fetches_after() {
        assert_eq!(
            reconcile(range(0, 100), range(50, 150)),
            FetchPlan::FetchAfter(range(100, 150))
        );
        // Shared start edge.
        assert_eq!(
            reconcile(range(0, 100), range(0, 150)),
            FetchPlan::FetchAfter(range(100, 150))
        );
    }

    #[test]
    fn head_overhang_fetches_before() {
        assert_eq!(
            reconcile(range(50, 150), range(0, 100)),
            FetchPlan::FetchBefore(range(0, 50))
        );
        // Shared end edge.
        assert_eq!(
            reconcile(range(50, 150), range(0, 150)),
            FetchPlan::FetchBefore(range(0, 50))
        );
    }

    #[test]
    fn superset_request_fetches_both_sides() {
        assert_eq!(
            reconcile(range(50, 100), range(0, 150)),
            FetchPlan::FetchBoth {
                before: range(0, 50),
                after: range(100, 150),
            }
        );
    }

    #[test]
    fn disjoint_ranges_fetch_everything() {
        assert_eq!(
            reconcile(range(0, 100), range(200, 300)),
            FetchPlan::FetchAll(range(200, 300))
        );
        assert_eq!(
            reconcile(range(200, 300), range(0, 100)),
            FetchPlan::FetchAll(range(0, 100))
        );
    }

    #[test]
    fn touching_endpoints_still_overlap() {
        // Sharing a single second counts as overlap, not disjointness.
        assert_eq!(
            reconcile(range(0, 100), range(100, 200)),
            FetchPlan::FetchAfter(range(100, 200))
        );
        assert_eq!(
            reconcile(range(100, 200), range(0, 100)),
            FetchPlan::FetchBefore(range(0, 100))
        );
    }

}
