//! Overflow planning for medicine lists.
//!
//! This module decides how many medicine entries fit on a page and splits the
//! ordered list into page-sized chunks:
//! - The first page of a copy also carries the patient block, so it holds
//!   fewer entries than continuation pages
//! - Capacities never drop below 1, so splitting always makes progress
//! - Chunks concatenate back into the original list, in order

use crate::composer::ReservedSpace;
use crate::{Error, Result};

/// Which page of a copy a capacity is computed for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageKind {
    /// Header, patient block and entries
    First,
    /// Header and entries
    Continuation,
}

/// Number of entries that fit between the reserved regions of a page
///
/// A non-positive or non-finite result (tiny page, oversized reserved regions)
/// is clamped to 1.
pub fn capacity_for(
    kind: PageKind,
    page_height: f32,
    reserved_top: f32,
    reserved_bottom: f32,
    item_height: f32,
) -> usize {
    let available = page_height - reserved_top - reserved_bottom;
    let fitted = (available / item_height).floor();

    if !fitted.is_finite() || fitted < 1.0 {
        tracing::warn!(
            "{:?} page leaves {:.1}mm for entries of {:.1}mm; clamping capacity to 1",
            kind,
            available,
            item_height
        );
        return 1;
    }

    fitted as usize
}

/// Split items into page chunks
///
/// Chunk 0 holds at most `first_capacity` items and every later chunk at most
/// `later_capacity`. An empty input yields a single empty chunk, since every
/// copy has at least one page.
pub fn split<T>(items: &[T], first_capacity: usize, later_capacity: usize) -> Result<Vec<&[T]>> {
    if first_capacity == 0 || later_capacity == 0 {
        return Err(Error::LayoutCapacityExhausted {
            capacity: first_capacity.min(later_capacity),
        });
    }

    let first_len = items.len().min(first_capacity);
    let (first, rest) = items.split_at(first_len);

    let mut chunks = Vec::with_capacity(1 + rest.len().div_ceil(later_capacity));
    chunks.push(first);
    chunks.extend(rest.chunks(later_capacity));

    Ok(chunks)
}

/// Page chunks for one copy
#[derive(Clone, Debug)]
pub struct PagePlan<'a, T> {
    pub first_capacity: usize,
    pub later_capacity: usize,
    pub chunks: Vec<&'a [T]>,
}

impl<'a, T> PagePlan<'a, T> {
    pub fn page_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Computes capacities from reserved regions and splits lists accordingly
#[derive(Clone, Copy, Debug)]
pub struct OverflowPlanner {
    page_height: f32,
    item_height: f32,
    reserved: ReservedSpace,
}

impl OverflowPlanner {
    pub fn new(page_height: f32, item_height: f32, reserved: ReservedSpace) -> Self {
        Self {
            page_height,
            item_height,
            reserved,
        }
    }

    pub fn capacity(&self, kind: PageKind) -> usize {
        let top = match kind {
            PageKind::First => self.reserved.first_top,
            PageKind::Continuation => self.reserved.later_top,
        };
        capacity_for(kind, self.page_height, top, self.reserved.bottom, self.item_height)
    }

    /// Plan the pages of one copy
    pub fn plan<'a, T>(&self, items: &'a [T]) -> Result<PagePlan<'a, T>> {
        let first_capacity = self.capacity(PageKind::First);
        let later_capacity = self.capacity(PageKind::Continuation);
        let chunks = split(items, first_capacity, later_capacity)?;

        tracing::debug!(
            "Planned {} entries over {} pages (capacity {} first, {} continuation)",
            items.len(),
            chunks.len(),
            first_capacity,
            later_capacity
        );

        Ok(PagePlan {
            first_capacity,
            later_capacity,
            chunks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_reserved() -> ReservedSpace {
        ReservedSpace {
            first_top: 142.0,
            later_top: 97.0,
            bottom: 70.0,
        }
    }

    #[test]
    fn test_first_and_continuation_capacities_differ() {
        let planner = OverflowPlanner::new(297.0, 27.0, default_reserved());
        assert_eq!(planner.capacity(PageKind::First), 3);
        assert_eq!(planner.capacity(PageKind::Continuation), 4);
    }

    #[test]
    fn test_capacity_clamped_to_one() {
        assert_eq!(capacity_for(PageKind::First, 100.0, 80.0, 40.0, 27.0), 1);
        assert_eq!(capacity_for(PageKind::Continuation, 50.0, 10.0, 10.0, 27.0), 1);
        assert_eq!(capacity_for(PageKind::First, 297.0, 0.0, 0.0, 0.0), 1);
    }

    #[test]
    fn test_capacity_exact_fit() {
        assert_eq!(capacity_for(PageKind::Continuation, 100.0, 10.0, 9.0, 27.0), 3);
    }

    #[test]
    fn test_split_fits_first_page() {
        let items = [1, 2, 3];
        let chunks = split(&items, 3, 4).unwrap();
        assert_eq!(chunks, vec![&[1, 2, 3][..]]);
    }

    #[test]
    fn test_split_empty_list_yields_one_page() {
        let items: [u8; 0] = [];
        let chunks = split(&items, 3, 4).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_empty());
    }

    #[test]
    fn test_split_overflow_uses_later_capacity() {
        let items: Vec<u32> = (1..=12).collect();
        let chunks = split(&items, 3, 4).unwrap();

        let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 4, 4, 1]);
        assert_eq!(chunks.concat(), items);
    }

    #[test]
    fn test_split_page_count_formula() {
        let (first, later) = (3usize, 4usize);
        for n in 0..40usize {
            let items: Vec<usize> = (0..n).collect();
            let chunks = split(&items, first, later).unwrap();

            let expected = if n <= first {
                1
            } else {
                1 + (n - first).div_ceil(later)
            };
            assert_eq!(chunks.len(), expected, "n = {}", n);
            assert_eq!(chunks.concat(), items, "n = {}", n);
            assert!(chunks.iter().skip(1).all(|c| !c.is_empty() && c.len() <= later));
        }
    }

    #[test]
    fn test_split_zero_capacity_is_invariant_violation() {
        let items = [1, 2];
        assert!(matches!(
            split(&items, 0, 4),
            Err(Error::LayoutCapacityExhausted { capacity: 0 })
        ));
        assert!(matches!(
            split(&items, 3, 0),
            Err(Error::LayoutCapacityExhausted { capacity: 0 })
        ));
    }

    #[test]
    fn test_plan_reports_capacities() {
        let planner = OverflowPlanner::new(297.0, 27.0, default_reserved());
        let items: Vec<u32> = (0..10).collect();
        let plan = planner.plan(&items).unwrap();

        assert_eq!(plan.first_capacity, 3);
        assert_eq!(plan.later_capacity, 4);
        assert_eq!(plan.page_count(), 3);
    }
}
