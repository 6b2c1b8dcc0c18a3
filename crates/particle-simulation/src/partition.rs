//! Index-range decomposition of the particle array
//!
//! Two workers must never see the same index: sub-ranges are contiguous,
//! ascending and non-overlapping, and [`split_disjoint`] turns them into
//! `&mut` sub-slices with `split_at_mut` so the borrow checker holds us to it.

use std::ops::Range;

/// Lanes per workgroup, matches `@workgroup_size` in `integrate.wgsl`
pub const WORKGROUP_SIZE: u32 = 64;

/// Split `[0, count)` into `workers` contiguous sub-ranges of `count / workers`
/// indices each. The remainder is folded entirely into the last sub-range.
///
/// `workers == 0` or `count == 0` yields the single range `[0, count)`.
pub fn partition(count: usize, workers: usize) -> Vec<Range<usize>> {
    if workers == 0 || count == 0 {
        return vec![0..count];
    }

    let chunk = count / workers;
    let ranges: Vec<_> = (0..workers)
        .map(|i| {
            let start = i * chunk;
            let end = if i == workers - 1 { count } else { start + chunk };
            start..end
        })
        .collect();
    log::debug!("Partitioned {} particles into {:?}", count, ranges);
    ranges
}

/// Borrow one disjoint sub-slice of `items` per range.
///
/// # Panics
///
/// If `ranges` do not tile `[0, items.len())` in ascending order, as produced by
/// [`partition`].
pub fn split_disjoint<'a, T>(items: &'a mut [T], ranges: &[Range<usize>]) -> Vec<&'a mut [T]> {
    let mut rest = items;
    let mut offset = 0;
    let mut slices = Vec::with_capacity(ranges.len());

    for range in ranges {
        assert_eq!(range.start, offset, "sub-ranges must be contiguous");
        assert!(range.end >= range.start, "sub-range {range:?} is reversed");

        let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
        slices.push(head);
        rest = tail;
        offset = range.end;
    }

    assert!(rest.is_empty(), "sub-ranges must cover every index");
    slices
}

/// Number of workgroups of `group_width` lanes needed to cover `count` items
pub fn dispatch_size(count: u32, group_width: u32) -> u32 {
    count.div_ceil(group_width.max(1))
}

/// Lay `groups` workgroups out as an `x * y` grid with neither side above
/// `max_per_dimension`. Rows are filled first, so `x * y` may overshoot by
/// less than one row and those lanes are guarded out.
///
/// `None` if even a square grid of `max_per_dimension` is too small.
pub fn workgroup_grid(groups: u32, max_per_dimension: u32) -> Option<(u32, u32)> {
    if groups == 0 {
        return Some((0, 0));
    }
    let x = groups.min(max_per_dimension.max(1));
    let y = groups.div_ceil(x);
    (y <= max_per_dimension).then_some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tiles(ranges: &[Range<usize>], count: usize) {
        let mut seen = vec![0u32; count];
        for range in ranges {
            for i in range.clone() {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&hits| hits == 1), "{ranges:?} does not tile 0..{count}");
    }

    #[test]
    fn every_index_covered_exactly_once() {
        for count in [0, 1, 2, 7, 63, 64, 65, 1000, 1001] {
            for workers in 1..=17 {
                let ranges = partition(count, workers);
                assert_eq!(ranges.len(), if count == 0 { 1 } else { workers });
                assert_tiles(&ranges, count);
            }
        }
    }

    #[test]
    fn remainder_goes_to_last_range() {
        assert_eq!(partition(10, 3), vec![0..3, 3..6, 6..10]);
        assert_eq!(partition(1003, 4), vec![0..250, 250..500, 500..750, 750..1003]);
    }

    #[test]
    fn more_workers_than_particles() {
        let ranges = partition(3, 8);
        assert_eq!(ranges.len(), 8);
        assert!(ranges[..7].iter().all(|r| r.is_empty()));
        assert_eq!(ranges[7], 0..3);
    }

    #[test]
    fn degenerate_inputs_give_one_range() {
        assert_eq!(partition(0, 8), vec![0..0]);
        assert_eq!(partition(5, 0), vec![0..5]);
    }

    #[test]
    fn split_disjoint_follows_ranges() {
        let mut items: Vec<usize> = (0..10).collect();
        let ranges = partition(items.len(), 3);
        let slices = split_disjoint(&mut items, &ranges);

        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0], &[0, 1, 2]);
        assert_eq!(slices[1], &[3, 4, 5]);
        assert_eq!(slices[2], &[6, 7, 8, 9]);
    }

    #[test]
    #[should_panic(expected = "contiguous")]
    fn split_disjoint_rejects_overlap() {
        let mut items = [0u8; 10];
        split_disjoint(&mut items, &[0..5, 4..10]);
    }

    #[test]
    #[should_panic(expected = "cover every index")]
    fn split_disjoint_rejects_gaps_at_end() {
        let mut items = [0u8; 10];
        split_disjoint(&mut items, &[0..5, 5..9]);
    }

    #[test]
    fn dispatch_size_rounds_up() {
        assert_eq!(dispatch_size(0, WORKGROUP_SIZE), 0);
        assert_eq!(dispatch_size(1, WORKGROUP_SIZE), 1);
        assert_eq!(dispatch_size(64, WORKGROUP_SIZE), 1);
        assert_eq!(dispatch_size(65, WORKGROUP_SIZE), 2);
        assert_eq!(dispatch_size(1000, WORKGROUP_SIZE), 16);
    }

    #[test]
    fn small_dispatch_stays_one_dimensional() {
        assert_eq!(workgroup_grid(0, 65535), Some((0, 0)));
        assert_eq!(workgroup_grid(16, 65535), Some((16, 1)));
        assert_eq!(workgroup_grid(65535, 65535), Some((65535, 1)));
    }

    #[test]
    fn large_dispatch_wraps_into_rows() {
        // 4.2 million particles need 65625 groups of 64
        let groups = dispatch_size(4_200_000, WORKGROUP_SIZE);
        let (x, y) = workgroup_grid(groups, 65535).unwrap();
        assert_eq!((x, y), (65535, 2));
        assert!(x * y >= groups);
        assert!(x * (y - 1) < groups);
    }

    #[test]
    fn oversized_dispatch_has_no_grid() {
        assert_eq!(workgroup_grid(10, 3), None);
        assert_eq!(workgroup_grid(9, 3), Some((3, 3)));
    }
}
