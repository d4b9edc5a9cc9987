/// A sorted set of disjoint half-open intervals `[start, end)` over text offsets.
///
/// The set is stored as a flat list of alternating start/end points in strictly increasing
/// order: every even index is the start of an interval and the following odd index is its
/// end. Inserting a range that overlaps or touches existing ranges collapses them into a
/// single covered interval, so the invariants hold after every mutation.
///
/// The markup layer uses this to mask template-interpolation regions out of attribute
/// scanning, and the query layer uses it to mask comments and string literals when scanning
/// a SELECT projection clause.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RangeSet {
    points: Vec<usize>,
}

impl RangeSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored intervals.
    pub fn len(&self) -> usize {
        self.points.len() / 2
    }

    /// Checks whether no interval is stored.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Removes all stored intervals so the set can be reused for another scan.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Marks `[start, end)` as covered, merging with any stored interval it overlaps or
    /// touches.
    ///
    /// `start` must be strictly smaller than `end`.
    pub fn insert(&mut self, start: usize, end: usize) {
        assert!(start < end, "insert requires start < end");

        let (merged_start, splice_from) = match self.find_index_for_offset(start) {
            // `start` lies within the interval that begins at an even index.
            Some(i) if i % 2 == 0 => (self.points[i], i),
            // `start` coincides with an interval end, so the two ranges touch.
            Some(i) if self.points[i] == start => (self.points[i - 1], i - 1),
            // `start` lies in the gap after the interval ending at `i`.
            Some(i) => (start, i + 1),
            None => (start, 0),
        };
        let (merged_end, splice_to) = match self.find_index_for_offset(end) {
            // `end` reaches into (or touches the start of) the interval beginning at `j`.
            Some(j) if j % 2 == 0 => (self.points[j + 1], j + 2),
            Some(j) => (end, j + 1),
            None => (end, 0),
        };

        self.points
            .splice(splice_from..splice_to.max(splice_from), [merged_start, merged_end]);
    }

    /// Checks whether the half-open interval `[start, end)` shares at least one offset with
    /// a stored interval.
    pub fn intersects_range(&self, start: usize, end: usize) -> bool {
        match self.find_index_for_offset(start) {
            // `start` lies within a stored interval.
            Some(i) if i % 2 == 0 => true,
            // `start` lies in a gap; the query still intersects if it reaches the next start.
            Some(i) => self.points.get(i + 1).is_some_and(|&next| next < end),
            None => self.points.first().is_some_and(|&first| first < end),
        }
    }

    /// Returns the greatest index `i` such that `points[i] <= offset`, or `None` when all
    /// stored points are greater than `offset` (or the set is empty).
    fn find_index_for_offset(&self, offset: usize) -> Option<usize> {
        if self.points.is_empty() || self.points[0] > offset {
            return None;
        }
        let mut low = 0;
        let mut high = self.points.len();
        // Invariant: points[low] <= offset, points[high..] > offset.
        while low + 1 < high {
            let mid = (low + high) / 2;
            if self.points[mid] <= offset {
                low = mid;
            } else {
                high = mid;
            }
        }
        Some(low)
    }
}
