use crate::core::key::{first_unit, Key};

/// Positions `start..=end` of the boundaries sharing one first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixSpan {
    pub start: usize,
    pub end: usize,
}

/// Maps a first byte to the run of boundaries that start with it.
///
/// Boundaries are sorted, so every boundary before the run has a smaller
/// first byte and every boundary after it a larger one. A key whose first
/// byte has a run only needs to be compared against that run.
#[derive(Debug, Clone)]
pub struct PrefixIndex {
    spans: Box<[Option<PrefixSpan>; 256]>,
    len: usize,
}

impl PrefixIndex {
    /// One pass over sorted boundaries.
    pub fn build(boundaries: &[Key]) -> Self {
        let mut spans = Box::new([None; 256]);
        for (i, boundary) in boundaries.iter().enumerate() {
            if let Some(unit) = first_unit(boundary) {
                spans[unit as usize]
                    .get_or_insert(PrefixSpan { start: i, end: i })
                    .end = i;
            }
        }
        Self {
            spans,
            len: boundaries.len(),
        }
    }

    pub fn get(&self, unit: u8) -> Option<PrefixSpan> {
        self.spans[unit as usize]
    }

    /// Number of distinct first bytes indexed.
    pub fn entries(&self) -> usize {
        self.spans.iter().filter(|s| s.is_some()).count()
    }

    /// Inclusive window of boundaries `key` has to be compared against.
    /// Falls back to every boundary when the first byte isn't indexed.
    /// `None` when there are no boundaries at all.
    pub fn window(&self, key: &[u8]) -> Option<PrefixSpan> {
        let full = PrefixSpan {
            start: 0,
            end: self.len.checked_sub(1)?,
        };
        Some(first_unit(key).and_then(|unit| self.get(unit)).unwrap_or(full))
    }
}
