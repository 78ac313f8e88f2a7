use crate::error::{ValueError, ValueResult};

/// Closed arithmetic progression `first [, second] .. last` used to slice
/// matrices. The step is `second - first`, or 1 when `second` is omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    first: i64,
    second: Option<i64>,
    last: i64,
}

impl Range {
    pub fn new(first: i64, second: Option<i64>, last: i64) -> ValueResult<Self> {
        let range = Self {
            first,
            second,
            last,
        };
        if range.step() == 0 {
            return Err(ValueError::InvalidRangeParameter {
                first,
                second,
                last,
            });
        }
        Ok(range)
    }

    /// `first .. last` with unit step
    pub fn span(first: i64, last: i64) -> Self {
        Self {
            first,
            second: None,
            last,
        }
    }

    pub fn first(&self) -> i64 {
        self.first
    }

    pub fn last(&self) -> i64 {
        self.last
    }

    pub fn step(&self) -> i64 {
        self.second.map_or(1, |second| second.wrapping_sub(self.first))
    }

    pub fn len(&self) -> usize {
        let step = self.step();
        let distance = self.last as i128 - self.first as i128;
        if step == 0 || (distance != 0 && (distance > 0) != (step > 0)) {
            return 0;
        }
        (distance / step as i128 + 1) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        let step = self.step();
        (0..self.len()).map(move |i| self.first + step * i as i64)
    }
}
