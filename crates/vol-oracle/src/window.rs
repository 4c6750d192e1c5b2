//! Fixed-size rolling window of log-returns with running aggregates

use crate::error::OracleError;
use crate::fixed_point::square;
use crate::Result;
use serde::Serialize;

/// Circular buffer of the most recent `capacity` log-returns
///
/// The write cursor is `count % capacity`. `sum` and `sum_squares` always
/// equal the sum (and sum of squares) of the valid entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollingWindow {
    observations: Vec<i128>,
    capacity: usize,
    count: u64,
    sum: i128,
    sum_squares: u128,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            observations: vec![0; capacity],
            capacity,
            count: 0,
            sum: 0,
            sum_squares: 0,
        }
    }

    /// Record a log-return, evicting the oldest when full
    ///
    /// Returns the evicted value. On error the window is unchanged.
    pub fn push(&mut self, r: i128) -> Result<Option<i128>> {
        let cursor = self.cursor();
        let evicted = self.is_full().then(|| self.observations[cursor]);

        let r_squared = square(r)?;
        let (mut sum, mut sum_squares) = (self.sum, self.sum_squares);
        if let Some(old) = evicted {
            // square(old) was already accepted when old was pushed
            sum = sum.checked_sub(old).ok_or(OracleError::Overflow("running sum"))?;
            sum_squares = sum_squares
                .checked_sub(square(old)?)
                .ok_or(OracleError::Overflow("running sum of squares"))?;
        }
        let sum = sum.checked_add(r).ok_or(OracleError::Overflow("running sum"))?;
        let sum_squares = sum_squares
            .checked_add(r_squared)
            .ok_or(OracleError::Overflow("running sum of squares"))?;
        let count = self
            .count
            .checked_add(1)
            .ok_or(OracleError::Overflow("observation count"))?;

        self.observations[cursor] = r;
        self.sum = sum;
        self.sum_squares = sum_squares;
        self.count = count;

        Ok(evicted)
    }

    fn cursor(&self) -> usize {
        (self.count % self.capacity as u64) as usize
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.capacity as u64
    }

    /// Valid entries, `min(count, capacity)`
    pub fn len(&self) -> usize {
        if self.is_full() {
            self.capacity
        } else {
            self.count as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total pushes since creation
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> i128 {
        self.sum
    }

    pub fn sum_squares(&self) -> u128 {
        self.sum_squares
    }

    /// Valid entries, oldest first
    pub fn observations(&self) -> Vec<i128> {
        if self.is_full() {
            let cursor = self.cursor();
            self.observations[cursor..]
                .iter()
                .chain(&self.observations[..cursor])
                .copied()
                .collect()
        } else {
            self.observations[..self.len()].to_vec()
        }
    }

    /// Aggregates rebuilt from the stored entries
    pub fn recompute_sums(&self) -> Result<(i128, u128)> {
        let valid = &self.observations[..self.len()];
        let mut sum: i128 = 0;
        let mut sum_squares: u128 = 0;
        for &r in valid {
            sum = sum.checked_add(r).ok_or(OracleError::Overflow("running sum"))?;
            sum_squares = sum_squares
                .checked_add(square(r)?)
                .ok_or(OracleError::Overflow("running sum of squares"))?;
        }
        Ok((sum, sum_squares))
    }

    pub fn sums_consistent(&self) -> bool {
        self.recompute_sums()
            .map(|sums| sums == (self.sum, self.sum_squares))
            .unwrap_or(false)
    }
}
