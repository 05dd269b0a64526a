//! Growable word segment
//!
//! Backing store for the program and for the heap. Capacity grows by
//! doubling, or to the exact target when doubling is not enough. Every
//! growth is fallible and leaves the segment untouched on failure.

use std::collections::TryReserveError;
use thiserror::Error;
use um32_spec::Word;

/// Capacity of a freshly created segment, in words
pub const DEFAULT_CAPACITY: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error("Cannot grow segment to {requested} words: {source}")]
    AllocationFailed {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    #[error("Segment length {requested} exceeds limit of {limit} words")]
    LimitExceeded { requested: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, SegmentError>;

/// Contiguous, owner-exclusive word array
///
/// `capacity` is tracked separately from the vector's own capacity so that
/// the growth rule is observable and deterministic.
#[derive(Debug, PartialEq, Eq)]
pub struct Segment {
    words: Vec<Word>,
    capacity: usize,
}

impl Segment {
    /// Create an empty segment with the default capacity
    pub fn new() -> Result<Self> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut words = Vec::new();
        words
            .try_reserve_exact(capacity)
            .map_err(|source| SegmentError::AllocationFailed { requested: capacity, source })?;
        Ok(Self { words, capacity })
    }

    /// Words in use
    #[inline]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words allocated
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Grow so that at least `target` words fit.
    ///
    /// New capacity is `max(capacity * 2, target)`.
    pub fn ensure_capacity(&mut self, target: usize) -> Result<()> {
        if self.capacity >= target {
            return Ok(());
        }
        let new_capacity = self.capacity.saturating_mul(2).max(target);
        self.words
            .try_reserve_exact(new_capacity - self.words.len())
            .map_err(|source| SegmentError::AllocationFailed { requested: new_capacity, source })?;
        self.capacity = new_capacity;
        Ok(())
    }

    /// Append `values`, growing as needed. Appends nothing on failure.
    pub fn add_range(&mut self, values: &[Word]) -> Result<()> {
        self.ensure_capacity(self.len() + values.len())?;
        self.words.extend_from_slice(values);
        Ok(())
    }

    pub fn push(&mut self, value: Word) -> Result<()> {
        self.add_range(std::slice::from_ref(&value))
    }

    /// Append `count` zero words. Appends nothing on failure.
    pub fn add_zeroed(&mut self, count: usize) -> Result<()> {
        let new_len = self.len() + count;
        self.ensure_capacity(new_len)?;
        self.words.resize(new_len, 0);
        Ok(())
    }

    /// Replace the whole contents with a copy of `values`.
    /// The segment is unchanged on failure.
    pub fn replace_with(&mut self, values: &[Word]) -> Result<()> {
        self.ensure_capacity(values.len())?;
        self.words.clear();
        self.words.extend_from_slice(values);
        Ok(())
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Word> {
        self.words.get(index).copied()
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Word> {
        self.words.get_mut(index)
    }

    #[inline]
    pub fn as_slice(&self) -> &[Word] {
        &self.words
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Word] {
        &mut self.words
    }

    /// Release the backing storage. Safe to call more than once.
    pub fn release(&mut self) {
        self.words = Vec::new();
        self.capacity = 0;
    }
}

impl std::ops::Index<usize> for Segment {
    type Output = Word;

    fn index(&self, index: usize) -> &Word {
        &self.words[index]
    }
}

impl std::ops::IndexMut<usize> for Segment {
    fn index_mut(&mut self, index: usize) -> &mut Word {
        &mut self.words[index]
    }
}
