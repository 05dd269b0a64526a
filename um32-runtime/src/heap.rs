//! Heap allocator
//!
//! All blocks live end to end in one [`Segment`]:
//!
//! ```text
//! [sentinel: 0, 0] [N][flag][payload: N words][N] [M][flag][payload: M words][M] ...
//!                           ^ block address
//! ```
//!
//! The two sentinel words keep address 0 (and every address below
//! [`MIN_BLOCK_ADDRESS`]) from ever naming a block. Freed blocks keep their
//! space; nothing is reused or coalesced, so the heap only grows.
//!
//! Every address handed out by [`Heap::allocate`] is recorded. Only those
//! addresses are accepted, so header-shaped data inside a payload never
//! passes for a block.

use crate::segment::{Segment, SegmentError};
use thiserror::Error;
use um32_spec::Word;

/// Words reserved at the start of the heap segment
pub const SENTINEL_WORDS: usize = 2;

/// Header words before each payload: capacity, allocated flag
pub const HEADER_WORDS: usize = 2;

/// Footer words after each payload: capacity
pub const FOOTER_WORDS: usize = 1;

/// Bookkeeping words per block
pub const BLOCK_OVERHEAD: usize = HEADER_WORDS + FOOTER_WORDS;

/// Lowest address a block can have
pub const MIN_BLOCK_ADDRESS: Word = (SENTINEL_WORDS + HEADER_WORDS) as Word;

/// Default maximum heap size in words (1 GiB of payload and metadata)
pub const DEFAULT_HEAP_LIMIT: u32 = 1 << 28;

const ALLOCATED: Word = 1;
const FREED: Word = 0;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeapError {
    #[error("Invalid heap address {address:#010x} (offset {offset})")]
    InvalidAddress { address: Word, offset: Word },

    #[error("Invalid free of heap address {address:#010x}")]
    InvalidFree { address: Word },

    #[error("Heap out of memory: {0}")]
    OutOfMemory(#[from] SegmentError),
}

pub type Result<T> = std::result::Result<T, HeapError>;

/// One block as seen by iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    /// Segment index of the first payload word
    pub address: Word,
    /// Payload words
    pub capacity: Word,
    pub allocated: bool,
}

impl Block {
    /// Segment index one past the footer, where the next header starts
    fn end(&self) -> usize {
        self.address as usize + self.capacity as usize + FOOTER_WORDS
    }
}

#[derive(Debug)]
pub struct Heap {
    segment: Segment,
    /// Addresses of every block ever allocated, ascending
    addresses: Vec<Word>,
    limit: usize,
}

impl Heap {
    pub fn new() -> std::result::Result<Self, SegmentError> {
        Self::with_limit(DEFAULT_HEAP_LIMIT)
    }

    /// Create a heap whose segment may never exceed `limit` words.
    ///
    /// The limit is also capped by the 32-bit address space.
    pub fn with_limit(limit: u32) -> std::result::Result<Self, SegmentError> {
        let mut segment = Segment::new()?;
        segment.add_zeroed(SENTINEL_WORDS)?;
        Ok(Self {
            segment,
            addresses: Vec::new(),
            limit: limit as usize,
        })
    }

    /// Total words in the heap segment, sentinel and metadata included
    pub fn len(&self) -> usize {
        self.segment.len()
    }

    /// True when no block was ever allocated
    pub fn is_empty(&self) -> bool {
        self.segment.len() <= SENTINEL_WORDS
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    /// Append a zeroed block of `capacity` payload words and return its
    /// address. Nothing is appended on failure.
    pub fn allocate(&mut self, capacity: Word) -> Result<Word> {
        let start = self.segment.len();
        let needed = start as u64 + BLOCK_OVERHEAD as u64 + capacity as u64;
        if needed > self.limit as u64 {
            return Err(SegmentError::LimitExceeded {
                requested: usize::try_from(needed).unwrap_or(usize::MAX),
                limit: self.limit,
            }
            .into());
        }
        let needed = needed as usize;

        self.addresses
            .try_reserve(1)
            .map_err(|source| SegmentError::AllocationFailed { requested: needed, source })?;
        self.segment.ensure_capacity(needed)?;
        self.segment.add_range(&[capacity, ALLOCATED])?;
        self.segment.add_zeroed(capacity as usize)?;
        self.segment.push(capacity)?;
        debug_assert_eq!(self.segment.len(), needed);

        let address = (start + HEADER_WORDS) as Word;
        self.addresses.push(address);
        tracing::debug!(address, capacity, "allocated heap block");
        Ok(address)
    }

    /// Read a payload word
    pub fn get(&self, address: Word, offset: Word) -> Result<Word> {
        let block = self.live_block(address, offset)?;
        Ok(self.segment[block.address as usize + offset as usize])
    }

    /// Locate a payload word for writing. Also returns the block capacity.
    pub fn index(&mut self, address: Word, offset: Word) -> Result<(&mut Word, Word)> {
        let block = self.live_block(address, offset)?;
        let word = &mut self.segment[block.address as usize + offset as usize];
        Ok((word, block.capacity))
    }

    /// Payload of a live block
    pub fn payload(&self, address: Word) -> Result<&[Word]> {
        let block = self.validate(address).ok_or(HeapError::InvalidAddress { address, offset: 0 })?;
        let start = block.address as usize;
        Ok(&self.segment.as_slice()[start..start + block.capacity as usize])
    }

    /// Mark a live block as freed. Its space is not reclaimed.
    pub fn free(&mut self, address: Word) -> Result<()> {
        self.validate(address).ok_or(HeapError::InvalidFree { address })?;
        self.segment[address as usize - 1] = FREED;
        tracing::debug!(address, "freed heap block");
        Ok(())
    }

    /// Is `address` the address of a live, intact block?
    pub fn is_allocated(&self, address: Word) -> bool {
        self.validate(address).is_some()
    }

    fn live_block(&self, address: Word, offset: Word) -> Result<Block> {
        match self.validate(address) {
            Some(block) if offset < block.capacity => Ok(block),
            _ => Err(HeapError::InvalidAddress { address, offset }),
        }
    }

    /// Checks shared by every access: address returned by `allocate`,
    /// allocated flag set, footer present and matching.
    fn validate(&self, address: Word) -> Option<Block> {
        if address < MIN_BLOCK_ADDRESS || self.addresses.binary_search(&address).is_err() {
            return None;
        }
        let block = self.read_header(address as usize)?;
        if !block.allocated {
            return None;
        }
        Some(block)
    }

    /// Decode the header in front of `address`, checking the footer.
    fn read_header(&self, address: usize) -> Option<Block> {
        let capacity = self.segment.get(address.checked_sub(HEADER_WORDS)?)?;
        let flag = self.segment.get(address - 1)?;
        let footer_index = address.checked_add(capacity as usize)?;
        let footer = self.segment.get(footer_index)?;
        if footer != capacity {
            return None;
        }
        Some(Block {
            address: address as Word,
            capacity,
            allocated: flag == ALLOCATED,
        })
    }

    /// First block in segment order
    pub fn first(&self) -> Option<Block> {
        self.block_at(SENTINEL_WORDS)
    }

    /// Block following `block` in segment order
    pub fn next(&self, block: &Block) -> Option<Block> {
        self.block_at(block.end())
    }

    fn block_at(&self, header: usize) -> Option<Block> {
        if header >= self.segment.len() {
            return None;
        }
        self.read_header(header + HEADER_WORDS)
    }

    /// Iterate over every block, allocated and freed, in segment order.
    ///
    /// Iteration stops early at the first block whose footer does not match
    /// its header.
    pub fn blocks(&self) -> Blocks<'_> {
        Blocks {
            heap: self,
            next: self.first(),
        }
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats::collect(self)
    }
}

/// Forward iterator over heap blocks
pub struct Blocks<'a> {
    heap: &'a Heap,
    next: Option<Block>,
}

impl Iterator for Blocks<'_> {
    type Item = Block;

    fn next(&mut self) -> Option<Block> {
        let block = self.next.take()?;
        self.next = self.heap.next(&block);
        Some(block)
    }
}

impl std::iter::FusedIterator for Blocks<'_> {}

/// Block and word counts gathered by walking the heap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub blocks: usize,
    pub live: usize,
    pub free: usize,
    pub live_words: u64,
    pub free_words: u64,
    pub overhead_words: u64,
}

impl HeapStats {
    pub fn collect(heap: &Heap) -> Self {
        let mut stats = HeapStats {
            overhead_words: SENTINEL_WORDS as u64,
            ..Default::default()
        };
        for block in heap.blocks() {
            stats.blocks += 1;
            stats.overhead_words += BLOCK_OVERHEAD as u64;
            if block.allocated {
                stats.live += 1;
                stats.live_words += block.capacity as u64;
            } else {
                stats.free += 1;
                stats.free_words += block.capacity as u64;
            }
        }
        stats
    }

    /// Share of payload words held by freed blocks, in percent
    pub fn fragmentation(&self) -> f64 {
        let total = self.live_words + self.free_words;
        if total == 0 {
            0.0
        } else {
            self.free_words as f64 * 100.0 / total as f64
        }
    }
}
