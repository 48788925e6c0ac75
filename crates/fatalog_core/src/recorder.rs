//! Fault-path append of one crash record.
//!
//! Everything here runs inside the platform's fault handler: no heap
//! allocation, no blocking calls, and a hardware watchdog still ticking.
//! The window is an arena and `next_offset` its bump cursor.

use crate::layout::{
    record_size, stack_word_offset, write_u32, Header, RecordHeader, HEADER_SIZE, MAX_RECORDS,
    RECORD_FIXED_SIZE, WORD_SIZE,
};
use crate::platform::StackMemory;
use crate::store::Store;
use crate::types::ResetInfo;
use tracing::{debug, warn};

/// What the platform fault hook hands to the recorder.
#[derive(Clone, Copy)]
pub struct FaultContext<'a> {
    /// Reset and exception metadata.
    pub reset_info: ResetInfo,
    /// Address of the first stack word to capture.
    pub stack_start: u32,
    /// One past the last stack address to capture.
    pub stack_end: u32,
    /// Memory the stack words are read from.
    pub memory: &'a dyn StackMemory,
}

impl<'a> FaultContext<'a> {
    /// Creates a fault context.
    #[must_use]
    pub fn new(
        reset_info: ResetInfo,
        stack_start: u32,
        stack_end: u32,
        memory: &'a dyn StackMemory,
    ) -> Self {
        Self {
            reset_info,
            stack_start,
            stack_end,
            memory,
        }
    }

    /// Number of words in the requested stack range.
    #[must_use]
    pub fn requested_words(&self) -> u32 {
        self.stack_end
            .saturating_sub(self.stack_start)
            .div_ceil(WORD_SIZE as u32)
    }
}

impl std::fmt::Debug for FaultContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultContext")
            .field("reset_info", &self.reset_info)
            .field("stack_start", &self.stack_start)
            .field("stack_end", &self.stack_end)
            .finish_non_exhaustive()
    }
}

/// Where a saved record landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedRecord {
    /// 1-based record number (the new record count).
    pub number: u8,
    /// Window offset of the record.
    pub offset: u16,
    /// Stack words captured.
    pub stack_len: u16,
    /// True if the requested stack range was not captured completely.
    pub truncated: bool,
    /// True if this record filled the store.
    pub filled_store: bool,
}

/// Result of a fault-path append.
///
/// There is nobody to report an error to inside a fault handler, so this
/// is a status for tests and diagnostics, not an error channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The record was written and committed.
    Saved(SavedRecord),
    /// The record was written to the mirror but the commit failed.
    Unpersisted(SavedRecord),
    /// The store is full; nothing was written.
    StoreFull,
    /// The store was in use by foreground code; nothing was written.
    Busy,
    /// The medium's mirror was unavailable; nothing was written.
    Unmapped,
}

impl RecordOutcome {
    /// Returns the record if one was written to the mirror.
    #[must_use]
    pub fn saved(&self) -> Option<&SavedRecord> {
        match self {
            Self::Saved(record) | Self::Unpersisted(record) => Some(record),
            _ => None,
        }
    }

    /// True if the record reached durable media.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

impl Store {
    /// Appends one crash record and commits it.
    ///
    /// Meant to be called only from the platform fault hook. Steps:
    ///
    /// 1. decode the header from the mirror; an erased header is initialized
    /// 2. a full store (`next_offset == 0`) returns without writing
    /// 3. stack words from `stack_start` up to `stack_end` are copied behind
    ///    the fixed fields, bounded by the window's remaining capacity and
    ///    [`Config::max_stack_words`](crate::Config::max_stack_words)
    /// 4. `count` is incremented and the cursor advanced by the record size
    /// 5. if a record of `min_stack_depth` words no longer fits, the store
    ///    is marked full
    /// 6. the mirror is committed once, without retry
    pub fn record_crash(&mut self, fault: &FaultContext<'_>) -> RecordOutcome {
        let timestamp = self.clock.millis();
        let size = self.window().size as usize;
        let min_stack_depth = self.config().min_stack_depth as usize;
        let max_stack_words = self.config().max_stack_words;

        let Ok(window) = self.window_bytes_mut() else {
            return RecordOutcome::Unmapped;
        };

        let mut header = Header::read(window);
        if header.is_erased() {
            debug!("initializing erased crash store header");
            header = Header::empty();
        }
        if header.is_full() {
            return RecordOutcome::StoreFull;
        }

        let record_offset = header.next_offset as usize;
        if header.count >= MAX_RECORDS
            || record_offset < HEADER_SIZE
            || record_offset % WORD_SIZE != 0
            || record_offset + RECORD_FIXED_SIZE > size
        {
            warn!(
                count = header.count,
                next_offset = header.next_offset,
                "crash store header unusable, marking full"
            );
            header.next_offset = 0;
            header.write(window);
            // Best effort; the store is unusable either way.
            let _ = self.commit();
            return RecordOutcome::StoreFull;
        }

        let capacity = (size - record_offset - RECORD_FIXED_SIZE) / WORD_SIZE;
        let limit = max_stack_words
            .map_or(capacity, |cap| capacity.min(cap as usize))
            .min(u16::MAX as usize);

        let mut stack_len: u16 = 0;
        let mut truncated = false;
        let mut addr = fault.stack_start;
        while addr < fault.stack_end {
            if stack_len as usize == limit {
                truncated = true;
                break;
            }
            let Some(word) = fault.memory.read_word(addr) else {
                truncated = true;
                break;
            };
            write_u32(
                window,
                stack_word_offset(record_offset, stack_len as usize),
                word,
            );
            stack_len += 1;
            match addr.checked_add(WORD_SIZE as u32) {
                Some(next) => addr = next,
                None => break,
            }
        }

        let record = RecordHeader {
            timestamp,
            reset_info: fault.reset_info,
            stack_start: fault.stack_start,
            stack_len,
        };
        record.encode_into(&mut window[record_offset..]);

        header.count += 1;
        let next = record_offset + record_size(stack_len);
        let full_at = size.saturating_sub(RECORD_FIXED_SIZE + min_stack_depth * WORD_SIZE);
        header.next_offset = if next > full_at || header.count >= MAX_RECORDS {
            0
        } else {
            u16::try_from(next).unwrap_or(0)
        };
        header.write(window);

        let saved = SavedRecord {
            number: header.count,
            offset: record_offset as u16,
            stack_len,
            truncated,
            filled_store: header.is_full(),
        };

        match self.commit() {
            Ok(()) => {
                debug!(
                    number = saved.number,
                    offset = saved.offset,
                    stack_len,
                    truncated,
                    "crash record saved"
                );
                RecordOutcome::Saved(saved)
            }
            Err(err) => {
                warn!(error = %err, number = saved.number, "crash record not committed");
                RecordOutcome::Unpersisted(saved)
            }
        }
    }
}
