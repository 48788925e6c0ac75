//! Sequential read-back and rendering of stored records.

use crate::layout::{
    read_u32, stack_word_offset, Header, RecordHeader, HEADER_SIZE, RECORD_FIXED_SIZE, WORD_SIZE,
};
use crate::store::Store;
use crate::window::Window;
use std::fmt;
use tracing::warn;

/// Stack words printed per line.
pub const WORDS_PER_LINE: usize = 4;

/// One record read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashRecord {
    /// 1-based position in the store.
    pub number: usize,
    /// Window offset of the record.
    pub offset: usize,
    /// Fixed fields as stored.
    pub header: RecordHeader,
    /// Stack words that lie inside the window.
    pub stack: Vec<u32>,
}

impl CrashRecord {
    /// True if every word announced by `stack_len` was read.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stack.len() == self.header.stack_len as usize
    }

    /// Stack words grouped per output line, with the address of each group.
    pub fn stack_lines(&self) -> impl Iterator<Item = (u32, &[u32])> + '_ {
        self.stack
            .chunks(WORDS_PER_LINE)
            .enumerate()
            .map(|(line, words)| (self.header.stack_address(line * WORDS_PER_LINE), words))
    }
}

/// Outcome of validating the record chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integrity {
    /// Every record was inside the window and the chain ended at the cursor.
    Intact,
    /// Reading stopped at record `number` because it ran out of the window.
    Incomplete {
        /// 1-based record where reading stopped.
        number: usize,
    },
    /// The chain ended somewhere other than the header's cursor.
    Inconsistent {
        /// Cursor stored in the header.
        expected: u16,
        /// Offset where the last record ended.
        actual: usize,
    },
}

/// Space left in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    /// Bytes still available for records.
    Free(u16),
    /// No further records are accepted until cleared.
    Full,
}

/// Everything the store holds, as read back in the foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// The window that was scanned.
    pub window: Window,
    /// Header as stored, or `None` if the medium is still erased.
    pub header: Option<Header>,
    /// Records in the order they were written.
    pub records: Vec<CrashRecord>,
    /// Result of the chain validation.
    pub integrity: Integrity,
    /// Remaining space.
    pub occupancy: Occupancy,
}

impl Report {
    /// Scans the window bytes of a store.
    ///
    /// `bytes` is the window as mirrored; a short slice is treated as
    /// an erased store.
    #[must_use]
    pub fn scan(window: Window, bytes: &[u8]) -> Self {
        let size = (window.size as usize).min(bytes.len());
        if size < HEADER_SIZE {
            return Self::erased(window);
        }

        let header = Header::read(bytes);
        if header.is_erased() {
            return Self::erased(window);
        }

        let mut records = Vec::with_capacity(header.count as usize);
        let mut integrity = Integrity::Intact;
        let mut cursor = HEADER_SIZE;

        for number in 1..=header.count as usize {
            if !fits(cursor, RECORD_FIXED_SIZE, size) {
                integrity = Integrity::Incomplete { number };
                break;
            }

            let fixed = RecordHeader::decode(&bytes[cursor..]);
            let mut stack = Vec::with_capacity(fixed.stack_len as usize);
            for index in 0..fixed.stack_len as usize {
                let at = stack_word_offset(cursor, index);
                if !fits(at, WORD_SIZE, size) {
                    integrity = Integrity::Incomplete { number };
                    break;
                }
                stack.push(read_u32(bytes, at));
            }

            records.push(CrashRecord {
                number,
                offset: cursor,
                header: fixed,
                stack,
            });
            if integrity != Integrity::Intact {
                break;
            }
            cursor += fixed.size();
        }

        // A full header keeps no cursor to compare with.
        if integrity == Integrity::Intact
            && !header.is_full()
            && cursor != header.next_offset as usize
        {
            integrity = Integrity::Inconsistent {
                expected: header.next_offset,
                actual: cursor,
            };
        }

        match integrity {
            Integrity::Intact => {}
            Integrity::Incomplete { number } => {
                warn!(number, "crash record runs past the store window");
            }
            Integrity::Inconsistent { expected, actual } => {
                warn!(expected, actual, "crash store cursor does not match records");
            }
        }

        let occupancy = if header.is_full() {
            Occupancy::Full
        } else {
            Occupancy::Free(window.size.saturating_sub(header.next_offset))
        };

        Self {
            window,
            header: Some(header),
            records,
            integrity,
            occupancy,
        }
    }

    fn erased(window: Window) -> Self {
        Self {
            window,
            header: None,
            records: Vec::new(),
            integrity: Integrity::Intact,
            occupancy: Occupancy::Free(window.size.saturating_sub(HEADER_SIZE as u16)),
        }
    }

    /// True if reading stopped at a record running out of the window.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        matches!(self.integrity, Integrity::Incomplete { .. })
    }

    /// True if the record chain did not end at the header's cursor.
    #[must_use]
    pub fn is_inconsistent(&self) -> bool {
        matches!(self.integrity, Integrity::Inconsistent { .. })
    }

    /// Free bytes, or `None` when full.
    #[must_use]
    pub fn free_bytes(&self) -> Option<u16> {
        match self.occupancy {
            Occupancy::Free(bytes) => Some(bytes),
            Occupancy::Full => None,
        }
    }
}

fn fits(offset: usize, len: usize, size: usize) -> bool {
    offset.checked_add(len).is_some_and(|end| end <= size)
}

impl fmt::Display for CrashRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = &self.header.reset_info;
        writeln!(f)?;
        writeln!(f, "Fatal # {} at {} ms", self.number, self.header.timestamp)?;
        match info.reset_reason() {
            Some(reason) => writeln!(f, "Reason of restart: {} ({reason})", info.reason)?,
            None => writeln!(f, "Reason of restart: {}", info.reason)?,
        }
        writeln!(f, "Exception cause: {}", info.exccause)?;
        writeln!(
            f,
            "epc1=0x{:08x} epc2=0x{:08x} epc3=0x{:08x} excvaddr=0x{:08x} depc=0x{:08x}",
            info.epc1, info.epc2, info.epc3, info.excvaddr, info.depc
        )?;
        writeln!(f, ">>>stack>>>")?;
        for (addr, words) in self.stack_lines() {
            write!(f, "{addr:08x}:")?;
            for word in words {
                write!(f, " {word:08x}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "<<<stack<<<")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            write!(f, "{record}")?;
        }
        match self.integrity {
            Integrity::Intact => {}
            Integrity::Incomplete { .. } => writeln!(f, "Incomplete stack trace")?,
            Integrity::Inconsistent { .. } => writeln!(f, "Consistency error")?,
        }
        match self.occupancy {
            Occupancy::Free(bytes) => writeln!(f, "{bytes} bytes free"),
            Occupancy::Full => writeln!(f, "Fatal store full"),
        }
    }
}

impl Store {
    /// Reads back every record, validating bounds as it goes.
    ///
    /// Corruption never aborts the scan; it is reported through
    /// [`Report::integrity`].
    #[must_use]
    pub fn report(&self) -> Report {
        Report::scan(self.window(), self.window_bytes().unwrap_or(&[]))
    }

    /// Renders all records, the integrity verdict and the free space.
    ///
    /// # Errors
    ///
    /// Only errors raised by `out` itself.
    pub fn print<W: fmt::Write + ?Sized>(&self, out: &mut W) -> fmt::Result {
        write!(out, "{}", self.report())
    }
}
