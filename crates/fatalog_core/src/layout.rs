//! On-media layout of the crash store.
//!
//! All offsets are relative to the start of the window and all
//! multi-byte fields are little-endian.
//!
//! ```text
//! Header (HEADER_SIZE = 4)
//!   0  count        u8
//!   1  (pad)
//!   2  next_offset  u16     0 = full
//!
//! Record (RECORD_FIXED_SIZE = 40, then stack words)
//!   0  timestamp    u32     milliseconds since boot
//!   4  reason       u32
//!   8  exccause     u32
//!   12 epc1         u32
//!   16 epc2         u32
//!   20 epc3         u32
//!   24 excvaddr     u32
//!   28 depc         u32
//!   32 stack_start  u32
//!   36 stack_len    u16
//!   38 (pad)
//!   40 stack        u32 * stack_len
//! ```
//!
//! Callers guarantee that the slices handed to the codec are long enough;
//! the window is validated once when the store is opened.

use crate::types::ResetInfo;

/// Size of one stack word.
pub const WORD_SIZE: usize = 4;

/// Size of the header, rounded to a word boundary.
pub const HEADER_SIZE: usize = align4(3);

/// Size of the fixed part of a record, rounded to a word boundary.
pub const RECORD_FIXED_SIZE: usize = align4(4 + ResetInfo::SIZE + 4 + 2);

/// Value of `count` on an erased medium.
pub const ERASED_COUNT: u8 = 0xFF;

/// Largest storable record count; one more would read as erased.
pub const MAX_RECORDS: u8 = ERASED_COUNT - 1;

const COUNT_AT: usize = 0;
const NEXT_AT: usize = 2;

const TIMESTAMP_AT: usize = 0;
const RESET_INFO_AT: usize = 4;
const STACK_START_AT: usize = RESET_INFO_AT + ResetInfo::SIZE;
const STACK_LEN_AT: usize = STACK_START_AT + 4;

/// Rounds `n` up to a multiple of four.
#[must_use]
pub const fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// Size of a record carrying `stack_len` words, rounded to a word boundary.
#[must_use]
pub const fn record_size(stack_len: u16) -> usize {
    RECORD_FIXED_SIZE + stack_len as usize * WORD_SIZE
}

/// Offset of stack word `index` of the record at `record_offset`.
#[must_use]
pub const fn stack_word_offset(record_offset: usize, index: usize) -> usize {
    record_offset + RECORD_FIXED_SIZE + index * WORD_SIZE
}

pub(crate) fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

pub(crate) fn write_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

fn write_u16(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

/// Store occupancy, kept in the first bytes of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Number of records stored.
    pub count: u8,
    /// Window offset of the next append, or `0` when full.
    pub next_offset: u16,
}

impl Header {
    /// Header of a store with no records.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            count: 0,
            next_offset: HEADER_SIZE as u16,
        }
    }

    /// Decodes the header from the start of `window`.
    #[must_use]
    pub fn read(window: &[u8]) -> Self {
        Self {
            count: window[COUNT_AT],
            next_offset: read_u16(window, NEXT_AT),
        }
    }

    /// Encodes the header into the start of `window`.
    ///
    /// The pad byte is left as it is on the medium.
    pub fn write(&self, window: &mut [u8]) {
        window[COUNT_AT] = self.count;
        write_u16(window, NEXT_AT, self.next_offset);
    }

    /// True if the header still holds the erased pattern.
    #[must_use]
    pub const fn is_erased(&self) -> bool {
        self.count == ERASED_COUNT
    }

    /// True if the store refuses further records.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.next_offset == 0
    }
}

/// Fixed part of a record; the stack words follow it on the medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Milliseconds since boot when the fault was recorded.
    pub timestamp: u32,
    /// Reset and exception metadata.
    pub reset_info: ResetInfo,
    /// Address of the first captured stack word.
    pub stack_start: u32,
    /// Number of stack words that follow.
    pub stack_len: u16,
}

impl RecordHeader {
    /// Decodes the fixed part of the record at the start of `buf`.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Self {
        let mut words = [0u32; ResetInfo::FIELDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = read_u32(buf, RESET_INFO_AT + i * WORD_SIZE);
        }

        Self {
            timestamp: read_u32(buf, TIMESTAMP_AT),
            reset_info: ResetInfo::from_words(words),
            stack_start: read_u32(buf, STACK_START_AT),
            stack_len: read_u16(buf, STACK_LEN_AT),
        }
    }

    /// Encodes the fixed part into the start of `buf`.
    pub fn encode_into(&self, buf: &mut [u8]) {
        write_u32(buf, TIMESTAMP_AT, self.timestamp);
        for (i, word) in self.reset_info.to_words().into_iter().enumerate() {
            write_u32(buf, RESET_INFO_AT + i * WORD_SIZE, word);
        }
        write_u32(buf, STACK_START_AT, self.stack_start);
        write_u16(buf, STACK_LEN_AT, self.stack_len);
    }

    /// Rounded size of the whole record on the medium.
    #[must_use]
    pub const fn size(&self) -> usize {
        record_size(self.stack_len)
    }

    /// Address the stack word `index` was captured from.
    #[must_use]
    pub const fn stack_address(&self, index: usize) -> u32 {
        self.stack_start
            .wrapping_add((index as u32).wrapping_mul(WORD_SIZE as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_word_aligned() {
        assert_eq!(HEADER_SIZE, 4);
        assert_eq!(RECORD_FIXED_SIZE, 40);
        assert_eq!(record_size(0), 40);
        assert_eq!(record_size(5), 60);
        assert_eq!(align4(0), 0);
        assert_eq!(align4(1), 4);
        assert_eq!(align4(38), 40);
    }

    #[test]
    fn erased_header_is_recognized() {
        let window = [0xFFu8; 8];
        let header = Header::read(&window);
        assert!(header.is_erased());
        assert_eq!(header.next_offset, 0xFFFF);
    }

    #[test]
    fn header_byte_layout() {
        let mut window = [0xAAu8; 4];
        Header {
            count: 3,
            next_offset: 0x0124,
        }
        .write(&mut window);
        assert_eq!(window, [3, 0xAA, 0x24, 0x01]);
        assert_eq!(Header::read(&window).count, 3);
        assert_eq!(Header::read(&window).next_offset, 0x0124);
    }

    #[test]
    fn empty_header() {
        let header = Header::empty();
        assert_eq!(header.count, 0);
        assert_eq!(header.next_offset as usize, HEADER_SIZE);
        assert!(!header.is_full());
        assert!(!header.is_erased());
    }

    #[test]
    fn record_header_field_offsets() {
        let header = RecordHeader {
            timestamp: 0x1111_1111,
            reset_info: ResetInfo {
                reason: 2,
                exccause: 29,
                epc1: 0x4020_1234,
                epc2: 0,
                epc3: 0,
                excvaddr: 0x0000_0010,
                depc: 0,
            },
            stack_start: 0x3FFF_FDC0,
            stack_len: 7,
        };
        let mut buf = [0u8; RECORD_FIXED_SIZE];
        header.encode_into(&mut buf);

        assert_eq!(read_u32(&buf, 0), 0x1111_1111);
        assert_eq!(read_u32(&buf, 4), 2);
        assert_eq!(read_u32(&buf, 8), 29);
        assert_eq!(read_u32(&buf, 12), 0x4020_1234);
        assert_eq!(read_u32(&buf, 24), 0x10);
        assert_eq!(read_u32(&buf, 32), 0x3FFF_FDC0);
        assert_eq!(read_u16(&buf, 36), 7);
        assert_eq!(RecordHeader::decode(&buf), header);
        assert_eq!(header.size(), 68);
    }

    #[test]
    fn stack_addresses_step_by_word() {
        let header = RecordHeader {
            timestamp: 0,
            reset_info: ResetInfo::default(),
            stack_start: 0x3FFF_FF00,
            stack_len: 3,
        };
        assert_eq!(header.stack_address(0), 0x3FFF_FF00);
        assert_eq!(header.stack_address(2), 0x3FFF_FF08);
        assert_eq!(stack_word_offset(4, 1), 48);
    }
}
