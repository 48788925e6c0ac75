//! Seams to the platform: time source and stack memory.

use std::time::Instant;

/// Millisecond time source used to stamp records.
///
/// Called from the fault path, so implementations must not block.
pub trait Clock: Send {
    /// Milliseconds since boot, wrapping at `u32::MAX`.
    fn millis(&self) -> u32;
}

/// Host clock counting from its creation.
#[derive(Debug, Clone, Copy)]
pub struct UptimeClock {
    started: Instant,
}

impl UptimeClock {
    /// Starts counting now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for UptimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for UptimeClock {
    fn millis(&self) -> u32 {
        // Truncation is the wraparound of a 32-bit millisecond counter.
        self.started.elapsed().as_millis() as u32
    }
}

/// Read access to the memory holding the faulting stack.
///
/// On target this reads RAM directly; on the host it reads a captured
/// image. Returning `None` ends the capture at that address.
pub trait StackMemory {
    /// Reads the word at `addr`.
    fn read_word(&self, addr: u32) -> Option<u32>;
}

/// Stack words captured starting at a base address.
#[derive(Debug, Clone, Copy)]
pub struct StackSnapshot<'a> {
    base: u32,
    words: &'a [u32],
}

impl<'a> StackSnapshot<'a> {
    /// Wraps `words`, the first of which lives at `base`.
    #[must_use]
    pub const fn new(base: u32, words: &'a [u32]) -> Self {
        Self { base, words }
    }

    /// Address of the first word.
    #[must_use]
    pub const fn base(&self) -> u32 {
        self.base
    }

    /// One past the address of the last word.
    #[must_use]
    pub fn end(&self) -> u32 {
        self.base
            .wrapping_add(u32::try_from(self.words.len() * 4).unwrap_or(u32::MAX))
    }
}

impl StackMemory for StackSnapshot<'_> {
    fn read_word(&self, addr: u32) -> Option<u32> {
        let delta = addr.checked_sub(self.base)?;
        if delta % 4 != 0 {
            return None;
        }
        self.words.get((delta / 4) as usize).copied()
    }
}
