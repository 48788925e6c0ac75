//! Fault metadata types.

use std::fmt;

/// Reset and exception metadata delivered by the platform fault hook.
///
/// Field names follow the Xtensa exception registers the platform
/// reports: `epc1..epc3` are the exception program counters per
/// interrupt level, `excvaddr` the faulting virtual address and `depc`
/// the double-exception program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetInfo {
    /// Reason of the restart (see [`ResetReason`]).
    pub reason: u32,
    /// Exception cause code.
    pub exccause: u32,
    /// Level-1 exception program counter.
    pub epc1: u32,
    /// Level-2 exception program counter.
    pub epc2: u32,
    /// Level-3 exception program counter.
    pub epc3: u32,
    /// Faulting virtual address.
    pub excvaddr: u32,
    /// Double exception program counter.
    pub depc: u32,
}

impl ResetInfo {
    /// Number of 32-bit fields in the on-media block.
    pub const FIELDS: usize = 7;

    /// Encoded size in bytes.
    pub const SIZE: usize = Self::FIELDS * 4;

    /// Returns the fields in on-media order.
    #[must_use]
    pub const fn to_words(&self) -> [u32; Self::FIELDS] {
        [
            self.reason,
            self.exccause,
            self.epc1,
            self.epc2,
            self.epc3,
            self.excvaddr,
            self.depc,
        ]
    }

    /// Builds the block from fields in on-media order.
    #[must_use]
    pub const fn from_words(words: [u32; Self::FIELDS]) -> Self {
        Self {
            reason: words[0],
            exccause: words[1],
            epc1: words[2],
            epc2: words[3],
            epc3: words[4],
            excvaddr: words[5],
            depc: words[6],
        }
    }

    /// Decodes the reset reason, if it is a known code.
    #[must_use]
    pub fn reset_reason(&self) -> Option<ResetReason> {
        ResetReason::from_code(self.reason)
    }
}

/// Known restart reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ResetReason {
    /// Normal power-on.
    PowerOn = 0,
    /// Hardware watchdog reset.
    HardwareWatchdog = 1,
    /// Fatal exception.
    Exception = 2,
    /// Software watchdog reset.
    SoftwareWatchdog = 3,
    /// Software requested restart.
    SoftwareRestart = 4,
    /// Wake from deep sleep.
    DeepSleepWake = 5,
    /// External reset pin.
    External = 6,
}

impl ResetReason {
    /// Converts a raw code to a reason.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::PowerOn),
            1 => Some(Self::HardwareWatchdog),
            2 => Some(Self::Exception),
            3 => Some(Self::SoftwareWatchdog),
            4 => Some(Self::SoftwareRestart),
            5 => Some(Self::DeepSleepWake),
            6 => Some(Self::External),
            _ => None,
        }
    }

    /// Returns the raw code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Short lowercase label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::PowerOn => "power on",
            Self::HardwareWatchdog => "hardware watchdog",
            Self::Exception => "exception",
            Self::SoftwareWatchdog => "software watchdog",
            Self::SoftwareRestart => "software restart",
            Self::DeepSleepWake => "deep sleep wake",
            Self::External => "external reset",
        }
    }
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
