//! Property-based test generators using proptest.
//!
//! Provides strategies for fault metadata and fault sequences.

use fatalog_core::ResetInfo;
use proptest::prelude::*;

/// Strategy for arbitrary reset metadata.
pub fn reset_info_strategy() -> impl Strategy<Value = ResetInfo> {
    prop::array::uniform7(any::<u32>()).prop_map(ResetInfo::from_words)
}

/// Strategy for word-aligned stack base addresses in data RAM.
pub fn stack_base_strategy() -> impl Strategy<Value = u32> {
    (0x3FFE_8000u32..0x3FFF_C000).prop_map(|addr| addr & !3)
}

/// One generated fault.
#[derive(Debug, Clone)]
pub struct GeneratedFault {
    /// Time of the fault.
    pub millis: u32,
    /// Reset metadata.
    pub reset_info: ResetInfo,
    /// Address of the first stack word.
    pub stack_base: u32,
    /// Captured stack words.
    pub stack: Vec<u32>,
}

/// Strategy for one fault with up to `max_depth` stack words.
pub fn fault_strategy(max_depth: usize) -> impl Strategy<Value = GeneratedFault> {
    (
        any::<u32>(),
        reset_info_strategy(),
        stack_base_strategy(),
        prop::collection::vec(any::<u32>(), 0..=max_depth),
    )
        .prop_map(|(millis, reset_info, stack_base, stack)| GeneratedFault {
            millis,
            reset_info,
            stack_base,
            stack,
        })
}

/// Strategy for a sequence of faults.
pub fn fault_sequence_strategy(
    min_faults: usize,
    max_faults: usize,
    max_depth: usize,
) -> impl Strategy<Value = Vec<GeneratedFault>> {
    prop::collection::vec(fault_strategy(max_depth), min_faults..max_faults)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
