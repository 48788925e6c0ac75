//! Store configuration.

use crate::window::Window;

/// Default number of stack words the store keeps room for after every
/// record. Once less room remains the store is marked full.
pub const DEFAULT_MIN_STACK_DEPTH: u16 = 5;

/// Configuration for opening a crash store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Region of the medium owned by the store.
    pub window: Window,

    /// Minimum stack depth a future record must be able to hold.
    pub min_stack_depth: u16,

    /// Upper bound on stack words copied per fault (`None` = window capacity).
    ///
    /// Copying happens while the hardware watchdog is running; a cap keeps
    /// the fault path short on deep stacks.
    pub max_stack_words: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: Window::new(0, 512),
            min_stack_depth: DEFAULT_MIN_STACK_DEPTH,
            max_stack_words: None,
        }
    }
}

impl Config {
    /// Creates a configuration for the given window with default limits.
    #[must_use]
    pub fn new(offset: u16, size: u16) -> Self {
        Self {
            window: Window::new(offset, size),
            ..Self::default()
        }
    }

    /// Sets the window.
    #[must_use]
    pub const fn window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Sets the minimum stack depth reserved for a future record.
    #[must_use]
    pub const fn min_stack_depth(mut self, words: u16) -> Self {
        self.min_stack_depth = words;
        self
    }

    /// Caps the number of stack words copied per fault.
    #[must_use]
    pub const fn max_stack_words(mut self, words: u16) -> Self {
        self.max_stack_words = Some(words);
        self
    }
}
