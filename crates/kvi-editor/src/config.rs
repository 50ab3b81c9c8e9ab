//! Editor settings.
//!
//! There is one: the tab stop. It is fixed for the session and shared by
//! the renderer and the cursor model so both agree on where a byte lands.

/// Default number of cells a tab occupies.
pub const DEFAULT_TAB_STOP: usize = 4;

/// Settings the dispatcher reads on every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorConfig {
    tab_stop: usize,
}

impl EditorConfig {
    /// Settings with the given tab stop. A tab stop of 0 is raised to 1.
    #[must_use]
    pub fn with_tab_stop(tab_stop: usize) -> Self {
        Self {
            tab_stop: tab_stop.max(1),
        }
    }

    /// Cells per tab. Always at least 1.
    #[inline]
    #[must_use]
    pub const fn tab_stop(&self) -> usize {
        self.tab_stop
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            tab_stop: DEFAULT_TAB_STOP,
        }
    }
}
