use std::collections::BTreeSet;

use crate::codec::AccountId;

/// Accounts touched since the last flush.
///
/// Kept sorted so every flush reads and writes accounts in the same order.
#[derive(Debug, Default)]
pub(crate) struct FlushWindow {
    pub(crate) touched: BTreeSet<AccountId>,
    pub(crate) blocks: u64,
}

impl FlushWindow {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    /// Drain the window, leaving it empty for the next blocks.
    pub(crate) fn take(&mut self) -> Vec<AccountId> {
        self.blocks = 0;
        std::mem::take(&mut self.touched).into_iter().collect()
    }
}
