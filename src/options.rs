//! Reader configuration.

/// Options controlling how a package is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Maximum number of parts the graph walk may discover.
    ///
    /// `None` places no limit. Reading a package that reaches more parts
    /// fails with [`Error::LimitExceeded`](crate::Error::LimitExceeded).
    pub max_parts: Option<usize>,
}

impl ReadOptions {
    /// Create options with no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the number of parts discovered.
    pub fn with_max_parts(mut self, max_parts: usize) -> Self {
        self.max_parts = Some(max_parts);
        self
    }
}
