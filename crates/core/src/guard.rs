//! Single-flight flags for operations that wait on a collaborator.

/// At most one operation of a kind may be outstanding at a time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    busy: bool,
}

impl InFlight {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the flag busy. Returns `false` (and changes nothing) when an
    /// operation is already outstanding.
    pub fn try_acquire(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    pub fn release(&mut self) {
        self.busy = false;
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }
}
