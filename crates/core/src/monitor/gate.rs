//! Sticky notification latch.

/// Allows one notification per cause until explicitly rearmed.
///
/// Passage of time never clears the latch; only [`rearm`](Self::rearm) does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationGate {
    latched: bool,
}

impl NotificationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch the gate. Returns `true` only if it was open, i.e. the caller
    /// should emit its notification now.
    pub fn try_fire(&mut self) -> bool {
        !std::mem::replace(&mut self.latched, true)
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Open the gate again. Returns whether it had been latched.
    pub fn rearm(&mut self) -> bool {
        std::mem::replace(&mut self.latched, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_until_rearmed() {
        let mut gate = NotificationGate::new();

        assert!(gate.try_fire());
        assert!(!gate.try_fire());
        assert!(!gate.try_fire());
        assert!(gate.is_latched());

        assert!(gate.rearm());
        assert!(gate.try_fire());
    }

    #[test]
    fn rearm_on_open_gate_reports_false() {
        let mut gate = NotificationGate::new();
        assert!(!gate.rearm());
        assert!(!gate.is_latched());
    }
}
