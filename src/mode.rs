use std::sync::atomic::{AtomicBool, Ordering};

use log::info;

/// Simulation/production switch, plus the scan state that depends on it
#[derive(Debug)]
pub struct ModeController {
    simulation: AtomicBool,
    has_scanned: AtomicBool,
}

impl ModeController {
    pub fn new(simulation: bool) -> Self {
        Self {
            simulation: AtomicBool::new(simulation),
            has_scanned: AtomicBool::new(false),
        }
    }

    pub fn is_simulation(&self) -> bool {
        self.simulation.load(Ordering::SeqCst)
    }

    /// Switch modes, forgetting whether the user scanned for devices
    ///
    /// An open connection is left alone; disconnecting first is up to the caller.
    pub fn set_simulation(&self, enabled: bool) {
        let previous = self.simulation.swap(enabled, Ordering::SeqCst);
        self.has_scanned.store(false, Ordering::SeqCst);
        if previous != enabled {
            info!(
                "Switched to {} mode",
                if enabled { "simulation" } else { "production" }
            );
        }
    }

    /// Whether an explicit device scan happened since the last mode switch
    pub fn has_scanned(&self) -> bool {
        self.has_scanned.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_scanned(&self) {
        self.has_scanned.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switching_modes_resets_has_scanned() {
        let mode = ModeController::new(true);
        mode.mark_scanned();
        assert!(mode.has_scanned());

        mode.set_simulation(false);
        assert!(!mode.is_simulation());
        assert!(!mode.has_scanned());

        mode.mark_scanned();
        mode.set_simulation(true);
        assert!(mode.is_simulation());
        assert!(!mode.has_scanned());
    }

    #[test]
    fn setting_the_same_mode_still_resets() {
        let mode = ModeController::new(false);
        mode.mark_scanned();
        mode.set_simulation(false);
        assert!(!mode.has_scanned());
    }
}
