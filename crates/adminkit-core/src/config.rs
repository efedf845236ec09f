// ── Runtime admin configuration ──
//
// Describes how an `Admin` executes mutations. Never touches disk: the
// CLI (or any host) builds an `AdminConfig` and hands it in.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// When a mutation reaches the provider, and when the user sees it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MutationMode {
    /// Wait for the provider before touching local state.
    #[default]
    Pessimistic,
    /// Apply locally at once; roll back if the provider fails.
    Optimistic,
    /// Hold the provider call behind an undo window.
    Undoable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    pub mutation_mode: MutationMode,
    /// Undo grace window. `None` leaves `UNDO`/`COMPLETE` entirely to the
    /// host; `Some` makes the runtime dispatch `COMPLETE` on expiry.
    pub undo_timeout: Option<Duration>,
    /// Show undoable mutations locally while they wait. When `false` the
    /// store is untouched until the mutation is committed.
    pub undoable_optimistic: bool,
    pub default_per_page: u32,
    /// Capacity of the action and effect broadcast channels.
    pub channel_capacity: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            mutation_mode: MutationMode::Pessimistic,
            undo_timeout: None,
            undoable_optimistic: true,
            default_per_page: 25,
            channel_capacity: 256,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mutation_mode_parses_case_insensitively() {
        assert_eq!("Undoable".parse::<MutationMode>().unwrap(), MutationMode::Undoable);
        assert_eq!(MutationMode::Optimistic.to_string(), "optimistic");
        assert!("eager".parse::<MutationMode>().is_err());
    }

    #[test]
    fn defaults_leave_undo_timing_external() {
        let config = AdminConfig::default();
        assert_eq!(config.mutation_mode, MutationMode::Pessimistic);
        assert_eq!(config.undo_timeout, None);
        assert!(config.undoable_optimistic);
    }
}
