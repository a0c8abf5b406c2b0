//! Tracking constants and default tuning parameters.

// --- Tracker cadence ---

/// Default interval between tracker samples (seconds).
pub const DEFAULT_CADENCE_SECS: f64 = 1.0;

/// Speed floor used when sizing the impact probe (m/s).
pub const DEFAULT_MIN_PROBE_SPEED: f64 = 1.0;

/// Below this speed a unit is treated as stationary for ETA purposes (m/s).
pub const STATIONARY_SPEED: f64 = 1e-6;

// --- Naming ---

/// Prefix for committed formation names.
pub const DEFAULT_FORMATION_PREFIX: &str = "Airdrop";

/// Weapon type string the host reports for a released paratrooper.
pub const DEFAULT_MUNITION_TYPE: &str = "parachutist";

/// Unit type spawned for each landed paratrooper.
pub const DEFAULT_UNIT_TYPE: &str = "Paratrooper";

/// Static object type standing in for a landed paratrooper until the burst completes.
pub const DEFAULT_PLACEHOLDER_TYPE: &str = "Paratrooper";

/// First generation number used for a launcher's formations.
pub const FIRST_GENERATION: u32 = 1;

// --- Landing sites ---

/// Horizontal offset used when sampling terrain for slope (meters).
pub const SLOPE_SAMPLE_OFFSET: f64 = 2.0;
