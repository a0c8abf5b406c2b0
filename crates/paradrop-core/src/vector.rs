//! Vector helpers for the simulation frame.
//!
//! Frame: x = East, y = North, z = Up (meters). The ground plane is (x, y).
//! Plain arithmetic (add, scale, length, distance) comes straight from glam;
//! this module only holds the frame-specific operations.

use glam::{DVec2, DVec3};

/// Project a 3D point onto the ground plane.
pub fn to_ground(p: DVec3) -> DVec2 {
    DVec2::new(p.x, p.y)
}

/// Lift a ground-plane point to the given altitude.
pub fn from_ground(p: DVec2, altitude: f64) -> DVec3 {
    DVec3::new(p.x, p.y, altitude)
}

/// Unit direction of `v`, or zero for a (near) zero vector.
pub fn direction(v: DVec3) -> DVec3 {
    v.normalize_or_zero()
}

/// Horizontal distance between two 3D points.
pub fn ground_distance(a: DVec3, b: DVec3) -> f64 {
    to_ground(a).distance(to_ground(b))
}

/// Straight-line dead reckoning: where `pos` will be after `dt` seconds at `vel`.
pub fn extrapolate(pos: DVec3, vel: DVec3, dt: f64) -> DVec3 {
    pos + vel * dt
}

/// Probe length used when asking the ballistic oracle for an impact point.
///
/// Two cadence periods of flight at the current speed, floored at
/// `min_speed` so a nearly stationary unit still probes a usable distance.
pub fn probe_distance(speed: f64, cadence: f64, min_speed: f64) -> f64 {
    2.0 * cadence * speed.max(min_speed)
}
