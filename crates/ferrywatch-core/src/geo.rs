//! Great-circle distance on a spherical Earth.
//!
//! [`distance`] is the only source of "nearness" in the engine; every zone
//! membership decision goes through it.

use ferrywatch_types::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between `a` and `b`.
///
/// ```
/// use ferrywatch_core::geo::distance;
/// use ferrywatch_types::Coordinate;
///
/// let terminal = Coordinate::new(-27.496776, 153.019540);
/// assert_eq!(distance(terminal, terminal), 0.0);
/// ```
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_phi = (b.lat - a.lat).to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let h = (delta_phi / 2.0).sin() * (delta_phi / 2.0).sin()
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin() * (delta_lambda / 2.0).sin();
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}
