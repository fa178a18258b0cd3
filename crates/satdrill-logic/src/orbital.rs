//! Orbital parameter derivation from Keplerian elements.
//!
//! Maneuver checks work in altitudes above the surface, while telemetry
//! reports semi-major axis and eccentricity; these helpers convert.

use crate::constants::PLANET_RADIUS_KM;

/// Apoapsis altitude above the surface: a·(1+e) − R.
pub fn apoapsis_km(semi_major_axis_km: f64, eccentricity: f64) -> f64 {
    semi_major_axis_km * (1.0 + eccentricity) - PLANET_RADIUS_KM
}

/// Periapsis altitude above the surface: a·(1−e) − R.
pub fn periapsis_km(semi_major_axis_km: f64, eccentricity: f64) -> f64 {
    semi_major_axis_km * (1.0 - eccentricity) - PLANET_RADIUS_KM
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_orbit_equal_apsides() {
        let a = PLANET_RADIUS_KM + 550.0;
        assert!((apoapsis_km(a, 0.0) - 550.0).abs() < 1e-9);
        assert!((periapsis_km(a, 0.0) - 550.0).abs() < 1e-9);
    }

    #[test]
    fn eccentric_orbit_apsides_straddle_mean() {
        // a = 7000 km, e = 0.01: apsides 70 km either side of a − R.
        let apo = apoapsis_km(7000.0, 0.01);
        let peri = periapsis_km(7000.0, 0.01);
        assert!((apo - 699.0).abs() < 1e-9);
        assert!((peri - 559.0).abs() < 1e-9);
        assert!(apo > peri);
    }

    #[test]
    fn apoapsis_grows_with_eccentricity() {
        let lower = apoapsis_km(7000.0, 0.001);
        let higher = apoapsis_km(7000.0, 0.02);
        assert!(higher > lower);
    }
}
