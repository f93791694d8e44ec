//! TEME to Earth-fixed rotation and WGS-84 geodetic coordinates.

use serde::Serialize;

use crate::core::orbit::PropagatedState;
use crate::core::time::{gstime, JulianDate};

const WGS84_A_KM: f64 = 6378.137;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// Geodetic sub-point of a satellite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geodetic {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// Rotates a TEME vector into the pseudo Earth-fixed frame (polar motion ignored).
pub fn teme_to_ecef(position: &[f64; 3], gmst_rad: f64) -> [f64; 3] {
    let (sin_t, cos_t) = gmst_rad.sin_cos();
    [
        cos_t * position[0] + sin_t * position[1],
        -sin_t * position[0] + cos_t * position[1],
        position[2],
    ]
}

/// Bowring's single-iteration latitude, good to millimetres for orbits near Earth.
pub fn ecef_to_geodetic(ecef: &[f64; 3]) -> Geodetic {
    let [x, y, z] = *ecef;
    let a = WGS84_A_KM;
    let b = a * (1.0 - WGS84_F);
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let ep2 = (a * a - b * b) / (b * b);

    let p = (x * x + y * y).sqrt();
    let th = (a * z).atan2(b * p);
    let (sin_th, cos_th) = th.sin_cos();
    let lat = (z + ep2 * b * sin_th.powi(3)).atan2(p - e2 * a * cos_th.powi(3));
    let lon = y.atan2(x);

    let (sin_lat, cos_lat) = lat.sin_cos();
    let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let altitude_km = p * cos_lat + (z + e2 * n * sin_lat) * sin_lat - n;

    Geodetic { latitude_deg: lat.to_degrees(), longitude_deg: lon.to_degrees(), altitude_km }
}

/// Sub-point of a propagated state evaluated at `at`.
pub fn subpoint(state: &PropagatedState, at: JulianDate) -> Geodetic {
    let ecef = teme_to_ecef(&state.position, gstime(at.total()));
    ecef_to_geodetic(&ecef)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn rotation_by_sidereal_angle() {
        let v = [7000.0, 0.0, 100.0];
        assert_eq!(teme_to_ecef(&v, 0.0), v);

        let r = teme_to_ecef(&v, FRAC_PI_2);
        assert!(r[0].abs() < 1e-9);
        assert!((r[1] + 7000.0).abs() < 1e-9);
        assert_eq!(r[2], 100.0);
    }

    #[test]
    fn equator_and_pole() {
        let g = ecef_to_geodetic(&[WGS84_A_KM + 400.0, 0.0, 0.0]);
        assert_eq!(g.latitude_deg, 0.0);
        assert_eq!(g.longitude_deg, 0.0);
        assert!((g.altitude_km - 400.0).abs() < 1e-9);

        let b = WGS84_A_KM * (1.0 - WGS84_F);
        let g = ecef_to_geodetic(&[0.0, 0.0, b + 100.0]);
        assert!((g.latitude_deg - 90.0).abs() < 1e-9);
        assert!((g.altitude_km - 100.0).abs() < 1e-6);
    }

    #[test]
    fn longitude_sign_follows_y() {
        let g = ecef_to_geodetic(&[0.0, -(WGS84_A_KM + 500.0), 0.0]);
        assert!((g.longitude_deg + 90.0).abs() < 1e-9);
        assert!((g.altitude_km - 500.0).abs() < 1e-6);
    }

    #[test]
    fn subpoint_altitude_tracks_radius() {
        let at = JulianDate::from_calendar(2024, 1, 1, 0, 0, 0.0);
        let state =
            PropagatedState { position: [0.0, 0.0, 7000.0], velocity: [7.5, 0.0, 0.0], minutes_since_epoch: 0.0 };
        let g = subpoint(&state, at);
        assert!((g.latitude_deg - 90.0).abs() < 1e-9);
        assert!((g.altitude_km - (7000.0 - WGS84_A_KM * (1.0 - WGS84_F))).abs() < 1e-6);
    }
}
