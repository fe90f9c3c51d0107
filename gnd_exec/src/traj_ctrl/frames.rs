//! # Frame transformations
//!
//! Computes the error between the aircraft and the active waypoint. The displacement to the
//! waypoint is first found in the local East-North-Up (ENU) tangent plane centred on the aircraft,
//! using the WGS84 ellipsoid, and the horizontal part is then rotated into the heading-aligned body
//! frame.
//!
//! Body frame conventions: positive `body_y` is forward along the current heading, positive
//! `body_x` is to the right.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

// Internal
use super::Waypoint;
use comms_if::eqpt::{AircraftState, GeoPosition};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// WGS84 semi-major axis in meters
pub const WGS84_A_M: f64 = 6_378_137.0;

/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The error between the aircraft and the active waypoint.
///
/// All position errors point from the aircraft to the waypoint, so a positive `altitude_m` means
/// the aircraft is below the waypoint.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize)]
pub struct ErrorVector {
    /// East component of the displacement to the waypoint
    pub east_m: f64,

    /// North component of the displacement to the waypoint
    pub north_m: f64,

    /// Up component of the displacement to the waypoint
    pub up_m: f64,

    /// Lateral error in the body frame, positive to the right
    pub body_x_m: f64,

    /// Longitudinal error in the body frame, positive forward
    pub body_y_m: f64,

    /// Altitude error, equal to `up_m`
    pub altitude_m: f64,

    /// Heading error, `target - current`. This is not wrapped, so crossing north produces errors
    /// of nearly a full turn.
    pub heading_deg: f64,

    /// Speed error against the velocity's x component. Diagnostic only.
    pub speed_x_ms: f64,

    /// Speed error against the velocity's y component. Diagnostic only.
    pub speed_y_ms: f64,

    /// Speed error against the velocity's z component. Diagnostic only.
    pub speed_z_ms: f64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the error between the aircraft state and the waypoint.
pub fn calc_error(waypoint: &Waypoint, state: &AircraftState) -> ErrorVector {
    let enu_m = geodetic_to_enu(&waypoint.position(), &state.position);

    // Horizontal displacement in polar form, bearing clockwise from north
    let dist_m = enu_m[0].hypot(enu_m[1]);
    let bearing_rad = enu_m[0].atan2(enu_m[1]);

    let (body_x_m, body_y_m) = rotate_to_body(dist_m, bearing_rad, state.heading);

    ErrorVector {
        east_m: enu_m[0],
        north_m: enu_m[1],
        up_m: enu_m[2],
        body_x_m,
        body_y_m,
        altitude_m: enu_m[2],
        heading_deg: waypoint.target_heading - state.heading,
        speed_x_ms: waypoint.target_speed - state.velocity.x,
        speed_y_ms: waypoint.target_speed - state.velocity.y,
        speed_z_ms: waypoint.target_speed - state.velocity.z,
    }
}

/// Rotate a horizontal displacement, given as distance and bearing from north, into the body
/// frame of an aircraft with the given heading in degrees.
///
/// Returns `(body_x, body_y)`.
pub fn rotate_to_body(dist_m: f64, bearing_rad: f64, heading_deg: f64) -> (f64, f64) {
    let angle_rad = bearing_rad + std::f64::consts::FRAC_PI_2 - heading_deg.to_radians();

    (-dist_m * angle_rad.cos(), dist_m * angle_rad.sin())
}

/// Convert a geodetic position into Earth-Centred Earth-Fixed coordinates in meters.
pub fn geodetic_to_ecef(pos: &GeoPosition) -> Vector3<f64> {
    let e2 = WGS84_F * (2.0 - WGS84_F);

    let lat_rad = pos.latitude.to_radians();
    let lon_rad = pos.longitude.to_radians();
    let (sin_lat, cos_lat) = lat_rad.sin_cos();
    let (sin_lon, cos_lon) = lon_rad.sin_cos();

    // Prime vertical radius of curvature
    let n_m = WGS84_A_M / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (n_m + pos.altitude) * cos_lat * cos_lon,
        (n_m + pos.altitude) * cos_lat * sin_lon,
        (n_m * (1.0 - e2) + pos.altitude) * sin_lat,
    )
}

/// Get the ENU displacement of `target` in the tangent plane centred on `reference`.
pub fn geodetic_to_enu(target: &GeoPosition, reference: &GeoPosition) -> Vector3<f64> {
    let delta_m = geodetic_to_ecef(target) - geodetic_to_ecef(reference);

    ecef_to_enu_rotation(reference) * delta_m
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Rotation from ECEF into the ENU frame at the given geodetic reference.
fn ecef_to_enu_rotation(reference: &GeoPosition) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = reference.latitude.to_radians().sin_cos();
    let (sin_lon, cos_lon) = reference.longitude.to_radians().sin_cos();

    Matrix3::new(
        -sin_lon, cos_lon, 0.0,
        -sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat,
        cos_lat * cos_lon, cos_lat * sin_lon, sin_lat,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::Velocity;

    const TOL: f64 = 1e-6;

    fn state_at(latitude: f64, longitude: f64, altitude: f64, heading: f64) -> AircraftState {
        AircraftState {
            position: GeoPosition { latitude, longitude, altitude },
            heading,
            velocity: Velocity::default(),
        }
    }

    #[test]
    fn test_coincident_waypoint() {
        let wp = Waypoint::new(51.1893, -4.41103, 50.0, 0.0, 0.0);

        let err = calc_error(&wp, &state_at(51.1893, -4.41103, 50.0, 0.0));

        assert_eq!(err.body_x_m, 0.0);
        assert_eq!(err.body_y_m, 0.0);
        assert_eq!(err.altitude_m, 0.0);
        assert_eq!(err.heading_deg, 0.0);
    }

    #[test]
    fn test_vertical_offset_only() {
        let wp = Waypoint::new(51.1893, -4.41103, 60.0, 0.0, 0.0);

        let err = calc_error(&wp, &state_at(51.1893, -4.41103, 50.0, 123.0));

        assert!((err.altitude_m - 10.0).abs() < TOL);
        assert!(err.body_x_m.abs() < TOL);
        assert!(err.body_y_m.abs() < TOL);
        assert_eq!(err.altitude_m, err.up_m);
    }

    #[test]
    fn test_body_axes() {
        // A waypoint ~11 m due north of the aircraft
        let wp = Waypoint::new(51.1894, -4.41103, 50.0, 0.0, 0.0);

        // Facing north the waypoint is straight ahead
        let err = calc_error(&wp, &state_at(51.1893, -4.41103, 50.0, 0.0));
        assert!(err.north_m > 11.0 && err.north_m < 11.2);
        assert!(err.east_m.abs() < 1e-3);
        assert!((err.body_y_m - err.north_m).abs() < 1e-3);
        assert!(err.body_x_m.abs() < 1e-3);

        // Facing east it is to the left
        let err = calc_error(&wp, &state_at(51.1893, -4.41103, 50.0, 90.0));
        assert!((err.body_x_m + err.north_m).abs() < 1e-3);
        assert!(err.body_y_m.abs() < 1e-3);

        // Facing west it is to the right
        let err = calc_error(&wp, &state_at(51.1893, -4.41103, 50.0, 270.0));
        assert!((err.body_x_m - err.north_m).abs() < 1e-3);
    }

    #[test]
    fn test_rotation_preserves_distance() {
        for heading in [0.0, 33.0, 90.0, 181.5, 359.0].iter() {
            let (x, y) = rotate_to_body(12.0, 0.7, *heading);
            assert!((x.hypot(y) - 12.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_heading_error_unwrapped() {
        let wp = Waypoint::new(51.1893, -4.41103, 50.0, 1.0, 0.0);
        let err = calc_error(&wp, &state_at(51.1893, -4.41103, 50.0, 359.0));
        assert_eq!(err.heading_deg, -358.0);

        let wp = Waypoint::new(51.1893, -4.41103, 50.0, 370.0, 0.0);
        let err = calc_error(&wp, &state_at(51.1893, -4.41103, 50.0, 0.0));
        assert_eq!(err.heading_deg, 370.0);

        // Exhaustive over whole degree headings
        for current in 0..360 {
            for target in (0..360).step_by(7) {
                let wp = Waypoint::new(51.0, -4.0, 0.0, target as f64, 0.0);
                let err = calc_error(&wp, &state_at(51.0, -4.0, 0.0, current as f64));
                assert_eq!(err.heading_deg, target as f64 - current as f64);
            }
        }
    }

    #[test]
    fn test_speed_errors() {
        let wp = Waypoint::new(51.0, -4.0, 0.0, 0.0, 2.0);
        let mut state = state_at(51.0, -4.0, 0.0, 0.0);
        state.velocity = Velocity { x: 1.0, y: -1.0, z: 0.5 };

        let err = calc_error(&wp, &state);

        assert_eq!((err.speed_x_ms, err.speed_y_ms, err.speed_z_ms), (1.0, 3.0, 1.5));
    }

    #[test]
    fn test_ecef_known_point() {
        // On the equator at the prime meridian the ECEF position is the semi-major axis
        let ecef = geodetic_to_ecef(&GeoPosition { latitude: 0.0, longitude: 0.0, altitude: 0.0 });
        assert!((ecef[0] - WGS84_A_M).abs() < TOL);
        assert!(ecef[1].abs() < TOL);
        assert!(ecef[2].abs() < TOL);

        // At the pole it is the semi-minor axis
        let ecef = geodetic_to_ecef(&GeoPosition { latitude: 90.0, longitude: 0.0, altitude: 0.0 });
        assert!((ecef[2] - WGS84_A_M * (1.0 - WGS84_F)).abs() < 1e-3);
    }
}
