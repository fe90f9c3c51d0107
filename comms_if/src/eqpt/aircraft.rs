//! # Aircraft Equipment Communications Module
//!
//! The aircraft's remote controller reports a fused state estimate and accepts four channel stick
//! commands. This module defines both, along with their wire representations.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Absolute legal range of each stick channel accepted by the remote controller.
pub const STICK_LIMIT: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A geodetic position on the WGS84 ellipsoid.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Ellipsoidal altitude in meters
    pub altitude: f64,
}

/// Velocity of the aircraft in meters/second, in the frame the remote controller delivers it in.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A snapshot of the aircraft's estimated state, as returned by the `allStates` endpoint.
///
/// Any additional fields reported by the remote controller (attitude, gimbal attitude, ...) are
/// ignored.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftState {
    /// Current geodetic position
    #[serde(rename = "location")]
    pub position: GeoPosition,

    /// Heading in degrees, clockwise from north, in `[0, 360)`
    pub heading: f64,

    /// Current velocity
    #[serde(rename = "speed")]
    pub velocity: Velocity,
}

/// A four channel stick command.
///
/// Channels are dimensionless deflections. The remote controller accepts values in
/// `[-STICK_LIMIT, STICK_LIMIT]`, the trajectory controller saturates well inside that.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct StickCmd {
    /// Left stick, horizontal axis (yaw)
    pub left_x: f64,

    /// Left stick, vertical axis (throttle)
    pub left_y: f64,

    /// Right stick, horizontal axis (roll)
    pub right_x: f64,

    /// Right stick, vertical axis (pitch)
    pub right_y: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AircraftState {
    /// Parse the body of an `allStates` response.
    ///
    /// The remote controller normally answers with JSON, but some versions answer with a Python
    /// literal dictionary (single quoted keys, `True`/`False`/`None`), so if the JSON parse fails
    /// the body is normalised and parsed again. The error of the first attempt is returned if
    /// neither succeeds.
    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str(body) {
            Ok(s) => Ok(s),
            Err(e) => serde_json::from_str(&normalise_py_literal(body)).map_err(|_| e),
        }
    }
}

impl StickCmd {
    /// Build a new command from the four channels.
    pub fn new(left_x: f64, left_y: f64, right_x: f64, right_y: f64) -> Self {
        Self {
            left_x,
            left_y,
            right_x,
            right_y,
        }
    }

    /// The neutral command, all sticks centred.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Return the channels in wire order.
    pub fn channels(&self) -> [f64; 4] {
        [self.left_x, self.left_y, self.right_x, self.right_y]
    }

    /// Build a command from channels in wire order.
    pub fn from_channels(c: [f64; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }

    /// Apply a function to each channel.
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        let mut c = self.channels();
        for v in c.iter_mut() {
            *v = f(*v);
        }
        Self::from_channels(c)
    }

    /// True if all channels are finite.
    pub fn is_finite(&self) -> bool {
        self.channels().iter().all(|c| c.is_finite())
    }

    /// True if all channels are exactly zero.
    pub fn is_neutral(&self) -> bool {
        self.channels().iter().all(|c| *c == 0.0)
    }

    /// Format the command as the body expected by the stick endpoint.
    ///
    /// The body is `"<leftX>,<leftY>,<rightX>,<rightY>"`, with each channel clamped to the legal
    /// range and written to four decimal places.
    pub fn to_body(&self) -> String {
        let c = self.map(|v| v.max(-STICK_LIMIT).min(STICK_LIMIT));
        format!(
            "{:.4},{:.4},{:.4},{:.4}",
            c.left_x, c.left_y, c.right_x, c.right_y
        )
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a Python literal dictionary into JSON.
///
/// Single quoted strings become double quoted, and the bare `True`, `False` and `None` tokens
/// become their JSON equivalents. Quotes inside strings are escaped as needed.
fn normalise_py_literal(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    // The quote character of the string currently being copied, if any
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => match c {
                '\\' => {
                    // Keep escapes, except an escaped single quote which needs no escape in JSON
                    match chars.next() {
                        Some('\'') => out.push('\''),
                        Some(n) => {
                            out.push('\\');
                            out.push(n);
                        }
                        None => out.push('\\'),
                    }
                }
                '"' if q == '\'' => out.push_str("\\\""),
                c if c == q => {
                    out.push('"');
                    quote = None;
                }
                c => out.push(c),
            },
            None => match c {
                '\'' | '"' => {
                    out.push('"');
                    quote = Some(c);
                }
                c if c.is_ascii_alphabetic() => {
                    let mut word = String::new();
                    word.push(c);
                    while let Some(n) = chars.peek() {
                        if n.is_ascii_alphanumeric() || *n == '_' {
                            word.push(*n);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    out.push_str(match word.as_str() {
                        "True" => "true",
                        "False" => "false",
                        "None" => "null",
                        w => w,
                    });
                }
                c => out.push(c),
            },
        }
    }

    out
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const JSON_BODY: &str = r#"{
        "location": {"latitude": 51.1893, "longitude": -4.41103, "altitude": 50.0},
        "heading": 12.5,
        "speed": {"x": 0.1, "y": -0.2, "z": 0.0},
        "attitude": {"pitch": 0.0, "roll": 0.0, "yaw": 12.5},
        "isFlying": true
    }"#;

    const PY_BODY: &str = "{'location': {'latitude': 51.1893, 'longitude': -4.41103, \
        'altitude': 50.0}, 'heading': 12.5, 'speed': {'x': 0.1, 'y': -0.2, 'z': 0.0}, \
        'isFlying': True, 'gimbalAttitude': None, 'name': 'it\\'s \"here\"'}";

    fn expected_state() -> AircraftState {
        AircraftState {
            position: GeoPosition {
                latitude: 51.1893,
                longitude: -4.41103,
                altitude: 50.0,
            },
            heading: 12.5,
            velocity: Velocity {
                x: 0.1,
                y: -0.2,
                z: 0.0,
            },
        }
    }

    #[test]
    fn test_parse_json_state() {
        assert_eq!(AircraftState::from_body(JSON_BODY).unwrap(), expected_state());
    }

    #[test]
    fn test_parse_py_literal_state() {
        assert_eq!(AircraftState::from_body(PY_BODY).unwrap(), expected_state());
    }

    #[test]
    fn test_parse_missing_field() {
        let body = r#"{"location": {"latitude": 51.0, "longitude": -4.0}, "heading": 0.0,
            "speed": {"x": 0.0, "y": 0.0, "z": 0.0}}"#;
        assert!(AircraftState::from_body(body).is_err());
        assert!(AircraftState::from_body("not a state").is_err());
    }

    #[test]
    fn test_stick_body() {
        assert_eq!(StickCmd::neutral().to_body(), "0.0000,0.0000,0.0000,0.0000");
        assert_eq!(
            StickCmd::new(0.15, -0.3, 0.123456, 2.0).to_body(),
            "0.1500,-0.3000,0.1235,1.0000"
        );
        assert_eq!(StickCmd::new(-7.0, 0.0, 0.0, 0.0).to_body(), "-1.0000,0.0000,0.0000,0.0000");
    }

    #[test]
    fn test_stick_predicates() {
        assert!(StickCmd::neutral().is_neutral());
        assert!(!StickCmd::new(0.0, 0.0, 0.1, 0.0).is_neutral());
        assert!(!StickCmd::new(f64::NAN, 0.0, 0.0, 0.0).is_finite());
        assert_eq!(
            StickCmd::new(1.0, 2.0, 3.0, 4.0).map(|v| -v),
            StickCmd::new(-1.0, -2.0, -3.0, -4.0)
        );
    }
}
