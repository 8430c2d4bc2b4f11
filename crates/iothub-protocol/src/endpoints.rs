//! Hub endpoint paths.

/// Sensor collection endpoint (registration target).
pub const SENSORS: &str = "/api/sensors";

/// Actor collection endpoint (registration target).
pub const ACTORS: &str = "/api/actors";

/// Registration-liveness probe path.
///
/// The trailing slash matches the hub route; only transport success is
/// interpreted, the body is not.
pub const SENSORS_PROBE: &str = "/api/sensors/";

/// Data sub-resource for one sensor.
pub fn sensor_data(id: &str) -> String {
    format!("{}/{}/data", SENSORS, id)
}
