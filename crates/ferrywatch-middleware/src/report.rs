//! Decoding of the field node's position packets.
//!
//! `GET /ferry` answers with a flat JSON object:
//!
//! ```json
//! {"status":200,"mmsi":503123456,"lat":-27.4967,"lon":153.0195}
//! ```
//!
//! A `status` of `404` means the node has no fresh fix and carries
//! placeholder coordinates, so it decodes to `Ok(None)`.

use ferrywatch_types::{Coordinate, FerryError, PositionReport, VehicleId};
use serde::Deserialize;

/// Status code the node uses for "no new fix".
pub const STATUS_NO_FIX: u16 = 404;

#[derive(Debug, Deserialize)]
struct FerryPacket {
    status: u16,
    #[serde(default)]
    mmsi: Option<u32>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Decode one packet body into a [`PositionReport`].
///
/// # Errors
///
/// Returns [`FerryError::MalformedReport`] when the body is not JSON or a
/// fix is announced without all of `mmsi`, `lat`, and `lon`.
///
/// # Example
///
/// ```
/// use ferrywatch_middleware::report::decode_packet;
/// use ferrywatch_types::VehicleId;
///
/// let report = decode_packet(r#"{"status":200,"mmsi":111,"lat":-27.5,"lon":153.05}"#)
///     .unwrap()
///     .unwrap();
/// assert_eq!(report.id, VehicleId(111));
///
/// assert!(decode_packet(r#"{"status":404,"lat":-1,"lon":-1}"#).unwrap().is_none());
/// ```
pub fn decode_packet(body: &str) -> Result<Option<PositionReport>, FerryError> {
    let packet: FerryPacket = serde_json::from_str(body)
        .map_err(|e| FerryError::MalformedReport(format!("invalid packet JSON: {e}")))?;

    if packet.status == STATUS_NO_FIX {
        return Ok(None);
    }

    match (packet.mmsi, packet.lat, packet.lon) {
        (Some(mmsi), Some(lat), Some(lon)) => Ok(Some(PositionReport {
            id: VehicleId(mmsi),
            coord: Coordinate::new(lat, lon),
        })),
        _ => Err(FerryError::MalformedReport(format!(
            "status {} packet is missing mmsi, lat or lon",
            packet.status
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_fix() {
        let report = decode_packet(
            r#"{"status":200,"mmsi":503123456,"lat":-27.496767459424884,"lon":153.01952753903188}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(report.id, VehicleId(503123456));
        assert!((report.coord.lat - -27.496767459424884).abs() < 1e-12);
        assert!((report.coord.lon - 153.01952753903188).abs() < 1e-12);
    }

    #[test]
    fn no_fix_status_is_none() {
        let report = decode_packet(r#"{"status":404,"lat":-1,"lon":-1}"#).unwrap();
        assert!(report.is_none());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let report = decode_packet(r#"{"status":200,"mmsi":1,"lat":0.0,"lon":0.0,"heading":345}"#)
            .unwrap();
        assert!(report.is_some());
    }

    #[test]
    fn missing_mmsi_is_malformed() {
        let err = decode_packet(r#"{"status":200,"lat":-27.5,"lon":153.0}"#).unwrap_err();
        assert!(matches!(err, FerryError::MalformedReport(_)));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = decode_packet("HTTP/1.1 502 Bad Gateway").unwrap_err();
        assert!(matches!(err, FerryError::MalformedReport(_)));
    }
}
