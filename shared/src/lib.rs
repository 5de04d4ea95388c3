use serde::{Deserialize, Serialize};

/// One snapshot from the bus sensor board, as pushed over the wire.
///
/// Every field is optional: a sensor that did not report this tick is
/// `None`, which is not the same thing as zero. Consumers must render
/// absence as a placeholder, never coerce it to a default value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub humidity: Option<f64>,
    pub temp_c: Option<f64>,
    pub temp_f: Option<f64>,
    pub passengers: Option<u32>,
    pub distance: Option<f64>, // ultrasonic range, cm
    pub buzzer: Option<BuzzerState>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TelemetryRecord {
    /// Both coordinates or nothing; a lone latitude is useless to a map.
    pub fn gps(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Buzzer state, serialized as the firmware's literal "ON"/"OFF" strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BuzzerState {
    On,
    Off,
}

impl BuzzerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuzzerState::On => "ON",
            BuzzerState::Off => "OFF",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_record_keeps_missing_fields_absent() {
        let rec: TelemetryRecord = serde_json::from_str(r#"{"humidity": 55}"#).unwrap();
        assert_eq!(rec.humidity, Some(55.0));
        assert_eq!(rec.temp_c, None);
        assert_eq!(rec.latitude, None);
        assert_eq!(rec.longitude, None);
        assert_eq!(rec.gps(), None);
    }

    #[test]
    fn null_fields_decode_as_absent() {
        let rec: TelemetryRecord =
            serde_json::from_str(r#"{"humidity": null, "passengers": 12}"#).unwrap();
        assert_eq!(rec.humidity, None);
        assert_eq!(rec.passengers, Some(12));
    }

    #[test]
    fn buzzer_uses_firmware_casing() {
        let rec: TelemetryRecord = serde_json::from_str(r#"{"buzzer": "ON"}"#).unwrap();
        assert_eq!(rec.buzzer, Some(BuzzerState::On));
        assert_eq!(serde_json::to_string(&BuzzerState::Off).unwrap(), r#""OFF""#);
    }

    #[test]
    fn gps_requires_both_coordinates() {
        let rec: TelemetryRecord = serde_json::from_str(r#"{"latitude": 7.2597}"#).unwrap();
        assert_eq!(rec.gps(), None);

        let rec: TelemetryRecord =
            serde_json::from_str(r#"{"latitude": 7.2597, "longitude": 80.5996}"#).unwrap();
        assert_eq!(rec.gps(), Some((7.2597, 80.5996)));
    }

    #[test]
    fn wrong_field_type_is_rejected() {
        assert!(serde_json::from_str::<TelemetryRecord>(r#"{"passengers": "many"}"#).is_err());
    }
}
