use buswatch_shared::{BuzzerState, TelemetryRecord};
use rand::{Rng, RngExt};

// Ranges mirror the bus sensor sketch: a DHT11 for humidity/temperature,
// an ultrasonic ranger at the door, an IR passenger counter, and a GPS
// puck that loses signal in depots.

/// Random-walk record generator.
pub struct Feed {
    humidity: f64,
    temp_c: f64,
    passengers: i32,
    distance: f64,
    latitude: f64,
    longitude: f64,
}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}

impl Feed {
    pub fn new() -> Self {
        // Start mid-route in Kandy, the reference installation.
        Self {
            humidity: 62.0,
            temp_c: 28.5,
            passengers: 24,
            distance: 120.0,
            latitude: 7.259723,
            longitude: 80.599636,
        }
    }

    pub fn next_record(&mut self) -> TelemetryRecord {
        let mut rng = rand::rng();

        self.humidity = (self.humidity + rng.random_range(-1.5..1.5)).clamp(30.0, 90.0);
        self.temp_c = (self.temp_c + rng.random_range(-0.3..0.3)).clamp(18.0, 38.0);
        self.passengers = (self.passengers + rng.random_range(-2..3)).clamp(0, 60);
        self.distance = (self.distance + rng.random_range(-25.0..25.0)).clamp(2.0, 400.0);
        self.latitude += rng.random_range(-0.0004..0.0004);
        self.longitude += rng.random_range(-0.0004..0.0004);

        // One dropout gate per physical sensor, so fields from the same
        // part appear and disappear together.
        let dht_ok = reports(&mut rng, 95);
        let ranger_ok = reports(&mut rng, 95);
        let counter_ok = reports(&mut rng, 97);
        let gps_ok = reports(&mut rng, 80);

        let buzzer = if self.distance < 10.0 {
            BuzzerState::On
        } else {
            BuzzerState::Off
        };

        TelemetryRecord {
            humidity: dht_ok.then_some(self.humidity),
            temp_c: dht_ok.then_some(self.temp_c),
            temp_f: dht_ok.then_some(self.temp_c * 9.0 / 5.0 + 32.0),
            passengers: counter_ok.then_some(self.passengers as u32),
            distance: ranger_ok.then_some(self.distance),
            buzzer: ranger_ok.then_some(buzzer),
            latitude: gps_ok.then_some(self.latitude),
            longitude: gps_ok.then_some(self.longitude),
        }
    }
}

fn reports(rng: &mut impl Rng, pct: u32) -> bool {
    rng.random_range(0..100) < pct
}
