use std::fmt;

use tracing::{debug, warn};

use super::snapshot::HardwareSnapshot;

/// One recognised line from the microcontroller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HardwareLine {
    Volume(u32),
    /// The full line, `BTN:` prefix included.
    Button(String),
    /// The full line, `DHT:` prefix included.
    Sensor(String),
}

/// Pure function: raw serial line -> recognised message.
/// Unknown prefixes and unparseable volumes yield `None`.
pub fn parse_line(raw: &str) -> Option<HardwareLine> {
    let line = raw.trim();
    if let Some(rest) = line.strip_prefix("VOL:") {
        return match rest.trim().parse::<u32>() {
            Ok(v) => Some(HardwareLine::Volume(v.min(100))),
            Err(_) => {
                warn!("Unparseable volume line: {:?}", line);
                None
            }
        };
    }
    if line.starts_with("BTN:") {
        return Some(HardwareLine::Button(line.to_string()));
    }
    if line.starts_with("DHT:") {
        return Some(HardwareLine::Sensor(line.to_string()));
    }
    if !line.is_empty() {
        debug!("Ignoring hardware line: {:?}", line);
    }
    None
}

/// Folds serial lines into the latest snapshot.
#[derive(Debug, Default)]
pub struct LineDecoder {
    latest: HardwareSnapshot,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> &HardwareSnapshot {
        &self.latest
    }

    /// Returns the full updated snapshot after each recognised line.
    pub fn feed(&mut self, raw: &str) -> Option<HardwareSnapshot> {
        match parse_line(raw)? {
            HardwareLine::Volume(v) => self.latest.volume_percent = Some(v),
            HardwareLine::Button(token) => self.latest.last_button_event = Some(token),
            HardwareLine::Sensor(text) => self.latest.sensor_reading = Some(text),
        }
        Some(self.latest.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Temperature {
    pub value: f32,
    /// 'F' or 'C'.
    pub unit: char,
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = if self.unit == 'C' { "Celsius" } else { "Fahrenheit" };
        write!(f, "{} degrees {}", self.value, unit)
    }
}

/// Parsed `DHT:T:75F, H:40%` reading. Either half may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    pub temperature: Option<Temperature>,
    pub humidity: Option<f32>,
}

impl SensorReading {
    pub fn parse(text: &str) -> Self {
        let body = text.trim();
        let body = body.strip_prefix("DHT:").unwrap_or(body);
        let mut reading = SensorReading::default();

        for field in body.split(',') {
            let Some((key, value)) = field.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim().to_ascii_uppercase().as_str() {
                "T" => reading.temperature = parse_temperature(value),
                "H" => {
                    reading.humidity = value.trim_end_matches('%').trim().parse().ok();
                }
                _ => {}
            }
        }
        reading
    }

    pub fn spoken_temperature(&self) -> Option<String> {
        self.temperature
            .map(|t| format!("The current temperature is {}.", t))
    }

    pub fn spoken_humidity(&self) -> Option<String> {
        self.humidity
            .map(|h| format!("The current humidity is {} percent.", h))
    }
}

fn parse_temperature(value: &str) -> Option<Temperature> {
    let unit = value
        .chars()
        .last()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase());
    let number = match unit {
        Some(_) => &value[..value.len() - 1],
        None => value,
    };
    let value = number.trim().parse::<f32>().ok()?;
    Some(Temperature {
        value,
        unit: match unit {
            Some('C') => 'C',
            _ => 'F',
        },
    })
}
