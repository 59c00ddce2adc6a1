use std::path::Path;

use serde::{Deserialize, Serialize};

/// Latest values reported by the hardware. Every field is optional: a
/// freshly started bridge has seen nothing yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HardwareSnapshot {
    /// 0..=100 from the volume knob.
    #[serde(alias = "volume")]
    pub volume_percent: Option<u32>,
    /// Raw sensor line, e.g. `DHT:T:75F, H:40%`.
    #[serde(alias = "dht")]
    pub sensor_reading: Option<String>,
    /// Raw button token, e.g. `BTN:STOP`. Compared as a whole for edges.
    #[serde(alias = "button")]
    pub last_button_event: Option<String>,
}

impl HardwareSnapshot {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Writes through a sibling temp file so a polling reader never sees a
    /// half-written record.
    pub fn write_atomic(&self, path: &Path) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)
    }
}
