pub mod config;
pub mod form;
pub mod present;

use ontime_insight::ShipmentRecord;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Reads one JSON shipment record from a file, or from stdin for `-`
pub fn read_record(path: &Path) -> Result<ShipmentRecord, String> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read from stdin: {e}"))?;
        buf
    } else {
        fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {e}", path.display()))?
    };
    parse_record(&text)
}

pub fn parse_record(text: &str) -> Result<ShipmentRecord, String> {
    serde_json::from_str(text).map_err(|e| format!("invalid shipment record: {e}"))
}
