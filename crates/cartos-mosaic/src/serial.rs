//! Cube serial numbers
//!
//! A serial number names the observation a cube came from, built from its
//! `Instrument` group as `SpacecraftName/InstrumentId/StartTime`. Cubes
//! without those keywords are named by their file name.

use cartos_core::Label;

/// Serial number of a cube label, or `fallback` when the label lacks the
/// instrument keywords.
pub fn compose(label: &Label, fallback: &str) -> String {
    let Some(instrument) = label.find_group("Instrument") else {
        return fallback.to_string();
    };
    let parts: Option<Vec<String>> = ["SpacecraftName", "InstrumentId", "StartTime"]
        .iter()
        .map(|name| {
            instrument
                .find_keyword(name)
                .map(|k| k.text().trim().to_string())
                .filter(|v| !v.is_empty())
        })
        .collect();
    match parts {
        Some(parts) => parts.join("/"),
        None => fallback.to_string(),
    }
}
