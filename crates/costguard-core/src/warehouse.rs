//! Warehouse size tiers and the fixed credit-per-hour table.
//!
//! Consumption billing prices a warehouse by size tier; each tier doubles the
//! hourly credit burn of the one below it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WarehouseSize {
    XSmall,
    Small,
    Medium,
    Large,
    XLarge,
    XxLarge,
    XxxLarge,
    XxxxLarge,
}

impl WarehouseSize {
    /// Credits burned per hour while this size is running.
    pub fn credits_per_hour(self) -> f64 {
        match self {
            WarehouseSize::XSmall => 1.0,
            WarehouseSize::Small => 2.0,
            WarehouseSize::Medium => 4.0,
            WarehouseSize::Large => 8.0,
            WarehouseSize::XLarge => 16.0,
            WarehouseSize::XxLarge => 32.0,
            WarehouseSize::XxxLarge => 64.0,
            WarehouseSize::XxxxLarge => 128.0,
        }
    }

    /// Canonical label, as warehouse metadata reports it.
    pub fn label(self) -> &'static str {
        match self {
            WarehouseSize::XSmall => "X-SMALL",
            WarehouseSize::Small => "SMALL",
            WarehouseSize::Medium => "MEDIUM",
            WarehouseSize::Large => "LARGE",
            WarehouseSize::XLarge => "X-LARGE",
            WarehouseSize::XxLarge => "2X-LARGE",
            WarehouseSize::XxxLarge => "3X-LARGE",
            WarehouseSize::XxxxLarge => "4X-LARGE",
        }
    }

    /// Parse a size label. Case-insensitive; hyphens, underscores and spaces
    /// are cosmetic, and the `XX…` spellings alias the `2X…` ones.
    pub fn parse(text: &str) -> Option<Self> {
        let folded: String = text
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_uppercase();
        match folded.as_str() {
            "XSMALL" => Some(WarehouseSize::XSmall),
            "SMALL" => Some(WarehouseSize::Small),
            "MEDIUM" => Some(WarehouseSize::Medium),
            "LARGE" => Some(WarehouseSize::Large),
            "XLARGE" => Some(WarehouseSize::XLarge),
            "2XLARGE" | "XXLARGE" => Some(WarehouseSize::XxLarge),
            "3XLARGE" | "XXXLARGE" => Some(WarehouseSize::XxxLarge),
            "4XLARGE" | "XXXXLARGE" => Some(WarehouseSize::XxxxLarge),
            _ => None,
        }
    }

    /// Credit rate for an arbitrary label; unknown labels are billed as SMALL.
    pub fn credits_for_label(text: &str) -> f64 {
        match Self::parse(text) {
            Some(size) => size.credits_per_hour(),
            None => WarehouseSize::Small.credits_per_hour(),
        }
    }
}

impl Default for WarehouseSize {
    fn default() -> Self {
        WarehouseSize::Medium
    }
}

impl std::fmt::Display for WarehouseSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for WarehouseSize {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for WarehouseSize {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        WarehouseSize::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown warehouse size: {s}")))
    }
}
