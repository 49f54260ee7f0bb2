//! Stable SQL fingerprints for cache keys and diagnostics.

use blake3::Hasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SqlFingerprint(pub [u8; 32]);

impl SqlFingerprint {
    pub fn to_hex(&self) -> String {
        // blake3 hex(32b) is 64 hex chars
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> String {
        let mut s = self.to_hex();
        s.truncate(12);
        s
    }
}

impl std::fmt::Display for SqlFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Fingerprint SQL after folding case and collapsing whitespace, so the same
/// query keeps the same key across reformatting.
pub fn fingerprint_sql(sql: &str) -> SqlFingerprint {
    let normalized = sql
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let mut h = Hasher::new();
    h.update(normalized.as_bytes());
    SqlFingerprint(h.finalize().into())
}
