//! Sink option allow-lists and key scoping
//!
//! Session options arrive as one flat string map. Each sink kind recognizes
//! only its own subset, selected by key-prefix filtering against a fixed
//! allow-list:
//!
//! - telemetry sink `i`: `logfan-<opt>.<i>` for `<opt>` in [`GELF_OPTS`]
//! - durable sink: `logfan-<opt>` for `<opt>` in [`FILE_OPTS`]
//! - `logfan-gelf-count` gives the telemetry sink count

use std::collections::HashMap;

use contracts::SinkError;

/// Prefix scoping all driver-level option keys
pub const OPTION_SCOPE: &str = "logfan-";

/// Raw key carrying the telemetry sink count
pub const TELEMETRY_COUNT_KEY: &str = "logfan-gelf-count";

/// Options recognized by the GELF telemetry sink
pub const GELF_OPTS: &[&str] = &[
    "gelf-address",
    "gelf-compression-type",
    "gelf-compression-level",
    "gelf-tcp-max-reconnect",
    "gelf-tcp-reconnect-delay",
];

/// Options recognized by the durable file sink
pub const FILE_OPTS: &[&str] = &["max-file", "max-size", "compress"];

/// Number of telemetry sinks to construct.
///
/// Required: sessions without telemetry must say so explicitly with `0`.
pub fn telemetry_count(raw: &HashMap<String, String>) -> Result<usize, SinkError> {
    let value = raw
        .get(TELEMETRY_COUNT_KEY)
        .ok_or_else(|| SinkError::missing_option(TELEMETRY_COUNT_KEY))?;
    value.parse::<usize>().map_err(|_| {
        SinkError::invalid_option(
            TELEMETRY_COUNT_KEY,
            format!("expected a non-negative integer, got {value:?}"),
        )
    })
}

/// Select the option subset for telemetry sink `ordinal`, un-scoped
pub fn telemetry_options(raw: &HashMap<String, String>, ordinal: usize) -> HashMap<String, String> {
    let mut scoped = HashMap::new();
    for opt in GELF_OPTS {
        let key = format!("{OPTION_SCOPE}{opt}.{ordinal}");
        if let Some(value) = raw.get(&key) {
            scoped.insert((*opt).to_string(), value.clone());
        }
    }
    scoped
}

/// Select the durable sink's option subset, un-scoped
pub fn durable_options(raw: &HashMap<String, String>) -> HashMap<String, String> {
    let mut scoped = HashMap::new();
    for opt in FILE_OPTS {
        let key = format!("{OPTION_SCOPE}{opt}");
        if let Some(value) = raw.get(&key) {
            scoped.insert((*opt).to_string(), value.clone());
        }
    }
    scoped
}

/// Whether a raw option key belongs to any sink kind.
///
/// Keys outside the `logfan-` scope are not ours and pass through untouched.
pub fn is_recognized_key(key: &str) -> bool {
    if key == TELEMETRY_COUNT_KEY {
        return true;
    }
    let Some(rest) = key.strip_prefix(OPTION_SCOPE) else {
        return true;
    };
    if FILE_OPTS.contains(&rest) {
        return true;
    }
    GELF_OPTS.iter().any(|opt| {
        rest.strip_prefix(opt)
            .and_then(|suffix| suffix.strip_prefix('.'))
            .is_some_and(|ordinal| !ordinal.is_empty() && ordinal.bytes().all(|b| b.is_ascii_digit()))
    })
}

/// Parse a byte size with an optional `k` / `m` / `g` suffix, e.g. `"10m"`
pub fn parse_byte_size(value: &str) -> Result<u64, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("empty size".to_string());
    }
    let (digits, multiplier) = match trimmed.chars().last() {
        Some('k') | Some('K') => (&trimmed[..trimmed.len() - 1], 1u64 << 10),
        Some('m') | Some('M') => (&trimmed[..trimmed.len() - 1], 1u64 << 20),
        Some('g') | Some('G') => (&trimmed[..trimmed.len() - 1], 1u64 << 30),
        _ => (trimmed, 1),
    };
    let base: u64 = digits
        .parse()
        .map_err(|_| format!("invalid size {value:?}"))?;
    base.checked_mul(multiplier)
        .ok_or_else(|| format!("size {value:?} overflows"))
}
