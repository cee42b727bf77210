const BINARY_SUFFIX: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
const UNIT: f64 = 1024.0;

/// Bytes in a single GiB.
pub const GIB: f64 = UNIT * UNIT * UNIT;

/// Converts bytes to a human-readable value using the largest binary unit which keeps
/// the value above 1, with exactly `decimals` fractional digits.
/// Example: `into_human_fixed(16_647_524_352.0, 2)` is "15.50 GiB".
pub fn into_human_fixed(bytes: f64, decimals: usize) -> String {
    if bytes <= 0.0 {
        return format!("{:.decimals$} B", 0.0);
    }
    let mut value = bytes;
    let mut suffix = 0;
    while value >= UNIT && suffix < BINARY_SUFFIX.len() - 1 {
        value /= UNIT;
        suffix += 1;
    }
    format!("{value:.decimals$} {}", BINARY_SUFFIX[suffix])
}

/// Converts bytes to GiB.
pub fn to_gib(bytes: f64) -> f64 {
    bytes / GIB
}
