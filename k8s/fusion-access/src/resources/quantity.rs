//! Parsing of kubernetes resource quantities, eg: "32Gi", "16384Mi", "1.5e9", "500m".

use snafu::Snafu;

/// Errors parsing a quantity.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum QuantityError {
    #[snafu(display("Quantity '{}' has no numeric value", quantity))]
    MissingNumber { quantity: String },
    #[snafu(display("Quantity '{}' has an unknown suffix '{}'", quantity, suffix))]
    UnknownSuffix { quantity: String, suffix: String },
}

/// Parse a quantity into its plain numeric value (bytes, for memory quantities).
pub fn parse_quantity(quantity: &str) -> Result<f64, QuantityError> {
    let quantity = quantity.trim();
    let split = quantity
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '+' || c == '-'))
        .unwrap_or(quantity.len());
    let (number, suffix) = quantity.split_at(split);
    let value = number
        .parse::<f64>()
        .map_err(|_| QuantityError::MissingNumber {
            quantity: quantity.to_string(),
        })?;

    let multiplier = match suffix {
        "" => 1.0,
        "Ki" => 1024f64,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        exponent if exponent.starts_with(['e', 'E']) => exponent[1 ..]
            .parse::<i32>()
            .map(|e| 10f64.powi(e))
            .map_err(|_| QuantityError::UnknownSuffix {
                quantity: quantity.to_string(),
                suffix: suffix.to_string(),
            })?,
        _ => {
            return Err(QuantityError::UnknownSuffix {
                quantity: quantity.to_string(),
                suffix: suffix.to_string(),
            })
        }
    };

    Ok(value * multiplier)
}
