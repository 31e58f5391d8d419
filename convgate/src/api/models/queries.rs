use std::{fmt::Display, str::FromStr};

use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::{Error, Result};

/// Query parameters for the QR code and barcode endpoints
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContentQuery {
    /// Text to encode
    #[serde(default)]
    #[param(example = "https://example.com")]
    pub content: String,
}

/// Query parameters for the resize endpoint.
///
/// Values are kept as raw strings so that a malformed number is reported through the JSON error
/// envelope with the offending parameter named.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ResizeQuery {
    /// Target width in pixels, 0 to derive it from the height
    #[param(value_type = u32, required = true, example = 800)]
    pub width: Option<String>,
    /// Target height in pixels, 0 to derive it from the width
    #[param(value_type = u32, required = true, example = 600)]
    pub height: Option<String>,
}

impl ResizeQuery {
    /// Parsed `(width, height)`, each between 0 and `max_dimension`, not both zero.
    pub fn dimensions(&self, max_dimension: u32) -> Result<(u32, u32)> {
        let width = dimension("width", self.width.as_deref(), max_dimension)?;
        let height = dimension("height", self.height.as_deref(), max_dimension)?;
        if width == 0 && height == 0 {
            return Err(Error::bad_request("width and height cannot both be zero"));
        }
        Ok((width, height))
    }
}

fn dimension(name: &str, value: Option<&str>, max_dimension: u32) -> Result<u32> {
    let parsed: i64 = parse_integer(name, value)?;
    if parsed < 0 {
        return Err(Error::bad_request(format!("{name} must not be negative, got {parsed}")));
    }
    if parsed > max_dimension as i64 {
        return Err(Error::bad_request(format!(
            "{name} must be at most {max_dimension}, got {parsed}"
        )));
    }
    Ok(parsed as u32)
}

/// Query parameters for the rotate endpoint
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RotateQuery {
    /// Counter-clockwise rotation in degrees, any integer
    #[param(value_type = i64, required = true, example = 90)]
    pub deg: Option<String>,
}

impl RotateQuery {
    pub fn degrees(&self) -> Result<i64> {
        parse_integer("deg", self.deg.as_deref())
    }
}

fn parse_integer<T>(name: &str, value: Option<&str>) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = value.ok_or_else(|| Error::bad_request(format!("missing query parameter `{name}`")))?;
    raw.trim()
        .parse()
        .map_err(|e| Error::bad_request(format!("query parameter `{name}` must be an integer, got {raw:?}: {e}")))
}
