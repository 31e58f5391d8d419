//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `CONVGATE_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `CONVGATE_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `CONVGATE_QR_CODE__SIZE=512` sets the `qr_code.size` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use convgate::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! CONVGATE_PORT=9000
//! CONVGATE_LIMITS__MAX_UPLOAD_BYTES=20971520
//! CONVGATE_QR_CODE__ERROR_CORRECTION=high
//! CONVGATE_LOG_FORMAT=json
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "CONVGATE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Static UI served at `/` and `/src/*`
    pub assets: AssetsConfig,
    /// Request size limits
    pub limits: LimitsConfig,
    /// Resize / rotate settings
    pub images: ImageConfig,
    /// QR code rendering
    pub qr_code: QrCodeConfig,
    /// Linear barcode rendering
    pub barcode: BarcodeConfig,
    /// CSV to workbook conversion
    pub spreadsheet: SpreadsheetConfig,
    /// Console log output format
    pub log_format: LogFormat,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Directory mounted under `/src`
    pub dir: PathBuf,
    /// Document served at `/`
    pub index: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("src"),
            index: PathBuf::from("src/index.html"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum request body size for upload endpoints, in bytes
    pub max_upload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 << 20, // 10 MiB
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    /// JPEG quality for every image response (1-100)
    pub jpeg_quality: u8,
    /// Largest width or height accepted by the resize endpoint
    pub max_dimension: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 100,
            max_dimension: 10_000,
        }
    }
}

/// QR code error-correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCorrection {
    Low,
    Medium,
    Quartile,
    High,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct QrCodeConfig {
    /// Width and height of the rendered symbol in pixels
    pub size: u32,
    pub error_correction: ErrorCorrection,
}

impl Default for QrCodeConfig {
    fn default() -> Self {
        Self {
            size: 256,
            error_correction: ErrorCorrection::Medium,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BarcodeConfig {
    /// Bar height in pixels
    pub height: u32,
    /// Pixels per module
    pub module_width: u32,
}

impl Default for BarcodeConfig {
    fn default() -> Self {
        Self {
            height: 40,
            module_width: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpreadsheetConfig {
    /// Name of the single worksheet written
    pub sheet_name: String,
}

impl Default for SpreadsheetConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Sheet1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
            assets: AssetsConfig::default(),
            limits: LimitsConfig::default(),
            images: ImageConfig::default(),
            qr_code: QrCodeConfig::default(),
            barcode: BarcodeConfig::default(),
            spreadsheet: SpreadsheetConfig::default(),
            log_format: LogFormat::default(),
            enable_otel_export: false,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |reason: String| Error::Internal {
            operation: format!("validate config: {reason}"),
        };

        if !(1..=100).contains(&self.images.jpeg_quality) {
            return Err(invalid(format!(
                "images.jpeg_quality must be between 1 and 100, got {}",
                self.images.jpeg_quality
            )));
        }
        if self.images.max_dimension == 0 {
            return Err(invalid("images.max_dimension must be greater than zero".to_string()));
        }
        if self.qr_code.size == 0 {
            return Err(invalid("qr_code.size must be greater than zero".to_string()));
        }
        if self.barcode.height == 0 || self.barcode.module_width == 0 {
            return Err(invalid(
                "barcode.height and barcode.module_width must be greater than zero".to_string(),
            ));
        }
        if self.limits.max_upload_bytes == 0 {
            return Err(invalid("limits.max_upload_bytes must be greater than zero".to_string()));
        }

        // Worksheet names are limited to 31 characters and may not contain []:*?/\
        let name = &self.spreadsheet.sheet_name;
        if name.is_empty() || name.chars().count() > 31 || name.contains(['[', ']', ':', '*', '?', '/', '\\']) {
            return Err(invalid(format!("spreadsheet.sheet_name {name:?} is not a valid worksheet name")));
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            // CONVGATE_CONFIG names the file itself, not a field
            .merge(Env::prefixed("CONVGATE_").ignore(&["config"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
