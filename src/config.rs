//! Checkout configuration

use std::path::PathBuf;

use clap::{Args, Parser};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// A brand voucher chosen on the command line as `BRAND=CODE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandVoucherChoice {
    /// Brand the voucher is chosen for
    pub brand: String,

    /// Voucher code
    pub code: String,
}

/// Parse a `BRAND=CODE` pair.
///
/// # Errors
///
/// Returns a message if either side of the `=` is missing.
pub fn parse_brand_voucher(s: &str) -> Result<BrandVoucherChoice, String> {
    match s.split_once('=') {
        Some((brand, code)) if !brand.trim().is_empty() && !code.trim().is_empty() => {
            Ok(BrandVoucherChoice {
                brand: brand.trim().to_string(),
                code: code.trim().to_string(),
            })
        }
        _ => Err(format!("expected BRAND=CODE, got '{s}'")),
    }
}

/// Price a fixture cart at checkout
#[derive(Debug, Parser)]
#[command(name = "cart-pricing", about = "Price a marketplace cart at checkout", long_about = None)]
pub struct CheckoutArgs {
    /// Fixture set to load the cart & vouchers from
    #[arg(short, long, env = "CART_PRICING_FIXTURE", default_value = "marketplace")]
    pub fixture: String,

    /// Directory holding the `carts/` and `vouchers/` fixtures
    #[arg(long, env = "CART_PRICING_FIXTURE_DIR", default_value = "./fixtures")]
    pub fixture_dir: PathBuf,

    /// Cart line ids to check out (default: every line)
    #[arg(short, long, value_delimiter = ',')]
    pub select: Vec<String>,

    /// Brand voucher to apply, as BRAND=CODE (repeatable)
    #[arg(short, long = "brand-voucher", value_parser = parse_brand_voucher)]
    pub brand_vouchers: Vec<BrandVoucherChoice>,

    /// Pick the best voucher for every brand without one chosen
    #[arg(long)]
    pub best_brand_vouchers: bool,

    /// Platform voucher code to apply
    #[arg(short, long)]
    pub platform_voucher: Option<String>,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl CheckoutArgs {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}
