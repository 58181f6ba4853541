//! Voucher Fixtures

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;

use crate::{
    cart::BrandId,
    fixtures::{
        FixtureError,
        carts::{parse_percentage, parse_price},
    },
    vouchers::{Voucher, VoucherKind, VoucherLevel, VoucherScope},
};

/// Wrapper for vouchers in YAML
#[derive(Debug, Deserialize)]
pub struct VouchersFixture {
    /// Map of voucher code -> voucher fixture
    pub vouchers: FxHashMap<String, VoucherFixture>,
}

/// Voucher Fixture
#[derive(Debug, Deserialize)]
pub struct VoucherFixture {
    /// `brand` or `platform`
    pub level: String,

    /// Issuing brand, required for brand vouchers
    #[serde(default)]
    pub brand: Option<String>,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Percentage off (e.g., "10%"); exclusive with `amount`
    #[serde(default)]
    pub percentage: Option<String>,

    /// Fixed amount off (e.g., "20000 VND"); exclusive with `percentage`
    #[serde(default)]
    pub amount: Option<String>,

    /// Cap on the discount
    #[serde(default)]
    pub max_discount: Option<String>,

    /// Minimum eligible subtotal
    #[serde(default)]
    pub min_order_value: Option<String>,

    /// Products the voucher is limited to; every product when empty
    #[serde(default)]
    pub products: Vec<String>,
}

/// A voucher loaded from a fixture, with the level it was issued at.
#[derive(Debug, Clone)]
pub enum LoadedVoucher<'a> {
    /// Brand voucher and its issuing brand
    Brand(BrandId, Voucher<'a>),

    /// Platform voucher
    Platform(Voucher<'a>),
}

impl<'a> LoadedVoucher<'a> {
    /// Level the voucher was issued at
    pub fn level(&self) -> VoucherLevel {
        match self {
            LoadedVoucher::Brand(..) => VoucherLevel::Brand,
            LoadedVoucher::Platform(_) => VoucherLevel::Platform,
        }
    }

    /// The voucher itself
    pub fn voucher(&self) -> &Voucher<'a> {
        match self {
            LoadedVoucher::Brand(_, voucher) | LoadedVoucher::Platform(voucher) => voucher,
        }
    }
}

impl VoucherFixture {
    /// Build the voucher for `code`, checking its amounts are in `currency` once it is known.
    ///
    /// # Errors
    ///
    /// Returns an error if the level, amounts or percentage are invalid, or an
    /// amount is in a different currency from the rest of the fixture.
    pub fn try_into_voucher<'a>(
        self,
        code: &str,
        currency: &mut Option<&'static Currency>,
    ) -> Result<LoadedVoucher<'a>, FixtureError> {
        let kind = match (&self.percentage, &self.amount) {
            (Some(percent), None) => VoucherKind::Percentage(parse_percentage(percent)?),
            (None, Some(amount)) => VoucherKind::Amount(parse_money(amount, currency)?),
            _ => {
                return Err(FixtureError::InvalidVoucher(format!(
                    "{code}: exactly one of 'percentage' or 'amount' is required"
                )));
            }
        };

        let mut voucher = Voucher::new(code, kind);

        if let Some(name) = self.name {
            voucher = voucher.with_name(name);
        }

        if let Some(max_discount) = &self.max_discount {
            voucher = voucher.with_max_discount(parse_money(max_discount, currency)?);
        }

        if let Some(min_order_value) = &self.min_order_value {
            voucher = voucher.with_min_order_value(parse_money(min_order_value, currency)?);
        }

        if !self.products.is_empty() {
            voucher = voucher.with_scope(VoucherScope::specific(
                self.products.iter().map(String::as_str),
            ));
        }

        match (self.level.trim().to_ascii_lowercase().as_str(), self.brand) {
            ("brand", Some(brand)) => Ok(LoadedVoucher::Brand(BrandId::new(brand), voucher)),
            ("brand", None) => Err(FixtureError::InvalidVoucher(format!(
                "{code}: brand vouchers need a 'brand'"
            ))),
            ("platform", _) => Ok(LoadedVoucher::Platform(voucher)),
            (other, _) => Err(FixtureError::InvalidVoucher(format!(
                "{code}: unknown level '{other}'"
            ))),
        }
    }
}

fn parse_money<'a>(
    s: &str,
    currency: &mut Option<&'static Currency>,
) -> Result<Money<'a, Currency>, FixtureError> {
    let (minor_units, parsed) = parse_price(s)?;

    match *currency {
        Some(existing) if existing != parsed => {
            return Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                parsed.iso_alpha_code.to_string(),
            ));
        }
        Some(_) => {}
        None => *currency = Some(parsed),
    }

    Ok(Money::from_minor(minor_units, parsed))
}
