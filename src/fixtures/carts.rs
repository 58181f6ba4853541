//! Cart Fixtures

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD, VND},
};
use serde::Deserialize;

use crate::{
    cart::BrandCart,
    fixtures::FixtureError,
    items::CartItem,
    products::{DiscountStatus, ProductDiscount},
};

/// Wrapper for a cart in YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Brand groups, in display order
    pub brands: Vec<BrandFixture>,
}

/// Brand group fixture
#[derive(Debug, Deserialize)]
pub struct BrandFixture {
    /// Brand id
    pub brand: String,

    /// Lines sold by this brand
    pub items: Vec<CartItemFixture>,
}

/// Cart line fixture
#[derive(Debug, Deserialize)]
pub struct CartItemFixture {
    /// Line id
    pub id: String,

    /// Product id
    pub product: String,

    /// Unit price (e.g., "100000 VND")
    pub price: String,

    /// Units of the product
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    /// Direct product discount
    #[serde(default)]
    pub discount: Option<ProductDiscountFixture>,
}

/// Product discount fixture
#[derive(Debug, Deserialize)]
pub struct ProductDiscountFixture {
    /// Percentage off (e.g., "10%" or "0.1")
    pub percent: String,

    /// One of `active`, `waiting`, `expired`, `cancelled`
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_quantity() -> u32 {
    1
}

fn default_status() -> String {
    "active".to_string()
}

impl BrandFixture {
    /// Build the brand group, checking every price is in `currency` once it is known.
    ///
    /// # Errors
    ///
    /// Returns an error if a price, percentage or status is invalid, or a price
    /// is in a different currency from the rest of the cart.
    pub fn try_into_brand_cart<'a>(
        self,
        currency: &mut Option<&'static Currency>,
    ) -> Result<BrandCart<'a>, FixtureError> {
        let mut items = Vec::with_capacity(self.items.len());

        for item in self.items {
            let (minor_units, item_currency) = parse_price(&item.price)?;

            match *currency {
                Some(existing) if existing != item_currency => {
                    return Err(FixtureError::CurrencyMismatch(
                        existing.iso_alpha_code.to_string(),
                        item_currency.iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => *currency = Some(item_currency),
            }

            let mut cart_item = CartItem::new(
                item.id,
                item.product,
                Money::from_minor(minor_units, item_currency),
                item.quantity,
            );

            if let Some(discount) = item.discount {
                cart_item = cart_item.with_product_discount(ProductDiscount {
                    discount: parse_percentage(&discount.percent)?,
                    status: parse_status(&discount.status)?,
                });
            }

            items.push(cart_item);
        }

        Ok(BrandCart::new(self.brand, items))
    }
}

/// Parse price string (e.g., "2.99 GBP" or "100000 VND") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let currency = match *currency_code {
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        "VND" => VND,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let scale = 10_i64
        .checked_pow(currency.exponent)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::from(scale))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    if minor_units < 0 {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    Ok((minor_units, currency))
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// Accepts two formats:
/// - Percentage format: "15%" for 15%
/// - Decimal format: "0.15" for 15%
///
/// # Errors
///
/// Returns an error if the string cannot be parsed or the value is outside 0% to 100%.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    let fraction = if let Some(percent_str) = trimmed.strip_suffix('%') {
        percent_str
            .trim()
            .parse::<Decimal>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?
            / Decimal::ONE_HUNDRED
    } else {
        trimmed
            .parse::<Decimal>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?
    };

    if fraction < Decimal::ZERO || fraction > Decimal::ONE {
        return Err(FixtureError::InvalidPercentage(s.to_string()));
    }

    Ok(Percentage::from(fraction))
}

fn parse_status(s: &str) -> Result<DiscountStatus, FixtureError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "active" => Ok(DiscountStatus::Active),
        "waiting" => Ok(DiscountStatus::Waiting),
        "expired" => Ok(DiscountStatus::Expired),
        "cancelled" | "canceled" => Ok(DiscountStatus::Cancelled),
        _ => Err(FixtureError::InvalidDiscountStatus(s.to_string())),
    }
}
