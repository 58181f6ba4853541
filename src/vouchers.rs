//! Vouchers
//!
//! Brand vouchers are chosen per brand and discount that brand's lines. A single
//! platform voucher is applied last, to what remains after brand vouchers.

use std::fmt;

use decimal_percentage::Percentage;
use rustc_hash::{FxHashMap, FxHashSet};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    cart::BrandId,
    discounts::{DiscountError, ensure_same_currency, percent_of_minor},
    pricing::PricingError,
    products::ProductId,
};

pub mod brand;
pub mod platform;

/// Errors that can occur while evaluating a voucher.
#[derive(Debug, Error, PartialEq)]
pub enum VoucherError {
    /// Proportional distribution of a brand discount overflowed.
    #[error("voucher distribution overflowed")]
    Overflow,

    /// Errors bubbled up from the discount primitives.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Errors bubbled up from totalling cart lines.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// How a voucher discounts its eligible subtotal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoucherKind<'a> {
    /// Fraction of the eligible subtotal (e.g. 0.1 for 10%).
    Percentage(Percentage),

    /// Fixed amount off the eligible subtotal.
    Amount(Money<'a, Currency>),
}

/// Which products a voucher counts towards its eligible subtotal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VoucherScope {
    /// Every product.
    #[default]
    All,

    /// Only the listed products.
    Specific(FxHashSet<ProductId>),
}

impl VoucherScope {
    /// Restrict a voucher to the given products.
    pub fn specific<I, T>(products: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ProductId>,
    {
        VoucherScope::Specific(products.into_iter().map(Into::into).collect())
    }

    /// Whether `product` is in scope.
    pub fn contains(&self, product: &ProductId) -> bool {
        match self {
            VoucherScope::All => true,
            VoucherScope::Specific(products) => products.contains(product),
        }
    }
}

/// Who issues a voucher, and so which stage applies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoucherLevel {
    /// Issued by a brand; discounts that brand's lines.
    Brand,

    /// Issued by the marketplace; discounts the whole order.
    Platform,
}

impl fmt::Display for VoucherLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VoucherLevel::Brand => "brand",
            VoucherLevel::Platform => "platform",
        })
    }
}

/// Whether a voucher applies to an eligible subtotal, and if not, why not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Eligibility<'a> {
    /// The voucher applies.
    Applicable,

    /// Nothing in scope was selected (the eligible subtotal is zero).
    NoEligibleItems,

    /// The eligible subtotal is below the voucher's minimum order value.
    BelowMinimum {
        /// How much more has to be spent on eligible items.
        shortfall: Money<'a, Currency>,
    },
}

/// A brand or platform voucher.
#[derive(Debug, Clone, PartialEq)]
pub struct Voucher<'a> {
    code: String,
    name: String,
    kind: VoucherKind<'a>,
    max_discount: Option<Money<'a, Currency>>,
    min_order_value: Option<Money<'a, Currency>>,
    scope: VoucherScope,
}

impl<'a> Voucher<'a> {
    /// Create an uncapped voucher with no minimum order value, applying to all products.
    pub fn new(code: impl Into<String>, kind: VoucherKind<'a>) -> Self {
        let code = code.into();

        Self {
            name: code.clone(),
            code,
            kind,
            max_discount: None,
            min_order_value: None,
            scope: VoucherScope::All,
        }
    }

    /// Create a percentage voucher.
    pub fn percentage(code: impl Into<String>, percent: Percentage) -> Self {
        Self::new(code, VoucherKind::Percentage(percent))
    }

    /// Create a fixed amount voucher.
    pub fn amount(code: impl Into<String>, amount: Money<'a, Currency>) -> Self {
        Self::new(code, VoucherKind::Amount(amount))
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Cap the discount this voucher can give.
    #[must_use]
    pub fn with_max_discount(mut self, max_discount: Money<'a, Currency>) -> Self {
        self.max_discount = Some(max_discount);
        self
    }

    /// Require a minimum eligible subtotal.
    #[must_use]
    pub fn with_min_order_value(mut self, min_order_value: Money<'a, Currency>) -> Self {
        self.min_order_value = Some(min_order_value);
        self
    }

    /// Restrict which products count towards the eligible subtotal.
    #[must_use]
    pub fn with_scope(mut self, scope: VoucherScope) -> Self {
        self.scope = scope;
        self
    }

    /// Voucher code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Voucher display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Discount kind and value
    pub fn kind(&self) -> &VoucherKind<'a> {
        &self.kind
    }

    /// Discount cap, if any
    pub fn max_discount(&self) -> Option<Money<'a, Currency>> {
        self.max_discount
    }

    /// Minimum eligible subtotal, if any
    pub fn min_order_value(&self) -> Option<Money<'a, Currency>> {
        self.min_order_value
    }

    /// Product scope
    pub fn scope(&self) -> &VoucherScope {
        &self.scope
    }

    /// Whether `product` counts towards this voucher's eligible subtotal.
    pub fn applies_to(&self, product: &ProductId) -> bool {
        self.scope.contains(product)
    }

    /// Check an eligible subtotal against this voucher's requirements.
    ///
    /// # Errors
    ///
    /// Returns [`VoucherError::Money`] if the minimum order value is in another currency.
    pub fn eligibility(
        &self,
        subtotal: Money<'a, Currency>,
    ) -> Result<Eligibility<'a>, VoucherError> {
        if subtotal.to_minor_units() <= 0 {
            return Ok(Eligibility::NoEligibleItems);
        }

        let Some(min_order_value) = self.min_order_value else {
            return Ok(Eligibility::Applicable);
        };

        ensure_same_currency(&subtotal, &min_order_value)?;

        if subtotal.to_minor_units() < min_order_value.to_minor_units() {
            return Ok(Eligibility::BelowMinimum {
                shortfall: min_order_value.sub(subtotal)?,
            });
        }

        Ok(Eligibility::Applicable)
    }

    /// The discount this voucher gives on an eligible subtotal.
    ///
    /// Zero unless the voucher is [`Eligibility::Applicable`]. Otherwise the raw
    /// discount is capped at the voucher's maximum and at the subtotal itself.
    ///
    /// # Errors
    ///
    /// Returns a [`VoucherError`] if the percentage cannot be applied or any of
    /// the voucher's amounts are in another currency.
    pub fn discount_on(
        &self,
        subtotal: Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, VoucherError> {
        let currency = subtotal.currency();

        if self.eligibility(subtotal)? != Eligibility::Applicable {
            return Ok(Money::from_minor(0, currency));
        }

        let subtotal_minor = subtotal.to_minor_units();

        let raw_minor = match &self.kind {
            VoucherKind::Percentage(percent) => percent_of_minor(percent, subtotal_minor)?,
            VoucherKind::Amount(amount) => {
                ensure_same_currency(&subtotal, amount)?;
                amount.to_minor_units()
            }
        };

        let cap_minor = match self.max_discount {
            Some(max_discount) => {
                ensure_same_currency(&subtotal, &max_discount)?;
                max_discount.to_minor_units().min(subtotal_minor)
            }
            None => subtotal_minor,
        };

        Ok(Money::from_minor(
            raw_minor.min(cap_minor).max(0),
            currency,
        ))
    }
}

/// The voucher chosen for each brand. Brands without an entry get no brand discount.
#[derive(Debug, Clone, Default)]
pub struct BrandVouchers<'a> {
    chosen: FxHashMap<BrandId, Voucher<'a>>,
}

impl<'a> BrandVouchers<'a> {
    /// No brand vouchers chosen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose a voucher for a brand, returning the one it replaces.
    pub fn insert(&mut self, brand: impl Into<BrandId>, voucher: Voucher<'a>) -> Option<Voucher<'a>> {
        self.chosen.insert(brand.into(), voucher)
    }

    /// Drop the voucher chosen for a brand.
    pub fn remove(&mut self, brand: &BrandId) -> Option<Voucher<'a>> {
        self.chosen.remove(brand)
    }

    /// The voucher chosen for a brand.
    pub fn get(&self, brand: &BrandId) -> Option<&Voucher<'a>> {
        self.chosen.get(brand)
    }

    /// Iterate over the chosen vouchers.
    pub fn iter(&self) -> impl Iterator<Item = (&BrandId, &Voucher<'a>)> {
        self.chosen.iter()
    }

    /// Number of brands with a chosen voucher.
    pub fn len(&self) -> usize {
        self.chosen.len()
    }

    /// Check if no brand has a voucher.
    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }
}

impl<'a> FromIterator<(BrandId, Voucher<'a>)> for BrandVouchers<'a> {
    fn from_iter<I: IntoIterator<Item = (BrandId, Voucher<'a>)>>(iter: I) -> Self {
        Self {
            chosen: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, VND};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn discount_is_capped_at_max_discount() -> TestResult {
        let voucher = Voucher::percentage("BIG20", Percentage::from(0.2))
            .with_max_discount(Money::from_minor(50_000, VND));

        // 20% of 400,000 is 80,000.
        let discount = voucher.discount_on(Money::from_minor(400_000, VND))?;

        assert_eq!(discount, Money::from_minor(50_000, VND));

        Ok(())
    }

    #[test]
    fn below_minimum_order_value_gives_nothing() -> TestResult {
        let voucher = Voucher::amount("OFF30K", Money::from_minor(30_000, VND))
            .with_min_order_value(Money::from_minor(200_000, VND));

        let subtotal = Money::from_minor(150_000, VND);

        assert_eq!(
            voucher.eligibility(subtotal)?,
            Eligibility::BelowMinimum {
                shortfall: Money::from_minor(50_000, VND)
            }
        );
        assert_eq!(voucher.discount_on(subtotal)?, Money::from_minor(0, VND));

        Ok(())
    }

    #[test]
    fn minimum_order_value_is_inclusive() -> TestResult {
        let voucher = Voucher::amount("OFF30K", Money::from_minor(30_000, VND))
            .with_min_order_value(Money::from_minor(200_000, VND));

        let discount = voucher.discount_on(Money::from_minor(200_000, VND))?;

        assert_eq!(discount, Money::from_minor(30_000, VND));

        Ok(())
    }

    #[test]
    fn amount_discount_never_exceeds_subtotal() -> TestResult {
        let voucher = Voucher::amount("OFF100K", Money::from_minor(100_000, VND));

        let discount = voucher.discount_on(Money::from_minor(60_000, VND))?;

        assert_eq!(discount, Money::from_minor(60_000, VND));

        Ok(())
    }

    #[test]
    fn zero_subtotal_has_no_eligible_items() -> TestResult {
        let voucher = Voucher::percentage("TEN", Percentage::from(0.1));

        assert_eq!(
            voucher.eligibility(Money::from_minor(0, VND))?,
            Eligibility::NoEligibleItems
        );

        Ok(())
    }

    #[test]
    fn voucher_amounts_in_other_currency_error() {
        let voucher = Voucher::amount("OFF5", Money::from_minor(500, GBP));

        assert!(matches!(
            voucher.discount_on(Money::from_minor(100_000, VND)),
            Err(VoucherError::Money(MoneyError::CurrencyMismatch { .. }))
        ));
    }

    #[test]
    fn specific_scope_only_contains_listed_products() {
        let voucher = Voucher::percentage("SERUM10", Percentage::from(0.1))
            .with_scope(VoucherScope::specific(["serum"]));

        assert!(voucher.applies_to(&ProductId::from("serum")));
        assert!(!voucher.applies_to(&ProductId::from("toner")));
        assert!(VoucherScope::All.contains(&ProductId::from("toner")));
    }

    #[test]
    fn brand_vouchers_replace_per_brand() {
        let mut chosen = BrandVouchers::new();

        assert!(chosen.insert("lumiere", Voucher::percentage("A", Percentage::from(0.1))).is_none());

        let replaced = chosen.insert("lumiere", Voucher::percentage("B", Percentage::from(0.2)));

        assert_eq!(replaced.map(|voucher| voucher.code().to_string()), Some("A".to_string()));
        assert_eq!(chosen.len(), 1);
        assert_eq!(
            chosen.get(&BrandId::from("lumiere")).map(Voucher::code),
            Some("B")
        );
    }
}
