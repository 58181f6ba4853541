//! Checkout
//!
//! Discount stages applied in a fixed order. Each stage consumes the previous
//! one, so brand vouchers can only be applied to product-discounted totals and
//! the platform voucher only after brand vouchers.
//!
//! ```text
//! Checkout ──apply_product_discounts──▶ ProductsPriced
//!          ──apply_brand_vouchers────▶ BrandsDiscounted
//!          ──apply_platform_voucher──▶ CheckoutSummary
//! ```

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    cart::{BrandId, Cart, Selection},
    pricing::{PricingError, checked_add},
    totals::{CartTotals, cart_totals},
    vouchers::{BrandVouchers, Voucher, VoucherError, brand, platform},
};

/// Errors raised while running the checkout stages.
#[derive(Debug, Error, PartialEq)]
pub enum CheckoutError {
    /// Errors bubbled up from totalling cart lines.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Errors bubbled up from voucher evaluation.
    #[error(transparent)]
    Voucher(#[from] VoucherError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A discount stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Direct product discounts.
    ProductDiscounts,

    /// One voucher per brand.
    BrandVouchers,

    /// The platform-wide voucher.
    PlatformVoucher,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ProductDiscounts => "Product discounts",
            Stage::BrandVouchers => "Brand vouchers",
            Stage::PlatformVoucher => "Platform voucher",
        })
    }
}

/// What one stage did to the running subtotal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageRecord<'a> {
    /// Stage that produced this record
    pub stage: Stage,

    /// Subtotal the stage started from
    pub subtotal_before: Money<'a, Currency>,

    /// Amount the stage took off
    pub discount: Money<'a, Currency>,

    /// Subtotal the stage handed on
    pub subtotal_after: Money<'a, Currency>,
}

impl<'a> StageRecord<'a> {
    fn new(
        stage: Stage,
        subtotal_before: Money<'a, Currency>,
        discount: Money<'a, Currency>,
    ) -> Self {
        let after_minor = subtotal_before
            .to_minor_units()
            .saturating_sub(discount.to_minor_units())
            .max(0);

        Self {
            stage,
            subtotal_before,
            discount,
            subtotal_after: Money::from_minor(after_minor, subtotal_before.currency()),
        }
    }
}

type StageRecords<'a> = SmallVec<[StageRecord<'a>; 3]>;

/// Discount a brand voucher gave at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct BrandDiscount<'a> {
    /// Brand the voucher was chosen for
    pub brand: BrandId,

    /// Voucher code
    pub voucher: String,

    /// Amount taken off
    pub discount: Money<'a, Currency>,
}

/// Entry point: a cart and the lines selected from it.
#[derive(Debug, Clone, Copy)]
pub struct Checkout<'c, 'a> {
    cart: &'c Cart<'a>,
    selection: &'c Selection,
}

impl<'c, 'a> Checkout<'c, 'a> {
    /// Start a checkout.
    pub fn new(cart: &'c Cart<'a>, selection: &'c Selection) -> Self {
        Self { cart, selection }
    }

    /// Total the selected lines with their product discounts.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if a line cannot be priced.
    #[tracing::instrument(
        name = "checkout.product_discounts",
        level = "debug",
        skip_all,
        fields(selected = self.selection.len())
    )]
    pub fn apply_product_discounts(self) -> Result<ProductsPriced<'c, 'a>, CheckoutError> {
        let totals = cart_totals(self.selection, self.cart)?;

        let record = StageRecord::new(
            Stage::ProductDiscounts,
            totals.total_product_cost,
            totals.total_product_discount,
        );

        debug!(
            product_cost = %totals.total_product_cost,
            product_discount = %totals.total_product_discount,
            "applied product discounts"
        );

        let mut records = StageRecords::new();
        records.push(record);

        Ok(ProductsPriced {
            cart: self.cart,
            selection: self.selection,
            totals,
            records,
        })
    }
}

/// Product discounts applied; brand vouchers next.
#[derive(Debug, Clone)]
pub struct ProductsPriced<'c, 'a> {
    cart: &'c Cart<'a>,
    selection: &'c Selection,
    totals: CartTotals<'a>,
    records: StageRecords<'a>,
}

impl<'c, 'a> ProductsPriced<'c, 'a> {
    /// Totals after product discounts.
    pub fn totals(&self) -> &CartTotals<'a> {
        &self.totals
    }

    /// Apply the voucher chosen for each brand to that brand's selected lines.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if a voucher cannot be evaluated.
    #[tracing::instrument(
        name = "checkout.brand_vouchers",
        level = "debug",
        skip_all,
        fields(vouchers = brand_vouchers.len())
    )]
    pub fn apply_brand_vouchers(
        mut self,
        brand_vouchers: &'c BrandVouchers<'a>,
    ) -> Result<BrandsDiscounted<'c, 'a>, CheckoutError> {
        let currency = self.cart.currency();
        let mut brand_discounts = SmallVec::<[BrandDiscount<'a>; 4]>::new();
        let mut total_discount = Money::from_minor(0, currency);

        for group in self.cart.brands() {
            let Some(voucher) = brand_vouchers.get(group.brand()) else {
                continue;
            };

            let discount = brand::brand_voucher_discount(
                group.items(),
                self.selection,
                Some(voucher),
                currency,
            )?;

            total_discount = checked_add(total_discount, discount)?;

            brand_discounts.push(BrandDiscount {
                brand: group.brand().clone(),
                voucher: voucher.code().to_string(),
                discount,
            });
        }

        self.records.push(StageRecord::new(
            Stage::BrandVouchers,
            self.totals.total_price,
            total_discount,
        ));

        Ok(BrandsDiscounted {
            cart: self.cart,
            selection: self.selection,
            brand_vouchers,
            totals: self.totals,
            brand_discounts,
            total_brand_discount: total_discount,
            records: self.records,
        })
    }
}

/// Brand vouchers applied; the platform voucher is last.
#[derive(Debug, Clone)]
pub struct BrandsDiscounted<'c, 'a> {
    cart: &'c Cart<'a>,
    selection: &'c Selection,
    brand_vouchers: &'c BrandVouchers<'a>,
    totals: CartTotals<'a>,
    brand_discounts: SmallVec<[BrandDiscount<'a>; 4]>,
    total_brand_discount: Money<'a, Currency>,
    records: StageRecords<'a>,
}

impl<'a> BrandsDiscounted<'_, 'a> {
    /// Sum of all brand voucher discounts.
    pub fn total_brand_discount(&self) -> Money<'a, Currency> {
        self.total_brand_discount
    }

    /// Apply the platform voucher, if any, and finish the checkout.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the voucher cannot be evaluated.
    #[tracing::instrument(
        name = "checkout.platform_voucher",
        level = "debug",
        skip_all,
        fields(voucher = voucher.map(Voucher::code))
    )]
    pub fn apply_platform_voucher(
        mut self,
        voucher: Option<&Voucher<'a>>,
    ) -> Result<CheckoutSummary<'a>, CheckoutError> {
        let platform_discount = platform::platform_voucher_discount(
            self.cart,
            self.selection,
            voucher,
            self.brand_vouchers,
        )?;

        let subtotal_before = self
            .records
            .last()
            .map_or(self.totals.total_price, |record| record.subtotal_after);

        self.records.push(StageRecord::new(
            Stage::PlatformVoucher,
            subtotal_before,
            platform_discount,
        ));

        let payable = self
            .totals
            .payable(self.total_brand_discount, platform_discount)?;

        info!(
            payable = %payable,
            brand_discount = %self.total_brand_discount,
            platform_discount = %platform_discount,
            "checkout priced"
        );

        Ok(CheckoutSummary {
            totals: self.totals,
            brand_discounts: self.brand_discounts,
            total_brand_discount: self.total_brand_discount,
            platform_voucher: voucher.map(|voucher| voucher.code().to_string()),
            platform_discount,
            payable,
            records: self.records,
        })
    }
}

/// Result of a full checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSummary<'a> {
    totals: CartTotals<'a>,
    brand_discounts: SmallVec<[BrandDiscount<'a>; 4]>,
    total_brand_discount: Money<'a, Currency>,
    platform_voucher: Option<String>,
    platform_discount: Money<'a, Currency>,
    payable: Money<'a, Currency>,
    records: StageRecords<'a>,
}

impl<'a> CheckoutSummary<'a> {
    /// Totals before vouchers
    pub fn totals(&self) -> &CartTotals<'a> {
        &self.totals
    }

    /// Discount given by each brand voucher, in cart brand order
    pub fn brand_discounts(&self) -> &[BrandDiscount<'a>] {
        &self.brand_discounts
    }

    /// Discount given by the voucher chosen for `brand`, if one was chosen.
    pub fn brand_discount(&self, brand: &BrandId) -> Option<Money<'a, Currency>> {
        self.brand_discounts
            .iter()
            .find(|applied| &applied.brand == brand)
            .map(|applied| applied.discount)
    }

    /// Sum of all brand voucher discounts
    pub fn total_brand_discount(&self) -> Money<'a, Currency> {
        self.total_brand_discount
    }

    /// Code of the platform voucher, if one was applied
    pub fn platform_voucher(&self) -> Option<&str> {
        self.platform_voucher.as_deref()
    }

    /// Discount given by the platform voucher
    pub fn platform_discount(&self) -> Money<'a, Currency> {
        self.platform_discount
    }

    /// What the shopper pays
    pub fn payable(&self) -> Money<'a, Currency> {
        self.payable
    }

    /// One record per stage, in the order they ran
    pub fn records(&self) -> &[StageRecord<'a>] {
        &self.records
    }

    /// Currency used for all amounts
    pub fn currency(&self) -> &'a Currency {
        self.payable.currency()
    }

    /// Everything taken off the original product cost.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction fails.
    pub fn savings(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.totals.total_product_cost.sub(self.payable)
    }

    /// Savings as a fraction of the original product cost.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the subtraction fails.
    pub fn savings_percent(&self) -> Result<Percentage, MoneyError> {
        let savings_minor = self.savings()?.to_minor_units();
        let cost_minor = self.totals.total_product_cost.to_minor_units();

        if cost_minor == 0 {
            return Ok(Percentage::from(0.0));
        }

        Ok(Percentage::from(
            Decimal::from(savings_minor) / Decimal::from(cost_minor),
        ))
    }
}

/// Run every stage in order.
///
/// # Errors
///
/// Returns a [`CheckoutError`] if any stage fails.
pub fn checkout<'a>(
    cart: &Cart<'a>,
    selection: &Selection,
    brand_vouchers: &BrandVouchers<'a>,
    platform_voucher: Option<&Voucher<'a>>,
) -> Result<CheckoutSummary<'a>, CheckoutError> {
    Checkout::new(cart, selection)
        .apply_product_discounts()?
        .apply_brand_vouchers(brand_vouchers)?
        .apply_platform_voucher(platform_voucher)
}
