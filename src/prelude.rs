//! Cart Pricing prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{BrandCart, BrandId, Cart, CartError, Selection},
    checkout::{
        BrandDiscount, BrandsDiscounted, Checkout, CheckoutError, CheckoutSummary, ProductsPriced,
        Stage, StageRecord, checkout,
    },
    discounts::{DiscountError, SimpleDiscount},
    items::{CartItem, CartItemId, Classification},
    pricing::PricingError,
    products::{DiscountStatus, ProductDiscount, ProductId},
    receipt::{Receipt, ReceiptError},
    totals::{CartTotals, cart_totals},
    vouchers::{
        BrandVouchers, Eligibility, Voucher, VoucherError, VoucherKind, VoucherLevel,
        VoucherScope,
        brand::{BrandVoucherOutcome, best_brand_voucher, brand_voucher_discount},
        platform::platform_voucher_discount,
    },
};
