//! Cart Pricing
//!
//! Checkout pricing for marketplace carts grouped by brand. Product discounts,
//! brand vouchers and a platform voucher are applied in that order, each stage
//! working on the subtotal the previous stage left behind.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod discounts;
pub mod fixtures;
pub mod items;
pub mod observability;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod totals;
pub mod vouchers;
