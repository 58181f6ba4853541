//! Cart Pricing CLI
//!
//! Loads a fixture cart and its vouchers, prices the selected lines and
//! prints a receipt.
//!
//! Use `-f` to load a fixture set by name
//! Use `-s` to choose which cart lines to check out
//! Use `-b BRAND=CODE` to choose a brand voucher, `-p CODE` for the platform voucher

use std::{
    io::{self, Write},
    time::Instant,
};

use anyhow::Result;
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing::{debug, info};

use cart_pricing::{
    checkout::checkout,
    config::CheckoutArgs,
    fixtures::Fixture,
    observability::init_subscriber,
    receipt::Receipt,
    vouchers::brand::best_brand_voucher,
};

/// Cart Pricing entry point
fn main() -> Result<()> {
    let args = CheckoutArgs::load().unwrap_or_else(|error| error.exit());

    init_subscriber(&args.logging)?;

    let mut fixture = Fixture::with_base_path(&args.fixture_dir);

    fixture
        .load_cart(&args.fixture)?
        .load_vouchers(&args.fixture)?;

    let cart = fixture.cart()?;

    let selection = if args.select.is_empty() {
        cart.select_all()
    } else {
        cart.selection(args.select.iter().map(String::as_str))?
    };

    let mut brand_vouchers = fixture.brand_vouchers(
        args.brand_vouchers
            .iter()
            .map(|choice| (choice.brand.as_str(), choice.code.as_str())),
    )?;

    if args.best_brand_vouchers {
        for group in cart.brands() {
            if brand_vouchers.get(group.brand()).is_some() {
                continue;
            }

            let candidates = fixture.vouchers_for_brand(group.brand());

            if let Some((voucher, discount)) =
                best_brand_voucher(group.items(), &selection, &candidates, cart.currency())?
            {
                debug!(brand = %group.brand(), voucher = voucher.code(), discount = %discount, "picked best brand voucher");

                brand_vouchers.insert(group.brand().clone(), voucher.clone());
            }
        }
    }

    let platform_voucher = args
        .platform_voucher
        .as_deref()
        .map(|code| fixture.platform_voucher(code))
        .transpose()?;

    let start = Instant::now();
    let summary = checkout(cart, &selection, &brand_vouchers, platform_voucher)?;
    let elapsed = start.elapsed();

    info!(fixture = %args.fixture, lines = selection.len(), "checkout complete");

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    Receipt::new(cart, &selection, &summary).write_to(&mut handle)?;

    writeln!(handle, "Priced in {}", elapsed.human(Truncate::Nano))?;

    Ok(())
}
