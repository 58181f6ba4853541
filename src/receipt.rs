//! Receipt

use std::io;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::{SmallVec, smallvec};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::{Cart, Selection},
    checkout::{CheckoutSummary, Stage},
    items::CartItem,
    pricing::{PricingError, line_original_total, line_total},
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Error pricing a cart line.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Printable view of a priced checkout.
#[derive(Debug, Clone, Copy)]
pub struct Receipt<'s, 'a> {
    cart: &'s Cart<'a>,
    selection: &'s Selection,
    summary: &'s CheckoutSummary<'a>,
}

impl<'s, 'a> Receipt<'s, 'a> {
    /// Create a receipt for a checkout of `cart`.
    pub fn new(
        cart: &'s Cart<'a>,
        selection: &'s Selection,
        summary: &'s CheckoutSummary<'a>,
    ) -> Self {
        Self {
            cart,
            selection,
            summary,
        }
    }

    /// Writes the line table and the stage summary.
    ///
    /// # Errors
    ///
    /// Returns an error if a line cannot be priced or the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record([
            "",
            "Brand",
            "Item",
            "Qty",
            "Base Price",
            "Discounted Price",
            "Savings",
        ]);

        let mut brand_boundary_rows: SmallVec<[usize; 8]> = smallvec![];
        let mut color_ops: SmallVec<[(usize, usize, Color); 32]> = smallvec![];
        let mut row = 1; // header is row 0
        let mut line_no = 0;

        for group in self.cart.brands() {
            let mut brand_label = group.brand().to_string();

            for item in group.selected(self.selection) {
                // First line of each brand opens a new section.
                if !brand_label.is_empty() {
                    brand_boundary_rows.push(row);
                }

                line_no += 1;

                let cells = line_cells(item)?;

                builder.push_record([
                    format!("#{line_no:<3}"),
                    std::mem::take(&mut brand_label),
                    item.product().to_string(),
                    item.quantity().to_string(),
                    cells.base_price,
                    cells.final_price,
                    cells.savings,
                ]);

                color_ops.push((row, 3, muted()));
                color_ops.push((row, 5, Color::FG_GREEN));

                row += 1;
            }
        }

        write_line_table(&mut out, builder, &brand_boundary_rows, color_ops)?;
        write_summary(&mut out, self.summary)
    }
}

/// Cell contents for a single cart line.
struct LineCells {
    base_price: String,
    final_price: String,
    savings: String,
}

fn line_cells(item: &CartItem<'_>) -> Result<LineCells, ReceiptError> {
    let base = line_original_total(item)?;
    let final_price = line_total(item)?;

    if final_price == base {
        return Ok(LineCells {
            base_price: format!("{base}"),
            final_price: String::new(),
            savings: String::new(),
        });
    }

    let savings = base.sub(final_price)?;
    let percent = fraction_of(savings, base);

    Ok(LineCells {
        base_price: format!("{base}"),
        final_price: format!("{final_price}"),
        savings: format!(
            "({}%) -{savings}",
            percent_points_from_fractional_percentage(percent)
        ),
    })
}

fn write_line_table(
    out: &mut impl io::Write,
    builder: Builder,
    brand_boundary_rows: &[usize],
    color_ops: SmallVec<[(usize, usize, Color); 32]>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    for &row in brand_boundary_rows {
        if row > 1 {
            theme.insert_horizontal_line(row, separator);
        }
    }

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..7), Alignment::right());

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)
}

/// Borderless two-column table: one row per stage that took something off,
/// the vouchers behind them in grey, then the payable total and savings.
fn write_summary(
    out: &mut impl io::Write,
    summary: &CheckoutSummary<'_>,
) -> Result<(), ReceiptError> {
    let mut builder = Builder::default();
    let mut muted_rows: SmallVec<[usize; 8]> = smallvec![];
    let mut row = 0;

    builder.push_record([
        "Subtotal:".to_string(),
        summary.totals().total_product_cost.to_string(),
    ]);
    row += 1;

    for record in summary.records() {
        if record.discount.to_minor_units() == 0 {
            continue;
        }

        builder.push_record([format!("{}:", record.stage), format!("-{}", record.discount)]);
        row += 1;

        let vouchers: SmallVec<[(String, String); 4]> = match record.stage {
            Stage::ProductDiscounts => smallvec![],
            Stage::BrandVouchers => summary
                .brand_discounts()
                .iter()
                .map(|applied| {
                    (
                        format!("{} ({})", applied.brand, applied.voucher),
                        format!("-{}", applied.discount),
                    )
                })
                .collect(),
            Stage::PlatformVoucher => summary
                .platform_voucher()
                .map(|code| (code.to_string(), format!("-{}", record.discount)))
                .into_iter()
                .collect(),
        };

        for (label, value) in vouchers {
            builder.push_record([label, value]);
            muted_rows.push(row);
            row += 1;
        }
    }

    let total_row = row;
    builder.push_record(["Total:".to_string(), summary.payable().to_string()]);

    let savings_points = percent_points_from_fractional_percentage(summary.savings_percent()?);

    builder.push_record([
        "Savings:".to_string(),
        format!("({savings_points:.2}%) {}", summary.savings()?),
    ]);

    let mut table = builder.build();

    table.with(Style::empty());
    table.modify(Columns::new(0..2), Alignment::right());

    for muted_row in muted_rows {
        table.modify((muted_row, 0), muted());
        table.modify((muted_row, 1), muted());
    }

    table.modify((total_row, 0), Color::BOLD);
    table.modify((total_row, 1), Color::BOLD);

    writeln!(out, "{table}\n").map_err(|_err| ReceiptError::IO)
}

/// `part / whole` as a fraction; zero when `whole` is zero.
fn fraction_of(part: Money<'_, Currency>, whole: Money<'_, Currency>) -> Percentage {
    let whole_minor = whole.to_minor_units();

    if whole_minor == 0 {
        return Percentage::from(0.0);
    }

    Percentage::from(Decimal::from(part.to_minor_units()) / Decimal::from(whole_minor))
}

/// Converts a fractional percentage to percent points for display.
fn percent_points_from_fractional_percentage(percentage: Percentage) -> Decimal {
    // `Percentage` is a fraction (e.g. 0.25), so multiply by 100 to print percent points.
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Grey text for quantities and voucher breakdown rows.
fn muted() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}
