//! GST resolver: splits one entered amount into base, GST and total.

use rust_decimal::Decimal;

use dentbooks_forms::GstType;

use crate::numeric::{percent_of, remove_markup, round2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GstSplit {
    pub base: Decimal,
    pub gst: Decimal,
    pub total: Decimal,
}

impl GstSplit {
    /// The amount as entered, with no GST component.
    pub fn passthrough(amount: Decimal) -> Self {
        GstSplit {
            base: amount,
            gst: Decimal::ZERO,
            total: amount,
        }
    }
}

/// Resolve `amount` against a field's GST settings.
///
/// Rules, checked in order:
/// * `manual`: base and the supplied GST are rounded and summed, whatever
///   the rate.
/// * zero rate or no GST type: the amount passes through unrounded.
/// * `inclusive`: GST is backed out of the amount; base and GST are rounded
///   separately and the total stays the entered amount, so the parts may
///   differ from the total by a cent.
/// * `exclusive`: GST is added on top.
pub fn resolve(
    amount: Decimal,
    rate: Decimal,
    gst_type: Option<GstType>,
    manual_gst: Option<Decimal>,
) -> GstSplit {
    match gst_type {
        Some(GstType::Manual) => {
            let base = round2(amount);
            let gst = round2(manual_gst.unwrap_or(Decimal::ZERO));
            GstSplit {
                base,
                gst,
                total: round2(base + gst),
            }
        }
        None => GstSplit::passthrough(amount),
        Some(_) if rate.is_zero() => GstSplit::passthrough(amount),
        Some(GstType::Inclusive) => match remove_markup(amount, rate) {
            Some(ex_gst) => {
                let gst = amount - ex_gst;
                GstSplit {
                    base: round2(amount - gst),
                    gst: round2(gst),
                    total: amount,
                }
            }
            None => {
                tracing::warn!(%rate, "inclusive GST rate has no divisor, treating as zero-rated");
                GstSplit::passthrough(amount)
            }
        },
        Some(GstType::Exclusive) => {
            let gst = round2(percent_of(amount, rate));
            GstSplit {
                base: amount,
                gst,
                total: round2(amount + gst),
            }
        }
    }
}
