use crate::domain::payout::{Payout, PayoutProvider};

/// Picks the settlement rail for a payout.
///
/// An explicit provider always wins. Otherwise Kenyan shilling payouts go over
/// M-Pesa B2C and everything else over Stripe Connect.
pub fn select_provider(payout: &Payout) -> PayoutProvider {
    if let Some(provider) = payout.provider {
        return provider;
    }

    if payout.currency.trim().eq_ignore_ascii_case("KES") {
        PayoutProvider::MpesaB2c
    } else {
        PayoutProvider::StripeConnect
    }
}
