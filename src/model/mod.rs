//! Pure data structures: the records the market actor owns.

pub mod cart;
pub mod deletion;
pub mod dispute;
pub mod ids;
pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use cart::*;
pub use deletion::*;
pub use dispute::*;
pub use ids::*;
pub use order::*;
pub use payment::*;
pub use product::*;
pub use user::*;

use rust_decimal::Decimal;

/// Rescales an amount to exactly two decimal places (`20` becomes `20.00`).
pub fn money(amount: Decimal) -> Decimal {
    let mut amount = amount.round_dp(2);
    amount.rescale(2);
    amount
}

/// Adds up line amounts, returning `None` on overflow.
pub fn checked_sum<I>(amounts: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount?))
}
