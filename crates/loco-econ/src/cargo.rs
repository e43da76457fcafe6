//! Cargo objects and the delivered-cargo payment formula.

use serde::{Deserialize, Serialize};

/// Payment parameters of one cargo type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoObject {
    pub name: String,
    /// Base payment per unit and distance, before inflation.
    pub payment_factor: u16,
    /// Which inflation factor scales the payment.
    pub payment_index: u8,
    /// Days paid at the full rate.
    pub premium_days: u8,
    /// Days paid at the reduced rate after the premium window.
    pub max_non_premium_days: u8,
    pub non_premium_rate: u16,
    pub penalty_rate: u16,
}

impl CargoObject {
    /// Payment factor after lateness reductions, still before inflation.
    ///
    /// The factor is held in 16.16 fixed point while the reductions are
    /// applied; each reduction clamps at zero.
    pub fn adjusted_payment_factor(&self, num_days: u16) -> i64 {
        let factor = i64::from(self.payment_factor);
        let mut percent = factor << 16;
        let mut reduce = |rate: i64| {
            percent = (percent - factor * rate).max(0);
        };

        let non_premium_days = i64::from(num_days) - i64::from(self.premium_days);
        if non_premium_days > 0 {
            let max_non_premium = i64::from(self.max_non_premium_days);
            reduce(i64::from(self.non_premium_rate) * non_premium_days.min(max_non_premium));
            let penalty_days = (non_premium_days - max_non_premium).min(255);
            if penalty_days > 0 {
                reduce(i64::from(self.penalty_rate) * penalty_days);
            }
        }
        percent >> 16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CargoObject {
        CargoObject {
            name: "Goods".into(),
            payment_factor: 100,
            payment_index: 0,
            premium_days: 5,
            max_non_premium_days: 20,
            non_premium_rate: 100,
            penalty_rate: 200,
        }
    }

    #[test]
    fn premium_window_pays_full_factor() {
        assert_eq!(sample().adjusted_payment_factor(0), 100);
        assert_eq!(sample().adjusted_payment_factor(5), 100);
    }

    #[test]
    fn late_delivery_reduces_factor() {
        assert_eq!(sample().adjusted_payment_factor(10), 99);
        assert_eq!(sample().adjusted_payment_factor(30), 95);
        assert_eq!(sample().adjusted_payment_factor(400), 19);
    }

    #[test]
    fn reductions_clamp_at_zero() {
        let cargo = CargoObject {
            non_premium_rate: 60_000,
            ..sample()
        };
        assert_eq!(cargo.adjusted_payment_factor(u16::MAX), 0);
    }

    #[test]
    fn parses_from_yaml() {
        let cargo: CargoObject = serde_yaml::from_str(
            "name: Coal\npayment_factor: 3000\npayment_index: 1\npremium_days: 7\n\
             max_non_premium_days: 255\nnon_premium_rate: 7\npenalty_rate: 255\n",
        )
        .unwrap();
        assert_eq!(cargo.payment_factor, 3000);
        assert_eq!(cargo.penalty_rate, 255);
    }
}
