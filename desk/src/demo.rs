//! Demo data generation.

use rand::rngs::StdRng;
use rand::Rng;
use ratedesk_common::{Currency, Money};
use rust_decimal::Decimal;

const TITLES: &[&str] = &[
    "Office chairs",
    "Standing desks",
    "Monitor arms",
    "Conference phones",
    "Whiteboards",
    "Desk lamps",
    "Server rack",
    "Laptop docks",
];

/// Generate demo purchase orders spread across the seeded currencies.
pub fn sample_orders(
    rng: &mut StdRng,
    count: usize,
    currencies: &[(Currency, Decimal)],
) -> Vec<(String, Money)> {
    (0..count)
        .map(|i| {
            let (currency, _) = &currencies[rng.gen_range(0..currencies.len())];
            let value = Decimal::from(rng.gen_range(50..5_000));
            let title = format!("{} #{:03}", TITLES[rng.gen_range(0..TITLES.len())], i + 1);
            (title, Money::new(value, currency.clone()))
        })
        .collect()
}

/// Nudge a seed rate by up to ±2%, or ±40% when `wild` (to provoke a
/// revert from the drift validator).
pub fn nudged_rate(rng: &mut StdRng, seed: Decimal, wild: bool) -> Decimal {
    let span_bps: i64 = if wild { 4_000 } else { 200 };
    let drift = rng.gen_range(-span_bps..=span_bps);
    (seed * (Decimal::from(10_000 + drift) / Decimal::from(10_000))).round_dp(6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rust_decimal_macros::dec;

    #[test]
    fn test_nudged_rate_stays_positive() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            assert!(nudged_rate(&mut rng, dec!(1.0842), true) > Decimal::ZERO);
        }
    }

    #[test]
    fn test_sample_orders_use_seeded_currencies() {
        let mut rng = StdRng::seed_from_u64(7);
        let seeds = [(Currency::eur(), dec!(1.08)), (Currency::jpy(), dec!(0.0067))];

        let orders = sample_orders(&mut rng, 20, &seeds);

        assert_eq!(orders.len(), 20);
        for (_, price) in orders {
            assert!(seeds.iter().any(|(c, _)| *c == price.currency));
        }
    }
}
