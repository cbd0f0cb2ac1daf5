//! Demo data: a fixed account/campaign catalogue and a synthetic daily
//! history that follows a plausible spend → impressions → clicks → leads /
//! messaging → conversions → revenue funnel.

use chrono::{Duration, NaiveDate};
use insight_core::config::MockConfig;
use insight_core::types::{AdAccount, Campaign, MetricRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn mock_accounts() -> Vec<AdAccount> {
    [
        ("act_1", "Global Marketing", "USD"),
        ("act_2", "E-commerce Branch (EU)", "EUR"),
    ]
    .into_iter()
    .map(|(id, name, currency)| AdAccount {
        id: id.into(),
        name: name.into(),
        currency: currency.into(),
    })
    .collect()
}

pub fn mock_campaigns() -> Vec<Campaign> {
    [
        ("cmp_1", "Summer Sale 2024", "act_1"),
        ("cmp_2", "Brand Awareness", "act_1"),
        ("cmp_3", "Retargeting (VIP)", "act_1"),
        ("cmp_4", "Holiday Collection", "act_2"),
        ("cmp_5", "Spring Refresh", "act_2"),
    ]
    .into_iter()
    .map(|(id, name, account_id)| Campaign {
        id: id.into(),
        name: name.into(),
        account_id: account_id.into(),
    })
    .collect()
}

#[derive(Debug, Clone)]
pub struct MockGenerator {
    history_days: u32,
    seed: Option<u64>,
}

impl MockGenerator {
    pub fn new(config: &MockConfig) -> Self {
        Self {
            history_days: config.history_days.max(1),
            seed: config.seed,
        }
    }

    fn rng_for(&self, campaign_id: &str) -> StdRng {
        match self.seed {
            // same seed + same campaign gives the same history
            Some(seed) => StdRng::seed_from_u64(seed ^ fnv1a(campaign_id)),
            None => StdRng::from_entropy(),
        }
    }

    /// `history_days` consecutive days ending `today`, oldest first.
    pub fn generate(&self, campaign_id: &str, today: NaiveDate) -> Vec<MetricRecord> {
        let mut rng = self.rng_for(campaign_id);
        let days = i64::from(self.history_days);

        (0..days)
            .rev()
            .map(|offset| {
                let date = today - Duration::days(offset);
                synthesize(&mut rng, date, campaign_id)
            })
            .collect()
    }
}

fn synthesize(rng: &mut StdRng, date: NaiveDate, campaign_id: &str) -> MetricRecord {
    let spend = 50.0 + rng.gen::<f64>() * 200.0;
    let impressions = (spend * 100.0 + rng.gen::<f64>() * 500.0).floor() as u64;
    let clicks = (impressions as f64 * (0.005 + rng.gen::<f64>() * 0.025)).floor() as u64;
    let messaging = (clicks as f64 * (0.1 + rng.gen::<f64>() * 0.2)).floor() as u64;
    let leads = (clicks as f64 * (0.05 + rng.gen::<f64>() * 0.15)).floor() as u64;
    let conversions = ((leads + messaging) as f64 * (0.1 + rng.gen::<f64>() * 0.2)).floor() as u64;
    let revenue = conversions as f64 * (20.0 + rng.gen::<f64>() * 100.0);

    MetricRecord {
        date,
        spend: round_cents(spend),
        clicks,
        impressions,
        leads,
        messaging,
        conversions,
        revenue: round_cents(revenue),
        target_id: campaign_id.to_string(),
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}
