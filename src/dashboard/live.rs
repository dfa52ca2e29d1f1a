//! Simulated real-time updates of the dashboard statistics.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dom::Document;
use crate::page::effects::Counter;

pub const UPDATE_INTERVAL_MS: u64 = 30_000;

/// Duration of the animation towards a new value.
pub const CHANGE_ANIMATION_MS: u64 = 500;

#[derive(Debug)]
pub struct LiveStats {
    rng: StdRng,
}

impl LiveStats {
    pub fn new() -> Self {
        LiveStats { rng: StdRng::from_entropy() }
    }

    pub fn with_seed(seed: u64) -> Self {
        LiveStats { rng: StdRng::seed_from_u64(seed) }
    }

    /// Picks one random `.stat-value[data-live]` and a new value within -2..=2 of the current one,
    /// never below zero. Returns the animation towards that value.
    pub fn tick(&mut self, doc: &Document) -> Result<Option<Counter>> {
        let stats = doc.select_all(".stat-value[data-live]")?;
        if stats.is_empty() {
            return Ok(None);
        }

        let stat = stats[self.rng.gen_range(0..stats.len())];
        let digits = doc.text(stat).chars().filter(char::is_ascii_digit).collect::<String>();
        let current = digits.parse::<i64>().unwrap_or(0);
        let change = self.rng.gen_range(-2..=2);
        let value = (current + change).max(0);

        Ok(Some(Counter::between(stat, current, value, CHANGE_ANIMATION_MS)))
    }
}

impl Default for LiveStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::page::effects::format_thousands;

    #[test]
    fn test_stat_stays_close_and_positive() -> Result<()> {
        let mut doc = Document::parse(
            r#"<html><body><div class="stat-value" data-live>1,204</div><div class="stat-value" data-live>1</div>
               <div class="stat-value">77</div></body></html>"#
        );
        let mut live = LiveStats::with_seed(42);

        for _ in 0..50 {
            let change = live.tick(&doc)?.unwrap();
            assert!(doc.has_attr(change.node, "data-live"));
            assert!((change.target - change.start).abs() <= 2);
            assert!(change.target >= 0);
            assert_eq!(CHANGE_ANIMATION_MS, change.duration);
            assert!(change.render(&mut doc, CHANGE_ANIMATION_MS));
            assert_eq!(format_thousands(change.target), doc.text(change.node));
        }

        let values = doc.select_all(".stat-value[data-live]")?.into_iter()
            .map(|s| doc.text(s).replace(',', "").parse::<i64>().unwrap())
            .collect::<Vec<_>>();
        assert!((1104..=1304).contains(&values[0]));
        assert!(values[1] >= 0);

        let fixed = doc.select_first(".stat-value:not([data-live])")?.unwrap();
        assert_eq!("77", doc.text(fixed));
        Ok(())
    }
}
