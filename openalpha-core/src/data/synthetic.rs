//! Synthetic market generation.
//!
//! Produces a deterministic business-day calendar, random-walk closes, a
//! 60-day average dollar volume panel and a sector/industry/subindustry
//! hierarchy. Useful for demos, tests and benchmarks when no real store exists.

use super::memory::MemoryProvider;
use super::provider::{Calendar, DataError, Dataset};
use super::store::ParquetStore;
use super::{CLOSE, INDUSTRY, LIQUIDITY, SECTOR, SUBINDUSTRY};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ADV_WINDOW: usize = 60;

/// Shape and seed of a synthetic market.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub num_dates: usize,
    pub num_symbols: usize,
    pub num_sectors: usize,
    pub start: NaiveDate,
    pub seed: u64,
    /// Probability that any single close is missing.
    pub missing_rate: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            num_dates: 252,
            num_symbols: 100,
            num_sectors: 8,
            start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            seed: 42,
            missing_rate: 0.0,
        }
    }
}

/// A generated calendar plus its panels.
#[derive(Debug, Clone)]
pub struct SyntheticMarket {
    pub calendar: Calendar,
    pub datasets: Vec<Dataset>,
}

impl SyntheticMarket {
    pub fn into_provider(self) -> MemoryProvider {
        let mut provider = MemoryProvider::new(self.calendar);
        for dataset in self.datasets {
            provider.insert(dataset);
        }
        provider
    }

    /// Persist the calendar and every panel into a Parquet store.
    pub fn write_to(&self, store: &ParquetStore) -> Result<(), DataError> {
        store.write_calendar(&self.calendar)?;
        for dataset in &self.datasets {
            store.write(dataset, &self.calendar)?;
        }
        Ok(())
    }
}

/// Business days starting at `start`, as `yyyymmdd` integers.
pub fn business_days(start: NaiveDate, count: usize) -> Vec<i64> {
    let mut dates = Vec::with_capacity(count);
    let mut current = start;
    while dates.len() < count {
        let weekday = current.weekday();
        if weekday != Weekday::Sat && weekday != Weekday::Sun {
            dates.push(
                current.year() as i64 * 10_000 + current.month() as i64 * 100 + current.day() as i64,
            );
        }
        current += chrono::Duration::days(1);
    }
    dates
}

/// Generate a synthetic market. Same config, same market.
pub fn generate_market(config: &SyntheticConfig) -> Result<SyntheticMarket, DataError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let nd = config.num_dates;
    let ns = config.num_symbols;
    let num_sectors = config.num_sectors.max(1) as i64;

    let dates = business_days(config.start, nd);
    let symbols: Vec<String> = (0..ns).map(|i| format!("SYM{i:04}")).collect();

    // Static classification: sector -> 3 industries -> 2 subindustries each.
    let sector: Vec<i64> = (0..ns).map(|_| rng.gen_range(1..=num_sectors)).collect();
    let industry: Vec<i64> = sector
        .iter()
        .map(|s| s * 10 + rng.gen_range(1..=3))
        .collect();
    let subindustry: Vec<i64> = industry
        .iter()
        .map(|i| i * 10 + rng.gen_range(1..=2))
        .collect();
    let sector_drift: Vec<f64> = (0..num_sectors).map(|_| rng.gen_range(-0.0005..0.0005)).collect();
    let base_volume: Vec<f64> = (0..ns).map(|_| 10f64.powf(rng.gen_range(4.0..7.0))).collect();

    let mut close = vec![f64::NAN; nd * ns];
    let mut dollar_volume = vec![f64::NAN; nd * ns];
    let mut price: Vec<f64> = (0..ns).map(|_| rng.gen_range(10.0..200.0)).collect();

    for d in 0..nd {
        for s in 0..ns {
            let drift = sector_drift[(sector[s] - 1) as usize];
            let daily_return: f64 = drift + rng.gen_range(-0.03..0.03);
            price[s] *= 1.0 + daily_return;
            let volume = base_volume[s] * rng.gen_range(0.5..1.5);
            dollar_volume[d * ns + s] = price[s] * volume;
            if config.missing_rate <= 0.0 || !rng.gen_bool(config.missing_rate.min(1.0)) {
                close[d * ns + s] = price[s];
            }
        }
    }

    let adv = trailing_mean(&dollar_volume, nd, ns, ADV_WINDOW);

    let static_panel = |ids: &[i64]| -> Vec<Option<i64>> {
        (0..nd).flat_map(|_| ids.iter().map(|&id| Some(id))).collect()
    };

    let datasets = vec![
        Dataset::float(CLOSE, nd, ns, close)?,
        Dataset::float(LIQUIDITY, nd, ns, adv)?,
        Dataset::int(SECTOR, nd, ns, static_panel(&sector))?,
        Dataset::int(INDUSTRY, nd, ns, static_panel(&industry))?,
        Dataset::int(SUBINDUSTRY, nd, ns, static_panel(&subindustry))?,
    ];

    Ok(SyntheticMarket {
        calendar: Calendar::new(dates, symbols),
        datasets,
    })
}

/// Trailing mean over up to `window` dates, ignoring NaN entries.
fn trailing_mean(values: &[f64], nd: usize, ns: usize, window: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; nd * ns];
    for s in 0..ns {
        for d in 0..nd {
            let from = (d + 1).saturating_sub(window);
            let (sum, count) = (from..=d)
                .map(|k| values[k * ns + s])
                .filter(|v| v.is_finite())
                .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
            if count > 0 {
                out[d * ns + s] = sum / count as f64;
            }
        }
    }
    out
}
