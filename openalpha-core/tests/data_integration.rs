//! Integration tests: synthetic market → Parquet store → alpha run.

use std::sync::Arc;

use openalpha_core::data::{
    generate_market, DataProvider, MemoryProvider, ParquetStore, SyntheticConfig, CLOSE, LIQUIDITY,
    SECTOR,
};
use openalpha_core::{create_generator, Alpha, ParamMap};

fn small_market() -> SyntheticConfig {
    SyntheticConfig {
        num_dates: 30,
        num_symbols: 16,
        num_sectors: 4,
        seed: 7,
        ..SyntheticConfig::default()
    }
}

fn params(pairs: &[(&str, &str)]) -> ParamMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn run(data: Arc<dyn DataProvider>, options: &ParamMap) -> Alpha {
    let generator = create_generator("reversal", options).unwrap();
    let mut alpha = Alpha::initialize("rev", options.clone(), data, generator).unwrap();
    for date in 0..alpha.num_dates() {
        alpha.step(date);
    }
    alpha
}

#[test]
fn store_roundtrip_preserves_panels() {
    let dir = tempfile::tempdir().unwrap();
    let market = generate_market(&small_market()).unwrap();
    let store = ParquetStore::new(dir.path());
    market.write_to(&store).unwrap();

    let calendar = store.calendar().unwrap();
    assert_eq!(*calendar, market.calendar);

    for name in [CLOSE, LIQUIDITY, SECTOR] {
        let stored = store.get(name).unwrap();
        let original = market.datasets.iter().find(|d| d.name() == name).unwrap();
        assert_eq!(stored.kind(), original.kind());
        for date in [0, 10, 29] {
            for symbol in [0, 7, 15] {
                let (a, b) = (stored.value_f64(date, symbol), original.value_f64(date, symbol));
                assert!(a == b || (a.is_nan() && b.is_nan()), "{name}[{date},{symbol}]");
            }
        }
    }
}

#[test]
fn store_and_memory_runs_agree() {
    let dir = tempfile::tempdir().unwrap();
    let market = generate_market(&small_market()).unwrap();
    let store = ParquetStore::new(dir.path());
    market.write_to(&store).unwrap();

    let options = params(&[
        ("window", "3"),
        ("decay", "2"),
        ("neutralization", "sector"),
        ("max_stock_weight", "0.2"),
        ("book_size", "1000000"),
    ]);
    let from_store = run(Arc::new(store), &options);
    let from_memory = run(Arc::new(market.into_provider()), &options);

    let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(from_store.daily_returns()), bits(from_memory.daily_returns()));
    assert_eq!(bits(from_store.daily_turnover()), bits(from_memory.daily_turnover()));
    assert!(from_store.daily_returns().iter().any(|r| r.is_finite()));
}

#[test]
fn missing_liquidity_leaves_universe_empty() {
    let market = generate_market(&small_market()).unwrap();
    let mut provider = MemoryProvider::new(market.calendar.clone());
    for dataset in market.datasets {
        if dataset.name() != LIQUIDITY {
            provider.insert(dataset);
        }
    }

    let alpha = run(Arc::new(provider), &ParamMap::new());
    for date in 0..alpha.num_dates() {
        assert!(alpha.grid().valid_row(date).iter().all(|v| !v));
        assert!(alpha.daily_returns()[date].is_nan());
    }
}

#[test]
fn positions_respect_book_and_neutrality() {
    let market = generate_market(&small_market()).unwrap();
    let options = params(&[("window", "2"), ("book_size", "100000")]);
    let alpha = run(Arc::new(market.into_provider()), &options);

    let held: Vec<f64> = alpha
        .positions()
        .iter()
        .copied()
        .filter(|p| !p.is_nan())
        .collect();
    assert!(!held.is_empty());
    let gross: f64 = held.iter().map(|p| p.abs()).sum();
    let net: f64 = held.iter().sum();
    assert!((gross - 100_000.0).abs() <= 0.5 * held.len() as f64);
    assert!(net.abs() <= 0.5 * held.len() as f64 + 1e-6);
}
