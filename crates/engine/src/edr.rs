//! EDR estimation: canonical day records to enriched snapshots.
//!
//! A row-wise pure transform with no cross-row or cross-day dependency.
//! Every missing field resolves to a documented default; nothing in here is
//! fatal for a record that parsed.

use quant::stats;
use types::{DayDate, EdrParams, Snapshot, TitleRecord};

use crate::error::Result;

/// Estimate EDR for one day's worth of canonical records.
///
/// Validates the parameters once, then applies the row-wise model to each
/// record. Re-running on identical input yields identical output.
pub fn estimate_day(
    records: &[TitleRecord],
    snapshot_date: DayDate,
    params: &EdrParams,
) -> Result<Vec<Snapshot>> {
    params.validate()?;
    Ok(records
        .iter()
        .map(|record| estimate_record(record, snapshot_date, params))
        .collect())
}

/// Apply the EDR model to a single record.
fn estimate_record(record: &TitleRecord, snapshot_date: DayDate, params: &EdrParams) -> Snapshot {
    let avg_ccu = resolve_ccu(record);
    let visits = record.visits.unwrap_or(0.0);
    let favorites = record.favorites.unwrap_or(0.0);
    let likes = record.likes.unwrap_or(0.0);

    let monetization_count = resolve_monetization_count(record);
    let prices = price_list(record);
    let median_price = stats::median(&prices).unwrap_or(0.0);
    let price_dispersion = stats::coefficient_of_variation(&prices).unwrap_or(0.0);

    let raw_rate = 0.5 * (safe_rate(favorites, visits) + safe_rate(likes, visits));
    let engagement_score = (raw_rate * params.engagement_scale).clamp(0.0, params.engagement_cap);

    let dau_est = (params.alpha * avg_ccu).max(0.0);
    let pcr = (params.base_rate * (1.0 + monetization_count).ln())
        .clamp(params.pcr_floor, params.pcr_cap);
    let aspu = (median_price * (1.0 + price_dispersion)).max(0.0);

    let spend_revenue = dau_est * pcr * aspu;
    let premium_revenue = params.gamma * dau_est * engagement_score;
    let edr_raw = (spend_revenue + premium_revenue).max(0.0);

    Snapshot {
        universe_id: record.universe_id,
        snapshot_date,
        name: record.name.clone().unwrap_or_default(),
        developer: record.developer.clone().unwrap_or_default(),
        avg_ccu,
        visits,
        favorites,
        likes,
        monetization_count,
        median_price,
        price_dispersion,
        engagement_score,
        dau_est,
        pcr,
        aspu,
        spend_revenue,
        premium_revenue,
        edr_raw,
    }
}

/// First available player-count source field, floored at zero.
fn resolve_ccu(record: &TitleRecord) -> f64 {
    [
        record.avg_ccu,
        record.players,
        record.playing,
        record.ccu,
        record.concurrent_players,
    ]
    .into_iter()
    .flatten()
    .next()
    .unwrap_or(0.0)
    .max(0.0)
}

/// Explicit monetization count, then per-kind counts, then catalog sizes.
fn resolve_monetization_count(record: &TitleRecord) -> f64 {
    let count = if let Some(count) = record.monetization_count {
        count
    } else if record.num_gamepasses.is_some() || record.num_devproducts.is_some() {
        record.num_gamepasses.unwrap_or(0.0) + record.num_devproducts.unwrap_or(0.0)
    } else {
        (record.game_passes.len() + record.dev_products.len()) as f64
    };
    count.max(0.0)
}

/// Numeric prices from both catalogs; malformed entries carry no price and
/// are skipped.
fn price_list(record: &TitleRecord) -> Vec<f64> {
    record
        .game_passes
        .iter()
        .chain(record.dev_products.iter())
        .filter_map(|entry| entry.price)
        .filter(|price| price.is_finite())
        .collect()
}

/// Rate with a zero-denominator guard; never NaN.
fn safe_rate(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{CatalogEntry, UniverseId};

    fn day() -> DayDate {
        DayDate::from_ymd_opt(2026, 1, 5).unwrap()
    }

    fn base_record(id: u64) -> TitleRecord {
        TitleRecord {
            universe_id: UniverseId(id),
            ..TitleRecord::default()
        }
    }

    #[test]
    fn test_floor_pcr_zero_catalog_scenario() {
        // avg_ccu=10, alpha=20, no catalog, no engagement.
        let record = TitleRecord {
            avg_ccu: Some(10.0),
            ..base_record(1)
        };
        let params = EdrParams {
            alpha: 20.0,
            base_rate: 0.01,
            pcr_floor: 0.001,
            pcr_cap: 0.05,
            ..EdrParams::default()
        };

        let snap = &estimate_day(&[record], day(), &params).unwrap()[0];
        assert_eq!(snap.dau_est, 200.0);
        // ln(1) = 0, so the floor applies even with zero monetization.
        assert_eq!(snap.pcr, 0.001);
        assert_eq!(snap.aspu, 0.0);
        assert_eq!(snap.spend_revenue, 0.0);
        assert_eq!(snap.premium_revenue, 0.0);
        assert_eq!(snap.edr_raw, 0.0);
    }

    #[test]
    fn test_player_count_fallback_order() {
        let record = TitleRecord {
            players: Some(50.0),
            ccu: Some(10.0),
            ..base_record(1)
        };
        let snap = &estimate_day(&[record], day(), &EdrParams::default()).unwrap()[0];
        assert_eq!(snap.avg_ccu, 50.0);

        let record = TitleRecord {
            avg_ccu: Some(5.0),
            players: Some(50.0),
            ..base_record(2)
        };
        let snap = &estimate_day(&[record], day(), &EdrParams::default()).unwrap()[0];
        assert_eq!(snap.avg_ccu, 5.0);

        let snap = &estimate_day(&[base_record(3)], day(), &EdrParams::default()).unwrap()[0];
        assert_eq!(snap.avg_ccu, 0.0);
    }

    #[test]
    fn test_monetization_count_precedence() {
        // Explicit count wins over everything.
        let record = TitleRecord {
            monetization_count: Some(4.0),
            num_gamepasses: Some(9.0),
            game_passes: vec![CatalogEntry::priced(10.0)],
            ..base_record(1)
        };
        let snap = &estimate_day(&[record], day(), &EdrParams::default()).unwrap()[0];
        assert_eq!(snap.monetization_count, 4.0);

        // Per-kind counts next.
        let record = TitleRecord {
            num_gamepasses: Some(2.0),
            num_devproducts: Some(3.0),
            game_passes: vec![CatalogEntry::priced(10.0)],
            ..base_record(2)
        };
        let snap = &estimate_day(&[record], day(), &EdrParams::default()).unwrap()[0];
        assert_eq!(snap.monetization_count, 5.0);

        // Catalog sizes last; entries without usable prices still count.
        let record = TitleRecord {
            game_passes: vec![CatalogEntry::priced(10.0), CatalogEntry::default()],
            dev_products: vec![CatalogEntry::priced(25.0)],
            ..base_record(3)
        };
        let snap = &estimate_day(&[record], day(), &EdrParams::default()).unwrap()[0];
        assert_eq!(snap.monetization_count, 3.0);
    }

    #[test]
    fn test_median_and_dispersion_reorder_invariant() {
        let prices = [99.0, 25.0, 400.0, 10.0];
        let forward = TitleRecord {
            game_passes: prices.iter().map(|p| CatalogEntry::priced(*p)).collect(),
            ..base_record(1)
        };
        let reversed = TitleRecord {
            game_passes: prices
                .iter()
                .rev()
                .map(|p| CatalogEntry::priced(*p))
                .collect(),
            ..base_record(1)
        };

        let params = EdrParams::default();
        let a = &estimate_day(&[forward], day(), &params).unwrap()[0];
        let b = &estimate_day(&[reversed], day(), &params).unwrap()[0];
        assert_eq!(a.median_price, b.median_price);
        assert_eq!(a.price_dispersion, b.price_dispersion);
        assert_eq!(a.median_price, (25.0 + 99.0) / 2.0);
    }

    #[test]
    fn test_engagement_zero_visits_never_nan() {
        let record = TitleRecord {
            favorites: Some(1000.0),
            likes: Some(500.0),
            visits: Some(0.0),
            ..base_record(1)
        };
        let snap = &estimate_day(&[record], day(), &EdrParams::default()).unwrap()[0];
        assert_eq!(snap.engagement_score, 0.0);
    }

    #[test]
    fn test_engagement_clipped_to_cap() {
        let params = EdrParams::default();
        let record = TitleRecord {
            visits: Some(100.0),
            favorites: Some(90.0),
            likes: Some(80.0),
            ..base_record(1)
        };
        // raw = 0.5*(0.9+0.8) = 0.85, scaled by 50 → well past the cap.
        let snap = &estimate_day(&[record], day(), &params).unwrap()[0];
        assert_eq!(snap.engagement_score, params.engagement_cap);
    }

    #[test]
    fn test_snapshot_invariants_hold() {
        let params = EdrParams::default();
        let records = vec![
            TitleRecord {
                players: Some(321.0),
                visits: Some(10_000.0),
                favorites: Some(800.0),
                likes: Some(650.0),
                game_passes: vec![CatalogEntry::priced(49.0), CatalogEntry::priced(199.0)],
                dev_products: vec![CatalogEntry::priced(10.0)],
                ..base_record(1)
            },
            TitleRecord {
                ccu: Some(12.0),
                num_devproducts: Some(40.0),
                ..base_record(2)
            },
            base_record(3),
        ];

        for snap in estimate_day(&records, day(), &params).unwrap() {
            assert!(snap.engagement_score >= 0.0);
            assert!(snap.engagement_score <= params.engagement_cap);
            assert!(snap.pcr >= params.pcr_floor);
            assert!(snap.pcr <= params.pcr_cap);
            assert!(snap.edr_raw >= 0.0);
            assert!(snap.avg_ccu >= 0.0);
        }
    }

    #[test]
    fn test_estimation_is_idempotent() {
        let records = vec![TitleRecord {
            players: Some(77.0),
            visits: Some(5000.0),
            favorites: Some(120.0),
            likes: Some(90.0),
            game_passes: vec![CatalogEntry::priced(25.0), CatalogEntry::priced(75.0)],
            ..base_record(9)
        }];
        let params = EdrParams::default();

        let first = estimate_day(&records, day(), &params).unwrap();
        let second = estimate_day(&records, day(), &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = EdrParams::default().with_pcr_bounds(0.5, 0.1);
        assert!(estimate_day(&[], day(), &params).is_err());
    }
}
