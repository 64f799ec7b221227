mod common;

use common::{config, corrupt, elm_street, household, oak_avenue, oversized, store};
use pretty_assertions::assert_eq;
use rental_analytics_core::metrics::PeriodMetrics;
use rental_analytics_core::{portfolio_report, property_report};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn summed(parts: &[&PeriodMetrics]) -> PeriodMetrics {
    let mut total = PeriodMetrics::default();
    for p in parts {
        total += *p;
    }
    total
}

// ===========================================================================
// Additivity
// ===========================================================================

#[test]
fn test_totals_equal_sum_of_properties() {
    let elm = elm_street();
    let oak = oak_avenue();
    let (elm_id, oak_id) = (elm.id(), oak.id());
    let source = store(vec![elm, oak]);

    let portfolio = portfolio_report(&source, household(), 2025, 6, &config()).unwrap();
    let a = property_report(&source, elm_id, 2025, 6, false, &config()).unwrap();
    let b = property_report(&source, oak_id, 2025, 6, false, &config()).unwrap();
    let total = &portfolio.portfolio_total;

    assert_eq!(portfolio.properties.len(), 2);
    assert!(portfolio.skipped.is_empty());
    assert_eq!(total.property_count, 2);
    assert_eq!(total.monthly.metrics, summed(&[&a.monthly.metrics, &b.monthly.metrics]));
    assert_eq!(total.ytd.metrics, summed(&[&a.ytd.metrics, &b.ytd.metrics]));
    assert_eq!(total.quarterly.metrics, summed(&[&a.quarterly.metrics, &b.quarterly.metrics]));
    assert_eq!(
        total.quarterly.turnover_count,
        a.quarterly.turnover.turnover_count + b.quarterly.turnover.turnover_count
    );
    assert_eq!(total.annual.metrics, summed(&[&a.annual.metrics, &b.annual.metrics]));
    assert_eq!(
        total.annual.metrics.noi,
        a.annual.metrics.noi + b.annual.metrics.noi
    );
    assert_eq!(
        total.monthly.metrics.expense_breakdown.management_fee,
        a.monthly.metrics.expense_breakdown.management_fee
            + b.monthly.metrics.expense_breakdown.management_fee
    );
    assert_eq!(total.annual.total_equity_invested, dec!(246000));
}

#[test]
fn test_occupancy_from_summed_counts() {
    let source = store(vec![elm_street(), oak_avenue()]);

    // May: Oak not yet bought, so 1 of 2 units let
    let may = portfolio_report(&source, household(), 2025, 5, &config()).unwrap();
    assert_eq!(may.portfolio_total.monthly.occupancy.rentable_units, 2);
    assert_eq!(may.portfolio_total.monthly.occupancy.occupied_units, 1);
    assert_eq!(may.portfolio_total.monthly.occupancy.occupancy_pct, dec!(50));

    let june = portfolio_report(&source, household(), 2025, 6, &config()).unwrap();
    assert_eq!(june.portfolio_total.monthly.occupancy.occupancy_pct, dec!(100));
}

// ===========================================================================
// Isolation
// ===========================================================================

#[test]
fn test_failing_property_is_skipped_not_fatal() {
    let bad = corrupt();
    let bad_id = bad.id();
    let clean = portfolio_report(
        &store(vec![elm_street(), oak_avenue()]),
        household(),
        2025,
        6,
        &config(),
    )
    .unwrap();

    let elm = elm_street();
    let oak = oak_avenue();
    let with_bad =
        portfolio_report(&store(vec![elm, bad, oak]), household(), 2025, 6, &config()).unwrap();

    assert_eq!(with_bad.properties.len(), 2);
    assert_eq!(with_bad.skipped.len(), 1);
    assert_eq!(with_bad.skipped[0].property_id, bad_id);
    assert!(with_bad.skipped[0].error.contains("payment.amount"));
    assert_eq!(
        with_bad.portfolio_total.annual.metrics,
        clean.portfolio_total.annual.metrics
    );
    assert_eq!(
        with_bad.portfolio_total.monthly.occupancy,
        clean.portfolio_total.monthly.occupancy
    );
}

#[test]
fn test_oversized_amount_is_skipped_not_fatal() {
    let huge = oversized();
    let huge_id = huge.id();
    let clean =
        portfolio_report(&store(vec![elm_street()]), household(), 2025, 6, &config()).unwrap();

    let with_huge =
        portfolio_report(&store(vec![elm_street(), huge]), household(), 2025, 6, &config())
            .unwrap();

    assert_eq!(with_huge.properties.len(), 1);
    assert_eq!(with_huge.skipped.len(), 1);
    assert_eq!(with_huge.skipped[0].property_id, huge_id);
    assert!(with_huge.skipped[0].error.contains("loan.monthly_payment"));
    assert_eq!(with_huge.portfolio_total, clean.portfolio_total);
}

#[test]
fn test_unknown_household_not_found() {
    let err = portfolio_report(&store(vec![]), Uuid::new_v4(), 2025, 6, &config()).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_portfolio_ratios_recomputed() {
    let portfolio =
        portfolio_report(&store(vec![elm_street()]), household(), 2025, 6, &config()).unwrap();
    let total = &portfolio.portfolio_total;
    assert_eq!(total.ytd.cash_on_cash, Some(dec!(4.39)));
    assert_eq!(total.annual.noi_yoy_pct, Some(dec!(-62.6)));
}
