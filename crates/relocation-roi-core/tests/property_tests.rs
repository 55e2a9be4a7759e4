use proptest::prelude::*;
use relocation_roi_core::reference::RiskCategory;
use relocation_roi_core::scoring::{score_opportunity, score_risk};
use relocation_roi_core::{compute_base_metrics, CalculationInput, Catalog};

// ===========================================================================
// Clamping and bounds that must hold for any input
// ===========================================================================

fn wide() -> impl Strategy<Value = f64> {
    -1.0e9..1.0e9
}

fn input_strategy() -> impl Strategy<Value = CalculationInput> {
    (
        (wide(), wide(), wide(), wide(), wide(), wide()),
        (wide(), wide(), wide(), 0u32..10_000, wide()),
    )
        .prop_map(
            |(
                (current_revenue, current_margin, current_corp_tax, current_pers_tax, current_living, current_business),
                (revenue_multiplier, margin_improvement, success_probability, time_horizon_months, discount_rate),
            )| CalculationInput {
                current_revenue,
                current_margin,
                current_corp_tax,
                current_pers_tax,
                current_living,
                current_business,
                revenue_multiplier,
                margin_improvement,
                success_probability,
                time_horizon_months,
                discount_rate,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_sanitize_is_idempotent_and_in_range(input in input_strategy()) {
        let once = input.sanitized();
        let twice = once.sanitized();
        prop_assert_eq!(&once, &twice);
        prop_assert!(twice.sanitize().adjustments.is_empty());

        prop_assert!(once.current_revenue >= 1_000.0);
        prop_assert!((1.0..=95.0).contains(&once.current_margin));
        prop_assert!((0.0..=100.0).contains(&once.current_corp_tax));
        prop_assert!((0.0..=100.0).contains(&once.current_pers_tax));
        prop_assert!(once.current_living >= 0.0 && once.current_business >= 0.0);
        prop_assert!(once.revenue_multiplier >= 0.0);
        prop_assert!((0.0..=100.0).contains(&once.success_probability));
        prop_assert!((1..=600).contains(&once.time_horizon_months));
        prop_assert!((0.0..=100.0).contains(&once.discount_rate));
    }

    #[test]
    fn test_projected_margin_never_above_cap(margin in -500.0f64..500.0, improvement in -500.0f64..500.0) {
        let catalog = Catalog::builtin();
        let persona = catalog.persona("ecommerce").unwrap();
        let country = catalog.country("Spain").unwrap();
        let input = CalculationInput {
            current_margin: margin,
            margin_improvement: improvement,
            time_horizon_months: 12,
            ..CalculationInput::for_persona(persona)
        };
        let m = compute_base_metrics(persona, country, &input).unwrap();
        prop_assert!(m.projected_margin <= 95.0);
    }

    #[test]
    fn test_scores_bounded(
        tolerance in -1.0e6f64..1.0e6,
        multiplier in -1.0e3f64..1.0e3,
        weight in -1.0e3f64..1.0e3,
        sentiment in -1.0e3f64..1.0e3,
        growth in -1.0e3f64..1.0e3,
        roi in -1.0e9f64..1.0e9,
        volatility in 0.0f64..1.0e9,
        payback in prop::option::of(0.0f64..100.0),
    ) {
        let catalog = Catalog::builtin();
        let mut persona = catalog.persona("tech_startup").unwrap().clone();
        let mut country = catalog.country("Greece").unwrap().clone();
        persona.risk_tolerance = tolerance;
        persona.success_multiplier = multiplier;
        country.risk_factors.insert(RiskCategory::Political, weight);
        country.sentiment = sentiment;
        country.market_growth = growth;

        let risk = score_risk(&persona, &country, payback, volatility);
        let opportunity = score_opportunity(&persona, &country, roi);
        prop_assert!((0.0..=100.0).contains(&risk.score));
        prop_assert!((0.0..=100.0).contains(&opportunity.score));
    }
}
