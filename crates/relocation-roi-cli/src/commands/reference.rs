use serde_json::json;

use super::{CommandResult, Context};

pub fn run_personas(ctx: &Context) -> CommandResult {
    let results: Vec<_> = ctx
        .catalog
        .personas
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "name": p.name,
                "typical_revenue": p.typical_revenue,
                "risk_tolerance": p.risk_tolerance,
                "success_multiplier": p.success_multiplier,
                "margin_min": p.margin_expectations.0,
                "margin_max": p.margin_expectations.1,
            })
        })
        .collect();
    Ok(json!({ "results": results }))
}

pub fn run_countries(ctx: &Context) -> CommandResult {
    let results: Vec<_> = ctx
        .catalog
        .countries
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "name": c.name,
                "corp_tax": c.corp_tax,
                "pers_tax": c.pers_tax,
                "living_cost": c.living_cost,
                "business_cost": c.business_cost,
                "setup_cost": c.setup_cost,
                "currency": c.currency,
                "market_growth": c.market_growth,
                "primary_visa": c.primary_visa(),
            })
        })
        .collect();
    Ok(json!({ "results": results }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listings_cover_catalog() {
        let ctx = Context::load(None, None).unwrap();
        let personas = run_personas(&ctx).unwrap();
        let countries = run_countries(&ctx).unwrap();
        assert_eq!(personas["results"].as_array().unwrap().len(), 6);
        assert_eq!(countries["results"].as_array().unwrap().len(), 10);
        assert_eq!(countries["results"][0]["id"], "UAE");
    }
}
