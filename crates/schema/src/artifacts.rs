//! Schema declarations and semantic checks for the pipeline artifacts.

use palco_core::{DataProfile, Findings, ForecastReport, Strategy};

use crate::descriptor::{Field, Schema};
use crate::gate::{Validate, Violation};

fn percentile_triple() -> Schema {
    Schema::Object(vec![
        Field::required("p25", Schema::Number),
        Field::required("p50", Schema::Number),
        Field::required("p75", Schema::Number),
    ])
}

impl Validate for DataProfile {
    fn schema() -> Schema {
        Schema::Object(vec![
            Field::required(
                "population",
                Schema::Object(vec![
                    Field::required("n_customers", Schema::Integer),
                    Field::required("period_days", Schema::Integer),
                ]),
            ),
            Field::required(
                "quality",
                Schema::Object(vec![
                    Field::required("missing_pct", Schema::Number),
                    Field::required("outliers_pct", Schema::Number),
                ]),
            ),
            Field::required(
                "rfm_percentiles",
                Schema::Nullable(Box::new(Schema::Object(vec![
                    Field::required("R", percentile_triple()),
                    Field::required("F", percentile_triple()),
                    Field::required("M", percentile_triple()),
                ]))),
            ),
            Field::required(
                "behavior",
                Schema::Object(vec![
                    Field::required("avg_days_between", Schema::Nullable(Box::new(Schema::Number))),
                    Field::required(
                        "seasonality_hint",
                        Schema::Enum(&["none", "monthly", "weekly", "event_driven"]),
                    ),
                ]),
            ),
            Field::required(
                "music",
                Schema::Object(vec![
                    Field::required(
                        "top_genres",
                        Schema::Array(Box::new(Schema::Object(vec![
                            Field::required("name", Schema::Text),
                            Field::required("share_pct", Schema::Number),
                        ]))),
                    ),
                    Field::required(
                        "cross_affinities",
                        Schema::Array(Box::new(Schema::Pair(
                            Box::new(Schema::Text),
                            Box::new(Schema::Text),
                        ))),
                    ),
                ]),
            ),
            Field::optional("raw_queries", Schema::Any),
        ])
    }

    fn semantic_violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        if let Some(p) = &self.rfm_percentiles {
            for (axis, triple) in [("R", &p.r), ("F", &p.f), ("M", &p.m)] {
                if !(triple.p25 <= triple.p50 && triple.p50 <= triple.p75) {
                    out.push(Violation {
                        path: format!("rfm_percentiles.{axis}"),
                        expected: "p25 <= p50 <= p75".to_string(),
                        actual: format!("p25={}, p50={}, p75={}", triple.p25, triple.p50, triple.p75),
                    });
                }
            }
        }
        for (name, pct) in [
            ("quality.missing_pct", self.quality.missing_pct),
            ("quality.outliers_pct", self.quality.outliers_pct),
        ] {
            if !(0.0..=100.0).contains(&pct) {
                out.push(Violation {
                    path: name.to_string(),
                    expected: "percentage in 0..=100".to_string(),
                    actual: pct.to_string(),
                });
            }
        }
        out
    }
}

impl Validate for Findings {
    fn schema() -> Schema {
        Schema::Object(vec![
            Field::required(
                "key_segments",
                Schema::Array(Box::new(Schema::Object(vec![
                    Field::required("name", Schema::Text),
                    Field::required("size", Schema::Integer),
                    Field::required(
                        "rfm",
                        Schema::Object(vec![
                            Field::optional("R", Schema::Number),
                            Field::optional("F", Schema::Number),
                            Field::optional("M", Schema::Number),
                        ]),
                    ),
                    Field::optional("traits", Schema::Array(Box::new(Schema::Text))),
                    Field::required("evidence", Schema::Array(Box::new(Schema::Text))),
                ]))),
            ),
            Field::required(
                "opportunities",
                Schema::Array(Box::new(Schema::Object(vec![
                    Field::required("hypothesis", Schema::Text),
                    Field::required("evidence", Schema::Array(Box::new(Schema::Text))),
                    Field::required("est_impact", Schema::Text),
                ]))),
            ),
            Field::required(
                "risks",
                Schema::Array(Box::new(Schema::Object(vec![
                    Field::required("desc", Schema::Text),
                    Field::required("evidence", Schema::Array(Box::new(Schema::Text))),
                ]))),
            ),
        ])
    }
}

/// Findings-stage cross check: no segment may claim more customers than
/// the profile's population. Run by the orchestrator after the plain
/// gate, since it needs both artifacts.
pub fn segment_bounds(findings: &Findings, profile: &DataProfile) -> Vec<Violation> {
    let ceiling = profile.population.n_customers;
    findings
        .key_segments
        .iter()
        .enumerate()
        .filter(|(_, seg)| seg.size > ceiling)
        .map(|(i, seg)| Violation {
            path: format!("key_segments[{i}].size"),
            expected: format!("at most n_customers ({ceiling})"),
            actual: seg.size.to_string(),
        })
        .collect()
}

impl Validate for Strategy {
    fn schema() -> Schema {
        Schema::Object(vec![
            Field::required("title", Schema::Text),
            Field::required("target_segment", Schema::Text),
            Field::required("channel", Schema::Array(Box::new(Schema::Text))),
            Field::required(
                "offer",
                Schema::Object(vec![
                    Field::required("type", Schema::Text),
                    Field::required("value", Schema::Text),
                ]),
            ),
            Field::required(
                "timing",
                Schema::Object(vec![
                    Field::required("start_rule", Schema::Text),
                    Field::required("cadence", Schema::Text),
                ]),
            ),
            Field::required(
                "kpi",
                Schema::Object(vec![
                    Field::required("metric", Schema::Text),
                    Field::required("goal", Schema::Text),
                    Field::required("timebox_days", Schema::Integer),
                ]),
            ),
            Field::required("rationale", Schema::Array(Box::new(Schema::Text))),
            Field::required(
                "constraints_check",
                Schema::Object(vec![
                    Field::required("capacity_ok", Schema::Bool),
                    Field::required("margin_ok", Schema::Bool),
                ]),
            ),
            Field::optional(
                "predicted_uplift",
                Schema::Object(vec![
                    Field::required("method", Schema::Text),
                    Field::required("value_pct", Schema::Number),
                ]),
            ),
        ])
    }

    fn semantic_violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        if self.kpi.timebox_days == 0 {
            out.push(Violation {
                path: "kpi.timebox_days".to_string(),
                expected: "positive integer".to_string(),
                actual: "0".to_string(),
            });
        }
        out
    }
}

impl Validate for ForecastReport {
    fn schema() -> Schema {
        let nullable_number = || Schema::Nullable(Box::new(Schema::Number));
        Schema::Object(vec![
            Field::required(
                "metrics",
                Schema::Object(vec![
                    Field::required("tickets_r2", nullable_number()),
                    Field::required("tickets_mae", nullable_number()),
                    Field::required("revenue_r2", nullable_number()),
                    Field::required("revenue_mae", nullable_number()),
                ]),
            ),
            Field::required("forecast", Schema::Array(Box::new(Schema::Any))),
            Field::required(
                "summary",
                Schema::Object(vec![
                    Field::required("total_events", Schema::Integer),
                    Field::required("sum_pred_tickets", Schema::Integer),
                    Field::required("sum_pred_revenue", Schema::Number),
                    Field::required("top5_by_revenue", Schema::Array(Box::new(Schema::Any))),
                ]),
            ),
        ])
    }

    fn semantic_violations(&self) -> Vec<Violation> {
        let mut out = Vec::new();
        if self.summary.total_events != self.forecast.len() as u64 {
            out.push(Violation {
                path: "summary.total_events".to_string(),
                expected: format!("forecast length ({})", self.forecast.len()),
                actual: self.summary.total_events.to_string(),
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::validate;
    use serde_json::{json, Value};

    fn profile_value() -> Value {
        json!({
            "population": { "n_customers": 1200, "period_days": 365 },
            "quality": { "missing_pct": 2.5, "outliers_pct": 0.8 },
            "rfm_percentiles": {
                "R": { "p25": 20.0, "p50": 45.0, "p75": 180.0 },
                "F": { "p25": 1.0, "p50": 2.0, "p75": 5.0 },
                "M": { "p25": 120.0, "p50": 300.0, "p75": 800.0 }
            },
            "behavior": { "avg_days_between": 42.5, "seasonality_hint": "monthly" },
            "music": {
                "top_genres": [ { "name": "sertanejo", "share_pct": 38.0 } ],
                "cross_affinities": [ ["sertanejo", "pagode"] ]
            }
        })
    }

    fn strategy_value() -> Value {
        json!({
            "title": "WhatsApp reactivation",
            "target_segment": "850 at-risk high spenders",
            "channel": ["whatsapp"],
            "offer": { "type": "discount", "value": "R$50" },
            "timing": { "start_rule": "campaign_start", "cadence": "2 touches / week" },
            "kpi": { "metric": "reactivation_rate", "goal": "12%", "timebox_days": 30 },
            "rationale": ["recency above P75 with monetary above P75"],
            "constraints_check": { "capacity_ok": true, "margin_ok": true }
        })
    }

    #[test]
    fn accepts_valid_profile() {
        let profile: DataProfile = validate(&profile_value()).unwrap();
        assert_eq!(profile.population.n_customers, 1200);
    }

    #[test]
    fn null_percentiles_are_valid() {
        let mut raw = profile_value();
        raw["rfm_percentiles"] = Value::Null;
        let profile: DataProfile = validate(&raw).unwrap();
        assert!(profile.rfm_percentiles.is_none());
    }

    #[test]
    fn rejects_non_monotonic_percentiles() {
        let mut raw = profile_value();
        raw["rfm_percentiles"]["F"]["p50"] = json!(0.5);
        let err = validate::<DataProfile>(&raw).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].path, "rfm_percentiles.F");
    }

    #[test]
    fn rejects_unknown_seasonality() {
        let mut raw = profile_value();
        raw["behavior"]["seasonality_hint"] = json!("yearly");
        let err = validate::<DataProfile>(&raw).unwrap_err();
        assert_eq!(err.violations[0].path, "behavior.seasonality_hint");
    }

    #[test]
    fn reports_every_missing_field_at_once() {
        let raw = json!({ "population": { "n_customers": 10 } });
        let err = validate::<DataProfile>(&raw).unwrap_err();
        let paths: Vec<&str> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert!(paths.contains(&"population.period_days"));
        assert!(paths.contains(&"quality"));
        assert!(paths.contains(&"rfm_percentiles"));
        assert!(paths.contains(&"behavior"));
        assert!(paths.contains(&"music"));
    }

    #[test]
    fn revalidation_is_idempotent() {
        let profile: DataProfile = validate(&profile_value()).unwrap();
        let again = serde_json::to_value(&profile).unwrap();
        let profile2: DataProfile = validate(&again).unwrap();
        assert_eq!(profile, profile2);
    }

    #[test]
    fn accepts_valid_strategy() {
        let strategy: Strategy = validate(&strategy_value()).unwrap();
        assert_eq!(strategy.kpi.timebox_days, 30);
    }

    #[test]
    fn rejects_zero_timebox() {
        let mut raw = strategy_value();
        raw["kpi"]["timebox_days"] = json!(0);
        let err = validate::<Strategy>(&raw).unwrap_err();
        assert_eq!(err.violations[0].path, "kpi.timebox_days");
    }

    #[test]
    fn accepts_any_accepted_integer_without_a_pathless_failure() {
        // Every value the structural walk admits must also deserialize,
        // so a failure always names a concrete field path.
        let mut raw = strategy_value();
        raw["kpi"]["timebox_days"] = json!(u64::from(u32::MAX) + 1);
        let strategy: Strategy = validate(&raw).unwrap();
        assert_eq!(strategy.kpi.timebox_days, u64::from(u32::MAX) + 1);
    }

    #[test]
    fn rejects_missing_constraint_bool() {
        let mut raw = strategy_value();
        raw["constraints_check"] = json!({ "capacity_ok": true });
        let err = validate::<Strategy>(&raw).unwrap_err();
        assert_eq!(err.violations[0].path, "constraints_check.margin_ok");
    }

    #[test]
    fn findings_partial_rfm_allows_missing_axes() {
        let raw = json!({
            "key_segments": [
                { "name": "high value", "size": 850, "rfm": { "M": 800.0 }, "evidence": ["P75"] }
            ],
            "opportunities": [],
            "risks": []
        });
        let findings: Findings = validate(&raw).unwrap();
        assert_eq!(findings.key_segments[0].rfm.m, Some(800.0));
        assert_eq!(findings.key_segments[0].rfm.r, None);
    }

    #[test]
    fn segment_bounds_flags_oversized_segments() {
        let profile: DataProfile = validate(&profile_value()).unwrap();
        let raw = json!({
            "key_segments": [
                { "name": "ok", "size": 1200, "rfm": {}, "evidence": [] },
                { "name": "too big", "size": 5000, "rfm": {}, "evidence": [] }
            ],
            "opportunities": [],
            "risks": []
        });
        let findings: Findings = validate(&raw).unwrap();
        let violations = segment_bounds(&findings, &profile);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "key_segments[1].size");
    }

    #[test]
    fn forecast_metrics_keys_required_even_when_null() {
        let raw = json!({
            "metrics": { "tickets_mae": null, "revenue_r2": 0.81, "revenue_mae": 150.2 },
            "forecast": [],
            "summary": {
                "total_events": 0, "sum_pred_tickets": 0,
                "sum_pred_revenue": 0.0, "top5_by_revenue": []
            }
        });
        let err = validate::<ForecastReport>(&raw).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].path, "metrics.tickets_r2");
        assert_eq!(err.violations[0].actual, "missing");
    }

    #[test]
    fn forecast_summary_count_must_match() {
        let raw = json!({
            "metrics": { "tickets_r2": null, "tickets_mae": null, "revenue_r2": null, "revenue_mae": null },
            "forecast": [ { "city": "Campinas" } ],
            "summary": {
                "total_events": 3, "sum_pred_tickets": 100,
                "sum_pred_revenue": 5000.0, "top5_by_revenue": []
            }
        });
        let err = validate::<ForecastReport>(&raw).unwrap_err();
        assert_eq!(err.violations[0].path, "summary.total_events");
    }
}
