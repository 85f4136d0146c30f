//! Server-rendered HTML for the assessment form.

use crate::api::handlers::ProjectForm;
use crate::ml::ProjectAssessment;
use crate::models::{FeasibilityLabel, ProjectType};
use crate::visualization::ChartPaths;
use maud::{html, Markup, PreEscaped, DOCTYPE};

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; background: #f4f6fb; color: #333; margin: 0; }
header { background: linear-gradient(135deg, #667eea, #764ba2); color: white; padding: 24px 32px; }
main { max-width: 1180px; margin: 24px auto; padding: 0 16px; }
.card { background: white; border-radius: 10px; box-shadow: 0 2px 8px rgba(0,0,0,0.08); padding: 20px 24px; margin-bottom: 24px; }
.grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 14px 20px; }
label { display: block; font-weight: 600; font-size: 0.9em; margin-bottom: 4px; }
input, select { width: 100%; box-sizing: border-box; padding: 8px; border: 1px solid #ccd; border-radius: 6px; }
button { margin-top: 18px; background: #667eea; color: white; border: none; padding: 10px 28px; border-radius: 6px; font-size: 1em; cursor: pointer; }
.result { font-size: 1.6em; font-weight: 700; }
.feasible { color: #11998e; }
.not-feasible { color: #eb3349; }
.borderline { color: #f5af19; }
.stats { display: flex; gap: 32px; flex-wrap: wrap; margin-top: 12px; }
.stat span { display: block; font-size: 0.85em; color: #777; }
.stat strong { font-size: 1.2em; }
.charts { display: grid; grid-template-columns: repeat(auto-fill, minmax(540px, 1fr)); gap: 20px; }
iframe { width: 100%; height: 580px; border: none; background: white; border-radius: 10px; }
"#;

const NOT_AVAILABLE: &str = "n/a";

/// The empty input form
pub fn form_page() -> Markup {
    layout(html! {
        (input_form(None))
    })
}

/// Form repopulated with the submitted values, followed by the results
pub fn result_page(form: &ProjectForm, assessment: &ProjectAssessment, charts: &ChartPaths) -> Markup {
    layout(html! {
        (input_form(Some(form)))
        (result_card(assessment))
        (chart_grid(charts))
    })
}

fn layout(content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Construction Project Feasibility" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                header {
                    h1 { "Construction Project Feasibility" }
                    p { "Feasibility, cost and duration estimates from trained models" }
                }
                main { (content) }
            }
        }
    }
}

fn input_form(values: Option<&ProjectForm>) -> Markup {
    let chosen = values.map(|v| v.project_type.as_str());
    let number = |f: fn(&ProjectForm) -> String| values.map(f).unwrap_or_default();

    html! {
        form.card method="post" action="/predict" {
            h2 { "Project details" }
            div.grid {
                div {
                    label for="Project_Type" { "Project type" }
                    select id="Project_Type" name="Project_Type" required {
                        @for name in ProjectType::names() {
                            option value=(name) selected[chosen == Some(name.as_str())] { (name) }
                        }
                    }
                }
                (number_field("Estimated_Cost_USD", "Estimated cost (USD)", "any", &number(|v| v.estimated_cost_usd.to_string())))
                (number_field("Time_Estimate_Days", "Time estimate (days)", "1", &number(|v| v.time_estimate_days.to_string())))
                (number_field("Resource_Allocation_Score", "Resource allocation score", "any", &number(|v| v.resource_allocation_score.to_string())))
                (number_field("Risk_Assessment_Score", "Risk assessment score", "any", &number(|v| v.risk_assessment_score.to_string())))
                (number_field("Environmental_Impact_Score", "Environmental impact score", "any", &number(|v| v.environmental_impact_score.to_string())))
                (number_field("Historical_Cost_Deviation_", "Historical cost deviation (%)", "any", &number(|v| v.historical_cost_deviation_pct.to_string())))
                (number_field("Stakeholder_Priority_Score", "Stakeholder priority score", "any", &number(|v| v.stakeholder_priority_score.to_string())))
                (number_field("Scope_Complexity_Numeric", "Scope complexity", "1", &number(|v| v.scope_complexity.to_string())))
            }
            button type="submit" { "Assess project" }
        }
    }
}

fn number_field(name: &str, text: &str, step: &str, value: &str) -> Markup {
    html! {
        div {
            label for=(name) { (text) }
            input type="number" id=(name) name=(name) step=(step) value=(value) required;
        }
    }
}

fn label_class(label: FeasibilityLabel) -> &'static str {
    match label {
        FeasibilityLabel::Feasible => "feasible",
        FeasibilityLabel::NotFeasible => "not-feasible",
        FeasibilityLabel::Borderline => "borderline",
    }
}

fn result_card(assessment: &ProjectAssessment) -> Markup {
    let label = assessment.feasibility.value;
    let fallback = assessment
        .feasibility
        .confidence
        .map(|c| c.is_fallback())
        .unwrap_or(false);

    html! {
        section.card {
            h2 { "Assessment" }
            div class=(format!("result {}", label_class(label))) { (label.to_string()) }
            div.stats {
                div.stat {
                    span { "Confidence" }
                    strong { (format!("{:.1}%", assessment.confidence() * 100.0)) }
                    @if fallback {
                        span { "model reports no probabilities" }
                    }
                }
                div.stat {
                    span { "Predicted cost" }
                    strong {
                        @if assessment.estimated_cost.value.is_finite() { "$" }
                        (format_thousands(assessment.estimated_cost.value))
                    }
                }
                div.stat {
                    span { "Predicted duration" }
                    strong { (format_days(assessment.estimated_time.value)) }
                }
            }
        }
    }
}

fn chart_grid(charts: &ChartPaths) -> Markup {
    html! {
        section.charts {
            iframe src=(charts.feature_importance) title="Feature importance" {}
            iframe src=(charts.radar) title="Input parameters" {}
            iframe src=(charts.gauge) title="Risk gauge" {}
            iframe src=(charts.distribution) title="Input distribution" {}
        }
    }
}

/// Two-decimal amount with comma thousands separators
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }

    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

/// Whole days, or "n/a" for a non-finite estimate
pub fn format_days(value: f64) -> String {
    if value.is_finite() {
        format!("{:.0} days", value)
    } else {
        NOT_AVAILABLE.to_string()
    }
}
