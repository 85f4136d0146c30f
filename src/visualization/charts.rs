//! Plotly builders for the four assessment charts.
//!
//! Every builder is a pure function of its inputs; writing the documents to
//! disk is the renderer's job.

use crate::models::FeasibilityLabel;
use crate::visualization::colors::{rd_yl_gn, rd_yl_gn_linspace, rd_yl_gn_r};
use plotly::common::{DashType, Fill, Font, Line, Marker, Mode, Orientation, TextPosition};
use plotly::layout::{Axis, Margin};
use plotly::{Bar, Layout, Plot, Scatter};
use std::f64::consts::PI;

/// Number of raw input features charted by the radar and distribution charts
pub const CHARTED_FEATURES: usize = 8;

const RADAR_LABELS: [&str; CHARTED_FEATURES] = [
    "Cost",
    "Time",
    "Resource",
    "Risk",
    "Environ.",
    "Deviation",
    "Stakeholder",
    "Complexity",
];

/// Per-axis maxima of the radar chart
pub const RADAR_MAXIMA: [f64; CHARTED_FEATURES] =
    [1_000_000.0, 365.0, 10.0, 10.0, 10.0, 50.0, 10.0, 3.0];

const RADAR_RINGS: [f64; 4] = [0.25, 0.5, 0.75, 1.0];

const DISTRIBUTION_LABELS: [&str; CHARTED_FEATURES] = [
    "Cost<br>(norm)",
    "Time<br>(norm)",
    "Resource",
    "Risk",
    "Environ.",
    "Deviation<br>(norm)",
    "Stakeholder",
    "Complexity",
];

/// Per-bar scales of the distribution chart
pub const DISTRIBUTION_MAXIMA: [f64; CHARTED_FEATURES] =
    [100_000.0, 100.0, 10.0, 10.0, 10.0, 20.0, 10.0, 3.0];

/// Bars where a higher value means more risk
const RISK_INDICES: [usize; 3] = [3, 5, 7];

const HIGH_RISK: &str = "#eb3349";
const MEDIUM_RISK: &str = "#f5af19";
const LOW_RISK: &str = "#11998e";
const INK: &str = "#333";
const ACCENT: &str = "#667eea";

/// Importances sorted ascending, paired with their feature names
pub fn sorted_importances(names: &[String], importances: &[f64]) -> Vec<(String, f64)> {
    let mut pairs: Vec<(String, f64)> = names
        .iter()
        .cloned()
        .zip(importances.iter().copied())
        .collect();
    pairs.sort_by(|a, b| a.1.total_cmp(&b.1));
    pairs
}

/// Horizontal bar chart of model feature importances
pub fn feature_importance(names: &[String], importances: Option<&[f64]>) -> Plot {
    let importances = match importances {
        Some(values) if !values.is_empty() => values,
        _ => return importance_placeholder(),
    };

    let pairs = sorted_importances(names, importances);
    let (labels, values): (Vec<String>, Vec<f64>) = pairs.into_iter().unzip();
    let colors = rd_yl_gn_linspace(0.2, 0.8, values.len());
    let text: Vec<String> = values.iter().map(|v| format!("{:.3}", v)).collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Bar::new(values, labels)
            .orientation(Orientation::Horizontal)
            .marker(Marker::new().color_array(colors))
            .text_array(text)
            .text_position(TextPosition::Outside)
            .name("Importance"),
    );
    plot.set_layout(
        Layout::new()
            .title("Feature Importance Analysis")
            .x_axis(Axis::new().title("Importance Score"))
            .margin(Margin::new().left(200))
            .show_legend(false)
            .width(720)
            .height(540),
    );
    plot
}

fn importance_placeholder() -> Plot {
    let mut plot = Plot::new();
    plot.add_trace(
        Scatter::new(vec![0.0], vec![0.0])
            .mode(Mode::Text)
            .text_array(vec!["Feature importances are not available for this model"])
            .text_font(Font::new().size(14).color(INK))
            .show_legend(false),
    );
    plot.set_layout(
        Layout::new()
            .title("Feature Importance Analysis")
            .x_axis(hidden_axis(vec![-1.0, 1.0]))
            .y_axis(hidden_axis(vec![-1.0, 1.0]))
            .show_legend(false)
            .width(720)
            .height(540),
    );
    plot
}

/// Radar radii: each value over its maximum, clamped into [0, 1]
pub fn radar_normalized(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(RADAR_MAXIMA.iter())
        .map(|(v, m)| {
            let r = v / m;
            if r.is_nan() {
                0.0
            } else {
                r.clamp(0.0, 1.0)
            }
        })
        .collect()
}

fn radar_angle(axis: usize) -> f64 {
    2.0 * PI * axis as f64 / CHARTED_FEATURES as f64
}

fn closed_polygon(radii: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut xs: Vec<f64> = radii
        .iter()
        .enumerate()
        .map(|(i, r)| r * radar_angle(i).cos())
        .collect();
    let mut ys: Vec<f64> = radii
        .iter()
        .enumerate()
        .map(|(i, r)| r * radar_angle(i).sin())
        .collect();
    if let (Some(x0), Some(y0)) = (xs.first().copied(), ys.first().copied()) {
        xs.push(x0);
        ys.push(y0);
    }
    (xs, ys)
}

/// Radar chart of the eight raw inputs, drawn on cartesian axes
pub fn radar(values: &[f64]) -> Plot {
    let mut plot = Plot::new();

    for ring in RADAR_RINGS {
        let (xs, ys) = closed_polygon(&[ring; CHARTED_FEATURES]);
        plot.add_trace(
            Scatter::new(xs, ys)
                .mode(Mode::Lines)
                .line(Line::new().color("lightgray").width(1.0).dash(DashType::Dot))
                .show_legend(false),
        );
    }

    for axis in 0..CHARTED_FEATURES {
        let angle = radar_angle(axis);
        plot.add_trace(
            Scatter::new(vec![0.0, angle.cos()], vec![0.0, angle.sin()])
                .mode(Mode::Lines)
                .line(Line::new().color("lightgray").width(1.0))
                .show_legend(false),
        );
    }

    // Ring labels sit between the first two axes
    let label_angle = radar_angle(1) / 2.0;
    plot.add_trace(
        Scatter::new(
            RADAR_RINGS.iter().map(|r| r * label_angle.cos()).collect::<Vec<_>>(),
            RADAR_RINGS.iter().map(|r| r * label_angle.sin()).collect::<Vec<_>>(),
        )
        .mode(Mode::Text)
        .text_array(vec!["25%", "50%", "75%", "100%"])
        .text_font(Font::new().size(9).color("gray"))
        .show_legend(false),
    );

    let (xs, ys) = closed_polygon(&radar_normalized(values));
    plot.add_trace(
        Scatter::new(xs, ys)
            .mode(Mode::LinesMarkers)
            .fill(Fill::ToSelf)
            .fill_color("rgba(102, 126, 234, 0.25)")
            .line(Line::new().color(ACCENT).width(2.0))
            .marker(Marker::new().color(ACCENT).size(7))
            .name("Input"),
    );

    let (label_xs, label_ys) = closed_polygon(&[1.18; CHARTED_FEATURES]);
    plot.add_trace(
        Scatter::new(
            label_xs[..CHARTED_FEATURES].to_vec(),
            label_ys[..CHARTED_FEATURES].to_vec(),
        )
        .mode(Mode::Text)
        .text_array(RADAR_LABELS.to_vec())
        .text_font(Font::new().size(11).color(INK))
        .show_legend(false),
    );

    plot.set_layout(
        Layout::new()
            .title("Input Parameters Overview")
            .x_axis(hidden_axis(vec![-1.4, 1.4]))
            .y_axis(hidden_axis(vec![-1.4, 1.4]))
            .show_legend(false)
            .width(560)
            .height(560),
    );
    plot
}

/// Needle position of the gauge: risk score over 10, clamped into [0, 1]
pub fn gauge_position(risk_score: f64) -> f64 {
    if risk_score.is_nan() {
        return 0.0;
    }
    (risk_score / 10.0).clamp(0.0, 1.0)
}

/// Colour the result label is drawn in
pub fn label_color(label: FeasibilityLabel) -> &'static str {
    match label {
        FeasibilityLabel::Feasible => LOW_RISK,
        FeasibilityLabel::NotFeasible => HIGH_RISK,
        FeasibilityLabel::Borderline => MEDIUM_RISK,
    }
}

fn polar(r: f64, phi: f64) -> (f64, f64) {
    (r * phi.cos(), r * phi.sin())
}

/// Semicircular gauge with high risk on the left and low risk on the right
pub fn gauge(risk_score: f64, label: FeasibilityLabel) -> Plot {
    const STEPS: usize = 30;
    const INNER: f64 = 0.6;
    const OUTER: f64 = 1.0;

    let mut plot = Plot::new();

    let bands = [
        (HIGH_RISK, "High<br>Risk"),
        (MEDIUM_RISK, "Medium"),
        (LOW_RISK, "Low<br>Risk"),
    ];

    for (k, (color, text)) in bands.iter().enumerate() {
        let start = PI - k as f64 * PI / 3.0;
        let end = PI - (k + 1) as f64 * PI / 3.0;
        let arc: Vec<f64> = (0..=STEPS)
            .map(|i| start + (end - start) * i as f64 / STEPS as f64)
            .collect();

        let mut points: Vec<(f64, f64)> = arc.iter().map(|phi| polar(OUTER, *phi)).collect();
        points.extend(arc.iter().rev().map(|phi| polar(INNER, *phi)));
        points.push(polar(OUTER, start));
        let (xs, ys): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();

        plot.add_trace(
            Scatter::new(xs, ys)
                .mode(Mode::Lines)
                .fill(Fill::ToSelf)
                .fill_color(*color)
                .line(Line::new().color("white").width(1.0))
                .show_legend(false),
        );

        let (x, y) = polar(0.45, (start + end) / 2.0);
        plot.add_trace(
            Scatter::new(vec![x], vec![y])
                .mode(Mode::Text)
                .text_array(vec![*text])
                .text_font(Font::new().size(11).color(*color))
                .show_legend(false),
        );
    }

    let phi = PI * gauge_position(risk_score);
    let (tip_x, tip_y) = polar(0.9, phi);
    plot.add_trace(
        Scatter::new(vec![0.0, tip_x], vec![0.0, tip_y])
            .mode(Mode::Lines)
            .line(Line::new().color(INK).width(4.0))
            .name("Risk"),
    );
    plot.add_trace(
        Scatter::new(vec![0.0], vec![0.0])
            .mode(Mode::Markers)
            .marker(Marker::new().color(INK).size(16))
            .show_legend(false),
    );

    plot.add_trace(
        Scatter::new(vec![0.0], vec![-0.2])
            .mode(Mode::Text)
            .text_array(vec![label.to_string()])
            .text_font(Font::new().size(20).color(label_color(label)))
            .show_legend(false),
    );

    plot.set_layout(
        Layout::new()
            .title("Risk Assessment Gauge")
            .x_axis(hidden_axis(vec![-1.15, 1.15]))
            .y_axis(hidden_axis(vec![-0.35, 1.1]))
            .show_legend(false)
            .width(560)
            .height(340),
    );
    plot
}

/// Bar heights: each value over its scale times 10, capped at 10
pub fn distribution_normalized(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(DISTRIBUTION_MAXIMA.iter())
        .map(|(v, m)| (v / m * 10.0).min(10.0))
        .collect()
}

/// Bar colours; risk-type bars use the reversed ramp
pub fn distribution_colors(normalized: &[f64]) -> Vec<String> {
    normalized
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if RISK_INDICES.contains(&i) {
                rd_yl_gn_r(v / 10.0)
            } else {
                rd_yl_gn(v / 10.0)
            }
        })
        .collect()
}

/// Bar chart of the eight inputs on a common 0-10 scale
pub fn distribution(values: &[f64]) -> Plot {
    let normalized = distribution_normalized(values);
    let colors = distribution_colors(&normalized);
    let labels: Vec<&str> = DISTRIBUTION_LABELS[..normalized.len()].to_vec();
    let text: Vec<String> = values
        .iter()
        .take(normalized.len())
        .map(|v| format!("{:.1}", v))
        .collect();

    let mut plot = Plot::new();
    plot.add_trace(
        Bar::new(labels.clone(), normalized)
            .marker(Marker::new().color_array(colors))
            .text_array(text)
            .text_position(TextPosition::Outside)
            .name("Inputs")
            .show_legend(false),
    );

    if let (Some(first), Some(last)) = (labels.first(), labels.last()) {
        plot.add_trace(
            Scatter::new(vec![*first, *last], vec![5.0, 5.0])
                .mode(Mode::Lines)
                .line(Line::new().color("gray").width(1.5).dash(DashType::Dash))
                .name("Average"),
        );
    }

    plot.set_layout(
        Layout::new()
            .title("Input Score Distribution")
            .y_axis(
                Axis::new()
                    .title("Normalized Score (0-10)")
                    .range(vec![0.0, 12.0]),
            )
            .show_legend(true)
            .width(720)
            .height(450),
    );
    plot
}

fn hidden_axis(range: Vec<f64>) -> Axis {
    Axis::new()
        .range(range)
        .visible(false)
        .show_grid(false)
        .zero_line(false)
}
