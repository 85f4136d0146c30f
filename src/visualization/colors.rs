//! Diverging red-yellow-green colour ramp used by the bar charts.

/// ColorBrewer RdYlGn, 11 classes, red end first
const RD_YL_GN: [(u8, u8, u8); 11] = [
    (165, 0, 38),
    (215, 48, 39),
    (244, 109, 67),
    (253, 174, 97),
    (254, 224, 139),
    (255, 255, 191),
    (217, 239, 139),
    (166, 217, 106),
    (102, 189, 99),
    (26, 152, 80),
    (0, 104, 55),
];

/// Colour at position `t` of the ramp. `t` is clamped into [0, 1]; NaN maps
/// to the midpoint.
pub fn rd_yl_gn(t: f64) -> String {
    let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };

    let scaled = t * (RD_YL_GN.len() - 1) as f64;
    let lower = scaled.floor() as usize;
    let upper = (lower + 1).min(RD_YL_GN.len() - 1);
    let frac = scaled - lower as f64;

    let (r0, g0, b0) = RD_YL_GN[lower];
    let (r1, g1, b1) = RD_YL_GN[upper];
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;

    format!("rgb({},{},{})", mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

/// Reversed ramp: green at 0, red at 1
pub fn rd_yl_gn_r(t: f64) -> String {
    rd_yl_gn(1.0 - t)
}

/// `n` colours evenly spaced on the ramp between `start` and `end`
pub fn rd_yl_gn_linspace(start: f64, end: f64, n: usize) -> Vec<String> {
    match n {
        0 => Vec::new(),
        1 => vec![rd_yl_gn(start)],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| rd_yl_gn(start + step * i as f64)).collect()
        }
    }
}
