//! Statistics tables for comparison frames.
//!
//! `summary` reports the share of `true` per version for boolean frames and a
//! count/mean/std/min/quartiles/max description for float frames. `correlation`
//! reports the pairwise Pearson matrix between versions for either kind.
//! Missing cells are skipped; correlations use pairwise-complete rows.

use crate::aggregate::ComparisonFrame;
use crate::error::PdvResult;
use crate::modes::StatisticsMode;
use crate::table::{ValueKind, Values};

/// Formatted statistics, ready to be written as plain text or LaTeX.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsTable {
    /// Name of the comparison frame the table describes.
    pub title: String,
    pub row_labels: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[row][column]`
    pub cells: Vec<Vec<String>>,
}

/// Distributional summary of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Describe {
    pub count: f64,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl Describe {
    pub const LABELS: [&'static str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    pub fn of(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let n = sorted.len();
        if n == 0 {
            return Self {
                count: 0.0,
                mean: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                q25: f64::NAN,
                q50: f64::NAN,
                q75: f64::NAN,
                max: f64::NAN,
            };
        }
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std = if n > 1 {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1) as f64).sqrt()
        } else {
            f64::NAN
        };
        Self {
            count: n as f64,
            mean,
            std,
            min: sorted[0],
            q25: quantile_sorted(&sorted, 0.25),
            q50: quantile_sorted(&sorted, 0.5),
            q75: quantile_sorted(&sorted, 0.75),
            max: sorted[n - 1],
        }
    }

    pub fn as_array(&self) -> [f64; 8] {
        [
            self.count, self.mean, self.std, self.min, self.q25, self.q50, self.q75, self.max,
        ]
    }
}

/// Linear-interpolation quantile of an ascending slice.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Pearson correlation over rows where both columns are present; NaN when undefined.
pub fn pearson(a: &Values, b: &Values) -> f64 {
    let pairs: Vec<(f64, f64)> = (0..a.len().min(b.len()))
        .filter_map(|i| Some((a.get_f64(i)?, b.get_f64(i)?)))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        (cov / denom).clamp(-1.0, 1.0)
    }
}

/// Symmetric correlation matrix between the frame's versions.
pub fn correlation_matrix(frame: &ComparisonFrame) -> Vec<Vec<f64>> {
    let n = frame.n_columns();
    let mut matrix = vec![vec![f64::NAN; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&frame.columns[i].values, &frame.columns[j].values);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    matrix
}

/// Python-style `{:.2e}`: two decimals, signed two-digit exponent (`1.23e+00`).
pub fn format_sci(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let raw = format!("{value:.2e}");
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => raw,
    }
}

/// Fraction as a one-decimal percentage (`0.5` → `50.0%`).
pub fn format_percent(fraction: f64) -> String {
    if fraction.is_nan() {
        return "nan%".to_string();
    }
    format!("{:.1}%", fraction * 100.0)
}

/// Computes the statistics table of `frame` for one statistics mode.
pub fn summarize(frame: &ComparisonFrame, statistics: StatisticsMode) -> StatsTable {
    let versions: Vec<String> = frame.versions().map(str::to_string).collect();
    match (statistics, frame.kind()) {
        (StatisticsMode::Summary, ValueKind::Bool) => StatsTable {
            title: frame.name.clone(),
            row_labels: versions,
            columns: vec!["Percentage".to_string()],
            cells: frame
                .columns
                .iter()
                .map(|c| vec![format_percent(c.values.true_fraction().unwrap_or(f64::NAN))])
                .collect(),
        },
        (StatisticsMode::Summary, ValueKind::Float) => {
            let described: Vec<[f64; 8]> = frame
                .columns
                .iter()
                .map(|c| Describe::of(&c.values.present_f64()).as_array())
                .collect();
            StatsTable {
                title: frame.name.clone(),
                row_labels: Describe::LABELS.iter().map(|s| s.to_string()).collect(),
                columns: versions,
                cells: (0..Describe::LABELS.len())
                    .map(|row| described.iter().map(|d| format_sci(d[row])).collect())
                    .collect(),
            }
        }
        (StatisticsMode::Correlation, _) => StatsTable {
            title: frame.name.clone(),
            row_labels: versions.clone(),
            columns: versions,
            cells: correlation_matrix(frame)
                .iter()
                .map(|row| row.iter().map(|r| format_sci(*r)).collect())
                .collect(),
        },
    }
}

/// [`summarize`] with the statistics mode given by name; an unknown name is a
/// configuration error and nothing is computed.
pub fn summarize_named(frame: &ComparisonFrame, statistics: &str) -> PdvResult<StatsTable> {
    let mode: StatisticsMode = statistics.parse()?;
    Ok(summarize(frame, mode))
}
