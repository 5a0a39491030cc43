use std::collections::BTreeMap;

use super::filter::FilteredView;
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Grouped means
// ---------------------------------------------------------------------------

/// Categorical key for the grouped mean-price aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Clarity,
    Color,
    CaratGroup,
}

/// Mean `price` per group, observed groups only (a grade with no surviving
/// record never shows up as a zero bar).
///
/// Clarity and color results sort ascending by mean value; carat groups
/// keep their declared bin order.
pub fn mean_price_by(view: &FilteredView, dataset: &Dataset, key: GroupKey) -> Vec<(String, f64)> {
    // BTreeMap keyed by the ordinal itself, so iteration follows the
    // declared domain order before any value sort.
    let mut sums: BTreeMap<(usize, &'static str), (f64, usize)> = BTreeMap::new();

    for (pos, rec) in view.records(dataset).enumerate() {
        let group = match key {
            GroupKey::Clarity => Some((rec.clarity.rank(), rec.clarity.label())),
            GroupKey::Color => Some((rec.color.rank(), rec.color.label())),
            GroupKey::CaratGroup => view.carat_groups[pos].map(|g| (g as usize, g.label())),
        };
        // Carats outside the declared bins have no group and are skipped.
        let Some(group) = group else { continue };
        let entry = sums.entry(group).or_insert((0.0, 0));
        entry.0 += rec.price;
        entry.1 += 1;
    }

    let mut means: Vec<(String, f64)> = sums
        .into_iter()
        .map(|((_, label), (sum, n))| (label.to_string(), sum / n as f64))
        .collect();

    if !matches!(key, GroupKey::CaratGroup) {
        means.sort_by(|a, b| a.1.total_cmp(&b.1));
    }
    means
}

/// Record count per observed cut grade, declared order.
pub fn cut_counts(view: &FilteredView, dataset: &Dataset) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<(usize, &'static str), usize> = BTreeMap::new();
    for rec in view.records(dataset) {
        *counts.entry((rec.cut.rank(), rec.cut.label())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((_, label), n)| (label.to_string(), n))
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Square, symmetric Pearson correlation matrix over the numeric columns
/// plus the encoded ordinal grades.  Zero-variance pairs are `NaN`.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub labels: Vec<&'static str>,
    /// `values[i][j]` = correlation of column i with column j.
    pub values: Vec<Vec<f64>>,
}

/// Extract the correlation columns from the filtered view.  Ordinal grades
/// enter as their integer ranks (0 = worst).
fn correlation_columns(view: &FilteredView, dataset: &Dataset) -> Vec<(&'static str, Vec<f64>)> {
    let mut cols: Vec<(&'static str, Vec<f64>)> = vec![
        ("Price", Vec::new()),
        ("Carat", Vec::new()),
        ("Depth", Vec::new()),
        ("Table", Vec::new()),
        ("X", Vec::new()),
        ("Y", Vec::new()),
        ("Z", Vec::new()),
        ("Cut", Vec::new()),
        ("Clarity", Vec::new()),
        ("Color", Vec::new()),
    ];
    for rec in view.records(dataset) {
        let values = [
            rec.price,
            rec.carat,
            rec.depth,
            rec.table,
            rec.x,
            rec.y,
            rec.z,
            rec.cut.rank() as f64,
            rec.clarity.rank() as f64,
            rec.color.rank() as f64,
        ];
        for (col, v) in cols.iter_mut().zip(values) {
            col.1.push(v);
        }
    }
    cols
}

pub fn correlation_matrix(view: &FilteredView, dataset: &Dataset) -> CorrelationMatrix {
    let cols = correlation_columns(view, dataset);
    let n = cols.len();
    let mut values = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in i..n {
            let r = if i == j {
                // Exactly 1.0 on the diagonal unless the column is constant.
                if variance(&cols[i].1) > 0.0 {
                    1.0
                } else {
                    f64::NAN
                }
            } else {
                pearson(&cols[i].1, &cols[j].1)
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        labels: cols.into_iter().map(|(l, _)| l).collect(),
        values,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>()
}

/// Pearson correlation coefficient.  `NaN` when either column has zero
/// variance; that is data for the caller, not an error.
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (&ai, &bi) in a.iter().zip(b) {
        cov += (ai - ma) * (bi - mb);
        va += (ai - ma).powi(2);
        vb += (bi - mb).powi(2);
    }
    let denom = (va * vb).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        cov / denom
    }
}

// ---------------------------------------------------------------------------
// 2D principal-component projection
// ---------------------------------------------------------------------------

/// Feature columns entering the projection, in order.
pub const PROJECTION_FEATURES: [&str; 6] = ["carat", "depth", "table", "x", "y", "z"];

/// The filtered records projected onto their first two principal
/// components.  Visualization only; no inverse transform.
#[derive(Debug, Clone)]
pub struct Projection {
    /// One `[pc1, pc2]` point per surviving record, in view order.
    pub points: Vec<[f64; 2]>,
    /// The two component directions in feature space, unit length.
    pub components: [[f64; 6]; 2],
    /// Fraction of total variance explained by each component, descending.
    pub explained: [f64; 2],
}

/// Standardize the six geometry/quality columns and project every record
/// onto the two directions of maximal variance.
pub fn project_2d(view: &FilteredView, dataset: &Dataset) -> Projection {
    let n = view.count;
    if n < 2 {
        // Variance is undefined; park everything at the origin.
        return Projection {
            points: vec![[0.0, 0.0]; n],
            components: [[0.0; 6]; 2],
            explained: [0.0, 0.0],
        };
    }

    // Feature matrix, row-major: n rows × 6 standardized features.
    let mut rows: Vec<[f64; 6]> = view
        .records(dataset)
        .map(|r| [r.carat, r.depth, r.table, r.x, r.y, r.z])
        .collect();
    standardize(&mut rows);

    let cov = covariance(&rows);
    let total: f64 = (0..6).map(|i| cov[i][i]).sum();

    let (v1, l1) = dominant_eigenvector(&cov, None);
    let (v2, l2) = dominant_eigenvector(&cov, Some(&v1));

    let explained = if total > 0.0 {
        [(l1 / total).max(0.0), (l2 / total).max(0.0)]
    } else {
        [0.0, 0.0]
    };

    let points = rows
        .iter()
        .map(|row| [dot(row, &v1), dot(row, &v2)])
        .collect();

    Projection {
        points,
        components: [v1, v2],
        explained,
    }
}

/// In-place zero-mean / unit-variance scaling per column.  A zero-variance
/// column scales to all zeros instead of dividing by zero.
fn standardize(rows: &mut [[f64; 6]]) {
    let n = rows.len() as f64;
    for c in 0..6 {
        let m = rows.iter().map(|r| r[c]).sum::<f64>() / n;
        let var = rows.iter().map(|r| (r[c] - m).powi(2)).sum::<f64>() / n;
        let sd = var.sqrt();
        for row in rows.iter_mut() {
            row[c] = if sd > 0.0 { (row[c] - m) / sd } else { 0.0 };
        }
    }
}

/// Sample covariance of already-centered columns.
fn covariance(rows: &[[f64; 6]]) -> [[f64; 6]; 6] {
    let n = rows.len();
    let mut cov = [[0.0; 6]; 6];
    for row in rows {
        for i in 0..6 {
            for j in 0..6 {
                cov[i][j] += row[i] * row[j];
            }
        }
    }
    let denom = (n - 1) as f64;
    for r in cov.iter_mut() {
        for v in r.iter_mut() {
            *v /= denom;
        }
    }
    cov
}

fn dot(a: &[f64; 6], b: &[f64; 6]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64; 6]) -> f64 {
    dot(v, v).sqrt()
}

/// Power iteration for the dominant eigenvector of a symmetric matrix,
/// deflated against `ortho_to` when extracting the second component.
/// Deterministic: fixed start vector, sign fixed so the largest-magnitude
/// entry is positive.
fn dominant_eigenvector(mat: &[[f64; 6]; 6], ortho_to: Option<&[f64; 6]>) -> ([f64; 6], f64) {
    // Start vectors: all-ones first, then basis vectors if the start
    // happens to be orthogonal to the dominant direction.
    let starts: [[f64; 6]; 3] = [
        [1.0; 6],
        [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
    ];

    for start in starts {
        let mut v = start;
        reject(&mut v, ortho_to);
        if norm(&v) < 1e-12 {
            continue;
        }
        let len = norm(&v);
        scale(&mut v, 1.0 / len);

        let mut converged = false;
        for _ in 0..200 {
            let mut next = [0.0; 6];
            for i in 0..6 {
                next[i] = dot(&mat[i], &v);
            }
            reject(&mut next, ortho_to);
            let len = norm(&next);
            if len < 1e-12 {
                break;
            }
            scale(&mut next, 1.0 / len);
            let delta: f64 = v
                .iter()
                .zip(&next)
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max);
            v = next;
            if delta < 1e-12 {
                converged = true;
                break;
            }
        }

        if converged || norm(&v) > 0.5 {
            fix_sign(&mut v);
            let mut mv = [0.0; 6];
            for i in 0..6 {
                mv[i] = dot(&mat[i], &v);
            }
            return (v, dot(&v, &mv));
        }
    }

    ([0.0; 6], 0.0)
}

/// Remove the component of `v` along `axis` (Gram–Schmidt step).
fn reject(v: &mut [f64; 6], axis: Option<&[f64; 6]>) {
    if let Some(axis) = axis {
        let proj = dot(v, axis);
        for (vi, ai) in v.iter_mut().zip(axis) {
            *vi -= proj * ai;
        }
    }
}

fn scale(v: &mut [f64; 6], s: f64) {
    for vi in v.iter_mut() {
        *vi *= s;
    }
}

fn fix_sign(v: &mut [f64; 6]) {
    let lead = v
        .iter()
        .cloned()
        .fold(0.0_f64, |acc, x| if x.abs() > acc.abs() { x } else { acc });
    if lead < 0.0 {
        scale(v, -1.0);
    }
}

// ---------------------------------------------------------------------------
// Top-N extraction
// ---------------------------------------------------------------------------

/// Dataset indices of the `n` highest-priced surviving records, ties broken
/// by original record order.  Fewer than `n` records → all of them.
pub fn top_n_by_price(view: &FilteredView, dataset: &Dataset, n: usize) -> Vec<usize> {
    let mut indices = view.indices.clone();
    // Stable sort keeps the original order among equal prices.
    indices.sort_by(|&a, &b| dataset.records[b].price.total_cmp(&dataset.records[a].price));
    indices.truncate(n);
    indices
}

pub const DEFAULT_TOP_N: usize = 5;

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

/// Equal-width histogram bins over a numeric column.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// `bins + 1` edges; bin `i` spans `[edges[i], edges[i + 1])`, the last
    /// bin is closed on the right.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

pub const DEFAULT_HISTOGRAM_BINS: usize = 10;

pub fn histogram(values: &[f64], bins: usize) -> Histogram {
    if values.is_empty() || bins == 0 {
        return Histogram {
            edges: Vec::new(),
            counts: Vec::new(),
        };
    }

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    if max <= min {
        // All values identical: one bin holding everything.
        return Histogram {
            edges: vec![min, min],
            counts: vec![values.len()],
        };
    }

    let width = (max - min) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| min + i as f64 * width).collect();
    let mut counts = vec![0usize; bins];
    for &v in values {
        let i = (((v - min) / width) as usize).min(bins - 1);
        counts[i] += 1;
    }

    Histogram { edges, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::tests::{rec, sample_dataset};
    use crate::data::filter::{FilterCriteria, filter};
    use crate::data::loader::REQUIRED_COLUMNS;
    use crate::data::model::{Clarity, ColorGrade, Cut};

    fn full_view(ds: &Dataset) -> FilteredView {
        let mut criteria = FilterCriteria::defaults_for(ds);
        criteria.price_range = (0.0, f64::MAX);
        criteria.carat_range = (0.0, f64::MAX);
        filter(ds, &criteria).unwrap()
    }

    fn dataset(records: Vec<crate::data::model::Record>) -> Dataset {
        let columns = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        Dataset::from_records(records, columns)
    }

    #[test]
    fn grouped_means_cover_observed_grades_only() {
        let ds = sample_dataset();
        let view = full_view(&ds);

        let by_clarity = mean_price_by(&view, &ds, GroupKey::Clarity);
        assert_eq!(by_clarity.len(), 5); // five distinct clarities observed
        assert!(by_clarity.iter().all(|(label, _)| label != "VVS1"));
        // Ascending by mean value.
        for pair in by_clarity.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
    }

    #[test]
    fn carat_group_means_keep_declared_bin_order() {
        // Prices chosen so value-sorting would reverse the bin order.
        let ds = dataset(vec![
            rec(0.3, 9000.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
            rec(0.7, 5000.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
            rec(1.8, 1000.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
        ]);
        let view = full_view(&ds);
        let means = mean_price_by(&view, &ds, GroupKey::CaratGroup);
        let labels: Vec<&str> = means.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["0-0.5", "0.5-1", "1.5-2"]);
    }

    #[test]
    fn grouped_mean_values_are_arithmetic_means() {
        let ds = dataset(vec![
            rec(0.5, 1000.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
            rec(0.6, 3000.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
            rec(0.7, 500.0, Cut::Ideal, ColorGrade::G, Clarity::VS1),
        ]);
        let view = full_view(&ds);
        let means = mean_price_by(&view, &ds, GroupKey::Color);
        assert_eq!(means, vec![("G".to_string(), 500.0), ("E".to_string(), 2000.0)]);
    }

    #[test]
    fn cut_counts_follow_declared_order() {
        let ds = sample_dataset();
        let view = full_view(&ds);
        let counts = cut_counts(&view, &ds);
        assert_eq!(
            counts,
            vec![
                ("Good".to_string(), 1),
                ("Very Good".to_string(), 1),
                ("Premium".to_string(), 1),
                ("Ideal".to_string(), 2),
            ]
        );
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let ds = sample_dataset();
        let view = full_view(&ds);
        let corr = correlation_matrix(&view, &ds);

        assert_eq!(corr.labels.len(), 10);
        for i in 0..corr.labels.len() {
            for j in 0..corr.labels.len() {
                let (a, b) = (corr.values[i][j], corr.values[j][i]);
                assert!(a.is_nan() == b.is_nan());
                if !a.is_nan() {
                    assert!((a - b).abs() < 1e-12);
                    assert!((-1.0..=1.0).contains(&a));
                }
            }
        }
        // Price varies, so its diagonal entry is exactly 1.
        assert_eq!(corr.values[0][0], 1.0);
    }

    #[test]
    fn constant_column_correlates_as_nan() {
        // The fixture gives every record the same depth and table.
        let ds = sample_dataset();
        let view = full_view(&ds);
        let corr = correlation_matrix(&view, &ds);

        let depth = corr.labels.iter().position(|l| *l == "Depth").unwrap();
        for j in 0..corr.labels.len() {
            assert!(corr.values[depth][j].is_nan());
        }
    }

    #[test]
    fn price_rises_with_carat_in_the_fixture() {
        let ds = sample_dataset();
        let view = full_view(&ds);
        let corr = correlation_matrix(&view, &ds);
        // labels[0] = Price, labels[1] = Carat
        assert!(corr.values[0][1] > 0.9);
    }

    #[test]
    fn top_n_with_fewer_records_returns_them_all() {
        let ds = dataset(vec![
            rec(0.5, 1000.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
            rec(0.6, 3000.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
        ]);
        let view = full_view(&ds);
        let top = top_n_by_price(&view, &ds, DEFAULT_TOP_N);
        assert_eq!(top, vec![1, 0]);
    }

    #[test]
    fn top_n_breaks_price_ties_by_original_order() {
        let ds = dataset(vec![
            rec(0.5, 2000.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
            rec(0.6, 5000.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
            rec(0.7, 5000.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
            rec(0.8, 1000.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
        ]);
        let view = full_view(&ds);
        let top = top_n_by_price(&view, &ds, 3);
        assert_eq!(top, vec![1, 2, 0]);
    }

    #[test]
    fn projection_components_are_orthonormal_and_ranked() {
        // Vary carat strongly and the physical dimensions weakly so the
        // two leading components are distinct.
        let records: Vec<crate::data::model::Record> = (0..8)
            .map(|i| {
                let mut r = rec(
                    0.3 + 0.25 * i as f64,
                    500.0 + 1000.0 * i as f64,
                    Cut::Ideal,
                    ColorGrade::E,
                    Clarity::VS1,
                );
                r.x = 4.0 + 0.3 * i as f64;
                r.y = 4.0 + 0.1 * ((i * 3) % 5) as f64;
                r.z = 2.5 + 0.2 * ((i * 7) % 4) as f64;
                r
            })
            .collect();
        let ds = dataset(records);
        let view = full_view(&ds);
        let proj = project_2d(&view, &ds);

        assert_eq!(proj.points.len(), view.count);

        let [v1, v2] = proj.components;
        let dot12: f64 = v1.iter().zip(&v2).map(|(a, b)| a * b).sum();
        let n1: f64 = v1.iter().map(|a| a * a).sum::<f64>().sqrt();
        let n2: f64 = v2.iter().map(|a| a * a).sum::<f64>().sqrt();
        assert!(dot12.abs() < 1e-6);
        assert!((n1 - 1.0).abs() < 1e-6);
        assert!((n2 - 1.0).abs() < 1e-6);

        assert!(proj.explained[0] >= proj.explained[1]);
        assert!(proj.explained[0] > 0.0);
        assert!(proj.explained[0] + proj.explained[1] <= 1.0 + 1e-9);
    }

    #[test]
    fn projection_of_a_single_record_sits_at_the_origin() {
        let ds = dataset(vec![rec(0.5, 1500.0, Cut::Ideal, ColorGrade::E, Clarity::VS1)]);
        let view = full_view(&ds);
        let proj = project_2d(&view, &ds);
        assert_eq!(proj.points, vec![[0.0, 0.0]]);
        assert_eq!(proj.explained, [0.0, 0.0]);
    }

    #[test]
    fn histogram_counts_every_value_once() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 5.0, 9.9, 10.0];
        let h = histogram(&values, 3);
        assert_eq!(h.edges.len(), 4);
        assert_eq!(h.counts.iter().sum::<usize>(), values.len());
        // The maximum lands in the last bin, not out of range.
        assert!(h.counts[2] >= 1);
    }

    #[test]
    fn histogram_of_identical_values_is_a_single_bin() {
        let h = histogram(&[4.2, 4.2, 4.2], 10);
        assert_eq!(h.counts, vec![3]);
    }
}
