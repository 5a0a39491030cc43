use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Ordinal grades
// ---------------------------------------------------------------------------
//
// Variant order is the domain order (worst first), so the derived `Ord`
// sorts by grade quality rather than by label text.

/// Cut quality, worst → best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Cut {
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Premium,
    Ideal,
}

impl Cut {
    pub const ALL: [Cut; 5] = [Cut::Fair, Cut::Good, Cut::VeryGood, Cut::Premium, Cut::Ideal];

    pub fn label(self) -> &'static str {
        match self {
            Cut::Fair => "Fair",
            Cut::Good => "Good",
            Cut::VeryGood => "Very Good",
            Cut::Premium => "Premium",
            Cut::Ideal => "Ideal",
        }
    }

    pub fn parse(s: &str) -> Option<Cut> {
        Cut::ALL.into_iter().find(|c| c.label() == s)
    }

    /// Position in the domain order, 0 = worst.
    pub fn rank(self) -> usize {
        self as usize
    }
}

/// Color grade, worst → best.  Reverse-alphabetical on purpose: D is best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ColorGrade {
    J,
    I,
    H,
    G,
    F,
    E,
    D,
}

impl ColorGrade {
    pub const ALL: [ColorGrade; 7] = [
        ColorGrade::J,
        ColorGrade::I,
        ColorGrade::H,
        ColorGrade::G,
        ColorGrade::F,
        ColorGrade::E,
        ColorGrade::D,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ColorGrade::J => "J",
            ColorGrade::I => "I",
            ColorGrade::H => "H",
            ColorGrade::G => "G",
            ColorGrade::F => "F",
            ColorGrade::E => "E",
            ColorGrade::D => "D",
        }
    }

    pub fn parse(s: &str) -> Option<ColorGrade> {
        ColorGrade::ALL.into_iter().find(|c| c.label() == s)
    }

    pub fn rank(self) -> usize {
        self as usize
    }
}

/// Clarity grade, worst → best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Clarity {
    I1,
    SI2,
    SI1,
    VS2,
    VS1,
    VVS2,
    VVS1,
    IF,
}

impl Clarity {
    pub const ALL: [Clarity; 8] = [
        Clarity::I1,
        Clarity::SI2,
        Clarity::SI1,
        Clarity::VS2,
        Clarity::VS1,
        Clarity::VVS2,
        Clarity::VVS1,
        Clarity::IF,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Clarity::I1 => "I1",
            Clarity::SI2 => "SI2",
            Clarity::SI1 => "SI1",
            Clarity::VS2 => "VS2",
            Clarity::VS1 => "VS1",
            Clarity::VVS2 => "VVS2",
            Clarity::VVS1 => "VVS1",
            Clarity::IF => "IF",
        }
    }

    pub fn parse(s: &str) -> Option<Clarity> {
        Clarity::ALL.into_iter().find(|c| c.label() == s)
    }

    pub fn rank(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for ColorGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Clarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Carat buckets
// ---------------------------------------------------------------------------

/// Weight bucket derived from `carat` with fixed bin edges
/// `(0, 0.5, 1, 1.5, 2, 5]`, half-open on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CaratGroup {
    UpToHalf,
    HalfToOne,
    OneToOneHalf,
    OneHalfToTwo,
    TwoToFive,
}

impl CaratGroup {
    pub const ALL: [CaratGroup; 5] = [
        CaratGroup::UpToHalf,
        CaratGroup::HalfToOne,
        CaratGroup::OneToOneHalf,
        CaratGroup::OneHalfToTwo,
        CaratGroup::TwoToFive,
    ];

    const EDGES: [f64; 6] = [0.0, 0.5, 1.0, 1.5, 2.0, 5.0];

    pub fn label(self) -> &'static str {
        match self {
            CaratGroup::UpToHalf => "0-0.5",
            CaratGroup::HalfToOne => "0.5-1",
            CaratGroup::OneToOneHalf => "1-1.5",
            CaratGroup::OneHalfToTwo => "1.5-2",
            CaratGroup::TwoToFive => "2-5",
        }
    }

    /// Bucket a weight.  `None` for carats outside `(0, 5]`, which then
    /// simply never show up in carat-group aggregates.
    pub fn from_carat(carat: f64) -> Option<CaratGroup> {
        Self::ALL
            .into_iter()
            .enumerate()
            .find(|&(i, _)| carat > Self::EDGES[i] && carat <= Self::EDGES[i + 1])
            .map(|(_, g)| g)
    }
}

impl fmt::Display for CaratGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Record – one gemstone observation
// ---------------------------------------------------------------------------

/// A single gemstone observation (one row of the source table).
/// Field order matches the deployed CSV column order, so `csv::Writer`
/// serializes exports with the same header as the input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub carat: f64,
    pub cut: Cut,
    pub color: ColorGrade,
    pub clarity: Clarity,
    pub depth: f64,
    pub table: f64,
    pub price: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Record {
    /// Physical-plausibility check applied at load time.
    pub fn has_valid_dimensions(&self) -> bool {
        self.x > 0.0 && self.y > 0.0 && self.z > 0.0
    }

    pub fn carat_group(&self) -> Option<CaratGroup> {
        CaratGroup::from_carat(self.carat)
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full loaded dataset, immutable after construction.  Observed category
/// sets and numeric ranges are pre-computed for filter defaults and widget
/// bounds.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All surviving records (invalid-dimension rows already dropped).
    pub records: Vec<Record>,
    /// Column names of the source header, kept for schema guards.
    pub columns: Vec<String>,
    /// Cut grades actually present in the data.
    pub cuts: BTreeSet<Cut>,
    /// Color grades actually present.
    pub colors: BTreeSet<ColorGrade>,
    /// Clarity grades actually present.
    pub clarities: BTreeSet<Clarity>,
    /// Observed (min, max) price.
    pub price_range: (f64, f64),
    /// Observed (min, max) carat.
    pub carat_range: (f64, f64),
}

impl Dataset {
    /// Build the category/range indices from the loaded records.
    pub fn from_records(records: Vec<Record>, columns: Vec<String>) -> Self {
        let mut cuts = BTreeSet::new();
        let mut colors = BTreeSet::new();
        let mut clarities = BTreeSet::new();
        let mut price_range = (f64::INFINITY, f64::NEG_INFINITY);
        let mut carat_range = (f64::INFINITY, f64::NEG_INFINITY);

        for rec in &records {
            cuts.insert(rec.cut);
            colors.insert(rec.color);
            clarities.insert(rec.clarity);
            price_range.0 = price_range.0.min(rec.price);
            price_range.1 = price_range.1.max(rec.price);
            carat_range.0 = carat_range.0.min(rec.carat);
            carat_range.1 = carat_range.1.max(rec.carat);
        }
        if records.is_empty() {
            price_range = (0.0, 0.0);
            carat_range = (0.0, 0.0);
        }

        Dataset {
            records,
            columns,
            cuts,
            colors,
            clarities,
            price_range,
            carat_range,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check that every named column exists in the source header.
    pub fn require_columns(&self, required: &[&str]) -> Result<(), DataError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !self.columns.iter().any(|h| h == *c))
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DataError::MissingColumns { columns: missing })
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors surfaced by the filter/aggregation pipeline.
///
/// `MissingColumns` is fatal for the current pass; `EmptySelection` is a
/// legitimate terminal state that only halts chart rendering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("missing required column(s): {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },
    #[error("no gemstones match the current filters")]
    EmptySelection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_order_follows_domain_not_lexical() {
        assert!(Cut::Fair < Cut::Ideal);
        assert!(Cut::Good < Cut::VeryGood);
        // D is the best color even though it sorts first alphabetically.
        assert!(ColorGrade::J < ColorGrade::D);
        assert!(ColorGrade::E < ColorGrade::D);
        assert!(Clarity::I1 < Clarity::SI2);
        assert!(Clarity::VVS1 < Clarity::IF);
    }

    #[test]
    fn labels_parse_back() {
        for c in Cut::ALL {
            assert_eq!(Cut::parse(c.label()), Some(c));
        }
        for c in ColorGrade::ALL {
            assert_eq!(ColorGrade::parse(c.label()), Some(c));
        }
        for c in Clarity::ALL {
            assert_eq!(Clarity::parse(c.label()), Some(c));
        }
        assert_eq!(Cut::parse("very good"), None);
        assert_eq!(ColorGrade::parse("K"), None);
    }

    #[test]
    fn ranks_count_up_from_worst() {
        assert_eq!(Cut::Fair.rank(), 0);
        assert_eq!(Cut::Ideal.rank(), 4);
        assert_eq!(ColorGrade::J.rank(), 0);
        assert_eq!(ColorGrade::D.rank(), 6);
        assert_eq!(Clarity::I1.rank(), 0);
        assert_eq!(Clarity::IF.rank(), 7);
    }

    #[test]
    fn carat_buckets_are_left_open_right_closed() {
        assert_eq!(CaratGroup::from_carat(0.3), Some(CaratGroup::UpToHalf));
        assert_eq!(CaratGroup::from_carat(0.7), Some(CaratGroup::HalfToOne));
        assert_eq!(CaratGroup::from_carat(1.8), Some(CaratGroup::OneHalfToTwo));
        // Edge values belong to the bucket on their left.
        assert_eq!(CaratGroup::from_carat(0.5), Some(CaratGroup::UpToHalf));
        assert_eq!(CaratGroup::from_carat(1.0), Some(CaratGroup::HalfToOne));
        assert_eq!(CaratGroup::from_carat(5.0), Some(CaratGroup::TwoToFive));
        // Outside (0, 5] there is no bucket.
        assert_eq!(CaratGroup::from_carat(0.0), None);
        assert_eq!(CaratGroup::from_carat(5.1), None);
    }

    #[test]
    fn dimension_check_rejects_non_positive_axes() {
        let mut rec = Record {
            carat: 0.5,
            cut: Cut::Ideal,
            color: ColorGrade::E,
            clarity: Clarity::VS1,
            depth: 61.5,
            table: 55.0,
            price: 1500.0,
            x: 5.1,
            y: 5.2,
            z: 3.1,
        };
        assert!(rec.has_valid_dimensions());
        rec.z = 0.0;
        assert!(!rec.has_valid_dimensions());
    }

    #[test]
    fn observed_sets_and_ranges() {
        let records = vec![
            Record {
                carat: 0.4,
                cut: Cut::Good,
                color: ColorGrade::G,
                clarity: Clarity::SI1,
                depth: 62.0,
                table: 57.0,
                price: 800.0,
                x: 4.7,
                y: 4.7,
                z: 2.9,
            },
            Record {
                carat: 1.2,
                cut: Cut::Ideal,
                color: ColorGrade::G,
                clarity: Clarity::VS2,
                depth: 61.0,
                table: 56.0,
                price: 7200.0,
                x: 6.8,
                y: 6.8,
                z: 4.2,
            },
        ];
        let ds = Dataset::from_records(records, vec!["price".into(), "carat".into()]);
        assert_eq!(ds.cuts.len(), 2);
        assert_eq!(ds.colors.len(), 1);
        assert_eq!(ds.price_range, (800.0, 7200.0));
        assert_eq!(ds.carat_range, (0.4, 1.2));
    }

    #[test]
    fn require_columns_names_the_missing_ones() {
        let ds = Dataset::from_records(Vec::new(), vec!["price".into(), "carat".into()]);
        assert!(ds.require_columns(&["price", "carat"]).is_ok());
        let err = ds.require_columns(&["price", "cut", "color"]).unwrap_err();
        match err {
            DataError::MissingColumns { columns } => {
                assert_eq!(columns, vec!["cut".to_string(), "color".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
