use std::collections::BTreeSet;

use super::model::{CaratGroup, Clarity, ColorGrade, Cut, DataError, Dataset, Record};

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// Columns the pipeline re-verifies before producing any output.
pub const FILTER_COLUMNS: [&str; 5] = ["price", "carat", "cut", "color", "clarity"];

/// Fixed starting points for the range sliders, independent of the data's
/// true extent.
pub const DEFAULT_PRICE_RANGE: (f64, f64) = (1000.0, 10000.0);
pub const DEFAULT_CARAT_RANGE: (f64, f64) = (0.5, 2.0);

/// One immutable constraint set, re-derived from widget state on every
/// control change.  Ranges are inclusive on both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub price_range: (f64, f64),
    pub carat_range: (f64, f64),
    pub cuts: BTreeSet<Cut>,
    pub colors: BTreeSet<ColorGrade>,
    pub clarities: BTreeSet<Clarity>,
}

impl FilterCriteria {
    /// Default criteria for a freshly loaded dataset: every observed grade
    /// selected, ranges at their fixed starting points.
    pub fn defaults_for(dataset: &Dataset) -> Self {
        FilterCriteria {
            price_range: DEFAULT_PRICE_RANGE,
            carat_range: DEFAULT_CARAT_RANGE,
            cuts: dataset.cuts.clone(),
            colors: dataset.colors.clone(),
            clarities: dataset.clarities.clone(),
        }
    }

    fn matches(&self, rec: &Record) -> bool {
        rec.price >= self.price_range.0
            && rec.price <= self.price_range.1
            && rec.carat >= self.carat_range.0
            && rec.carat <= self.carat_range.1
            && self.cuts.contains(&rec.cut)
            && self.colors.contains(&rec.color)
            && self.clarities.contains(&rec.clarity)
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// The surviving subset plus its summary statistics.  A pure function of
/// (dataset, criteria); the source records are never touched.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    /// Indices into `Dataset::records`, in original order.
    pub indices: Vec<usize>,
    /// Carat bucket per surviving record, aligned with `indices`.
    pub carat_groups: Vec<Option<CaratGroup>>,
    pub count: usize,
    pub mean_price: f64,
    pub mean_carat: f64,
}

impl FilteredView {
    /// Iterate the surviving records in original order.
    pub fn records<'a>(&'a self, dataset: &'a Dataset) -> impl Iterator<Item = &'a Record> + 'a {
        self.indices.iter().map(|&i| &dataset.records[i])
    }
}

/// Apply the conjunction of all predicates and compute summary statistics.
///
/// A min > max range is legitimate input: it selects nothing and surfaces
/// as [`DataError::EmptySelection`], which halts chart rendering but is not
/// fatal.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> Result<FilteredView, DataError> {
    dataset.require_columns(&FILTER_COLUMNS)?;

    let indices: Vec<usize> = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| criteria.matches(rec))
        .map(|(i, _)| i)
        .collect();

    if indices.is_empty() {
        return Err(DataError::EmptySelection);
    }

    let count = indices.len();
    let mut price_sum = 0.0;
    let mut carat_sum = 0.0;
    let mut carat_groups = Vec::with_capacity(count);
    for &i in &indices {
        let rec = &dataset.records[i];
        price_sum += rec.price;
        carat_sum += rec.carat;
        carat_groups.push(rec.carat_group());
    }

    Ok(FilteredView {
        indices,
        carat_groups,
        count,
        mean_price: price_sum / count as f64,
        mean_carat: carat_sum / count as f64,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn rec(
        carat: f64,
        price: f64,
        cut: Cut,
        color: ColorGrade,
        clarity: Clarity,
    ) -> Record {
        Record {
            carat,
            cut,
            color,
            clarity,
            depth: 61.5,
            table: 56.0,
            price,
            x: 5.0,
            y: 5.0,
            z: 3.0,
        }
    }

    pub(crate) fn sample_dataset() -> Dataset {
        let records = vec![
            rec(0.3, 612.0, Cut::Ideal, ColorGrade::E, Clarity::VS1),
            rec(0.7, 2757.0, Cut::Premium, ColorGrade::G, Clarity::SI1),
            rec(1.2, 6800.0, Cut::VeryGood, ColorGrade::H, Clarity::VS2),
            rec(1.8, 9800.0, Cut::Good, ColorGrade::J, Clarity::I1),
            rec(2.3, 18000.0, Cut::Ideal, ColorGrade::D, Clarity::IF),
        ];
        let columns = super::super::loader::REQUIRED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .collect();
        Dataset::from_records(records, columns)
    }

    fn all_of(ds: &Dataset) -> FilterCriteria {
        FilterCriteria {
            price_range: (0.0, f64::MAX),
            carat_range: (0.0, f64::MAX),
            cuts: ds.cuts.clone(),
            colors: ds.colors.clone(),
            clarities: ds.clarities.clone(),
        }
    }

    #[test]
    fn every_surviving_record_satisfies_all_predicates() {
        let ds = sample_dataset();
        let mut criteria = all_of(&ds);
        criteria.price_range = (1000.0, 10000.0);
        criteria.carat_range = (0.5, 2.0);
        criteria.cuts.remove(&Cut::Good);

        let view = filter(&ds, &criteria).unwrap();
        assert_eq!(view.count, view.indices.len());
        for rec in view.records(&ds) {
            assert!(rec.price >= 1000.0 && rec.price <= 10000.0);
            assert!(rec.carat >= 0.5 && rec.carat <= 2.0);
            assert!(criteria.cuts.contains(&rec.cut));
            assert!(criteria.colors.contains(&rec.color));
            assert!(criteria.clarities.contains(&rec.clarity));
        }
        // Only the 0.7 and 1.2 carat stones survive.
        assert_eq!(view.count, 2);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let ds = sample_dataset();
        let mut criteria = all_of(&ds);
        criteria.price_range = (612.0, 612.0);
        criteria.carat_range = (0.3, 0.3);

        let view = filter(&ds, &criteria).unwrap();
        assert_eq!(view.count, 1);
        assert_eq!(view.indices, vec![0]);
    }

    #[test]
    fn summary_statistics_match_the_subset() {
        let ds = sample_dataset();
        let mut criteria = all_of(&ds);
        criteria.price_range = (600.0, 3000.0);

        let view = filter(&ds, &criteria).unwrap();
        assert_eq!(view.count, 2);
        assert!((view.mean_price - (612.0 + 2757.0) / 2.0).abs() < 1e-9);
        assert!((view.mean_carat - 0.5).abs() < 1e-9);
    }

    #[test]
    fn carat_groups_align_with_indices() {
        let ds = sample_dataset();
        let view = filter(&ds, &all_of(&ds)).unwrap();
        assert_eq!(view.carat_groups.len(), view.indices.len());
        assert_eq!(view.carat_groups[0], Some(CaratGroup::UpToHalf));
        assert_eq!(view.carat_groups[1], Some(CaratGroup::HalfToOne));
        assert_eq!(view.carat_groups[3], Some(CaratGroup::OneHalfToTwo));
    }

    #[test]
    fn inverted_range_is_an_empty_selection_not_a_panic() {
        let ds = sample_dataset();
        let mut criteria = all_of(&ds);
        criteria.price_range = (5000.0, 4000.0);

        assert_eq!(filter(&ds, &criteria), Err(DataError::EmptySelection));
    }

    #[test]
    fn nothing_selected_in_a_grade_set_is_an_empty_selection() {
        let ds = sample_dataset();
        let mut criteria = all_of(&ds);
        criteria.clarities.clear();

        assert_eq!(filter(&ds, &criteria), Err(DataError::EmptySelection));
    }

    #[test]
    fn schema_guard_runs_before_filtering() {
        let ds = Dataset::from_records(
            vec![rec(0.5, 1500.0, Cut::Ideal, ColorGrade::E, Clarity::VS1)],
            vec!["price".into(), "carat".into(), "cut".into()],
        );
        let criteria = FilterCriteria::defaults_for(&ds);
        let err = filter(&ds, &criteria).unwrap_err();
        assert_eq!(
            err,
            DataError::MissingColumns {
                columns: vec!["color".to_string(), "clarity".to_string()],
            }
        );
    }

    #[test]
    fn defaults_use_fixed_ranges_and_observed_grades() {
        let ds = sample_dataset();
        let criteria = FilterCriteria::defaults_for(&ds);
        assert_eq!(criteria.price_range, DEFAULT_PRICE_RANGE);
        assert_eq!(criteria.carat_range, DEFAULT_CARAT_RANGE);
        assert_eq!(criteria.cuts, ds.cuts);
        assert!(!criteria.colors.contains(&ColorGrade::F)); // not observed
    }
}
