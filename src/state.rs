use std::sync::Arc;

use crate::color::ClarityPalette;
use crate::data::filter::{FilterCriteria, FilteredView, filter};
use crate::data::model::{DataError, Dataset};

// ---------------------------------------------------------------------------
// Chart selection
// ---------------------------------------------------------------------------

/// The fixed menu of analyses.  One enumeration feeding one pipeline,
/// rather than per-chart copies of the filtering logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    PriceHistogram,
    PriceVsCarat,
    PriceByClarity,
    PriceByColor,
    PriceByCaratGroup,
    CutDistribution,
    PriceVsDimensions,
    CorrelationHeatmap,
    Projection,
}

impl ChartKind {
    pub const ALL: [ChartKind; 9] = [
        ChartKind::PriceHistogram,
        ChartKind::PriceVsCarat,
        ChartKind::PriceByClarity,
        ChartKind::PriceByColor,
        ChartKind::PriceByCaratGroup,
        ChartKind::CutDistribution,
        ChartKind::PriceVsDimensions,
        ChartKind::CorrelationHeatmap,
        ChartKind::Projection,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::PriceHistogram => "Price distribution",
            ChartKind::PriceVsCarat => "Price vs carat",
            ChartKind::PriceByClarity => "Mean price per clarity",
            ChartKind::PriceByColor => "Mean price per color",
            ChartKind::PriceByCaratGroup => "Mean price per carat group",
            ChartKind::CutDistribution => "Cut distribution",
            ChartKind::PriceVsDimensions => "Price vs dimensions",
            ChartKind::CorrelationHeatmap => "Correlation heatmap",
            ChartKind::Projection => "2D projection (PCA)",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until the user opens a file).  Shared, never
    /// mutated after load.
    pub dataset: Option<Arc<Dataset>>,

    /// Current filter constraints, re-derived from widget state.
    pub criteria: Option<FilterCriteria>,

    /// Result of the last filter pass (None while the selection is empty
    /// or the schema check failed).
    pub view: Option<FilteredView>,

    /// Why the last pass produced no view.
    pub pass_error: Option<DataError>,

    /// Which analysis the central panel renders.
    pub chart: ChartKind,

    /// Render every analysis at once instead of the selected one.
    pub show_all: bool,

    /// Colors for the projection scatter.
    pub clarity_palette: ClarityPalette,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            criteria: None,
            view: None,
            pass_error: None,
            chart: ChartKind::PriceHistogram,
            show_all: false,
            clarity_palette: ClarityPalette::default(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset and run the first filter pass with
    /// default criteria.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        self.criteria = Some(FilterCriteria::defaults_for(&dataset));
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the filtered view after a criteria change.  An empty
    /// selection is a legitimate state, not an error message.
    pub fn refilter(&mut self) {
        let (Some(dataset), Some(criteria)) = (&self.dataset, &self.criteria) else {
            self.view = None;
            self.pass_error = None;
            return;
        };
        match filter(dataset, criteria) {
            Ok(view) => {
                log::debug!("Filter pass kept {} of {} records", view.count, dataset.len());
                self.view = Some(view);
                self.pass_error = None;
            }
            Err(err) => {
                log::debug!("Filter pass produced no view: {err}");
                self.view = None;
                self.pass_error = Some(err);
            }
        }
    }

    /// Reset the criteria to the defaults for the loaded dataset.
    pub fn reset_filters(&mut self) {
        if let Some(dataset) = &self.dataset {
            self.criteria = Some(FilterCriteria::defaults_for(dataset));
            self.refilter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::tests::sample_dataset;

    #[test]
    fn loading_a_dataset_runs_a_default_pass() {
        let mut state = AppState::default();
        state.set_dataset(Arc::new(sample_dataset()));

        let view = state.view.as_ref().expect("default pass yields a view");
        // The fixed default ranges keep the mid-priced stones.
        assert_eq!(view.count, 3);
        assert!(state.pass_error.is_none());
    }

    #[test]
    fn empty_selection_clears_the_view_but_is_recoverable() {
        let mut state = AppState::default();
        state.set_dataset(Arc::new(sample_dataset()));

        if let Some(criteria) = &mut state.criteria {
            criteria.price_range = (5000.0, 4000.0);
        }
        state.refilter();
        assert!(state.view.is_none());
        assert_eq!(state.pass_error, Some(DataError::EmptySelection));

        state.reset_filters();
        assert!(state.view.is_some());
        assert!(state.pass_error.is_none());
    }
}
