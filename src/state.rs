use std::path::{Path, PathBuf};

use crate::data::filter::StationFilter;
use crate::data::insights::{insights, InsightSection};
use crate::data::loader::load_file;
use crate::data::model::MeasurementTable;
use crate::data::pipeline::{aggregate, DerivedViews};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Which page of the dashboard is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Section {
    #[default]
    Overview,
    YearlyTrends,
    YearlyGrowth,
    StationAnalysis,
    Correlation,
    Insights,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Overview,
        Section::YearlyTrends,
        Section::YearlyGrowth,
        Section::StationAnalysis,
        Section::Correlation,
        Section::Insights,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::YearlyTrends => "Yearly Trends",
            Section::YearlyGrowth => "Percentage Growth per Year",
            Section::StationAnalysis => "Highest and Lowest Stations",
            Section::Correlation => "Correlation Analysis",
            Section::Insights => "Insights",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<MeasurementTable>,

    /// File the dataset came from.
    pub source: Option<PathBuf>,

    /// Active page.
    pub section: Section,

    /// Active station filter.
    pub filter: StationFilter,

    /// Views for `dataset` + `filter`; rebuilt on every change to either.
    pub views: DerivedViews,

    /// Narrative derived from `views`.
    pub insights: Vec<InsightSection>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Ingest a newly loaded dataset. The filter resets to all stations.
    pub fn set_dataset(&mut self, dataset: MeasurementTable, source: Option<PathBuf>) {
        self.dataset = Some(dataset);
        self.source = source;
        self.filter = StationFilter::All;
        self.status_message = None;
        self.recompute();
    }

    /// Load `path`, keeping the current dataset if that fails.
    pub fn load_from(&mut self, path: &Path) -> Result<(), LoadError> {
        match load_file(path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} measurements from {} ({} stations)",
                    dataset.len(),
                    path.display(),
                    dataset.stations().len()
                );
                self.set_dataset(dataset, Some(path.to_path_buf()));
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Change the station filter and rebuild the views.
    pub fn set_filter(&mut self, filter: StationFilter) {
        if filter == self.filter {
            return;
        }
        log::info!("Station filter: {filter}");
        self.filter = filter;
        self.recompute();
    }

    pub fn set_section(&mut self, section: Section) {
        self.section = section;
    }

    /// Re-run the pipeline for the current dataset and filter.
    pub fn recompute(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.views = DerivedViews::default();
            self.insights.clear();
            return;
        };
        self.views = aggregate(dataset, &self.filter);
        if let Err(e) = self.views.ensure_data() {
            log::warn!("{e}");
        }
        self.insights = insights(&self.views);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Field, MeasurementRow};

    fn table() -> MeasurementTable {
        MeasurementTable::from_rows(vec![
            MeasurementRow::new("Dongsi", 2013).with(Field::Pm25, 50.0),
            MeasurementRow::new("Dongsi", 2017).with(Field::Pm25, 60.0),
            MeasurementRow::new("Dingling", 2013).with(Field::Pm25, 10.0),
        ])
    }

    #[test]
    fn dataset_computes_views() {
        let mut state = AppState::default();
        assert!(state.views.is_empty());
        state.set_dataset(table(), None);
        assert_eq!(state.views.row_count, 3);
        assert!(!state.insights.is_empty());
    }

    #[test]
    fn filter_change_recomputes() {
        let mut state = AppState::default();
        state.set_dataset(table(), None);
        state.set_filter(StationFilter::Station("Dongsi".into()));
        assert_eq!(state.views.row_count, 2);
        assert_eq!(state.views.station_averages.stations.len(), 1);

        state.set_filter(StationFilter::Station("Nowhere".into()));
        assert!(state.views.is_empty());
        assert!(state.insights.is_empty());
    }

    #[test]
    fn section_is_plain_state() {
        let mut state = AppState::default();
        assert_eq!(state.section, Section::Overview);
        state.set_section(Section::Correlation);
        assert_eq!(state.section, Section::Correlation);
        assert_eq!(Section::ALL.len(), 6);
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut state = AppState::default();
        state.set_dataset(table(), None);
        let dir = tempfile::tempdir().unwrap();
        let result = state.load_from(&dir.path().join("missing.csv"));
        assert!(result.is_err());
        assert_eq!(state.dataset.as_ref().map(|d| d.len()), Some(3));
        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
    }
}
