//! Where per-year tables come from, and the loaders that turn them into
//! series.
//!
//! A [`YearSource`] hands out raw table text by (site, year) or
//! (provider, year). [`DataStore`] reads files under a data root following a
//! [`DataLayout`]; [`MemorySource`] holds tables supplied by the caller.

use crate::changeover::{ChangeoverCutoffs, Provider, ProviderEra};
use crate::error::{Result, SeriesError};
use crate::observation::parse_year_table;
use crate::sighting::{parse_sighting_table, SightingLog};
use crate::site::Site;
use crate::year_series::{YearArena, YearSeries};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

/// Supplies the raw text of one per-year table.
pub trait YearSource: Send + Sync {
    fn read_year_table(&self, site: Site, year: i32) -> Result<String>;
    fn read_sighting_table(&self, provider: Provider, year: i32) -> Result<String>;
}

/// File naming under a data root. `{year}` in a pattern is replaced with the
/// four-digit year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLayout {
    pub albion: String,
    pub bonneville: String,
    pub lake: String,
    pub provider_old: String,
    pub provider_new: String,
}

impl Default for DataLayout {
    fn default() -> Self {
        DataLayout {
            albion: "foschinook/fos{year}.csv".to_string(),
            bonneville: "bonchinook/bon{year}.csv".to_string(),
            lake: "lakewash/{year}.csv".to_string(),
            provider_old: "twm/twm{year}.csv".to_string(),
            provider_new: "acartia/srkw_{year}.csv".to_string(),
        }
    }
}

impl DataLayout {
    pub fn year_table_path(&self, site: Site, year: i32) -> PathBuf {
        let pattern = match site {
            Site::AlbionCpue => &self.albion,
            Site::BonnevilleCount => &self.bonneville,
            Site::LakeCount => &self.lake,
        };
        PathBuf::from(pattern.replace("{year}", &year.to_string()))
    }

    pub fn sighting_table_path(&self, provider: Provider, year: i32) -> PathBuf {
        let pattern = match provider {
            Provider::Old => &self.provider_old,
            Provider::New => &self.provider_new,
        };
        PathBuf::from(pattern.replace("{year}", &year.to_string()))
    }
}

/// Per-year files under a data directory.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
    layout: DataLayout,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DataStore::with_layout(root, DataLayout::default())
    }

    pub fn with_layout(root: impl Into<PathBuf>, layout: DataLayout) -> Self {
        DataStore {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, source_name: String, year: i32, relative: PathBuf) -> Result<String> {
        let path = self.root.join(relative);
        debug!("store: reading {}", path.display());
        std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => SeriesError::SourceUnavailable {
                source_name,
                year,
                reason: format!("{} not found", path.display()),
            },
            _ => SeriesError::SourceUnavailable {
                source_name,
                year,
                reason: format!("{}: {e}", path.display()),
            },
        })
    }
}

impl YearSource for DataStore {
    fn read_year_table(&self, site: Site, year: i32) -> Result<String> {
        self.read(
            site.key().to_string(),
            year,
            self.layout.year_table_path(site, year),
        )
    }

    fn read_sighting_table(&self, provider: Provider, year: i32) -> Result<String> {
        self.read(
            provider.key().to_string(),
            year,
            self.layout.sighting_table_path(provider, year),
        )
    }
}

/// Tables held in memory, for callers that already have the text.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    year_tables: HashMap<(Site, i32), String>,
    sighting_tables: HashMap<(Provider, i32), String>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    pub fn with_year_table(mut self, site: Site, year: i32, csv: impl Into<String>) -> Self {
        self.year_tables.insert((site, year), csv.into());
        self
    }

    pub fn with_sighting_table(
        mut self,
        provider: Provider,
        year: i32,
        csv: impl Into<String>,
    ) -> Self {
        self.sighting_tables.insert((provider, year), csv.into());
        self
    }
}

impl YearSource for MemorySource {
    fn read_year_table(&self, site: Site, year: i32) -> Result<String> {
        self.year_tables
            .get(&(site, year))
            .cloned()
            .ok_or_else(|| SeriesError::SourceUnavailable {
                source_name: site.key().to_string(),
                year,
                reason: "no table supplied".to_string(),
            })
    }

    fn read_sighting_table(&self, provider: Provider, year: i32) -> Result<String> {
        self.sighting_tables
            .get(&(provider, year))
            .cloned()
            .ok_or_else(|| SeriesError::SourceUnavailable {
                source_name: provider.key().to_string(),
                year,
                reason: "no table supplied".to_string(),
            })
    }
}

/// Load one (site, year).
///
/// An out-of-range year is a configuration error. A missing or unreadable
/// file gives an unavailable series rather than an error.
pub fn load_year(source: &dyn YearSource, site: Site, year: i32) -> Result<YearSeries> {
    site.check_year(year)?;
    let parsed = source
        .read_year_table(site, year)
        .and_then(|text| parse_year_table(site, year, &text));
    match parsed {
        Ok(series) => Ok(series),
        Err(e @ SeriesError::Configuration(_)) => Err(e),
        Err(e) => {
            warn!("loader: {} {} unavailable: {}", site, year, e);
            Ok(YearSeries::unavailable(site, year, e.to_string()))
        }
    }
}

/// Load every year in `years` for one site, in order.
pub fn load_years(
    source: &dyn YearSource,
    site: Site,
    years: RangeInclusive<i32>,
) -> Result<YearArena> {
    years.map(|year| load_year(source, site, year)).collect()
}

/// Load the sighting log for one year, reading whichever providers the
/// changeover rule assigns to it.
pub fn load_sightings(
    source: &dyn YearSource,
    cutoffs: &ChangeoverCutoffs,
    year: i32,
) -> Result<SightingLog> {
    cutoffs.check_year(year)?;
    let era = cutoffs.provider_for(year);
    let mut logs: Vec<SightingLog> = era
        .providers()
        .iter()
        .map(|provider| load_provider_log(source, *provider, year))
        .collect::<Result<_>>()?;
    match era {
        ProviderEra::Both => Ok(SightingLog::concat_dedup(year, logs)),
        ProviderEra::Old | ProviderEra::New => logs.pop().ok_or_else(|| {
            SeriesError::Configuration(format!("no provider assigned to {year}"))
        }),
    }
}

fn load_provider_log(source: &dyn YearSource, provider: Provider, year: i32) -> Result<SightingLog> {
    let era = match provider {
        Provider::Old => ProviderEra::Old,
        Provider::New => ProviderEra::New,
    };
    let parsed = source
        .read_sighting_table(provider, year)
        .and_then(|text| parse_sighting_table(provider, year, &text));
    match parsed {
        Ok(log) => Ok(log),
        Err(e @ SeriesError::Configuration(_)) => Err(e),
        Err(e) => {
            warn!("loader: {} {} unavailable: {}", provider, year, e);
            Ok(SightingLog::unavailable(year, era, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osr_calendar::CalendarDay;
    use std::fs;
    use tempfile::TempDir;

    const ALBION_2021: &str = "day,mon,cpue1\n15,Apr,4.0\n16,Apr,2.5\n";

    fn data_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("foschinook")).unwrap();
        fs::write(dir.path().join("foschinook/fos2021.csv"), ALBION_2021).unwrap();
        dir
    }

    #[test]
    fn test_layout_paths() {
        let layout = DataLayout::default();
        assert_eq!(
            layout.year_table_path(Site::BonnevilleCount, 1999),
            PathBuf::from("bonchinook/bon1999.csv")
        );
        assert_eq!(
            layout.sighting_table_path(Provider::New, 2023),
            PathBuf::from("acartia/srkw_2023.csv")
        );
    }

    #[test]
    fn test_load_year_from_disk() {
        let dir = data_dir();
        let store = DataStore::new(dir.path());
        let series = load_year(&store, Site::AlbionCpue, 2021).unwrap();
        assert!(series.is_available());
        assert_eq!(series.value_on(CalendarDay::new(4, 15)), Some(4.0));
    }

    #[test]
    fn test_missing_file_is_unavailable_not_error() {
        let dir = data_dir();
        let store = DataStore::new(dir.path());
        let series = load_year(&store, Site::AlbionCpue, 2020).unwrap();
        assert!(!series.is_available());
        assert!(series.points().is_empty());
    }

    #[test]
    fn test_out_of_range_year_is_configuration_error() {
        let store = MemorySource::new();
        assert!(matches!(
            load_year(&store, Site::LakeCount, 2010),
            Err(SeriesError::Configuration(_))
        ));
        assert!(matches!(
            load_sightings(&store, &ChangeoverCutoffs::default(), 1900),
            Err(SeriesError::Configuration(_))
        ));
    }

    #[test]
    fn test_unreadable_table_is_unavailable() {
        let source = MemorySource::new().with_year_table(Site::AlbionCpue, 2021, "a,b\n1,2\n");
        let series = load_year(&source, Site::AlbionCpue, 2021).unwrap();
        assert!(!series.is_available());
    }

    #[test]
    fn test_load_years_keeps_gaps() {
        let dir = data_dir();
        let store = DataStore::new(dir.path());
        let arena = load_years(&store, Site::AlbionCpue, 2019..=2021).unwrap();
        assert_eq!(arena.len(), 3);
        assert!(!arena.get(2019).unwrap().is_available());
        assert!(arena.get(2021).unwrap().is_available());
    }

    #[test]
    fn test_loading_twice_is_identical() {
        let dir = data_dir();
        let store = DataStore::new(dir.path());
        let first = load_year(&store, Site::AlbionCpue, 2021).unwrap();
        let second = load_year(&store, Site::AlbionCpue, 2021).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_load_sightings_follows_changeover() {
        let old = "SightDate,Time1,latitude,longitude,Comments\n\
                   2020-05-01,08:00,48.5,-123.1,J pod\n";
        let new = "created,latitude,longitude,no_sighted,J,K,L\n\
                   2020-05-01T08:00:00Z,48.5,-123.1,10,1,0,0\n\
                   2020-05-02T09:00:00Z,48.5,-123.1,6,0,1,0\n";
        let source = MemorySource::new()
            .with_sighting_table(Provider::Old, 2020, old)
            .with_sighting_table(Provider::New, 2020, new)
            .with_sighting_table(Provider::Old, 2017, old.replace("2020", "2017"))
            .with_sighting_table(Provider::New, 2023, new.replace("2020", "2023"));
        let cutoffs = ChangeoverCutoffs::default();

        let both = load_sightings(&source, &cutoffs, 2020).unwrap();
        assert_eq!(both.era, ProviderEra::Both);
        assert_eq!(both.records.len(), 2);
        assert_eq!(both.records[0].source, Provider::Old);
        assert_eq!(both.records[1].source, Provider::New);

        let old_only = load_sightings(&source, &cutoffs, 2017).unwrap();
        assert_eq!(old_only.era, ProviderEra::Old);
        assert_eq!(old_only.records.len(), 1);

        let new_only = load_sightings(&source, &cutoffs, 2023).unwrap();
        assert_eq!(new_only.era, ProviderEra::New);
        assert_eq!(new_only.records.len(), 2);

        let missing = load_sightings(&source, &cutoffs, 2024).unwrap();
        assert!(!missing.is_available());
    }

    #[test]
    fn test_untimed_old_reports_are_all_kept_in_overlap_year() {
        let old = "SightDate,Time1,latitude,longitude,Comments\n\
                   2020-05-01,,48.5,-123.1,J pod\n\
                   2020-05-01,,48.6,-123.2,J pod\n\
                   2020-05-01,,48.7,-123.3,J pod\n";
        let source = MemorySource::new().with_sighting_table(Provider::Old, 2020, old);
        let log = load_sightings(&source, &ChangeoverCutoffs::default(), 2020).unwrap();
        assert_eq!(log.era, ProviderEra::Both);
        assert!(log.is_available());
        assert_eq!(log.records.len(), 3);
    }
}
