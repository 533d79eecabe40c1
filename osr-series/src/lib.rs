//! Per-year series for the salmon run gauges and the orca sighting logs.
//!
//! Raw tables are read one (site, year) at a time through a
//! [`store::YearSource`] and parsed into immutable [`YearSeries`] or
//! [`sighting::SightingLog`] values. A missing file never aborts a load; it
//! yields an unavailable year.
//!
//! ```
//! use osr_series::store::{load_year, MemorySource};
//! use osr_series::site::Site;
//! use osr_calendar::CalendarDay;
//!
//! let source = MemorySource::new()
//!     .with_year_table(Site::AlbionCpue, 2021, "day,mon,cpue1\n15,Apr,0.52\n");
//! let series = load_year(&source, Site::AlbionCpue, 2021).unwrap();
//! assert_eq!(series.value_on(CalendarDay::new(4, 15)), Some(0.52));
//!
//! let missing = load_year(&source, Site::AlbionCpue, 2022).unwrap();
//! assert!(!missing.is_available());
//! ```

pub mod changeover;
pub mod error;
pub mod keywords;
pub mod observation;
pub mod sighting;
pub mod site;
pub mod store;
pub mod year_series;

pub use error::{Result, SeriesError};
pub use year_series::{YearArena, YearSeries};
