use crate::changeover::{Provider, ProviderEra};
use crate::error::{Result, SeriesError};
use crate::keywords::pods_from_comment;
use crate::observation::{
    column_indices, field, line_of, malformed, optional_column, parse_value,
};
use crate::year_series::{Availability, RowIssue};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};
use osr_calendar::dates::{parse_date, parse_timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{fmt, str::FromStr};

/// Latitude of the Admiralty Inlet entrance. Sightings strictly north of it
/// are in the central Salish Sea, the rest in Puget Sound.
pub const ENTRY_LATITUDE: f64 = 48.19437;

/// Old provider columns: date, latitude, longitude.
pub const OLD_REQUIRED_COLUMNS: [&str; 3] = ["SightDate", "latitude", "longitude"];

/// New provider columns: timestamp, latitude, longitude, pod flags.
pub const NEW_REQUIRED_COLUMNS: [&str; 6] = ["created", "latitude", "longitude", "J", "K", "L"];

/// A resident pod tracked in the sighting logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Pod {
    J,
    K,
    L,
}

impl Pod {
    pub const ALL: [Pod; 3] = [Pod::J, Pod::K, Pod::L];

    fn bit(&self) -> u8 {
        match self {
            Pod::J => 0b001,
            Pod::K => 0b010,
            Pod::L => 0b100,
        }
    }
}

impl fmt::Display for Pod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pod::J => "J",
            Pod::K => "K",
            Pod::L => "L",
        };
        f.write_str(name)
    }
}

impl FromStr for Pod {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_end_matches(" pod").to_ascii_uppercase().as_str() {
            "J" => Ok(Pod::J),
            "K" => Ok(Pod::K),
            "L" => Ok(Pod::L),
            other => Err(SeriesError::Configuration(format!("unknown pod: {other}"))),
        }
    }
}

/// The set of pods a report mentions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PodSet(u8);

impl PodSet {
    pub fn empty() -> Self {
        PodSet(0)
    }

    pub fn only(pod: Pod) -> Self {
        PodSet(pod.bit())
    }

    pub fn insert(&mut self, pod: Pod) {
        self.0 |= pod.bit();
    }

    pub fn contains(&self, pod: Pod) -> bool {
        self.0 & pod.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Pod> + '_ {
        Pod::ALL.into_iter().filter(|pod| self.contains(*pod))
    }
}

impl FromIterator<Pod> for PodSet {
    fn from_iter<T: IntoIterator<Item = Pod>>(iter: T) -> Self {
        let mut set = PodSet::empty();
        for pod in iter {
            set.insert(pod);
        }
        set
    }
}

/// Which side of the entry latitude a sighting was made on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    CentralSalish,
    PugetSound,
}

impl Region {
    pub fn from_latitude(latitude: f64) -> Region {
        if latitude > ENTRY_LATITUDE {
            Region::CentralSalish
        } else {
            Region::PugetSound
        }
    }
}

impl FromStr for Region {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "central-salish" | "central salish" => Ok(Region::CentralSalish),
            "puget-sound" | "puget sound" => Ok(Region::PugetSound),
            other => Err(SeriesError::Configuration(format!("unknown region: {other}"))),
        }
    }
}

/// One sighting report.
#[derive(Debug, Clone, PartialEq)]
pub struct SightingRecord {
    pub timestamp: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
    pub pods: PodSet,
    /// Reported number of animals; the old provider never records it.
    pub group_size: Option<f64>,
    pub source: Provider,
    /// False when the report gave a date only; `timestamp` is then midnight.
    pub timed: bool,
}

impl SightingRecord {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn region(&self) -> Region {
        Region::from_latitude(self.latitude)
    }
}

/// Sighting reports for one year, from one provider or from the
/// concatenation of both.
#[derive(Debug, Clone, PartialEq)]
pub struct SightingLog {
    pub year: i32,
    pub era: ProviderEra,
    pub records: Vec<SightingRecord>,
    pub availability: Availability,
    pub issues: Vec<RowIssue>,
}

impl SightingLog {
    pub fn unavailable(year: i32, era: ProviderEra, reason: impl Into<String>) -> Self {
        SightingLog {
            year,
            era,
            records: Vec::new(),
            availability: Availability::Unavailable {
                reason: reason.into(),
            },
            issues: Vec::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }

    /// Concatenate the logs of both providers for an overlap year.
    ///
    /// Records keep their order, old provider first. A record is dropped
    /// only when an earlier log holds a timed record with the same
    /// timestamp; reports within one log are never merged, and untimed
    /// reports are always kept. The result is available if either input
    /// was.
    pub fn concat_dedup(year: i32, logs: Vec<SightingLog>) -> SightingLog {
        let mut earlier: HashSet<NaiveDateTime> = HashSet::new();
        let mut records = Vec::new();
        let mut issues = Vec::new();
        let mut reasons = Vec::new();
        let mut any_available = false;
        for log in logs {
            match log.availability {
                Availability::Available => any_available = true,
                Availability::Unavailable { reason } => reasons.push(reason),
            }
            issues.extend(log.issues);
            let timed: Vec<NaiveDateTime> = log
                .records
                .iter()
                .filter(|record| record.timed)
                .map(|record| record.timestamp)
                .collect();
            records.extend(
                log.records
                    .into_iter()
                    .filter(|record| !(record.timed && earlier.contains(&record.timestamp))),
            );
            earlier.extend(timed);
        }
        let availability = if any_available {
            Availability::Available
        } else {
            Availability::Unavailable {
                reason: reasons.join("; "),
            }
        };
        SightingLog {
            year,
            era: ProviderEra::Both,
            records,
            availability,
            issues,
        }
    }
}

/// Parse one year of the given provider's log.
pub fn parse_sighting_table(provider: Provider, year: i32, csv_data: &str) -> Result<SightingLog> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());
    let headers = rdr.headers()?.clone();
    let schema = match provider {
        Provider::Old => Schema::Old {
            columns: column_indices(&headers, &OLD_REQUIRED_COLUMNS)?,
            time: optional_column(&headers, "Time1"),
            comments: optional_column(&headers, "Comments"),
        },
        Provider::New => Schema::New {
            columns: column_indices(&headers, &NEW_REQUIRED_COLUMNS)?,
            group_size: optional_column(&headers, "no_sighted"),
        },
    };

    let mut records = Vec::new();
    let mut issues = Vec::new();
    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                issues.push(RowIssue {
                    line: e.position().map(|p| p.line()).unwrap_or_default(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        match schema.parse_row(&record, year) {
            Ok(sighting) => records.push(sighting),
            Err(SeriesError::MalformedRow { line, reason }) => {
                issues.push(RowIssue { line, reason })
            }
            Err(e) => return Err(e),
        }
    }

    if !issues.is_empty() {
        warn!(
            "loader: {} {}: dropped {} malformed sighting rows",
            provider,
            year,
            issues.len()
        );
    }
    info!("loader: {} {}: loaded {} sightings", provider, year, records.len());
    let era = match provider {
        Provider::Old => ProviderEra::Old,
        Provider::New => ProviderEra::New,
    };
    Ok(SightingLog {
        year,
        era,
        records,
        availability: Availability::Available,
        issues,
    })
}

enum Schema {
    Old {
        columns: Vec<usize>,
        time: Option<usize>,
        comments: Option<usize>,
    },
    New {
        columns: Vec<usize>,
        group_size: Option<usize>,
    },
}

impl Schema {
    fn parse_row(&self, record: &StringRecord, year: i32) -> Result<SightingRecord> {
        let line = line_of(record);
        match self {
            Schema::Old {
                columns,
                time,
                comments,
            } => {
                let date_field = field(record, columns[0]);
                let date = parse_date(date_field)
                    .ok_or_else(|| malformed(line, format!("unparseable date: {date_field:?}")))?;
                let time_of_day = match time.map(|index| field(record, index)) {
                    None | Some("") => None,
                    Some(t) => Some(
                        parse_time(t)
                            .ok_or_else(|| malformed(line, format!("unparseable time: {t:?}")))?,
                    ),
                };
                let pods = comments
                    .map(|index| pods_from_comment(field(record, index)))
                    .unwrap_or_default();
                let mut sighting = build_record(
                    date.and_time(time_of_day.unwrap_or(NaiveTime::MIN)),
                    (field(record, columns[1]), field(record, columns[2])),
                    pods,
                    None,
                    Provider::Old,
                    year,
                    line,
                )?;
                sighting.timed = time_of_day.is_some();
                Ok(sighting)
            }
            Schema::New {
                columns,
                group_size,
            } => {
                let created = field(record, columns[0]);
                let timestamp = parse_timestamp(created)
                    .ok_or_else(|| malformed(line, format!("unparseable timestamp: {created:?}")))?;
                let mut pods = PodSet::empty();
                for (pod, index) in Pod::ALL.iter().zip(&columns[3..6]) {
                    if parse_flag(field(record, *index), line)? {
                        pods.insert(*pod);
                    }
                }
                let group_size = match group_size {
                    Some(index) => parse_value(field(record, *index), line)?,
                    None => None,
                };
                build_record(
                    timestamp,
                    (field(record, columns[1]), field(record, columns[2])),
                    pods,
                    group_size,
                    Provider::New,
                    year,
                    line,
                )
            }
        }
    }
}

fn build_record(
    timestamp: NaiveDateTime,
    (latitude, longitude): (&str, &str),
    pods: PodSet,
    group_size: Option<f64>,
    source: Provider,
    year: i32,
    line: u64,
) -> Result<SightingRecord> {
    if timestamp.year() != year {
        return Err(malformed(
            line,
            format!("sighting dated {} in the {year} file", timestamp.year()),
        ));
    }
    let latitude = parse_coordinate(latitude, line)?;
    let longitude = parse_coordinate(longitude, line)?;
    Ok(SightingRecord {
        timestamp,
        latitude,
        longitude,
        pods,
        group_size,
        source,
        timed: true,
    })
}

fn parse_coordinate(s: &str, line: u64) -> Result<f64> {
    parse_value(s, line)?.ok_or_else(|| malformed(line, "missing coordinate".to_string()))
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

fn parse_flag(s: &str, line: u64) -> Result<bool> {
    match s {
        "" | "0" | "0.0" | "False" | "false" => Ok(false),
        "1" | "1.0" | "True" | "true" => Ok(true),
        other => Err(malformed(line, format!("pod flag is not 0/1: {other:?}"))),
    }
}
