//! Parallel load phase.
//!
//! Each (site, year) file is read and parsed on its own blocking task. The
//! handles are awaited in year order, so the resulting arena never depends
//! on which task finished first.

use log::info;
use osr_series::changeover::ChangeoverCutoffs;
use osr_series::sighting::SightingLog;
use osr_series::site::Site;
use osr_series::store::{load_sightings, load_year, YearSource};
use osr_series::YearArena;
use std::ops::RangeInclusive;
use std::sync::Arc;

pub async fn load_site_years(
    source: Arc<dyn YearSource>,
    site: Site,
    years: RangeInclusive<i32>,
) -> anyhow::Result<YearArena> {
    let handles: Vec<_> = years
        .clone()
        .map(|year| {
            let source = Arc::clone(&source);
            tokio::task::spawn_blocking(move || load_year(source.as_ref(), site, year))
        })
        .collect();

    let mut arena = YearArena::new();
    for handle in handles {
        arena.insert(handle.await??);
    }
    let available = arena.iter().filter(|series| series.is_available()).count();
    info!(
        "Loaded {} {}..={}: {} of {} years available",
        site,
        years.start(),
        years.end(),
        available,
        arena.len()
    );
    Ok(arena)
}

pub async fn load_sighting_years(
    source: Arc<dyn YearSource>,
    cutoffs: ChangeoverCutoffs,
    years: RangeInclusive<i32>,
) -> anyhow::Result<Vec<SightingLog>> {
    let handles: Vec<_> = years
        .map(|year| {
            let source = Arc::clone(&source);
            tokio::task::spawn_blocking(move || load_sightings(source.as_ref(), &cutoffs, year))
        })
        .collect();

    let mut logs = Vec::with_capacity(handles.len());
    for handle in handles {
        logs.push(handle.await??);
    }
    info!(
        "Loaded {} sighting logs, {} records",
        logs.len(),
        logs.iter().map(|log| log.records.len()).sum::<usize>()
    );
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use osr_series::changeover::Provider;
    use osr_series::store::{load_years, MemorySource};

    fn source() -> MemorySource {
        (2000..=2010).fold(MemorySource::new(), |source, year| {
            if year == 2004 {
                return source;
            }
            source.with_year_table(
                Site::BonnevilleCount,
                year,
                format!("Project,Date,Chin\nBonneville,{year}-06-01,{}\n", year - 1990),
            )
        })
    }

    #[tokio::test]
    async fn test_parallel_load_matches_sequential() {
        let memory = source();
        let sequential = load_years(&memory, Site::BonnevilleCount, 2000..=2010).unwrap();
        let parallel = load_site_years(Arc::new(memory), Site::BonnevilleCount, 2000..=2010)
            .await
            .unwrap();
        assert_eq!(parallel, sequential);
        assert!(!parallel.get(2004).unwrap().is_available());
    }

    #[tokio::test]
    async fn test_out_of_range_year_fails_the_load() {
        let result = load_site_years(Arc::new(source()), Site::LakeCount, 2000..=2001).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_sighting_years_in_order() {
        let memory = MemorySource::new()
            .with_sighting_table(
                Provider::New,
                2023,
                "created,latitude,longitude,J,K,L\n2023-05-01T10:00:00Z,48.5,-123.0,1,0,0\n",
            )
            .with_sighting_table(
                Provider::New,
                2022,
                "created,latitude,longitude,J,K,L\n2022-05-01T10:00:00Z,48.5,-123.0,0,1,0\n",
            );
        let logs = load_sighting_years(Arc::new(memory), ChangeoverCutoffs::default(), 2022..=2023)
            .await
            .unwrap();
        assert_eq!(logs.iter().map(|log| log.year).collect::<Vec<_>>(), vec![2022, 2023]);
        assert_eq!(logs[0].records.len(), 1);
    }
}
