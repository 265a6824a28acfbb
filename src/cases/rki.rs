use crate::cases::{CaseCounts, CaseQuery, CaseSource};
use crate::error::CovmobError;
use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct RkiRow {
    #[serde(rename = "Bundesland")]
    bundesland: String,
    #[serde(rename = "Altersgruppe")]
    altersgruppe: String,
    #[serde(rename = "Meldedatum")]
    meldedatum: String,
    #[serde(rename = "AnzahlFall")]
    anzahl_fall: i64,
    #[serde(rename = "NeuerFall")]
    neuer_fall: i64,
    #[serde(rename = "AnzahlTodesfall")]
    anzahl_todesfall: i64,
    #[serde(rename = "NeuerTodesfall")]
    neuer_todesfall: i64,
    // Early reports predate the recovery columns
    #[serde(rename = "AnzahlGenesen", default)]
    anzahl_genesen: i64,
    #[serde(rename = "NeuGenesen", default)]
    neu_genesen: i64,
}

#[derive(Debug, Clone, PartialEq)]
struct CaseRecord {
    reported: NaiveDate,
    state: String,
    age_group: String,
    cases: i64,
    new_case: i64,
    deaths: i64,
    new_death: i64,
    recovered: i64,
    new_recovered: i64,
}

/// Accepts `2020/06/01 00:00:00`, `2020-06-01` and ISO timestamps.
fn parse_report_date(raw: &str) -> Result<NaiveDate, CovmobError> {
    let day: String = raw.trim().chars().take(10).collect();
    NaiveDate::parse_from_str(&day.replace('/', "-"), "%Y-%m-%d")
        .map_err(|e| CovmobError::InvalidDate(format!("Meldedatum '{}': {}", raw, e)))
}

/// One RKI daily report held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RkiCaseTable {
    records: Vec<CaseRecord>,
}

impl RkiCaseTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CovmobError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| CovmobError::IoError(format!("{}: {}", path.display(), e)))?;
        let table = Self::from_reader(file)?;
        debug!("Loaded {} RKI rows from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CovmobError> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in reader.deserialize() {
            let row: RkiRow = result.map_err(|e| CovmobError::CsvError(e.to_string()))?;
            records.push(CaseRecord {
                reported: parse_report_date(&row.meldedatum)?,
                state: row.bundesland,
                age_group: row.altersgruppe,
                cases: row.anzahl_fall,
                new_case: row.neuer_fall,
                deaths: row.anzahl_todesfall,
                new_death: row.neuer_todesfall,
                recovered: row.anzahl_genesen,
                new_recovered: row.neu_genesen,
            });
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CaseSource for RkiCaseTable {
    /// Rows flagged as corrections (negative `Neu*` flag) are left out of each sum.
    fn counts(&self, query: &CaseQuery) -> Result<CaseCounts, CovmobError> {
        let mut counts = CaseCounts::default();
        for record in &self.records {
            if !query.matches(record.reported, &record.state, &record.age_group) {
                continue;
            }
            if record.new_case >= 0 {
                counts.infected += record.cases;
            }
            if record.new_recovered >= 0 {
                counts.recovered += record.recovered;
            }
            if record.new_death >= 0 {
                counts.dead += record.deaths;
            }
        }
        Ok(counts)
    }
}

/// Directory of daily RKI reports, one file per publication date.
///
/// The report for a query is the one published on its end date, found at
/// `<root>/<MonthName><Year>/RKI_COVID19_<YYYY-MM-DD>.csv`. Loaded reports
/// are cached.
#[derive(Debug)]
pub struct RkiArchive {
    root: PathBuf,
    cache: RefCell<HashMap<NaiveDate, RkiCaseTable>>,
}

impl RkiArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Path of the report published on `date`.
    pub fn report_path(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(format!("{}{}", date.format("%B"), date.year()))
            .join(format!("RKI_COVID19_{}.csv", date.format("%Y-%m-%d")))
    }
}

impl CaseSource for RkiArchive {
    fn counts(&self, query: &CaseQuery) -> Result<CaseCounts, CovmobError> {
        if let Some(table) = self.cache.borrow().get(&query.end) {
            return table.counts(query);
        }

        let table = RkiCaseTable::from_path(self.report_path(query.end))?;
        let counts = table.counts(query);
        self.cache.borrow_mut().insert(query.end, table);
        counts
    }
}
