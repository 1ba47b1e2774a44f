//! Parsers for the three tables.
//!
//! Each parser takes decoded text and returns a [`DatedTable`] plus
//! [`TableStats`]. Missing required columns are fatal; malformed rows are
//! counted and dropped.

use chrono::Datelike as _;
use csv::StringRecord;
use risk_map_dataset_models::{DatedTable, IncidentRecord, IndicatorRecord, PredictionRecord};
use risk_map_geography_models::{Region, RegionCatalog};

use crate::parsing::{NumericCell, is_missing, parse_coordinate, parse_date};
use crate::{DatasetError, LoadOptions, TableKind, TableStats};

/// Column name to index lookup built from the header row.
struct HeaderIndex {
    table: TableKind,
    headers: Vec<String>,
}

impl HeaderIndex {
    fn new(table: TableKind, record: &StringRecord) -> Self {
        Self {
            table,
            headers: record.iter().map(|h| h.trim().to_owned()).collect(),
        }
    }

    fn find(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    fn require(&self, column: &str) -> Result<usize, DatasetError> {
        self.find(column).ok_or_else(|| DatasetError::MissingColumn {
            table: self.table,
            column: column.to_owned(),
        })
    }
}

fn reader<'a>(text: &'a str, options: &LoadOptions) -> csv::Reader<&'a [u8]> {
    csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(text.as_bytes())
}

fn cell(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

/// Parses the incident table.
///
/// Rows with an unparseable date or coordinate are dropped.
///
/// # Errors
///
/// Returns [`DatasetError`] if the header cannot be read or a required
/// column is missing.
pub fn parse_incidents(
    text: &str,
    options: &LoadOptions,
) -> Result<(DatedTable<IncidentRecord>, TableStats), DatasetError> {
    let mut reader = reader(text, options);
    let index = HeaderIndex::new(TableKind::Incidents, reader.headers()?);
    let date_idx = index.require(&options.columns.incident_date)?;
    let lat_idx = index.require(&options.columns.incident_latitude)?;
    let lon_idx = index.require(&options.columns.incident_longitude)?;

    let mut stats = TableStats::default();
    let mut records = Vec::new();

    for result in reader.records() {
        stats.rows_read += 1;
        let Ok(row) = result else {
            stats.rows_dropped += 1;
            continue;
        };

        let parsed = parse_date(cell(&row, date_idx)).and_then(|occurred_at| {
            let latitude = parse_coordinate(cell(&row, lat_idx))?;
            let longitude = parse_coordinate(cell(&row, lon_idx))?;
            Some(IncidentRecord {
                occurred_at,
                latitude,
                longitude,
            })
        });

        match parsed {
            Some(record) => records.push(record),
            None => stats.rows_dropped += 1,
        }
    }

    stats.rows_kept = records.len();
    Ok((DatedTable::new(records), stats))
}

/// Per-region stress column indices, resolved once from the header.
struct StressColumns {
    climate: Vec<(Region, usize)>,
    social: Vec<(Region, usize)>,
    financial: Option<usize>,
}

impl StressColumns {
    fn resolve(index: &HeaderIndex, options: &LoadOptions) -> Self {
        let catalog = RegionCatalog::standard();
        let per_region = |prefix: &str| -> Vec<(Region, usize)> {
            catalog
                .regions()
                .filter_map(|region| {
                    index
                        .find(&format!("{prefix}{}", region.name()))
                        .map(|idx| (region, idx))
                })
                .collect()
        };

        Self {
            climate: per_region(&options.columns.climate_prefix),
            social: per_region(&options.columns.social_prefix),
            financial: index.find(&options.columns.financial),
        }
    }
}

/// Fills one stress map from the row; `false` if any cell is malformed.
fn read_stress(
    row: &StringRecord,
    columns: &[(Region, usize)],
    target: &mut std::collections::BTreeMap<Region, f64>,
) -> bool {
    for (region, idx) in columns {
        match NumericCell::parse(cell(row, *idx)) {
            NumericCell::Value(v) => {
                target.insert(*region, v);
            }
            NumericCell::Missing => {}
            NumericCell::Malformed => return false,
        }
    }
    true
}

/// Parses the indicator table.
///
/// Rows dated after the cutoff year are excluded. Rows with an
/// unparseable date or a non-numeric stress value are dropped; empty
/// stress cells are kept as missing values.
///
/// # Errors
///
/// Returns [`DatasetError`] if the header cannot be read or the date
/// column is missing.
pub fn parse_indicators(
    text: &str,
    options: &LoadOptions,
) -> Result<(DatedTable<IndicatorRecord>, TableStats), DatasetError> {
    let mut reader = reader(text, options);
    let index = HeaderIndex::new(TableKind::Indicators, reader.headers()?);
    let date_idx = index.require(&options.columns.indicator_date)?;
    let columns = StressColumns::resolve(&index, options);

    if columns.climate.is_empty() && columns.social.is_empty() && columns.financial.is_none() {
        log::warn!("Indicator table has no stress columns; every risk score will be 0");
    }

    let mut stats = TableStats::default();
    let mut records = Vec::new();

    for result in reader.records() {
        stats.rows_read += 1;
        let Ok(row) = result else {
            stats.rows_dropped += 1;
            continue;
        };
        let Some(observed_at) = parse_date(cell(&row, date_idx)) else {
            stats.rows_dropped += 1;
            continue;
        };
        if observed_at.year() > options.cutoff_year {
            stats.rows_excluded += 1;
            continue;
        }

        let mut record = IndicatorRecord::new(observed_at);
        let climate_ok = read_stress(&row, &columns.climate, &mut record.climate_stress);
        let social_ok = read_stress(&row, &columns.social, &mut record.social_stress);
        let financial = columns
            .financial
            .map_or(NumericCell::Missing, |idx| NumericCell::parse(cell(&row, idx)));

        record.financial_stress = match financial {
            NumericCell::Value(v) => Some(v),
            NumericCell::Missing => None,
            NumericCell::Malformed => {
                stats.rows_dropped += 1;
                continue;
            }
        };
        if !(climate_ok && social_ok) {
            stats.rows_dropped += 1;
            continue;
        }

        records.push(record);
    }

    stats.rows_kept = records.len();
    Ok((DatedTable::new(records), stats))
}

/// Parses the prediction table.
///
/// Rows missing a date, region or probability are dropped, as are
/// probabilities outside `[0, 1]`.
///
/// # Errors
///
/// Returns [`DatasetError`] if the header cannot be read or a required
/// column is missing.
pub fn parse_predictions(
    text: &str,
    options: &LoadOptions,
) -> Result<(DatedTable<PredictionRecord>, TableStats), DatasetError> {
    let mut reader = reader(text, options);
    let index = HeaderIndex::new(TableKind::Predictions, reader.headers()?);
    let date_idx = index.require(&options.columns.prediction_date)?;
    let region_idx = index.require(&options.columns.prediction_region)?;
    let prob_idx = index.require(&options.columns.prediction_probability)?;

    let mut stats = TableStats::default();
    let mut records = Vec::new();

    for result in reader.records() {
        stats.rows_read += 1;
        let Ok(row) = result else {
            stats.rows_dropped += 1;
            continue;
        };

        let region = cell(&row, region_idx).trim();
        let probability = match NumericCell::parse(cell(&row, prob_idx)) {
            NumericCell::Value(p) if (0.0..=1.0).contains(&p) => Some(p),
            _ => None,
        };

        match (parse_date(cell(&row, date_idx)), probability) {
            (Some(predicted_at), Some(crime_probability)) if !is_missing(region) => {
                records.push(PredictionRecord {
                    predicted_at,
                    region: region.to_owned(),
                    crime_probability,
                });
            }
            _ => stats.rows_dropped += 1,
        }
    }

    stats.rows_kept = records.len();
    Ok((DatedTable::new(records), stats))
}
