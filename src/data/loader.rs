use crate::data::bar::Bar;
use crate::error::BacktestError;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

pub const REQUIRED_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

//position of each required column in the csv header
struct ColumnMap([usize; 6]);

impl ColumnMap {
    //matches headers case-insensitively, so `Date`/`Close` style exports load as-is
    fn from_headers(headers: &StringRecord) -> std::result::Result<Self, BacktestError> {
        let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();

        let mut positions = [0usize; 6];
        let mut missing = Vec::new();
        for (slot, name) in REQUIRED_COLUMNS.iter().enumerate() {
            match normalized.iter().position(|h| h == name) {
                Some(pos) => positions[slot] = pos,
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(BacktestError::MissingColumns(missing));
        }
        Ok(ColumnMap(positions))
    }

    fn field<'r>(&self, record: &'r StringRecord, slot: usize) -> &'r str {
        record.get(self.0[slot]).unwrap_or("").trim()
    }
}

//parses a timestamp as rfc3339, a naive datetime or a plain date (midnight utc)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_price(raw: &str, column: &str, line: usize) -> Result<f64> {
    raw.replace(',', "")
        .parse::<f64>()
        .context(format!("Failed to parse {} '{}' at line {}", column, raw, line))
}

//loads bars from a csv file with date/open/high/low/close/volume columns
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let headers = reader
        .headers()
        .context(format!("Failed to read CSV header: {:?}", path))?
        .clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut bars = Vec::new();

    for (index, result) in reader.records().enumerate() {
        let line = index + 2;
        let record = result.context(format!("Failed to parse CSV record at line {}", line))?;

        let raw_date = columns.field(&record, 0);
        let timestamp = parse_timestamp(raw_date).ok_or_else(|| {
            anyhow::anyhow!("Failed to parse timestamp '{}' at line {}", raw_date, line)
        })?;

        //missing volume is treated as zero
        let raw_volume = columns.field(&record, 5);
        let volume = if raw_volume.is_empty() {
            0.0
        } else {
            parse_price(raw_volume, "volume", line)?
        };

        bars.push(Bar::new(
            timestamp,
            parse_price(columns.field(&record, 1), "open", line)?,
            parse_price(columns.field(&record, 2), "high", line)?,
            parse_price(columns.field(&record, 3), "low", line)?,
            parse_price(columns.field(&record, 4), "close", line)?,
            volume,
        ));
    }

    //sort by timestamp to ensure chronological order
    bars.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    Ok(bars)
}

//keeps bars inside the inclusive [start, end] range; open bounds keep everything
pub fn filter_by_date_range(
    bars: &[Bar],
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Vec<Bar> {
    bars.iter()
        .filter(|bar| start.map_or(true, |s| bar.timestamp >= s))
        .filter(|bar| end.map_or(true, |e| bar.timestamp <= e))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_capitalized_headers_and_sorts() {
        let file = write_csv(
            "Date,Open,High,Low,Close,Volume\n\
             2020-01-03,3,4,2.5,3.5,\n\
             2020-01-01,1,2,0.5,1.5,\n\
             2020-01-02,2,3,1.5,2.5,10\n",
        );

        let bars = load_csv(file.path()).unwrap();

        assert_eq!(bars.len(), 3);
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        assert_eq!(volumes, vec![0.0, 10.0, 0.0]);
        assert_eq!(bars[0].close, 1.5);
    }

    #[test]
    fn reports_every_missing_column() {
        let file = write_csv("Date,Open,Close\n2020-01-01,1,1\n");

        let err = load_csv(file.path()).unwrap_err();
        let missing = err.downcast_ref::<BacktestError>().unwrap();

        assert_eq!(
            missing,
            &BacktestError::MissingColumns(vec![
                "high".to_string(),
                "low".to_string(),
                "volume".to_string()
            ])
        );
    }

    #[test]
    fn parses_supported_timestamp_formats() {
        let midnight = Utc.with_ymd_and_hms(2021, 3, 4, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2021-03-04"), Some(midnight));
        assert_eq!(parse_timestamp("2021-03-04T00:00:00+00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2021-03-04 00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("03/04/2021"), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn date_range_is_inclusive() {
        let bars: Vec<Bar> = (1..=5)
            .map(|d| Bar::from_close(Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap(), d as f64))
            .collect();

        let start = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2020, 1, 4, 0, 0, 0).unwrap();

        let kept = filter_by_date_range(&bars, Some(start), Some(end));
        assert_eq!(kept.len(), 3);
        assert_eq!(filter_by_date_range(&bars, None, None).len(), 5);
    }
}
