//! CSV universe loading.
//!
//! A data directory holds one CSV per OHLCV field (`open.csv`,
//! `high.csv`, ...), each with a `date` column of ISO-8601 strings and
//! one numeric column per instrument. Empty cells are missing
//! observations.

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use ronda::{OhlcvPanels, Panel};

pub(crate) fn load_ohlcv(dir: &Path) -> Result<OhlcvPanels> {
    let data = OhlcvPanels {
        open: load_panel(dir, "open")?,
        high: load_panel(dir, "high")?,
        low: load_panel(dir, "low")?,
        close: load_panel(dir, "close")?,
        volume: load_panel(dir, "volume")?,
    };
    data.validate()
        .with_context(|| format!("OHLCV files in {} are not aligned", dir.display()))?;
    Ok(data)
}

fn load_panel(dir: &Path, field: &str) -> Result<Panel> {
    let path = dir.join(format!("{field}.csv"));
    let df = CsvReadOptions::default()
        .try_into_reader_with_file_path(Some(path.clone()))
        .with_context(|| format!("opening {}", path.display()))?
        .finish()
        .with_context(|| format!("reading {}", path.display()))?;
    Panel::from_dataframe(&df).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ronda::{absent, is_absent, Date};

    #[test]
    fn test_csv_round_trip_preserves_values_and_absent_cells() {
        let dates: Vec<Date> = (1..=3)
            .map(|d| Date::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        let instruments = vec!["AAA".to_string(), "BBB".to_string()];
        let mut panel = Panel::filled(dates, instruments, 1.5).unwrap();
        panel.set(1, 0, absent());
        panel.set(2, 1, -2.25);

        let dir = std::env::temp_dir().join("ronda-csv-round-trip");
        std::fs::create_dir_all(&dir).unwrap();
        let mut df = panel.to_dataframe().unwrap();
        crate::report::write_csv(&dir.join("close.csv"), &mut df).unwrap();

        let back = load_panel(&dir, "close").unwrap();
        assert_eq!(back.dates(), panel.dates());
        assert_eq!(back.instruments(), panel.instruments());
        for t in 0..panel.n_dates() {
            for j in 0..panel.n_instruments() {
                let (x, y) = (panel.get(t, j), back.get(t, j));
                assert!(
                    (is_absent(x) && is_absent(y)) || x == y,
                    "cell ({t},{j}) changed: {x} -> {y}"
                );
            }
        }
    }
}
