//! The `Panel` data structure: a date × instrument matrix of `f64` values.
//!
//! Panels are the unit every pipeline stage consumes and produces: a price
//! field, a factor, a forward return, an IC-weighted composite — all share
//! the same shape and invariants. Rows are trading dates in strictly
//! ascending order, columns are unique instrument labels, and a cell with
//! no observation holds the [absent sentinel](crate::absent) rather than
//! shrinking the row.

use crate::absent::{absent, is_present};
use crate::error::{Result, RondaError};
use crate::{Date, Instrument};
use ndarray::{Array2, ArrayView1, ArrayViewMut1};
use polars::prelude::*;

/// A two-dimensional (date × instrument) table of numeric values.
///
/// Immutable in spirit: panels are built once per pipeline stage and then
/// only read. The few mutating accessors exist for construction code.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    dates: Vec<Date>,
    instruments: Vec<Instrument>,
    values: Array2<f64>,
}

impl Panel {
    /// Creates a panel, validating the structural invariants.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidData`] if the date index is not
    /// strictly increasing, instrument labels repeat, or the value matrix
    /// shape does not match the indices.
    pub fn new(dates: Vec<Date>, instruments: Vec<Instrument>, values: Array2<f64>) -> Result<Self> {
        if values.dim() != (dates.len(), instruments.len()) {
            return Err(RondaError::InvalidData(format!(
                "panel shape {:?} does not match {} dates x {} instruments",
                values.dim(),
                dates.len(),
                instruments.len()
            )));
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(RondaError::InvalidData(format!(
                "date index not strictly increasing at {} -> {}",
                w[0], w[1]
            )));
        }
        let mut seen = std::collections::BTreeSet::new();
        for inst in &instruments {
            if !seen.insert(inst.as_str()) {
                return Err(RondaError::InvalidData(format!(
                    "duplicate instrument label: {inst}"
                )));
            }
        }
        Ok(Self {
            dates,
            instruments,
            values,
        })
    }

    /// Creates a panel with every cell set to `fill`.
    pub fn filled(dates: Vec<Date>, instruments: Vec<Instrument>, fill: f64) -> Result<Self> {
        let values = Array2::from_elem((dates.len(), instruments.len()), fill);
        Self::new(dates, instruments, values)
    }

    /// Creates an all-absent panel with the same shape and indices as `other`.
    #[must_use]
    pub fn absent_like(other: &Self) -> Self {
        Self {
            dates: other.dates.clone(),
            instruments: other.instruments.clone(),
            values: Array2::from_elem(other.values.dim(), absent()),
        }
    }

    /// The ordered date index.
    #[must_use]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// The instrument labels (column order).
    #[must_use]
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Number of dates (rows).
    #[must_use]
    pub fn n_dates(&self) -> usize {
        self.dates.len()
    }

    /// Number of instruments (columns).
    #[must_use]
    pub fn n_instruments(&self) -> usize {
        self.instruments.len()
    }

    /// Returns true if the panel has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.instruments.is_empty()
    }

    /// The raw value matrix (rows = dates, columns = instruments).
    #[must_use]
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Cell value by positional index.
    #[must_use]
    pub fn get(&self, date_idx: usize, inst_idx: usize) -> f64 {
        self.values[(date_idx, inst_idx)]
    }

    /// Sets a cell by positional index.
    pub fn set(&mut self, date_idx: usize, inst_idx: usize, value: f64) {
        self.values[(date_idx, inst_idx)] = value;
    }

    /// The cross-section (all instruments) for one date.
    #[must_use]
    pub fn row(&self, date_idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(date_idx)
    }

    /// Mutable cross-section for one date.
    pub fn row_mut(&mut self, date_idx: usize) -> ArrayViewMut1<'_, f64> {
        self.values.row_mut(date_idx)
    }

    /// The time series (all dates) for one instrument.
    #[must_use]
    pub fn column(&self, inst_idx: usize) -> ArrayView1<'_, f64> {
        self.values.column(inst_idx)
    }

    /// Mutable time series for one instrument.
    pub fn column_mut(&mut self, inst_idx: usize) -> ArrayViewMut1<'_, f64> {
        self.values.column_mut(inst_idx)
    }

    /// Positional index of an instrument label, if present.
    #[must_use]
    pub fn instrument_index(&self, name: &str) -> Option<usize> {
        self.instruments.iter().position(|i| i == name)
    }

    /// Positional index of a date, if present.
    #[must_use]
    pub fn date_index(&self, date: Date) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Fraction-free count of present (non-absent) cells.
    #[must_use]
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| is_present(**v)).count()
    }

    /// Applies `f` to every cell, keeping indices.
    #[must_use]
    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            dates: self.dates.clone(),
            instruments: self.instruments.clone(),
            values: self.values.mapv(f),
        }
    }

    /// Returns true if both panels share the same date and instrument indices.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.dates == other.dates && self.instruments == other.instruments
    }

    /// Requires identical indices, for element-wise operations.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidData`] naming the mismatch.
    pub fn require_same_shape(&self, other: &Self, context: &str) -> Result<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(RondaError::InvalidData(format!(
                "{context}: panels are not aligned ({}x{} vs {}x{})",
                self.n_dates(),
                self.n_instruments(),
                other.n_dates(),
                other.n_instruments()
            )))
        }
    }

    /// Aligns two panels on the intersection of their dates and instruments.
    ///
    /// Ordering follows `self`: the shared dates stay ascending and the
    /// shared instruments keep `self`'s column order, so alignment is
    /// deterministic regardless of the other panel's layout.
    pub fn align(&self, other: &Self) -> Result<(Self, Self)> {
        let other_dates: std::collections::BTreeSet<Date> = other.dates.iter().copied().collect();
        let dates: Vec<Date> = self
            .dates
            .iter()
            .copied()
            .filter(|d| other_dates.contains(d))
            .collect();
        let instruments: Vec<Instrument> = self
            .instruments
            .iter()
            .filter(|i| other.instrument_index(i).is_some())
            .cloned()
            .collect();

        let a = self.select(&dates, &instruments)?;
        let b = other.select(&dates, &instruments)?;
        Ok((a, b))
    }

    /// Extracts a sub-panel for the given dates and instruments.
    ///
    /// # Errors
    ///
    /// Fails if any requested date or instrument is not in this panel.
    pub fn select(&self, dates: &[Date], instruments: &[Instrument]) -> Result<Self> {
        let date_idx: Vec<usize> = dates
            .iter()
            .map(|d| {
                self.date_index(*d)
                    .ok_or_else(|| RondaError::InvalidData(format!("date {d} not in panel")))
            })
            .collect::<Result<_>>()?;
        let inst_idx: Vec<usize> = instruments
            .iter()
            .map(|i| {
                self.instrument_index(i)
                    .ok_or_else(|| RondaError::InvalidData(format!("instrument {i} not in panel")))
            })
            .collect::<Result<_>>()?;

        let mut values = Array2::from_elem((date_idx.len(), inst_idx.len()), absent());
        for (r, &di) in date_idx.iter().enumerate() {
            for (c, &ii) in inst_idx.iter().enumerate() {
                values[(r, c)] = self.values[(di, ii)];
            }
        }
        Self::new(dates.to_vec(), instruments.to_vec(), values)
    }

    /// Converts the panel to a Polars `DataFrame`.
    ///
    /// The first column is `date` (ISO-8601 strings); each instrument
    /// becomes a `Float64` column with absent cells stored as null, which
    /// is what makes the CSV round-trip lossless.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.n_instruments() + 1);
        let date_strings: Vec<String> = self.dates.iter().map(|d| d.to_string()).collect();
        columns.push(Series::new("date".into(), date_strings).into_column());

        for (j, name) in self.instruments.iter().enumerate() {
            let cells: Vec<Option<f64>> = self
                .values
                .column(j)
                .iter()
                .map(|&v| if is_present(v) { Some(v) } else { None })
                .collect();
            columns.push(Series::new(name.as_str().into(), cells).into_column());
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Reconstructs a panel from a `DataFrame` produced by
    /// [`Panel::to_dataframe`] (or an equivalent CSV read).
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let date_col = df
            .column("date")
            .map_err(|_| RondaError::MissingField("date".to_string()))?;
        let dates: Vec<Date> = date_col
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|s| {
                let s = s.ok_or_else(|| RondaError::InvalidData("null date cell".to_string()))?;
                Date::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|e| RondaError::InvalidData(format!("bad date {s}: {e}")))
            })
            .collect::<Result<_>>()?;

        let mut instruments = Vec::new();
        let mut columns = Vec::new();
        for col in df.get_columns() {
            let name = col.name().as_str();
            if name == "date" {
                continue;
            }
            let series = col.as_materialized_series().cast(&DataType::Float64)?;
            let cells: Vec<f64> = series
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(absent()))
                .collect();
            instruments.push(name.to_string());
            columns.push(cells);
        }

        let mut values = Array2::from_elem((dates.len(), instruments.len()), absent());
        for (j, cells) in columns.iter().enumerate() {
            if cells.len() != dates.len() {
                return Err(RondaError::InvalidData(format!(
                    "column {} has {} rows, expected {}",
                    instruments[j],
                    cells.len(),
                    dates.len()
                )));
            }
            for (i, &v) in cells.iter().enumerate() {
                values[(i, j)] = v;
            }
        }
        Self::new(dates, instruments, values)
    }
}

/// The pre-aligned OHLCV input collection handed to the pipeline by the
/// external data layer. All five panels must share index and columns.
#[derive(Debug, Clone)]
pub struct OhlcvPanels {
    /// Open prices.
    pub open: Panel,
    /// High prices.
    pub high: Panel,
    /// Low prices.
    pub low: Panel,
    /// Close prices.
    pub close: Panel,
    /// Traded volume.
    pub volume: Panel,
}

impl OhlcvPanels {
    /// Validates mutual alignment of the five field panels.
    ///
    /// # Errors
    ///
    /// Returns [`RondaError::InvalidData`] naming the misaligned field.
    pub fn validate(&self) -> Result<()> {
        for (name, panel) in [
            ("open", &self.open),
            ("high", &self.high),
            ("low", &self.low),
            ("volume", &self.volume),
        ] {
            self.close
                .require_same_shape(panel, &format!("ohlcv field {name}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn sample() -> Panel {
        Panel::new(
            vec![d(1), d(2), d(3)],
            vec!["AAA".to_string(), "BBB".to_string()],
            Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 3.0, absent(), 5.0, 6.0]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_validates_shape() {
        let result = Panel::new(
            vec![d(1)],
            vec!["AAA".to_string()],
            Array2::zeros((2, 1)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_unsorted_dates() {
        let result = Panel::new(
            vec![d(2), d(1)],
            vec!["AAA".to_string()],
            Array2::zeros((2, 1)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_duplicate_dates() {
        let result = Panel::new(
            vec![d(1), d(1)],
            vec!["AAA".to_string()],
            Array2::zeros((2, 1)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_duplicate_instruments() {
        let result = Panel::new(
            vec![d(1)],
            vec!["AAA".to_string(), "AAA".to_string()],
            Array2::zeros((1, 2)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_accessors() {
        let p = sample();
        assert_eq!(p.n_dates(), 3);
        assert_eq!(p.n_instruments(), 2);
        assert_eq!(p.get(0, 1), 2.0);
        assert!(crate::is_absent(p.get(1, 1)));
        assert_eq!(p.instrument_index("BBB"), Some(1));
        assert_eq!(p.date_index(d(2)), Some(1));
        assert_eq!(p.present_count(), 5);
    }

    #[test]
    fn test_align_intersection() {
        let a = sample();
        let b = Panel::new(
            vec![d(2), d(3), d(4)],
            vec!["BBB".to_string(), "CCC".to_string()],
            Array2::from_elem((3, 2), 1.0),
        )
        .unwrap();

        let (a2, b2) = a.align(&b).unwrap();
        assert_eq!(a2.dates(), &[d(2), d(3)]);
        assert_eq!(a2.instruments(), &["BBB".to_string()]);
        assert!(a2.same_shape(&b2));
        assert!(crate::is_absent(a2.get(0, 0)));
        assert_eq!(a2.get(1, 0), 6.0);
    }

    #[test]
    fn test_dataframe_round_trip_preserves_absent() {
        let p = sample();
        let df = p.to_dataframe().unwrap();
        let back = Panel::from_dataframe(&df).unwrap();
        assert_eq!(back.dates(), p.dates());
        assert_eq!(back.instruments(), p.instruments());
        for i in 0..p.n_dates() {
            for j in 0..p.n_instruments() {
                let (x, y) = (p.get(i, j), back.get(i, j));
                assert!(
                    (crate::is_absent(x) && crate::is_absent(y)) || x == y,
                    "cell ({i},{j}) changed: {x} -> {y}"
                );
            }
        }
    }

    #[test]
    fn test_ohlcv_validate_catches_misalignment() {
        let p = sample();
        let mut volume = sample();
        volume = volume.select(&[d(1), d(2)], &p.instruments().to_vec()).unwrap();
        let panels = OhlcvPanels {
            open: p.clone(),
            high: p.clone(),
            low: p.clone(),
            close: p,
            volume,
        };
        assert!(panels.validate().is_err());
    }
}
