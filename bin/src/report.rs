//! CSV report writers.
//!
//! Every writer creates (or overwrites) one file under the output
//! directory:
//!
//! - `factor_<name>.csv` — standardized factor panels
//! - `ic_timeseries.csv`, `ic_summary.csv`, `ic_correlation.csv`
//! - `fusion_<strategy>.csv`, `fusion_weights.csv`
//! - `run_summary.json`

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use ronda::{is_present, Date, FactorEngineReport, FusionOutcome, IcReport, IcSummary, RunSummary};
use tracing::info;

fn opt(v: f64) -> Option<f64> {
    is_present(v).then_some(v)
}

pub(crate) fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), rows = df.height(), "wrote report");
    Ok(())
}

pub(crate) fn write_factor_panels(out: &Path, factors: &FactorEngineReport) -> Result<()> {
    for (name, panel) in &factors.standardized {
        let mut df = panel.to_dataframe()?;
        write_csv(&out.join(format!("factor_{name}.csv")), &mut df)?;
    }
    Ok(())
}

pub(crate) fn write_ic_reports(
    out: &Path,
    ic: &IcReport,
    composites: &BTreeMap<String, IcSummary>,
) -> Result<()> {
    write_csv(&out.join("ic_timeseries.csv"), &mut ic_timeseries(ic)?)?;
    write_csv(
        &out.join("ic_summary.csv"),
        &mut ic_summary(ic.summaries.values().chain(composites.values()))?,
    )?;
    write_csv(&out.join("ic_correlation.csv"), &mut ic_correlation(ic)?)?;
    Ok(())
}

/// One row per evaluation date, one IC column per factor.
fn ic_timeseries(ic: &IcReport) -> Result<DataFrame> {
    let mut all_dates: BTreeSet<Date> = BTreeSet::new();
    for s in ic.series.values() {
        all_dates.extend(s.dates.iter().copied());
    }
    let dates: Vec<Date> = all_dates.into_iter().collect();

    let mut columns: Vec<Column> = Vec::with_capacity(ic.series.len() + 1);
    let date_strings: Vec<String> = dates.iter().map(ToString::to_string).collect();
    columns.push(Series::new("date".into(), date_strings).into_column());

    for (name, s) in &ic.series {
        let by_date: BTreeMap<Date, f64> =
            s.dates.iter().copied().zip(s.values.iter().copied()).collect();
        let cells: Vec<Option<f64>> = dates
            .iter()
            .map(|d| by_date.get(d).copied().and_then(opt))
            .collect();
        columns.push(Series::new(name.as_str().into(), cells).into_column());
    }
    Ok(DataFrame::new(columns)?)
}

fn ic_summary<'a>(summaries: impl Iterator<Item = &'a IcSummary>) -> Result<DataFrame> {
    let rows: Vec<&IcSummary> = summaries.collect();
    let factor: Vec<String> = rows.iter().map(|s| s.factor.clone()).collect();
    let mean_ic: Vec<Option<f64>> = rows.iter().map(|s| opt(s.mean_ic)).collect();
    let std_ic: Vec<Option<f64>> = rows.iter().map(|s| opt(s.std_ic)).collect();
    let ir: Vec<Option<f64>> = rows.iter().map(|s| opt(s.ir)).collect();
    let win_rate: Vec<Option<f64>> = rows.iter().map(|s| opt(s.win_rate)).collect();
    let abs_mean_ic: Vec<Option<f64>> = rows.iter().map(|s| opt(s.abs_mean_ic)).collect();
    let n_observations: Vec<i64> = rows.iter().map(|s| s.n_observations as i64).collect();

    Ok(DataFrame::new(vec![
        Series::new("factor".into(), factor).into_column(),
        Series::new("mean_ic".into(), mean_ic).into_column(),
        Series::new("std_ic".into(), std_ic).into_column(),
        Series::new("ir".into(), ir).into_column(),
        Series::new("win_rate".into(), win_rate).into_column(),
        Series::new("abs_mean_ic".into(), abs_mean_ic).into_column(),
        Series::new("n_observations".into(), n_observations).into_column(),
    ])?)
}

fn ic_correlation(ic: &IcReport) -> Result<DataFrame> {
    let names = &ic.correlation_factors;
    let mut columns: Vec<Column> = Vec::with_capacity(names.len() + 1);
    columns.push(Series::new("factor".into(), names.clone()).into_column());
    for (k, name) in names.iter().enumerate() {
        let cells: Vec<Option<f64>> = (0..names.len())
            .map(|i| opt(ic.correlation[[i, k]]))
            .collect();
        columns.push(Series::new(name.as_str().into(), cells).into_column());
    }
    Ok(DataFrame::new(columns)?)
}

pub(crate) fn write_fusion_reports(out: &Path, fusion: &[FusionOutcome]) -> Result<()> {
    for outcome in fusion {
        let mut df = outcome.composite.to_dataframe()?;
        write_csv(&out.join(format!("fusion_{}.csv", outcome.strategy)), &mut df)?;
    }

    let mut strategy = Vec::new();
    let mut factor = Vec::new();
    let mut weight = Vec::new();
    let mut fell_back = Vec::new();
    for outcome in fusion {
        for (name, w) in outcome.weights.iter() {
            strategy.push(outcome.strategy.clone());
            factor.push(name.to_string());
            weight.push(w);
            fell_back.push(outcome.fell_back);
        }
    }
    let mut df = DataFrame::new(vec![
        Series::new("strategy".into(), strategy).into_column(),
        Series::new("factor".into(), factor).into_column(),
        Series::new("weight".into(), weight).into_column(),
        Series::new("fell_back".into(), fell_back).into_column(),
    ])?;
    write_csv(&out.join("fusion_weights.csv"), &mut df)
}

pub(crate) fn write_run_summary(out: &Path, summary: &RunSummary) -> Result<()> {
    let path = out.join("run_summary.json");
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "wrote run summary");
    Ok(())
}
