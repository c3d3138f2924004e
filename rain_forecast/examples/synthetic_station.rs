//! Run the pipeline on a synthetic seasonal station held in memory.
//!
//! ```text
//! cargo run --example synthetic_station
//! ```

use chrono::NaiveDate;
use rain_forecast::error::Result;
use rain_forecast::{
    run_batch, InMemorySource, LstmConfig, LstmForecaster, PipelineConfig, TimeSeries,
};

fn seasonal(months: usize, phase: f64) -> Vec<f64> {
    (0..months)
        .map(|i| {
            let angle = (i as f64 + phase) * std::f64::consts::TAU / 12.0;
            60.0 + 25.0 * angle.sin() + 5.0 * ((i * 7) % 5) as f64
        })
        .collect()
}

fn main() -> Result<()> {
    let start = NaiveDate::from_ymd_opt(1990, 1, 15).unwrap();
    let recent = NaiveDate::from_ymd_opt(2007, 1, 15).unwrap();
    let source = InMemorySource::new()
        .with_series("seaside", TimeSeries::monthly(start, seasonal(240, 0.0))?)
        .with_series("hilltop", TimeSeries::monthly(start, seasonal(240, 3.0))?)
        // Only 40 months of record, reported as a failure
        .with_series("newcomer", TimeSeries::monthly(recent, seasonal(40, 1.0))?);

    let config = PipelineConfig {
        cutoff: NaiveDate::from_ymd_opt(1995, 1, 15).unwrap(),
        n_past: 36,
        n_future: 12,
        epochs: 40,
        stations: vec!["seaside".into(), "hilltop".into(), "newcomer".into()],
        lstm: LstmConfig::default().with_hidden_units(16).with_batch_size(16),
        ..PipelineConfig::default()
    };

    let forecaster = LstmForecaster::new(config.lstm.clone())?;
    let report = run_batch(&config, &source, &forecaster, None)?;

    for (station, bundle) in &report.bundles {
        println!("{}: {}", station, bundle.results.model_name);
        print!("{}", bundle.results.evaluation);
        if let Some(last) = bundle.results.training.last() {
            println!("  Final loss: {:.4}, accuracy: {:.2}", last.loss, last.accuracy);
        }
    }
    for failure in &report.failures {
        println!("{}: skipped ({})", failure.station, failure.error);
    }

    Ok(())
}
