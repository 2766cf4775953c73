//! `sirius` command line tool.
//!
//! ```text
//! sirius <log.csv> <analysis> [--channel NAME] [--start N] [--stop N]
//!        [--value X] [--drop-last-column] [--config FILE] [--out DIR] [--no-plot]
//! ```

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use sirius::analysis::{AnalysisKind, Analyzer, Selection};
use sirius::config::SiriusConfig;
use sirius::data::csv_log::read_log_path;
use sirius::data::export::ExportTracker;

const USAGE: &str = "usage: sirius <log.csv> <analysis> [--channel NAME] [--start N] [--stop N] \
[--value X] [--drop-last-column] [--config FILE] [--out DIR] [--no-plot]

analyses: raw, denoise, thrust, tank, pt-chamber, pt-tank, chamber,
          thermistance, overview, find-index, export";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    log_path: PathBuf,
    analysis: String,
    channel: Option<String>,
    start: usize,
    stop: Option<usize>,
    value: Option<f64>,
    drop_last_column: bool,
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    no_plot: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Option<CliArgs>> {
    let mut out = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        let mut value_for = |flag: &str| it.next().ok_or_else(|| anyhow!("{} needs a value", flag));
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--channel" => out.channel = Some(value_for("--channel")?),
            "--start" => out.start = value_for("--start")?.parse().context("--start")?,
            "--stop" => out.stop = Some(value_for("--stop")?.parse().context("--stop")?),
            "--value" => out.value = Some(value_for("--value")?.parse().context("--value")?),
            "--config" => out.config = Some(PathBuf::from(value_for("--config")?)),
            "--out" => out.out = Some(PathBuf::from(value_for("--out")?)),
            "--drop-last-column" => out.drop_last_column = true,
            "--no-plot" => out.no_plot = true,
            s if s.starts_with("--") => bail!("unknown option {}", s),
            _ => positional.push(arg.clone()),
        }
    }
    let mut positional = positional.into_iter();
    match (positional.next(), positional.next(), positional.next()) {
        (Some(path), Some(analysis), None) => {
            out.log_path = PathBuf::from(path);
            out.analysis = analysis;
            Ok(Some(out))
        }
        _ => bail!("expected <log.csv> <analysis>\n{}", USAGE),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let Some(args) = parse_args(std::env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };

    let mut cfg = match &args.config {
        Some(p) => SiriusConfig::load(p).with_context(|| format!("loading config {:?}", p))?,
        None => SiriusConfig::default(),
    };
    if args.drop_last_column {
        cfg.log.drop_last_column = true;
    }
    if let Some(out) = &args.out {
        cfg.export.out_dir = out.clone();
    }

    let kind: AnalysisKind = args.analysis.parse()?;
    let log = read_log_path(&args.log_path, &cfg.log)
        .with_context(|| format!("reading {:?}", args.log_path))?;
    if !log.skipped_rows.is_empty() {
        log::warn!("{} malformed row(s) ignored", log.skipped_rows.len());
    }
    log::info!("headers available: {}", log.header.join("|"));

    let analyzer = Analyzer::new(&log, &cfg)?;

    if kind == AnalysisKind::FindIndex {
        let value = args.value.ok_or_else(|| anyhow!("find-index needs --value"))?;
        match analyzer.find_index(value)? {
            Some((i, x)) => {
                println!("Nearest value to {} is {}", value, x);
                println!("Index of the nearest value : {}", i);
            }
            None => println!("No timestamps to search"),
        }
        return Ok(());
    }

    let channel = match (&args.channel, kind) {
        (Some(c), _) => c.clone(),
        (None, AnalysisKind::Thermistance | AnalysisKind::Overview) => "ADC_0".to_string(),
        (None, _) => log
            .data_channel_names()
            .into_iter()
            .next()
            .ok_or(sirius::SiriusError::EmptyLog)?,
    };
    let sel = Selection::new(channel).with_range(args.start, args.stop);
    let analysis = analyzer.run(kind, &sel)?;

    println!("{}", analysis.plot.title);
    for w in &analysis.burns {
        println!("burn: {} .. {} ({:.3} s), peak {:.2}", w.start, w.stop, w.duration, w.peak);
    }

    let mut tracker = ExportTracker::new(&cfg.export);
    analysis.schedule_exports(&mut tracker);

    #[cfg(feature = "viewer")]
    {
        if !args.no_plot {
            sirius::app::run_viewer(vec![analysis.plot.clone()], &cfg.viewer)
                .map_err(|e| anyhow!("viewer: {e}"))?;
        }
    }
    #[cfg(not(feature = "viewer"))]
    {
        if !args.no_plot {
            log::info!("built without the viewer; {} points not shown", analysis.plot.point_count());
        }
    }

    let failed = tracker.wait_all().into_iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        bail!("{} export(s) failed", failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn parses_flags_and_positionals() {
        let a = parse_args(args("log.csv thrust --start 10 --stop 2000 --channel ADC_3 --no-plot"))
            .unwrap()
            .unwrap();
        assert_eq!(a.log_path, PathBuf::from("log.csv"));
        assert_eq!(a.analysis, "thrust");
        assert_eq!(a.start, 10);
        assert_eq!(a.stop, Some(2000));
        assert_eq!(a.channel.as_deref(), Some("ADC_3"));
        assert!(a.no_plot);
        assert!(!a.drop_last_column);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(args("log.csv")).is_err());
        assert!(parse_args(args("log.csv raw --start")).is_err());
        assert!(parse_args(args("log.csv raw --bogus")).is_err());
        assert!(parse_args(args("--help")).unwrap().is_none());
    }
}
