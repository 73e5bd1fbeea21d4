use std::{path::PathBuf, process::exit, sync::Arc};

use clap::Parser;
use log::{error, info};
use rangesort::{core::source::DirSource, Config, SortJob};

#[derive(Parser, Debug)]
#[clap(about = "Runs a rangesort job and checks the output is globally sorted")]
struct Args {
    /// Directory of numbered splits; generated when missing
    #[clap(short, long, parse(from_os_str), default_value = "./tester-data/input")]
    input_path: PathBuf,

    #[clap(short, long, parse(from_os_str), default_value = "./tester-data/output")]
    output_path: PathBuf,

    #[clap(short, long, parse(from_os_str), default_value = "./tester-data/work")]
    work_path: PathBuf,

    /// TOML job config; `--shards` is used when absent
    #[clap(short, long, parse(from_os_str))]
    config_path: Option<PathBuf>,

    #[clap(long, default_value_t = 8)]
    shards: usize,

    #[clap(long, default_value_t = 16)]
    splits: usize,

    #[clap(long, default_value_t = 10_000)]
    records: usize,

    #[clap(long, default_value_t = 42)]
    seed: u64,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if !args.input_path.exists() {
        info!(
            "generating {} splits of {} records in {}",
            args.splits,
            args.records,
            args.input_path.display()
        );
        if let Err(e) = tester::generate_input(&args.input_path, args.splits, args.records, args.seed) {
            error!("can't generate input: {e}");
            exit(1);
        }
    }

    let config = match &args.config_path {
        Some(path) => Config::from_file(path),
        None => Ok(Config {
            seed: Some(args.seed),
            ..Config::new(args.shards)
        }),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            exit(1);
        }
    };

    let source = match DirSource::discover(&args.input_path) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            error!("{}: {e}", args.input_path.display());
            exit(1);
        }
    };
    let job = SortJob::local(config, &args.work_path);
    let summary = match job.run(source.clone(), &args.output_path).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("job failed: {e}");
            exit(1);
        }
    };

    let verdict = tester::read_input_keys(&*source)
        .map_err(|e| e.to_string())
        .and_then(|keys| tester::verify(&summary.output_files, keys));
    match verdict {
        Ok(()) => info!(
            "ok: {} records in {} shards {:?}",
            summary.records(),
            summary.shards,
            summary.records_per_shard
        ),
        Err(e) => {
            error!("{e}");
            exit(1);
        }
    }
}
