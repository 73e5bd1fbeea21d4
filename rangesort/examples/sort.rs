use std::sync::Arc;

use clap::Parser;
use rangesort::{core::source::DirSource, Args, SortJob};

#[tokio::main]
async fn main() -> rangesort::Result<()> {
    let args = Args::parse();
    let config = args.load_config()?;

    let source = Arc::new(DirSource::discover(&args.input)?);
    let job = SortJob::local(config, &args.work_dir);
    let summary = job.run(source, &args.output).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
