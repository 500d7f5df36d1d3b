use clap::Parser;
use stage_cli::Args;
use tracing::error;

fn main() {
    let args = Args::parse();

    let tracing_handle = stage_tracing::TracingBuilder::default()
        .level(args.log_level)
        .json(args.json)
        .enable_progressbar()
        .build()
        .expect("unable to set up tracing");

    if let Err(e) = stage_cli::run(&args, &mut tracing_handle.get_stdout_writer()) {
        error!(err = %e, "failed");
        std::process::exit(1);
    }
}
