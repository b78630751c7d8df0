use clap::Parser;
use portsweep::cli::{self, Args};
use portsweep::output::print_error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_tracing(args.verbose);

    match cli::run(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.exit_code() as u8;
            let err = anyhow::Error::new(e).context(format!("scan of '{}' failed", args.target));
            print_error(&format!("{:#}", err));
            ExitCode::from(code)
        }
    }
}
