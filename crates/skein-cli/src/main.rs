use clap::Parser;
use skein_cli::{CliArgs, SkeinCli};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let result = match SkeinCli::from_args(&args) {
        Ok(cli) => cli.run(args).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
