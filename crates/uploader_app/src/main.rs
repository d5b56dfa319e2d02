use anyhow::Result;
use clap::Parser;

use uploader_app::cli::{Cli, Command};
use uploader_app::commands;
use uploader_app::exit_codes::exit;
use uploader_app::logging::{self, LogDestination};

fn main() {
    let cli = Cli::parse();
    logging::initialize(
        LogDestination::from_flags(cli.log_file.clone(), cli.verbose),
        cli.verbose,
    );

    let exit_code = match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            exit::USAGE
        }
    };
    std::process::exit(exit_code);
}

fn run(command: Command) -> Result<i32> {
    match command {
        Command::Upload(args) => commands::upload(args),
        Command::Test(args) => commands::test_connection(args),
        Command::Preset(command) => commands::preset(command),
    }
}
