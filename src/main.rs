//! Command-line entry point for quadlet-app.
use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;

use quadlet_app::cli::{self, Command};
use quadlet_app::commands;
use quadlet_app::logging::{self, LogOptions, Logger};
use quadlet_app::report::{self, FailureReport};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(&LogOptions {
        verbose: args.verbose,
        json: args.global.json,
        log_file: args.global.log_file.clone(),
    });
    let log = Logger;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match &args.command {
        Command::Deploy(opts) => commands::deploy::run(&args.global, opts, &log, &mut out),
        Command::Validate(opts) => commands::validate::run(&args.global, opts, &log, &mut out),
        Command::Render(opts) => commands::render::run(&args.global, opts, &log, &mut out),
        Command::Completions(opts) => {
            commands::completions::run(opts, &mut out);
            Ok(())
        }
        Command::Version => commands::version::run(&mut out).map_err(Into::into),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let failure = FailureReport::from_error(&err);
            log.debug(&format!("{err:?}"));
            log.error(&failure.msg);
            let written = if args.global.json {
                report::write_json(&mut out, &failure)
            } else {
                report::write_failure(&mut io::stderr().lock(), &failure)
            };
            let _ = written.and_then(|()| out.flush());
            ExitCode::FAILURE
        }
    }
}
