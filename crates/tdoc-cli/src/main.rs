use std::io::{self, Write};

use tdoc_cli::{cli, debug, init_logging, validate};

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let verbose = match matches.subcommand() {
        Some(("debug", args)) => args.get_flag("verbose") || args.get_flag("analyze"),
        Some((_, args)) => args.get_flag("verbose"),
        None => false,
    };
    init_logging(verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let outcome = match matches.subcommand() {
        Some(("validate", args)) => validate(args, &mut out),
        Some(("debug", args)) => debug(args, &mut out).await.map(|passed| {
            let _ = writeln!(out, "\nDebug analysis complete.");
            passed
        }),
        _ => {
            let _ = cli().print_help();
            std::process::exit(1);
        }
    };

    match outcome {
        Ok(passed) => std::process::exit(if passed { 0 } else { 1 }),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}
