use std::path::PathBuf;

use junit_xray::{JunitXrayReporter, Result};

const USAGE: &str = "Usage: junit-xray replay <events.jsonl> [--config <file>]";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("replay") => {
            let Some(events_path) = args.get(2) else {
                eprintln!("{}", USAGE);
                std::process::exit(1);
            };
            let mut config = junit_xray::config::resolve(std::env::current_dir().ok().as_deref());
            match args.get(3).map(|s| s.as_str()) {
                Some("--config") => match args.get(4) {
                    Some(path) => junit_xray::config::apply_explicit(&mut config, &PathBuf::from(path))?,
                    None => {
                        eprintln!("{}", USAGE);
                        std::process::exit(1);
                    }
                },
                Some(_) => {
                    eprintln!("{}", USAGE);
                    std::process::exit(1);
                }
                None => {}
            }

            let input = tokio::fs::read_to_string(events_path).await?;
            let events = junit_xray::host::parse_events(&input)?;
            let mut reporter = JunitXrayReporter::new(config);
            junit_xray::host::replay(&mut reporter, &events).await?;
            println!("{}", reporter.output_path().display());
            Ok(())
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(1);
        }
    }
}
