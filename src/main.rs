mod dump;

use std::io::Write;
use std::thread;
use std::time::Duration;

use clap::Parser;
use tap_rec::config::{Cli, Command, Config};
use tap_rec::device;
use tap_rec::Recorder;

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let default_filter = match cli.command {
        Some(Command::Dump) => "warn",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = Config::load(&cli);
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    log::info!(
        "tap-rec starting (transport={}, mode={}, labels={})",
        config.transport,
        config.mode,
        if config.labels { "on" } else { "off" }
    );

    let shell = config.shell();
    let options = config.recorder_options();

    match cli.command.unwrap_or(Command::Record { seconds: None }) {
        Command::Devices => {
            let selection = device::discover(shell.as_ref(), &options.capability_command())?;
            println!("{}", serde_json::to_string_pretty(&selection)?);
            Ok(())
        }
        Command::Dump => {
            let selection = device::discover(shell.as_ref(), &options.capability_command())?;
            dump::run(shell.as_ref(), &options.stream_command(&selection))
        }
        Command::Record { seconds } => {
            let mut recorder = Recorder::new(shell, options);
            let handle = recorder.start(|event| {
                let mut out = std::io::stdout().lock();
                match serde_json::to_string(&event) {
                    Ok(json) => {
                        if writeln!(out, "{}", json).and_then(|_| out.flush()).is_err() {
                            log::debug!("stdout closed");
                        }
                    }
                    Err(e) => log::error!("Failed to encode event: {}", e),
                }
            })?;

            if let Some(secs) = seconds {
                thread::spawn(move || {
                    thread::sleep(Duration::from_secs(secs));
                    log::info!("Recording time of {}s elapsed", secs);
                    handle.stop();
                });
            }

            recorder.wait()?;
            Ok(())
        }
    }
}
