use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

mod application;
mod commands;
mod constants;
mod discovery;
mod transport;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests_application;
#[cfg(test)]
mod tests_commands;
#[cfg(test)]
mod tests_loopback;
#[cfg(test)]
mod tests_transport;

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage the labels stored on a password keyboard")]
struct Cli {
    /// Optional path to the serial device. Falls back to auto-detection when omitted.
    #[arg(short, long, env = "LABELPASS_PORT")]
    port: Option<String>,

    /// Skip VID/PID filtering and accept the first USB serial device.
    #[arg(long)]
    any_port: bool,

    /// Raise log verbosity, repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append a label to the device log.
    Add {
        /// Label naming the credential, 1 to 255 bytes.
        label: String,
    },
    /// Print every stored label in order.
    List,
    /// Advance the device cursor and print the label there.
    Next,
    /// Move the device cursor back and print the label there.
    Previous,
    /// Erase every label on the device.
    Wipe,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = application::execute(cli, &application::SerialTransportProvider) {
        eprintln!("{}", application::describe_failure(&err));
        return Err(anyhow::Error::from(err));
    }

    Ok(())
}
