//! CLI entry point for the serial echo binary.
//!
//! Brings up a PTY-backed simulator, initializes the configured USART
//! through the firmware driver, and echoes every received byte back to the
//! peer.

use std::env;
use std::ffi::OsString;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use platform_serial::SerialPort;
use sim_core::{Channel, SimConfig, Simulator, UsartFamily};

const USAGE_TEXT: &str = "\
Usage: serial-echo [options]

Options:
  -c, --channel <n>     USART channel to drive (0-3, default 3)
  -b, --baud <rate>     Line rate in bits per second (default 9600)
  -f, --family <name>   Register family: 0series or classic (default 0series)
  -p, --publish <file>  File to write the PTY peer path to (default pty_slave.txt)
  -h, --help            Show this help message

The PTY peer path is also printed on stdout; connect a terminal to it, for
example: picocom $(cat pty_slave.txt)
";

#[derive(Debug, PartialEq, Eq)]
struct EchoArgs {
    channel: Option<Channel>,
    baud: Option<u32>,
    family: Option<UsartFamily>,
    publish: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Args(EchoArgs),
    Help,
}

#[allow(clippy::while_let_on_iterator)]
fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut parsed = EchoArgs {
        channel: None,
        baud: None,
        family: None,
        publish: None,
    };

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg == "-c" || arg == "--channel" {
            let value = flag_value(&mut args, "-c")?;
            parsed.channel = Some(value.parse::<Channel>().map_err(|e| e.to_string())?);
            continue;
        }

        if arg == "-b" || arg == "--baud" {
            let value = flag_value(&mut args, "-b")?;
            parsed.baud = Some(
                value
                    .parse()
                    .map_err(|_| format!("invalid baud rate: {value}"))?,
            );
            continue;
        }

        if arg == "-f" || arg == "--family" {
            let value = flag_value(&mut args, "-f")?;
            parsed.family = Some(value.parse::<UsartFamily>().map_err(|e| e.to_string())?);
            continue;
        }

        if arg == "-p" || arg == "--publish" {
            let value = args
                .next()
                .ok_or_else(|| "missing value for -p".to_string())?;
            parsed.publish = Some(PathBuf::from(value));
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        return Err(format!("unexpected argument: {}", arg.to_string_lossy()));
    }

    Ok(ParseResult::Args(parsed))
}

fn flag_value(
    args: &mut impl Iterator<Item = OsString>,
    flag: &str,
) -> Result<String, String> {
    let value = args
        .next()
        .ok_or_else(|| format!("missing value for {flag}"))?;
    Ok(value.to_string_lossy().to_string())
}

fn build_config(args: EchoArgs) -> SimConfig {
    let mut config = SimConfig::default();
    if let Some(channel) = args.channel {
        config.channel = channel;
    }
    if let Some(baud) = args.baud {
        config.baud = baud;
    }
    if let Some(family) = args.family {
        config.family = family;
    }
    if let Some(publish) = args.publish {
        config.slave_path_file = Some(publish);
    }
    config
}

fn run(args: EchoArgs) -> Result<(), i32> {
    let sim = Simulator::new(build_config(args));
    let Some(path) = sim.slave_path() else {
        eprintln!("error: no pty available, nothing to echo");
        return Err(1);
    };
    println!("{}", path.display());
    log::info!("echoing on {}", path.display());

    let port = SerialPort::new(&sim);
    port.init();

    loop {
        if port.has_data() {
            let byte = port.read_byte();
            port.write_byte(byte);
        } else {
            thread::sleep(Duration::from_millis(1));
        }
    }
}

fn main() {
    env_logger::init();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Args(args)) => match run(args) {
            Ok(()) => 0,
            Err(code) => code,
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            1
        }
    };

    std::process::exit(exit_code);
}
