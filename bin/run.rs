use gcodes::{emulator::Emulator, event::Event};

use clap::{App, Arg, ArgMatches};
use slog::{debug, info, o, Drain, Level, Logger};

enum Error {
    Gcode(gcodes::error::Error),
    IO(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::IO(e)
    }
}

impl From<gcodes::error::Error> for Error {
    fn from(e: gcodes::error::Error) -> Error {
        Error::Gcode(e)
    }
}

fn parse_arguments() -> ArgMatches<'static> {
    App::new("gcoderun")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Utility for emulating gcode programs")
        .arg(Arg::with_name("source")
             .help("File containing gcode source")
             .value_name("SOURCE")
             .required(true)
             .index(1))
        .arg(Arg::with_name("verbose")
             .help("Log every intermediate machine state")
             .short("v")
             .long("verbose"))
        .get_matches()
}

fn main() {
    let args = parse_arguments();

    let file_path = args.value_of("source").unwrap();
    let verbose = args.is_present("verbose");

    match run(file_path, verbose) {
        Ok(()) => (),
        Err(Error::IO(io)) => eprintln!("IO error: {}", io),
        Err(Error::Gcode(err)) => eprintln!("Error: {}", err),
    }
}

fn create_logger(verbose: bool) -> Logger {
    let level = if verbose { Level::Debug } else { Level::Info };

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = drain.filter_level(level).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Logger::root(drain, o!())
}

fn run(file_path: &str, verbose: bool) -> Result<(), Error> {
    let file = std::fs::read_to_string(file_path)?;

    let logger = create_logger(verbose);
    let event_log = logger.clone();

    let mut emulator = Emulator::new().with_logger(logger);

    emulator.add_listener(move |event: &Event| match event {
        Event::StateChanged { state, time } => {
            debug!(event_log, "state changed";
                  "t" => format!("{:.3}", time),
                  "x" => state.x,
                  "y" => state.y,
                  "z" => state.z,
                  "feed_rate" => state.feed_rate);
        }
        Event::OperationExecuted { code, duration } => {
            let duration = duration
                .map(|seconds| format!("{:.3}s", seconds))
                .unwrap_or_else(|| "none".to_string());

            info!(event_log, "operation executed";
                  "code" => format!("G{}", code.number),
                  "duration" => duration);
        }
        Event::CommentDetected { text, .. } => {
            info!(event_log, "comment"; "text" => text.clone());
        }
    });

    emulator.run(&file)?;

    Ok(())
}
