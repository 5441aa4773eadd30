use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Level for the number of `-v` flags given.
pub(crate) fn log_level(verbose: u8) -> Level {
  match verbose {
    0 => Level::INFO,
    1 => Level::DEBUG,
    _ => Level::TRACE,
  }
}

/// Initializes the `tracing` logger. Records go to stderr, stdout is left to
/// progress lines and result tables.
pub(crate) fn init_logger(verbose: u8) {
  let level = log_level(verbose);
  FmtSubscriber::builder()
    .with_max_level(level)
    .with_writer(std::io::stderr)
    .init();

  info!("Log level: {level}");
}
