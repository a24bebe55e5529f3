use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Diagnostics go to stderr, without timestamps, so they interleave
/// sensibly with the prompt.
pub fn init(level: LevelFilter) {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    // a logger may already be installed (tests, embedding)
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}
