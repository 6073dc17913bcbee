use env_logger::WriteStyle;
use log::LevelFilter;
use std::io::Write;

/// Installs the crate's `env_logger` formatter. Fails if a logger is already set.
pub fn try_init() -> Result<(), log::SetLoggerError> {
    env_logger::builder()
        .format(|buf, record| writeln!(buf, "[C2D | {}] {}", record.level(), record.args()))
        .write_style(WriteStyle::Always)
        .filter(None, LevelFilter::Info)
        .try_init()
}
