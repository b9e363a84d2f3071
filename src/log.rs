// PixelFont
// copyright zipxing@hotmail.com 2022~2024

//! Wraps log4rs to write diagnostics to a log file.
//!
//! Rendering runs inside a host frame loop, so logs go to a file instead of
//! stdout. Call init_log once at startup; without the log4rs feature the
//! call is a no-op and the host application owns logger setup.

#[cfg(feature = "log4rs")]
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

#[cfg(feature = "log4rs")]
pub fn init_log(level: log::LevelFilter, path: &str) {
    let fa = match FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d} {l} - {m}{n}")))
        .build(path)
    {
        Ok(f) => f,
        Err(_) => return,
    };
    let config = match Config::builder()
        .appender(Appender::builder().build("pixel_font", Box::new(fa)))
        .build(Root::builder().appender("pixel_font").build(level))
    {
        Ok(c) => c,
        Err(_) => return,
    };
    // init fails when the host already installed a logger, keep theirs
    let _ = log4rs::init_config(config);
}

#[cfg(not(feature = "log4rs"))]
pub fn init_log(_level: log::LevelFilter, _path: &str) {}
