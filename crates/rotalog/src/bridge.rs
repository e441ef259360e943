//! `tracing-subscriber` writer backed by the rotating file set

use crate::channels::Channels;
use crate::logger::Logger;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// Hands out writers bound to the logger's current epoch, so formatted
/// `tracing` events land in the active file (and the console when echo is
/// on) under the same per-line lock as the level channels.
///
/// Pair it with [`SelfEventFilter`](crate::filters::SelfEventFilter) to keep
/// the logger's own events out of the files.
#[derive(Clone, Debug)]
pub struct RotatingMakeWriter {
    logger: Logger,
}

impl RotatingMakeWriter {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

/// Writer for one formatted event
pub struct EpochWriter {
    channels: Arc<Channels>,
}

impl Write for EpochWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.channels.sink().write_line(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RotatingMakeWriter {
    type Writer = EpochWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EpochWriter {
            channels: self.logger.channels(),
        }
    }
}

impl Logger {
    /// Writer factory for `tracing_subscriber::fmt` layers
    pub fn make_writer(&self) -> RotatingMakeWriter {
        RotatingMakeWriter::new(self.clone())
    }
}
