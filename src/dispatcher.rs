//! Dispatching of decoded records to the output stream.
//!
//! [`Printer`] is the handler every source feeds: it applies the filter to
//! the record's candidate attribute and writes accepted records as indented
//! JSON, one document per line. [`run`] selects the source for the
//! configured [`ConsumerMode`] and drives it until a fatal error.

use crate::config::ConsumerMode;
use crate::error::ConsumerError;
use crate::filter::FilterSpec;
use crate::source::{CloudEventReceiver, EventHandler, MessageSource, RawMessageSource, Record};
use crate::transport::Transport;
use std::io::Write;
use tracing::{debug, error};

/// Filters records and prints the accepted ones.
pub struct Printer<'a, W> {
    filter: &'a FilterSpec,
    out: W,
    emitted: u64,
    suppressed: u64,
}

impl<'a, W: Write + Send> Printer<'a, W> {
    /// Creates a printer writing to `out`.
    pub fn new(filter: &'a FilterSpec, out: W) -> Self {
        Self {
            filter,
            out,
            emitted: 0,
            suppressed: 0,
        }
    }

    /// Number of records written so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Number of records rejected by the filter so far.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Consumes the printer and returns the output stream.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Filters and prints one record.
    ///
    /// Serialization failures are logged and skip the record.
    ///
    /// # Errors
    ///
    /// Returns `ConsumerError::Output` when the output stream fails.
    pub fn emit<R: Record>(&mut self, record: &R) -> Result<(), ConsumerError> {
        let candidate = record.filter_candidate();
        if !self.filter.should_emit(candidate) {
            debug!(candidate, "Suppressed by filter");
            self.suppressed += 1;
            return Ok(());
        }

        let rendered = match serde_json::to_string_pretty(record) {
            Ok(rendered) => rendered,
            Err(e) => {
                error!("{}", ConsumerError::Serialization(e));
                return Ok(());
            }
        };

        writeln!(self.out, "{}", rendered)?;
        self.out.flush()?;
        self.emitted += 1;
        Ok(())
    }
}

impl<'a, R: Record, W: Write + Send> EventHandler<R> for Printer<'a, W> {
    fn handle(&mut self, record: R) -> Result<(), ConsumerError> {
        self.emit(&record)
    }
}

/// Drives `source` into a [`Printer`] until a fatal error.
pub async fn dispatch<S, W>(
    source: &mut S,
    filter: &FilterSpec,
    out: W,
) -> Result<(), ConsumerError>
where
    S: MessageSource,
    W: Write + Send,
{
    let mut printer = Printer::new(filter, out);
    source.run(&mut printer).await
}

/// Runs the consumer in `mode` over `transport`, writing to `out`.
///
/// Never returns `Ok` in practice: the sources only stop on fatal errors.
pub async fn run<T, W>(
    mode: ConsumerMode,
    transport: T,
    filter: &FilterSpec,
    out: W,
) -> Result<(), ConsumerError>
where
    T: Transport,
    W: Write + Send,
{
    match mode {
        ConsumerMode::Raw => dispatch(&mut RawMessageSource::new(transport), filter, out).await,
        ConsumerMode::CloudEvents => {
            dispatch(&mut CloudEventReceiver::new(transport), filter, out).await
        }
    }
}
