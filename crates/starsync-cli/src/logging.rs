use std::sync::{LazyLock, RwLock};

use nu_ansi_term::Color::{Blue, Magenta, Red, Yellow};
use starsync_utils::string::redact;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{FmtSpan, Writer},
        FmtContext, FormatEvent, FormatFields, MakeWriter,
    },
    registry::LookupSpan,
};

use crate::{cli::Args, utils::Colored};

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        }
    }
}

/// Prints the bare message, prefixed with the level for anything but INFO.
pub struct MessageFormatter;

impl<S, N> FormatEvent<S, N> for MessageFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        match *event.metadata().level() {
            Level::TRACE => write!(writer, "{} ", Colored(Magenta, "[TRACE]")),
            Level::DEBUG => write!(writer, "{} ", Colored(Blue, "[DEBUG]")),
            Level::INFO => Ok(()),
            Level::WARN => write!(writer, "{} ", Colored(Yellow, "[WARN]")),
            Level::ERROR => write!(writer, "{} ", Colored(Red, "[ERROR]")),
        }?;

        match visitor.message {
            Some(message) => writeln!(writer, "{message}"),
            None => writeln!(writer),
        }
    }
}

/// Token scrubbed from every log line. Clone URLs carry it, and git or HTTP
/// errors may echo those URLs back.
static LOG_SECRET: LazyLock<RwLock<Option<String>>> = LazyLock::new(|| RwLock::new(None));

/// Registers the access token to scrub from log output.
pub fn hide_secret(secret: Option<&str>) {
    let mut guard = LOG_SECRET.write().unwrap();
    *guard = secret
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
}

fn render_output(buffer: &[u8]) -> String {
    let output = String::from_utf8_lossy(buffer);
    let output = output.trim_end_matches('\n');
    match LOG_SECRET.read().unwrap().as_deref() {
        Some(secret) => redact(output, secret),
        None => output.to_string(),
    }
}

/// Buffers one event and prints it with the progress bars suspended.
struct SuspendingWriter {
    buffer: Vec<u8>,
    use_stderr: bool,
}

impl SuspendingWriter {
    fn new(use_stderr: bool) -> Self {
        Self {
            buffer: Vec::new(),
            use_stderr,
        }
    }
}

impl std::io::Write for SuspendingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for SuspendingWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let output = render_output(&self.buffer);
        let use_stderr = self.use_stderr;

        crate::progress::suspend(|| {
            if use_stderr {
                eprintln!("{output}");
            } else {
                println!("{output}");
            }
        });
    }
}

struct WriterBuilder;

impl<'a> MakeWriter<'a> for WriterBuilder {
    type Writer = SuspendingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SuspendingWriter::new(false)
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        SuspendingWriter::new(meta.level() != &Level::INFO)
    }
}

fn filter_level(args: &Args) -> Level {
    if args.quiet {
        Level::ERROR
    } else if args.verbose >= 2 {
        Level::TRACE
    } else if args.verbose == 1 {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

pub fn setup_logging(args: &Args) {
    let builder = fmt::Subscriber::builder()
        .with_env_filter(format!("starsync={}", filter_level(args)))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(WriterBuilder)
        .compact()
        .without_time();

    let subscriber: Box<dyn Subscriber + Send + Sync> = if args.json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(builder.event_format(MessageFormatter).finish())
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already set");
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use serial_test::serial;
    use starsync_utils::string::REDACTED;

    use super::*;

    #[test]
    #[serial]
    fn test_render_output_scrubs_token() {
        hide_secret(Some("ghp_secret"));
        assert_eq!(
            render_output(b"error when cloning a/b: https://ghp_secret@github.com/a/b.git\n"),
            format!("error when cloning a/b: https://{REDACTED}@github.com/a/b.git")
        );

        hide_secret(Some("  "));
        assert_eq!(render_output(b"ghp_secret\n\n"), "ghp_secret");
        hide_secret(None);
    }

    #[test]
    fn test_filter_level() {
        let args = Args::parse_from(["starsync", "config"]);
        assert_eq!(filter_level(&args), Level::INFO);

        let args = Args::parse_from(["starsync", "-vv", "config"]);
        assert_eq!(filter_level(&args), Level::TRACE);

        let args = Args::parse_from(["starsync", "-q", "-v", "config"]);
        assert_eq!(filter_level(&args), Level::ERROR);
    }
}
