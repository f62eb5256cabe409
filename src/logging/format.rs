//! `%(field)s` style line formatting for `tracing-subscriber`

use std::fmt;

use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

const DEFAULT_DATEFMT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Record attribute that can appear in a format string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    AscTime,
    Name,
    LevelName,
    LevelNo,
    Message,
    Module,
    FileName,
    LineNo,
    Process,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "asctime" => Some(Field::AscTime),
            "name" => Some(Field::Name),
            "levelname" => Some(Field::LevelName),
            "levelno" => Some(Field::LevelNo),
            "message" => Some(Field::Message),
            "module" => Some(Field::Module),
            "filename" => Some(Field::FileName),
            "lineno" => Some(Field::LineNo),
            "process" => Some(Field::Process),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Field {
        field: Field,
        width: usize,
        left_align: bool,
        precision: Option<usize>,
    },
}

/// Parsed format string such as `%(asctime)s - %(levelname)-8s - %(message)s`
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    segments: Vec<Segment>,
}

/// The parts of an event a pattern can refer to
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub level: Level,
    pub module_path: Option<&'a str>,
    pub file: Option<&'a str>,
    pub line: Option<u32>,
    pub message: &'a str,
}

impl Pattern {
    /// Parse a format string.
    pub fn parse(format: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }

            match chars.next() {
                Some('%') => literal.push('%'),
                Some('(') => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some(')') => break,
                            Some(ch) => name.push(ch),
                            None => return Err(format!("unterminated placeholder in {:?}", format)),
                        }
                    }
                    let field = Field::from_name(&name)
                        .ok_or_else(|| format!("unknown placeholder %({})", name))?;

                    let mut left_align = false;
                    while let Some(&flag) = chars.peek() {
                        match flag {
                            '-' => left_align = true,
                            '0' | '+' | ' ' | '#' => {}
                            _ => break,
                        }
                        chars.next();
                    }

                    let mut width = 0usize;
                    while let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                        width = width * 10 + digit as usize;
                        chars.next();
                    }

                    let mut precision = None;
                    if chars.peek() == Some(&'.') {
                        chars.next();
                        let mut value = 0usize;
                        while let Some(digit) = chars.peek().and_then(|d| d.to_digit(10)) {
                            value = value * 10 + digit as usize;
                            chars.next();
                        }
                        precision = Some(value);
                    }

                    match chars.next() {
                        Some('s') | Some('d') | Some('r') | Some('f') => {}
                        Some(other) => {
                            return Err(format!("unsupported conversion '{}' for %({})", other, name))
                        }
                        None => return Err(format!("missing conversion for %({})", name)),
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field {
                        field,
                        width,
                        left_align,
                        precision,
                    });
                }
                Some(other) => return Err(format!("unsupported format directive %{}", other)),
                None => return Err("format string ends with '%'".to_string()),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Whether the pattern references the record timestamp
    pub fn uses_time(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Field { field: Field::AscTime, .. }))
    }

    /// Render one record.
    pub fn render(&self, logger_name: &str, asctime: &str, record: &Record<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field {
                    field,
                    width,
                    left_align,
                    precision,
                } => {
                    let mut value = field_value(*field, logger_name, asctime, record);
                    if let Some(max) = precision {
                        value = value.chars().take(*max).collect();
                    }
                    let len = value.chars().count();
                    let padding = " ".repeat(width.saturating_sub(len));
                    if *left_align {
                        out.push_str(&value);
                        out.push_str(&padding);
                    } else {
                        out.push_str(&padding);
                        out.push_str(&value);
                    }
                }
            }
        }
        out
    }
}

fn field_value(field: Field, logger_name: &str, asctime: &str, record: &Record<'_>) -> String {
    match field {
        Field::AscTime => asctime.to_string(),
        Field::Name => logger_name.to_string(),
        Field::LevelName => level_name(record.level).to_string(),
        Field::LevelNo => level_number(record.level).to_string(),
        Field::Message => record.message.to_string(),
        Field::Module => record
            .module_path
            .and_then(|path| path.rsplit("::").next())
            .unwrap_or_default()
            .to_string(),
        Field::FileName => record
            .file
            .and_then(|file| std::path::Path::new(file).file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        Field::LineNo => record.line.unwrap_or(0).to_string(),
        Field::Process => std::process::id().to_string(),
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

fn level_number(level: Level) -> u8 {
    match level {
        Level::TRACE => 5,
        Level::DEBUG => 10,
        Level::INFO => 20,
        Level::WARN => 30,
        Level::ERROR => 40,
    }
}

/// Event formatter that renders a [`Pattern`] for a named logger
#[derive(Debug, Clone)]
pub struct PatternFormat {
    logger_name: String,
    pattern: Pattern,
    datefmt: Option<String>,
}

impl PatternFormat {
    pub fn new(logger_name: impl Into<String>, pattern: Pattern, datefmt: Option<String>) -> Self {
        Self {
            logger_name: logger_name.into(),
            pattern,
            datefmt,
        }
    }

    fn asctime(&self) -> String {
        if !self.pattern.uses_time() {
            return String::new();
        }
        let datefmt = self.datefmt.as_deref().unwrap_or(DEFAULT_DATEFMT);
        Local::now().format(datefmt).to_string()
    }
}

impl<S, N> FormatEvent<S, N> for PatternFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut message = String::new();
        ctx.format_fields(Writer::new(&mut message), event)?;

        let metadata = event.metadata();
        let record = Record {
            level: *metadata.level(),
            module_path: metadata.module_path(),
            file: metadata.file(),
            line: metadata.line(),
            message: &message,
        };
        let line = self.pattern.render(&self.logger_name, &self.asctime(), &record);
        writeln!(writer, "{}", line)
    }
}
