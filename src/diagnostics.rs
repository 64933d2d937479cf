//! Terminal diagnostics: severities, the collecting sink, and the
//! ANSI snippet renderer.
//!
//! Diagnostics are streamed: each call renders immediately and nothing is
//! retained except the error counter. The rendering for one annotation is a
//! `= file:line:col` banner followed by a context window of the source with
//! the annotated range shown in reverse video, and an optional note under
//! the snippet.
//!
//! Rendering never fails; a span reaching outside its text degrades to best
//! effort. Errors in the renderer's own output stream are ignored.

use std::cmp::min;
use std::io::{self, Write};

use colored::Colorize;

use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Fatal,
}

impl Severity {
    fn tag(self) -> colored::ColoredString {
        match self {
            Severity::Error => "error:".red(),
            Severity::Warning => "warning:".yellow(),
            Severity::Info => "info:".blue(),
            Severity::Fatal => "fatal error:".red(),
        }
    }
}

/// Print a fatal diagnostic and terminate with a nonzero exit status.
pub fn fatal(message: &str) -> ! {
    println!("{} {}", Severity::Fatal.tag(), message);
    std::process::exit(1);
}

/// Format an internal-compiler-error message, tagged so users know to
/// report it.
pub fn ice(message: &str) -> String {
    format!(
        "{}{} {}",
        "internal compiler error ".red(),
        "(please report this):".cyan(),
        message.yellow()
    )
}

/// `1 -> "1st"`, `2 -> "2nd"`, `3 -> "3rd"`, everything else `"th"`,
/// going by the final digit.
pub fn ordinal(n: usize) -> String {
    let suffix = match n % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

enum Sink {
    Stdout,
    Buffer(Vec<u8>),
}

/// The diagnostic sink threaded through the tokenizer and the parser.
///
/// Owns the error counter; rendering goes to stdout, or to an in-memory
/// buffer for tests ([`Diagnostics::buffered`]).
pub struct Diagnostics {
    errors: usize,
    sink: Sink,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics {
            errors: 0,
            sink: Sink::Stdout,
        }
    }

    /// A sink that captures rendered output instead of printing it.
    pub fn buffered() -> Self {
        Diagnostics {
            errors: 0,
            sink: Sink::Buffer(Vec::new()),
        }
    }

    /// Drain everything rendered so far (buffered sinks only).
    pub fn take_output(&mut self) -> String {
        match &mut self.sink {
            Sink::Stdout => String::new(),
            Sink::Buffer(buf) => String::from_utf8_lossy(&std::mem::take(buf)).into_owned(),
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn reset_error_count(&mut self) {
        self.errors = 0;
    }

    /// Render an error. Each annotation is a span plus a note shown under
    /// its snippet; the note may be empty.
    pub fn error(&mut self, message: &str, annotations: &[(Span<'_>, &str)]) {
        self.errors += 1;
        self.emit(Severity::Error, message, annotations);
    }

    pub fn warning(&mut self, message: &str, annotations: &[(Span<'_>, &str)]) {
        self.emit(Severity::Warning, message, annotations);
    }

    pub fn info(&mut self, message: &str, annotations: &[(Span<'_>, &str)]) {
        self.emit(Severity::Info, message, annotations);
    }

    fn emit(&mut self, severity: Severity, message: &str, annotations: &[(Span<'_>, &str)]) {
        match &mut self.sink {
            Sink::Stdout => {
                let stdout = io::stdout();
                let _ = render(&mut stdout.lock(), severity, message, annotations);
            }
            Sink::Buffer(buf) => {
                let _ = render(buf, severity, message, annotations);
            }
        }
    }
}

pub(crate) fn render(
    out: &mut dyn Write,
    severity: Severity,
    message: &str,
    annotations: &[(Span<'_>, &str)],
) -> io::Result<()> {
    writeln!(out, "{} {}", severity.tag(), message)?;
    for (span, note) in annotations {
        render_annotation(out, *span, note)?;
    }
    // Errors and warnings are followed by a blank separator line; info is a
    // bare status line.
    match severity {
        Severity::Error | Severity::Warning => writeln!(out)?,
        Severity::Info | Severity::Fatal => {}
    }
    Ok(())
}

/// Render one annotated span: banner, windowed snippet with the range in
/// reverse video, and the note (when non-empty) under the snippet.
fn render_annotation(out: &mut dyn Write, span: Span<'_>, note: &str) -> io::Result<()> {
    let file = span.file();
    let start = file.line_col(span.start);
    let end = file.line_col(span.end);
    let lines: Vec<&str> = file.text.split('\n').collect();

    // Three lines of context on each side, clamped to the file.
    let first = start.line.saturating_sub(3);
    let last = min(end.line + 3, lines.len());
    let width = last.to_string().len();

    let banner = format!("= {}:{}", file.name, start);
    writeln!(out, "{}", banner.blue())?;

    for (idx, line) in lines.iter().enumerate().take(last).skip(first) {
        let gutter = format!("{:<gw$}| ", idx + 1, gw = width + 1);
        write!(out, "{}", gutter.blue())?;
        if idx < start.line || idx > end.line {
            writeln!(out, "{}", safe(line, false))?;
        } else if idx == start.line && idx == end.line {
            write!(out, "{}", safe(slice_cols(line, 0, start.column), false))?;
            write!(out, "{}", safe(slice_cols(line, start.column, end.column), true))?;
            writeln!(out, "{}", safe(slice_cols(line, end.column, usize::MAX), false))?;
        } else if idx == start.line {
            write!(out, "{}", safe(slice_cols(line, 0, start.column), false))?;
            writeln!(out, "{}", safe(slice_cols(line, start.column, usize::MAX), true))?;
        } else if idx == end.line {
            write!(out, "{}", safe(slice_cols(line, 0, end.column), true))?;
            writeln!(out, "{}", safe(slice_cols(line, end.column, usize::MAX), false))?;
        } else {
            writeln!(out, "{}", safe(line, true))?;
        }
    }

    if !note.is_empty() {
        let noteline = format!("{:<gw$}| {}", "", note, gw = width + 1);
        writeln!(out, "{}", noteline.blue())?;
    }
    Ok(())
}

/// Slice a line by character columns, clamping out-of-range bounds.
fn slice_cols(line: &str, from: usize, to: usize) -> &str {
    if from >= to {
        return "";
    }
    let mut indices = line.char_indices().map(|(idx, _)| idx);
    let begin = indices.nth(from).unwrap_or(line.len());
    let end = if to == usize::MAX {
        line.len()
    } else {
        line.char_indices()
            .map(|(idx, _)| idx)
            .nth(to)
            .unwrap_or(line.len())
    };
    &line[begin..end.max(begin)]
}

/// Replace control characters with cyan bracketed mnemonics. Newlines are
/// never escaped; callers feed this one line at a time.
fn safe(s: &str, highlighted: bool) -> String {
    let mut out = String::new();
    let mut run = String::new();
    let flush = |out: &mut String, run: &mut String| {
        if !run.is_empty() {
            if highlighted {
                out.push_str(&run.as_str().reversed().to_string());
            } else {
                out.push_str(run);
            }
            run.clear();
        }
    };
    for c in s.chars() {
        if c != '\n' && c.is_control() {
            flush(&mut out, &mut run);
            let name = match unprintable_name(c) {
                Some(name) => format!("<{name}>"),
                None => format!("<0x{:02X}>", c as u32),
            };
            let styled = if highlighted {
                name.cyan().reversed()
            } else {
                name.cyan()
            };
            out.push_str(&styled.to_string());
        } else {
            run.push(c);
        }
    }
    flush(&mut out, &mut run);
    out
}

fn unprintable_name(c: char) -> Option<&'static str> {
    let name = match c {
        '\x00' => "NUL",
        '\x01' => "SOH",
        '\x02' => "STX",
        '\x03' => "ETX",
        '\x04' => "EOT",
        '\x05' => "ENQ",
        '\x06' => "ACK",
        '\x07' => "BEL",
        '\x08' => "BS",
        '\x09' => "HT",
        '\x0B' => "VT",
        '\x0C' => "FF",
        '\x0D' => "CR",
        '\x0E' => "SO",
        '\x0F' => "SI",
        '\x10' => "DLE",
        '\x11' => "DC1",
        '\x12' => "DC2",
        '\x13' => "DC3",
        '\x14' => "DC4",
        '\x15' => "NAK",
        '\x16' => "SYN",
        '\x17' => "ETB",
        '\x18' => "CAN",
        '\x19' => "EM",
        '\x1A' => "SUB",
        '\x1B' => "ESC",
        '\x1C' => "FS",
        '\x1D' => "GS",
        '\x1E' => "RS",
        '\x1F' => "US",
        '\x7F' => "DEL",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::source::SourceFile;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn error_counter_tracks_errors_only() {
        plain();
        let file = SourceFile::new("c.esc", "x");
        let span = Span::new(&file, 0, 1);
        let mut diag = Diagnostics::buffered();
        assert_eq!(diag.error_count(), 0);
        diag.error("first", &[(span, "")]);
        diag.warning("not counted", &[(span, "")]);
        diag.info("also not counted", &[]);
        diag.error("second", &[]);
        assert_eq!(diag.error_count(), 2);
        diag.reset_error_count();
        assert_eq!(diag.error_count(), 0);
    }

    #[test]
    fn ordinals_follow_the_final_digit() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(10), "10th");
        assert_eq!(ordinal(22), "22nd");
    }

    #[test]
    fn banner_and_snippet_for_a_single_line_span() {
        plain();
        let file = SourceFile::new("demo.esc", "let x = 1\nlet y = 2\n");
        let span = Span::new(&file, 4, 5);
        let mut diag = Diagnostics::buffered();
        diag.error("something about x", &[(span, "declared here")]);
        let output = diag.take_output();
        assert!(output.contains("error: something about x"), "{output}");
        assert!(output.contains("= demo.esc:1:5"), "{output}");
        assert!(output.contains("1 | let x = 1"), "{output}");
        assert!(output.contains("2 | let y = 2"), "{output}");
        assert!(output.contains("| declared here"), "{output}");
    }

    #[test]
    fn window_clamps_to_the_file() {
        plain();
        let text = (1..=10).map(|n| format!("line{n}")).collect::<Vec<_>>().join("\n");
        let file = SourceFile::new("w.esc", text);
        // "line5" starts at offset 24.
        let span = Span::new(&file, 24, 29);
        let mut diag = Diagnostics::buffered();
        diag.error("mid-file", &[(span, "")]);
        let output = diag.take_output();
        assert!(output.contains("line2"), "{output}");
        assert!(output.contains("line7"), "{output}");
        assert!(!output.contains("line1\n"), "{output}");
        assert!(!output.contains("line8"), "{output}");
    }

    #[test]
    fn control_characters_render_as_mnemonics() {
        plain();
        let file = SourceFile::new("ctl.esc", "a\x1bb\x00c");
        let span = Span::new(&file, 0, 1);
        let mut diag = Diagnostics::buffered();
        diag.error("control characters", &[(span, "")]);
        let output = diag.take_output();
        assert!(output.contains("a<ESC>b<NUL>c"), "{output}");
    }

    #[test]
    fn unknown_controls_render_as_hex() {
        plain();
        // U+0085 (NEL) is a control character with no C0 mnemonic.
        let file = SourceFile::new("ctl.esc", "a\u{85}b");
        let span = Span::new(&file, 0, 1);
        let mut diag = Diagnostics::buffered();
        diag.error("odd control", &[(span, "")]);
        let output = diag.take_output();
        assert!(output.contains("a<0x85>b"), "{output}");
    }

    #[test]
    fn multi_line_spans_highlight_every_covered_line() {
        plain();
        let file = SourceFile::new("m.esc", "aa\nbb\ncc\ndd");
        // Covers from the middle of "aa" to the middle of "cc".
        let span = Span::new(&file, 1, 7);
        let mut diag = Diagnostics::buffered();
        diag.error("spans lines", &[(span, "")]);
        let output = diag.take_output();
        for needle in ["1 | aa", "2 | bb", "3 | cc", "4 | dd"] {
            assert!(output.contains(needle), "{output}");
        }
    }

    #[test]
    fn ice_messages_carry_the_report_tag() {
        plain();
        let text = ice("the impossible happened");
        assert!(text.contains("please report this"), "{text}");
    }
}
