//! Colored terminal output for deploy and branch operations.

use std::io::Write;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Output manager for consistent colored terminal output
#[derive(Debug)]
pub struct OutputManager {
    bufwtr: BufferWriter,
    verbose: bool,
    quiet: bool,
}

impl Clone for OutputManager {
    fn clone(&self) -> Self {
        Self::new(self.verbose, self.quiet)
    }
}

impl OutputManager {
    /// Create a new output manager
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            bufwtr: BufferWriter::stdout(ColorChoice::Auto),
            verbose,
            quiet,
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) -> std::io::Result<()> {
        self.tagged(Color::Cyan, false, "ℹ", message)
    }

    /// Print a success message
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.tagged(Color::Green, true, "✓", message)
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.tagged(Color::Yellow, true, "⚠", message)
    }

    /// Print a verbose message (only in verbose mode)
    pub fn verbose(&self, message: &str) -> std::io::Result<()> {
        if !self.verbose {
            return Ok(());
        }
        self.tagged(Color::Blue, false, "→", message)
    }

    /// Print an error message to stderr (always shown)
    pub fn error(&self, message: &str) {
        let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();

        if buffer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true)).is_err()
            || write!(&mut buffer, "✗").is_err()
            || buffer.reset().is_err()
            || writeln!(&mut buffer, " {}", message).is_err()
            || bufwtr.print(&buffer).is_err()
        {
            eprintln!("✗ {}", message);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.bufwtr.buffer();
        writeln!(&mut buffer)?;
        buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        writeln!(&mut buffer, "═══ {} ═══", title)?;
        buffer.reset()?;
        self.bufwtr.print(&buffer)
    }

    /// Print indented text (for sub-items)
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.println(&format!("    {}", message))
    }

    /// Print a plain message (respects quiet mode)
    pub fn println(&self, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.bufwtr.buffer();
        writeln!(&mut buffer, "{}", message)?;
        self.bufwtr.print(&buffer)
    }

    fn tagged(&self, color: Color, bold: bool, tag: &str, message: &str) -> std::io::Result<()> {
        if self.quiet {
            return Ok(());
        }

        let mut buffer = self.bufwtr.buffer();
        buffer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
        write!(&mut buffer, "{}", tag)?;
        buffer.reset()?;
        writeln!(&mut buffer, " {}", message)?;
        self.bufwtr.print(&buffer)
    }
}
