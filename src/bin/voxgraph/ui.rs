use std::fmt::Display;
use std::io::IsTerminal;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum Theme {
    Auto,
    Light,
    Dark,
    Plain,
}

/// Terminal output for the text format. Stdout carries results, stderr carries
/// warnings and the progress spinner.
pub struct Ui {
    palette: Palette,
    paint: bool,
    quiet: bool,
    spinner_style: ProgressStyle,
}

impl Ui {
    pub fn new(theme: Theme, quiet: bool) -> Self {
        let paint = theme != Theme::Plain && !quiet && std::io::stdout().is_terminal();

        #[cfg(windows)]
        if paint {
            let _ = nu_ansi_term::enable_ansi_support();
        }

        let palette = match theme {
            Theme::Plain => Palette::plain(),
            Theme::Light => Palette::light(),
            Theme::Dark | Theme::Auto => Palette::dark(),
        };

        let spinner_style = ProgressStyle::with_template("{prefix} {spinner} {msg} {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

        Self {
            palette,
            paint,
            quiet,
            spinner_style,
        }
    }

    /// Prints a titled block of aligned `key: value` rows.
    pub fn section<'a, I, V>(&self, title: &str, rows: I)
    where
        I: IntoIterator<Item = (&'a str, V)>,
        V: Display,
    {
        let rows: Vec<(&str, String)> = rows
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        if rows.is_empty() {
            return;
        }

        self.heading(title);
        let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            if self.paint {
                println!(
                    "  {} {}",
                    self.palette.key.paint(format!("{key:>width$}:")),
                    self.palette.value.paint(value)
                );
            } else {
                println!("  {key:>width$}: {value}");
            }
        }
    }

    /// Prints raw text such as a TOML document, untouched.
    pub fn raw(&self, text: &str) {
        print!("{text}");
        if !text.ends_with('\n') {
            println!();
        }
    }

    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        println!("{} {message}", self.icon(SUCCESS_ICON, self.palette.success));
    }

    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        println!("{} {message}", self.icon(INFO_ICON, self.palette.info));
    }

    /// Warnings survive `--quiet`.
    pub fn warn(&self, message: &str) {
        eprintln!("{} {message}", self.icon(WARNING_ICON, self.palette.warn));
    }

    /// Starts a spinner for a long-running stage. It is cleared by
    /// [`TaskGuard::finish`] or abandoned with a note when dropped early.
    pub fn task(&self, label: impl Into<String>) -> TaskGuard {
        let label = label.into();
        let pb = (!self.quiet).then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(self.spinner_style.clone());
            pb.set_prefix(self.icon(PROGRESS_ICON, self.palette.info));
            pb.set_message(label.clone());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });
        TaskGuard {
            label,
            start: Instant::now(),
            pb,
        }
    }

    fn icon(&self, icon: &str, style: Style) -> String {
        if self.paint {
            style.paint(icon).to_string()
        } else {
            icon.to_string()
        }
    }

    fn heading(&self, title: &str) {
        let formatted = if self.quiet {
            title.to_string()
        } else {
            format!("{HEADING_ICON} {title}")
        };
        if self.paint {
            println!("{}", self.palette.heading.paint(formatted));
        } else {
            println!("{formatted}");
        }
    }
}

pub struct TaskGuard {
    label: String,
    start: Instant,
    pb: Option<ProgressBar>,
}

impl TaskGuard {
    pub fn finish(mut self) -> Duration {
        if let Some(pb) = self.pb.take() {
            pb.finish_and_clear();
        }
        self.start.elapsed()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if let Some(pb) = self.pb.take() {
            pb.abandon_with_message(format!(
                "{} failed after {}",
                self.label,
                format_duration(self.start.elapsed())
            ));
        }
    }
}

pub fn format_duration(duration: Duration) -> String {
    if duration.as_secs_f64() >= 1.0 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{:.0}ms", duration.as_secs_f64() * 1_000.0)
    }
}

#[derive(Clone, Copy)]
struct Palette {
    heading: Style,
    key: Style,
    value: Style,
    info: Style,
    success: Style,
    warn: Style,
}

impl Palette {
    fn dark() -> Self {
        Self {
            heading: Style::new().fg(Color::Purple).bold(),
            key: Style::new().fg(Color::LightBlue).bold(),
            value: Style::new().fg(Color::White),
            info: Style::new().fg(Color::LightCyan),
            success: Style::new().fg(Color::LightGreen).bold(),
            warn: Style::new().fg(Color::Yellow).bold(),
        }
    }

    fn light() -> Self {
        Self {
            heading: Style::new().fg(Color::Blue).bold(),
            key: Style::new().fg(Color::Black).bold(),
            value: Style::new().fg(Color::Black),
            info: Style::new().fg(Color::Purple),
            success: Style::new().fg(Color::Green).bold(),
            warn: Style::new().fg(Color::Red).bold(),
        }
    }

    fn plain() -> Self {
        Self {
            heading: Style::new(),
            key: Style::new(),
            value: Style::new(),
            info: Style::new(),
            success: Style::new(),
            warn: Style::new(),
        }
    }
}

const HEADING_ICON: &str = "▸";
const SUCCESS_ICON: &str = "✔";
const WARNING_ICON: &str = "⚠";
const INFO_ICON: &str = "ℹ";
const PROGRESS_ICON: &str = "▶";
