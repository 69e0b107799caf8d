//! Line-oriented interactive front end over a [`Session`].

use crate::config::{MissingStrategy, OutlierMethod, parse_optional};
use crate::dataset::EXPORT_MIME_TYPE;
use crate::error::Result;
use crate::reporting::NO_NUMERIC_COLUMNS_NOTE;
use crate::session::Session;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

pub const PROMPT: &str = "datawash> ";

pub const HELP: &str = "\
Commands:
  load <path>                     load a .csv, .xlsx or .xls file
  missing <none|drop|mean|median|mode>
                                  choose how missing values are handled
  outliers <none|iqr|zscore>      choose how outlier rows are removed
  threshold <iqr|zscore> <value>  set the IQR multiplier or z-score cutoff
  preview                         show the first rows of the current data
  eda                             print the exploratory data analysis
  heatmap <file.svg>              write the correlation heatmap as SVG
  export [dir]                    write the current data as CSV
  status                          show the session state
  help                            show this message
  quit | exit                     leave the shell";

/// Which threshold a `threshold` command changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdKind {
    Iqr,
    ZScore,
}

/// One parsed shell command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(PathBuf),
    Missing(Option<MissingStrategy>),
    Outliers(Option<OutlierMethod>),
    Threshold(ThresholdKind, f64),
    Preview,
    Eda,
    Heatmap(PathBuf),
    Export(Option<PathBuf>),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let require = |what: &str| {
            if rest.is_empty() {
                Err(format!("'{}' needs {}", name, what))
            } else {
                Ok(rest)
            }
        };

        match name.to_ascii_lowercase().as_str() {
            "load" => Ok(Self::Load(PathBuf::from(require("a file path")?))),
            "missing" => parse_optional(require("a strategy")?).map(Self::Missing),
            "outliers" => parse_optional(require("a method")?).map(Self::Outliers),
            "threshold" => {
                let mut parts = require("a method and a value")?.split_whitespace();
                let kind = match parts.next().map(str::to_ascii_lowercase).as_deref() {
                    Some("iqr") => ThresholdKind::Iqr,
                    Some("zscore") | Some("z-score") | Some("z") => ThresholdKind::ZScore,
                    _ => return Err("usage: threshold <iqr|zscore> <value>".to_string()),
                };
                let value = parts
                    .next()
                    .ok_or_else(|| "usage: threshold <iqr|zscore> <value>".to_string())?
                    .parse::<f64>()
                    .map_err(|e| format!("invalid threshold: {}", e))?;
                Ok(Self::Threshold(kind, value))
            }
            "preview" => Ok(Self::Preview),
            "eda" | "report" => Ok(Self::Eda),
            "heatmap" => Ok(Self::Heatmap(PathBuf::from(require("an output .svg path")?))),
            "export" => Ok(Self::Export((!rest.is_empty()).then(|| PathBuf::from(rest)))),
            "status" => Ok(Self::Status),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("unknown command '{}' (type 'help')", other)),
        }
    }
}

/// Reads commands from `input`, writes responses to `output`.
pub struct Shell<R, W> {
    session: Session,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(session: Session, input: R, output: W) -> Self {
        Self {
            session,
            input,
            output,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    /// Run until `quit`, `exit` or end of input. Command errors are printed
    /// and the loop continues with the last good state.
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "datawash interactive mode. Type 'help' for commands.")?;
        let mut line = String::new();
        loop {
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                return Ok(());
            }
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(message) => {
                    writeln!(self.output, "Error: {}", message)?;
                    continue;
                }
            };
            debug!("Shell command: {:?}", command);
            if command == Command::Quit {
                return Ok(());
            }

            match self.execute(command) {
                Ok(message) => writeln!(self.output, "{}", message.trim_end())?,
                Err(e) => {
                    if !e.is_recoverable() {
                        warn!("Command failed [{}]: {}", e.error_code(), e);
                    }
                    writeln!(self.output, "Error: {}", e)?
                }
            }
        }
    }

    /// Run one command against the session and describe the outcome.
    pub fn execute(&mut self, command: Command) -> Result<String> {
        let session = &mut self.session;
        match command {
            Command::Load(path) => {
                let dataset = session.load(&path)?;
                let (rows, cols) = dataset.shape();
                let mut message = format!(
                    "Loaded {} ({} rows x {} columns)",
                    path.display(),
                    rows,
                    cols
                );
                for step in session.processing_steps() {
                    message.push_str(&format!("\n  - {}", step));
                }
                Ok(message)
            }
            Command::Missing(strategy) => {
                session.set_missing_strategy(strategy)?;
                Ok(Self::describe_change(session, "Missing-value strategy"))
            }
            Command::Outliers(method) => {
                session.set_outlier_method(method)?;
                Ok(Self::describe_change(session, "Outlier method"))
            }
            Command::Threshold(ThresholdKind::Iqr, value) => {
                session.set_iqr_multiplier(value)?;
                Ok(Self::describe_change(session, "IQR multiplier"))
            }
            Command::Threshold(ThresholdKind::ZScore, value) => {
                session.set_zscore_threshold(value)?;
                Ok(Self::describe_change(session, "Z-score threshold"))
            }
            Command::Preview => Ok(session.preview()?.render_text()),
            Command::Eda => Ok(session.run_eda()?.render_text()),
            Command::Heatmap(path) => Ok(match session.write_heatmap(&path)? {
                Some(written) => format!("Heatmap written to {}", written.display()),
                None => NO_NUMERIC_COLUMNS_NOTE.to_string(),
            }),
            Command::Export(dir) => {
                let path = session.export(dir.as_deref())?;
                Ok(format!("Exported {} ({})", path.display(), EXPORT_MIME_TYPE))
            }
            Command::Status => Ok(session.status().to_string()),
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok(String::new()),
        }
    }

    fn describe_change(session: &Session, what: &str) -> String {
        let mut message = format!("{} updated.", what);
        if let Some(current) = session.current() {
            let (rows, cols) = current.shape();
            message.push_str(&format!(" Current data: {} rows x {} columns", rows, cols));
            for step in session.processing_steps() {
                message.push_str(&format!("\n  - {}", step));
            }
        }
        message
    }
}
