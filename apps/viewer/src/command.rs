use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use stock::{MovingAverage, QuickRange};

pub const HELP: &str = "\
commands:
  symbol <ticker>      set the symbol
  start <YYYY-MM-DD>   set the start date (blank = one year ago)
  end <YYYY-MM-DD>     set the end date (blank = today)
  interval <value>     1d, 1wk, 1mo, 1h, 30m, 15m, 5m, 1m
  range <preset>       1M, 3M, 6M, YTD, 1Y, 5Y, Max (fetches)
  ma <5|20|50|200>     toggle a moving average (fetches)
  refresh | load       fetch with the current inputs
  save <path.png>      export the chart
  show                 print the current inputs
  help                 this text
  quit                 exit";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Symbol(String),
    Start(String),
    End(String),
    Interval(String),
    Range(QuickRange),
    Toggle(MovingAverage),
    Refresh,
    Save(PathBuf),
    Show,
    Help,
    Quit,
}

impl Command {
    /// `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "symbol" | "s" => Command::Symbol(arg.to_string()),
            "start" => Command::Start(arg.to_string()),
            "end" => Command::End(arg.to_string()),
            "interval" | "i" => Command::Interval(arg.to_string()),
            "range" | "r" => Command::Range(arg.parse()?),
            "ma" => {
                let window: usize = arg
                    .trim_start_matches(|c| c == 'm' || c == 'M' || c == 'a' || c == 'A')
                    .parse()
                    .with_context(|| format!("'{arg}' is not a moving-average window"))?;
                let ma = MovingAverage::from_window(window)
                    .ok_or_else(|| anyhow!("no MA{window} overlay; choose 5, 20, 50 or 200"))?;
                Command::Toggle(ma)
            }
            "refresh" | "load" => Command::Refresh,
            "save" => {
                if arg.is_empty() {
                    bail!("save needs a file path");
                }
                Command::Save(PathBuf::from(arg))
            }
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => bail!("unknown command '{other}'; type help"),
        };

        Ok(Some(command))
    }
}
