use clap::Parser;

use crate::error::ErrorKind;
use crate::stats::StatSelector;

/// The seven flags the interpreter's external interface defines.
/// `--help` is deliberately a plain bool rather than clap's built-in
/// help flag: it has bespoke "exclusive with every other flag" semantics
/// that clap's automatic `--help` doesn't express.
#[derive(Parser, Debug)]
#[command(name = "ippcode22", disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    #[arg(long)]
    pub help: bool,

    #[arg(long, value_name = "PATH")]
    pub source: Option<String>,

    #[arg(long, value_name = "PATH")]
    pub input: Option<String>,

    #[arg(long, value_name = "PATH")]
    pub stats: Option<String>,

    #[arg(long)]
    pub insts: bool,

    #[arg(long)]
    pub hot: bool,

    #[arg(long)]
    pub vars: bool,
}

pub const USAGE: &str = "\
ippcode22: interpret an IPPcode22 program delivered as XML

USAGE:
    ippcode22 [--source=PATH] [--input=PATH] [--stats=PATH [--insts] [--hot] [--vars]]
    ippcode22 --help

At least one of --source/--input is required. --stats is required whenever
--insts, --hot, or --vars is given.
";

impl Cli {
    /// Rejects argument combinations the clap-level parse can't express:
    /// `--help` alongside anything else, missing source+input, and any
    /// selector without `--stats`.
    pub fn validate(&self, raw_args: &[String]) -> Result<(), ErrorKind> {
        if self.help {
            if raw_args.len() > 2 {
                return Err(ErrorKind::BadArg(
                    "--help must not be combined with other arguments".to_string(),
                ));
            }
            return Ok(());
        }
        if self.source.is_none() && self.input.is_none() {
            return Err(ErrorKind::BadArg(
                "at least one of --source or --input is required".to_string(),
            ));
        }
        if (self.insts || self.hot || self.vars) && self.stats.is_none() {
            return Err(ErrorKind::BadArg(
                "--insts/--hot/--vars require --stats".to_string(),
            ));
        }
        Ok(())
    }

    /// The statistics selectors in the order they appeared on the raw
    /// command line. clap's parsed struct loses that order, so this
    /// re-scans the original argv directly.
    pub fn selector_order(raw_args: &[String]) -> Vec<StatSelector> {
        raw_args
            .iter()
            .filter_map(|a| match a.as_str() {
                "--insts" => Some(StatSelector::Insts),
                "--hot" => Some(StatSelector::Hot),
                "--vars" => Some(StatSelector::Vars),
                _ => None,
            })
            .collect()
    }
}
