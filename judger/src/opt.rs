use clap::{ArgEnum, Args, Parser, Subcommand};
use codecheck_judger::{model::Mode, BackendChoice};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(name = "codecheck", version, about)]
pub struct Opts {
    #[clap(subcommand)]
    pub cmd: SubCmd,

    /// Configuration file. Defaults are used when not given.
    #[clap(long, short, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCmd {
    /// Evaluate a single request and print its outcome as JSON
    #[clap(name = "eval")]
    Eval(EvalSubCmd),

    /// List supported languages and their judge ids
    #[clap(name = "languages")]
    Languages,
}

#[derive(Args, Debug, Clone)]
pub struct EvalSubCmd {
    /// The request to evaluate, as a JSON file. Use `-` to read from stdin.
    #[clap(value_name = "REQUEST")]
    pub request: PathBuf,

    /// Override the mode given in the request
    #[clap(long, arg_enum)]
    pub mode: Option<ModeArg>,

    /// Only use the local sandbox
    #[clap(long, conflicts_with = "remote-only")]
    pub local_only: bool,

    /// Only use the remote judge
    #[clap(long)]
    pub remote_only: bool,
}

impl EvalSubCmd {
    pub fn backends(&self) -> BackendChoice {
        match (self.local_only, self.remote_only) {
            (true, _) => BackendChoice::LocalOnly,
            (_, true) => BackendChoice::RemoteOnly,
            _ => BackendChoice::Both,
        }
    }
}

#[derive(ArgEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Run,
    Submit,
}

impl From<ModeArg> for Mode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Run => Mode::Run,
            ModeArg::Submit => Mode::Submit,
        }
    }
}
