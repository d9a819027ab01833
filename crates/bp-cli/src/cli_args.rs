use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "branchpage")]
#[command(about = "Page-based interactive fiction player and checker")]
pub(crate) struct Cli {
    /// Log filter for stderr, e.g. `debug` or `bp_runtime=trace`.
    #[arg(long = "log-level", global = true)]
    pub(crate) log_level: Option<String>,
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Tui(TuiArgs),
    Check(CheckArgs),
    Render(RenderArgs),
    Graph(GraphArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Choose(ChooseArgs),
    Continue(ContinueArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "story-dir")]
    pub(crate) story_dir: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "choice")]
    pub(crate) choice: char,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ContinueArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct TuiArgs {
    #[arg(long = "story-dir")]
    pub(crate) story_dir: String,
    #[arg(long = "state-file")]
    pub(crate) state_file: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "story-dir")]
    pub(crate) story_dir: String,
    /// Treat warnings as failures.
    #[arg(long = "strict")]
    pub(crate) strict: bool,
}

#[derive(Debug, Args)]
pub(crate) struct RenderArgs {
    #[arg(long = "story-dir")]
    pub(crate) story_dir: String,
    #[arg(long = "page")]
    pub(crate) page: String,
    /// Variables as a JSON object, e.g. `{"coins":3,"hasKey":true}`.
    #[arg(long = "vars")]
    pub(crate) vars: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct GraphArgs {
    #[arg(long = "story-dir")]
    pub(crate) story_dir: String,
}
