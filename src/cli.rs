use crate::constants::MAX_FILE_DIFF_CHARS;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// diffweave: negotiate commit messages and pull request descriptions with an llm
#[derive(Parser, Debug)]
#[command(name = "diffweave", long_about = None, disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub commit: CommitArgs,

    /// path to the config file (default ~/.config/diffweave/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// print the prompts sent to the model
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// print drafts without the surrounding panel
    #[arg(long, global = true)]
    pub no_panel: bool,

    /// per-file diff size (chars) above which only a placeholder is sent
    #[arg(long, global = true, default_value_t = MAX_FILE_DIFF_CHARS)]
    pub max_file_diff: usize,
}

/// options for the default action: stage, generate, commit, push
#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct CommitArgs {
    /// use a simple message style instead of conventional commits
    #[arg(short, long)]
    pub simple: bool,

    /// generate a message for what's staged, print it and quit
    #[arg(long)]
    pub dry_run: bool,

    /// take the first generated message, commit and push without asking
    #[arg(long)]
    pub non_interactive: bool,

    /// open the url printed by `git push` (e.g. a new pull request) in the browser
    #[arg(long)]
    pub open: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// describe the current branch as a pull request against BASE
    Pr {
        /// branch or revision the pull request targets
        #[arg(default_value = "main")]
        base: String,

        /// take the first generated description without asking
        #[arg(long)]
        non_interactive: bool,

        /// open the repository's web page afterwards
        #[arg(long)]
        open: bool,
    },

    /// use an openai-compatible endpoint with a static api token
    SetTokenModel {
        /// model name to request
        model: String,

        /// base url of the api, e.g. https://api.openai.com/v1
        #[arg(short, long)]
        endpoint: String,

        /// api token
        #[arg(short, long)]
        token: String,
    },

    /// use a databricks serving endpoint, logging in through the browser
    SetBrowserModel {
        /// serving endpoint (model) name
        model: String,

        /// databricks account (workspace) name
        #[arg(short, long)]
        account: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
