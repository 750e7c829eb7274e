mod changeset;
mod cli;
mod config;
mod constants;
mod credentials;
mod error;
mod git;
mod model;
mod negotiate;
mod prompts;
mod remote;
mod run;
#[cfg(test)]
mod test_support;
mod ui;

use crate::cli::{Cli, Command};
use crate::config::ModelConfig;
use crate::credentials::CredentialResolver;
use crate::git::{StageMode, WorkingTree};
use crate::model::OpenAiClient;
use crate::negotiate::{NegotiateOptions, Negotiator};
use crate::prompts::PromptKind;
use crate::run::{ProcessRunner, RunOptions, Runner};
use crate::ui::{Prompter, Terminal};
use anyhow::{Context, Result, bail};
use num_format::{Locale, ToFormattedString};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

fn main() {
    if let Err(e) = run() {
        if error::is_cancelled(&e) {
            error!("cancelled");
            std::process::exit(130);
        }
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_path()?,
    };

    match &cli.command {
        Some(Command::SetTokenModel {
            model,
            endpoint,
            token,
        }) => configure(
            &config_path,
            &ModelConfig::Token {
                model_name: model.clone(),
                endpoint: endpoint.clone(),
                token: token.clone(),
            },
        ),
        Some(Command::SetBrowserModel { model, account }) => configure(
            &config_path,
            &ModelConfig::BrowserAccount {
                model_name: model.clone(),
                account: account.clone(),
            },
        ),
        Some(Command::Pr {
            base,
            non_interactive,
            open,
        }) => pull_request(&cli, &config_path, base, *non_interactive, *open),
        None => commit(&cli, &config_path),
    }
}

fn configure(path: &Path, config: &ModelConfig) -> Result<()> {
    config::save(path, config)
        .with_context(|| format!("failed to write {}", path.display()))?;
    status!("model [{}] configured", config.model_name());
    Ok(())
}

/// load the config and build a client for it, logging in if needed
fn connect(config_path: &Path) -> Result<OpenAiClient> {
    let config = config::load(config_path)?;
    let runner = ProcessRunner::new();
    let endpoint = CredentialResolver::new(&runner, credentials::default_token_cache()?)
        .resolve(&config, chrono::Utc::now())?;
    Ok(OpenAiClient::new(endpoint))
}

fn current_tree() -> Result<WorkingTree> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    Ok(git::locate_root(&cwd)?)
}

/// stage, generate, commit and (optionally) push
fn commit(cli: &Cli, config_path: &Path) -> Result<()> {
    let args = &cli.commit;
    let skip_interaction = args.dry_run || args.non_interactive;

    let client = connect(config_path)?;
    let tree = current_tree()?;
    let runner = ProcessRunner::in_dir(tree.root());
    let mut terminal = Terminal;

    let repo_status = runner.run("git status", None, RunOptions::shown())?;

    if !skip_interaction {
        git::stage(&tree, &runner, StageMode::Pick(&mut terminal))?;
    }

    let diffs = git::summarize_staged(&tree, cli.max_file_diff)?;
    if diffs.is_empty() {
        bail!("no staged changes to commit, quitting");
    }
    if cli.verbose {
        status!(
            "summarized staged changes ({} chars)",
            diffs.len().to_formatted_string(&Locale::en)
        );
    }

    let seed = format!("{}\n\n{}", repo_status.stdout, diffs);
    let context = if skip_interaction {
        String::new()
    } else {
        terminal
            .ask("any additional context for this commit? leave blank for none")?
            .trim()
            .to_string()
    };

    let kind = if args.simple {
        PromptKind::Simple
    } else {
        PromptKind::Conventional
    };
    let message = Negotiator::new(&client, prompts::system_prompt(kind), kind.draft_title())
        .verbose(cli.verbose)
        .negotiate(
            &seed,
            &context,
            &mut terminal,
            NegotiateOptions {
                return_first: skip_interaction,
                no_panel: cli.no_panel,
            },
        )?;

    if args.dry_run {
        return Ok(());
    }

    commit_with_retry(&runner, &message, || {
        git::stage(&tree, &runner, StageMode::All)
    })?;

    let push = skip_interaction
        || ui::confirm(&mut terminal, "push? <enter>/y for yes, anything else for no")?;
    if !push {
        return Ok(());
    }

    let output = runner.run("git push", None, RunOptions::shown())?;
    if let Some(url) = find_url(&output.combined()) {
        let open_it = args.open
            || (!skip_interaction
                && ui::confirm(&mut terminal, &format!("open {url}? <enter>/y for yes"))?);
        if open_it {
            open_in_browser(url);
        }
    }

    Ok(())
}

/// `git commit`, re-staging everything and retrying once if it fails
fn commit_with_retry(
    runner: &dyn Runner,
    message: &str,
    restage: impl FnOnce() -> error::Result<()>,
) -> Result<()> {
    let command = format!("git commit -m {}", shlex::try_quote(message)?);

    if let Err(e) = runner.run(&command, None, RunOptions::shown()) {
        warning!("commit failed ({}), re-staging and trying once more", e);
        restage().context("failed to re-stage changes")?;
        runner
            .run(&command, None, RunOptions::shown())
            .context("commit failed twice")?;
    }

    Ok(())
}

/// describe the current branch as a pull request against `base`
fn pull_request(
    cli: &Cli,
    config_path: &Path,
    base: &str,
    non_interactive: bool,
    open: bool,
) -> Result<()> {
    let client = connect(config_path)?;
    let tree = current_tree()?;
    let mut terminal = Terminal;

    let (log, diffs) = git::summarize_range(&tree, base, cli.max_file_diff)
        .with_context(|| format!("failed to compare against {base}"))?;
    if diffs.is_empty() {
        bail!("no changes between {base} and HEAD");
    }

    let branch = tree.branch().unwrap_or("HEAD");
    let seed = format!(
        "Pull request from `{branch}` into `{base}`.\n\nCommits:\n{log}\n\nDiff:\n{diffs}"
    );
    let context = if non_interactive {
        String::new()
    } else {
        terminal
            .ask("any additional context for this pull request? leave blank for none")?
            .trim()
            .to_string()
    };

    let kind = PromptKind::PullRequest;
    Negotiator::new(&client, prompts::system_prompt(kind), kind.draft_title())
        .verbose(cli.verbose)
        .negotiate(
            &seed,
            &context,
            &mut terminal,
            NegotiateOptions {
                return_first: non_interactive,
                no_panel: cli.no_panel,
            },
        )?;

    if let Some(url) = git::remote_url(&tree) {
        status!("repository: {}", url);
        if open {
            open_in_browser(&url);
        }
    }

    Ok(())
}

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid url pattern"));

/// first http(s) url in `text`, e.g. the "create a pull request" link from a push
fn find_url(text: &str) -> Option<&str> {
    URL_PATTERN.find(text).map(|m| m.as_str())
}

fn open_in_browser(url: &str) {
    if let Err(e) = open::that(url) {
        warning!("failed to open {}: {}", url, e);
    }
}
