use crate::constants::DISPLAY_LIMIT_CHARS;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("could not parse command line: {0}")]
    Unparseable(String),

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("i/o error while running `{command}`: {source}")]
    Io {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` failed ({}){}", exit_description(.code), stderr_suffix(.stderr))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "killed by signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// captured output, trailing whitespace trimmed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// stdout and stderr joined, for scanning push output and the like
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// print the captured output after the command finishes
    pub show_output: bool,
    /// don't echo the command line (or anything else)
    pub silent: bool,
    /// inherit stdio instead of capturing it (interactive children)
    pub passthrough: bool,
}

impl RunOptions {
    pub fn shown() -> Self {
        Self {
            show_output: true,
            ..Self::default()
        }
    }

    pub fn passthrough() -> Self {
        Self {
            passthrough: true,
            ..Self::default()
        }
    }
}

/// anything that can run an external command line
pub trait Runner {
    fn run(
        &self,
        command: &str,
        input: Option<&str>,
        options: RunOptions,
    ) -> Result<CommandOutput, CommandError>;
}

/// runs commands as child processes (no shell, words split with shell rules)
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    cwd: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_dir(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: Some(cwd.into()),
        }
    }
}

impl Runner for ProcessRunner {
    fn run(
        &self,
        command: &str,
        input: Option<&str>,
        options: RunOptions,
    ) -> Result<CommandOutput, CommandError> {
        let words = shlex::split(command)
            .ok_or_else(|| CommandError::Unparseable(command.to_string()))?;
        let (program, args) = words.split_first().ok_or(CommandError::Empty)?;

        if !options.silent {
            let _ = echo_command(&mut io::stdout(), command);
        }

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        if options.passthrough {
            let status = cmd.status().map_err(|source| CommandError::Spawn {
                program: program.clone(),
                source,
            })?;
            if !status.success() {
                return Err(CommandError::Failed {
                    command: command.to_string(),
                    code: status.code(),
                    stderr: String::new(),
                });
            }
            return Ok(CommandOutput::default());
        }

        let stdin = if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        let mut child = cmd
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: program.clone(),
                source,
            })?;

        // stdin is written on its own thread while output is drained; dropping it sends eof
        let writer = match (input, child.stdin.take()) {
            (Some(text), Some(mut stdin)) => {
                let text = text.to_string();
                Some(thread::spawn(move || stdin.write_all(text.as_bytes())))
            }
            _ => None,
        };

        let output = child
            .wait_with_output()
            .map_err(|source| CommandError::Io {
                command: command.to_string(),
                source,
            })?;

        if let Some(writer) = writer {
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            // a child that exits without reading everything closes the pipe early
            if let Err(source) = written
                && source.kind() != io::ErrorKind::BrokenPipe
            {
                return Err(CommandError::Io {
                    command: command.to_string(),
                    source,
                });
            }
        }

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout)
                .trim_end()
                .to_string(),
            stderr: String::from_utf8_lossy(&output.stderr)
                .trim_end()
                .to_string(),
        };

        if !output.status.success() {
            return Err(CommandError::Failed {
                command: command.to_string(),
                code: output.status.code(),
                stderr: result.stderr,
            });
        }

        if !options.silent {
            let _ = echo_output(&mut io::stdout(), &result, options.show_output);
        }

        Ok(result)
    }
}

fn echo_command(out: &mut impl Write, command: &str) -> io::Result<()> {
    use colored::Colorize;
    writeln!(out, "{}", format!("$> {command}").dimmed())
}

/// print a command's output, cut down to the display limit
fn echo_output(out: &mut impl Write, output: &CommandOutput, show_output: bool) -> io::Result<()> {
    use colored::Colorize;

    if !show_output {
        return writeln!(out, "{}", "(result truncated)".dimmed());
    }

    let combined = output.combined();
    let (shown, truncated) = preview(&combined, DISPLAY_LIMIT_CHARS);
    if !shown.is_empty() {
        writeln!(out, "{shown}")?;
    }
    if truncated {
        writeln!(out, "{}", "(result truncated)".dimmed())?;
    }
    Ok(())
}

/// the first `limit` chars of `text`, and whether anything was cut
pub fn preview(text: &str, limit: usize) -> (&str, bool) {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}
