use crate::error::{Error, Result};
use std::io::{self, Write};

#[macro_export]
macro_rules! warning {
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!($fmt $(, $($arg)*)?).yellow());
    }};
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!("{}", $expr).yellow());
    }};
}

#[macro_export]
macro_rules! error {
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!($fmt $(, $($arg)*)?).red());
    }};
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stderr(), "{}", format!("{}", $expr).red());
    }};
}

#[macro_export]
macro_rules! status {
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", format!($fmt $(, $($arg)*)?).green());
    }};
    ($expr:expr) => {{
        use colored::Colorize;
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", format!("{}", $expr).green());
    }};
}

#[macro_export]
macro_rules! info {
    () => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout());
    }};
    ($fmt:literal $(, $($arg:tt)*)?) => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), $fmt $(, $($arg)*)?);
    }};
    ($expr:expr) => {{
        use std::io::{self, Write};
        let _ = writeln!(io::stdout(), "{}", $expr);
    }};
}

/// free-text questions asked of the user
pub trait Prompter {
    /// show `question` and read one line; ctrl-c / ctrl-d give `Error::Cancelled`
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// picks a subset of candidate paths to stage
pub trait FileSelector {
    fn select(&mut self, candidates: &[String]) -> Result<Vec<String>>;
}

/// the real terminal: rustyline for text, crossterm for the checklist
#[derive(Debug, Default)]
pub struct Terminal;

impl Prompter for Terminal {
    fn ask(&mut self, question: &str) -> Result<String> {
        use colored::Colorize;
        use rustyline::DefaultEditor;
        use rustyline::error::ReadlineError;

        info!("{}", question.yellow());

        let mut editor =
            DefaultEditor::new().map_err(|e| Error::Prompt(format!("line editor: {e}")))?;
        match editor.readline("> ") {
            Ok(line) => Ok(line),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Err(Error::Cancelled),
            Err(e) => Err(Error::Prompt(e.to_string())),
        }
    }
}

impl FileSelector for Terminal {
    fn select(&mut self, candidates: &[String]) -> Result<Vec<String>> {
        select_multiple(candidates)
    }
}

/// ask a yes/no question where enter means yes
pub fn confirm(prompter: &mut dyn Prompter, question: &str) -> Result<bool> {
    let answer = prompter.ask(question)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "" | "y" | "yes"
    )
}

/// checklist over `items`: up/down to move, space to toggle, `a` for all, enter to accept
fn select_multiple(items: &[String]) -> Result<Vec<String>> {
    use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

    if items.is_empty() {
        return Ok(Vec::new());
    }

    status!("select files to stage ([space] toggle, [a] all, [enter] confirm, [esc] cancel):");

    enable_raw_mode().map_err(|e| Error::Prompt(format!("interactive terminal required: {e}")))?;
    let result = checklist_loop(items);
    disable_raw_mode().ok();

    let chosen = result?;
    for path in &chosen {
        info!("  + {}", path);
    }
    Ok(chosen)
}

fn checklist_loop(items: &[String]) -> Result<Vec<String>> {
    use crossterm::cursor::MoveUp;
    use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
    use crossterm::queue;

    let mut stdout = io::stdout();
    let mut picked = vec![false; items.len()];
    let mut cursor = 0;
    let height = u16::try_from(items.len()).unwrap_or(u16::MAX);

    loop {
        render_checklist(&mut stdout, items, &picked, cursor)?;

        if let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        {
            match code {
                KeyCode::Esc => return Err(Error::Cancelled),
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    return Err(Error::Cancelled);
                }
                KeyCode::Up | KeyCode::Char('k') => cursor = cursor.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => cursor = (cursor + 1).min(items.len() - 1),
                KeyCode::Char(' ') => picked[cursor] = !picked[cursor],
                KeyCode::Char('a') => {
                    let all = picked.iter().all(|p| *p);
                    picked.iter_mut().for_each(|p| *p = !all);
                }
                KeyCode::Enter => {
                    return Ok(items
                        .iter()
                        .zip(&picked)
                        .filter(|(_, picked)| **picked)
                        .map(|(item, _)| item.clone())
                        .collect());
                }
                _ => {}
            }
        }

        // redraw in place
        queue!(stdout, MoveUp(height))?;
    }
}

fn render_checklist(
    out: &mut impl Write,
    items: &[String],
    picked: &[bool],
    cursor: usize,
) -> Result<()> {
    use colored::Colorize;
    use crossterm::queue;
    use crossterm::terminal::{Clear, ClearType};

    for (idx, item) in items.iter().enumerate() {
        let mark = if picked[idx] { "[x]" } else { "[ ]" };
        let line = format!("{mark} {item}");
        let line = if idx == cursor {
            format!("> {}", line.bold())
        } else {
            format!("  {line}")
        };
        queue!(out, Clear(ClearType::CurrentLine))?;
        // raw mode needs explicit carriage returns
        write!(out, "\r{line}\r\n")?;
    }
    out.flush()?;
    Ok(())
}

/// print a generated draft, boxed under `title` unless `bare`
pub fn show_draft(title: &str, draft: &str, bare: bool) {
    use colored::Colorize;

    if bare {
        info!(draft);
        return;
    }

    let width = draft
        .lines()
        .map(|line| line.chars().count())
        .chain(std::iter::once(title.chars().count() + 2))
        .max()
        .unwrap_or(0);

    info!();
    info!("{}", format!("╭─ {title} {}╮", "─".repeat(width - title.chars().count() - 1)).cyan());
    for line in draft.lines() {
        let pad = width - line.chars().count();
        info!("{} {line}{} {}", "│".cyan(), " ".repeat(pad), "│".cyan());
    }
    info!("{}", format!("╰{}╯", "─".repeat(width + 2)).cyan());
    info!();
}

/// run `work` behind a spinner with `message`
pub fn with_spinner<T>(message: &str, work: impl FnOnce() -> T) -> T {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::Duration;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = work();

    spinner.finish_and_clear();
    result
}
