//! Scripted stand-ins for the external collaborators, for unit tests.

use crate::error::{Error, Result};
use crate::model::ModelClient;
use crate::run::{CommandError, CommandOutput, RunOptions, Runner};
use crate::ui::{FileSelector, Prompter};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

/// records every command; fails those it was told to
#[derive(Default)]
pub struct FakeRunner {
    calls: RefCell<Vec<String>>,
    fail_all: bool,
    // command prefix -> remaining failures
    failures: RefCell<HashMap<String, usize>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    /// fail the next `times` commands starting with `prefix`
    pub fn fail_times(self, prefix: &str, times: usize) -> Self {
        self.failures.borrow_mut().insert(prefix.to_string(), times);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }
}

impl Runner for FakeRunner {
    fn run(
        &self,
        command: &str,
        _input: Option<&str>,
        _options: RunOptions,
    ) -> Result<CommandOutput, CommandError> {
        self.calls.borrow_mut().push(command.to_string());

        let scripted_failure = self
            .failures
            .borrow_mut()
            .iter_mut()
            .find(|(prefix, remaining)| command.starts_with(prefix.as_str()) && **remaining > 0)
            .map(|(_, remaining)| *remaining -= 1)
            .is_some();

        if self.fail_all || scripted_failure {
            return Err(CommandError::Failed {
                command: command.to_string(),
                code: Some(1),
                stderr: "scripted failure".to_string(),
            });
        }
        Ok(CommandOutput::default())
    }
}

/// answers questions from a script; running out behaves like ctrl-d
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    questions: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            questions: Vec::new(),
        }
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        self.questions.push(question.to_string());
        self.answers.pop_front().ok_or(Error::Cancelled)
    }
}

/// picks a fixed set of paths, or cancels
pub struct ScriptedSelector {
    choice: Option<Vec<String>>,
    offered: Vec<Vec<String>>,
}

impl ScriptedSelector {
    pub fn choosing<S: Into<String>>(paths: impl IntoIterator<Item = S>) -> Self {
        Self {
            choice: Some(paths.into_iter().map(Into::into).collect()),
            offered: Vec::new(),
        }
    }

    pub fn cancelling() -> Self {
        Self {
            choice: None,
            offered: Vec::new(),
        }
    }

    pub fn offered(&self) -> &[Vec<String>] {
        &self.offered
    }
}

impl FileSelector for ScriptedSelector {
    fn select(&mut self, candidates: &[String]) -> Result<Vec<String>> {
        self.offered.push(candidates.to_vec());
        self.choice.clone().ok_or(Error::Cancelled)
    }
}

/// replies from a script and records every request
pub struct FakeModel {
    responses: RefCell<VecDeque<String>>,
    calls: RefCell<Vec<(String, Vec<String>)>>,
}

impl FakeModel {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: RefCell::new(responses.into_iter().map(Into::into).collect()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.borrow().clone()
    }
}

impl ModelClient for FakeModel {
    fn complete(&self, system_prompt: &str, messages: &[String]) -> Result<String> {
        self.calls
            .borrow_mut()
            .push((system_prompt.to_string(), messages.to_vec()));
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| Error::Model("no scripted response left".to_string()))
    }
}
