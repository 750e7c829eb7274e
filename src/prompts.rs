/// which kind of description the model is asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// conventional commits (`type(scope): summary` plus body)
    Conventional,
    /// a short plain summary line plus optional bullets
    Simple,
    PullRequest,
}

impl PromptKind {
    /// title of the panel the draft is shown in
    pub fn draft_title(self) -> &'static str {
        match self {
            Self::Conventional | Self::Simple => "Generated commit message",
            Self::PullRequest => "Generated pull request description",
        }
    }
}

const SHARED_RULES: &str = r#"
You will receive the output of `git status` and the staged diff, one section per
file. Sections for very large files are replaced with "TOO LARGE TO SHOW"; infer
their purpose from the path and the rest of the change.

The user may add free-text context, and may show you earlier attempts they
REJECTED together with their feedback. Treat that feedback as binding.

Output ONLY the text itself: no preamble, no explanation, no code fences.
"#;

pub fn system_prompt(kind: PromptKind) -> String {
    let task = match kind {
        PromptKind::Conventional => CONVENTIONAL,
        PromptKind::Simple => SIMPLE,
        PromptKind::PullRequest => PULL_REQUEST,
    };
    let shared = match kind {
        PromptKind::PullRequest => PR_INPUT,
        _ => SHARED_RULES,
    };
    format!("{}\n\n{}", task.trim(), shared.trim())
}

const CONVENTIONAL: &str = r#"
YOU ARE A COMMIT MESSAGE GENERATOR using the Conventional Commits format.

FORMAT:
```
<type>(<optional scope>): <summary>

<body>
```

- type is one of: feat, fix, docs, style, refactor, perf, test, build, ci, chore, revert
- summary: imperative mood, lowercase, no trailing period, at most 72 characters
- body: wrap at 72 characters; explain what changed and why, not how
- use bullets in the body when the change touches several unrelated areas
- mark breaking changes with `!` after the type and a `BREAKING CHANGE:` footer
"#;

const SIMPLE: &str = r#"
YOU ARE A COMMIT MESSAGE GENERATOR.

FORMAT:
- line 1: a short summary of the change (at most 72 characters, imperative mood)
- line 2: blank (only if more lines follow)
- line 3+: optional bullets, one per notable change, each at most 72 characters

Focus on outcome, not implementation details. Prefer one good summary line over
a long list.
"#;

const PULL_REQUEST: &str = r#"
YOU WRITE PULL REQUEST DESCRIPTIONS.

FORMAT (markdown):
- first line: a concise title (at most 72 characters)
- a blank line, then a `## Summary` section: what the change does and why
- a `## Changes` section with one bullet per notable change
- a `## Testing` section if the diff adds or changes tests

Write for a reviewer who hasn't seen the branch. Don't invent motivation that
the commits and diff don't support.
"#;

const PR_INPUT: &str = r#"
You will receive the log of commits on the branch and the combined diff against
the base branch, one section per file. Sections for very large files are
replaced with "TOO LARGE TO SHOW".

The user may add free-text context, and may show you earlier attempts they
REJECTED together with their feedback. Treat that feedback as binding.

Output ONLY the description itself: no preamble and no code fences.
"#;
