//! Turns git remote urls into browsable https urls.

use regex::Regex;
use std::sync::LazyLock;

/// recognised remote syntaxes, tried in order
static REMOTE_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        // ssh://[user@]host[:port]/[~[user]/]path[.git][/], git://, http(s)://
        Regex::new(
            r"^(?:ssh|git|https?)://(?:[^@/]+@)?(?P<host>[^/:@]+)(?::[^/]*)?/(?:~[^/]*/)?(?P<path>[^/].*?)(?:\.git)?/?$",
        )
        .expect("valid url pattern"),
        // scp shorthand: [user@]host:path[.git], e.g. org-1234@github.com:owner/repo.git
        Regex::new(r"^(?:[^@/:]+@)?(?P<host>[^@/:]+):(?P<path>[^/:].*?)(?:\.git)?/?$")
            .expect("valid scp pattern"),
    ]
});

/// host and repository path extracted from a remote url
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub host: String,
    pub path: String,
}

impl Remote {
    pub fn web_url(&self) -> String {
        format!("https://{}/{}", self.host, self.path)
    }
}

/// `None` when `url` matches none of the known syntaxes
pub fn parse(url: &str) -> Option<Remote> {
    let url = url.trim();
    REMOTE_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.captures(url)?;
        Some(Remote {
            host: caps.name("host")?.as_str().to_string(),
            path: caps.name("path")?.as_str().to_string(),
        })
    })
}

pub fn web_url(url: &str) -> Option<String> {
    parse(url).map(|remote| remote.web_url())
}
