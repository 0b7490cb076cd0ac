use crate::error::LogwatchError;
use crate::types::{Level, ParsedLogRecord};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    All,
    Playback,
    Error,
}

impl Category {
    pub fn accepts(&self, record: &ParsedLogRecord) -> bool {
        match self {
            Category::All => true,
            Category::Error => record.level == Level::Error,
            Category::Playback => is_playback(record),
        }
    }
}

impl FromStr for Category {
    type Err = LogwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Category::All),
            "playback" => Ok(Category::Playback),
            "error" => Ok(Category::Error),
            other => Err(LogwatchError::CommandError(format!("Unknown category: {}", other))),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::All => "all",
            Category::Playback => "playback",
            Category::Error => "error",
        })
    }
}

/// Which source server's records are shown. Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServerScope {
    #[default]
    All,
    Server(String),
}

impl ServerScope {
    pub fn accepts(&self, record: &ParsedLogRecord) -> bool {
        match self {
            ServerScope::All => true,
            ServerScope::Server(name) => record.server_name == *name,
        }
    }
}

impl From<&str> for ServerScope {
    fn from(value: &str) -> Self {
        match value {
            "all" | "" => ServerScope::All,
            name => ServerScope::Server(name.to_string()),
        }
    }
}

impl fmt::Display for ServerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerScope::All => f.write_str("all"),
            ServerScope::Server(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterCriteria {
    pub category: Category,
    pub server_scope: ServerScope,
}

impl FilterCriteria {
    pub fn new(category: Category, server_scope: ServerScope) -> Self {
        Self {
            category,
            server_scope,
        }
    }

    pub fn accepts(&self, record: &ParsedLogRecord) -> bool {
        self.category.accepts(record) && self.server_scope.accepts(record)
    }
}

/// A named test over a parsed message body that indicates media playback activity.
pub struct PlaybackSignal {
    pub name: &'static str,
    test: fn(&str) -> bool,
}

impl PlaybackSignal {
    pub fn matches(&self, body: &str) -> bool {
        (self.test)(body)
    }
}

fn streaming_path() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)/(emby/)?videos/.+/(stream|universal|original)(\.\w+)?")
            .expect("streaming path pattern is valid")
    })
}

fn manifest_file() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?i)(master|main)\.m3u8").expect("manifest pattern is valid"))
}

fn contains_any(body: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| body.contains(keyword))
}

fn has_streaming_path(body: &str) -> bool {
    streaming_path().is_match(body)
}

fn has_manifest_file(body: &str) -> bool {
    manifest_file().is_match(body)
}

fn has_redirect_keyword(body: &str) -> bool {
    contains_any(body, &["重定向", "Redirect"])
}

fn has_direct_play_keyword(body: &str) -> bool {
    contains_any(body, &["直链", "Direct", "本地", "Local", "播放", "Play"])
}

pub const STREAMING_PATH: PlaybackSignal = PlaybackSignal {
    name: "streaming-path",
    test: has_streaming_path,
};

pub const MANIFEST_FILE: PlaybackSignal = PlaybackSignal {
    name: "manifest-file",
    test: has_manifest_file,
};

pub const REDIRECT_KEYWORD: PlaybackSignal = PlaybackSignal {
    name: "redirect-keyword",
    test: has_redirect_keyword,
};

pub const DIRECT_PLAY_KEYWORD: PlaybackSignal = PlaybackSignal {
    name: "direct-play-keyword",
    test: has_direct_play_keyword,
};

/// Signals an `INFO` record must hit before anything else is considered.
pub const INFO_GATE: [PlaybackSignal; 2] = [STREAMING_PATH, MANIFEST_FILE];

/// Full signal set, tested in order.
pub const PLAYBACK_SIGNALS: [PlaybackSignal; 4] =
    [REDIRECT_KEYWORD, DIRECT_PLAY_KEYWORD, STREAMING_PATH, MANIFEST_FILE];

/// Name of the first playback signal that accepts `record`, if any.
pub fn playback_signal(record: &ParsedLogRecord) -> Option<&'static str> {
    let body = record.body.as_str();

    if record.level == Level::Info && !INFO_GATE.iter().any(|signal| signal.matches(body)) {
        return None;
    }

    PLAYBACK_SIGNALS
        .iter()
        .find(|signal| signal.matches(body))
        .map(|signal| signal.name)
}

pub fn is_playback(record: &ParsedLogRecord) -> bool {
    playback_signal(record).is_some()
}
