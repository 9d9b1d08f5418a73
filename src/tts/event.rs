use serde::Deserialize;

/// Raw event reported by the engine for one utterance. Indices are relative
/// to the text of that utterance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Start,
    Word {
        char_index: usize,
        #[serde(default)]
        length: Option<usize>,
    },
    End,
    Error {
        #[serde(default)]
        message: String,
    },
    Interrupted,
    Cancelled,
    /// Native pause; never requested by us but forwarded if an engine sends it.
    Pause,
    /// Native resume; never requested by us but forwarded if an engine sends it.
    Resume,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TtsError {
    /// Resume found nothing but whitespace left to read. The caller should
    /// move on to the next readable unit.
    ResumeWithEmptyContent,
    /// Engine failure that could not be recovered with the local voice.
    Engine(String),
}

impl TtsError {
    pub fn message(&self) -> &str {
        match self {
            TtsError::ResumeWithEmptyContent => "resume with empty content",
            TtsError::Engine(message) => message,
        }
    }
}

/// Event forwarded to the caller. Every index is relative to the full text
/// passed to `speak`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TtsEvent {
    Start { char_index: usize },
    Resume { char_index: usize },
    Word { char_index: usize, length: Option<usize> },
    End { char_index: usize },
    Pause { char_index: usize },
    Interrupted,
    Cancelled,
    Error(TtsError),
}
