use std::cell::RefCell;
use std::rc::Rc;

use super::{SpeechEngine, SpeechOptions, UtteranceId};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SpokenUtterance {
    pub(crate) id: UtteranceId,
    pub(crate) text: String,
    pub(crate) options: SpeechOptions,
}

#[derive(Debug, Default)]
pub(crate) struct EngineLog {
    pub(crate) spoken: Vec<SpokenUtterance>,
    pub(crate) stops: usize,
}

/// Recording engine for tests; events are fed back by the test itself.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockEngine {
    pub(crate) log: Rc<RefCell<EngineLog>>,
}

impl MockEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn last(&self) -> Option<SpokenUtterance> {
        self.log.borrow().spoken.last().cloned()
    }

    pub(crate) fn spoken_count(&self) -> usize {
        self.log.borrow().spoken.len()
    }

    pub(crate) fn stops(&self) -> usize {
        self.log.borrow().stops
    }
}

impl SpeechEngine for MockEngine {
    fn speak(&mut self, utterance: UtteranceId, text: &str, options: &SpeechOptions) {
        self.log.borrow_mut().spoken.push(SpokenUtterance {
            id: utterance,
            text: text.to_string(),
            options: options.clone(),
        });
    }

    fn stop(&mut self) {
        self.log.borrow_mut().stops += 1;
    }
}
