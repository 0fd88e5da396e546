use crossbeam_channel::{Receiver, Sender};

use crate::errors::{SearchError, SearchResult};
use crate::search::MatchResult;

/// Somewhere units can push matches. Sending never blocks.
pub trait ResultSink: Send + Sync {
    fn send(&self, result: MatchResult) -> SearchResult<()>;
}

/// Writer half of the result channel; cloned once per unit
#[derive(Debug, Clone)]
pub struct ResultSender {
    inner: Sender<MatchResult>,
}

impl ResultSink for ResultSender {
    fn send(&self, result: MatchResult) -> SearchResult<()> {
        self.inner
            .send(result)
            .map_err(|_| SearchError::ChannelClosed)
    }
}

/// Reader half of the result channel.
///
/// Draining blocks until every [`ResultSender`] has been dropped, so it must
/// only happen after the producers have been joined.
#[derive(Debug)]
pub struct ResultChannel {
    inner: Receiver<MatchResult>,
}

impl ResultChannel {
    /// Results buffered so far
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Reads until every sender is gone
    pub fn drain(self) -> Vec<MatchResult> {
        self.into_iter().collect()
    }
}

impl IntoIterator for ResultChannel {
    type Item = MatchResult;
    type IntoIter = crossbeam_channel::IntoIter<MatchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

/// Creates an unbounded multi-writer channel
pub fn result_channel() -> (ResultSender, ResultChannel) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ResultSender { inner: tx }, ResultChannel { inner: rx })
}
