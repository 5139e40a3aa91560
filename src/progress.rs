//! Optional progress reporting for the image pipeline.

/// Pipeline stage being entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Decoding the source image.
    Loading,
    /// Waiting on the translation service.
    Translating,
    /// Translation served from the cache.
    Cached,
    /// Looking for bubbles.
    Detecting,
    /// Erasing bubbles and drawing text.
    Compositing,
    /// Finished.
    Done,
}

impl Stage {
    /// Rough completion percentage at the start of the stage.
    #[must_use]
    pub fn percent(self) -> u8 {
        match self {
            Self::Loading => 10,
            Self::Translating => 35,
            Self::Cached => 50,
            Self::Detecting => 75,
            Self::Compositing => 85,
            Self::Done => 100,
        }
    }
}

/// A progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Stage being entered.
    pub stage: Stage,
    /// Completion percentage.
    pub percent: u8,
}

impl From<Stage> for ProgressEvent {
    fn from(stage: Stage) -> Self {
        Self {
            stage,
            percent: stage.percent(),
        }
    }
}

/// Receiver of progress updates. Reporting never affects the pipeline.
pub trait ProgressSink: Sync {
    /// Called on entering each stage.
    fn report(&self, event: ProgressEvent);
}

/// Sink that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closures_collect_events() {
        let seen = Mutex::new(Vec::new());
        let sink = |e: ProgressEvent| seen.lock().unwrap().push(e.percent);
        sink.report(Stage::Translating.into());
        sink.report(Stage::Done.into());
        assert_eq!(*seen.lock().unwrap(), vec![35, 100]);
    }

    #[test]
    fn channel_backed_sink() {
        let (tx, rx) = std::sync::mpsc::channel();
        let sink = move |e: ProgressEvent| {
            let _ = tx.send(e);
        };
        sink.report(Stage::Loading.into());
        assert_eq!(rx.recv().unwrap().stage, Stage::Loading);
        NoProgress.report(Stage::Done.into());
    }
}
