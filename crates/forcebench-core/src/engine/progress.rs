/// Progress events emitted by the evaluation workflow.
///
/// Phases are the coarse pipeline stages; within the model-extraction phase
/// a counted task advances once per evaluated model.
#[derive(Debug, Clone)]
pub enum Progress {
    /// A named pipeline phase begins.
    PhaseStart { name: &'static str },
    /// The current phase completed.
    PhaseFinish,

    /// A counted task begins.
    TaskStart { total_steps: u64 },
    /// One step of the current task completed.
    TaskAdvance,
    /// The current task completed.
    TaskFinish,

    /// A free-form status message.
    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Delivers progress events to an optional callback; with no callback
/// installed, reporting is a no-op.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
