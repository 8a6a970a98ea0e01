//! Background sort jobs.
//!
//! A [`SortJob`] runs one [`SortEngine::transform`] on a dedicated thread and
//! reports back over a channel. The caller's thread never blocks unless it
//! asks to, which is what an interactive shell needs.
//!
//! Every job emits zero or more [`SortEvent::Progress`] events followed by
//! exactly one terminal event: [`SortEvent::Finished`] or
//! [`SortEvent::Failed`]. A panic inside the engine is caught and reported as
//! a failure, so the terminal event is delivered even then.

use super::engine::{CancelToken, SortEngine, SortError};
use super::params::SortParams;
use image::RgbImage;
use log::{error, info};
use std::any::Any;
use std::error::Error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Message from a running job.
#[derive(Debug)]
pub enum SortEvent {
    Progress(u8),
    Finished(RgbImage),
    Failed(SortFailure),
}

impl SortEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SortEvent::Progress(_))
    }
}

/// A failed job: the top-level message and the chain of underlying causes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortFailure {
    pub message: String,
    pub causes: Vec<String>,
}

impl SortFailure {
    /// Capture `err` and everything reachable through [`Error::source`].
    pub fn from_error(err: &(dyn Error + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: err.to_string(),
            causes,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.message == SortError::Cancelled.to_string()
    }
}

impl fmt::Display for SortFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for cause in &self.causes {
            write!(f, "\n  Caused by: {cause}")?;
        }
        Ok(())
    }
}

impl Error for SortFailure {}

impl From<SortError> for SortFailure {
    fn from(err: SortError) -> Self {
        Self::from_error(&err)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Handle to a sort running on its own thread.
///
/// Dropping the handle cancels the job and detaches the thread.
#[derive(Debug)]
pub struct SortJob {
    events: Receiver<SortEvent>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl SortJob {
    /// Start sorting a private copy of `image`.
    pub fn spawn(
        engine: SortEngine,
        image: &RgbImage,
        params: SortParams,
    ) -> Result<Self, SortError> {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let image = image.clone();

        let handle = thread::Builder::new()
            .name("pixsort-worker".to_string())
            .spawn(move || run(engine, image, params, token, tx))?;

        Ok(Self {
            events: rx,
            cancel,
            handle: Some(handle),
        })
    }

    /// The event stream. Ends after the terminal event.
    pub fn events(&self) -> &Receiver<SortEvent> {
        &self.events
    }

    /// Ask the worker to stop. It finishes its current line first and then
    /// reports [`SortError::Cancelled`] as a failure.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the job ends, forwarding each progress value.
    pub fn wait(mut self, mut on_progress: impl FnMut(u8)) -> Result<RgbImage, SortFailure> {
        let outcome = loop {
            match self.events.recv() {
                Ok(SortEvent::Progress(p)) => on_progress(p),
                Ok(SortEvent::Finished(image)) => break Ok(image),
                Ok(SortEvent::Failed(failure)) => break Err(failure),
                Err(_) => {
                    break Err(SortFailure {
                        message: "sort worker exited without a result".to_string(),
                        causes: Vec::new(),
                    });
                }
            }
        };
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        outcome
    }
}

impl Drop for SortJob {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
        }
    }
}

fn run(
    engine: SortEngine,
    image: RgbImage,
    params: SortParams,
    cancel: CancelToken,
    tx: Sender<SortEvent>,
) {
    let (width, height) = image.dimensions();
    info!(
        "sorting {width}x{height} by {} at {} degrees",
        params.criterion,
        params.angle.degrees()
    );
    execute(&tx, |on_progress| {
        engine.transform_with_cancel(&image, &params, &cancel, on_progress)
    });
}

/// Run `work` with a progress sink wired to `tx`, then send exactly one
/// terminal event, whether `work` returns or panics.
fn execute<F>(tx: &Sender<SortEvent>, work: F)
where
    F: FnOnce(&mut dyn FnMut(u8)) -> Result<RgbImage, SortError>,
{
    let start = Instant::now();
    let progress_tx = tx.clone();
    let mut forward = |p: u8| {
        // Receiver gone means nobody is listening; keep going quietly
        let _ = progress_tx.send(SortEvent::Progress(p));
    };
    let result = panic::catch_unwind(AssertUnwindSafe(|| work(&mut forward)));

    let event = match result {
        Ok(Ok(sorted)) => {
            info!(
                "sorted {}x{} in {:.2?}",
                sorted.width(),
                sorted.height(),
                start.elapsed()
            );
            SortEvent::Finished(sorted)
        }
        Ok(Err(err)) => {
            if matches!(err, SortError::Cancelled) {
                info!("sort cancelled after {:.2?}", start.elapsed());
            } else {
                error!("sort failed: {err}");
            }
            SortEvent::Failed(err.into())
        }
        Err(payload) => {
            let err = SortError::Worker(panic_message(payload.as_ref()));
            error!("{err}");
            SortEvent::Failed(err.into())
        }
    };
    let _ = tx.send(event);
}
