use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread::JoinHandle,
};

use crate::{
    config::engine::EngineConfig,
    export::{
        pipeline::export,
        request::{Artifact, ExportRequest},
    },
    foundation::error::{FocalError, FocalResult},
    model::set::ImageSet,
};

/// Cooperative cancellation flag shared between the caller and a running export.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// `true` once any clone was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Forwards progress to a callback, clamped to `[0, 1]` and never decreasing.
pub struct ProgressReporter<'a> {
    sink: &'a mut dyn FnMut(f64),
    last: Option<f64>,
}

impl<'a> ProgressReporter<'a> {
    /// Wrap a raw progress callback.
    pub fn new(sink: &'a mut dyn FnMut(f64)) -> Self {
        Self { sink, last: None }
    }

    /// Report `value`; repeats and regressions are swallowed.
    pub fn report(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        let v = value.clamp(0.0, 1.0);
        match self.last {
            Some(last) if v <= last => {}
            _ => {
                self.last = Some(v);
                (self.sink)(v);
            }
        }
    }

    /// Last value forwarded, if any.
    pub fn last(&self) -> Option<f64> {
        self.last
    }
}

/// An export running on a worker thread.
pub struct ExportHandle {
    progress: mpsc::Receiver<f64>,
    cancel: CancelToken,
    join: JoinHandle<FocalResult<Artifact>>,
}

impl ExportHandle {
    /// Progress notifications in `[0, 1]`, non-decreasing.
    pub fn progress(&self) -> &mpsc::Receiver<f64> {
        &self.progress
    }

    /// Ask the export to stop; it ends with [`FocalError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token cancelling this export.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// `true` once the worker has returned.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Block until the export ends.
    pub fn wait(self) -> FocalResult<Artifact> {
        self.join
            .join()
            .map_err(|_| FocalError::encoding_failed("export worker panicked"))?
    }
}

/// Run [`export`] on a worker thread over a snapshot of `set`.
pub fn spawn_export(set: ImageSet, cfg: EngineConfig, req: ExportRequest) -> FocalResult<ExportHandle> {
    let (tx, progress) = mpsc::channel();
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let join = std::thread::Builder::new()
        .name("focalloop-export".into())
        .spawn(move || {
            let mut send = |p: f64| {
                // The caller may have dropped the receiver; progress is advisory.
                let _ = tx.send(p);
            };
            export(&set, &cfg, &req, &worker_cancel, &mut send)
        })
        .map_err(|e| FocalError::encoding_failed(format!("spawn export worker: {e}")))?;
    Ok(ExportHandle {
        progress,
        cancel,
        join,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/export/control.rs"]
mod tests;
