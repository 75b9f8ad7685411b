// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan session — one request from the calling application, end to end.
//
// Flow: resolve the request kind, check the device can scan, present the
// capture UI (one await per attempt), classify failures, offer at most
// `max_capture_retries` retries, then hand the pages to the result pipeline on
// the blocking pool.
//
// At most one request is in flight. A new request supersedes the previous one:
// the older caller is answered with `ScanError::Superseded` immediately, its
// pipeline run is cancelled at the next page boundary, and nothing it produced
// reaches the documents directory.

use std::sync::{Arc, Mutex, PoisonError};

use pagescan_core::error::{Result, ScanError};
use pagescan_core::human_errors::humanize_error;
use pagescan_core::{
    FailureClass, OutputRequest, RequestId, RunToken, ScanArtifact, ScanConfig,
};
use pagescan_document::{CancelFlag, Page, ScanPipeline};
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::classify::{FailureClassifier, PatternClassifier};
use crate::traits::{CaptureOutcome, RetryPrompt, ScanAcquisition};

type Responder = oneshot::Sender<Result<ScanArtifact>>;
type Clock = Box<dyn Fn() -> RunToken + Send + Sync>;

/// The response binding of the request currently in flight.
struct PendingRequest {
    id: RequestId,
    request: OutputRequest,
    responder: Responder,
    cancel: CancelFlag,
}

/// Holds the single in-flight request context.
#[derive(Default)]
struct InFlight {
    current: Mutex<Option<PendingRequest>>,
}

impl InFlight {
    /// Bind `pending` as the current request, answering any previous one with
    /// `Superseded`.
    fn begin(&self, pending: PendingRequest) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(pending);

        if let Some(previous) = previous {
            warn!(request_id = %previous.id, request = %previous.request, "superseding in-flight scan request");
            previous.cancel.cancel();
            let _ = previous.responder.send(Err(ScanError::Superseded));
        }
    }

    /// Drop the binding for `id` if it is still current, cancelling its run.
    fn abandon(&self, id: RequestId) {
        let pending = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take_if(|pending| pending.id == id);

        if let Some(pending) = pending {
            debug!(request_id = %id, "scan request abandoned by its caller");
            pending.cancel.cancel();
        }
    }

    /// Deliver `outcome` if `id` is still the current request.
    ///
    /// Returns `false` when the request was superseded; the outcome is dropped.
    fn complete(&self, id: RequestId, outcome: Result<ScanArtifact>) -> bool {
        let pending = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take_if(|pending| pending.id == id);

        match pending {
            Some(pending) => {
                let _ = pending.responder.send(outcome);
                true
            }
            None => {
                debug!(request_id = %id, "dropping outcome of superseded request");
                false
            }
        }
    }

    fn current_request(&self) -> Option<OutputRequest> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|pending| pending.request)
    }
}

/// Clears a request's binding when its `scan` future goes away early.
struct AbandonOnDrop<'a> {
    in_flight: &'a InFlight,
    id: RequestId,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        self.in_flight.abandon(self.id);
    }
}

/// Orchestrates scan requests against one acquisition collaborator.
pub struct ScanSession<A, P> {
    acquisition: A,
    prompt: P,
    classifier: Box<dyn FailureClassifier>,
    pipeline: Arc<ScanPipeline>,
    clock: Clock,
    max_capture_retries: u32,
    in_flight: InFlight,
}

impl<A, P> ScanSession<A, P>
where
    A: ScanAcquisition,
    P: RetryPrompt,
{
    /// Build a session using the classifier rules and retry cap from `config`.
    pub fn new(acquisition: A, prompt: P, config: ScanConfig) -> Self {
        Self {
            acquisition,
            prompt,
            classifier: Box::new(PatternClassifier::from_config(&config)),
            max_capture_retries: config.max_capture_retries,
            pipeline: Arc::new(ScanPipeline::new(config)),
            clock: Box::new(RunToken::now),
            in_flight: InFlight::default(),
        }
    }

    /// Replace the failure classifier.
    pub fn with_classifier(mut self, classifier: impl FailureClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Replace the source of run tokens (the capture-time clock).
    pub fn with_clock(mut self, clock: impl Fn() -> RunToken + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn acquisition(&self) -> &A {
        &self.acquisition
    }

    /// Output mode of the request currently in flight, if any.
    pub fn in_flight(&self) -> Option<OutputRequest> {
        self.in_flight.current_request()
    }

    /// Handle a request by its method name.
    ///
    /// Unknown names fail with [`ScanError::UnrecognizedRequest`] before
    /// anything is presented and without disturbing an in-flight request.
    pub async fn handle(&self, method: &str) -> Result<ScanArtifact> {
        let request = OutputRequest::from_method(method).inspect_err(|_| {
            warn!(method, "unrecognized scan request");
        })?;
        self.scan(request).await
    }

    /// Run one scan request and return its single outcome.
    #[instrument(skip(self), fields(platform = self.acquisition.platform_name()))]
    pub async fn scan(&self, request: OutputRequest) -> Result<ScanArtifact> {
        let id = RequestId::new();
        let cancel = CancelFlag::new();
        let (responder, mut delivered) = oneshot::channel();
        self.in_flight.begin(PendingRequest {
            id,
            request,
            responder,
            cancel: cancel.clone(),
        });
        let _guard = AbandonOnDrop {
            in_flight: &self.in_flight,
            id,
        };
        info!(request_id = %id, "scan request started");

        tokio::select! {
            biased;
            // Superseded while the capture UI or the pipeline was still busy.
            outcome = &mut delivered => return outcome.unwrap_or(Err(ScanError::Superseded)),
            outcome = self.run(request, &cancel) => {
                self.in_flight.complete(id, outcome);
            }
        }

        delivered.await.unwrap_or(Err(ScanError::Superseded))
    }

    async fn run(&self, request: OutputRequest, cancel: &CancelFlag) -> Result<ScanArtifact> {
        if !self.acquisition.is_capture_supported() {
            warn!("document capture not supported on this device");
            return Err(ScanError::Unsupported);
        }
        if !self.acquisition.has_presentation_surface() {
            warn!("no presentation surface for the capture UI");
            return Err(ScanError::NoPresentationSurface);
        }

        let mut retries_used = 0u32;
        loop {
            debug!(attempt = retries_used + 1, "presenting capture UI");
            let failure = match self.acquisition.present_capture_ui().await {
                CaptureOutcome::Captured(pages) => {
                    return self.finish(pages, request, cancel.clone()).await;
                }
                CaptureOutcome::Cancelled => {
                    info!("scan cancelled by user");
                    return Err(ScanError::Cancelled);
                }
                CaptureOutcome::Failed(failure) => failure,
            };

            let cause = failure.to_string();
            if self.classifier.classify(&failure) == FailureClass::Terminal {
                warn!(%cause, "capture failed");
                return Err(ScanError::TerminalCaptureFailure { cause });
            }

            let err = ScanError::RecoverableCaptureFailure { cause };
            if retries_used >= self.max_capture_retries {
                warn!(retries_used, "capture failed again, retry budget exhausted");
                return Err(err);
            }
            if !self.prompt.confirm_retry(&humanize_error(&err)).await {
                info!("user declined to retry the scan");
                return Err(err);
            }

            retries_used += 1;
            info!(retries_used, "retrying capture from a clean slate");
        }
    }

    async fn finish(
        &self,
        pages: Vec<Page>,
        request: OutputRequest,
        cancel: CancelFlag,
    ) -> Result<ScanArtifact> {
        let token = (self.clock)();
        info!(pages = pages.len(), %token, "capture finished, running pipeline");

        // The blocking task outlives a superseded caller; the flag stops it.
        let pipeline = Arc::clone(&self.pipeline);
        tokio::task::spawn_blocking(move || {
            pipeline.process_cancellable(pages, request, &token, &cancel)
        })
            .await
            .map_err(|err| ScanError::write_failure(format!("pipeline task failed: {err}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;
    use image::{DynamicImage, Rgb, RgbImage};
    use pagescan_core::CaptureFailure;
    use pagescan_core::human_errors::HumanError;
    use pagescan_document::PdfInspector;
    use tokio::sync::Notify;

    /// Acquisition that replays scripted outcomes, or hangs when the script is
    /// exhausted.
    struct ScriptedAcquisition {
        supported: bool,
        surface: bool,
        script: Mutex<VecDeque<CaptureOutcome>>,
        presented: AtomicUsize,
        on_present: Notify,
    }

    impl ScriptedAcquisition {
        fn new(script: Vec<CaptureOutcome>) -> Self {
            Self {
                supported: true,
                surface: true,
                script: Mutex::new(script.into()),
                presented: AtomicUsize::new(0),
                on_present: Notify::new(),
            }
        }

        fn presented(&self) -> usize {
            self.presented.load(Ordering::SeqCst)
        }
    }

    impl ScanAcquisition for ScriptedAcquisition {
        fn platform_name(&self) -> &str {
            "test"
        }

        fn is_capture_supported(&self) -> bool {
            self.supported
        }

        fn has_presentation_surface(&self) -> bool {
            self.surface
        }

        async fn present_capture_ui(&self) -> CaptureOutcome {
            self.presented.fetch_add(1, Ordering::SeqCst);
            self.on_present.notify_one();
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(outcome) => outcome,
                None => std::future::pending().await,
            }
        }
    }

    /// Prompt that answers from a fixed list and counts how often it was shown.
    struct ScriptedPrompt {
        answers: Mutex<VecDeque<bool>>,
        shown: AtomicUsize,
    }

    impl ScriptedPrompt {
        fn answering(answers: &[bool]) -> Self {
            Self {
                answers: Mutex::new(answers.iter().copied().collect()),
                shown: AtomicUsize::new(0),
            }
        }

        fn shown(&self) -> usize {
            self.shown.load(Ordering::SeqCst)
        }
    }

    impl RetryPrompt for ScriptedPrompt {
        async fn confirm_retry(&self, error: &HumanError) -> bool {
            assert!(error.retriable);
            self.shown.fetch_add(1, Ordering::SeqCst);
            self.answers.lock().unwrap().pop_front().unwrap_or(false)
        }
    }

    fn pages(n: usize) -> Vec<Page> {
        (0..n)
            .map(|i| {
                Page::from_dynamic(DynamicImage::ImageRgb8(RgbImage::from_pixel(
                    30 + i as u32 * 10,
                    40,
                    Rgb([200, 200, 200]),
                )))
            })
            .collect()
    }

    fn buffer_failure() -> CaptureFailure {
        CaptureFailure::new("com.apple.VisionKit", -1, "Could not create image buffer")
    }

    fn fixed_token() -> RunToken {
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(10, 15, 30))
            .unwrap();
        RunToken::from_datetime(at)
    }

    fn session(
        dir: &Path,
        acquisition: ScriptedAcquisition,
        prompt: ScriptedPrompt,
    ) -> ScanSession<ScriptedAcquisition, ScriptedPrompt> {
        ScanSession::new(acquisition, prompt, ScanConfig::with_documents_dir(dir))
            .with_clock(fixed_token)
    }

    #[tokio::test]
    async fn pdf_request_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = ScriptedAcquisition::new(vec![CaptureOutcome::Captured(pages(3))]);
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[]));

        let artifact = session.handle("scan_as_pdf").await.unwrap();
        let ScanArtifact::Document { path, page_count } = artifact else {
            panic!("expected document");
        };
        assert_eq!(path, dir.path().join("20240102-101530.pdf"));
        assert_eq!(page_count, 3);
        assert_eq!(PdfInspector::open(&path).unwrap().page_count(), 3);
        assert_eq!(session.in_flight(), None);
    }

    #[tokio::test]
    async fn jpeg_request_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = ScriptedAcquisition::new(vec![CaptureOutcome::Captured(pages(2))]);
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[]));

        let paths = session.handle("scan_as_images").await.unwrap().paths();
        assert_eq!(
            paths,
            [
                dir.path().join("20240102-101530-0.jpg"),
                dir.path().join("20240102-101530-1.jpg"),
            ]
        );
    }

    #[tokio::test]
    async fn unsupported_device_never_presents() {
        let dir = tempfile::tempdir().unwrap();
        let mut acquisition = ScriptedAcquisition::new(vec![CaptureOutcome::Captured(pages(1))]);
        acquisition.supported = false;
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[]));

        let err = session.handle("scan_as_pdf").await.unwrap_err();
        assert!(matches!(err, ScanError::Unsupported));
        assert_eq!(session.acquisition().presented(), 0);
    }

    #[tokio::test]
    async fn missing_surface_never_presents() {
        let dir = tempfile::tempdir().unwrap();
        let mut acquisition = ScriptedAcquisition::new(vec![]);
        acquisition.surface = false;
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[]));

        let err = session.handle("scan_as_images").await.unwrap_err();
        assert!(matches!(err, ScanError::NoPresentationSurface));
        assert_eq!(session.acquisition().presented(), 0);
    }

    #[tokio::test]
    async fn unrecognized_request_echoes_and_never_presents() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = ScriptedAcquisition::new(vec![]);
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[]));

        match session.handle("scanAsGif").await {
            Err(ScanError::UnrecognizedRequest { requested }) => assert_eq!(requested, "scanAsGif"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(session.acquisition().presented(), 0);
    }

    #[tokio::test]
    async fn cancel_is_terminal_without_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = ScriptedAcquisition::new(vec![CaptureOutcome::Cancelled]);
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[true]));

        let err = session.handle("scan_as_pdf").await.unwrap_err();
        assert!(matches!(err, ScanError::Cancelled));
        assert_eq!(session.prompt.shown(), 0);
        assert_eq!(session.acquisition().presented(), 1);
    }

    #[tokio::test]
    async fn recoverable_failure_then_decline_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition =
            ScriptedAcquisition::new(vec![CaptureOutcome::Failed(buffer_failure())]);
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[false]));

        let err = session.handle("scan_as_pdf").await.unwrap_err();
        match err {
            ScanError::RecoverableCaptureFailure { cause } => assert!(cause.contains("image buffer")),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(session.prompt.shown(), 1);
        assert_eq!(session.acquisition().presented(), 1);
    }

    #[tokio::test]
    async fn recoverable_failure_then_confirm_restarts_capture() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = ScriptedAcquisition::new(vec![
            CaptureOutcome::Failed(buffer_failure()),
            CaptureOutcome::Captured(pages(2)),
        ]);
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[true]));

        let artifact = session.handle("scan_as_pdf").await.unwrap();
        assert!(matches!(artifact, ScanArtifact::Document { page_count: 2, .. }));
        assert_eq!(session.acquisition().presented(), 2);
    }

    #[tokio::test]
    async fn retry_cap_stops_second_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = ScriptedAcquisition::new(vec![
            CaptureOutcome::Failed(buffer_failure()),
            CaptureOutcome::Failed(buffer_failure()),
            CaptureOutcome::Captured(pages(1)),
        ]);
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[true, true]));

        let err = session.handle("scan_as_pdf").await.unwrap_err();
        assert!(matches!(err, ScanError::RecoverableCaptureFailure { .. }));
        assert_eq!(session.prompt.shown(), 1);
        assert_eq!(session.acquisition().presented(), 2);
    }

    #[tokio::test]
    async fn unclassified_failure_is_terminal_without_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = ScriptedAcquisition::new(vec![CaptureOutcome::Failed(
            CaptureFailure::new("com.apple.VisionKit", 3, "Camera access denied"),
        )]);
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[true]));

        let err = session.handle("scan_as_images").await.unwrap_err();
        match err {
            ScanError::TerminalCaptureFailure { cause } => assert!(cause.contains("access denied")),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(session.prompt.shown(), 0);
    }

    #[tokio::test]
    async fn injected_classifier_decides_retry() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = ScriptedAcquisition::new(vec![
            CaptureOutcome::Failed(CaptureFailure::new("x", 1, "anything")),
            CaptureOutcome::Captured(pages(1)),
        ]);
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[true]))
            .with_classifier(|_: &CaptureFailure| FailureClass::Recoverable);

        assert!(session.handle("scan_as_png").await.is_ok());
        assert_eq!(session.prompt.shown(), 1);
    }

    #[tokio::test]
    async fn empty_capture_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = ScriptedAcquisition::new(vec![CaptureOutcome::Captured(Vec::new())]);
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[]));

        let err = session.handle("scan_as_pdf").await.unwrap_err();
        assert!(matches!(err, ScanError::EmptyScan));
    }

    #[tokio::test]
    async fn new_request_supersedes_pending_one() {
        let dir = tempfile::tempdir().unwrap();
        // First presentation hangs (empty script); the second gets pages.
        let acquisition = ScriptedAcquisition::new(vec![]);
        let session = Arc::new(session(dir.path(), acquisition, ScriptedPrompt::answering(&[])));

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.handle("scan_as_pdf").await })
        };
        session.acquisition().on_present.notified().await;
        assert_eq!(session.in_flight(), Some(OutputRequest::SingleDocument));

        session
            .acquisition()
            .script
            .lock()
            .unwrap()
            .push_back(CaptureOutcome::Captured(pages(1)));
        let second = session.handle("scan_as_png").await.unwrap();

        let first = first.await.unwrap();
        assert!(matches!(first, Err(ScanError::Superseded)), "{first:?}");
        assert_eq!(second.paths().len(), 1);
        assert_eq!(session.in_flight(), None);
    }

    #[tokio::test]
    async fn dropped_request_clears_in_flight_binding() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = ScriptedAcquisition::new(vec![]);
        let session = Arc::new(session(dir.path(), acquisition, ScriptedPrompt::answering(&[])));

        let caller = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.handle("scan_as_images").await })
        };
        session.acquisition().on_present.notified().await;
        assert_eq!(session.in_flight(), Some(OutputRequest::ImagesAsJpeg));

        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());
        assert_eq!(session.in_flight(), None);
    }

    fn pending(request: OutputRequest) -> (PendingRequest, oneshot::Receiver<Result<ScanArtifact>>) {
        let (responder, delivered) = oneshot::channel();
        let pending = PendingRequest {
            id: RequestId::new(),
            request,
            responder,
            cancel: CancelFlag::new(),
        };
        (pending, delivered)
    }

    #[tokio::test]
    async fn superseding_cancels_the_older_pipeline_run() {
        let in_flight = InFlight::default();
        let (older, older_rx) = pending(OutputRequest::ImagesAsPng);
        let older_cancel = older.cancel.clone();
        let (newer, _newer_rx) = pending(OutputRequest::SingleDocument);
        let newer_cancel = newer.cancel.clone();

        in_flight.begin(older);
        in_flight.begin(newer);

        assert!(older_cancel.is_cancelled());
        assert!(!newer_cancel.is_cancelled());
        assert!(matches!(older_rx.await, Ok(Err(ScanError::Superseded))));
        assert_eq!(in_flight.current_request(), Some(OutputRequest::SingleDocument));
    }

    #[test]
    fn abandon_only_touches_its_own_request() {
        let in_flight = InFlight::default();
        let (current, _rx) = pending(OutputRequest::SingleDocument);
        let current_id = current.id;
        let current_cancel = current.cancel.clone();
        in_flight.begin(current);

        in_flight.abandon(RequestId::new());
        assert_eq!(in_flight.current_request(), Some(OutputRequest::SingleDocument));
        assert!(!current_cancel.is_cancelled());

        in_flight.abandon(current_id);
        assert_eq!(in_flight.current_request(), None);
        assert!(current_cancel.is_cancelled());
    }

    #[tokio::test]
    async fn completed_request_is_not_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let acquisition = ScriptedAcquisition::new(vec![CaptureOutcome::Captured(pages(2))]);
        let session = session(dir.path(), acquisition, ScriptedPrompt::answering(&[]));

        let paths = session.handle("scan_as_png").await.unwrap().paths();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|path| path.exists()));
        // Only the two pages; no staging files left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }
}
