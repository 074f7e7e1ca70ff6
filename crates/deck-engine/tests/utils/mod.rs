#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use deck_core::{
    AccessError, Approval, ApprovalGate, Artifact, BatchPlan, ContentUnit, Discrepancy,
    FolderInspector, FolderLink, FolderRef, Manifest, Notifier, NotifyError, RemoteEntry,
    RenderError, Renderer, UploadBatch, UploadError, Uploader, VerificationResult,
};
use deck_engine::{Event, Publisher, PublisherSettings};
use deck_verify::Verifier;

type Files = Vec<(String, Vec<u8>)>;

/// In-memory destination store shared by the fake uploader and the verifier
#[derive(Default, Clone)]
pub struct MemoryDrive {
    folders: Arc<Mutex<HashMap<String, Files>>>,
    unreachable: Arc<AtomicBool>,
    stalled: Arc<AtomicBool>,
}

impl MemoryDrive {
    pub fn put(&self, folder: &FolderRef, files: Files) {
        self.folders
            .lock()
            .unwrap()
            .insert(folder.as_str().to_string(), files);
    }

    pub fn remove_file(&self, folder: &FolderRef, name: &str) {
        if let Some(files) = self.folders.lock().unwrap().get_mut(folder.as_str()) {
            files.retain(|(n, _)| n != name);
        }
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Listings never answer
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    pub fn names(&self, folder: &FolderRef) -> Vec<String> {
        let mut names: Vec<String> = self
            .folders
            .lock()
            .unwrap()
            .get(folder.as_str())
            .map(|files| files.iter().map(|(n, _)| n.clone()).collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

#[async_trait]
impl FolderInspector for MemoryDrive {
    async fn list(&self, folder: &FolderRef) -> Result<Vec<RemoteEntry>, AccessError> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AccessError::new(folder.as_str(), "401 unauthorized"));
        }
        self.folders
            .lock()
            .unwrap()
            .get(folder.as_str())
            .map(|files| {
                files
                    .iter()
                    .map(|(name, bytes)| RemoteEntry::file(name.clone(), bytes.len() as u64))
                    .collect()
            })
            .ok_or_else(|| AccessError::new(folder.as_str(), "folder not found"))
    }

    async fn read(&self, folder: &FolderRef, name: &str) -> Result<Vec<u8>, AccessError> {
        self.folders
            .lock()
            .unwrap()
            .get(folder.as_str())
            .and_then(|files| files.iter().find(|(n, _)| n == name))
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| AccessError::new(folder.as_str(), format!("{} not found", name)))
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    pub fail_on: Option<u32>,
    pub hang: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, unit: &ContentUnit) -> Result<Artifact, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail_on == Some(unit.ordinal) {
            return Err(RenderError::new(unit.ordinal, "source image unreachable"));
        }
        Ok(Artifact::new(
            unit.ordinal,
            format!("/render/slide_{}.png", unit.ordinal),
        ))
    }
}

/// What the fake uploader does on which attempt (1-based)
#[derive(Default)]
pub struct UploadScript {
    pub drop_ordinals: HashMap<u32, Vec<u32>>,
    pub skip_manifest: bool,
    pub transport_errors: HashSet<u32>,
    /// Remove `slide_1.png` right after the uploader's own check passes
    pub tamper_after_check: HashSet<u32>,
    /// Upload calls never return
    pub hang: bool,
}

pub struct FakeUploader {
    drive: MemoryDrive,
    script: UploadScript,
    attempts: AtomicU32,
    pub feedback: Mutex<Vec<Vec<Discrepancy>>>,
}

impl FakeUploader {
    pub fn new(drive: MemoryDrive, script: UploadScript) -> Self {
        Self {
            drive,
            script,
            attempts: AtomicU32::new(0),
            feedback: Mutex::new(Vec::new()),
        }
    }

    pub fn upload_calls(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Uploader for FakeUploader {
    async fn upload(
        &self,
        batch: &UploadBatch,
        folder: &FolderRef,
        feedback: &[Discrepancy],
    ) -> Result<FolderLink, UploadError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        self.feedback.lock().unwrap().push(feedback.to_vec());

        if self.script.hang {
            std::future::pending::<()>().await;
        }

        if self.script.transport_errors.contains(&attempt) {
            return Err(UploadError("connection reset by peer".into()));
        }

        let dropped = self
            .script
            .drop_ordinals
            .get(&attempt)
            .cloned()
            .unwrap_or_default();

        let mut files: Files = batch
            .artifacts()
            .iter()
            .filter(|a| !dropped.contains(&a.ordinal))
            .map(|a| (a.file_name(), b"png".to_vec()))
            .collect();
        if !self.script.skip_manifest {
            files.push((
                Manifest::FILE_NAME.to_string(),
                batch.manifest().to_bytes().unwrap(),
            ));
        }

        self.drive.put(folder, files);
        Ok(FolderLink(format!("mem://{}", folder)))
    }

    async fn self_check(&self, folder: &FolderRef, expected_count: u32) -> VerificationResult {
        let result = Verifier::new(Arc::new(self.drive.clone()))
            .verify(folder, expected_count)
            .await;

        let attempt = self.attempts.load(Ordering::SeqCst);
        if result.ok && self.script.tamper_after_check.contains(&attempt) {
            self.drive.remove_file(folder, "slide_1.png");
        }

        result
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub hang: bool,
    pub calls: Mutex<Vec<(Vec<String>, String, String)>>,
}

impl RecordingNotifier {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        self.calls.lock().unwrap().push((
            recipients.to_vec(),
            subject.to_string(),
            body.to_string(),
        ));
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(NotifyError::Delivery("smtp 554 rejected".into()));
        }
        Ok(())
    }
}

pub struct ScriptedGate {
    pub decision: Approval,
    pub requests: AtomicUsize,
}

impl ScriptedGate {
    pub fn new(decision: Approval) -> Self {
        Self {
            decision,
            requests: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ApprovalGate for ScriptedGate {
    async fn request_approval(&self, _plan: &BatchPlan) -> Approval {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.decision.clone()
    }
}

pub struct Harness {
    pub drive: MemoryDrive,
    pub renderer: Arc<FakeRenderer>,
    pub uploader: Arc<FakeUploader>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(script: UploadScript) -> Self {
        let drive = MemoryDrive::default();
        Self {
            uploader: Arc::new(FakeUploader::new(drive.clone(), script)),
            renderer: Arc::new(FakeRenderer::default()),
            notifier: Arc::new(RecordingNotifier::default()),
            drive,
        }
    }

    pub fn with_renderer(mut self, renderer: FakeRenderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn with_notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn publisher(&self, settings: PublisherSettings) -> Publisher {
        Publisher::new(
            self.renderer.clone(),
            self.uploader.clone(),
            Verifier::new(Arc::new(self.drive.clone())),
            self.notifier.clone(),
            settings,
        )
    }
}

pub fn plan(n: u32) -> BatchPlan {
    let units = (1..=n)
        .map(|o| ContentUnit::new(o, format!("slide {o}"), format!("library/{o}.jpg")))
        .collect();
    BatchPlan::new("Morning routine", units).with_batch_id(format!("batch-{n}"))
}

/// Short deadlines for tests with collaborators that never answer
pub fn impatient_settings() -> PublisherSettings {
    let limit = std::time::Duration::from_millis(50);
    PublisherSettings {
        render_timeout: limit,
        upload_timeout: limit,
        verify_timeout: limit,
        notify_timeout: limit,
        ..settings()
    }
}

pub fn settings() -> PublisherSettings {
    PublisherSettings {
        recipients: vec!["admin@example.com".to_string()],
        ..PublisherSettings::default()
    }
}

/// Every notification follows a passing independent verification with no
/// failing one in between, and there is at most one notification
pub fn assert_notify_gated(trace: &[Event]) {
    let mut last_verify2: Option<bool> = None;
    let mut notified = 0;

    for event in trace {
        match event {
            Event::Verify2 { ok, .. } => last_verify2 = Some(*ok),
            Event::Notified { .. } => {
                assert_eq!(last_verify2, Some(true), "notify without passing verify_2: {trace:?}");
                notified += 1;
            }
            _ => {}
        }
    }

    assert!(notified <= 1, "notified {notified} times: {trace:?}");
}
