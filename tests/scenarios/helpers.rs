//! Fakes and assertions shared by the scenario tests

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use report_generator::core::{JobStatus, PipelineConfig, PipelineResult, RunnerState, StepSpec, StepStatus};
use report_generator::execution::{Collaborators, PipelineRunner, Reporter, RunEvent, WaitOptions};
use report_generator::services::{
    ChannelKind, ClusterHandle, ImportOutput, ImportRequest, ImporterService, JobExecutionService,
    NotificationChannel, ObjectEntry, ServiceError, StorageListingService, TableMetadataService,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const WAREHOUSE: &str = "s3://warehouse";

/// Storage that reports a partition as written after a number of empty listings
pub struct FakeStorage {
    empty_listings: usize,
    calls: AtomicUsize,
    prefixes: Mutex<Vec<String>>,
}

impl FakeStorage {
    /// Every partition is already stable
    pub fn ready() -> Self {
        Self::after(0)
    }

    /// Partitions stay empty forever
    pub fn never() -> Self {
        Self::after(usize::MAX)
    }

    /// The first `empty_listings` listings are empty
    pub fn after(empty_listings: usize) -> Self {
        Self {
            empty_listings,
            calls: AtomicUsize::new(0),
            prefixes: Mutex::new(Vec::new()),
        }
    }

    pub fn prefixes(&self) -> Vec<String> {
        self.prefixes.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageListingService for FakeStorage {
    async fn list(&self, prefix: &str) -> Result<Vec<ObjectEntry>, ServiceError> {
        self.prefixes.lock().unwrap().push(prefix.to_string());
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.empty_listings {
            return Ok(Vec::new());
        }
        Ok(vec![ObjectEntry {
            key: format!("{}000000_0", prefix),
            last_modified: Utc::now() - ChronoDuration::hours(2),
        }])
    }
}

/// Metastore placing every table under `WAREHOUSE`
#[derive(Default)]
pub struct FakeMetadata {
    pub refreshes: AtomicUsize,
}

#[async_trait]
impl TableMetadataService for FakeMetadata {
    async fn location(&self, table: &str) -> Result<String, ServiceError> {
        Ok(format!("{}/{}", WAREHOUSE, table))
    }

    async fn refresh_metadata(&self) -> Result<(), ServiceError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Job service with a scripted terminal status
pub struct FakeJobs {
    top_level: JobStatus,
    failing_scripts: HashSet<String>,
    fail_create: bool,
    pub calls: Mutex<Vec<String>>,
    submitted: Mutex<Vec<String>>,
}

impl FakeJobs {
    pub fn completing() -> Self {
        Self::with_status(JobStatus::Completed)
    }

    pub fn with_status(top_level: JobStatus) -> Self {
        Self {
            top_level,
            failing_scripts: HashSet::new(),
            fail_create: false,
            calls: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Report `script` as FAILED while the cluster itself still says COMPLETED
    pub fn failing_step(mut self, script: &str) -> Self {
        self.failing_scripts.insert(script.to_string());
        self
    }

    pub fn unavailable() -> Self {
        Self {
            fail_create: true,
            ..Self::completing()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl JobExecutionService for FakeJobs {
    async fn create_cluster(&self, name: &str) -> Result<ClusterHandle, ServiceError> {
        self.record(format!("create {}", name));
        if self.fail_create {
            return Err(ServiceError::Unsupported("cluster capacity exhausted".to_string()));
        }
        Ok(ClusterHandle {
            id: "j-TEST".to_string(),
            name: name.to_string(),
        })
    }

    async fn add_step(&self, _cluster: &ClusterHandle, step: &StepSpec) -> Result<(), ServiceError> {
        self.record(format!("add {}", step.hive_script));
        self.submitted.lock().unwrap().push(step.hive_script.clone());
        Ok(())
    }

    async fn await_completion(&self, _cluster: &ClusterHandle) -> Result<JobStatus, ServiceError> {
        self.record("await".to_string());
        Ok(self.top_level.clone())
    }

    async fn list_step_statuses(&self, _cluster: &ClusterHandle) -> Result<Vec<StepStatus>, ServiceError> {
        self.record("list".to_string());
        Ok(self
            .submitted
            .lock()
            .unwrap()
            .iter()
            .map(|script| {
                let status = if self.failing_scripts.contains(script) {
                    JobStatus::Failed
                } else {
                    JobStatus::Completed
                };
                StepStatus::new(script.clone(), status)
            })
            .collect())
    }
}

/// Channel that records what it was asked to deliver
pub struct RecordingChannel {
    name: String,
    kind: ChannelKind,
    fail: bool,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingChannel {
    pub fn new(name: &str, kind: ChannelKind) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            kind,
            fail: false,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn broken(name: &str, kind: ChannelKind) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            kind,
            fail: true,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, subject: &str, body: &str) -> Result<(), ServiceError> {
        if self.fail {
            return Err(ServiceError::Unsupported("smtp relay refused".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// Importer that fails for selected tables
#[derive(Default)]
pub struct RecordingImporter {
    failing_tables: HashSet<String>,
    pub requests: Mutex<Vec<ImportRequest>>,
}

impl RecordingImporter {
    pub fn failing_for(tables: &[&str]) -> Self {
        Self {
            failing_tables: tables.iter().map(|t| t.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn tables(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.table.clone())
            .collect()
    }
}

#[async_trait]
impl ImporterService for RecordingImporter {
    async fn invoke(&self, request: &ImportRequest) -> Result<ImportOutput, ServiceError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.failing_tables.contains(&request.table) {
            return Ok(ImportOutput {
                stdout: String::new(),
                stderr: format!("could not connect to load {}", request.collection),
                exit_code: Some(1),
            });
        }
        Ok(ImportOutput {
            stdout: format!("loaded {}", request.collection),
            stderr: String::new(),
            exit_code: Some(0),
        })
    }
}

/// Everything a scenario needs to drive and inspect one run
pub struct Harness {
    pub storage: Arc<FakeStorage>,
    pub metadata: Arc<FakeMetadata>,
    pub jobs: Arc<FakeJobs>,
    pub email: Arc<RecordingChannel>,
    pub chat: Arc<RecordingChannel>,
    pub importer: Arc<RecordingImporter>,
    pub options: WaitOptions,
    pub events: Arc<Mutex<Vec<RunEvent>>>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(FakeStorage::ready()),
            metadata: Arc::new(FakeMetadata::default()),
            jobs: Arc::new(FakeJobs::completing()),
            email: RecordingChannel::new("email", ChannelKind::Primary),
            chat: RecordingChannel::new("chat", ChannelKind::Secondary),
            importer: Arc::new(RecordingImporter::default()),
            options: WaitOptions {
                deadline: Duration::from_secs(3600),
                ..WaitOptions::default()
            },
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_storage(mut self, storage: FakeStorage) -> Self {
        self.storage = Arc::new(storage);
        self
    }

    pub fn with_jobs(mut self, jobs: FakeJobs) -> Self {
        self.jobs = Arc::new(jobs);
        self
    }

    pub fn with_importer(mut self, importer: RecordingImporter) -> Self {
        self.importer = Arc::new(importer);
        self
    }

    pub fn with_email(mut self, email: Arc<RecordingChannel>) -> Self {
        self.email = email;
        self
    }

    pub fn with_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    pub async fn run(&self, config: &PipelineConfig) -> PipelineResult {
        let events = self.events.clone();
        let reporter = Reporter::new().with_handler(move |event| {
            events.lock().unwrap().push(event.clone());
        });

        let collaborators = Collaborators {
            storage: self.storage.clone(),
            metadata: self.metadata.clone(),
            jobs: self.jobs.clone(),
            channels: vec![
                self.email.clone() as Arc<dyn NotificationChannel>,
                self.chat.clone() as Arc<dyn NotificationChannel>,
            ],
            importer: self.importer.clone(),
        };

        PipelineRunner::new(collaborators, self.options.clone(), reporter)
            .run(config)
            .await
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Every state entered, starting from LOADING_CONFIG
    pub fn states(&self) -> Vec<RunnerState> {
        let mut states = vec![RunnerState::LoadingConfig];
        states.extend(self.events().iter().filter_map(|e| match e {
            RunEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        }));
        states
    }
}

/// The daily report used by most scenarios
pub fn daily_config() -> PipelineConfig {
    let json = r#"{
        "name": "daily report <dt>",
        "wait_for": [
            {"table_name": "raw_events", "partitions": ["dt=<dt>"]}
        ],
        "steps": [
            {
                "hive_script": "daily_stats.q",
                "hive_args": {"DT": "<dt>"},
                "hive_table": "daily_stats",
                "mongo_collection": "daily_stats_<dt>",
                "drop": true
            },
            {
                "hive_script": "cleanup.q"
            }
        ]
    }"#;
    PipelineConfig::from_json_with_params(json, &[("<dt>".to_string(), "2012-08-25".to_string())])
        .unwrap()
}

pub fn assert_states(harness: &Harness, expected: &[RunnerState]) {
    assert_eq!(harness.states(), expected, "unexpected runner state sequence");
}
