// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture for engine integration tests
#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use weir_adapters::{FakeBus, FakeExec, FakeJournal, FakeKvs, FakeLifecycle, FakeSched};
use weir_core::{FakeClock, Job, JobId, SharedJob};
use weir_engine::{Engine, EngineConfig, EngineDeps, Fatal, PostFlags};

pub struct Harness {
    pub engine: Engine<FakeKvs, FakeBus, FakeClock>,
    pub fatal_rx: mpsc::UnboundedReceiver<Fatal>,
    pub kvs: FakeKvs,
    pub bus: FakeBus,
    pub sched: Arc<FakeSched>,
    pub exec: Arc<FakeExec>,
    pub journal: Arc<FakeJournal>,
    pub lifecycle: Arc<FakeLifecycle>,
    pub clock: FakeClock,
}

pub fn harness() -> Harness {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let kvs = FakeKvs::new();
    let bus = FakeBus::new();
    let sched = Arc::new(FakeSched::new());
    let exec = Arc::new(FakeExec::new());
    let journal = Arc::new(FakeJournal::new());
    let lifecycle = Arc::new(FakeLifecycle::new());
    let clock = FakeClock::at(1_700_000_000.0);

    let deps = EngineDeps {
        kvs: kvs.clone(),
        bus: bus.clone(),
        sched: sched.clone(),
        exec: exec.clone(),
        journal: journal.clone(),
        lifecycle: lifecycle.clone(),
    };
    let (engine, fatal_rx) = Engine::new(deps, EngineConfig::default(), clock.clone());

    Harness {
        engine,
        fatal_rx,
        kvs,
        bus,
        sched,
        exec,
        journal,
        lifecycle,
        clock,
    }
}

impl Harness {
    /// Create a job and run its submit event
    pub fn submit(&self, id: u64) -> SharedJob {
        let job = self.engine.insert_job(Job::new(JobId(id)));
        self.engine
            .post_event(
                &job,
                "submit",
                PostFlags::default(),
                Some(json!({"urgency": 16, "userid": 1000, "flags": 0})),
            )
            .unwrap();
        job
    }

    pub fn post(&self, job: &SharedJob, name: &str, context: Option<Value>) {
        self.engine
            .post_event(job, name, PostFlags::default(), context)
            .unwrap();
    }

    /// All transitions published on `job-state`, flattened across batches
    pub fn published_transitions(&self) -> Vec<(u64, String, f64)> {
        self.bus
            .on_topic("job-state")
            .iter()
            .flat_map(|payload| {
                payload["transitions"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default()
            })
            .map(|t| {
                (
                    t[0].as_u64().unwrap(),
                    t[1].as_str().unwrap().to_string(),
                    t[2].as_f64().unwrap(),
                )
            })
            .collect()
    }

    /// Event names in a job's durable eventlog, in commit order
    pub fn eventlog_names(&self, id: u64) -> Vec<String> {
        self.kvs
            .log(&JobId(id).eventlog_key())
            .iter()
            .map(|line| weir_core::EventEntry::parse(line).unwrap().name)
            .collect()
    }
}
