// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end job lifecycle scenarios

mod common;

use common::harness;
use serde_json::json;
use std::sync::Arc;
use weir_core::{EventEntry, Job, JobState};
use weir_engine::{JobPlugin, PluginError, PostSink};

#[tokio::test]
async fn happy_path_runs_to_inactive() {
    let h = harness();
    let job = h.submit(1);

    h.post(&job, "priority", Some(json!({"priority": 100})));
    h.sched.grant(&mut job.lock().unwrap());
    h.post(&job, "alloc", None);
    assert_eq!(job.lock().unwrap().state, JobState::Run);

    h.exec.release(&mut job.lock().unwrap());
    h.post(&job, "finish", Some(json!({"status": 0})));
    h.sched.complete_free(&mut job.lock().unwrap());
    h.post(&job, "free", None);

    // free left nothing outstanding, so the engine posted clean itself
    {
        let guard = job.lock().unwrap();
        assert_eq!(guard.state, JobState::Inactive);
        assert_eq!(guard.eventlog_seq, 7);
        assert_eq!(guard.end_event.as_ref().unwrap().name, "finish");
    }
    assert_eq!(h.engine.active_count(), 0);
    assert_eq!(h.engine.running_count(), 0);

    h.engine.shutdown().await;
    assert_eq!(
        h.eventlog_names(1),
        vec!["submit", "depend", "priority", "alloc", "finish", "free", "clean"]
    );

    let states: Vec<String> = h
        .published_transitions()
        .into_iter()
        .map(|(_, state, _)| state)
        .collect();
    assert_eq!(
        states,
        vec!["depend", "priority", "sched", "run", "cleanup", "inactive"]
    );
}

/// Registers dependencies while the job enters DEPEND, the way dependency
/// plugins do in production
struct TwoDependencies;

impl JobPlugin for TwoDependencies {
    fn on_state_change(
        &self,
        job: &Job,
        _entry: &EventEntry,
        _prev: JobState,
        posts: &mut PostSink,
    ) -> Result<(), PluginError> {
        if job.state == JobState::Depend {
            posts.post(job.id, "dependency-add", Some(json!({"description": "a"})));
            posts.post(job.id, "dependency-add", Some(json!({"description": "b"})));
        }
        Ok(())
    }
}

#[tokio::test]
async fn depend_posts_exactly_once_after_last_dependency() {
    let h = harness();
    h.engine.register_plugin(Arc::new(TwoDependencies));

    let job = h.submit(1);
    assert_eq!(job.lock().unwrap().state, JobState::Depend);
    assert_eq!(job.lock().unwrap().dependency_count(), 2);

    h.post(&job, "dependency-remove", Some(json!({"description": "a"})));
    assert_eq!(job.lock().unwrap().state, JobState::Depend);

    h.post(&job, "dependency-remove", Some(json!({"description": "b"})));
    assert_eq!(job.lock().unwrap().state, JobState::Priority);
    assert!(job.lock().unwrap().depend_posted);

    h.engine.shutdown().await;
    let depend_events = h
        .eventlog_names(1)
        .into_iter()
        .filter(|name| name == "depend")
        .count();
    assert_eq!(depend_events, 1);
}

#[tokio::test]
async fn fatal_exception_in_sched_latches_the_end_event() {
    let h = harness();
    let job = h.submit(1);
    h.post(&job, "priority", Some(json!({"priority": 100})));

    // The alloc request is in flight at the scheduler
    {
        let mut guard = job.lock().unwrap();
        guard.alloc_queued = false;
        guard.alloc_pending = true;
    }

    h.post(
        &job,
        "exception",
        Some(json!({"severity": 0, "type": "cancel", "note": "user cancel"})),
    );

    // Cleanup cannot finish until the scheduler answers the cancel
    assert_eq!(job.lock().unwrap().state, JobState::Cleanup);
    assert_eq!(
        job.lock().unwrap().end_event.as_ref().unwrap().name,
        "exception"
    );

    // A late finish must not displace the exception
    h.post(&job, "finish", Some(json!({"status": 143})));
    let guard = job.lock().unwrap();
    assert_eq!(guard.state, JobState::Cleanup);
    assert_eq!(guard.end_event.as_ref().unwrap().name, "exception");
}

#[tokio::test]
async fn nonfatal_exception_leaves_the_job_running() {
    let h = harness();
    let job = h.submit(1);
    h.post(&job, "priority", Some(json!({"priority": 100})));
    h.sched.grant(&mut job.lock().unwrap());
    h.post(&job, "alloc", None);

    h.post(&job, "exception", Some(json!({"severity": 3, "type": "warn"})));

    let guard = job.lock().unwrap();
    assert_eq!(guard.state, JobState::Run);
    assert!(guard.end_event.is_none());
}

#[tokio::test]
async fn urgency_and_memo_flow_through_any_state() {
    let h = harness();
    let job = h.submit(1);

    h.post(&job, "urgency", Some(json!({"urgency": 31})));
    h.post(&job, "memo", Some(json!({"tag": "nightly"})));

    let guard = job.lock().unwrap();
    assert_eq!(guard.urgency, 31);
    assert_eq!(guard.annotations.as_ref().unwrap()["user"]["tag"], "nightly");
    // Neither event moved the job
    assert_eq!(guard.state, JobState::Priority);
}
