#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{json, Value};
use wiremock::{Request, Respond, ResponseTemplate};

pub const STABILITY_KEY: &str = "test_stability_key";
pub const MESHY_KEY: &str = "test_meshy_key";

/// Answers successive job-status requests with a fixed script of bodies.
/// Once the script runs out, the last entry is repeated.
pub struct ScriptedJob {
    bodies: Vec<Value>,
    calls: AtomicUsize,
}

impl ScriptedJob {
    pub fn new(bodies: Vec<Value>) -> Self {
        assert!(!bodies.is_empty());
        Self {
            bodies,
            calls: AtomicUsize::new(0),
        }
    }

    /// A script of bare status labels for job `id`.
    pub fn statuses(id: &str, statuses: &[&str]) -> Self {
        Self::new(statuses.iter().map(|s| job_body(id, s)).collect())
    }
}

impl Respond for ScriptedJob {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let count = self.calls.fetch_add(1, Ordering::SeqCst);
        let body = &self.bodies[count.min(self.bodies.len() - 1)];
        ResponseTemplate::new(200).set_body_json(body)
    }
}

pub fn job_body(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "status": status,
        "progress": if status == "SUCCEEDED" { 100 } else { 40 },
        "model_urls": {},
        "thumbnail_url": null,
        "message": null
    })
}
