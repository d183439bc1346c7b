//! Drives a reporter from a recorded host runner session.
//!
//! The session is newline-delimited JSON, one lifecycle event per line:
//!
//! ```text
//! {"event":"runStart","contexts":[{"id":"Chrome_120","name":"Chrome"}]}
//! {"event":"contextStart","context":{"id":"Chrome_120","name":"Chrome"}}
//! {"event":"outcome","context":{"id":"Chrome_120","name":"Chrome"},"outcome":{"description":"c:XRAY-1:works","suite":["App"],"success":true,"time":12}}
//! {"event":"contextComplete","context":{"id":"Chrome_120","name":"Chrome"},"result":{"total":1,"failed":0,"netTime":12}}
//! {"event":"runComplete"}
//! ```

use serde::{Deserialize, Serialize};

use crate::report::model::{Context, ContextResult, Outcome};
use crate::report::JunitXrayReporter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum LifecycleEvent {
    RunStart {
        #[serde(default)]
        contexts: Vec<Context>,
    },
    ContextStart {
        context: Context,
    },
    Outcome {
        context: Context,
        #[serde(default)]
        outcome: Outcome,
    },
    ContextComplete {
        context: Context,
        #[serde(default)]
        result: ContextResult,
    },
    BrowserLog {
        context: Context,
        message: String,
    },
    RunComplete,
}

impl LifecycleEvent {
    pub fn apply(&self, reporter: &mut JunitXrayReporter) {
        match self {
            LifecycleEvent::RunStart { contexts } => reporter.on_run_start(contexts),
            LifecycleEvent::ContextStart { context } => reporter.on_context_start(context),
            LifecycleEvent::Outcome { context, outcome } => reporter.on_outcome(context, outcome),
            LifecycleEvent::ContextComplete { context, result } => {
                reporter.on_context_complete(context, result)
            }
            LifecycleEvent::BrowserLog { context, message } => {
                reporter.on_browser_log(context, message)
            }
            LifecycleEvent::RunComplete => reporter.on_run_complete(),
        }
    }
}

/// Parse an NDJSON session. Blank lines are skipped.
pub fn parse_events(input: &str) -> crate::Result<Vec<LifecycleEvent>> {
    let mut events = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event = serde_json::from_str(trimmed).map_err(|e| crate::Error::InvalidEvent {
            line: idx + 1,
            reason: e.to_string(),
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Feed every event to `reporter`, then wait for all writes to finish.
pub async fn replay(reporter: &mut JunitXrayReporter, events: &[LifecycleEvent]) -> crate::Result<()> {
    for event in events {
        event.apply(reporter);
    }
    reporter.finish().await
}
