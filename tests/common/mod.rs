#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::TimeZone;
use junit_xray::report::metadata::MapEnv;
use junit_xray::report::model::{Context, ContextResult, Outcome};
use junit_xray::report::sink::MemorySink;
use junit_xray::{JunitXrayReporter, ReporterConfig};

pub const OUTPUT: &str = "/reports/component-test-results/component_tests.xml";
pub const METADATA: &str = "/reports/metadata.json";

pub fn config() -> ReporterConfig {
    ReporterConfig {
        base_path: PathBuf::from("/reports"),
        output_file: PathBuf::from("component-test-results/component_tests.xml"),
        ..Default::default()
    }
}

/// Reporter writing into `sink` with a pinned clock, hostname and empty environment.
pub fn reporter(config: ReporterConfig, sink: &MemorySink) -> JunitXrayReporter {
    JunitXrayReporter::new(config)
        .with_sink(Arc::new(sink.clone()))
        .with_env(Arc::new(MapEnv::default()))
        .with_hostname("test-host")
        .with_clock(Box::new(|| chrono::Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()))
}

pub fn android() -> Context {
    Context::new("Android_4_1_2", "Android")
}

pub fn sender_outcome(description: &str) -> Outcome {
    Outcome {
        description: description.to_string(),
        suite: vec!["Sender".to_string(), "using it".to_string(), "get request".to_string()],
        success: true,
        time: None,
        log: vec![],
    }
}

pub fn finished(total: u32, failed: u32) -> ContextResult {
    ContextResult {
        total,
        failed,
        error: false,
        disconnected: false,
        net_time: Some(10.0 * 1000.0),
    }
}

pub fn written_report(sink: &MemorySink) -> String {
    sink.get_string(Path::new(OUTPUT)).expect("report should be written")
}
