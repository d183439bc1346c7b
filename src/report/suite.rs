use std::collections::HashMap;

use super::description::DescriptionParser;
use super::model::{Context, ContextResult, Outcome};

/// One recorded test.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    /// Traceability identifier, `Not defined` for untagged tests.
    pub identifier: String,
    pub name: String,
    pub time_secs: f64,
    pub classname: String,
    pub success: bool,
    pub failures: Vec<String>,
}

/// Counters written when a context completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuiteTotals {
    pub tests: u32,
    pub errors: u32,
    pub failures: u32,
    pub time_secs: f64,
}

/// Everything recorded for one context during one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteRecord {
    pub name: String,
    pub package: String,
    /// `YYYY-MM-DDTHH:MM:SS`, UTC.
    pub timestamp: String,
    pub hostname: String,
    pub cases: Vec<CaseRecord>,
    /// `None` until the context completes.
    pub totals: Option<SuiteTotals>,
}

impl SuiteRecord {
    pub fn new(
        name: impl Into<String>,
        package: impl Into<String>,
        timestamp: impl Into<String>,
        hostname: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            timestamp: timestamp.into(),
            hostname: hostname.into(),
            cases: Vec::new(),
            totals: None,
        }
    }
}

/// Classname for a suite path: names joined by a space, `.` replaced by `_`.
pub fn classname(suite: &[String]) -> String {
    suite.join(" ").replace('.', "_")
}

/// Suite records keyed by context id, kept in the order contexts first started.
#[derive(Debug, Default)]
pub struct SuiteAccumulator {
    suites: Vec<SuiteRecord>,
    index: HashMap<String, usize>,
}

impl SuiteAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the record for `context`, replacing any record it already had.
    pub fn start(&mut self, context: &Context, record: SuiteRecord) {
        match self.index.get(&context.id) {
            Some(&slot) => self.suites[slot] = record,
            None => {
                self.index.insert(context.id.clone(), self.suites.len());
                self.suites.push(record);
            }
        }
    }

    /// Append a case for `outcome`. Returns false when nothing was recorded,
    /// either because the context never started or the parser skipped it.
    pub fn record(
        &mut self,
        context: &Context,
        outcome: &Outcome,
        parser: &DescriptionParser,
        format_error: &dyn Fn(&str) -> String,
    ) -> bool {
        let Some(suite) = self.get_mut(&context.id) else {
            tracing::debug!("Outcome for context '{}' without a started suite, dropping", context.id);
            return false;
        };
        let Some(parsed) = parser.parse(&outcome.description) else {
            tracing::debug!("Untagged outcome skipped: {:?}", outcome.description);
            return false;
        };
        tracing::debug!("tagged: {} | id: {}", parsed.is_tagged, parsed.identifier);

        let failures = if outcome.success {
            Vec::new()
        } else {
            outcome.log.iter().map(|line| format_error(line.as_str())).collect()
        };

        suite.cases.push(CaseRecord {
            identifier: parsed.identifier,
            name: parsed.display_name,
            time_secs: outcome.time_secs(),
            classname: classname(&outcome.suite),
            success: outcome.success,
            failures,
        });
        true
    }

    /// Write the final counters. Returns false when the context never started.
    pub fn complete(&mut self, context: &Context, result: &ContextResult) -> bool {
        let Some(suite) = self.get_mut(&context.id) else {
            return false;
        };
        suite.totals = Some(SuiteTotals {
            tests: result.total,
            errors: u32::from(result.errored()),
            failures: result.failed,
            time_secs: result.net_time_secs(),
        });
        true
    }

    pub fn get(&self, id: &str) -> Option<&SuiteRecord> {
        self.index.get(id).map(|&slot| &self.suites[slot])
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut SuiteRecord> {
        match self.index.get(id) {
            Some(&slot) => Some(&mut self.suites[slot]),
            None => None,
        }
    }

    pub fn suites(&self) -> &[SuiteRecord] {
        &self.suites
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}
