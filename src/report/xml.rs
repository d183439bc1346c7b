use std::borrow::Cow;

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::suite::{CaseRecord, SuiteRecord};

/// Render suites as a JUnit `testsuites` document, pretty-printed with two-space indent.
pub fn render(suites: &[SuiteRecord]) -> crate::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;

    if suites.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new("testsuites")))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new("testsuites")))?;
        for suite in suites {
            write_suite(&mut writer, suite)?;
        }
        writer.write_event(Event::End(BytesEnd::new("testsuites")))?;
    }

    Ok(writer.into_inner())
}

fn write_suite(writer: &mut Writer<Vec<u8>>, suite: &SuiteRecord) -> crate::Result<()> {
    let mut start = BytesStart::new("testsuite");
    start.push_attribute(("name", strip_invalid(&suite.name).as_ref()));
    start.push_attribute(("package", strip_invalid(&suite.package).as_ref()));
    start.push_attribute(("timestamp", suite.timestamp.as_str()));
    start.push_attribute(("id", "0"));
    start.push_attribute(("hostname", strip_invalid(&suite.hostname).as_ref()));
    if let Some(totals) = &suite.totals {
        start.push_attribute(("tests", totals.tests.to_string().as_str()));
        start.push_attribute(("errors", totals.errors.to_string().as_str()));
        start.push_attribute(("failures", totals.failures.to_string().as_str()));
        start.push_attribute(("time", format_number(totals.time_secs).as_str()));
    }

    if suite.cases.is_empty() && suite.totals.is_none() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for case in &suite.cases {
        write_case(writer, case)?;
    }
    if suite.totals.is_some() {
        writer.write_event(Event::Empty(BytesStart::new("system-err")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    Ok(())
}

fn write_case(writer: &mut Writer<Vec<u8>>, case: &CaseRecord) -> crate::Result<()> {
    let mut start = BytesStart::new("testcase");
    start.push_attribute(("requirements", strip_invalid(&case.identifier).as_ref()));
    start.push_attribute(("name", strip_invalid(&case.name).as_ref()));
    start.push_attribute(("time", format_number(case.time_secs).as_str()));
    start.push_attribute(("classname", strip_invalid(&case.classname).as_ref()));

    if case.failures.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for message in &case.failures {
        let mut failure = BytesStart::new("failure");
        failure.push_attribute(("type", ""));
        writer.write_event(Event::Start(failure))?;
        // Quotes stay literal in text content; only markup characters are escaped.
        let text = strip_invalid(message);
        writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text.as_ref()))))?;
        writer.write_event(Event::End(BytesEnd::new("failure")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// Drop characters XML 1.0 cannot carry even escaped, such as the ESC of ANSI colour codes.
pub fn strip_invalid(value: &str) -> Cow<'_, str> {
    if value.chars().all(is_xml_char) {
        Cow::Borrowed(value)
    } else {
        Cow::Owned(value.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

/// Shortest decimal form: `10.0` renders as `10`, `0.25` as `0.25`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // also folds -0.0
        return "0".to_string();
    }
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::suite::SuiteTotals;

    fn to_string(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    fn suite_with(cases: Vec<CaseRecord>, totals: Option<SuiteTotals>) -> SuiteRecord {
        let mut suite = SuiteRecord::new("Chrome", "ui", "2024-05-06T07:08:09", "build-01");
        suite.cases = cases;
        suite.totals = totals;
        suite
    }

    fn passing_case() -> CaseRecord {
        CaseRecord {
            identifier: "Not defined".to_string(),
            name: "should not fail".to_string(),
            time_secs: 0.0,
            classname: "Sender using it get request".to_string(),
            success: true,
            failures: vec![],
        }
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(10.0), "10");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(1.001), "1.001");
    }

    #[test]
    fn test_strip_invalid() {
        assert!(matches!(strip_invalid("plain\ttext\n"), Cow::Borrowed(_)));
        assert_eq!(strip_invalid("\u{1b}[31mred\u{1b}[0m"), "[31mred[0m");
        assert_eq!(strip_invalid("a\u{0}b\u{FFFE}c\u{FFFF}"), "abc");
        assert_eq!(strip_invalid("üëç \u{1F600}"), "üëç \u{1F600}");
    }

    #[test]
    fn test_control_characters_removed_from_output() {
        let case = CaseRecord {
            name: "colours\u{7}".to_string(),
            success: false,
            failures: vec!["\u{1b}[31mExpected 1 to be 2\u{1b}[39m".to_string()],
            ..passing_case()
        };
        let xml = to_string(render(&[suite_with(vec![case], None)]).unwrap());

        assert!(xml.contains("<failure type=\"\">[31mExpected 1 to be 2[39m</failure>"));
        assert!(xml.contains("name=\"colours\""));
        assert!(!xml.chars().any(|c| c != '\n' && c.is_control()));
    }

    #[test]
    fn test_empty_document() {
        let xml = to_string(render(&[]).unwrap());
        assert_eq!(xml, "<?xml version=\"1.0\"?>\n<testsuites/>");
    }

    #[test]
    fn test_full_document_layout() {
        let totals = SuiteTotals { tests: 1, errors: 0, failures: 0, time_secs: 10.0 };
        let xml = to_string(render(&[suite_with(vec![passing_case()], Some(totals))]).unwrap());

        let expected = [
            "<?xml version=\"1.0\"?>",
            "<testsuites>",
            "  <testsuite name=\"Chrome\" package=\"ui\" timestamp=\"2024-05-06T07:08:09\" id=\"0\" hostname=\"build-01\" tests=\"1\" errors=\"0\" failures=\"0\" time=\"10\">",
            "    <testcase requirements=\"Not defined\" name=\"should not fail\" time=\"0\" classname=\"Sender using it get request\"/>",
            "    <system-err/>",
            "  </testsuite>",
            "</testsuites>",
        ]
        .join("\n");
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_unfinished_suite_has_no_counters() {
        let xml = to_string(render(&[suite_with(vec![], None)]).unwrap());
        assert!(xml.contains(
            "<testsuite name=\"Chrome\" package=\"ui\" timestamp=\"2024-05-06T07:08:09\" id=\"0\" hostname=\"build-01\"/>"
        ));
        assert!(!xml.contains("tests="));
        assert!(!xml.contains("system-err"));
    }

    #[test]
    fn test_failures_are_escaped_text() {
        let case = CaseRecord {
            success: false,
            failures: vec![
                "Expected \"üëç\" to be \"üëé\".".to_string(),
                "a < b && c > d".to_string(),
            ],
            ..passing_case()
        };
        let xml = to_string(render(&[suite_with(vec![case], None)]).unwrap());

        assert!(xml.contains("<failure type=\"\">Expected \"üëç\" to be \"üëé\".</failure>"));
        assert!(xml.contains("<failure type=\"\">a &lt; b &amp;&amp; c &gt; d</failure>"));
        assert_eq!(xml.matches("<failure ").count(), 2);
    }

    #[test]
    fn test_attributes_are_escaped() {
        let case = CaseRecord {
            name: "handles \"quotes\" & <tags>".to_string(),
            ..passing_case()
        };
        let xml = to_string(render(&[suite_with(vec![case], None)]).unwrap());
        assert!(xml.contains("name=\"handles &quot;quotes&quot; &amp; &lt;tags&gt;\""));
    }

    #[test]
    fn test_render_is_deterministic() {
        let totals = SuiteTotals { tests: 2, errors: 1, failures: 1, time_secs: 0.5 };
        let suites = vec![suite_with(vec![passing_case(), passing_case()], Some(totals))];
        assert_eq!(render(&suites).unwrap(), render(&suites).unwrap());
    }
}
