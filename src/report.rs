//! Output formatting for check results.
//!
//! Supports three output formats:
//! - XML: the format the submission clients parse from the hook's stderr
//! - JSON: structured output for programmatic consumption
//! - Pretty: colored terminal output for human readability

use colored::*;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::collector::ResultCollector;
use crate::message::{ResultMessage, Severity};
use crate::submission::Phase;

/// Report format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Xml,
    Json,
    Pretty,
}

/// Write the report for `collector` in `format`.
pub fn write_report<W: Write>(
    out: &mut W,
    format: ReportFormat,
    collector: &ResultCollector,
    phase: Phase,
) -> anyhow::Result<()> {
    match format {
        ReportFormat::Xml => write_xml(out, collector.messages())?,
        ReportFormat::Json => write_json(out, collector, phase)?,
        ReportFormat::Pretty => write_pretty(out, collector, phase)?,
    }
    out.flush()?;
    Ok(())
}

// =============================================================================
// XML Format
// =============================================================================

const XML_ROOT: &str = "submitResults";
const XML_INDENT: &str = "    ";

/// Escape a value for use inside a double-quoted XML attribute.
fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_xml_message(message: &ResultMessage, out: &mut String) {
    // attributes in alphabetical order
    let mut attributes: Vec<(&str, String)> = Vec::with_capacity(5);
    if let Some(file) = message.file_display() {
        attributes.push(("file", file));
    }
    if let Some(line) = message.line() {
        attributes.push(("line", line.to_string()));
    }
    attributes.push(("message", message.message.clone()));
    attributes.push(("tool", message.check_name.clone()));
    attributes.push(("type", message.severity.to_string()));

    out.push_str(XML_INDENT);
    out.push_str("<message");
    for (name, value) in &attributes {
        out.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
    }

    match message.column() {
        Some(column) => {
            out.push_str(">\n");
            out.push_str(&format!("{0}{0}<example position=\"{1}\"/>\n", XML_INDENT, column));
            out.push_str(XML_INDENT);
            out.push_str("</message>\n");
        }
        None => out.push_str("/>\n"),
    }
}

/// Render messages as the `<submitResults>` document.
pub fn format_xml(messages: &[ResultMessage]) -> String {
    if messages.is_empty() {
        return format!("<{}/>\n", XML_ROOT);
    }

    let mut out = format!("<{}>\n", XML_ROOT);
    for message in messages {
        format_xml_message(message, &mut out);
    }
    out.push_str(&format!("</{}>\n", XML_ROOT));
    out
}

pub fn write_xml<W: Write>(out: &mut W, messages: &[ResultMessage]) -> std::io::Result<()> {
    out.write_all(format_xml(messages).as_bytes())
}

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub phase: String,
    pub success: bool,
    pub exit_code: i32,
    pub messages: Vec<JsonMessage>,
    pub submissions: Vec<JsonSubmission>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonMessage {
    pub tool: String,
    #[serde(rename = "type")]
    pub severity: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// Messages attributed to one submission.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonSubmission {
    pub exercise: String,
    pub group: String,
    pub messages: Vec<JsonMessage>,
}

fn message_to_json(m: &ResultMessage) -> JsonMessage {
    JsonMessage {
        tool: m.check_name.clone(),
        severity: m.severity.to_string(),
        message: m.message.clone(),
        file: m.file_display(),
        line: m.line(),
        column: m.column(),
    }
}

pub fn json_report(collector: &ResultCollector, phase: Phase) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        phase: phase.to_string(),
        success: collector.all_successful(),
        exit_code: collector.exit_code(phase),
        messages: collector.messages().iter().map(message_to_json).collect(),
        submissions: collector
            .submissions()
            .map(|(submission, messages)| JsonSubmission {
                exercise: submission.exercise().to_string(),
                group: submission.group().to_string(),
                messages: messages.iter().map(message_to_json).collect(),
            })
            .collect(),
    }
}

pub fn write_json<W: Write>(out: &mut W, collector: &ResultCollector, phase: Phase) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&json_report(collector, phase))?;
    writeln!(out, "{}", json)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

pub fn write_pretty<W: Write>(out: &mut W, collector: &ResultCollector, phase: Phase) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{} ({})",
        "submission-check".cyan().bold(),
        env!("CARGO_PKG_VERSION"),
        phase
    )?;
    writeln!(out)?;

    let messages = collector.messages();
    if !messages.is_empty() {
        writeln!(out, "  {} ({}):", "Messages".bold(), messages.len())?;
        writeln!(out)?;
        for m in messages {
            write_message(out, m)?;
        }
    }

    if collector.all_successful() {
        write!(out, "  {}", "✓ PASS".green())?;
    } else {
        write!(out, "  {}", "✗ FAIL".red())?;
    }
    writeln!(out, "  {}", format!("exit code {}", collector.exit_code(phase)).dimmed())?;
    writeln!(out)
}

fn write_message<W: Write>(out: &mut W, m: &ResultMessage) -> std::io::Result<()> {
    match m.severity {
        Severity::Error => write!(out, "    {} ", "ERROR".red())?,
        Severity::Warning => write!(out, "    {} ", "WARN ".yellow())?,
    }
    write!(out, "  {:<22}", m.check_name.dimmed())?;
    if let Some(file) = m.file_display() {
        write!(out, "{}", file.blue())?;
        if let Some(line) = m.line() {
            let location = match m.column() {
                Some(column) => format!(":{}:{}", line, column),
                None => format!(":{}", line),
            };
            write!(out, "{}", location.dimmed())?;
        }
    }
    writeln!(out)?;
    writeln!(out, "            {}", m.message)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::Submission;

    #[test]
    fn test_empty_xml() {
        assert_eq!(format_xml(&[]), "<submitResults/>\n");
    }

    #[test]
    fn test_xml_basic_message() {
        let messages = vec![ResultMessage::error("toolname", "my message")];
        assert_eq!(
            format_xml(&messages),
            "<submitResults>\n    <message message=\"my message\" tool=\"toolname\" type=\"error\"/>\n</submitResults>\n"
        );
    }

    #[test]
    fn test_xml_message_with_column() {
        let messages = vec![ResultMessage::error("javac", "';' expected")
            .with_file("Main.java")
            .with_line(4)
            .with_column(51)];
        assert_eq!(
            format_xml(&messages),
            concat!(
                "<submitResults>\n",
                "    <message file=\"Main.java\" line=\"4\" message=\"';' expected\" tool=\"javac\" type=\"error\">\n",
                "        <example position=\"51\"/>\n",
                "    </message>\n",
                "</submitResults>\n",
            )
        );
    }

    #[test]
    fn test_xml_multiple_messages_in_order() {
        let messages = vec![
            ResultMessage::error("toolB", "message number 1"),
            ResultMessage::error("toolA", "abc is wrong").with_file("abc.txt"),
            ResultMessage::warning("toolA", "numbers are wrong too")
                .with_file("dir/numbers.txt")
                .with_line(5),
        ];
        assert_eq!(
            format_xml(&messages),
            concat!(
                "<submitResults>\n",
                "    <message message=\"message number 1\" tool=\"toolB\" type=\"error\"/>\n",
                "    <message file=\"abc.txt\" message=\"abc is wrong\" tool=\"toolA\" type=\"error\"/>\n",
                "    <message file=\"dir/numbers.txt\" line=\"5\" message=\"numbers are wrong too\" tool=\"toolA\" type=\"warning\"/>\n",
                "</submitResults>\n",
            )
        );
    }

    #[test]
    fn test_xml_escaping() {
        let messages = vec![ResultMessage::error("too<l>name", "my \"message\" & more")];
        assert_eq!(
            format_xml(&messages),
            "<submitResults>\n    <message message=\"my &quot;message&quot; &amp; more\" tool=\"too&lt;l&gt;name\" type=\"error\"/>\n</submitResults>\n"
        );
    }

    #[test]
    fn test_xml_line_without_file_is_omitted() {
        let messages = vec![ResultMessage::error("tool", "msg").with_line(3).with_column(2)];
        assert_eq!(
            format_xml(&messages),
            "<submitResults>\n    <message message=\"msg\" tool=\"tool\" type=\"error\"/>\n</submitResults>\n"
        );
    }

    #[test]
    fn test_json_report() {
        let submission = Submission::new("Homework01", "Group03");
        let mut collector = ResultCollector::new();
        collector.add_check_result(true);
        collector.add_message(
            ResultMessage::warning("eclipse-configuration", "Submission does not have Checkstyle enabled")
                .with_file(".project"),
            Some(&submission),
        );

        let report = json_report(&collector, Phase::PostCommit);
        assert!(report.success);
        assert_eq!(report.exit_code, 1);
        assert_eq!(report.phase, "post-commit");
        assert_eq!(report.messages.len(), 1);
        assert_eq!(report.submissions.len(), 1);
        assert_eq!(report.submissions[0].group, "Group03");

        let mut out = Vec::new();
        write_json(&mut out, &collector, Phase::PostCommit).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["messages"][0]["type"], "warning");
        assert_eq!(parsed["messages"][0]["file"], ".project");
        assert!(parsed["messages"][0].get("line").is_none());
    }

    #[test]
    fn test_pretty_contains_messages() {
        colored::control::set_override(false);
        let mut collector = ResultCollector::new();
        collector.add_check_result(false);
        collector.add_message(
            ResultMessage::error("javac", "';' expected").with_file("Main.java").with_line(4),
            None,
        );

        let mut out = Vec::new();
        write_pretty(&mut out, &collector, Phase::PreCommit).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Main.java:4"));
        assert!(text.contains("';' expected"));
        assert!(text.contains("FAIL"));
    }
}
