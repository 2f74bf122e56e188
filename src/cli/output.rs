//! Output formatting for CLI tools.
//!
//! Supports human-readable and JSON output.

use crate::ber::SnmpType;
use crate::cli::args::OutputFormat;
use crate::cli::hints;
use crate::pmpp::PmppEndPoint;
use crate::session::SessionStats;
use crate::{Oid, Variable, Version};
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;

/// Operation type for verbose output.
#[derive(Debug, Clone, Copy)]
pub enum OperationType {
    Get,
    GetNext,
    Walk,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::GetNext => write!(f, "GETNEXT"),
            Self::Walk => write!(f, "WALK (GETNEXT)"),
        }
    }
}

/// Request metadata for verbose output.
#[derive(Debug)]
pub struct RequestInfo {
    pub target: String,
    pub version: Version,
    pub community: String,
    pub pmpp: Option<PmppEndPoint>,
    pub operation: OperationType,
    pub oids: Vec<Oid>,
}

/// Write verbose request header to stderr.
pub fn write_verbose_request(info: &RequestInfo) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "--- Request ---");
    let _ = writeln!(stderr, "Target:    {}", info.target);
    let _ = writeln!(stderr, "Version:   {}", info.version);
    let _ = writeln!(stderr, "Community: {}", info.community);

    match &info.pmpp {
        Some(endpoint) => {
            let _ = writeln!(
                stderr,
                "Link:      PMPP address {} control {:02X} pid {}",
                format_hex_string(endpoint.address.as_bytes()),
                endpoint.control,
                format_hex_string(endpoint.protocol_identifier.as_bytes()),
            );
        }
        None => {
            let _ = writeln!(stderr, "Link:      UDP");
        }
    }

    let _ = writeln!(stderr, "Operation: {}", info.operation);
    let _ = writeln!(stderr, "OIDs:      {} total", info.oids.len());
    for oid in &info.oids {
        if let Some(h) = hints::lookup(oid) {
            let _ = writeln!(stderr, "  {} ({})", oid, h);
        } else {
            let _ = writeln!(stderr, "  {}", oid);
        }
    }
    let _ = writeln!(stderr);
}

/// Write verbose response summary to stderr.
pub fn write_verbose_response(
    variables: &[Variable],
    elapsed: Duration,
    stats: &SessionStats,
    show_hints: bool,
) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "--- Response ---");
    let _ = writeln!(stderr, "Results:   {} variable(s)", variables.len());
    let _ = writeln!(stderr, "Time:      {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    let _ = writeln!(
        stderr,
        "Link:      {} timeout(s), {} retr(ies), {} CRC error(s), {} stale",
        stats.timeouts, stats.retries, stats.crc_errors, stats.stale
    );
    let _ = writeln!(stderr);

    for var in variables {
        write_verbose_variable(&mut stderr, var, show_hints);
    }

    if !variables.is_empty() {
        let _ = writeln!(stderr);
    }
}

fn write_verbose_variable<W: Write>(w: &mut W, var: &Variable, show_hints: bool) {
    let hint = if show_hints {
        hints::lookup(&var.identifier)
    } else {
        None
    };
    if let Some(h) = hint {
        let _ = writeln!(w, "  {} ({})", var.identifier, h);
    } else {
        let _ = writeln!(w, "  {}", var.identifier);
    }

    let formatted = format_value(var, false);
    let _ = writeln!(w, "    Type:    {}", formatted.type_name);
    let _ = writeln!(
        w,
        "    Value:   {}",
        formatted.display.unwrap_or_else(|| formatted.json.to_string())
    );
    if !var.value.is_empty() {
        let _ = writeln!(w, "    Raw:     {}", format_hex_string(&var.value));
        let _ = writeln!(w, "    Size:    {} bytes", var.value.len());
    }
}

/// Result of a GET/WALK operation, ready for output.
#[derive(Debug, Serialize)]
pub struct OperationResult {
    pub target: String,
    pub version: String,
    pub results: Vec<VariableResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SessionStats>,
}

/// A single variable, ready for output.
#[derive(Debug, Serialize)]
pub struct VariableResult {
    pub oid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(rename = "type")]
    pub value_type: String,
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_hex: Option<String>,
}

/// Output context for formatting.
pub struct OutputContext {
    pub format: OutputFormat,
    pub show_hints: bool,
    pub force_hex: bool,
    pub show_timing: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            show_hints: true,
            force_hex: false,
            show_timing: false,
        }
    }

    /// Write operation results to stdout.
    pub fn write_results(
        &self,
        target: &str,
        version: Version,
        variables: &[Variable],
        elapsed: Option<Duration>,
        stats: Option<SessionStats>,
    ) -> io::Result<()> {
        let result = self.build_result(target, version, variables, elapsed, stats);
        let mut stdout = io::stdout().lock();

        match self.format {
            OutputFormat::Human => self.write_human(&mut stdout, &result),
            OutputFormat::Json => self.write_json(&mut stdout, &result),
        }
    }

    fn build_result(
        &self,
        target: &str,
        version: Version,
        variables: &[Variable],
        elapsed: Option<Duration>,
        stats: Option<SessionStats>,
    ) -> OperationResult {
        OperationResult {
            target: target.to_string(),
            version: version.to_string(),
            results: variables.iter().map(|v| self.format_variable(v)).collect(),
            timing_ms: elapsed.map(|d| d.as_secs_f64() * 1000.0),
            stats,
        }
    }

    fn format_variable(&self, var: &Variable) -> VariableResult {
        let hint = if self.show_hints {
            hints::lookup(&var.identifier).map(String::from)
        } else {
            None
        };
        let formatted = format_value(var, self.force_hex);

        VariableResult {
            oid: var.identifier.to_string(),
            hint,
            value_type: formatted.type_name,
            value: formatted.json,
            formatted: formatted.display,
            raw_hex: formatted.raw_hex,
        }
    }

    fn write_human<W: Write>(&self, w: &mut W, result: &OperationResult) -> io::Result<()> {
        for var in &result.results {
            if let Some(ref hint) = var.hint {
                write!(w, "{} ({})", var.oid, hint)?;
            } else {
                write!(w, "{}", var.oid)?;
            }

            write!(w, " = {}: ", var.value_type)?;

            if let Some(ref formatted) = var.formatted {
                writeln!(w, "{}", formatted)?;
            } else {
                match &var.value {
                    serde_json::Value::String(s) => writeln!(w, "\"{}\"", s)?,
                    serde_json::Value::Null => writeln!(w)?,
                    other => writeln!(w, "{}", other)?,
                }
            }
        }

        if self.show_timing
            && let Some(ms) = result.timing_ms
        {
            match &result.stats {
                Some(stats) if stats.retries > 0 => {
                    writeln!(w, "\nTiming: {:.1}ms ({} retries)", ms, stats.retries)?
                }
                _ => writeln!(w, "\nTiming: {:.1}ms", ms)?,
            }
        }

        Ok(())
    }

    fn write_json<W: Write>(&self, w: &mut W, result: &OperationResult) -> io::Result<()> {
        let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
        writeln!(w, "{}", json)
    }
}

struct FormattedValue {
    type_name: String,
    json: serde_json::Value,
    display: Option<String>,
    raw_hex: Option<String>,
}

impl FormattedValue {
    fn plain(type_name: impl Into<String>, json: serde_json::Value) -> Self {
        Self {
            type_name: type_name.into(),
            json,
            display: None,
            raw_hex: None,
        }
    }

    fn hex(type_name: impl Into<String>, bytes: &[u8]) -> Self {
        let hex = hex_string(bytes);
        Self {
            type_name: type_name.into(),
            json: serde_json::Value::String(hex.clone()),
            display: Some(format_hex_string(bytes)),
            raw_hex: Some(hex),
        }
    }

    fn invalid(var: &Variable) -> Self {
        let mut formatted = Self::hex(format!("{} (invalid)", var.type_code), &var.value);
        formatted.json = serde_json::Value::Null;
        formatted
    }
}

fn format_value(var: &Variable, force_hex: bool) -> FormattedValue {
    let bytes = &var.value;
    match var.type_code {
        SnmpType::Integer32 => match var.to_i32() {
            Ok(v) => FormattedValue::plain("INTEGER", v.into()),
            Err(_) => FormattedValue::invalid(var),
        },

        SnmpType::OctetString => {
            if force_hex || !is_printable(bytes) {
                FormattedValue::hex("Hex-STRING", bytes)
            } else {
                let mut formatted = FormattedValue::plain(
                    "STRING",
                    serde_json::Value::String(var.to_string_lossy()),
                );
                formatted.raw_hex = Some(hex_string(bytes));
                formatted
            }
        }

        SnmpType::Null => FormattedValue::plain("NULL", serde_json::Value::Null),

        SnmpType::ObjectIdentifier => match var.to_object_identifier() {
            Ok(oid) => {
                let mut formatted =
                    FormattedValue::plain("OID", serde_json::Value::String(oid.to_string()));
                formatted.display = hints::lookup(&oid).map(|h| format!("{} ({})", oid, h));
                formatted
            }
            Err(_) => FormattedValue::invalid(var),
        },

        SnmpType::IpAddress => match var.to_ip_address() {
            Ok(ip) => FormattedValue::plain("IpAddress", serde_json::Value::String(ip.to_string())),
            Err(_) => FormattedValue::invalid(var),
        },

        SnmpType::Counter32 | SnmpType::Gauge32 => match var.to_u32() {
            Ok(v) => FormattedValue::plain(var.type_code.to_string(), v.into()),
            Err(_) => FormattedValue::invalid(var),
        },

        SnmpType::TimeTicks => match var.to_u32() {
            Ok(v) => {
                let mut formatted = FormattedValue::plain("TimeTicks", v.into());
                formatted.display = Some(format!("({}) {}", v, format_timeticks(v)));
                formatted
            }
            Err(_) => FormattedValue::invalid(var),
        },

        SnmpType::Counter64 => match var.to_u64() {
            Ok(v) => FormattedValue::plain("Counter64", v.into()),
            Err(_) => FormattedValue::invalid(var),
        },

        SnmpType::NoSuchObject => {
            let mut formatted = FormattedValue::plain("NoSuchObject", serde_json::Value::Null);
            formatted.display = Some("No Such Object available".into());
            formatted
        }

        SnmpType::NoSuchInstance => {
            let mut formatted = FormattedValue::plain("NoSuchInstance", serde_json::Value::Null);
            formatted.display = Some("No Such Instance currently exists".into());
            formatted
        }

        SnmpType::EndOfMibView => {
            let mut formatted = FormattedValue::plain("EndOfMibView", serde_json::Value::Null);
            formatted.display = Some("No more variables left in this MIB View".into());
            formatted
        }

        SnmpType::Opaque => FormattedValue::hex("Opaque", bytes),

        other => FormattedValue::hex(format!("Unknown(0x{:02X})", other.tag()), bytes),
    }
}

/// Check if bytes are printable ASCII/UTF-8.
fn is_printable(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return true;
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        s.chars()
            .all(|c| c.is_ascii_graphic() || c.is_ascii_whitespace())
    } else {
        false
    }
}

/// Format bytes as hex string (lowercase, no separator).
fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Format bytes as spaced hex for display.
fn format_hex_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format TimeTicks as human-readable duration.
fn format_timeticks(centiseconds: u32) -> String {
    let total_seconds = centiseconds / 100;
    let cs = centiseconds % 100;

    let days = total_seconds / 86400;
    let hours = (total_seconds % 86400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if days > 0 {
        format!(
            "{}d {:02}:{:02}:{:02}.{:02}",
            days, hours, minutes, seconds, cs
        )
    } else {
        format!("{:02}:{:02}:{:02}.{:02}", hours, minutes, seconds, cs)
    }
}

/// Write an error message to stderr.
pub fn write_error(err: &crate::Error) {
    eprintln!("Error: {}", err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[test]
    fn test_format_timeticks() {
        // 1 day, 10:17:36.78
        assert_eq!(format_timeticks(12345678), "1d 10:17:36.78");
        assert_eq!(format_timeticks(360000), "01:00:00.00");
        assert_eq!(format_timeticks(0), "00:00:00.00");
    }

    #[test]
    fn test_is_printable() {
        assert!(is_printable(b"Hello World"));
        assert!(is_printable(b"Line 1\nLine 2"));
        assert!(is_printable(b""));
        assert!(!is_printable(&[0x00, 0x01, 0x02]));
        assert!(!is_printable(&[0x80, 0x81]));
    }

    #[test]
    fn test_hex_string() {
        assert_eq!(hex_string(&[0x00, 0x1A, 0x2B]), "001a2b");
        assert_eq!(format_hex_string(&[0x00, 0x1A, 0x2B]), "00 1A 2B");
    }

    #[test]
    fn test_format_value_types() {
        let sign_type = Variable::integer32(oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 2, 0), 6);
        let formatted = format_value(&sign_type, false);
        assert_eq!(formatted.type_name, "INTEGER");
        assert_eq!(formatted.json, serde_json::json!(6));

        let make = Variable::octet_string(oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 6, 1, 3, 1, 3, 1), b"ACME");
        let formatted = format_value(&make, false);
        assert_eq!(formatted.type_name, "STRING");
        assert_eq!(formatted.json, serde_json::json!("ACME"));
        assert_eq!(format_value(&make, true).type_name, "Hex-STRING");

        let uptime = Variable::unsigned32(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), SnmpType::TimeTicks, 360000);
        let formatted = format_value(&uptime, false);
        assert_eq!(formatted.display.as_deref(), Some("(360000) 01:00:00.00"));

        let missing = Variable::new(oid!(1, 3, 6, 1, 2, 1, 1, 9, 0), SnmpType::NoSuchInstance, Vec::new());
        assert_eq!(format_value(&missing, false).json, serde_json::Value::Null);
    }

    #[test]
    fn test_write_human_with_hint() {
        let ctx = OutputContext::new(OutputFormat::Human);
        let vars = vec![Variable::octet_string(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), b"DMS controller")];
        let result = ctx.build_result("10.0.0.5:161", Version::V1, &vars, None, None);

        let mut out = Vec::new();
        ctx.write_human(&mut out, &result).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1.3.6.1.2.1.1.1.0 (sysDescr.0) = STRING: \"DMS controller\"\n"
        );
    }

    #[test]
    fn test_write_json_includes_stats() {
        let ctx = OutputContext::new(OutputFormat::Json);
        let vars = vec![Variable::integer32(oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 2, 0), 6)];
        let stats = SessionStats {
            requests: 1,
            responses: 1,
            crc_errors: 1,
            ..SessionStats::default()
        };
        let result = ctx.build_result("127.0.0.1:4001", Version::V1, &vars, None, Some(stats));

        let mut out = Vec::new();
        ctx.write_json(&mut out, &result).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed["results"][0]["value"], 6);
        assert_eq!(parsed["results"][0]["hint"], "dmsSignType.0");
        assert_eq!(parsed["stats"]["crc_errors"], 1);
    }
}
