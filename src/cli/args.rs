//! Command-line arguments shared by the CLI tools.

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use clap::{Args, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::pmpp::PmppEndPoint;
use crate::version::Version;

/// SNMP version selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SnmpVersion {
    #[value(name = "1")]
    V1,
    #[value(name = "2c")]
    V2c,
}

impl From<SnmpVersion> for Version {
    fn from(v: SnmpVersion) -> Self {
        match v {
            SnmpVersion::V1 => Version::V1,
            SnmpVersion::V2c => Version::V2c,
        }
    }
}

/// How the agent is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LinkKind {
    /// SNMP over UDP, one datagram per message.
    Udp,
    /// PMPP frames over a TCP terminal server.
    PmppTcp,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Target and protocol options.
#[derive(Debug, Args)]
pub struct CommonArgs {
    /// Agent address (host:port). Port defaults to 161 for UDP.
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Community string.
    #[arg(short = 'c', long, default_value = "public")]
    pub community: String,

    /// SNMP version.
    #[arg(long = "snmp-version", value_enum, default_value = "1")]
    pub snmp_version: SnmpVersion,

    /// Per-attempt timeout in seconds.
    #[arg(short = 't', long, default_value_t = 5.0)]
    pub timeout: f64,

    /// Resends after the first attempt.
    #[arg(short = 'r', long, default_value_t = 3)]
    pub retries: u32,
}

impl CommonArgs {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.timeout.max(0.0))
    }

    /// Resolve the target, adding `default_port` when none is given.
    pub fn target_addr(&self, default_port: u16) -> std::result::Result<SocketAddr, String> {
        let with_port = if self.target.contains(':') && !self.target.starts_with('[')
            || self.target.contains("]:")
        {
            self.target.clone()
        } else {
            format!("{}:{}", self.target, default_port)
        };
        with_port
            .to_socket_addrs()
            .map_err(|e| format!("cannot resolve '{}': {}", self.target, e))?
            .next()
            .ok_or_else(|| format!("no address for '{}'", self.target))
    }
}

/// Link framing options.
#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Transport to the agent.
    #[arg(long, value_enum, default_value = "udp")]
    pub link: LinkKind,

    /// PMPP station address, 1 or 2 hex bytes (e.g. 05 or 0203).
    #[arg(long, value_parser = parse_hex_bytes, default_value = "05")]
    pub address: std::vec::Vec<u8>,

    /// PMPP control byte in hex.
    #[arg(long, value_parser = parse_hex_byte, default_value = "03")]
    pub control: u8,

    /// PMPP protocol identifier, 1 or 2 hex bytes.
    #[arg(long, value_parser = parse_hex_bytes, default_value = "C1")]
    pub pid: std::vec::Vec<u8>,
}

impl LinkArgs {
    /// The PMPP endpoint, when the link is framed.
    pub fn endpoint(&self) -> Result<Option<PmppEndPoint>> {
        match self.link {
            LinkKind::Udp => Ok(None),
            LinkKind::PmppTcp => {
                PmppEndPoint::new(&self.address, self.control, &self.pid).map(Some)
            }
        }
    }
}

/// Output and logging options.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format.
    #[arg(long, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Show request details and counters on stderr. Repeat for debug logs.
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Show elapsed time.
    #[arg(long)]
    pub timing: bool,

    /// Print hex for all octet strings.
    #[arg(long)]
    pub hex: bool,

    /// Do not annotate OIDs with known names.
    #[arg(long)]
    pub no_hints: bool,
}

impl OutputArgs {
    /// Install a tracing subscriber on stderr. `RUST_LOG` overrides `-v`.
    pub fn init_tracing(&self) {
        let default = match self.verbose {
            0 => "ntcip_snmp=warn",
            1 => "ntcip_snmp=info",
            2 => "ntcip_snmp=debug",
            _ => "ntcip_snmp=trace",
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

fn parse_hex_bytes(s: &str) -> std::result::Result<Vec<u8>, String> {
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    if s.is_empty() || s.len() % 2 != 0 {
        return Err(format!("'{}' is not an even number of hex digits", s));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}

fn parse_hex_byte(s: &str) -> std::result::Result<u8, String> {
    match parse_hex_bytes(s)?.as_slice() {
        [b] => Ok(*b),
        _ => Err(format!("'{}' is not a single byte", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        link: LinkArgs,
        #[command(flatten)]
        output: OutputArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::parse_from(["ntcip-get", "10.0.0.5"]);
        assert_eq!(cli.common.community, "public");
        assert_eq!(cli.common.snmp_version, SnmpVersion::V1);
        assert_eq!(cli.common.timeout_duration(), Duration::from_secs(5));
        assert_eq!(cli.common.retries, 3);
        assert_eq!(cli.link.link, LinkKind::Udp);
        assert_eq!(cli.link.endpoint().unwrap(), None);
        assert_eq!(cli.output.format, OutputFormat::Human);
        assert_eq!(cli.common.target_addr(161).unwrap().port(), 161);
    }

    #[test]
    fn test_pmpp_options() {
        let cli = TestCli::parse_from([
            "ntcip-get",
            "127.0.0.1:4001",
            "--link",
            "pmpp-tcp",
            "--address",
            "0203",
            "--control",
            "13",
            "--snmp-version",
            "2c",
            "--format",
            "json",
            "-vv",
        ]);
        let endpoint = cli.link.endpoint().unwrap().unwrap();
        assert_eq!(endpoint.address.as_bytes(), &[0x02, 0x03]);
        assert_eq!(endpoint.control, 0x13);
        assert_eq!(endpoint.protocol_identifier.as_bytes(), &[0xC1]);
        assert_eq!(Version::from(cli.common.snmp_version), Version::V2c);
        assert_eq!(cli.output.verbose, 2);
        assert_eq!(cli.common.target_addr(161).unwrap().port(), 4001);
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(parse_hex_bytes("0xC1").unwrap(), vec![0xC1]);
        assert!(parse_hex_bytes("ABC").is_err());
        assert!(parse_hex_byte("0102").is_err());
    }

    #[test]
    fn test_oversized_address_rejected() {
        let cli = TestCli::parse_from([
            "ntcip-get",
            "127.0.0.1:4001",
            "--link",
            "pmpp-tcp",
            "--address",
            "000001",
        ]);
        assert!(cli.link.endpoint().is_err());
    }
}
