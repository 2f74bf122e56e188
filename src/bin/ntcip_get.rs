//! ntcip-get: Retrieve object values from an NTCIP device.
//!
//! Part of the ntcip-snmp CLI utilities.

use clap::Parser;
use ntcip_snmp::{Oid, Version};
use ntcip_snmp::cli::CliSession;
use ntcip_snmp::cli::args::{CommonArgs, LinkArgs, OutputArgs};
use ntcip_snmp::cli::hints::parse_oid;
use ntcip_snmp::cli::output::{
    OperationType, OutputContext, RequestInfo, write_error, write_verbose_request,
    write_verbose_response,
};
use std::process::ExitCode;
use std::time::Instant;

/// Retrieve one or more object values over UDP or a PMPP link.
#[derive(Debug, Parser)]
#[command(name = "ntcip-get", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    link: LinkArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// OIDs to retrieve (dotted notation or well-known names).
    #[arg(required = true, value_name = "OID")]
    oids: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let oids: Vec<Oid> = match args.oids.iter().map(|s| parse_oid(s)).collect() {
        Ok(oids) => oids,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let session = match CliSession::connect(&args.common, &args.link).await {
        Ok(session) => session,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let version = Version::from(args.common.snmp_version);
    if args.output.verbose > 0 {
        write_verbose_request(&RequestInfo {
            target: args.common.target.clone(),
            version,
            community: args.common.community.clone(),
            pmpp: args.link.endpoint().ok().flatten(),
            operation: OperationType::Get,
            oids: oids.clone(),
        });
    }

    let start = Instant::now();
    let result = session.get_many(&oids).await;
    let elapsed = start.elapsed();
    let stats = session.stats();

    match result {
        Ok(variables) => {
            if args.output.verbose > 0 {
                write_verbose_response(&variables, elapsed, &stats, !args.output.no_hints);
            }

            let output_ctx = OutputContext {
                format: args.output.format,
                show_hints: !args.output.no_hints,
                force_hex: args.output.hex,
                show_timing: args.output.timing,
            };
            let timing = args.output.timing.then_some(elapsed);

            if let Err(e) = output_ctx.write_results(
                &args.common.target,
                version,
                &variables,
                timing,
                timing.map(|_| stats),
            ) {
                eprintln!("Error writing output: {}", e);
                return ExitCode::FAILURE;
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            write_error(&e);
            ExitCode::FAILURE
        }
    }
}
