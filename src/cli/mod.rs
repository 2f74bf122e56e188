//! CLI utilities for the `ntcip-*` tools.
//!
//! Argument parsing, output formatting and OID name hints. Only available
//! with the `cli` feature.

pub mod args;
pub mod hints;
pub mod output;

use tokio::net::TcpStream;

use crate::error::Result;
use crate::session::{Session, SessionConfig, SessionStats};
use crate::transport::{LinkTransport, UdpTransport};
use crate::{Oid, Variable};

use args::{CommonArgs, LinkArgs, LinkKind};

/// A session over whichever link the command line selected.
pub enum CliSession {
    Udp(Session<UdpTransport>),
    Pmpp(Session<LinkTransport<TcpStream>>),
}

impl CliSession {
    /// Open the link and build a session from parsed arguments.
    pub async fn connect(common: &CommonArgs, link: &LinkArgs) -> Result<Self> {
        let config = SessionConfig {
            community: common.community.clone(),
            version: common.snmp_version.into(),
            timeout: common.timeout_duration(),
            retries: common.retries,
            pmpp: link.endpoint()?,
        };

        match link.link {
            LinkKind::Udp => {
                let target = common.target_addr(161).map_err(invalid_target)?;
                let transport = UdpTransport::connect(target).await?;
                Ok(Self::Udp(Session::builder(transport).config(config).build()))
            }
            LinkKind::PmppTcp => {
                let transport = LinkTransport::connect_tcp(common.target.as_str()).await?;
                Ok(Self::Pmpp(Session::builder(transport).config(config).build()))
            }
        }
    }

    pub async fn get_many(&self, oids: &[Oid]) -> Result<Vec<Variable>> {
        match self {
            Self::Udp(session) => session.get_many(oids).await,
            Self::Pmpp(session) => session.get_many(oids).await,
        }
    }

    pub async fn walk_all(&self, oid: Oid) -> Result<Vec<Variable>> {
        match self {
            Self::Udp(session) => session.walk_all(oid).await,
            Self::Pmpp(session) => session.walk_all(oid).await,
        }
    }

    pub fn stats(&self) -> SessionStats {
        match self {
            Self::Udp(session) => session.stats(),
            Self::Pmpp(session) => session.stats(),
        }
    }
}

fn invalid_target(msg: String) -> crate::Error {
    crate::Error::io(
        None,
        std::io::Error::new(std::io::ErrorKind::InvalidInput, msg),
    )
}
