//! Session configuration builder.

use std::time::Duration;

use crate::pmpp::PmppEndPoint;
use crate::transport::Transport;
use crate::version::Version;

use super::Session;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Community string (default `public`).
    pub community: String,
    /// Protocol version (default v1).
    pub version: Version,
    /// Time to wait for each attempt (default 5 s).
    pub timeout: Duration,
    /// Resends after the first attempt (default 3).
    pub retries: u32,
    /// PMPP station to frame requests for. `None` sends bare messages,
    /// unless the transport is framed.
    pub pmpp: Option<PmppEndPoint>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            community: "public".into(),
            version: Version::V1,
            timeout: Duration::from_secs(5),
            retries: 3,
            pmpp: None,
        }
    }
}

/// Builder for [`Session`].
///
/// ```rust,no_run
/// # use ntcip_snmp::session::Session;
/// # use ntcip_snmp::pmpp::PmppEndPoint;
/// # use ntcip_snmp::transport::LinkTransport;
/// # use std::time::Duration;
/// # async fn example() -> ntcip_snmp::Result<()> {
/// let link = LinkTransport::connect_tcp("10.20.0.15:4001").await?;
/// let session = Session::builder(link)
///     .community("administrator")
///     .timeout(Duration::from_secs(2))
///     .retries(2)
///     .pmpp(PmppEndPoint::new(&[0x07], 0x03, &[0xC1])?)
///     .build();
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder<T> {
    transport: T,
    config: SessionConfig,
}

impl<T: Transport> SessionBuilder<T> {
    pub(crate) fn new(transport: T) -> Self {
        Self {
            transport,
            config: SessionConfig::default(),
        }
    }

    pub fn community(mut self, community: impl Into<String>) -> Self {
        self.config.community = community.into();
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.config.version = version;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Frame requests for this PMPP station.
    pub fn pmpp(mut self, endpoint: PmppEndPoint) -> Self {
        self.config.pmpp = Some(endpoint);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(mut self) -> Session<T> {
        if self.config.pmpp.is_none() && self.transport.is_framed() {
            self.config.pmpp = Some(PmppEndPoint::NTCIP_DEFAULT);
        }
        Session::new(self.transport, self.config)
    }
}
