//! SNMP manager for NTCIP roadside devices.
//!
//! `ntcip-snmp` encodes and decodes SNMPv1/v2c messages with a BER codec and
//! carries them either as UDP datagrams or inside PMPP frames, the HDLC-style
//! framing NTCIP uses on multidrop serial lines.
//!
//! # Layers
//!
//! - [`ber`]: tag/length/value primitives.
//! - [`oid`], [`variable`], [`pdu`]: object identifiers, variable bindings
//!   and whole messages.
//! - [`pmpp`]: frame stuffing, FCS-16 and address fields.
//! - [`transport`]: UDP and stream-based PMPP links behind one trait.
//! - [`session`]: request ids, retries, timeouts, walks and counters.
//!
//! # Example
//!
//! ```rust,no_run
//! use ntcip_snmp::prelude::*;
//! use ntcip_snmp::transport::LinkTransport;
//!
//! # async fn example() -> ntcip_snmp::Result<()> {
//! let link = LinkTransport::connect_tcp("10.20.0.15:4001").await?;
//! let session = Session::builder(link)
//!     .community("public")
//!     .pmpp(PmppEndPoint::new(&[0x05], 0x03, &[0xC1])?)
//!     .build();
//!
//! let sign_type = session.get(&oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 2, 0)).await?;
//! println!("{}", sign_type);
//! println!("{:?}", session.stats());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod ber;
pub mod error;
pub mod oid;
pub mod pdu;
pub mod pmpp;
pub mod prelude;
pub mod session;
pub mod transport;
mod util;
pub mod variable;
pub mod version;

#[cfg(feature = "cli")]
#[cfg_attr(docsrs, doc(cfg(feature = "cli")))]
pub mod cli;

pub use ber::SnmpType;
pub use error::{Error, ErrorStatus, Result};
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use pmpp::PmppEndPoint;
pub use session::{Session, SessionBuilder, SessionConfig, SessionStats};
pub use variable::Variable;
pub use version::Version;
