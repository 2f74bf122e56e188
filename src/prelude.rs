//! Commonly used types in one import.
//!
//! ```rust
//! use ntcip_snmp::prelude::*;
//!
//! let oid = oid!(1, 3, 6, 1, 4, 1, 1206, 4, 2, 3, 1, 2, 0);
//! let var = Variable::integer32(oid, 6);
//! assert_eq!(var.to_i32().unwrap(), 6);
//! ```

pub use crate::error::{Error, Result};
pub use crate::oid::Oid;
pub use crate::pmpp::PmppEndPoint;
pub use crate::session::Session;
pub use crate::transport::Transport;
pub use crate::variable::Variable;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
