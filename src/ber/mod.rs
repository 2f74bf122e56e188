//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! Encoding is minimal BER. Decoding is permissive: non-minimal lengths and
//! integers are accepted, but a declared length that runs past the end of
//! the buffer always fails.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
pub use tag::SnmpType;
