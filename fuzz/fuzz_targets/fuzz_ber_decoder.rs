#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use ntcip_snmp::ber::{Decoder, tag};
use ntcip_snmp::variable::{Variable, decode_variable_list};

fuzz_target!(|data: &[u8]| {
    let bytes = Bytes::copy_from_slice(data);

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_integer();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_unsigned32(tag::application::GAUGE32);

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_octet_string();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_oid();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decoder.read_ip_address();

    let mut decoder = Decoder::new(bytes.clone());
    let _ = decode_variable_list(&mut decoder);

    // Accessors must not panic on whatever a binding carries
    if let Ok(var) = Variable::from_bytes(bytes) {
        let _ = var.to_i32();
        let _ = var.to_u64();
        let _ = var.to_object_identifier();
        let _ = var.to_ip_address();
        let _ = var.to_date_time();
        let _ = var.to_string();
    }
});
