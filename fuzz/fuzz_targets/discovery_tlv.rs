//! Fuzz target for the discovery TLV parser
//!
//! Server advertisements come off the open network, so the TLV walk must
//! survive arbitrary input: truncated records, hostile lengths, duplicate
//! and unprintable tokens. Parsing never panics and always terminates.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slimwire_client::parse_tlv;

fuzz_target!(|data: &[u8]| {
    let _ = parse_tlv(data);
});
