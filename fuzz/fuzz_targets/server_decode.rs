//! Fuzz target for `ServerMessage::decode`
//!
//! Feeds arbitrary byte sequences through the inbound codec to find:
//! - Parser panics or arithmetic overflows
//! - Buffer over-reads behind recognized opcodes
//! - Inputs that are neither a typed variant nor a structured error
//!
//! The decoder must NEVER panic: every input either decodes to exactly one
//! variant (`Unknown` included) or returns a `ProtocolError`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slimwire_proto::ServerMessage;

fuzz_target!(|data: &[u8]| {
    let _ = ServerMessage::decode(data);
});
