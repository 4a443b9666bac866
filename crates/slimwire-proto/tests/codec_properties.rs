//! Property-based tests for the SlimProto codec.
//!
//! These verify the framing and dispatch contracts for ALL inputs, not just
//! specific examples: every encoded client message carries its opcode and an
//! accurate length header, and no server frame — however exotic its opcode —
//! is ever lost or misattributed.

use bytes::Bytes;
use proptest::prelude::*;
use slimwire_proto::{
    Capability, CapabilitySet, ClientMessage, Helo, ProtocolError, ServerMessage, StatusSnapshot,
};

fn arbitrary_capability() -> impl Strategy<Value = Capability> {
    prop_oneof![
        Just(Capability::Mp3),
        Just(Capability::Flc),
        Just(Capability::Pcm),
        Just(Capability::Ogg),
        Just(Capability::AccuratePlayPoints),
        Just(Capability::HasDigitalOut),
        (8_000u32..=384_000).prop_map(Capability::MaxSampleRate),
        "[a-zA-Z0-9]{1,12}".prop_map(Capability::Model),
        "[a-zA-Z0-9]{1,12}".prop_map(Capability::Custom),
    ]
}

fn arbitrary_capability_set() -> impl Strategy<Value = CapabilitySet> {
    prop::collection::vec(arbitrary_capability(), 1..8)
        .prop_map(|caps| caps.into_iter().collect())
}

fn arbitrary_snapshot() -> impl Strategy<Value = StatusSnapshot> {
    (
        any::<u8>(),
        any::<u32>(),
        any::<u32>(),
        any::<u64>(),
        any::<u16>(),
        any::<u32>(),
        any::<u32>(),
        any::<u16>(),
    )
        .prop_map(
            |(
                crlf,
                buffer_size,
                fullness,
                bytes_received,
                signal_strength,
                jiffies_ms,
                elapsed_ms,
                error_code,
            )| {
                StatusSnapshot {
                    crlf,
                    buffer_size,
                    fullness,
                    bytes_received,
                    signal_strength,
                    jiffies_ms,
                    elapsed_ms,
                    error_code,
                    ..StatusSnapshot::default()
                }
            },
        )
}

fn arbitrary_client_message() -> impl Strategy<Value = ClientMessage> {
    prop_oneof![
        (
            any::<u8>(),
            any::<u8>(),
            any::<[u8; 6]>(),
            any::<[u8; 16]>(),
            any::<u16>(),
            any::<u64>(),
            arbitrary_capability_set(),
        )
            .prop_map(
                |(device_id, revision, mac, uuid, wlan_channels, bytes_received, capabilities)| {
                    ClientMessage::Helo(Helo {
                        device_id,
                        revision,
                        mac,
                        uuid,
                        wlan_channels,
                        bytes_received,
                        language: *b"en",
                        capabilities,
                    })
                },
            ),
        (any::<[u8; 4]>(), arbitrary_snapshot())
            .prop_map(|(event_code, status)| ClientMessage::Stat { event_code, status }),
        any::<u8>().prop_map(|reason| ClientMessage::Bye { reason }),
        "[a-zA-Z0-9 ]{0,32}".prop_map(|name| ClientMessage::SetName { name }),
    ]
}

/// Opcodes the decoder recognizes at the top level.
const KNOWN_OPCODES: [&[u8; 4]; 6] = [b"serv", b"strm", b"aude", b"audg", b"vers", b"setd"];

proptest! {
    /// Bytes 0..4 of every encoded client message are its opcode and bytes
    /// 4..8 are the big-endian length of everything after them.
    #[test]
    fn client_frames_carry_opcode_and_length(message in arbitrary_client_message()) {
        let bytes = message.to_bytes();

        prop_assert!(bytes.len() >= 8);
        prop_assert_eq!(&bytes[..4], &message.opcode());

        let mut length = [0u8; 4];
        length.copy_from_slice(&bytes[4..8]);
        prop_assert_eq!(u32::from_be_bytes(length) as usize, bytes.len() - 8);
    }

    /// Unrecognized opcodes decode to `Unknown` with the full input captured.
    #[test]
    fn unknown_opcodes_preserve_the_frame(
        opcode in prop::array::uniform4(0x20u8..0x7F),
        payload in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        prop_assume!(!KNOWN_OPCODES.iter().any(|known| **known == opcode));

        let mut frame = opcode.to_vec();
        frame.extend_from_slice(&payload);

        let decoded = ServerMessage::decode(&frame);
        prop_assert_eq!(
            decoded,
            Ok(ServerMessage::Unknown {
                opcode: String::from_utf8_lossy(&opcode).into_owned(),
                raw: Bytes::copy_from_slice(&frame),
            })
        );
    }

    /// An unrecognized `strm` command becomes `Unknown` with a `strm_`-prefixed
    /// opcode, regardless of what follows the command byte.
    #[test]
    fn unknown_strm_commands_are_prefixed(
        command in (0x20u8..0x7F).prop_filter(
            "not a recognized strm command",
            |c| !b"tsqfpua".contains(c),
        ),
        payload in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut frame = b"strm".to_vec();
        frame.push(command);
        frame.extend_from_slice(&payload);

        let decoded = ServerMessage::decode(&frame);
        prop_assert_eq!(
            decoded,
            Ok(ServerMessage::Unknown {
                opcode: format!("strm_{}", char::from(command)),
                raw: Bytes::copy_from_slice(&frame),
            })
        );
    }

    /// An unrecognized `setd` id becomes `Unknown` with a `setd_`-prefixed
    /// opcode carrying the decimal id.
    #[test]
    fn unknown_setd_ids_are_prefixed(
        id in any::<u8>().prop_filter("not a recognized setd id", |id| *id != 0 && *id != 4),
        payload in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let mut frame = b"setd".to_vec();
        frame.push(id);
        frame.extend_from_slice(&payload);

        let decoded = ServerMessage::decode(&frame);
        prop_assert_eq!(
            decoded,
            Ok(ServerMessage::Unknown {
                opcode: format!("setd_{id}"),
                raw: Bytes::copy_from_slice(&frame),
            })
        );
    }

    /// `serv` round-trips any address and sync group.
    #[test]
    fn serv_decodes_address_and_optional_group(
        octets in any::<[u8; 4]>(),
        group in prop::option::of("[a-z0-9]{1,16}"),
    ) {
        let mut frame = b"serv".to_vec();
        frame.extend_from_slice(&octets);
        if let Some(group) = &group {
            frame.extend_from_slice(group.as_bytes());
        }

        let decoded = ServerMessage::decode(&frame);
        prop_assert_eq!(
            decoded,
            Ok(ServerMessage::Serv { ip: octets.into(), sync_group_id: group })
        );
    }

    /// Inputs shorter than one opcode always fail with `Truncated`, never
    /// with a partial variant.
    #[test]
    fn short_inputs_are_truncated(input in prop::collection::vec(any::<u8>(), 0..4)) {
        prop_assert_eq!(
            ServerMessage::decode(&input),
            Err(ProtocolError::Truncated { needed: 4, available: input.len() })
        );
    }

    /// Capability rendering is idempotent under re-adding the same
    /// predefined entries.
    #[test]
    fn capability_set_dedup_is_idempotent(caps in prop::collection::vec(arbitrary_capability(), 1..8)) {
        let once: CapabilitySet = caps.iter().cloned().collect();
        let twice: CapabilitySet = caps
            .iter()
            .cloned()
            .chain(caps.iter().cloned().filter(|c| !matches!(c, Capability::Custom(_))))
            .collect();

        // Re-adding predefined entries only moves them; the rendered token
        // multiset for predefined tags stays the same size.
        prop_assert_eq!(once.len(), twice.len());
    }
}
