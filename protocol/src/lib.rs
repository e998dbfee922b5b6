use bincode::Options;
use serde::{Deserialize, Serialize};

pub mod codec;

pub use codec::ReportCodec;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_PORT: u16 = 2323;
pub const DEFAULT_BACKLOG: u32 = 128;

/// Size of a [`Report`] on the wire. There is no length prefix, the
/// connection carries exactly one report.
pub const REPORT_LEN: usize = 8;

pub type JobId = u32;

/// Slots a worker contributes to a job.
///
/// Wire layout, both fields big-endian:
///
/// ```text
/// offset 0: u32 slot_count
/// offset 4: u32 job_id
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Report {
    pub slot_count: u32,
    pub job_id: JobId,
}

#[derive(thiserror::Error, Debug)]
pub enum ProtocolError {
    #[error("malformed report: expected 8 bytes, received {received}")]
    MalformedMessage { received: usize },

    #[error("report serialization: {0}")]
    Bincode(#[from] bincode::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, ProtocolError::MalformedMessage { .. })
    }
}

fn wire() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
}

impl Report {
    pub fn new(slot_count: u32, job_id: JobId) -> Self {
        Self { slot_count, job_id }
    }

    pub fn encode(&self) -> Result<[u8; REPORT_LEN], ProtocolError> {
        let bytes = wire().serialize(self)?;
        bytes
            .try_into()
            .map_err(|b: Vec<u8>| ProtocolError::MalformedMessage { received: b.len() })
    }

    /// Decodes a report from exactly [`REPORT_LEN`] bytes.
    pub fn decode(src: &[u8]) -> Result<Self, ProtocolError> {
        if src.len() != REPORT_LEN {
            return Err(ProtocolError::MalformedMessage {
                received: src.len(),
            });
        }
        Ok(wire().deserialize(src)?)
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn network_byte_order() {
        let bytes = Report::new(4, 0x0102_0304).encode().unwrap();
        assert_eq!(bytes, [0, 0, 0, 4, 1, 2, 3, 4]);
    }

    #[test]
    fn short_input_is_malformed() {
        for len in 0..REPORT_LEN {
            let err = Report::decode(&[0xff; REPORT_LEN][..len]).unwrap_err();
            assert!(
                matches!(err, ProtocolError::MalformedMessage { received } if received == len),
                "{err:?}"
            );
        }
    }

    fn arb_bad_len_bytes() -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(any::<u8>(), 0..64)
            .prop_filter("8 bytes is a report", |b| b.len() != REPORT_LEN)
    }

    proptest! {
        #[test]
        fn round_trip(slot_count in any::<u32>(), job_id in any::<u32>()) {
            let report = Report::new(slot_count, job_id);
            prop_assert_eq!(Report::decode(&report.encode().unwrap()).unwrap(), report);
        }

        #[test]
        fn every_eight_bytes_is_a_report(bytes in any::<[u8; REPORT_LEN]>()) {
            let report = Report::decode(&bytes).unwrap();
            prop_assert_eq!(report.encode().unwrap(), bytes);
        }

        #[test]
        fn other_lengths_are_malformed(bytes in arb_bad_len_bytes()) {
            let err = Report::decode(&bytes).unwrap_err();
            prop_assert!(
                matches!(err, ProtocolError::MalformedMessage { received } if received == bytes.len()),
                "{:?}", err
            );
        }
    }
}
