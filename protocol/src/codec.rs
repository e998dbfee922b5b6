use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{ProtocolError, Report, REPORT_LEN};

/// Frames a byte stream into fixed-size [`Report`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReportCodec;

impl ReportCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Report> for ReportCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Report, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = item.encode()?;
        dst.reserve(REPORT_LEN);
        dst.put_slice(&bytes);
        Ok(())
    }
}

impl Decoder for ReportCodec {
    type Item = Report;

    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < REPORT_LEN {
            src.reserve(REPORT_LEN - src.len());
            return Ok(None);
        }
        let frame = src.split_to(REPORT_LEN);
        Report::decode(&frame).map(Some)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(report) => Ok(Some(report)),
            None if src.is_empty() => Ok(None),
            // peer closed mid-report
            None => Err(ProtocolError::MalformedMessage {
                received: src.len(),
            }),
        }
    }
}
