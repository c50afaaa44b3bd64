use std::io::{self, Cursor, Read};

use crate::{Decoder, DecoderError, DecoderOptions, MetaValue};

/// Decodes `body` at the given emit depth and collects every emission plus
/// the terminal error.
pub(crate) fn decode_at(body: &str, emit_depth: i32) -> (Vec<MetaValue>, Option<DecoderError>) {
    decode_with(
        body,
        DecoderOptions {
            emit_depth,
            ..DecoderOptions::default()
        },
    )
}

pub(crate) fn decode_with(
    body: &str,
    options: DecoderOptions,
) -> (Vec<MetaValue>, Option<DecoderError>) {
    let reader = Cursor::new(body.as_bytes().to_vec());
    let mut stream = Decoder::with_options(reader, options).stream();
    let values: Vec<_> = (&mut stream).collect();
    (values, stream.finish().err())
}

/// Decodes and asserts a clean run.
pub(crate) fn decode_ok(body: &str, emit_depth: i32) -> Vec<MetaValue> {
    let (values, err) = decode_at(body, emit_depth);
    assert!(err.is_none(), "unexpected decoder error: {err:?}");
    values
}

/// Reader that hands out at most `step` bytes per read call, to exercise
/// buffer seams on small inputs.
pub(crate) struct Dribble {
    data: Vec<u8>,
    pos: usize,
    step: usize,
}

impl Dribble {
    pub(crate) fn new(data: impl Into<Vec<u8>>, step: usize) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            step: step.max(1),
        }
    }
}

impl Read for Dribble {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.step.min(self.data.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
