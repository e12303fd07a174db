use std::io::{self, Read};

use brotli::{
    InputPair, InputReferenceMut,
    enc::{
        StandardAlloc,
        encode::{
            BrotliEncoderDestroyInstance, BrotliEncoderOperation, BrotliEncoderParameter,
            BrotliEncoderStateStruct,
        },
    },
    interface::{PredictionModeContextMap, StaticCommand},
};

use crate::{codec::StreamEncoder, config::DeliveryConfig};

const BUFFER_SIZE: usize = 4096;

/// Compresses a whole buffer using Brotli.
///
/// # Arguments
///
/// * `data` - The uncompressed file contents.
/// * `cfg` - Supplies the Brotli quality (0-11) and window size (10-24).
pub fn compress_brotli(data: &[u8], cfg: &DeliveryConfig) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    brotli::CompressorReader::new(data, BUFFER_SIZE, cfg.brotli_level, cfg.brotli_window)
        .read_to_end(&mut out)?;
    Ok(out)
}

/// Creates an incremental Brotli encoder.
pub fn brotli_encoder(cfg: &DeliveryConfig) -> Box<dyn StreamEncoder> {
    let mut state = BrotliEncoderStateStruct::new(StandardAlloc::default());
    state.set_parameter(BrotliEncoderParameter::BROTLI_PARAM_QUALITY, cfg.brotli_level);
    state.set_parameter(BrotliEncoderParameter::BROTLI_PARAM_LGWIN, cfg.brotli_window);

    Box::new(BrotliEncoder {
        state,
        scratch: vec![0; BUFFER_SIZE].into_boxed_slice(),
        out: Vec::new(),
    })
}

/// Brotli encoder driven through the raw encoder state.
///
/// `CompressorWriter` runs a full finish pass over everything it buffered when dropped,
/// which at high qualities means seconds of work for a client that already left. The raw
/// state is released without compressing anything.
struct BrotliEncoder {
    state: BrotliEncoderStateStruct<StandardAlloc>,
    scratch: Box<[u8]>,
    out: Vec<u8>,
}

impl BrotliEncoder {
    fn compress(&mut self, op: BrotliEncoderOperation, input: &[u8]) -> io::Result<()> {
        let mut nop_callback = |_: &mut PredictionModeContextMap<InputReferenceMut>,
                                _: &mut [StaticCommand],
                                _: InputPair,
                                _: &mut StandardAlloc| ();

        let mut available_in = input.len();
        let mut in_offset = 0;
        loop {
            let mut available_out = self.scratch.len();
            let mut out_offset = 0;
            let ok = self.state.compress_stream(
                op,
                &mut available_in,
                input,
                &mut in_offset,
                &mut available_out,
                &mut self.scratch[..],
                &mut out_offset,
                &mut None,
                &mut nop_callback,
            );
            self.out.extend_from_slice(&self.scratch[..out_offset]);

            if !ok {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "brotli encoder rejected the stream",
                ));
            }

            let done = match op {
                BrotliEncoderOperation::BROTLI_OPERATION_FINISH => self.state.is_finished(),
                _ => available_in == 0 && !self.state.has_more_output(),
            };
            if done {
                return Ok(());
            }
        }
    }
}

impl StreamEncoder for BrotliEncoder {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        if self.state.is_finished() {
            return Err(io::Error::other("brotli stream already finished"));
        }
        self.compress(BrotliEncoderOperation::BROTLI_OPERATION_PROCESS, chunk)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.compress(BrotliEncoderOperation::BROTLI_OPERATION_FINISH, &[])
    }

    fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out)
    }
}

impl Drop for BrotliEncoder {
    fn drop(&mut self) {
        BrotliEncoderDestroyInstance(&mut self.state);
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn text(len: usize) -> Vec<u8> {
        b"the quick brown fox jumps over the lazy dog; "
            .iter()
            .cycle()
            .take(len)
            .copied()
            .collect()
    }

    fn decode(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        brotli::Decompressor::new(data, BUFFER_SIZE)
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn chunked_output_matches_input() {
        let input = text(200_000);
        let mut encoder = brotli_encoder(&DeliveryConfig::default());
        let mut out = Vec::new();
        for chunk in input.chunks(10_000) {
            encoder.write_chunk(chunk).unwrap();
            out.extend(encoder.take_output());
        }
        encoder.finish().unwrap();
        out.extend(encoder.take_output());

        assert_eq!(decode(&out), input);
    }

    #[test]
    fn finish_twice_is_harmless_but_writing_after_is_not() {
        let mut encoder = brotli_encoder(&DeliveryConfig::default());
        encoder.write_chunk(b"hello world").unwrap();
        encoder.finish().unwrap();
        encoder.finish().unwrap();
        assert!(encoder.write_chunk(b"more").is_err());
        assert_eq!(decode(&encoder.take_output()), b"hello world");
    }

    #[test]
    fn dropping_an_unfinished_encoder_skips_compression() {
        // Less than one input block, so nothing has been compressed yet.
        let mut encoder = brotli_encoder(&DeliveryConfig::default());
        for chunk in text(200 * 1024).chunks(16 * 1024) {
            encoder.write_chunk(chunk).unwrap();
        }
        assert!(encoder.take_output().is_empty());

        let started = Instant::now();
        drop(encoder);
        assert!(
            started.elapsed() < Duration::from_millis(50),
            "{:?}",
            started.elapsed()
        );
    }
}
