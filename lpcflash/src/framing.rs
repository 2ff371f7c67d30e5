//! Answer framing over a timed serial byte stream.
//!
//! The LPC bootloader has no framing beyond line terminators, and different
//! boot ROM revisions terminate lines inconsistently (`CR LF`, `CR LF LF`,
//! or a lone `CR`). [`Framer::receive`] folds all of these into single
//! terminator events and returns one "answer" per call: everything up to and
//! including the requested number of terminators. Bytes received past that
//! point are kept as residual input and prepended to the next answer.

use std::io::Read;
use std::time::Duration;

use log::trace;

use crate::error::{Error, Result};

/// Size of one read from the underlying transport.
const READ_CHUNK: usize = 128;

/// Granularity of the local countdown timer.
const TICK_MS: u64 = 100;

/// Line-terminator scanner state.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Plain line content.
    Text,
    /// A CR was seen; the line terminator has started.
    SawCr,
    /// A CR LF pair completed; one stray LF may still be absorbed.
    SawCrLf,
}

/// Framing state carried across receive calls.
///
/// Owns the residual buffer and the countdown-timer bookkeeping. One framer
/// belongs to exactly one session and must be [`cleared`](Framer::clear)
/// when a session starts.
#[derive(Default)]
pub struct Framer {
    residual: Vec<u8>,
    ticks: u32,
}

impl Framer {
    /// Create a framer with no residual input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop residual input and timer state.
    pub fn clear(&mut self) {
        self.residual.clear();
        self.ticks = 0;
    }

    /// Receive one framed answer.
    ///
    /// Reads until `max_size` bytes are collected, `wanted_breaks` line
    /// terminators have been seen, a byte with the high bit set arrives
    /// (out-of-band EOF sentinel), or the timeout elapses. Reaching the
    /// terminator count cuts the answer directly after the final terminator;
    /// everything beyond the cut becomes residual input for the next call.
    ///
    /// Timing out before the terminator count is reached fails with
    /// [`Error::Incomplete`] carrying whatever was collected; those bytes
    /// are consumed, not retained.
    pub fn receive<P: Read + ?Sized>(
        &mut self,
        port: &mut P,
        max_size: usize,
        wanted_breaks: usize,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        #[allow(clippy::cast_possible_truncation)]
        {
            self.ticks = (timeout.as_millis() as u64 / TICK_MS).max(1) as u32;
        }

        let mut answer: Vec<u8> = Vec::new();
        let mut state = Scan::Text;
        let mut breaks = 0usize;
        // One past the wanted terminator, once it has been seen.
        let mut cut: Option<usize> = None;
        let mut eof = false;

        if !self.residual.is_empty() {
            let pending = std::mem::take(&mut self.residual);
            trace!("prepending {} residual bytes", pending.len());
            Self::scan(
                &pending,
                answer.len(),
                &mut state,
                &mut breaks,
                wanted_breaks,
                &mut cut,
                &mut eof,
            );
            answer.extend_from_slice(&pending);
        }

        let mut chunk = [0u8; READ_CHUNK];
        while cut.is_none() && !eof && answer.len() < max_size {
            let room = READ_CHUNK.min(max_size - answer.len());
            let got = match port.read(&mut chunk[..room]) {
                Ok(n) => n,
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::TimedOut
                            | std::io::ErrorKind::WouldBlock
                            | std::io::ErrorKind::Interrupted
                    ) =>
                {
                    0
                },
                Err(e) => return Err(Error::Io(e)),
            };

            if got == 0 {
                self.ticks -= 1;
                if self.ticks == 0 {
                    break;
                }
                continue;
            }

            Self::scan(
                &chunk[..got],
                answer.len(),
                &mut state,
                &mut breaks,
                wanted_breaks,
                &mut cut,
                &mut eof,
            );
            answer.extend_from_slice(&chunk[..got]);
        }

        if let Some(pos) = cut {
            self.residual = answer.split_off(pos);
            return Ok(answer);
        }
        if eof || answer.len() >= max_size {
            return Ok(answer);
        }
        Err(Error::Incomplete { received: answer })
    }

    /// Run the terminator scanner over `bytes`, whose first byte sits at
    /// absolute answer offset `base`.
    fn scan(
        bytes: &[u8],
        base: usize,
        state: &mut Scan,
        breaks: &mut usize,
        wanted: usize,
        cut: &mut Option<usize>,
        eof: &mut bool,
    ) {
        for (i, &b) in bytes.iter().enumerate() {
            if let Some(pos) = *cut {
                // A single LF directly following the final CR LF still
                // belongs to that terminator.
                if *state == Scan::SawCrLf && b == 0x0a && base + i == pos {
                    *cut = Some(pos + 1);
                }
                *state = Scan::Text;
                return;
            }
            match b {
                0x0d => *state = Scan::SawCr,
                0x0a => {
                    if *state == Scan::SawCr {
                        *breaks += 1;
                        *state = Scan::SawCrLf;
                        if *breaks == wanted {
                            *cut = Some(base + i + 1);
                        }
                    } else {
                        // A bare LF with no preceding CR is not a terminator.
                        *state = Scan::Text;
                    }
                },
                _ if b & 0x80 != 0 => {
                    *eof = true;
                    return;
                },
                _ => {
                    if *state == Scan::SawCr {
                        // Lone CR terminated the line; this byte starts the
                        // next one.
                        *breaks += 1;
                        if *breaks == wanted {
                            *cut = Some(base + i);
                        }
                    }
                    *state = Scan::Text;
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Read source fed from a script of chunks; empty script reads time out.
    struct ScriptedReader {
        chunks: VecDeque<Vec<u8>>,
    }

    impl ScriptedReader {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            }
        }
    }

    impl Read for ScriptedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    assert!(chunk.len() <= buf.len());
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                },
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "no data")),
            }
        }
    }

    const T: Duration = Duration::from_millis(500);

    #[test]
    fn test_crlf_terminators_counted() {
        let mut r = ScriptedReader::new(&[b"First\r\nSecond\r\nRest"]);
        let mut f = Framer::new();
        let answer = f.receive(&mut r, 256, 2, T).unwrap();
        assert_eq!(answer, b"First\r\nSecond\r\n");
    }

    #[test]
    fn test_residual_reappears_on_next_call() {
        let mut r = ScriptedReader::new(&[b"First\r\nRest\r\n"]);
        let mut f = Framer::new();
        let answer = f.receive(&mut r, 256, 1, T).unwrap();
        assert_eq!(answer, b"First\r\n");
        // Second call is served entirely from residual.
        let answer = f.receive(&mut r, 256, 1, T).unwrap();
        assert_eq!(answer, b"Rest\r\n");
    }

    #[test]
    fn test_crlflf_is_one_terminator() {
        let mut r = ScriptedReader::new(&[b"A\r\n\nB\r\n"]);
        let mut f = Framer::new();
        let answer = f.receive(&mut r, 256, 1, T).unwrap();
        assert_eq!(answer, b"A\r\n\n");
        let answer = f.receive(&mut r, 256, 1, T).unwrap();
        assert_eq!(answer, b"B\r\n");
    }

    #[test]
    fn test_lone_cr_terminates_line() {
        let mut r = ScriptedReader::new(&[b"A\rB\r\n"]);
        let mut f = Framer::new();
        let answer = f.receive(&mut r, 256, 1, T).unwrap();
        assert_eq!(answer, b"A\r");
        let answer = f.receive(&mut r, 256, 1, T).unwrap();
        assert_eq!(answer, b"B\r\n");
    }

    #[test]
    fn test_bare_lf_is_not_a_terminator() {
        let mut r = ScriptedReader::new(&[b"A\nB\r\n"]);
        let mut f = Framer::new();
        let answer = f.receive(&mut r, 256, 1, T).unwrap();
        assert_eq!(answer, b"A\nB\r\n");
    }

    #[test]
    fn test_terminator_split_across_reads() {
        let mut r = ScriptedReader::new(&[b"Sync\r", b"\nExtra"]);
        let mut f = Framer::new();
        let answer = f.receive(&mut r, 256, 1, T).unwrap();
        assert_eq!(answer, b"Sync\r\n");
        // Unconsumed tail stays buffered.
        let err = f.receive(&mut r, 256, 1, T).unwrap_err();
        match err {
            Error::Incomplete { received } => assert_eq!(received, b"Extra"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_high_bit_byte_ends_answer() {
        let mut r = ScriptedReader::new(&[b"data\x85more"]);
        let mut f = Framer::new();
        let answer = f.receive(&mut r, 256, 1, T).unwrap();
        assert_eq!(answer, b"data\x85more");
    }

    #[test]
    fn test_incomplete_after_timeout() {
        let mut r = ScriptedReader::new(&[b"no terminator"]);
        let mut f = Framer::new();
        let err = f.receive(&mut r, 256, 1, Duration::from_millis(200)).unwrap_err();
        match err {
            Error::Incomplete { received } => assert_eq!(received, b"no terminator"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_max_size_stops_reading() {
        let mut r = ScriptedReader::new(&[b"abcd", b"efgh"]);
        let mut f = Framer::new();
        let answer = f.receive(&mut r, 4, 1, T).unwrap();
        assert_eq!(answer, b"abcd");
    }

    #[test]
    fn test_clear_drops_residual() {
        let mut r = ScriptedReader::new(&[b"One\r\nTwo\r\n"]);
        let mut f = Framer::new();
        let _ = f.receive(&mut r, 256, 1, T).unwrap();
        f.clear();
        let err = f.receive(&mut r, 256, 1, T).unwrap_err();
        assert!(matches!(err, Error::Incomplete { .. }));
    }
}
