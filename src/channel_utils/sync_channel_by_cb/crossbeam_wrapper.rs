//! [Read]/[Write] adapters over [crossbeam] byte queues, so an in-process
//! mesh can stand in for a socket mesh.

use crossbeam::channel::{unbounded, Receiver, RecvError, Sender};
use std::io::{Error, ErrorKind, Read, Result, Write};

/// Writing half of an in-process byte stream.
pub struct CrossbeamSender(Sender<Vec<u8>>);

/// Reading half of an in-process byte stream.
///
/// Chunks arrive whole from the queue; reads smaller than the current chunk
/// leave the remainder pending for the next read.
pub struct CrossbeamReceiver {
    incoming: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    offset: usize,
}

impl Write for CrossbeamSender {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if let Err(e) = self.0.send(buf.to_vec()) {
            return Err(Error::new(ErrorKind::BrokenPipe, e));
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Read for CrossbeamReceiver {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.offset == self.pending.len() {
            match self.incoming.recv() {
                Ok(v) => {
                    self.pending = v;
                    self.offset = 0;
                }
                Err(RecvError) => return Err(Error::new(ErrorKind::BrokenPipe, RecvError)),
            }
        }

        let m = (self.pending.len() - self.offset).min(buf.len());
        buf[..m].copy_from_slice(&self.pending[self.offset..self.offset + m]);
        self.offset += m;

        Ok(m)
    }
}

/// Create one directed byte stream.
pub fn cbch_pair() -> (CrossbeamSender, CrossbeamReceiver) {
    let (s, r) = unbounded();
    (
        CrossbeamSender(s),
        CrossbeamReceiver {
            incoming: r,
            pending: Vec::new(),
            offset: 0,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use scuttlebutt::{AbstractChannel, SyncChannel};

    #[test]
    fn test_whole_read() {
        let (mut s1, mut r1) = cbch_pair();

        let handle = std::thread::spawn(move || {
            let mut v = vec![0u8; 3];
            r1.read_exact(&mut v).unwrap();
            assert_eq!(v, [1, 2, 3]);
        });

        let v = [1, 2, 3];
        s1.write_all(&v).unwrap();

        handle.join().unwrap();
    }

    #[test]
    fn test_split_read() {
        let (mut s1, mut r1) = cbch_pair();

        s1.write_all(&[1, 2, 3, 4, 5]).unwrap();
        drop(s1);

        let mut v = vec![0u8; 2];
        r1.read_exact(&mut v).unwrap();
        assert_eq!(v, [1, 2]);

        let mut v = vec![0u8; 3];
        r1.read_exact(&mut v).unwrap();
        assert_eq!(v, [3, 4, 5]);
    }

    #[test]
    fn test_broken_pipe() {
        let (mut s1, mut r1) = cbch_pair();

        let handle = std::thread::spawn(move || {
            let mut v = vec![0u8; 3];
            r1.read_exact(&mut v).unwrap();
            assert_eq!(v, [1, 2, 3]);

            let mut v = vec![0u8; 3];
            let e = r1.read_exact(&mut v).unwrap_err();
            assert_eq!(e.kind(), ErrorKind::BrokenPipe);
        });

        let v = [1, 2, 3];
        s1.write_all(&v).unwrap();
        drop(s1);

        handle.join().unwrap();
    }

    #[test]
    fn test_channel() {
        let (s1, r1) = cbch_pair();
        let (s2, r2) = cbch_pair();
        let mut ch1 = SyncChannel::new(r1, s2);
        let mut ch2 = SyncChannel::new(r2, s1);

        let handle = std::thread::spawn(move || {
            let n = ch1.read_u32().unwrap();
            assert_eq!(n, 123);
            ch1.write_u32(n * 2).unwrap();
        });

        let n = 123;
        ch2.write_u32(n).unwrap();
        let n = ch2.read_u32().unwrap();
        assert_eq!(n, 246);

        handle.join().unwrap();
    }
}
