//! utils.rs
//! Reader helpers shared by slices and the chained stream.

use std::io::{self, Read};

use crate::constants::SCRATCH_BUFFER_SIZE;

/// Single `read` call that retries on `Interrupted`.
pub fn read_retrying<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match r.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Read and drop up to `n` bytes. Returns the count dropped, short only at EOF.
pub fn discard<R: Read + ?Sized>(r: &mut R, n: u64) -> io::Result<u64> {
    let mut scratch = [0u8; SCRATCH_BUFFER_SIZE];
    let mut done = 0u64;

    while done < n {
        let want = (n - done).min(scratch.len() as u64) as usize;
        let got = read_retrying(r, &mut scratch[..want])?;
        if got == 0 {
            break;
        }
        done += got as u64;
    }
    Ok(done)
}
