//! Buffered reader for delegated files with automatic gzip decompression
//!
//! Registries publish their statistics files both plain and gzip-compressed.
//! [`open`] picks the right decoder from the file extension so callers only
//! ever see a `BufRead`.
//!
//! ```rust,no_run
//! use rirdb::file_reader;
//! use std::io::BufRead;
//!
//! let reader = file_reader::open("delegated-apnic-extended-latest.gz")?;
//! for line in reader.lines() {
//!     println!("{}", line?);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, stdin, BufRead, BufReader};
use std::path::Path;

/// Read buffer size (128KB)
const BUFFER_SIZE: usize = 128 * 1024;

/// Open a file, decompressing it if the extension is `.gz`
///
/// The extension check is case-insensitive. The path "-" reads from stdin.
///
/// # Errors
///
/// Fails if the file cannot be opened. Invalid gzip data surfaces as an
/// error on the first read.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();

    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stdin())));
    }

    let file = File::open(path)?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::with_capacity(
            BUFFER_SIZE,
            GzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

/// True if the path carries a `.gz` extension
pub fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}
