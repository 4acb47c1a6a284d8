//! Gzip TSV reader
//!
//! Splits the decompressed export on `\n`, binds the first line as the
//! header and yields one [`ParsedLine`] per following non-blank line.
//! Invalid UTF-8 is replaced rather than rejected; the export is not always
//! clean.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use super::record::{BoundRecord, RecordBuilder, RecordError};
use super::ImportError;

const READ_BUFFER_SIZE: usize = 256 * 1024;

/// One data line, numbered from 1 with the header as line 1
#[derive(Debug)]
pub struct ParsedLine {
    pub line: u64,
    pub outcome: Result<BoundRecord, RecordError>,
}

/// Open a (possibly multi-member) gzip file for line reading.
pub fn open_gzip(path: &Path) -> io::Result<impl BufRead> {
    let file = File::open(path)?;
    let decoder = MultiGzDecoder::new(BufReader::with_capacity(READ_BUFFER_SIZE, file));
    Ok(BufReader::with_capacity(READ_BUFFER_SIZE, decoder))
}

pub struct TsvRecordReader<R> {
    reader: R,
    builder: RecordBuilder,
    line: u64,
    buf: Vec<u8>,
}

impl<R: BufRead> TsvRecordReader<R> {
    /// Consume the header line and prepare the column binding.
    pub fn new(mut reader: R) -> Result<Self, ImportError> {
        let mut buf = Vec::new();
        let mut line = 0;

        let header = loop {
            match read_line(&mut reader, &mut buf)? {
                None => return Err(ImportError::EmptySource),
                Some(text) => {
                    line += 1;
                    if !text.trim().is_empty() {
                        break text;
                    }
                },
            }
        };

        let builder = RecordBuilder::from_header(&header)?;

        Ok(Self {
            reader,
            builder,
            line,
            buf,
        })
    }

    pub fn builder(&self) -> &RecordBuilder {
        &self.builder
    }
}

impl<R: BufRead> Iterator for TsvRecordReader<R> {
    type Item = io::Result<ParsedLine>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match read_line(&mut self.reader, &mut self.buf) {
                Ok(Some(text)) => text,
                Ok(None) => return None,
                Err(e) => return Some(Err(e)),
            };
            self.line += 1;

            if text.trim().is_empty() {
                continue;
            }

            let cells: Vec<&str> = text.split('\t').collect();
            return Some(Ok(ParsedLine {
                line: self.line,
                outcome: self.builder.build(&cells),
            }));
        }
    }
}

/// Next line without its terminator, or `None` at end of input.
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }

    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}
