//! Pre-translation trace output.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::request::{MemoryRequest, RequestType};

/// One access as recorded in a pre-translation trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine {
    pub address: u64,
    pub kind: RequestType,
    pub cycle: u64,
    pub new_data: Option<Vec<u8>>,
    pub old_data: Option<Vec<u8>>,
    pub thread_id: u32,
}

impl TraceLine {
    pub fn from_request(request: &MemoryRequest, cycle: u64) -> Self {
        TraceLine {
            address: request.address,
            kind: request.kind,
            cycle,
            new_data: request.new_data.clone(),
            old_data: request.old_data.clone(),
            thread_id: request.thread_id,
        }
    }
}

/// Sink for pre-translation trace lines, only consulted when the facade is
/// configured with `print_pre_trace`/`echo_pre_trace`.
pub trait TraceWriter {
    fn set_next(&mut self, line: &TraceLine) -> io::Result<()>;
}

/// Appends one fixed-width binary record per access to a file: address (8
/// bytes LE), kind (1 byte, 0=read/1=write), cycle (8 bytes LE), thread id (4
/// bytes LE), then `new_data`/`old_data` verbatim when present.
pub struct NvtTraceWriter {
    file: File,
}

impl NvtTraceWriter {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(NvtTraceWriter { file })
    }
}

impl TraceWriter for NvtTraceWriter {
    fn set_next(&mut self, line: &TraceLine) -> io::Result<()> {
        self.file.write_all(&line.address.to_le_bytes())?;
        self.file.write_all(&[match line.kind {
            RequestType::Read => 0u8,
            RequestType::Write => 1u8,
        }])?;
        self.file.write_all(&line.cycle.to_le_bytes())?;
        self.file.write_all(&line.thread_id.to_le_bytes())?;
        if let Some(data) = &line.new_data {
            self.file.write_all(data)?;
        }
        if let Some(data) = &line.old_data {
            self.file.write_all(data)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn writes_one_record_per_line() {
        let tmp = NamedTempFile::new().unwrap();
        let mut writer = NvtTraceWriter::create(tmp.path()).unwrap();
        let req = MemoryRequest::read(0x1000, 3);
        let line = TraceLine::from_request(&req, 42);
        writer.set_next(&line).unwrap();
        drop(writer);

        let bytes = std::fs::read(tmp.path()).unwrap();
        assert_eq!(bytes.len(), 8 + 1 + 8 + 4);
        assert_eq!(&bytes[0..8], &0x1000u64.to_le_bytes());
        assert_eq!(bytes[8], 0);
        assert_eq!(&bytes[9..17], &42u64.to_le_bytes());
    }

    #[test]
    fn write_records_include_data_payloads() {
        let tmp = NamedTempFile::new().unwrap();
        let mut writer = NvtTraceWriter::create(tmp.path()).unwrap();
        let req = MemoryRequest::write(0x2000, 0, vec![0u8; 64], vec![1u8; 64]);
        let line = TraceLine::from_request(&req, 1);
        writer.set_next(&line).unwrap();
        drop(writer);

        let bytes = std::fs::read(tmp.path()).unwrap();
        assert_eq!(bytes.len(), 8 + 1 + 8 + 4 + 64 + 64);
    }
}
