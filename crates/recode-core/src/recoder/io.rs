use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::code::{Code, MAX_CODE_LEN};

use super::{RecodeError, Recoder};

const MAGIC: &[u8; 4] = b"RCDR";
const VERSION: u8 = 1;
const HEADER_SIZE: usize = 4 + 1 + 4 + 4; // magic + version + body_len + crc32

#[derive(Serialize, Deserialize)]
struct CodeRecord {
    self_normalized: bool,
    length: u8,
    values: Vec<u32>,
}

#[derive(Serialize, Deserialize)]
struct RecoderData {
    null_id: Option<u32>,
    codes: Vec<CodeRecord>,
}

impl Recoder {
    /// Serialize to bytes (RCDR format).
    ///
    /// Header integers are little-endian; the body is bincode, which is
    /// little-endian as well, so files reload on any host.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecodeError> {
        let data = RecoderData {
            null_id: self.null_id,
            codes: self
                .encoder
                .iter()
                .map(|c| CodeRecord {
                    self_normalized: c.self_normalized(),
                    length: c.len() as u8,
                    values: c.as_slice().to_vec(),
                })
                .collect(),
        };
        let body = bincode::serialize(&data).map_err(RecodeError::Serialize)?;
        let body_len: u32 = body
            .len()
            .try_into()
            .map_err(|_| RecodeError::InvalidHeader)?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&body_len.to_le_bytes());
        buf.extend_from_slice(&crc32fast::hash(&body).to_le_bytes());
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    /// Deserialize from bytes (RCDR format) and rebuild the lookup tables.
    pub fn from_bytes(data: &[u8]) -> Result<Self, RecodeError> {
        if data.len() < 5 {
            return Err(RecodeError::InvalidHeader);
        }
        if &data[..4] != MAGIC {
            return Err(RecodeError::InvalidMagic);
        }
        if data[4] != VERSION {
            return Err(RecodeError::UnsupportedVersion(data[4]));
        }
        if data.len() < HEADER_SIZE {
            return Err(RecodeError::InvalidHeader);
        }
        let body_len = read_u32(&data[5..9]) as usize;
        let expected_crc = read_u32(&data[9..13]);
        if data.len() < HEADER_SIZE + body_len {
            return Err(RecodeError::InvalidHeader);
        }
        let body = &data[HEADER_SIZE..HEADER_SIZE + body_len];
        if crc32fast::hash(body) != expected_crc {
            return Err(RecodeError::Checksum);
        }

        let parsed: RecoderData = bincode::deserialize(body).map_err(RecodeError::Deserialize)?;
        let mut codes = Vec::with_capacity(parsed.codes.len());
        for rec in parsed.codes {
            if rec.length as usize != rec.values.len() || rec.values.len() > MAX_CODE_LEN {
                return Err(RecodeError::InvalidHeader);
            }
            let mut code = Code::from_slice(&rec.values).ok_or(RecodeError::InvalidHeader)?;
            code.set_self_normalized(rec.self_normalized);
            codes.push(code);
        }
        Ok(Self::direct(codes, parsed.null_id))
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), RecodeError> {
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn open(path: &Path) -> Result<Self, RecodeError> {
        Self::from_bytes(&fs::read(path)?)
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buf)
}
