use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;

use super::word_list::{WordListDictionary, WordTrie};
use super::DictError;

const MAGIC: &[u8; 4] = b"RCWD";
const VERSION: u8 = 1;
const HEADER_SIZE: usize = 4 + 1 + 4; // magic + version + body_len

impl WordListDictionary {
    pub fn to_bytes(&self) -> Result<Vec<u8>, DictError> {
        let body = bincode::serialize(&self.dawgs).map_err(DictError::Serialize)?;
        let body_len: u32 = body
            .len()
            .try_into()
            .map_err(|_| DictError::InvalidHeader)?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.extend_from_slice(&body_len.to_le_bytes());
        buf.extend_from_slice(&body);
        Ok(buf)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DictError> {
        if data.len() < 5 {
            return Err(DictError::InvalidHeader);
        }
        if &data[..4] != MAGIC {
            return Err(DictError::InvalidMagic);
        }
        if data[4] != VERSION {
            return Err(DictError::UnsupportedVersion(data[4]));
        }
        if data.len() < HEADER_SIZE {
            return Err(DictError::InvalidHeader);
        }
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(&data[5..9]);
        let body_len = u32::from_le_bytes(len_bytes) as usize;
        if data.len() < HEADER_SIZE + body_len {
            return Err(DictError::InvalidHeader);
        }

        let dawgs: Vec<WordTrie> = bincode::deserialize(&data[HEADER_SIZE..HEADER_SIZE + body_len])
            .map_err(DictError::Deserialize)?;
        for trie in &dawgs {
            let valid = !trie.nodes.is_empty()
                && trie.nodes.iter().all(|n| {
                    n.children
                        .iter()
                        .all(|&(_, child)| (child as usize) < trie.nodes.len())
                });
            if !valid {
                return Err(DictError::InvalidHeader);
            }
        }
        Ok(Self { dawgs })
    }

    /// Open a dictionary file through a read-only mapping.
    ///
    /// The tries are deserialized straight from the mapped region, then the
    /// mapping is dropped.
    pub fn open(path: &Path) -> Result<Self, DictError> {
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and the mapping is immutable.
        // The Mmap is dropped after deserialization completes below.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }

    /// Atomic write: write to .tmp then rename.
    pub fn save(&self, path: &Path) -> Result<(), DictError> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
