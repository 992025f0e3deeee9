//! Payload frame codec.
//!
//! Inner frame (what gets encrypted), big-endian:
//!
//! ```text
//! [1]  has-message flag
//!  if set: [4] message length; [..] UTF-8 message
//! [4]  file count
//!  per file: [2] name length; [..] name
//!            [2] extension length; [..] extension
//!            [8] content length; [..] content
//! ```
//!
//! Outer frame, the byte stream an embedding method actually carries:
//! a 4-byte big-endian ciphertext length followed by the ciphertext.
//! A wrong passphrase surfaces either as a garbage length that never
//! terminates inside the carrier, or as a failed authentication once the
//! declared bytes arrived; both collapse into [`StegoError::KeyOrCorruption`].

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use stegokit_crypto::{decrypt_data, encrypt_data, ENCRYPTION_OVERHEAD};

use crate::error::{Result, StegoError};
use crate::payload::{FileEntry, Payload};

const LENGTH_FIELD_LEN: usize = 4;

fn serialize_inner(payload: &Payload) -> Result<Vec<u8>> {
    let mut buf = Vec::new();

    match &payload.text {
        Some(text) => {
            buf.write_u8(1)?;
            buf.write_u32::<BigEndian>(text.len() as u32)?;
            buf.extend_from_slice(text.as_bytes());
        }
        None => buf.write_u8(0)?,
    }

    buf.write_u32::<BigEndian>(payload.files.len() as u32)?;
    for file in &payload.files {
        buf.write_u16::<BigEndian>(file.name.len() as u16)?;
        buf.extend_from_slice(file.name.as_bytes());
        buf.write_u16::<BigEndian>(file.extension.len() as u16)?;
        buf.extend_from_slice(file.extension.as_bytes());
        buf.write_u64::<BigEndian>(file.content.len() as u64)?;
        buf.extend_from_slice(&file.content);
    }

    Ok(buf)
}

fn deserialize_inner(data: &[u8]) -> Result<Payload> {
    let mut cursor = Cursor::new(data);
    let mut payload = Payload::empty();

    match cursor.read_u8().map_err(|_| StegoError::KeyOrCorruption)? {
        0 => {}
        1 => {
            let len = cursor
                .read_u32::<BigEndian>()
                .map_err(|_| StegoError::KeyOrCorruption)? as usize;
            let bytes = read_exact(&mut cursor, len)?;
            payload.text =
                Some(String::from_utf8(bytes).map_err(|_| StegoError::KeyOrCorruption)?);
        }
        _ => return Err(StegoError::KeyOrCorruption),
    }

    let file_count = cursor
        .read_u32::<BigEndian>()
        .map_err(|_| StegoError::KeyOrCorruption)?;
    for _ in 0..file_count {
        let name_len = cursor
            .read_u16::<BigEndian>()
            .map_err(|_| StegoError::KeyOrCorruption)? as usize;
        let name = String::from_utf8(read_exact(&mut cursor, name_len)?)
            .map_err(|_| StegoError::KeyOrCorruption)?;
        let ext_len = cursor
            .read_u16::<BigEndian>()
            .map_err(|_| StegoError::KeyOrCorruption)? as usize;
        let extension = String::from_utf8(read_exact(&mut cursor, ext_len)?)
            .map_err(|_| StegoError::KeyOrCorruption)?;
        // The frame itself guarantees extracted names stay inside the
        // output directory, regardless of how the payload was built.
        if name.is_empty() || name.contains(['/', '\\']) || extension.contains(['/', '\\']) {
            return Err(StegoError::KeyOrCorruption);
        }
        let content_len = cursor
            .read_u64::<BigEndian>()
            .map_err(|_| StegoError::KeyOrCorruption)? as usize;
        let content = read_exact(&mut cursor, content_len)?;
        payload.files.push(FileEntry {
            name,
            extension,
            content,
        });
    }

    if cursor.position() != data.len() as u64 {
        return Err(StegoError::KeyOrCorruption);
    }

    Ok(payload)
}

fn read_exact(cursor: &mut Cursor<&[u8]>, len: usize) -> Result<Vec<u8>> {
    let remaining = cursor.get_ref().len() as u64 - cursor.position();
    if len as u64 > remaining {
        return Err(StegoError::KeyOrCorruption);
    }
    let mut buf = vec![0u8; len];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| StegoError::KeyOrCorruption)?;
    Ok(buf)
}

/// Push-style byte source over the serialized and encrypted payload.
/// Built once per embed; exhausted after exactly `len()` bytes.
#[derive(Debug)]
pub struct PayloadEmbedder {
    frame: Vec<u8>,
    cursor: usize,
}

impl PayloadEmbedder {
    /// Serializes and encrypts the payload, failing early when the frame
    /// would not fit the given capacity. Nothing in the carrier has been
    /// touched at this point.
    pub fn new(payload: &Payload, passphrase: &str, capacity: usize) -> Result<Self> {
        let inner = serialize_inner(payload)?;
        let ciphertext =
            encrypt_data(passphrase, &inner).map_err(StegoError::EncryptionError)?;

        let mut frame = Vec::with_capacity(LENGTH_FIELD_LEN + ciphertext.len());
        frame.write_u32::<BigEndian>(ciphertext.len() as u32)?;
        frame.extend_from_slice(&ciphertext);

        if frame.len() > capacity {
            return Err(StegoError::InsufficientCapacity {
                required: frame.len(),
                available: capacity,
            });
        }

        Ok(Self { frame, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    pub fn frame_bytes(&self) -> &[u8] {
        &self.frame
    }

    /// Next frame byte, or `None` once the frame is exhausted.
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.frame.get(self.cursor).copied();
        if byte.is_some() {
            self.cursor += 1;
        }
        byte
    }
}

#[derive(Debug)]
enum ExtractorState {
    Length { buf: [u8; LENGTH_FIELD_LEN], filled: usize },
    Body { expected: usize, buf: Vec<u8> },
    Done(Payload),
}

/// Push-style sink consuming an extracted byte stream one byte at a time.
///
/// Stays unfinished until the declared ciphertext length has arrived and
/// decrypted into a well-formed payload; an embedding method running out
/// of carrier bytes first treats that as the wrong-key/corruption signal.
pub struct PayloadExtractor {
    passphrase: String,
    state: ExtractorState,
}

impl PayloadExtractor {
    pub fn new(passphrase: &str) -> Self {
        Self {
            passphrase: passphrase.to_owned(),
            state: ExtractorState::Length {
                buf: [0; LENGTH_FIELD_LEN],
                filled: 0,
            },
        }
    }

    /// Feeds one extracted byte. Fails fast when the declared length is
    /// structurally impossible or decryption rejects the assembled body.
    pub fn process_byte(&mut self, byte: u8) -> Result<()> {
        match &mut self.state {
            ExtractorState::Length { buf, filled } => {
                buf[*filled] = byte;
                *filled += 1;
                if *filled == LENGTH_FIELD_LEN {
                    let expected = u32::from_be_bytes(*buf) as usize;
                    if expected < ENCRYPTION_OVERHEAD {
                        return Err(StegoError::KeyOrCorruption);
                    }
                    self.state = ExtractorState::Body {
                        expected,
                        buf: Vec::new(),
                    };
                }
                Ok(())
            }
            ExtractorState::Body { expected, buf } => {
                buf.push(byte);
                if buf.len() == *expected {
                    let inner = decrypt_data(&self.passphrase, buf)
                        .map_err(|_| StegoError::KeyOrCorruption)?;
                    self.state = ExtractorState::Done(deserialize_inner(&inner)?);
                }
                Ok(())
            }
            ExtractorState::Done(_) => Ok(()),
        }
    }

    pub fn finished(&self) -> bool {
        matches!(self.state, ExtractorState::Done(_))
    }

    pub fn into_payload(self) -> Result<Payload> {
        match self.state {
            ExtractorState::Done(payload) => Ok(payload),
            _ => Err(StegoError::KeyOrCorruption),
        }
    }
}
