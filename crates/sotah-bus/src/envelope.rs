use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Machine-readable outcome kind, carried alongside a human-readable
/// `err` line (spec.md Section 4.7, Section 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum Code {
    Ok = 0,
    GenericError = 1,
    MsgJsonParseError = 2,
    NotFound = 3,
    Unauthorized = 4,
    BlacklistedItem = 5,
}

impl Default for Code {
    fn default() -> Self {
        Code::Ok
    }
}

/// The uniform `{data, err, code}` wrapper used on both transports
/// (spec.md Section 4.7, Section 6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub err: String,
    pub code: Code,
}

impl Envelope {
    pub fn ok(data: impl Into<String>) -> Self {
        Envelope {
            data: data.into(),
            err: String::new(),
            code: Code::Ok,
        }
    }

    pub fn error(code: Code, err: impl Into<String>) -> Self {
        Envelope {
            data: String::new(),
            err: err.into(),
            code,
        }
    }

    /// JSON over base64-over-gzip, used for large query responses
    /// (spec.md Section 4.9).
    pub fn ok_gzipped<T: Serialize>(value: &T) -> Result<Self, EnvelopeError> {
        let json = serde_json::to_vec(value)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        let gz = encoder.finish()?;
        Ok(Envelope::ok(BASE64.encode(gz)))
    }

    pub fn decode_gzipped<T: DeserializeOwned>(&self) -> Result<T, EnvelopeError> {
        let gz = BASE64.decode(&self.data)?;
        let mut decoder = GzDecoder::new(gz.as_slice());
        let mut json = Vec::new();
        decoder.read_to_end(&mut json)?;
        Ok(serde_json::from_slice(&json)?)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.code, Code::Ok)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        names: Vec<String>,
    }

    #[test]
    fn gzip_base64_round_trips() {
        let payload = Payload {
            names: vec!["a".into(), "b".into()],
        };
        let envelope = Envelope::ok_gzipped(&payload).unwrap();
        assert!(envelope.is_ok());
        let decoded: Payload = envelope.decode_gzipped().unwrap();
        assert_eq!(decoded, payload);
    }
}
