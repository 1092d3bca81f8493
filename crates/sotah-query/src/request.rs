use std::io::Read;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;

use crate::Error;

/// Decodes a request payload that may be either raw JSON (small payloads)
/// or base64-over-gzip JSON (large payloads), per spec.md Section 4.9.
pub fn decode_request<T: DeserializeOwned>(payload: &[u8]) -> Result<T, Error> {
    if let Ok(value) = serde_json::from_slice::<T>(payload) {
        return Ok(value);
    }

    let gz = BASE64.decode(payload).map_err(|_| Error::MsgJsonParse)?;
    let mut decoder = GzDecoder::new(gz.as_slice());
    let mut json = Vec::new();
    decoder.read_to_end(&mut json).map_err(|_| Error::MsgJsonParse)?;
    serde_json::from_slice(&json).map_err(|_| Error::MsgJsonParse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Req {
        region_name: String,
    }

    #[test]
    fn decodes_raw_json() {
        let req: Req = decode_request(br#"{"region_name":"us"}"#).unwrap();
        assert_eq!(req.region_name, "us");
    }

    #[test]
    fn rejects_garbage() {
        let err = decode_request::<Req>(b"not json and not base64!!").unwrap_err();
        assert!(matches!(err, Error::MsgJsonParse));
    }
}
