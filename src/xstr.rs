use std::fmt;
use thiserror::Error;

/// A Haystack XStr: an extended typed string `(encoding, data)`.
///
/// The `hex` and `b64` encodings are decoded to byte buffers at
/// construction time and re-encoded on output; any other encoding
/// keeps its data as an opaque string.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct XStr {
    encoding: String,
    data: XStrData,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum XStrData {
    Bytes(Vec<u8>),
    Text(String),
}

impl XStr {
    /// Create a new `XStr`. For the `hex` and `b64` encodings the data
    /// is decoded immediately; bad input is a construction-time failure.
    pub fn new(encoding: &str, data: &str) -> Result<Self, ParseXStrError> {
        let decoded = match encoding {
            "hex" => XStrData::Bytes(hex::decode(data).map_err(|_| ParseXStrError {
                encoding: encoding.to_owned(),
                unparsable_data: data.to_owned(),
            })?),
            "b64" => XStrData::Bytes(base64::decode(data).map_err(|_| ParseXStrError {
                encoding: encoding.to_owned(),
                unparsable_data: data.to_owned(),
            })?),
            _ => XStrData::Text(data.to_owned()),
        };
        Ok(XStr {
            encoding: encoding.to_owned(),
            data: decoded,
        })
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Return the decoded byte buffer, for the `hex` and `b64` encodings.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.data {
            XStrData::Bytes(bytes) => Some(bytes),
            XStrData::Text(_) => None,
        }
    }

    /// Return the data re-encoded as a string: hex digits for `hex`,
    /// base64 without embedded newlines for `b64`, and the opaque data
    /// unchanged for any other encoding.
    pub fn data_to_string(&self) -> String {
        match &self.data {
            XStrData::Bytes(bytes) => {
                if self.encoding == "hex" {
                    hex::encode(bytes)
                } else {
                    base64::encode(bytes)
                }
            }
            XStrData::Text(text) => text.clone(),
        }
    }

    /// The zinc type name for this encoding: `Hex`, `B64`, or the
    /// encoding itself for anything else.
    pub fn type_name(&self) -> String {
        match self.encoding.as_str() {
            "hex" => "Hex".to_owned(),
            "b64" => "B64".to_owned(),
            other => other.to_owned(),
        }
    }

    /// Map a zinc type name back to the encoding it denotes.
    pub fn encoding_for_type_name(type_name: &str) -> String {
        match type_name {
            "Hex" => "hex".to_owned(),
            "B64" => "b64".to_owned(),
            other => other.to_owned(),
        }
    }
}

impl fmt::Display for XStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(\"{}\")", self.type_name(), self.data_to_string())
    }
}

/// An error indicating that XStr data could not be decoded.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("Could not decode {encoding} data from the string '{unparsable_data}'")]
pub struct ParseXStrError {
    encoding: String,
    unparsable_data: String,
}

#[cfg(test)]
mod test {
    use super::XStr;

    #[test]
    fn hex_decodes_on_construction() {
        let xstr = XStr::new("hex", "deadbeef").unwrap();
        assert_eq!(xstr.bytes(), Some(&[0xde, 0xad, 0xbe, 0xef][..]));
        assert_eq!(xstr.data_to_string(), "deadbeef");
    }

    #[test]
    fn bad_hex_is_a_construction_failure() {
        assert!(XStr::new("hex", "zzzz").is_err());
    }

    #[test]
    fn b64_round_trips_without_newlines() {
        let xstr = XStr::new("b64", "aGVsbG8gd29ybGQ=").unwrap();
        assert_eq!(xstr.bytes(), Some("hello world".as_bytes()));
        let encoded = xstr.data_to_string();
        assert_eq!(encoded, "aGVsbG8gd29ybGQ=");
        assert!(!encoded.contains('\n'));
    }

    #[test]
    fn unknown_encoding_is_opaque() {
        let xstr = XStr::new("Color", "#ff00ff").unwrap();
        assert_eq!(xstr.bytes(), None);
        assert_eq!(xstr.data_to_string(), "#ff00ff");
        assert_eq!(xstr.to_string(), "Color(\"#ff00ff\")");
    }

    #[test]
    fn type_names() {
        assert_eq!(XStr::new("hex", "00").unwrap().type_name(), "Hex");
        assert_eq!(XStr::new("b64", "").unwrap().type_name(), "B64");
        assert_eq!(XStr::encoding_for_type_name("Hex"), "hex");
        assert_eq!(XStr::encoding_for_type_name("Color"), "Color");
    }
}
