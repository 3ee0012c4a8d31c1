//! Custom serde helpers for byte fields in stored records and messages.

/// Serialize a byte vector as a standard base64 string.
pub mod base64bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Implements the serde `serialize` function for a byte slice.
    ///
    /// # Errors
    /// Returns an error if the serializer rejects the string.
    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    /// Implements the serde `deserialize` function for a byte vector.
    ///
    /// # Errors
    /// Returns an error if the string is not valid base64.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}

/// Serialize a list of byte vectors as standard base64 strings.
pub mod base64bytes_list {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Implements the serde `serialize` function for a list of byte slices.
    ///
    /// # Errors
    /// Returns an error if the serializer rejects an element.
    pub fn serialize<S>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(&STANDARD.encode(item))?;
        }
        seq.end()
    }

    /// Implements the serde `deserialize` function for a list of byte
    /// vectors.
    ///
    /// # Errors
    /// Returns an error if any element is not valid base64.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .into_iter()
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        #[serde(with = "super::base64bytes")]
        data: Vec<u8>,
    }

    #[test]
    fn bytes_round_trip_as_base64() {
        let blob = Blob {
            data: vec![0, 1, 2, 250],
        };
        let json = serde_json::to_string(&blob).unwrap();
        assert_eq!(json, "{\"data\":\"AAEC+g==\"}");
        assert_eq!(serde_json::from_str::<Blob>(&json).unwrap(), blob);
    }
}
