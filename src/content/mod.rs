use std::collections::BTreeMap;
use std::str::FromStr;

use once_cell::race::OnceBox;
use serde::{Deserialize, Serialize};
use ton_types::{BuilderData, Cell, HashmapE, HashmapType, IBitstring, SliceData, UInt256};

pub use self::offchain::{is_ipfs_uri, FetchError, OffchainFetcher};

mod offchain;

pub const ONCHAIN_CONTENT_PREFIX: u8 = 0x00;
pub const OFFCHAIN_CONTENT_PREFIX: u8 = 0x01;

const SNAKE_PREFIX: u8 = 0x00;

/// Max number of payload bytes in one snake chunk
pub const CELL_MAX_SIZE_BYTES: usize = (1023 - 8) / 8;

const KEY_BITS: usize = 256;

/// Known on-chain metadata attributes (TEP-64)
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataKey {
    Uri,
    Name,
    Description,
    Image,
    ImageData,
    Symbol,
    Decimals,
}

impl MetadataKey {
    pub const ALL: [Self; 7] = [
        Self::Uri,
        Self::Name,
        Self::Description,
        Self::Image,
        Self::ImageData,
        Self::Symbol,
        Self::Decimals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uri => "uri",
            Self::Name => "name",
            Self::Description => "description",
            Self::Image => "image",
            Self::ImageData => "image_data",
            Self::Symbol => "symbol",
            Self::Decimals => "decimals",
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        match self {
            Self::Uri | Self::Image | Self::ImageData => TextEncoding::Ascii,
            Self::Name | Self::Description | Self::Symbol | Self::Decimals => TextEncoding::Utf8,
        }
    }

    /// SHA-256 of the attribute name, used as a dictionary key
    pub fn hash(&self) -> &'static UInt256 {
        static HASHES: OnceBox<[UInt256; 7]> = OnceBox::new();
        let hashes = HASHES.get_or_init(|| {
            Box::new(Self::ALL.map(|key| UInt256::calc_file_hash(key.as_str().as_bytes())))
        });
        &hashes[*self as usize]
    }

    fn dict_key(&self) -> SliceData {
        SliceData::from_raw(self.hash().as_slice().to_vec(), KEY_BITS)
    }
}

impl std::fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetadataKey {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ContentError::UnsupportedKey(s.to_owned()))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TextEncoding {
    Utf8,
    Ascii,
}

impl TextEncoding {
    fn encode(self, key: MetadataKey, value: &str) -> Result<Vec<u8>, ContentError> {
        match self {
            Self::Utf8 => Ok(value.as_bytes().to_vec()),
            Self::Ascii if value.is_ascii() => Ok(value.as_bytes().to_vec()),
            Self::Ascii => Err(ContentError::NonAsciiValue(key)),
        }
    }

    fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Ascii => bytes.iter().map(|&byte| (byte & 0x7f) as char).collect(),
        }
    }
}

/// Jetton metadata attributes.
///
/// Empty values may be present in the map, but they are never written
/// into the content cell.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Option<String>>")]
pub struct JettonMetadata(BTreeMap<MetadataKey, String>);

impl JettonMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds metadata from string pairs, rejecting unknown attribute names
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ContentError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut metadata = Self::new();
        for (key, value) in pairs {
            metadata.insert(key.as_ref().parse()?, value);
        }
        Ok(metadata)
    }

    /// Picks known attributes from a JSON object, ignoring everything else
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;

        let mut metadata = Self::new();
        for key in MetadataKey::ALL {
            match object.get(key.as_str()) {
                Some(serde_json::Value::String(value)) => {
                    metadata.insert(key, value.clone());
                }
                Some(serde_json::Value::Number(value)) => {
                    metadata.insert(key, value.to_string());
                }
                _ => {}
            }
        }
        Some(metadata)
    }

    pub fn with(mut self, key: MetadataKey, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: MetadataKey, value: impl Into<String>) -> Option<String> {
        self.0.insert(key, value.into())
    }

    pub fn remove(&mut self, key: MetadataKey) -> Option<String> {
        self.0.remove(&key)
    }

    pub fn get(&self, key: MetadataKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetadataKey, &str)> {
        self.0.iter().map(|(key, value)| (*key, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<BTreeMap<String, Option<String>>> for JettonMetadata {
    type Error = ContentError;

    fn try_from(map: BTreeMap<String, Option<String>>) -> Result<Self, Self::Error> {
        let mut metadata = Self::new();
        for (key, value) in map {
            let key = key.parse()?;
            if let Some(value) = value {
                metadata.insert(key, value);
            }
        }
        Ok(metadata)
    }
}

/// Builds on-chain content cell: `0x00` prefix followed by a dictionary
/// `sha256(key) -> ^snake`
pub fn build_onchain_metadata(metadata: &JettonMetadata) -> Result<Cell, ContentError> {
    let mut dict = HashmapE::with_bit_len(KEY_BITS);
    for (key, value) in metadata.iter() {
        if value.is_empty() {
            continue;
        }

        let content = key.encoding().encode(key, value)?;
        let snake = store_snake(&content)?;
        dict.setref(key.dict_key(), &snake)?;
    }

    let mut builder = BuilderData::new();
    builder.append_u8(ONCHAIN_CONTENT_PREFIX)?;
    dict.write_hashmap_data(&mut builder)?;
    Ok(builder.into_cell()?)
}

/// Builds off-chain content cell: `0x01` prefix followed by an ASCII uri
pub fn build_offchain_metadata(uri: &str) -> Result<Cell, ContentError> {
    let content = TextEncoding::Ascii.encode(MetadataKey::Uri, uri)?;

    let mut builder = BuilderData::new();
    builder
        .append_u8(OFFCHAIN_CONTENT_PREFIX)?
        .append_raw(&content, content.len() * 8)?;
    Ok(builder.into_cell()?)
}

/// Splits bytes into a chain of cells.
///
/// Only the head cell starts with the snake prefix, each next chunk
/// is stored as the single reference of the previous one.
pub fn store_snake(content: &[u8]) -> Result<Cell, ContentError> {
    let chunk_count = std::cmp::max(
        1,
        (content.len() + CELL_MAX_SIZE_BYTES - 1) / CELL_MAX_SIZE_BYTES,
    );

    // Chain is built from the tail
    let mut tail: Option<Cell> = None;
    for index in (0..chunk_count).rev() {
        let start = index * CELL_MAX_SIZE_BYTES;
        let end = std::cmp::min(start + CELL_MAX_SIZE_BYTES, content.len());
        let chunk = &content[start..end];

        let mut builder = BuilderData::new();
        if index == 0 {
            builder.append_u8(SNAKE_PREFIX)?;
        }
        builder.append_raw(chunk, chunk.len() * 8)?;
        if let Some(next) = tail.take() {
            builder.checked_append_reference(next)?;
        }
        tail = Some(builder.into_cell()?);
    }

    Ok(tail.unwrap_or_default())
}

/// Reads bytes from a chain of cells written by [`store_snake`]
pub fn read_snake(cell: &Cell) -> Result<Vec<u8>, ContentError> {
    let mut result = Vec::new();

    let mut cell = cell.clone();
    let mut first = true;
    loop {
        let mut slice = SliceData::load_cell_ref(&cell)?;
        if first {
            if slice.remaining_bits() < 8 || slice.get_next_byte()? != SNAKE_PREFIX {
                return Err(ContentError::InvalidSnakeFormat);
            }
            first = false;
        }

        let bits = slice.remaining_bits();
        if bits % 8 != 0 {
            return Err(ContentError::MisalignedBits(bits));
        }
        if bits > 0 {
            result.extend_from_slice(&slice.get_next_bytes(bits / 8)?);
        }

        match slice.remaining_references() {
            0 => return Ok(result),
            1 => cell = slice.checked_drain_reference()?,
            _ => return Err(ContentError::InvalidSnakeFormat),
        }
    }
}

/// Content cell with all on-chain parts decoded
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoredContent {
    None,
    Onchain {
        metadata: JettonMetadata,
        /// Some attributes were present but malformed
        is_faulty: bool,
    },
    Offchain {
        uri: String,
    },
}

impl StoredContent {
    pub fn decode(cell: &Cell) -> Result<Self, ContentError> {
        if cell.bit_length() == 0 {
            return Ok(Self::None);
        }

        let mut slice = SliceData::load_cell_ref(cell)?;
        match slice.get_next_byte()? {
            ONCHAIN_CONTENT_PREFIX => {
                let (metadata, is_faulty) = parse_onchain_metadata(&mut slice)?;
                Ok(Self::Onchain {
                    metadata,
                    is_faulty,
                })
            }
            OFFCHAIN_CONTENT_PREFIX => {
                let bits = slice.remaining_bits();
                if bits % 8 != 0 {
                    return Err(ContentError::MisalignedBits(bits));
                }
                let uri = slice.get_next_bytes(bits / 8)?;
                Ok(Self::Offchain {
                    uri: TextEncoding::Ascii.decode(&uri),
                })
            }
            prefix => Err(ContentError::UnknownContentPrefix(prefix)),
        }
    }
}

fn parse_onchain_metadata(slice: &mut SliceData) -> Result<(JettonMetadata, bool), ContentError> {
    let root = slice.get_dictionary()?.reference_opt(0);
    let dict = HashmapE::with_hashmap(KEY_BITS, root);

    let mut metadata = JettonMetadata::new();
    let mut is_faulty = false;
    for key in MetadataKey::ALL {
        let Some(value) = dict.get(key.dict_key())? else { continue };

        let content = match value.reference_opt(0) {
            Some(cell) => read_snake(&cell),
            None => Err(ContentError::InvalidSnakeFormat),
        };

        match content {
            Ok(content) => {
                let value = key.encoding().decode(&content);
                if !value.is_empty() {
                    metadata.insert(key, value);
                }
            }
            Err(e) => {
                tracing::warn!(%key, "skipping malformed metadata attribute: {e}");
                is_faulty = true;
            }
        }
    }

    Ok((metadata, is_faulty))
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceType {
    None,
    Onchain,
    OffchainPrivateDomain,
    OffchainIpfs,
}

/// Fully resolved jetton content
#[derive(Clone, Debug, Serialize)]
pub struct JettonContent {
    pub persistence_type: PersistenceType,
    /// `None` only when off-chain metadata could not be fetched
    pub metadata: Option<JettonMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_uri: Option<String>,
    pub is_faulty: bool,
}

/// Decodes the content cell and fetches off-chain metadata if needed
pub async fn read_metadata(
    cell: &Cell,
    fetcher: &OffchainFetcher,
) -> Result<JettonContent, ContentError> {
    Ok(match StoredContent::decode(cell)? {
        StoredContent::None => JettonContent {
            persistence_type: PersistenceType::None,
            metadata: Some(JettonMetadata::new()),
            content_uri: None,
            is_faulty: false,
        },
        StoredContent::Onchain {
            metadata,
            is_faulty,
        } => JettonContent {
            persistence_type: PersistenceType::Onchain,
            metadata: Some(metadata),
            content_uri: None,
            is_faulty,
        },
        StoredContent::Offchain { uri } => {
            let resolved = fetcher.resolve_uri(&uri);
            let persistence_type = if is_ipfs_uri(&uri) || is_ipfs_uri(&resolved) {
                PersistenceType::OffchainIpfs
            } else {
                PersistenceType::OffchainPrivateDomain
            };
            let metadata = fetcher.fetch(&resolved).await;

            JettonContent {
                persistence_type,
                metadata,
                content_uri: Some(resolved),
                is_faulty: false,
            }
        }
    })
}

#[derive(thiserror::Error, Debug)]
pub enum ContentError {
    #[error("unsupported onchain key: {0}")]
    UnsupportedKey(String),
    #[error("value of `{0}` must be ascii")]
    NonAsciiValue(MetadataKey),
    #[error("only snake format is supported")]
    InvalidSnakeFormat,
    #[error("number of remaining bits is not a multiple of 8: {0}")]
    MisalignedBits(usize),
    #[error("unexpected content prefix: {0:#04x}")]
    UnknownContentPrefix(u8),
    #[error("invalid cell: {0}")]
    Cell(anyhow::Error),
}

impl From<anyhow::Error> for ContentError {
    fn from(e: anyhow::Error) -> Self {
        Self::Cell(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> JettonMetadata {
        JettonMetadata::new()
            .with(MetadataKey::Name, "Staked TON")
            .with(MetadataKey::Symbol, "stTON")
            .with(MetadataKey::Description, "Liquid staking ✓ ünïcode")
            .with(MetadataKey::Image, "https://example.com/logo.png")
            .with(MetadataKey::Decimals, "9")
    }

    fn decode_onchain(cell: &Cell) -> (JettonMetadata, bool) {
        match StoredContent::decode(cell).unwrap() {
            StoredContent::Onchain {
                metadata,
                is_faulty,
            } => (metadata, is_faulty),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    fn raw_cell(bytes: &[u8]) -> Cell {
        let mut builder = BuilderData::new();
        builder.append_raw(bytes, bytes.len() * 8).unwrap();
        builder.into_cell().unwrap()
    }

    #[test]
    fn onchain_metadata_roundtrip() {
        let metadata = sample_metadata();
        let cell = build_onchain_metadata(&metadata).unwrap();

        let (decoded, is_faulty) = decode_onchain(&cell);
        assert_eq!(decoded, metadata);
        assert!(!is_faulty);
    }

    #[test]
    fn empty_values_are_omitted() {
        let metadata = sample_metadata().with(MetadataKey::Image, "");
        let cell = build_onchain_metadata(&metadata).unwrap();

        let (decoded, _) = decode_onchain(&cell);
        assert_eq!(decoded.get(MetadataKey::Image), None);
        assert_eq!(decoded.get(MetadataKey::Name), Some("Staked TON"));
        assert_eq!(decoded.len(), metadata.len() - 1);
    }

    #[test]
    fn empty_metadata_has_empty_dict() {
        let cell = build_onchain_metadata(&JettonMetadata::new()).unwrap();
        assert_eq!(cell.bit_length(), 9);
        assert_eq!(cell.references_count(), 0);

        let (decoded, _) = decode_onchain(&cell);
        assert!(decoded.is_empty());
    }

    #[test]
    fn long_values_span_multiple_cells() {
        let len = CELL_MAX_SIZE_BYTES * 3 + 5;
        let content = (0..len).map(|i| b'a' + (i % 26) as u8).collect::<Vec<_>>();

        let cell = store_snake(&content).unwrap();
        assert_eq!(cell.bit_length(), 8 + CELL_MAX_SIZE_BYTES * 8);
        assert_eq!(cell.references_count(), 1);
        assert_eq!(read_snake(&cell).unwrap(), content);

        let mut links = 1;
        let mut next = cell;
        while next.references_count() > 0 {
            next = next.reference(0).unwrap();
            links += 1;
        }
        assert_eq!(links, 4);
        assert_eq!(next.bit_length(), 5 * 8);

        let description = String::from_utf8(content).unwrap();
        let metadata = JettonMetadata::new().with(MetadataKey::Description, description.clone());
        let (decoded, _) = decode_onchain(&build_onchain_metadata(&metadata).unwrap());
        assert_eq!(decoded.get(MetadataKey::Description), Some(description.as_str()));
    }

    #[test]
    fn chunk_boundary_values() {
        for len in [0, 1, CELL_MAX_SIZE_BYTES, CELL_MAX_SIZE_BYTES + 1, CELL_MAX_SIZE_BYTES * 2] {
            let content = vec![0xab; len];
            assert_eq!(read_snake(&store_snake(&content).unwrap()).unwrap(), content);
        }
    }

    #[test]
    fn unsupported_key_is_rejected() {
        let err = JettonMetadata::from_pairs([("name", "Token"), ("foo", "bar")]).unwrap_err();
        assert!(matches!(err, ContentError::UnsupportedKey(key) if key == "foo"));

        let err = serde_json::from_str::<JettonMetadata>(r#"{"name":"Token","foo":"bar"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("unsupported onchain key: foo"));
    }

    #[test]
    fn metadata_from_json_input() {
        let metadata = serde_json::from_str::<JettonMetadata>(
            r#"{"name":"Token","symbol":"TKN","image_data":null,"decimals":"9"}"#,
        )
        .unwrap();
        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata.get(MetadataKey::ImageData), None);

        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["symbol"], "TKN");
    }

    #[test]
    fn ascii_attributes_reject_non_ascii() {
        let metadata = JettonMetadata::new().with(MetadataKey::Uri, "https://пример.рф");
        assert!(matches!(
            build_onchain_metadata(&metadata),
            Err(ContentError::NonAsciiValue(MetadataKey::Uri))
        ));
    }

    #[test]
    fn snake_without_prefix_is_rejected() {
        assert!(matches!(
            read_snake(&raw_cell(&[0x01, b'a'])),
            Err(ContentError::InvalidSnakeFormat)
        ));
        assert!(matches!(
            read_snake(&Cell::default()),
            Err(ContentError::InvalidSnakeFormat)
        ));
    }

    #[test]
    fn misaligned_snake_is_rejected() {
        let mut builder = BuilderData::new();
        builder.append_u8(SNAKE_PREFIX).unwrap();
        builder.append_bit_one().unwrap();
        let cell = builder.into_cell().unwrap();

        assert!(matches!(read_snake(&cell), Err(ContentError::MisalignedBits(1))));
    }

    #[test]
    fn malformed_attribute_marks_content_as_faulty() {
        let mut dict = HashmapE::with_bit_len(KEY_BITS);
        dict.setref(MetadataKey::Name.dict_key(), &raw_cell(&[0xff, b'x']))
            .unwrap();
        dict.setref(
            MetadataKey::Symbol.dict_key(),
            &store_snake(b"TKN").unwrap(),
        )
        .unwrap();

        let mut builder = BuilderData::new();
        builder.append_u8(ONCHAIN_CONTENT_PREFIX).unwrap();
        dict.write_hashmap_data(&mut builder).unwrap();
        let cell = builder.into_cell().unwrap();

        let (metadata, is_faulty) = decode_onchain(&cell);
        assert!(is_faulty);
        assert_eq!(metadata.get(MetadataKey::Name), None);
        assert_eq!(metadata.get(MetadataKey::Symbol), Some("TKN"));
    }

    #[test]
    fn empty_cell_has_no_content() {
        assert_eq!(
            StoredContent::decode(&Cell::default()).unwrap(),
            StoredContent::None
        );
    }

    #[test]
    fn unknown_prefix_is_rejected() {
        assert!(matches!(
            StoredContent::decode(&raw_cell(&[0x02, 0x00])),
            Err(ContentError::UnknownContentPrefix(0x02))
        ));
    }

    #[test]
    fn offchain_uri_roundtrip() {
        let cell = build_offchain_metadata("ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG")
            .unwrap();
        assert_eq!(
            StoredContent::decode(&cell).unwrap(),
            StoredContent::Offchain {
                uri: "ipfs://QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG".to_owned()
            }
        );
    }

    #[test]
    fn key_hashes_are_sha256_of_names() {
        use sha2::Digest;

        for key in MetadataKey::ALL {
            let expected = sha2::Sha256::digest(key.as_str().as_bytes());
            assert_eq!(key.hash().as_slice(), expected.as_slice());
            assert_eq!(key.as_str().parse::<MetadataKey>().unwrap(), key);
        }
    }
}
