//! Types and procedures defined by EIP-712.
//!
//! https://eips.ethereum.org/EIPS/eip-712
//!
//! Encoding is driven by a [`Schema`], never by the order in which the
//! fields of a [`Message`] happen to be stored.

use {
    alloy::primitives::{Address, B256, Bytes, FixedBytes, U256, keccak256},
    serde_json::{Map, Value as Json, json},
    std::{collections::HashMap, fmt},
    thiserror::Error,
};

/// Atomic field types understood by the encoder.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FieldType {
    Address,
    Bytes4,
    Bytes32,
    Bytes,
    String,
    Uint256,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Bytes4 => "bytes4",
            Self::Bytes32 => "bytes32",
            Self::Bytes => "bytes",
            Self::String => "string",
            Self::Uint256 => "uint256",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

/// A named struct type with an ordered list of fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    Address(Address),
    Bytes4(FixedBytes<4>),
    Bytes32(B256),
    Bytes(Bytes),
    String(String),
    Uint256(U256),
}

/// Field values keyed by field name.
pub type Message = HashMap<String, Value>;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum EncodingError {
    #[error("{schema} message is missing field {field:?}")]
    MissingField {
        schema: &'static str,
        field: &'static str,
    },
    #[error("{schema} field {field:?} expects {expected} but got {actual}")]
    TypeMismatch {
        schema: &'static str,
        field: &'static str,
        expected: FieldType,
        actual: FieldType,
    },
}

impl Value {
    pub fn ty(&self) -> FieldType {
        match self {
            Self::Address(_) => FieldType::Address,
            Self::Bytes4(_) => FieldType::Bytes4,
            Self::Bytes32(_) => FieldType::Bytes32,
            Self::Bytes(_) => FieldType::Bytes,
            Self::String(_) => FieldType::String,
            Self::Uint256(_) => FieldType::Uint256,
        }
    }

    /// The 32 byte word this value contributes to `encodeData`. Dynamic
    /// values are replaced by their hash, fixed size byte arrays are right
    /// padded and everything else is left padded.
    fn encode(&self) -> B256 {
        match self {
            Self::Address(address) => address.into_word(),
            Self::Bytes4(bytes) => {
                let mut word = B256::ZERO;
                word.0[..4].copy_from_slice(bytes.as_slice());
                word
            }
            Self::Bytes32(bytes) => *bytes,
            Self::Bytes(bytes) => keccak256(bytes),
            Self::String(string) => keccak256(string.as_bytes()),
            Self::Uint256(value) => B256::from(value.to_be_bytes::<32>()),
        }
    }

    /// Representation expected by wallets implementing
    /// `eth_signTypedData_v4`.
    fn to_json(&self) -> Json {
        match self {
            Self::Address(address) => json!(address.to_checksum(None)),
            Self::Bytes4(bytes) => json!(const_hex::encode_prefixed(bytes)),
            Self::Bytes32(bytes) => json!(const_hex::encode_prefixed(bytes)),
            Self::Bytes(bytes) => json!(const_hex::encode_prefixed(bytes)),
            Self::String(string) => json!(string),
            Self::Uint256(value) => json!(value.to_string()),
        }
    }
}

impl Schema {
    /// `encodeType`, e.g. `Mail(address from,address to,string contents)`.
    pub fn encode_type(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(|field| format!("{} {}", field.ty, field.name))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}({fields})", self.name)
    }

    pub fn type_hash(&self) -> B256 {
        keccak256(self.encode_type())
    }

    /// `typeHash ‖ encodeData(message)` with one word per declared field.
    pub fn encode_data(&self, message: &Message) -> Result<Vec<u8>, EncodingError> {
        let mut data = Vec::with_capacity(32 * (self.fields.len() + 1));
        data.extend_from_slice(self.type_hash().as_slice());
        for field in self.fields {
            let value = self.get(message, field)?;
            data.extend_from_slice(value.encode().as_slice());
        }
        Ok(data)
    }

    pub fn hash_struct(&self, message: &Message) -> Result<B256, EncodingError> {
        Ok(keccak256(self.encode_data(message)?))
    }

    /// The `[{name, type}]` list used in the `types` section of a typed data
    /// payload.
    pub fn types_json(&self) -> Json {
        self.fields
            .iter()
            .map(|field| json!({ "name": field.name, "type": field.ty.as_str() }))
            .collect()
    }

    pub fn message_json(&self, message: &Message) -> Result<Json, EncodingError> {
        let mut object = Map::new();
        for field in self.fields {
            let value = self.get(message, field)?;
            object.insert(field.name.to_string(), value.to_json());
        }
        Ok(Json::Object(object))
    }

    fn get<'a>(&self, message: &'a Message, field: &Field) -> Result<&'a Value, EncodingError> {
        let value = message
            .get(field.name)
            .ok_or(EncodingError::MissingField {
                schema: self.name,
                field: field.name,
            })?;
        if value.ty() != field.ty {
            return Err(EncodingError::TypeMismatch {
                schema: self.name,
                field: field.name,
                expected: field.ty,
                actual: value.ty(),
            });
        }
        Ok(value)
    }
}

/// The signing domain. Every field is part of the digest so signatures
/// cannot be replayed against another chain or contract.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

impl Domain {
    pub const SCHEMA: Schema = Schema {
        name: "EIP712Domain",
        fields: &[
            Field {
                name: "name",
                ty: FieldType::String,
            },
            Field {
                name: "version",
                ty: FieldType::String,
            },
            Field {
                name: "chainId",
                ty: FieldType::Uint256,
            },
            Field {
                name: "verifyingContract",
                ty: FieldType::Address,
            },
        ],
    };

    /// Domain of the exchange contract deployed at `verifying_contract`.
    pub fn exchange(chain_id: u64, verifying_contract: Address) -> Self {
        Self {
            name: crate::EXCHANGE_NAME.to_string(),
            version: crate::EXCHANGE_VERSION.to_string(),
            chain_id,
            verifying_contract,
        }
    }

    pub fn message(&self) -> Message {
        [
            ("name", Value::String(self.name.clone())),
            ("version", Value::String(self.version.clone())),
            ("chainId", Value::Uint256(U256::from(self.chain_id))),
            (
                "verifyingContract",
                Value::Address(self.verifying_contract),
            ),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }

    pub fn separator(&self) -> DomainSeparator {
        let hash = Self::SCHEMA
            .hash_struct(&self.message())
            .expect("domain message matches the domain schema");
        DomainSeparator(hash.0)
    }

    pub fn to_json(&self) -> Json {
        json!({
            "name": self.name,
            "version": self.version,
            "chainId": self.chain_id,
            "verifyingContract": self.verifying_contract.to_checksum(None),
        })
    }
}

/// domainSeparator as defined by EIP-712.
///
/// https://eips.ethereum.org/EIPS/eip-712#definition-of-domainseparator
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct DomainSeparator(pub [u8; 32]);

impl fmt::Debug for DomainSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode(self.0))
    }
}

/// The digest that actually gets signed:
/// `keccak256(0x1901 ‖ domainSeparator ‖ hashStruct(message))`.
pub fn hashed_eip712_message(domain_separator: &DomainSeparator, struct_hash: &B256) -> B256 {
    let mut message = [0u8; 66];
    message[0..2].copy_from_slice(&[0x19, 0x01]);
    message[2..34].copy_from_slice(&domain_separator.0);
    message[34..66].copy_from_slice(struct_hash.as_slice());
    keccak256(message)
}

/// Builds the JSON payload for `eth_signTypedData_v4`.
pub fn typed_data(domain: &Domain, schema: &Schema, message: &Message) -> Result<Json, EncodingError> {
    let mut types = Map::new();
    types.insert(Domain::SCHEMA.name.to_string(), Domain::SCHEMA.types_json());
    types.insert(schema.name.to_string(), schema.types_json());

    Ok(json!({
        "types": types,
        "domain": domain.to_json(),
        "primaryType": schema.name,
        "message": schema.message_json(message)?,
    }))
}
