use {
    alloy::{
        primitives::{Address, B256, Bytes, U256},
        sol_types::SolValue,
    },
    anyhow::{Context as _, Result},
    serde::{Deserialize, Serialize},
    std::{
        fmt::{self, Debug, Formatter},
        str::FromStr,
    },
    thiserror::Error,
};

/// See [`Signature`].
#[derive(Eq, PartialEq, Clone, Copy, Debug, Default, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SigningScheme {
    #[default]
    Eip712,
    EthSign,
}

impl FromStr for SigningScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eip712" => Ok(Self::Eip712),
            "ethsign" => Ok(Self::EthSign),
            _ => anyhow::bail!("unknown signing scheme {s:?}, expected eip712 or ethsign"),
        }
    }
}

impl fmt::Display for SigningScheme {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Eip712 => "eip712",
            Self::EthSign => "ethsign",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
#[error("ECDSA signature must be 65 bytes long but got {0} bytes")]
pub struct MalformedSignature(pub usize);

/// Signature over an order.
/// Both variants rely on the EIP-712 digest of the order.
#[derive(Eq, PartialEq, Clone, Copy, Deserialize, Serialize, Hash)]
#[serde(into = "JsonSignature", try_from = "JsonSignature")]
pub enum Signature {
    /// The order struct is signed according to EIP-712.
    ///
    /// https://eips.ethereum.org/EIPS/eip-712
    Eip712(EcdsaSignature),
    /// The order digest is signed according to EIP-191's personal_sign
    /// signature format. The exchange learns about it from a trailing
    /// suffix byte.
    ///
    /// https://eips.ethereum.org/EIPS/eip-191
    EthSign(EcdsaSignature),
}

impl Debug for Signature {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let scheme = format!("{:?}", self.scheme());
        let bytes = const_hex::encode_prefixed(self.ecdsa().to_bytes());
        f.debug_tuple(&scheme).field(&bytes).finish()
    }
}

impl Signature {
    /// Suffix the exchange uses to recognise EIP-191 signatures.
    pub const ETH_SIGN_SUFFIX: u8 = 0x03;

    /// Parses the raw bytes a wallet returned for the given scheme.
    ///
    /// Some wallets answer `eth_sign` with the bare recovery id, those are
    /// shifted into the 27/28 range the exchange expects.
    pub fn from_bytes(scheme: SigningScheme, bytes: &[u8]) -> Result<Self, MalformedSignature> {
        let signature = EcdsaSignature::parse(bytes)?;
        Ok(match scheme {
            SigningScheme::Eip712 => Self::Eip712(signature),
            SigningScheme::EthSign => Self::EthSign(EcdsaSignature {
                v: if signature.v < 27 {
                    signature.v + 27
                } else {
                    signature.v
                },
                ..signature
            }),
        })
    }

    pub fn scheme(&self) -> SigningScheme {
        match self {
            Self::Eip712(_) => SigningScheme::Eip712,
            Self::EthSign(_) => SigningScheme::EthSign,
        }
    }

    pub fn ecdsa(&self) -> &EcdsaSignature {
        match self {
            Self::Eip712(signature) | Self::EthSign(signature) => signature,
        }
    }

    pub fn suffix(&self) -> Option<u8> {
        match self {
            Self::Eip712(_) => None,
            Self::EthSign(_) => Some(Self::ETH_SIGN_SUFFIX),
        }
    }

    /// `abi.encode(uint8 v, bytes32 r, bytes32 s)` followed by the scheme's
    /// suffix, as accepted by `validateOrderAuthorization_` and
    /// `atomicMatch_`.
    pub fn encode_for_exchange(&self) -> Bytes {
        let signature = self.ecdsa();
        let mut encoded = (U256::from(signature.v), signature.r, signature.s).abi_encode_params();
        encoded.extend(self.suffix());
        encoded.into()
    }

    /// Recovers the signer of `digest`, the EIP-712 digest of an order.
    pub fn recover(&self, digest: &B256) -> Result<Address> {
        let signature = alloy::primitives::Signature::from_raw(&self.ecdsa().to_bytes())
            .context("invalid ECDSA signature")?;
        let signer = match self {
            Self::Eip712(_) => signature.recover_address_from_prehash(digest),
            Self::EthSign(_) => signature.recover_address_from_msg(digest.as_slice()),
        };
        signer.context("could not recover signer")
    }
}

/// `abi.encode(bytes, bytes)` of both sides' encoded signatures.
pub fn encode_pair(first: &Signature, second: &Signature) -> Bytes {
    (first.encode_for_exchange(), second.encode_for_exchange())
        .abi_encode_params()
        .into()
}

/// An internal type used for deriving `serde` implementations for the
/// `Signature` type.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSignature {
    signing_scheme: SigningScheme,
    signature: Bytes,
}

impl From<Signature> for JsonSignature {
    fn from(signature: Signature) -> Self {
        Self {
            signing_scheme: signature.scheme(),
            signature: signature.ecdsa().to_bytes().into(),
        }
    }
}

impl TryFrom<JsonSignature> for Signature {
    type Error = MalformedSignature;

    fn try_from(json: JsonSignature) -> Result<Self, Self::Error> {
        Self::from_bytes(json.signing_scheme, &json.signature)
    }
}

#[derive(Eq, PartialEq, Clone, Copy, Debug, Default, Hash)]
pub struct EcdsaSignature {
    pub r: B256,
    pub s: B256,
    pub v: u8,
}

impl EcdsaSignature {
    /// r + s + v
    pub fn to_bytes(self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(self.r.as_slice());
        bytes[32..64].copy_from_slice(self.s.as_slice());
        bytes[64] = self.v;
        bytes
    }

    pub fn from_bytes(bytes: &[u8; 65]) -> Self {
        EcdsaSignature {
            r: B256::from_slice(&bytes[..32]),
            s: B256::from_slice(&bytes[32..64]),
            v: bytes[64],
        }
    }

    /// Slices `r`, `s` and `v` out of a 65 byte blob.
    pub fn parse(bytes: &[u8]) -> Result<Self, MalformedSignature> {
        let bytes: &[u8; 65] = bytes
            .try_into()
            .map_err(|_| MalformedSignature(bytes.len()))?;
        Ok(Self::from_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{
            primitives::keccak256,
            signers::{SignerSync, local::PrivateKeySigner},
        },
        serde_json::json,
    };

    fn raw() -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&[1; 32]);
        bytes[32..64].copy_from_slice(&[2; 32]);
        bytes[64] = 28;
        bytes
    }

    #[test]
    fn parses_r_s_v() {
        let signature = EcdsaSignature::parse(&raw()).unwrap();
        assert_eq!(signature.r, B256::repeat_byte(1));
        assert_eq!(signature.s, B256::repeat_byte(2));
        assert_eq!(signature.v, 28);
        assert_eq!(signature.to_bytes(), raw());
    }

    #[test]
    fn rejects_signatures_of_the_wrong_length() {
        assert_eq!(
            EcdsaSignature::parse(&raw()[..64]).unwrap_err(),
            MalformedSignature(64)
        );
        assert_eq!(EcdsaSignature::parse(&[]).unwrap_err(), MalformedSignature(0));
        assert!(Signature::from_bytes(SigningScheme::EthSign, &[0u8; 66]).is_err());
    }

    #[test]
    fn eth_sign_normalizes_recovery_id() {
        let mut bytes = raw();
        bytes[64] = 1;
        let signature = Signature::from_bytes(SigningScheme::EthSign, &bytes).unwrap();
        assert_eq!(signature.ecdsa().v, 28);

        let signature = Signature::from_bytes(SigningScheme::EthSign, &raw()).unwrap();
        assert_eq!(signature.ecdsa().v, 28);

        bytes[64] = 0;
        let signature = Signature::from_bytes(SigningScheme::Eip712, &bytes).unwrap();
        assert_eq!(signature.ecdsa().v, 0);
    }

    #[test]
    fn exchange_encoding() {
        let eip712 = Signature::from_bytes(SigningScheme::Eip712, &raw()).unwrap();
        let encoded = eip712.encode_for_exchange();
        assert_eq!(encoded.len(), 96);
        assert_eq!(&encoded[..31], &[0u8; 31]);
        assert_eq!(encoded[31], 28);
        assert_eq!(&encoded[32..64], &[1; 32]);
        assert_eq!(&encoded[64..96], &[2; 32]);

        let eth_sign = Signature::from_bytes(SigningScheme::EthSign, &raw()).unwrap();
        let encoded = eth_sign.encode_for_exchange();
        assert_eq!(encoded.len(), 97);
        assert_eq!(&encoded[..96], &eip712.encode_for_exchange()[..]);
        assert_eq!(encoded[96], 0x03);
    }

    #[test]
    fn pair_encoding() {
        let first = Signature::from_bytes(SigningScheme::Eip712, &raw()).unwrap();
        let second = Signature::from_bytes(SigningScheme::EthSign, &raw()).unwrap();
        let encoded = encode_pair(&first, &second);

        let word = |i: usize| U256::from_be_slice(&encoded[32 * i..32 * (i + 1)]);
        // offsets of both byte strings
        assert_eq!(word(0), U256::from(0x40));
        assert_eq!(word(1), U256::from(0x40 + 0x20 + 0x60));
        // first byte string
        assert_eq!(word(2), U256::from(96));
        assert_eq!(&encoded[0x60..0xc0], &first.encode_for_exchange()[..]);
        // second byte string, padded to a full word
        assert_eq!(word(6), U256::from(97));
        assert_eq!(&encoded[0xe0..0xe0 + 97], &second.encode_for_exchange()[..]);
        assert_eq!(encoded.len(), 0xe0 + 128);
    }

    #[test]
    fn recovers_signers() {
        let signer = PrivateKeySigner::random();
        let digest = keccak256("order");

        let signed = signer.sign_hash_sync(&digest).unwrap();
        let signature = Signature::from_bytes(SigningScheme::Eip712, &signed.as_bytes()).unwrap();
        assert_eq!(signature.recover(&digest).unwrap(), signer.address());

        let signed = signer.sign_message_sync(digest.as_slice()).unwrap();
        let signature = Signature::from_bytes(SigningScheme::EthSign, &signed.as_bytes()).unwrap();
        assert_eq!(signature.recover(&digest).unwrap(), signer.address());
    }

    #[test]
    fn serialization() {
        let signature = Signature::from_bytes(SigningScheme::EthSign, &raw()).unwrap();
        let json = serde_json::to_value(signature).unwrap();
        assert_eq!(json["signingScheme"], json!("ethsign"));
        assert_eq!(
            json["signature"],
            json!(const_hex::encode_prefixed(raw()))
        );
        assert_eq!(serde_json::from_value::<Signature>(json).unwrap(), signature);

        assert!(
            serde_json::from_value::<Signature>(json!({
                "signingScheme": "eip712",
                "signature": "0x0102",
            }))
            .is_err()
        );
    }

    #[test]
    fn scheme_from_str() {
        assert_eq!("eip712".parse::<SigningScheme>().unwrap(), SigningScheme::Eip712);
        assert_eq!("ethsign".parse::<SigningScheme>().unwrap(), SigningScheme::EthSign);
        assert!("presign".parse::<SigningScheme>().is_err());
    }
}
