//! Signing key registry.
//!
//! The process holds exactly one asymmetric key pair. It is loaded from PEM
//! files or generated when the registry is built and never mutated afterwards,
//! so signing and verification share it through an `Arc` without locking.
//! Rotation is a restart-time operation.
//!
//! ## Supported Algorithms
//!
//! - **RS256**: RSA with SHA-256
//! - **RS384**: RSA with SHA-384
//! - **ES384**: ECDSA with the P-384 curve

use std::fmt;
use std::path::Path;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use elliptic_curve::sec1::ToEncodedPoint;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use p384::SecretKey as EcSecretKey;
use p384::pkcs8::{DecodePrivateKey as EcDecodePrivateKey, EncodePrivateKey as EcEncodePrivateKey};
use rand::rngs::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey as RsaDecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::config::SigningConfig;
use crate::error::AuthError;
use crate::token::jwt::JwtError;

// ============================================================================
// Signing Algorithm
// ============================================================================

/// JWT signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    RS256,
    RS384,
    ES384,
}

impl SigningAlgorithm {
    /// Parse the configured algorithm name.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidKey` for unsupported names.
    pub fn parse(s: &str) -> Result<Self, JwtError> {
        match s {
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            "ES384" => Ok(Self::ES384),
            other => Err(JwtError::invalid_key(format!(
                "Unsupported signing algorithm: {other}"
            ))),
        }
    }

    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
            Self::ES384 => Algorithm::ES384,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::ES384 => "ES384",
        }
    }

    #[must_use]
    pub fn is_rsa(&self) -> bool {
        matches!(self, Self::RS256 | Self::RS384)
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// JWKS Types
// ============================================================================

/// JSON Web Key Set (RFC 7517).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// A public JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    #[serde(rename = "use")]
    pub use_: String,
    pub alg: String,

    // RSA
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    // EC
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

// ============================================================================
// Signing Key Pair
// ============================================================================

enum PublicKeyData {
    Rsa { n: Vec<u8>, e: Vec<u8> },
    Ec { x: Vec<u8>, y: Vec<u8> },
}

impl PublicKeyData {
    /// RFC 7638 JWK thumbprint, used as the default key ID.
    fn thumbprint(&self) -> String {
        // Members in lexicographic order, no whitespace.
        let canonical = match self {
            Self::Rsa { n, e } => format!(
                r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#,
                URL_SAFE_NO_PAD.encode(e),
                URL_SAFE_NO_PAD.encode(n)
            ),
            Self::Ec { x, y } => format!(
                r#"{{"crv":"P-384","kty":"EC","x":"{}","y":"{}"}}"#,
                URL_SAFE_NO_PAD.encode(x),
                URL_SAFE_NO_PAD.encode(y)
            ),
        };
        URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
    }
}

/// An asymmetric key pair with its JWT encoding and decoding keys.
pub struct SigningKeyPair {
    pub kid: String,
    pub algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    public_key_data: PublicKeyData,
    pub created_at: OffsetDateTime,
}

impl SigningKeyPair {
    /// Generate a fresh key pair for `algorithm`.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::KeyGenerationError` if key generation or PEM
    /// export fails.
    pub fn generate(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        if algorithm.is_rsa() {
            Self::generate_rsa(algorithm)
        } else {
            Self::generate_ec()
        }
    }

    fn generate_rsa(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Self::rsa_from_pem(None, algorithm, private_pem.as_str(), &public_pem)
    }

    fn generate_ec() -> Result<Self, JwtError> {
        let secret_key = EcSecretKey::random(&mut OsRng);
        let private_pem = secret_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Self::ec_from_pem(None, private_pem.as_str())
    }

    /// Build a key pair from PKCS#8 private and SPKI public PEM documents.
    ///
    /// For ES384 the public key is derived from the private key and
    /// `public_pem` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidKey` if either document cannot be parsed.
    pub fn from_pem(
        kid: Option<String>,
        algorithm: SigningAlgorithm,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<Self, JwtError> {
        if algorithm.is_rsa() {
            Self::rsa_from_pem(kid, algorithm, private_pem, public_pem)
        } else {
            Self::ec_from_pem(kid, private_pem)
        }
    }

    fn rsa_from_pem(
        kid: Option<String>,
        algorithm: SigningAlgorithm,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        let public_key = RsaPublicKey::from_public_key_pem(public_pem)
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        // PKCS#8 first, then the PKCS#1 form jsonwebtoken also accepts.
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_pem))
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        if private_key.to_public_key() != public_key {
            return Err(JwtError::invalid_key(
                "Public key does not match the private key",
            ));
        }

        let public_key_data = PublicKeyData::Rsa {
            n: public_key.n().to_bytes_be(),
            e: public_key.e().to_bytes_be(),
        };

        Ok(Self::assemble(
            kid,
            algorithm,
            encoding_key,
            decoding_key,
            public_key_data,
        ))
    }

    fn ec_from_pem(kid: Option<String>, private_pem: &str) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_ec_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        let secret_key = EcSecretKey::from_pkcs8_pem(private_pem)
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        let point = secret_key.public_key().to_encoded_point(false);
        let x = point
            .x()
            .ok_or_else(|| JwtError::invalid_key("Missing x coordinate"))?;
        let y = point
            .y()
            .ok_or_else(|| JwtError::invalid_key("Missing y coordinate"))?;

        let decoding_key = DecodingKey::from_ec_components(
            &URL_SAFE_NO_PAD.encode(x.as_slice()),
            &URL_SAFE_NO_PAD.encode(y.as_slice()),
        )
        .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        let public_key_data = PublicKeyData::Ec {
            x: x.to_vec(),
            y: y.to_vec(),
        };

        Ok(Self::assemble(
            kid,
            SigningAlgorithm::ES384,
            encoding_key,
            decoding_key,
            public_key_data,
        ))
    }

    fn assemble(
        kid: Option<String>,
        algorithm: SigningAlgorithm,
        encoding_key: EncodingKey,
        decoding_key: DecodingKey,
        public_key_data: PublicKeyData,
    ) -> Self {
        Self {
            kid: kid.unwrap_or_else(|| public_key_data.thumbprint()),
            algorithm,
            encoding_key,
            decoding_key,
            public_key_data,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Public half as a JWK.
    #[must_use]
    pub fn to_jwk(&self) -> Jwk {
        let mut jwk = Jwk {
            kty: String::new(),
            kid: self.kid.clone(),
            use_: "sig".to_string(),
            alg: self.algorithm.as_str().to_string(),
            n: None,
            e: None,
            crv: None,
            x: None,
            y: None,
        };
        match &self.public_key_data {
            PublicKeyData::Rsa { n, e } => {
                jwk.kty = "RSA".to_string();
                jwk.n = Some(URL_SAFE_NO_PAD.encode(n));
                jwk.e = Some(URL_SAFE_NO_PAD.encode(e));
            }
            PublicKeyData::Ec { x, y } => {
                jwk.kty = "EC".to_string();
                jwk.crv = Some("P-384".to_string());
                jwk.x = Some(URL_SAFE_NO_PAD.encode(x));
                jwk.y = Some(URL_SAFE_NO_PAD.encode(y));
            }
        }
        jwk
    }
}

// ============================================================================
// Key Registry
// ============================================================================

/// Process-wide holder of the signing key pair.
pub struct KeyRegistry {
    key_pair: SigningKeyPair,
}

impl std::fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRegistry")
            .field("kid", &self.key_pair.kid)
            .field("algorithm", &self.key_pair.algorithm)
            .finish_non_exhaustive()
    }
}

impl KeyRegistry {
    #[must_use]
    pub fn new(key_pair: SigningKeyPair) -> Self {
        Self { key_pair }
    }

    /// Build the registry from configuration.
    ///
    /// Loads the configured PEM files, or generates an ephemeral key pair
    /// when none are configured. Any failure here must stop startup.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the algorithm is unsupported or
    /// the key material cannot be read or parsed.
    pub fn from_config(config: &SigningConfig) -> Result<Self, AuthError> {
        let algorithm = SigningAlgorithm::parse(&config.algorithm)
            .map_err(|e| AuthError::configuration(e.to_string()))?;

        let key_pair = match (&config.private_key_path, &config.public_key_path) {
            (Some(private_path), Some(public_path)) => {
                let private_pem = read_pem(private_path)?;
                let public_pem = read_pem(public_path)?;
                let pair =
                    SigningKeyPair::from_pem(config.kid.clone(), algorithm, &private_pem, &public_pem)
                        .map_err(|e| {
                            AuthError::configuration(format!(
                                "Invalid signing key {}: {e}",
                                private_path.display()
                            ))
                        })?;
                tracing::info!(kid = %pair.kid, algorithm = %algorithm, "Loaded signing key");
                pair
            }
            (None, None) => {
                let mut pair = SigningKeyPair::generate(algorithm)
                    .map_err(|e| AuthError::configuration(e.to_string()))?;
                if let Some(kid) = &config.kid {
                    pair.kid = kid.clone();
                }
                tracing::warn!(
                    kid = %pair.kid,
                    algorithm = %algorithm,
                    "No signing key configured, generated an ephemeral key pair"
                );
                pair
            }
            _ => {
                return Err(AuthError::configuration(
                    "signing.private_key_path and signing.public_key_path must be set together",
                ));
            }
        };

        Ok(Self::new(key_pair))
    }

    /// Key used to sign tokens.
    #[must_use]
    pub fn private_key(&self) -> &EncodingKey {
        &self.key_pair.encoding_key
    }

    /// Key used to verify token signatures.
    #[must_use]
    pub fn public_key(&self) -> &DecodingKey {
        &self.key_pair.decoding_key
    }

    #[must_use]
    pub fn algorithm(&self) -> SigningAlgorithm {
        self.key_pair.algorithm
    }

    #[must_use]
    pub fn kid(&self) -> &str {
        &self.key_pair.kid
    }

    /// The key set published to resource servers.
    #[must_use]
    pub fn jwks(&self) -> Jwks {
        Jwks {
            keys: vec![self.key_pair.to_jwk()],
        }
    }
}

fn read_pem(path: &Path) -> Result<String, AuthError> {
    std::fs::read_to_string(path).map_err(|e| {
        AuthError::configuration(format!("Cannot read key file {}: {e}", path.display()))
    })
}
