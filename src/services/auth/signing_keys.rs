//! JWT 서명 키 관리
//!
//! HS256(공유 비밀키)과 RS256(RSA 개인키) 두 가지 서명 방식을 지원합니다.
//! RS256일 때는 공개키를 JWKS 형식으로 노출해 다른 서비스가 저장소 조회 없이
//! 토큰을 검증할 수 있게 합니다.
//!
//! # RSA 키 준비
//!
//! ```bash
//! # 개인키 생성 (PKCS#1 또는 PKCS#8 모두 지원)
//! openssl genrsa -out jwt_private_key.pem 2048
//! export JWT_ALGORITHM=RS256
//! export JWT_PRIVATE_KEY_PATH=./secrets/jwt_private_key.pem
//! ```
//!
//! 운영 환경이 아니고 `JWT_PRIVATE_KEY_PATH`가 없으면 기동 시 임시 2048비트 키를 생성합니다.
//! 이 경우 재시작하면 기존 토큰은 모두 무효가 됩니다.

use std::fs;

use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};

use crate::config::{Environment, JwtConfig, TokenAlgorithm};
use crate::core::errors::{AppError, ErrorContext};
use crate::utils::crypto::sha256_hex;

const RSA_KEY_BITS: usize = 2048;

/// 토큰 서명/검증 키 묶음
pub struct SigningKeys {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    kid: Option<String>,
    public_key: Option<RsaPublicKey>,
}

impl SigningKeys {
    /// HMAC-SHA256 공유 비밀키
    pub fn hs256(secret: &str) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            kid: None,
            public_key: None,
        }
    }

    /// RSA 개인키로 RS256 키 묶음을 만듭니다. `kid`는 공개키 modulus의 해시에서 유도합니다.
    pub fn rs256(private_key: RsaPrivateKey) -> Result<Self, AppError> {
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .context("RSA 개인키 PEM 변환 실패")?;
        let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes()).context("RS256 서명 키 생성 실패")?;

        let (n, e) = Self::components(&public_key);
        let decoding = DecodingKey::from_rsa_components(&n, &e).context("RS256 검증 키 생성 실패")?;

        let fingerprint = sha256_hex(&n);
        let kid = format!("account-service-{}", &fingerprint[..16]);

        Ok(Self {
            algorithm: Algorithm::RS256,
            encoding,
            decoding,
            kid: Some(kid),
            public_key: Some(public_key),
        })
    }

    /// 새 RSA 키를 생성합니다. 개발·테스트 환경 전용
    pub fn generate_rs256() -> Result<Self, AppError> {
        let private_key = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, RSA_KEY_BITS)
            .context("RSA 키 생성 실패")?;
        Self::rs256(private_key)
    }

    /// PEM 파일에서 RS256 키를 읽습니다. PKCS#1(`BEGIN RSA PRIVATE KEY`)과 PKCS#8 모두 허용합니다.
    pub fn load_rs256(path: &str) -> Result<Self, AppError> {
        let pem = fs::read_to_string(path)
            .with_context(|| format!("개인키 파일을 읽을 수 없습니다: '{}'", path))?;

        let private_key = RsaPrivateKey::from_pkcs1_pem(&pem)
            .or_else(|_| RsaPrivateKey::from_pkcs8_pem(&pem))
            .with_context(|| format!("RSA 개인키 형식이 아닙니다: '{}'", path))?;

        Self::rs256(private_key)
    }

    /// 환경 설정에 따라 키를 구성합니다.
    ///
    /// # Errors
    ///
    /// * 운영 환경에서 RS256을 선택했지만 `JWT_PRIVATE_KEY_PATH`가 없는 경우
    /// * 키 파일을 읽거나 파싱할 수 없는 경우
    pub fn from_env(environment: &Environment) -> Result<Self, AppError> {
        match JwtConfig::algorithm() {
            TokenAlgorithm::Hs256 => {
                log::info!("🔑 JWT 서명: HS256");
                Ok(Self::hs256(&JwtConfig::secret()))
            }
            TokenAlgorithm::Rs256 => match JwtConfig::private_key_path() {
                Some(path) => {
                    log::info!("🔑 JWT 서명: RS256 ({})", path);
                    Self::load_rs256(&path)
                }
                None if environment.is_production() => Err(AppError::InternalError(
                    "RS256은 운영 환경에서 JWT_PRIVATE_KEY_PATH가 필요합니다".to_string(),
                )),
                None => {
                    log::warn!("JWT_PRIVATE_KEY_PATH not set, generating ephemeral RSA key (tokens will not survive restart)");
                    Self::generate_rs256()
                }
            },
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// `kid`가 포함된 서명 헤더
    pub fn header(&self) -> Header {
        let mut header = Header::new(self.algorithm);
        header.kid = self.kid.clone();
        header
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    /// JWKS 문서. HS256이면 공개할 키가 없으므로 `None`
    pub fn jwks(&self) -> Option<Value> {
        let public_key = self.public_key.as_ref()?;
        let (n, e) = Self::components(public_key);

        Some(json!({
            "keys": [{
                "kty": "RSA",
                "use": "sig",
                "alg": "RS256",
                "kid": self.kid,
                "n": n,
                "e": e
            }]
        }))
    }

    /// 공개키 modulus와 exponent (base64url, 패딩 없음)
    fn components(public_key: &RsaPublicKey) -> (String, String) {
        let n = general_purpose::URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be());
        let e = general_purpose::URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be());
        (n, e)
    }
}
