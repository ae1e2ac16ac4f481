//! 비밀번호 해싱 서비스
//!
//! bcrypt 해싱과 검증은 CPU를 오래 점유하므로 `web::block`으로 블로킹 스레드 풀에서 실행합니다.
//! 비동기 워커나 저장소 잠금을 잡은 채로 해싱하지 않습니다.
//!
//! ## 사전 해싱
//!
//! bcrypt는 입력의 앞 72바이트만 사용합니다. 비밀번호를 SHA-256 후 base64(44바이트)로
//! 바꾼 값을 bcrypt에 넣어 멀티바이트 문자로 긴 비밀번호도 잘리지 않게 합니다.
//!
//! ## 타이밍 균등화
//!
//! 존재하지 않는 이메일로 로그인하면 미리 만들어 둔 더미 해시로 같은 비용의 검증을 수행해
//! 응답 시간으로 계정 존재 여부를 알 수 없게 합니다.

use actix_web::web;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bcrypt::{hash, verify};
use sha2::{Digest, Sha256};

use crate::core::errors::AppError;

const DUMMY_PASSWORD: &str = "account-service::timing-equalizer";

/// bcrypt 입력으로 쓸 고정 길이 다이제스트
fn prehash(password: &str) -> String {
    STANDARD.encode(Sha256::digest(password.as_bytes()))
}

pub struct PasswordService {
    cost: u32,
    dummy_hash: String,
}

impl PasswordService {
    /// # Errors
    ///
    /// * `AppError::InternalError` - cost가 bcrypt 허용 범위(4-31)를 벗어난 경우
    pub fn new(cost: u32) -> Result<Self, AppError> {
        let dummy_hash = hash(prehash(DUMMY_PASSWORD), cost)
            .map_err(|e| AppError::InternalError(format!("더미 해시 생성 실패: {}", e)))?;
        log::info!("🔐 bcrypt cost: {}", cost);
        Ok(Self { cost, dummy_hash })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = prehash(password);
        let cost = self.cost;

        web::block(move || hash(password, cost))
            .await
            .map_err(|e| AppError::InternalError(format!("해싱 작업 실행 실패: {}", e)))?
            .map_err(|e| AppError::InternalError(format!("비밀번호 해싱 실패: {}", e)))
    }

    pub async fn verify(&self, password: &str, password_hash: &str) -> Result<bool, AppError> {
        let password = prehash(password);
        let password_hash = password_hash.to_owned();

        web::block(move || verify(password, &password_hash))
            .await
            .map_err(|e| AppError::InternalError(format!("검증 작업 실행 실패: {}", e)))?
            .map_err(|e| AppError::InternalError(format!("비밀번호 검증 실패: {}", e)))
    }

    /// 해시가 없으면 더미 해시로 검증하고 항상 `false`를 반환합니다.
    pub async fn verify_or_dummy(&self, password: &str, password_hash: Option<&str>) -> Result<bool, AppError> {
        match password_hash {
            Some(password_hash) => self.verify(password, password_hash).await,
            None => {
                self.verify(password, &self.dummy_hash).await?;
                Ok(false)
            }
        }
    }
}
