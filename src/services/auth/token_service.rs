//! JWT 토큰 관리 서비스 구현
//!
//! access/refresh 토큰 쌍의 발급, 검증, 회전, 폐기를 담당합니다.
//!
//! ## 검증 순서
//!
//! ```text
//! 1. 서명 검증            → InvalidToken
//! 2. 토큰 종류(kind) 확인  → InvalidToken
//! 3. exp > now           → Expired
//! 4. jti 폐기 목록 확인    → Revoked
//! 5. 사용자 활성 상태      → Inactive
//! 6. epoch 일치           → Revoked
//! ```
//!
//! 1-3단계는 저장소 없이 수행되며([`TokenService::decode`]), 4-6단계까지 포함한 전체 검증은
//! [`TokenService::validate`]입니다. 만료 판단은 라이브러리가 아니라 주입된 [`Clock`] 기준이며
//! `exp == now`인 토큰은 거부됩니다.
//!
//! ## 리프레시 토큰 회전
//!
//! 리프레시 토큰은 한 번만 교환할 수 있습니다. 기존 jti를 폐기 목록에 원자적으로 추가한 호출만
//! 새 토큰 쌍을 받고, 같은 토큰으로 동시에 들어온 나머지 요청은 `Revoked`로 실패합니다.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{decode, encode, Validation};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::core::errors::{AppError, AuthFailure};
use crate::domain::entities::users::user::User;
use crate::domain::models::token::{TokenClaims, TokenKind, TokenPair};
use crate::repositories::tokens::{RevocationReason, RevocationStore};
use crate::repositories::users::CredentialStore;
use crate::services::auth::signing_keys::SigningKeys;
use crate::utils::clock::Clock;

/// 토큰 발급 정책
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// 회전된 리프레시 토큰이 재사용되면 사용자 epoch를 올려 모든 세션을 끊습니다.
    pub revoke_family_on_reuse: bool,
}

impl TokenSettings {
    pub fn from_env() -> Self {
        Self {
            issuer: JwtConfig::issuer(),
            access_ttl: JwtConfig::access_ttl(),
            refresh_ttl: JwtConfig::refresh_ttl(),
            revoke_family_on_reuse: JwtConfig::revoke_family_on_reuse(),
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            issuer: "account-service".to_string(),
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(14),
            revoke_family_on_reuse: false,
        }
    }
}

/// JWT 토큰 관리 서비스
pub struct TokenService {
    keys: Arc<SigningKeys>,
    users: Arc<dyn CredentialStore>,
    revocations: Arc<dyn RevocationStore>,
    clock: Arc<dyn Clock>,
    settings: TokenSettings,
}

fn unauthorized(reason: AuthFailure) -> AppError {
    AppError::AuthenticationError(reason)
}

impl TokenService {
    pub fn new(
        keys: Arc<SigningKeys>,
        users: Arc<dyn CredentialStore>,
        revocations: Arc<dyn RevocationStore>,
        clock: Arc<dyn Clock>,
        settings: TokenSettings,
    ) -> Self {
        Self {
            keys,
            users,
            revocations,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    pub fn signing_keys(&self) -> &SigningKeys {
        &self.keys
    }

    /// 사용자의 현재 epoch로 access/refresh 토큰 쌍을 발급합니다.
    ///
    /// 두 토큰은 각각 새 UUID jti를 가집니다.
    ///
    /// # Errors
    ///
    /// * `AppError::InternalError` - 서명 실패
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let now = self.clock.now();
        let access_expires_at = now + self.settings.access_ttl;
        let refresh_expires_at = now + self.settings.refresh_ttl;

        let access = self.claims(user, TokenKind::Access, now.timestamp(), access_expires_at.timestamp());
        let refresh = self.claims(user, TokenKind::Refresh, now.timestamp(), refresh_expires_at.timestamp());

        Ok(TokenPair {
            access_token: self.sign(&access)?,
            refresh_token: self.sign(&refresh)?,
            access_jti: access.jti,
            refresh_jti: refresh.jti,
            access_expires_at,
            refresh_expires_at,
            access_expires_in: self.settings.access_ttl.num_seconds(),
            refresh_expires_in: self.settings.refresh_ttl.num_seconds(),
        })
    }

    fn claims(&self, user: &User, kind: TokenKind, iat: i64, exp: i64) -> TokenClaims {
        TokenClaims {
            iss: self.settings.issuer.clone(),
            sub: user.id.clone(),
            kind,
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
            epoch: user.token_epoch,
        }
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, AppError> {
        encode(&self.keys.header(), claims, self.keys.encoding_key())
            .map_err(|e| AppError::InternalError(format!("JWT 토큰 생성 실패: {}", e)))
    }

    /// 서명, 토큰 종류, 만료만 확인합니다 (저장소 조회 없음).
    pub fn decode(&self, token: &str, expected: TokenKind) -> Result<TokenClaims, AppError> {
        let mut validation = Validation::new(self.keys.algorithm());
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["sub".to_string(), "iss".to_string()]);
        validation.set_issuer(&[self.settings.issuer.as_str()]);

        let claims = decode::<TokenClaims>(token, self.keys.decoding_key(), &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("토큰 디코딩 실패: {}", e);
                unauthorized(AuthFailure::InvalidToken)
            })?;

        if claims.kind != expected {
            log::debug!("토큰 종류 불일치: expected={}, actual={}", expected.as_str(), claims.kind.as_str());
            return Err(unauthorized(AuthFailure::InvalidToken));
        }

        if claims.exp <= self.clock.now().timestamp() {
            return Err(unauthorized(AuthFailure::Expired));
        }

        Ok(claims)
    }

    /// 전체 검증을 수행하고 클레임과 현재 사용자를 반환합니다.
    ///
    /// # Errors
    ///
    /// 모든 실패는 `AppError::AuthenticationError`이며 사유는 로그에만 남습니다.
    pub async fn validate(&self, token: &str, expected: TokenKind) -> Result<(TokenClaims, User), AppError> {
        let claims = self.decode(token, expected)?;

        if self.revocations.is_revoked(&claims.jti).await? {
            log::debug!("폐기된 토큰 사용: sub={}, jti={}", claims.sub, claims.jti);
            return Err(unauthorized(AuthFailure::Revoked));
        }

        let user = self.current_user(&claims).await?;
        Ok((claims, user))
    }

    /// 5-6단계: 사용자 활성 상태와 epoch 확인
    async fn current_user(&self, claims: &TokenClaims) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| unauthorized(AuthFailure::InvalidToken))?;

        if !user.is_active {
            log::debug!("비활성 계정의 토큰: sub={}", claims.sub);
            return Err(unauthorized(AuthFailure::Inactive));
        }

        if claims.epoch != user.token_epoch {
            log::debug!(
                "epoch가 지난 토큰: sub={}, token_epoch={}, current={}",
                claims.sub,
                claims.epoch,
                user.token_epoch
            );
            return Err(unauthorized(AuthFailure::Revoked));
        }

        Ok(user)
    }

    /// 리프레시 토큰을 교환합니다.
    ///
    /// 기존 jti 폐기에 성공한 호출만 새 토큰 쌍을 받습니다.
    pub async fn rotate(&self, refresh_token: &str) -> Result<(User, TokenPair), AppError> {
        let claims = self.decode(refresh_token, TokenKind::Refresh)?;

        if self.revocations.is_revoked(&claims.jti).await? {
            return Err(self.on_refresh_reuse(&claims).await);
        }

        let user = self.current_user(&claims).await?;

        let ttl = claims.remaining_seconds(self.clock.now());
        let won = self
            .revocations
            .revoke(&claims.jti, ttl, RevocationReason::Rotated)
            .await?;
        if !won {
            return Err(self.on_refresh_reuse(&claims).await);
        }

        let pair = self.issue_pair(&user)?;
        log::debug!("리프레시 토큰 회전: sub={}, old_jti={}, new_jti={}", user.id, claims.jti, pair.refresh_jti);
        Ok((user, pair))
    }

    async fn on_refresh_reuse(&self, claims: &TokenClaims) -> AppError {
        log::warn!("회전된 리프레시 토큰 재사용 감지: sub={}, jti={}", claims.sub, claims.jti);

        if self.settings.revoke_family_on_reuse {
            match self.users.increment_epoch(&claims.sub, self.clock.now()).await {
                Ok(epoch) => log::warn!("사용자 {}의 모든 세션 폐기 (epoch={})", claims.sub, epoch),
                Err(e) => log::error!("재사용 감지 후 epoch 증가 실패: {}", e),
            }
        }

        unauthorized(AuthFailure::Revoked)
    }

    /// jti를 만료 시각까지 폐기 목록에 추가합니다.
    pub async fn revoke(
        &self,
        jti: &str,
        expires_at: chrono::DateTime<chrono::Utc>,
        reason: RevocationReason,
    ) -> Result<bool, AppError> {
        let ttl = (expires_at - self.clock.now()).num_seconds().max(1) as u64;
        self.revocations.revoke(jti, ttl, reason).await
    }

    /// Bearer 토큰에서 실제 토큰 부분 추출
    ///
    /// HTTP Authorization 헤더의 "Bearer {token}" 형식에서 토큰 부분만을 추출합니다.
    /// 스킴 이름은 대소문자를 구분하지 않습니다.
    ///
    /// ```rust,ignore
    /// let token = TokenService::extract_bearer_token("Bearer eyJhbGciOi...")?;
    /// ```
    pub fn extract_bearer_token(auth_header: &str) -> Result<&str, AppError> {
        let header = auth_header.trim();
        match header.split_once(' ') {
            Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
                Ok(token.trim())
            }
            _ => Err(unauthorized(AuthFailure::MissingToken)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::tokens::InMemoryRevocationStore;
    use crate::repositories::users::InMemoryCredentialStore;
    use crate::utils::clock::ManualClock;
    use chrono::Utc;

    struct Fixture {
        service: TokenService,
        users: Arc<InMemoryCredentialStore>,
        clock: Arc<ManualClock>,
    }

    fn fixture_with(settings: TokenSettings) -> Fixture {
        let users = Arc::new(InMemoryCredentialStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = TokenService::new(
            Arc::new(SigningKeys::hs256("test-secret")),
            users.clone(),
            Arc::new(InMemoryRevocationStore::new()),
            clock.clone(),
            settings,
        );
        Fixture { service, users, clock }
    }

    fn fixture() -> Fixture {
        fixture_with(TokenSettings::default())
    }

    async fn seeded_user(fx: &Fixture) -> User {
        let user = User::new_local("a@x.io", "Alice".into(), None, "hash".into(), fx.clock.now());
        fx.users.create(user).await.unwrap()
    }

    fn reason(result: Result<impl std::fmt::Debug, AppError>) -> AuthFailure {
        result.unwrap_err().auth_failure().expect("authentication error")
    }

    #[actix_web::test]
    async fn test_issued_pair_validates() {
        let fx = fixture();
        let user = seeded_user(&fx).await;
        let pair = fx.service.issue_pair(&user).unwrap();

        let (claims, current) = fx.service.validate(&pair.access_token, TokenKind::Access).await.unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.jti, pair.access_jti);
        assert_eq!(claims.epoch, 0);
        assert_eq!(current.id, user.id);
        assert_eq!(pair.access_expires_in, 15 * 60);
        assert_ne!(pair.access_jti, pair.refresh_jti);
    }

    #[actix_web::test]
    async fn test_kind_mismatch_and_tampering_are_invalid() {
        let fx = fixture();
        let user = seeded_user(&fx).await;
        let pair = fx.service.issue_pair(&user).unwrap();

        assert_eq!(reason(fx.service.decode(&pair.refresh_token, TokenKind::Access)), AuthFailure::InvalidToken);
        assert_eq!(reason(fx.service.decode(&pair.access_token, TokenKind::Refresh)), AuthFailure::InvalidToken);

        let mut tampered = pair.access_token.clone();
        tampered.push('x');
        assert_eq!(reason(fx.service.decode(&tampered, TokenKind::Access)), AuthFailure::InvalidToken);

        let foreign = SigningKeys::hs256("other-secret");
        let claims = fx.service.decode(&pair.access_token, TokenKind::Access).unwrap();
        let forged = encode(&foreign.header(), &claims, foreign.encoding_key()).unwrap();
        assert_eq!(reason(fx.service.decode(&forged, TokenKind::Access)), AuthFailure::InvalidToken);
    }

    #[actix_web::test]
    async fn test_token_expiring_exactly_now_is_rejected() {
        let fx = fixture();
        let user = seeded_user(&fx).await;
        let pair = fx.service.issue_pair(&user).unwrap();

        fx.clock.advance(Duration::minutes(15) - Duration::seconds(1));
        assert!(fx.service.decode(&pair.access_token, TokenKind::Access).is_ok());

        fx.clock.advance(Duration::seconds(1));
        assert_eq!(reason(fx.service.decode(&pair.access_token, TokenKind::Access)), AuthFailure::Expired);
    }

    #[actix_web::test]
    async fn test_revoked_jti_and_epoch_bump_reject() {
        let fx = fixture();
        let user = seeded_user(&fx).await;
        let first = fx.service.issue_pair(&user).unwrap();
        let second = fx.service.issue_pair(&user).unwrap();

        fx.service
            .revoke(&first.access_jti, first.access_expires_at, RevocationReason::Logout)
            .await
            .unwrap();
        assert_eq!(reason(fx.service.validate(&first.access_token, TokenKind::Access).await), AuthFailure::Revoked);
        assert!(fx.service.validate(&second.access_token, TokenKind::Access).await.is_ok());

        fx.users.increment_epoch(&user.id, fx.clock.now()).await.unwrap();
        assert_eq!(reason(fx.service.validate(&second.access_token, TokenKind::Access).await), AuthFailure::Revoked);
        assert_eq!(reason(fx.service.validate(&second.refresh_token, TokenKind::Refresh).await), AuthFailure::Revoked);
    }

    #[actix_web::test]
    async fn test_inactive_user_is_rejected() {
        let fx = fixture();
        let user = seeded_user(&fx).await;
        let pair = fx.service.issue_pair(&user).unwrap();

        // 재활성화는 epoch를 되돌리지 않으므로 비활성화 시점의 토큰은 계속 거부됩니다
        fx.users.set_active(&user.id, false, fx.clock.now()).await.unwrap();
        assert_eq!(reason(fx.service.validate(&pair.access_token, TokenKind::Access).await), AuthFailure::Inactive);

        fx.users.set_active(&user.id, true, fx.clock.now()).await.unwrap();
        assert_eq!(reason(fx.service.validate(&pair.access_token, TokenKind::Access).await), AuthFailure::Revoked);
    }

    #[actix_web::test]
    async fn test_refresh_rotation_allows_single_use() {
        let fx = fixture();
        let user = seeded_user(&fx).await;
        let r1 = fx.service.issue_pair(&user).unwrap();

        let (_, r2) = fx.service.rotate(&r1.refresh_token).await.unwrap();
        assert_eq!(reason(fx.service.rotate(&r1.refresh_token).await), AuthFailure::Revoked);

        // 재사용 감지가 세션 전체를 끊지 않는 기본 설정
        let (_, r3) = fx.service.rotate(&r2.refresh_token).await.unwrap();
        assert_ne!(r3.refresh_jti, r2.refresh_jti);
    }

    #[actix_web::test]
    async fn test_concurrent_rotation_has_one_winner() {
        let fx = fixture();
        let user = seeded_user(&fx).await;
        let pair = fx.service.issue_pair(&user).unwrap();

        let (a, b) = futures_util::future::join(
            fx.service.rotate(&pair.refresh_token),
            fx.service.rotate(&pair.refresh_token),
        )
        .await;

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    }

    #[actix_web::test]
    async fn test_reuse_revokes_family_when_enabled() {
        let fx = fixture_with(TokenSettings {
            revoke_family_on_reuse: true,
            ..TokenSettings::default()
        });
        let user = seeded_user(&fx).await;
        let r1 = fx.service.issue_pair(&user).unwrap();

        let (_, r2) = fx.service.rotate(&r1.refresh_token).await.unwrap();
        assert!(fx.service.rotate(&r1.refresh_token).await.is_err());
        assert_eq!(reason(fx.service.rotate(&r2.refresh_token).await), AuthFailure::Revoked);
    }

    #[actix_web::test]
    async fn test_rs256_round_trip() {
        let users = Arc::new(InMemoryCredentialStore::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let keys = Arc::new(SigningKeys::generate_rs256().unwrap());
        let service = TokenService::new(
            keys,
            users.clone(),
            Arc::new(InMemoryRevocationStore::new()),
            clock.clone(),
            TokenSettings::default(),
        );
        let user = users
            .create(User::new_local("rs@x.io", "Rs".into(), None, "hash".into(), clock.now()))
            .await
            .unwrap();

        let pair = service.issue_pair(&user).unwrap();
        let header = jsonwebtoken::decode_header(&pair.access_token).unwrap();
        assert_eq!(header.alg, jsonwebtoken::Algorithm::RS256);
        assert!(header.kid.is_some());
        assert!(service.validate(&pair.access_token, TokenKind::Access).await.is_ok());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(TokenService::extract_bearer_token("Bearer abc").unwrap(), "abc");
        assert_eq!(TokenService::extract_bearer_token("bearer  abc ").unwrap(), "abc");
        assert!(TokenService::extract_bearer_token("Basic abc").is_err());
        assert!(TokenService::extract_bearer_token("Bearer ").is_err());
        assert!(TokenService::extract_bearer_token("abc").is_err());
    }
}
