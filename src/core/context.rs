//! # 애플리케이션 조립
//!
//! 저장소 묶음([`Stores`])과 설정으로 모든 서비스를 한 번 생성하고,
//! actix-web 앱 데이터로 등록합니다.
//!
//! ```text
//! Stores ──┬─▶ TokenService ─────────┐
//!          ├─▶ VerificationService ──┼─▶ AuthService
//!          ├─▶ RoleService ──────────┤
//!          ├─▶ AuthorizationService  └─▶ UserService
//!          └─▶ InboxService ─▶ InProcessEventBus, MaintenanceSweeper
//! ```
//!
//! 핸들러와 미들웨어는 `web::Data<TokenService>`처럼 개별 서비스를 꺼내 씁니다.

use std::sync::Arc;

use actix_web::web;
use chrono::Duration;

use crate::config::{Environment, IdempotencyConfig, PasswordConfig, StorageBackend};
use crate::core::errors::AppResult;
use crate::repositories::inbox::{InMemoryInboxStore, InboxRepository, InboxStore};
use crate::repositories::rbac::{InMemoryRbacStore, RbacRepository, RbacStore};
use crate::repositories::tokens::{
    InMemoryOneTimeTokenStore, InMemoryRevocationStore, InMemoryThrottleStore, OneTimeTokenRepository,
    OneTimeTokenStore, RevocationStore, ThrottleStore, TokenRepository,
};
use crate::repositories::users::{CredentialStore, InMemoryCredentialStore, UserRepository};
use crate::services::auth::{
    AuthService, PasswordService, SigningKeys, TokenService, TokenSettings, VerificationService,
    VerificationSettings,
};
use crate::services::inbox::{InboxService, MaintenanceSweeper};
use crate::services::notifications::{
    AuditLogConsumer, EmailSender, EventPublisher, HttpEmailSender, InProcessEventBus, LogEmailSender,
};
use crate::services::rbac::{AuthorizationService, RoleService};
use crate::services::users::UserService;
use crate::utils::clock::{Clock, SystemClock};

/// 저장소 구현 묶음
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn CredentialStore>,
    pub rbac: Arc<dyn RbacStore>,
    pub revocations: Arc<dyn RevocationStore>,
    pub throttle: Arc<dyn ThrottleStore>,
    pub one_time_tokens: Arc<dyn OneTimeTokenStore>,
    pub inbox: Arc<dyn InboxStore>,
}

impl Stores {
    /// 프로세스 내 저장소 (`STORAGE_BACKEND=memory`와 테스트)
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryCredentialStore::new()),
            rbac: Arc::new(InMemoryRbacStore::new()),
            revocations: Arc::new(InMemoryRevocationStore::new()),
            throttle: Arc::new(InMemoryThrottleStore::new()),
            one_time_tokens: Arc::new(InMemoryOneTimeTokenStore::new()),
            inbox: Arc::new(InMemoryInboxStore::new()),
        }
    }

    /// MongoDB/Redis 리포지토리 싱글톤
    ///
    /// `Database`와 `RedisClient`가 `ServiceLocator`에 등록된 뒤에 호출해야 합니다.
    pub fn persistent() -> Self {
        let tokens = TokenRepository::instance();
        Self {
            users: UserRepository::instance(),
            rbac: RbacRepository::instance(),
            revocations: tokens.clone(),
            throttle: tokens,
            one_time_tokens: OneTimeTokenRepository::instance(),
            inbox: InboxRepository::instance(),
        }
    }

    /// 유니크 인덱스와 TTL 인덱스 생성
    pub async fn create_indexes(&self) -> AppResult<()> {
        self.users.create_indexes().await?;
        self.rbac.create_indexes().await?;
        self.one_time_tokens.create_indexes().await?;
        self.inbox.create_indexes().await?;
        Ok(())
    }
}

/// 서비스 조립에 필요한 설정값
#[derive(Debug, Clone)]
pub struct ContextSettings {
    pub tokens: TokenSettings,
    pub verification: VerificationSettings,
    pub bcrypt_cost: u32,
    pub idempotency_ttl: Duration,
    pub storage_backend: StorageBackend,
}

impl ContextSettings {
    pub fn from_env() -> Self {
        Self {
            tokens: TokenSettings::from_env(),
            verification: VerificationSettings::from_env(),
            bcrypt_cost: PasswordConfig::bcrypt_cost(),
            idempotency_ttl: IdempotencyConfig::ttl(),
            storage_backend: StorageBackend::current(),
        }
    }
}

/// 조립이 끝난 서비스 그래프
#[derive(Clone)]
pub struct AppContext {
    pub clock: Arc<dyn Clock>,
    pub stores: Stores,
    pub storage_backend: StorageBackend,
    pub events: Arc<dyn EventPublisher>,
    pub token_service: Arc<TokenService>,
    pub password_service: Arc<PasswordService>,
    pub verification_service: Arc<VerificationService>,
    pub authorization_service: Arc<AuthorizationService>,
    pub role_service: Arc<RoleService>,
    pub user_service: Arc<UserService>,
    pub auth_service: Arc<AuthService>,
    pub inbox_service: Arc<InboxService>,
    pub sweeper: Arc<MaintenanceSweeper>,
}

impl AppContext {
    /// 환경 변수 설정으로 조립합니다.
    ///
    /// `EMAIL_API_URL`이 없으면 메일 대신 로그로 링크를 남깁니다.
    pub fn from_env(stores: Stores, environment: &Environment) -> AppResult<Self> {
        let keys = SigningKeys::from_env(environment)?;
        let email: Arc<dyn EmailSender> = match HttpEmailSender::from_env() {
            Some(sender) => Arc::new(sender),
            None => {
                log::warn!("EMAIL_API_URL이 없어 메일 내용을 로그로 대신합니다");
                Arc::new(LogEmailSender)
            }
        };

        Self::build(stores, keys, email, Arc::new(SystemClock), ContextSettings::from_env())
    }

    pub fn build(
        stores: Stores,
        keys: SigningKeys,
        email: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        settings: ContextSettings,
    ) -> AppResult<Self> {
        let inbox_service = Arc::new(InboxService::new(
            stores.inbox.clone(),
            clock.clone(),
            settings.idempotency_ttl,
        ));
        let events: Arc<dyn EventPublisher> = Arc::new(
            InProcessEventBus::new(inbox_service.clone()).with_consumer(Arc::new(AuditLogConsumer)),
        );

        let token_service = Arc::new(TokenService::new(
            Arc::new(keys),
            stores.users.clone(),
            stores.revocations.clone(),
            clock.clone(),
            settings.tokens,
        ));
        let password_service = Arc::new(PasswordService::new(settings.bcrypt_cost)?);
        let verification_service = Arc::new(VerificationService::new(
            stores.users.clone(),
            stores.one_time_tokens.clone(),
            stores.throttle.clone(),
            email,
            clock.clone(),
            settings.verification,
        ));
        let authorization_service = Arc::new(AuthorizationService::new(stores.rbac.clone(), clock.clone()));
        let role_service = Arc::new(RoleService::new(
            stores.rbac.clone(),
            stores.users.clone(),
            events.clone(),
            clock.clone(),
        ));
        let user_service = Arc::new(UserService::new(
            stores.users.clone(),
            role_service.clone(),
            password_service.clone(),
            events.clone(),
            clock.clone(),
        ));
        let auth_service = Arc::new(AuthService::new(
            stores.users.clone(),
            role_service.clone(),
            password_service.clone(),
            token_service.clone(),
            verification_service.clone(),
            events.clone(),
            clock.clone(),
        ));
        let sweeper = Arc::new(MaintenanceSweeper::new(
            inbox_service.clone(),
            stores.rbac.clone(),
            stores.one_time_tokens.clone(),
            clock.clone(),
        ));

        Ok(Self {
            clock,
            stores,
            storage_backend: settings.storage_backend,
            events,
            token_service,
            password_service,
            verification_service,
            authorization_service,
            role_service,
            user_service,
            auth_service,
            inbox_service,
            sweeper,
        })
    }

    /// 기본 역할/권한 시드와 관리자 지정
    pub async fn bootstrap(&self, admin_email: Option<&str>) -> AppResult<()> {
        self.role_service.seed_defaults().await?;
        if let Some(email) = admin_email {
            self.role_service.bootstrap_admin(email).await?;
        }
        Ok(())
    }

    /// 서비스들을 앱 데이터로 등록합니다.
    ///
    /// ```rust,ignore
    /// App::new().configure(|cfg| ctx.register(cfg)).configure(configure_all_routes)
    /// ```
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.clone()))
            .app_data(web::Data::from(self.token_service.clone()))
            .app_data(web::Data::from(self.authorization_service.clone()))
            .app_data(web::Data::from(self.auth_service.clone()))
            .app_data(web::Data::from(self.user_service.clone()))
            .app_data(web::Data::from(self.role_service.clone()))
            .app_data(web::Data::from(self.inbox_service.clone()));
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::services::notifications::email_sender::RecordingEmailSender;
    use crate::utils::clock::ManualClock;
    use chrono::Utc;

    /// 프로세스 내 저장소, 수동 시계, 메일 기록기로 조립한 컨텍스트
    pub struct TestContext {
        pub app: AppContext,
        pub clock: Arc<ManualClock>,
        pub mail: Arc<RecordingEmailSender>,
    }

    impl TestContext {
        pub async fn new() -> Self {
            Self::with_tokens(TokenSettings::default()).await
        }

        pub async fn with_tokens(tokens: TokenSettings) -> Self {
            let clock = Arc::new(ManualClock::new(Utc::now()));
            let mail = Arc::new(RecordingEmailSender::new());
            let settings = ContextSettings {
                tokens,
                verification: VerificationSettings::default(),
                bcrypt_cost: 4,
                idempotency_ttl: Duration::hours(24),
                storage_backend: StorageBackend::Memory,
            };

            let app = AppContext::build(
                Stores::in_memory(),
                SigningKeys::hs256("test-secret"),
                mail.clone(),
                clock.clone(),
                settings,
            )
            .unwrap();
            app.bootstrap(None).await.unwrap();

            Self { app, clock, mail }
        }
    }
}
