//! # Service Registry - 싱글톤 의존성 주입 시스템
//!
//! 인프라 핸들(`Database`, `RedisClient`)과 `#[repository]` 매크로로 선언된 리포지토리를
//! 관리하는 전역 컨테이너입니다. Spring의 `ApplicationContext`와 비슷한 역할을 합니다.
//!
//! | Spring 개념 | 이 시스템 |
//! |-------------|-----------|
//! | `ApplicationContext` | `ServiceLocator` |
//! | `@Repository` | `#[repository]` |
//! | `@Autowired` | `db` / `redis` 필드 자동 주입 |
//! | 인프라 Bean 수동 등록 | `ServiceLocator::set()` |
//!
//! ## 초기화 순서
//!
//! ```text
//! 1. ServiceLocator::set(Arc<Database>), ServiceLocator::set(Arc<RedisClient>)
//! 2. ServiceLocator::initialize_all()   ← 모든 #[repository] 인스턴스 생성
//! 3. UserRepository::instance() 등      ← 이미 생성된 싱글톤 반환
//! ```
//!
//! 비즈니스 서비스는 저장소 트레이트(`Arc<dyn CredentialStore>` 등)를 생성자로 받기 때문에
//! 레지스트리가 아니라 [`crate::core::context::AppContext`]에서 조립됩니다.
//!
//! ## 잠금 규칙
//!
//! 생성자는 다른 의존성을 `get()`으로 조회하므로, 인스턴스 맵의 잠금은
//! 생성자 호출 동안 절대 유지하지 않습니다.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use log::{debug, info};
use once_cell::sync::Lazy;

/// `#[repository]` 매크로가 구현하는 리포지토리 트레이트
#[async_trait]
pub trait Repository: Send + Sync {
    fn name(&self) -> &str;
    fn collection_name(&self) -> &str;
    async fn init(&self) -> Result<(), Box<dyn std::error::Error>>;
}

/// 컴파일 타임에 수집되는 리포지토리 등록 정보
pub struct RepositoryRegistration {
    pub name: &'static str,
    pub constructor: fn() -> Box<dyn Any + Send + Sync>,
}

inventory::collect!(RepositoryRegistration);

static REPOSITORY_NAME_CACHE: Lazy<HashMap<String, &'static RepositoryRegistration>> = Lazy::new(|| {
    let cache: HashMap<String, &'static RepositoryRegistration> = inventory::iter::<RepositoryRegistration>()
        .map(|registration| (clean_registration_name(registration.name), registration))
        .collect();
    debug!("Repository 레지스트리 캐시 초기화: {}개", cache.len());
    cache
});

/// "user_repository" → "user"
fn clean_registration_name(name: &str) -> String {
    name.strip_suffix("_repository").unwrap_or(name).to_string()
}

/// "crate::repositories::users::user_repo::UserRepository" → "UserRepository"
fn short_type_name(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

/// 전역 인스턴스 컨테이너
pub struct ServiceLocator {
    instances: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

static LOCATOR: Lazy<ServiceLocator> = Lazy::new(|| ServiceLocator {
    instances: RwLock::new(HashMap::new()),
});

impl ServiceLocator {
    /// 등록된 인스턴스만 조회합니다. 없으면 `None`.
    pub fn try_get<T: 'static + Send + Sync>() -> Option<Arc<T>> {
        let instances = LOCATOR.instances.read().unwrap_or_else(|e| e.into_inner());
        instances
            .get(&TypeId::of::<T>())
            .and_then(|instance| instance.clone().downcast::<T>().ok())
    }

    /// 인스턴스를 조회하고, 없으면 `#[repository]` 등록 정보로 생성합니다.
    ///
    /// 매크로가 생성한 코드가 호출하는 진입점입니다.
    ///
    /// # Panics
    ///
    /// 인스턴스가 등록되지 않았고 대응하는 `#[repository]` 등록도 없는 경우.
    /// 부트스트랩 순서 오류이므로 기동 시점에 바로 드러납니다.
    pub fn get<T: 'static + Send + Sync>() -> Arc<T> {
        if let Some(instance) = Self::try_get::<T>() {
            return instance;
        }

        let type_name = std::any::type_name::<T>();
        let short_name = short_type_name(type_name);
        let entity_name = short_name
            .strip_suffix("Repository")
            .unwrap_or(short_name)
            .to_lowercase();

        let Some(registration) = REPOSITORY_NAME_CACHE.get(&entity_name) else {
            panic!(
                "Service not found: {}. Register it with ServiceLocator::set() or #[repository]",
                type_name
            );
        };

        // 잠금 없이 생성: 생성자 내부에서 다시 get()을 호출합니다
        let boxed = (registration.constructor)();
        let instance = match boxed.downcast::<Arc<T>>() {
            Ok(instance) => *instance,
            Err(_) => panic!("Type mismatch for repository: {}", registration.name),
        };

        let mut instances = LOCATOR.instances.write().unwrap_or_else(|e| e.into_inner());
        instances
            .entry(TypeId::of::<T>())
            .or_insert_with(|| instance.clone() as Arc<dyn Any + Send + Sync>);
        instance
    }

    /// 인프라 인스턴스를 수동 등록합니다.
    pub fn set<T: 'static + Send + Sync>(instance: Arc<T>) {
        info!("📦 Registering: {}", short_type_name(std::any::type_name::<T>()));
        let mut instances = LOCATOR.instances.write().unwrap_or_else(|e| e.into_inner());
        instances.insert(TypeId::of::<T>(), instance as Arc<dyn Any + Send + Sync>);
    }

    /// 모든 `#[repository]` 싱글톤을 미리 생성하고 생성된 개수를 반환합니다.
    ///
    /// `Database`와 `RedisClient`가 먼저 `set()`되어 있어야 합니다.
    pub fn initialize_all() -> usize {
        info!("🔄 리포지토리 레지스트리 초기화");

        let mut count = 0;
        for registration in inventory::iter::<RepositoryRegistration>() {
            let _instance = (registration.constructor)();
            debug!("  ✓ {}", registration.name);
            count += 1;
        }

        info!("✅ 리포지토리 {}개 생성 완료", count);
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker(u32);

    #[test]
    fn test_registration_name_cleanup() {
        assert_eq!(clean_registration_name("user_repository"), "user");
        assert_eq!(clean_registration_name("inbox"), "inbox");
        assert_eq!(short_type_name("a::b::UserRepository"), "UserRepository");
    }

    #[test]
    fn test_set_then_get_returns_same_instance() {
        ServiceLocator::set(Arc::new(Marker(7)));

        let first = ServiceLocator::get::<Marker>();
        let second = ServiceLocator::try_get::<Marker>().unwrap();

        assert_eq!(first.0, 7);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
