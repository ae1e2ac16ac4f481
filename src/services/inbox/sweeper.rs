//! 주기적 정리 작업
//!
//! `INBOX_SWEEP_INTERVAL_SECS`마다 다음을 수행합니다.
//!
//! 1. 만료된 인박스 항목 삭제
//! 2. 만료 시각이 지난 사용자-역할 할당 비활성화
//! 3. 만료된 일회용 토큰 삭제
//!
//! 한 단계가 실패해도 나머지 단계는 계속 진행하고 실패는 로그로 남깁니다.

use std::sync::Arc;
use std::time::Duration;

use actix_web::rt;

use crate::repositories::rbac::RbacStore;
use crate::repositories::tokens::OneTimeTokenStore;
use crate::services::inbox::InboxService;
use crate::utils::clock::Clock;

/// 한 번의 정리 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub inbox_purged: u64,
    pub assignments_deactivated: u64,
    pub one_time_tokens_purged: u64,
}

pub struct MaintenanceSweeper {
    inbox: Arc<InboxService>,
    rbac: Arc<dyn RbacStore>,
    one_time_tokens: Arc<dyn OneTimeTokenStore>,
    clock: Arc<dyn Clock>,
}

impl MaintenanceSweeper {
    pub fn new(
        inbox: Arc<InboxService>,
        rbac: Arc<dyn RbacStore>,
        one_time_tokens: Arc<dyn OneTimeTokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inbox,
            rbac,
            one_time_tokens,
            clock,
        }
    }

    pub async fn run_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        match self.inbox.purge_expired().await {
            Ok(count) => report.inbox_purged = count,
            Err(e) => log::error!("인박스 정리 실패: {}", e),
        }

        match self.rbac.cleanup_expired(self.clock.now()).await {
            Ok(count) => report.assignments_deactivated = count,
            Err(e) => log::error!("만료 역할 할당 정리 실패: {}", e),
        }

        match self.one_time_tokens.purge_expired(self.clock.now()).await {
            Ok(count) => report.one_time_tokens_purged = count,
            Err(e) => log::error!("일회용 토큰 정리 실패: {}", e),
        }

        if report != SweepReport::default() {
            log::info!(
                "🧹 정리 완료: inbox={}, user_roles={}, one_time_tokens={}",
                report.inbox_purged,
                report.assignments_deactivated,
                report.one_time_tokens_purged
            );
        }

        report
    }

    /// 현재 actix 런타임에서 주기 작업을 시작합니다.
    pub fn spawn(self: Arc<Self>, every: Duration) -> rt::task::JoinHandle<()> {
        log::info!("🧹 정리 작업 시작 (주기 {:?})", every);
        rt::spawn(async move {
            let mut interval = rt::time::interval(every);
            // 첫 tick은 즉시 완료되므로 건너뜁니다
            interval.tick().await;
            loop {
                interval.tick().await;
                self.run_once().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::rbac::Role;
    use crate::domain::entities::tokens::{OneTimeToken, TokenPurpose};
    use crate::repositories::inbox::InMemoryInboxStore;
    use crate::repositories::rbac::InMemoryRbacStore;
    use crate::repositories::tokens::InMemoryOneTimeTokenStore;
    use crate::utils::clock::ManualClock;
    use chrono::Utc;

    #[actix_web::test]
    async fn test_run_once_cleans_every_store() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let inbox = Arc::new(InboxService::new(
            Arc::new(InMemoryInboxStore::new()),
            clock.clone(),
            chrono::Duration::hours(1),
        ));
        let rbac = Arc::new(InMemoryRbacStore::new());
        let one_time = Arc::new(InMemoryOneTimeTokenStore::new());
        let now = clock.now();

        inbox.process_if_new("m1", "audit", "e", chrono::Duration::minutes(1)).await.unwrap();
        let role = rbac.create_role(Role::new("EDITOR", None, now).unwrap()).await.unwrap();
        rbac.assign_role("u1", &role.id, None, Some(now + chrono::Duration::minutes(1)), now)
            .await
            .unwrap();
        one_time
            .insert(OneTimeToken {
                token_hash: "h".into(),
                purpose: TokenPurpose::VerifyEmail,
                user_id: "u1".into(),
                expires_at: now + chrono::Duration::minutes(1),
                consumed_at: None,
                created_at: now,
            })
            .await
            .unwrap();

        let sweeper = MaintenanceSweeper::new(inbox, rbac, one_time, clock.clone());
        assert_eq!(sweeper.run_once().await, SweepReport::default());

        clock.advance(chrono::Duration::minutes(2));
        assert_eq!(
            sweeper.run_once().await,
            SweepReport {
                inbox_purged: 1,
                assignments_deactivated: 1,
                one_time_tokens_purged: 1,
            }
        );
    }
}
