//! 일시적 저장소 오류 재시도
//!
//! 멱등한 읽기 경로에서만 사용합니다. 쓰기는 투명하게 재시도하지 않습니다.

use std::future::Future;
use std::time::Duration;

use crate::db::is_transient;

/// 최대 재시도 횟수 (최초 시도 제외)
const MAX_RETRIES: u32 = 2;
const BASE_BACKOFF: Duration = Duration::from_millis(50);

/// 일시적 MongoDB 오류를 최대 두 번, 50ms → 100ms 간격으로 재시도합니다.
pub async fn with_read_retry<T, F, Fut>(mut operation: F) -> mongodb::error::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = mongodb::error::Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Err(error) if attempt < MAX_RETRIES && is_transient(&error) => {
                let backoff = BASE_BACKOFF * 2u32.pow(attempt);
                log::warn!("일시적 DB 오류, {:?} 후 재시도 ({}/{}): {}", backoff, attempt + 1, MAX_RETRIES, error);
                actix_web::rt::time::sleep(backoff).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
