//! 캐시 및 키-값 저장소 모듈
//!
//! - [`redis`] - TTL 기반 폐기 목록과 발송 제한 카운터를 위한 Redis 클라이언트

pub mod redis;
