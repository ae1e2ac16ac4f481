//! 공통 유틸리티 함수 모듈
//!
//! 애플리케이션 전체에서 사용되는 공통 유틸리티 함수들을 제공합니다.
//!
//! # Modules
//!
//! - [`string_utils`] - 문자열 검증, 정리, 이메일 정규화
//! - [`clock`] - 만료 판단에 사용하는 시간 공급자
//! - [`crypto`] - SHA-256, 일회용 난수 토큰
//! - [`time_utils`] - chrono ↔ BSON 날짜 직렬화
//! - [`retry`] - 일시적 DB 오류 재시도

pub mod clock;
pub mod crypto;
pub mod retry;
pub mod string_utils;
pub mod time_utils;
