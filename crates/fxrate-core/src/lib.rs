//! # FX Rate Core
//!
//! 환율 백필 도구의 핵심 도메인 모델과 순수 알고리즘을 제공합니다.
//!
//! 이 크레이트는 다른 크레이트 전반에서 사용되는 기본 타입을 제공합니다:
//! - 통화 코드 및 심볼 집합
//! - 날짜 범위와 청크 분할 (`DateChunker`)
//! - 저장 단위 레코드 (`RateRow`) 및 정규화된 시세 (`NormalizedQuotes`)
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
