//! Standalone FX rate backfill collector.
//!
//! 이 crate는 기간별 일간 환율을 조회해 저장소에 upsert하는 바이너리를 제공합니다:
//! - 설정 로드 (기본값 → 설정 파일 → `FXRATE_*` 환경변수 → CLI)
//! - 청크 단위 순차 조회 및 레코드 변환
//! - 자연 키 기준 배치 upsert (또는 dry-run 보고)

pub mod config;
pub mod error;
pub mod pipeline;
pub mod stats;

pub use config::{PipelineConfig, RunSettings, Secrets, SettingsOverrides};
pub use error::{CollectorError, Result};
pub use pipeline::{run_backfill, RatePipeline};
pub use stats::RunSummary;
