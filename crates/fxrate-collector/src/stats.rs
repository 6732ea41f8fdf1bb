//! 실행 결과 요약.

use std::fmt;
use std::time::Duration;

/// 백필 실행 통계
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// 생성된 레코드 수
    pub rows_prepared: usize,
    /// 저장소에 반영된 레코드 수 (dry-run이면 0)
    pub rows_written: usize,
    pub dry_run: bool,
    /// 조회 대상 통화 수 (기준 통화 포함)
    pub symbols: usize,
    /// 조회한 청크 수
    pub chunks: usize,
    /// 실행한 upsert 배치 수
    pub batches: usize,
    /// 건너뛴 잘못된 환율 수
    pub skipped: usize,
    /// 대상 테이블
    pub table: String,
    /// 소요 시간
    pub elapsed: Duration,
}

impl RunSummary {
    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        tracing::info!(
            rows_prepared = self.rows_prepared,
            rows_written = self.rows_written,
            dry_run = self.dry_run,
            symbols = self.symbols,
            chunks = self.chunks,
            batches = self.batches,
            skipped = self.skipped,
            table = %self.table,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "백필 완료"
        );
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Prepared {} rows to upsert into '{}'.",
            self.rows_prepared, self.table
        )?;
        if self.dry_run {
            write!(f, " Dry-run mode: no rows written.")
        } else {
            write!(
                f,
                " Upserted {} rows into '{}' in {} batches.",
                self.rows_written, self.table, self.batches
            )
        }
    }
}
