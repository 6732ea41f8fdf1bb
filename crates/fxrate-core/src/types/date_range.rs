//! 날짜 범위 및 청크 분할.
//!
//! 제공자는 요청당 조회 가능한 기간에 상한이 있으므로, 전체 백필 범위를
//! 상한 이하의 연속 구간(청크)으로 나누어 순서대로 요청합니다.
//!
//! ```text
//! [2024-01-01 ........................................ 2024-12-31]
//! [chunk 1: 100일][chunk 2: 100일][chunk 3: 100일][chunk 4: 66일]
//! ```

use crate::error::{CoreError, Result};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::fmt;

/// 양 끝을 포함하는 날짜 범위 (`start <= end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// 범위를 생성합니다. 종료일이 시작일보다 앞서면 에러입니다.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(CoreError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 포함된 달력 일수 (단일 날짜 범위는 1).
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// `DateChunker`가 만든 하위 구간.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Chunk {
    /// 청크에 포함된 달력 일수.
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// 날짜 범위를 최대 `max_span_days`일 이하의 청크로 분할합니다.
#[derive(Debug, Clone, Copy)]
pub struct DateChunker {
    max_span_days: u32,
}

impl DateChunker {
    pub fn new(max_span_days: u32) -> Result<Self> {
        if max_span_days == 0 {
            return Err(CoreError::InvalidChunkSpan(max_span_days));
        }
        Ok(Self { max_span_days })
    }

    pub fn max_span_days(&self) -> u32 {
        self.max_span_days
    }

    /// 범위를 오름차순의 연속 청크로 분할합니다.
    ///
    /// 각 청크는 `[cur, min(cur + max_span_days - 1, end)]`이며,
    /// 청크들의 합집합은 입력 범위와 정확히 같습니다.
    pub fn chunks(&self, range: DateRange) -> Chunks {
        Chunks {
            next_start: Some(range.start),
            end: range.end,
            window: Days::new(u64::from(self.max_span_days - 1)),
        }
    }
}

/// `DateChunker::chunks`가 반환하는 반복자.
#[derive(Debug, Clone)]
pub struct Chunks {
    next_start: Option<NaiveDate>,
    end: NaiveDate,
    window: Days,
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let start = self.next_start.filter(|d| *d <= self.end)?;
        let chunk_end = start
            .checked_add_days(self.window)
            .map_or(self.end, |d| d.min(self.end));

        // 달력 끝(NaiveDate::MAX)에서는 다음 시작일이 없으므로 종료
        self.next_start = chunk_end.succ_opt();
        Some(Chunk {
            start,
            end: chunk_end,
        })
    }
}

/// `YYYY-MM-DD` 또는 `today`(대소문자 무시)를 날짜로 해석합니다.
pub fn parse_date(value: &str, today: NaiveDate) -> Result<NaiveDate> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("today") {
        return Ok(today);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| CoreError::InvalidDate(value.into()))
}

// =============================================================================
// 테스트
// =============================================================================
