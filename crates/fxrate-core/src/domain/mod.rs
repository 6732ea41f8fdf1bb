//! 환율 도메인 모델.

mod rate;

pub use rate::*;
