//! 백필 전반에서 사용되는 공통 타입.

mod currency;
mod date_range;

pub use currency::*;
pub use date_range::*;
