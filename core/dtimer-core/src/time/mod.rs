//! Time values and TimeMath
//!
//! 절대/상대 시간 값과 브랜드 검사 연산

pub mod brand;
pub mod math;
pub mod value;

pub use brand::TimerBrand;
pub use math::shared_brand;
pub use value::{RelativeTime, Timestamp};
