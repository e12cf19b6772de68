//! PSIテーブルの定義。

#[macro_use]
mod macros;
mod eit;

pub use eit::*;
