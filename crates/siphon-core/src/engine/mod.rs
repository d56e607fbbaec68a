//! Engine - 取り込みの中核（パース + フィルタ）
//!
//! # 構成
//! - **coerce**: テキスト表現の date/number を型付き値へ変換する共通ヘルパ
//! - **filter**: 純粋なフィルタ述語（date window + category allow-list）
//! - **source_a**: JSON（階層構造）の reader
//! - **source_b**: CSV（表形式、ヘッダ駆動）の reader
//!
//! reader は「全レコードをパース → filter へ委譲」の 2 段で、述語ロジックを
//! 持たない。

pub mod coerce;
pub mod filter;
pub mod source_a;
pub mod source_b;

pub use self::source_a::JsonSourceReader;
pub use self::source_b::CsvSourceReader;
