//! disk2 - Disk II floppy controller emulation
//!
//! Apple II の Disk II インターフェースカードを、CPUエミュレータに接続する
//! メモリマップドペリフェラルとしてエミュレートする:
//! - ソフトスイッチ（16アドレス）のデコード
//! - ステッパーフェーズからのヘッド移動方向の推定（クォータートラック単位）
//! - ドライブ選択、モーター、データラッチ、書き込みプロテクト検出
//! - NIBトラックバッファとのバイト転送、4-and-4 エンコーディング

pub mod error;
pub mod phase;
pub mod stepper;
pub mod nibble;
pub mod drive;
pub mod disk;
pub mod boot_rom;
pub mod disk_log;
pub mod snapshot;
pub mod bus;
pub mod trace;
pub mod config;

pub use disk::Disk2InterfaceCard;
pub use error::{DiskError, Result};
