//! エラー型
//!
//! ソフトスイッチ経由で起こり得る本物のハードウェア異常は `InvalidMotorState` のみ。
//! それ以外はホスト側API（ディスク挿入、ROMロード、設定、トレース）のエラー。

use thiserror::Error;

use crate::phase::PhaseState;

#[derive(Error, Debug)]
pub enum DiskError {
    /// 3相以上のステッパーフェーズが同時に励磁された
    #[error("Too many stepper phases energized at once: {phases}")]
    InvalidMotorState { phases: PhaseState },

    /// ドライブ番号が 0/1 以外
    #[error("Invalid drive number: {0}")]
    InvalidDrive(usize),

    /// ドライブにディスクが入っていない
    #[error("No disk in drive {0}")]
    NoDisk(usize),

    #[error("Invalid disk image size: expected {expected} bytes, got {actual}")]
    InvalidImageSize { expected: usize, actual: usize },

    #[error("Boot ROM must be exactly 256 bytes (got {0})")]
    InvalidRomSize(usize),

    /// アクセストレースの構文エラー
    #[error("Trace line {line}: {message}")]
    Trace { line: usize, message: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiskError>;
