//! Disk II ログシステム
//!
//! 原則:
//! 1. ログは「現象」ではなく「判断」を記録
//! 2. 状態遷移のみ記録（毎回のI/Oは記録しない）
//! 3. レベル分離: FLOW / STATE / DECIDE / NIBBLE
//!
//! 出力は `log` ファサード経由（target = "disk2::disk"）。カテゴリのマスクは
//! 診断出力の量を絞るだけで、コントローラの動作には影響しない。

use std::sync::atomic::{AtomicU32, Ordering};

use crate::phase::PhaseState;
use crate::stepper::Step;

const TARGET: &str = "disk2::disk";

bitflags::bitflags! {
    /// ログカテゴリ
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct DiskLogLevel: u32 {
        /// L1: 何が起きているか（モーター、ディスク挿入）
        const FLOW   = 0b0001;
        /// L2: 状態遷移（トラック変化、ドライブ選択）
        const STATE  = 0b0010;
        /// L2: 判断（ステップ方向、書き込みプロテクト検出、異常励磁）
        const DECIDE = 0b0100;
        /// L3: 生データ（転送したディスクバイト）
        const NIBBLE = 0b1000;
    }
}

impl DiskLogLevel {
    /// "flow+state" のような指定を解釈する。未知の語は無視
    pub fn parse(s: &str) -> Self {
        let mut level = DiskLogLevel::empty();
        for part in s.split(['+', ',']) {
            match part.trim().to_lowercase().as_str() {
                "flow" => level |= DiskLogLevel::FLOW,
                "state" => level |= DiskLogLevel::STATE,
                "decide" => level |= DiskLogLevel::DECIDE,
                "nibble" => level |= DiskLogLevel::NIBBLE,
                "all" => level = DiskLogLevel::all(),
                "none" | "" => {}
                other => log::warn!("Unknown disk log level: {}", other),
            }
        }
        level
    }
}

/// グローバルログレベル
static LOG_LEVEL: AtomicU32 = AtomicU32::new(0);

/// ログレベルを設定
pub fn set_log_level(level: DiskLogLevel) {
    LOG_LEVEL.store(level.bits(), Ordering::Relaxed);
}

/// 現在のログレベルを取得
pub fn get_log_level() -> DiskLogLevel {
    DiskLogLevel::from_bits_truncate(LOG_LEVEL.load(Ordering::Relaxed))
}

/// ログレベルが有効かチェック
#[inline]
pub fn is_enabled(flag: DiskLogLevel) -> bool {
    (LOG_LEVEL.load(Ordering::Relaxed) & flag.bits()) != 0
}

/// ニブルリングバッファ（最後のN個を保持）
#[derive(Clone, Debug)]
pub struct NibbleRing {
    buf: Vec<u8>,
    pos: usize,
    capacity: usize,
}

impl NibbleRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: vec![0; capacity],
            pos: 0,
            capacity,
        }
    }

    pub fn push(&mut self, nibble: u8) {
        self.buf[self.pos % self.capacity] = nibble;
        self.pos += 1;
    }

    /// 最新からN個を取得（古い順）
    pub fn last_n(&self, n: usize) -> Vec<u8> {
        let n = n.min(self.capacity).min(self.pos);
        (0..n)
            .map(|i| self.buf[(self.pos - n + i) % self.capacity])
            .collect()
    }

    /// 16バイトずつの16進ダンプ
    pub fn format_dump(&self, n: usize) -> String {
        let data = self.last_n(n);
        let mut out = format!("Last {} nibbles:", data.len());
        for (i, b) in data.iter().enumerate() {
            if i % 16 == 0 {
                out.push('\n');
            } else {
                out.push(' ');
            }
            out.push_str(&format!("{:02X}", b));
        }
        out
    }
}

impl Default for NibbleRing {
    fn default() -> Self {
        Self::new(256)
    }
}

// ============================================================
// ログ出力関数
// ============================================================

/// [FLOW] モーターON
pub fn log_motor_on() {
    if is_enabled(DiskLogLevel::FLOW) {
        log::info!(target: TARGET, "[DISK] Motor ON");
    }
}

/// [FLOW] モーターOFF
pub fn log_motor_off() {
    if is_enabled(DiskLogLevel::FLOW) {
        log::info!(target: TARGET, "[DISK] Motor OFF");
    }
}

/// [STATE] ドライブ選択
pub fn log_drive_select(drive: usize) {
    if is_enabled(DiskLogLevel::STATE) {
        log::info!(target: TARGET, "[STATE] Drive {} selected", drive + 1);
    }
}

/// [STATE] トラック変更
pub fn log_track_change(from: u8, to: u8) {
    if is_enabled(DiskLogLevel::STATE) {
        log::info!(target: TARGET, "[STATE] Track {} -> {}", from, to);
    }
}

/// [DECIDE] ステップ方向の判定
pub fn log_step(previous: PhaseState, current: PhaseState, step: Step, quarter_track: u8) {
    if is_enabled(DiskLogLevel::DECIDE) {
        log::info!(
            target: TARGET,
            "[STEP] {} -> {} {:?} (qtrack={})",
            previous, current, step, quarter_track
        );
    }
}

/// [DECIDE] 異常な励磁パターン
pub fn log_motor_fault(phases: PhaseState) {
    if is_enabled(DiskLogLevel::DECIDE) {
        log::info!(target: TARGET, "[STEP] Invalid phase pattern {}, head not moved", phases);
    }
}

/// [DECIDE] 書き込みプロテクト検出
pub fn log_write_protect_sense(drive: usize, protected: bool) {
    if is_enabled(DiskLogLevel::DECIDE) {
        log::info!(
            target: TARGET,
            "[SENSE] Drive {} write protect: {}",
            drive + 1,
            if protected { "ON" } else { "OFF" }
        );
    }
}

/// [NIBBLE] ディスクバイト転送
pub fn log_nibble(track: u8, pos: usize, byte: u8, write: bool) {
    if is_enabled(DiskLogLevel::NIBBLE) {
        log::trace!(
            target: TARGET,
            "[NIB] {} T={} pos={} {:02X}",
            if write { "W" } else { "R" },
            track, pos, byte
        );
    }
}
