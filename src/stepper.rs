//! トラック位置トラッカー
//!
//! フェーズの励磁パターンの変化（前回→今回）からヘッドの移動方向を推定する。
//! Disk IIには絶対位置センサーがないので、方向はフェーズ番号の相対関係のみで決まる。
//!
//! ヘッド位置はクォータートラック単位（0-143）で、1回の遷移で ±1 だけ動く。
//! - 励磁1相: 整数トラックに停止。解放された相 → 残った相 の向きに1つ進む
//! - 励磁2相: ハーフトラックで停止。元の1相 → 新たに励磁された相 の向きに1つ進む
//! - 励磁0相: 移動なし
//! - 励磁3相以上: `InvalidMotorState`

use crate::error::{DiskError, Result};
use crate::phase::PhaseState;

/// クォータートラック位置の上限（35トラック×4 + マージン）
pub const MAX_QUARTER_TRACK: u8 = 143;

/// 1ステップの移動方向
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// 内周側（位置が増える）
    Up,
    /// 外周側（位置が減る）
    Down,
}

/// ヘッドの物理位置（クォータートラック単位）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeadPosition(u8);

impl HeadPosition {
    pub fn new(quarter_track: u8) -> Self {
        HeadPosition(quarter_track.min(MAX_QUARTER_TRACK))
    }

    #[inline]
    pub fn quarter_track(self) -> u8 {
        self.0
    }

    /// 現在のトラック番号（floor(position / 4)）
    #[inline]
    pub fn track_number(self) -> u8 {
        self.0 / 4
    }

    /// 整数トラック上にいるか
    #[inline]
    pub fn on_whole_track(self) -> bool {
        self.0 % 4 == 0
    }

    /// 1ステップ移動する。ストッパーに当たって動けなければ false
    pub fn step(&mut self, step: Step) -> bool {
        let next = match step {
            Step::Up if self.0 < MAX_QUARTER_TRACK => self.0 + 1,
            Step::Down if self.0 > 0 => self.0 - 1,
            _ => return false,
        };
        self.0 = next;
        true
    }
}

/// `from` 相から `to` 相へ引かれたときの方向
///
/// 番号が増える向きなら Up。番号差が1より大きい組（3と0のラップ、0と2、1と3）は反転する。
fn pull_toward(from: u8, to: u8) -> Step {
    let up = to >= from;
    if up != (from.abs_diff(to) > 1) {
        Step::Up
    } else {
        Step::Down
    }
}

/// 前回と今回のフェーズ状態から移動方向を求める
///
/// 戻り値が `None` の場合はヘッドは動かない。
/// 3相以上励磁されている場合はエラーを返し、方向は推測しない。
pub fn resolve_direction(previous: PhaseState, current: PhaseState) -> Result<Option<Step>> {
    match current.energized() {
        0 => Ok(None),
        1 => {
            // 2相 → 1相: 解放された相から残った相へ
            let Some(final_phase) = current.single() else {
                return Ok(None);
            };
            if previous.energized() != 2 || !previous.is_on(final_phase) {
                return Ok(None);
            }
            let Some(other) = previous.with(final_phase, false).single() else {
                return Ok(None);
            };
            Ok(Some(pull_toward(other, final_phase)))
        }
        2 => {
            // 1相 → 2相: 元の相から新しく励磁された相へ
            let Some(prev_phase) = previous.single() else {
                return Ok(None);
            };
            if !current.is_on(prev_phase) {
                return Ok(None);
            }
            let Some(other) = current.with(prev_phase, false).single() else {
                return Ok(None);
            };
            Ok(Some(pull_toward(prev_phase, other)))
        }
        _ => Err(DiskError::InvalidMotorState { phases: current }),
    }
}
