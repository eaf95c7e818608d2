//! ステッパーモーターのフェーズレジスタ
//!
//! 4つのマグネット（フェーズ0-3）の励磁状態をビットマスクで保持する。
//! bit n = フェーズn。ソフトスイッチ $C0x0-$C0x7 からのみ変更される。

use std::fmt;

/// フェーズ数
pub const PHASE_COUNT: u8 = 4;

/// ステッパーフェーズの励磁状態
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PhaseState(u8);

impl PhaseState {
    /// 全フェーズOFF
    pub const fn new() -> Self {
        PhaseState(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// フェーズが励磁されているか
    #[inline]
    pub fn is_on(self, phase: u8) -> bool {
        (self.0 >> (phase & 3)) & 1 != 0
    }

    /// フェーズを励磁/非励磁にした新しい状態を返す
    #[inline]
    pub fn with(self, phase: u8, on: bool) -> Self {
        let bit = 1u8 << (phase & 3);
        if on {
            PhaseState(self.0 | bit)
        } else {
            PhaseState(self.0 & !bit)
        }
    }

    /// 励磁中のフェーズ数
    #[inline]
    pub fn energized(self) -> u32 {
        self.0.count_ones()
    }

    /// 励磁中のフェーズのうち最も小さい番号
    pub fn first_energized(self) -> Option<u8> {
        (0..PHASE_COUNT).find(|&p| self.is_on(p))
    }

    /// 励磁中のフェーズがちょうど1つならその番号
    pub fn single(self) -> Option<u8> {
        if self.energized() == 1 {
            self.first_energized()
        } else {
            None
        }
    }

    pub fn to_array(self) -> [bool; 4] {
        [self.is_on(0), self.is_on(1), self.is_on(2), self.is_on(3)]
    }
}

/// テストやトレースで `[0, 1, 1, 0]` のように書けるようにする
impl From<[u8; 4]> for PhaseState {
    fn from(flags: [u8; 4]) -> Self {
        flags
            .iter()
            .enumerate()
            .fold(PhaseState::new(), |state, (phase, &f)| state.with(phase as u8, f != 0))
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [p0, p1, p2, p3] = self.to_array();
        write!(f, "[{},{},{},{}]", p0 as u8, p1 as u8, p2 as u8, p3 as u8)
    }
}
