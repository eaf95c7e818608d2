//! ニブルイメージの定数と 4-and-4 エンコーディング
//!
//! 4-and-4 はアドレスフィールド（ボリューム/トラック/セクタ/チェックサム）で使われる形式。
//! 1バイトを奇数ビット側と偶数ビット側の2バイトに分け、空いたビットを 0xAA で埋める。

/// ディスクのトラック数
pub const TRACKS: usize = 35;

/// NIBフォーマットの1トラックのバイト数
pub const NIB_TRACK_SIZE: usize = 6656;
pub const NIB_SIZE: usize = TRACKS * NIB_TRACK_SIZE;

/// 4-and-4 の埋めビット
const FILL_MASK: u8 = 0xAA;

/// 1バイトを [奇数ビット側, 偶数ビット側] にエンコード
///
/// byte1 = (D7,D5,D3,D1) + 0xAA
/// byte2 = (D6,D4,D2,D0) + 0xAA
#[inline]
pub fn encode_4and4(byte: u8) -> [u8; 2] {
    [(byte >> 1) | FILL_MASK, byte | FILL_MASK]
}

/// [奇数ビット側, 偶数ビット側] から元のバイトを復元
#[inline]
pub fn decode_4and4(pair: [u8; 2]) -> u8 {
    let [odd, even] = pair;
    even & ((odd << 1) | 0x01)
}
