//! ドライブ/ラッチユニット
//!
//! モーター、選択中ドライブ、データラッチ、書き込み/ロードモード、
//! 回転検出用トグル、ドライブごとの書き込みプロテクトとヘッド位置を保持する。
//! 独自のアルゴリズムは持たず、ソフトスイッチデコーダから操作される。

use crate::disk_log::{log_drive_select, log_motor_off, log_motor_on};
use crate::error::{DiskError, Result};
use crate::nibble::{NIB_SIZE, NIB_TRACK_SIZE, TRACKS};
use crate::stepper::HeadPosition;

/// ドライブ数
pub const DRIVE_COUNT: usize = 2;

/// フロッピーディスク（NIB形式のトラックバッファ）
#[derive(Clone)]
pub struct FloppyDisk {
    /// ディスクデータ（35トラック × 6656バイト）
    data: Vec<u8>,
    /// トラック内のバイト位置
    pub byte_position: usize,
    /// 変更されたか
    pub modified: bool,
}

impl FloppyDisk {
    /// NIBイメージから作成
    pub fn from_nib(data: &[u8]) -> Result<Self> {
        if data.len() != NIB_SIZE {
            return Err(DiskError::InvalidImageSize {
                expected: NIB_SIZE,
                actual: data.len(),
            });
        }
        Ok(FloppyDisk {
            data: data.to_vec(),
            byte_position: 0,
            modified: false,
        })
    }

    /// 空のディスク（全トラック 0xFF の同期バイト）
    pub fn blank() -> Self {
        FloppyDisk {
            data: vec![0xFF; NIB_SIZE],
            byte_position: 0,
            modified: false,
        }
    }

    #[inline]
    fn offset(&self, track: u8) -> usize {
        (track as usize).min(TRACKS - 1) * NIB_TRACK_SIZE + self.byte_position
    }

    /// ヘッド下のバイトを読んで1つ進める
    pub fn read_byte(&mut self, track: u8) -> u8 {
        let byte = self.data[self.offset(track)];
        self.advance();
        byte
    }

    /// ヘッド下にバイトを書いて1つ進める
    pub fn write_byte(&mut self, track: u8, byte: u8) {
        let offset = self.offset(track);
        self.data[offset] = byte;
        self.modified = true;
        self.advance();
    }

    #[inline]
    fn advance(&mut self) {
        self.byte_position = (self.byte_position + 1) % NIB_TRACK_SIZE;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// 物理ドライブ1台分の状態
#[derive(Clone, Default)]
pub struct DriveUnit {
    /// 書き込みプロテクト
    pub write_protected: bool,
    /// ヘッド位置
    pub head: HeadPosition,
    /// 挿入されているディスク
    pub disk: Option<FloppyDisk>,
}

impl DriveUnit {
    pub fn has_disk(&self) -> bool {
        self.disk.is_some()
    }
}

/// コントローラのドライブ選択とデータラッチ
#[derive(Clone, Default)]
pub struct DriveLatchUnit {
    /// ドライブ0と1
    drives: [DriveUnit; DRIVE_COUNT],
    /// 選択されているドライブ (0 or 1)
    curr_drive: usize,
    /// モーターオン
    motor_on: bool,
    /// データラッチ
    latch: u8,
    /// 書き込みモード (Q7)
    pub write_mode: bool,
    /// ロードモード (Q6)
    pub load_mode: bool,
    /// モーターOFF時のラッチ読み取りで反転するトグル（回転検出のごまかし用）
    pub drive_spin: bool,
}

impl DriveLatchUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// モーター制御
    pub fn set_motor(&mut self, on: bool) {
        if on != self.motor_on {
            if on {
                log_motor_on();
            } else {
                log_motor_off();
            }
        }
        self.motor_on = on;
    }

    pub fn motor_on(&self) -> bool {
        self.motor_on
    }

    /// ドライブ選択。範囲外の番号は無視して false を返す
    pub fn select_drive(&mut self, index: usize) -> bool {
        if index >= DRIVE_COUNT {
            log::debug!("Ignoring select of drive {}", index);
            return false;
        }
        if index != self.curr_drive {
            log_drive_select(index);
        }
        self.curr_drive = index;
        true
    }

    pub fn current_drive(&self) -> usize {
        self.curr_drive
    }

    /// ドライブの書き込みプロテクト状態（範囲外は false）
    pub fn is_write_protected(&self, index: usize) -> bool {
        self.drives.get(index).is_some_and(|d| d.write_protected)
    }

    #[inline]
    pub fn read_latch(&self) -> u8 {
        self.latch
    }

    #[inline]
    pub fn write_latch(&mut self, value: u8) {
        self.latch = value;
    }

    pub fn drive(&self, index: usize) -> Result<&DriveUnit> {
        self.drives.get(index).ok_or(DiskError::InvalidDrive(index))
    }

    pub fn drive_mut(&mut self, index: usize) -> Result<&mut DriveUnit> {
        self.drives.get_mut(index).ok_or(DiskError::InvalidDrive(index))
    }

    /// 選択中のドライブ
    pub fn selected(&self) -> &DriveUnit {
        &self.drives[self.curr_drive]
    }

    pub fn selected_mut(&mut self) -> &mut DriveUnit {
        &mut self.drives[self.curr_drive]
    }

    pub fn drives(&self) -> &[DriveUnit; DRIVE_COUNT] {
        &self.drives
    }

    /// ドライブ1と2のディスクを入れ替え（ヘッド位置はドライブ側に残る）
    pub fn swap_disks(&mut self) {
        let [a, b] = &mut self.drives;
        std::mem::swap(&mut a.disk, &mut b.disk);
        std::mem::swap(&mut a.write_protected, &mut b.write_protected);
    }

    /// 電源投入時の状態に戻す（ディスクと書き込みプロテクトは維持）
    pub fn reset(&mut self) {
        self.curr_drive = 0;
        self.motor_on = false;
        self.latch = 0;
        self.write_mode = false;
        self.load_mode = false;
        self.drive_spin = false;
        for drive in &mut self.drives {
            drive.head = HeadPosition::default();
            if let Some(disk) = drive.disk.as_mut() {
                disk.byte_position = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_drive_ignores_out_of_range() {
        let mut unit = DriveLatchUnit::new();
        assert!(unit.select_drive(1));
        assert_eq!(unit.current_drive(), 1);
        assert!(!unit.select_drive(2));
        assert_eq!(unit.current_drive(), 1);
        assert!(unit.select_drive(0));
        assert_eq!(unit.current_drive(), 0);
    }

    #[test]
    fn test_write_protect_lookup() {
        let mut unit = DriveLatchUnit::new();
        unit.drive_mut(1).unwrap().write_protected = true;
        assert!(!unit.is_write_protected(0));
        assert!(unit.is_write_protected(1));
        assert!(!unit.is_write_protected(5));
        assert!(matches!(unit.drive(2), Err(DiskError::InvalidDrive(2))));
    }

    #[test]
    fn test_disk_byte_stream_wraps() {
        let mut image = vec![0u8; NIB_SIZE];
        image[NIB_TRACK_SIZE] = 0xD5;
        image[2 * NIB_TRACK_SIZE - 1] = 0x96;
        let mut disk = FloppyDisk::from_nib(&image).unwrap();

        assert_eq!(disk.read_byte(1), 0xD5);
        disk.byte_position = NIB_TRACK_SIZE - 1;
        assert_eq!(disk.read_byte(1), 0x96);
        assert_eq!(disk.byte_position, 0);
        assert!(!disk.modified);

        disk.write_byte(1, 0xAA);
        assert!(disk.modified);
        assert_eq!(disk.as_bytes()[NIB_TRACK_SIZE], 0xAA);
    }

    #[test]
    fn test_nib_size_is_checked() {
        match FloppyDisk::from_nib(&[0u8; 100]) {
            Err(DiskError::InvalidImageSize { expected, actual }) => {
                assert_eq!(expected, NIB_SIZE);
                assert_eq!(actual, 100);
            }
            _ => panic!("expected InvalidImageSize"),
        }
    }

    #[test]
    fn test_swap_disks() {
        let mut unit = DriveLatchUnit::new();
        unit.drive_mut(0).unwrap().disk = Some(FloppyDisk::blank());
        unit.drive_mut(0).unwrap().write_protected = true;
        unit.swap_disks();
        assert!(!unit.drive(0).unwrap().has_disk());
        assert!(unit.drive(1).unwrap().has_disk());
        assert!(unit.is_write_protected(1));
    }
}
