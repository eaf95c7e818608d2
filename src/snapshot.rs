//! 診断用スナップショット
//!
//! コントローラの状態をJSON等で出力するための読み取り専用ビュー。
//! コントローラ状態は揮発性のハードウェア状態なので、ここから復元する手段はない。

use serde::Serialize;

use crate::disk::Disk2InterfaceCard;
use crate::drive::DriveUnit;

/// ドライブの状態
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct DriveSnapshot {
    pub selected: bool,
    pub write_protected: bool,
    pub disk_loaded: bool,
    pub modified: bool,
    pub quarter_track: u8,
    pub track: u8,
    pub on_whole_track: bool,
    pub byte_position: usize,
}

/// Disk IIコントローラの状態
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub phases: [bool; 4],
    pub motor_on: bool,
    pub curr_drive: usize,
    pub latch: u8,
    pub write_mode: bool,
    pub load_mode: bool,
    pub drive_spin: bool,
    pub rom_loaded: bool,
    pub drives: Vec<DriveSnapshot>,
}

impl DriveSnapshot {
    fn capture(drive: &DriveUnit, selected: bool) -> Self {
        let disk = drive.disk.as_ref();
        DriveSnapshot {
            selected,
            write_protected: drive.write_protected,
            disk_loaded: disk.is_some(),
            modified: disk.is_some_and(|d| d.modified),
            quarter_track: drive.head.quarter_track(),
            track: drive.head.track_number(),
            on_whole_track: drive.head.on_whole_track(),
            byte_position: disk.map_or(0, |d| d.byte_position),
        }
    }
}

impl From<&Disk2InterfaceCard> for ControllerSnapshot {
    fn from(card: &Disk2InterfaceCard) -> Self {
        let unit = card.unit();
        ControllerSnapshot {
            phases: card.phases().to_array(),
            motor_on: card.motor_on(),
            curr_drive: card.current_drive(),
            latch: card.latch(),
            write_mode: card.write_mode(),
            load_mode: card.load_mode(),
            drive_spin: card.drive_spin(),
            rom_loaded: card.is_rom_loaded(),
            drives: unit
                .drives()
                .iter()
                .enumerate()
                .map(|(i, d)| DriveSnapshot::capture(d, i == unit.current_drive()))
                .collect(),
        }
    }
}
