//! Apple II Disk II インターフェースカード
//!
//! スロットのI/Oページ（16アドレス）へのアクセスを受け取り、実機のコントローラと同じ
//! 副作用を再現する。アクセスの値ではなく「どのアドレスを触ったか」で動作が決まる。
//!
//! | reg | 動作                                   |
//! |-----|----------------------------------------|
//! | 0-7 | ステッパーフェーズ OFF/ON（偶数/奇数）  |
//! | 8/9 | モーター OFF/ON                         |
//! | A/B | ドライブ1/2 選択                        |
//! | C   | Q6L: ラッチストローブ（データ転送）     |
//! | D   | Q6H: ラッチロード / 書き込みプロテクト検出 |
//! | E/F | Q7L/Q7H: 読み取り/書き込みモード        |
//!
//! 1回のアクセスは次の3段階で処理する:
//! 1. アドレスごとの処理
//! 2. 書き込み+ロードモード時のラッチロード（全アドレス共通）
//! 3. バスへ返す値の決定

use crate::boot_rom::DEFAULT_BOOT_ROM;
use crate::disk_log::{
    log_motor_fault, log_nibble, log_step, log_track_change, log_write_protect_sense, NibbleRing,
};
use crate::drive::{DriveLatchUnit, DriveUnit, FloppyDisk};
use crate::error::{DiskError, Result};
use crate::phase::PhaseState;
use crate::snapshot::ControllerSnapshot;
use crate::stepper::{resolve_direction, HeadPosition};

/// 誰もバスを駆動していないときの値
pub const FLOATING_BUS: u8 = 0x00;

/// モーターOFF時のラッチ読み取りで交互に返す値（DOSの回転チェック対策）
pub const SPIN_SENSE_SET: u8 = 0x7E;
pub const SPIN_SENSE_CLEAR: u8 = 0x7F;

/// ブートROMサイズ
pub const BOOT_ROM_SIZE: usize = 256;

/// Disk IIインターフェースカード
#[derive(Clone)]
pub struct Disk2InterfaceCard {
    /// マグネット状態（フェーズ0-3）
    phases: PhaseState,
    /// モーター、ドライブ、ラッチ
    unit: DriveLatchUnit,
    /// ブートROM
    boot_rom: [u8; BOOT_ROM_SIZE],
    /// 外部ROMをロード済みか（false なら内蔵ROM）
    rom_loaded: bool,
    /// 直近の転送バイト（診断用）
    nibbles: NibbleRing,
}

impl Default for Disk2InterfaceCard {
    fn default() -> Self {
        Self::new()
    }
}

impl Disk2InterfaceCard {
    pub fn new() -> Self {
        Disk2InterfaceCard {
            phases: PhaseState::new(),
            unit: DriveLatchUnit::new(),
            boot_rom: DEFAULT_BOOT_ROM,
            rom_loaded: false,
            nibbles: NibbleRing::default(),
        }
    }

    /// リセット（ディスクとブートROMは維持）
    pub fn reset(&mut self) {
        self.phases = PhaseState::new();
        self.unit.reset();
    }

    // ========================================
    // ソフトスイッチ
    // ========================================

    /// I/Oページへのアクセスを1回処理する
    ///
    /// `value` が `None` なら読み取り、`Some` なら書き込み。
    /// アドレスの上位ビットは見ない（下位4ビットでレジスタを選ぶ）。
    ///
    /// 3相以上励磁された場合は `InvalidMotorState` を返す。その場合もラッチロードは
    /// 行われるが、ヘッドは動かず、バス値は決めない（回転検出のトグルも進めない）。
    pub fn decode(&mut self, address: u16, value: Option<u8>) -> Result<u8> {
        let reg = (address & 0x0F) as u8;

        let routed = self.route(reg, value);
        self.load_write_latch(value);
        routed?;

        Ok(self.bus_value(reg, value))
    }

    /// 読み取りアクセス
    #[inline]
    pub fn io_read(&mut self, address: u16) -> Result<u8> {
        self.decode(address, None)
    }

    /// 書き込みアクセス
    #[inline]
    pub fn io_write(&mut self, address: u16, value: u8) -> Result<()> {
        self.decode(address, Some(value)).map(|_| ())
    }

    /// アドレスごとの処理
    fn route(&mut self, reg: u8, value: Option<u8>) -> Result<()> {
        match reg {
            // Phase 0-3 ステッパーモーター制御
            0x00..=0x07 => self.control_stepper(reg)?,
            0x08 => self.unit.set_motor(false),
            0x09 => self.unit.set_motor(true),
            0x0A => {
                self.unit.select_drive(0);
            }
            0x0B => {
                self.unit.select_drive(1);
            }
            // Q6L
            0x0C => {
                self.unit.load_mode = false;
                self.shift_data();
            }
            // Q6H
            0x0D => {
                self.unit.load_mode = true;
                if value.is_none() {
                    self.sense_write_protect();
                }
            }
            // Q7L
            0x0E => self.unit.write_mode = false,
            // Q7H
            0x0F => self.unit.write_mode = true,
            _ => {}
        }
        Ok(())
    }

    /// 書き込み+ロードモードなら、どのアドレスへの書き込みでもラッチに値が入る
    fn load_write_latch(&mut self, value: Option<u8>) {
        if let Some(v) = value {
            if self.unit.motor_on() && self.unit.write_mode && self.unit.load_mode {
                self.unit.write_latch(v);
            }
        }
    }

    /// バスに返す値
    fn bus_value(&mut self, reg: u8, value: Option<u8>) -> u8 {
        // 偶数アドレスの読み取りのみラッチを返す
        if value.is_some() || reg & 1 != 0 {
            return FLOATING_BUS;
        }
        if self.unit.motor_on() {
            return self.unit.read_latch();
        }
        self.unit.drive_spin = !self.unit.drive_spin;
        if self.unit.drive_spin {
            SPIN_SENSE_SET
        } else {
            SPIN_SENSE_CLEAR
        }
    }

    /// ステッパーモーター制御
    fn control_stepper(&mut self, reg: u8) -> Result<()> {
        let phase = (reg >> 1) & 3;
        let previous = self.phases;
        let current = previous.with(phase, reg & 1 != 0);
        self.phases = current;

        if current == previous && current.energized() <= 2 {
            return Ok(());
        }

        match resolve_direction(previous, current) {
            Ok(Some(step)) => {
                let head = &mut self.unit.selected_mut().head;
                let old_track = head.track_number();
                if head.step(step) {
                    log_step(previous, current, step, head.quarter_track());
                    let new_track = head.track_number();
                    if new_track != old_track {
                        log_track_change(old_track, new_track);
                    }
                }
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                log_motor_fault(current);
                Err(e)
            }
        }
    }

    /// $C0xC: ヘッド下のディスクとラッチの間で1バイト転送
    fn shift_data(&mut self) {
        if !self.unit.motor_on() {
            return;
        }
        let write_mode = self.unit.write_mode;
        let latch = self.unit.read_latch();
        let drive = self.unit.selected_mut();
        let track = drive.head.track_number();
        let protected = drive.write_protected;
        let Some(disk) = drive.disk.as_mut() else {
            return;
        };
        let pos = disk.byte_position;

        if write_mode {
            if protected {
                return;
            }
            disk.write_byte(track, latch);
            log_nibble(track, pos, latch, true);
            self.nibbles.push(latch);
        } else {
            let byte = disk.read_byte(track);
            log_nibble(track, pos, byte, false);
            self.nibbles.push(byte);
            self.unit.write_latch(byte);
        }
    }

    /// $C0xD 読み取り: ラッチのbit7に書き込みプロテクト状態を反映
    ///
    /// モーターONかつ読み取りモードのときのみ。bit7以外は保持する。
    // TODO: 実機ではフェーズ1が励磁されていると書き込みプロテクト扱いになる
    fn sense_write_protect(&mut self) {
        if !self.unit.motor_on() || self.unit.write_mode {
            return;
        }
        let drive = self.unit.current_drive();
        let protected = self.unit.is_write_protected(drive);
        let mut latch = self.unit.read_latch() & 0x7F;
        if protected {
            latch |= 0x80;
        }
        self.unit.write_latch(latch);
        log_write_protect_sense(drive, protected);
    }

    // ========================================
    // ディスク/ROM管理（ホスト側API）
    // ========================================

    /// NIBイメージをドライブに挿入
    pub fn insert_disk(&mut self, drive: usize, data: &[u8], write_protected: bool) -> Result<()> {
        let disk = FloppyDisk::from_nib(data)?;
        let unit = self.unit.drive_mut(drive)?;
        unit.disk = Some(disk);
        unit.write_protected = write_protected;
        log::info!(
            "Disk inserted in drive {}{}",
            drive + 1,
            if write_protected { " (write protected)" } else { "" }
        );
        Ok(())
    }

    /// ディスクをイジェクト
    pub fn eject_disk(&mut self, drive: usize) -> Result<Option<FloppyDisk>> {
        let unit = self.unit.drive_mut(drive)?;
        unit.write_protected = false;
        Ok(unit.disk.take())
    }

    /// ディスク1と2を入れ替え
    pub fn swap_disks(&mut self) {
        self.unit.swap_disks();
        log::info!("Disks swapped: Drive1 <-> Drive2");
    }

    pub fn set_write_protected(&mut self, drive: usize, protected: bool) -> Result<()> {
        self.unit.drive_mut(drive)?.write_protected = protected;
        Ok(())
    }

    /// ディスクイメージをNIB形式でエクスポート
    pub fn export_disk(&self, drive: usize) -> Result<Vec<u8>> {
        self.unit
            .drive(drive)?
            .disk
            .as_ref()
            .map(|disk| disk.as_bytes().to_vec())
            .ok_or(DiskError::NoDisk(drive))
    }

    /// ブートROMを差し替える（中身は解釈しない）
    ///
    /// ロードしなければ内蔵の `DEFAULT_BOOT_ROM` が見える。
    pub fn load_boot_rom(&mut self, data: &[u8]) -> Result<()> {
        if data.len() != BOOT_ROM_SIZE {
            return Err(DiskError::InvalidRomSize(data.len()));
        }
        self.boot_rom.copy_from_slice(data);
        self.rom_loaded = true;
        Ok(())
    }

    pub fn is_rom_loaded(&self) -> bool {
        self.rom_loaded
    }

    /// ブートROMからの読み取り
    #[inline]
    pub fn read_rom(&self, offset: u8) -> u8 {
        self.boot_rom[offset as usize]
    }

    // ========================================
    // 状態の参照（診断用、変更不可）
    // ========================================

    pub fn phases(&self) -> PhaseState {
        self.phases
    }

    pub fn motor_on(&self) -> bool {
        self.unit.motor_on()
    }

    pub fn current_drive(&self) -> usize {
        self.unit.current_drive()
    }

    pub fn latch(&self) -> u8 {
        self.unit.read_latch()
    }

    pub fn write_mode(&self) -> bool {
        self.unit.write_mode
    }

    pub fn load_mode(&self) -> bool {
        self.unit.load_mode
    }

    pub fn drive_spin(&self) -> bool {
        self.unit.drive_spin
    }

    pub fn drive(&self, index: usize) -> Result<&DriveUnit> {
        self.unit.drive(index)
    }

    /// 選択中ドライブのヘッド位置
    pub fn head(&self) -> HeadPosition {
        self.unit.selected().head
    }

    /// 選択中ドライブのトラック番号
    pub fn current_track(&self) -> u8 {
        self.head().track_number()
    }

    pub fn on_whole_track(&self) -> bool {
        self.head().on_whole_track()
    }

    pub fn recent_nibbles(&self) -> &NibbleRing {
        &self.nibbles
    }

    pub(crate) fn unit(&self) -> &DriveLatchUnit {
        &self.unit
    }

    /// 診断用スナップショット
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot::from(self)
    }
}
