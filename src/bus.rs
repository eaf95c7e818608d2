//! ホスト側のバス接続
//!
//! CPUエミュレータから見たメモリバスと、Disk IIカードをスロットに挿した最小構成のバス。
//! スロットnのI/Oページは $C080+n*16、ブートROMは $Cn00-$CnFF。

use crate::disk::{Disk2InterfaceCard, FLOATING_BUS};
use crate::error::{DiskError, Result};

/// メモリバスのトレイト
pub trait MemoryBus {
    /// メモリから1バイト読み取り
    fn read(&mut self, address: u16) -> u8;
    /// メモリに1バイト書き込み
    fn write(&mut self, address: u16, value: u8);
}

/// Disk IIカード1枚だけが接続されたバス
pub struct SlotBus {
    /// Disk IIインターフェースカード
    pub card: Disk2InterfaceCard,
    slot: u8,
    /// 異常励磁で停止するか（falseならログを出して継続）
    halt_on_fault: bool,
    halted: bool,
    fault_count: u64,
}

impl SlotBus {
    pub fn new(card: Disk2InterfaceCard, slot: u8) -> Result<Self> {
        if !(1..=7).contains(&slot) {
            return Err(DiskError::Config(format!("Invalid slot number: {}", slot)));
        }
        Ok(SlotBus {
            card,
            slot,
            halt_on_fault: false,
            halted: false,
            fault_count: 0,
        })
    }

    pub fn with_halt_on_fault(mut self, halt: bool) -> Self {
        self.halt_on_fault = halt;
        self
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    /// I/Oページの先頭アドレス
    pub fn io_base(&self) -> u16 {
        0xC080 + (self.slot as u16) * 0x10
    }

    /// ブートROMの先頭アドレス
    pub fn rom_base(&self) -> u16 {
        0xC000 + (self.slot as u16) * 0x100
    }

    /// 異常励磁で停止したか
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn fault_count(&self) -> u64 {
        self.fault_count
    }

    #[inline]
    fn in_io_page(&self, address: u16) -> bool {
        (self.io_base()..self.io_base() + 0x10).contains(&address)
    }

    #[inline]
    fn in_rom_page(&self, address: u16) -> bool {
        address & 0xFF00 == self.rom_base()
    }

    /// カードへアクセスし、異常はここで吸収する
    fn access(&mut self, address: u16, value: Option<u8>) -> u8 {
        match self.card.decode(address, value) {
            Ok(data) => data,
            Err(e) => {
                self.fault_count += 1;
                log::warn!("Slot {} ${:04X}: {}", self.slot, address, e);
                if self.halt_on_fault {
                    self.halted = true;
                }
                FLOATING_BUS
            }
        }
    }
}

impl MemoryBus for SlotBus {
    fn read(&mut self, address: u16) -> u8 {
        if self.in_io_page(address) {
            self.access(address, None)
        } else if self.in_rom_page(address) {
            self.card.read_rom((address & 0xFF) as u8)
        } else {
            FLOATING_BUS
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        if self.in_io_page(address) {
            self.access(address, Some(value));
        }
    }
}
