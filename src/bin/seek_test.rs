//! ステッパーシークテスト
//!
//! ソフトスイッチだけでトラック0→34→0をシークし、各トラックでのヘッド位置を確認する。
//!
//! 使用方法: cargo run --bin seek_test

use disk2::bus::{MemoryBus, SlotBus};
use disk2::disk_log::{self, DiskLogLevel};
use disk2::nibble::TRACKS;
use disk2::Disk2InterfaceCard;

/// スロット6のI/Oベース
const IO_BASE: u16 = 0xC0E0;

/// 1フェーズ分（ハーフステップ2回）動かす
fn step(bus: &mut SlotBus, from: u16, to: u16) {
    bus.read(IO_BASE + to * 2 + 1);
    bus.read(IO_BASE + from * 2);
}

fn main() {
    env_logger::init();
    if std::env::args().any(|a| a == "-v") {
        disk_log::set_log_level(DiskLogLevel::STATE | DiskLogLevel::DECIDE);
    }

    println!("===========================================");
    println!("  Disk II Stepper Seek Test");
    println!("===========================================\n");

    let mut bus = match SlotBus::new(Disk2InterfaceCard::new(), 6) {
        Ok(bus) => bus,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    bus.read(IO_BASE + 0x9);

    let mut failures = 0;
    let mut phase = 0u16;
    bus.read(IO_BASE + 1);

    let last_track = (TRACKS - 1) as u8;
    // 1トラック = 4クォータートラック = 2フェーズ
    for track in 1..=last_track {
        for _ in 0..2 {
            let next = (phase + 1) % 4;
            step(&mut bus, phase, next);
            phase = next;
        }
        let head = bus.card.head();
        let ok = head.track_number() == track && head.on_whole_track();
        if !ok {
            failures += 1;
        }
        println!("seek out  T={:2} qtrack={:3} {}", track, head.quarter_track(), if ok { "OK" } else { "NG" });
    }

    for track in (0..last_track).rev() {
        for _ in 0..2 {
            let next = (phase + 3) % 4;
            step(&mut bus, phase, next);
            phase = next;
        }
        let head = bus.card.head();
        let ok = head.track_number() == track && head.on_whole_track();
        if !ok {
            failures += 1;
        }
        println!("seek in   T={:2} qtrack={:3} {}", track, head.quarter_track(), if ok { "OK" } else { "NG" });
    }

    bus.read(IO_BASE + 0x8);
    println!();
    if failures == 0 && bus.fault_count() == 0 {
        println!("*** SEEK TEST PASSED ***");
    } else {
        println!("*** SEEK TEST FAILED: {} mismatch(es), {} fault(s) ***", failures, bus.fault_count());
        std::process::exit(1);
    }
}
