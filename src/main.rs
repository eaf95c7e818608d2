//! disk2 - Disk II controller trace runner
//!
//! バスアクセスのトレースファイルを Disk II カードに流し、最終状態をJSONで出力する。
//!
//! # 使用方法
//! ```text
//! disk2 --disk1 dos33.nib --trace boot.trace
//! disk2 --trace seek.trace --disk-log state+decide
//! ```

use clap::Parser;
use std::fs;
use std::process::ExitCode;

use disk2::bus::{MemoryBus, SlotBus};
use disk2::config::Config;
use disk2::disk_log::{self, DiskLogLevel};
use disk2::trace;
use disk2::{Disk2InterfaceCard, Result};

/// disk2 - Disk II controller emulation
#[derive(Parser, Debug)]
#[command(name = "disk2")]
#[command(author = "A2RS Project")]
#[command(version = "0.1.0")]
#[command(about = "Replay bus access traces against an emulated Disk II controller", long_about = None)]
struct Args {
    /// アクセストレースファイル（R <addr> / W <addr> <value>）
    #[arg(short, long)]
    trace: Option<String>,

    /// NIBイメージファイル（ドライブ1）
    #[arg(short = '1', long)]
    disk1: Option<String>,

    /// NIBイメージファイル（ドライブ2）
    #[arg(short = '2', long)]
    disk2: Option<String>,

    /// ドライブ1を書き込みプロテクト
    #[arg(long)]
    protect1: bool,

    /// ドライブ2を書き込みプロテクト
    #[arg(long)]
    protect2: bool,

    /// Disk II Boot ROM (256 bytes)
    #[arg(long)]
    disk_rom: Option<String>,

    /// カードのスロット番号 (1-7)
    #[arg(long)]
    slot: Option<u8>,

    /// 設定ファイル
    #[arg(long)]
    config: Option<String>,

    /// 相対パスの基準ディレクトリ
    #[arg(long)]
    home: Option<String>,

    /// 異常なフェーズ励磁で停止する
    #[arg(long)]
    halt_on_fault: bool,

    /// ディスクログレベル: none, flow, state, decide, nibble, all
    /// 複数指定可: flow+state+decide
    #[arg(long)]
    disk_log: Option<String>,

    /// 終了時に直近の転送バイトをダンプ
    #[arg(long)]
    dump_nibbles: bool,

    /// トレース再生前にドライブ1と2のディスクを入れ替える
    #[arg(long)]
    swap: bool,

    /// 書き込まれたドライブ1のイメージを保存するパス
    #[arg(long)]
    save_disk1: Option<String>,
}

/// コマンドライン指定を設定に上書き
fn apply_args(config: &mut Config, args: &Args) {
    if let Some(slot) = args.slot {
        config.slot = slot;
    }
    if let Some(ref path) = args.disk1 {
        config.drive1.image = Some(path.clone());
    }
    if let Some(ref path) = args.disk2 {
        config.drive2.image = Some(path.clone());
    }
    config.drive1.write_protected |= args.protect1;
    config.drive2.write_protected |= args.protect2;
    if let Some(ref path) = args.disk_rom {
        config.boot_rom = Some(path.clone());
    }
    config.halt_on_fault |= args.halt_on_fault;
    if let Some(ref level) = args.disk_log {
        config.disk_log = level.clone();
    }
}

/// 設定からカードを組み立てる
fn build_card(config: &Config) -> Result<Disk2InterfaceCard> {
    let mut card = Disk2InterfaceCard::new();

    if let Some(ref rom) = config.boot_rom {
        let path = config.resolve_path(rom);
        card.load_boot_rom(&fs::read(&path)?)?;
        log::info!("Loaded Disk II Boot ROM: {}", path.display());
    }

    for drive in 0..2 {
        let Some(drive_config) = config.drive(drive) else {
            continue;
        };
        if let Some(ref image) = drive_config.image {
            let path = config.resolve_path(image);
            card.insert_disk(drive, &fs::read(&path)?, drive_config.write_protected)?;
            log::info!("Loaded disk {}: {}", drive + 1, path.display());
        } else {
            card.set_write_protected(drive, drive_config.write_protected)?;
        }
    }

    Ok(card)
}

fn run(args: &Args) -> Result<bool> {
    let (mut config, config_path) = Config::load_with_options(args.config.as_deref(), args.home.as_deref());
    log::debug!("Config: {:?}", config_path);
    apply_args(&mut config, args);

    disk_log::set_log_level(DiskLogLevel::parse(&config.disk_log));

    let mut card = build_card(&config)?;
    if args.swap {
        card.swap_disks();
    }
    let mut bus = SlotBus::new(card, config.slot)?.with_halt_on_fault(config.halt_on_fault);

    if let Some(ref trace_path) = args.trace {
        let accesses = trace::parse_trace(&fs::read_to_string(trace_path)?)?;
        log::info!("Replaying {} accesses from {}", accesses.len(), trace_path);
        for access in &accesses {
            match access.value {
                Some(v) => bus.write(access.address, v),
                None => {
                    bus.read(access.address);
                }
            }
            if bus.is_halted() {
                log::error!("Halted at ${:04X} after motor fault", access.address);
                break;
            }
        }
    }

    let snapshot = bus.card.snapshot();
    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| disk2::DiskError::Config(format!("Failed to serialize snapshot: {}", e)))?;
    println!("{}", json);

    if args.dump_nibbles {
        println!("{}", bus.card.recent_nibbles().format_dump(256));
    }

    if let Some(ref path) = args.save_disk1 {
        fs::write(path, bus.card.export_disk(0)?)?;
        log::info!("Saved drive 1 image: {}", path);
    }

    if bus.fault_count() > 0 {
        log::warn!("{} motor fault(s) during replay", bus.fault_count());
    }
    Ok(!bus.is_halted())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
