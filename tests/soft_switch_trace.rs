//! トレース経由のエンドツーエンドテスト（スロット6）

use disk2::bus::SlotBus;
use disk2::disk::{SPIN_SENSE_CLEAR, SPIN_SENSE_SET};
use disk2::nibble::{decode_4and4, encode_4and4, NIB_SIZE};
use disk2::phase::PhaseState;
use disk2::trace::{parse_trace, replay};
use disk2::Disk2InterfaceCard;

fn slot6() -> SlotBus {
    SlotBus::new(Disk2InterfaceCard::new(), 6).unwrap()
}

#[test]
fn phase_sequence_reaches_track_one() {
    let mut bus = slot6();
    let accesses = parse_trace(
        "# phase 0 on, phase 1 on, phase 0 off, phase 2 on, phase 1 off\n\
         R C0E1\nR C0E3\nR C0E0\nR C0E5\nR C0E2\n",
    )
    .unwrap();
    replay(&mut bus, &accesses);

    assert_eq!(bus.card.head().quarter_track(), 4);
    assert_eq!(bus.card.current_track(), 1);
    assert!(bus.card.on_whole_track());
    assert_eq!(bus.card.phases(), PhaseState::from([0, 0, 1, 0]));
}

#[test]
fn dos_spin_check_sees_alternating_values() {
    let mut bus = slot6();
    let accesses = parse_trace("R C0EC\nR C0EC\nR C0EC\nR C0ED\nR C0EC\n").unwrap();
    let results = replay(&mut bus, &accesses);
    assert_eq!(
        results,
        vec![
            Some(SPIN_SENSE_SET),
            Some(SPIN_SENSE_CLEAR),
            Some(SPIN_SENSE_SET),
            Some(0x00),
            Some(SPIN_SENSE_CLEAR),
        ]
    );
}

#[test]
fn write_protect_sense_through_bus() {
    let mut card = Disk2InterfaceCard::new();
    card.insert_disk(0, &vec![0xFFu8; NIB_SIZE], true).unwrap();
    let mut bus = SlotBus::new(card, 6).unwrap();

    // motor on, Q7L, Q6H (sense), Q7L でラッチを読み戻す
    let accesses = parse_trace("R C0E9\nR C0EE\nR C0ED\nR C0EE\n").unwrap();
    let results = replay(&mut bus, &accesses);
    assert_eq!(results[3].map(|v| v & 0x80), Some(0x80));
}

#[test]
fn write_then_read_back_address_field() {
    let mut card = Disk2InterfaceCard::new();
    card.insert_disk(0, &vec![0xFFu8; NIB_SIZE], false).unwrap();
    let mut bus = SlotBus::new(card, 6).unwrap();

    // 書き込み: D5 AA 96 と 4-and-4 のボリューム 254
    let [odd, even] = encode_4and4(254);
    let mut text = String::from("R C0E9\nR C0EF\n");
    for byte in [0xD5, 0xAA, 0x96, odd, even] {
        text.push_str(&format!("W C0ED {:02X}\nR C0EC\n", byte));
    }
    replay(&mut bus, &parse_trace(&text).unwrap());
    assert!(bus.card.snapshot().drives[0].modified);

    // 読み取り: ディスクを挿し直して先頭から読む
    let image = bus.card.export_disk(0).unwrap();
    bus.card.eject_disk(0).unwrap();
    bus.card.insert_disk(0, &image, false).unwrap();

    let mut text = String::from("R C0E9\nR C0EE\n");
    for _ in 0..5 {
        text.push_str("R C0EC\n");
    }
    let results = replay(&mut bus, &parse_trace(&text).unwrap());
    let bytes: Vec<u8> = results[2..].iter().map(|r| r.unwrap()).collect();
    assert_eq!(&bytes[..3], &[0xD5, 0xAA, 0x96]);
    assert_eq!(decode_4and4([bytes[3], bytes[4]]), 254);
}

#[test]
fn invalid_motor_state_does_not_move_head() {
    let mut bus = slot6();
    let accesses = parse_trace("R C0E1\nR C0E3\nR C0E5\nR C0E7\n").unwrap();
    replay(&mut bus, &accesses);
    assert_eq!(bus.card.head().quarter_track(), 1);
    assert_eq!(bus.fault_count(), 2);
}
