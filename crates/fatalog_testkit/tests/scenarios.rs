//! End-to-end scenarios: faults recorded, device rebooted, records read back.

use fatalog_core::{
    layout::{record_size, HEADER_SIZE, RECORD_FIXED_SIZE},
    Config, CoreError, CrashHook, FaultHandler, Integrity, RecordOutcome, Store,
};
use fatalog_storage::{EepromMedia, EmulatedEeprom, NvStorage};
use fatalog_testkit::prelude::*;

#[test]
fn three_faults_in_512_byte_window() {
    let mut test = TestStore::open(0, 512);
    let depths = [5usize, 10, 3];
    let bases = [0x3FFF_FD00u32, 0x3FFF_FC00, 0x3FFF_FB00];

    for (i, (&depth, &base)) in depths.iter().zip(&bases).enumerate() {
        test.clock.set(1000 * (i as u32 + 1));
        let image = StackImage::counting(base, depth);
        let outcome = test.store.record_crash(&image.fault(sample_reset_info(i as u32)));
        assert!(outcome.is_persisted());
    }

    let test = test.reboot();
    assert_eq!(test.store.count(), 3);

    let used: usize = depths.iter().map(|&d| record_size(d as u16)).sum();
    let expected_free = 512 - (HEADER_SIZE + used);
    assert_eq!(expected_free, 316);
    assert_eq!(test.store.free_bytes(), Some(expected_free as u16));

    let out = test.printed();
    assert_eq!(out.matches("\nFatal # ").count(), 3);
    assert!(out.contains("Fatal # 1 at 1000 ms"));
    assert!(out.contains("Fatal # 2 at 2000 ms"));
    assert!(out.contains("Fatal # 3 at 3000 ms"));
    assert!(out.ends_with("316 bytes free\n"));

    // Second record: 10 words in lines of 4, 4 and 2 with increasing addresses.
    assert!(out.contains(
        "3ffffc00: 3fff0000 3fff0001 3fff0002 3fff0003\n\
         3ffffc10: 3fff0004 3fff0005 3fff0006 3fff0007\n\
         3ffffc20: 3fff0008 3fff0009\n"
    ));
}

#[test]
fn records_read_back_in_order_with_exact_contents() {
    let mut test = TestStore::open(64, 1024);
    let images: Vec<StackImage> = (0..4)
        .map(|i| StackImage::new(0x3FFE_0000 + i * 0x100, (0..=i).map(|w| w * 7 + i).collect()))
        .collect();

    for (i, image) in images.iter().enumerate() {
        test.clock.set(i as u32 * 10);
        test.store.record_crash(&image.fault(sample_reset_info(i as u32)));
    }

    let report = test.reboot().store.report();
    assert_eq!(report.integrity, Integrity::Intact);
    assert_eq!(report.records.len(), images.len());
    for (i, (record, image)) in report.records.iter().zip(&images).enumerate() {
        assert_eq!(record.number, i + 1);
        assert_eq!(record.header.timestamp, i as u32 * 10);
        assert_eq!(record.header.reset_info, sample_reset_info(i as u32));
        assert_eq!(record.header.stack_start, image.base);
        assert_eq!(record.stack, image.words);
    }
}

#[test]
fn sentinel_window_initializes_on_first_fault() {
    let mut test = TestStore::open(128, 256);
    assert!(!test.store.is_initialized());
    assert_eq!(test.store.count(), 0);

    let image = StackImage::counting(0x1000, 2);
    test.store.record_crash(&image.fault(sample_reset_info(0)));

    let header = test.store.header();
    assert_eq!(header.count, 1);
    assert_eq!(header.next_offset as usize, HEADER_SIZE + record_size(2));
    assert_eq!(header.next_offset % 4, 0);

    // Bytes outside the window are untouched.
    let media = test.media.data();
    assert!(media[..128].iter().all(|&b| b == 0xFF));
    assert!(media[384..].iter().all(|&b| b == 0xFF));
}

#[test]
fn clear_is_idempotent() {
    let mut test = TestStore::open(0, 512);
    let image = StackImage::counting(0x1000, 8);
    test.store.record_crash(&image.fault(sample_reset_info(0)));
    test.store.record_crash(&image.fault(sample_reset_info(1)));

    for _ in 0..3 {
        test.store.clear().unwrap();
        assert_eq!(test.store.count(), 0);
        assert_eq!(test.printed(), "508 bytes free\n");
    }

    let test = test.reboot();
    assert_eq!(test.store.count(), 0);
    assert_eq!(test.store.report().integrity, Integrity::Intact);
}

#[test]
fn capacity_saturation_turns_recorder_into_no_op() {
    let size = 600u16;
    let depth = 7usize;
    let mut test = TestStore::open(0, size);
    let image = StackImage::counting(0x2000, depth);

    let mut saved = 0;
    loop {
        let outcome = test.store.record_crash(&image.fault(sample_reset_info(saved)));
        match outcome {
            RecordOutcome::Saved(record) => {
                saved += 1;
                assert_eq!(record.stack_len as usize, depth);
                if record.filled_store {
                    break;
                }
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    // No room is left for a record of the minimum depth.
    let used = HEADER_SIZE + saved as usize * record_size(depth as u16);
    assert!(used > size as usize - (RECORD_FIXED_SIZE + 5 * 4));

    let before = test.media.data();
    let commits = test.media.commit_count();
    assert_eq!(
        test.store.record_crash(&image.fault(sample_reset_info(99))),
        RecordOutcome::StoreFull
    );
    assert_eq!(test.media.data(), before);
    assert_eq!(test.media.commit_count(), commits);
    assert_eq!(test.store.count() as u32, saved);
    assert!(test.printed().ends_with("Fatal store full\n"));

    test.store.clear().unwrap();
    assert!(test.store.record_crash(&image.fault(sample_reset_info(0))).is_persisted());
}

#[test]
fn inflated_stack_len_halts_with_incomplete() {
    let mut test = TestStore::open(0, 256);
    let image = StackImage::counting(0x1000, 3);
    test.store.record_crash(&image.fault(sample_reset_info(0)));
    test.store.record_crash(&image.fault(sample_reset_info(1)));

    // stack_len of the first record sits 36 bytes into it.
    test.media.poke(HEADER_SIZE + 36, &u16::MAX.to_le_bytes());
    let test = test.reboot();

    let report = test.store.report();
    assert_eq!(report.integrity, Integrity::Incomplete { number: 1 });
    assert_eq!(report.records.len(), 1);

    let out = test.printed();
    assert_eq!(out.matches("\nFatal # ").count(), 1);
    assert!(out.contains("Incomplete stack trace\n"));
}

#[test]
fn store_open_distinguishes_configuration_errors() {
    let too_far = Store::begin(Box::new(EmulatedEeprom::new(1024)), 1000, 100);
    assert!(matches!(too_far, Err(CoreError::WindowOutOfBounds { .. })));

    let flaky = FlakyStorage::new(Box::new(EmulatedEeprom::new(1024)));
    flaky.switches().set_fail_on_map(true);
    let no_mirror = Store::begin(Box::new(flaky), 0, 512);
    assert!(matches!(no_mirror, Err(CoreError::MirrorUnavailable { .. })));
}

#[test]
fn failed_commit_is_reported_not_raised() {
    let media = EepromMedia::erased(TEST_SECTOR_SIZE);
    let flaky = FlakyStorage::new(Box::new(EmulatedEeprom::on_media(media.clone())));
    let switches = flaky.switches();
    let mut store = Store::begin(Box::new(flaky), 0, 512).unwrap();

    switches.set_fail_on_commit(true);
    let image = StackImage::counting(0x1000, 4);
    let outcome = store.record_crash(&image.fault(sample_reset_info(0)));

    assert!(matches!(outcome, RecordOutcome::Unpersisted(_)));
    assert!(!outcome.is_persisted());
    assert_eq!(switches.failed_commits(), 1);
    assert_eq!(store.count(), 1);
    assert!(media.data()[..4].iter().all(|&b| b == 0xFF));

    assert!(matches!(store.clear(), Err(CoreError::Storage(_))));
}

#[test]
fn hook_feeds_store_across_reboot() {
    let media = EepromMedia::erased(TEST_SECTOR_SIZE);
    let store = Store::open(
        Box::new(EmulatedEeprom::on_media(media.clone())),
        Config::new(0, 512).max_stack_words(8),
    )
    .unwrap();
    let hook = CrashHook::new(store);

    let image = StackImage::counting(0x3FFF_E000, 32);
    let outcome = hook.on_fault(&image.fault(sample_reset_info(3)));
    let saved = *outcome.saved().unwrap();
    assert_eq!(saved.stack_len, 8);
    assert!(saved.truncated);

    let mut storage = EmulatedEeprom::on_media(media);
    storage.map(4).unwrap();
    assert_eq!(storage.mirror().unwrap()[0], 1);
}
