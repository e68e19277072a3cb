#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeSet;

use logcap_core::{CaptureSink, EmittedEvent, Level};
use proptest::prelude::*;

#[test]
fn test_drain_then_snapshot_is_empty() {
    // GIVEN a sink with three records
    let sink = CaptureSink::new();
    for i in 0..3 {
        sink.record(EmittedEvent::new(Level::Info, "sink", format!("m{}", i)));
    }

    // WHEN draining with no concurrent writers
    let drained = sink.drain();

    // THEN the drain holds everything and the sink is empty
    assert_eq!(drained.len(), 3);
    assert!(sink.snapshot().is_empty());
}

#[test]
fn test_sealed_sink_rejects_records_and_drains_nothing() {
    let sink = CaptureSink::new();
    sink.record(EmittedEvent::new(Level::Info, "sink", "kept"));

    let frozen = sink.seal();
    let accepted = sink.record(EmittedEvent::new(Level::Info, "sink", "late"));

    assert!(!accepted);
    assert!(sink.drain().is_empty());
    assert_eq!(frozen.messages(), vec!["kept"]);
    assert_eq!(sink.snapshot().messages(), vec!["kept"]);
}

#[test]
fn test_concurrent_drains_partition_history() {
    // GIVEN writers and a drainer running at the same time
    let sink = std::sync::Arc::new(CaptureSink::new());
    let writers: Vec<_> = (0..4)
        .map(|w| {
            let sink = std::sync::Arc::clone(&sink);
            std::thread::spawn(move || {
                for i in 0..500 {
                    sink.record(EmittedEvent::new(Level::Info, "sink", format!("{}-{}", w, i)));
                }
            })
        })
        .collect();

    let mut drained = Vec::new();
    while writers.iter().any(|w| !w.is_finished()) {
        drained.extend(sink.drain());
    }
    for writer in writers {
        writer.join().unwrap();
    }
    drained.extend(sink.drain());

    // THEN the union of drains is the full history, each record once
    let seqs: BTreeSet<u64> = drained.iter().map(|r| r.seq()).collect();
    assert_eq!(drained.len(), 2000);
    assert_eq!(seqs.len(), 2000);
    assert!(drained.windows(2).all(|w| w[0].seq() < w[1].seq()));
}

proptest! {
    #[test]
    fn drains_partition_the_sequence(batches in prop::collection::vec(0usize..20, 1..10)) {
        let sink = CaptureSink::new();
        let mut all = Vec::new();
        let mut total = 0usize;

        for batch in &batches {
            for _ in 0..*batch {
                sink.record(EmittedEvent::new(Level::Debug, "sink", total.to_string()));
                total += 1;
            }
            let drained = sink.drain();
            prop_assert_eq!(drained.len(), *batch);
            all.extend(drained);
        }

        let messages: Vec<String> = all.iter().map(|r| r.message().to_string()).collect();
        let expected: Vec<String> = (0..total).map(|i| i.to_string()).collect();
        prop_assert_eq!(messages, expected);
    }
}
