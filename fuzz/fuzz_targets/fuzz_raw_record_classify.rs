#![no_main]

use libfuzzer_sys::fuzz_target;
use teamfeed::feed::{FeedAggregator, FeedQuery, RawRecord};
use teamfeed::store::NoReactions;

/// Feeds arbitrary JSON through raw record classification and feed assembly.
///
/// Catches panics in decoding, validation or sorting of adversarial records.
/// Every input record must end up either in the page or in `rejected`.
fuzz_target!(|data: &[u8]| {
    let records: Vec<RawRecord> = match serde_json::from_slice(data) {
        Ok(records) => records,
        Err(_) => return,
    };

    for record in &records {
        let _ = record.classify();
    }

    let page = match FeedAggregator::default().aggregate_raw(
        &records,
        &[],
        &FeedQuery::new().limit(0),
        &NoReactions,
        chrono::Utc::now(),
    ) {
        Ok(page) => page,
        Err(_) => return,
    };
    assert_eq!(page.items.len() + page.rejected.len(), records.len());
    for pair in page.items.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
});
