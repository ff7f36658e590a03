#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;
use trialstat::event::{EventNames, JsonLinesSource};
use trialstat::filter::EventFilter;
use trialstat::segment::{segment, SegmentationPolicy};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Malformed lines must surface as errors, never panics
        let Ok(events) = JsonLinesSource::parse_str(input, Path::new("fuzz.jsonl"), &EventFilter::all())
        else {
            return;
        };

        let names = EventNames::default();
        for policy in [
            SegmentationPolicy::BoundaryAnchored,
            SegmentationPolicy::OutcomeAnchored,
            SegmentationPolicy::OutcomeAnchoredWithPosition,
        ] {
            let _ = segment(&events, policy, &names);
        }
    }
});
