// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartscan::client::parse_response;
use smartscan::view::format_confidence;

fuzz_target!(|data: &[u8]| {
    if let Ok(result) = parse_response(data) {
        assert!((0.0..=1.0).contains(&result.confidence));
        assert!(!result.label.trim().is_empty());
        assert!(format_confidence(result.confidence).ends_with('%'));
    }
});
