#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use headline::extractor::{ExtractorRegistry, extract_from_html};
use headline::extractor::cleaner::sanitize;
use headline::feed::parse_feed;

fuzz_target!(|data: &[u8]| {
    // Feed parsing works on raw bytes and must reject, not panic.
    let _ = parse_feed(data);

    let html = String::from_utf8_lossy(data);
    let url = Url::parse("https://vnexpress.net/fuzz.html").unwrap();

    // Neither the site path nor the generic path may panic on any input.
    let registry = ExtractorRegistry::with_default_sites();
    let _ = extract_from_html(&registry, &html, &url);
    let _ = sanitize(&html);
});
