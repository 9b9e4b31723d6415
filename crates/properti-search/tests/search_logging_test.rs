//! Structured search logs carry the sanitized term, never raw input.

use std::io::Write;
use std::sync::{Arc, Mutex};

use properti_db::test_fixtures::sample_listings;
use properti_db::InMemoryListingStore;
use properti_search::{SearchEngine, SearchOptions};

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_search_span_logs_sanitized_term() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let engine = SearchEngine::new(InMemoryListingStore::new().with_listings(sample_listings()));
    engine
        .search("rumah\u{1b}[31m <b>sleman</b>\u{7}", SearchOptions::default())
        .await
        .unwrap();

    let output = logs.contents();
    assert!(output.contains("Property search completed"));
    assert!(output.contains("rumah"));
    assert!(!output.contains('\u{1b}'), "escape character leaked: {output:?}");
    assert!(!output.contains('\u{7}'), "bell character leaked: {output:?}");
    assert!(!output.contains("<b>"));
}
