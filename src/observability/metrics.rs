//! Metrics collection.
//!
//! # Metrics
//! - `tls_sessions_accepted_total` (counter)
//! - `tls_handshakes_total` (counter): by `protocol` (tls13/legacy) and `result` (success/error)
//! - `tls_fallbacks_total` (counter)
//! - `tls_keylog_records_total` (counter): by `label`
//!
//! Recorded through the `metrics` facade; without an installed recorder these are no-ops.

use crate::observability::keylog::KeyLogLabel;
use crate::session::NegotiatedProtocol;

pub fn record_session_accepted() {
    metrics::counter!("tls_sessions_accepted_total").increment(1);
}

pub fn record_handshake(protocol: NegotiatedProtocol, success: bool) {
    let result = if success { "success" } else { "error" };
    metrics::counter!(
        "tls_handshakes_total",
        "protocol" => protocol.as_str(),
        "result" => result
    )
    .increment(1);
}

pub fn record_fallback() {
    metrics::counter!("tls_fallbacks_total").increment(1);
}

pub fn record_keylog_record(label: KeyLogLabel) {
    metrics::counter!("tls_keylog_records_total", "label" => label.as_str()).increment(1);
}
