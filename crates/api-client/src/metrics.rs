//! Client-side request metrics
//!
//! - `api_requests_total` (counter): labels `method`, `outcome`
//! - `api_request_duration_seconds` (histogram): label `outcome`
//! - `api_token_refresh_total` (counter): label `result`
//!
//! Without an installed recorder every call is a no-op.

/// Record one dispatched attempt.
pub fn record_request(method: &str, outcome: &'static str, duration_secs: f64) {
    metrics::counter!("api_requests_total", "method" => method.to_string(), "outcome" => outcome)
        .increment(1);
    metrics::histogram!("api_request_duration_seconds", "outcome" => outcome)
        .record(duration_secs);
}

/// Record how a 401 recovery attempt ended: `success`, `failure`, or
/// `missing` (no refresh token stored).
pub fn record_refresh(result: &'static str) {
    metrics::counter!("api_token_refresh_total", "result" => result).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_request("GET", "success", 0.05);
        record_refresh("missing");
    }

    #[test]
    fn counters_render_with_labels() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_request("GET", "unauthorized", 0.01);
        record_request("GET", "success", 0.02);
        record_refresh("success");

        let output = handle.render();
        assert!(output.contains("api_requests_total"));
        assert!(output.contains("outcome=\"unauthorized\""));
        assert!(output.contains("method=\"GET\""));
        assert!(output.contains("api_token_refresh_total"));
        assert!(output.contains("result=\"success\""));
    }
}
