use axum::{routing::get, Router};
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and publish the configured rule count.
    pub fn init(rules_configured: usize) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        gauge!("compass_rules_configured").set(rules_configured as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One classification served, labelled by mode (`rules`, `full`, `ai`, `batch`).
pub fn record_classification(mode: &'static str) {
    counter!("compass_classify_total", "mode" => mode).increment(1);
}

/// One rejected or failed request, labelled by error kind.
pub fn record_error(kind: &'static str) {
    counter!("compass_classify_errors_total", "kind" => kind).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_render_in_exposition_format() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        ::metrics::with_local_recorder(&recorder, || {
            record_classification("rules");
            record_classification("rules");
            record_error("invalid_input");
        });
        let out = handle.render();
        assert!(out.contains(r#"compass_classify_total{mode="rules"} 2"#), "{out}");
        assert!(out.contains(r#"compass_classify_errors_total{kind="invalid_input"} 1"#));
    }
}
