use clap::Args;
use clap::ValueEnum;
use educe::Educe;
use url::Url;

#[derive(Args, Debug, Educe, Clone)]
#[educe(Default)]
pub struct TelemetryConfig {
    #[educe(Default = TelemetryKind::None)]
    #[clap(long, env, default_value_t)]
    pub telemetry_kind: TelemetryKind,
    #[educe(Default = "noteblog".into())]
    #[clap(long, env, default_value = "noteblog")]
    pub service_name: String,
    #[educe(Default = Url::parse("http://localhost:4317").unwrap())]
    #[arg(long, env, default_value = "http://localhost:4317")]
    pub telemetry_endpoint: Url,
}

impl TelemetryConfig {
    /// The spans exporter settings, if spans are to be exported at all
    pub fn telemetry(&self) -> Option<common::tracing::Telemetry> {
        match self.telemetry_kind {
            TelemetryKind::None => None,
            TelemetryKind::Opentelemetry => Some(common::tracing::Telemetry {
                service_name: self.service_name.clone(),
                endpoint: self.telemetry_endpoint.clone(),
            }),
        }
    }
}

#[derive(Default, ValueEnum, Debug, Clone, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TelemetryKind {
    #[default]
    None,
    Opentelemetry,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn no_telemetry_by_default() {
        assert!(TelemetryConfig::default().telemetry().is_none());
    }

    #[test]
    fn opentelemetry_exports_to_the_endpoint() {
        let config = TelemetryConfig {
            telemetry_kind: TelemetryKind::Opentelemetry,
            ..Default::default()
        };

        let telemetry = config.telemetry().expect("telemetry should be enabled");

        assert_eq!(telemetry.service_name, "noteblog");
        assert_eq!(telemetry.endpoint.as_str(), "http://localhost:4317/");
    }
}
