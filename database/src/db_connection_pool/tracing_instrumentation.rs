use std::time::Instant;

use diesel::connection::Instrumentation;
use diesel::connection::InstrumentationEvent;

/// Reports the queries run on a connection as `tracing` events
#[derive(Debug, Default)]
pub(super) struct TracingInstrumentation {
    query_started_at: Option<Instant>,
}

impl Instrumentation for TracingInstrumentation {
    fn on_connection_event(&mut self, event: InstrumentationEvent<'_>) {
        match event {
            InstrumentationEvent::StartQuery { query, .. } => {
                self.query_started_at = Some(Instant::now());
                tracing::trace!(target: "database", %query, "query started");
            }
            InstrumentationEvent::FinishQuery { query, error, .. } => {
                let elapsed_ms = self
                    .query_started_at
                    .take()
                    .map(|started_at| started_at.elapsed().as_millis())
                    .unwrap_or_default();
                match error {
                    Some(error) => {
                        tracing::debug!(target: "database", %query, %error, elapsed_ms, "query failed")
                    }
                    None => tracing::debug!(target: "database", %query, elapsed_ms, "query finished"),
                }
            }
            InstrumentationEvent::BeginTransaction { depth, .. } => {
                tracing::trace!(target: "database", depth = depth.get(), "begin transaction");
            }
            InstrumentationEvent::CommitTransaction { depth, .. } => {
                tracing::trace!(target: "database", depth = depth.get(), "commit transaction");
            }
            InstrumentationEvent::RollbackTransaction { depth, .. } => {
                tracing::trace!(target: "database", depth = depth.get(), "rollback transaction");
            }
            _ => {}
        }
    }
}
