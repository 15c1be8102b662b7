//! DispatchCoordinator - sequential per-row send loop

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use contracts::{
    Cell, ColumnBindings, ContractError, Dataset, DispatchReport, DispatchResult, DispatchStatus,
    DispatchSummary, FailureClass, GatewayConfig, MessageTransport, OutboundMessage, Row, RunState,
    SendAttempt,
};
use tracing::{debug, error, info, instrument, warn};

use crate::metrics::TransportMetrics;

/// Run controls
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Stop after this many send attempts
    pub max_sends: Option<usize>,

    /// End the run after an Unauthorized or Forbidden response
    pub stop_on_fatal: bool,

    /// Upper bound on a single send; a timeout counts as no response
    pub request_timeout: Option<Duration>,
}

impl DispatchOptions {
    pub fn from_gateway(gateway: &GatewayConfig) -> Self {
        Self {
            request_timeout: Some(gateway.request_timeout()),
            ..Self::default()
        }
    }

    pub fn with_max_sends(mut self, max_sends: usize) -> Self {
        self.max_sends = Some(max_sends);
        self
    }

    pub fn with_stop_on_fatal(mut self, stop: bool) -> Self {
        self.stop_on_fatal = stop;
        self
    }
}

/// Column positions a run reads
struct BoundColumns {
    phone: usize,
    name: Option<usize>,
    identifier: Option<usize>,
}

impl BoundColumns {
    fn resolve(dataset: &Dataset, bindings: &ColumnBindings) -> Result<Self, ContractError> {
        let phone = dataset.column_index(&bindings.phone).ok_or_else(|| {
            ContractError::validation(
                "columns.phone",
                format!("column '{}' not found in dataset", bindings.phone),
            )
        })?;

        Ok(Self {
            phone,
            name: Self::optional(dataset, "name", bindings.name.as_deref()),
            identifier: Self::optional(dataset, "identifier", bindings.identifier.as_deref()),
        })
    }

    /// Display-only columns fall back when missing
    fn optional(dataset: &Dataset, field: &str, header: Option<&str>) -> Option<usize> {
        let header = header?;
        let idx = dataset.column_index(header);
        if idx.is_none() {
            warn!(field, column = header, "Bound column missing from dataset, using fallback");
        }
        idx
    }

    fn text(row: &Row, idx: Option<usize>) -> Option<String> {
        idx.and_then(|i| row.get(i)).and_then(Cell::trimmed_text)
    }
}

/// Accumulates results and counters of one run
#[derive(Debug, Default)]
struct DispatchTally {
    results: Vec<DispatchResult>,
    summary: DispatchSummary,
}

impl DispatchTally {
    fn skip(&mut self) {
        self.summary.skipped_count += 1;
    }

    fn record(&mut self, mut result: DispatchResult, attempt: &SendAttempt, latency: Duration) {
        match attempt {
            SendAttempt::Accepted { .. } => {
                self.summary.success_count += 1;
                result.finalize(DispatchStatus::Sent);
            }
            SendAttempt::Rejected { status } => {
                self.summary.fail_count += 1;
                self.summary.last_failure_status = Some(*status);
                result.finalize(DispatchStatus::Failed);
            }
            SendAttempt::NoResponse { .. } => {
                self.summary.fail_count += 1;
                self.summary.network_failure = true;
                result.finalize(DispatchStatus::Failed);
            }
        }
        result.latency_ms = Some(latency.as_secs_f64() * 1000.0);
        self.results.push(result);
    }

    fn attempted(&self) -> usize {
        self.summary.attempted()
    }

    fn finish(self, started_at: chrono::DateTime<Utc>) -> DispatchReport {
        DispatchReport {
            outcome: self.summary.classify(),
            results: self.results,
            summary: self.summary,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

/// Broadcasts one message to every row's phone, one send at a time
pub struct DispatchCoordinator<T> {
    transport: T,
    options: DispatchOptions,
    state: RunState,
    metrics: Arc<TransportMetrics>,
}

impl<T: MessageTransport> DispatchCoordinator<T> {
    pub fn new(transport: T, options: DispatchOptions) -> Self {
        Self {
            transport,
            options,
            state: RunState::NotStarted,
            metrics: Arc::new(TransportMetrics::new()),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub fn metrics(&self) -> &Arc<TransportMetrics> {
        &self.metrics
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send `message` to the phone of every row in `dataset`
    ///
    /// Rows with a blank phone are skipped. A failed send never aborts the
    /// run; failures are aggregated into the report's outcome.
    ///
    /// # Errors
    /// `ContractError::Validation` for an empty message or a phone column
    /// missing from the dataset.
    #[instrument(
        name = "dispatch_run",
        skip(self, dataset, bindings, message),
        fields(transport = %self.transport.name(), rows = dataset.total_rows())
    )]
    pub async fn dispatch(
        &mut self,
        dataset: &Dataset,
        bindings: &ColumnBindings,
        message: &str,
    ) -> Result<DispatchReport, ContractError> {
        if message.trim().is_empty() {
            return Err(ContractError::validation("message", "message must not be empty"));
        }
        let columns = BoundColumns::resolve(dataset, bindings)?;

        self.state = RunState::Running;
        let started_at = Utc::now();
        let mut tally = DispatchTally::default();

        info!(rows = dataset.total_rows(), "Dispatch started");

        for (idx, row) in dataset.rows.iter().enumerate() {
            if self
                .options
                .max_sends
                .map_or(false, |max| tally.attempted() >= max)
            {
                info!(sent = tally.attempted(), "Send limit reached, stopping run");
                break;
            }

            let Some(phone) = BoundColumns::text(row, Some(columns.phone)) else {
                debug!(row = idx + 1, "Blank phone, row skipped");
                self.metrics.inc_skipped();
                tally.skip();
                continue;
            };

            let identifier =
                BoundColumns::text(row, columns.identifier).unwrap_or_else(|| (idx + 1).to_string());
            let display_name = BoundColumns::text(row, columns.name).unwrap_or_default();
            let result = DispatchResult::pending(identifier, display_name, phone.clone());

            let outbound = OutboundMessage {
                phone,
                message: message.to_string(),
            };
            let started = Instant::now();
            let attempt = self.send_one(&outbound).await;
            let latency = started.elapsed();

            self.metrics.record(&attempt);
            record_attempt_metrics(&attempt, latency);
            tally.record(result, &attempt, latency);

            if self.options.stop_on_fatal && is_fatal(&attempt) {
                warn!(
                    row = idx + 1,
                    status = ?attempt.status(),
                    "Fatal gateway response, stopping run"
                );
                break;
            }
        }

        let report = tally.finish(started_at);
        self.state = RunState::Completed;

        match report.outcome.into_result() {
            Ok(()) => info!(
                sent = report.summary.success_count,
                skipped = report.summary.skipped_count,
                "Dispatch completed"
            ),
            Err(e) => error!(
                sent = report.summary.success_count,
                failed = report.summary.fail_count,
                skipped = report.summary.skipped_count,
                error = %e,
                "Dispatch completed with failures"
            ),
        }
        Ok(report)
    }

    async fn send_one(&mut self, outbound: &OutboundMessage) -> SendAttempt {
        let limit = self.options.request_timeout;
        let send = self.transport.send(outbound);
        match limit {
            Some(limit) => match tokio::time::timeout(limit, send).await {
                Ok(attempt) => attempt,
                Err(_) => {
                    warn!(phone = %outbound.phone, timeout_ms = limit.as_millis() as u64, "Send timed out");
                    SendAttempt::NoResponse {
                        reason: format!("no response within {} ms", limit.as_millis()),
                    }
                }
            },
            None => send.await,
        }
    }
}

fn is_fatal(attempt: &SendAttempt) -> bool {
    !attempt.is_accepted()
        && attempt
            .status()
            .map_or(false, |status| FailureClass::from_status(status).is_fatal())
}

fn record_attempt_metrics(attempt: &SendAttempt, latency: Duration) {
    metrics::histogram!("rowcast_send_duration_ms").record(latency.as_secs_f64() * 1000.0);
    match attempt {
        SendAttempt::Accepted { .. } => {
            metrics::counter!("rowcast_messages_sent_total").increment(1);
        }
        SendAttempt::Rejected { status } => {
            let class = FailureClass::from_status(*status);
            metrics::counter!("rowcast_messages_failed_total", "class" => class.as_str())
                .increment(1);
        }
        SendAttempt::NoResponse { .. } => {
            let class = FailureClass::NetworkUnreachable;
            metrics::counter!("rowcast_messages_failed_total", "class" => class.as_str())
                .increment(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transports::ScriptedTransport;
    use contracts::DispatchOutcome;

    fn bindings() -> ColumnBindings {
        ColumnBindings {
            neighborhood: "Bairro".into(),
            status: "Status".into(),
            date: "Data".into(),
            phone: "Telefone".into(),
            name: Some("Nome".into()),
            identifier: None,
        }
    }

    fn dataset(phones: &[&str]) -> Dataset {
        let headers = vec!["Nome".to_string(), "Telefone".to_string()];
        let rows = phones
            .iter()
            .enumerate()
            .map(|(i, phone)| {
                let phone = if phone.is_empty() {
                    Cell::Null
                } else {
                    Cell::from(*phone)
                };
                vec![Cell::from(format!("Cliente {}", i + 1)), phone]
            })
            .collect();
        Dataset::new(headers, rows)
    }

    fn coordinator(script: Vec<SendAttempt>) -> DispatchCoordinator<ScriptedTransport> {
        DispatchCoordinator::new(ScriptedTransport::new(script), DispatchOptions::default())
    }

    #[tokio::test]
    async fn test_third_send_rate_limited() {
        let mut coordinator = coordinator(vec![
            SendAttempt::Accepted { status: 200 },
            SendAttempt::Accepted { status: 200 },
            SendAttempt::Rejected { status: 429 },
        ]);

        let report = coordinator
            .dispatch(&dataset(&["111", "222", "333"]), &bindings(), "Olá")
            .await
            .unwrap();

        assert_eq!(report.summary.success_count, 2);
        assert_eq!(report.summary.fail_count, 1);
        assert_eq!(
            report.outcome,
            DispatchOutcome::Failed(FailureClass::RateLimited)
        );
        let statuses: Vec<_> = report.results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![DispatchStatus::Sent, DispatchStatus::Sent, DispatchStatus::Failed]
        );
        assert_eq!(report.results[2].phone, "333");
        assert_eq!(report.results[0].display_name, "Cliente 1");
        assert_eq!(report.results[0].identifier, "1");
        assert!(report.results.iter().all(|r| r.latency_ms.is_some()));
    }

    #[tokio::test]
    async fn test_blank_phone_skipped() {
        let mut coordinator = coordinator(vec![]);
        let report = coordinator
            .dispatch(&dataset(&["111", "", "  ", " 333 "]), &bindings(), "Olá")
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.summary.attempted(), 2);
        assert_eq!(report.summary.skipped_count, 2);
        assert_eq!(report.results[1].phone, "333");
        assert_eq!(report.results[1].identifier, "4");
        assert_eq!(report.outcome, DispatchOutcome::Success);

        let sent: Vec<_> = coordinator
            .transport()
            .received()
            .iter()
            .map(|m| m.phone.as_str())
            .collect();
        assert_eq!(sent, vec!["111", "333"]);
        assert_eq!(coordinator.metrics().skipped(), 2);
    }

    #[tokio::test]
    async fn test_no_response_dominates() {
        let mut coordinator = coordinator(vec![
            SendAttempt::NoResponse {
                reason: "refused".into(),
            },
            SendAttempt::Rejected { status: 500 },
        ]);
        let report = coordinator
            .dispatch(&dataset(&["1", "2", "3"]), &bindings(), "Olá")
            .await
            .unwrap();

        assert_eq!(report.summary.fail_count, 2);
        assert_eq!(report.summary.last_failure_status, Some(500));
        assert_eq!(
            report.outcome,
            DispatchOutcome::Failed(FailureClass::NetworkUnreachable)
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_run() {
        let mut coordinator = coordinator(vec![SendAttempt::Rejected { status: 401 }]);
        let report = coordinator
            .dispatch(&dataset(&["1", "2", "3"]), &bindings(), "Olá")
            .await
            .unwrap();

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.summary.success_count, 2);
        assert_eq!(
            report.outcome,
            DispatchOutcome::Failed(FailureClass::Unauthorized)
        );
    }

    #[tokio::test]
    async fn test_stop_on_fatal() {
        let mut coordinator = DispatchCoordinator::new(
            ScriptedTransport::new([
                SendAttempt::Accepted { status: 200 },
                SendAttempt::Rejected { status: 403 },
            ]),
            DispatchOptions::default().with_stop_on_fatal(true),
        );
        let report = coordinator
            .dispatch(&dataset(&["1", "2", "3", "4"]), &bindings(), "Olá")
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(
            report.outcome,
            DispatchOutcome::Failed(FailureClass::Forbidden)
        );
        assert_eq!(coordinator.transport().received().len(), 2);
    }

    #[tokio::test]
    async fn test_max_sends() {
        let mut coordinator = DispatchCoordinator::new(
            ScriptedTransport::accepting(),
            DispatchOptions::default().with_max_sends(2),
        );
        let report = coordinator
            .dispatch(&dataset(&["1", "", "2", "3"]), &bindings(), "Olá")
            .await
            .unwrap();

        assert_eq!(report.summary.success_count, 2);
        assert_eq!(report.summary.skipped_count, 1);
        assert_eq!(report.results.last().unwrap().phone, "2");
    }

    #[tokio::test]
    async fn test_timeout_counts_as_no_response() {
        let mut coordinator = DispatchCoordinator::new(
            ScriptedTransport::accepting().with_delay(Duration::from_millis(500)),
            DispatchOptions {
                request_timeout: Some(Duration::from_millis(10)),
                ..DispatchOptions::default()
            },
        );
        let report = coordinator
            .dispatch(&dataset(&["1"]), &bindings(), "Olá")
            .await
            .unwrap();

        assert_eq!(report.summary.fail_count, 1);
        assert!(report.summary.network_failure);
        assert_eq!(
            report.outcome,
            DispatchOutcome::Failed(FailureClass::NetworkUnreachable)
        );
        assert_eq!(coordinator.metrics().no_response(), 1);
    }

    #[tokio::test]
    async fn test_rejects_empty_message() {
        let mut coordinator = coordinator(vec![]);
        let err = coordinator
            .dispatch(&dataset(&["1"]), &bindings(), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Validation { ref field, .. } if field == "message"));
        assert_eq!(coordinator.state(), RunState::NotStarted);
    }

    #[tokio::test]
    async fn test_missing_phone_column() {
        let mut coordinator = coordinator(vec![]);
        let mut bindings = bindings();
        bindings.phone = "Celular".into();

        let err = coordinator
            .dispatch(&dataset(&["1"]), &bindings, "Olá")
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Validation { ref field, .. } if field == "columns.phone"));
    }

    #[tokio::test]
    async fn test_missing_optional_columns_fall_back() {
        let mut coordinator = coordinator(vec![]);
        let mut bindings = bindings();
        bindings.identifier = Some("Codigo".into());
        let dataset = Dataset::new(vec!["Telefone".into()], vec![vec![Cell::from("555")]]);

        let report = coordinator
            .dispatch(&dataset, &bindings, "Olá")
            .await
            .unwrap();
        assert_eq!(report.summary.success_count, 1);
        assert_eq!(report.results[0].identifier, "1");
        assert_eq!(report.results[0].display_name, "");
    }

    #[tokio::test]
    async fn test_identifier_column() {
        let headers = vec!["Código".to_string(), "Telefone".to_string()];
        let rows = vec![
            vec![Cell::Number(42.0), Cell::from("111")],
            vec![Cell::Null, Cell::from("222")],
        ];
        let mut bindings = bindings();
        bindings.name = None;
        bindings.identifier = Some("Código".into());

        let mut coordinator = coordinator(vec![]);
        let report = coordinator
            .dispatch(&Dataset::new(headers, rows), &bindings, "Olá")
            .await
            .unwrap();

        assert_eq!(report.results[0].identifier, "42");
        assert_eq!(report.results[1].identifier, "2");
        assert_eq!(report.results[0].display_name, "");
    }

    #[tokio::test]
    async fn test_state_and_rerun() {
        let mut coordinator = coordinator(vec![SendAttempt::Rejected { status: 404 }]);
        assert_eq!(coordinator.state(), RunState::NotStarted);

        let first = coordinator
            .dispatch(&dataset(&["1"]), &bindings(), "Olá")
            .await
            .unwrap();
        assert_eq!(coordinator.state(), RunState::Completed);
        assert_eq!(
            first.outcome,
            DispatchOutcome::Failed(FailureClass::ServiceUnavailable)
        );

        let second = coordinator
            .dispatch(&dataset(&["1", "2"]), &bindings(), "Olá")
            .await
            .unwrap();
        assert_eq!(second.outcome, DispatchOutcome::Success);
        assert_eq!(second.results.len(), 2);
        assert_eq!(coordinator.metrics().snapshot().attempts(), 3);
    }
}
