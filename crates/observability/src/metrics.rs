//! 发送指标收集模块
//!
//! 基于 DispatchReport 收集和统计消息发送的运行指标。

use std::collections::BTreeMap;

use contracts::{DispatchOutcome, DispatchReport, DispatchStatus};
use metrics::{counter, gauge, histogram};

/// 从 DispatchReport 记录一轮发送的指标
///
/// 单条发送的计数与延迟由 `DispatchCoordinator` 在发送时记录，
/// 这里只记录整轮结果。
///
/// # Example
///
/// ```ignore
/// let report = coordinator.dispatch(&dataset, &bindings, &message).await?;
/// observability::record_dispatch_report(&report);
/// ```
pub fn record_dispatch_report(report: &DispatchReport) {
    let outcome = outcome_label(&report.outcome);
    counter!("rowcast_dispatch_runs_total", "outcome" => outcome).increment(1);

    let summary = &report.summary;
    gauge!("rowcast_last_run_sent").set(summary.success_count as f64);
    gauge!("rowcast_last_run_failed").set(summary.fail_count as f64);
    gauge!("rowcast_last_run_skipped").set(summary.skipped_count as f64);

    let duration = report.finished_at - report.started_at;
    if let Some(micros) = duration.num_microseconds() {
        histogram!("rowcast_dispatch_run_duration_ms").record(micros as f64 / 1000.0);
    }
}

/// 记录上传数据集的规模
pub fn record_upload(source_kind: &str, total_rows: usize, file_size: u64) {
    counter!("rowcast_uploads_total", "kind" => source_kind.to_string()).increment(1);
    histogram!("rowcast_upload_rows").record(total_rows as f64);
    histogram!("rowcast_upload_bytes").record(file_size as f64);
}

/// 记录过滤结果行数
pub fn record_filter_selectivity(total_rows: usize, matched_rows: usize) {
    gauge!("rowcast_last_filter_matched").set(matched_rows as f64);
    if total_rows > 0 {
        histogram!("rowcast_filter_selectivity").record(matched_rows as f64 / total_rows as f64);
    }
}

fn outcome_label(outcome: &DispatchOutcome) -> &'static str {
    match outcome {
        DispatchOutcome::Success => "success",
        DispatchOutcome::Failed(class) => class.as_str(),
    }
}

/// 发送指标聚合器
///
/// 在内存中聚合多轮发送，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchMetricsAggregator {
    /// 发送轮数
    pub runs: u64,

    /// 发送成功条数
    pub total_sent: u64,

    /// 发送失败条数
    pub total_failed: u64,

    /// 因电话为空跳过的行数
    pub total_skipped: u64,

    /// 单条发送延迟统计 (毫秒)
    pub latency_stats: RunningStats,

    /// 各结果类别的轮数
    pub outcome_counts: BTreeMap<String, u64>,
}

impl DispatchMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, report: &DispatchReport) {
        self.runs += 1;
        self.total_sent += report.count(DispatchStatus::Sent) as u64;
        self.total_failed += report.count(DispatchStatus::Failed) as u64;
        self.total_skipped += report.summary.skipped_count as u64;

        for latency in report.results.iter().filter_map(|r| r.latency_ms) {
            self.latency_stats.push(latency);
        }

        *self
            .outcome_counts
            .entry(outcome_label(&report.outcome).to_string())
            .or_insert(0) += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DispatchMetricsSummary {
        let attempted = self.total_sent + self.total_failed;
        DispatchMetricsSummary {
            runs: self.runs,
            total_sent: self.total_sent,
            total_failed: self.total_failed,
            total_skipped: self.total_skipped,
            failure_rate: if attempted > 0 {
                self.total_failed as f64 / attempted as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: StatsSummary::from(&self.latency_stats),
            outcome_counts: self.outcome_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct DispatchMetricsSummary {
    pub runs: u64,
    pub total_sent: u64,
    pub total_failed: u64,
    pub total_skipped: u64,
    pub failure_rate: f64,
    pub latency_ms: StatsSummary,
    pub outcome_counts: BTreeMap<String, u64>,
}

impl std::fmt::Display for DispatchMetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Metrics Summary ===")?;
        writeln!(f, "Runs: {}", self.runs)?;
        writeln!(f, "Sent: {}", self.total_sent)?;
        writeln!(
            f,
            "Failed: {} ({:.2}%)",
            self.total_failed, self.failure_rate
        )?;
        writeln!(f, "Skipped (blank phone): {}", self.total_skipped)?;
        writeln!(f, "Send latency (ms): {}", self.latency_ms)?;

        if !self.outcome_counts.is_empty() {
            writeln!(f, "Outcomes:")?;
            for (outcome, count) in &self.outcome_counts {
                writeln!(f, "  {}: {}", outcome, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
