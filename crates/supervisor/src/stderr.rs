use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use fnhost_protocol::FailureReport;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStderr;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Collected {
	lines: VecDeque<String>,
	report: Option<FailureReport>,
}

/// Drains a bridge's stderr in the background, forwarding lines to
/// `tracing` and keeping the most recent ones.
pub(crate) struct StderrTail {
	collected: Arc<Mutex<Collected>>,
	task: Option<JoinHandle<()>>,
}

impl StderrTail {
	pub(crate) fn spawn(stderr: ChildStderr, label: String, capacity: usize) -> Self {
		let collected = Arc::new(Mutex::new(Collected::default()));
		let sink = collected.clone();

		let task = tokio::spawn(async move {
			let mut lines = BufReader::new(stderr).lines();
			loop {
				let line = match lines.next_line().await {
					Ok(Some(line)) => line,
					Ok(None) => break,
					Err(err) => {
						tracing::debug!(bridge = %label, error = %err, "bridge stderr closed");
						break;
					}
				};

				let report = FailureReport::parse(&line);
				match &report {
					Some(report) => tracing::warn!(bridge = %label, error_type = %report.error_type, "{}", report.error_message),
					None => tracing::debug!(target: "fnhost::bridge", bridge = %label, "{line}"),
				}

				let mut collected = sink.lock();
				if report.is_some() {
					collected.report = report;
				}
				collected.lines.push_back(line);
				while collected.lines.len() > capacity {
					collected.lines.pop_front();
				}
			}
		});

		Self {
			collected,
			task: Some(task),
		}
	}

	pub(crate) fn lines(&self) -> Vec<String> {
		self.collected.lock().lines.iter().cloned().collect()
	}

	/// Waits up to `grace` for stderr to reach end of stream, then returns
	/// the failure report and the kept lines.
	pub(crate) async fn finish(&mut self, grace: Duration) -> (Option<FailureReport>, Vec<String>) {
		if let Some(task) = self.task.take() {
			let _ = tokio::time::timeout(grace, task).await;
		}
		let collected = self.collected.lock();
		(collected.report.clone(), collected.lines.iter().cloned().collect())
	}
}

impl Drop for StderrTail {
	fn drop(&mut self) {
		if let Some(task) = self.task.take() {
			task.abort();
		}
	}
}
