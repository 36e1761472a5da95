use std::collections::HashMap;
use std::sync::{Arc, Weak};

use fnhost_protocol::InvocationRequest;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::{BridgeCommand, BridgeProcess, Invocation, Result, SupervisorConfig};

#[derive(Default)]
struct PoolState {
	idle: HashMap<String, Vec<BridgeProcess>>,
	/// Bumped by [`BridgePool::flush`]; processes checked out under an older
	/// generation are shut down on release.
	generation: u64,
}

/// A process checked out of a [`BridgePool`].
#[derive(Debug)]
pub struct PooledBridge {
	key: String,
	generation: u64,
	process: BridgeProcess,
}

impl PooledBridge {
	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn process(&mut self) -> &mut BridgeProcess {
		&mut self.process
	}
}

/// Bridge processes keyed by function.
///
/// An invocation takes an idle process for its key or spawns a new one when
/// all are busy, so concurrent invocations of one function run in separate
/// processes. Processes go back to the pool after answering; dead ones are
/// dropped.
pub struct BridgePool {
	config: SupervisorConfig,
	state: Mutex<PoolState>,
}

impl BridgePool {
	pub fn new(config: SupervisorConfig) -> Self {
		Self {
			config,
			state: Mutex::new(PoolState::default()),
		}
	}

	pub fn config(&self) -> &SupervisorConfig {
		&self.config
	}

	/// Runs one invocation on a pooled process for `key`.
	pub async fn invoke(&self, key: &str, command: &BridgeCommand, request: &InvocationRequest) -> Result<Invocation> {
		let mut bridge = self.acquire(key, command).await?;
		let limit = self.config.timeout_for(request);
		let result = bridge.process.invoke_with_timeout(request, limit).await;
		self.release(bridge).await;
		result
	}

	/// Checks out an idle live process for `key`, spawning one if none is
	/// available.
	pub async fn acquire(&self, key: &str, command: &BridgeCommand) -> Result<PooledBridge> {
		let (reused, generation) = {
			let mut state = self.state.lock();
			let generation = state.generation;
			let mut reused = None;
			if !self.config.reload_handler
				&& let Some(idle) = state.idle.get_mut(key)
			{
				while let Some(mut process) = idle.pop() {
					if process.is_alive() {
						reused = Some(process);
						break;
					}
					tracing::debug!(key, bridge = %process.label(), "dropping dead idle bridge");
				}
			}
			(reused, generation)
		};

		let process = match reused {
			Some(process) => process,
			None => BridgeProcess::spawn(command, &self.config).await?,
		};
		Ok(PooledBridge {
			key: key.to_owned(),
			generation,
			process,
		})
	}

	/// Returns a process to the pool. Dead processes are dropped; processes
	/// from before the last [`flush`](Self::flush), or any process when
	/// `reload_handler` is set, are shut down.
	pub async fn release(&self, bridge: PooledBridge) {
		let PooledBridge {
			key,
			generation,
			mut process,
		} = bridge;

		if !process.is_alive() {
			tracing::debug!(key, bridge = %process.label(), "not returning dead bridge to pool");
			return;
		}

		let retire = {
			let mut state = self.state.lock();
			if generation == state.generation && !self.config.reload_handler {
				state.idle.entry(key).or_default().push(process);
				None
			} else {
				Some(process)
			}
		};
		if let Some(process) = retire {
			process.shutdown().await;
		}
	}

	/// Shuts down processes that have been idle for at least
	/// [`SupervisorConfig::idle_time`]. Returns how many were reaped.
	pub async fn cleanup_idle(&self) -> usize {
		let limit = self.config.idle_time();
		let expired: Vec<BridgeProcess> = {
			let mut state = self.state.lock();
			let mut expired = Vec::new();
			for processes in state.idle.values_mut() {
				let (old, keep): (Vec<_>, Vec<_>) = processes.drain(..).partition(|p| p.idle_time() >= limit);
				*processes = keep;
				expired.extend(old);
			}
			state.idle.retain(|_, processes| !processes.is_empty());
			expired
		};

		let reaped = expired.len();
		for process in expired {
			process.shutdown().await;
		}
		if reaped > 0 {
			tracing::debug!(reaped, "reaped idle bridges");
		}
		reaped
	}

	/// Shuts down every idle process. Processes currently checked out are
	/// shut down when released.
	pub async fn flush(&self) -> usize {
		let drained: Vec<BridgeProcess> = {
			let mut state = self.state.lock();
			state.generation += 1;
			state.idle.drain().flat_map(|(_, processes)| processes).collect()
		};

		let count = drained.len();
		for process in drained {
			process.shutdown().await;
		}
		tracing::debug!(count, "flushed bridge pool");
		count
	}

	/// Number of idle processes for `key`.
	pub fn idle_count(&self, key: &str) -> usize {
		self.state.lock().idle.get(key).map_or(0, Vec::len)
	}

	/// Total number of idle processes.
	pub fn idle_total(&self) -> usize {
		self.state.lock().idle.values().map(Vec::len).sum()
	}

	/// Reaps idle processes every [`SupervisorConfig::idle_time`] until the
	/// pool is dropped.
	pub fn spawn_reaper(self: &Arc<Self>) -> JoinHandle<()> {
		let pool: Weak<Self> = Arc::downgrade(self);
		let period = self.config.idle_time().max(std::time::Duration::from_millis(10));
		tokio::spawn(async move {
			loop {
				tokio::time::sleep(period).await;
				let Some(pool) = pool.upgrade() else {
					break;
				};
				pool.cleanup_idle().await;
			}
		})
	}
}

impl std::fmt::Debug for BridgePool {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BridgePool")
			.field("config", &self.config)
			.field("idle", &self.idle_total())
			.finish()
	}
}
