//! Shared collaborator doubles for the integration suites
#![allow(dead_code)]

use async_trait::async_trait;
use enrollform::{
	AddressLookup, AddressRecord, Enrollment, EnrollmentService, FormController, LookupResult,
	Notifier, SaveError, SaveResult,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Persistence double: records every saved entity, can fail once with a
/// scripted error, and can hold the save open behind a gate.
pub struct RecordingService {
	pub saved: Mutex<Vec<Enrollment>>,
	fail_with: Mutex<Option<SaveError>>,
	gate: Mutex<Option<oneshot::Receiver<()>>>,
	entered: Mutex<Option<oneshot::Sender<()>>>,
}

impl RecordingService {
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			saved: Mutex::new(Vec::new()),
			fail_with: Mutex::new(None),
			gate: Mutex::new(None),
			entered: Mutex::new(None),
		})
	}

	/// The next save call fails with `error`.
	pub fn failing(error: SaveError) -> Arc<Self> {
		let service = Self::new();
		*service.fail_with.lock() = Some(error);
		service
	}

	/// The next save call blocks until the returned sender fires; the
	/// returned receiver resolves once the save has been entered.
	pub fn gated() -> (Arc<Self>, oneshot::Sender<()>, oneshot::Receiver<()>) {
		let service = Self::new();
		let (release_tx, release_rx) = oneshot::channel();
		let (entered_tx, entered_rx) = oneshot::channel();
		*service.gate.lock() = Some(release_rx);
		*service.entered.lock() = Some(entered_tx);
		(service, release_tx, entered_rx)
	}
}

#[async_trait]
impl EnrollmentService for RecordingService {
	async fn save(&self, enrollment: &Enrollment) -> SaveResult<()> {
		if let Some(entered) = self.entered.lock().take() {
			let _ = entered.send(());
		}
		let gate = self.gate.lock().take();
		if let Some(gate) = gate {
			let _ = gate.await;
		}
		if let Some(error) = self.fail_with.lock().take() {
			return Err(error);
		}
		self.saved.lock().push(enrollment.clone());
		Ok(())
	}
}

/// Lookup double whose responses the test releases explicitly, in any order.
pub struct ScriptedLookup {
	gates: Mutex<VecDeque<oneshot::Receiver<LookupResult<AddressRecord>>>>,
}

impl ScriptedLookup {
	pub fn with_gates(
		count: usize,
	) -> (Arc<Self>, Vec<oneshot::Sender<LookupResult<AddressRecord>>>) {
		let mut senders = Vec::with_capacity(count);
		let mut receivers = VecDeque::with_capacity(count);
		for _ in 0..count {
			let (tx, rx) = oneshot::channel();
			senders.push(tx);
			receivers.push_back(rx);
		}
		(
			Arc::new(Self {
				gates: Mutex::new(receivers),
			}),
			senders,
		)
	}
}

#[async_trait]
impl AddressLookup for ScriptedLookup {
	async fn get_address(&self, _cep: &str) -> LookupResult<AddressRecord> {
		let gate = self
			.gates
			.lock()
			.pop_front()
			.expect("unexpected lookup call");
		gate.await.expect("test dropped the response gate")
	}
}

/// Lookup double that resolves immediately with a fixed record.
pub struct InstantLookup {
	pub record: AddressRecord,
}

impl InstantLookup {
	pub fn returning(record: AddressRecord) -> Arc<Self> {
		Arc::new(Self { record })
	}
}

#[async_trait]
impl AddressLookup for InstantLookup {
	async fn get_address(&self, _cep: &str) -> LookupResult<AddressRecord> {
		Ok(self.record.clone())
	}
}

/// Notification double recording every delivered message.
pub struct RecordingNotifier {
	pub successes: Mutex<Vec<String>>,
	pub errors: Mutex<Vec<String>>,
}

impl RecordingNotifier {
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			successes: Mutex::new(Vec::new()),
			errors: Mutex::new(Vec::new()),
		})
	}
}

impl Notifier for RecordingNotifier {
	fn success(&self, message: &str) {
		self.successes.lock().push(message.to_string());
	}

	fn error(&self, message: &str) {
		self.errors.lock().push(message.to_string());
	}
}

pub fn paulista() -> AddressRecord {
	AddressRecord {
		logradouro: "Avenida Paulista".to_string(),
		localidade: "São Paulo".to_string(),
		bairro: "Bela Vista".to_string(),
		uf: "SP".to_string(),
	}
}

/// Waits for the controller's outstanding lookup to settle.
///
/// On the current-thread test runtime, yielding drives the spawned
/// resolution task; the timeout turns a lookup that never settles into a
/// test failure instead of a hang.
pub async fn settled(controller: &FormController) {
	tokio::time::timeout(Duration::from_secs(5), async {
		while controller.busy() {
			tokio::task::yield_now().await;
		}
	})
	.await
	.expect("dependent lookup never settled");
}

/// Lets already-woken background tasks run to completion.
pub async fn drain_tasks() {
	for _ in 0..50 {
		tokio::task::yield_now().await;
	}
}
