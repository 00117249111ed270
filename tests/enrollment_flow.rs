//! End-to-end flows of the enrollment form controller

mod common;

use common::{InstantLookup, RecordingNotifier, RecordingService, ScriptedLookup, paulista, settled};
use enrollform::enrollment::{
	self, BIRTHDAY, CEP, CITY, CPF, NAME, NEIGHBORHOOD, NUMBER, PHONE, STATE, STREET,
};
use enrollform::{Address, Enrollment, FormController, SaveError, SubmitOutcome};
use serde_json::json;
use std::sync::Arc;

fn controller_with(
	service: Arc<RecordingService>,
	lookup: Arc<dyn enrollform::AddressLookup>,
	notifier: Arc<RecordingNotifier>,
) -> FormController {
	enrollment::personal_information_form(service, lookup, notifier)
		.expect("form wiring should succeed")
}

/// Types every non-address field the way a user would.
fn fill_personal_fields(controller: &FormController) {
	controller.handle_change(NAME, "Ana Souza");
	controller.handle_change(CPF, "12345678901");
	controller.handle_change(BIRTHDAY, "27-11-1990");
	controller.handle_change(PHONE, "21999998888");
	controller.handle_change(NUMBER, "1000");
}

fn fill_address_fields(controller: &FormController) {
	controller.handle_change(STATE, "SP");
	controller.handle_change(CITY, "São Paulo");
	controller.handle_change(STREET, "Avenida Paulista");
	controller.handle_change(NEIGHBORHOOD, "Bela Vista");
}

fn saved_entity() -> Enrollment {
	Enrollment {
		name: "Ana Souza".to_string(),
		cpf: "123.456.789-01".to_string(),
		birthday: "27-11-1990".to_string(),
		address: Address {
			cep: "01310-100".to_string(),
			street: "Avenida Paulista".to_string(),
			city: "São Paulo".to_string(),
			number: "1000".to_string(),
			state: "SP".to_string(),
			neighborhood: "Bela Vista".to_string(),
			address_detail: String::new(),
		},
		phone: "(21) 99999-8888".to_string(),
	}
}

#[tokio::test]
async fn happy_path_masks_resolves_and_persists() {
	let service = RecordingService::new();
	let notifier = RecordingNotifier::new();
	let controller = controller_with(
		Arc::clone(&service),
		InstantLookup::returning(paulista()),
		Arc::clone(&notifier),
	);

	fill_personal_fields(&controller);
	// typing the eighth digit completes the postal code and fires the lookup
	controller.handle_change(CEP, "01310100");
	settled(&controller).await;

	let view = controller.view();
	assert_eq!(view.data.get(STREET), Some(&json!("Avenida Paulista")));
	assert_eq!(view.data.get(STATE), Some(&json!("SP")));
	assert_eq!(view.data.get(CPF), Some(&json!("123.456.789-01")));
	assert_eq!(view.data.get(PHONE), Some(&json!("(21) 9999-98888")));

	match controller.handle_submit().await {
		SubmitOutcome::Saved => {}
		other => panic!("expected Saved, got {other:?}"),
	}

	assert_eq!(service.saved.lock().as_slice(), &[saved_entity()]);
	assert_eq!(notifier.successes.lock().as_slice(), &["Salvo com sucesso!".to_string()]);
	assert!(controller.errors().is_empty());

	// the saved entity re-seeded the form and locked the identity field
	let view = controller.view();
	assert!(view.disabled_identity_field);
	controller.handle_change(CPF, "00000000000");
	assert_eq!(controller.snapshot().get(CPF), Some(&json!("123.456.789-01")));
}

#[tokio::test]
async fn validation_errors_abort_the_submit() {
	let service = RecordingService::new();
	let notifier = RecordingNotifier::new();
	let (lookup, _senders) = ScriptedLookup::with_gates(0);
	let controller = controller_with(Arc::clone(&service), lookup, notifier);

	let outcome = controller.handle_submit().await;
	let errors = match outcome {
		SubmitOutcome::Invalid(errors) => errors,
		other => panic!("expected Invalid, got {other:?}"),
	};

	assert_eq!(errors.get(NAME).map(String::as_str), Some("Digite um nome válido"));
	assert_eq!(errors.get(CPF).map(String::as_str), Some("Digite um CPF válido"));
	assert!(service.saved.lock().is_empty());
	// the same errors are visible to the rendering layer
	assert_eq!(controller.view().errors, errors);
}

#[tokio::test]
async fn errors_are_recomputed_wholesale_on_each_submit() {
	let service = RecordingService::new();
	let notifier = RecordingNotifier::new();
	let (lookup, _senders) = ScriptedLookup::with_gates(0);
	let controller = controller_with(service, lookup, notifier);

	let first = match controller.handle_submit().await {
		SubmitOutcome::Invalid(errors) => errors,
		other => panic!("expected Invalid, got {other:?}"),
	};
	assert!(first.contains_key(NAME));

	controller.handle_change(NAME, "Ana Souza");
	let second = match controller.handle_submit().await {
		SubmitOutcome::Invalid(errors) => errors,
		other => panic!("expected Invalid, got {other:?}"),
	};
	// the fixed field carries no stale error
	assert!(!second.contains_key(NAME));
	assert!(second.contains_key(CPF));
}

#[tokio::test]
async fn submit_is_a_noop_while_a_lookup_is_pending() {
	let service = RecordingService::new();
	let notifier = RecordingNotifier::new();
	let (lookup, mut senders) = ScriptedLookup::with_gates(1);
	let controller = controller_with(Arc::clone(&service), lookup, notifier);

	fill_personal_fields(&controller);
	fill_address_fields(&controller);
	controller.handle_change(CEP, "01310100");
	assert!(controller.view().busy);

	let outcome = controller.handle_submit().await;
	assert!(matches!(outcome, SubmitOutcome::Blocked));
	assert!(service.saved.lock().is_empty());

	senders.remove(0).send(Ok(paulista())).unwrap();
	settled(&controller).await;

	let outcome = controller.handle_submit().await;
	assert!(matches!(outcome, SubmitOutcome::Saved));
	assert_eq!(service.saved.lock().len(), 1);
}

#[tokio::test]
async fn second_submit_is_a_noop_while_the_first_is_in_flight() {
	let (service, release, entered) = RecordingService::gated();
	let notifier = RecordingNotifier::new();
	let controller = Arc::new(controller_with(
		Arc::clone(&service),
		InstantLookup::returning(paulista()),
		notifier,
	));

	fill_personal_fields(&controller);
	controller.handle_change(CEP, "01310100");
	settled(&controller).await;

	let first = tokio::spawn({
		let controller = Arc::clone(&controller);
		async move { controller.handle_submit().await }
	});
	entered.await.expect("first submit never reached the service");

	// not queued: the second attempt returns immediately
	let outcome = controller.handle_submit().await;
	assert!(matches!(outcome, SubmitOutcome::Blocked));

	release.send(()).unwrap();
	let outcome = first.await.unwrap();
	assert!(matches!(outcome, SubmitOutcome::Saved));
	assert_eq!(service.saved.lock().len(), 1);
}

#[tokio::test]
async fn conflict_surfaces_the_backend_message_and_leaves_the_form_editable() {
	let service = RecordingService::failing(SaveError::Conflict {
		message: "Já existe uma inscrição para este CPF".to_string(),
	});
	let notifier = RecordingNotifier::new();
	let controller = controller_with(
		service,
		InstantLookup::returning(paulista()),
		Arc::clone(&notifier),
	);

	fill_personal_fields(&controller);
	controller.handle_change(CEP, "01310100");
	settled(&controller).await;

	let outcome = controller.handle_submit().await;
	assert!(matches!(outcome, SubmitOutcome::Failed(SaveError::Conflict { .. })));
	assert_eq!(
		notifier.errors.lock().as_slice(),
		&["Já existe uma inscrição para este CPF".to_string()]
	);

	// no re-seed happened: the identity field stays editable
	let view = controller.view();
	assert!(!view.disabled_identity_field);
	controller.handle_change(NAME, "Bia");
	assert_eq!(controller.snapshot().get(NAME), Some(&json!("Bia")));
}

#[tokio::test]
async fn detailed_rejection_surfaces_each_message_individually() {
	let service = RecordingService::failing(SaveError::Rejected {
		details: vec!["Telefone inválido".to_string(), "CEP inexistente".to_string()],
	});
	let notifier = RecordingNotifier::new();
	let controller = controller_with(
		service,
		InstantLookup::returning(paulista()),
		Arc::clone(&notifier),
	);

	fill_personal_fields(&controller);
	controller.handle_change(CEP, "01310100");
	settled(&controller).await;

	let outcome = controller.handle_submit().await;
	assert!(matches!(outcome, SubmitOutcome::Failed(SaveError::Rejected { .. })));
	assert_eq!(
		notifier.errors.lock().as_slice(),
		&["Telefone inválido".to_string(), "CEP inexistente".to_string()]
	);
}

#[tokio::test]
async fn unknown_failure_surfaces_the_generic_message() {
	let service = RecordingService::failing(SaveError::Other(anyhow::anyhow!("socket closed")));
	let notifier = RecordingNotifier::new();
	let controller = controller_with(
		service,
		InstantLookup::returning(paulista()),
		Arc::clone(&notifier),
	);

	fill_personal_fields(&controller);
	controller.handle_change(CEP, "01310100");
	settled(&controller).await;

	let outcome = controller.handle_submit().await;
	assert!(matches!(outcome, SubmitOutcome::Failed(SaveError::Other(_))));
	assert_eq!(notifier.errors.lock().as_slice(), &["Não foi possível".to_string()]);
}

#[tokio::test]
async fn loading_an_entity_seeds_the_form_and_locks_the_identity_field() {
	let service = RecordingService::new();
	let notifier = RecordingNotifier::new();
	let (lookup, _senders) = ScriptedLookup::with_gates(0);
	let controller = controller_with(service, lookup, notifier);

	let entity = saved_entity();
	controller.on_entity_loaded(entity.clone());

	let view = controller.view();
	assert!(view.disabled_identity_field);
	assert_eq!(view.data.get(CPF), Some(&json!("123.456.789-01")));
	assert_eq!(view.data.get(STREET), Some(&json!("Avenida Paulista")));

	// edits to the identity key after creation are never permitted
	controller.handle_change(CPF, "00000000000");
	assert_eq!(controller.snapshot().get(CPF), Some(&json!("123.456.789-01")));
}

#[tokio::test]
async fn reloading_the_same_entity_does_not_clobber_edits() {
	let service = RecordingService::new();
	let notifier = RecordingNotifier::new();
	let (lookup, _senders) = ScriptedLookup::with_gates(0);
	let controller = controller_with(service, lookup, notifier);

	let entity = saved_entity();
	controller.on_entity_loaded(entity.clone());
	controller.handle_change(NAME, "Ana Maria Souza");

	// same entity value delivered again: reset must not re-run
	controller.on_entity_loaded(entity);
	assert_eq!(controller.snapshot().get(NAME), Some(&json!("Ana Maria Souza")));

	// a genuinely different entity does re-seed
	let mut updated = saved_entity();
	updated.name = "Outro Nome".to_string();
	controller.on_entity_loaded(updated);
	assert_eq!(controller.snapshot().get(NAME), Some(&json!("Outro Nome")));
}
