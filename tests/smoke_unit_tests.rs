//! Smoke unit tests spanning the crate's modules
//!
//! These exercise each component in isolation from the persistence layer,
//! mostly along the happy path; the integration scenarios and property tests
//! carry the heavier coverage.

use cdt_lifecycle::{
    engine::{Command, EditPatch, LifecycleEngine},
    error::LifecycleError,
    request::{Actor, CdtRequest, RequestState, Role},
    utils::new_prefixed_id,
    validation::{parse_amount, parse_term, validate_amount, validate_term},
};

mod utils_tests {
    use super::*;

    /// Generated ids carry the human-readable prefix and a substantial
    /// encoded payload.
    #[test]
    fn generates_prefixed_ids() {
        let id = new_prefixed_id("cdt").unwrap();
        assert!(id.starts_with("cdt1"));
        assert!(id.len() > 10);
    }

    #[test]
    fn rejects_empty_prefix() {
        assert!(new_prefixed_id("").is_err());
    }

    #[test]
    fn ids_are_unique() {
        let a = new_prefixed_id("cdt").unwrap();
        let b = new_prefixed_id("cdt").unwrap();
        assert_ne!(a, b);
    }
}

mod validation_tests {
    use super::*;

    #[test]
    fn amount_minimum_is_inclusive() {
        assert!(validate_amount(10_000, 10_000).is_ok());
        assert!(matches!(
            validate_amount(9_999, 10_000),
            Err(LifecycleError::AmountTooLow { .. })
        ));
    }

    #[test]
    fn term_range_is_inclusive() {
        for term in [1, 12, 60] {
            assert!(validate_term(term, 1, 60).is_ok());
        }
        for term in [0, 61, 120] {
            assert!(matches!(
                validate_term(term, 1, 60),
                Err(LifecycleError::TermOutOfRange { .. })
            ));
        }
    }

    /// Form fields arrive as text; only whole base-10 numbers get through.
    #[test]
    fn form_text_coercion() {
        assert_eq!(parse_amount("300000").unwrap(), 300_000);
        assert_eq!(parse_term("12").unwrap(), 12);
        assert_eq!(parse_term("  6  ").unwrap(), 6);

        for bad in ["12.5", "10,000", "1e6", "dos", ""] {
            assert!(matches!(
                parse_amount(bad),
                Err(LifecycleError::MalformedNumber { field: "amount", .. })
            ));
        }
        assert!(matches!(
            parse_term("1.5"),
            Err(LifecycleError::MalformedNumber { field: "term_months", .. })
        ));
    }
}

mod engine_tests {
    use super::*;

    fn draft() -> (LifecycleEngine, CdtRequest, Actor) {
        let engine = LifecycleEngine::default();
        let owner = Actor::customer("user_owner");
        let request = engine.create("cdt_smoke", &owner, 300_000, 12).unwrap();
        (engine, request, owner)
    }

    #[test]
    fn submit_moves_a_draft_to_review() {
        let (engine, mut request, owner) = draft();
        let before_update = request.updated_at().clone();

        engine.submit(&mut request, &owner).unwrap();

        assert_eq!(request.state(), RequestState::PendingReview);
        assert!(request.updated_at() >= &before_update);
        assert_eq!(request.history().len(), 2);
        assert_eq!(request.history().last().unwrap().action, "submit");
    }

    #[test]
    fn strangers_cannot_touch_the_request() {
        let (engine, mut request, _) = draft();
        let stranger = Actor::customer("user_other");

        let err = engine.submit(&mut request, &stranger).unwrap_err();
        assert!(matches!(err, LifecycleError::Unauthorized { .. }));

        let err = engine
            .edit(&mut request, &stranger, &EditPatch::default())
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Unauthorized { .. }));

        assert_eq!(request.state(), RequestState::Draft);
        assert_eq!(request.history().len(), 1);
    }

    #[test]
    fn customers_cannot_review() {
        let (engine, mut request, owner) = draft();
        engine.submit(&mut request, &owner).unwrap();

        let err = engine.approve(&mut request, &owner).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Unauthorized {
                command: Command::Approve,
                ..
            }
        ));
        let err = engine.reject(&mut request, &owner, "because").unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Unauthorized {
                command: Command::Reject,
                ..
            }
        ));
    }

    #[test]
    fn approval_assigns_the_quoted_rate() {
        let (engine, mut request, owner) = draft();
        let agent = Actor::agent("agent_1");

        engine.submit(&mut request, &owner).unwrap();
        engine.approve(&mut request, &agent).unwrap();

        assert_eq!(request.state(), RequestState::Approved);
        assert_eq!(
            request.interest_rate(),
            Some(engine.quoted_rate(300_000, 12))
        );
        let entry = request.history().last().unwrap();
        assert_eq!(entry.actor_role, Role::Agent);
        assert_eq!(entry.action, "approve");
    }

    #[test]
    fn history_entries_carry_the_actor() {
        let (engine, mut request, owner) = draft();
        engine
            .cancel(&mut request, &owner, Some("ya no lo necesito"))
            .unwrap();

        let entry = request.history().last().unwrap();
        assert_eq!(entry.actor_id, "user_owner");
        assert_eq!(entry.actor_role, Role::Customer);
        assert_eq!(entry.detail.as_deref(), Some("ya no lo necesito"));
    }
}

mod request_tests {
    use super::*;

    /// Persisted requests must round-trip through CBOR unchanged, history
    /// and all.
    #[test]
    fn cbor_roundtrip() {
        let engine = LifecycleEngine::default();
        let owner = Actor::customer("user_owner");
        let agent = Actor::agent("agent_1");

        let mut request = engine.create("cdt_roundtrip", &owner, 750_000, 36).unwrap();
        engine.submit(&mut request, &owner).unwrap();
        engine.reject(&mut request, &agent, "saldo insuficiente").unwrap();

        let encoded = minicbor::to_vec(&request).unwrap();
        let decoded: CdtRequest = minicbor::decode(&encoded).unwrap();

        assert_eq!(request, decoded);
        assert_eq!(decoded.history().len(), 3);
        assert_eq!(decoded.rejection_reason(), Some("saldo insuficiente"));
    }
}
