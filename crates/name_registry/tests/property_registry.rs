use ippan_name_registry::{
    compute_commitment, CallContext, DomainName, ErrorKind, Identity, MemoryLedger, NameRegistry,
    RegistryConfig,
};
use proptest::prelude::*;
use std::sync::Arc;

const OWNER: Identity = Identity([1u8; 32]);

fn registry_with_funds(accounts: &[Identity]) -> NameRegistry {
    let ledger = Arc::new(MemoryLedger::new());
    for account in accounts {
        ledger.credit(*account, u64::MAX / 2);
    }
    NameRegistry::in_memory(RegistryConfig::default(), ledger).unwrap()
}

fn claim(registry: &NameRegistry, name: &DomainName, salt: &[u8], now: u64) {
    let hash = compute_commitment(name, salt);
    registry
        .preorder(&CallContext::new(OWNER, now), hash, registry.registration_fee())
        .unwrap();
    registry
        .register(&CallContext::new(OWNER, now), name, salt)
        .unwrap();
}

fn valid_name() -> impl Strategy<Value = DomainName> {
    "[a-z0-9-]{3,63}".prop_map(DomainName::new)
}

proptest! {
    #[test]
    fn unpreordered_reveal_is_not_registered(
        name in valid_name(),
        salt in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let registry = registry_with_funds(&[OWNER]);
        let err = registry
            .register(&CallContext::new(OWNER, 1), &name, &salt)
            .unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::NotRegistered);
    }

    #[test]
    fn reveal_succeeds_exactly_once(
        name in valid_name(),
        salt in prop::collection::vec(any::<u8>(), 0..32),
        other_salt in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let registry = registry_with_funds(&[OWNER]);
        claim(&registry, &name, &salt, 10);

        let err = registry
            .register(&CallContext::new(OWNER, 11), &name, &other_salt)
            .unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::AlreadyRegistered);
    }

    #[test]
    fn non_owner_mutations_are_rejected_and_leave_domain_unchanged(
        intruder_byte in 2u8..=255,
        now in 0u64..52_560,
    ) {
        let intruder = Identity([intruder_byte; 32]);
        let registry = registry_with_funds(&[OWNER, intruder]);
        let name = DomainName::new("guarded");
        claim(&registry, &name, b"salt", 0);
        let before = registry.get_domain(&name).unwrap();
        let ctx = CallContext::new(intruder, now);

        let results = [
            registry.transfer(&ctx, &name, intruder),
            registry.renew(&ctx, &name),
            registry.set_resolver(&ctx, &name, Some(intruder)),
            registry.set_record(&ctx, &name, "k", "v"),
        ];
        for result in results {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::NotAuthorized);
        }
        prop_assert_eq!(registry.get_domain(&name).unwrap(), before);
        prop_assert!(registry.get_record(&name, "k").unwrap().is_none());
    }

    #[test]
    fn expiry_gates_everything_but_renew(
        registered_at in 0u64..1_000_000,
        overdue in 0u64..1_000_000,
    ) {
        let registry = registry_with_funds(&[OWNER]);
        let name = DomainName::new("gated");
        claim(&registry, &name, b"salt", registered_at);
        let expires_at = registry.get_expiration(&name).unwrap();
        let ctx = CallContext::new(OWNER, expires_at + overdue);

        prop_assert_eq!(
            registry.transfer(&ctx, &name, Identity([3u8; 32])).unwrap_err().kind(),
            ErrorKind::Expired
        );
        prop_assert_eq!(
            registry.set_resolver(&ctx, &name, None).unwrap_err().kind(),
            ErrorKind::Expired
        );
        prop_assert_eq!(
            registry.set_record(&ctx, &name, "k", "v").unwrap_err().kind(),
            ErrorKind::Expired
        );
        prop_assert!(registry.renew(&ctx, &name).is_ok());
    }

    #[test]
    fn renewal_extends_from_current_expiry(
        registered_at in 0u64..1_000_000,
        renew_at in 0u64..10_000_000,
    ) {
        let registry = registry_with_funds(&[OWNER]);
        let name = DomainName::new("renewed");
        claim(&registry, &name, b"salt", registered_at);
        let before = registry.get_expiration(&name).unwrap();

        registry.renew(&CallContext::new(OWNER, renew_at), &name).unwrap();
        prop_assert_eq!(registry.get_expiration(&name).unwrap(), before + 52_560);
    }

    #[test]
    fn out_of_bounds_names_are_invalid_with_or_without_preorder(
        short in "[a-z]{0,2}",
        long in "[a-z]{64,80}",
        preordered in any::<bool>(),
    ) {
        let registry = registry_with_funds(&[OWNER]);
        for raw in [short.clone(), long.clone()] {
            let name = DomainName::new(raw);
            if preordered {
                let hash = compute_commitment(&name, b"salt");
                registry
                    .preorder(&CallContext::new(OWNER, 0), hash, registry.registration_fee())
                    .unwrap();
            }
            let err = registry
                .register(&CallContext::new(OWNER, 1), &name, b"salt")
                .unwrap_err();
            prop_assert_eq!(err.kind(), ErrorKind::InvalidName);
        }
    }
}
