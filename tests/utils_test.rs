use goatmusic::error::AuthError;
use goatmusic::utils::*;

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier(128).unwrap();

    // Should be exactly the requested length
    assert_eq!(verifier.len(), 128);

    // Should only use the unreserved URL-safe characters
    assert!(
        verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
    );

    // Two generated verifiers should be different
    let verifier2 = generate_code_verifier(128).unwrap();
    assert_ne!(verifier, verifier2);
}

#[test]
fn test_generate_code_verifier_accepts_full_range() {
    for length in MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH {
        let verifier = generate_code_verifier(length).unwrap();
        assert_eq!(verifier.len(), length);

        // Challenge is stable for every valid verifier
        assert_eq!(
            generate_code_challenge(&verifier),
            generate_code_challenge(&verifier)
        );
    }
}

#[test]
fn test_generate_code_verifier_rejects_out_of_range() {
    for length in [0, 1, 42, 129, 256] {
        match generate_code_verifier(length) {
            Err(AuthError::InvalidParameter(_)) => {}
            other => panic!("length {length}: expected InvalidParameter, got {other:?}"),
        }
    }
}

#[test]
fn test_generate_code_challenge() {
    let verifier = "test_verifier_123";
    let challenge = generate_code_challenge(verifier);

    // Should not be empty
    assert!(!challenge.is_empty());

    // Should be deterministic - same input produces same output
    let challenge2 = generate_code_challenge(verifier);
    assert_eq!(challenge, challenge2);

    // Different input should produce different output
    let challenge3 = generate_code_challenge("different_verifier");
    assert_ne!(challenge, challenge3);

    // SHA-256 is 32 bytes, 43 characters without padding
    assert_eq!(challenge.len(), 43);
    assert!(
        challenge
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    );
}

#[test]
fn test_generate_code_challenge_known_vector() {
    // Appendix B of RFC 7636
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    assert_eq!(
        generate_code_challenge(verifier),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}

#[test]
fn test_generate_state() {
    let state = generate_state();
    assert_eq!(state.len(), 43);
    assert_ne!(state, generate_state());
}
