use std::collections::{HashMap, HashSet};

use spotexp::{error::AuthError, pkce::*};
use url::Url;

fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

#[test]
fn test_code_challenge_rfc7636_vector() {
    // RFC 7636, appendix B
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    assert_eq!(
        code_challenge(verifier),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );

    let params = PkceParams::from_verifier(verifier).unwrap();
    assert_eq!(params.challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
}

#[test]
fn test_generated_verifier_shape() {
    for _ in 0..20 {
        let params = PkceParams::generate();
        let verifier = params.verifier();

        assert!((MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&verifier.len()));
        assert!(verifier.chars().all(is_unreserved));
        assert!(is_valid_verifier(verifier));

        // Challenge is base64url of a SHA-256 digest, no padding
        assert_eq!(params.challenge().len(), 43);
        assert!(!params.challenge().contains('='));
        assert_eq!(params.challenge(), code_challenge(verifier));
    }
}

#[test]
fn test_generated_verifiers_are_unique() {
    let verifiers: HashSet<String> = (0..50)
        .map(|_| PkceParams::generate().verifier().to_string())
        .collect();
    assert_eq!(verifiers.len(), 50);
}

#[test]
fn test_from_verifier_rejects_invalid_verifiers() {
    assert!(PkceParams::from_verifier("short").is_none());
    assert!(PkceParams::from_verifier("a".repeat(129)).is_none());
    assert!(PkceParams::from_verifier(format!("{}+", "a".repeat(50))).is_none());
    assert!(PkceParams::from_verifier("a".repeat(43)).is_some());
    assert!(PkceParams::from_verifier("a".repeat(128)).is_some());
}

#[test]
fn test_generate_state() {
    let state = generate_state();
    assert_eq!(state.len(), 43);
    assert!(state.chars().all(is_unreserved));
    assert_ne!(state, generate_state());
}

#[test]
fn test_build_authorization_url_round_trip() {
    let endpoint = Url::parse("https://accounts.spotify.com/authorize").unwrap();
    let params = PkceParams::generate();
    let state = generate_state();

    let url = build_authorization_url(
        &endpoint,
        "abc",
        "http://localhost:8080/callback",
        "user-read-email   playlist-read-private",
        params.challenge(),
        &state,
    );

    assert_eq!(url.host_str(), Some("accounts.spotify.com"));
    assert_eq!(url.path(), "/authorize");

    let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
    assert_eq!(
        keys,
        [
            "response_type",
            "client_id",
            "scope",
            "redirect_uri",
            "state",
            "code_challenge_method",
            "code_challenge"
        ]
    );

    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(query["response_type"], "code");
    assert_eq!(query["client_id"], "abc");
    assert_eq!(query["scope"], "user-read-email playlist-read-private");
    assert_eq!(query["redirect_uri"], "http://localhost:8080/callback");
    assert_eq!(query["state"], state);
    assert_eq!(query["code_challenge_method"], "S256");
    assert_eq!(query["code_challenge"], params.challenge());
    assert!(!url.as_str().contains(params.verifier()));
}

#[test]
fn test_parse_redirect_success() {
    let response =
        parse_redirect("http://localhost:8080/callback?code=AQD123&state=xyz").unwrap();
    assert_eq!(response.code, "AQD123");
    assert_eq!(response.state, "xyz");
}

#[test]
fn test_parse_redirect_missing_code() {
    let err = parse_redirect("http://localhost:8080/callback?state=xyz").unwrap_err();
    assert!(matches!(err, AuthError::MissingCode));

    // Empty values count as missing
    let err = parse_redirect("http://localhost:8080/callback?code=&state=xyz").unwrap_err();
    assert!(matches!(err, AuthError::MissingCode));
}

#[test]
fn test_parse_redirect_missing_state() {
    let err = parse_redirect("http://localhost:8080/callback?code=AQD123").unwrap_err();
    assert!(matches!(err, AuthError::MissingState));
}

#[test]
fn test_parse_redirect_remote_error() {
    let err = parse_redirect("http://localhost:8080/callback?error=access_denied&state=xyz")
        .unwrap_err();
    match err {
        AuthError::RemoteAuth { error, description } => {
            assert_eq!(error, "access_denied");
            assert_eq!(description, "access_denied");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = parse_redirect(
        "http://localhost:8080/callback?error=invalid_scope&error_description=bad+scope",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        AuthError::RemoteAuth { ref description, .. } if description == "bad scope"
    ));
}

#[test]
fn test_parse_redirect_garbage() {
    let err = parse_redirect("not a url").unwrap_err();
    assert!(matches!(err, AuthError::InvalidRedirectUrl(_)));
}
