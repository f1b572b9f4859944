use jose_core::algorithm::{EncryptionMethod, JweAlgorithm, JwsAlgorithm, SignatureFamily};
use jose_core::encodings::{self, Payload};
use jose_core::jws::SigningKey;
use jose_core::validation::{HasExpiry, Time, Validate};
use jose_core::{
    JoseError, JweHeader, JwsHeader, Parameters, PlaintextJwt, SignedEncryptedJwt,
    SignedThenEncryptedJwt, Token, UnencryptedJwt, UnsignedJwt,
};
use jose_rustcrypto::{direct_handler, rsa_handler};
use jose_test::{
    Bool, Jwk, TestFile, TestKey, access_token_claims, read_test, rfc7517_rsa_key, second_rsa_key,
};
use libtest_mimic::{Arguments, Failed, Trial};
use serde::Deserialize;

fn main() {
    let args = Arguments::from_args();

    let mut tests = vec![];

    NestedTest::add_tests(&mut tests);
    for alg in [
        JwsAlgorithm::Hs256,
        JwsAlgorithm::Rs256,
        JwsAlgorithm::Ps384,
        JwsAlgorithm::Es512,
    ] {
        tests.push(Trial::test(format!("round-trip::{alg}"), move || {
            round_trip(alg)
        }));
        tests.push(Trial::test(format!("sign-then-encrypt::{alg}"), move || {
            sign_then_encrypt(alg)
        }));
    }
    tests.push(Trial::test("verify-before-decrypt", verify_before_decrypt));
    tests.push(Trial::test("token-kinds", token_kinds));
    tests.push(Trial::test("doubly-nested", doubly_nested));

    libtest_mimic::run(&args, tests).exit();
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
struct NestedTest {
    token: String,
    signing_key: Jwk,
    encryption_key: Jwk,
    #[serde(flatten)]
    result: TestResult,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum TestResult {
    #[serde(rename_all = "kebab-case")]
    Success {
        #[allow(dead_code)]
        expect_fail: Bool<false>,
        payload: serde_json::Value,
    },
    #[serde(rename_all = "kebab-case")]
    Failure {
        #[allow(dead_code)]
        expect_fail: Bool<true>,
        #[allow(dead_code)]
        comment: String,
    },
}

impl NestedTest {
    fn add_tests(tests: &mut Vec<Trial>) {
        let test_file: TestFile<Self> = read_test("nested.json");
        for test in test_file.tests {
            tests.push(Trial::test(test.name, || test.test_data.test()));
        }
    }

    fn test(self) -> Result<(), Failed> {
        let signing_key = self.signing_key.key()?;
        let content_key = self.encryption_key.content_key()?;

        match self.result {
            TestResult::Failure { .. } => {
                let Ok(jwt) = self.token.parse::<SignedEncryptedJwt>() else {
                    return Ok(());
                };
                if !jwt.verify(&signing_key) {
                    return Ok(());
                }
                let enc = jwt.encrypted().header().encryption_method()?;
                match jwt.decrypt(&direct_handler(enc)?, &content_key) {
                    Ok(_) => Err("decrypting token should fail".into()),
                    Err(_) => Ok(()),
                }
            }
            TestResult::Success { payload, .. } => {
                let Token::SignedEncrypted(jwt) = self.token.parse::<Token>()? else {
                    return Err("expected a nested token".into());
                };
                assert_eq!(jwt.header().content_type(), Some("JWT"));
                assert_eq!(jwt.to_string(), self.token);
                if !jwt.verify(&signing_key) {
                    return Err("token should verify".into());
                }

                let enc = jwt.encrypted().header().encryption_method()?;
                let claims = jwt.decrypt(&direct_handler(enc)?, &content_key)?;
                assert_eq!(serde_json::Value::Object(claims.get_all().clone()), payload);
                Ok(())
            }
        }
    }
}

/// Encrypt to an RSA key, then sign, then take it all apart again.
fn round_trip(alg: JwsAlgorithm) -> Result<(), Failed> {
    let signing_key = TestKey::for_algorithm(alg)?;
    let handler = rsa_handler(JweAlgorithm::RsaOaep256, EncryptionMethod::A256Gcm)?;
    let header = JweHeader::new(JweAlgorithm::RsaOaep256, EncryptionMethod::A256Gcm);

    let encrypted = UnencryptedJwt::new(header, access_token_claims())
        .encrypt(&handler, &rfc7517_rsa_key().public_key())?;
    let token = UnsignedJwt::new(JwsHeader::new(alg), encrypted.clone())
        .sign(&signing_key)?
        .to_string();

    let Token::SignedEncrypted(jwt) = token.parse::<Token>()? else {
        return Err("expected a nested token".into());
    };
    assert_eq!(jwt.header().algorithm()?, alg);
    assert_eq!(jwt.header().content_type(), Some("JWT"));
    assert_eq!(jwt.encrypted(), &encrypted);
    assert!(jwt.verify(&signing_key.verifier()));

    let claims = jwt.verify_and_decrypt(&signing_key.verifier(), &handler, rfc7517_rsa_key())?;
    Time::valid_now().then(HasExpiry).validate(&claims)?;
    assert_eq!(claims.subject(), Some("alice"));
    Ok(())
}

/// Sign, then encrypt the signed token to an RSA key.
fn sign_then_encrypt(alg: JwsAlgorithm) -> Result<(), Failed> {
    let signing_key = TestKey::for_algorithm(alg)?;
    let handler = rsa_handler(JweAlgorithm::RsaOaep, EncryptionMethod::A128CbcHs256)?;
    let header = JweHeader::new(JweAlgorithm::RsaOaep, EncryptionMethod::A128CbcHs256);

    let signed = UnsignedJwt::new(JwsHeader::new(alg), access_token_claims()).sign(&signing_key)?;
    let token = UnencryptedJwt::new(header, signed.clone())
        .encrypt(&handler, &rfc7517_rsa_key().public_key())?
        .to_string();
    assert_eq!(token.split('.').count(), 5);

    let Token::SignedThenEncrypted(jwe) = token.parse::<Token>()? else {
        return Err("expected a signed-then-encrypted token".into());
    };
    assert_eq!(jwe.header().content_type(), Some("JWT"));
    assert_eq!(jwe.to_string(), token);

    let jws = jwe.decrypt_and_verify(&handler, rfc7517_rsa_key(), &signing_key.verifier())?;
    assert_eq!(jws.to_string(), signed.to_string());
    assert_eq!(jws.header().algorithm()?, alg);
    let claims = jws.verify_and_validate(&signing_key.verifier(), &Time::valid_now())?;
    assert_eq!(claims.subject(), Some("alice"));

    // a key of the same family, but not the signer's
    let other = match alg.family() {
        SignatureFamily::RsaPkcs1 | SignatureFamily::RsaPss => {
            TestKey::RsaPublic(second_rsa_key().public_key())
        }
        _ => TestKey::for_algorithm(alg)?.verifier(),
    };
    assert!(matches!(
        jwe.decrypt_and_verify(&handler, rfc7517_rsa_key(), &other),
        Err(JoseError::VerificationFailed)
    ));
    Ok(())
}

/// The outer signature is checked before anything is decrypted.
fn verify_before_decrypt() -> Result<(), Failed> {
    let key = TestKey::for_algorithm(JwsAlgorithm::Hs256)?;
    let handler = direct_handler(EncryptionMethod::A128CbcHs256)?;
    let content_key = handler.content_encryption().generate_key()?;
    let header = JweHeader::new(JweAlgorithm::Dir, EncryptionMethod::A128CbcHs256);
    let encrypted =
        UnencryptedJwt::new(header, access_token_claims()).encrypt(&handler, &content_key)?;
    let jwt = UnsignedJwt::new(JwsHeader::new(JwsAlgorithm::Hs256), encrypted).sign(&key)?;

    let claims = jwt.verify_and_decrypt(&key, &handler, &content_key)?;
    assert_eq!(claims, jwt.decrypt(&handler, &content_key)?);
    assert_eq!(claims.subject(), Some("alice"));

    let other = TestKey::for_algorithm(JwsAlgorithm::Hs256)?;
    assert!(matches!(
        jwt.verify_and_decrypt(&other, &handler, &content_key),
        Err(JoseError::VerificationFailed)
    ));
    Ok(())
}

/// Every kind of token is told apart by its compact form alone.
fn token_kinds() -> Result<(), Failed> {
    let claims = access_token_claims();
    let key = TestKey::for_algorithm(JwsAlgorithm::Hs256)?;
    let handler = direct_handler(EncryptionMethod::A128CbcHs256)?;
    let content_key = handler.content_encryption().generate_key()?;
    let header = JweHeader::new(JweAlgorithm::Dir, EncryptionMethod::A128CbcHs256);
    let encrypted = UnencryptedJwt::new(header, claims.clone()).encrypt(&handler, &content_key)?;

    let plaintext = PlaintextJwt::new(claims.clone())?.to_string();
    let signed = UnsignedJwt::new(JwsHeader::new(JwsAlgorithm::Hs256), claims.clone()).sign(&key)?;
    let header = JweHeader::new(JweAlgorithm::Dir, EncryptionMethod::A128CbcHs256);
    let signed_then_encrypted = UnencryptedJwt::new(header, signed.clone())
        .encrypt(&handler, &content_key)?
        .to_string();
    let signed = signed.to_string();
    let nested = UnsignedJwt::new(JwsHeader::new(JwsAlgorithm::Hs256), encrypted.clone())
        .sign(&key)?
        .to_string();
    let encrypted = encrypted.to_string();

    for token in [&plaintext, &signed, &encrypted, &nested, &signed_then_encrypted] {
        let parsed: Token = token.parse()?;
        assert_eq!(&parsed.to_string(), token);

        let kind_matches = match parsed {
            Token::Plaintext(jwt) => token == &plaintext && jwt.claims() == &claims,
            Token::Signed(jwt) => token == &signed && jwt.verify(&key),
            Token::Encrypted(jwt) => {
                token == &encrypted && jwt.decrypt(&handler, &content_key)? == claims
            }
            Token::SignedEncrypted(jwt) => {
                token == &nested && jwt.decrypt(&handler, &content_key)? == claims
            }
            Token::SignedThenEncrypted(jwt) => {
                let jws = jwt.decrypt_and_verify(&handler, &content_key, &key)?;
                token == &signed_then_encrypted && jws.claims() == &claims
            }
        };
        assert!(kind_matches, "{token} was not recognised");
    }

    assert!("a.b".parse::<Token>().is_err());
    assert!("a.b.c.d".parse::<Token>().is_err());
    Ok(())
}

/// Only one level of nesting is supported.
fn doubly_nested() -> Result<(), Failed> {
    let key = TestKey::for_algorithm(JwsAlgorithm::Hs256)?;
    let handler = direct_handler(EncryptionMethod::A128Gcm)?;
    let content_key = handler.content_encryption().generate_key()?;
    let header = JweHeader::new(JweAlgorithm::Dir, EncryptionMethod::A128Gcm);
    let encrypted =
        UnencryptedJwt::new(header, access_token_claims()).encrypt(&handler, &content_key)?;
    let nested = UnsignedJwt::new(JwsHeader::new(JwsAlgorithm::Hs256), encrypted)
        .sign(&key)?
        .to_string();

    let mut header = JwsHeader::new(JwsAlgorithm::Hs256);
    header.set_content_type("JWT");
    let signing_input = format!(
        "{}.{}",
        header.encode()?,
        encodings::encode(nested.as_bytes())
    );
    let signature = key.sign(JwsAlgorithm::Hs256, signing_input.as_bytes())?;
    let token = format!("{signing_input}.{}", encodings::encode(&signature));

    assert!(token.parse::<Token>().is_err());
    assert!(token.parse::<SignedEncryptedJwt>().is_err());

    // the other way round: a JWE around a JWS that already holds a JWE
    let header = JweHeader::new(JweAlgorithm::Dir, EncryptionMethod::A128Gcm);
    let token = UnencryptedJwt::new(header, Compact(nested))
        .encrypt(&handler, &content_key)?
        .to_string();
    let Token::SignedThenEncrypted(jwe) = token.parse::<Token>()? else {
        return Err("expected a signed-then-encrypted token".into());
    };
    assert!(jwe.decrypt(&handler, &content_key).is_err());
    assert!(
        token
            .parse::<SignedThenEncryptedJwt>()?
            .decrypt(&handler, &content_key)
            .is_err()
    );
    Ok(())
}

/// Any compact token, carried as an opaque nested payload.
struct Compact(String);

impl Payload for Compact {
    const CONTENT_TYPE: Option<&'static str> = Some("JWT");

    fn encode(&self) -> Result<Vec<u8>, JoseError> {
        Ok(self.0.clone().into_bytes())
    }

    fn decode(payload: &[u8]) -> Result<Self, JoseError> {
        String::from_utf8(payload.to_vec())
            .map(Compact)
            .map_err(|_| JoseError::InvalidToken)
    }
}
