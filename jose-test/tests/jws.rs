use jiff::Timestamp;
use jose_core::algorithm::JwsAlgorithm;
use jose_core::validation::{ForAudience, HasExpiry, Time, Validate};
use jose_core::{ClaimsSet, JoseError, JwsHeader, Parameters, SignedJwt, UnsignedJwt};
use jose_test::{Bool, Jwk, TestFile, TestKey, access_token_claims, read_test};
use libtest_mimic::{Arguments, Failed, Trial};
use serde::Deserialize;

fn main() {
    let args = Arguments::from_args();

    let mut tests = vec![];

    JwsTest::add_tests(&mut tests);
    add_algorithm_tests(&mut tests);
    tests.push(Trial::test("rfc7515-a1-hs256::expired", rfc7515_expired));

    libtest_mimic::run(&args, tests).exit();
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "kebab-case")]
struct JwsTest {
    token: String,
    key: Jwk,
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
        reproducible: bool,
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

impl JwsTest {
    fn add_tests(tests: &mut Vec<Trial>) {
        let test_file: TestFile<Self> = read_test("jws.json");
        for test in test_file.tests {
            tests.push(Trial::test(test.name, || test.test_data.test()));
        }
    }

    fn test(self) -> Result<(), Failed> {
        match self.result {
            TestResult::Failure { .. } => {
                let Ok(key) = self.key.key() else {
                    return Ok(());
                };
                match SignedJwt::<ClaimsSet>::verify_str(&self.token, &key) {
                    true => Err("verifying token should fail".into()),
                    false => Ok(()),
                }
            }
            TestResult::Success {
                reproducible,
                payload,
                ..
            } => {
                let key = self.key.key()?;
                let jwt: SignedJwt = self.token.parse()?;
                if !jwt.verify(&key) {
                    return Err("token should verify".into());
                }
                assert_eq!(
                    serde_json::Value::Object(jwt.claims().get_all().clone()),
                    payload
                );
                assert_eq!(jwt.to_string(), self.token);

                let unsigned = UnsignedJwt::new(jwt.header().clone(), jwt.claims().clone());
                if reproducible {
                    assert_eq!(unsigned.clone().sign(&key)?.to_string(), self.token);
                }
                if key.can_sign() {
                    let token = unsigned.sign(&key)?.to_string();
                    assert!(SignedJwt::<ClaimsSet>::verify_str(&token, &key.verifier()));
                }
                Ok(())
            }
        }
    }
}

fn add_algorithm_tests(tests: &mut Vec<Trial>) {
    for &alg in JwsAlgorithm::ALL {
        if alg == JwsAlgorithm::None {
            continue;
        }
        tests.push(Trial::test(format!("sign-and-validate::{alg}"), move || {
            sign_and_validate(alg)
        }));
        tests.push(Trial::test(format!("header-swapped::{alg}"), move || {
            header_swapped(alg)
        }));
    }
}

fn sign_and_validate(alg: JwsAlgorithm) -> Result<(), Failed> {
    let key = TestKey::for_algorithm(alg)?;
    let token = UnsignedJwt::new(JwsHeader::new(alg), access_token_claims())
        .sign(&key)?
        .to_string();

    let jwt: SignedJwt = token.parse()?;
    assert_eq!(jwt.header().algorithm()?, alg);
    assert_eq!(jwt.header().token_type(), Some("JWT"));

    let validation = Time::valid_now().then(HasExpiry).then(ForAudience("api"));
    let claims = jwt.verify_and_validate(&key.verifier(), &validation)?;
    assert_eq!(claims.subject(), Some("alice"));

    let wrong_audience = Time::valid_now().then(ForAudience("billing"));
    assert!(matches!(
        jwt.verify_and_validate(&key.verifier(), &wrong_audience),
        Err(JoseError::ClaimsError)
    ));

    // a key of the same family, but not the signer's
    let other = match alg {
        JwsAlgorithm::Rs256
        | JwsAlgorithm::Rs384
        | JwsAlgorithm::Rs512
        | JwsAlgorithm::Ps256
        | JwsAlgorithm::Ps384
        | JwsAlgorithm::Ps512 => TestKey::RsaPublic(jose_test::second_rsa_key().public_key()),
        _ => TestKey::for_algorithm(alg)?.verifier(),
    };
    assert!(matches!(
        jwt.verify_and_validate(&other, &validation),
        Err(JoseError::VerificationFailed)
    ));
    Ok(())
}

/// The signature must not verify once the header names another algorithm.
fn header_swapped(alg: JwsAlgorithm) -> Result<(), Failed> {
    let key = TestKey::for_algorithm(alg)?;
    let token = UnsignedJwt::new(JwsHeader::new(alg), access_token_claims())
        .sign(&key)?
        .to_string();
    let (_, rest) = token.split_once('.').ok_or("token has no header")?;

    for &swapped in JwsAlgorithm::ALL {
        if swapped == alg || swapped == JwsAlgorithm::None {
            continue;
        }
        let forged = format!("{}.{rest}", JwsHeader::new(swapped).encode()?);
        if SignedJwt::<ClaimsSet>::verify_str(&forged, &key.verifier()) {
            return Err(format!("{alg} signature verified as {swapped}").into());
        }
    }
    Ok(())
}

fn rfc7515_expired() -> Result<(), Failed> {
    let test_file: TestFile<JwsTest> = read_test("jws.json");
    let test = test_file
        .tests
        .into_iter()
        .find(|test| test.name == "rfc7515-a1-hs256")
        .ok_or("missing vector")?;
    let key = test.test_data.key.key()?;
    let jwt: SignedJwt = test.test_data.token.parse()?;

    assert!(matches!(
        jwt.verify_and_validate(&key, &Time::valid_now()),
        Err(JoseError::ClaimsError)
    ));

    let before_expiry = Timestamp::from_second(1300819300)?;
    let claims = jwt.verify_and_validate(&key, &Time::valid_at(before_expiry))?;
    assert_eq!(claims.issuer(), Some("joe"));
    assert_eq!(claims.get("http://example.com/is_root"), Some(&true.into()));
    Ok(())
}
