use hex_literal::hex;
use jose_core::JoseError;
use jose_core::algorithm::JwsAlgorithm;

/// Domain parameters of a curve `y^2 = x^3 + ax + b` over `GF(p)`, as big-endian integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurveParameters<'a> {
    pub p: &'a [u8],
    pub a: &'a [u8],
    pub b: &'a [u8],
    pub gx: &'a [u8],
    pub gy: &'a [u8],
    pub n: &'a [u8],
    pub h: &'a [u8],
}

impl CurveParameters<'_> {
    /// Numeric equality of every parameter. Leading zero bytes are not significant.
    pub fn same_curve(&self, other: &CurveParameters<'_>) -> bool {
        let pairs = [
            (self.p, other.p),
            (self.a, other.a),
            (self.b, other.b),
            (self.gx, other.gx),
            (self.gy, other.gy),
            (self.n, other.n),
            (self.h, other.h),
        ];
        pairs.iter().all(|(x, y)| strip(x) == strip(y))
    }
}

fn strip(int: &[u8]) -> &[u8] {
    let start = int.iter().position(|&b| b != 0).unwrap_or(int.len());
    &int[start..]
}

/// One of the NIST prime curves usable with ECDSA in JWS.
#[derive(Debug, PartialEq, Eq)]
pub struct EllipticCurve {
    name: &'static str,
    algorithm: JwsAlgorithm,
    field_len: usize,
    parameters: CurveParameters<'static>,
}

pub static P256: EllipticCurve = EllipticCurve {
    name: "P-256",
    algorithm: JwsAlgorithm::Es256,
    field_len: 32,
    parameters: CurveParameters {
        p: &hex!("ffffffff00000001000000000000000000000000ffffffffffffffffffffffff"),
        a: &hex!("ffffffff00000001000000000000000000000000fffffffffffffffffffffffc"),
        b: &hex!("5ac635d8aa3a93e7b3ebbd55769886bc651d06b0cc53b0f63bce3c3e27d2604b"),
        gx: &hex!("6b17d1f2e12c4247f8bce6e563a440f277037d812deb33a0f4a13945d898c296"),
        gy: &hex!("4fe342e2fe1a7f9b8ee7eb4a7c0f9e162bce33576b315ececbb6406837bf51f5"),
        n: &hex!("ffffffff00000000ffffffffffffffffbce6faada7179e84f3b9cac2fc632551"),
        h: &[1],
    },
};

pub static P384: EllipticCurve = EllipticCurve {
    name: "P-384",
    algorithm: JwsAlgorithm::Es384,
    field_len: 48,
    parameters: CurveParameters {
        p: &hex!(
            "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe"
            "ffffffff0000000000000000ffffffff"
        ),
        a: &hex!(
            "fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffe"
            "ffffffff0000000000000000fffffffc"
        ),
        b: &hex!(
            "b3312fa7e23ee7e4988e056be3f82d19181d9c6efe8141120314088f5013875a"
            "c656398d8a2ed19d2a85c8edd3ec2aef"
        ),
        gx: &hex!(
            "aa87ca22be8b05378eb1c71ef320ad746e1d3b628ba79b9859f741e082542a38"
            "5502f25dbf55296c3a545e3872760ab7"
        ),
        gy: &hex!(
            "3617de4a96262c6f5d9e98bf9292dc29f8f41dbd289a147ce9da3113b5f0b8c0"
            "0a60b1ce1d7e819d7a431d7c90ea0e5f"
        ),
        n: &hex!(
            "ffffffffffffffffffffffffffffffffffffffffffffffffc7634d81f4372ddf"
            "581a0db248b0a77aecec196accc52973"
        ),
        h: &[1],
    },
};

pub static P521: EllipticCurve = EllipticCurve {
    name: "P-521",
    algorithm: JwsAlgorithm::Es512,
    field_len: 66,
    parameters: CurveParameters {
        p: &hex!(
            "01ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
            "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
            "ffff"
        ),
        a: &hex!(
            "01ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
            "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
            "fffc"
        ),
        b: &hex!(
            "0051953eb9618e1c9a1f929a21a0b68540eea2da725b99b315f3b8b489918ef1"
            "09e156193951ec7e937b1652c0bd3bb1bf073573df883d2c34f1ef451fd46b50"
            "3f00"
        ),
        gx: &hex!(
            "00c6858e06b70404e9cd9e3ecb662395b4429c648139053fb521f828af606b4d"
            "3dbaa14b5e77efe75928fe1dc127a2ffa8de3348b3c1856a429bf97e7e31c2e5"
            "bd66"
        ),
        gy: &hex!(
            "011839296a789a3bc0045c8a5fb42c7d1bd998f54449579b446817afbd17273e"
            "662c97ee72995ef42640c550b9013fad0761353c7086a272c24088be94769fd1"
            "6650"
        ),
        n: &hex!(
            "01ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"
            "fffa51868783bf2f966b7fcc0148f709a5d03bb5c9b8899c47aebb6fb71e9138"
            "6409"
        ),
        h: &[1],
    },
};

/// Every supported curve.
pub static CURVES: [&EllipticCurve; 3] = [&P256, &P384, &P521];

impl EllipticCurve {
    /// The JWK `crv` name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn algorithm(&self) -> JwsAlgorithm {
        self.algorithm
    }

    /// Length in bytes of a field element, and of each of `r` and `s` in a signature.
    pub fn field_len(&self) -> usize {
        self.field_len
    }

    /// Length in bytes of a raw `r || s` signature.
    pub fn signature_len(&self) -> usize {
        2 * self.field_len
    }

    pub fn parameters(&self) -> &CurveParameters<'static> {
        &self.parameters
    }

    /// Look up a curve by its exact JWK `crv` name.
    pub fn for_name(name: &str) -> Result<&'static Self, JoseError> {
        CURVES
            .into_iter()
            .find(|c| c.name == name)
            .ok_or(JoseError::InvalidKey)
    }

    /// Identify the curve a key's explicit domain parameters describe.
    ///
    /// Every parameter must equal the named curve's. Anything else is not one of ours.
    pub fn for_parameters(parameters: &CurveParameters<'_>) -> Result<&'static Self, JoseError> {
        CURVES
            .into_iter()
            .find(|c| c.parameters.same_curve(parameters))
            .ok_or(JoseError::InvalidKey)
    }

    /// Guess the curve from the length of a raw signature.
    ///
    /// This only works because the supported curves have distinct signature lengths.
    /// It is a convenience and must not be used to decide which key to trust.
    pub fn for_signature_length(len: usize) -> Option<&'static Self> {
        CURVES.into_iter().find(|c| c.signature_len() == len)
    }

    pub fn for_algorithm(alg: JwsAlgorithm) -> Option<&'static Self> {
        CURVES.into_iter().find(|c| c.algorithm == alg)
    }
}
