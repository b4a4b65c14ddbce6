//! TSIG transaction signatures (RFC 8945)
//!
//! hickory builds the signed data and the TSIG record. The MAC itself is
//! computed here because hickory's own signer only offers the SHA-2 HMACs,
//! while nameservers commonly expect `hmac-md5.sig-alg.reg.int.`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hickory_resolver::proto::ProtoError;
use hickory_resolver::proto::dnssec::rdata::tsig::{
    TSIG, TsigAlgorithm, make_tsig_record, message_tbs,
};
use hickory_resolver::proto::op::{Message, MessageFinalizer, MessageVerifier};
use hickory_resolver::proto::rr::{Name, Record};
use hmac::{Hmac, Mac};
use std::str::FromStr;

/// Allowed clock skew between signer and verifier, in seconds
pub const FUDGE: u16 = 300;

/// HMAC algorithms usable for TSIG
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    HmacMd5,
    HmacSha1,
    HmacSha224,
    HmacSha256,
    HmacSha384,
    HmacSha512,
}

impl Algorithm {
    fn tsig_algorithm(self) -> TsigAlgorithm {
        match self {
            Algorithm::HmacMd5 => TsigAlgorithm::HmacMd5,
            Algorithm::HmacSha1 => TsigAlgorithm::HmacSha1,
            Algorithm::HmacSha224 => TsigAlgorithm::HmacSha224,
            Algorithm::HmacSha256 => TsigAlgorithm::HmacSha256,
            Algorithm::HmacSha384 => TsigAlgorithm::HmacSha384,
            Algorithm::HmacSha512 => TsigAlgorithm::HmacSha512,
        }
    }

    fn mac(self, key: &[u8], data: &[u8]) -> Vec<u8> {
        fn compute<M: Mac + hmac::digest::KeyInit>(key: &[u8], data: &[u8]) -> Vec<u8> {
            let mut mac = <M as hmac::digest::KeyInit>::new_from_slice(key)
                .expect("HMAC can take key of any size");
            mac.update(data);
            mac.finalize().into_bytes().to_vec()
        }

        match self {
            Algorithm::HmacMd5 => compute::<Hmac<md5::Md5>>(key, data),
            Algorithm::HmacSha1 => compute::<Hmac<sha1::Sha1>>(key, data),
            Algorithm::HmacSha224 => compute::<Hmac<sha2::Sha224>>(key, data),
            Algorithm::HmacSha256 => compute::<Hmac<sha2::Sha256>>(key, data),
            Algorithm::HmacSha384 => compute::<Hmac<sha2::Sha384>>(key, data),
            Algorithm::HmacSha512 => compute::<Hmac<sha2::Sha512>>(key, data),
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    /// Case-insensitive; the trailing dot is optional
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim_end_matches('.').to_ascii_lowercase();
        match name.as_str() {
            "hmac-md5.sig-alg.reg.int" | "hmac-md5" => Ok(Algorithm::HmacMd5),
            "hmac-sha1" => Ok(Algorithm::HmacSha1),
            "hmac-sha224" => Ok(Algorithm::HmacSha224),
            "hmac-sha256" => Ok(Algorithm::HmacSha256),
            "hmac-sha384" => Ok(Algorithm::HmacSha384),
            "hmac-sha512" => Ok(Algorithm::HmacSha512),
            _ => Err(format!("unsupported TSIG algorithm '{s}'")),
        }
    }
}

/// Signs outgoing UPDATE messages with a shared TSIG key
///
/// Replies are not verified.
#[derive(Clone)]
pub struct TsigSigner {
    key_name: Name,
    algorithm: Algorithm,
    secret: Vec<u8>,
}

impl std::fmt::Debug for TsigSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TsigSigner")
            .field("key_name", &self.key_name)
            .field("algorithm", &self.algorithm)
            .field("secret", &"<REDACTED>")
            .finish()
    }
}

impl TsigSigner {
    /// Build a signer from the key name, algorithm name and base64 secret
    pub fn new(key_name: &str, algorithm: &str, secret: &str) -> Result<Self, String> {
        let algorithm: Algorithm = algorithm.parse()?;
        let mut key_name =
            Name::from_ascii(key_name).map_err(|e| format!("invalid TSIG key name: {e}"))?;
        key_name.set_fqdn(true);
        let secret = STANDARD
            .decode(secret.trim())
            .map_err(|e| format!("invalid TSIG secret: {e}"))?;

        Ok(Self {
            key_name,
            algorithm,
            secret,
        })
    }
}

impl MessageFinalizer for TsigSigner {
    fn finalize_message(
        &self,
        message: &Message,
        current_time: u32,
    ) -> Result<(Vec<Record>, Option<MessageVerifier>), ProtoError> {
        let pre_tsig = TSIG::new(
            self.algorithm.tsig_algorithm(),
            u64::from(current_time),
            FUDGE,
            Vec::new(),
            message.id(),
            0,
            Vec::new(),
        );
        let signed = message_tbs(None, message, &pre_tsig, &self.key_name)?;
        let mac = self.algorithm.mac(&self.secret, &signed);

        tracing::trace!(key = %self.key_name, algorithm = ?self.algorithm, "Signed update");
        Ok((
            vec![make_tsig_record(self.key_name.clone(), pre_tsig.set_mac(mac))],
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_resolver::proto::dnssec::rdata::DNSSECRData;
    use hickory_resolver::proto::dnssec::tsig::TSigner;
    use hickory_resolver::proto::op::{UpdateMessage, update_message};
    use hickory_resolver::proto::rr::rdata::TXT;
    use hickory_resolver::proto::rr::{RData, RecordType};

    const SECRET: &str = "c2VjcmV0LWtleS1tYXRlcmlhbA==";
    const SIGNED_AT: u32 = 1_700_000_000;

    fn update() -> Message {
        let zone = Name::from_ascii("example.com.").unwrap();
        let owner = Name::from_ascii("_acme-challenge.example.com.").unwrap();
        let mut message = update_message::delete_rrset(
            Record::update0(owner.clone(), 0, RecordType::TXT),
            zone,
            false,
        );
        message.add_update(Record::from_rdata(
            owner,
            120,
            RData::TXT(TXT::new(vec!["value".to_string()])),
        ));
        message.set_id(0x1234);
        message
    }

    fn mac_of(records: &[Record]) -> Vec<u8> {
        match records[0].data() {
            RData::DNSSEC(DNSSECRData::TSIG(tsig)) => tsig.mac().to_vec(),
            other => panic!("not a TSIG record: {other:?}"),
        }
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(
            "hmac-md5.sig-alg.reg.int.".parse::<Algorithm>(),
            Ok(Algorithm::HmacMd5)
        );
        assert_eq!("HMAC-SHA256".parse::<Algorithm>(), Ok(Algorithm::HmacSha256));
        assert_eq!("hmac-sha512.".parse::<Algorithm>(), Ok(Algorithm::HmacSha512));
        assert!("hmac-sha999.".parse::<Algorithm>().is_err());
    }

    #[test]
    fn test_hmac_known_answers() {
        // RFC 2202 test case 2
        let key = b"Jefe";
        let data = b"what do ya want for nothing?";

        let md5 = Algorithm::HmacMd5.mac(key, data);
        assert_eq!(
            md5,
            [
                0x75, 0x0c, 0x78, 0x3e, 0x6a, 0xb0, 0xb5, 0x03, 0xea, 0xa8, 0x6e, 0x31, 0x0a,
                0x5d, 0xb7, 0x38
            ]
        );

        let sha1 = Algorithm::HmacSha1.mac(key, data);
        assert_eq!(
            sha1,
            [
                0xef, 0xfc, 0xdf, 0x6a, 0xe5, 0xeb, 0x2f, 0xa2, 0xd2, 0x74, 0x16, 0xd5, 0xf1,
                0x84, 0xdf, 0x9c, 0x25, 0x9a, 0x7c, 0x79
            ]
        );
    }

    #[test]
    fn test_mac_matches_hickory_signer() {
        let message = update();
        let ours = TsigSigner::new("acme-key", "hmac-sha256.", SECRET).unwrap();
        let reference = TSigner::new(
            STANDARD.decode(SECRET).unwrap(),
            TsigAlgorithm::HmacSha256,
            Name::from_ascii("acme-key.").unwrap(),
            FUDGE,
        )
        .unwrap();

        let (ours, verifier) = ours.finalize_message(&message, SIGNED_AT).unwrap();
        assert!(verifier.is_none());
        let (reference, _) = reference.finalize_message(&message, SIGNED_AT).unwrap();

        assert_eq!(ours.len(), 1);
        assert_eq!(ours[0].record_type(), RecordType::TSIG);
        assert_eq!(mac_of(&ours).len(), 32);
        assert_eq!(mac_of(&ours), mac_of(&reference));
    }

    #[test]
    fn test_key_name_case_does_not_change_mac() {
        let message = update();
        let lower = TsigSigner::new("acme-key.", "hmac-sha256", SECRET).unwrap();
        let upper = TsigSigner::new("ACME-Key.", "hmac-sha256", SECRET).unwrap();

        let (lower, _) = lower.finalize_message(&message, SIGNED_AT).unwrap();
        let (upper, _) = upper.finalize_message(&message, SIGNED_AT).unwrap();
        assert_eq!(mac_of(&lower), mac_of(&upper));
    }

    #[test]
    fn test_md5_record() {
        let message = update();
        let signer = TsigSigner::new("acme-key", "hmac-md5.sig-alg.reg.int.", SECRET).unwrap();
        let (records, _) = signer.finalize_message(&message, SIGNED_AT).unwrap();

        match records[0].data() {
            RData::DNSSEC(DNSSECRData::TSIG(tsig)) => {
                assert_eq!(tsig.algorithm(), &TsigAlgorithm::HmacMd5);
                assert_eq!(tsig.fudge(), FUDGE);
                assert_eq!(tsig.time(), u64::from(SIGNED_AT));
                assert_eq!(tsig.mac().len(), 16);
            }
            other => panic!("not a TSIG record: {other:?}"),
        }
        assert_eq!(records[0].name(), &Name::from_ascii("acme-key.").unwrap());
    }

    #[test]
    fn test_invalid_inputs() {
        let err = TsigSigner::new("key.", "hmac-sha256.", "abc123=").unwrap_err();
        assert!(err.starts_with("invalid TSIG secret"), "{err}");

        let err = TsigSigner::new("key.", "hmac-sha999.", SECRET).unwrap_err();
        assert_eq!(err, "unsupported TSIG algorithm 'hmac-sha999.'");
    }

    #[test]
    fn test_secret_not_exposed_in_debug() {
        let signer = TsigSigner::new("key.", "hmac-sha256.", SECRET).unwrap();
        assert!(!format!("{signer:?}").contains(SECRET));
    }
}
