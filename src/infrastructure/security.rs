// ============================================================
// ACCESS GATE
// ============================================================
// PIN check for the upload endpoint. Both sides are hashed and
// the digests compared, so the comparison does not short-circuit
// on the first differing plaintext byte.

use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct AccessGate {
    pin_digest: Option<[u8; 32]>,
    bypass: bool,
}

impl AccessGate {
    /// `bypass` must only be set from development environments; the
    /// config layer enforces that.
    pub fn new(pin: Option<&str>, bypass: bool) -> Self {
        Self {
            pin_digest: pin.map(digest),
            bypass,
        }
    }

    /// Check a submitted PIN. With no PIN configured, every attempt
    /// fails (the bypass still applies).
    pub fn verify(&self, submitted: &str) -> bool {
        if self.bypass {
            return true;
        }
        match self.pin_digest {
            Some(expected) => digest(submitted) == expected,
            None => false,
        }
    }

    /// Short digest prefix for startup logging. Never exposes the PIN.
    pub fn fingerprint(&self) -> Option<String> {
        self.pin_digest.map(|d| hex::encode(&d[..4]))
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_pin_passes() {
        let gate = AccessGate::new(Some("0457"), false);
        assert!(gate.verify("0457"));
    }

    #[test]
    fn wrong_pin_fails() {
        let gate = AccessGate::new(Some("0457"), false);
        assert!(!gate.verify("0000"));
        assert!(!gate.verify(""));
        assert!(!gate.verify("04570"));
    }

    #[test]
    fn missing_pin_rejects_everything() {
        let gate = AccessGate::new(None, false);
        assert!(!gate.verify(""));
        assert!(!gate.verify("anything"));
    }

    #[test]
    fn bypass_accepts_any_pin() {
        let gate = AccessGate::new(Some("0457"), true);
        assert!(gate.verify("wrong"));
        let gate = AccessGate::new(None, true);
        assert!(gate.verify(""));
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        let a = AccessGate::new(Some("0457"), false);
        let b = AccessGate::new(Some("0457"), false);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().unwrap().len(), 8);
        assert!(AccessGate::new(None, false).fingerprint().is_none());
    }
}
