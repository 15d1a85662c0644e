use ssh_key::private::RsaKeypair;
use ssh_key::rand_core::OsRng;
use ssh_key::{LineEnding, PrivateKey};

use crate::Result;

const RSA_KEY_BITS: usize = 2048;

/// A freshly generated SSH key pair.
///
/// The private half never leaves the controller except through the registry
/// and the user's own chat channel.
#[derive(Clone)]
pub struct KeyPair {
    public: String,
    private: String,
}

impl KeyPair {
    /// Generate an RSA key pair.
    pub fn generate() -> Result<Self> {
        let rsa = RsaKeypair::random(&mut OsRng, RSA_KEY_BITS)?;
        let private = PrivateKey::from(rsa);

        Ok(Self {
            public: private.public_key().to_openssh()?,
            private: private.to_openssh(LineEnding::LF)?.to_string(),
        })
    }

    /// Public key in `authorized_keys` format, e.g. `ssh-rsa AAAA...`.
    pub fn public_key(&self) -> &str {
        &self.public
    }

    /// Private key in OpenSSH PEM armor.
    pub fn private_key(&self) -> &[u8] {
        self.private.as_bytes()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}
