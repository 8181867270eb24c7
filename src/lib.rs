pub mod alphabet;
pub mod derive;
pub mod encoding;
pub mod error;
pub mod registry;
pub mod secret;
pub mod session;
pub mod verifier;

pub use alphabet::{Alphabet, AlphabetSpec, CharClass};
pub use derive::{derive_password, PASSWORD_LEN};
pub use error::{PwdbError, Result};
pub use registry::{Registry, SiteRecord};
pub use secret::MasterSecret;
pub use session::{Derived, Response, Session, SiteInteraction};
pub use verifier::{authenticate, compute_fingerprint, create_registry, Fingerprint, SecretPrompt};
