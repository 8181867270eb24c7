use crate::alphabet::{Alphabet, AlphabetSpec};
use crate::derive::derive_password;
use crate::error::{PwdbError, Result};
use crate::registry::{Registry, validate_site_name};
use crate::secret::MasterSecret;
use crate::verifier::{SecretPrompt, authenticate, create_registry, prompt_new_master};
use std::io;
use std::path::Path;
use zeroize::Zeroizing;

pub const SEARCH_PREFIX: char = '?';

pub trait SiteInteraction {
    fn confirm_add(&mut self, site: &str) -> io::Result<bool>;

    fn read_alphabet_spec(&mut self, site: &str) -> io::Result<String>;
}

#[derive(Debug)]
pub struct Derived {
    pub site: String,
    pub spec: AlphabetSpec,
    pub password: Zeroizing<String>,
    /// Set when this request added the site to the registry.
    pub registered: bool,
}

#[derive(Debug)]
pub enum Response {
    Password(Derived),
    Matches(Vec<String>),
    Declined(String),
    Finished,
}

pub struct Session {
    registry: Registry,
    secret: MasterSecret,
}

impl Session {
    pub fn open<P>(path: impl AsRef<Path>, prompt: &mut P) -> Result<Self>
    where
        P: SecretPrompt + ?Sized,
    {
        let path = path.as_ref();
        if path.exists() {
            Self::unlock(path, prompt)
        } else {
            tracing::info!(path = %path.display(), "No registry found, starting setup");
            Self::initialize(path, prompt)
        }
    }

    pub fn unlock<P>(path: impl AsRef<Path>, prompt: &mut P) -> Result<Self>
    where
        P: SecretPrompt + ?Sized,
    {
        let registry = Registry::load(path)?;
        let secret = authenticate(registry.fingerprint(), prompt)?;
        Ok(Self { registry, secret })
    }

    pub fn initialize<P>(path: impl AsRef<Path>, prompt: &mut P) -> Result<Self>
    where
        P: SecretPrompt + ?Sized,
    {
        let secret = prompt_new_master(prompt)?;
        let (registry, _) = create_registry(path, &secret)?;
        Ok(Self { registry, secret })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn handle_input<I>(&mut self, input: &str, ui: &mut I) -> Result<Response>
    where
        I: SiteInteraction + ?Sized,
    {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Response::Finished);
        }

        if let Some(fragment) = input.strip_prefix(SEARCH_PREFIX) {
            let matches = self
                .registry
                .search(fragment)
                .map(|record| record.name.clone())
                .collect();
            return Ok(Response::Matches(matches));
        }

        self.request(input, None, ui)
    }

    pub fn request<I>(
        &mut self,
        site: &str,
        requested: Option<AlphabetSpec>,
        ui: &mut I,
    ) -> Result<Response>
    where
        I: SiteInteraction + ?Sized,
    {
        validate_site_name(site)?;

        if let Some(stored) = self.registry.lookup(site) {
            if let Some(requested) = requested.filter(|r| !r.same_classes(stored)) {
                return Err(PwdbError::SpecConflict {
                    site: site.to_string(),
                    stored: stored.to_string(),
                    requested: requested.to_string(),
                });
            }
            let spec = stored.clone();
            return self.derive(site, spec, false).map(Response::Password);
        }

        let spec = match requested {
            Some(spec) => spec,
            None => {
                if !ui.confirm_add(site).map_err(PwdbError::Prompt)? {
                    return Ok(Response::Declined(site.to_string()));
                }
                let answer = ui.read_alphabet_spec(site).map_err(PwdbError::Prompt)?;
                AlphabetSpec::parse(answer.trim())?
            }
        };

        let spec = self.registry.register(site, spec)?.spec.clone();
        self.derive(site, spec, true).map(Response::Password)
    }

    fn derive(&self, site: &str, spec: AlphabetSpec, registered: bool) -> Result<Derived> {
        let alphabet = Alphabet::build(&spec);
        let password = derive_password(&self.secret, site, &alphabet)?;
        tracing::debug!(site, spec = %spec, registered, "Derived password");

        Ok(Derived {
            site: site.to_string(),
            spec,
            password,
            registered,
        })
    }
}
