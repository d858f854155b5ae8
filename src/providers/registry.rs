//! Static provider table with deterministic precondition fallback.
//!
//! Each pipeline capability (voice synthesis, captioning, rendering) has one
//! or more named providers, each backed by a worker script. Resolution is
//! pure configuration lookup: the registry holds no runtime state.
//!
//! Fallback policy: a requested provider whose preconditions are unmet
//! (e.g. `elevenlabs` without an API key and voice id) is replaced by the
//! capability's default provider, and the substitution is logged. Users who
//! ask for a premium backend without credentials still get usable output.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A logical capability a stage needs a worker for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    VoiceSynthesis,
    Caption,
    Render,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Capability::VoiceSynthesis => "voice_synthesis",
            Capability::Caption => "caption",
            Capability::Render => "render",
        };
        f.write_str(s)
    }
}

/// A credential a provider needs before it can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKey {
    ElevenLabsApiKey,
    ElevenLabsVoiceId,
}

/// Credentials available to the pipeline, read from configuration.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_voice_id: Option<String>,
}

impl Credentials {
    /// Whether a credential is present and non-empty.
    pub fn has(&self, key: CredentialKey) -> bool {
        let value = match key {
            CredentialKey::ElevenLabsApiKey => &self.elevenlabs_api_key,
            CredentialKey::ElevenLabsVoiceId => &self.elevenlabs_voice_id,
        };
        value.as_deref().is_some_and(|v| !v.trim().is_empty())
    }
}

/// Static description of one provider: its worker script and preconditions.
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    /// Short lowercase provider name (e.g. `"gtts"`).
    pub name: &'static str,
    /// The capability this provider implements.
    pub capability: Capability,
    /// Worker script filename, resolved against the configured workers dir.
    pub script: &'static str,
    /// Credentials that must be present for this provider to be usable.
    pub requires: &'static [CredentialKey],
}

impl ProviderSpec {
    /// Whether every required credential is available.
    pub fn preconditions_met(&self, credentials: &Credentials) -> bool {
        self.requires.iter().all(|key| credentials.has(*key))
    }
}

/// Errors from provider resolution.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The requested provider name is not registered for the capability.
    #[error("unknown {capability} provider: {name}")]
    UnknownProvider { capability: Capability, name: String },
}

/// Lookup table from capability to provider specs.
///
/// The first spec registered for a capability is its default and doubles as
/// the fallback target. Defaults never carry preconditions.
pub struct ProviderRegistry {
    specs: Vec<ProviderSpec>,
}

impl ProviderRegistry {
    /// The built-in provider table.
    pub fn builtin() -> Self {
        Self {
            specs: vec![
                ProviderSpec {
                    name: "gtts",
                    capability: Capability::VoiceSynthesis,
                    script: "voice_gtts.py",
                    requires: &[],
                },
                ProviderSpec {
                    name: "pyttsx3",
                    capability: Capability::VoiceSynthesis,
                    script: "voice_pyttsx3.py",
                    requires: &[],
                },
                ProviderSpec {
                    name: "elevenlabs",
                    capability: Capability::VoiceSynthesis,
                    script: "voice_elevenlabs.py",
                    requires: &[
                        CredentialKey::ElevenLabsApiKey,
                        CredentialKey::ElevenLabsVoiceId,
                    ],
                },
                ProviderSpec {
                    name: "overlay",
                    capability: Capability::Caption,
                    script: "captions_overlay.py",
                    requires: &[],
                },
                ProviderSpec {
                    name: "moviepy",
                    capability: Capability::Render,
                    script: "render_moviepy.py",
                    requires: &[],
                },
            ],
        }
    }

    /// The default provider for a capability (first registered).
    pub fn default_for(&self, capability: Capability) -> &ProviderSpec {
        self.specs
            .iter()
            .find(|s| s.capability == capability)
            .expect("every capability has at least one built-in provider")
    }

    /// Look up a provider by capability and name.
    pub fn get(&self, capability: Capability, name: &str) -> Option<&ProviderSpec> {
        self.specs
            .iter()
            .find(|s| s.capability == capability && s.name == name)
    }

    /// Whether a provider name is registered for a capability.
    pub fn is_known(&self, capability: Capability, name: &str) -> bool {
        self.get(capability, name).is_some()
    }

    /// Resolve a provider for a stage invocation.
    ///
    /// An unknown requested name is an error. A known provider with unmet
    /// preconditions deterministically falls back to the capability default,
    /// logging the substitution.
    pub fn resolve(
        &self,
        capability: Capability,
        requested: Option<&str>,
        credentials: &Credentials,
    ) -> Result<&ProviderSpec, RegistryError> {
        let spec = match requested {
            None => self.default_for(capability),
            Some(name) => {
                self.get(capability, name)
                    .ok_or_else(|| RegistryError::UnknownProvider {
                        capability,
                        name: name.to_string(),
                    })?
            }
        };

        if spec.preconditions_met(credentials) {
            return Ok(spec);
        }

        let fallback = self.default_for(capability);
        warn!(
            capability = %capability,
            requested = spec.name,
            fallback = fallback.name,
            "provider preconditions unmet; falling back to default"
        );
        Ok(fallback)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
