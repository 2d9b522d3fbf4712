//! Provider-specific verifiers.
//!
//! Each provider has its own submodule implementing [`Verifier`].

pub mod claude;
pub mod custom;
pub mod deepseek;
pub mod gemini;
pub mod groq;
pub mod openai;
pub mod openai_compat;
pub mod siliconflow;
pub mod xai;

use std::sync::Arc;

pub use crate::core::provider::Provider;
use crate::core::verifier::{ProviderRegistry, Verifier};

/// Verifier for a provider.
#[must_use]
pub fn verifier_for(provider: Provider) -> Arc<dyn Verifier> {
    match provider {
        Provider::OpenAI => Arc::new(openai::OpenAiVerifier),
        Provider::Claude => Arc::new(claude::ClaudeVerifier),
        Provider::Gemini => Arc::new(gemini::GeminiVerifier),
        Provider::Deepseek => Arc::new(deepseek::DeepseekVerifier),
        Provider::Groq => Arc::new(groq::GroqVerifier),
        Provider::Siliconflow => Arc::new(siliconflow::SiliconflowVerifier),
        Provider::Xai => Arc::new(xai::XaiVerifier),
        Provider::Custom => Arc::new(custom::CustomVerifier),
    }
}

/// Registry with a verifier for every supported provider.
#[must_use]
pub fn default_registry() -> ProviderRegistry {
    Provider::ALL
        .iter()
        .fold(ProviderRegistry::new(), |registry, &p| {
            registry.register(verifier_for(p))
        })
}
