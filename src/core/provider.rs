//! Provider identifiers and per-provider metadata.

use serde::{Deserialize, Serialize};

use crate::error::{KeyprobeError, Result};

// =============================================================================
// Provider Enum
// =============================================================================

/// Supported credential providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Claude,
    Gemini,
    Deepseek,
    Groq,
    Siliconflow,
    Xai,
    Custom,
}

impl Provider {
    /// All providers in display order.
    pub const ALL: &'static [Self] = &[
        Self::OpenAI,
        Self::Claude,
        Self::Gemini,
        Self::Deepseek,
        Self::Groq,
        Self::Siliconflow,
        Self::Xai,
        Self::Custom,
    ];

    /// CLI name for this provider.
    #[must_use]
    pub const fn cli_name(self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Deepseek => "deepseek",
            Self::Groq => "groq",
            Self::Siliconflow => "siliconflow",
            Self::Xai => "xai",
            Self::Custom => "custom",
        }
    }

    /// Display name for human output.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
            Self::Deepseek => "DeepSeek",
            Self::Groq => "Groq",
            Self::Siliconflow => "SiliconFlow",
            Self::Xai => "xAI",
            Self::Custom => "Custom",
        }
    }

    /// Parse from CLI argument.
    pub fn from_cli_name(name: &str) -> Result<Self> {
        let lower = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|p| p.cli_name() == lower)
            .copied()
            .ok_or_else(|| KeyprobeError::InvalidProvider(name.to_string()))
    }

    /// Default API base URL for the probe request.
    ///
    /// `Custom` has no default; its endpoint is supplied per run.
    #[must_use]
    pub const fn default_api_base(self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("https://api.openai.com"),
            Self::Claude => Some("https://api.anthropic.com"),
            Self::Gemini => Some("https://generativelanguage.googleapis.com"),
            Self::Deepseek => Some("https://api.deepseek.com"),
            Self::Groq => Some("https://api.groq.com"),
            Self::Siliconflow => Some("https://api.siliconflow.cn"),
            Self::Xai => Some("https://api.x.ai"),
            Self::Custom => None,
        }
    }

    /// Default model used for the probe request.
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o",
            Self::Claude => "claude-3-5-sonnet-20241022",
            Self::Gemini => "gemini-1.5-flash",
            Self::Deepseek => "deepseek-chat",
            Self::Groq => "llama-3.3-70b-versatile",
            Self::Siliconflow => "Qwen/Qwen2.5-72B-Instruct",
            Self::Xai => "grok-3-mini",
            Self::Custom => "gpt-3.5-turbo",
        }
    }

    /// Whether the provider exposes a balance or quota endpoint.
    #[must_use]
    pub const fn supports_balance(self) -> bool {
        matches!(self, Self::Deepseek | Self::Siliconflow | Self::Custom)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.cli_name())
    }
}

// =============================================================================
// Provider Filter
// =============================================================================

/// Provider selector from CLI arguments: a concrete provider or `auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderFilter {
    /// Detect the provider from the credential's shape.
    #[default]
    Auto,
    /// Force a single provider.
    Single(Provider),
}

impl ProviderFilter {
    /// Parse from CLI argument string.
    pub fn from_arg(arg: &str) -> Result<Self> {
        if arg.trim().eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            Provider::from_cli_name(arg).map(Self::Single)
        }
    }

    /// The forced provider, if any.
    #[must_use]
    pub const fn provider(self) -> Option<Provider> {
        match self {
            Self::Auto => None,
            Self::Single(p) => Some(p),
        }
    }
}

impl std::fmt::Display for ProviderFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Single(p) => write!(f, "{p}"),
        }
    }
}
