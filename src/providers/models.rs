//! Static model catalog

use super::Provider;
use serde::Serialize;

/// Read-only description of a hosted model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiModel {
    pub id: &'static str,
    pub provider: Provider,
    pub name: &'static str,
    pub context_window: usize,
    pub supports_functions: bool,
    pub supports_images: bool,
}

pub static MODELS: &[AiModel] = &[
    AiModel {
        id: "gpt-4o",
        provider: Provider::OpenAi,
        name: "GPT-4o",
        context_window: 128_000,
        supports_functions: true,
        supports_images: true,
    },
    AiModel {
        id: "gpt-4o-mini",
        provider: Provider::OpenAi,
        name: "GPT-4o mini",
        context_window: 128_000,
        supports_functions: true,
        supports_images: true,
    },
    AiModel {
        id: "gpt-4-turbo",
        provider: Provider::OpenAi,
        name: "GPT-4 Turbo",
        context_window: 128_000,
        supports_functions: true,
        supports_images: true,
    },
    AiModel {
        id: "gpt-3.5-turbo",
        provider: Provider::OpenAi,
        name: "GPT-3.5 Turbo",
        context_window: 16_385,
        supports_functions: true,
        supports_images: false,
    },
    AiModel {
        id: "claude-3-5-sonnet-20241022",
        provider: Provider::Anthropic,
        name: "Claude 3.5 Sonnet",
        context_window: 200_000,
        supports_functions: true,
        supports_images: true,
    },
    AiModel {
        id: "claude-3-opus-20240229",
        provider: Provider::Anthropic,
        name: "Claude 3 Opus",
        context_window: 200_000,
        supports_functions: true,
        supports_images: true,
    },
    AiModel {
        id: "claude-3-haiku-20240307",
        provider: Provider::Anthropic,
        name: "Claude 3 Haiku",
        context_window: 200_000,
        supports_functions: true,
        supports_images: true,
    },
    AiModel {
        id: "gemini-1.5-pro",
        provider: Provider::Gemini,
        name: "Gemini 1.5 Pro",
        context_window: 2_097_152,
        supports_functions: true,
        supports_images: true,
    },
    AiModel {
        id: "gemini-1.5-flash",
        provider: Provider::Gemini,
        name: "Gemini 1.5 Flash",
        context_window: 1_048_576,
        supports_functions: true,
        supports_images: true,
    },
    AiModel {
        id: "gemini-pro-vision",
        provider: Provider::Gemini,
        name: "Gemini Pro Vision",
        context_window: 16_384,
        supports_functions: false,
        supports_images: true,
    },
];

pub fn find_model(id: &str) -> Option<&'static AiModel> {
    MODELS.iter().find(|m| m.id == id)
}

pub fn models_for(provider: Provider) -> impl Iterator<Item = &'static AiModel> {
    MODELS.iter().filter(move |m| m.provider == provider)
}
