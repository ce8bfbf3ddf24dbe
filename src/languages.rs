/// Language tag used when nothing else is configured.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Recognition languages offered to the user, as (tag, display name).
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("en-US", "English"),
    ("fr-FR", "French"),
    ("es-ES", "Spanish"),
    ("de-DE", "German"),
    ("it-IT", "Italian"),
    ("pt-BR", "Portuguese"),
    ("zh-Hans", "Simplified Chinese"),
    ("zh-Hant", "Traditional Chinese"),
    ("ja-JP", "Japanese"),
    ("ko-KR", "Korean"),
];

pub fn is_supported(tag: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(t, _)| *t == tag)
}

pub fn display_name(tag: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, name)| *name)
}
