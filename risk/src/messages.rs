use crate::patterns::primary_language;
use crate::AlertCategory;

/// Localized alert text for `category`. Languages other than English,
/// Spanish and French fall back to English.
pub fn alert_message(category: AlertCategory, language: &str) -> &'static str {
    use AlertCategory::*;
    match (primary_language(language).as_str(), category) {
        ("es", PersonalInfo) => "Advertencia: La persona que llama está pidiendo información personal. No comparta contraseñas, números de cuenta ni códigos.",
        ("es", PressureTactic) => "Precaución: La persona que llama está usando tácticas de presión. Tómese su tiempo y no actúe con prisa.",
        ("es", VoiceSpoofing) => "Alerta: Voz sintética detectada. Esto puede ser un deepfake.",
        ("es", ScamPatterns) => "Advertencia: Esta llamada coincide con patrones de estafa conocidos.",
        ("es", HighRisk) => "Advertencia: Esta llamada puede ser fraudulenta. No comparta información personal.",
        ("es", MediumRisk) => "Precaución: Actividad sospechosa detectada en esta llamada.",

        ("fr", PersonalInfo) => "Attention: L'appelant demande des informations personnelles. Ne communiquez ni mot de passe, ni numéro de compte, ni code.",
        ("fr", PressureTactic) => "Prudence: L'appelant exerce une pression. Prenez votre temps et n'agissez pas dans l'urgence.",
        ("fr", VoiceSpoofing) => "Alerte: Voix synthétique détectée. Ceci peut être un deepfake.",
        ("fr", ScamPatterns) => "Attention: Cet appel correspond à des schémas d'escroquerie connus.",
        ("fr", HighRisk) => "Attention: Cet appel peut être frauduleux. Ne partagez pas d'informations personnelles.",
        ("fr", MediumRisk) => "Prudence: Activité suspecte détectée dans cet appel.",

        (_, PersonalInfo) => "Warning: The caller is asking for personal information. Do not share passwords, account numbers or codes.",
        (_, PressureTactic) => "Caution: The caller is using pressure tactics. Take your time and do not act in a hurry.",
        (_, VoiceSpoofing) => "Alert: Synthetic voice detected. This may be a deepfake.",
        (_, ScamPatterns) => "Warning: This call matches known scam patterns.",
        (_, HighRisk) => "Warning: This call may be fraudulent. Do not share personal information.",
        (_, MediumRisk) => "Caution: Suspicious activity detected in this call.",
    }
}
