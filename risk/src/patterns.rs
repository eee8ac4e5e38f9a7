//! Per-language phrase tables.

use once_cell::sync::Lazy;
use regex::Regex;

/// Compiled phrase tables for one language. Text is lower-cased before
/// matching, so every pattern is lower-case.
pub(crate) struct LanguageTable {
    pub scam: Vec<Regex>,
    pub pressure: Vec<Regex>,
    pub personal: Vec<Regex>,
    pub authority: Regex,
    pub legitimate: Vec<Regex>,
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("built-in pattern must compile"))
        .collect()
}

fn table(
    scam: &[&str],
    pressure: &[&str],
    personal: &[&str],
    authority: &str,
    legitimate: &[&str],
) -> LanguageTable {
    LanguageTable {
        scam: compile(scam),
        pressure: compile(pressure),
        personal: compile(personal),
        authority: Regex::new(authority).expect("built-in pattern must compile"),
        legitimate: compile(legitimate),
    }
}

static EN: Lazy<LanguageTable> = Lazy::new(|| {
    table(
        &[
            r"verify your account",
            r"suspended.*account",
            r"click.*link.*immediately",
            r"urgent.*action.*required",
            r"social security.*suspended",
            r"irs.*lawsuit",
            r"microsoft.*support",
            r"refund.*pending",
            r"gift card",
            r"wire transfer",
            r"bitcoin",
            r"cryptocurrency",
        ],
        &[
            r"act.*now",
            r"limited.*time",
            r"expires.*today",
            r"don't.*tell.*anyone",
            r"keep.*secret",
            r"immediately",
            r"urgent",
            r"emergency",
        ],
        &[
            r"verify your (account|identity)",
            r"gift card",
            r"social security number",
            r"password",
            r"\bpin\b",
            r"credit card",
            r"card number",
            r"bank account",
            r"account number",
            r"date of birth",
            r"wire transfer",
        ],
        r"\b(bank|irs|police|microsoft|government|support|amazon)\b",
        &[
            r"appointment",
            r"confirming your order",
            r"thank you for calling",
            r"how can i help",
        ],
    )
});

static ES: Lazy<LanguageTable> = Lazy::new(|| {
    table(
        &[
            r"verificar.*cuenta",
            r"cuenta.*suspendida",
            r"acción.*urgente",
            r"seguridad social",
            r"transferencia.*dinero",
            r"tarjeta.*regalo",
            r"soporte.*técnico",
            r"reembolso.*pendiente",
        ],
        &[
            r"actúe.*ahora",
            r"tiempo.*limitado",
            r"vence.*hoy",
            r"no.*diga.*nadie",
            r"mantenga.*secreto",
            r"inmediatamente",
            r"urgente",
            r"emergencia",
        ],
        &[
            r"verificar.*(cuenta|identidad)",
            r"tarjeta.*regalo",
            r"número.*seguro social",
            r"contraseña",
            r"\bpin\b",
            r"tarjeta de crédito",
            r"número de tarjeta",
            r"cuenta bancaria",
            r"número de cuenta",
            r"fecha de nacimiento",
        ],
        r"\b(banco|policía|gobierno|hacienda|soporte|amazon|microsoft)\b",
        &[
            r"\bcita\b",
            r"confirmar su pedido",
            r"gracias por llamar",
            r"en qué puedo ayudar",
        ],
    )
});

static FR: Lazy<LanguageTable> = Lazy::new(|| {
    table(
        &[
            r"vérifier.*compte",
            r"compte.*suspendu",
            r"action.*urgente",
            r"sécurité sociale",
            r"transfert.*argent",
            r"carte.*cadeau",
            r"support.*technique",
            r"remboursement.*en.*attente",
        ],
        &[
            r"agissez.*maintenant",
            r"temps.*limité",
            r"expire.*aujourd'hui",
            r"ne.*dites.*personne",
            r"gardez.*secret",
            r"immédiatement",
            r"urgent",
            r"urgence",
        ],
        &[
            r"vérifier.*(compte|identité)",
            r"carte.*cadeau",
            r"numéro.*sécurité sociale",
            r"mot de passe",
            r"\bpin\b",
            r"carte (de crédit|bancaire)",
            r"numéro de carte",
            r"compte bancaire",
            r"numéro de compte",
            r"date de naissance",
        ],
        r"\b(banque|police|gouvernement|impôts|support|amazon|microsoft)\b",
        &[
            r"rendez-vous",
            r"confirmer votre commande",
            r"merci d'avoir appelé",
            r"comment puis-je vous aider",
        ],
    )
});

/// Normalizes a language tag such as `"en-US"` to its primary subtag.
pub(crate) fn primary_language(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Returns the table for `language`, falling back to English.
pub(crate) fn for_language(language: &str) -> &'static LanguageTable {
    match primary_language(language).as_str() {
        "es" => &*ES,
        "fr" => &*FR,
        _ => &*EN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_compile() {
        for t in [&*EN, &*ES, &*FR] {
            assert!(!t.scam.is_empty());
            assert!(!t.pressure.is_empty());
            assert!(!t.personal.is_empty());
        }
    }

    #[test]
    fn test_language_fallback() {
        assert_eq!(primary_language("es-MX"), "es");
        assert_eq!(primary_language("FR_ca"), "fr");
        assert!(std::ptr::eq(for_language("de"), &*EN));
        assert!(std::ptr::eq(for_language(""), &*EN));
        assert!(std::ptr::eq(for_language("es"), &*ES));
    }
}
