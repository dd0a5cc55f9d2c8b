//! Libellés imprimés du bulletin QR, par langue.
//!
//! Tables fixes, sans E/S. Le français est la langue par défaut du SaaS ;
//! tout code de langue inconnu y retombe.

use serde::{Deserialize, Serialize};

/// Langues supportées par le bulletin QR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    Fr,
    It,
    En,
}

impl Language {
    /// Interprète un code de langue ; les codes inconnus retombent sur `fr`
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "de" => Self::De,
            "it" => Self::It,
            "en" => Self::En,
            _ => Self::Fr,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::De => "de",
            Self::Fr => "fr",
            Self::It => "it",
            Self::En => "en",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::Fr
    }
}

/// Jeu de libellés d'un bulletin QR
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSet {
    pub receipt: &'static str,
    pub payment_part: &'static str,
    pub account: &'static str,
    pub payable_to: &'static str,
    pub payable_by: &'static str,
    pub reference: &'static str,
    pub additional_info: &'static str,
    pub currency: &'static str,
    pub amount: &'static str,
    pub acceptance_point: &'static str,
    pub do_not_use_for_payment: &'static str,
}

const LABELS_FR: LabelSet = LabelSet {
    receipt: "Récépissé",
    payment_part: "Section paiement",
    account: "Compte",
    payable_to: "Payable à",
    payable_by: "Payable par",
    reference: "Référence",
    additional_info: "Informations supplémentaires",
    currency: "Monnaie",
    amount: "Montant",
    acceptance_point: "Point de dépôt",
    do_not_use_for_payment: "NE PAS UTILISER POUR LE PAIEMENT",
};

const LABELS_DE: LabelSet = LabelSet {
    receipt: "Empfangsschein",
    payment_part: "Zahlteil",
    account: "Konto",
    payable_to: "Zahlbar an",
    payable_by: "Zahlbar durch",
    reference: "Referenz",
    additional_info: "Zusätzliche Informationen",
    currency: "Währung",
    amount: "Betrag",
    acceptance_point: "Annahmestelle",
    do_not_use_for_payment: "NICHT ZUR ZAHLUNG VERWENDEN",
};

const LABELS_IT: LabelSet = LabelSet {
    receipt: "Ricevuta",
    payment_part: "Sezione pagamento",
    account: "Conto",
    payable_to: "Pagabile a",
    payable_by: "Pagabile da",
    reference: "Riferimento",
    additional_info: "Informazioni supplementari",
    currency: "Valuta",
    amount: "Importo",
    acceptance_point: "Punto di accettazione",
    do_not_use_for_payment: "NON UTILIZZARE PER IL PAGAMENTO",
};

const LABELS_EN: LabelSet = LabelSet {
    receipt: "Receipt",
    payment_part: "Payment part",
    account: "Account",
    payable_to: "Payable to",
    payable_by: "Payable by",
    reference: "Reference",
    additional_info: "Additional information",
    currency: "Currency",
    amount: "Amount",
    acceptance_point: "Acceptance point",
    do_not_use_for_payment: "DO NOT USE FOR PAYMENT",
};

/// Retourne le jeu de libellés d'une langue
pub fn labels(language: Language) -> &'static LabelSet {
    match language {
        Language::Fr => &LABELS_FR,
        Language::De => &LABELS_DE,
        Language::It => &LABELS_IT,
        Language::En => &LABELS_EN,
    }
}
