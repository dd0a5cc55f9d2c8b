//! Données de paiement du bulletin QR : créancier, débiteur, montant,
//! référence. Construites par requête de génération, validées une seule
//! fois, puis consommées en lecture seule par le pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::error::FieldError;
use crate::qrbill::reference;

/// Une partie au paiement est une adresse structurée ; le créancier possède
/// en plus l'IBAN du compte, porté par [`PaymentRecord::creditor_account`].
pub type PaymentParty = Address;

/// Longueurs maximales du standard de la charge utile QR
const MAX_REFERENCE: usize = 27;
const MAX_MESSAGE: usize = 140;
const MAX_BILL_INFORMATION: usize = 140;
const MAX_ALTERNATIVE_PROCEDURES: usize = 2;
const MAX_ALTERNATIVE_PROCEDURE_LEN: usize = 100;

/// Bornes du montant admissible, en centimes (deux décimales)
const AMOUNT_MIN_CENTS: i64 = 1; // 0.01
const AMOUNT_MAX_CENTS: i64 = 99_999_999_999; // 999'999'999.99

/// Type de référence du paiement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceType {
    /// Référence QR à 27 chiffres, protégée par somme de contrôle,
    /// réservée aux QR-IBAN
    #[serde(rename = "QRR")]
    Qrr,
    /// Référence créancier ISO 11649
    #[serde(rename = "SCOR")]
    Scor,
    /// Sans référence
    #[serde(rename = "NON")]
    Non,
}

impl ReferenceType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Qrr => "QRR",
            Self::Scor => "SCOR",
            Self::Non => "NON",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "QRR" => Some(Self::Qrr),
            "SCOR" => Some(Self::Scor),
            "NON" => Some(Self::Non),
            _ => None,
        }
    }
}

/// Monnaies admises par le bulletin QR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "CHF")]
    Chf,
    #[serde(rename = "EUR")]
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Chf => "CHF",
            Self::Eur => "EUR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "CHF" => Some(Self::Chf),
            "EUR" => Some(Self::Eur),
            _ => None,
        }
    }
}

/// Enregistrement de paiement complet, tel que fourni par l'appelant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub creditor: PaymentParty,
    /// IBAN du compte créancier (QR-IBAN obligatoire pour une référence QRR)
    pub creditor_account: String,
    /// Montant à deux décimales, ou absent pour un bulletin à montant libre
    #[serde(default)]
    pub amount: Option<Decimal>,
    pub currency: Currency,
    #[serde(default)]
    pub debtor: Option<PaymentParty>,
    pub reference_type: ReferenceType,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub unstructured_message: Option<String>,
    #[serde(default)]
    pub bill_information: Option<String>,
    #[serde(default)]
    pub alternative_procedures: Vec<String>,
}

impl PaymentRecord {
    /// Valide l'enregistrement complet et retourne toutes les violations
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = self.creditor.validate("creditor");
        if let Some(ref debtor) = self.debtor {
            errors.extend(debtor.validate("debtor"));
        }

        let account_valid = reference::is_valid_iban(&self.creditor_account);
        if !account_valid {
            errors.push(FieldError::new(
                "creditor_account",
                "IBAN invalide (structure ou somme de contrôle ISO 7064)",
            ));
        }

        if let Some(amount) = self.amount {
            if amount != amount.round_dp(2) {
                errors.push(FieldError::new(
                    "amount",
                    "le montant doit comporter au plus deux décimales",
                ));
            }
            if amount < Decimal::new(AMOUNT_MIN_CENTS, 2) || amount > Decimal::new(AMOUNT_MAX_CENTS, 2) {
                errors.push(FieldError::new(
                    "amount",
                    "le montant doit être compris entre 0.01 et 999999999.99",
                ));
            }
        }

        self.validate_reference(&mut errors, account_valid);

        if let Some(ref message) = self.unstructured_message {
            if message.chars().count() > MAX_MESSAGE {
                errors.push(FieldError::new(
                    "unstructured_message",
                    format!("dépasse la longueur maximale de {MAX_MESSAGE} caractères"),
                ));
            }
        }
        if let Some(ref info) = self.bill_information {
            if info.chars().count() > MAX_BILL_INFORMATION {
                errors.push(FieldError::new(
                    "bill_information",
                    format!("dépasse la longueur maximale de {MAX_BILL_INFORMATION} caractères"),
                ));
            }
        }

        if self.alternative_procedures.len() > MAX_ALTERNATIVE_PROCEDURES {
            errors.push(FieldError::new(
                "alternative_procedures",
                format!("au plus {MAX_ALTERNATIVE_PROCEDURES} procédures alternatives"),
            ));
        }
        for (index, procedure) in self.alternative_procedures.iter().enumerate() {
            if procedure.chars().count() > MAX_ALTERNATIVE_PROCEDURE_LEN {
                errors.push(FieldError::new(
                    format!("alternative_procedures[{index}]"),
                    format!(
                        "dépasse la longueur maximale de {MAX_ALTERNATIVE_PROCEDURE_LEN} caractères"
                    ),
                ));
            }
        }

        errors
    }

    /// Invariants liant le type de référence, la référence et le compte
    fn validate_reference(&self, errors: &mut Vec<FieldError>, account_valid: bool) {
        let reference = self.reference.as_deref().unwrap_or("").trim();

        if reference.chars().count() > MAX_REFERENCE {
            errors.push(FieldError::new(
                "reference",
                format!("dépasse la longueur maximale de {MAX_REFERENCE} caractères"),
            ));
        }

        let qr_account = account_valid && reference::is_qr_iban(&self.creditor_account);

        match self.reference_type {
            ReferenceType::Qrr => {
                if account_valid && !qr_account {
                    errors.push(FieldError::new(
                        "creditor_account",
                        "une référence QRR exige un QR-IBAN (IID 30000-31999)",
                    ));
                }
                if !reference::is_valid_qr_reference(reference) {
                    errors.push(FieldError::new(
                        "reference",
                        "référence QR invalide (27 chiffres, contrôle mod-10 récursif)",
                    ));
                }
            }
            ReferenceType::Scor => {
                if qr_account {
                    errors.push(FieldError::new(
                        "reference_type",
                        "un QR-IBAN exige une référence de type QRR",
                    ));
                }
                if !reference::is_valid_creditor_reference(reference) {
                    errors.push(FieldError::new(
                        "reference",
                        "référence créancier ISO 11649 invalide",
                    ));
                }
            }
            ReferenceType::Non => {
                if qr_account {
                    errors.push(FieldError::new(
                        "reference_type",
                        "un QR-IBAN exige une référence de type QRR",
                    ));
                }
                if !reference.is_empty() {
                    errors.push(FieldError::new(
                        "reference",
                        "aucune référence admise avec le type NON",
                    ));
                }
            }
        }
    }
}
