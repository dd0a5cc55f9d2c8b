//! Sérialisation de la charge utile « Swiss Payments Code » (SPC) encodée
//! dans le symbole QR.
//!
//! Le format est positionnel : les lecteurs bancaires adressent les champs
//! par index de ligne. Le nombre et l'ordre des champs sont donc fixes ;
//! une valeur absente occupe sa position sous forme de chaîne vide, jamais
//! par omission de la ligne.

use rust_decimal::Decimal;

use crate::models::error::FieldError;
use crate::models::payment::{PaymentParty, PaymentRecord};

/// Nombre de lignes de la charge utile, invariable
pub const PAYLOAD_FIELD_COUNT: usize = 34;

/// En-tête du format : type, version, codage (Latin-1)
const QR_TYPE: &str = "SPC";
const VERSION: &str = "0200";
const CODING: &str = "1";

/// Fin des données de paiement
const TRAILER: &str = "EPD";

/// Type d'adresse structurée
const ADDRESS_TYPE_STRUCTURED: &str = "S";

/// Sérialise un enregistrement de paiement validé en charge utile SPC.
///
/// L'enregistrement est validé de manière exhaustive avant toute
/// sérialisation ; la moindre violation interrompt l'encodage avec la
/// liste complète des erreurs.
pub fn encode(record: &PaymentRecord) -> Result<String, Vec<FieldError>> {
    let errors = record.validate();
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut fields: Vec<String> = Vec::with_capacity(PAYLOAD_FIELD_COUNT);

    fields.push(QR_TYPE.into());
    fields.push(VERSION.into());
    fields.push(CODING.into());
    fields.push(normalize_account(&record.creditor_account));

    push_party(&mut fields, Some(&record.creditor));

    // Sept positions réservées au créancier final, toujours vides ici
    for _ in 0..7 {
        fields.push(String::new());
    }

    fields.push(record.amount.map(format_amount).unwrap_or_default());
    fields.push(record.currency.code().into());

    push_party(&mut fields, record.debtor.as_ref());

    fields.push(record.reference_type.code().into());
    fields.push(normalize_reference(record.reference.as_deref()));
    fields.push(
        record
            .unstructured_message
            .clone()
            .unwrap_or_default(),
    );

    fields.push(TRAILER.into());
    fields.push(record.bill_information.clone().unwrap_or_default());

    for index in 0..2 {
        fields.push(
            record
                .alternative_procedures
                .get(index)
                .cloned()
                .unwrap_or_default(),
        );
    }

    debug_assert_eq!(fields.len(), PAYLOAD_FIELD_COUNT);
    Ok(fields.join("\n"))
}

/// Sept champs d'adresse : type, nom, ligne 1, ligne 2, NPA, localité,
/// pays. Sans partie, les sept positions restent vides.
fn push_party(fields: &mut Vec<String>, party: Option<&PaymentParty>) {
    match party {
        Some(address) => {
            fields.push(ADDRESS_TYPE_STRUCTURED.into());
            fields.push(address.name.clone());
            fields.push(address.address_line1.clone());
            fields.push(address.address_line2.clone().unwrap_or_default());
            fields.push(address.postal_code.clone());
            fields.push(address.city.clone());
            fields.push(address.country.clone());
        }
        None => {
            for _ in 0..7 {
                fields.push(String::new());
            }
        }
    }
}

/// Montant avec exactement deux décimales, séparateur point
fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn normalize_account(account: &str) -> String {
    account
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

fn normalize_reference(reference: Option<&str>) -> String {
    reference
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::address::Address;
    use crate::models::payment::{Currency, ReferenceType};
    use crate::qrbill::reference::generate_qr_reference;
    use rust_decimal_macros::dec;

    fn base_record() -> PaymentRecord {
        PaymentRecord {
            creditor: Address {
                name: "Chocolaterie Dubois SA".into(),
                address_line1: "Rue de la Gare 12".into(),
                address_line2: None,
                postal_code: "1003".into(),
                city: "Lausanne".into(),
                country: "CH".into(),
            },
            creditor_account: "CH4431999123000889012".into(),
            amount: Some(dec!(1234.56)),
            currency: Currency::Chf,
            debtor: Some(Address {
                name: "Marie Favre".into(),
                address_line1: "Chemin des Vignes 4".into(),
                address_line2: None,
                postal_code: "1700".into(),
                city: "Fribourg".into(),
                country: "CH".into(),
            }),
            reference_type: ReferenceType::Qrr,
            reference: Some(generate_qr_reference("20241278").unwrap()),
            unstructured_message: Some("Facture 2024-1278".into()),
            bill_information: None,
            alternative_procedures: Vec::new(),
        }
    }

    #[test]
    fn payload_has_fixed_field_count_and_order() {
        let payload = encode(&base_record()).unwrap();
        let lines: Vec<&str> = payload.split('\n').collect();
        assert_eq!(lines.len(), PAYLOAD_FIELD_COUNT);
        assert_eq!(lines[0], "SPC");
        assert_eq!(lines[1], "0200");
        assert_eq!(lines[2], "1");
        assert_eq!(lines[3], "CH4431999123000889012");
        assert_eq!(lines[4], "S");
        assert_eq!(lines[5], "Chocolaterie Dubois SA");
        assert_eq!(lines[18], "1234.56");
        assert_eq!(lines[19], "CHF");
        assert_eq!(lines[20], "S");
        assert_eq!(lines[21], "Marie Favre");
        assert_eq!(lines[27], "QRR");
        assert_eq!(lines[30], "EPD");
    }

    #[test]
    fn optional_fields_stay_as_empty_positions() {
        let mut record = base_record();
        record.amount = None;
        record.debtor = None;
        record.unstructured_message = None;
        record.bill_information = None;
        let payload = encode(&record).unwrap();
        let lines: Vec<&str> = payload.split('\n').collect();

        assert_eq!(lines.len(), PAYLOAD_FIELD_COUNT);
        assert_eq!(lines[18], ""); // montant
        for position in 20..27 {
            assert_eq!(lines[position], "", "champ débiteur {position}");
        }
        assert_eq!(lines[29], ""); // message
        assert_eq!(lines[31], ""); // informations de facturation
        assert_eq!(lines[32], "");
        assert_eq!(lines[33], "");
    }

    #[test]
    fn ultimate_creditor_fields_always_empty() {
        let payload = encode(&base_record()).unwrap();
        let lines: Vec<&str> = payload.split('\n').collect();
        for position in 11..18 {
            assert_eq!(lines[position], "", "champ créancier final {position}");
        }
    }

    #[test]
    fn scenario_amount_currency_reference_type() {
        let payload = encode(&base_record()).unwrap();
        let lines: Vec<&str> = payload.split('\n').collect();
        assert_eq!(lines[18], "1234.56");
        assert_eq!(lines[19], "CHF");
        assert_eq!(lines[27], "QRR");
        assert_eq!(lines[28].len(), 27);
    }

    #[test]
    fn invalid_record_never_serialized() {
        let mut record = base_record();
        record.reference_type = ReferenceType::Non; // référence encore présente
        let errors = encode(&record).unwrap_err();
        assert!(!errors.is_empty());
        assert!(errors.iter().any(|e| e.field == "reference"));
    }

    #[test]
    fn alternative_procedures_occupy_last_positions() {
        let mut record = base_record();
        record.alternative_procedures =
            vec!["eBill/B/echocolaterie@example.ch".into()];
        let payload = encode(&record).unwrap();
        let lines: Vec<&str> = payload.split('\n').collect();
        assert_eq!(lines[32], "eBill/B/echocolaterie@example.ch");
        assert_eq!(lines[33], "");
    }

    #[test]
    fn amount_always_two_decimals() {
        let mut record = base_record();
        record.amount = Some(dec!(7));
        let payload = encode(&record).unwrap();
        assert_eq!(payload.split('\n').nth(18).unwrap(), "7.00");
    }
}
