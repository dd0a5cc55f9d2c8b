//! Adresses structurées des parties (créancier, débiteur, client)

use serde::{Deserialize, Serialize};

use super::error::FieldError;

/// Longueurs maximales imposées par le standard du bulletin QR
const MAX_NAME: usize = 70;
const MAX_ADDRESS_LINE: usize = 70;
const MAX_POSTAL_CODE: usize = 16;
const MAX_CITY: usize = 35;

/// Adresse structurée, valeur immuable après validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub postal_code: String,
    pub city: String,
    /// Code pays ISO 3166-1, exactement 2 lettres majuscules
    pub country: String,
}

impl Address {
    /// Valide l'adresse et retourne toutes les violations, sans s'arrêter
    /// à la première. `prefix` qualifie les noms de champs (`creditor`,
    /// `debtor`, `client`) pour que l'appelant puisse les rattacher.
    pub fn validate(&self, prefix: &str) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(FieldError::new(
                format!("{prefix}.name"),
                "le nom est obligatoire",
            ));
        }
        check_field(&mut errors, prefix, "name", &self.name, MAX_NAME);
        check_field(
            &mut errors,
            prefix,
            "address_line1",
            &self.address_line1,
            MAX_ADDRESS_LINE,
        );
        if let Some(ref line2) = self.address_line2 {
            check_field(&mut errors, prefix, "address_line2", line2, MAX_ADDRESS_LINE);
        }
        check_field(
            &mut errors,
            prefix,
            "postal_code",
            &self.postal_code,
            MAX_POSTAL_CODE,
        );
        if self.city.trim().is_empty() {
            errors.push(FieldError::new(
                format!("{prefix}.city"),
                "la localité est obligatoire",
            ));
        }
        check_field(&mut errors, prefix, "city", &self.city, MAX_CITY);

        if self.country.len() != 2 || !self.country.chars().all(|c| c.is_ascii_uppercase()) {
            errors.push(FieldError::new(
                format!("{prefix}.country"),
                "le code pays doit comporter exactement 2 lettres majuscules (ISO 3166-1)",
            ));
        }

        errors
    }
}

/// Vérifie la longueur et le jeu de caractères d'un champ d'adresse.
/// Les caractères de contrôle sont interdits : la charge utile QR est
/// délimitée par des sauts de ligne.
fn check_field(
    errors: &mut Vec<FieldError>,
    prefix: &str,
    field: &str,
    value: &str,
    max_len: usize,
) {
    if value.chars().count() > max_len {
        errors.push(FieldError::new(
            format!("{prefix}.{field}"),
            format!("dépasse la longueur maximale de {max_len} caractères"),
        ));
    }
    if value.chars().any(|c| c.is_control()) {
        errors.push(FieldError::new(
            format!("{prefix}.{field}"),
            "contient des caractères de contrôle interdits",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_address() -> Address {
        Address {
            name: "Chocolaterie Dubois SA".into(),
            address_line1: "Rue de la Gare 12".into(),
            address_line2: None,
            postal_code: "1003".into(),
            city: "Lausanne".into(),
            country: "CH".into(),
        }
    }

    #[test]
    fn valid_address_passes() {
        assert!(sample_address().validate("creditor").is_empty());
    }

    #[test]
    fn collects_all_violations() {
        let address = Address {
            name: "".into(),
            address_line1: "x".repeat(71),
            address_line2: None,
            postal_code: "y".repeat(17),
            city: "".into(),
            country: "Suisse".into(),
        };
        let errors = address.validate("creditor");
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"creditor.name"));
        assert!(fields.contains(&"creditor.address_line1"));
        assert!(fields.contains(&"creditor.postal_code"));
        assert!(fields.contains(&"creditor.city"));
        assert!(fields.contains(&"creditor.country"));
        assert!(errors.len() >= 5);
    }

    #[test]
    fn lowercase_country_rejected() {
        let mut address = sample_address();
        address.country = "ch".into();
        let errors = address.validate("debtor");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "debtor.country");
    }

    #[test]
    fn control_characters_rejected() {
        let mut address = sample_address();
        address.name = "Dubois\nSA".into();
        let errors = address.validate("creditor");
        assert!(errors.iter().any(|e| e.field == "creditor.name"));
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        let mut address = sample_address();
        // 70 caractères accentués : valide malgré plus de 70 octets UTF-8
        address.name = "é".repeat(70);
        assert!(address.validate("creditor").is_empty());
    }
}
