//! Numéros de référence bancaires : IBAN suisse, QR-IBAN, référence QR
//! (contrôle mod-10 récursif) et référence créancier ISO 11649.
//!
//! Les deux sommes de contrôle doivent être exactes au bit près : un seul
//! chiffre faux et le paiement est rejeté par la banque.

use crate::models::error::ReferenceError;

/// Table de retenue du contrôle mod-10 récursif
const MOD10_TABLE: [u8; 10] = [0, 9, 4, 6, 8, 2, 7, 1, 3, 5];

/// Plage des IID (identifiants d'institution) réservée aux QR-IBAN
const QR_IID_RANGE: std::ops::RangeInclusive<u32> = 30_000..=31_999;

/// Longueur d'un IBAN suisse normalisé
const CH_IBAN_LEN: usize = 21;

/// Nombre de chiffres d'une référence QR complète
const QR_REFERENCE_LEN: usize = 27;

/// Supprime les espaces et passe en majuscules
fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Vérifie la structure et la somme de contrôle ISO 7064 MOD97-10 d'un
/// IBAN suisse (`CH` + 19 caractères alphanumériques).
pub fn is_valid_iban(iban: &str) -> bool {
    let iban = normalize(iban);
    if !iban.is_ascii() || iban.len() != CH_IBAN_LEN || !iban.starts_with("CH") {
        return false;
    }
    if !iban
        .chars()
        .skip(2)
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    {
        return false;
    }

    // Les 4 premiers caractères passent en fin, les lettres valent A=10…Z=35,
    // puis reste de la division par 97 calculé au fil des chiffres
    let rearranged = format!("{}{}", &iban[4..], &iban[..4]);
    let mut remainder: u32 = 0;
    for c in rearranged.chars() {
        let value = c.to_digit(36).unwrap_or(0);
        remainder = if value < 10 {
            (remainder * 10 + value) % 97
        } else {
            (remainder * 100 + value) % 97
        };
    }
    remainder == 1
}

/// Détecte un QR-IBAN : IID (caractères 5 à 9) dans la plage 30000–31999
pub fn is_qr_iban(iban: &str) -> bool {
    let iban = normalize(iban);
    if !iban.is_ascii() || iban.len() != CH_IBAN_LEN || !iban.starts_with("CH") {
        return false;
    }
    iban[4..9]
        .parse::<u32>()
        .map(|iid| QR_IID_RANGE.contains(&iid))
        .unwrap_or(false)
}

/// Génère une référence QR de 27 chiffres à partir d'une référence client.
///
/// Les caractères non numériques sont ignorés ; les chiffres restants sont
/// complétés à gauche par des zéros jusqu'à 26 positions (seuls les 26
/// derniers chiffres sont conservés), puis le chiffre de contrôle mod-10
/// récursif est ajouté. Déterministe : même entrée, même sortie.
pub fn generate_qr_reference(customer_ref: &str) -> Result<String, ReferenceError> {
    let digits: Vec<u8> = customer_ref
        .chars()
        .filter(|c| c.is_ascii_digit())
        .map(|c| c as u8 - b'0')
        .collect();
    if digits.is_empty() {
        return Err(ReferenceError::EmptyCustomerReference);
    }

    let tail = if digits.len() > QR_REFERENCE_LEN - 1 {
        &digits[digits.len() - (QR_REFERENCE_LEN - 1)..]
    } else {
        &digits[..]
    };
    let mut padded = vec![0u8; (QR_REFERENCE_LEN - 1) - tail.len()];
    padded.extend_from_slice(tail);

    let check = mod10_check_digit(&padded);
    let mut reference: String = padded.iter().map(|d| char::from(b'0' + d)).collect();
    reference.push(char::from(b'0' + check));
    Ok(reference)
}

/// Valide une référence QR : exactement 27 chiffres dont le dernier est le
/// chiffre de contrôle recalculé sur les 26 premiers.
pub fn is_valid_qr_reference(reference: &str) -> bool {
    let reference = normalize(reference);
    if reference.len() != QR_REFERENCE_LEN || !reference.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u8> = reference.bytes().map(|b| b - b'0').collect();
    mod10_check_digit(&digits[..QR_REFERENCE_LEN - 1]) == digits[QR_REFERENCE_LEN - 1]
}

/// Contrôle de forme d'une référence créancier ISO 11649 :
/// `RF` + 2 chiffres + 1 à 21 caractères alphanumériques
pub fn is_valid_creditor_reference(reference: &str) -> bool {
    let reference = normalize(reference);
    if !reference.is_ascii()
        || !(5..=25).contains(&reference.len())
        || !reference.starts_with("RF")
    {
        return false;
    }
    reference[2..4].chars().all(|c| c.is_ascii_digit())
        && reference[4..].chars().all(|c| c.is_ascii_alphanumeric())
}

/// Formatage d'affichage d'un IBAN, par groupes de 4. Aucune validation.
pub fn format_iban(iban: &str) -> String {
    group_by(&normalize(iban), &[4, 4, 4, 4, 4, 4])
}

/// Formatage d'affichage d'une référence QR selon le découpage canonique
/// 2-5-5-5-5-5. Aucune validation.
pub fn format_qr_reference(reference: &str) -> String {
    group_by(&normalize(reference), &[2, 5, 5, 5, 5, 5])
}

fn mod10_check_digit(digits: &[u8]) -> u8 {
    let mut carry = 0usize;
    for &digit in digits {
        carry = MOD10_TABLE[(carry + digit as usize) % 10] as usize;
    }
    ((10 - carry) % 10) as u8
}

fn group_by(value: &str, groups: &[usize]) -> String {
    let mut chars = value.chars();
    let mut parts: Vec<String> = Vec::new();
    for &len in groups {
        let part: String = chars.by_ref().take(len).collect();
        if part.is_empty() {
            break;
        }
        parts.push(part);
    }
    let rest: String = chars.collect();
    if !rest.is_empty() {
        parts.push(rest);
    }
    parts.join(" ")
}
