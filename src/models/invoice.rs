//! Document de facture : lignes, rabais, coordonnées de l'entreprise.
//! Les agrégats (sous-total, TVA par taux, total général) sont calculés par
//! le composeur de document, jamais stockés ici.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::error::FieldError;
use super::payment::Currency;

/// Type de rabais
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    Percent,
    Flat,
}

/// Rabais de ligne
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub kind: DiscountKind,
    pub value: Decimal,
}

/// Rabais global appliqué après les rabais de ligne
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalDiscount {
    pub kind: DiscountKind,
    pub value: Decimal,
    #[serde(default)]
    pub note: Option<String>,
}

/// Ligne de facturation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Taux de TVA en pour cent
    pub vat_rate: Decimal,
    /// Vrai si le prix unitaire est TTC : le montant net et la TVA sont
    /// alors extraits du brut lors de l'agrégation
    #[serde(default)]
    pub vat_inclusive: bool,
    #[serde(default)]
    pub discount: Option<Discount>,
}

impl LineItem {
    /// Montant brut = quantité × prix unitaire, avant tout rabais
    pub fn gross_amount(&self) -> Decimal {
        self.quantity * self.unit_price
    }

    /// Montant du rabais de ligne : un pourcentage est borné à [0, 100],
    /// un montant fixe est borné au montant de la ligne
    pub fn discount_amount(&self) -> Decimal {
        let gross = self.gross_amount();
        match &self.discount {
            None => Decimal::ZERO,
            Some(discount) => match discount.kind {
                DiscountKind::Percent => {
                    let rate = discount.value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
                    gross * rate / Decimal::ONE_HUNDRED
                }
                DiscountKind::Flat => discount.value.clamp(Decimal::ZERO, gross),
            },
        }
    }

    /// Montant net de la ligne = brut − rabais
    pub fn net_amount(&self) -> Decimal {
        self.gross_amount() - self.discount_amount()
    }

    /// Validation détaillée avec noms de champs indexés
    pub fn validate(&self, index: usize) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.description.trim().is_empty() {
            errors.push(FieldError::new(
                format!("items[{index}].description"),
                "la description est obligatoire",
            ));
        }
        if self.quantity <= Decimal::ZERO {
            errors.push(FieldError::new(
                format!("items[{index}].quantity"),
                "la quantité doit être supérieure à 0",
            ));
        }
        if self.unit_price < Decimal::ZERO {
            errors.push(FieldError::new(
                format!("items[{index}].unit_price"),
                "le prix unitaire ne peut pas être négatif",
            ));
        }
        if self.vat_rate < Decimal::ZERO {
            errors.push(FieldError::new(
                format!("items[{index}].vat_rate"),
                "le taux de TVA ne peut pas être négatif",
            ));
        }

        errors
    }
}

/// Coordonnées de l'entreprise émettrice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(flatten)]
    pub address: Address,
    #[serde(default)]
    pub vat_number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// Facture complète telle que fournie par l'appelant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub company: CompanyInfo,
    pub client: Address,
    pub items: Vec<LineItem>,
    pub currency: Currency,
    #[serde(default)]
    pub global_discount: Option<GlobalDiscount>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
}

impl InvoiceDocument {
    /// Valide la facture complète et retourne toutes les violations
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.invoice_number.trim().is_empty() {
            errors.push(FieldError::new(
                "invoice_number",
                "le numéro de facture est obligatoire",
            ));
        }
        if self.due_date < self.issue_date {
            errors.push(FieldError::new(
                "due_date",
                "l'échéance ne peut pas précéder la date d'émission",
            ));
        }

        errors.extend(self.company.address.validate("company"));
        errors.extend(self.client.validate("client"));

        if self.items.is_empty() {
            errors.push(FieldError::new(
                "items",
                "la facture doit contenir au moins une ligne",
            ));
        }
        for (index, item) in self.items.iter().enumerate() {
            errors.extend(item.validate(index));
        }

        if let Some(ref discount) = self.global_discount {
            if discount.value < Decimal::ZERO {
                errors.push(FieldError::new(
                    "global_discount.value",
                    "le rabais ne peut pas être négatif",
                ));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(quantity: Decimal, unit_price: Decimal) -> LineItem {
        LineItem {
            description: "Pralinés 500g".into(),
            quantity,
            unit_price,
            vat_rate: dec!(8.1),
            vat_inclusive: false,
            discount: None,
        }
    }

    #[test]
    fn gross_amount_is_quantity_times_price() {
        assert_eq!(line(dec!(3), dec!(12.50)).gross_amount(), dec!(37.50));
    }

    #[test]
    fn percent_discount_clipped_to_hundred() {
        let mut item = line(dec!(1), dec!(100));
        item.discount = Some(Discount {
            kind: DiscountKind::Percent,
            value: dec!(150),
        });
        assert_eq!(item.discount_amount(), dec!(100));
        assert_eq!(item.net_amount(), Decimal::ZERO);
    }

    #[test]
    fn flat_discount_clipped_to_line_amount() {
        let mut item = line(dec!(2), dec!(10));
        item.discount = Some(Discount {
            kind: DiscountKind::Flat,
            value: dec!(50),
        });
        assert_eq!(item.discount_amount(), dec!(20));
        assert_eq!(item.net_amount(), Decimal::ZERO);
    }

    #[test]
    fn ordinary_discounts() {
        let mut item = line(dec!(4), dec!(25));
        item.discount = Some(Discount {
            kind: DiscountKind::Percent,
            value: dec!(10),
        });
        assert_eq!(item.net_amount(), dec!(90.0));

        item.discount = Some(Discount {
            kind: DiscountKind::Flat,
            value: dec!(15),
        });
        assert_eq!(item.net_amount(), dec!(85));
    }

    #[test]
    fn line_validation_collects_everything() {
        let item = LineItem {
            description: " ".into(),
            quantity: Decimal::ZERO,
            unit_price: dec!(-1),
            vat_rate: dec!(-8.1),
            vat_inclusive: false,
            discount: None,
        };
        let errors = item.validate(2);
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().all(|e| e.field.starts_with("items[2].")));
    }
}
