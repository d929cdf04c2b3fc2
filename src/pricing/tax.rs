//! GST split across the two rate families

use rust_decimal::Decimal;

use crate::domain::aggregates::TaxFamily;
use crate::domain::value_objects::Money;
use crate::pricing::PricedLine;
use crate::{Result, StorefrontError};

/// Rates are percentages (`18` means 18%).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaxPolicy {
    reduced_rate: Decimal,
    standard_rate: Decimal,
    reduced_keywords: Vec<String>,
}

impl Default for TaxPolicy {
    fn default() -> Self {
        Self { reduced_rate: Decimal::from(5), standard_rate: Decimal::from(18), reduced_keywords: vec![] }
    }
}

impl TaxPolicy {
    pub fn new(reduced_rate: Decimal, standard_rate: Decimal, reduced_keywords: Vec<String>) -> Result<Self> {
        for rate in [reduced_rate, standard_rate] {
            if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                return Err(StorefrontError::Validation(format!("tax rate {rate} must be within 0..=100")));
            }
        }
        let reduced_keywords = reduced_keywords
            .into_iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Ok(Self { reduced_rate, standard_rate, reduced_keywords })
    }

    pub fn rate_for(&self, family: TaxFamily) -> Decimal {
        match family {
            TaxFamily::Reduced => self.reduced_rate,
            TaxFamily::Standard => self.standard_rate,
        }
    }

    /// An explicit tax class wins; otherwise the category is matched against the keywords.
    pub fn family_of(&self, category: &str, tax_class: Option<TaxFamily>) -> TaxFamily {
        if let Some(family) = tax_class {
            return family;
        }
        let category = category.to_lowercase();
        if self.reduced_keywords.iter().any(|k| category.contains(k.as_str())) {
            TaxFamily::Reduced
        } else {
            TaxFamily::Standard
        }
    }

    /// Tax on the cart after `discount`, spread over both families in proportion
    /// to their gross share, floored to a whole unit.
    pub fn compute_tax(&self, lines: &[PricedLine], discount: Money) -> Money {
        let (mut reduced, mut standard) = (Decimal::ZERO, Decimal::ZERO);
        for line in lines {
            match self.family_of(&line.category, line.tax_class) {
                TaxFamily::Reduced => reduced += line.line_total().amount(),
                TaxFamily::Standard => standard += line.line_total().amount(),
            }
        }

        let gross = reduced + standard;
        if gross <= Decimal::ZERO {
            return Money::ZERO;
        }

        let discounted = (gross - discount.amount()).max(Decimal::ZERO);
        let reduced_portion = discounted * reduced / gross;
        let standard_portion = discounted - reduced_portion;
        let tax = (reduced_portion * self.rate_for(TaxFamily::Reduced)
            + standard_portion * self.rate_for(TaxFamily::Standard))
            / Decimal::ONE_HUNDRED;
        Money::new(tax.max(Decimal::ZERO)).floor()
    }
}
