use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionType {
    Income,
    Expense,
    Investment, // Capital put into the property (down payment, improvements)
    Transfer,   // Movement between accounts, ignored by reports
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
            TransactionType::Investment => "INVESTMENT",
            TransactionType::Transfer => "TRANSFER",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" | "IN" | "I" => Ok(TransactionType::Income),
            "EXPENSE" | "OUT" | "E" => Ok(TransactionType::Expense),
            "INVESTMENT" | "CAPITAL" => Ok(TransactionType::Investment),
            "TRANSFER" => Ok(TransactionType::Transfer),
            _ => Err(()),
        }
    }
}

/// Category kind (income or expense)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Income => "INCOME",
            CategoryType::Expense => "EXPENSE",
        }
    }
}

impl FromStr for CategoryType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INCOME" => Ok(CategoryType::Income),
            "EXPENSE" => Ok(CategoryType::Expense),
            _ => Err(()),
        }
    }
}

/// Transaction category (Rent, Repairs, Mortgage Interest, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: Option<i64>,
    pub name: String,
    pub category_type: CategoryType,
    pub is_tax_deductible: bool,
    /// Expense category that represents financing (mortgage) costs
    pub is_financing: bool,
}

impl Category {
    /// Income and expense entries must match the category type; investments
    /// and transfers may use any category
    pub fn accepts(&self, transaction_type: TransactionType) -> bool {
        match transaction_type {
            TransactionType::Income => self.category_type == CategoryType::Income,
            TransactionType::Expense => self.category_type == CategoryType::Expense,
            TransactionType::Investment | TransactionType::Transfer => true,
        }
    }

    pub fn ensure_accepts(&self, transaction_type: TransactionType) -> anyhow::Result<()> {
        if self.accepts(transaction_type) {
            return Ok(());
        }
        Err(anyhow::anyhow!(
            "{} transaction cannot use {} category '{}'",
            transaction_type.as_str(),
            self.category_type.as_str(),
            self.name
        ))
    }
}

/// A rental property and its acquisition/valuation data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: Option<i64>,
    pub name: String,
    pub address: Option<String>,
    pub purchase_price: Decimal,
    pub purchase_date: NaiveDate,
    pub current_value: Option<Decimal>,
    pub valuation_date: Option<NaiveDate>,
}

impl Property {
    /// Current value, falling back to the purchase price when never revalued
    pub fn effective_value(&self) -> Decimal {
        self.current_value.unwrap_or(self.purchase_price)
    }
}

/// Rentable unit within a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    pub id: Option<i64>,
    pub property_id: i64,
    pub name: String,
    pub is_occupied: bool,
}

/// Occupied/total unit counts for a property
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitOccupancy {
    pub occupied: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecurrenceFrequency {
    Monthly,
    Quarterly,
    Yearly,
}

impl RecurrenceFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceFrequency::Monthly => "MONTHLY",
            RecurrenceFrequency::Quarterly => "QUARTERLY",
            RecurrenceFrequency::Yearly => "YEARLY",
        }
    }
}

impl FromStr for RecurrenceFrequency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MONTHLY" => Ok(RecurrenceFrequency::Monthly),
            "QUARTERLY" => Ok(RecurrenceFrequency::Quarterly),
            "YEARLY" | "ANNUAL" => Ok(RecurrenceFrequency::Yearly),
            _ => Err(()),
        }
    }
}

/// Recurrence schedule attached to a transaction (informational)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recurrence {
    pub frequency: RecurrenceFrequency,
    pub until: Option<NaiveDate>,
}

/// Ledger entry belonging to exactly one property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<i64>,
    pub property_id: i64,
    pub unit_id: Option<i64>,
    pub category_id: i64,
    pub account_id: Option<i64>,
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub is_tax_deductible: bool,
    pub is_paid: bool,
    pub recurrence: Option<Recurrence>,
    pub notes: Option<String>,
    pub source: String, // 'MANUAL', 'CSV'
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_accepts_matching_types() {
        let repairs = Category {
            id: Some(1),
            name: "Repairs".to_string(),
            category_type: CategoryType::Expense,
            is_tax_deductible: true,
            is_financing: false,
        };
        assert!(repairs.accepts(TransactionType::Expense));
        assert!(repairs.accepts(TransactionType::Investment));
        assert!(repairs.accepts(TransactionType::Transfer));
        assert!(!repairs.accepts(TransactionType::Income));

        let err = repairs.ensure_accepts(TransactionType::Income).unwrap_err();
        assert!(err.to_string().contains("INCOME transaction cannot use EXPENSE category 'Repairs'"));
    }

    #[test]
    fn test_transaction_type_round_trip() {
        for tx_type in [
            TransactionType::Income,
            TransactionType::Expense,
            TransactionType::Investment,
            TransactionType::Transfer,
        ] {
            assert_eq!(tx_type.as_str().parse::<TransactionType>(), Ok(tx_type));
        }
        assert_eq!("out".parse::<TransactionType>(), Ok(TransactionType::Expense));
        assert!("refund".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_effective_value_falls_back_to_purchase_price() {
        let mut property = Property {
            id: Some(1),
            name: "Elm St Duplex".to_string(),
            address: None,
            purchase_price: Decimal::from(200_000),
            purchase_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            current_value: None,
            valuation_date: None,
        };
        assert_eq!(property.effective_value(), Decimal::from(200_000));

        property.current_value = Some(Decimal::from(250_000));
        assert_eq!(property.effective_value(), Decimal::from(250_000));
    }

    #[test]
    fn test_recurrence_frequency_aliases() {
        assert_eq!(
            "annual".parse::<RecurrenceFrequency>(),
            Ok(RecurrenceFrequency::Yearly)
        );
        assert_eq!(
            RecurrenceFrequency::Quarterly.as_str(),
            "QUARTERLY"
        );
    }
}
