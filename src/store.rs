//! Read interface consumed by the reporting engine
//!
//! Reports never touch SQL directly: they ask a [`ReportingStore`] for plain
//! value structs and aggregate them in pure functions. [`SqliteStore`] backs
//! the CLI; [`MemoryStore`] serves tests and embedders that already hold
//! their data in memory.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::{self, Category, Property, Transaction, Unit, UnitOccupancy};

pub trait ReportingStore {
    fn property(&self, property_id: i64) -> Result<Option<Property>>;

    fn unit(&self, unit_id: i64) -> Result<Option<Unit>>;

    /// Transactions of a property (optionally one unit) dated within
    /// `from..=to`, ordered by date
    fn transactions(
        &self,
        property_id: i64,
        unit_id: Option<i64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>>;

    fn categories(&self) -> Result<Vec<Category>>;

    fn unit_occupancy(&self, property_id: i64) -> Result<UnitOccupancy>;
}

/// Store backed by the SQLite ledger
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ReportingStore for SqliteStore<'_> {
    fn property(&self, property_id: i64) -> Result<Option<Property>> {
        db::get_property(self.conn, property_id)
    }

    fn unit(&self, unit_id: i64) -> Result<Option<Unit>> {
        db::get_unit(self.conn, unit_id)
    }

    fn transactions(
        &self,
        property_id: i64,
        unit_id: Option<i64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        db::get_transactions(self.conn, property_id, unit_id, from, to)
    }

    fn categories(&self) -> Result<Vec<Category>> {
        db::list_categories(self.conn)
    }

    fn unit_occupancy(&self, property_id: i64) -> Result<UnitOccupancy> {
        db::get_unit_occupancy(self.conn, property_id)
    }
}

/// Store holding everything in vectors; ids are assigned on insert
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    properties: Vec<Property>,
    units: Vec<Unit>,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_property(&mut self, mut property: Property) -> i64 {
        let id = self.properties.len() as i64 + 1;
        property.id = Some(id);
        self.properties.push(property);
        id
    }

    pub fn add_unit(&mut self, mut unit: Unit) -> i64 {
        let id = self.units.len() as i64 + 1;
        unit.id = Some(id);
        self.units.push(unit);
        id
    }

    pub fn add_category(&mut self, mut category: Category) -> i64 {
        let id = self.categories.len() as i64 + 1;
        category.id = Some(id);
        self.categories.push(category);
        id
    }

    pub fn add_transaction(&mut self, mut tx: Transaction) -> i64 {
        let id = self.transactions.len() as i64 + 1;
        tx.id = Some(id);
        self.transactions.push(tx);
        id
    }
}

impl ReportingStore for MemoryStore {
    fn property(&self, property_id: i64) -> Result<Option<Property>> {
        Ok(self
            .properties
            .iter()
            .find(|p| p.id == Some(property_id))
            .cloned())
    }

    fn unit(&self, unit_id: i64) -> Result<Option<Unit>> {
        Ok(self.units.iter().find(|u| u.id == Some(unit_id)).cloned())
    }

    fn transactions(
        &self,
        property_id: i64,
        unit_id: Option<i64>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let mut matching: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| t.property_id == property_id)
            .filter(|t| unit_id.is_none() || t.unit_id == unit_id)
            .filter(|t| t.date >= from && t.date <= to)
            .cloned()
            .collect();
        matching.sort_by_key(|t| (t.date, t.id));
        Ok(matching)
    }

    fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    fn unit_occupancy(&self, property_id: i64) -> Result<UnitOccupancy> {
        let units = self.units.iter().filter(|u| u.property_id == property_id);
        let (occupied, total) = units.fold((0u32, 0u32), |(occ, tot), u| {
            (occ + u32::from(u.is_occupied), tot + 1)
        });
        Ok(UnitOccupancy { occupied, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CategoryType, TransactionType};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn tx(property_id: i64, unit_id: Option<i64>, day: u32) -> Transaction {
        Transaction {
            id: None,
            property_id,
            unit_id,
            category_id: 1,
            account_id: None,
            transaction_type: TransactionType::Income,
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            amount: Decimal::from(100),
            is_tax_deductible: false,
            is_paid: true,
            recurrence: None,
            notes: None,
            source: "TEST".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_memory_store_filters_like_sqlite() {
        let mut store = MemoryStore::new();
        store.add_category(Category {
            id: None,
            name: "Rent".to_string(),
            category_type: CategoryType::Income,
            is_tax_deductible: false,
            is_financing: false,
        });
        store.add_transaction(tx(1, Some(10), 20));
        store.add_transaction(tx(1, None, 5));
        store.add_transaction(tx(2, None, 5));

        let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();

        let all = store.transactions(1, None, from, to).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].date < all[1].date);

        let unit = store.transactions(1, Some(10), from, to).unwrap();
        assert_eq!(unit.len(), 1);

        let narrow = store
            .transactions(1, None, from, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())
            .unwrap();
        assert_eq!(narrow.len(), 1);
    }

    #[test]
    fn test_memory_store_occupancy() {
        let mut store = MemoryStore::new();
        assert_eq!(
            store.unit_occupancy(1).unwrap(),
            UnitOccupancy { occupied: 0, total: 0 }
        );
        for occupied in [true, false, true, true] {
            store.add_unit(Unit {
                id: None,
                property_id: 1,
                name: "u".to_string(),
                is_occupied: occupied,
            });
        }
        assert_eq!(
            store.unit_occupancy(1).unwrap(),
            UnitOccupancy { occupied: 3, total: 4 }
        );
    }
}
