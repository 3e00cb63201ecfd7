//! Product catalog kept in `product_list.csv`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::domain::aggregates::{Product, ProductColumn, ProductFields, StockLevel};
use crate::domain::value_objects::ProductId;
use crate::store::csv_table::CsvTable;
use crate::{Result, StorefrontError};

/// One purchased line to take out of stock.
#[derive(Clone, Debug)]
pub struct Purchase {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityChange {
    pub id: String,
    pub name: String,
    pub old_quantity: u32,
    pub new_quantity: u32,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct StockUpdate {
    pub updated: Vec<QuantityChange>,
    pub missing: Vec<String>,
}

pub struct ProductCatalog {
    path: PathBuf,
    currency: String,
    lock: Mutex<()>,
}

/// Header positions of the catalog columns. The key always lives in column 0.
struct Layout([Option<usize>; 7]);

impl Layout {
    fn of(table: &CsvTable) -> Self {
        let mut slots = [None; 7];
        for (slot, column) in slots.iter_mut().zip(ProductColumn::ALL) {
            *slot = match column {
                ProductColumn::Id => Some(0),
                other => table.try_column(other.header()),
            };
        }
        Self(slots)
    }

    fn index(&self, column: ProductColumn) -> Result<usize> {
        let at = ProductColumn::ALL.iter().position(|c| *c == column).unwrap_or(0);
        self.0[at].ok_or_else(|| StorefrontError::MalformedCatalog(format!("missing column '{}'", column.header())))
    }

    fn fields(&self, table: &CsvTable, row: usize) -> Result<ProductFields> {
        let cell = |c: ProductColumn| -> Result<String> { Ok(table.cell(row, self.index(c)?).to_string()) };
        Ok(ProductFields {
            category: cell(ProductColumn::Category)?,
            name: cell(ProductColumn::Name)?,
            price: cell(ProductColumn::Price)?,
            description: cell(ProductColumn::Description)?,
            quantity: cell(ProductColumn::Quantity)?,
            image_url: cell(ProductColumn::ImageUrl)?,
        })
    }
}

impl ProductCatalog {
    pub fn open(path: impl Into<PathBuf>, currency: &str) -> Self {
        let path = path.into();
        if path.exists() {
            tracing::info!(path = %path.display(), "product catalog");
        } else {
            tracing::error!(path = %path.display(), "product catalog file not found");
        }
        Self { path, currency: currency.to_string(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Every readable product. Rows that do not parse are skipped with a warning.
    pub fn list(&self) -> Result<Vec<Product>> {
        let table = CsvTable::read(&self.path)?;
        let layout = Layout::of(&table);
        let mut products = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            match self.restore(&table, &layout, row) {
                Ok(product) => products.push(product),
                Err(StorefrontError::MalformedCatalog(reason)) => tracing::warn!(%reason, "skipping unreadable product row"),
                Err(e) => return Err(e),
            }
        }
        Ok(products)
    }

    pub fn get(&self, id: &ProductId) -> Result<Product> {
        let table = CsvTable::read(&self.path)?;
        let row = table.find_row(id.as_str()).ok_or_else(|| StorefrontError::ProductNotFound(id.to_string()))?;
        self.restore(&table, &Layout::of(&table), row)
    }

    /// Takes purchased units out of stock, clamping at zero. Only the Quantity cell of
    /// matched rows changes. Nothing is written when no product matches.
    pub fn update_quantities(&self, purchases: &[Purchase]) -> Result<StockUpdate> {
        let _guard = self.guard()?;
        let mut table = CsvTable::read(&self.path)?;
        let layout = Layout::of(&table);
        let name_at = layout.index(ProductColumn::Name)?;
        let quantity_at = layout.index(ProductColumn::Quantity)?;

        let mut wanted: BTreeMap<&str, u32> = BTreeMap::new();
        for p in purchases {
            let total = wanted.entry(p.product_id.as_str()).or_default();
            *total = total.saturating_add(p.quantity);
        }

        let mut update = StockUpdate::default();
        let mut events = Vec::new();
        for (id, qty) in &wanted {
            let Some(row) = table.find_row(id) else {
                tracing::warn!(product_id = %id, "purchased product not in catalog");
                update.missing.push(id.to_string());
                continue;
            };
            let key = ProductId::new(*id)?;
            let mut stock = StockLevel::restore(key, table.cell(row, name_at), table.cell(row, quantity_at));
            let (old, new) = stock.remove(*qty);
            table.set(row, quantity_at, new.to_string());
            update.updated.push(QuantityChange {
                id: id.to_string(), name: stock.name().to_string(), old_quantity: old.value(), new_quantity: new.value(),
            });
            events.extend(stock.take_events());
        }

        if update.updated.is_empty() {
            return Err(StorefrontError::ProductNotFound(update.missing.join(", ")));
        }
        table.write(&self.path)?;
        events.iter().for_each(|e| e.log());
        Ok(update)
    }

    /// Overwrites the editable columns of one row.
    pub fn update_product(&self, id: &ProductId, fields: &ProductFields) -> Result<Product> {
        let _guard = self.guard()?;
        let mut table = CsvTable::read(&self.path)?;
        let layout = Layout::of(&table);
        let row = table.find_row(id.as_str()).ok_or_else(|| StorefrontError::ProductNotFound(id.to_string()))?;

        let mut product = self.restore(&table, &layout, row)?;
        product.update(fields)?;
        for column in ProductColumn::EDITABLE {
            table.set(row, layout.index(column)?, product.cell(column));
        }
        table.write(&self.path)?;
        product.take_events().iter().for_each(|e| e.log());
        Ok(product)
    }

    /// Appends a product. Without an id the next numeric id is allocated.
    pub fn add_product(&self, id: Option<ProductId>, fields: &ProductFields) -> Result<Product> {
        let _guard = self.guard()?;
        let mut table = if self.path.exists() {
            CsvTable::read(&self.path)?
        } else {
            CsvTable::new(ProductColumn::ALL.map(|c| c.header()))
        };
        let layout = Layout::of(&table);

        let id = match id {
            Some(id) => id,
            None => next_id(&table)?,
        };
        if table.find_row(id.as_str()).is_some() {
            return Err(StorefrontError::DuplicateProduct(id.to_string()));
        }

        let mut product = Product::create(id, fields, &self.currency)?;
        let mut row = vec![String::new(); table.headers().len().max(1)];
        for column in ProductColumn::ALL {
            let at = layout.index(column)?;
            if row.len() <= at { row.resize(at + 1, String::new()); }
            row[at] = product.cell(column);
        }
        table.push(row);
        table.write(&self.path)?;
        product.take_events().iter().for_each(|e| e.log());
        Ok(product)
    }

    fn restore(&self, table: &CsvTable, layout: &Layout, row: usize) -> Result<Product> {
        let id = ProductId::new(table.cell(row, 0))
            .map_err(|e| StorefrontError::MalformedCatalog(format!("row {}: {}", row + 2, e)))?;
        let fields = layout.fields(table, row)?;
        Product::restore(id, &fields, &self.currency)
            .map_err(|e| StorefrontError::MalformedCatalog(format!("row {}: {}", row + 2, e)))
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| StorefrontError::Io(std::io::Error::other("product catalog lock poisoned")))
    }
}

fn next_id(table: &CsvTable) -> Result<ProductId> {
    let max = table.rows().iter().filter_map(|r| r.first()?.trim().parse::<u64>().ok()).max().unwrap_or(0);
    Ok(ProductId::new((max + 1).to_string())?)
}
