//! Discount codes kept in `discount_codes.csv`.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::domain::aggregates::{DiscountCode, DiscountPatch};
use crate::domain::value_objects::{DiscountPercent, PromoCode};
use crate::store::csv_table::CsvTable;
use crate::{Result, StorefrontError};

const HEADER: [&str; 4] = ["id", "code", "discount", "isActive"];

/// Codes written when the book is empty.
pub const DEFAULT_CODES: [(&str, &str, i64); 5] = [
    ("1", "FREE5", 5),
    ("2", "FREE25", 25),
    ("3", "FREE50", 50),
    ("4", "FREE75", 75),
    ("5", "FREE100", 100),
];

pub struct DiscountBook {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DiscountBook {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Seeds the default codes when the file is missing or holds no rows.
    /// Returns whether anything was written.
    pub fn initialize(&self) -> Result<bool> {
        let _guard = self.guard()?;
        if self.path.exists() && !CsvTable::read(&self.path)?.is_empty() {
            return Ok(false);
        }
        let mut rows = Vec::with_capacity(DEFAULT_CODES.len());
        for (id, code, pct) in DEFAULT_CODES {
            rows.push(Row::Code(DiscountCode::restore(id, PromoCode::new(code)?, DiscountPercent::new(pct)?, true)));
        }
        self.save(&rows)?;
        tracing::info!(path = %self.path.display(), count = rows.len(), "seeded default discount codes");
        Ok(true)
    }

    pub fn list(&self) -> Result<Vec<DiscountCode>> { Ok(codes(self.load()?)) }

    /// Active code matching `raw` regardless of case.
    pub fn find_active(&self, raw: &str) -> Result<Option<DiscountCode>> {
        Ok(codes(self.load()?).into_iter().find(|c| c.redeemable(raw)))
    }

    pub fn add(&self, code: PromoCode, discount: DiscountPercent) -> Result<Vec<DiscountCode>> {
        let _guard = self.guard()?;
        let mut rows = self.load()?;
        if rows.iter().any(|r| r.code_matches(code.as_str())) {
            return Err(StorefrontError::DuplicateCode(code.to_string()));
        }
        let next = rows.iter().filter_map(|r| r.id().trim().parse::<u64>().ok()).max().unwrap_or(0) + 1;
        rows.push(Row::Code(DiscountCode::create(next.to_string(), code, discount)));
        self.commit(rows)
    }

    pub fn update(&self, id: &str, patch: DiscountPatch) -> Result<Vec<DiscountCode>> {
        let _guard = self.guard()?;
        let mut rows = self.load()?;
        if let Some(code) = &patch.code {
            if rows.iter().any(|r| r.id() != id && r.code_matches(code.as_str())) {
                return Err(StorefrontError::DuplicateCode(code.to_string()));
            }
        }
        find_mut(&mut rows, id)?.apply(patch);
        self.commit(rows)
    }

    pub fn toggle(&self, id: &str) -> Result<Vec<DiscountCode>> {
        let _guard = self.guard()?;
        let mut rows = self.load()?;
        find_mut(&mut rows, id)?.toggle();
        self.commit(rows)
    }

    pub fn delete(&self, id: &str) -> Result<Vec<DiscountCode>> {
        let _guard = self.guard()?;
        let mut rows = self.load()?;
        let at = rows
            .iter()
            .position(|r| matches!(r, Row::Code(c) if c.id() == id))
            .ok_or_else(|| StorefrontError::DiscountNotFound(id.to_string()))?;
        let removed = rows.remove(at);
        self.save(&rows)?;
        if let Row::Code(mut removed) = removed {
            removed.retire();
            removed.take_events().iter().for_each(|e| e.log());
        }
        Ok(codes(rows))
    }

    fn commit(&self, mut rows: Vec<Row>) -> Result<Vec<DiscountCode>> {
        self.save(&rows)?;
        for row in rows.iter_mut() {
            if let Row::Code(code) = row {
                code.take_events().iter().for_each(|e| e.log());
            }
        }
        Ok(codes(rows))
    }

    /// Reads every row in file order. A missing file reads as empty; rows that do not parse
    /// are kept verbatim so rewrites carry them through.
    fn load(&self) -> Result<Vec<Row>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let table = CsvTable::read(&self.path)?;
        let [id_at, code_at, discount_at, active_at] = HEADER.map(|h| table.column(h));
        let (id_at, code_at, discount_at, active_at) = (id_at?, code_at?, discount_at?, active_at?);

        let mut rows = Vec::with_capacity(table.len());
        for row in 0..table.len() {
            let id = table.cell(row, id_at).trim();
            let parsed = PromoCode::new(table.cell(row, code_at)).map_err(|e| e.to_string()).and_then(|code| {
                let pct = table.cell(row, discount_at).trim().parse::<i64>().map_err(|e| e.to_string())?;
                Ok((code, DiscountPercent::new(pct).map_err(|e| e.to_string())?))
            });
            match parsed {
                Ok((code, pct)) => {
                    let active = table.cell(row, active_at).trim().eq_ignore_ascii_case("true");
                    rows.push(Row::Code(DiscountCode::restore(id, code, pct, active)));
                }
                Err(reason) => {
                    tracing::warn!(row = row + 2, %reason, "unreadable discount code row left as is");
                    let cells = [id_at, code_at, discount_at, active_at].map(|at| table.cell(row, at).to_string());
                    rows.push(Row::Kept(cells));
                }
            }
        }
        Ok(rows)
    }

    fn save(&self, rows: &[Row]) -> Result<()> {
        let mut table = CsvTable::new(HEADER);
        for row in rows {
            table.push(match row {
                Row::Code(c) => vec![c.id().to_string(), c.code().to_string(), c.discount().value().to_string(), c.is_active().to_string()],
                Row::Kept(cells) => cells.to_vec(),
            });
        }
        table.write(&self.path)
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| StorefrontError::Io(std::io::Error::other("discount book lock poisoned")))
    }
}

/// One line of the book. `Kept` holds the cells of a row that is not a usable code,
/// in header order.
enum Row {
    Code(DiscountCode),
    Kept([String; 4]),
}

impl Row {
    fn id(&self) -> &str {
        match self { Row::Code(c) => c.id(), Row::Kept(cells) => &cells[0] }
    }

    fn code_matches(&self, raw: &str) -> bool {
        match self { Row::Code(c) => c.code().matches(raw), Row::Kept(cells) => cells[1].trim().eq_ignore_ascii_case(raw.trim()) }
    }
}

fn codes(rows: Vec<Row>) -> Vec<DiscountCode> {
    rows.into_iter().filter_map(|r| match r { Row::Code(c) => Some(c), Row::Kept(_) => None }).collect()
}

fn find_mut<'a>(rows: &'a mut [Row], id: &str) -> Result<&'a mut DiscountCode> {
    rows.iter_mut()
        .find_map(|r| match r { Row::Code(c) if c.id() == id => Some(c), _ => None })
        .ok_or_else(|| StorefrontError::DiscountNotFound(id.to_string()))
}
