//! Generic read access for simple keyed tables.
//!
//! Each table is described once by an [`Entity`] impl (table name, key
//! column, selectable columns) and read through [`Repository`], instead of
//! hand-writing the same lookup and paging queries per table.

use std::marker::PhantomData;

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres};

use crate::error::StoreError;

/// Default page size when the caller does not pick one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: u32 = 500;

/// A table row type readable through [`Repository`].
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    /// Table name.
    const TABLE: &'static str;
    /// Primary key column.
    const KEY: &'static str;
    /// Columns selected for this entity, also the allow-list for sorting.
    const COLUMNS: &'static [&'static str];
}

/// Paging and sorting request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub limit: u32,
    /// Column to sort by; unknown columns fall back to the key.
    pub sort_by: Option<String>,
    /// Sort descending instead of ascending.
    pub descending: bool,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            sort_by: None,
            descending: false,
        }
    }
}

impl Page {
    /// Validate the request and return `(limit, offset)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPage`] if `page` or `limit` is zero or
    /// `limit` exceeds [`MAX_PAGE_LIMIT`].
    pub fn limit_offset(&self) -> Result<(i64, i64), StoreError> {
        if self.page == 0 {
            return Err(StoreError::InvalidPage(String::from(
                "page must be a positive integer",
            )));
        }
        if self.limit == 0 || self.limit > MAX_PAGE_LIMIT {
            return Err(StoreError::InvalidPage(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        let limit = i64::from(self.limit);
        let offset = i64::from(self.page)
            .saturating_sub(1)
            .saturating_mul(limit);
        Ok((limit, offset))
    }

    /// Resolve the sort column against an allow-list, falling back to `key`.
    pub fn sort_column<'c>(&self, columns: &[&'c str], key: &'c str) -> &'c str {
        match self.sort_by.as_deref() {
            Some(requested) => columns
                .iter()
                .copied()
                .find(|c| *c == requested)
                .unwrap_or_else(|| {
                    tracing::warn!(requested, fallback = key, "unknown sort column");
                    key
                }),
            None => key,
        }
    }
}

/// One page of results plus the unpaged row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult<E> {
    /// Rows on this page.
    pub items: Vec<E>,
    /// Total rows in the table.
    pub total_count: i64,
}

/// Read operations shared by every [`Entity`].
pub struct Repository<'a, E> {
    pool: &'a PgPool,
    entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> Repository<'a, E> {
    /// Create a repository bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            entity: PhantomData,
        }
    }

    /// Fetch a single row by primary key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn fetch_by_key<K>(&self, key: K) -> Result<Option<E>, StoreError>
    where
        K: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            E::COLUMNS.join(", "),
            E::TABLE,
            E::KEY
        );
        let row = sqlx::query_as::<_, E>(&sql)
            .bind(key)
            .fetch_optional(self.pool)
            .await?;
        if row.is_none() {
            tracing::debug!(table = E::TABLE, "no row for key");
        }
        Ok(row)
    }

    /// Fetch one sorted page of rows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPage`] for bad paging parameters and
    /// [`StoreError::Postgres`] if a query fails.
    pub async fn fetch_page(&self, page: &Page) -> Result<PageResult<E>, StoreError> {
        let (limit, offset) = page.limit_offset()?;
        let sort_column = page.sort_column(E::COLUMNS, E::KEY);
        let direction = if page.descending { "DESC" } else { "ASC" };

        let count_sql = format!("SELECT COUNT(*) FROM {}", E::TABLE);
        let (total_count,): (i64,) = sqlx::query_as(&count_sql).fetch_one(self.pool).await?;

        let sql = format!(
            "SELECT {} FROM {} ORDER BY {sort_column} {direction}, {} {direction} LIMIT $1 OFFSET $2",
            E::COLUMNS.join(", "),
            E::TABLE,
            E::KEY
        );
        let items = sqlx::query_as::<_, E>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool)
            .await?;

        tracing::debug!(
            table = E::TABLE,
            fetched = items.len(),
            total_count,
            "fetched page"
        );
        Ok(PageResult { items, total_count })
    }
}

/// A row from the `employees` table, used to resolve creator names.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EmployeeRow {
    /// Employee id.
    pub emp_id: i64,
    /// Display name.
    pub employee_name: String,
    /// Organization the employee belongs to.
    pub organization_id: Option<i64>,
}

impl Entity for EmployeeRow {
    const TABLE: &'static str = "employees";
    const KEY: &'static str = "emp_id";
    const COLUMNS: &'static [&'static str] = &["emp_id", "employee_name", "organization_id"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_limit_offset() {
        let page = Page {
            page: 3,
            limit: 20,
            ..Page::default()
        };
        assert_eq!(page.limit_offset().ok(), Some((20, 40)));
    }

    #[test]
    fn page_rejects_zero_values() {
        let zero_page = Page {
            page: 0,
            ..Page::default()
        };
        assert!(matches!(
            zero_page.limit_offset(),
            Err(StoreError::InvalidPage(_))
        ));
        let zero_limit = Page {
            limit: 0,
            ..Page::default()
        };
        assert!(zero_limit.limit_offset().is_err());
    }

    #[test]
    fn unknown_sort_column_falls_back_to_key() {
        let page = Page {
            sort_by: Some(String::from("password; DROP TABLE x")),
            ..Page::default()
        };
        assert_eq!(page.sort_column(EmployeeRow::COLUMNS, EmployeeRow::KEY), "emp_id");

        let by_name = Page {
            sort_by: Some(String::from("employee_name")),
            ..Page::default()
        };
        assert_eq!(
            by_name.sort_column(EmployeeRow::COLUMNS, EmployeeRow::KEY),
            "employee_name"
        );
    }
}
