//! PostgreSQL row source
//!
//! Uses `tokio-postgres` on a current-thread runtime so the rest of the
//! pipeline stays synchronous. The connection lives exactly as long as the
//! `PgSource` value.

use log::{debug, error, info};
use tokio::runtime::Runtime;
use tokio_postgres::types::Type;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

use crate::config::DbConfig;
use crate::error::{ChurnError, Result};
use crate::pipeline::source::{frame_from_text_rows, BatchSink, ColumnKind, RowSource};

const CURSOR_NAME: &str = "churnflow_extract";

/// Tables visible without a schema prefix, the same ones the unqualified
/// `COUNT(*)` and `SELECT *` resolve to
const TABLE_CATALOG_QUERY: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema::name = ANY(current_schemas(false)) \
     AND table_schema NOT IN ('pg_catalog', 'information_schema')";

pub struct PgSource {
    // Dropped before the runtime that drives its connection task.
    client: Client,
    runtime: Runtime,
}

impl PgSource {
    pub fn connect(config: &DbConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ChurnError::Connection(format!("failed to start runtime: {}", e)))?;

        info!(
            "Connecting to PostgreSQL at {}:{}/{}",
            config.host, config.port, config.dbname
        );
        let pg_config = config.to_pg_config();
        let (client, connection) = runtime
            .block_on(pg_config.connect(NoTls))
            .map_err(|e| ChurnError::Connection(e.to_string()))?;

        runtime.spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection error: {}", e);
            }
        });

        Ok(Self { client, runtime })
    }

    fn select_all(table: &str) -> String {
        format!("SELECT * FROM {}", quote_identifier(table))
    }

    fn fetch_with_cursor(
        &self,
        table: &str,
        batch_size: usize,
        columns: &[(String, ColumnKind)],
        sink: &mut BatchSink<'_>,
    ) -> Result<()> {
        let declare = format!(
            "DECLARE {} NO SCROLL CURSOR FOR {}",
            CURSOR_NAME,
            Self::select_all(table)
        );
        self.runtime.block_on(self.client.batch_execute(&declare))?;

        let fetch = format!("FETCH FORWARD {} FROM {}", batch_size, CURSOR_NAME);
        let mut batch_index = 0usize;
        loop {
            let messages = self.runtime.block_on(self.client.simple_query(&fetch))?;
            let rows: Vec<Vec<Option<String>>> = messages
                .iter()
                .filter_map(|message| match message {
                    SimpleQueryMessage::Row(row) => Some(
                        (0..row.len())
                            .map(|i| row.get(i).map(|v| v.to_string()))
                            .collect(),
                    ),
                    _ => None,
                })
                .collect();

            if rows.is_empty() {
                break;
            }

            batch_index += 1;
            debug!("Fetched batch {} ({} rows) from {}", batch_index, rows.len(), table);
            let last = rows.len() < batch_size;
            sink(frame_from_text_rows(columns, &rows)?)?;
            if last {
                break;
            }
        }

        Ok(())
    }
}

impl RowSource for PgSource {
    fn table_names(&mut self) -> Result<Vec<String>> {
        let rows = self
            .runtime
            .block_on(self.client.query(TABLE_CATALOG_QUERY, &[]))?;
        Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
    }

    fn row_count(&mut self, table: &str) -> Result<usize> {
        let query = format!("SELECT COUNT(*) FROM {}", quote_identifier(table));
        let row = self.runtime.block_on(self.client.query_one(&query, &[]))?;
        let count: i64 = row.get(0);
        Ok(count.max(0) as usize)
    }

    fn for_each_batch(
        &mut self,
        table: &str,
        batch_size: usize,
        sink: &mut BatchSink<'_>,
    ) -> Result<()> {
        let statement = self
            .runtime
            .block_on(self.client.prepare(&Self::select_all(table)))?;
        let columns: Vec<(String, ColumnKind)> = statement
            .columns()
            .iter()
            .map(|c| (c.name().to_string(), column_kind(c.type_())))
            .collect();

        // Cursors only exist inside a transaction.
        self.runtime
            .block_on(self.client.batch_execute("BEGIN READ ONLY"))?;
        let outcome = self.fetch_with_cursor(table, batch_size, &columns, sink);
        let finish = if outcome.is_ok() { "COMMIT" } else { "ROLLBACK" };
        let closed = self.runtime.block_on(self.client.batch_execute(finish));

        outcome?;
        closed?;
        Ok(())
    }
}

impl Drop for PgSource {
    fn drop(&mut self) {
        debug!("Releasing PostgreSQL connection");
    }
}

/// Map a PostgreSQL column type onto the storage used in the extracted file
pub fn column_kind(ty: &Type) -> ColumnKind {
    match *ty {
        Type::BOOL => ColumnKind::Boolean,
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => ColumnKind::Integer,
        Type::FLOAT4 | Type::FLOAT8 | Type::NUMERIC => ColumnKind::Float,
        _ => ColumnKind::Text,
    }
}

/// Quote an identifier for interpolation into SQL
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
