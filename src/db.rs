//! SQLite persistence for reports and harvested images.
//!
//! [`Store`] owns the connection and is constructed per batch run or per
//! server process, then passed by reference into the stages that need it.
//! There is no global handle.
//!
//! # Schema
//!
//! Two tables, no migrations:
//! - `reports`: one row per accepted article, `url` UNIQUE
//! - `report_images`: harvested image blobs, weakly keyed by `report_url`
//!
//! [`Store::reset`] drops and recreates both tables unconditionally.
//!
//! # Timestamps
//!
//! `date_of_retrieval` is RFC 3339 UTC text with whole seconds. The fixed
//! width makes `>=` string comparisons in SQL equivalent to chronological
//! comparisons, which the cool-down and recency queries rely on.
//! `date_of_publication` is free text.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::{NewImage, NewReport, Report, ReportImage};

const REPORT_COLUMNS: &str =
    "id, source, date_of_retrieval, date_of_publication, url, company, content, keyword, content_type, summary, title";

/// Data-access context over a single SQLite connection.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Store { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store for tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Store { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS reports (
                id                  INTEGER PRIMARY KEY,
                source              TEXT NOT NULL,
                date_of_retrieval   TEXT NOT NULL,
                date_of_publication TEXT,
                url                 TEXT NOT NULL UNIQUE,
                company             TEXT,
                content             TEXT,
                keyword             TEXT,
                content_type        TEXT,
                summary             TEXT,
                title               TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_reports_retrieval ON reports(date_of_retrieval);

            CREATE TABLE IF NOT EXISTS report_images (
                id           INTEGER PRIMARY KEY,
                report_url   TEXT NOT NULL,
                page_number  INTEGER NOT NULL,
                keyword      TEXT,
                image_data   BLOB NOT NULL,
                content_type TEXT NOT NULL DEFAULT 'image/png'
            );
            CREATE INDEX IF NOT EXISTS idx_images_report_url ON report_images(report_url);
            ",
        )?;
        Ok(())
    }

    /// Drop and recreate both tables, discarding all rows.
    pub fn reset(&self) -> Result<()> {
        self.conn.execute_batch(
            "DROP TABLE IF EXISTS reports;
             DROP TABLE IF EXISTS report_images;",
        )?;
        self.init_schema()
    }

    /// Exact-string existence check run before extracting a candidate URL.
    ///
    /// Trailing slashes, query strings, and scheme differences are distinct
    /// URLs on purpose.
    pub fn url_exists(&self, url: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare("SELECT 1 FROM reports WHERE url = ?1")?;
        Ok(stmt.exists(params![url])?)
    }

    /// Insert one accepted article and commit immediately.
    ///
    /// # Returns
    ///
    /// The rowid of the new report.
    pub fn insert_report(&self, report: &NewReport) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO reports
             (source, date_of_retrieval, date_of_publication, url, company, content, keyword, content_type, summary, title)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                report.source.as_str(),
                timestamp_text(report.date_of_retrieval),
                report.date_of_publication,
                report.url,
                report.company,
                report.content,
                report.keyword,
                report.content_type,
                report.summary,
                report.title,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// True when any RSS-sourced report whose URL contains `domain` was
    /// retrieved on or after `cutoff`. Drives the feed-level cool-down.
    pub fn recent_feed_activity(&self, domain: &str, cutoff: DateTime<Utc>) -> Result<bool> {
        let mut stmt = self.conn.prepare(
            "SELECT 1 FROM reports
             WHERE source = 'RSS Feed'
               AND instr(url, ?1) > 0
               AND date_of_retrieval >= ?2",
        )?;
        Ok(stmt.exists(params![domain, timestamp_text(cutoff)])?)
    }

    /// Insert all images harvested from one page in a single transaction.
    ///
    /// # Returns
    ///
    /// The number of rows written.
    pub fn insert_images(&self, images: &[NewImage]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut count = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO report_images (report_url, page_number, keyword, image_data, content_type)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for image in images {
                count += stmt.execute(params![
                    image.report_url,
                    image.page_number,
                    image.keyword,
                    image.image_data,
                    image.content_type,
                ])?;
            }
        }
        tx.commit()?;
        Ok(count)
    }

    /// All reports, newest retrieval first.
    pub fn all_reports(&self) -> Result<Vec<Report>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports ORDER BY date_of_retrieval DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], row_to_report)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn report_by_id(&self, id: i64) -> Result<Option<Report>> {
        let sql = format!("SELECT {REPORT_COLUMNS} FROM reports WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        Ok(stmt.query_row(params![id], row_to_report).optional()?)
    }

    pub fn image_by_id(&self, id: i64) -> Result<Option<ReportImage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, report_url, page_number, keyword, image_data, content_type
             FROM report_images WHERE id = ?1",
        )?;
        Ok(stmt
            .query_row(params![id], |row| {
                Ok(ReportImage {
                    id: row.get(0)?,
                    report_url: row.get(1)?,
                    page_number: row.get(2)?,
                    keyword: row.get(3)?,
                    image_data: row.get(4)?,
                    content_type: row.get(5)?,
                })
            })
            .optional()?)
    }

    /// Reports retrieved on or after `cutoff` that carry a non-empty summary.
    /// Both conditions are required.
    pub fn recent_summarized(&self, cutoff: DateTime<Utc>) -> Result<Vec<Report>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports
             WHERE date_of_retrieval >= ?1
               AND summary IS NOT NULL AND summary != ''
             ORDER BY date_of_retrieval DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![timestamp_text(cutoff)], row_to_report)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The latest `limit` summarized reports by publication date, for the
    /// gallery view.
    pub fn latest_summarized(&self, limit: usize) -> Result<Vec<Report>> {
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports
             WHERE summary IS NOT NULL AND summary != ''
             ORDER BY date_of_publication DESC, id DESC
             LIMIT ?1"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit as i64], row_to_report)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn timestamp_text(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn row_to_report(row: &rusqlite::Row) -> rusqlite::Result<Report> {
    Ok(Report {
        id: row.get(0)?,
        source: row.get(1)?,
        date_of_retrieval: row.get(2)?,
        date_of_publication: row.get(3)?,
        url: row.get(4)?,
        company: row.get(5)?,
        content: row.get(6)?,
        keyword: row.get(7)?,
        content_type: row.get(8)?,
        summary: row.get(9)?,
        title: row.get(10)?,
    })
}
