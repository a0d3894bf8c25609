use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::models::*;
use crate::analytics::PageView;
use crate::errors::SiteError;
use crate::slug::{generate_slug, is_numeric_key, resolve_slug, slug_matches_base};

/// Text format used for every timestamp column (UTC, matches `datetime('now')`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .with_context(|| format!("Invalid timestamp '{}'", raw))
}

/// Async-safe handle to the site database.
///
/// Wraps `SiteDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, so synchronous SQLite I/O
/// never ties up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<SiteDb>>,
}

impl DbHandle {
    pub fn new(db: SiteDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R, SiteError>
    where
        F: FnOnce(&SiteDb) -> Result<R, SiteError> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| SiteError::Database(anyhow::anyhow!("DB lock poisoned: {}", e)))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }

    /// Acquire the database mutex synchronously, for test setup.
    #[cfg(test)]
    pub fn lock_sync(&self) -> Result<std::sync::MutexGuard<'_, SiteDb>> {
        self.inner
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))
    }
}

pub struct SiteDb {
    conn: Connection,
}

const BLOG_COLUMNS: &str = "id, judul, ringkasan, konten, gambar_url, kategori, penulis, slug, tanggal_publikasi, created_at, updated_at";
const TESTIMONIAL_COLUMNS: &str = "id, nama, peran, pesan, rating, gambar_url, status, created_at";
const GALLERY_COLUMNS: &str = "id, judul, lokasi, deskripsi, gambar_url, created_at";

fn blog_from_row(row: &Row<'_>) -> rusqlite::Result<BlogPost> {
    Ok(BlogPost {
        id: row.get(0)?,
        title: row.get(1)?,
        summary: row.get(2)?,
        content: row.get(3)?,
        image_url: row.get(4)?,
        category: row.get(5)?,
        author: row.get(6)?,
        slug: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        published_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn testimonial_row(row: &Row<'_>) -> rusqlite::Result<TestimonialRow> {
    Ok(TestimonialRow {
        id: row.get(0)?,
        name: row.get(1)?,
        role: row.get(2)?,
        message: row.get(3)?,
        rating: row.get(4)?,
        image_url: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn gallery_from_row(row: &Row<'_>) -> rusqlite::Result<GalleryItem> {
    Ok(GalleryItem {
        id: row.get(0)?,
        title: row.get(1)?,
        location: row.get(2)?,
        description: row.get(3)?,
        image_url: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn db_err(e: impl Into<anyhow::Error>) -> SiteError {
    SiteError::Database(e.into())
}

/// Resolve `base` against `is_taken`, failing once every suffix is used.
fn pick_slug(
    base: String,
    millis: u64,
    is_taken: impl FnMut(&str) -> Result<bool>,
) -> Result<String, SiteError> {
    resolve_slug(&base, millis, is_taken)
        .map_err(db_err)?
        .ok_or(SiteError::SlugExhausted { base })
}

impl SiteDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .context("Failed to enable WAL journal")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS blog (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    judul TEXT NOT NULL,
                    ringkasan TEXT NOT NULL,
                    konten TEXT NOT NULL,
                    gambar_url TEXT,
                    kategori TEXT,
                    penulis TEXT NOT NULL,
                    tanggal_publikasi TEXT NOT NULL DEFAULT (datetime('now')),
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS testimonial (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    nama TEXT NOT NULL,
                    peran TEXT,
                    pesan TEXT NOT NULL,
                    rating INTEGER NOT NULL DEFAULT 5 CHECK (rating BETWEEN 1 AND 5),
                    gambar_url TEXT,
                    status TEXT NOT NULL DEFAULT 'menunggu',
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS galeri (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    judul TEXT NOT NULL,
                    lokasi TEXT NOT NULL,
                    deskripsi TEXT,
                    gambar_url TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS analitik (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    halaman TEXT NOT NULL,
                    visitor_id TEXT NOT NULL,
                    referrer TEXT,
                    user_agent TEXT,
                    waktu_kunjungan TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE INDEX IF NOT EXISTS idx_blog_published ON blog(tanggal_publikasi);
                CREATE INDEX IF NOT EXISTS idx_testimonial_status ON testimonial(status);
                CREATE INDEX IF NOT EXISTS idx_analitik_waktu ON analitik(waktu_kunjungan);
                ",
            )
            .context("Failed to create tables")?;

        // Databases created before slugs existed lack the column. We only
        // ignore "duplicate column" errors; anything else is propagated.
        match self.conn.execute("ALTER TABLE blog ADD COLUMN slug TEXT", []) {
            Ok(_) => {}
            Err(e) if e.to_string().contains("duplicate column") => {}
            Err(e) => return Err(anyhow::anyhow!("Failed to add slug column: {}", e)),
        }
        self.backfill_slugs().context("Failed to backfill blog slugs")?;
        self.conn
            .execute_batch(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_blog_slug ON blog(slug) WHERE slug IS NOT NULL;",
            )
            .context("Failed to create slug index")?;

        Ok(())
    }

    /// Give every legacy post without a slug one derived from its title.
    fn backfill_slugs(&self) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, judul FROM blog WHERE slug IS NULL OR slug = '' ORDER BY id")
            .context("Failed to prepare slug backfill")?;
        let pending = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
            .context("Failed to query posts without slug")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read posts without slug")?;

        let millis = Utc::now().timestamp_millis().max(0) as u64;
        for (id, title) in &pending {
            let base = generate_slug(title);
            let slug = resolve_slug(&base, millis, |candidate| {
                self.slug_taken(candidate, Some(*id))
            })?
            .with_context(|| format!("No free slug for post {}", id))?;
            self.conn
                .execute("UPDATE blog SET slug = ?1 WHERE id = ?2", params![slug, id])
                .context("Failed to store backfilled slug")?;
            tracing::info!(post_id = id, slug = %slug, "Backfilled blog slug");
        }
        Ok(pending.len())
    }

    // ── Blog ──────────────────────────────────────────────────────────

    /// True if some post other than `exclude_id` already owns `slug`.
    pub fn slug_taken(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM blog WHERE slug = ?1 AND id != ?2",
                params![slug, exclude_id.unwrap_or(-1)],
                |row| row.get(0),
            )
            .context("Failed to check slug")?;
        Ok(count > 0)
    }

    fn allocate_slug(
        &self,
        title: &str,
        exclude_id: Option<i64>,
        millis: u64,
    ) -> Result<String, SiteError> {
        pick_slug(generate_slug(title), millis, |candidate| {
            self.slug_taken(candidate, exclude_id)
        })
    }

    pub fn create_blog(&self, input: &BlogInput, millis: u64) -> Result<BlogPost, SiteError> {
        let slug = self.allocate_slug(&input.title, None, millis)?;
        let published_at = input.published_at_timestamp()?;
        self.conn
            .execute(
                "INSERT INTO blog (judul, ringkasan, konten, gambar_url, kategori, penulis, slug, tanggal_publikasi)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, COALESCE(?8, datetime('now')))",
                params![
                    input.title.trim(),
                    input.summary,
                    input.content,
                    non_blank(input.image_url.as_deref()),
                    non_blank(input.category.as_deref()),
                    input.author.trim(),
                    slug,
                    published_at,
                ],
            )
            .context("Failed to insert blog post")
            .map_err(db_err)?;
        let id = self.conn.last_insert_rowid();
        self.get_blog_by_id(id)?
            .context("Blog post not found after insert")
            .map_err(db_err)
    }

    /// Newest first. `limit` is capped at 100.
    pub fn list_blogs(&self, category: Option<&str>, limit: Option<i64>) -> Result<Vec<BlogPost>> {
        let limit = limit.unwrap_or(100).clamp(1, 100);
        let sql = format!(
            "SELECT {} FROM blog WHERE (?1 IS NULL OR kategori = ?1)
             ORDER BY tanggal_publikasi DESC, id DESC LIMIT ?2",
            BLOG_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql).context("Failed to prepare list_blogs")?;
        let rows = stmt
            .query_map(params![category, limit], blog_from_row)
            .context("Failed to query blog posts")?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row.context("Failed to read blog row")?);
        }
        Ok(posts)
    }

    pub fn get_blog_by_id(&self, id: i64) -> Result<Option<BlogPost>> {
        let sql = format!("SELECT {} FROM blog WHERE id = ?1", BLOG_COLUMNS);
        self.conn
            .query_row(&sql, params![id], blog_from_row)
            .optional()
            .context("Failed to query blog post by id")
    }

    pub fn get_blog_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let sql = format!("SELECT {} FROM blog WHERE slug = ?1", BLOG_COLUMNS);
        self.conn
            .query_row(&sql, params![slug], blog_from_row)
            .optional()
            .context("Failed to query blog post by slug")
    }

    /// Look a post up by numeric id or, failing that shape, by slug.
    pub fn get_blog(&self, key: &str) -> Result<Option<BlogPost>> {
        if is_numeric_key(key) {
            match key.parse::<i64>() {
                Ok(id) => self.get_blog_by_id(id),
                Err(_) => Ok(None),
            }
        } else {
            self.get_blog_by_slug(key)
        }
    }

    /// Update a post. The slug is regenerated from the new title unless the
    /// post already carries that slug (optionally with a collision suffix).
    pub fn update_blog(
        &self,
        key: &str,
        input: &BlogInput,
        millis: u64,
    ) -> Result<BlogPost, SiteError> {
        let existing = self
            .get_blog(key)
            .map_err(db_err)?
            .ok_or_else(|| SiteError::BlogNotFound { key: key.to_string() })?;

        let base = generate_slug(&input.title);
        let slug = if slug_matches_base(&existing.slug, &base) {
            existing.slug.clone()
        } else {
            self.allocate_slug(&input.title, Some(existing.id), millis)?
        };
        let published_at = input.published_at_timestamp()?;

        self.conn
            .execute(
                "UPDATE blog
                 SET judul = ?1, ringkasan = ?2, konten = ?3, gambar_url = ?4, kategori = ?5,
                     penulis = ?6, slug = ?7, tanggal_publikasi = COALESCE(?8, tanggal_publikasi),
                     updated_at = datetime('now')
                 WHERE id = ?9",
                params![
                    input.title.trim(),
                    input.summary,
                    input.content,
                    non_blank(input.image_url.as_deref()),
                    non_blank(input.category.as_deref()),
                    input.author.trim(),
                    slug,
                    published_at,
                    existing.id,
                ],
            )
            .context("Failed to update blog post")
            .map_err(db_err)?;

        self.get_blog_by_id(existing.id)
            .map_err(db_err)?
            .ok_or_else(|| SiteError::BlogNotFound { key: key.to_string() })
    }

    /// Delete by id or slug. Returns the removed post.
    pub fn delete_blog(&self, key: &str) -> Result<Option<BlogPost>> {
        let Some(post) = self.get_blog(key)? else {
            return Ok(None);
        };
        self.conn
            .execute("DELETE FROM blog WHERE id = ?1", params![post.id])
            .context("Failed to delete blog post")?;
        Ok(Some(post))
    }

    // ── Testimonial ───────────────────────────────────────────────────

    pub fn create_testimonial(
        &self,
        input: &TestimonialInput,
        rating: u8,
        status: TestimonialStatus,
    ) -> Result<Testimonial> {
        self.conn
            .execute(
                "INSERT INTO testimonial (nama, peran, pesan, rating, gambar_url, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    input.name.trim(),
                    non_blank(input.role.as_deref()),
                    input.message.trim(),
                    rating,
                    non_blank(input.image_url.as_deref()),
                    status.as_str(),
                ],
            )
            .context("Failed to insert testimonial")?;
        let id = self.conn.last_insert_rowid();
        self.get_testimonial(id)?
            .context("Testimonial not found after insert")
    }

    /// Newest first, optionally restricted to one status.
    pub fn list_testimonials(&self, status: Option<TestimonialStatus>) -> Result<Vec<Testimonial>> {
        let sql = format!(
            "SELECT {} FROM testimonial WHERE (?1 IS NULL OR status = ?1)
             ORDER BY created_at DESC, id DESC",
            TESTIMONIAL_COLUMNS
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Failed to prepare list_testimonials")?;
        let rows = stmt
            .query_map(params![status.map(|s| s.as_str())], testimonial_row)
            .context("Failed to query testimonials")?;
        let mut testimonials = Vec::new();
        for row in rows {
            let r = row.context("Failed to read testimonial row")?;
            testimonials.push(r.into_testimonial()?);
        }
        Ok(testimonials)
    }

    pub fn get_testimonial(&self, id: i64) -> Result<Option<Testimonial>> {
        let sql = format!("SELECT {} FROM testimonial WHERE id = ?1", TESTIMONIAL_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], testimonial_row)
            .optional()
            .context("Failed to query testimonial")?;
        row.map(TestimonialRow::into_testimonial).transpose()
    }

    /// Full edit from the admin console. Status is kept unless supplied.
    pub fn update_testimonial(
        &self,
        id: i64,
        input: &TestimonialInput,
        rating: u8,
    ) -> Result<Option<Testimonial>> {
        let changed = self
            .conn
            .execute(
                "UPDATE testimonial
                 SET nama = ?1, peran = ?2, pesan = ?3, rating = ?4, gambar_url = ?5,
                     status = COALESCE(?6, status)
                 WHERE id = ?7",
                params![
                    input.name.trim(),
                    non_blank(input.role.as_deref()),
                    input.message.trim(),
                    rating,
                    non_blank(input.image_url.as_deref()),
                    input.status.map(|s| s.as_str()),
                    id,
                ],
            )
            .context("Failed to update testimonial")?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_testimonial(id)
    }

    pub fn set_testimonial_status(
        &self,
        id: i64,
        status: TestimonialStatus,
    ) -> Result<Option<Testimonial>> {
        let changed = self
            .conn
            .execute(
                "UPDATE testimonial SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .context("Failed to update testimonial status")?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_testimonial(id)
    }

    pub fn delete_testimonial(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM testimonial WHERE id = ?1", params![id])
            .context("Failed to delete testimonial")?;
        Ok(changed > 0)
    }

    // ── Gallery ───────────────────────────────────────────────────────

    pub fn create_gallery_item(&self, input: &GalleryInput) -> Result<GalleryItem> {
        self.conn
            .execute(
                "INSERT INTO galeri (judul, lokasi, deskripsi, gambar_url) VALUES (?1, ?2, ?3, ?4)",
                params![
                    input.title.trim(),
                    input.location.trim(),
                    non_blank(input.description.as_deref()),
                    input.image_url.trim(),
                ],
            )
            .context("Failed to insert gallery item")?;
        let id = self.conn.last_insert_rowid();
        self.get_gallery_item(id)?
            .context("Gallery item not found after insert")
    }

    pub fn list_gallery(&self, limit: Option<i64>) -> Result<Vec<GalleryItem>> {
        let limit = limit.unwrap_or(100).clamp(1, 100);
        let sql = format!(
            "SELECT {} FROM galeri ORDER BY created_at DESC, id DESC LIMIT ?1",
            GALLERY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql).context("Failed to prepare list_gallery")?;
        let rows = stmt
            .query_map(params![limit], gallery_from_row)
            .context("Failed to query gallery")?;
        let mut items = Vec::new();
        for row in rows {
            items.push(row.context("Failed to read gallery row")?);
        }
        Ok(items)
    }

    pub fn get_gallery_item(&self, id: i64) -> Result<Option<GalleryItem>> {
        let sql = format!("SELECT {} FROM galeri WHERE id = ?1", GALLERY_COLUMNS);
        self.conn
            .query_row(&sql, params![id], gallery_from_row)
            .optional()
            .context("Failed to query gallery item")
    }

    pub fn update_gallery_item(
        &self,
        id: i64,
        input: &GalleryInput,
    ) -> Result<Option<GalleryItem>> {
        let changed = self
            .conn
            .execute(
                "UPDATE galeri SET judul = ?1, lokasi = ?2, deskripsi = ?3, gambar_url = ?4 WHERE id = ?5",
                params![
                    input.title.trim(),
                    input.location.trim(),
                    non_blank(input.description.as_deref()),
                    input.image_url.trim(),
                    id,
                ],
            )
            .context("Failed to update gallery item")?;
        if changed == 0 {
            return Ok(None);
        }
        self.get_gallery_item(id)
    }

    pub fn delete_gallery_item(&self, id: i64) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM galeri WHERE id = ?1", params![id])
            .context("Failed to delete gallery item")?;
        Ok(changed > 0)
    }

    // ── Analytics ─────────────────────────────────────────────────────

    pub fn record_page_view(
        &self,
        page: &str,
        visitor_id: &str,
        referrer: Option<&str>,
        user_agent: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<PageView> {
        let created_at = format_timestamp(at);
        self.conn
            .execute(
                "INSERT INTO analitik (halaman, visitor_id, referrer, user_agent, waktu_kunjungan)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![page, visitor_id, non_blank(referrer), non_blank(user_agent), created_at],
            )
            .context("Failed to insert page view")?;
        Ok(PageView {
            id: self.conn.last_insert_rowid(),
            page: page.to_string(),
            visitor_id: visitor_id.to_string(),
            referrer: non_blank(referrer).map(str::to_string),
            user_agent: non_blank(user_agent).map(str::to_string),
            created_at: parse_timestamp(&created_at)?,
        })
    }

    /// All page views at or after `since`, oldest first.
    pub fn page_views_since(&self, since: DateTime<Utc>) -> Result<Vec<PageView>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, halaman, visitor_id, referrer, user_agent, waktu_kunjungan
                 FROM analitik WHERE waktu_kunjungan >= ?1 ORDER BY waktu_kunjungan, id",
            )
            .context("Failed to prepare page_views_since")?;
        let rows = stmt
            .query_map(params![format_timestamp(since)], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .context("Failed to query page views")?;
        let mut views = Vec::new();
        for row in rows {
            let (id, page, visitor_id, referrer, user_agent, at) =
                row.context("Failed to read page view row")?;
            views.push(PageView {
                id,
                page,
                visitor_id,
                referrer,
                user_agent,
                created_at: parse_timestamp(&at)?,
            });
        }
        Ok(views)
    }

    /// Delete page views older than `before`. Returns the number removed.
    pub fn prune_page_views(&self, before: DateTime<Utc>) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM analitik WHERE waktu_kunjungan < ?1",
                params![format_timestamp(before)],
            )
            .context("Failed to prune page views")
    }

    // ── Dashboard ─────────────────────────────────────────────────────

    /// Most recent blog posts, testimonials and gallery items, newest first.
    pub fn recent_activity(&self, limit: usize) -> Result<Vec<RecentActivity>> {
        let per_kind = limit as i64;
        let mut activities = Vec::new();

        for post in self.list_blogs(None, Some(per_kind))? {
            activities.push(RecentActivity {
                id: post.id,
                kind: ActivityKind::Blog,
                title: post.title,
                status: None,
                date: post.published_at,
                image: post.image_url,
            });
        }
        for t in self.list_testimonials(None)?.into_iter().take(limit) {
            activities.push(RecentActivity {
                id: t.id,
                kind: ActivityKind::Testimonial,
                title: t.name,
                status: Some(t.status),
                date: t.created_at,
                image: t.image_url,
            });
        }
        for item in self.list_gallery(Some(per_kind))? {
            activities.push(RecentActivity {
                id: item.id,
                kind: ActivityKind::Gallery,
                title: item.title,
                status: None,
                date: item.created_at,
                image: Some(item.image_url),
            });
        }

        // Timestamps share one text format, so string order is time order.
        activities.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        activities.truncate(limit);
        Ok(activities)
    }
}
