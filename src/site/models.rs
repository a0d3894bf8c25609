use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::db::{format_timestamp, parse_timestamp};
use crate::errors::SiteError;

// ── Blog ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogPost {
    pub id: i64,
    #[serde(rename = "judul")]
    pub title: String,
    #[serde(rename = "ringkasan")]
    pub summary: String,
    #[serde(rename = "konten")]
    pub content: String,
    #[serde(rename = "gambar_url")]
    pub image_url: Option<String>,
    #[serde(rename = "kategori")]
    pub category: Option<String>,
    #[serde(rename = "penulis")]
    pub author: String,
    pub slug: String,
    #[serde(rename = "tanggal_publikasi")]
    pub published_at: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Body of `POST /api/blog` and `PUT /api/blog/{key}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlogInput {
    #[serde(default, rename = "judul")]
    pub title: String,
    #[serde(default, rename = "ringkasan")]
    pub summary: String,
    #[serde(default, rename = "konten")]
    pub content: String,
    #[serde(default, rename = "gambar_url")]
    pub image_url: Option<String>,
    #[serde(default, rename = "kategori")]
    pub category: Option<String>,
    #[serde(default, rename = "penulis")]
    pub author: String,
    /// Publication timestamp; defaults to now on create, unchanged on update.
    #[serde(default, rename = "tanggal_publikasi")]
    pub published_at: Option<String>,
}

impl BlogInput {
    pub fn validate(&self) -> Result<(), SiteError> {
        let blank = |s: &str| s.trim().is_empty();
        if blank(&self.title) || blank(&self.summary) || blank(&self.content) || blank(&self.author)
        {
            return Err(SiteError::validation(
                "Judul, ringkasan, konten, dan penulis harus diisi",
            ));
        }
        self.published_at_timestamp()?;
        Ok(())
    }

    /// `tanggal_publikasi` in the storage format, or `None` when absent.
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) or a bare date.
    pub fn published_at_timestamp(&self) -> Result<Option<String>, SiteError> {
        let Some(raw) = self
            .published_at
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };
        parse_published_at(raw).map(|at| Some(format_timestamp(at)))
    }
}

fn parse_published_at(raw: &str) -> Result<DateTime<Utc>, SiteError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    if let Ok(at) = parse_timestamp(raw) {
        return Ok(at);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(SiteError::validation("Format tanggal_publikasi tidak valid"))
}

// ── Testimonial ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestimonialStatus {
    /// Approved; visible on the public site.
    Disetujui,
    /// Rejected.
    Ditolak,
    /// Awaiting moderation.
    #[default]
    Menunggu,
}

impl TestimonialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disetujui => "disetujui",
            Self::Ditolak => "ditolak",
            Self::Menunggu => "menunggu",
        }
    }
}

impl FromStr for TestimonialStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disetujui" => Ok(Self::Disetujui),
            "ditolak" => Ok(Self::Ditolak),
            "menunggu" => Ok(Self::Menunggu),
            _ => Err(format!("Invalid status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Testimonial {
    pub id: i64,
    #[serde(rename = "nama")]
    pub name: String,
    #[serde(rename = "peran")]
    pub role: Option<String>,
    #[serde(rename = "pesan")]
    pub message: String,
    pub rating: u8,
    #[serde(rename = "gambar_url")]
    pub image_url: Option<String>,
    pub status: TestimonialStatus,
    pub created_at: String,
}

/// Internal row type that holds the raw status string from SQLite.
pub(crate) struct TestimonialRow {
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
    pub message: String,
    pub rating: i64,
    pub image_url: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl TestimonialRow {
    pub fn into_testimonial(self) -> anyhow::Result<Testimonial> {
        let status = TestimonialStatus::from_str(&self.status).map_err(|e| anyhow::anyhow!(e))?;
        Ok(Testimonial {
            id: self.id,
            name: self.name,
            role: self.role,
            message: self.message,
            rating: u8::try_from(self.rating.clamp(1, 5)).unwrap_or(5),
            image_url: self.image_url,
            status,
            created_at: self.created_at,
        })
    }
}

/// Body of `POST /api/testimonial` and `PUT /api/testimonial/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestimonialInput {
    #[serde(default, rename = "nama")]
    pub name: String,
    #[serde(default, rename = "peran")]
    pub role: Option<String>,
    #[serde(default, rename = "pesan")]
    pub message: String,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default, rename = "gambar_url")]
    pub image_url: Option<String>,
    /// Ignored for public submissions.
    #[serde(default)]
    pub status: Option<TestimonialStatus>,
}

impl TestimonialInput {
    /// Validate and return the effective rating (default 5).
    pub fn validate(&self) -> Result<u8, SiteError> {
        if self.name.trim().is_empty() || self.message.trim().is_empty() {
            return Err(SiteError::validation("Nama dan pesan harus diisi"));
        }
        match self.rating {
            None => Ok(5),
            Some(r @ 1..=5) => Ok(r as u8),
            Some(_) => Err(SiteError::validation("Rating harus antara 1 dan 5")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: TestimonialStatus,
}

// ── Gallery ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryItem {
    pub id: i64,
    #[serde(rename = "judul")]
    pub title: String,
    #[serde(rename = "lokasi")]
    pub location: String,
    #[serde(rename = "deskripsi")]
    pub description: Option<String>,
    #[serde(rename = "gambar_url")]
    pub image_url: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryInput {
    #[serde(default, rename = "judul")]
    pub title: String,
    #[serde(default, rename = "lokasi")]
    pub location: String,
    #[serde(default, rename = "deskripsi")]
    pub description: Option<String>,
    #[serde(default, rename = "gambar_url")]
    pub image_url: String,
}

impl GalleryInput {
    pub fn validate(&self) -> Result<(), SiteError> {
        if self.title.trim().is_empty()
            || self.location.trim().is_empty()
            || self.image_url.trim().is_empty()
        {
            return Err(SiteError::validation(
                "Judul, lokasi, dan gambar_url harus diisi",
            ));
        }
        Ok(())
    }
}

// ── Dashboard ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Blog,
    Testimonial,
    Gallery,
}

/// One row of the "recent activity" panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecentActivity {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TestimonialStatus>,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}
