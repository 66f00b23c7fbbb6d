//! Request handlers for the read API.
//!
//! All endpoints are read-only views over the store. The `/summaries` HTML
//! gallery decorates each summary with one pseudo-randomly assigned file
//! from the local gallery directory; those decorations have no relation to
//! the harvested image table.

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Json};
use chrono::{Duration, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;
use tracing::warn;

use super::{ApiError, AppState};
use crate::models::Report;
use crate::utils::clip_chars;

/// Characters of report content returned by the detail endpoint before the
/// ellipsis marker.
const CONTENT_PREVIEW_CHARS: usize = 2000;

/// Summaries rendered by the gallery view.
const GALLERY_LIMIT: usize = 20;

/// One row of `GET /reports`.
#[derive(Debug, Serialize)]
pub(super) struct ReportListItem {
    id: i64,
    source: String,
    company: Option<String>,
    date_of_retrieval: String,
    date_of_publication: Option<String>,
    url: String,
    content_type: Option<String>,
    keyword: Option<String>,
    has_summary: bool,
}

/// The full detail payload of `GET /reports/{id}`.
#[derive(Debug, Serialize)]
pub(super) struct ReportDetail {
    id: i64,
    source: String,
    company: Option<String>,
    date_of_retrieval: String,
    date_of_publication: Option<String>,
    url: String,
    content_type: Option<String>,
    keyword: Option<String>,
    summary: Option<String>,
    content: Option<String>,
}

/// One entry of `GET /summaries/recent`.
#[derive(Debug, Serialize)]
pub(super) struct RecentSummary {
    title: Option<String>,
    date: Option<String>,
    company: Option<String>,
    url: String,
    summary: Option<String>,
}

pub(super) async fn home() -> Json<serde_json::Value> {
    Json(json!({ "message": "Welcome to the ESG radar API!" }))
}

pub(super) async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let image = state
        .store
        .lock()
        .await
        .image_by_id(id)?
        .ok_or(ApiError::NotFound("Image not found"))?;
    Ok(([(CONTENT_TYPE, image.content_type)], image.image_data))
}

pub(super) async fn get_summary(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = state
        .store
        .lock()
        .await
        .report_by_id(id)?
        .ok_or(ApiError::NotFound("Report not found"))?;
    let summary = report
        .summary
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "No summary generated yet.".to_string());
    Ok(Json(json!({
        "company": report.company,
        "source": report.source,
        "summary": summary,
    })))
}

pub(super) async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReportDetail>, ApiError> {
    let report = state
        .store
        .lock()
        .await
        .report_by_id(id)?
        .ok_or(ApiError::NotFound("Report not found"))?;
    let content = report.content.as_deref().map(preview);
    Ok(Json(ReportDetail {
        id: report.id,
        source: report.source.clone(),
        company: report.company.clone(),
        date_of_retrieval: report.display_retrieval(),
        date_of_publication: report.date_of_publication.clone(),
        url: report.url.clone(),
        content_type: report.content_type.clone(),
        keyword: report.keyword.clone(),
        summary: report.summary.clone(),
        content,
    }))
}

pub(super) async fn list_reports(
    State(state): State<AppState>,
) -> Result<Json<Vec<ReportListItem>>, ApiError> {
    let reports = state.store.lock().await.all_reports()?;
    let items = reports
        .iter()
        .map(|report| ReportListItem {
            id: report.id,
            source: report.source.clone(),
            company: report.company.clone(),
            date_of_retrieval: report.display_retrieval(),
            date_of_publication: report.date_of_publication.clone(),
            url: report.url.clone(),
            content_type: report.content_type.clone(),
            keyword: report.keyword.clone(),
            has_summary: report.has_summary(),
        })
        .collect();
    Ok(Json(items))
}

pub(super) async fn recent_summaries(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecentSummary>>, ApiError> {
    let cutoff = Utc::now() - Duration::days(1);
    let reports = state.store.lock().await.recent_summarized(cutoff)?;
    let items = reports
        .iter()
        .map(|report| RecentSummary {
            title: report.title.clone().or_else(|| report.company.clone()),
            date: report.date_of_publication.clone(),
            company: report.company.clone(),
            url: report.url.clone(),
            summary: report.summary.clone(),
        })
        .collect();
    Ok(Json(items))
}

pub(super) async fn summaries_view(
    State(state): State<AppState>,
) -> Result<Html<String>, ApiError> {
    let reports = state.store.lock().await.latest_summarized(GALLERY_LIMIT)?;
    let mut files = gallery_files(&state.gallery_dir);
    files.shuffle(&mut rand::rng());
    Ok(Html(render_summaries(&reports, &files)))
}

pub(super) async fn gallery_asset(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(ApiError::NotFound("Image not found"));
    }
    let path = state.gallery_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(([(CONTENT_TYPE, mime_for(&filename))], bytes)),
        Err(_) => Err(ApiError::NotFound("Image not found")),
    }
}

/// Truncate report content to its preview length with an ellipsis marker.
fn preview(content: &str) -> String {
    let head = clip_chars(content, CONTENT_PREVIEW_CHARS);
    if head.len() == content.len() {
        content.to_string()
    } else {
        format!("{head}...")
    }
}

/// Raster files in the gallery directory, by file name.
///
/// A missing or unreadable directory renders the gallery without images.
fn gallery_files(dir: &std::path::Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Gallery directory unavailable");
            return Vec::new();
        }
    };
    entries
        .filter_map(|entry| {
            let name = entry.ok()?.file_name().into_string().ok()?;
            let lower = name.to_lowercase();
            [".png", ".jpg", ".jpeg", ".webp"]
                .iter()
                .any(|ext| lower.ends_with(ext))
                .then_some(name)
        })
        .collect()
}

fn mime_for(filename: &str) -> &'static str {
    match filename.rsplit('.').next().map(str::to_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn render_summaries(reports: &[Report], image_files: &[String]) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>ESG Summaries</title>\n\
         <style>\n\
         body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }\n\
         article { border-bottom: 1px solid #ddd; padding: 1rem 0; }\n\
         article img { max-width: 12rem; float: right; margin-left: 1rem; }\n\
         .meta { color: #666; font-size: 0.9rem; }\n\
         </style>\n</head>\n<body>\n<h1>Latest ESG Summaries</h1>\n",
    );
    for (i, report) in reports.iter().enumerate() {
        let _ = writeln!(page, "<article>");
        if !image_files.is_empty() {
            let file = &image_files[i % image_files.len()];
            let _ = writeln!(page, "<img src=\"/iaq_gallery/{file}\" alt=\"\">");
        }
        let title = report
            .title
            .as_deref()
            .or(report.company.as_deref())
            .unwrap_or("Untitled report");
        let _ = writeln!(page, "<h2>{title}</h2>");
        let _ = writeln!(
            page,
            "<p class=\"meta\">{} &mdash; {}</p>",
            report.company.as_deref().unwrap_or("General"),
            report.date_of_publication.as_deref().unwrap_or(""),
        );
        if let Some(summary) = &report.summary {
            let _ = writeln!(page, "{summary}");
        }
        let _ = writeln!(
            page,
            "<p><a href=\"{url}\">Read the original article</a></p>",
            url = report.url
        );
        let _ = writeln!(page, "</article>");
    }
    page.push_str("</body>\n</html>\n");
    page
}
