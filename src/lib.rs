/*!
# Vaccination Survey Web Application

A small web application for running vaccination questionnaires, built in Rust.

## Overview

The server renders a participant information sheet and an HTML questionnaire,
validates and sanitizes submitted answers, and appends each accepted
submission as one JSON line to a per-day log file on local disk. A day's log
can be downloaded as CSV through an authenticated endpoint, and each log file
is mirrored best-effort to a GitHub repository after every append.

## Architecture

- **Request layer**: axum router with static informational pages, the survey
  form POST handler, and the authenticated CSV download.
- **Core pipeline**: submission → required-field validation → string
  sanitization → timestamped append to the day's record file → detached
  mirror push.
- **Persistence**: newline-delimited JSON, one file per calendar date
  (`log-<YYYY-MM-DD>.txt`), append-only.

## Modules

- **schema**: fixed required-field lists for the questionnaire variants
- **validate**: required-field validation against the active schema
- **sanitize**: store-time escaping of quotes and commas in string values
- **store**: per-day append-only record files (append, read, list)
- **export**: CSV rendering with formula-injection guarding
- **mirror**: best-effort publishing of record files to a GitHub repository
- **qr**: startup QR-code image for the public survey URL
- **config**: immutable environment-derived configuration
- **app**: routing and request handlers
*/

pub mod app;
pub mod config;
pub mod export;
pub mod mirror;
pub mod qr;
pub mod sanitize;
pub mod schema;
pub mod store;
pub mod validate;

pub use config::Config;
pub use schema::{FieldSchema, SurveyVariant};
pub use store::{RecordStore, StoreError, Submission};
