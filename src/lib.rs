//! # Project Index
//!
//! A client for browsing a personal project index — a catalogue of
//! externally-hosted project records (e.g. ChatGPT projects) — and jumping
//! straight to a project's external URL.
//!
//! The index is served by one of three interchangeable backend shapes: a
//! custom REST API, a Supabase REST table, or a Supabase Edge Function.
//! This crate detects which one a base URL implements and unifies their
//! records behind a single canonical [`models::Project`] entity.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌────────────┐   ┌────────────┐
//! │ Endpoint │──▶│ Flavor  │──▶│   Index    │──▶│ Normalizer │
//! │ Resolver │   │ Detector│   │   Client   │   │            │
//! └──────────┘   └─────────┘   └────────────┘   └─────┬──────┘
//!                                                     ▼
//!                              ┌─────────┐   ┌─────────────────┐
//!                              │ Recency │──▶│ Search & Ranking │──▶ display list
//!                              │  Store  │   └─────────────────┘
//!                              └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pix set-url https://abc.supabase.co/rest/v1   # store the endpoint
//! pix validate                                  # probe compatibility
//! pix list                                      # recents + full catalogue
//! pix search "billing"                          # fuzzy search
//! pix open p-123abc                             # record touch, print URL
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML tool configuration |
//! | [`endpoint`] | Effective base URL resolution |
//! | [`flavor`] | Backend flavor detection |
//! | [`models`] | Canonical types and per-flavor normalization |
//! | [`client`] | HTTP client: validate, fetch, touch |
//! | [`search`] | Fuzzy search and display ordering |
//! | [`recency`] | Recently-opened tracking |
//! | [`storage`] | Key-value and search-index seams |
//! | [`error`] | Typed error taxonomy |

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod flavor;
pub mod models;
pub mod recency;
pub mod search;
pub mod storage;
