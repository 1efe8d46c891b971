//! Backend flavor detection.
//!
//! The same client talks to three interchangeable backend shapes. Which one
//! a given base URL implements is decided here, once, by pattern matching —
//! the rest of the crate branches on the resulting [`Flavor`] value instead
//! of re-inspecting URLs at call sites.

use std::fmt;

/// The three backend API shapes a base URL can implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// Custom REST API with a `/meta` probe and a `{"projects": [...]}` envelope.
    CustomApi,
    /// Supabase PostgREST table endpoint (`/rest/v1`).
    SupabaseRest,
    /// Supabase Edge Function (`/functions/v1`); bare-array responses.
    EdgeFunction,
}

impl Flavor {
    /// Classify a base URL. First match wins: Edge Function outranks
    /// Supabase REST, and anything else is the custom API.
    ///
    /// Infallible — an unparseable string still classifies as [`Flavor::CustomApi`].
    pub fn detect(base_url: &str) -> Flavor {
        if base_url.contains("/functions/v1") {
            Flavor::EdgeFunction
        } else if base_url.contains("/rest/v1") {
            Flavor::SupabaseRest
        } else {
            Flavor::CustomApi
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Flavor::CustomApi => "Custom API",
            Flavor::SupabaseRest => "Supabase",
            Flavor::EdgeFunction => "Edge Function",
        };
        write!(f, "{}", name)
    }
}
