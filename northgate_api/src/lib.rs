//! Protocol layer for Northgate PlanningExplorer portals.
//!
//! Covers the HTTP transport, browser header profiles, and the ASP.NET
//! WebForms postback idiom (hidden state tokens and form bodies). Crawl
//! policy lives in `planscraper_lib`.

mod client;
pub mod endpoints;
mod errors;
pub mod form;
pub mod headers;

pub use self::client::{Method, PortalRequest, PortalResponse, Transport, TransportConfig};
pub use self::endpoints::PortalEndpoints;
pub use self::errors::Error;
pub use self::form::{DocumentPostback, HiddenFormState, SearchForm};
pub use self::headers::RequestHeaders;
