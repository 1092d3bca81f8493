//! C9: query handlers — one subscribe callback per subject, each
//! resolving from state and replying via the bus envelope (spec.md
//! Section 4.9).

mod handlers;
mod request;

pub use handlers::{
    boot, items, owners_query_by_items, price_list_history, realm_modification_dates,
    session_secret, status,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("malformed request payload")]
    MsgJsonParse,
}
