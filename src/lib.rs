//! `get4for6`: stateless+stateful IPv4<->IPv6 address translation with DNS,
//! XAX, and simple-address-query request surfaces.

#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod addr;
pub mod cli;
pub mod config;
pub mod context;
pub mod dns;
pub mod error;
pub mod fault;
pub mod logging;
pub mod printmap;
pub mod saq;
pub mod signals;
pub mod substitute;
pub mod xax;

pub use error::AppError;
