// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! SmartScan: leaf-image disease classifier client
//!
//! The interaction core: a dropped file is taken in, previewed, posted to the
//! classification service, and its result or failure shown until the next
//! selection or a clear.

pub mod client;
pub mod config;
pub mod controller;
pub mod dropzone;
pub mod error;
pub mod intake;
pub mod pipeline;
pub mod preview;
pub mod session;
pub mod view;

pub use config::AppConfig;
pub use controller::Controller;
pub use error::{FailureClass, Result, SmartScanError};
pub use session::{transition, Effect, Event, Session};
