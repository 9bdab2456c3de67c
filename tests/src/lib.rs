//! # AWDT Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scenarios.rs   # The eight benchmarking scenarios end to end
//!     └── properties.rs  # Freshness, monotonicity, watchdog and policy properties
//! ```
//!
//! Every test drives a full coordinator (device + server + boundary link)
//! on paused tokio time, so watchdog deadlines and periodic wakeups elapse
//! instantly.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p awdt-tests
//! cargo test -p awdt-tests integration::scenarios::
//! ```

pub mod integration;
