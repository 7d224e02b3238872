// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Logging macros.
//!
//! - Board (`board` feature): forwards to `defmt` over RTT.
//! - Host tests: `println!`.
//! - Anything else: compiled out.
//!
//! None of these may be used from the emergency or control-loop interrupts.

/// Log an informational message.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "board")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "board"), test))]
        println!("[INFO] {}", format!($($arg)*));
    }};
}

/// Log a warning.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "board")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "board"), test))]
        println!("[WARN] {}", format!($($arg)*));
    }};
}

/// Log an error.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "board")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "board"), test))]
        eprintln!("[ERROR] {}", format!($($arg)*));
    }};
}

/// Log a debug message.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "board")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "board"), test))]
        println!("[DEBUG] {}", format!($($arg)*));
    }};
}
